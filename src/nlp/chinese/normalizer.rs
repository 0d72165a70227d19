use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::cn2an;
use crate::nlp::punctuation_boundary;

static PUNCTUATION_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("：", ":"),
        ("；", ";"),
        ("，", ","),
        ("、", ","),
        ("·", ","),
        ("。", "."),
        ("！", "!"),
        ("？", "?"),
        ("\n", "."),
        ("...", "…"),
        ("……", "…"),
        ("“", "\""),
        ("”", "\""),
        ("‘", "'"),
        ("’", "'"),
        ("（", "'"),
        ("）", "'"),
        ("(", "'"),
        (")", "'"),
        ("《", "'"),
        ("》", "'"),
        ("【", "'"),
        ("】", "'"),
        ("[", "'"),
        ("]", "'"),
        ("「", "'"),
        ("」", "'"),
        ("—", "-"),
        ("～", "-"),
        ("~", "-"),
    ])
});

static PUNCTUATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let mut keys: Vec<&str> = PUNCTUATION_MAP.keys().copied().collect();
    keys.sort_by_key(|k| std::cmp::Reverse(k.len()));
    let alternation = keys
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternation).expect("punctuation regex")
});

// Tabs survive to be squeezed with the other spaces.
static UNSUPPORTED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{Cc}\p{Cf}&&[^\t]]+").expect("unsupported regex"));

static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").expect("space regex"));

/// Prepares free text for segmentation. Full-width forms are folded to ASCII,
/// numbers are read out in Chinese and punctuation is mapped to its ASCII
/// form. Control and format characters are dropped; everything else is kept
/// for the segmenter.
pub fn normalize_text(text: &str) -> String {
    let text = fold_full_width(text.trim());
    let text = cn2an::replace_numbers(&text);
    let text = replace_punctuation(&text);
    SPACES.replace_all(text.trim(), " ").into_owned()
}

/// Maps full-width ASCII variants (`Ａ`, `３`, `！`) and the ideographic space
/// to their ASCII counterparts.
pub fn fold_full_width(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '\u{3000}' => ' ',
            '\u{ff01}'..='\u{ff5e}' => char::from_u32(ch as u32 - 0xfee0).unwrap_or(ch),
            _ => ch,
        })
        .collect()
}

pub fn replace_punctuation(text: &str) -> String {
    let folded = PUNCTUATION_PATTERN.replace_all(text, |caps: &regex::Captures| {
        PUNCTUATION_MAP.get(&caps[0]).copied().unwrap_or("")
    });
    let folded = folded.replace('嗯', "恩").replace('呣', "母");
    UNSUPPORTED_PATTERN.replace_all(&folded, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_numbers_and_punctuation() {
        assert_eq!(
            normalize_text("你好，世界！123abc"),
            "你好,世界!一百二十三abc"
        );
    }

    #[test]
    fn keeps_symbols_and_squeezes_spaces() {
        assert_eq!(normalize_text("  好  ★  的 "), "好 ★ 的");
        assert_eq!(normalize_text("café\u{200b}好"), "café好");
        assert_eq!(normalize_text("《红楼梦》……"), "'红楼梦'…");
    }

    #[test]
    fn full_width_forms_are_folded() {
        assert_eq!(normalize_text("我有３个苹果"), "我有三个苹果");
        assert_eq!(normalize_text("ＡＢＣ　１２"), "ABC 十二");
        assert_eq!(normalize_text("好！（嗯）"), "好!'恩'");
    }

    #[test]
    fn folded_punctuation_has_a_boundary() {
        for value in PUNCTUATION_MAP.values() {
            for ch in value.chars() {
                assert!(punctuation_boundary(ch).is_some(), "{value} has no boundary");
            }
        }
    }

    #[test]
    fn keeps_pinyin_literals() {
        assert_eq!(normalize_text("ni3 hao3。"), "ni3 hao3.");
    }
}
