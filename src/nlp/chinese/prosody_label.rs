//! Parsers for prosody-labelled corpus transcripts.
//!
//! Both corpus formats pair a tagged Hanzi line with a line of toned pinyin.
//! They share one alignment walk and differ only in how a record is split and
//! which characters count as boundary tags.

use once_cell::sync::Lazy;
use regex::Regex;

use super::syllable::is_erhua;
use crate::{
    errors::LabelError,
    nlp::prosody::{BoundaryLevel, PhonemeStream},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLabel {
    pub sentence_id: String,
    pub phonemes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Boundary(BoundaryLevel),
    /// Consumed without output and without affecting syllable separation.
    Ignored,
}

pub trait LabelFormat: Sync {
    /// Splits the sentence id off a text line and returns it with the cleaned
    /// body that is walked against the pinyin.
    fn split_record(&self, text: &str) -> Result<(String, String), LabelError>;

    /// `None` means the character is pronounced.
    fn classify(&self, ch: char) -> Option<Tag>;

    /// Rewrites the fully assembled phoneme string.
    fn finish(&self, phonemes: String) -> String {
        phonemes
    }
}

/// DataBaker `ProsodyLabeling` lines: `000001 妈妈#1当时#1表示#3，…#4。`.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDigitTags;

const INLINE_STRIPPED: [char; 14] = [
    '“', '”', '、', '，', '。', '：', '；', '？', '！', '—', '…', '#', '（', '）',
];

impl LabelFormat for InlineDigitTags {
    fn split_record(&self, text: &str) -> Result<(String, String), LabelError> {
        let cleaned: String = text
            .chars()
            .filter(|c| !INLINE_STRIPPED.contains(c))
            .collect();
        let mut parts = cleaned.split_whitespace();
        let sentence_id = parts.next().ok_or(LabelError::Empty)?;
        if !sentence_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(LabelError::MissingSentenceId(text.to_string()));
        }
        Ok((sentence_id.to_string(), parts.collect()))
    }

    fn classify(&self, ch: char) -> Option<Tag> {
        match ch {
            '1' => Some(Tag::Boundary(BoundaryLevel::ProsodicWord)),
            '2' => Some(Tag::Boundary(BoundaryLevel::ProsodicPhrase)),
            '3' => Some(Tag::Boundary(BoundaryLevel::IntonationPhrase)),
            '4' => Some(Tag::Boundary(BoundaryLevel::Sentence)),
            c if c.is_ascii_digit() => Some(Tag::Ignored),
            _ => None,
        }
    }
}

/// TH-CoSS prompt lines: `1.	/为临帖/他*还|远游|…/./`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DelimiterTags;

static DELIMITER_RECORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([0-9]+)\.(.*)$").expect("record regex"));

const DELIMITER_STRIPPED: [char; 9] = ['*', ';', '?', '!', '；', '？', '！', '，', '。'];

impl LabelFormat for DelimiterTags {
    fn split_record(&self, text: &str) -> Result<(String, String), LabelError> {
        let caps = DELIMITER_RECORD
            .captures(text)
            .ok_or_else(|| LabelError::MissingSentenceId(text.to_string()))?;
        let raw_id = &caps[1];
        let sentence_id = raw_id
            .parse::<u64>()
            .map(|n| n.to_string())
            .unwrap_or_else(|_| raw_id.to_string());

        let mut body = String::with_capacity(caps[2].len());
        for ch in caps[2].chars() {
            if ch.is_whitespace() || DELIMITER_STRIPPED.contains(&ch) {
                continue;
            }
            let doubled = matches!(ch, '/' | '|') && body.ends_with(ch);
            if !doubled {
                body.push(ch);
            }
        }
        if body.starts_with(['/', '|']) {
            body.remove(0);
        }
        if body.ends_with(['/', '|']) {
            body.pop();
            body.push('.');
        }
        Ok((sentence_id, body))
    }

    fn classify(&self, ch: char) -> Option<Tag> {
        match ch {
            '|' => Some(Tag::Boundary(BoundaryLevel::ProsodicWord)),
            '/' => Some(Tag::Boundary(BoundaryLevel::ProsodicPhrase)),
            ',' => Some(Tag::Boundary(BoundaryLevel::IntonationPhrase)),
            '.' => Some(Tag::Boundary(BoundaryLevel::Sentence)),
            _ => None,
        }
    }

    fn finish(&self, phonemes: String) -> String {
        phonemes.replace('E', "ev")
    }
}

/// What one text character does to the two cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Emit a marker; only the text cursor moves.
    Boundary(BoundaryLevel),
    Ignored,
    /// `儿` merged into the previous retroflex syllable; only the text cursor moves.
    ErhuaSuppressed,
    /// Emit the next pinyin syllable; both cursors move.
    Syllable,
}

pub fn transition<F: LabelFormat + ?Sized>(
    format: &F,
    ch: char,
    previous_syllable: Option<&str>,
) -> Transition {
    match format.classify(ch) {
        Some(Tag::Boundary(level)) => Transition::Boundary(level),
        Some(Tag::Ignored) => Transition::Ignored,
        None if ch == '儿' && previous_syllable.is_some_and(|s| is_erhua(strip_tone(s))) => {
            Transition::ErhuaSuppressed
        }
        None => Transition::Syllable,
    }
}

fn strip_tone(syllable: &str) -> &str {
    syllable
        .strip_suffix(|c: char| c.is_ascii_digit())
        .unwrap_or(syllable)
}

/// Aligns a tagged text line against its pinyin line.
///
/// Without `use_prosody`, prosodic-phrase tags are written as plain word
/// spacing.
pub fn parse_label<F: LabelFormat + ?Sized>(
    format: &F,
    text: &str,
    pinyin: &str,
    use_prosody: bool,
) -> Result<ParsedLabel, LabelError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(LabelError::Empty);
    }
    let (sentence_id, body) = format.split_record(text)?;
    if body.is_empty() {
        return Err(LabelError::Empty);
    }

    let syllables: Vec<&str> = pinyin.split_whitespace().collect();
    let chars: Vec<char> = body.chars().collect();
    let mut stream = PhonemeStream::new();
    let mut used = 0usize;

    for (pos, &ch) in chars.iter().enumerate() {
        let previous = used.checked_sub(1).map(|idx| syllables[idx]);
        match transition(format, ch, previous) {
            Transition::Boundary(level) => {
                let level = if !use_prosody && level == BoundaryLevel::ProsodicPhrase {
                    BoundaryLevel::ProsodicWord
                } else {
                    level
                };
                stream.push_boundary(level);
            }
            Transition::Ignored | Transition::ErhuaSuppressed => {}
            Transition::Syllable => {
                let Some(syllable) = syllables.get(used) else {
                    return Err(LabelError::Misaligned {
                        sentence_id,
                        syllables_used: used,
                        syllables_total: syllables.len(),
                        chars_left: chars.len() - pos,
                    });
                };
                stream.push_syllable(*syllable);
                used += 1;
            }
        }
    }

    if used != syllables.len() {
        return Err(LabelError::Misaligned {
            sentence_id,
            syllables_used: used,
            syllables_total: syllables.len(),
            chars_left: 0,
        });
    }
    if stream.is_empty() {
        return Err(LabelError::Empty);
    }

    Ok(ParsedLabel {
        sentence_id,
        phonemes: format.finish(stream.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATABAKER_TEXT: &str = "100001 妈妈#1当时#1表示#3，儿子#1开心得#2像花儿#1一样#4。";
    const DATABAKER_PINYIN: &str =
        "ma1 ma1 dang1 shi2 biao3 shi4 er2 zi5 kai1 xin1 de5 xiang4 huar1 yi2 yang4";

    const THCOSS_TEXT: &str = "1.\t/为临帖/他*还|远游|西*安|碑林/龙门|石窟/泰山|*摩崖|石刻/./";
    const THCOSS_PINYIN: &str = "wei4 lin2 tie4 ta1 hai2 yuan3 you2 xi1 an1 bei1 lin2 long2 men2 shi2 ku1 tai4 shan1 mo2 ya2 shi2 ke4";

    #[test]
    fn databaker_label_with_prosody() {
        let parsed = parse_label(&InlineDigitTags, DATABAKER_TEXT, DATABAKER_PINYIN, true).unwrap();
        assert_eq!(parsed.sentence_id, "100001");
        assert_eq!(
            parsed.phonemes,
            "ma1-ma1 dang1-shi2 biao3-shi4, er2-zi5 kai1-xin1-de5 / xiang4-huar1 yi2-yang4."
        );
    }

    #[test]
    fn databaker_label_without_prosody_collapses_phrases() {
        let parsed =
            parse_label(&InlineDigitTags, DATABAKER_TEXT, DATABAKER_PINYIN, false).unwrap();
        assert_eq!(
            parsed.phonemes,
            "ma1-ma1 dang1-shi2 biao3-shi4, er2-zi5 kai1-xin1-de5 xiang4-huar1 yi2-yang4."
        );
    }

    #[test]
    fn thcoss_label_with_prosody() {
        let parsed = parse_label(&DelimiterTags, THCOSS_TEXT, THCOSS_PINYIN, true).unwrap();
        assert_eq!(parsed.sentence_id, "1");
        assert_eq!(
            parsed.phonemes,
            "wei4-lin2-tie4 / ta1-hai2 yuan3-you2 xi1-an1 bei1-lin2 / long2-men2 shi2-ku1 / tai4-shan1 mo2-ya2 shi2-ke4."
        );
    }

    #[test]
    fn untagged_label_joins_syllables() {
        let parsed =
            parse_label(&InlineDigitTags, "000002 你好世界", "ni3 hao3 shi4 jie4", true).unwrap();
        assert_eq!(parsed.sentence_id, "000002");
        assert_eq!(parsed.phonemes, "ni3-hao3-shi4-jie4");
    }

    #[test]
    fn short_pinyin_is_misaligned() {
        let err = parse_label(&InlineDigitTags, "000003 你好世界啊", "ni3 hao3 shi4 jie4", true)
            .unwrap_err();
        assert_eq!(
            err,
            LabelError::Misaligned {
                sentence_id: "000003".into(),
                syllables_used: 4,
                syllables_total: 4,
                chars_left: 1,
            }
        );
    }

    #[test]
    fn leftover_pinyin_is_misaligned() {
        let err =
            parse_label(&DelimiterTags, "7.你好|", "ni3 hao3 ma5", false).unwrap_err();
        assert!(matches!(
            err,
            LabelError::Misaligned {
                syllables_used: 2,
                syllables_total: 3,
                ..
            }
        ));
    }

    #[test]
    fn blank_and_id_only_lines_are_empty() {
        assert_eq!(
            parse_label(&InlineDigitTags, "   ", "", true),
            Err(LabelError::Empty)
        );
        assert_eq!(
            parse_label(&InlineDigitTags, "000004 #1。", "", true),
            Err(LabelError::Empty)
        );
        assert_eq!(
            parse_label(&DelimiterTags, "3.\t/ /", "", true),
            Err(LabelError::Empty)
        );
    }

    #[test]
    fn lines_without_ids_are_rejected() {
        assert!(matches!(
            parse_label(&InlineDigitTags, "ma1 ma1", "ma1 ma1", true),
            Err(LabelError::MissingSentenceId(_))
        ));
        assert!(matches!(
            parse_label(&DelimiterTags, "为临帖", "wei4 lin2 tie4", true),
            Err(LabelError::MissingSentenceId(_))
        ));
    }

    #[test]
    fn erhua_follows_previous_syllable() {
        let format = InlineDigitTags;
        assert_eq!(
            transition(&format, '儿', Some("huar1")),
            Transition::ErhuaSuppressed
        );
        assert_eq!(transition(&format, '儿', Some("shi4")), Transition::Syllable);
        assert_eq!(transition(&format, '儿', Some("er2")), Transition::Syllable);
        assert_eq!(transition(&format, '儿', None), Transition::Syllable);
        assert_eq!(transition(&format, '花', Some("huar1")), Transition::Syllable);
    }

    #[test]
    fn tags_are_classified_per_format() {
        assert_eq!(
            transition(&InlineDigitTags, '3', None),
            Transition::Boundary(BoundaryLevel::IntonationPhrase)
        );
        assert_eq!(transition(&InlineDigitTags, '7', None), Transition::Ignored);
        assert_eq!(transition(&InlineDigitTags, '|', None), Transition::Syllable);
        assert_eq!(
            transition(&DelimiterTags, '|', None),
            Transition::Boundary(BoundaryLevel::ProsodicWord)
        );
        assert_eq!(
            transition(&DelimiterTags, '.', None),
            Transition::Boundary(BoundaryLevel::Sentence)
        );
    }

    #[test]
    fn suppressed_erhua_consumes_no_syllable() {
        let parsed =
            parse_label(&InlineDigitTags, "000005 一点儿#4", "yi4 dianr3", true).unwrap();
        assert_eq!(parsed.phonemes, "yi4-dianr3.");
    }

    #[test]
    fn delimiter_record_normalisation() {
        let (id, body) = DelimiterTags
            .split_record("  0012.||你*好//吗，|")
            .unwrap();
        assert_eq!(id, "12");
        assert_eq!(body, "你好/吗.");
    }

    #[test]
    fn delimiter_format_rewrites_bare_e() {
        let parsed = parse_label(&DelimiterTags, "5.诶/", "E4", true).unwrap();
        assert_eq!(parsed.phonemes, "ev4.");
    }

    #[test]
    fn inline_digits_outside_tag_range_are_skipped() {
        let parsed =
            parse_label(&InlineDigitTags, "000006 你0好#4", "ni3 hao3", true).unwrap();
        assert_eq!(parsed.phonemes, "ni3-hao3.");
    }
}
