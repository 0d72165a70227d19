use once_cell::sync::Lazy;
use regex::Regex;

// Leading letters are captured so that digits glued to Latin text (`ni3`,
// `mp3`) can be left alone. Only ASCII digits are read; full-width ones are
// folded beforehand by the normalizer.
static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z]*[0-9]+(?:\.[0-9]+)?").expect("valid number regex"));

const DIGITS: [char; 10] = ['零', '一', '二', '三', '四', '五', '六', '七', '八', '九'];
const UNITS: [&str; 4] = ["千", "百", "十", ""];
const GROUP_UNITS: [&str; 4] = ["", "万", "亿", "兆"];

/// Reads Arabic numbers out in Chinese: `123` → `一百二十三`, `0.5` → `零点五`.
pub fn replace_numbers(text: &str) -> String {
    NUMBER_RE
        .replace_all(text, |caps: &regex::Captures| {
            let matched = &caps[0];
            if matched.starts_with(|c: char| c.is_ascii_alphabetic()) {
                matched.to_string()
            } else {
                read_number(matched)
            }
        })
        .into_owned()
}

fn read_number(number: &str) -> String {
    let (integer, fraction) = match number.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (number, None),
    };
    let mut out = read_integer(integer);
    if let Some(fraction) = fraction {
        out.push('点');
        out.extend(fraction.chars().filter_map(digit_char));
    }
    out
}

fn read_integer(digits: &str) -> String {
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return DIGITS[0].to_string();
    }
    if significant.len() > 4 * GROUP_UNITS.len() {
        return significant.chars().filter_map(digit_char).collect();
    }

    let bytes = significant.as_bytes();
    let head = bytes.len() % 4;
    let mut groups: Vec<&[u8]> = Vec::new();
    if head > 0 {
        groups.push(&bytes[..head]);
    }
    groups.extend(bytes[head..].chunks(4));

    let mut out = String::new();
    let mut gap = false;
    for (idx, group) in groups.iter().enumerate() {
        let value = group
            .iter()
            .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));
        if value == 0 {
            gap = true;
            continue;
        }
        if !out.is_empty() && (gap || value < 1000) {
            out.push(DIGITS[0]);
        }
        out.push_str(&read_group(value));
        out.push_str(GROUP_UNITS[groups.len() - 1 - idx]);
        gap = false;
    }

    if out.starts_with("一十") {
        out = out.replacen("一十", "十", 1);
    }
    out
}

fn read_group(value: u32) -> String {
    let mut out = String::new();
    let mut zero = false;
    for (pos, unit) in UNITS.iter().enumerate() {
        let digit = (value / 10u32.pow(3 - pos as u32)) % 10;
        if digit == 0 {
            zero = !out.is_empty();
            continue;
        }
        if zero {
            out.push(DIGITS[0]);
            zero = false;
        }
        out.push(DIGITS[digit as usize]);
        out.push_str(unit);
    }
    out
}

fn digit_char(ch: char) -> Option<char> {
    ch.to_digit(10).map(|d| DIGITS[d as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_arabic_numbers_with_chinese() {
        assert_eq!(replace_numbers("我有123个苹果"), "我有一百二十三个苹果");
        assert_eq!(replace_numbers("价格是0.5元"), "价格是零点五元");
    }

    #[test]
    fn zeros_inside_numbers() {
        assert_eq!(read_integer("1005"), "一千零五");
        assert_eq!(read_integer("10001"), "一万零一");
        assert_eq!(read_integer("100000"), "十万");
        assert_eq!(read_integer("15"), "十五");
        assert_eq!(read_integer("20"), "二十");
        assert_eq!(read_integer("0"), "零");
        assert_eq!(read_integer("100000001"), "一亿零一");
    }

    #[test]
    fn non_ascii_digits_are_left_alone() {
        assert_eq!(replace_numbers("３个"), "３个");
        assert_eq!(replace_numbers("١٢٣"), "١٢٣");
        assert_eq!(replace_numbers("第12345678901234567890号"), "第一二三四五六七八九零一二三四五六七八九零号");
    }

    #[test]
    fn latin_glued_digits_are_kept() {
        assert_eq!(replace_numbers("ni3 hao3"), "ni3 hao3");
        assert_eq!(replace_numbers("mp3格式"), "mp3格式");
    }
}
