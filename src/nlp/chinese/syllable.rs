use std::{fmt, str::FromStr};

use anyhow::bail;

const PINYIN_INITIALS: [&str; 23] = [
    "zh", "ch", "sh", "b", "p", "m", "f", "d", "t", "n", "l", "g", "k", "h", "j", "q", "x", "r",
    "z", "c", "s", "y", "w",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    First = 1,
    Second = 2,
    Third = 3,
    Fourth = 4,
    Neutral = 5,
}

impl Tone {
    pub fn from_digit(digit: u32) -> Option<Self> {
        match digit {
            1 => Some(Tone::First),
            2 => Some(Tone::Second),
            3 => Some(Tone::Third),
            4 => Some(Tone::Fourth),
            5 => Some(Tone::Neutral),
            _ => None,
        }
    }

    pub fn digit(self) -> u8 {
        self as u8
    }
}

/// One toned Mandarin syllable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Syllable {
    pub initial: String,
    pub final_part: String,
    pub tone: Tone,
}

impl Syllable {
    pub fn new(initial: impl Into<String>, final_part: impl Into<String>, tone: Tone) -> Self {
        Self {
            initial: initial.into(),
            final_part: final_part.into(),
            tone,
        }
    }

    /// Splits a numbered syllable such as `zhong1` or `lü4`.
    ///
    /// A syllable without a trailing tone digit is read as neutral tone.
    /// Returns `None` when no final remains after the initial.
    pub fn from_numbered(text: &str) -> Option<Self> {
        let (body, tone) = match text.chars().last().and_then(|c| c.to_digit(10)) {
            Some(digit) => (&text[..text.len() - 1], Tone::from_digit(digit)?),
            None => (text, Tone::Neutral),
        };
        let body = body.replace('ü', "v");
        let initial = extract_initial(&body);
        let final_part = &body[initial.len()..];
        if final_part.is_empty() || final_part.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self::new(initial, final_part, tone))
    }

    /// Initial and final without the tone digit, e.g. `huar`.
    pub fn toneless(&self) -> String {
        format!("{}{}", self.initial, self.final_part)
    }

    /// Turns the final retroflex (`hua` → `huar`); already retroflex
    /// syllables and `er` itself are left untouched.
    pub fn rhotacize(&mut self) {
        if self.final_part.ends_with('r') || self.toneless() == "er" {
            return;
        }
        self.final_part.push('r');
    }
}

impl fmt::Display for Syllable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.initial, self.final_part, self.tone.digit())
    }
}

impl FromStr for Syllable {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_numbered(s) {
            Some(syllable) => Ok(syllable),
            None => bail!("invalid numbered pinyin syllable {s:?}"),
        }
    }
}

/// A segmented token with one syllable per pronounced character.
///
/// Erhua-merged `儿` characters have no syllable of their own, so
/// `syllables.len()` can be shorter than the token's character count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub token: String,
    pub syllables: Vec<Syllable>,
}

impl Word {
    pub fn new(token: impl Into<String>, syllables: Vec<Syllable>) -> Self {
        Self {
            token: token.into(),
            syllables,
        }
    }
}

fn extract_initial(plain: &str) -> &str {
    for candidate in PINYIN_INITIALS {
        if plain.starts_with(candidate) && plain.len() > candidate.len() {
            return candidate;
        }
    }
    ""
}

/// Whether a toneless syllable is retroflex (erhua), e.g. `huar`.
pub fn is_erhua(toneless: &str) -> bool {
    if toneless.chars().count() <= 1 || toneless == "er" {
        return false;
    }
    toneless.ends_with('r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erhua_detection() {
        assert!(!is_erhua("ha"));
        assert!(!is_erhua("er"));
        assert!(!is_erhua("hua"));
        assert!(is_erhua("huar"));
        assert!(!is_erhua("r"));
        assert!(!is_erhua(""));
        assert!(is_erhua("dianr"));
    }

    #[test]
    fn numbered_syllable_is_split_into_parts() {
        let syllable: Syllable = "zhong1".parse().unwrap();
        assert_eq!(syllable.initial, "zh");
        assert_eq!(syllable.final_part, "ong");
        assert_eq!(syllable.tone, Tone::First);

        let er = Syllable::from_numbered("er2").unwrap();
        assert_eq!(er.initial, "");
        assert_eq!(er.final_part, "er");
    }

    #[test]
    fn missing_tone_digit_means_neutral() {
        let syllable = Syllable::from_numbered("de").unwrap();
        assert_eq!(syllable.tone, Tone::Neutral);
        assert_eq!(syllable.to_string(), "de5");
    }

    #[test]
    fn umlaut_is_written_as_v() {
        let syllable = Syllable::from_numbered("lü4").unwrap();
        assert_eq!(syllable.final_part, "v");
        assert_eq!(syllable.to_string(), "lv4");
    }

    #[test]
    fn invalid_syllables_are_rejected() {
        assert!(Syllable::from_numbered("ma7").is_none());
        assert!(Syllable::from_numbered("3").is_none());
        assert!(Syllable::from_numbered("a1b2").is_none());
        assert!("".parse::<Syllable>().is_err());
    }

    #[test]
    fn rhotacize_appends_retroflex_once() {
        let mut syllable = Syllable::from_numbered("hua1").unwrap();
        syllable.rhotacize();
        assert_eq!(syllable.to_string(), "huar1");
        syllable.rhotacize();
        assert_eq!(syllable.to_string(), "huar1");

        let mut er = Syllable::from_numbered("er2").unwrap();
        er.rhotacize();
        assert_eq!(er.to_string(), "er2");
    }
}
