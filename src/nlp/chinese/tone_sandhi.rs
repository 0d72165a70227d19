use super::syllable::{Syllable, Tone, Word};

/// One position of a sandhi pass: the token that produced the syllable and the
/// syllable itself, if it is a genuine tonal one.
pub struct SandhiSlot<'a> {
    pub token: &'a str,
    pub syllable: Option<&'a mut Syllable>,
}

impl<'a> SandhiSlot<'a> {
    pub fn new(token: &'a str, syllable: Option<&'a mut Syllable>) -> Self {
        Self { token, syllable }
    }
}

/// Contextual tone rewriting for "一", "不" and third-tone pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToneSandhi {
    cross_word_third_tone: bool,
}

impl ToneSandhi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also applies third-tone sandhi across word boundaries.
    pub fn with_cross_word_third_tone(mut self, enabled: bool) -> Self {
        self.cross_word_third_tone = enabled;
        self
    }

    /// Rewrites tones left to right over adjacent slot pairs.
    ///
    /// Only the left member of a pair is ever changed, and slots without a
    /// syllable never take part in a pair.
    pub fn apply(&self, slots: &mut [SandhiSlot<'_>]) {
        for i in 1..slots.len() {
            let (head, tail) = slots.split_at_mut(i);
            let left = &mut head[i - 1];
            let right = &tail[0];
            let (Some(left_syllable), Some(right_syllable)) =
                (left.syllable.as_deref_mut(), right.syllable.as_deref())
            else {
                continue;
            };
            if let Some(tone) = rewrite(
                left.token,
                left_syllable,
                right.token,
                right_syllable,
                true,
            ) {
                left_syllable.tone = tone;
            }
        }
    }

    /// In-word pass: every character is its own token.
    pub fn apply_in_word(&self, chars: &[String], syllables: &mut [Syllable]) {
        let mut slots: Vec<SandhiSlot<'_>> = chars
            .iter()
            .zip(syllables.iter_mut())
            .map(|(ch, syllable)| SandhiSlot::new(ch, Some(syllable)))
            .collect();
        self.apply(&mut slots);
    }

    /// Word-boundary pass between two neighbouring words, using the whole
    /// token as the identity of each side.
    pub fn apply_between(&self, left: &mut Word, right: &Word) {
        let (Some(left_syllable), Some(right_syllable)) =
            (left.syllables.last_mut(), right.syllables.first())
        else {
            return;
        };
        if let Some(tone) = rewrite(
            &left.token,
            left_syllable,
            &right.token,
            right_syllable,
            self.cross_word_third_tone,
        ) {
            left_syllable.tone = tone;
        }
    }

    pub fn apply_across(&self, words: &mut [Word]) {
        for i in 1..words.len() {
            let (head, tail) = words.split_at_mut(i);
            self.apply_between(&mut head[i - 1], &tail[0]);
        }
    }
}

fn rewrite(
    token: &str,
    syllable: &Syllable,
    next_token: &str,
    next: &Syllable,
    third_tone: bool,
) -> Option<Tone> {
    match (token, syllable.tone, next.tone) {
        (_, Tone::Third, Tone::Third) if third_tone => Some(Tone::Second),
        ("不", Tone::Fourth, Tone::Fourth) => Some(Tone::Second),
        ("一", Tone::First, next_tone) if next_tone != Tone::Fourth && next_token != "一" => {
            Some(Tone::Fourth)
        }
        ("一", Tone::First, Tone::Fourth) => Some(Tone::Second),
        _ => None,
    }
}
