use std::{collections::HashSet, fs, path::Path};

use anyhow::{Context, Result};
use jieba_rs::Jieba;
use once_cell::sync::Lazy;
use tracing::{debug, info};

use super::{
    is_cjk, normalizer,
    pinyin_lookup::{CachedLookup, PinyinCrateLookup, PinyinLookup},
    syllable::{Syllable, Tone, Word, is_erhua},
    tone_sandhi::ToneSandhi,
};
use crate::nlp::{
    prosody::{BoundaryLevel, PhonemeStream},
    punctuation_boundary,
};

/// Process-wide converter with the default dictionary.
pub static G2P: Lazy<G2p> = Lazy::new(G2p::new);

/// Words ending in `儿` where it keeps its own syllable.
static NON_ERHUA_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "女儿", "婴儿", "幼儿", "孤儿", "健儿", "患儿", "胎儿", "男儿", "少儿", "孙儿", "侄儿",
        "宠儿", "小儿", "弃儿", "乞儿", "混血儿", "新生儿", "儿儿",
    ]
    .into_iter()
    .collect()
});

pub trait Segmenter {
    /// Splits text into words whose concatenation is the input.
    fn segment(&self, text: &str) -> Vec<String>;
}

pub struct JiebaSegmenter {
    jieba: Jieba,
}

impl Default for JiebaSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl JiebaSegmenter {
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
        }
    }

    /// Loads extra words, one per line, each optionally followed by a frequency.
    pub fn with_user_dict(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let dict = fs::read_to_string(path)
            .with_context(|| format!("failed to read user dictionary {}", path.display()))?;
        let mut segmenter = Self::new();
        let added = segmenter.add_words(&dict);
        info!("loaded {added} user words from {}", path.display());
        Ok(segmenter)
    }

    pub fn add_words(&mut self, dict: &str) -> usize {
        let mut added = 0;
        for line in dict.lines() {
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else {
                continue;
            };
            let freq = fields.next().and_then(|f| f.parse::<usize>().ok());
            self.jieba.add_word(word, freq, None);
            added += 1;
        }
        added
    }
}

impl Segmenter for JiebaSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        self.jieba
            .cut(text, true)
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Syllables inside a word joined with `-`.
    Syllable,
    /// Syllables inside a word written back to back.
    Word,
}

impl Granularity {
    pub fn from_level(level: u8) -> Self {
        if level >= 2 {
            Granularity::Word
        } else {
            Granularity::Syllable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Tonal(Word),
    Literal(String),
    Boundary(BoundaryLevel),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Han,
    Punctuation,
    Space,
    Other,
}

fn script(ch: char) -> Script {
    if is_cjk(ch) {
        Script::Han
    } else if ch.is_whitespace() {
        Script::Space
    } else if punctuation_boundary(ch).is_some() {
        Script::Punctuation
    } else {
        Script::Other
    }
}

fn script_runs(token: &str) -> Vec<(Script, &str)> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut current: Option<Script> = None;
    for (idx, ch) in token.char_indices() {
        let kind = script(ch);
        match current {
            Some(prev) if prev == kind => {}
            Some(prev) => {
                runs.push((prev, &token[start..idx]));
                start = idx;
                current = Some(kind);
            }
            None => current = Some(kind),
        }
    }
    if let Some(kind) = current {
        runs.push((kind, &token[start..]));
    }
    runs
}

/// Shape check for literal pinyin such as `hao3`, `hua1r` or plain Latin words.
pub fn is_pinyin(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    if n > 8 {
        return false;
    }
    let last = chars.last().copied();
    chars.iter().enumerate().all(|(i, &ch)| {
        let tone = ch.to_digit(10);
        if i + 2 < n {
            ch.is_alphabetic()
        } else if i + 2 == n {
            match tone {
                Some(d) => (1..=5).contains(&d) && last == Some('r'),
                None => ch.is_alphabetic(),
            }
        } else {
            match tone {
                Some(d) => (1..=5).contains(&d),
                None => ch.is_alphabetic(),
            }
        }
    })
}

/// Reads a pinyin literal carrying an explicit tone (`hao3`, `hua1r`).
fn literal_syllable(text: &str) -> Option<Syllable> {
    if let Some(body) = text.strip_suffix('r') {
        let tone = body.chars().last()?;
        if tone.is_ascii_digit() {
            let stem = &body[..body.len() - 1];
            return Syllable::from_numbered(&format!("{stem}r{tone}"));
        }
    }
    if text.ends_with(|c: char| c.is_ascii_digit()) {
        return Syllable::from_numbered(text);
    }
    None
}

fn merge_erhua_tokens(tokens: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token == "儿" {
            if let Some(prev) = merged.last_mut() {
                if prev.chars().last().is_some_and(is_cjk) {
                    prev.push('儿');
                    continue;
                }
            }
        }
        merged.push(token);
    }
    merged
}

/// Sentence-level grapheme-to-phoneme conversion for synthesis time.
pub struct G2p<S = JiebaSegmenter, L = CachedLookup<PinyinCrateLookup>> {
    segmenter: S,
    lookup: L,
    sandhi: ToneSandhi,
}

impl Default for G2p {
    fn default() -> Self {
        Self::new()
    }
}

impl G2p {
    pub fn new() -> Self {
        Self::with_parts(JiebaSegmenter::new(), CachedLookup::new(PinyinCrateLookup))
    }

    pub fn with_user_dict(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::with_parts(
            JiebaSegmenter::with_user_dict(path)?,
            CachedLookup::new(PinyinCrateLookup),
        ))
    }
}

impl<S: Segmenter, L: PinyinLookup> G2p<S, L> {
    pub fn with_parts(segmenter: S, lookup: L) -> Self {
        Self {
            segmenter,
            lookup,
            sandhi: ToneSandhi::new(),
        }
    }

    pub fn with_sandhi(mut self, sandhi: ToneSandhi) -> Self {
        self.sandhi = sandhi;
        self
    }

    /// Converts a sentence to a phoneme string; `level` 2 and above writes
    /// each word's syllables without separators.
    pub fn convert(&self, sentence: &str, level: u8) -> String {
        self.convert_stream(sentence, Granularity::from_level(level))
            .to_string()
    }

    pub fn convert_stream(&self, sentence: &str, granularity: Granularity) -> PhonemeStream {
        let mut pieces = self.pieces(sentence);

        for i in 1..pieces.len() {
            let (head, tail) = pieces.split_at_mut(i);
            if let (Piece::Tonal(left), Piece::Tonal(right)) = (&mut head[i - 1], &tail[0]) {
                self.sandhi.apply_between(left, right);
            }
        }

        let mut stream = PhonemeStream::new();
        for piece in pieces {
            match piece {
                Piece::Boundary(level) => stream.push_boundary(level),
                Piece::Literal(text) => {
                    stream.push_boundary(BoundaryLevel::ProsodicWord);
                    stream.push_syllable(text);
                }
                Piece::Tonal(word) => {
                    if word.syllables.is_empty() {
                        continue;
                    }
                    stream.push_boundary(BoundaryLevel::ProsodicWord);
                    match granularity {
                        Granularity::Syllable => {
                            for syllable in &word.syllables {
                                stream.push_syllable(syllable.to_string());
                            }
                        }
                        Granularity::Word => stream.push_syllable(
                            word.syllables
                                .iter()
                                .map(ToString::to_string)
                                .collect::<String>(),
                        ),
                    }
                }
            }
        }
        stream
    }

    fn pieces(&self, sentence: &str) -> Vec<Piece> {
        let normalized = normalizer::normalize_text(sentence);
        let tokens = merge_erhua_tokens(self.segmenter.segment(&normalized));

        let mut pieces = Vec::with_capacity(tokens.len());
        for token in &tokens {
            for (kind, run) in script_runs(token) {
                match kind {
                    Script::Space => {}
                    Script::Han => pieces.push(Piece::Tonal(self.pronounce(run))),
                    Script::Punctuation => {
                        if let Some(level) = run.chars().filter_map(punctuation_boundary).max() {
                            pieces.push(Piece::Boundary(level));
                        }
                    }
                    Script::Other => pieces.push(literal_piece(run)),
                }
            }
        }
        pieces
    }

    fn pronounce(&self, token: &str) -> Word {
        let chars: Vec<char> = token.chars().collect();
        let mut syllables: Vec<Syllable> = chars
            .iter()
            .map(|&ch| {
                self.lookup.lookup(ch).unwrap_or_else(|| {
                    debug!("no pinyin for {ch:?}, falling back to neutral tone");
                    Syllable::new("", ch.to_string(), Tone::Neutral)
                })
            })
            .collect();

        if chars.len() >= 2 && chars.last() == Some(&'儿') && !NON_ERHUA_WORDS.contains(token) {
            syllables[chars.len() - 2].rhotacize();
        }

        let mut kept_chars = Vec::with_capacity(chars.len());
        let mut kept: Vec<Syllable> = Vec::with_capacity(chars.len());
        for (ch, syllable) in chars.into_iter().zip(syllables) {
            let merges = ch == '儿' && kept.last().is_some_and(|p| is_erhua(&p.toneless()));
            if merges {
                continue;
            }
            kept_chars.push(ch.to_string());
            kept.push(syllable);
        }

        self.sandhi.apply_in_word(&kept_chars, &mut kept);
        Word::new(token, kept)
    }
}

/// Non-CJK runs are kept as written, except that a toned pinyin literal
/// becomes a syllable (with `hua1r` respelled `huar1`) so it joins sandhi.
fn literal_piece(run: &str) -> Piece {
    if !is_pinyin(run) {
        debug!("passing unsupported token {run:?} through verbatim");
        return Piece::Literal(run.to_string());
    }
    match literal_syllable(run) {
        Some(syllable) => Piece::Tonal(Word::new(run, vec![syllable])),
        None => Piece::Literal(run.to_string()),
    }
}
