//! Boundary vocabulary shared by the label parsers and the G2P facade.

use std::fmt;

/// Prosodic boundary levels, ordered by scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BoundaryLevel {
    Syllable,
    ProsodicWord,
    ProsodicPhrase,
    IntonationPhrase,
    Sentence,
}

impl BoundaryLevel {
    pub fn marker(self) -> &'static str {
        match self {
            BoundaryLevel::Syllable => "-",
            BoundaryLevel::ProsodicWord => " ",
            BoundaryLevel::ProsodicPhrase => " / ",
            BoundaryLevel::IntonationPhrase => ", ",
            BoundaryLevel::Sentence => ".",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Syllable(String),
    Boundary(BoundaryLevel),
}

/// Syllables interleaved with boundary markers.
///
/// The builder keeps the stream well formed: it never starts with a marker,
/// never holds two markers in a row (the higher level wins), and drops a
/// trailing marker on rendering unless it closes a sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhonemeStream {
    elements: Vec<Element>,
}

impl PhonemeStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a syllable, separating it from a preceding one with a
    /// syllable-level boundary.
    pub fn push_syllable(&mut self, syllable: impl Into<String>) {
        if matches!(self.elements.last(), Some(Element::Syllable(_))) {
            self.elements.push(Element::Boundary(BoundaryLevel::Syllable));
        }
        self.elements.push(Element::Syllable(syllable.into()));
    }

    pub fn push_boundary(&mut self, level: BoundaryLevel) {
        match self.elements.last_mut() {
            None => {}
            Some(Element::Boundary(prev)) => *prev = (*prev).max(level),
            Some(Element::Syllable(_)) => self.elements.push(Element::Boundary(level)),
        }
    }

    /// True when the last element is a boundary, i.e. the next syllable starts
    /// a new unit.
    pub fn at_boundary(&self) -> bool {
        !matches!(self.elements.last(), Some(Element::Syllable(_)))
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn syllables(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            Element::Syllable(s) => Some(s.as_str()),
            Element::Boundary(_) => None,
        })
    }
}

impl fmt::Display for PhonemeStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = match self.elements.last() {
            Some(Element::Boundary(level)) if *level != BoundaryLevel::Sentence => {
                self.elements.len() - 1
            }
            _ => self.elements.len(),
        };
        for element in &self.elements[..end] {
            match element {
                Element::Syllable(s) => f.write_str(s)?,
                Element::Boundary(level) => f.write_str(level.marker())?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered_by_scope() {
        assert!(BoundaryLevel::Syllable < BoundaryLevel::ProsodicWord);
        assert!(BoundaryLevel::ProsodicWord < BoundaryLevel::ProsodicPhrase);
        assert!(BoundaryLevel::ProsodicPhrase < BoundaryLevel::IntonationPhrase);
        assert!(BoundaryLevel::IntonationPhrase < BoundaryLevel::Sentence);
    }

    #[test]
    fn adjacent_syllables_get_syllable_separator() {
        let mut stream = PhonemeStream::new();
        stream.push_syllable("ma1");
        stream.push_syllable("ma1");
        stream.push_boundary(BoundaryLevel::ProsodicWord);
        stream.push_syllable("hao3");
        assert_eq!(stream.to_string(), "ma1-ma1 hao3");
    }

    #[test]
    fn leading_boundary_is_dropped() {
        let mut stream = PhonemeStream::new();
        stream.push_boundary(BoundaryLevel::ProsodicPhrase);
        assert!(stream.is_empty());
        stream.push_syllable("a1");
        assert_eq!(stream.elements(), &[Element::Syllable("a1".into())]);
    }

    #[test]
    fn only_highest_adjacent_boundary_survives() {
        let mut stream = PhonemeStream::new();
        stream.push_syllable("shi2");
        stream.push_boundary(BoundaryLevel::IntonationPhrase);
        stream.push_boundary(BoundaryLevel::ProsodicWord);
        stream.push_boundary(BoundaryLevel::ProsodicPhrase);
        stream.push_syllable("ke4");
        stream.push_boundary(BoundaryLevel::ProsodicPhrase);
        stream.push_boundary(BoundaryLevel::Sentence);
        assert_eq!(stream.to_string(), "shi2, ke4.");
    }

    #[test]
    fn trailing_non_sentence_boundary_is_not_rendered() {
        let mut stream = PhonemeStream::new();
        stream.push_syllable("ni3");
        stream.push_boundary(BoundaryLevel::IntonationPhrase);
        assert_eq!(stream.to_string(), "ni3");
        assert!(stream.at_boundary());
    }
}
