pub mod chinese;
pub mod prosody;

use prosody::BoundaryLevel;

/// Boundary implied by a punctuation character at synthesis time.
///
/// Returns `None` for anything that is not punctuation, so callers can tell
/// boundary tokens from literal ones.
pub fn punctuation_boundary(ch: char) -> Option<BoundaryLevel> {
    match ch {
        '.' | '!' | '?' | '…' | '。' | '！' | '？' => Some(BoundaryLevel::Sentence),
        ',' | ';' | ':' | '，' | '；' | '：' | '、' => Some(BoundaryLevel::IntonationPhrase),
        '\'' | '"' | '-' | '“' | '”' | '‘' | '’' | '（' | '）' | '(' | ')' | '《' | '》' | '—'
        | '～' | '~' => Some(BoundaryLevel::ProsodicWord),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_levels_follow_punctuation_strength() {
        assert_eq!(punctuation_boundary('。'), Some(BoundaryLevel::Sentence));
        assert_eq!(punctuation_boundary('?'), Some(BoundaryLevel::Sentence));
        assert_eq!(punctuation_boundary('、'), Some(BoundaryLevel::IntonationPhrase));
        assert_eq!(punctuation_boundary('"'), Some(BoundaryLevel::ProsodicWord));
        assert_eq!(punctuation_boundary('a'), None);
        assert_eq!(punctuation_boundary('好'), None);
        assert_eq!(punctuation_boundary('★'), None);
    }
}
