pub mod cn2an;
pub mod g2p;
pub mod normalizer;
pub mod pinyin_lookup;
pub mod prosody_label;
pub mod syllable;
pub mod tone_sandhi;

/// True for characters in the CJK Unified Ideographs block.
pub fn is_cjk(ch: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&ch)
}
