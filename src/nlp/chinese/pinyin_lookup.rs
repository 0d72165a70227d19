use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use pinyin::ToPinyin;

use super::syllable::Syllable;

/// Base (pre-sandhi) pronunciation of a single character.
pub trait PinyinLookup {
    fn lookup(&self, ch: char) -> Option<Syllable>;
}

/// Dictionary lookup backed by the `pinyin` crate, most common reading first.
#[derive(Debug, Default, Clone, Copy)]
pub struct PinyinCrateLookup;

impl PinyinLookup for PinyinCrateLookup {
    fn lookup(&self, ch: char) -> Option<Syllable> {
        let py = ch.to_pinyin()?;
        Syllable::from_numbered(py.with_tone_num_end())
    }
}

/// Memoises another lookup for the lifetime of the value.
///
/// The vocabulary is closed, so the cache is never evicted. Misses are cached
/// too, so unknown characters only reach the inner lookup once.
#[derive(Debug, Default)]
pub struct CachedLookup<L> {
    inner: L,
    cache: RwLock<HashMap<char, Option<Syllable>>>,
}

impl<L: PinyinLookup> CachedLookup<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<L: PinyinLookup> PinyinLookup for CachedLookup<L> {
    fn lookup(&self, ch: char) -> Option<Syllable> {
        if let Some(cached) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&ch)
        {
            return cached.clone();
        }

        let result = self.inner.lookup(ch);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ch, result.clone());
        result
    }
}
