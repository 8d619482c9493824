//! Per-frame string interner backed by the arena.

use rustc_hash::FxHashMap;

use crate::arena::{Arena, ArenaStr};
use crate::errors::ArenaError;
use crate::id::{hash_bytes, hash_finalize};

/// Stores each distinct string once per frame.
///
/// Most strings live in the ephemeral part of the arena, so
/// [`StringInterner::clear_ephemeral`] must run whenever the arena's ephemeral
/// region is reset. Strings interned before the arena was frozen survive it.
#[derive(Debug, Default)]
pub struct StringInterner {
    entries: FxHashMap<u32, Vec<ArenaStr>>,
    stored_bytes: usize,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, arena: &mut Arena, s: &str) -> Result<ArenaStr, ArenaError> {
        if s.is_empty() {
            return Ok(ArenaStr::EMPTY);
        }
        let key = hash_finalize(hash_bytes(s.as_bytes(), 0));
        if let Some(existing) = self
            .entries
            .get(&key)
            .and_then(|bucket| bucket.iter().find(|stored| arena.str(**stored) == s))
        {
            return Ok(*existing);
        }
        let stored = arena.write_str(s)?;
        self.stored_bytes += s.len();
        self.entries.entry(key).or_default().push(stored);
        Ok(stored)
    }

    /// Distinct strings interned since the last clear.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stored_bytes(&self) -> usize {
        self.stored_bytes
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.stored_bytes = 0;
    }

    /// Forgets every string stored at or past `persistent_end`, the arena's
    /// persistent size.
    pub fn clear_ephemeral(&mut self, persistent_end: usize) {
        self.entries.retain(|_, bucket| {
            bucket.retain(|stored| stored.offset() < persistent_end);
            !bucket.is_empty()
        });
        self.stored_bytes = self.entries.values().flatten().map(ArenaStr::len).sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_are_stored_once() {
        let mut arena = Arena::with_capacity(64);
        let mut strings = StringInterner::new();
        let a = strings.intern(&mut arena, "Button").unwrap();
        let b = strings.intern(&mut arena, "Button").unwrap();
        assert_eq!(a, b);
        assert_eq!(arena.used(), 6);
        assert_eq!(strings.len(), 1);
        assert_eq!(arena.str(a), "Button");
    }

    #[test]
    fn distinct_strings_get_distinct_slots() {
        let mut arena = Arena::with_capacity(64);
        let mut strings = StringInterner::new();
        let a = strings.intern(&mut arena, "left").unwrap();
        let b = strings.intern(&mut arena, "right").unwrap();
        assert_ne!(a, b);
        assert_eq!(strings.stored_bytes(), 9);
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut arena = Arena::with_capacity(4);
        let mut strings = StringInterner::new();
        assert!(strings.intern(&mut arena, "too long").is_err());
        assert!(strings.is_empty());
        assert_eq!(strings.len(), 0);
        assert!(strings.intern(&mut arena, "ok").is_ok());
        assert!(!strings.is_empty());
    }

    #[test]
    fn clear_forgets_entries() {
        let mut arena = Arena::with_capacity(64);
        let mut strings = StringInterner::new();
        strings.intern(&mut arena, "title").unwrap();
        strings.clear();
        arena.reset_ephemeral();
        assert!(strings.is_empty());
        let again = strings.intern(&mut arena, "other").unwrap();
        assert_eq!(again.len(), 5);
    }

    #[test]
    fn frozen_strings_survive_a_frame_reset() {
        let mut arena = Arena::with_capacity(64);
        let mut strings = StringInterner::new();
        let root = strings.intern(&mut arena, "root").unwrap();
        arena.freeze_persistent();
        strings.intern(&mut arena, "label").unwrap();

        arena.reset_ephemeral();
        strings.clear_ephemeral(arena.persistent_size());
        assert_eq!(strings.len(), 1);
        assert_eq!(strings.stored_bytes(), 4);
        assert_eq!(strings.intern(&mut arena, "root").unwrap(), root);
        assert_eq!(arena.used(), 4);
    }
}
