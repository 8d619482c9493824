//! Element identifiers.
//!
//! Ids are Jenkins one-at-a-time hashes of a label, an optional index, and a
//! seed. The seed is `0` for global ids and the parent's id for local ones, so
//! the same label can be reused under different parents. Hashing is fully
//! deterministic, which is what makes per-element state (scroll offsets, hover
//! targets) survive from one frame to the next.

use std::fmt;

/// Owned label kept next to an id for debugging and error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringId {
    text: String,
}

impl StringId {
    pub fn new(s: &str) -> Self {
        Self {
            text: s.to_string(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A hashed element identifier.
///
/// Equality and hashing only look at [`ElementId::id`].
#[derive(Debug, Clone, Default)]
pub struct ElementId {
    /// The final hash, never `0` for hashed ids.
    pub id: u32,
    /// The index folded into the hash.
    pub offset: u32,
    /// The hash of the label and seed without the index.
    pub base_id: u32,
    /// The label the id was built from. Empty for anonymous elements.
    pub string_id: StringId,
}

impl ElementId {
    /// Global id from a label.
    #[inline]
    pub fn new(label: &str) -> Self {
        hash_string(label, 0)
    }

    /// Global id from a label and an index, for repeated elements.
    #[inline]
    pub fn new_index(label: &str, index: u32) -> Self {
        hash_string_with_offset(label, index, 0)
    }

    /// Id scoped under `parent_id`.
    #[inline]
    pub fn new_local(label: &str, parent_id: u32) -> Self {
        hash_string(label, parent_id)
    }

    /// Indexed id scoped under `parent_id`.
    #[inline]
    pub fn new_index_local(label: &str, index: u32, parent_id: u32) -> Self {
        hash_string_with_offset(label, index, parent_id)
    }

    pub fn label(&self) -> &str {
        self.string_id.as_str()
    }
}

impl PartialEq for ElementId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ElementId {}

impl std::hash::Hash for ElementId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.string_id.is_empty() {
            write!(f, "#{:08x}", self.id)
        } else if self.offset != 0 {
            write!(f, "{}[{}]#{:08x}", self.string_id.as_str(), self.offset, self.id)
        } else {
            write!(f, "{}#{:08x}", self.string_id.as_str(), self.id)
        }
    }
}

impl From<&str> for ElementId {
    fn from(label: &str) -> Self {
        ElementId::new(label)
    }
}

impl From<(&str, u32)> for ElementId {
    fn from((label, index): (&str, u32)) -> Self {
        ElementId::new_index(label, index)
    }
}

// ============================================================================
// Hash functions
// ============================================================================

#[inline]
fn mix(mut hash: u32, value: u32) -> u32 {
    hash = hash.wrapping_add(value);
    hash = hash.wrapping_add(hash << 10);
    hash ^ (hash >> 6)
}

#[inline]
fn finalize(mut hash: u32) -> u32 {
    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash.wrapping_add(hash << 15)
}

pub fn hash_string(key: &str, seed: u32) -> ElementId {
    let hash = finalize(key.bytes().fold(seed, |h, b| mix(h, b as u32)));
    ElementId {
        id: hash.wrapping_add(1),
        offset: 0,
        base_id: hash.wrapping_add(1),
        string_id: StringId::new(key),
    }
}

pub fn hash_string_with_offset(key: &str, offset: u32, seed: u32) -> ElementId {
    let base = key.bytes().fold(seed, |h, b| mix(h, b as u32));
    let hash = finalize(mix(base, offset));
    ElementId {
        id: hash.wrapping_add(1),
        offset,
        base_id: finalize(base).wrapping_add(1),
        string_id: StringId::new(key),
    }
}

/// Id of an anonymous element: its position among the parent's children,
/// seeded with the parent id.
pub(crate) fn hash_number(offset: u32, seed: u32) -> ElementId {
    let hash = finalize(mix(seed, offset.wrapping_add(48)));
    ElementId {
        id: hash.wrapping_add(1),
        offset,
        base_id: seed,
        string_id: StringId::empty(),
    }
}

/// Jenkins hash over arbitrary bytes, used for the text measurement cache key.
pub(crate) fn hash_bytes(data: &[u8], seed: u32) -> u32 {
    data.iter().fold(seed, |h, &b| mix(h, b as u32))
}

pub(crate) fn hash_finalize(hash: u32) -> u32 {
    finalize(hash).wrapping_add(1)
}

#[inline]
pub(crate) fn hash_mix(hash: u32, value: u32) -> u32 {
    mix(hash, value)
}
