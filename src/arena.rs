//! Fixed-capacity bump arena.
//!
//! The arena owns one memory block that is never grown. Allocations bump a
//! cursor and are never freed individually. Everything allocated before
//! [`Arena::freeze_persistent`] lives as long as the arena; everything after it
//! is ephemeral and is discarded wholesale by [`Arena::reset_ephemeral`] at the
//! start of each frame.

use crate::errors::ArenaError;

/// Bytes budgeted per element for labels and text content.
pub const EPHEMERAL_BYTES_PER_ELEMENT: usize = 32;

/// A range of bytes inside an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArenaSlice {
    offset: usize,
    len: usize,
}

impl ArenaSlice {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// A UTF-8 string stored in an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArenaStr(ArenaSlice);

impl ArenaStr {
    pub const EMPTY: Self = Self(ArenaSlice { offset: 0, len: 0 });

    pub fn len(&self) -> usize {
        self.0.len
    }

    pub fn is_empty(&self) -> bool {
        self.0.len == 0
    }

    pub fn offset(&self) -> usize {
        self.0.offset
    }
}

pub struct Arena {
    memory: Box<[u8]>,
    next: usize,
    persistent_end: usize,
}

impl Arena {
    /// A zeroed arena of `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_memory(vec![0u8; capacity])
    }

    /// Takes ownership of caller-provided memory.
    pub fn from_memory(memory: impl Into<Box<[u8]>>) -> Self {
        Self {
            memory: memory.into(),
            next: 0,
            persistent_end: 0,
        }
    }

    /// The smallest arena that holds the root label plus the per-frame string
    /// budget of `max_element_count` elements.
    pub fn min_memory_size(max_element_count: u32) -> usize {
        crate::engine::ROOT_CONTAINER_LABEL.len() + max_element_count as usize * EPHEMERAL_BYTES_PER_ELEMENT
    }

    pub fn capacity(&self) -> usize {
        self.memory.len()
    }

    pub fn used(&self) -> usize {
        self.next
    }

    pub fn remaining(&self) -> usize {
        self.memory.len() - self.next
    }

    /// Bytes that survive [`Arena::reset_ephemeral`].
    pub fn persistent_size(&self) -> usize {
        self.persistent_end
    }

    /// Reserves `size` bytes aligned to `align` (a power of two).
    ///
    /// Fails without touching the cursor when the request does not fit.
    pub fn alloc(&mut self, size: usize, align: usize) -> Result<ArenaSlice, ArenaError> {
        let align = align.max(1);
        debug_assert!(align.is_power_of_two());
        let start = (self.next + align - 1) & !(align - 1);
        match start.checked_add(size) {
            Some(end) if end <= self.memory.len() => {
                self.next = end;
                Ok(ArenaSlice { offset: start, len: size })
            }
            _ => Err(ArenaError {
                requested: size,
                remaining: self.remaining(),
            }),
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<ArenaSlice, ArenaError> {
        let slice = self.alloc(bytes.len(), 1)?;
        self.memory[slice.offset..slice.offset + slice.len].copy_from_slice(bytes);
        Ok(slice)
    }

    pub fn write_str(&mut self, s: &str) -> Result<ArenaStr, ArenaError> {
        if s.is_empty() {
            return Ok(ArenaStr::EMPTY);
        }
        self.write_bytes(s.as_bytes()).map(ArenaStr)
    }

    pub fn bytes(&self, slice: ArenaSlice) -> &[u8] {
        &self.memory[slice.offset..slice.offset + slice.len]
    }

    pub fn str(&self, s: ArenaStr) -> &str {
        // Only `write_str` creates an ArenaStr, so the bytes are valid UTF-8.
        std::str::from_utf8(self.bytes(s.0)).unwrap_or_default()
    }

    /// Everything allocated so far becomes persistent.
    pub fn freeze_persistent(&mut self) {
        self.persistent_end = self.next;
    }

    /// Drops every allocation made after the last [`Arena::freeze_persistent`].
    pub fn reset_ephemeral(&mut self) {
        self.next = self.persistent_end;
    }

    /// Drops every allocation, persistent ones included.
    pub fn reset_all(&mut self) {
        self.next = 0;
        self.persistent_end = 0;
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("used", &self.next)
            .field("persistent_end", &self.persistent_end)
            .finish()
    }
}
