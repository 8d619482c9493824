//! Opaque payloads carried from declarations into render commands.

use std::fmt;
use std::sync::{Arc, Mutex};

/// A host-owned payload attached to an element (image, custom data, user data).
///
/// `Shared` payloads may be read any number of times. `Once` payloads are
/// moved out by exactly one consumer via [`Handle::take`]; clones of a `Once`
/// handle share the same slot, so only the first `take` across all clones
/// succeeds.
pub enum Handle<P> {
    Shared(Arc<P>),
    Once(Arc<Mutex<Option<P>>>),
}

impl<P> Handle<P> {
    pub fn shared(payload: P) -> Self {
        Handle::Shared(Arc::new(payload))
    }

    pub fn once(payload: P) -> Self {
        Handle::Once(Arc::new(Mutex::new(Some(payload))))
    }

    /// Whether reads may be repeated.
    pub fn is_repeatable(&self) -> bool {
        matches!(self, Handle::Shared(_))
    }

    /// Borrow a shared payload. Always `None` for single-use handles.
    pub fn get(&self) -> Option<&P> {
        match self {
            Handle::Shared(payload) => Some(payload),
            Handle::Once(_) => None,
        }
    }

    /// True once a single-use payload has been taken.
    pub fn is_spent(&self) -> bool {
        match self {
            Handle::Shared(_) => false,
            Handle::Once(slot) => slot.lock().map(|slot| slot.is_none()).unwrap_or(true),
        }
    }

    /// Runs `f` on the payload without consuming it, if it is still present.
    pub fn with<R>(&self, f: impl FnOnce(&P) -> R) -> Option<R> {
        match self {
            Handle::Shared(payload) => Some(f(payload)),
            Handle::Once(slot) => slot.lock().ok()?.as_ref().map(f),
        }
    }
}

impl<P: Clone> Handle<P> {
    /// Shared payloads are cloned out; single-use payloads are moved out the
    /// first time and yield `None` afterwards.
    pub fn take(&self) -> Option<P> {
        match self {
            Handle::Shared(payload) => Some(P::clone(payload)),
            Handle::Once(slot) => slot.lock().ok()?.take(),
        }
    }
}

impl<P> Clone for Handle<P> {
    fn clone(&self) -> Self {
        match self {
            Handle::Shared(payload) => Handle::Shared(Arc::clone(payload)),
            Handle::Once(slot) => Handle::Once(Arc::clone(slot)),
        }
    }
}

impl<P> fmt::Debug for Handle<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handle::Shared(_) => f.write_str("Handle::Shared(..)"),
            Handle::Once(_) if self.is_spent() => f.write_str("Handle::Once(<taken>)"),
            Handle::Once(_) => f.write_str("Handle::Once(..)"),
        }
    }
}

impl<P> From<P> for Handle<P> {
    fn from(payload: P) -> Self {
        Handle::shared(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_reads_repeat() {
        let handle = Handle::shared(String::from("atlas.png"));
        assert!(handle.is_repeatable());
        assert_eq!(handle.get().map(String::as_str), Some("atlas.png"));
        assert_eq!(handle.take().as_deref(), Some("atlas.png"));
        assert_eq!(handle.take().as_deref(), Some("atlas.png"));
        assert!(!handle.is_spent());
    }

    #[test]
    fn once_is_taken_by_a_single_consumer() {
        let handle = Handle::once(7u32);
        let clone = handle.clone();
        assert!(!handle.is_repeatable());
        assert_eq!(handle.get(), None);
        assert_eq!(handle.with(|v| *v + 1), Some(8));
        assert_eq!(clone.take(), Some(7));
        assert_eq!(handle.take(), None);
        assert!(handle.is_spent());
        assert_eq!(handle.with(|v| *v), None);
    }

    #[test]
    fn debug_does_not_require_payload_debug() {
        struct Opaque;
        let handle = Handle::once(Opaque);
        assert_eq!(format!("{handle:?}"), "Handle::Once(..)");
    }
}
