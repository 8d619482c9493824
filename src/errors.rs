use thiserror::Error as ThisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorType {
    /// No measurement function was set; the monospace fallback is used instead.
    TextMeasurementFunctionNotProvided,
    /// The arena has no room left for this frame's strings.
    ArenaCapacityExceeded,
    /// More elements were declared than `max_element_count` allows.
    ElementsCapacityExceeded,
    /// The word cache of the text measurement is full.
    TextMeasurementCapacityExceeded,
    /// Two elements in the same frame resolved to the same id.
    DuplicateId,
    /// A floating element names an attach target that does not exist.
    FloatingContainerParentNotFound,
    /// Close without open, or elements still open at the end of the layout.
    UnbalancedTree,
    /// Configuration applied while no element was open, or outside a layout.
    MalformedDeclaration,
    /// Grow/shrink distribution hit its iteration cap.
    LayoutNotConverged,
}

impl ErrorType {
    /// Caller bugs, as opposed to capacity or convergence problems.
    pub fn is_usage_error(self) -> bool {
        matches!(
            self,
            ErrorType::DuplicateId | ErrorType::UnbalancedTree | ErrorType::MalformedDeclaration
        )
    }
}

/// What the error handler receives.
#[derive(Debug, Clone, Copy)]
pub struct Error<'a> {
    pub type_: ErrorType,
    pub text: &'a str,
}

/// Called synchronously for every reported error.
pub type ErrorHandler = Box<dyn FnMut(Error<'_>)>;

/// Logs through `tracing`.
pub(crate) fn default_error_handler() -> ErrorHandler {
    Box::new(|error: Error<'_>| {
        tracing::warn!(kind = ?error.type_, "{}", error.text);
    })
}

#[derive(Debug, ThisError)]
pub enum InitError {
    #[error("arena of {provided} bytes is smaller than the {required} bytes required")]
    InsufficientMemory { provided: usize, required: usize },
    #[error("layout dimensions must be finite and non-negative, got {width}x{height}")]
    InvalidDimensions { width: f32, height: f32 },
    #[error("max_element_count must be at least 1")]
    ZeroElementCapacity,
}

/// A bump allocation that did not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
#[error("arena capacity exceeded: requested {requested} bytes with {remaining} remaining")]
pub struct ArenaError {
    pub requested: usize,
    pub remaining: usize,
}

/// Returned by [`crate::engine::LayoutContext::close_element`] and
/// [`crate::engine::LayoutContext::end_layout_checked`] when opens and closes
/// do not pair up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
#[must_use]
pub enum UnbalancedTreeError {
    #[error("close_element called with no open element")]
    CloseWithoutOpen,
    #[error("layout ended with {open} element(s) still open")]
    LeftOpen { open: usize },
    #[error("no layout is in progress")]
    NoLayout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_errors_are_classified() {
        assert!(ErrorType::DuplicateId.is_usage_error());
        assert!(ErrorType::UnbalancedTree.is_usage_error());
        assert!(!ErrorType::ArenaCapacityExceeded.is_usage_error());
        assert!(!ErrorType::LayoutNotConverged.is_usage_error());
    }

    #[test]
    fn init_error_messages() {
        let err = InitError::InsufficientMemory {
            provided: 10,
            required: 20,
        };
        assert_eq!(
            err.to_string(),
            "arena of 10 bytes is smaller than the 20 bytes required"
        );
        assert_eq!(
            UnbalancedTreeError::LeftOpen { open: 2 }.to_string(),
            "layout ended with 2 element(s) still open"
        );
    }
}
