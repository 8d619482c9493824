//! Everything needed to declare a frame, in one import.
//!
//! ```rust
//! use claylay::prelude::*;
//! ```

// Core types
pub use crate::engine::LayoutContext;
pub use crate::Ui;
pub use crate::elements::Declaration;
pub use crate::id::ElementId;
pub use crate::math::{BoundingBox, Dimensions, Vector2};
pub use crate::color::Color;
pub use crate::handle::Handle;
pub use crate::render_commands::{RenderCommand, RenderCommandConfig};

// Macros
pub use crate::{fit, fixed, grow, percent};

// Alignment, globbed
pub use crate::align::AlignX::{self, *};
pub use crate::align::AlignY::{self, *};

// LayoutDirection, globbed
pub use crate::layout::LayoutDirection::{self, *};

// Text types only, not globbed
pub use crate::text::{TextAlignment, TextConfig, WrapMode};
