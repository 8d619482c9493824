#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Horizontal alignment of children inside their parent's free space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum AlignX {
    #[default]
    Left,
    CenterX,
    Right,
}

/// Vertical alignment of children inside their parent's free space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum AlignY {
    #[default]
    Top,
    CenterY,
    Bottom,
}

impl AlignX {
    /// Offset of an item inside `free` leftover space.
    #[inline]
    pub(crate) fn offset(self, free: f32) -> f32 {
        match self {
            AlignX::Left => 0.0,
            AlignX::CenterX => free / 2.0,
            AlignX::Right => free,
        }
    }
}

impl AlignY {
    #[inline]
    pub(crate) fn offset(self, free: f32) -> f32 {
        match self {
            AlignY::Top => 0.0,
            AlignY::CenterY => free / 2.0,
            AlignY::Bottom => free,
        }
    }
}
