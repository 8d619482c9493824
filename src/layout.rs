use crate::align::{AlignX, AlignY};

/// Defines different sizing behaviors for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SizingType {
    /// The element's size is determined by its content and constrained by min/max values.
    #[default]
    Fit,
    /// The element expands to fill available space within min/max constraints.
    Grow,
    /// The element's size is a fraction of its parent's inner size.
    Percent,
    /// The element's size is set to a fixed value.
    Fixed,
}

/// Represents different sizing strategies for layout elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sizing {
    /// Fits the element’s width/height within a min and max constraint.
    Fit(f32, f32),
    /// Expands the element to fill available space within min/max constraints.
    Grow(f32, f32),
    /// Sets a fixed width/height.
    Fixed(f32),
    /// Sets width/height as a fraction of its parent. Value should be between `0.0` and `1.0`.
    Percent(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingMinMax {
    pub min: f32,
    pub max: f32,
}

impl Default for SizingMinMax {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: f32::MAX,
        }
    }
}

/// Resolved sizing rule for one axis. `min_max` is ignored for `Percent`,
/// `percent` is ignored for everything else.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SizingAxis {
    pub type_: SizingType,
    pub min_max: SizingMinMax,
    pub percent: f32,
}

impl From<Sizing> for SizingAxis {
    fn from(value: Sizing) -> Self {
        match value {
            Sizing::Fit(min, max) => Self {
                type_: SizingType::Fit,
                min_max: SizingMinMax { min, max },
                percent: 0.0,
            },
            Sizing::Grow(min, max) => Self {
                type_: SizingType::Grow,
                min_max: SizingMinMax { min, max },
                percent: 0.0,
            },
            Sizing::Fixed(size) => Self {
                type_: SizingType::Fixed,
                min_max: SizingMinMax {
                    min: size,
                    max: size,
                },
                percent: 0.0,
            },
            Sizing::Percent(percent) => Self {
                type_: SizingType::Percent,
                min_max: SizingMinMax::default(),
                percent,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SizingConfig {
    pub width: SizingAxis,
    pub height: SizingAxis,
}

impl SizingConfig {
    #[inline]
    pub(crate) fn along(&self, x_axis: bool) -> &SizingAxis {
        if x_axis {
            &self.width
        } else {
            &self.height
        }
    }

    #[inline]
    pub(crate) fn along_mut(&mut self, x_axis: bool) -> &mut SizingAxis {
        if x_axis {
            &mut self.width
        } else {
            &mut self.height
        }
    }
}

/// Represents padding values for each side of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    pub left: u16,
    pub right: u16,
    pub top: u16,
    pub bottom: u16,
}

impl Padding {
    pub fn new(left: u16, right: u16, top: u16, bottom: u16) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Sets the same padding value for all sides.
    pub fn all(value: u16) -> Self {
        Self::new(value, value, value, value)
    }

    /// Left and right get `value`, top and bottom are `0`.
    pub fn horizontal(value: u16) -> Self {
        Self::new(value, value, 0, 0)
    }

    /// Top and bottom get `value`, left and right are `0`.
    pub fn vertical(value: u16) -> Self {
        Self::new(0, 0, value, value)
    }

    /// Sum of both sides along one axis.
    #[inline]
    pub(crate) fn along(&self, x_axis: bool) -> f32 {
        if x_axis {
            (self.left + self.right) as f32
        } else {
            (self.top + self.bottom) as f32
        }
    }
}

impl From<u16> for Padding {
    fn from(value: u16) -> Self {
        Self::all(value)
    }
}

impl From<(u16, u16, u16, u16)> for Padding {
    /// Creates padding from a tuple in CSS order: (top, right, bottom, left).
    fn from((top, right, bottom, left): (u16, u16, u16, u16)) -> Self {
        Self { left, right, top, bottom }
    }
}

/// Defines the layout direction for arranging child elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum LayoutDirection {
    /// Arranges elements from left to right.
    #[default]
    LeftToRight,
    /// Arranges elements from top to bottom.
    TopToBottom,
}

impl LayoutDirection {
    #[inline]
    pub(crate) fn is_x_axis(self) -> bool {
        self == LayoutDirection::LeftToRight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChildAlignment {
    pub x: AlignX,
    pub y: AlignY,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutConfig {
    pub sizing: SizingConfig,
    pub padding: Padding,
    pub child_gap: u16,
    pub child_alignment: ChildAlignment,
    pub layout_direction: LayoutDirection,
}

/// Builder for configuring layout properties using a closure.
pub struct LayoutBuilder {
    pub(crate) config: LayoutConfig,
}

impl LayoutBuilder {
    /// Sets the horizontal sizing rule.
    #[inline]
    pub fn width(&mut self, width: Sizing) -> &mut Self {
        self.config.sizing.width = width.into();
        self
    }

    /// Sets the vertical sizing rule.
    #[inline]
    pub fn height(&mut self, height: Sizing) -> &mut Self {
        self.config.sizing.height = height.into();
        self
    }

    /// Sets the spacing between child elements.
    #[inline]
    pub fn gap(&mut self, gap: u16) -> &mut Self {
        self.config.child_gap = gap;
        self
    }

    /// Sets the alignment of child elements using separate X and Y values.
    #[inline]
    pub fn align(&mut self, x: AlignX, y: AlignY) -> &mut Self {
        self.config.child_alignment.x = x;
        self.config.child_alignment.y = y;
        self
    }

    /// Sets the layout direction.
    #[inline]
    pub fn direction(&mut self, direction: LayoutDirection) -> &mut Self {
        self.config.layout_direction = direction;
        self
    }

    /// Sets padding values for the layout.
    #[inline]
    pub fn padding(&mut self, padding: impl Into<Padding>) -> &mut Self {
        self.config.padding = padding.into();
        self
    }
}

/// Shorthand macro for [`Sizing::Fit`]. Defaults max to `f32::MAX` if omitted.
#[macro_export]
macro_rules! fit {
    ($min:expr, $max:expr) => {
        $crate::layout::Sizing::Fit($min, $max)
    };
    ($min:expr) => {
        $crate::fit!($min, f32::MAX)
    };
    () => {
        $crate::fit!(0.0)
    };
}

/// Shorthand macro for [`Sizing::Grow`]. Defaults max to `f32::MAX` if omitted.
#[macro_export]
macro_rules! grow {
    ($min:expr, $max:expr) => {
        $crate::layout::Sizing::Grow($min, $max)
    };
    ($min:expr) => {
        $crate::grow!($min, f32::MAX)
    };
    () => {
        $crate::grow!(0.0)
    };
}

/// Shorthand macro for [`Sizing::Fixed`].
#[macro_export]
macro_rules! fixed {
    ($val:expr) => {
        $crate::layout::Sizing::Fixed($val)
    };
}

/// Shorthand macro for [`Sizing::Percent`].
/// The value has to be in range `0.0..=1.0`.
#[macro_export]
macro_rules! percent {
    ($percent:expr) => {{
        const _: () = assert!(
            $percent >= 0.0 && $percent <= 1.0,
            "Percent value must be between 0.0 and 1.0 inclusive!"
        );
        $crate::layout::Sizing::Percent($percent)
    }};
}
