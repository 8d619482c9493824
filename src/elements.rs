use crate::align::{AlignX, AlignY};
use crate::color::Color;
use crate::handle::Handle;
use crate::id::ElementId;
use crate::layout::{LayoutBuilder, LayoutConfig, Sizing};
use crate::math::{Dimensions, Vector2};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CornerRadius {
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_left: f32,
    pub bottom_right: f32,
}

impl CornerRadius {
    pub fn is_zero(&self) -> bool {
        self.top_left == 0.0
            && self.top_right == 0.0
            && self.bottom_left == 0.0
            && self.bottom_right == 0.0
    }
}

impl From<f32> for CornerRadius {
    /// Creates a corner radius with the same value for all corners.
    fn from(value: f32) -> Self {
        Self {
            top_left: value,
            top_right: value,
            bottom_left: value,
            bottom_right: value,
        }
    }
}

impl From<(f32, f32, f32, f32)> for CornerRadius {
    /// Creates corner radii from a tuple in CSS order: (top-left, top-right, bottom-right, bottom-left).
    fn from((tl, tr, br, bl): (f32, f32, f32, f32)) -> Self {
        Self {
            top_left: tl,
            top_right: tr,
            bottom_left: bl,
            bottom_right: br,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BorderWidth {
    pub left: u16,
    pub right: u16,
    pub top: u16,
    pub bottom: u16,
    /// Width of separators drawn in the gaps between children.
    pub between_children: u16,
}

impl BorderWidth {
    pub fn is_zero(&self) -> bool {
        self.left == 0
            && self.right == 0
            && self.top == 0
            && self.bottom == 0
            && self.between_children == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BorderConfig {
    pub color: Color,
    pub width: BorderWidth,
}

/// Clipping (and scrolling) of an element's children.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClipConfig {
    pub horizontal: bool,
    pub vertical: bool,
    /// Offset applied to all children, usually the scroll position.
    pub child_offset: Vector2,
}

impl ClipConfig {
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.horizontal || self.vertical
    }
}

/// One point of the 9-point anchor grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum FloatingAttachPointType {
    #[default]
    LeftTop,
    LeftCenter,
    LeftBottom,
    CenterTop,
    CenterCenter,
    CenterBottom,
    RightTop,
    RightCenter,
    RightBottom,
}

impl FloatingAttachPointType {
    pub fn new(x: AlignX, y: AlignY) -> Self {
        use FloatingAttachPointType::*;
        match (x, y) {
            (AlignX::Left, AlignY::Top) => LeftTop,
            (AlignX::Left, AlignY::CenterY) => LeftCenter,
            (AlignX::Left, AlignY::Bottom) => LeftBottom,
            (AlignX::CenterX, AlignY::Top) => CenterTop,
            (AlignX::CenterX, AlignY::CenterY) => CenterCenter,
            (AlignX::CenterX, AlignY::Bottom) => CenterBottom,
            (AlignX::Right, AlignY::Top) => RightTop,
            (AlignX::Right, AlignY::CenterY) => RightCenter,
            (AlignX::Right, AlignY::Bottom) => RightBottom,
        }
    }

    pub fn x(self) -> AlignX {
        use FloatingAttachPointType::*;
        match self {
            LeftTop | LeftCenter | LeftBottom => AlignX::Left,
            CenterTop | CenterCenter | CenterBottom => AlignX::CenterX,
            RightTop | RightCenter | RightBottom => AlignX::Right,
        }
    }

    pub fn y(self) -> AlignY {
        use FloatingAttachPointType::*;
        match self {
            LeftTop | CenterTop | RightTop => AlignY::Top,
            LeftCenter | CenterCenter | RightCenter => AlignY::CenterY,
            LeftBottom | CenterBottom | RightBottom => AlignY::Bottom,
        }
    }
}

impl From<(AlignX, AlignY)> for FloatingAttachPointType {
    fn from((x, y): (AlignX, AlignY)) -> Self {
        Self::new(x, y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FloatingAttachPoints {
    /// The point on the floating element.
    pub element: FloatingAttachPointType,
    /// The point on the attach target it is pinned to.
    pub parent: FloatingAttachPointType,
}

/// Specifies how pointer capture should behave for floating elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PointerCaptureMode {
    /// Elements below the floating element do not receive the pointer.
    #[default]
    Capture,
    /// Allows pointer input to pass through.
    Passthrough,
}

/// Defines how a floating element is attached to other elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum FloatingAttachToElement {
    /// The element is not floating.
    #[default]
    None,
    /// The floating element is attached to its parent element.
    Parent,
    /// The floating element is attached to a specific element identified by an ID.
    ElementWithId,
    /// The floating element is attached to the root of the layout.
    Root,
}

/// Defines how a floating element is clipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum FloatingClipToElement {
    /// The floating element is not clipped.
    #[default]
    None,
    /// The floating element is clipped by the clip region its attach target is in.
    AttachedParent,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FloatingConfig {
    pub offset: Vector2,
    /// Grows the bounding box on every side without affecting layout.
    pub expand: Dimensions,
    /// Target id when `attach_to` is [`FloatingAttachToElement::ElementWithId`].
    pub parent_id: u32,
    pub z_index: i16,
    pub attach_points: FloatingAttachPoints,
    pub pointer_capture_mode: PointerCaptureMode,
    pub attach_to: FloatingAttachToElement,
    pub clip_to: FloatingClipToElement,
}

impl FloatingConfig {
    #[inline]
    pub fn is_floating(&self) -> bool {
        self.attach_to != FloatingAttachToElement::None
    }
}

/// The full configuration of one element.
#[derive(Debug)]
pub struct ElementDeclaration<P = ()> {
    pub layout: LayoutConfig,
    pub background_color: Color,
    pub corner_radius: CornerRadius,
    /// Width divided by height. `0` disables the constraint.
    pub aspect_ratio: f32,
    pub image: Option<Handle<P>>,
    pub floating: FloatingConfig,
    pub custom: Option<Handle<P>>,
    pub clip: ClipConfig,
    pub border: BorderConfig,
    /// Copied onto every render command the element produces.
    pub user_data: Option<Handle<P>>,
}

impl<P> Default for ElementDeclaration<P> {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            background_color: Color::TRANSPARENT,
            corner_radius: CornerRadius::default(),
            aspect_ratio: 0.0,
            image: None,
            floating: FloatingConfig::default(),
            custom: None,
            clip: ClipConfig::default(),
            border: BorderConfig::default(),
            user_data: None,
        }
    }
}

impl<P> Clone for ElementDeclaration<P> {
    fn clone(&self) -> Self {
        Self {
            layout: self.layout,
            background_color: self.background_color,
            corner_radius: self.corner_radius,
            aspect_ratio: self.aspect_ratio,
            image: self.image.clone(),
            floating: self.floating,
            custom: self.custom.clone(),
            clip: self.clip,
            border: self.border,
            user_data: self.user_data.clone(),
        }
    }
}

/// Builder for configuring floating element properties using a closure.
pub struct FloatingBuilder {
    pub(crate) config: FloatingConfig,
}

impl FloatingBuilder {
    /// Sets the floating element's offset.
    #[inline]
    pub fn offset(&mut self, x: f32, y: f32) -> &mut Self {
        self.config.offset = Vector2::new(x, y);
        self
    }

    /// Enlarges the bounding box by `width` on the left and right and by
    /// `height` on the top and bottom.
    #[inline]
    pub fn expand(&mut self, expand: Dimensions) -> &mut Self {
        self.config.expand = expand;
        self
    }

    /// Sets the floating element's Z-index.
    #[inline]
    pub fn z_index(&mut self, z_index: i16) -> &mut Self {
        self.config.z_index = z_index;
        self
    }

    /// Sets the attachment points of the floating element and its parent.
    ///
    /// Each tuple is `(AlignX, AlignY)`, the first for the element, the second for the parent.
    /// ```
    /// use claylay::align::{AlignX::CenterX, AlignY::{Bottom, Top}};
    /// use claylay::elements::Declaration;
    ///
    /// let tooltip: Declaration = Declaration::new()
    ///     .floating(|f| f.anchor((CenterX, Bottom), (CenterX, Top)));
    /// # let _ = tooltip;
    /// ```
    #[inline]
    pub fn anchor(&mut self, element: (AlignX, AlignY), parent: (AlignX, AlignY)) -> &mut Self {
        self.config.attach_points.element = element.into();
        self.config.attach_points.parent = parent.into();
        self
    }

    /// Attaches this floating element to its parent element (default behavior).
    #[inline]
    pub fn attach_parent(&mut self) -> &mut Self {
        self.config.attach_to = FloatingAttachToElement::Parent;
        self
    }

    /// Attaches this floating element to the root of the layout.
    #[inline]
    pub fn attach_root(&mut self) -> &mut Self {
        self.config.attach_to = FloatingAttachToElement::Root;
        self
    }

    /// Attaches this floating element to a specific element by ID.
    #[inline]
    pub fn attach_id(&mut self, id: impl Into<ElementId>) -> &mut Self {
        self.config.attach_to = FloatingAttachToElement::ElementWithId;
        self.config.parent_id = id.into().id;
        self
    }

    /// Clips this floating element to its parent's bounds.
    #[inline]
    pub fn clip_by_parent(&mut self) -> &mut Self {
        self.config.clip_to = FloatingClipToElement::AttachedParent;
        self
    }

    /// Sets pointer capture mode to Passthrough.
    #[inline]
    pub fn passthrough(&mut self) -> &mut Self {
        self.config.pointer_capture_mode = PointerCaptureMode::Passthrough;
        self
    }
}

/// Builder for configuring border properties using a closure.
pub struct BorderBuilder {
    pub(crate) config: BorderConfig,
}

impl BorderBuilder {
    /// Sets the border color.
    #[inline]
    pub fn color(&mut self, color: impl Into<Color>) -> &mut Self {
        self.config.color = color.into();
        self
    }

    /// Set the same border width for all sides.
    #[inline]
    pub fn all(&mut self, width: u16) -> &mut Self {
        self.config.width.left = width;
        self.config.width.right = width;
        self.config.width.top = width;
        self.config.width.bottom = width;
        self
    }

    #[inline]
    pub fn left(&mut self, width: u16) -> &mut Self {
        self.config.width.left = width;
        self
    }

    #[inline]
    pub fn right(&mut self, width: u16) -> &mut Self {
        self.config.width.right = width;
        self
    }

    #[inline]
    pub fn top(&mut self, width: u16) -> &mut Self {
        self.config.width.top = width;
        self
    }

    #[inline]
    pub fn bottom(&mut self, width: u16) -> &mut Self {
        self.config.width.bottom = width;
        self
    }

    /// Draws separators of `width` between child elements.
    #[inline]
    pub fn between_children(&mut self, width: u16) -> &mut Self {
        self.config.width.between_children = width;
        self
    }
}

/// Fluent element declaration used by [`crate::Ui::element`].
///
/// ```
/// use claylay::{grow, fixed};
/// use claylay::elements::Declaration;
/// use claylay::layout::LayoutDirection;
///
/// let panel: Declaration = Declaration::new()
///     .id("Panel")
///     .width(grow!())
///     .height(fixed!(120.0))
///     .layout(|l| l.direction(LayoutDirection::TopToBottom).padding(8u16).gap(4))
///     .background_color(0x202020u32)
///     .border(|b| b.color(0xFFFFFFu32).all(1));
/// # let _ = panel;
/// ```
#[derive(Debug)]
pub struct Declaration<P = ()> {
    pub(crate) id: Option<ElementId>,
    pub(crate) inner: ElementDeclaration<P>,
}

impl<P> Default for Declaration<P> {
    fn default() -> Self {
        Self {
            id: None,
            inner: ElementDeclaration::default(),
        }
    }
}

impl<P> Clone for Declaration<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<P> From<ElementDeclaration<P>> for Declaration<P> {
    fn from(inner: ElementDeclaration<P>) -> Self {
        Self { id: None, inner }
    }
}

impl<P> Declaration<P> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[inline]
    pub fn width(mut self, width: Sizing) -> Self {
        self.inner.layout.sizing.width = width.into();
        self
    }

    #[inline]
    pub fn height(mut self, height: Sizing) -> Self {
        self.inner.layout.sizing.height = height.into();
        self
    }

    #[inline]
    pub fn layout(mut self, f: impl FnOnce(&mut LayoutBuilder) -> &mut LayoutBuilder) -> Self {
        let mut builder = LayoutBuilder {
            config: self.inner.layout,
        };
        f(&mut builder);
        self.inner.layout = builder.config;
        self
    }

    #[inline]
    pub fn background_color(mut self, color: impl Into<Color>) -> Self {
        self.inner.background_color = color.into();
        self
    }

    #[inline]
    pub fn corner_radius(mut self, radius: impl Into<CornerRadius>) -> Self {
        self.inner.corner_radius = radius.into();
        self
    }

    /// Width divided by height.
    #[inline]
    pub fn aspect_ratio(mut self, aspect_ratio: f32) -> Self {
        self.inner.aspect_ratio = aspect_ratio;
        self
    }

    #[inline]
    pub fn image(mut self, image: Handle<P>) -> Self {
        self.inner.image = Some(image);
        self
    }

    #[inline]
    pub fn custom(mut self, custom: Handle<P>) -> Self {
        self.inner.custom = Some(custom);
        self
    }

    #[inline]
    pub fn user_data(mut self, data: Handle<P>) -> Self {
        self.inner.user_data = Some(data);
        self
    }

    #[inline]
    pub fn clip(mut self, horizontal: bool, vertical: bool, child_offset: Vector2) -> Self {
        self.inner.clip = ClipConfig {
            horizontal,
            vertical,
            child_offset,
        };
        self
    }

    /// Clips on the given axes and lets the engine apply the stored scroll
    /// position.
    #[inline]
    pub fn scroll(self, horizontal: bool, vertical: bool) -> Self {
        self.clip(horizontal, vertical, Vector2::ZERO)
    }

    /// Makes the element floating. Attaches to the parent unless the closure
    /// picks another target.
    #[inline]
    pub fn floating(mut self, f: impl FnOnce(&mut FloatingBuilder) -> &mut FloatingBuilder) -> Self {
        let mut builder = FloatingBuilder {
            config: self.inner.floating,
        };
        if builder.config.attach_to == FloatingAttachToElement::None {
            builder.config.attach_to = FloatingAttachToElement::Parent;
        }
        f(&mut builder);
        self.inner.floating = builder.config;
        self
    }

    #[inline]
    pub fn border(mut self, f: impl FnOnce(&mut BorderBuilder) -> &mut BorderBuilder) -> Self {
        let mut builder = BorderBuilder {
            config: self.inner.border,
        };
        f(&mut builder);
        self.inner.border = builder.config;
        self
    }

    pub fn declaration(&self) -> &ElementDeclaration<P> {
        &self.inner
    }

    pub fn element_id(&self) -> Option<&ElementId> {
        self.id.as_ref()
    }

    pub fn into_parts(self) -> (Option<ElementId>, ElementDeclaration<P>) {
        (self.id, self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutDirection, SizingType};
    use crate::{fixed, grow};

    #[test]
    fn attach_point_grid_round_trips_alignment() {
        let point = FloatingAttachPointType::new(AlignX::Right, AlignY::CenterY);
        assert_eq!(point, FloatingAttachPointType::RightCenter);
        assert_eq!(point.x(), AlignX::Right);
        assert_eq!(point.y(), AlignY::CenterY);
    }

    #[test]
    fn declaration_builder_sets_fields() {
        let decl: Declaration = Declaration::new()
            .id("Header")
            .width(grow!())
            .height(fixed!(40.0))
            .layout(|l| l.direction(LayoutDirection::TopToBottom).gap(6))
            .corner_radius(4.0)
            .border(|b| b.color(0xFF0000u32).all(2).between_children(1));

        assert_eq!(decl.element_id().map(|id| id.id), Some(ElementId::new("Header").id));
        let inner = decl.declaration();
        assert_eq!(inner.layout.sizing.width.type_, SizingType::Grow);
        assert_eq!(inner.layout.sizing.height.min_max.max, 40.0);
        assert_eq!(inner.layout.child_gap, 6);
        assert_eq!(inner.border.width.left, 2);
        assert_eq!(inner.border.width.between_children, 1);
        assert_eq!(inner.corner_radius.bottom_right, 4.0);
    }

    #[test]
    fn floating_defaults_to_parent_attachment() {
        let decl: Declaration = Declaration::new().floating(|f| f.z_index(3));
        assert_eq!(decl.declaration().floating.attach_to, FloatingAttachToElement::Parent);
        assert_eq!(decl.declaration().floating.z_index, 3);

        let rooted: Declaration = Declaration::new().floating(|f| f.attach_root().passthrough());
        assert_eq!(rooted.declaration().floating.attach_to, FloatingAttachToElement::Root);
        assert_eq!(
            rooted.declaration().floating.pointer_capture_mode,
            PointerCaptureMode::Passthrough
        );
    }

    #[test]
    fn cloning_shares_payload_handles() {
        let decl: Declaration<u8> = Declaration::new().custom(Handle::once(9));
        let copy = decl.clone();
        assert_eq!(copy.declaration().custom.as_ref().and_then(Handle::take), Some(9));
        assert!(decl.declaration().custom.as_ref().is_some_and(Handle::is_spent));
    }
}
