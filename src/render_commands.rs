use crate::color::Color;
use crate::elements::{BorderWidth, CornerRadius};
use crate::handle::Handle;
use crate::math::BoundingBox;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RenderCommandType {
    Rectangle,
    Border,
    Text,
    Image,
    ScissorStart,
    ScissorEnd,
    Custom,
}

/// Represents a rectangle with a specified color and corner radii.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub color: Color,
    pub corner_radii: CornerRadius,
}

/// One line of laid out text.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub text: String,
    pub color: Color,
    pub font_id: u16,
    pub font_size: u16,
    pub letter_spacing: u16,
    pub line_height: u16,
}

/// Represents a border with a specified color, width, and corner radii.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub color: Color,
    pub corner_radii: CornerRadius,
    pub width: BorderWidth,
}

#[derive(Debug)]
pub struct Image<P> {
    pub background_color: Color,
    pub corner_radii: CornerRadius,
    pub data: Handle<P>,
}

#[derive(Debug)]
pub struct Custom<P> {
    pub background_color: Color,
    pub corner_radii: CornerRadius,
    pub data: Handle<P>,
}

/// Which axes the clip region applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scissor {
    pub horizontal: bool,
    pub vertical: bool,
}

#[derive(Debug)]
pub enum RenderCommandConfig<P> {
    Rectangle(Rectangle),
    Border(Border),
    Text(Text),
    Image(Image<P>),
    /// Start clipping to the command's bounding box.
    ScissorStart(Scissor),
    /// Pop the clip region pushed by the matching `ScissorStart`.
    ScissorEnd,
    Custom(Custom<P>),
}

/// Represents a render command for drawing an element on the screen.
#[derive(Debug)]
pub struct RenderCommand<P> {
    /// The bounding box defining the area occupied by the element.
    pub bounding_box: BoundingBox,
    /// The specific configuration for rendering this command.
    pub config: RenderCommandConfig<P>,
    /// Id of the element that produced the command. Separator and per-line
    /// commands get ids derived from it.
    pub id: u32,
    /// The z-index determines the stacking order of elements.
    /// Higher values are drawn above lower values.
    pub z_index: i16,
    /// The element's user data, if any.
    pub user_data: Option<Handle<P>>,
}

impl<P> RenderCommand<P> {
    pub fn command_type(&self) -> RenderCommandType {
        match &self.config {
            RenderCommandConfig::Rectangle(_) => RenderCommandType::Rectangle,
            RenderCommandConfig::Border(_) => RenderCommandType::Border,
            RenderCommandConfig::Text(_) => RenderCommandType::Text,
            RenderCommandConfig::Image(_) => RenderCommandType::Image,
            RenderCommandConfig::ScissorStart(_) => RenderCommandType::ScissorStart,
            RenderCommandConfig::ScissorEnd => RenderCommandType::ScissorEnd,
            RenderCommandConfig::Custom(_) => RenderCommandType::Custom,
        }
    }

    /// The text of a `Text` command.
    pub fn text(&self) -> Option<&str> {
        match &self.config {
            RenderCommandConfig::Text(text) => Some(&text.text),
            _ => None,
        }
    }
}

impl<P> Clone for RenderCommandConfig<P> {
    fn clone(&self) -> Self {
        match self {
            Self::Rectangle(r) => Self::Rectangle(*r),
            Self::Border(b) => Self::Border(*b),
            Self::Text(t) => Self::Text(t.clone()),
            Self::Image(i) => Self::Image(Image {
                background_color: i.background_color,
                corner_radii: i.corner_radii,
                data: i.data.clone(),
            }),
            Self::ScissorStart(s) => Self::ScissorStart(*s),
            Self::ScissorEnd => Self::ScissorEnd,
            Self::Custom(c) => Self::Custom(Custom {
                background_color: c.background_color,
                corner_radii: c.corner_radii,
                data: c.data.clone(),
            }),
        }
    }
}

impl<P> Clone for RenderCommand<P> {
    fn clone(&self) -> Self {
        Self {
            bounding_box: self.bounding_box,
            config: self.config.clone(),
            id: self.id,
            z_index: self.z_index,
            user_data: self.user_data.clone(),
        }
    }
}

/// Checks that every `ScissorStart` is closed by a `ScissorEnd` in stack order.
pub fn scissors_balanced<P>(commands: &[RenderCommand<P>]) -> bool {
    let mut depth = 0usize;
    for command in commands {
        match command.config {
            RenderCommandConfig::ScissorStart(_) => depth += 1,
            RenderCommandConfig::ScissorEnd => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}
