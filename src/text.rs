use crate::color::Color;
use crate::math::Dimensions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum WrapMode {
    /// Wraps on whitespaces not breaking words
    #[default]
    Words,
    /// Only wraps on new line characters
    Newlines,
    /// Never wraps, can overflow of parent layout
    None,
}

/// Horizontal alignment of each wrapped line inside the text element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Configuration settings for rendering text elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextConfig {
    /// The color of the text.
    pub color: Color,
    /// The engine does not manage fonts. The host assigns a unique ID to each
    /// font and resolves it in its measurement function and renderer.
    pub font_id: u16,
    /// The font size of the text.
    pub font_size: u16,
    /// Extra spacing between letters.
    pub letter_spacing: u16,
    /// Height of each line. `0` uses the measured height.
    pub line_height: u16,
    /// Defines the text wrapping behavior.
    pub wrap_mode: WrapMode,
    /// The alignment of the text.
    pub alignment: TextAlignment,
}

impl TextConfig {
    /// Creates a new `TextConfig` instance with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the text color.
    #[inline]
    pub fn color(&mut self, color: impl Into<Color>) -> &mut Self {
        self.color = color.into();
        self
    }

    /// Sets the font ID. The user is responsible for assigning unique font IDs.
    #[inline]
    pub fn font_id(&mut self, id: u16) -> &mut Self {
        self.font_id = id;
        self
    }

    /// Sets the font size.
    #[inline]
    pub fn font_size(&mut self, size: u16) -> &mut Self {
        self.font_size = size;
        self
    }

    /// Sets the letter spacing.
    #[inline]
    pub fn letter_spacing(&mut self, spacing: u16) -> &mut Self {
        self.letter_spacing = spacing;
        self
    }

    /// Sets the line height.
    #[inline]
    pub fn line_height(&mut self, height: u16) -> &mut Self {
        self.line_height = height;
        self
    }

    /// Sets the text wrapping mode.
    #[inline]
    pub fn wrap_mode(&mut self, mode: WrapMode) -> &mut Self {
        self.wrap_mode = mode;
        self
    }

    /// Sets the text alignment.
    #[inline]
    pub fn alignment(&mut self, alignment: TextAlignment) -> &mut Self {
        self.alignment = alignment;
        self
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            color: Color::TRANSPARENT,
            font_id: 0,
            font_size: 0,
            letter_spacing: 0,
            line_height: 0,
            wrap_mode: WrapMode::Words,
            alignment: TextAlignment::Left,
        }
    }
}

/// Measures a run of text that contains no line breaks.
pub type MeasureTextFn = Box<dyn Fn(&str, &TextConfig) -> Dimensions>;

/// Fallback used when no measurement function is set: every character is
/// `font_size` wide and one line is `font_size` tall.
pub fn monospace_measure(text: &str, config: &TextConfig) -> Dimensions {
    let font_size = config.font_size as f32;
    Dimensions::new(text.chars().count() as f32 * font_size, font_size)
}
