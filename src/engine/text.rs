use std::rc::Rc;

use super::{LayoutContext, WrappedTextLine};
use crate::errors::ErrorType;
use crate::id::{hash_bytes, hash_finalize, hash_mix};
use crate::math::Dimensions;
use crate::text::{monospace_measure, TextConfig, WrapMode};

/// A word and the whitespace that ends it. Newlines are zero-length words.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MeasuredWord {
    pub(crate) start: usize,
    pub(crate) length: usize,
    pub(crate) width: f32,
    pub(crate) trailing_space: bool,
}

#[derive(Debug, Clone)]
pub(super) struct MeasureTextCacheItem {
    pub(super) unwrapped_dimensions: Dimensions,
    pub(super) min_width: f32,
    pub(super) contains_newlines: bool,
    pub(super) words: Rc<[MeasuredWord]>,
    pub(super) generation: u32,
}

/// Cache key: the text bytes plus every config field that affects measurement.
fn text_cache_key(text: &str, config: &TextConfig) -> u32 {
    let mut hash = hash_bytes(text.as_bytes(), 0);
    hash = hash_mix(hash, config.font_id as u32);
    hash = hash_mix(hash, config.font_size as u32);
    hash = hash_mix(hash, config.letter_spacing as u32);
    hash_finalize(hash)
}

impl<P> LayoutContext<P> {
    fn measure(&self, text: &str, config: &TextConfig) -> Dimensions {
        match &self.measure_text_fn {
            Some(measure) => measure(text, config),
            None => monospace_measure(text, config),
        }
    }

    /// Measures `text` word by word, reusing the result of an earlier frame
    /// when the same text was measured with the same font settings.
    pub(super) fn measure_text_cached(&mut self, text: &str, config: &TextConfig) -> MeasureTextCacheItem {
        if self.measure_text_fn.is_none() && !self.measure_fallback_reported {
            self.measure_fallback_reported = true;
            self.report(
                ErrorType::TextMeasurementFunctionNotProvided,
                "no text measurement function set; using the monospace fallback",
            );
        }
        let key = text_cache_key(text, config);
        let generation = self.generation;
        if let Some(item) = self.measure_text_cache.get_mut(&key) {
            item.generation = generation;
            return item.clone();
        }

        let item = self.measure_words(text, config);
        let limit = self.max_measure_text_cache_word_count as usize;
        if self.measured_word_count + item.words.len() > limit {
            if !self.warnings.max_text_measure_cache_exceeded {
                self.warnings.max_text_measure_cache_exceeded = true;
                self.report(
                    ErrorType::TextMeasurementCapacityExceeded,
                    &format!("text measurement cache is full ({limit} words); measuring without caching"),
                );
            }
            return item;
        }
        self.measured_word_count += item.words.len();
        self.measure_text_cache.insert(key, item.clone());
        item
    }

    fn measure_words(&self, text: &str, config: &TextConfig) -> MeasureTextCacheItem {
        let space_width = self.measure(" ", config).width;
        let mut words = Vec::new();
        let mut start = 0;
        let mut line_width = 0.0f32;
        let mut measured_width = 0.0f32;
        let mut measured_height = 0.0f32;
        let mut min_width = 0.0f32;
        let mut contains_newlines = false;

        for (end, byte) in text.bytes().enumerate() {
            if byte != b' ' && byte != b'\n' {
                continue;
            }
            let length = end - start;
            let dimensions = if length > 0 {
                self.measure(&text[start..end], config)
            } else {
                Dimensions::default()
            };
            min_width = min_width.max(dimensions.width);
            measured_height = measured_height.max(dimensions.height);
            if byte == b' ' {
                let width = dimensions.width + space_width;
                words.push(MeasuredWord {
                    start,
                    length: length + 1,
                    width,
                    trailing_space: true,
                });
                line_width += width;
            } else {
                if length > 0 {
                    words.push(MeasuredWord {
                        start,
                        length,
                        width: dimensions.width,
                        trailing_space: false,
                    });
                }
                words.push(MeasuredWord {
                    start: end + 1,
                    ..Default::default()
                });
                line_width += dimensions.width;
                measured_width = measured_width.max(line_width);
                contains_newlines = true;
                line_width = 0.0;
            }
            start = end + 1;
        }
        if start < text.len() {
            let dimensions = self.measure(&text[start..], config);
            words.push(MeasuredWord {
                start,
                length: text.len() - start,
                width: dimensions.width,
                trailing_space: false,
            });
            line_width += dimensions.width;
            measured_height = measured_height.max(dimensions.height);
            min_width = min_width.max(dimensions.width);
        }
        measured_width = (measured_width.max(line_width) - config.letter_spacing as f32).max(0.0);

        MeasureTextCacheItem {
            unwrapped_dimensions: Dimensions::new(measured_width, measured_height),
            min_width,
            contains_newlines,
            words: words.into(),
            generation: self.generation,
        }
    }

    /// Drops cache entries that have not been used for more than two frames.
    pub(super) fn evict_stale_text_cache(&mut self) {
        let generation = self.generation;
        let mut freed = 0;
        self.measure_text_cache.retain(|_, item| {
            let keep = generation.wrapping_sub(item.generation) <= 2;
            if !keep {
                freed += item.words.len();
            }
            keep
        });
        self.measured_word_count -= freed;
    }

    pub fn reset_measure_text_cache(&mut self) {
        self.measure_text_cache.clear();
        self.measured_word_count = 0;
    }

    /// Breaks every text element into lines for its resolved width and sets
    /// its height to the height of those lines.
    pub(super) fn wrap_text(&mut self) {
        for text_index in 0..self.text_element_data.len() {
            let data = &self.text_element_data[text_index];
            let config = data.config;
            let element_index = data.element_index;
            let text_length = data.text.len();
            let preferred = data.measured.unwrapped_dimensions;
            let contains_newlines = data.measured.contains_newlines;
            let words = Rc::clone(&data.measured.words);

            let container_width = match config.wrap_mode {
                WrapMode::Newlines => f32::MAX,
                _ => self.layout_elements[element_index].dimensions.width,
            };
            let line_height = if config.line_height > 0 {
                config.line_height as f32
            } else {
                preferred.height
            };
            let lines_start = self.wrapped_text_lines.len();

            if config.wrap_mode == WrapMode::None || (!contains_newlines && preferred.width <= container_width) {
                self.wrapped_text_lines.push(WrappedTextLine {
                    dimensions: Dimensions::new(preferred.width, line_height),
                    start: 0,
                    length: text_length,
                });
            } else {
                let letter_spacing = config.letter_spacing as f32;
                let space_width = self.measure(" ", &config).width;
                let mut line_width = 0.0f32;
                let mut line_length = 0;
                let mut line_start = 0;
                let mut ends_with_space = false;
                let finish_line = |lines: &mut Vec<WrappedTextLine>, width: f32, length: usize, start: usize, trailing: bool| {
                    let (width, length) = if trailing && length > 0 {
                        (width - space_width, length - 1)
                    } else {
                        (width, length)
                    };
                    lines.push(WrappedTextLine {
                        dimensions: Dimensions::new(width.max(0.0), line_height),
                        start,
                        length,
                    });
                };

                let mut i = 0;
                while i < words.len() {
                    let word = words[i];
                    if line_length == 0 && word.length > 0 && line_width + word.width > container_width {
                        // a single word wider than the container gets a line of its own
                        finish_line(&mut self.wrapped_text_lines, word.width, word.length, word.start, word.trailing_space);
                        i += 1;
                        line_start = word.start + word.length;
                    } else if word.length == 0 || line_width + word.width > container_width {
                        finish_line(
                            &mut self.wrapped_text_lines,
                            line_width - letter_spacing,
                            line_length,
                            line_start,
                            ends_with_space,
                        );
                        if line_length == 0 || word.length == 0 {
                            i += 1;
                        }
                        line_width = 0.0;
                        line_length = 0;
                        line_start = word.start;
                        ends_with_space = false;
                    } else {
                        line_width += word.width + letter_spacing;
                        line_length += word.length;
                        ends_with_space = word.trailing_space;
                        i += 1;
                    }
                }
                if line_length > 0 {
                    finish_line(
                        &mut self.wrapped_text_lines,
                        line_width - letter_spacing,
                        line_length,
                        line_start,
                        ends_with_space,
                    );
                }
            }

            let line_count = self.wrapped_text_lines.len() - lines_start;
            self.layout_elements[element_index].dimensions.height = line_height * line_count as f32;
            let data = &mut self.text_element_data[text_index];
            data.wrapped_lines_start = lines_start;
            data.wrapped_lines_length = line_count;
        }
    }

    /// The lines a text element was wrapped into, as string slices.
    #[cfg(test)]
    pub(super) fn wrapped_lines(&self, text_index: usize) -> Vec<&str> {
        let data = &self.text_element_data[text_index];
        let text = self.arena.str(data.text);
        self.wrapped_text_lines[data.wrapped_lines_start..data.wrapped_lines_start + data.wrapped_lines_length]
            .iter()
            .map(|line| text.get(line.start..line.start + line.length).unwrap_or(""))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Declaration;
    use crate::engine::tests::recording_context;
    use crate::fixed;

    fn config(font_size: u16) -> TextConfig {
        let mut config = TextConfig::new();
        config.font_size(font_size);
        config
    }

    #[test]
    fn words_keep_their_trailing_space() {
        let (ctx, _) = recording_context(Dimensions::new(100.0, 100.0));
        // 5 units per byte at font size 10
        let item = ctx.measure_words("ab cd\nef", &config(10));
        let words: Vec<_> = item.words.iter().map(|w| (w.start, w.length, w.width)).collect();
        assert_eq!(words, vec![(0, 3, 15.0), (3, 2, 10.0), (6, 0, 0.0), (6, 2, 10.0)]);
        assert!(item.contains_newlines);
        assert_eq!(item.unwrapped_dimensions, Dimensions::new(25.0, 10.0));
        assert_eq!(item.min_width, 10.0);
    }

    #[test]
    fn cache_is_reused_and_evicted() {
        let (mut ctx, _) = recording_context(Dimensions::new(100.0, 100.0));
        ctx.begin_layout();
        ctx.measure_text_cached("hello world", &config(10));
        assert_eq!(ctx.measured_word_count, 2);
        ctx.measure_text_cached("hello world", &config(10));
        assert_eq!(ctx.measure_text_cache.len(), 1);
        ctx.measure_text_cached("hello world", &config(12));
        assert_eq!(ctx.measure_text_cache.len(), 2);
        ctx.end_layout();

        for _ in 0..3 {
            ctx.begin_layout();
            ctx.end_layout();
        }
        assert!(ctx.measure_text_cache.is_empty());
        assert_eq!(ctx.measured_word_count, 0);
    }

    #[test]
    fn full_cache_measures_uncached() {
        let (mut ctx, errors) = recording_context(Dimensions::new(100.0, 100.0));
        ctx.set_max_measure_text_cache_word_count(2);
        ctx.begin_layout();
        ctx.measure_text_cached("one two", &config(10));
        let item = ctx.measure_text_cached("three four five", &config(10));
        assert_eq!(item.words.len(), 3);
        assert_eq!(ctx.measure_text_cache.len(), 1);
        ctx.end_layout();
        assert_eq!(errors.borrow().as_slice(), &[ErrorType::TextMeasurementCapacityExceeded]);
    }

    #[test]
    fn missing_measure_function_is_reported_once() {
        let mut ctx = LayoutContext::<()>::new(Dimensions::new(100.0, 100.0));
        let errors = Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = Rc::clone(&errors);
        ctx.set_error_handler(move |error| sink.borrow_mut().push(error.type_));
        for _ in 0..2 {
            ctx.begin_layout();
            ctx.open_text_element("abc", &config(8));
            ctx.end_layout();
        }
        assert_eq!(errors.borrow().as_slice(), &[ErrorType::TextMeasurementFunctionNotProvided]);
    }

    fn wrap_in(width: f32, text: &str, wrap_mode: WrapMode) -> (Vec<String>, f32) {
        let (mut ctx, _) = recording_context(Dimensions::new(1000.0, 1000.0));
        let mut text_config = config(10);
        text_config.wrap_mode(wrap_mode);
        ctx.begin_layout();
        let decl = Declaration::new().width(fixed!(width)).into_parts().1;
        ctx.declare_element(None, &decl, |ctx| ctx.open_text_element(text, &text_config));
        ctx.end_layout();
        let lines = ctx.wrapped_lines(0).into_iter().map(String::from).collect();
        let element = ctx.text_element_data[0].element_index;
        (lines, ctx.layout_elements[element].dimensions.height)
    }

    #[test]
    fn words_wrap_at_the_container_width() {
        // every byte is 5 wide: "aaa " is 20, "bbb " 20, "ccc" 15
        let (lines, height) = wrap_in(40.0, "aaa bbb ccc", WrapMode::Words);
        assert_eq!(lines, vec!["aaa bbb", "ccc"]);
        assert_eq!(height, 20.0);
    }

    #[test]
    fn overlong_words_get_their_own_line() {
        let (lines, _) = wrap_in(20.0, "a verylongword b", WrapMode::Words);
        assert_eq!(lines, vec!["a", "verylongword", "b"]);
    }

    #[test]
    fn newlines_mode_only_breaks_at_newlines() {
        let (lines, height) = wrap_in(10.0, "one two\n\nthree", WrapMode::Newlines);
        assert_eq!(lines, vec!["one two", "", "three"]);
        assert_eq!(height, 30.0);
    }

    #[test]
    fn none_mode_keeps_one_line() {
        let (lines, height) = wrap_in(10.0, "one two three", WrapMode::None);
        assert_eq!(lines, vec!["one two three"]);
        assert_eq!(height, 10.0);
    }
}
