//! The layout context.
//!
//! A [`LayoutContext`] owns everything that outlives a single call: the arena,
//! the per-frame element tree, the element id map, the text measurement cache
//! and the scroll containers. A frame is driven as
//! `begin_layout` → declarations → `end_layout`, which resolves sizes and
//! positions and returns the flat render command list.
//!
//! The implementation is split by phase:
//! - `declare`: the open/configure/close state machine
//! - `text`: word measurement, the measurement cache and wrapping
//! - `sizing`: fit sizes, grow/shrink distribution and aspect ratios
//! - `emit`: positioning and render command generation
//! - `pointer`: hit testing and element queries
//! - `scroll`: persistent scroll container state

mod declare;
mod emit;
mod pointer;
mod scroll;
mod sizing;
mod text;

use rustc_hash::FxHashMap;

use crate::arena::{Arena, ArenaStr};
use crate::config::Config;
use crate::elements::ElementDeclaration;
use crate::errors::{default_error_handler, Error, ErrorHandler, ErrorType, InitError};
use crate::id::{hash_string, ElementId};
use crate::math::{BoundingBox, Dimensions};
use crate::render_commands::RenderCommand;
use crate::strings::StringInterner;
use crate::text::{MeasureTextFn, TextConfig};

pub use pointer::{PointerData, PointerDataInteractionState};
pub use scroll::ScrollContainerData;

const MAXFLOAT: f32 = f32::MAX;
const EPSILON: f32 = 0.01;

/// Label of the implicit root element that spans the layout dimensions.
pub(crate) const ROOT_CONTAINER_LABEL: &str = "Claylay__RootContainer";

/// Depth of the open-element stack while only the root is open. The root is
/// pushed twice so that closes of user elements never pop it.
const ROOT_STACK_DEPTH: usize = 2;

/// Declaration slot shared by all text elements. Never configured.
const TEXT_DECLARATION: usize = 0;

#[inline]
fn float_equal(left: f32, right: f32) -> bool {
    let diff = left - right;
    diff < EPSILON && diff > -EPSILON
}

/// Called while the pointer is over an element during
/// [`LayoutContext::set_pointer_state`].
pub type OnHoverFn = Box<dyn FnMut(&ElementId, PointerData)>;

/// Where the context is in its frame cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutPhase {
    /// No frame has been started yet.
    #[default]
    Idle,
    /// Between `begin_layout` and `end_layout`.
    Declaring,
    /// `end_layout` ran; render commands and queries reflect the last frame.
    Resolved,
}

/// Bounding box of an element from the most recent layout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementData {
    pub bounding_box: BoundingBox,
    pub found: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct LayoutElement {
    id: u32,
    label: ArenaStr,
    declaration: usize,
    children_start: usize,
    children_length: usize,
    text_data: Option<usize>,
    dimensions: Dimensions,
    min_dimensions: Dimensions,
    floating_children_count: usize,
    /// Clip container this element is drawn inside, `0` for none.
    clip_element_id: u32,
    /// Entries this element pushed onto the clip stack (floating and/or clip).
    clip_stack_pushes: u8,
    configured: bool,
}

#[derive(Debug, Clone)]
struct TextElementData {
    text: ArenaStr,
    config: TextConfig,
    measured: text::MeasureTextCacheItem,
    element_index: usize,
    wrapped_lines_start: usize,
    wrapped_lines_length: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct WrappedTextLine {
    dimensions: Dimensions,
    start: usize,
    length: usize,
}

struct LayoutElementHashMapItem {
    bounding_box: BoundingBox,
    element_id: ElementId,
    layout_element_index: usize,
    on_hover_fn: Option<OnHoverFn>,
    generation: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct LayoutElementTreeRoot {
    layout_element_index: usize,
    parent_id: u32,
    clip_element_id: u32,
    z_index: i16,
}

/// Per-frame flags so that capacity problems are reported once per frame.
#[derive(Debug, Clone, Copy, Default)]
struct BooleanWarnings {
    max_elements_exceeded: bool,
    max_text_measure_cache_exceeded: bool,
    arena_exceeded: bool,
}

/// A single-threaded layout engine instance.
///
/// `P` is the payload type carried by image, custom and user data handles.
pub struct LayoutContext<P = ()> {
    arena: Arena,
    strings: StringInterner,
    layout_dimensions: Dimensions,
    generation: u32,
    phase: LayoutPhase,
    root_id: u32,

    max_element_count: u32,
    max_measure_text_cache_word_count: u32,
    culling_enabled: bool,
    external_scroll_handling_enabled: bool,
    debug_mode_enabled: bool,
    panic_on_usage_error: bool,

    measure_text_fn: Option<MeasureTextFn>,
    error_handler: ErrorHandler,
    measure_fallback_reported: bool,
    warnings: BooleanWarnings,

    layout_elements: Vec<LayoutElement>,
    declarations: Vec<ElementDeclaration<P>>,
    render_commands: Vec<RenderCommand<P>>,
    open_layout_element_stack: Vec<usize>,
    layout_element_children: Vec<usize>,
    layout_element_children_buffer: Vec<usize>,
    text_element_data: Vec<TextElementData>,
    aspect_ratio_element_indexes: Vec<usize>,
    wrapped_text_lines: Vec<WrappedTextLine>,
    layout_element_tree_roots: Vec<LayoutElementTreeRoot>,
    layout_element_map: FxHashMap<u32, LayoutElementHashMapItem>,
    measure_text_cache: FxHashMap<u32, text::MeasureTextCacheItem>,
    measured_word_count: usize,
    open_clip_element_stack: Vec<u32>,
    pointer_over_ids: Vec<ElementId>,
    pointer_info: PointerData,
    scroll_container_datas: Vec<scroll::ScrollContainerDataInternal>,
    last_element_id: ElementId,
    /// Open calls swallowed since the element capacity was reached.
    dropped_depth: usize,
}

impl<P> LayoutContext<P> {
    /// Creates a context with the default [`Config`].
    pub fn new(dimensions: Dimensions) -> Self {
        let config = Config::default();
        let arena = Arena::with_capacity(config.resolved_memory_size());
        Self::from_parts(&config, arena, dimensions, None)
    }

    /// Creates a context over an arena of `total_memory` bytes.
    pub fn initialize(
        total_memory: usize,
        dimensions: Dimensions,
        error_handler: Option<ErrorHandler>,
    ) -> Result<Self, InitError> {
        let config = Config {
            memory_size: Some(total_memory),
            ..Config::default()
        };
        Self::with_config(config, dimensions, error_handler)
    }

    pub fn with_config(
        config: Config,
        dimensions: Dimensions,
        error_handler: Option<ErrorHandler>,
    ) -> Result<Self, InitError> {
        let arena = Arena::with_capacity(Self::validate(&config, dimensions, config.resolved_memory_size())?);
        Ok(Self::from_parts(&config, arena, dimensions, error_handler))
    }

    /// Like [`LayoutContext::with_config`], over caller-provided memory.
    /// `config.memory_size` is ignored.
    pub fn with_memory(
        memory: impl Into<Box<[u8]>>,
        config: Config,
        dimensions: Dimensions,
        error_handler: Option<ErrorHandler>,
    ) -> Result<Self, InitError> {
        let arena = Arena::from_memory(memory);
        Self::validate(&config, dimensions, arena.capacity())?;
        Ok(Self::from_parts(&config, arena, dimensions, error_handler))
    }

    fn validate(config: &Config, dimensions: Dimensions, provided: usize) -> Result<usize, InitError> {
        let Dimensions { width, height } = dimensions;
        if !(width.is_finite() && height.is_finite() && width >= 0.0 && height >= 0.0) {
            return Err(InitError::InvalidDimensions { width, height });
        }
        if config.max_element_count == 0 {
            return Err(InitError::ZeroElementCapacity);
        }
        let required = config.min_memory_size();
        if provided < required {
            return Err(InitError::InsufficientMemory { provided, required });
        }
        Ok(provided)
    }

    fn from_parts(
        config: &Config,
        arena: Arena,
        dimensions: Dimensions,
        error_handler: Option<ErrorHandler>,
    ) -> Self {
        let max_elements = config.max_element_count as usize;
        let mut context = Self {
            arena,
            strings: StringInterner::new(),
            layout_dimensions: dimensions,
            generation: 0,
            phase: LayoutPhase::Idle,
            root_id: hash_string(ROOT_CONTAINER_LABEL, 0).id,
            max_element_count: config.max_element_count,
            max_measure_text_cache_word_count: config.max_measure_text_cache_word_count,
            culling_enabled: config.culling_enabled,
            external_scroll_handling_enabled: config.external_scroll_handling_enabled,
            debug_mode_enabled: config.debug_mode_enabled,
            panic_on_usage_error: config.panic_on_usage_error,
            measure_text_fn: None,
            error_handler: error_handler.unwrap_or_else(default_error_handler),
            measure_fallback_reported: false,
            warnings: BooleanWarnings::default(),
            layout_elements: Vec::with_capacity(max_elements),
            declarations: Vec::with_capacity(max_elements + 1),
            render_commands: Vec::with_capacity(max_elements),
            open_layout_element_stack: Vec::new(),
            layout_element_children: Vec::with_capacity(max_elements),
            layout_element_children_buffer: Vec::new(),
            text_element_data: Vec::new(),
            aspect_ratio_element_indexes: Vec::new(),
            wrapped_text_lines: Vec::new(),
            layout_element_tree_roots: Vec::new(),
            layout_element_map: FxHashMap::default(),
            measure_text_cache: FxHashMap::default(),
            measured_word_count: 0,
            open_clip_element_stack: Vec::new(),
            pointer_over_ids: Vec::new(),
            pointer_info: PointerData::default(),
            scroll_container_datas: Vec::new(),
            last_element_id: ElementId::default(),
            dropped_depth: 0,
        };
        if let Err(err) = context.intern_persistent_strings() {
            context.report(
                ErrorType::ArenaCapacityExceeded,
                &format!("could not store the root label: {err}"),
            );
        }
        tracing::debug!(
            arena_bytes = context.arena.capacity(),
            max_elements = context.max_element_count,
            width = dimensions.width,
            height = dimensions.height,
            "layout context created"
        );
        context
    }

    /// Stores the strings every frame shares in the persistent region of the
    /// arena. The rest of the arena is the per-frame string budget.
    fn intern_persistent_strings(&mut self) -> Result<(), crate::errors::ArenaError> {
        self.arena.reset_all();
        self.strings.clear();
        self.strings.intern(&mut self.arena, ROOT_CONTAINER_LABEL)?;
        self.arena.freeze_persistent();
        Ok(())
    }

    /// Forwards an error to the handler. Usage errors panic afterwards when
    /// `panic_on_usage_error` is set.
    pub(crate) fn report(&mut self, type_: ErrorType, text: &str) {
        (self.error_handler)(Error { type_, text });
        if self.panic_on_usage_error && type_.is_usage_error() {
            panic!("layout usage error ({type_:?}): {text}");
        }
    }

    fn report_arena_exhausted(&mut self, err: crate::errors::ArenaError) {
        if !self.warnings.arena_exceeded {
            self.warnings.arena_exceeded = true;
            self.report(
                ErrorType::ArenaCapacityExceeded,
                &format!("{err}; strings declared this frame are being dropped"),
            );
        }
    }

    pub fn set_layout_dimensions(&mut self, dimensions: Dimensions) {
        self.layout_dimensions = dimensions;
    }

    pub fn layout_dimensions(&self) -> Dimensions {
        self.layout_dimensions
    }

    /// Sets the function used to measure text. Without one, every character
    /// is `font_size` wide.
    pub fn set_measure_text_function(&mut self, measure: impl Fn(&str, &TextConfig) -> Dimensions + 'static) {
        self.measure_text_fn = Some(Box::new(measure));
        self.reset_measure_text_cache();
    }

    pub fn set_error_handler(&mut self, handler: impl FnMut(Error<'_>) + 'static) {
        self.error_handler = Box::new(handler);
    }

    /// Changes the element capacity. The arena is never resized, so a capacity
    /// whose string budget does not fit is rejected. May not be called while a
    /// layout is being declared.
    pub fn set_max_element_count(&mut self, max_element_count: u32) {
        if self.phase == LayoutPhase::Declaring {
            self.report(
                ErrorType::MalformedDeclaration,
                "set_max_element_count called while a layout is being declared",
            );
            return;
        }
        if max_element_count == 0 {
            self.report(ErrorType::MalformedDeclaration, "max_element_count must be at least 1");
            return;
        }
        let required = Arena::min_memory_size(max_element_count);
        let capacity = self.arena.capacity();
        if required > capacity {
            self.report(
                ErrorType::ArenaCapacityExceeded,
                &format!(
                    "max_element_count {max_element_count} needs {required} bytes of string space, the arena has {capacity}"
                ),
            );
            return;
        }
        self.max_element_count = max_element_count;
    }

    pub fn max_element_count(&self) -> u32 {
        self.max_element_count
    }

    pub fn set_max_measure_text_cache_word_count(&mut self, max_word_count: u32) {
        if self.phase == LayoutPhase::Declaring {
            self.report(
                ErrorType::MalformedDeclaration,
                "set_max_measure_text_cache_word_count called while a layout is being declared",
            );
            return;
        }
        self.max_measure_text_cache_word_count = max_word_count;
        self.reset_measure_text_cache();
    }

    pub fn max_measure_text_cache_word_count(&self) -> u32 {
        self.max_measure_text_cache_word_count
    }

    pub fn set_culling_enabled(&mut self, enabled: bool) {
        self.culling_enabled = enabled;
    }

    pub fn is_culling_enabled(&self) -> bool {
        self.culling_enabled
    }

    /// When enabled, scroll positions are no longer written into
    /// `ClipConfig::child_offset` automatically.
    pub fn set_external_scroll_handling_enabled(&mut self, enabled: bool) {
        self.external_scroll_handling_enabled = enabled;
    }

    pub fn set_debug_mode_enabled(&mut self, enabled: bool) {
        self.debug_mode_enabled = enabled;
    }

    pub fn is_debug_mode_enabled(&self) -> bool {
        self.debug_mode_enabled
    }

    pub fn set_panic_on_usage_error(&mut self, enabled: bool) {
        self.panic_on_usage_error = enabled;
    }

    pub fn phase(&self) -> LayoutPhase {
        self.phase
    }

    /// Number of `begin_layout` calls so far.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Render commands of the last resolved layout.
    pub fn render_commands(&self) -> &[RenderCommand<P>] {
        &self.render_commands
    }

    #[inline]
    fn declaration(&self, index: usize) -> &ElementDeclaration<P> {
        &self.declarations[self.layout_elements[index].declaration]
    }

    #[inline]
    fn open_element_index(&self) -> Option<usize> {
        self.open_layout_element_stack.last().copied()
    }

    /// Index of the element declared this frame under `id`.
    fn current_element_index(&self, id: u32) -> Option<usize> {
        self.layout_element_map
            .get(&id)
            .filter(|item| item.generation == self.generation)
            .map(|item| item.layout_element_index)
    }

    /// Whether a map item belongs to the frame queries currently describe.
    /// While a frame is being declared, that is still the previous one for
    /// elements that have not been redeclared yet.
    #[inline]
    fn item_is_live(&self, item: &LayoutElementHashMapItem) -> bool {
        item.generation == self.generation
            || (self.phase == LayoutPhase::Declaring && item.generation.wrapping_add(1) == self.generation)
    }

    fn update_aspect_ratio_box(&mut self, index: usize) {
        let aspect_ratio = self.declaration(index).aspect_ratio;
        if aspect_ratio <= 0.0 {
            return;
        }
        let dimensions = &mut self.layout_elements[index].dimensions;
        if dimensions.width == 0.0 && dimensions.height != 0.0 {
            dimensions.width = dimensions.height * aspect_ratio;
        } else if dimensions.width != 0.0 && dimensions.height == 0.0 {
            dimensions.height = dimensions.width / aspect_ratio;
        }
    }

    fn log_layout_tree(&self) {
        let mut stack: Vec<(usize, usize)> = self
            .layout_element_tree_roots
            .iter()
            .rev()
            .map(|root| (root.layout_element_index, 0))
            .collect();
        while let Some((index, depth)) = stack.pop() {
            let element = &self.layout_elements[index];
            let bounding_box = self
                .layout_element_map
                .get(&element.id)
                .filter(|item| item.layout_element_index == index)
                .map(|item| item.bounding_box)
                .unwrap_or_default();
            let label = match element.text_data {
                Some(text) => self.arena.str(self.text_element_data[text].text),
                None => self.arena.str(element.label),
            };
            tracing::debug!(
                depth,
                id = element.id,
                label,
                x = bounding_box.x,
                y = bounding_box.y,
                width = bounding_box.width,
                height = bounding_box.height,
                "layout element"
            );
            let children = &self.layout_element_children
                [element.children_start..element.children_start + element.children_length];
            stack.extend(children.iter().rev().map(|&child| (child, depth + 1)));
        }
    }
}

impl<P> std::fmt::Debug for LayoutContext<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutContext")
            .field("layout_dimensions", &self.layout_dimensions)
            .field("generation", &self.generation)
            .field("phase", &self.phase)
            .field("elements", &self.layout_elements.len())
            .field("render_commands", &self.render_commands.len())
            .field("arena", &self.arena)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    pub(super) fn recording_context(
        dimensions: Dimensions,
    ) -> (LayoutContext<()>, Rc<RefCell<Vec<ErrorType>>>) {
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&errors);
        let config = Config {
            panic_on_usage_error: false,
            max_element_count: 256,
            ..Config::default()
        };
        let handler: ErrorHandler = Box::new(move |error: Error<'_>| sink.borrow_mut().push(error.type_));
        let mut ctx = LayoutContext::with_config(config, dimensions, Some(handler)).unwrap();
        ctx.set_measure_text_function(|text, config| {
            Dimensions::new(text.len() as f32 * config.font_size as f32 * 0.5, config.font_size as f32)
        });
        (ctx, errors)
    }

    #[test]
    fn rejects_bad_dimensions() {
        let err = LayoutContext::<()>::initialize(1 << 24, Dimensions::new(f32::NAN, 10.0), None).unwrap_err();
        assert!(matches!(err, InitError::InvalidDimensions { .. }));
        let err = LayoutContext::<()>::initialize(1 << 24, Dimensions::new(-1.0, 10.0), None).unwrap_err();
        assert!(matches!(err, InitError::InvalidDimensions { .. }));
    }

    #[test]
    fn rejects_small_arena() {
        let err = LayoutContext::<()>::initialize(64, Dimensions::new(10.0, 10.0), None).unwrap_err();
        match err {
            InitError::InsufficientMemory { provided, required } => {
                assert_eq!(provided, 64);
                assert_eq!(required, Config::default().min_memory_size());
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_capacity() {
        let config = Config {
            max_element_count: 0,
            ..Config::default()
        };
        let err = LayoutContext::<()>::with_config(config, Dimensions::new(10.0, 10.0), None).unwrap_err();
        assert!(matches!(err, InitError::ZeroElementCapacity));
    }

    #[test]
    fn root_label_lives_in_the_persistent_region() {
        let mut ctx = LayoutContext::<()>::new(Dimensions::new(100.0, 100.0));
        ctx.set_panic_on_usage_error(false);
        assert_eq!(ctx.arena().persistent_size(), ROOT_CONTAINER_LABEL.len());
        assert_eq!(ctx.arena().capacity(), Config::default().min_memory_size());
        assert_eq!(ctx.phase(), LayoutPhase::Idle);

        for _ in 0..2 {
            ctx.begin_layout();
            ctx.end_layout();
            // the root label is found in the persistent region, not copied again
            assert_eq!(ctx.arena().used(), ROOT_CONTAINER_LABEL.len());
        }
    }

    #[test]
    fn caller_memory_is_used_as_is() {
        let config = Config {
            max_element_count: 16,
            max_measure_text_cache_word_count: 16,
            ..Config::default()
        };
        let size = config.min_memory_size() + 100;
        let ctx = LayoutContext::<()>::with_memory(vec![0u8; size], config, Dimensions::new(1.0, 1.0), None).unwrap();
        assert_eq!(ctx.arena().capacity(), size);
    }

    #[test]
    fn growing_element_capacity_past_the_arena_is_reverted() {
        let (mut ctx, errors) = recording_context(Dimensions::new(100.0, 100.0));
        ctx.set_max_element_count(1 << 20);
        assert_eq!(ctx.max_element_count(), 256);
        assert_eq!(errors.borrow().as_slice(), &[ErrorType::ArenaCapacityExceeded]);

        ctx.set_max_element_count(128);
        assert_eq!(ctx.max_element_count(), 128);
        assert_eq!(errors.borrow().len(), 1);
    }

    #[test]
    fn float_comparison_uses_epsilon() {
        assert!(float_equal(1.0, 1.005));
        assert!(!float_equal(1.0, 1.02));
    }
}
