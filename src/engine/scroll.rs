use super::LayoutContext;
use crate::elements::ClipConfig;
use crate::id::ElementId;
use crate::math::{BoundingBox, Dimensions, Vector2};

/// Drag distance in pixels a release must exceed to keep scrolling.
const MOMENTUM_THRESHOLD: f32 = 10.0;
const MOMENTUM_DECAY: f32 = 0.95;
const MOMENTUM_MIN: f32 = 0.1;
/// Seconds the pointer may rest during a drag before the drag origin is reset.
const DRAG_REST_TIME: f32 = 0.15;

/// Snapshot of a scroll container's persistent state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollContainerData {
    pub scroll_position: Vector2,
    pub scroll_container_dimensions: Dimensions,
    pub content_dimensions: Dimensions,
    pub config: ClipConfig,
    pub found: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct ScrollContainerDataInternal {
    pub(super) bounding_box: BoundingBox,
    pub(super) content_size: Dimensions,
    scroll_origin: Vector2,
    pointer_origin: Vector2,
    scroll_momentum: Vector2,
    pub(super) scroll_position: Vector2,
    momentum_time: f32,
    pub(super) element_id: u32,
    open_this_frame: bool,
    pointer_scroll_active: bool,
    config: ClipConfig,
}

impl ScrollContainerDataInternal {
    fn new(element_id: u32, config: ClipConfig) -> Self {
        Self {
            scroll_origin: Vector2::new(-1.0, -1.0),
            element_id,
            open_this_frame: true,
            config,
            ..Default::default()
        }
    }

    /// How far content extends past the container, per axis.
    fn overflow(&self) -> Dimensions {
        Dimensions::new(
            (self.content_size.width - self.bounding_box.width).max(0.0),
            (self.content_size.height - self.bounding_box.height).max(0.0),
        )
    }

    fn can_scroll(&self) -> (bool, bool) {
        let overflow = self.overflow();
        (
            self.config.horizontal && overflow.width > 0.0,
            self.config.vertical && overflow.height > 0.0,
        )
    }

    fn clamp(&mut self) {
        let overflow = self.overflow();
        self.scroll_position.x = self.scroll_position.x.clamp(-overflow.width, 0.0);
        self.scroll_position.y = self.scroll_position.y.clamp(-overflow.height, 0.0);
    }

    fn release_drag(&mut self) {
        let diff = self.scroll_position - self.scroll_origin;
        let divisor = self.momentum_time * 25.0;
        if diff.x.abs() > MOMENTUM_THRESHOLD && divisor > 0.0 {
            self.scroll_momentum.x = diff.x / divisor;
        }
        if diff.y.abs() > MOMENTUM_THRESHOLD && divisor > 0.0 {
            self.scroll_momentum.y = diff.y / divisor;
        }
        self.pointer_scroll_active = false;
        self.pointer_origin = Vector2::ZERO;
        self.scroll_origin = Vector2::ZERO;
        self.momentum_time = 0.0;
    }

    fn apply_momentum(&mut self, wheel_moved: bool) {
        self.scroll_position = self.scroll_position + self.scroll_momentum;
        self.scroll_momentum.x *= MOMENTUM_DECAY;
        self.scroll_momentum.y *= MOMENTUM_DECAY;
        if self.scroll_momentum.x.abs() < MOMENTUM_MIN || wheel_moved {
            self.scroll_momentum.x = 0.0;
        }
        if self.scroll_momentum.y.abs() < MOMENTUM_MIN || wheel_moved {
            self.scroll_momentum.y = 0.0;
        }
    }

    fn drag(&mut self, pointer: Vector2, delta_time: f32) {
        self.scroll_momentum = Vector2::ZERO;
        if !self.pointer_scroll_active {
            self.pointer_origin = pointer;
            self.scroll_origin = self.scroll_position;
            self.pointer_scroll_active = true;
            return;
        }
        let previous = self.scroll_position;
        let (horizontal, vertical) = self.can_scroll();
        if horizontal {
            self.scroll_position.x = self.scroll_origin.x + (pointer.x - self.pointer_origin.x);
        }
        if vertical {
            self.scroll_position.y = self.scroll_origin.y + (pointer.y - self.pointer_origin.y);
        }
        self.clamp();
        let moved = self.scroll_position - previous;
        if moved.x.abs() < MOMENTUM_MIN && moved.y.abs() < MOMENTUM_MIN && self.momentum_time > DRAG_REST_TIME {
            self.momentum_time = 0.0;
            self.pointer_origin = pointer;
            self.scroll_origin = self.scroll_position;
        } else {
            self.momentum_time += delta_time;
        }
    }

    fn snapshot(&self) -> ScrollContainerData {
        ScrollContainerData {
            scroll_position: self.scroll_position,
            scroll_container_dimensions: Dimensions::new(self.bounding_box.width, self.bounding_box.height),
            content_dimensions: self.content_size,
            config: self.config,
            found: true,
        }
    }
}

impl<P> LayoutContext<P> {
    /// Marks the clip container `element_id` as declared this frame, creating
    /// its persistent state on first sight.
    pub(super) fn track_scroll_container(&mut self, element_id: u32, clip: ClipConfig) {
        match self
            .scroll_container_datas
            .iter_mut()
            .find(|scroll| scroll.element_id == element_id)
        {
            Some(scroll) => {
                scroll.open_this_frame = true;
                scroll.config = clip;
            }
            None => self
                .scroll_container_datas
                .push(ScrollContainerDataInternal::new(element_id, clip)),
        }
    }

    /// Advances scroll state by one frame. Call it after `set_pointer_state`
    /// and before the next `begin_layout`.
    ///
    /// `scroll_delta` is the wheel movement in layout units and goes to the
    /// innermost container under the pointer that can scroll along that axis.
    /// With `enable_drag_scrolling`, holding the pointer down over a container
    /// drags its content; releasing after a long enough drag leaves momentum
    /// that decays over the following updates.
    pub fn update_scroll_containers(&mut self, enable_drag_scrolling: bool, scroll_delta: Vector2, delta_time: f32) {
        let pointer_down = enable_drag_scrolling && self.pointer_info.state.is_down();
        let wheel_moved = scroll_delta.x != 0.0 || scroll_delta.y != 0.0;

        let map = &self.layout_element_map;
        let before = self.scroll_container_datas.len();
        self.scroll_container_datas
            .retain(|scroll| scroll.open_this_frame && map.contains_key(&scroll.element_id));
        let evicted = before - self.scroll_container_datas.len();
        if evicted > 0 {
            tracing::debug!(evicted, "dropped scroll containers not declared last frame");
        }

        let mut innermost: Option<(usize, usize)> = None;
        for (index, scroll) in self.scroll_container_datas.iter_mut().enumerate() {
            scroll.open_this_frame = false;
            if !pointer_down && scroll.pointer_scroll_active {
                scroll.release_drag();
            }
            scroll.apply_momentum(wheel_moved);
            scroll.clamp();

            // deeper elements come later in the hit list
            if let Some(depth) = self.pointer_over_ids.iter().rposition(|id| id.id == scroll.element_id) {
                if innermost.map_or(true, |(best, _)| depth > best) {
                    innermost = Some((depth, index));
                }
            }
        }

        let Some((_, index)) = innermost else {
            return;
        };
        let pointer = self.pointer_info.position;
        let scroll = &mut self.scroll_container_datas[index];
        let (horizontal, vertical) = scroll.can_scroll();
        if horizontal {
            scroll.scroll_position.x += scroll_delta.x;
        }
        if vertical {
            scroll.scroll_position.y += scroll_delta.y;
        }
        if pointer_down {
            scroll.drag(pointer, delta_time);
        }
        scroll.clamp();
    }

    /// Scroll position of the currently open element, zero if it is not a
    /// scroll container.
    pub fn scroll_offset(&self) -> Vector2 {
        let Some(index) = self.open_element_index() else {
            return Vector2::ZERO;
        };
        let id = self.layout_elements[index].id;
        self.scroll_container_datas
            .iter()
            .find(|scroll| scroll.element_id == id)
            .map(|scroll| scroll.scroll_position)
            .unwrap_or_default()
    }

    /// Sets the scroll position of `id` directly. The position is clamped on
    /// the next [`LayoutContext::update_scroll_containers`].
    pub fn set_scroll_offset(&mut self, id: &ElementId, offset: Vector2) {
        match self
            .scroll_container_datas
            .iter_mut()
            .find(|scroll| scroll.element_id == id.id)
        {
            Some(scroll) => scroll.scroll_position = offset,
            None => {
                let mut scroll = ScrollContainerDataInternal::new(id.id, ClipConfig::default());
                scroll.scroll_position = offset;
                self.scroll_container_datas.push(scroll);
            }
        }
    }

    pub fn scroll_container_data(&self, id: &ElementId) -> ScrollContainerData {
        self.scroll_container_datas
            .iter()
            .find(|scroll| scroll.element_id == id.id)
            .map(ScrollContainerDataInternal::snapshot)
            .unwrap_or_default()
    }

    /// Mutable access to the stored scroll position of `id`.
    pub fn scroll_position_mut(&mut self, id: &ElementId) -> Option<&mut Vector2> {
        self.scroll_container_datas
            .iter_mut()
            .find(|scroll| scroll.element_id == id.id)
            .map(|scroll| &mut scroll.scroll_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Declaration;
    use crate::engine::tests::recording_context;
    use crate::fixed;

    fn list_id() -> ElementId {
        ElementId::new("List")
    }

    /// A 200px tall vertical scroll container holding 1000px of content.
    fn frame(ctx: &mut LayoutContext<()>) -> Vector2 {
        ctx.begin_layout();
        let list = Declaration::new()
            .width(fixed!(100.0))
            .height(fixed!(200.0))
            .scroll(false, true)
            .into_parts()
            .1;
        let mut offset = Vector2::ZERO;
        ctx.declare_element(Some(&list_id()), &list, |ctx| {
            offset = ctx.scroll_offset();
            let content = Declaration::new().width(fixed!(100.0)).height(fixed!(1000.0)).into_parts().1;
            ctx.declare_element(None, &content, |_| {});
        });
        ctx.end_layout();
        offset
    }

    #[test]
    fn wheel_scrolling_saturates_at_the_content_end() {
        let (mut ctx, _) = recording_context(Dimensions::new(800.0, 600.0));
        for _ in 0..40 {
            frame(&mut ctx);
            ctx.set_pointer_state(Vector2::new(50.0, 50.0), false);
            ctx.update_scroll_containers(true, Vector2::new(0.0, -50.0), 1.0);
            let y = ctx.scroll_container_data(&list_id()).scroll_position.y;
            assert!((-800.0..=0.0).contains(&y));
        }
        let data = ctx.scroll_container_data(&list_id());
        assert!(data.found);
        assert_eq!(data.scroll_position.y, -800.0);
        assert_eq!(data.content_dimensions.height, 1000.0);
        assert_eq!(data.scroll_container_dimensions.height, 200.0);
        // horizontal wheel input is ignored on a vertical-only container
        frame(&mut ctx);
        ctx.set_pointer_state(Vector2::new(50.0, 50.0), false);
        ctx.update_scroll_containers(false, Vector2::new(-30.0, 0.0), 1.0);
        assert_eq!(ctx.scroll_container_data(&list_id()).scroll_position.x, 0.0);
    }

    #[test]
    fn stored_position_becomes_the_child_offset() {
        let (mut ctx, _) = recording_context(Dimensions::new(800.0, 600.0));
        frame(&mut ctx);
        ctx.set_scroll_offset(&list_id(), Vector2::new(0.0, -120.0));
        assert_eq!(frame(&mut ctx).y, -120.0);
        let content = crate::id::hash_number(0, list_id().id);
        assert_eq!(ctx.get_element_data(&content).bounding_box.y, -120.0);

        if let Some(position) = ctx.scroll_position_mut(&list_id()) {
            position.y = -5000.0;
        }
        ctx.set_pointer_state(Vector2::new(500.0, 500.0), false);
        ctx.update_scroll_containers(false, Vector2::ZERO, 0.016);
        assert_eq!(ctx.scroll_container_data(&list_id()).scroll_position.y, -800.0);
    }

    #[test]
    fn external_scroll_handling_leaves_child_offset_alone() {
        let (mut ctx, _) = recording_context(Dimensions::new(800.0, 600.0));
        ctx.set_external_scroll_handling_enabled(true);
        frame(&mut ctx);
        ctx.set_scroll_offset(&list_id(), Vector2::new(0.0, -120.0));
        frame(&mut ctx);
        ctx.set_pointer_state(Vector2::new(50.0, 50.0), false);
        let content = ctx.pointer_over_ids().last().map(|id| ctx.get_element_data(id).bounding_box);
        assert_eq!(content.map(|b| b.y), Some(0.0));
    }

    #[test]
    fn undeclared_containers_are_evicted() {
        let (mut ctx, _) = recording_context(Dimensions::new(800.0, 600.0));
        frame(&mut ctx);
        ctx.update_scroll_containers(false, Vector2::ZERO, 0.016);
        assert!(ctx.scroll_container_data(&list_id()).found);

        ctx.begin_layout();
        ctx.end_layout();
        ctx.update_scroll_containers(false, Vector2::ZERO, 0.016);
        assert!(!ctx.scroll_container_data(&list_id()).found);
        assert_eq!(ctx.scroll_position_mut(&list_id()), None);
    }

    #[test]
    fn drag_release_leaves_decaying_momentum() {
        let (mut ctx, _) = recording_context(Dimensions::new(800.0, 600.0));
        let mut pointer_y = 150.0;
        // press, then drag upwards 20px per frame
        for _ in 0..5 {
            frame(&mut ctx);
            ctx.set_pointer_state(Vector2::new(50.0, pointer_y), true);
            ctx.update_scroll_containers(true, Vector2::ZERO, 0.016);
            pointer_y -= 20.0;
        }
        let dragged = ctx.scroll_container_data(&list_id()).scroll_position.y;
        assert_eq!(dragged, -80.0);

        frame(&mut ctx);
        ctx.set_pointer_state(Vector2::new(50.0, pointer_y), false);
        ctx.update_scroll_containers(true, Vector2::ZERO, 0.016);
        let first = ctx.scroll_container_data(&list_id()).scroll_position.y;
        assert!(first < dragged);

        frame(&mut ctx);
        ctx.set_pointer_state(Vector2::new(50.0, pointer_y), false);
        ctx.update_scroll_containers(true, Vector2::ZERO, 0.016);
        let second = ctx.scroll_container_data(&list_id()).scroll_position.y;
        assert!(second < first);
        assert!(first - second < dragged - first, "momentum decays");
    }
}
