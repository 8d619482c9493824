use std::collections::hash_map::Entry;

use super::{
    LayoutContext, LayoutElement, LayoutElementHashMapItem, LayoutElementTreeRoot, LayoutPhase,
    TextElementData, MAXFLOAT, ROOT_CONTAINER_LABEL, ROOT_STACK_DEPTH, TEXT_DECLARATION,
};
use crate::arena::ArenaStr;
use crate::elements::{ElementDeclaration, FloatingAttachToElement, FloatingClipToElement, FloatingConfig};
use crate::errors::{ErrorType, UnbalancedTreeError};
use crate::id::{hash_number, hash_string, hash_string_with_offset, ElementId};
use crate::layout::{Sizing, SizingType};
use crate::math::Dimensions;
use crate::render_commands::RenderCommand;
use crate::text::TextConfig;

impl<P> LayoutContext<P> {
    /// Starts a new frame. The previous frame's tree is discarded, persistent
    /// state (scroll positions, the text cache, element ids) is kept.
    pub fn begin_layout(&mut self) {
        if self.phase == LayoutPhase::Declaring {
            self.report(
                ErrorType::UnbalancedTree,
                "begin_layout called while the previous layout was still being declared",
            );
        }
        self.initialize_ephemeral_memory();
        self.generation = self.generation.wrapping_add(1);
        self.evict_stale_text_cache();
        self.evict_stale_elements();
        self.phase = LayoutPhase::Declaring;

        // slot shared by every text element
        self.declarations.push(ElementDeclaration::default());

        let root_id = hash_string(ROOT_CONTAINER_LABEL, 0);
        self.open_element_with_id(&root_id);
        let mut root = ElementDeclaration::default();
        root.layout.sizing.width = Sizing::Fixed(self.layout_dimensions.width).into();
        root.layout.sizing.height = Sizing::Fixed(self.layout_dimensions.height).into();
        self.apply_declaration(0, root);
        self.open_layout_element_stack.push(0);
        self.layout_element_tree_roots.push(LayoutElementTreeRoot {
            layout_element_index: 0,
            ..Default::default()
        });
        tracing::trace!(generation = self.generation, "layout begun");
    }

    /// Finishes the frame: closes the root, resolves the layout and returns
    /// the render commands.
    ///
    /// Elements left open are reported as [`ErrorType::UnbalancedTree`] and
    /// closed automatically.
    pub fn end_layout(&mut self) -> &[RenderCommand<P>] {
        let _ = self.end_layout_checked();
        &self.render_commands
    }

    /// Like [`LayoutContext::end_layout`], but also returns whether the tree
    /// was balanced. The layout is resolved either way.
    pub fn end_layout_checked(&mut self) -> Result<&[RenderCommand<P>], UnbalancedTreeError> {
        if self.phase != LayoutPhase::Declaring {
            self.report(ErrorType::UnbalancedTree, "end_layout called without begin_layout");
            return Err(UnbalancedTreeError::NoLayout);
        }
        let mut result = Ok(());
        let dropped = std::mem::take(&mut self.dropped_depth);
        let open = self.open_layout_element_stack.len().saturating_sub(ROOT_STACK_DEPTH) + dropped;
        if open > 0 {
            result = Err(UnbalancedTreeError::LeftOpen { open });
            self.report(
                ErrorType::UnbalancedTree,
                &format!("layout ended with {open} element(s) still open"),
            );
            while self.open_layout_element_stack.len() > ROOT_STACK_DEPTH {
                self.close_open_element();
            }
        }
        self.close_open_element();
        self.calculate_final_layout();
        self.phase = LayoutPhase::Resolved;
        if self.debug_mode_enabled {
            self.log_layout_tree();
        }
        tracing::debug!(
            generation = self.generation,
            elements = self.layout_elements.len(),
            render_commands = self.render_commands.len(),
            arena_used = self.arena.used(),
            "layout resolved"
        );
        result.map(|()| self.render_commands.as_slice())
    }

    fn initialize_ephemeral_memory(&mut self) {
        self.arena.reset_ephemeral();
        self.strings.clear_ephemeral(self.arena.persistent_size());
        self.layout_elements.clear();
        self.declarations.clear();
        self.open_layout_element_stack.clear();
        self.layout_element_children.clear();
        self.layout_element_children_buffer.clear();
        self.text_element_data.clear();
        self.aspect_ratio_element_indexes.clear();
        self.wrapped_text_lines.clear();
        self.layout_element_tree_roots.clear();
        self.open_clip_element_stack.clear();
        self.render_commands.clear();
        self.warnings = Default::default();
        self.dropped_depth = 0;
    }

    /// Forgets ids that have not been declared for a full frame.
    fn evict_stale_elements(&mut self) {
        let generation = self.generation;
        self.layout_element_map
            .retain(|_, item| item.generation.wrapping_add(1) >= generation);
    }

    /// Opens an anonymous element. Its id is derived from its position under
    /// the parent.
    pub fn open_element(&mut self) {
        self.open_element_inner(None);
    }

    pub fn open_element_with_id(&mut self, id: &ElementId) {
        self.open_element_inner(Some(id));
    }

    fn open_element_inner(&mut self, id: Option<&ElementId>) {
        if self.phase != LayoutPhase::Declaring {
            self.report(
                ErrorType::MalformedDeclaration,
                "open_element called outside of begin_layout/end_layout",
            );
            return;
        }
        if self.dropped_depth > 0 {
            // inside a dropped subtree
            self.dropped_depth += 1;
            return;
        }
        if self.layout_elements.len() >= self.max_element_count as usize {
            self.drop_element();
            return;
        }
        let element_id = match id {
            Some(id) => id.clone(),
            None => self.anonymous_child_id(),
        };
        if self.declared_this_frame(element_id.id) {
            self.report(
                ErrorType::DuplicateId,
                &format!("an element with id {element_id} was already declared this frame; it is skipped"),
            );
            // the duplicate and its subtree are dropped like elements past capacity
            self.dropped_depth += 1;
            return;
        }
        let label = match id {
            Some(id) if !id.label().is_empty() => self.intern(id.label()),
            _ => ArenaStr::EMPTY,
        };
        let index = self.layout_elements.len();
        self.declarations.push(ElementDeclaration::default());
        self.layout_elements.push(LayoutElement {
            id: element_id.id,
            label,
            declaration: self.declarations.len() - 1,
            clip_element_id: self.open_clip_element_stack.last().copied().unwrap_or(0),
            ..Default::default()
        });
        self.open_layout_element_stack.push(index);
        self.add_hash_map_item(&element_id, index);
        self.last_element_id = element_id;
    }

    fn drop_element(&mut self) {
        self.dropped_depth += 1;
        if !self.warnings.max_elements_exceeded {
            self.warnings.max_elements_exceeded = true;
            let max = self.max_element_count;
            self.report(
                ErrorType::ElementsCapacityExceeded,
                &format!("more than {max} elements declared; further elements are dropped this frame"),
            );
        }
    }

    fn anonymous_child_id(&self) -> ElementId {
        match self.open_element_index() {
            Some(parent) => {
                let parent = &self.layout_elements[parent];
                let offset = parent.children_length + parent.floating_children_count;
                hash_number(offset as u32, parent.id)
            }
            None => hash_number(0, 0),
        }
    }

    fn intern(&mut self, s: &str) -> ArenaStr {
        match self.strings.intern(&mut self.arena, s) {
            Ok(stored) => stored,
            Err(err) => {
                self.report_arena_exhausted(err);
                ArenaStr::EMPTY
            }
        }
    }

    fn declared_this_frame(&self, id: u32) -> bool {
        self.layout_element_map
            .get(&id)
            .is_some_and(|item| item.generation == self.generation)
    }

    fn add_hash_map_item(&mut self, element_id: &ElementId, index: usize) {
        let generation = self.generation;
        let duplicate = match self.layout_element_map.entry(element_id.id) {
            Entry::Occupied(mut entry) => {
                let item = entry.get_mut();
                if item.generation == generation {
                    true
                } else {
                    item.element_id = element_id.clone();
                    item.layout_element_index = index;
                    item.generation = generation;
                    item.on_hover_fn = None;
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(LayoutElementHashMapItem {
                    bounding_box: Default::default(),
                    element_id: element_id.clone(),
                    layout_element_index: index,
                    on_hover_fn: None,
                    generation,
                });
                false
            }
        };
        if duplicate {
            self.report(
                ErrorType::DuplicateId,
                &format!("an element with id {element_id} was already declared this frame"),
            );
        }
    }

    /// Applies a declaration to the innermost open element. Calling it again
    /// before the element is closed replaces the earlier declaration.
    pub fn configure_open_element(&mut self, declaration: &ElementDeclaration<P>) {
        if self.phase != LayoutPhase::Declaring {
            self.report(
                ErrorType::MalformedDeclaration,
                "configure_open_element called outside of begin_layout/end_layout",
            );
            return;
        }
        if self.dropped_depth > 0 {
            return;
        }
        if self.open_layout_element_stack.len() <= ROOT_STACK_DEPTH {
            self.report(
                ErrorType::MalformedDeclaration,
                "configure_open_element called with no open element",
            );
            return;
        }
        if let Some(index) = self.open_element_index() {
            self.apply_declaration(index, declaration.clone());
        }
    }

    fn apply_declaration(&mut self, index: usize, mut declaration: ElementDeclaration<P>) {
        if self.layout_elements[index].configured {
            self.undo_configuration(index);
        }
        let element_id = self.layout_elements[index].id;

        if declaration.floating.is_floating() {
            self.attach_floating(index, &mut declaration.floating);
        }
        if declaration.clip.is_enabled() {
            if !self.external_scroll_handling_enabled {
                if let Some(scroll) = self.scroll_container_datas.iter().find(|s| s.element_id == element_id) {
                    declaration.clip.child_offset = scroll.scroll_position;
                }
            }
            self.open_clip_element_stack.push(element_id);
            self.layout_elements[index].clip_stack_pushes += 1;
            self.track_scroll_container(element_id, declaration.clip);
        }
        if declaration.aspect_ratio > 0.0 {
            self.aspect_ratio_element_indexes.push(index);
        }
        let slot = self.layout_elements[index].declaration;
        self.declarations[slot] = declaration;
        self.layout_elements[index].configured = true;
    }

    /// Reverts the bookkeeping of an earlier `configure_open_element` on the
    /// same element.
    fn undo_configuration(&mut self, index: usize) {
        let pushes = self.layout_elements[index].clip_stack_pushes;
        for _ in 0..pushes {
            self.open_clip_element_stack.pop();
        }
        let element = &mut self.layout_elements[index];
        element.clip_stack_pushes = 0;
        element.clip_element_id = self.open_clip_element_stack.last().copied().unwrap_or(0);
        self.layout_element_tree_roots
            .retain(|root| root.layout_element_index != index);
        self.aspect_ratio_element_indexes.retain(|&i| i != index);
    }

    fn attach_floating(&mut self, index: usize, floating: &mut FloatingConfig) {
        let stack = &self.open_layout_element_stack;
        let hierarchical_parent = stack[stack.len() - 2];
        let mut clip_element_id = 0;
        match floating.attach_to {
            FloatingAttachToElement::Parent => {
                floating.parent_id = self.layout_elements[hierarchical_parent].id;
                clip_element_id = self.open_clip_element_stack.last().copied().unwrap_or(0);
            }
            FloatingAttachToElement::ElementWithId => match self.current_element_index(floating.parent_id) {
                Some(parent) => clip_element_id = self.layout_elements[parent].clip_element_id,
                None => {
                    let parent_id = floating.parent_id;
                    self.report(
                        ErrorType::FloatingContainerParentNotFound,
                        &format!("floating element attaches to id {parent_id}, which has not been declared this frame"),
                    );
                }
            },
            FloatingAttachToElement::Root => floating.parent_id = self.root_id,
            FloatingAttachToElement::None => return,
        }
        if floating.clip_to == FloatingClipToElement::None {
            clip_element_id = 0;
        }
        let element = &mut self.layout_elements[index];
        element.clip_element_id = clip_element_id;
        element.clip_stack_pushes += 1;
        self.open_clip_element_stack.push(clip_element_id);
        self.layout_element_tree_roots.push(LayoutElementTreeRoot {
            layout_element_index: index,
            parent_id: floating.parent_id,
            clip_element_id,
            z_index: floating.z_index,
        });
    }

    /// Closes the innermost open element.
    pub fn close_element(&mut self) -> Result<(), UnbalancedTreeError> {
        if self.phase != LayoutPhase::Declaring {
            self.report(ErrorType::UnbalancedTree, "close_element called outside of a layout");
            return Err(UnbalancedTreeError::NoLayout);
        }
        if self.dropped_depth > 0 {
            self.dropped_depth -= 1;
            return Ok(());
        }
        if self.open_layout_element_stack.len() <= ROOT_STACK_DEPTH {
            self.report(ErrorType::UnbalancedTree, "close_element called with no open element");
            return Err(UnbalancedTreeError::CloseWithoutOpen);
        }
        self.close_open_element();
        Ok(())
    }

    /// Pops the open element, computes its fit size from its children and
    /// attaches it to its parent.
    fn close_open_element(&mut self) {
        let Some(index) = self.open_layout_element_stack.pop() else {
            return;
        };
        let element = self.layout_elements[index];
        for _ in 0..element.clip_stack_pushes {
            self.open_clip_element_stack.pop();
        }

        let declaration = &self.declarations[element.declaration];
        let layout = declaration.layout;
        let clip = declaration.clip;
        let is_floating = declaration.floating.is_floating();
        let x_axis = layout.layout_direction.is_x_axis();
        let (clips_main, clips_cross) = if x_axis {
            (clip.horizontal, clip.vertical)
        } else {
            (clip.vertical, clip.horizontal)
        };
        let main_padding = layout.padding.along(x_axis);
        let cross_padding = layout.padding.along(!x_axis);

        let mut dimensions = Dimensions::default();
        let mut min_dimensions = Dimensions::default();
        *dimensions.along_mut(x_axis) = main_padding;
        *dimensions.along_mut(!x_axis) = cross_padding;
        *min_dimensions.along_mut(x_axis) = main_padding;
        *min_dimensions.along_mut(!x_axis) = cross_padding;

        let children_start = self.layout_element_children.len();
        let buffer_start = self.layout_element_children_buffer.len() - element.children_length;
        for &child_index in &self.layout_element_children_buffer[buffer_start..] {
            let child = &self.layout_elements[child_index];
            *dimensions.along_mut(x_axis) += child.dimensions.along(x_axis);
            let cross = dimensions.along_mut(!x_axis);
            *cross = cross.max(child.dimensions.along(!x_axis) + cross_padding);
            if !clips_main {
                *min_dimensions.along_mut(x_axis) += child.min_dimensions.along(x_axis);
            }
            if !clips_cross {
                let cross = min_dimensions.along_mut(!x_axis);
                *cross = cross.max(child.min_dimensions.along(!x_axis) + cross_padding);
            }
            self.layout_element_children.push(child_index);
        }
        let gaps = element.children_length.saturating_sub(1) as f32 * layout.child_gap as f32;
        *dimensions.along_mut(x_axis) += gaps;
        if !clips_main {
            *min_dimensions.along_mut(x_axis) += gaps;
        }
        self.layout_element_children_buffer.truncate(buffer_start);

        let slot = element.declaration;
        for axis in [true, false] {
            let sizing = self.declarations[slot].layout.sizing.along_mut(axis);
            if sizing.type_ == SizingType::Percent {
                *dimensions.along_mut(axis) = 0.0;
                continue;
            }
            if sizing.min_max.max <= 0.0 && sizing.type_ != SizingType::Fixed {
                sizing.min_max.max = MAXFLOAT;
            }
            let (min, max) = (sizing.min_max.min, sizing.min_max.max);
            let size = dimensions.along_mut(axis);
            *size = size.max(min).min(max);
            let min_size = min_dimensions.along_mut(axis);
            *min_size = min_size.max(min).min(max);
        }

        let closed = &mut self.layout_elements[index];
        closed.children_start = children_start;
        closed.dimensions = dimensions;
        closed.min_dimensions = min_dimensions;
        self.update_aspect_ratio_box(index);

        if self.open_layout_element_stack.len() > 1 {
            if let Some(parent) = self.open_element_index() {
                let parent = &mut self.layout_elements[parent];
                if is_floating {
                    parent.floating_children_count += 1;
                } else {
                    parent.children_length += 1;
                    self.layout_element_children_buffer.push(index);
                }
            }
        }
    }

    /// Declares a text leaf inside the innermost open element.
    pub fn open_text_element(&mut self, text: &str, config: &TextConfig) {
        if self.phase != LayoutPhase::Declaring {
            self.report(
                ErrorType::MalformedDeclaration,
                "open_text_element called outside of begin_layout/end_layout",
            );
            return;
        }
        if self.dropped_depth > 0 {
            return;
        }
        if self.layout_elements.len() >= self.max_element_count as usize {
            self.drop_element();
            self.dropped_depth -= 1;
            return;
        }
        let Some(parent_index) = self.open_element_index() else {
            return;
        };
        let stored = match self.strings.intern(&mut self.arena, text) {
            Ok(stored) => stored,
            Err(err) => {
                self.report_arena_exhausted(err);
                return;
            }
        };
        let measured = self.measure_text_cached(text, config);
        let parent = &self.layout_elements[parent_index];
        let element_id = hash_number(
            (parent.children_length + parent.floating_children_count) as u32,
            parent.id,
        );
        let height = if config.line_height > 0 {
            config.line_height as f32
        } else {
            measured.unwrapped_dimensions.height
        };
        let index = self.layout_elements.len();
        let dimensions = Dimensions::new(measured.unwrapped_dimensions.width, height);
        let min_dimensions = Dimensions::new(measured.min_width, height);
        self.text_element_data.push(TextElementData {
            text: stored,
            config: *config,
            measured,
            element_index: index,
            wrapped_lines_start: 0,
            wrapped_lines_length: 0,
        });
        self.layout_elements.push(LayoutElement {
            id: element_id.id,
            declaration: TEXT_DECLARATION,
            text_data: Some(self.text_element_data.len() - 1),
            dimensions,
            min_dimensions,
            clip_element_id: self.open_clip_element_stack.last().copied().unwrap_or(0),
            configured: true,
            ..Default::default()
        });
        self.layout_element_children_buffer.push(index);
        self.layout_elements[parent_index].children_length += 1;
        self.add_hash_map_item(&element_id, index);
    }

    /// Opens an element, configures it, runs `children` and closes it.
    pub fn declare_element(
        &mut self,
        id: Option<&ElementId>,
        declaration: &ElementDeclaration<P>,
        children: impl FnOnce(&mut Self),
    ) {
        match id {
            Some(id) => self.open_element_with_id(id),
            None => self.open_element(),
        }
        self.configure_open_element(declaration);
        children(self);
        let _ = self.close_element();
    }

    /// Global id from a label.
    pub fn id(&self, label: &str) -> ElementId {
        hash_string(label, 0)
    }

    /// Global id from a label and an index.
    pub fn id_index(&self, label: &str, index: u32) -> ElementId {
        hash_string_with_offset(label, index, 0)
    }

    /// Id scoped to the innermost open element.
    pub fn id_local(&self, label: &str) -> ElementId {
        hash_string(label, self.open_parent_id())
    }

    /// Indexed id scoped to the innermost open element.
    pub fn id_index_local(&self, label: &str, index: u32) -> ElementId {
        hash_string_with_offset(label, index, self.open_parent_id())
    }

    /// Global id for `index` under the label of `id`.
    pub fn element_id_with_index(&self, id: &ElementId, index: u32) -> ElementId {
        hash_string_with_offset(id.label(), index, 0)
    }

    /// Id of the most recently opened element.
    pub fn last_element_id(&self) -> &ElementId {
        &self.last_element_id
    }

    fn open_parent_id(&self) -> u32 {
        self.open_element_index()
            .map(|index| self.layout_elements[index].id)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use crate::elements::Declaration;
    use crate::engine::tests::recording_context;
    use crate::errors::{ErrorType, UnbalancedTreeError};
    use crate::id::ElementId;
    use crate::layout::Padding;
    use crate::math::Dimensions;
    use crate::{fit, fixed};

    #[test]
    fn fit_parent_sums_children_along_the_axis() {
        let (mut ctx, _) = recording_context(Dimensions::new(800.0, 600.0));
        ctx.begin_layout();
        let parent = ElementId::new("Parent");
        let decl = Declaration::new()
            .width(fit!())
            .layout(|l| l.padding(Padding::all(10)).gap(5))
            .into_parts()
            .1;
        ctx.declare_element(Some(&parent), &decl, |ctx| {
            for _ in 0..3 {
                let child = Declaration::new().width(fixed!(20.0)).height(fixed!(30.0)).into_parts().1;
                ctx.declare_element(None, &child, |_| {});
            }
        });
        ctx.end_layout();
        let data = ctx.get_element_data(&parent);
        assert!(data.found);
        assert_eq!(data.bounding_box.width, 20.0 + 3.0 * 20.0 + 2.0 * 5.0);
        assert_eq!(data.bounding_box.height, 20.0 + 30.0);
    }

    #[test]
    fn close_without_open_is_reported() {
        let (mut ctx, errors) = recording_context(Dimensions::new(100.0, 100.0));
        ctx.begin_layout();
        assert_eq!(ctx.close_element(), Err(UnbalancedTreeError::CloseWithoutOpen));
        ctx.end_layout();
        assert_eq!(errors.borrow().as_slice(), &[ErrorType::UnbalancedTree]);
    }

    #[test]
    fn elements_left_open_are_closed_at_end() {
        let (mut ctx, errors) = recording_context(Dimensions::new(100.0, 100.0));
        ctx.begin_layout();
        ctx.open_element();
        ctx.open_element();
        let result = ctx.end_layout_checked().map(|commands| commands.len());
        assert_eq!(result, Err(UnbalancedTreeError::LeftOpen { open: 2 }));
        assert_eq!(errors.borrow().as_slice(), &[ErrorType::UnbalancedTree]);

        // the next frame starts clean
        ctx.begin_layout();
        assert!(ctx.end_layout_checked().is_ok());
    }

    #[test]
    #[should_panic(expected = "UnbalancedTree")]
    fn usage_errors_panic_when_asked_to() {
        let (mut ctx, _) = recording_context(Dimensions::new(100.0, 100.0));
        ctx.set_panic_on_usage_error(true);
        ctx.begin_layout();
        let _ = ctx.close_element();
    }

    #[test]
    fn configure_without_open_element_is_malformed() {
        let (mut ctx, errors) = recording_context(Dimensions::new(100.0, 100.0));
        ctx.begin_layout();
        ctx.configure_open_element(&Default::default());
        ctx.end_layout();
        assert_eq!(errors.borrow().as_slice(), &[ErrorType::MalformedDeclaration]);
    }

    #[test]
    fn duplicate_ids_skip_the_second_subtree() {
        let (mut ctx, errors) = recording_context(Dimensions::new(100.0, 100.0));
        ctx.begin_layout();
        let id = ElementId::new("Twice");
        let first = Declaration::new()
            .width(fixed!(10.0))
            .height(fixed!(10.0))
            .background_color(0xFF0000u32)
            .into_parts()
            .1;
        let second = Declaration::new()
            .width(fixed!(20.0))
            .height(fixed!(20.0))
            .background_color(0x00FF00u32)
            .into_parts()
            .1;
        ctx.declare_element(Some(&id), &first, |_| {});
        ctx.declare_element(Some(&id), &second, |ctx| {
            ctx.declare_element(Some(&ElementId::new("Nested")), &first, |_| {});
            ctx.open_text_element("skipped", &Default::default());
        });
        let after = Declaration::new().width(fixed!(5.0)).height(fixed!(5.0)).into_parts().1;
        ctx.declare_element(Some(&ElementId::new("After")), &after, |_| {});
        let emitted = ctx.end_layout_checked().map(|commands| commands.len());

        assert_eq!(emitted, Ok(1));
        assert_eq!(errors.borrow().as_slice(), &[ErrorType::DuplicateId]);
        assert_eq!(ctx.get_element_data(&id).bounding_box.width, 10.0);
        assert!(!ctx.get_element_data(&ElementId::new("Nested")).found);
        // the skipped element takes no space
        assert_eq!(ctx.get_element_data(&ElementId::new("After")).bounding_box.x, 10.0);
    }

    #[test]
    fn reconfiguring_replaces_the_declaration() {
        let (mut ctx, errors) = recording_context(Dimensions::new(200.0, 200.0));
        ctx.begin_layout();
        let id = ElementId::new("Panel");
        ctx.open_element_with_id(&id);
        let scrolling = Declaration::new().width(fixed!(50.0)).scroll(false, true).into_parts().1;
        ctx.configure_open_element(&scrolling);
        let plain = Declaration::new().width(fixed!(70.0)).into_parts().1;
        ctx.configure_open_element(&plain);
        ctx.close_element().unwrap();
        let commands = ctx.end_layout();
        assert!(commands.iter().all(|c| c.command_type() != crate::render_commands::RenderCommandType::ScissorStart));
        assert!(errors.borrow().is_empty());
        assert_eq!(ctx.get_element_data(&id).bounding_box.width, 70.0);
    }

    #[test]
    fn capacity_overflow_drops_whole_subtrees() {
        let (mut ctx, errors) = recording_context(Dimensions::new(100.0, 100.0));
        ctx.set_max_element_count(4);
        ctx.begin_layout();
        for _ in 0..3 {
            ctx.open_element();
            ctx.open_element();
            ctx.close_element().unwrap();
            ctx.close_element().unwrap();
        }
        ctx.open_text_element("dropped", &Default::default());
        assert!(ctx.end_layout_checked().is_ok());
        assert_eq!(errors.borrow().as_slice(), &[ErrorType::ElementsCapacityExceeded]);
    }

    #[test]
    fn anonymous_ids_follow_sibling_position() {
        let (mut ctx, _) = recording_context(Dimensions::new(100.0, 100.0));
        let mut seen = Vec::new();
        for _ in 0..2 {
            ctx.begin_layout();
            ctx.open_element();
            ctx.close_element().unwrap();
            ctx.open_element();
            seen.push(ctx.last_element_id().id);
            ctx.close_element().unwrap();
            ctx.end_layout();
        }
        assert_eq!(seen[0], seen[1]);
    }

    #[test]
    fn local_ids_depend_on_the_open_parent() {
        let (mut ctx, _) = recording_context(Dimensions::new(100.0, 100.0));
        ctx.begin_layout();
        ctx.open_element_with_id(&ElementId::new("A"));
        let under_a = ctx.id_local("Item");
        ctx.close_element().unwrap();
        ctx.open_element_with_id(&ElementId::new("B"));
        let under_b = ctx.id_local("Item");
        assert_eq!(under_b, ctx.id_local("Item"));
        ctx.close_element().unwrap();
        ctx.end_layout();
        assert_ne!(under_a, under_b);
        assert_eq!(ctx.id_index("Row", 3), ElementId::new_index("Row", 3));
        let row = ctx.id_index("Row", 3);
        assert_eq!(ctx.element_id_with_index(&row, 4), ElementId::new_index("Row", 4));
    }

    #[test]
    fn floating_parent_must_exist() {
        let (mut ctx, errors) = recording_context(Dimensions::new(100.0, 100.0));
        ctx.begin_layout();
        let decl = Declaration::new()
            .width(fixed!(10.0))
            .floating(|f| f.attach_id("Missing"))
            .into_parts()
            .1;
        ctx.declare_element(None, &decl, |_| {});
        ctx.end_layout();
        assert_eq!(errors.borrow().as_slice(), &[ErrorType::FloatingContainerParentNotFound]);
    }
}
