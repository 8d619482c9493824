use super::{ElementData, LayoutContext, LayoutPhase};
use crate::elements::PointerCaptureMode;
use crate::id::ElementId;
use crate::math::Vector2;

/// Press/release state of the pointer, advanced by every
/// [`LayoutContext::set_pointer_state`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PointerDataInteractionState {
    PressedThisFrame,
    Pressed,
    ReleasedThisFrame,
    #[default]
    Released,
}

impl PointerDataInteractionState {
    fn advance(self, is_down: bool) -> Self {
        use PointerDataInteractionState::*;
        match (is_down, self) {
            (true, PressedThisFrame | Pressed) => Pressed,
            (true, _) => PressedThisFrame,
            (false, ReleasedThisFrame | Released) => Released,
            (false, _) => ReleasedThisFrame,
        }
    }

    #[inline]
    pub fn is_down(self) -> bool {
        matches!(self, Self::PressedThisFrame | Self::Pressed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerData {
    pub position: Vector2,
    pub state: PointerDataInteractionState,
}

impl<P> LayoutContext<P> {
    /// Updates the pointer and recomputes which elements of the last resolved
    /// layout lie under it. Hover callbacks run from here.
    ///
    /// Roots are tested from the highest z-index down; a floating root that
    /// captures the pointer hides everything beneath it.
    pub fn set_pointer_state(&mut self, position: Vector2, is_down: bool) {
        self.pointer_info.position = position;
        self.pointer_info.state = self.pointer_info.state.advance(is_down);
        if self.phase == LayoutPhase::Declaring {
            // the tree is half built; keep the ids from the last resolved frame
            return;
        }
        self.pointer_over_ids.clear();

        let pointer = self.pointer_info;
        let mut stack: Vec<usize> = Vec::new();
        for root_index in (0..self.layout_element_tree_roots.len()).rev() {
            let root = self.layout_element_tree_roots[root_index];
            let mut found = false;
            stack.clear();
            stack.push(root.layout_element_index);

            while let Some(index) = stack.pop() {
                let element = self.layout_elements[index];
                let Some(item) = self
                    .layout_element_map
                    .get(&element.id)
                    .filter(|item| item.layout_element_index == index && item.generation == self.generation)
                else {
                    continue;
                };
                let inside_clip = element.clip_element_id == 0
                    || self
                        .layout_element_map
                        .get(&element.clip_element_id)
                        .is_some_and(|clip| clip.bounding_box.contains(position));

                if inside_clip && item.bounding_box.contains(position) {
                    if let Some(item) = self.layout_element_map.get_mut(&element.id) {
                        if let Some(on_hover) = item.on_hover_fn.as_mut() {
                            on_hover(&item.element_id, pointer);
                        }
                        self.pointer_over_ids.push(item.element_id.clone());
                    }
                    found = true;
                }

                if element.text_data.is_some() {
                    continue;
                }
                let children = &self.layout_element_children
                    [element.children_start..element.children_start + element.children_length];
                stack.extend(children.iter().rev().copied());
            }

            let floating = self.declaration(root.layout_element_index).floating;
            if found && floating.is_floating() && floating.pointer_capture_mode == PointerCaptureMode::Capture {
                break;
            }
        }
    }

    pub fn pointer_data(&self) -> PointerData {
        self.pointer_info
    }

    /// Ids under the pointer, outermost first, topmost root first.
    pub fn pointer_over_ids(&self) -> &[ElementId] {
        &self.pointer_over_ids
    }

    pub fn pointer_over(&self, id: &ElementId) -> bool {
        self.pointer_over_ids.iter().any(|over| over.id == id.id)
    }

    /// Whether the pointer was over the currently open element at the last
    /// [`LayoutContext::set_pointer_state`].
    pub fn hovered(&self) -> bool {
        match self.open_element_index() {
            Some(index) => {
                let id = self.layout_elements[index].id;
                self.pointer_over_ids.iter().any(|over| over.id == id)
            }
            None => false,
        }
    }

    /// Registers a callback for the currently open element. It is called on
    /// every `set_pointer_state` that finds the pointer over the element, until
    /// the element is declared again in a later frame.
    pub fn on_hover(&mut self, callback: impl FnMut(&ElementId, PointerData) + 'static) {
        let Some(index) = self.open_element_index().filter(|_| self.phase == LayoutPhase::Declaring) else {
            self.report(
                crate::errors::ErrorType::MalformedDeclaration,
                "on_hover called with no open element",
            );
            return;
        };
        let id = self.layout_elements[index].id;
        if let Some(item) = self.layout_element_map.get_mut(&id) {
            item.on_hover_fn = Some(Box::new(callback));
        }
    }

    /// Bounding box of `id` in the most recently resolved layout.
    pub fn get_element_data(&self, id: &ElementId) -> ElementData {
        match self.layout_element_map.get(&id.id) {
            Some(item) if self.item_is_live(item) => ElementData {
                bounding_box: item.bounding_box,
                found: true,
            },
            _ => ElementData::default(),
        }
    }
}
