//! A single-pass UI layout engine.
//!
//! Each frame the host declares a tree of elements, `claylay` resolves their
//! sizes and positions and returns a flat list of [`RenderCommand`]s for any
//! renderer to draw. Element ids, scroll positions and measured text persist
//! across frames inside a [`LayoutContext`].
//!
//! ```
//! use claylay::{fixed, grow, Declaration, Dimensions, LayoutContext};
//! use claylay::align::{AlignX, AlignY};
//!
//! let mut ctx: LayoutContext = LayoutContext::new(Dimensions::new(800.0, 600.0));
//! let mut ui = ctx.begin();
//! ui.element(
//!     Declaration::new()
//!         .width(grow!())
//!         .height(grow!())
//!         .layout(|l| l.align(AlignX::CenterX, AlignY::CenterY)),
//!     |ui| {
//!         ui.element(
//!             Declaration::new().id("Button").width(fixed!(100.0)).height(fixed!(50.0)).background_color(0x3366FFu32),
//!             |_| {},
//!         );
//!     },
//! );
//! let commands = ui.end();
//! assert_eq!(commands.len(), 1);
//! assert_eq!(commands[0].bounding_box.x, 350.0);
//! ```

pub mod align;
pub mod arena;
pub mod color;
pub mod config;
pub mod current;
pub mod elements;
pub mod engine;
pub mod errors;
pub mod handle;
pub mod id;
pub mod layout;
pub mod math;
pub mod prelude;
pub mod render_commands;
pub mod strings;
pub mod text;

use std::ops::{Deref, DerefMut};

pub use color::Color;
pub use config::Config;
pub use elements::Declaration;
pub use engine::{ElementData, LayoutContext, LayoutPhase, PointerData, PointerDataInteractionState, ScrollContainerData};
pub use errors::{Error, ErrorType, InitError, UnbalancedTreeError};
pub use handle::Handle;
pub use id::ElementId;
pub use math::{BoundingBox, Dimensions, Vector2};
pub use render_commands::{RenderCommand, RenderCommandConfig, RenderCommandType};
pub use text::TextConfig;

/// One frame being declared. Created by [`LayoutContext::begin`].
///
/// Dropping a `Ui` without calling [`Ui::end`] still ends the frame, so the
/// context never stays stuck in the declaring phase.
pub struct Ui<'ctx, P = ()> {
    ctx: Option<&'ctx mut LayoutContext<P>>,
}

impl<P> LayoutContext<P> {
    /// Begins a frame and returns the scoped declaration handle.
    pub fn begin(&mut self) -> Ui<'_, P> {
        self.begin_layout();
        Ui { ctx: Some(self) }
    }
}

impl<'ctx, P> Ui<'ctx, P> {
    /// Declares an element, runs `children` to declare its contents and
    /// closes it again.
    pub fn element(&mut self, declaration: Declaration<P>, children: impl FnOnce(&mut Self)) -> &mut Self {
        let (id, declaration) = declaration.into_parts();
        match &id {
            Some(id) => self.open_element_with_id(id),
            None => self.open_element(),
        }
        self.configure_open_element(&declaration);
        children(self);
        // an imbalance here is already reported to the error handler
        let _ = self.close_element();
        self
    }

    /// Declares a text leaf inside the current element.
    ///
    /// ```
    /// # use claylay::{Dimensions, LayoutContext};
    /// # let mut ctx: LayoutContext = LayoutContext::new(Dimensions::new(200.0, 100.0));
    /// let mut ui = ctx.begin();
    /// ui.text("Hello", |t| t.font_size(16).color(0xFFFFFFu32));
    /// assert_eq!(ui.end()[0].text(), Some("Hello"));
    /// ```
    pub fn text(&mut self, text: &str, config: impl FnOnce(&mut TextConfig) -> &mut TextConfig) -> &mut Self {
        let mut text_config = TextConfig::new();
        config(&mut text_config);
        self.open_text_element(text, &text_config);
        self
    }

    /// Ends the frame and returns its render commands.
    pub fn end(mut self) -> &'ctx [RenderCommand<P>] {
        match self.ctx.take() {
            Some(ctx) => ctx.end_layout(),
            None => &[],
        }
    }
}

impl<P> Deref for Ui<'_, P> {
    type Target = LayoutContext<P>;

    fn deref(&self) -> &Self::Target {
        self.ctx.as_deref().expect("the context is only released by end or drop")
    }
}

impl<P> DerefMut for Ui<'_, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx.as_deref_mut().expect("the context is only released by end or drop")
    }
}

impl<P> Drop for Ui<'_, P> {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            ctx.end_layout();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{AlignX, AlignY};
    use crate::layout::LayoutDirection;
    use crate::render_commands::scissors_balanced;
    use crate::{fixed, grow};

    fn context(width: f32, height: f32) -> LayoutContext {
        let mut ctx = LayoutContext::new(Dimensions::new(width, height));
        ctx.set_panic_on_usage_error(false);
        ctx.set_error_handler(|error| panic!("unexpected {:?}: {}", error.type_, error.text));
        ctx.set_measure_text_function(|text, config| {
            Dimensions::new(text.len() as f32 * config.font_size as f32 * 0.5, config.font_size as f32)
        });
        ctx
    }

    fn bounding_box(ctx: &LayoutContext, id: impl Into<ElementId>) -> BoundingBox {
        let data = ctx.get_element_data(&id.into());
        assert!(data.found);
        data.bounding_box
    }

    fn nested_clips(ui: &mut Ui<'_>, depth: u32) {
        if depth == 0 {
            ui.text("leaf text that wraps", |t| t.font_size(12));
            return;
        }
        for index in 0..3 {
            ui.element(
                Declaration::new()
                    .width(fixed!(300.0))
                    .height(fixed!(150.0))
                    .background_color(0x202020u32)
                    .layout(|l| l.direction(LayoutDirection::TopToBottom).gap(4))
                    .scroll(index % 2 == 0, true),
                |ui| nested_clips(ui, depth - 1),
            );
        }
    }

    #[test]
    fn scissors_stay_balanced_with_and_without_culling() {
        let mut ctx = context(400.0, 300.0);
        for culling in [true, false] {
            ctx.set_culling_enabled(culling);
            let mut ui = ctx.begin();
            nested_clips(&mut ui, 3);
            ui.element(
                Declaration::new()
                    .width(fixed!(50.0))
                    .height(fixed!(50.0))
                    .scroll(true, true)
                    .floating(|f| f.offset(1000.0, 1000.0).attach_root().clip_by_parent()),
                |ui| {
                    ui.element(Declaration::new().width(fixed!(10.0)).height(fixed!(10.0)), |_| {});
                },
            );
            assert!(scissors_balanced(ui.end()));
        }
    }

    #[test]
    fn identical_inputs_hash_identically() {
        let parent = ElementId::new("Sidebar").id;
        assert_eq!(
            ElementId::new_index_local("Row", 7, parent).id,
            ElementId::new_index_local("Row", 7, parent).id
        );
        let mut seen = std::collections::HashSet::new();
        for index in 0..1000 {
            seen.insert(ElementId::new_index("Row", index).id);
        }
        assert!(seen.len() >= 998);
        assert_ne!(ElementId::new("Row").id, ElementId::new("Rows").id);
        assert_ne!(ElementId::new_local("Row", parent).id, ElementId::new("Row").id);
    }

    #[test]
    fn fixed_children_in_a_grow_row_are_ordered() {
        let mut ctx = context(800.0, 600.0);
        let mut ui = ctx.begin();
        ui.element(Declaration::new().id("Row").width(grow!()).layout(|l| l.gap(8)), |ui| {
            for index in 0..5u32 {
                ui.element(
                    Declaration::new()
                        .id(("Cell", index))
                        .width(fixed!(60.0))
                        .height(fixed!(30.0)),
                    |_| {},
                );
            }
        });
        ui.end();

        assert_eq!(bounding_box(&ctx, "Row").width, 800.0);
        let cells: Vec<_> = (0..5u32).map(|index| bounding_box(&ctx, ("Cell", index))).collect();
        for pair in cells.windows(2) {
            assert!(pair[0].x + pair[0].width <= pair[1].x);
        }
        assert_eq!(cells[4].x, 4.0 * 68.0);
    }

    #[test]
    fn redeclaring_the_same_tree_is_idempotent() {
        fn frame(ctx: &mut LayoutContext) -> Vec<(u32, RenderCommandType, BoundingBox)> {
            let mut ui = ctx.begin();
            ui.element(
                Declaration::new()
                    .width(grow!())
                    .height(grow!())
                    .layout(|l| l.direction(LayoutDirection::TopToBottom).padding(8u16).gap(6))
                    .background_color(0x101010u32),
                |ui| {
                    ui.text("one two three four five six", |t| t.font_size(20).line_height(24));
                    ui.element(
                        Declaration::new()
                            .width(grow!(0.0, 200.0))
                            .height(fixed!(40.0))
                            .border(|b| b.color(0xFF0000u32).all(2)),
                        |_| {},
                    );
                },
            );
            ui.end()
                .iter()
                .map(|command| (command.id, command.command_type(), command.bounding_box))
                .collect()
        }

        let mut ctx = context(300.0, 200.0);
        let first = frame(&mut ctx);
        let second = frame(&mut ctx);
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn scroll_position_saturates_at_content_end() {
        let mut ctx = context(800.0, 600.0);
        let list = ElementId::new("List");
        for _ in 0..30 {
            let mut ui = ctx.begin();
            ui.element(
                Declaration::new()
                    .id(list.clone())
                    .width(fixed!(200.0))
                    .height(fixed!(200.0))
                    .scroll(false, true),
                |ui| {
                    ui.element(Declaration::new().width(grow!()).height(fixed!(1000.0)), |_| {});
                },
            );
            ui.end();
            ctx.set_pointer_state(Vector2::new(100.0, 100.0), false);
            ctx.update_scroll_containers(true, Vector2::new(0.0, -50.0), 1.0);
            let y = ctx.scroll_container_data(&list).scroll_position.y;
            assert!((-800.0..=0.0).contains(&y));
        }
        assert_eq!(ctx.scroll_container_data(&list).scroll_position.y, -800.0);
    }

    #[test]
    fn centered_child_in_grow_root() {
        let mut ctx = context(800.0, 600.0);
        let mut ui = ctx.begin();
        ui.element(
            Declaration::new()
                .width(grow!())
                .height(grow!())
                .layout(|l| l.align(AlignX::CenterX, AlignY::CenterY)),
            |ui| {
                ui.element(Declaration::new().id("Child").width(fixed!(100.0)).height(fixed!(50.0)), |_| {});
            },
        );
        ui.end();
        assert_eq!(bounding_box(&ctx, "Child"), BoundingBox::new(350.0, 275.0, 100.0, 50.0));
    }

    #[test]
    fn grow_children_share_a_fixed_parent() {
        let mut ctx = context(800.0, 600.0);
        let mut ui = ctx.begin();
        ui.element(Declaration::new().width(fixed!(400.0)).height(fixed!(20.0)), |ui| {
            ui.element(Declaration::new().id("Left").width(grow!()), |_| {});
            ui.element(Declaration::new().id("Right").width(grow!()), |_| {});
        });
        ui.end();
        assert_eq!(bounding_box(&ctx, "Left").width, 200.0);
        assert_eq!(bounding_box(&ctx, "Right"), BoundingBox::new(200.0, 0.0, 200.0, 0.0));
    }

    #[test]
    fn dropping_ui_ends_the_frame() {
        let mut ctx = context(100.0, 100.0);
        {
            let mut ui = ctx.begin();
            ui.element(Declaration::new().width(fixed!(10.0)).height(fixed!(10.0)).background_color(0xFFFFFFu32), |_| {});
            assert_eq!(ui.phase(), LayoutPhase::Declaring);
        }
        assert_eq!(ctx.phase(), LayoutPhase::Resolved);
        assert_eq!(ctx.render_commands().len(), 1);
    }

    #[test]
    fn payload_handles_reach_the_render_commands() {
        let mut ctx: LayoutContext<&'static str> = LayoutContext::new(Dimensions::new(100.0, 100.0));
        ctx.set_panic_on_usage_error(false);
        let mut ui = ctx.begin();
        ui.element(
            Declaration::new()
                .width(fixed!(32.0))
                .height(fixed!(32.0))
                .image(Handle::once("icon.png"))
                .user_data(Handle::shared("toolbar")),
            |_| {},
        );
        let commands = ui.end();
        let RenderCommandConfig::Image(image) = &commands[0].config else {
            panic!("expected an image command");
        };
        assert_eq!(image.data.take(), Some("icon.png"));
        assert_eq!(image.data.take(), None);
        assert_eq!(commands[0].user_data.as_ref().and_then(Handle::get), Some(&"toolbar"));
    }
}
