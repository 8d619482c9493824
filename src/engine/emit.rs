use super::LayoutContext;
use crate::align::AlignX;
use crate::elements::{FloatingAttachPoints, FloatingAttachToElement};
use crate::handle::Handle;
use crate::id::hash_number;
use crate::math::{BoundingBox, Dimensions, Vector2};
use crate::render_commands::{Border, Custom, Image, Rectangle, RenderCommand, RenderCommandConfig, Scissor, Text};
use crate::text::TextAlignment;

#[derive(Debug, Clone, Copy, Default)]
struct LayoutElementTreeNode {
    layout_element_index: usize,
    position: Vector2,
    next_child_offset: Vector2,
    bounding_box: BoundingBox,
    visited: bool,
    scissor_open: bool,
    /// Inside a clip container that lies outside the viewport. Positions are
    /// still resolved, commands are not emitted.
    culled: bool,
}

/// Top-left corner of a floating element of `size` attached to `parent`.
fn attach_position(parent: BoundingBox, size: Dimensions, attach_points: FloatingAttachPoints) -> Vector2 {
    let x = parent.x + attach_points.parent.x().offset(parent.width) - attach_points.element.x().offset(size.width);
    let y = parent.y + attach_points.parent.y().offset(parent.height)
        - attach_points.element.y().offset(size.height);
    Vector2::new(x, y)
}

impl<P> LayoutContext<P> {
    fn is_offscreen(&self, bounding_box: &BoundingBox) -> bool {
        let viewport = BoundingBox::new(0.0, 0.0, self.layout_dimensions.width, self.layout_dimensions.height);
        self.culling_enabled && !bounding_box.intersects(&viewport)
    }

    fn push_command(
        &mut self,
        bounding_box: BoundingBox,
        config: RenderCommandConfig<P>,
        id: u32,
        z_index: i16,
        user_data: Option<Handle<P>>,
    ) {
        self.render_commands.push(RenderCommand {
            bounding_box,
            config,
            id,
            z_index,
            user_data,
        });
    }

    /// Turns the resolved tree into render commands, filling in bounding boxes
    /// for element queries and scroll containers on the way.
    ///
    /// Roots are walked in declaration order so that a floating root always
    /// finds its parent already positioned. Their commands are then emitted
    /// in the z order of `layout_element_tree_roots`.
    pub(super) fn generate_render_commands(&mut self) {
        self.render_commands.clear();
        let mut dfs_buffer: Vec<LayoutElementTreeNode> = Vec::new();

        let root_count = self.layout_element_tree_roots.len();
        let mut walk_order: Vec<usize> = (0..root_count).collect();
        walk_order.sort_by_key(|&root_index| self.layout_element_tree_roots[root_index].layout_element_index);
        let mut root_commands: Vec<Vec<RenderCommand<P>>> = Vec::new();
        root_commands.resize_with(root_count, Vec::new);

        for root_index in walk_order {
            dfs_buffer.clear();
            let root = self.layout_element_tree_roots[root_index];
            let root_element = self.layout_elements[root.layout_element_index];
            let floating = self.declaration(root.layout_element_index).floating;
            let z_index = root.z_index;

            let mut root_position = Vector2::ZERO;
            if floating.attach_to != FloatingAttachToElement::None {
                let parent_box = self
                    .layout_element_map
                    .get(&root.parent_id)
                    .filter(|item| item.generation == self.generation)
                    .map(|item| item.bounding_box);
                if let Some(parent_box) = parent_box {
                    root_position =
                        attach_position(parent_box, root_element.dimensions, floating.attach_points) + floating.offset;
                }
            }

            let root_clip = match root.clip_element_id {
                0 => None,
                clip_id => self.layout_element_map.get(&clip_id).map(|item| item.bounding_box),
            };
            if let Some(clip_box) = root_clip {
                self.push_command(
                    clip_box,
                    RenderCommandConfig::ScissorStart(Scissor {
                        horizontal: true,
                        vertical: true,
                    }),
                    hash_number(root_element.children_length as u32 + 10, root_element.id).id,
                    z_index,
                    None,
                );
            }

            let padding = self.declaration(root.layout_element_index).layout.padding;
            dfs_buffer.push(LayoutElementTreeNode {
                layout_element_index: root.layout_element_index,
                position: root_position,
                next_child_offset: Vector2::new(padding.left as f32, padding.top as f32),
                ..Default::default()
            });

            while let Some(node) = dfs_buffer.last().copied() {
                let node_slot = dfs_buffer.len() - 1;
                let element_index = node.layout_element_index;
                let element = self.layout_elements[element_index];

                if node.visited {
                    if node.scissor_open {
                        self.push_command(
                            node.bounding_box,
                            RenderCommandConfig::ScissorEnd,
                            hash_number(element.children_length as u32 + 11, element.id).id,
                            z_index,
                            None,
                        );
                    }
                    dfs_buffer.pop();
                    continue;
                }
                dfs_buffer[node_slot].visited = true;

                let declaration = &self.declarations[element.declaration];
                let layout = declaration.layout;
                let clip = declaration.clip;
                let floating = declaration.floating;
                let border = declaration.border;
                let background_color = declaration.background_color;
                let corner_radius = declaration.corner_radius;
                let image = declaration.image.clone();
                let custom = declaration.custom.clone();
                let user_data = declaration.user_data.clone();

                let mut bounding_box = BoundingBox::new(
                    node.position.x,
                    node.position.y,
                    element.dimensions.width,
                    element.dimensions.height,
                );
                if floating.is_floating() {
                    bounding_box.x -= floating.expand.width;
                    bounding_box.width += floating.expand.width * 2.0;
                    bounding_box.y -= floating.expand.height;
                    bounding_box.height += floating.expand.height * 2.0;
                }
                dfs_buffer[node_slot].bounding_box = bounding_box;

                let generation = self.generation;
                if let Some(item) = self.layout_element_map.get_mut(&element.id) {
                    if item.generation == generation && item.layout_element_index == element_index {
                        item.bounding_box = bounding_box;
                    }
                }

                let offscreen = self.is_offscreen(&bounding_box);
                let emit = !node.culled && !offscreen;
                if let Some(text_index) = element.text_data {
                    if emit {
                        self.emit_text_lines(text_index, bounding_box, element.id, z_index);
                    }
                    continue;
                }

                let x_axis = layout.layout_direction.is_x_axis();
                let children = element.children_start..element.children_start + element.children_length;
                let gaps = element.children_length.saturating_sub(1) as f32 * layout.child_gap as f32;
                let mut content_size = Dimensions::default();
                for slot in children.clone() {
                    let child = self.layout_elements[self.layout_element_children[slot]].dimensions;
                    *content_size.along_mut(x_axis) += child.along(x_axis);
                    let cross = content_size.along_mut(!x_axis);
                    *cross = cross.max(child.along(!x_axis));
                }
                *content_size.along_mut(x_axis) += gaps;

                let extra_space =
                    (element.dimensions.along(x_axis) - layout.padding.along(x_axis) - content_size.along(x_axis)).max(0.0);
                let main_offset = if x_axis {
                    layout.child_alignment.x.offset(extra_space)
                } else {
                    layout.child_alignment.y.offset(extra_space)
                };
                if x_axis {
                    dfs_buffer[node_slot].next_child_offset.x += main_offset;
                } else {
                    dfs_buffer[node_slot].next_child_offset.y += main_offset;
                }

                let mut scroll_offset = Vector2::ZERO;
                if clip.is_enabled() {
                    scroll_offset = clip.child_offset;
                    let padded_content = Dimensions::new(
                        content_size.width + layout.padding.along(true),
                        content_size.height + layout.padding.along(false),
                    );
                    if let Some(scroll) = self
                        .scroll_container_datas
                        .iter_mut()
                        .find(|scroll| scroll.element_id == element.id)
                    {
                        scroll.bounding_box = bounding_box;
                        scroll.content_size = padded_content;
                    }
                }

                if emit {
                    let has_content = image.is_some() || custom.is_some();
                    if background_color.is_visible() && !has_content {
                        self.push_command(
                            bounding_box,
                            RenderCommandConfig::Rectangle(Rectangle {
                                color: background_color,
                                corner_radii: corner_radius,
                            }),
                            element.id,
                            z_index,
                            user_data.clone(),
                        );
                    }
                    if !border.width.is_zero() && border.color.is_visible() {
                        self.push_command(
                            bounding_box,
                            RenderCommandConfig::Border(Border {
                                color: border.color,
                                corner_radii: corner_radius,
                                width: border.width,
                            }),
                            hash_number(element.children_length as u32, element.id).id,
                            z_index,
                            user_data.clone(),
                        );
                        if border.width.between_children > 0 {
                            self.emit_separators(
                                element_index,
                                bounding_box,
                                main_offset,
                                scroll_offset,
                                z_index,
                                user_data.clone(),
                            );
                        }
                    }
                    if let Some(data) = image {
                        self.push_command(
                            bounding_box,
                            RenderCommandConfig::Image(Image {
                                background_color,
                                corner_radii: corner_radius,
                                data,
                            }),
                            element.id,
                            z_index,
                            user_data.clone(),
                        );
                    }
                    if let Some(data) = custom {
                        self.push_command(
                            bounding_box,
                            RenderCommandConfig::Custom(Custom {
                                background_color,
                                corner_radii: corner_radius,
                                data,
                            }),
                            element.id,
                            z_index,
                            user_data.clone(),
                        );
                    }
                }

                // nothing inside an offscreen clip region can be visible
                let children_culled = node.culled || (clip.is_enabled() && offscreen);
                if clip.is_enabled() && emit {
                    self.push_command(
                        bounding_box,
                        RenderCommandConfig::ScissorStart(Scissor {
                            horizontal: clip.horizontal,
                            vertical: clip.vertical,
                        }),
                        element.id,
                        z_index,
                        user_data,
                    );
                    dfs_buffer[node_slot].scissor_open = true;
                }

                // children are pushed in reverse so they are visited in order
                let mut next_child_offset = dfs_buffer[node_slot].next_child_offset;
                let first_child = dfs_buffer.len();
                for slot in children {
                    let child_index = self.layout_element_children[slot];
                    let child = self.layout_elements[child_index];
                    let child_padding = self.declaration(child_index).layout.padding;

                    let mut child_offset = next_child_offset;
                    if x_axis {
                        let whitespace = element.dimensions.height - layout.padding.along(false) - child.dimensions.height;
                        child_offset.y = layout.padding.top as f32 + layout.child_alignment.y.offset(whitespace);
                        next_child_offset.x += child.dimensions.width + layout.child_gap as f32;
                    } else {
                        let whitespace = element.dimensions.width - layout.padding.along(true) - child.dimensions.width;
                        child_offset.x = layout.padding.left as f32 + layout.child_alignment.x.offset(whitespace);
                        next_child_offset.y += child.dimensions.height + layout.child_gap as f32;
                    }

                    dfs_buffer.push(LayoutElementTreeNode {
                        layout_element_index: child_index,
                        position: node.position + child_offset + scroll_offset,
                        next_child_offset: Vector2::new(child_padding.left as f32, child_padding.top as f32),
                        culled: children_culled,
                        ..Default::default()
                    });
                }
                dfs_buffer[first_child..].reverse();
            }

            if let Some(clip_box) = root_clip {
                self.push_command(
                    clip_box,
                    RenderCommandConfig::ScissorEnd,
                    hash_number(root_element.children_length as u32 + 11, root_element.id).id,
                    z_index,
                    None,
                );
            }
            root_commands[root_index] = std::mem::take(&mut self.render_commands);
        }

        // roots are sorted by z-index, ties in declaration order
        for commands in root_commands {
            self.render_commands.extend(commands);
        }
    }

    /// Separator rectangles centred in the gaps between children.
    fn emit_separators(
        &mut self,
        element_index: usize,
        bounding_box: BoundingBox,
        main_offset: f32,
        scroll_offset: Vector2,
        z_index: i16,
        user_data: Option<Handle<P>>,
    ) {
        let element = self.layout_elements[element_index];
        let declaration = &self.declarations[element.declaration];
        let layout = declaration.layout;
        let border = declaration.border;
        let thickness = border.width.between_children as f32;
        let gap = layout.child_gap as f32;
        let x_axis = layout.layout_direction.is_x_axis();

        let mut offset = main_offset - gap / 2.0 - thickness / 2.0
            + if x_axis {
                layout.padding.left as f32
            } else {
                layout.padding.top as f32
            };
        let children = element.children_start..element.children_start + element.children_length;
        for (child_number, slot) in children.enumerate() {
            let child = self.layout_elements[self.layout_element_children[slot]].dimensions;
            if child_number > 0 {
                let separator = if x_axis {
                    BoundingBox::new(
                        bounding_box.x + offset + scroll_offset.x,
                        bounding_box.y + scroll_offset.y,
                        thickness,
                        element.dimensions.height,
                    )
                } else {
                    BoundingBox::new(
                        bounding_box.x + scroll_offset.x,
                        bounding_box.y + offset + scroll_offset.y,
                        element.dimensions.width,
                        thickness,
                    )
                };
                let id = hash_number((element.children_length + 1 + child_number) as u32, element.id).id;
                self.push_command(
                    separator,
                    RenderCommandConfig::Rectangle(Rectangle {
                        color: border.color,
                        corner_radii: Default::default(),
                    }),
                    id,
                    z_index,
                    user_data.clone(),
                );
            }
            offset += child.along(x_axis) + gap;
        }
    }

    /// One text command per wrapped line. Blank lines only advance the pen.
    fn emit_text_lines(&mut self, text_index: usize, bounding_box: BoundingBox, element_id: u32, z_index: i16) {
        let data = &self.text_element_data[text_index];
        let config = data.config;
        let natural_height = data.measured.unwrapped_dimensions.height;
        let line_height = if config.line_height > 0 {
            config.line_height as f32
        } else {
            natural_height
        };
        let text = self.arena.str(data.text);
        let lines = &self.wrapped_text_lines[data.wrapped_lines_start..data.wrapped_lines_start + data.wrapped_lines_length];

        let mut y = (line_height - natural_height) / 2.0;
        for (line_index, line) in lines.iter().enumerate() {
            if line.length == 0 {
                y += line_height;
                continue;
            }
            let free = bounding_box.width - line.dimensions.width;
            let x = match config.alignment {
                TextAlignment::Left => AlignX::Left,
                TextAlignment::Center => AlignX::CenterX,
                TextAlignment::Right => AlignX::Right,
            }
            .offset(free);
            let line_text = text.get(line.start..line.start + line.length).unwrap_or_default();
            self.render_commands.push(RenderCommand {
                bounding_box: BoundingBox::new(
                    bounding_box.x + x,
                    bounding_box.y + y,
                    line.dimensions.width,
                    line.dimensions.height,
                ),
                config: RenderCommandConfig::Text(Text {
                    text: line_text.to_string(),
                    color: config.color,
                    font_id: config.font_id,
                    font_size: config.font_size,
                    letter_spacing: config.letter_spacing,
                    line_height: config.line_height,
                }),
                id: hash_number(line_index as u32, element_id).id,
                z_index,
                user_data: None,
            });
            y += line_height;
        }
    }
}
