use super::{float_equal, LayoutContext, EPSILON, MAXFLOAT};
use crate::errors::ErrorType;
use crate::layout::SizingType;
use crate::text::WrapMode;

impl<P> LayoutContext<P> {
    /// Resolves the tree declared this frame into sizes, then emits render
    /// commands.
    ///
    /// Widths are resolved first so that text can be wrapped; heights depend
    /// on the wrapped line count.
    pub(super) fn calculate_final_layout(&mut self) {
        self.size_containers_along_axis(true);
        self.wrap_text();

        // width is known, derive height and pin it for the height pass
        for i in 0..self.aspect_ratio_element_indexes.len() {
            let index = self.aspect_ratio_element_indexes[i];
            let aspect_ratio = self.declaration(index).aspect_ratio;
            let height = self.layout_elements[index].dimensions.width / aspect_ratio;
            self.layout_elements[index].dimensions.height = height;
            let slot = self.layout_elements[index].declaration;
            self.declarations[slot].layout.sizing.height.min_max.max = height;
        }

        self.propagate_sizes_up_tree();
        self.size_containers_along_axis(false);

        for i in 0..self.aspect_ratio_element_indexes.len() {
            let index = self.aspect_ratio_element_indexes[i];
            let aspect_ratio = self.declaration(index).aspect_ratio;
            let dimensions = &mut self.layout_elements[index].dimensions;
            dimensions.width = aspect_ratio * dimensions.height;
        }

        // stable, so equal z-indexes keep declaration order
        self.layout_element_tree_roots.sort_by_key(|root| root.z_index);
        self.generate_render_commands();
    }

    /// Re-runs the fit height computation now that wrapped text heights are
    /// known.
    fn propagate_sizes_up_tree(&mut self) {
        let mut dfs_buffer: Vec<(usize, bool)> = Vec::new();
        for root_index in 0..self.layout_element_tree_roots.len() {
            let root = self.layout_element_tree_roots[root_index];
            dfs_buffer.push((root.layout_element_index, false));
            while let Some(&(index, visited)) = dfs_buffer.last() {
                let element = self.layout_elements[index];
                if !visited {
                    if let Some(last) = dfs_buffer.last_mut() {
                        last.1 = true;
                    }
                    if element.text_data.is_some() || element.children_length == 0 {
                        dfs_buffer.pop();
                        continue;
                    }
                    let children = element.children_start..element.children_start + element.children_length;
                    for slot in children {
                        dfs_buffer.push((self.layout_element_children[slot], false));
                    }
                    continue;
                }
                dfs_buffer.pop();

                let declaration = &self.declarations[element.declaration];
                let layout = declaration.layout;
                let min_max = declaration.layout.sizing.height.min_max;
                let padding = layout.padding.along(false);
                let children = &self.layout_element_children
                    [element.children_start..element.children_start + element.children_length];
                let height = if layout.layout_direction.is_x_axis() {
                    children
                        .iter()
                        .map(|&child| self.layout_elements[child].dimensions.height + padding)
                        .fold(element.dimensions.height, f32::max)
                } else {
                    let content: f32 = children
                        .iter()
                        .map(|&child| self.layout_elements[child].dimensions.height)
                        .sum();
                    let gaps = children.len().saturating_sub(1) as f32 * layout.child_gap as f32;
                    content + gaps + padding
                };
                self.layout_elements[index].dimensions.height = height.max(min_max.min).min(min_max.max);
            }
        }
    }

    /// Distributes space along one axis, top down from every tree root.
    fn size_containers_along_axis(&mut self, x_axis: bool) {
        let mut bfs_buffer: Vec<usize> = Vec::new();
        let mut resizable: Vec<usize> = Vec::new();

        for root_index in 0..self.layout_element_tree_roots.len() {
            bfs_buffer.clear();
            let root = self.layout_element_tree_roots[root_index];
            let root_index = root.layout_element_index;
            bfs_buffer.push(root_index);

            // floating roots size against the element they are attached to
            let root_declaration = self.declaration(root_index);
            let root_sizing = *root_declaration.layout.sizing.along(x_axis);
            if root_declaration.floating.is_floating() {
                if let Some(parent) = self.current_element_index(root.parent_id) {
                    let parent_size = self.layout_elements[parent].dimensions.along(x_axis);
                    let size = self.layout_elements[root_index].dimensions.along_mut(x_axis);
                    match root_sizing.type_ {
                        SizingType::Grow => *size = parent_size,
                        SizingType::Percent => *size = parent_size * root_sizing.percent,
                        _ => {}
                    }
                }
            }
            if root_sizing.type_ != SizingType::Percent {
                let size = self.layout_elements[root_index].dimensions.along_mut(x_axis);
                *size = size.max(root_sizing.min_max.min).min(root_sizing.min_max.max);
            }

            let mut i = 0;
            while i < bfs_buffer.len() {
                let parent_index = bfs_buffer[i];
                i += 1;
                let parent = self.layout_elements[parent_index];
                let parent_declaration = &self.declarations[parent.declaration];
                let parent_layout = parent_declaration.layout;
                let parent_clips = if x_axis {
                    parent_declaration.clip.horizontal
                } else {
                    parent_declaration.clip.vertical
                };
                let parent_size = parent.dimensions.along(x_axis);
                let parent_padding = parent_layout.padding.along(x_axis);
                let sizing_along_axis = parent_layout.layout_direction.is_x_axis() == x_axis;
                let child_gap = parent_layout.child_gap as f32;
                let children = parent.children_start..parent.children_start + parent.children_length;

                let mut inner_content_size = 0.0f32;
                let mut total_padding_and_child_gaps = parent_padding;
                let mut grow_container_count = 0;
                resizable.clear();

                for (offset, slot) in children.clone().enumerate() {
                    let child_index = self.layout_element_children[slot];
                    let child = &self.layout_elements[child_index];
                    let child_sizing = *self.declarations[child.declaration].layout.sizing.along(x_axis);
                    let child_size = child.dimensions.along(x_axis);
                    let wrap_mode = child
                        .text_data
                        .map(|text| self.text_element_data[text].config.wrap_mode);

                    if wrap_mode.is_none() && child.children_length > 0 {
                        bfs_buffer.push(child_index);
                    }
                    if child_sizing.type_ != SizingType::Percent
                        && child_sizing.type_ != SizingType::Fixed
                        && wrap_mode.map_or(true, |mode| mode == WrapMode::Words)
                    {
                        resizable.push(child_index);
                    }

                    if sizing_along_axis {
                        if child_sizing.type_ != SizingType::Percent {
                            inner_content_size += child_size;
                        }
                        if child_sizing.type_ == SizingType::Grow {
                            grow_container_count += 1;
                        }
                        if offset > 0 {
                            inner_content_size += child_gap;
                            total_padding_and_child_gaps += child_gap;
                        }
                    } else {
                        inner_content_size = inner_content_size.max(child_size);
                    }
                }

                for slot in children {
                    let child_index = self.layout_element_children[slot];
                    let child_sizing = *self.declaration(child_index).layout.sizing.along(x_axis);
                    if child_sizing.type_ == SizingType::Percent {
                        let size = (parent_size - total_padding_and_child_gaps) * child_sizing.percent;
                        *self.layout_elements[child_index].dimensions.along_mut(x_axis) = size;
                        if sizing_along_axis {
                            inner_content_size += size;
                        }
                        self.update_aspect_ratio_box(child_index);
                    }
                }

                if sizing_along_axis {
                    let size_to_distribute = parent_size - parent_padding - inner_content_size;
                    if size_to_distribute < 0.0 {
                        // clipped content may overflow, it scrolls instead of shrinking
                        if parent_clips {
                            continue;
                        }
                        self.compress_children(&mut resizable, size_to_distribute, x_axis);
                    } else if size_to_distribute > 0.0 && grow_container_count > 0 {
                        resizable.retain(|&child| {
                            self.declaration(child).layout.sizing.along(x_axis).type_ == SizingType::Grow
                        });
                        self.expand_children(&mut resizable, size_to_distribute, x_axis);
                    }
                } else {
                    for &child_index in &resizable {
                        let child_sizing = *self.declaration(child_index).layout.sizing.along(x_axis);
                        let min_size = self.layout_elements[child_index].min_dimensions.along(x_axis);
                        let mut max_size = parent_size - parent_padding;
                        if parent_clips {
                            max_size = max_size.max(inner_content_size);
                        }
                        let size = self.layout_elements[child_index].dimensions.along_mut(x_axis);
                        if child_sizing.type_ == SizingType::Grow {
                            *size = max_size.min(child_sizing.min_max.max);
                        }
                        *size = min_size.max(size.min(max_size));
                    }
                }
            }
        }
    }

    /// Takes `size_to_distribute` (negative) away from the largest children
    /// first, never below their minimum size. Each step either levels the
    /// largest children down to the next size or hands out the rest evenly.
    fn compress_children(&mut self, resizable: &mut Vec<usize>, mut size_to_distribute: f32, x_axis: bool) {
        let iteration_cap = resizable.len() * 2 + 2;
        let mut iterations = 0;
        while size_to_distribute < -EPSILON && !resizable.is_empty() {
            if iterations == iteration_cap {
                self.report_not_converged("shrink", size_to_distribute, x_axis);
                return;
            }
            iterations += 1;

            let sizes = resizable.iter().map(|&child| self.layout_elements[child].dimensions.along(x_axis));
            let largest = sizes.clone().fold(0.0f32, f32::max);
            let mut largest_count = 0;
            let mut second_largest: Option<f32> = None;
            for size in sizes {
                if float_equal(size, largest) {
                    largest_count += 1;
                } else {
                    second_largest = Some(second_largest.map_or(size, |second| second.max(size)));
                }
            }
            let mut width_to_add = size_to_distribute / largest_count as f32;
            if let Some(second_largest) = second_largest {
                width_to_add = width_to_add.max(second_largest - largest);
            }

            let mut j = 0;
            while j < resizable.len() {
                let child = resizable[j];
                let element = &mut self.layout_elements[child];
                let previous = element.dimensions.along(x_axis);
                let min_size = element.min_dimensions.along(x_axis);
                if float_equal(previous, largest) {
                    let size = element.dimensions.along_mut(x_axis);
                    *size += width_to_add;
                    if *size <= min_size {
                        *size = min_size;
                        size_to_distribute -= min_size - previous;
                        resizable.swap_remove(j);
                        continue;
                    }
                    size_to_distribute -= *size - previous;
                }
                j += 1;
            }
            tracing::trace!(x_axis, remaining = size_to_distribute, "shrink step");
        }
    }

    /// Hands `size_to_distribute` to the smallest grow children first, never
    /// past their maximum size.
    fn expand_children(&mut self, resizable: &mut Vec<usize>, mut size_to_distribute: f32, x_axis: bool) {
        let iteration_cap = resizable.len() * 2 + 2;
        let mut iterations = 0;
        while size_to_distribute > EPSILON && !resizable.is_empty() {
            if iterations == iteration_cap {
                self.report_not_converged("grow", size_to_distribute, x_axis);
                return;
            }
            iterations += 1;

            let sizes = resizable.iter().map(|&child| self.layout_elements[child].dimensions.along(x_axis));
            let smallest = sizes.clone().fold(MAXFLOAT, f32::min);
            let mut smallest_count = 0;
            let mut second_smallest: Option<f32> = None;
            for size in sizes {
                if float_equal(size, smallest) {
                    smallest_count += 1;
                } else {
                    second_smallest = Some(second_smallest.map_or(size, |second| second.min(size)));
                }
            }
            let mut width_to_add = size_to_distribute / smallest_count as f32;
            if let Some(second_smallest) = second_smallest {
                width_to_add = width_to_add.min(second_smallest - smallest);
            }

            let mut j = 0;
            while j < resizable.len() {
                let child = resizable[j];
                let max_size = self.declaration(child).layout.sizing.along(x_axis).min_max.max;
                let size = self.layout_elements[child].dimensions.along_mut(x_axis);
                let previous = *size;
                if float_equal(previous, smallest) {
                    *size += width_to_add;
                    if *size >= max_size {
                        *size = max_size;
                        size_to_distribute -= max_size - previous;
                        resizable.swap_remove(j);
                        continue;
                    }
                    size_to_distribute -= *size - previous;
                }
                j += 1;
            }
            tracing::trace!(x_axis, remaining = size_to_distribute, "grow step");
        }
    }

    fn report_not_converged(&mut self, kind: &str, remaining: f32, x_axis: bool) {
        let axis = if x_axis { "width" } else { "height" };
        self.report(
            ErrorType::LayoutNotConverged,
            &format!("{kind} distribution along {axis} stopped with {remaining} left to distribute"),
        );
    }
}
