//! Tidy tree layout: 2-D coordinates for the diagram's vertices.
//!
//! Implements the linear-time walker from "Improving Walker's Algorithm to
//! Run in Linear Time" (Buchheim, Junger, Leipert, 2002), the same family of
//! algorithms as the classic Reingold-Tilford layout. Two passes over the
//! tree: a bottom-up walk assigns preliminary x-coordinates by merging
//! subtree contours (threads keep contour traversal amortized constant), a
//! top-down walk applies the accumulated modifiers.
//!
//! Coordinate convention is root-down: the root sits at y = 0 and deeper
//! nodes at larger y. The figure stage reflects the vertical axis, so any
//! replacement of this module must keep (or re-audit) that convention.

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::builder::VertexId;
use crate::errors::{RenderError, RenderResult};

/// Layout coordinate for one vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Spacing parameters for the layout.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Minimum horizontal gap between adjacent siblings
    pub sibling_separation: f64,
    /// Minimum horizontal gap between non-sibling subtree contours
    pub subtree_separation: f64,
    /// Vertical distance between consecutive depth levels
    pub level_separation: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            sibling_separation: 1.0,
            subtree_separation: 2.0,
            level_separation: 1.0,
        }
    }
}

/// Per-vertex bookkeeping for the two walks.
struct LayoutNode {
    vertex: VertexId,
    depth: u32,
    parent: Option<usize>,
    children: Vec<usize>,
    prelim: f64,
    modifier: f64,
    thread_left: Option<usize>,
    thread_right: Option<usize>,
    ancestor: usize,
    shift: f64,
    change: f64,
    number: usize,
}

/// Computes root-down coordinates for a diagram of `vertex_count` vertices
/// connected by parent->child `edges`.
///
/// The returned vector is indexed by vertex id. The edge list must describe a
/// single tree rooted at `root`: every edge endpoint inside `0..vertex_count`,
/// no vertex with two parents, no edge into the root, every vertex reachable.
/// Violations are fatal and abort the layout.
#[instrument(level = "debug", skip(edges, config))]
pub fn tidy_layout(
    vertex_count: usize,
    edges: &[(VertexId, VertexId)],
    root: VertexId,
    config: &LayoutConfig,
) -> RenderResult<Vec<Point>> {
    if vertex_count == 0 {
        return Err(RenderError::EmptyDiagram);
    }
    if root as usize >= vertex_count {
        return Err(RenderError::UnknownRoot(root));
    }

    // Adjacency in edge insertion order, with single-parent enforcement.
    let mut children: Vec<Vec<VertexId>> = vec![Vec::new(); vertex_count];
    let mut has_parent = vec![false; vertex_count];
    for &(parent, child) in edges {
        if parent as usize >= vertex_count || child as usize >= vertex_count {
            return Err(RenderError::DanglingEdge { parent, child });
        }
        if child == root {
            return Err(RenderError::CycleDetected(child));
        }
        if has_parent[child as usize] {
            return Err(RenderError::MultipleParents(child));
        }
        has_parent[child as usize] = true;
        children[parent as usize].push(child);
    }

    // With unique parents and no edge into the root, the subgraph reachable
    // from the root is a tree; the recursion terminates without a visited set.
    let mut nodes = Vec::with_capacity(vertex_count);
    build_subtree(root, None, 0, &children, &mut nodes);

    if nodes.len() != vertex_count {
        let laid_out: Vec<bool> = {
            let mut seen = vec![false; vertex_count];
            for node in &nodes {
                seen[node.vertex as usize] = true;
            }
            seen
        };
        let missing = laid_out.iter().position(|seen| !seen).unwrap_or(0);
        return Err(RenderError::Disconnected(missing as VertexId));
    }

    let mut walker = Walker { nodes, config };
    walker.first_walk(0);

    let mut final_x = vec![0.0; walker.nodes.len()];
    walker.second_walk(0, 0.0, &mut final_x);

    // Shift the tree so its leftmost vertex sits at x = 0.
    let (min_x, _) = final_x
        .iter()
        .copied()
        .minmax()
        .into_option()
        .unwrap_or((0.0, 0.0));

    let mut positions = vec![Point { x: 0.0, y: 0.0 }; vertex_count];
    for (slot, node) in walker.nodes.iter().enumerate() {
        positions[node.vertex as usize] = Point {
            x: final_x[slot] - min_x,
            y: f64::from(node.depth) * config.level_separation,
        };
    }

    debug!(vertices = vertex_count, "layout computed");
    Ok(positions)
}

fn build_subtree(
    vertex: VertexId,
    parent: Option<usize>,
    depth: u32,
    children: &[Vec<VertexId>],
    nodes: &mut Vec<LayoutNode>,
) {
    let slot = nodes.len();
    nodes.push(LayoutNode {
        vertex,
        depth,
        parent,
        children: Vec::new(),
        prelim: 0.0,
        modifier: 0.0,
        thread_left: None,
        thread_right: None,
        ancestor: slot,
        shift: 0.0,
        change: 0.0,
        number: 0,
    });

    let mut child_slots = Vec::with_capacity(children[vertex as usize].len());
    for (number, &child) in children[vertex as usize].iter().enumerate() {
        let child_slot = nodes.len();
        build_subtree(child, Some(slot), depth + 1, children, nodes);
        nodes[child_slot].number = number;
        child_slots.push(child_slot);
    }
    nodes[slot].children = child_slots;
}

struct Walker<'c> {
    nodes: Vec<LayoutNode>,
    config: &'c LayoutConfig,
}

impl Walker<'_> {
    /// Bottom-up pass: preliminary x-coordinates, contour merging.
    fn first_walk(&mut self, v: usize) {
        let children = self.nodes[v].children.clone();
        if children.is_empty() {
            self.nodes[v].prelim = 0.0;
            return;
        }

        for &child in &children {
            self.first_walk(child);
        }

        let mut default_ancestor = children[0];
        for (i, &child) in children.iter().enumerate() {
            if i > 0 {
                let left_sibling = children[i - 1];
                let shift = self.min_separation_shift(left_sibling, child);
                self.nodes[child].prelim += shift;
                self.nodes[child].modifier += shift;

                default_ancestor = self.apportion(child, left_sibling, default_ancestor);
            }
        }

        self.execute_shifts(v);

        // Center the parent over its first and last child.
        let first = self.nodes[children[0]].prelim;
        let last = self.nodes[children[children.len() - 1]].prelim;
        self.nodes[v].prelim = (first + last) / 2.0;
    }

    /// Shift needed so the subtree at `right` clears the subtree at `left`.
    ///
    /// Walks the right contour of the left subtree against the left contour
    /// of the right subtree, level by level, tracking the worst overlap.
    fn min_separation_shift(&self, left: usize, right: usize) -> f64 {
        let mut left_contour = left;
        let mut right_contour = right;
        let mut left_mod = 0.0;
        let mut right_mod = 0.0;
        let mut max_shift: f64 = 0.0;

        loop {
            let left_x = self.nodes[left_contour].prelim + left_mod;
            let right_x = self.nodes[right_contour].prelim + right_mod;

            let wanted = if self.are_siblings(left_contour, right_contour) {
                self.config.sibling_separation
            } else {
                self.config.subtree_separation
            };

            max_shift = max_shift.max(left_x + wanted - right_x);

            match (self.next_right(left_contour), self.next_left(right_contour)) {
                (Some(next_l), Some(next_r)) => {
                    left_mod += self.nodes[left_contour].modifier;
                    right_mod += self.nodes[right_contour].modifier;
                    left_contour = next_l;
                    right_contour = next_r;
                }
                _ => break,
            }
        }

        max_shift
    }

    fn are_siblings(&self, a: usize, b: usize) -> bool {
        self.nodes[a].parent.is_some() && self.nodes[a].parent == self.nodes[b].parent
    }

    /// Next node on the right contour: last child, or the right thread.
    fn next_right(&self, v: usize) -> Option<usize> {
        self.nodes[v]
            .children
            .last()
            .copied()
            .or(self.nodes[v].thread_right)
    }

    /// Next node on the left contour: first child, or the left thread.
    fn next_left(&self, v: usize) -> Option<usize> {
        self.nodes[v]
            .children
            .first()
            .copied()
            .or(self.nodes[v].thread_left)
    }

    /// Resolves overlap between `v`'s subtree and the subtrees left of it,
    /// distributing the shift across the in-between siblings.
    fn apportion(&mut self, v: usize, left_sibling: usize, mut default_ancestor: usize) -> usize {
        let mut inner_left_contour = left_sibling;
        let mut outer_left_contour = left_sibling;
        let mut inner_right_contour = v;
        let mut outer_right_contour = match self.nodes[v].parent {
            Some(parent) => self.nodes[parent].children.first().copied().unwrap_or(v),
            None => v,
        };

        let mut sum_inner_left = self.nodes[inner_left_contour].modifier;
        let mut sum_outer_left = self.nodes[outer_left_contour].modifier;
        let mut sum_inner_right = self.nodes[inner_right_contour].modifier;
        let mut sum_outer_right = self.nodes[outer_right_contour].modifier;

        loop {
            match (
                self.next_right(inner_left_contour),
                self.next_left(inner_right_contour),
            ) {
                (Some(next_left_side), Some(next_right_side)) => {
                    inner_left_contour = next_left_side;
                    inner_right_contour = next_right_side;
                }
                _ => break,
            }

            if let Some(next) = self.next_left(outer_right_contour) {
                outer_right_contour = next;
            }
            if let Some(next) = self.next_right(outer_left_contour) {
                outer_left_contour = next;
            }

            self.nodes[outer_left_contour].ancestor = v;

            let shift = (self.nodes[inner_left_contour].prelim + sum_inner_left)
                - (self.nodes[inner_right_contour].prelim + sum_inner_right)
                + self.config.subtree_separation;

            if shift > 0.0 {
                let ancestor_v = self.nodes[v].ancestor;
                let moved = if self.is_placed_ancestor(ancestor_v, v) {
                    ancestor_v
                } else {
                    default_ancestor
                };

                self.move_subtree(moved, v, shift);

                sum_inner_right += shift;
                sum_outer_right += shift;
            }

            sum_inner_left += self.nodes[inner_left_contour].modifier;
            sum_inner_right += self.nodes[inner_right_contour].modifier;
            sum_outer_left += self.nodes[outer_left_contour].modifier;
            sum_outer_right += self.nodes[outer_right_contour].modifier;
        }

        if self.next_right(inner_left_contour).is_some()
            && self.next_right(outer_left_contour).is_none()
        {
            self.nodes[outer_left_contour].thread_right = self.next_right(inner_left_contour);
            self.nodes[outer_left_contour].modifier += sum_inner_left - sum_outer_left;
        }

        if self.next_left(inner_right_contour).is_some()
            && self.next_left(outer_right_contour).is_none()
        {
            self.nodes[outer_right_contour].thread_left = self.next_left(inner_right_contour);
            self.nodes[outer_right_contour].modifier += sum_inner_right - sum_outer_right;
            default_ancestor = v;
        }

        default_ancestor
    }

    /// Whether `ancestor` can serve as the moved-subtree anchor for `v`:
    /// it must not sit below `v` in the tree.
    fn is_placed_ancestor(&self, ancestor: usize, v: usize) -> bool {
        self.nodes[ancestor].depth <= self.nodes[v].depth
    }

    /// Shifts the subtree at `right_anchor` and records the spacing change to
    /// spread across the siblings between the two anchors.
    fn move_subtree(&mut self, left_anchor: usize, right_anchor: usize, shift: f64) {
        let between = (self.nodes[right_anchor].number as f64
            - self.nodes[left_anchor].number as f64)
            .max(1.0);
        let per_subtree = shift / between;

        self.nodes[right_anchor].change -= per_subtree;
        self.nodes[right_anchor].shift += shift;
        self.nodes[left_anchor].change += per_subtree;
        self.nodes[right_anchor].prelim += shift;
        self.nodes[right_anchor].modifier += shift;
    }

    /// Applies the accumulated shift/change pairs to `v`'s children,
    /// right to left.
    fn execute_shifts(&mut self, v: usize) {
        let children = self.nodes[v].children.clone();
        let mut shift = 0.0;
        let mut change = 0.0;

        for &child in children.iter().rev() {
            self.nodes[child].prelim += shift;
            self.nodes[child].modifier += shift;
            change += self.nodes[child].change;
            shift += self.nodes[child].shift + change;
        }
    }

    /// Top-down pass: fold the modifier sums into final x-coordinates.
    fn second_walk(&self, v: usize, modifier_sum: f64, final_x: &mut [f64]) {
        final_x[v] = self.nodes[v].prelim + modifier_sum;

        for &child in &self.nodes[v].children {
            self.second_walk(child, modifier_sum + self.nodes[v].modifier, final_x);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn layout(vertex_count: usize, edges: &[(VertexId, VertexId)]) -> Vec<Point> {
        tidy_layout(vertex_count, edges, 0, &LayoutConfig::default()).unwrap()
    }

    #[test]
    fn test_single_vertex_at_origin() {
        let positions = layout(1, &[]);
        assert_eq!(positions.len(), 1);
        assert!(positions[0].x.abs() < EPS);
        assert!(positions[0].y.abs() < EPS);
    }

    #[test]
    fn test_root_centered_over_two_children() {
        let positions = layout(3, &[(0, 1), (0, 2)]);

        let midpoint = (positions[1].x + positions[2].x) / 2.0;
        assert!(
            (positions[0].x - midpoint).abs() < EPS,
            "root x {} should be midpoint {midpoint}",
            positions[0].x
        );
    }

    #[test]
    fn test_y_is_depth_times_level_separation() {
        let config = LayoutConfig {
            level_separation: 50.0,
            ..LayoutConfig::default()
        };
        let positions = tidy_layout(5, &[(0, 1), (0, 2), (1, 3), (1, 4)], 0, &config).unwrap();

        assert!(positions[0].y.abs() < EPS);
        assert!((positions[1].y - 50.0).abs() < EPS);
        assert!((positions[2].y - 50.0).abs() < EPS);
        assert!((positions[3].y - 100.0).abs() < EPS);
        assert!((positions[4].y - 100.0).abs() < EPS);
    }

    #[test]
    fn test_siblings_keep_minimum_separation() {
        let config = LayoutConfig::default();
        let positions = tidy_layout(3, &[(0, 1), (0, 2)], 0, &config).unwrap();

        let gap = (positions[2].x - positions[1].x).abs();
        assert!(
            gap + EPS >= config.sibling_separation,
            "sibling gap {gap} below {}",
            config.sibling_separation
        );
    }

    #[test]
    fn test_asymmetric_subtrees_do_not_overlap() {
        // Left subtree two levels deep, right subtree a single leaf.
        let positions = layout(5, &[(0, 1), (0, 2), (1, 3), (3, 4)]);

        let left_max = positions[1].x.max(positions[3].x).max(positions[4].x);
        let right = positions[2].x;
        assert!(
            left_max < right,
            "left subtree (max x {left_max}) should stay left of {right}"
        );
    }

    #[test]
    fn test_leftmost_vertex_at_zero() {
        let positions = layout(7, &[(0, 1), (0, 2), (1, 3), (1, 4), (2, 5), (2, 6)]);
        let min_x = positions.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        assert!(min_x.abs() < EPS);
    }

    #[test]
    fn test_empty_diagram_rejected() {
        let result = tidy_layout(0, &[], 0, &LayoutConfig::default());
        assert!(matches!(result, Err(RenderError::EmptyDiagram)));
    }

    #[test]
    fn test_unknown_root_rejected() {
        let result = tidy_layout(2, &[(0, 1)], 5, &LayoutConfig::default());
        assert!(matches!(result, Err(RenderError::UnknownRoot(5))));
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let result = tidy_layout(2, &[(0, 9)], 0, &LayoutConfig::default());
        assert!(matches!(
            result,
            Err(RenderError::DanglingEdge { parent: 0, child: 9 })
        ));
    }

    #[test]
    fn test_multiple_parents_rejected() {
        let result = tidy_layout(3, &[(0, 2), (1, 2)], 0, &LayoutConfig::default());
        assert!(matches!(result, Err(RenderError::MultipleParents(2))));
    }

    #[test]
    fn test_edge_into_root_rejected() {
        let result = tidy_layout(2, &[(0, 1), (1, 0)], 0, &LayoutConfig::default());
        assert!(matches!(result, Err(RenderError::CycleDetected(0))));
    }

    #[test]
    fn test_unreachable_vertex_rejected() {
        let result = tidy_layout(3, &[(0, 1)], 0, &LayoutConfig::default());
        assert!(matches!(result, Err(RenderError::Disconnected(2))));
    }
}
