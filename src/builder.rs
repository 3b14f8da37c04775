//! Depth-ordered traversal turning a [`DecisionTree`] into a flat diagram of
//! vertices, labels, and parent->child edges.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tracing::{debug, instrument};

use crate::errors::{RenderError, RenderResult};
use crate::model::DecisionTree;

/// Vertex identifier, allocated from 0 per render invocation.
pub type VertexId = u32;

/// Traversal product consumed by the layout and figure stages.
///
/// `vertices` and `labels` run parallel, in worklist pop order; `edges` are
/// recorded in push order. Identifiers are dense: every id in `0..vertex_count`
/// appears exactly once in `vertices`.
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    pub vertices: Vec<VertexId>,
    pub labels: Vec<String>,
    pub edges: Vec<(VertexId, VertexId)>,
}

impl Diagram {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Consistency check, run before any layout work.
    ///
    /// Every vertex must carry exactly one label, vertex ids must be dense
    /// (the later stages index position tables by id), and every edge must
    /// stay inside the vertex set. Violations are fatal; no diagram is
    /// produced.
    #[instrument(level = "debug", skip(self))]
    pub fn validate(&self) -> RenderResult<()> {
        if self.vertices.is_empty() {
            return Err(RenderError::EmptyDiagram);
        }
        if self.labels.len() != self.vertices.len() {
            return Err(RenderError::LabelCountMismatch {
                labels: self.labels.len(),
                vertices: self.vertices.len(),
            });
        }

        let count = self.vertices.len();
        let mut seen = vec![false; count];
        for &id in &self.vertices {
            if id as usize >= count {
                return Err(RenderError::VertexIdOutOfRange { id, count });
            }
            if seen[id as usize] {
                return Err(RenderError::DuplicateVertex(id));
            }
            seen[id as usize] = true;
        }

        for &(parent, child) in &self.edges {
            if parent as usize >= count || child as usize >= count {
                return Err(RenderError::DanglingEdge { parent, child });
            }
        }
        Ok(())
    }
}

/// Worklist entry: a borrowed tree node scheduled at a depth level.
///
/// Ordering is `(level, id)` ascending. The id component ties equal levels
/// back to insertion order, so same-level siblings keep their push order
/// while differently-deep subtrees may interleave.
struct WorkItem<'a> {
    level: u32,
    id: VertexId,
    node: &'a DecisionTree,
}

impl Ord for WorkItem<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.level, self.id).cmp(&(other.level, other.id))
    }
}

impl PartialOrd for WorkItem<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for WorkItem<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for WorkItem<'_> {}

/// Builds a [`Diagram`] from a decision tree root.
///
/// The builder is consumed per invocation, so the identifier counter and all
/// accumulators start fresh on every call.
pub struct DiagramBuilder {
    vertices: Vec<VertexId>,
    labels: Vec<String>,
    edges: Vec<(VertexId, VertexId)>,
    next_id: VertexId,
}

impl Default for DiagramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagramBuilder {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            labels: Vec::new(),
            edges: Vec::new(),
            next_id: 0,
        }
    }

    fn alloc_id(&mut self) -> VertexId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Traverses the tree with a min-ordered worklist, starting at the root
    /// with level 1 and id 0.
    ///
    /// Popping a split emits its vertex and label, then pushes each present
    /// child (left before right) at level + 1 and records the parent->child
    /// edge; popping a leaf emits its vertex and label only. Identifiers are
    /// allocated at push time, so vertex order is pop order while edge order
    /// is push order.
    #[instrument(level = "debug", skip(self, root))]
    pub fn build(mut self, root: &DecisionTree) -> RenderResult<Diagram> {
        let mut worklist = BinaryHeap::new();
        let root_id = self.alloc_id();
        worklist.push(Reverse(WorkItem {
            level: 1,
            id: root_id,
            node: root,
        }));

        while let Some(Reverse(item)) = worklist.pop() {
            self.vertices.push(item.id);
            self.labels.push(item.node.label());

            if let DecisionTree::Split(split) = item.node {
                for child in split.children() {
                    let child_id = self.alloc_id();
                    worklist.push(Reverse(WorkItem {
                        level: item.level + 1,
                        id: child_id,
                        node: child,
                    }));
                    self.edges.push((item.id, child_id));
                }
            }
        }

        debug!(
            vertices = self.vertices.len(),
            edges = self.edges.len(),
            "diagram built"
        );

        Ok(Diagram {
            vertices: self.vertices,
            labels: self.labels,
            edges: self.edges,
        })
    }
}
