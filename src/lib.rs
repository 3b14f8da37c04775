//! Interactive decision tree diagrams.
//!
//! Takes the root of a binary decision tree, traverses it into a flat
//! diagram of labelled vertices and parent->child edges, computes a tidy
//! tree layout, and assembles an interactive Plotly figure with the split
//! condition (`Ft[i]<t`) on internal nodes and the prediction on leaves.

pub mod builder;
pub mod errors;
pub mod figure;
pub mod layout;
pub mod model;
pub mod util;

pub use builder::{Diagram, DiagramBuilder, VertexId};
pub use errors::{RenderError, RenderResult};
pub use layout::LayoutConfig;
pub use model::{DecisionTree, LeafNode, SplitNode, ToTextTree};

use plotly::Plot;
use tracing::{debug, instrument};

/// Renders decision trees as interactive figures.
///
/// Stateless across calls: every render traverses, validates, lays out, and
/// assembles from scratch, so repeated and concurrent invocations are
/// independent.
#[derive(Debug, Clone, Default)]
pub struct TreeRenderer {
    layout: LayoutConfig,
}

impl TreeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the figure for `root`: traversal, consistency check, tidy
    /// layout from the root vertex (id 0), figure assembly. Any failure
    /// aborts the render with no figure produced.
    #[instrument(level = "debug", skip(self, root))]
    pub fn render(&self, root: &DecisionTree) -> RenderResult<Plot> {
        debug!(
            nodes = root.node_count(),
            depth = root.depth(),
            tree = %root.to_text_tree(),
            "rendering decision tree"
        );

        let diagram = DiagramBuilder::new().build(root)?;
        diagram.validate()?;

        let positions =
            layout::tidy_layout(diagram.vertex_count(), &diagram.edges, 0, &self.layout)?;

        figure::assemble(&diagram, &positions)
    }

    /// Renders `root` and hands the figure to the interactive display,
    /// returning the figure afterwards.
    pub fn show(&self, root: &DecisionTree) -> RenderResult<Plot> {
        let plot = self.render(root)?;
        plot.show();
        Ok(plot)
    }
}

/// Renders `root` with default settings.
pub fn visualize_tree(root: &DecisionTree) -> RenderResult<Plot> {
    TreeRenderer::new().render(root)
}
