use thiserror::Error;

use crate::builder::VertexId;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Diagram has no vertices")]
    EmptyDiagram,

    #[error("Label count mismatch: {labels} labels for {vertices} vertices")]
    LabelCountMismatch { labels: usize, vertices: usize },

    #[error("Position count mismatch: {positions} positions for {vertices} vertices")]
    PositionCountMismatch { positions: usize, vertices: usize },

    #[error("Vertex id {id} out of range for {count} vertices")]
    VertexIdOutOfRange { id: VertexId, count: usize },

    #[error("Duplicate vertex id {0}")]
    DuplicateVertex(VertexId),

    #[error("Edge ({parent}, {child}) references a vertex outside the diagram")]
    DanglingEdge { parent: VertexId, child: VertexId },

    #[error("Root vertex {0} does not exist in the diagram")]
    UnknownRoot(VertexId),

    #[error("Vertex {0} has more than one parent")]
    MultipleParents(VertexId),

    #[error("Cycle detected at vertex {0}")]
    CycleDetected(VertexId),

    #[error("Vertex {0} is not reachable from the root")]
    Disconnected(VertexId),
}

pub type RenderResult<T> = Result<T, RenderError>;
