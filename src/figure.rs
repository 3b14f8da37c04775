//! Figure assembly: turns a diagram plus layout coordinates into an
//! interactive Plotly figure.
//!
//! Three layers: grey line segments for the edges (with gap markers so they
//! render disjoint), size-1 markers carrying each vertex label as hover text,
//! and a callout annotation per vertex echoing the same label. Both axes are
//! fully hidden.

use plotly::color::Rgb;
use plotly::common::{Font, HoverInfo, Line, Marker, MarkerSymbol, Mode, Title};
use plotly::layout::{Annotation, Axis, HoverMode, Layout, Margin};
use plotly::{Plot, Scatter};
use tracing::{debug, instrument};

use crate::builder::Diagram;
use crate::errors::{RenderError, RenderResult};
use crate::layout::Point;

const TITLE: &str = "Decision Tree Visualization";
const NODE_FILL: &str = "#6175c1";
const CALLOUT_BORDER: &str = "#c7c7c7";
const CALLOUT_FONT_COLOR: &str = "#ffffff";
const PLOT_BACKGROUND: &str = "#ffffff";
const LINE_WIDTH: f64 = 1.0;
const MARKER_SIZE: usize = 1;
const MARKER_OPACITY: f64 = 0.8;
const CALLOUT_FONT_SIZE: usize = 14;
const BASE_FONT_SIZE: usize = 10;

/// Plot-space coordinates after the vertical reflection, indexed by vertex
/// id. `edge_x`/`edge_y` hold two endpoints plus a `None` gap marker per
/// edge.
struct PlotCoordinates {
    node_x: Vec<f64>,
    node_y: Vec<f64>,
    edge_x: Vec<Option<f64>>,
    edge_y: Vec<Option<f64>>,
    labels_by_id: Vec<String>,
}

/// Maps layout coordinates into plot space.
///
/// The layout places the root at y = 0 and deeper nodes at larger y; the
/// reflection `y' = 2*max_y - y` puts the root at the top of the figure.
fn plot_coordinates(diagram: &Diagram, positions: &[Point]) -> RenderResult<PlotCoordinates> {
    diagram.validate()?;
    if positions.len() != diagram.vertex_count() {
        return Err(RenderError::PositionCountMismatch {
            positions: positions.len(),
            vertices: diagram.vertex_count(),
        });
    }

    let max_y = positions.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    let reflect = |y: f64| 2.0 * max_y - y;

    let node_x: Vec<f64> = positions.iter().map(|p| p.x).collect();
    let node_y: Vec<f64> = positions.iter().map(|p| reflect(p.y)).collect();

    let mut labels_by_id = vec![String::new(); diagram.vertex_count()];
    for (&id, label) in diagram.vertices.iter().zip(&diagram.labels) {
        labels_by_id[id as usize] = label.clone();
    }

    let mut edge_x = Vec::with_capacity(diagram.edge_count() * 3);
    let mut edge_y = Vec::with_capacity(diagram.edge_count() * 3);
    for &(parent, child) in &diagram.edges {
        let from = positions[parent as usize];
        let to = positions[child as usize];
        edge_x.extend([Some(from.x), Some(to.x), None]);
        edge_y.extend([Some(reflect(from.y)), Some(reflect(to.y)), None]);
    }

    Ok(PlotCoordinates {
        node_x,
        node_y,
        edge_x,
        edge_y,
        labels_by_id,
    })
}

fn callouts(coords: &PlotCoordinates) -> Vec<Annotation> {
    coords
        .labels_by_id
        .iter()
        .enumerate()
        .map(|(id, label)| {
            Annotation::new()
                .text(label.as_str())
                .x(coords.node_x[id])
                .y(coords.node_y[id])
                .x_ref("x")
                .y_ref("y")
                .show_arrow(false)
                .font(Font::new().size(CALLOUT_FONT_SIZE).color(CALLOUT_FONT_COLOR))
                .background_color(NODE_FILL)
                .border_color(CALLOUT_BORDER)
                .border_width(1.0)
                .border_pad(2.0)
        })
        .collect()
}

fn hidden_axis() -> Axis {
    Axis::new()
        .show_line(false)
        .zero_line(false)
        .show_grid(false)
        .show_tick_labels(false)
}

/// Assembles the interactive figure for a laid-out diagram.
///
/// Fails fast if the diagram is inconsistent or the position count does not
/// match the vertex count; nothing is drawn on failure.
#[instrument(level = "debug", skip(diagram, positions))]
pub fn assemble(diagram: &Diagram, positions: &[Point]) -> RenderResult<Plot> {
    let coords = plot_coordinates(diagram, positions)?;

    let lines = Scatter::new(coords.edge_x.clone(), coords.edge_y.clone())
        .mode(Mode::Lines)
        .line(Line::new().color(Rgb::new(210, 210, 210)).width(LINE_WIDTH))
        .hover_info(HoverInfo::None);

    let markers = Scatter::new(coords.node_x.clone(), coords.node_y.clone())
        .mode(Mode::Markers)
        .name("")
        .marker(
            Marker::new()
                .symbol(MarkerSymbol::Circle)
                .size(MARKER_SIZE)
                .color(NODE_FILL)
                .line(Line::new().color(Rgb::new(50, 50, 50)).width(LINE_WIDTH)),
        )
        .text_array(coords.labels_by_id.clone())
        .hover_info(HoverInfo::Text)
        .opacity(MARKER_OPACITY);

    let layout = Layout::new()
        .title(Title::with_text(TITLE))
        .annotations(callouts(&coords))
        .font(Font::new().size(BASE_FONT_SIZE))
        .show_legend(false)
        .x_axis(hidden_axis())
        .y_axis(hidden_axis())
        .margin(Margin::new().left(40).right(40).bottom(85).top(100))
        .hover_mode(HoverMode::Closest)
        .plot_background_color(PLOT_BACKGROUND);

    let mut plot = Plot::new();
    plot.add_trace(lines);
    plot.add_trace(markers);
    plot.set_layout(layout);

    debug!(
        vertices = diagram.vertex_count(),
        edges = diagram.edge_count(),
        "figure assembled"
    );
    Ok(plot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DiagramBuilder;
    use crate::layout::{tidy_layout, LayoutConfig};
    use crate::model::DecisionTree;

    fn laid_out_split() -> (Diagram, Vec<Point>) {
        let tree = DecisionTree::split(
            2,
            0.5,
            Some(DecisionTree::leaf(1.0)),
            Some(DecisionTree::leaf(0.0)),
        );
        let diagram = DiagramBuilder::new().build(&tree).unwrap();
        let positions = tidy_layout(
            diagram.vertex_count(),
            &diagram.edges,
            0,
            &LayoutConfig::default(),
        )
        .unwrap();
        (diagram, positions)
    }

    #[test]
    fn test_reflection_puts_root_on_top() {
        let (diagram, positions) = laid_out_split();
        let coords = plot_coordinates(&diagram, &positions).unwrap();

        let root_y = coords.node_y[0];
        for &y in &coords.node_y[1..] {
            assert!(root_y > y, "root y {root_y} should exceed child y {y}");
        }
    }

    #[test]
    fn test_one_gap_marker_per_edge() {
        let (diagram, positions) = laid_out_split();
        let coords = plot_coordinates(&diagram, &positions).unwrap();

        assert_eq!(coords.edge_x.len(), diagram.edge_count() * 3);
        let gaps = coords.edge_x.iter().filter(|x| x.is_none()).count();
        assert_eq!(gaps, diagram.edge_count());
    }

    #[test]
    fn test_labels_follow_vertex_ids() {
        let (diagram, positions) = laid_out_split();
        let coords = plot_coordinates(&diagram, &positions).unwrap();

        assert_eq!(coords.labels_by_id, vec!["Ft[2]<0.50", "1", "0"]);
    }

    #[test]
    fn test_position_count_mismatch_rejected() {
        let (diagram, mut positions) = laid_out_split();
        positions.pop();

        assert!(matches!(
            plot_coordinates(&diagram, &positions),
            Err(RenderError::PositionCountMismatch {
                positions: 2,
                vertices: 3
            })
        ));
    }

    #[test]
    fn test_inconsistent_diagram_rejected_before_drawing() {
        let diagram = Diagram {
            vertices: vec![0, 1],
            labels: vec!["lonely".to_string()],
            edges: vec![],
        };
        let positions = vec![Point { x: 0.0, y: 0.0 }, Point { x: 1.0, y: 1.0 }];

        assert!(matches!(
            plot_coordinates(&diagram, &positions),
            Err(RenderError::LabelCountMismatch { .. })
        ));
    }

    #[test]
    fn test_assemble_produces_titled_figure() {
        let (diagram, positions) = laid_out_split();
        let plot = assemble(&diagram, &positions).unwrap();

        assert!(plot.to_json().contains(TITLE));
    }
}
