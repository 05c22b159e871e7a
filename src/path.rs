//! Vector path construction for connectors.
//!
//! [`build_path`] turns two endpoint rectangles and the routing parameters
//! into a [`ConnectorPath`]: a vertex list plus segments referencing vertices
//! by index, the shape vector-network hosts expect. Hosts that draw from SVG
//! path data can use [`ConnectorPath::to_svg_commands`] instead.

use crate::direction::{anchor_points, Anchors};
use crate::error::{ConnectorError, Result};
use crate::geometry::{Point, Rect};
use crate::model::{ConnectorGeometry, Direction, LineStyle, StrokeCap};
use std::fmt::Write;

/// How two segments meet at a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeJoin {
    #[default]
    Miter,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathVertex {
    pub point: Point,
    pub cap: StrokeCap,
    pub join: StrokeJoin,
}

/// Segment between two vertices.
///
/// Tangents are relative to their vertex; both zero means a straight line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSegment {
    pub start: usize,
    pub end: usize,
    pub tangent_start: Point,
    pub tangent_end: Point,
}

impl PathSegment {
    fn straight(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            tangent_start: Point::default(),
            tangent_end: Point::default(),
        }
    }

    pub fn is_straight(&self) -> bool {
        self.tangent_start == Point::default() && self.tangent_end == Point::default()
    }
}

/// Computed connector path together with the anchors it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorPath {
    pub vertices: Vec<PathVertex>,
    pub segments: Vec<PathSegment>,
    pub anchors: Anchors,
    pub direction: Direction,
}

impl ConnectorPath {
    /// SVG path commands, e.g. `"M 110 25 C 200 25 200 25 290 25"`.
    ///
    /// Segments are emitted in order; a new `M` is only written when a
    /// segment does not continue from the previous one.
    pub fn to_svg_commands(&self) -> String {
        let mut out = String::new();
        let mut cursor: Option<usize> = None;

        for segment in &self.segments {
            let (Some(from), Some(to)) = (
                self.vertices.get(segment.start),
                self.vertices.get(segment.end),
            ) else {
                continue;
            };

            if cursor != Some(segment.start) {
                if !out.is_empty() {
                    out.push(' ');
                }
                let _ = write!(out, "M {} {}", from.point.x, from.point.y);
            }

            if segment.is_straight() {
                let _ = write!(out, " L {} {}", to.point.x, to.point.y);
            } else {
                let _ = write!(
                    out,
                    " C {} {} {} {} {} {}",
                    from.point.x + segment.tangent_start.x,
                    from.point.y + segment.tangent_start.y,
                    to.point.x + segment.tangent_end.x,
                    to.point.y + segment.tangent_end.y,
                    to.point.x,
                    to.point.y
                );
            }
            cursor = Some(segment.end);
        }

        out
    }
}

/// Build the connector path from `a` (start) to `b` (end).
///
/// # Errors
///
/// [`ConnectorError::Configuration`] when `direction` is
/// [`Direction::Invalid`].
pub fn build_path(
    a: &Rect,
    b: &Rect,
    geometry: &ConnectorGeometry,
    direction: Direction,
) -> Result<ConnectorPath> {
    if direction == Direction::Invalid {
        return Err(ConnectorError::Configuration(
            "cannot build a path without a routing direction".into(),
        ));
    }
    let anchors = anchor_points(a, b, geometry.start_margin, geometry.end_margin, direction)?;

    let (vertices, segments) = match geometry.line_style {
        LineStyle::SmoothCurve => smooth_curve(&anchors, geometry, direction),
        LineStyle::OrthogonalElbow => orthogonal_elbow(&anchors, geometry, direction),
    };

    Ok(ConnectorPath {
        vertices,
        segments,
        anchors,
        direction,
    })
}

fn smooth_curve(
    anchors: &Anchors,
    geometry: &ConnectorGeometry,
    direction: Direction,
) -> (Vec<PathVertex>, Vec<PathSegment>) {
    let Anchors { start, end } = *anchors;

    // Handles follow the primary axis only, which gives the S shape.
    let handle = match direction {
        Direction::Vertical => Point::new(0.0, (end.y - start.y) / 2.0),
        _ => Point::new((end.x - start.x) / 2.0, 0.0),
    };

    let vertices = vec![
        PathVertex {
            point: start,
            cap: geometry.start_cap,
            join: StrokeJoin::Miter,
        },
        PathVertex {
            point: end,
            cap: geometry.end_cap,
            join: StrokeJoin::Miter,
        },
    ];
    let segments = vec![PathSegment {
        start: 0,
        end: 1,
        tangent_start: handle,
        tangent_end: Point::new(-handle.x, -handle.y),
    }];
    (vertices, segments)
}

fn orthogonal_elbow(
    anchors: &Anchors,
    geometry: &ConnectorGeometry,
    direction: Direction,
) -> (Vec<PathVertex>, Vec<PathSegment>) {
    let Anchors { start, end } = *anchors;

    let (bend_a, bend_b) = match direction {
        Direction::Vertical => {
            let mid_y = (start.y + end.y) / 2.0;
            (Point::new(start.x, mid_y), Point::new(end.x, mid_y))
        }
        _ => {
            let mid_x = (start.x + end.x) / 2.0;
            (Point::new(mid_x, start.y), Point::new(mid_x, end.y))
        }
    };

    let vertex = |point, cap| PathVertex {
        point,
        cap,
        join: StrokeJoin::Round,
    };
    let vertices = vec![
        vertex(start, geometry.start_cap),
        vertex(bend_a, StrokeCap::None),
        vertex(bend_b, StrokeCap::None),
        vertex(end, geometry.end_cap),
    ];
    let segments = vec![
        PathSegment::straight(0, 1),
        PathSegment::straight(1, 2),
        PathSegment::straight(2, 3),
    ];
    (vertices, segments)
}
