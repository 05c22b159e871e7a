//! Connector records and the value types they are made of.
//!
//! A [`Connector`] is the persisted description of one managed link between
//! two scene nodes. Endpoints and the label are weak references: only the
//! [`NodeId`] is stored and the node is looked up through the
//! [`SceneHost`](crate::host::SceneHost) whenever it is needed. A failed
//! lookup means the node was deleted, which is an expected outcome.

use crate::color;
use crate::error::ConnectorError;
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use slint::Color;
use std::fmt;
use std::str::FromStr;

/// Identity of a node in the host scene graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Routing axis of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Vertical,
    #[default]
    Horizontal,
    Invalid,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertical => write!(f, "vertical"),
            Self::Horizontal => write!(f, "horizontal"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

impl FromStr for Direction {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vertical" => Ok(Self::Vertical),
            "horizontal" => Ok(Self::Horizontal),
            other => Err(ConnectorError::Configuration(format!(
                "unknown direction `{other}`"
            ))),
        }
    }
}

/// Shape of the connector line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineStyle {
    /// Two vertices joined by one S-shaped cubic segment.
    #[default]
    SmoothCurve,
    /// Four vertices joined by three straight segments with rounded joins.
    OrthogonalElbow,
}

impl FromStr for LineStyle {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "smooth-curve" => Ok(Self::SmoothCurve),
            "orthogonal-elbow" => Ok(Self::OrthogonalElbow),
            other => Err(ConnectorError::Configuration(format!(
                "unsupported line style `{other}`"
            ))),
        }
    }
}

/// Decoration drawn at a path vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrokeCap {
    #[default]
    None,
    Round,
    Square,
    ArrowLines,
    ArrowEquilateral,
    TriangleFilled,
    CircleFilled,
    DiamondFilled,
}

/// Routing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectorGeometry {
    /// Clearance between the start node and the start anchor (0-10).
    pub start_margin: f32,
    /// Clearance between the end node and the end anchor (0-10).
    pub end_margin: f32,
    pub start_cap: StrokeCap,
    pub end_cap: StrokeCap,
    pub line_style: LineStyle,
}

impl Default for ConnectorGeometry {
    fn default() -> Self {
        Self {
            start_margin: 4.0,
            end_margin: 4.0,
            start_cap: StrokeCap::None,
            end_cap: StrokeCap::ArrowLines,
            line_style: LineStyle::SmoothCurve,
        }
    }
}

impl ConnectorGeometry {
    /// Copy with every numeric field forced into its valid range.
    pub fn clamped(mut self) -> Self {
        self.start_margin = clamp_or(self.start_margin, 0.0, 10.0);
        self.end_margin = clamp_or(self.end_margin, 0.0, 10.0);
        self
    }
}

/// Visual parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectorStyle {
    #[serde(with = "color::hex")]
    pub color: Color,
    /// Percent, 0-100.
    pub opacity: f32,
    /// 1-10.
    pub stroke_weight: f32,
    /// 0-100, applied to elbow joins.
    pub corner_radius: f32,
    /// 0-10, zero means a solid line.
    pub dash_length: f32,
    /// 0-10.
    pub dash_gap: f32,
}

impl Default for ConnectorStyle {
    fn default() -> Self {
        Self {
            color: Color::from_rgb_u8(0x18, 0xa0, 0xfb),
            opacity: 100.0,
            stroke_weight: 2.0,
            corner_radius: 16.0,
            dash_length: 0.0,
            dash_gap: 0.0,
        }
    }
}

impl ConnectorStyle {
    /// Copy with every numeric field forced into its valid range.
    pub fn clamped(mut self) -> Self {
        self.opacity = clamp_or(self.opacity, 0.0, 100.0);
        self.stroke_weight = clamp_or(self.stroke_weight, 1.0, 10.0);
        self.corner_radius = clamp_or(self.corner_radius, 0.0, 100.0);
        self.dash_length = clamp_or(self.dash_length, 0.0, 10.0);
        self.dash_gap = clamp_or(self.dash_gap, 0.0, 10.0);
        self
    }

    /// Dash pattern for the host, empty for a solid stroke.
    pub fn dash_pattern(&self) -> Vec<f32> {
        if self.dash_length > 0.0 {
            vec![self.dash_length, self.dash_gap]
        } else {
            Vec::new()
        }
    }
}

fn clamp_or(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Endpoint names captured at the last computation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectorNames {
    pub start_name: String,
    pub end_name: String,
}

/// Label content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorText {
    pub text: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

fn default_font_size() -> f32 {
    12.0
}

impl ConnectorText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: default_font_size(),
        }
    }
}

/// Snapshot of both endpoint rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EndpointPositions {
    pub start: Rect,
    pub end: Rect,
}

/// A managed connector between two scene nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    /// Id of the drawn path node.
    pub id: NodeId,
    pub start_node_id: NodeId,
    pub end_node_id: NodeId,
    #[serde(default)]
    pub text_node_id: Option<NodeId>,
    pub position: EndpointPositions,
    pub geometry: ConnectorGeometry,
    pub style: ConnectorStyle,
    pub name: ConnectorNames,
    #[serde(default)]
    pub text: Option<ConnectorText>,
    pub direction: Direction,
}

impl Connector {
    /// `"<prefix> <start> -> <end>"`, the name given to the drawn path.
    pub fn display_name(&self, prefix: &str) -> String {
        format!(
            "{} {} -> {}",
            prefix, self.name.start_name, self.name.end_name
        )
    }

    /// Label text, empty when the connector has none.
    pub fn label_text(&self) -> &str {
        self.text.as_ref().map(|t| t.text.as_str()).unwrap_or("")
    }

    /// Whether `node_id` is one of the two endpoints.
    pub fn has_endpoint(&self, node_id: &NodeId) -> bool {
        &self.start_node_id == node_id || &self.end_node_id == node_id
    }

    /// Swap start and end, together with their cached rectangles and names.
    pub fn swap_endpoints(&mut self) {
        std::mem::swap(&mut self.start_node_id, &mut self.end_node_id);
        std::mem::swap(&mut self.position.start, &mut self.position.end);
        std::mem::swap(&mut self.name.start_name, &mut self.name.end_name);
    }
}

// ============================================================================
// Patches
// ============================================================================

/// Partial style update; `None` keeps the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StylePatch {
    pub color: Option<Color>,
    pub opacity: Option<f32>,
    pub stroke_weight: Option<f32>,
    pub corner_radius: Option<f32>,
    pub dash_length: Option<f32>,
    pub dash_gap: Option<f32>,
}

impl StylePatch {
    /// Merge over `style` and clamp the result.
    pub fn apply(&self, style: &ConnectorStyle) -> ConnectorStyle {
        ConnectorStyle {
            color: self.color.unwrap_or(style.color),
            opacity: self.opacity.unwrap_or(style.opacity),
            stroke_weight: self.stroke_weight.unwrap_or(style.stroke_weight),
            corner_radius: self.corner_radius.unwrap_or(style.corner_radius),
            dash_length: self.dash_length.unwrap_or(style.dash_length),
            dash_gap: self.dash_gap.unwrap_or(style.dash_gap),
        }
        .clamped()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Partial geometry update; `None` keeps the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeometryPatch {
    pub start_margin: Option<f32>,
    pub end_margin: Option<f32>,
    pub start_cap: Option<StrokeCap>,
    pub end_cap: Option<StrokeCap>,
    pub line_style: Option<LineStyle>,
}

impl GeometryPatch {
    /// Merge over `geometry` and clamp the result.
    pub fn apply(&self, geometry: &ConnectorGeometry) -> ConnectorGeometry {
        ConnectorGeometry {
            start_margin: self.start_margin.unwrap_or(geometry.start_margin),
            end_margin: self.end_margin.unwrap_or(geometry.end_margin),
            start_cap: self.start_cap.unwrap_or(geometry.start_cap),
            end_cap: self.end_cap.unwrap_or(geometry.end_cap),
            line_style: self.line_style.unwrap_or(geometry.line_style),
        }
        .clamped()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Everything [`ConnectorStore::update`](crate::store::ConnectorStore::update)
/// can change. The default patch changes nothing and only re-derives
/// geometry from the current endpoint positions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectorPatch {
    pub style: StylePatch,
    pub geometry: GeometryPatch,
    /// New label text. An empty string removes the label.
    pub text: Option<String>,
    /// Requested routing axis, kept only while geometry allows it.
    pub direction: Option<Direction>,
}

impl ConnectorPatch {
    pub fn with_style(mut self, style: StylePatch) -> Self {
        self.style = style;
        self
    }

    pub fn with_geometry(mut self, geometry: GeometryPatch) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.style.is_empty()
            && self.geometry.is_empty()
            && self.text.is_none()
            && self.direction.is_none()
    }
}
