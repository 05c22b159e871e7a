//! # Slint Node Connectors
//!
//! A live connector engine for canvas editors: draws routed lines between two
//! scene nodes and keeps them attached while the nodes move, resize, nest or
//! disappear.
//!
//! ## Features
//!
//! - **Routing** - Direction follows the relative position of the endpoints,
//!   with smooth-curve and orthogonal-elbow paths
//! - **Live reconciliation** - Scene notifications are debounced and affected
//!   connectors are re-derived, one update per connector per burst
//! - **Labels** - Optional text labels placed at the connector midpoint with
//!   a contrasting text colour
//! - **Page persistence** - The registry is stored as JSON on each page and
//!   reloaded on activation
//! - **Host agnostic** - The scene graph is reached through the
//!   [`SceneHost`] trait only
//!
//! ## Quick Start
//!
//! ```ignore
//! use slint_node_connectors::{ConnectorConfig, ConnectorController};
//!
//! let local = tokio::task::LocalSet::new();
//! local.block_on(&runtime, async {
//!     let ctrl = ConnectorController::new(host.clone(), ConnectorConfig::default());
//!     ctrl.activate_page(&page);
//!     scene.on_document_change(ctrl.change_callback());
//!     scene.on_selection_change(ctrl.selection_callback());
//!     // ...
//! });
//! ```
//!
//! ## Core Types
//!
//! - [`ConnectorStore`] - Registry of a page's connectors and their lifecycle
//! - [`ReconciliationPipeline`] - Debounced handling of scene notifications
//! - [`ConnectorController`] - Page session, selection and user intents
//! - [`build_path`] / [`resolve_direction`] - Pure routing helpers

pub mod color;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod direction;
pub mod error;
pub mod geometry;
pub mod host;
pub mod label;
pub mod model;
pub mod path;
pub mod persist;
pub mod pipeline;
pub mod selection;
pub mod store;
pub mod validation;

pub use color::{contrast_ratio, contrasting_text_color, relative_luminance};
pub use config::ConnectorConfig;
pub use controller::{ConnectorController, DrawDefaults};
pub use debounce::Debouncer;
pub use direction::{
    anchor_points, classify_relative_position, reconcile_direction, resolve_direction, Anchors,
    RelativePosition, CLEARANCE_MARGIN,
};
pub use error::{ConnectorError, HostError, Result};
pub use geometry::{Point, Rect};
pub use host::{ChangeKind, LabelSpec, SceneChange, SceneHost, SceneNode, CONNECTOR_MARKER};
pub use model::{
    Connector, ConnectorGeometry, ConnectorNames, ConnectorPatch, ConnectorStyle, ConnectorText,
    Direction, EndpointPositions, GeometryPatch, LineStyle, NodeId, StrokeCap, StylePatch,
};
pub use path::{build_path, ConnectorPath, PathSegment, PathVertex, StrokeJoin};
pub use pipeline::ReconciliationPipeline;
pub use selection::SelectionTracker;
pub use store::{ConnectorStore, UpdateOutcome};
pub use validation::{validate_endpoints, ValidationError, ValidationResult};
