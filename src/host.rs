//! Interface to the scene graph that owns the nodes.
//!
//! The engine never holds node handles. It stores [`NodeId`]s and asks the
//! host for whatever it needs, accepting that a node may have disappeared in
//! the meantime. All async methods run on the single UI thread, so the
//! returned futures are not required to be `Send`.
//!
//! # Example
//!
//! ```ignore
//! struct CanvasHost { /* scene handle */ }
//!
//! #[async_trait(?Send)]
//! impl SceneHost for CanvasHost {
//!     async fn find_node(&self, id: &NodeId) -> Option<SceneNode> {
//!         let node = self.scene.lookup(id.as_str()).await?;
//!         Some(SceneNode {
//!             id: id.clone(),
//!             name: node.name(),
//!             bounds: node.absolute_bounds(),
//!             parent: node.parent_id().map(NodeId::from),
//!         })
//!     }
//!     // ...
//! }
//! ```

use crate::error::HostError;
use crate::geometry::{Point, Rect};
use crate::model::{ConnectorStyle, NodeId};
use crate::path::ConnectorPath;
use async_trait::async_trait;
use slint::Color;

/// Marker stamped on every drawn connector path so the host can recognise
/// managed connectors.
pub const CONNECTOR_MARKER: &str = "connector";

/// What the host knows about a node at lookup time.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    /// Absolute bounding box; `None` for nodes without a canvas position.
    pub bounds: Option<Rect>,
    /// Parent node, `None` for direct children of the page.
    pub parent: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    PropertyChange,
    Delete,
}

/// One entry of a scene mutation notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneChange {
    pub kind: ChangeKind,
    pub node_id: NodeId,
}

impl SceneChange {
    pub fn property(node_id: impl Into<NodeId>) -> Self {
        Self {
            kind: ChangeKind::PropertyChange,
            node_id: node_id.into(),
        }
    }

    pub fn deleted(node_id: impl Into<NodeId>) -> Self {
        Self {
            kind: ChangeKind::Delete,
            node_id: node_id.into(),
        }
    }
}

/// Content and placement of a connector label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSpec {
    pub text: String,
    pub font_size: f32,
    /// Where the label container is centred.
    pub center: Point,
    pub background: Color,
    pub foreground: Color,
}

/// Scene graph operations the engine depends on.
#[async_trait(?Send)]
pub trait SceneHost {
    /// Look up a node. `None` means it does not exist (any more).
    async fn find_node(&self, id: &NodeId) -> Option<SceneNode>;

    /// Ids of every node below `id`, at any depth.
    ///
    /// Hosts should still answer for a node that was just deleted so that
    /// deletion notifications can be matched against nested endpoints.
    fn descendant_ids(&self, id: &NodeId) -> Vec<NodeId>;

    /// Ancestors of `id`, nearest first, excluding the page itself.
    fn ancestor_ids(&self, id: &NodeId) -> Vec<NodeId>;

    /// Draw a new vector path and return its id.
    async fn create_path(&self, path: &ConnectorPath, style: &ConnectorStyle)
        -> Result<NodeId, HostError>;

    /// Stamp [`CONNECTOR_MARKER`] on a drawn path.
    async fn mark_connector(&self, id: &NodeId) -> Result<(), HostError>;

    /// Replace geometry, style and name of an existing path.
    async fn commit_path(
        &self,
        id: &NodeId,
        path: &ConnectorPath,
        style: &ConnectorStyle,
        name: &str,
    ) -> Result<(), HostError>;

    /// Create a label container under `parent` (the page when `None`).
    async fn create_label(&self, parent: Option<&NodeId>, label: &LabelSpec)
        -> Result<NodeId, HostError>;

    async fn update_label(&self, id: &NodeId, label: &LabelSpec) -> Result<(), HostError>;

    /// Remove a node. Returns `false` if it was already gone.
    async fn remove_node(&self, id: &NodeId) -> Result<bool, HostError>;

    /// Read a page-scoped string value.
    fn storage_get(&self, page: &NodeId, key: &str) -> Option<String>;

    /// Write a page-scoped string value. An empty value clears it.
    fn storage_set(&self, page: &NodeId, key: &str, value: &str);

    /// Show a short notice to the user.
    fn notify(&self, message: &str);
}
