//! In-memory scene host for the integration tests.
//!
//! [`MockScene`] keeps a node tree with absolute bounds, records every
//! primitive the engine calls and yields once inside each async method so
//! that interleavings show up the way they do against a real host.

#![allow(dead_code)]

use super::CallTracker;
use async_trait::async_trait;
use indexmap::IndexMap;
use slint_node_connectors::{
    ConnectorConfig, ConnectorPath, ConnectorStore, ConnectorStyle, Direction, HostError,
    LabelSpec, NodeId, Rect, SceneChange, SceneHost, SceneNode,
};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::LocalSet;

pub const PAGE: &str = "0:1";
pub const OTHER_PAGE: &str = "0:2";

pub const ALPHA: &str = "1:1";
pub const BETA: &str = "1:2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Frame,
    Path,
    Label,
}

#[derive(Debug, Clone)]
pub struct MockNode {
    pub name: String,
    pub bounds: Option<Rect>,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

/// Last state committed to a drawn path.
#[derive(Debug, Clone)]
pub struct CommittedPath {
    pub svg: String,
    pub name: String,
    pub style: ConnectorStyle,
    pub direction: Direction,
}

pub struct MockScene {
    nodes: RefCell<IndexMap<NodeId, MockNode>>,
    /// Deleted nodes, still answering tree queries.
    tombstones: RefCell<HashMap<NodeId, MockNode>>,
    paths: RefCell<HashMap<NodeId, CommittedPath>>,
    labels: RefCell<HashMap<NodeId, LabelSpec>>,
    markers: RefCell<HashSet<NodeId>>,
    storage: RefCell<HashMap<(NodeId, String), String>>,
    next_id: Cell<u32>,
    pub tracker: CallTracker,
    /// Make `commit_path` fail.
    pub fail_commits: Cell<bool>,
    /// Make `commit_path` fail for these paths only.
    pub fail_commits_for: RefCell<HashSet<NodeId>>,
    /// Make `create_label` and `update_label` fail.
    pub fail_labels: Cell<bool>,
}

impl MockScene {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            nodes: RefCell::new(IndexMap::new()),
            tombstones: RefCell::new(HashMap::new()),
            paths: RefCell::new(HashMap::new()),
            labels: RefCell::new(HashMap::new()),
            markers: RefCell::new(HashSet::new()),
            storage: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
            tracker: CallTracker::new(),
            fail_commits: Cell::new(false),
            fail_commits_for: RefCell::new(HashSet::new()),
            fail_labels: Cell::new(false),
        })
    }

    /// Scene with `Alpha` at (0,0,100,50) and `Beta` at (0,200,100,50).
    pub fn with_two_nodes() -> Rc<Self> {
        let scene = Self::new();
        scene.add_node(ALPHA, "Alpha", Rect::new(0.0, 0.0, 100.0, 50.0));
        scene.add_node(BETA, "Beta", Rect::new(0.0, 200.0, 100.0, 50.0));
        scene
    }

    pub fn as_host(self: &Rc<Self>) -> Rc<dyn SceneHost> {
        self.clone()
    }

    // === Scene building ===

    pub fn add_node(&self, id: &str, name: &str, bounds: Rect) -> NodeId {
        self.insert(id, name, Some(bounds), None, NodeKind::Frame)
    }

    pub fn add_child(&self, parent: &str, id: &str, name: &str, bounds: Rect) -> NodeId {
        self.insert(id, name, Some(bounds), Some(parent.into()), NodeKind::Frame)
    }

    pub fn add_unplaced(&self, id: &str, name: &str) -> NodeId {
        self.insert(id, name, None, None, NodeKind::Frame)
    }

    fn insert(
        &self,
        id: &str,
        name: &str,
        bounds: Option<Rect>,
        parent: Option<NodeId>,
        kind: NodeKind,
    ) -> NodeId {
        let id = NodeId::from(id);
        self.nodes.borrow_mut().insert(
            id.clone(),
            MockNode {
                name: name.to_owned(),
                bounds,
                parent,
                kind,
            },
        );
        id
    }

    fn fresh_id(&self) -> NodeId {
        let n = self.next_id.get();
        self.next_id.set(n + 1);
        NodeId::new(format!("100:{n}"))
    }

    // === Mutations (return the notification a host would send) ===

    /// Shift a node and everything inside it.
    pub fn move_by(&self, id: &str, dx: f32, dy: f32) -> SceneChange {
        let id = NodeId::from(id);
        let mut affected = self.descendant_ids(&id);
        affected.push(id.clone());

        let mut nodes = self.nodes.borrow_mut();
        for node_id in affected {
            if let Some(bounds) = nodes.get_mut(&node_id).and_then(|n| n.bounds.as_mut()) {
                bounds.x += dx;
                bounds.y += dy;
            }
        }
        SceneChange::property(id)
    }

    pub fn set_bounds(&self, id: &str, bounds: Rect) -> SceneChange {
        let id = NodeId::from(id);
        if let Some(node) = self.nodes.borrow_mut().get_mut(&id) {
            node.bounds = Some(bounds);
        }
        SceneChange::property(id)
    }

    pub fn rename(&self, id: &str, name: &str) -> SceneChange {
        let id = NodeId::from(id);
        if let Some(node) = self.nodes.borrow_mut().get_mut(&id) {
            node.name = name.to_owned();
        }
        SceneChange::property(id)
    }

    /// Delete a node with everything inside it.
    pub fn delete(&self, id: &str) -> SceneChange {
        let id = NodeId::from(id);
        self.bury(&id);
        SceneChange::deleted(id)
    }

    fn bury(&self, id: &NodeId) -> bool {
        let mut doomed = self.descendant_ids(id);
        doomed.push(id.clone());

        let mut existed = false;
        for node_id in doomed {
            let removed = self.nodes.borrow_mut().shift_remove(&node_id);
            if let Some(node) = removed {
                existed |= &node_id == id;
                self.tombstones.borrow_mut().insert(node_id, node);
            }
        }
        existed
    }

    // === Inspection ===

    pub fn exists(&self, id: &NodeId) -> bool {
        self.nodes.borrow().contains_key(id)
    }

    pub fn node(&self, id: &NodeId) -> Option<MockNode> {
        self.nodes.borrow().get(id).cloned()
    }

    pub fn path(&self, id: &NodeId) -> Option<CommittedPath> {
        self.paths.borrow().get(id).cloned()
    }

    pub fn label(&self, id: &NodeId) -> Option<LabelSpec> {
        if !self.exists(id) {
            return None;
        }
        self.labels.borrow().get(id).cloned()
    }

    pub fn is_marked(&self, id: &NodeId) -> bool {
        self.markers.borrow().contains(id)
    }

    pub fn stored(&self, page: &str, key: &str) -> Option<String> {
        self.storage_get(&page.into(), key)
    }

    pub fn store_raw(&self, page: &str, key: &str, value: &str) {
        self.storage_set(&page.into(), key, value);
    }

    pub fn notices(&self) -> Vec<String> {
        self.tracker.notices.borrow().clone()
    }

    fn parent_links(&self) -> Vec<(NodeId, Option<NodeId>)> {
        let nodes = self.nodes.borrow();
        let tombstones = self.tombstones.borrow();
        nodes
            .iter()
            .chain(tombstones.iter())
            .map(|(id, node)| (id.clone(), node.parent.clone()))
            .collect()
    }

    fn parent_of(&self, id: &NodeId) -> Option<NodeId> {
        if let Some(node) = self.nodes.borrow().get(id) {
            return node.parent.clone();
        }
        self.tombstones.borrow().get(id).and_then(|n| n.parent.clone())
    }
}

#[async_trait(?Send)]
impl SceneHost for MockScene {
    async fn find_node(&self, id: &NodeId) -> Option<SceneNode> {
        tokio::task::yield_now().await;
        let found = self.nodes.borrow().get(id).map(|node| SceneNode {
            id: id.clone(),
            name: node.name.clone(),
            bounds: node.bounds,
            parent: node.parent.clone(),
        });
        found
    }

    fn descendant_ids(&self, id: &NodeId) -> Vec<NodeId> {
        let links = self.parent_links();
        let mut found = Vec::new();
        let mut frontier = vec![id.clone()];
        while let Some(current) = frontier.pop() {
            for (child, parent) in &links {
                if parent.as_ref() == Some(&current) {
                    found.push(child.clone());
                    frontier.push(child.clone());
                }
            }
        }
        found
    }

    fn ancestor_ids(&self, id: &NodeId) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            current = self.parent_of(&parent);
            ancestors.push(parent);
        }
        ancestors
    }

    async fn create_path(
        &self,
        path: &ConnectorPath,
        style: &ConnectorStyle,
    ) -> Result<NodeId, HostError> {
        tokio::task::yield_now().await;
        let id = self.fresh_id();
        self.insert(id.as_str(), "Vector", None, None, NodeKind::Path);
        self.paths.borrow_mut().insert(
            id.clone(),
            CommittedPath {
                svg: path.to_svg_commands(),
                name: "Vector".to_owned(),
                style: *style,
                direction: path.direction,
            },
        );
        self.tracker.create_path.borrow_mut().push(id.clone());
        Ok(id)
    }

    async fn mark_connector(&self, id: &NodeId) -> Result<(), HostError> {
        tokio::task::yield_now().await;
        if !self.exists(id) {
            return Err(HostError::NodeMissing(id.clone()));
        }
        self.markers.borrow_mut().insert(id.clone());
        self.tracker.mark_connector.borrow_mut().push(id.clone());
        Ok(())
    }

    async fn commit_path(
        &self,
        id: &NodeId,
        path: &ConnectorPath,
        style: &ConnectorStyle,
        name: &str,
    ) -> Result<(), HostError> {
        tokio::task::yield_now().await;
        if self.fail_commits.get() || self.fail_commits_for.borrow().contains(id) {
            return Err(HostError::Operation("commit rejected".into()));
        }
        if !self.exists(id) {
            return Err(HostError::NodeMissing(id.clone()));
        }
        self.paths.borrow_mut().insert(
            id.clone(),
            CommittedPath {
                svg: path.to_svg_commands(),
                name: name.to_owned(),
                style: *style,
                direction: path.direction,
            },
        );
        if let Some(node) = self.nodes.borrow_mut().get_mut(id) {
            node.name = name.to_owned();
        }
        self.tracker
            .commit_path
            .borrow_mut()
            .push((id.clone(), name.to_owned()));
        Ok(())
    }

    async fn create_label(
        &self,
        parent: Option<&NodeId>,
        label: &LabelSpec,
    ) -> Result<NodeId, HostError> {
        tokio::task::yield_now().await;
        if self.fail_labels.get() {
            return Err(HostError::Operation("label rejected".into()));
        }
        let id = self.fresh_id();
        let bounds = Rect::new(label.center.x - 20.0, label.center.y - 10.0, 40.0, 20.0);
        self.insert(id.as_str(), &label.text, Some(bounds), parent.cloned(), NodeKind::Label);
        self.labels.borrow_mut().insert(id.clone(), label.clone());
        self.tracker
            .create_label
            .borrow_mut()
            .push((id.clone(), parent.cloned()));
        Ok(id)
    }

    async fn update_label(&self, id: &NodeId, label: &LabelSpec) -> Result<(), HostError> {
        tokio::task::yield_now().await;
        if self.fail_labels.get() {
            return Err(HostError::Operation("label rejected".into()));
        }
        if !self.exists(id) {
            return Err(HostError::NodeMissing(id.clone()));
        }
        self.labels.borrow_mut().insert(id.clone(), label.clone());
        self.tracker
            .update_label
            .borrow_mut()
            .push((id.clone(), label.text.clone()));
        Ok(())
    }

    async fn remove_node(&self, id: &NodeId) -> Result<bool, HostError> {
        tokio::task::yield_now().await;
        self.tracker.remove_node.borrow_mut().push(id.clone());
        Ok(self.bury(id))
    }

    fn storage_get(&self, page: &NodeId, key: &str) -> Option<String> {
        self.storage
            .borrow()
            .get(&(page.clone(), key.to_owned()))
            .cloned()
    }

    fn storage_set(&self, page: &NodeId, key: &str, value: &str) {
        let slot = (page.clone(), key.to_owned());
        if value.is_empty() {
            self.storage.borrow_mut().remove(&slot);
        } else {
            self.storage.borrow_mut().insert(slot, value.to_owned());
        }
    }

    fn notify(&self, message: &str) {
        self.tracker.notices.borrow_mut().push(message.to_owned());
    }
}

// ============================================================================
// Runtime helpers
// ============================================================================

/// Run `fut` on a fresh local task set.
pub async fn run_local<F: Future>(fut: F) -> F::Output {
    LocalSet::new().run_until(fut).await
}

/// Let debounce timers fire and background tasks finish.
pub async fn settle() {
    tokio::time::sleep(Duration::from_secs(1)).await;
}

pub fn store_for(scene: &Rc<MockScene>) -> ConnectorStore {
    ConnectorStore::new(scene.as_host(), Rc::new(ConnectorConfig::default()))
}
