//! Connector registry and lifecycle.
//!
//! This module provides [`ConnectorStore`], which owns the connector records
//! of the active page and keeps their drawn paths and labels in sync with
//! the endpoint nodes.
//!
//! # Example
//!
//! ```ignore
//! use slint_node_connectors::{ConnectorConfig, ConnectorPatch, ConnectorStore};
//!
//! let store = ConnectorStore::load(host.clone(), Rc::new(ConnectorConfig::default()), &page);
//!
//! // Draw a connector between two selected nodes
//! if store.can_create(&start, &end).await.is_valid() {
//!     let connector = store
//!         .create(&start, &end, config.default_style, config.default_geometry, None)
//!         .await?;
//!
//!     // Re-derive geometry and add a label
//!     store.update(&connector.id, ConnectorPatch::default().with_text("uses")).await?;
//! }
//!
//! // Persist before leaving the page
//! store.sweep().await;
//! store.persist(&page)?;
//! ```
//!
//! # Reentrancy
//!
//! All work runs on one thread, but every host call is a suspension point.
//! Two guard sets make sure that at most one update and one removal run per
//! connector at any time. A guard is held by an `InFlight` value and is
//! released when that value is dropped, on every exit path.

use crate::config::ConnectorConfig;
use crate::direction::{reconcile_direction, resolve_direction};
use crate::error::{ConnectorError, Result};
use crate::geometry::Rect;
use crate::host::{SceneHost, SceneNode};
use crate::label::reconcile_label;
use crate::model::{
    Connector, ConnectorGeometry, ConnectorNames, ConnectorPatch, ConnectorStyle, ConnectorText,
    EndpointPositions, NodeId,
};
use crate::path::build_path;
use crate::persist;
use crate::validation::{validate_endpoints, ValidationResult};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Result of [`ConnectorStore::update`] and [`ConnectorStore::flip`].
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Geometry, style and label were recomputed.
    Updated(Connector),
    /// The connector is already being updated or removed; nothing happened.
    Skipped,
    /// The record, its path or an endpoint was gone; the record was dropped.
    Purged,
}

impl UpdateOutcome {
    pub fn connector(&self) -> Option<&Connector> {
        match self {
            Self::Updated(c) => Some(c),
            _ => None,
        }
    }
}

#[derive(Default)]
struct StoreState {
    connectors: IndexMap<NodeId, Connector>,
    updating: HashSet<NodeId>,
    removing: HashSet<NodeId>,
}

#[derive(Clone, Copy, Debug)]
enum GuardKind {
    Updating,
    Removing,
}

/// Marks a connector id as busy until dropped.
struct InFlight {
    state: Rc<RefCell<StoreState>>,
    kind: GuardKind,
    id: NodeId,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        match self.kind {
            GuardKind::Updating => state.updating.remove(&self.id),
            GuardKind::Removing => state.removing.remove(&self.id),
        };
    }
}

/// Registry of the connectors on one page.
///
/// Clone this store to share it between the pipeline and the controller;
/// clones share the same registry.
#[derive(Clone)]
pub struct ConnectorStore {
    host: Rc<dyn SceneHost>,
    config: Rc<ConnectorConfig>,
    state: Rc<RefCell<StoreState>>,
}

impl ConnectorStore {
    /// Create an empty store.
    pub fn new(host: Rc<dyn SceneHost>, config: Rc<ConnectorConfig>) -> Self {
        Self {
            host,
            config,
            state: Rc::new(RefCell::new(StoreState::default())),
        }
    }

    /// Create a store holding `connectors`, in order.
    pub fn with_connectors<I>(
        host: Rc<dyn SceneHost>,
        config: Rc<ConnectorConfig>,
        connectors: I,
    ) -> Self
    where
        I: IntoIterator<Item = Connector>,
    {
        let store = Self::new(host, config);
        store.state.borrow_mut().connectors =
            connectors.into_iter().map(|c| (c.id.clone(), c)).collect();
        store
    }

    /// Create a store from the registry persisted on `page`.
    ///
    /// Missing or corrupt data yields an empty store.
    pub fn load(host: Rc<dyn SceneHost>, config: Rc<ConnectorConfig>, page: &NodeId) -> Self {
        let connectors = persist::load_page(&*host, page, &config.storage_key);
        Self::with_connectors(host, config, connectors)
    }

    /// Write the registry to `page`.
    pub fn persist(&self, page: &NodeId) -> Result<()> {
        let state = self.state.borrow();
        persist::save_page(
            &*self.host,
            page,
            &self.config.storage_key,
            state.connectors.values(),
        )
    }

    /// Serialize the registry to a JSON array.
    pub fn serialize(&self) -> Result<String> {
        persist::serialize(self.state.borrow().connectors.values())
    }

    /// Replace the registry with the records in `blob`.
    ///
    /// On error the registry is left untouched.
    pub fn deserialize(&self, blob: &str) -> Result<usize> {
        let connectors = persist::deserialize(blob)?;
        let count = connectors.len();
        self.state.borrow_mut().connectors =
            connectors.into_iter().map(|c| (c.id.clone(), c)).collect();
        Ok(count)
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub fn host(&self) -> Rc<dyn SceneHost> {
        self.host.clone()
    }

    // === Queries ===

    pub fn len(&self) -> usize {
        self.state.borrow().connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().connectors.is_empty()
    }

    /// Connector ids in registry order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.state.borrow().connectors.keys().cloned().collect()
    }

    pub fn get(&self, id: &NodeId) -> Option<Connector> {
        self.state.borrow().connectors.get(id).cloned()
    }

    /// Snapshot of every record, in registry order.
    pub fn connectors(&self) -> Vec<Connector> {
        self.state.borrow().connectors.values().cloned().collect()
    }

    /// Whether `node_id` is the drawn path of a tracked connector.
    pub fn is_connector(&self, node_id: &NodeId) -> bool {
        self.state.borrow().connectors.contains_key(node_id)
    }

    /// Whether `node_id` is the label of connector `connector_id`.
    pub fn is_label_of(&self, connector_id: &NodeId, node_id: &NodeId) -> bool {
        self.state
            .borrow()
            .connectors
            .get(connector_id)
            .is_some_and(|c| c.text_node_id.as_ref() == Some(node_id))
    }

    /// Whether `node_id`, or any node below it, is an endpoint of
    /// `connector_id`.
    pub fn affects_connector(&self, connector_id: &NodeId, node_id: &NodeId) -> bool {
        let Some(connector) = self.get(connector_id) else {
            return false;
        };
        connector.has_endpoint(node_id)
            || self
                .host
                .descendant_ids(node_id)
                .iter()
                .any(|d| connector.has_endpoint(d))
    }

    /// Ids of connectors with an endpoint in `node_ids`, in registry order.
    pub fn connectors_touching(&self, node_ids: &HashSet<NodeId>) -> Vec<NodeId> {
        self.state
            .borrow()
            .connectors
            .values()
            .filter(|c| node_ids.contains(&c.start_node_id) || node_ids.contains(&c.end_node_id))
            .map(|c| c.id.clone())
            .collect()
    }

    /// Connector whose label is `node_id`.
    pub fn label_owner(&self, node_id: &NodeId) -> Option<NodeId> {
        self.state
            .borrow()
            .connectors
            .values()
            .find(|c| c.text_node_id.as_ref() == Some(node_id))
            .map(|c| c.id.clone())
    }

    /// Connector that `node_id` belongs to, as its path or its label.
    pub fn owning_connector(&self, node_id: &NodeId) -> Option<NodeId> {
        if self.is_connector(node_id) {
            return Some(node_id.clone());
        }
        self.label_owner(node_id)
    }

    pub fn is_updating(&self, id: &NodeId) -> bool {
        self.state.borrow().updating.contains(id)
    }

    pub fn is_removing(&self, id: &NodeId) -> bool {
        self.state.borrow().removing.contains(id)
    }

    fn begin(&self, id: &NodeId, kind: GuardKind) -> Option<InFlight> {
        let mut state = self.state.borrow_mut();
        let acquired = match kind {
            GuardKind::Updating => {
                !state.removing.contains(id) && state.updating.insert(id.clone())
            }
            GuardKind::Removing => state.removing.insert(id.clone()),
        };
        acquired.then(|| InFlight {
            state: self.state.clone(),
            kind,
            id: id.clone(),
        })
    }

    // === Lifecycle ===

    /// Check whether a connector can be drawn from `start` to `end`.
    pub async fn can_create(&self, start: &NodeId, end: &NodeId) -> ValidationResult {
        let start_node = self.host.find_node(start).await;
        let end_node = self.host.find_node(end).await;
        validate_endpoints(start, start_node.as_ref(), end, end_node.as_ref())
    }

    /// Draw a new connector and register it.
    ///
    /// `text` is stored on the record but the label itself is created by the
    /// next [`update`](Self::update).
    ///
    /// # Errors
    ///
    /// - [`ConnectorError::Validation`] when [`can_create`](Self::can_create)
    ///   would reject the endpoints
    /// - [`ConnectorError::Host`] when drawing fails
    pub async fn create(
        &self,
        start: &NodeId,
        end: &NodeId,
        style: ConnectorStyle,
        geometry: ConnectorGeometry,
        text: Option<ConnectorText>,
    ) -> Result<Connector> {
        let start_node = self.host.find_node(start).await;
        let end_node = self.host.find_node(end).await;
        validate_endpoints(start, start_node.as_ref(), end, end_node.as_ref()).into_result()?;

        let (start_node, a) = with_bounds(start, start_node)?;
        let (end_node, b) = with_bounds(end, end_node)?;

        let style = style.clamped();
        let geometry = geometry.clamped();
        let direction = resolve_direction(&a, &b);
        let path = build_path(&a, &b, &geometry, direction)?;

        let id = self.host.create_path(&path, &style).await?;

        let connector = Connector {
            id: id.clone(),
            start_node_id: start.clone(),
            end_node_id: end.clone(),
            text_node_id: None,
            position: EndpointPositions { start: a, end: b },
            geometry,
            style,
            name: ConnectorNames {
                start_name: start_node.name,
                end_name: end_node.name,
            },
            text: text.filter(|t| !t.text.is_empty()),
            direction,
        };

        let name = connector.display_name(&self.config.label_prefix);
        let committed = match self.host.mark_connector(&id).await {
            Ok(()) => self.host.commit_path(&id, &path, &style, &name).await,
            Err(err) => Err(err),
        };
        if let Err(err) = committed {
            let _ = self.host.remove_node(&id).await;
            return Err(err.into());
        }

        self.state
            .borrow_mut()
            .connectors
            .insert(id.clone(), connector.clone());
        debug!(connector = %id, start = %start, end = %end, %direction, "created connector");
        Ok(connector)
    }

    /// Re-derive a connector from its endpoints, applying `patch` first.
    ///
    /// Missing patch fields keep their stored values. A requested direction
    /// is kept only while the endpoints allow it; otherwise the direction
    /// implied by their position is used.
    ///
    /// Returns [`UpdateOutcome::Skipped`] when the connector is already being
    /// updated or removed, and [`UpdateOutcome::Purged`] when the record, its
    /// path or an endpoint no longer exists.
    ///
    /// # Errors
    ///
    /// - [`ConnectorError::Configuration`] when no path can be built; the
    ///   record keeps its last good state
    /// - [`ConnectorError::Host`] when a scene write fails
    pub async fn update(&self, id: &NodeId, patch: ConnectorPatch) -> Result<UpdateOutcome> {
        self.reconcile(id, patch, false).await
    }

    /// Swap start and end, then re-derive the connector.
    ///
    /// The swap is only recorded once the reversed path has been committed;
    /// a failure leaves the record untouched.
    pub async fn flip(&self, id: &NodeId) -> Result<UpdateOutcome> {
        if self.is_updating(id) || self.is_removing(id) {
            return Ok(UpdateOutcome::Skipped);
        }
        if !self.is_connector(id) {
            return Ok(UpdateOutcome::Purged);
        }
        self.reconcile(id, ConnectorPatch::default(), true).await
    }

    async fn reconcile(
        &self,
        id: &NodeId,
        patch: ConnectorPatch,
        swap: bool,
    ) -> Result<UpdateOutcome> {
        let Some(_guard) = self.begin(id, GuardKind::Updating) else {
            debug!(connector = %id, "update already in flight, skipping");
            return Ok(UpdateOutcome::Skipped);
        };

        let Some(mut record) = self.get(id) else {
            return Ok(UpdateOutcome::Purged);
        };
        if swap {
            record.swap_endpoints();
        }

        let path_node = self.host.find_node(id).await;
        let start_node = self.host.find_node(&record.start_node_id).await;
        let end_node = self.host.find_node(&record.end_node_id).await;

        let resolved = match (path_node, start_node, end_node) {
            (Some(_), Some(start), Some(end)) => match (start.bounds, end.bounds) {
                (Some(a), Some(b)) => Some((start.name, a, end.name, b)),
                _ => None,
            },
            _ => None,
        };
        let Some((start_name, a, end_name, b)) = resolved else {
            debug!(connector = %id, "path or endpoint missing, purging");
            self.remove(id).await;
            return Ok(UpdateOutcome::Purged);
        };

        let style = patch.style.apply(&record.style);
        let geometry = patch.geometry.apply(&record.geometry);
        let requested = patch.direction.unwrap_or(record.direction);
        let direction = reconcile_direction(requested, &a, &b);
        if direction != requested {
            debug!(connector = %id, %requested, %direction, "direction corrected");
        }
        let path = build_path(&a, &b, &geometry, direction)?;

        let text = match patch.text {
            Some(text) if text.is_empty() => None,
            Some(text) => Some(ConnectorText {
                text,
                font_size: record
                    .text
                    .as_ref()
                    .map(|t| t.font_size)
                    .unwrap_or(self.config.label_font_size),
            }),
            None => record.text.clone(),
        };

        let mut next = Connector {
            direction,
            geometry,
            style,
            name: ConnectorNames {
                start_name,
                end_name,
            },
            position: EndpointPositions { start: a, end: b },
            text,
            ..record
        };

        let name = next.display_name(&self.config.label_prefix);
        self.host.commit_path(id, &path, &style, &name).await?;

        // The record follows the committed path even if the label fails below.
        if !self.store_record(&next) {
            return Ok(UpdateOutcome::Purged);
        }

        let label = reconcile_label(&*self.host, &next, &path.anchors).await?;
        next.text_node_id = label.text_node_id;
        next.text = label.text;

        if !self.store_record(&next) {
            // Removed while the label was being written.
            if let Some(label_id) = &next.text_node_id {
                let _ = self.host.remove_node(label_id).await;
            }
            return Ok(UpdateOutcome::Purged);
        }

        debug!(connector = %id, %direction, "updated connector");
        Ok(UpdateOutcome::Updated(next))
    }

    /// Overwrite the stored record if the connector is still registered.
    fn store_record(&self, connector: &Connector) -> bool {
        let mut state = self.state.borrow_mut();
        match state.connectors.get_mut(&connector.id) {
            Some(slot) => {
                *slot = connector.clone();
                true
            }
            None => false,
        }
    }

    /// Remove a connector with its path and label.
    ///
    /// Returns `true` if a record was removed. Calling this again while the
    /// first removal is still running, or after it finished, is a no-op.
    pub async fn remove(&self, id: &NodeId) -> bool {
        let Some(guard) = self.begin(id, GuardKind::Removing) else {
            return false;
        };

        let record = self.state.borrow_mut().connectors.shift_remove(id);
        self.dispose(id, record.as_ref()).await;
        drop(guard);

        record.is_some()
    }

    /// Drop a record immediately and clean up its scene nodes in a
    /// background task.
    ///
    /// Must be called from within a [`tokio::task::LocalSet`].
    pub fn remove_in_background(&self, id: &NodeId) -> bool {
        let Some(guard) = self.begin(id, GuardKind::Removing) else {
            return false;
        };

        let record = self.state.borrow_mut().connectors.shift_remove(id);
        let Some(record) = record else {
            return false;
        };

        let store = self.clone();
        let id = id.clone();
        tokio::task::spawn_local(async move {
            store.dispose(&id, Some(&record)).await;
            drop(guard);
        });
        true
    }

    async fn dispose(&self, id: &NodeId, record: Option<&Connector>) {
        if let Err(err) = self.host.remove_node(id).await {
            warn!(connector = %id, error = %err, "failed to remove connector path");
        }
        if let Some(label_id) = record.and_then(|c| c.text_node_id.as_ref()) {
            if let Err(err) = self.host.remove_node(label_id).await {
                warn!(connector = %id, label = %label_id, error = %err, "failed to remove label");
            }
        }
        debug!(connector = %id, "removed connector");
    }

    /// Forget the label of `connector_id` after the label node was deleted.
    pub fn clear_label(&self, connector_id: &NodeId) -> bool {
        let mut state = self.state.borrow_mut();
        match state.connectors.get_mut(connector_id) {
            Some(connector) if connector.text_node_id.is_some() => {
                connector.text_node_id = None;
                connector.text = None;
                true
            }
            _ => false,
        }
    }

    /// Remove every connector whose path or endpoints no longer exist.
    ///
    /// Returns the number of connectors removed.
    pub async fn sweep(&self) -> usize {
        let mut removed = 0;
        for connector in self.connectors() {
            let alive = self.host.find_node(&connector.id).await.is_some()
                && self.host.find_node(&connector.start_node_id).await.is_some()
                && self.host.find_node(&connector.end_node_id).await.is_some();
            if !alive && self.remove(&connector.id).await {
                removed += 1;
            }
        }
        if removed > 0 {
            info!(removed, "swept stale connectors");
        }
        removed
    }
}

fn with_bounds(id: &NodeId, node: Option<SceneNode>) -> Result<(SceneNode, Rect)> {
    let node = node.ok_or_else(|| ConnectorError::NotFound(id.clone()))?;
    let bounds = node.bounds.ok_or_else(|| ConnectorError::NotFound(id.clone()))?;
    Ok((node, bounds))
}
