//! Change reconciliation for scene mutations.
//!
//! This module provides [`ReconciliationPipeline`], which turns the host's
//! mutation notifications into connector updates.
//!
//! - Property changes are matched against connector endpoints, including
//!   changes nested anywhere inside an endpoint. Affected connector ids are
//!   collected in a pending set and flushed once the scene has been quiet for
//!   the configured debounce period.
//! - Deletions are handled immediately: a deleted label is unlinked, a
//!   deleted endpoint (or an ancestor of one) removes the connector.
//! - Changes to the connectors' own paths are ignored, otherwise every
//!   geometry write would trigger another update.
//!
//! # Example
//!
//! ```ignore
//! use slint_node_connectors::{ConnectorStore, ReconciliationPipeline};
//!
//! let pipeline = ReconciliationPipeline::new(store.clone());
//!
//! // Wire up the host notification (one-time setup)
//! scene.on_document_change(pipeline.change_callback());
//! ```

use crate::debounce::Debouncer;
use crate::host::{ChangeKind, SceneChange};
use crate::model::{ConnectorPatch, NodeId};
use crate::store::{ConnectorStore, UpdateOutcome};
use indexmap::IndexSet;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

struct PipelineInner {
    store: ConnectorStore,
    pending: RefCell<IndexSet<NodeId>>,
    debouncer: Debouncer,
    attached: Cell<bool>,
}

/// Debounced reconciliation of connectors against scene changes.
///
/// Clone this pipeline to share it across callbacks. All methods must be
/// called from within a [`tokio::task::LocalSet`].
#[derive(Clone)]
pub struct ReconciliationPipeline {
    inner: Rc<PipelineInner>,
}

impl ReconciliationPipeline {
    /// Create an attached pipeline for `store`, using the store's debounce
    /// period.
    pub fn new(store: ConnectorStore) -> Self {
        let debouncer = Debouncer::new(store.config().debounce());
        Self {
            inner: Rc::new(PipelineInner {
                store,
                pending: RefCell::new(IndexSet::new()),
                debouncer,
                attached: Cell::new(true),
            }),
        }
    }

    pub fn store(&self) -> &ConnectorStore {
        &self.inner.store
    }

    /// Get a callback for host change notifications.
    ///
    /// The callback holds a weak reference; once the pipeline is dropped
    /// it does nothing.
    pub fn change_callback(&self) -> impl Fn(&[SceneChange]) + Clone {
        let inner = Rc::downgrade(&self.inner);
        move |changes| {
            if let Some(inner) = inner.upgrade() {
                ReconciliationPipeline { inner }.handle_changes(changes);
            }
        }
    }

    /// Whether notifications are currently processed.
    pub fn is_attached(&self) -> bool {
        self.inner.attached.get()
    }

    /// Stop processing notifications and drop queued work.
    pub fn detach(&self) {
        self.inner.attached.set(false);
        self.inner.debouncer.cancel();
        self.inner.pending.borrow_mut().clear();
    }

    /// Connector ids waiting for the next flush, in arrival order.
    pub fn pending_ids(&self) -> Vec<NodeId> {
        self.inner.pending.borrow().iter().cloned().collect()
    }

    /// Whether a flush is scheduled.
    pub fn is_flush_scheduled(&self) -> bool {
        self.inner.debouncer.is_armed()
    }

    /// Process one host notification.
    pub fn handle_changes(&self, changes: &[SceneChange]) {
        if !self.is_attached() {
            return;
        }

        let mut queued = false;
        for change in changes {
            match change.kind {
                ChangeKind::PropertyChange => queued |= self.queue_affected(&change.node_id),
                ChangeKind::Delete => self.handle_deletion(&change.node_id),
            }
        }

        if queued {
            self.schedule_flush();
        }
    }

    /// Run the pending updates now instead of waiting for the quiet period.
    pub fn flush_now(&self) {
        self.inner.debouncer.cancel();
        flush(&self.inner);
    }

    fn affected_ids(&self, node_id: &NodeId) -> HashSet<NodeId> {
        let mut ids: HashSet<NodeId> = self
            .inner
            .store
            .host()
            .descendant_ids(node_id)
            .into_iter()
            .collect();
        ids.insert(node_id.clone());
        ids
    }

    fn queue_affected(&self, node_id: &NodeId) -> bool {
        let store = &self.inner.store;
        if store.is_connector(node_id) {
            return false;
        }

        let affected = store.connectors_touching(&self.affected_ids(node_id));
        if affected.is_empty() {
            return false;
        }

        debug!(node = %node_id, count = affected.len(), "queued connector updates");
        self.inner.pending.borrow_mut().extend(affected);
        true
    }

    fn handle_deletion(&self, node_id: &NodeId) {
        let store = &self.inner.store;
        let deleted = self.affected_ids(node_id);

        for connector in store.connectors() {
            if connector.text_node_id.as_ref() == Some(node_id) {
                debug!(connector = %connector.id, label = %node_id, "label deleted");
                store.clear_label(&connector.id);
                continue;
            }

            let endpoint_gone = deleted.contains(&connector.start_node_id)
                || deleted.contains(&connector.end_node_id);
            if endpoint_gone || &connector.id == node_id {
                debug!(
                    connector = %connector.id,
                    node = %node_id,
                    "endpoint deleted, removing connector"
                );
                self.inner.pending.borrow_mut().shift_remove(&connector.id);
                store.remove_in_background(&connector.id);
            }
        }
    }

    fn schedule_flush(&self) {
        let inner = Rc::downgrade(&self.inner);
        self.inner.debouncer.arm(move || {
            if let Some(inner) = inner.upgrade() {
                flush(&inner);
            }
        });
    }
}

fn flush(inner: &Rc<PipelineInner>) {
    let ids: Vec<NodeId> = inner.pending.borrow_mut().drain(..).collect();
    if ids.is_empty() {
        return;
    }
    debug!(count = ids.len(), "flushing connector updates");

    for id in ids {
        let store = inner.store.clone();
        let weak = Rc::downgrade(inner);
        tokio::task::spawn_local(async move {
            match store.update(&id, ConnectorPatch::default()).await {
                Ok(UpdateOutcome::Skipped) => requeue(&weak, id),
                Ok(_) => {}
                Err(err) => warn!(connector = %id, error = %err, "connector update failed"),
            }
        });
    }
}

// A skipped update may have read endpoint bounds from before this change.
fn requeue(inner: &Weak<PipelineInner>, id: NodeId) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    if !inner.attached.get() || !inner.store.is_connector(&id) {
        return;
    }
    inner.pending.borrow_mut().insert(id);
    let pipeline = ReconciliationPipeline { inner };
    pipeline.schedule_flush();
}
