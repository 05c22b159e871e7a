//! High-level controller for connector tooling.
//!
//! The [`ConnectorController`] reduces boilerplate by managing the active
//! page's store, the reconciliation pipeline and the user's selection in one
//! place.
//!
//! # Example
//!
//! ```ignore
//! use slint_node_connectors::{ConnectorConfig, ConnectorController, Direction};
//!
//! let ctrl = ConnectorController::new(host.clone(), ConnectorConfig::default());
//! ctrl.activate_page(&host.current_page());
//!
//! // Scene notifications - controller routes them to the active page
//! scene.on_document_change(ctrl.change_callback());
//! scene.on_page_change({
//!     let ctrl = ctrl.clone();
//!     move |page| {
//!         let ctrl = ctrl.clone();
//!         tokio::task::spawn_local(async move { ctrl.switch_page(&page).await });
//!     }
//! });
//! scene.on_selection_change(ctrl.selection_callback());
//! scene.on_node_clicked(ctrl.click_callback());
//!
//! // User intents
//! ctrl.draw(Some("depends on".into())).await?;
//! ctrl.set_direction(Direction::Vertical).await?;
//!
//! // Before the editor closes
//! ctrl.shutdown().await?;
//! ```

use crate::config::ConnectorConfig;
use crate::error::{ConnectorError, Result};
use crate::host::{ChangeKind, SceneChange, SceneHost};
use crate::model::{
    Connector, ConnectorGeometry, ConnectorPatch, ConnectorStyle, ConnectorText, Direction, NodeId,
};
use crate::pipeline::ReconciliationPipeline;
use crate::selection::SelectionTracker;
use crate::store::{ConnectorStore, UpdateOutcome};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Notice shown when drawing without exactly two selected nodes.
pub const SELECT_TWO_NODES: &str = "Select two nodes to connect";

/// Store and pipeline of the page being edited.
struct Session {
    page: NodeId,
    store: ConnectorStore,
    pipeline: ReconciliationPipeline,
}

/// Style and routing used for the next connector that is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawDefaults {
    pub style: ConnectorStyle,
    pub geometry: ConnectorGeometry,
}

/// Controller that owns the per-page connector session and turns user
/// intents into store operations.
///
/// This provides a high-level API that handles:
/// - Page activation, switching and shutdown, persisting the registry of
///   the page being left
/// - Routing scene notifications to the active page's pipeline
/// - Selection tracking (endpoints to connect, or a selected connector)
/// - Surfacing user-facing failures through [`SceneHost::notify`]
///
/// Clone this controller to share it across callbacks.
#[derive(Clone)]
pub struct ConnectorController {
    host: Rc<dyn SceneHost>,
    config: Rc<ConnectorConfig>,
    session: Rc<RefCell<Option<Session>>>,
    selection: Rc<RefCell<SelectionTracker>>,
    defaults: Rc<RefCell<DrawDefaults>>,
}

impl ConnectorController {
    /// Create a controller with no active page.
    pub fn new(host: Rc<dyn SceneHost>, config: ConnectorConfig) -> Self {
        let defaults = DrawDefaults {
            style: config.default_style,
            geometry: config.default_geometry,
        };
        Self {
            host,
            config: Rc::new(config),
            session: Rc::new(RefCell::new(None)),
            selection: Rc::new(RefCell::new(SelectionTracker::new())),
            defaults: Rc::new(RefCell::new(defaults)),
        }
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// The page currently being edited.
    pub fn page(&self) -> Option<NodeId> {
        self.session.borrow().as_ref().map(|s| s.page.clone())
    }

    /// Store of the active page.
    pub fn store(&self) -> Option<ConnectorStore> {
        self.session.borrow().as_ref().map(|s| s.store.clone())
    }

    /// Pipeline of the active page.
    pub fn pipeline(&self) -> Option<ReconciliationPipeline> {
        self.session.borrow().as_ref().map(|s| s.pipeline.clone())
    }

    /// Snapshot of the current selection.
    pub fn selection(&self) -> SelectionTracker {
        self.selection.borrow().clone()
    }

    /// Style and routing for the next drawn connector.
    pub fn defaults(&self) -> DrawDefaults {
        *self.defaults.borrow()
    }

    // === Page lifecycle ===

    /// Load the registry of `page` and start reconciling it.
    ///
    /// Any session that is still active is dropped without saving; use
    /// [`switch_page`](Self::switch_page) to leave a page cleanly. Returns
    /// the number of connectors loaded.
    pub fn activate_page(&self, page: &NodeId) -> usize {
        let previous = self.session.borrow_mut().take();
        if let Some(previous) = previous {
            previous.pipeline.detach();
        }

        let store = ConnectorStore::load(self.host.clone(), self.config.clone(), page);
        let pipeline = ReconciliationPipeline::new(store.clone());
        let count = store.len();

        *self.session.borrow_mut() = Some(Session {
            page: page.clone(),
            store,
            pipeline,
        });
        self.selection.borrow_mut().clear();
        info!(page = %page, connectors = count, "activated page");
        count
    }

    /// Leave the active page and activate `page`.
    ///
    /// The outgoing page is swept and its registry persisted before the
    /// incoming page's registry is loaded.
    pub async fn switch_page(&self, page: &NodeId) -> usize {
        if self.page().as_ref() == Some(page) {
            return self.store().map_or(0, |s| s.len());
        }
        if let Err(err) = self.close_session().await {
            warn!(error = %err, "failed to save connectors of the previous page");
        }
        self.activate_page(page)
    }

    /// Sweep and persist the active page, then stop reconciling.
    pub async fn shutdown(&self) -> Result<()> {
        self.close_session().await
    }

    async fn close_session(&self) -> Result<()> {
        let session = self.session.borrow_mut().take();
        let Some(session) = session else {
            return Ok(());
        };
        session.pipeline.detach();
        self.selection.borrow_mut().clear();

        let removed = session.store.sweep().await;
        session.store.persist(&session.page)?;
        debug!(page = %session.page, removed, saved = session.store.len(), "closed page");
        Ok(())
    }

    // === Callback factories ===

    /// Returns a callback for scene mutation notifications.
    pub fn change_callback(&self) -> impl Fn(&[SceneChange]) + Clone {
        let ctrl = self.clone();
        move |changes| ctrl.handle_scene_changes(changes)
    }

    /// Returns a callback for host selection changes.
    pub fn selection_callback(&self) -> impl Fn(Vec<NodeId>) + Clone {
        let ctrl = self.clone();
        move |ids| ctrl.select(ids)
    }

    /// Returns a callback for clicks on canvas nodes.
    pub fn click_callback(&self) -> impl Fn(NodeId, bool) + Clone {
        let ctrl = self.clone();
        move |id, shift_held| ctrl.handle_click(id, shift_held)
    }

    // === Direct handlers ===

    /// Route a scene notification to the active page's pipeline.
    pub fn handle_scene_changes(&self, changes: &[SceneChange]) {
        {
            let mut selection = self.selection.borrow_mut();
            for change in changes.iter().filter(|c| c.kind == ChangeKind::Delete) {
                selection.forget(&change.node_id);
            }
        }
        let Some(pipeline) = self.pipeline() else {
            return;
        };
        pipeline.handle_changes(changes);

        // Deleting an endpoint evicts the selected connector too.
        let selected = self.selected_connector();
        if let Some(id) = selected {
            if !pipeline.store().is_connector(&id) {
                self.selection.borrow_mut().forget(&id);
            }
        }
    }

    /// Replace the selection with the host's current selection.
    pub fn select(&self, ids: Vec<NodeId>) {
        let store = self.store();
        self.selection.borrow_mut().replace_selection(ids, |id| {
            store.as_ref().and_then(|s| s.owning_connector(id))
        });
    }

    /// Handle a click on a canvas node.
    ///
    /// Clicking a connector or its label selects that connector. Other nodes
    /// become endpoint candidates; with shift held they are toggled in and
    /// out of the current candidates.
    pub fn handle_click(&self, id: NodeId, shift_held: bool) {
        let owner = self.store().and_then(|s| s.owning_connector(&id));
        let mut selection = self.selection.borrow_mut();
        match owner {
            Some(connector) => selection.replace_selection([connector], |id| Some(id.clone())),
            None => selection.handle_interaction(id, shift_held),
        }
    }

    // === Intents ===

    /// Draw a connector between the two selected nodes, in selection order.
    ///
    /// Returns `Ok(None)` and shows a notice when the selection is not
    /// exactly two nodes. The new connector becomes the selection.
    pub async fn draw(&self, text: Option<String>) -> Result<Option<Connector>> {
        let endpoints = self
            .selection
            .borrow()
            .endpoints()
            .map(|(start, end)| (start.clone(), end.clone()));
        let Some((start, end)) = endpoints else {
            self.host.notify(SELECT_TWO_NODES);
            return Ok(None);
        };
        let store = self.active_store()?;

        let defaults = self.defaults();
        let text = text.filter(|t| !t.is_empty()).map(|text| ConnectorText {
            text,
            font_size: self.config.label_font_size,
        });
        let created = store
            .create(&start, &end, defaults.style, defaults.geometry, text)
            .await;
        let connector = self.surface(created)?;

        // The first update materialises the label.
        let updated = store.update(&connector.id, ConnectorPatch::default()).await;
        let connector = match self.surface(updated)? {
            UpdateOutcome::Updated(connector) => connector,
            _ => connector,
        };

        self.select(vec![connector.id.clone()]);
        Ok(Some(connector))
    }

    /// Swap start and end of the selected connector.
    pub async fn flip_selected(&self) -> Result<Option<UpdateOutcome>> {
        let Some(id) = self.selected_connector() else {
            return Ok(None);
        };
        let store = self.active_store()?;
        let flipped = store.flip(&id).await;
        self.surface(flipped).map(Some)
    }

    /// Ask the selected connector to route along `direction`.
    ///
    /// The request is kept only while the endpoints allow it.
    pub async fn set_direction(&self, direction: Direction) -> Result<Option<UpdateOutcome>> {
        if direction == Direction::Invalid {
            let err =
                ConnectorError::Configuration("cannot route along an invalid direction".into());
            return self.surface(Err(err));
        }
        self.apply_patch(ConnectorPatch::default().with_direction(direction))
            .await
    }

    /// Apply a style, routing or text change.
    ///
    /// Style and routing changes also become the defaults for the next drawn
    /// connector. Without a selected connector nothing else happens.
    pub async fn apply_patch(&self, patch: ConnectorPatch) -> Result<Option<UpdateOutcome>> {
        {
            let mut defaults = self.defaults.borrow_mut();
            defaults.style = patch.style.apply(&defaults.style);
            defaults.geometry = patch.geometry.apply(&defaults.geometry);
        }

        let Some(id) = self.selected_connector() else {
            return Ok(None);
        };
        let store = self.active_store()?;
        let updated = store.update(&id, patch).await;
        let outcome = self.surface(updated)?;
        if outcome == UpdateOutcome::Purged {
            self.selection.borrow_mut().forget(&id);
        }
        Ok(Some(outcome))
    }

    /// Remove the selected connector with its label.
    pub async fn remove_selected(&self) -> bool {
        let Some(id) = self.selected_connector() else {
            return false;
        };
        let Some(store) = self.store() else {
            return false;
        };
        self.selection.borrow_mut().forget(&id);
        store.remove(&id).await
    }

    /// Remove connectors whose path or endpoints are gone.
    pub async fn sweep(&self) -> usize {
        match self.store() {
            Some(store) => store.sweep().await,
            None => 0,
        }
    }

    fn selected_connector(&self) -> Option<NodeId> {
        self.selection.borrow().connector().cloned()
    }

    fn active_store(&self) -> Result<ConnectorStore> {
        self.store()
            .ok_or_else(|| ConnectorError::Configuration("no active page".into()))
    }

    /// Show user-facing failures as a notice; log the rest.
    fn surface<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if err.is_user_facing() {
                self.host.notify(&err.to_string());
            } else {
                warn!(error = %err, "connector operation failed");
            }
        }
        result
    }
}
