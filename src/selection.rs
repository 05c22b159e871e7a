use crate::model::NodeId;
use indexmap::IndexSet;

/// Tracks what the user has selected on the canvas.
///
/// A selection is either a set of candidate endpoint nodes, kept in the order
/// they were selected (the first becomes the start of a new connector), or a
/// single connector. Selecting a connector's label counts as selecting the
/// connector.
#[derive(Debug, Default, Clone)]
pub struct SelectionTracker {
    endpoints: IndexSet<NodeId>,
    connector: Option<NodeId>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a click on a plain node based on interaction modifiers
    pub fn handle_interaction(&mut self, id: NodeId, shift_held: bool) {
        self.connector = None;
        if shift_held {
            if !self.endpoints.shift_remove(&id) {
                self.endpoints.insert(id);
            }
        } else {
            if self.endpoints.len() == 1 && self.endpoints.contains(&id) {
                return;
            }
            self.endpoints.clear();
            self.endpoints.insert(id);
        }
    }

    /// Replace the selection with the host's current selection.
    ///
    /// `owner_of` maps a node to the connector it belongs to (the connector
    /// itself or its label). A single such node selects that connector;
    /// anything else is treated as candidate endpoints.
    pub fn replace_selection<I, F>(&mut self, ids: I, owner_of: F)
    where
        I: IntoIterator<Item = NodeId>,
        F: Fn(&NodeId) -> Option<NodeId>,
    {
        let ids: IndexSet<NodeId> = ids.into_iter().collect();
        self.endpoints.clear();
        self.connector = None;

        if ids.len() == 1 {
            if let Some(owner) = ids.first().and_then(&owner_of) {
                self.connector = Some(owner);
                return;
            }
        }
        self.endpoints = ids;
    }

    /// Clear the current selection
    pub fn clear(&mut self) {
        self.endpoints.clear();
        self.connector = None;
    }

    /// The selected connector, if the selection is one.
    pub fn connector(&self) -> Option<&NodeId> {
        self.connector.as_ref()
    }

    /// Start and end for a new connector; exactly two nodes must be selected.
    pub fn endpoints(&self) -> Option<(&NodeId, &NodeId)> {
        match (self.endpoints.len(), self.endpoints.first(), self.endpoints.last()) {
            (2, Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.endpoints.contains(id) || self.connector.as_ref() == Some(id)
    }

    /// Selected candidate endpoints in selection order
    pub fn iter(&self) -> indexmap::set::Iter<'_, NodeId> {
        self.endpoints.iter()
    }

    /// Forget `id` wherever it appears, e.g. after it was deleted.
    pub fn forget(&mut self, id: &NodeId) {
        self.endpoints.shift_remove(id);
        if self.connector.as_ref() == Some(id) {
            self.connector = None;
        }
    }

    pub fn len(&self) -> usize {
        self.endpoints.len() + usize::from(self.connector.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty() && self.connector.is_none()
    }
}
