//! Common test utilities for integration tests.

#![allow(dead_code)]

pub mod harness;

use slint_node_connectors::NodeId;
use std::cell::RefCell;
use std::rc::Rc;

/// Tracks host calls for testing.
///
/// Each field records calls to the corresponding scene primitive with their
/// arguments.
#[derive(Default, Clone)]
pub struct CallTracker {
    /// (path_id,)
    pub create_path: Rc<RefCell<Vec<NodeId>>>,
    /// (path_id,)
    pub mark_connector: Rc<RefCell<Vec<NodeId>>>,
    /// (path_id, display name)
    pub commit_path: Rc<RefCell<Vec<(NodeId, String)>>>,
    /// (label_id, parent)
    pub create_label: Rc<RefCell<Vec<(NodeId, Option<NodeId>)>>>,
    /// (label_id, text)
    pub update_label: Rc<RefCell<Vec<(NodeId, String)>>>,
    /// (node_id,)
    pub remove_node: Rc<RefCell<Vec<NodeId>>>,
    /// Notices shown to the user
    pub notices: Rc<RefCell<Vec<String>>>,
}

impl CallTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commits for one path.
    pub fn commits_for(&self, id: &NodeId) -> usize {
        self.commit_path
            .borrow()
            .iter()
            .filter(|(path, _)| path == id)
            .count()
    }

    /// Clear all recorded calls.
    pub fn clear(&self) {
        self.create_path.borrow_mut().clear();
        self.mark_connector.borrow_mut().clear();
        self.commit_path.borrow_mut().clear();
        self.create_label.borrow_mut().clear();
        self.update_label.borrow_mut().clear();
        self.remove_node.borrow_mut().clear();
        self.notices.borrow_mut().clear();
    }
}
