//! Connector label reconciliation.
//!
//! Labels are only ever created, updated or removed here, during an update
//! pass. Creating a connector with text does not create the label directly;
//! the first update after creation does.

use crate::color::contrasting_text_color;
use crate::direction::Anchors;
use crate::error::Result;
use crate::host::{LabelSpec, SceneHost};
use crate::model::{Connector, ConnectorText, NodeId};
use tracing::debug;

/// Label fields to write back into the record.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelState {
    pub text_node_id: Option<NodeId>,
    pub text: Option<ConnectorText>,
}

/// Bring the label of `connector` in line with its text.
///
/// - label present, text non-empty: update content, colours and position
/// - label present, text empty: remove the label
/// - no label, text non-empty: create one under the nearest shared ancestor
///   of both endpoints
///
/// A recorded label that the host no longer knows is recreated.
pub async fn reconcile_label(
    host: &dyn SceneHost,
    connector: &Connector,
    anchors: &Anchors,
) -> Result<LabelState> {
    let text = connector.text.as_ref().filter(|t| !t.text.is_empty());

    let Some(text) = text else {
        if let Some(label_id) = &connector.text_node_id {
            debug!(connector = %connector.id, label = %label_id, "removing empty label");
            host.remove_node(label_id).await?;
        }
        return Ok(LabelState {
            text_node_id: None,
            text: None,
        });
    };

    let spec = label_spec(connector, text, anchors);

    if let Some(label_id) = &connector.text_node_id {
        if host.find_node(label_id).await.is_some() {
            host.update_label(label_id, &spec).await?;
            return Ok(LabelState {
                text_node_id: Some(label_id.clone()),
                text: Some(text.clone()),
            });
        }
        debug!(connector = %connector.id, label = %label_id, "label vanished, recreating");
    }

    let parent = nearest_shared_ancestor(host, &connector.start_node_id, &connector.end_node_id);
    let label_id = host.create_label(parent.as_ref(), &spec).await?;
    debug!(connector = %connector.id, label = %label_id, "created label");

    Ok(LabelState {
        text_node_id: Some(label_id),
        text: Some(text.clone()),
    })
}

fn label_spec(connector: &Connector, text: &ConnectorText, anchors: &Anchors) -> LabelSpec {
    LabelSpec {
        text: text.text.clone(),
        font_size: text.font_size,
        center: anchors.midpoint(),
        background: connector.style.color,
        foreground: contrasting_text_color(connector.style.color),
    }
}

/// Closest node that contains both `a` and `b`; `None` means the page.
pub fn nearest_shared_ancestor(host: &dyn SceneHost, a: &NodeId, b: &NodeId) -> Option<NodeId> {
    let b_ancestors = host.ancestor_ids(b);
    host.ancestor_ids(a)
        .into_iter()
        .find(|candidate| b_ancestors.contains(candidate))
}
