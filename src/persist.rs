//! Page-scoped persistence of the connector registry.
//!
//! The registry is stored as one JSON array of [`Connector`] records under a
//! single storage key of the page. A missing blob means "no connectors"; a
//! blob that cannot be parsed is cleared and also treated as empty, so a
//! corrupt page never blocks the editor.

use crate::error::Result;
use crate::host::SceneHost;
use crate::model::{Connector, NodeId};
use tracing::{debug, warn};

/// Serialize connectors, in order, to a JSON array.
pub fn serialize<'a, I>(connectors: I) -> Result<String>
where
    I: IntoIterator<Item = &'a Connector>,
{
    let records: Vec<&Connector> = connectors.into_iter().collect();
    Ok(serde_json::to_string(&records)?)
}

/// Parse a JSON array of connectors.
pub fn deserialize(blob: &str) -> Result<Vec<Connector>> {
    Ok(serde_json::from_str(blob)?)
}

/// Read the registry stored on `page`.
///
/// Absent or empty blobs yield an empty list. Malformed blobs are logged,
/// cleared from storage and also yield an empty list.
pub fn load_page(host: &dyn SceneHost, page: &NodeId, key: &str) -> Vec<Connector> {
    let Some(blob) = host.storage_get(page, key) else {
        return Vec::new();
    };
    if blob.trim().is_empty() {
        return Vec::new();
    }

    match deserialize(&blob) {
        Ok(connectors) => {
            debug!(page = %page, count = connectors.len(), "loaded connectors");
            connectors
        }
        Err(err) => {
            warn!(page = %page, error = %err, "discarding corrupt connector data");
            host.storage_set(page, key, "");
            Vec::new()
        }
    }
}

/// Write the registry to `page`.
pub fn save_page<'a, I>(host: &dyn SceneHost, page: &NodeId, key: &str, connectors: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Connector>,
{
    let blob = serialize(connectors)?;
    host.storage_set(page, key, &blob);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::model::{
        ConnectorGeometry, ConnectorNames, ConnectorStyle, ConnectorText, Direction,
        EndpointPositions,
    };

    fn connector(id: &str, text: Option<&str>) -> Connector {
        Connector {
            id: id.into(),
            start_node_id: "1:1".into(),
            end_node_id: "1:2".into(),
            text_node_id: text.map(|_| NodeId::from("9:9")),
            position: EndpointPositions {
                start: Rect::new(0.0, 0.0, 100.0, 50.0),
                end: Rect::new(0.0, 200.0, 100.0, 50.0),
            },
            geometry: ConnectorGeometry::default(),
            style: ConnectorStyle::default(),
            name: ConnectorNames {
                start_name: "A".into(),
                end_name: "B".into(),
            },
            text: text.map(ConnectorText::new),
            direction: Direction::Vertical,
        }
    }

    #[test]
    fn test_round_trip_preserves_records_and_order() {
        let records = vec![connector("5:1", Some("yes")), connector("2:7", None)];
        let blob = serialize(&records).unwrap();
        let back = deserialize(&blob).unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn test_serialized_blob_is_json_array() {
        let blob = serialize(&[connector("5:1", None)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["id"], "5:1");
        assert_eq!(value[0]["start_node_id"], "1:1");
    }

    #[test]
    fn test_malformed_blob_is_error() {
        assert!(deserialize("{not json").is_err());
        assert!(deserialize(r#"[{"id": 3}]"#).is_err());
    }
}
