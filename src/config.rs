//! Engine configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```ignore
//! let config = ConnectorConfig::from_json(r#"{ "debounce_ms": 250 }"#)?;
//! assert_eq!(config.label_prefix, "Connector");
//! ```

use crate::error::Result;
use crate::model::{ConnectorGeometry, ConnectorStyle};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Quiet period before queued reconciliations run.
    pub debounce_ms: u64,
    /// First word of every connector's display name.
    pub label_prefix: String,
    /// Page storage key holding the serialized registry.
    pub storage_key: String,
    /// Style for newly drawn connectors.
    pub default_style: ConnectorStyle,
    /// Routing parameters for newly drawn connectors.
    pub default_geometry: ConnectorGeometry,
    /// Font size for new labels.
    pub label_font_size: f32,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            label_prefix: "Connector".to_owned(),
            storage_key: "connectors".to_owned(),
            default_style: ConnectorStyle::default(),
            default_geometry: ConnectorGeometry::default(),
            label_font_size: 12.0,
        }
    }
}

impl ConnectorConfig {
    /// Parse a JSON config, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.default_style = config.default_style.clamped();
        config.default_geometry = config.default_geometry.clamped();
        Ok(config)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Set the debounce quiet period (default: 100ms).
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = debounce.as_millis() as u64;
        self
    }

    /// Set the display name prefix (default: `"Connector"`).
    pub fn with_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = prefix.into();
        self
    }

    /// Set the page storage key (default: `"connectors"`).
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }
}
