//! Error types shared by the store, resolver and pipeline.

use crate::model::NodeId;
use crate::validation::ValidationError;

/// Failure reported by a [`SceneHost`](crate::host::SceneHost) primitive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("scene node {0} not found")]
    NodeMissing(NodeId),
    #[error("scene operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// Creation preconditions unmet. Shown to the user, nothing changes.
    #[error("cannot create connector: {0}")]
    Validation(#[from] ValidationError),
    /// Record or backing node missing.
    #[error("connector {0} not found")]
    NotFound(NodeId),
    /// An invalid direction or line style reached the path builder.
    #[error("invalid connector configuration: {0}")]
    Configuration(String),
    #[error("connector data is corrupt: {0}")]
    Persistence(#[from] serde_json::Error),
    #[error(transparent)]
    Host(#[from] HostError),
}

impl ConnectorError {
    /// Whether the error should be surfaced to the user as a notice.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, ConnectorError>;
