// ============================================================================
// Connector Validation
// ============================================================================

use crate::direction::classify_relative_position;
use crate::geometry::Rect;
use crate::host::SceneNode;
use crate::model::NodeId;
use std::fmt;

/// Result of connector validation with optional rejection reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Connector can be created
    Valid,
    /// Connector cannot be created, with a reason
    Invalid(ValidationError),
}

impl ValidationResult {
    /// Check if the result is valid
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Combine two results (AND logic): returns first error if any
    pub fn and(self, other: ValidationResult) -> ValidationResult {
        match self {
            ValidationResult::Valid => other,
            invalid => invalid,
        }
    }

    /// Convert into a `Result`, for use with `?`.
    pub fn into_result(self) -> Result<(), ValidationError> {
        match self {
            ValidationResult::Valid => Ok(()),
            ValidationResult::Invalid(err) => Err(err),
        }
    }
}

/// Reasons why a connector cannot be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Endpoint does not exist or has no absolute bounds
    BoundsUnavailable(NodeId),
    /// Both endpoints are the same node
    SameNode,
    /// Endpoints overlap or sit within the clearance margin
    TooClose,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BoundsUnavailable(id) => write!(f, "Node {} has no position on the canvas", id),
            Self::SameNode => write!(f, "Select two different nodes"),
            Self::TooClose => write!(f, "Nodes are too close to route a connector"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check whether a connector from `start` to `end` can be drawn.
///
/// `None` stands for a node the host could not find.
///
/// # Example
///
/// ```ignore
/// let start = host.find_node(&start_id).await;
/// let end = host.find_node(&end_id).await;
///
/// match validate_endpoints(&start_id, start.as_ref(), &end_id, end.as_ref()) {
///     ValidationResult::Valid => { /* create connector */ }
///     ValidationResult::Invalid(err) => host.notify(&err.to_string()),
/// }
/// ```
pub fn validate_endpoints(
    start_id: &NodeId,
    start: Option<&SceneNode>,
    end_id: &NodeId,
    end: Option<&SceneNode>,
) -> ValidationResult {
    let start_bounds = start.and_then(|n| n.bounds);
    let end_bounds = end.and_then(|n| n.bounds);

    let routing = match (start_bounds, end_bounds) {
        (Some(a), Some(b)) => routable(&a, &b),
        _ => ValidationResult::Valid,
    };

    positioned(start_id, start_bounds)
        .and(positioned(end_id, end_bounds))
        .and(distinct(start_id, end_id))
        .and(routing)
}

fn positioned(id: &NodeId, bounds: Option<Rect>) -> ValidationResult {
    match bounds {
        Some(_) => ValidationResult::Valid,
        None => ValidationResult::Invalid(ValidationError::BoundsUnavailable(id.clone())),
    }
}

fn distinct(start_id: &NodeId, end_id: &NodeId) -> ValidationResult {
    if start_id == end_id {
        ValidationResult::Invalid(ValidationError::SameNode)
    } else {
        ValidationResult::Valid
    }
}

fn routable(a: &Rect, b: &Rect) -> ValidationResult {
    if classify_relative_position(a, b).is_unroutable() {
        ValidationResult::Invalid(ValidationError::TooClose)
    } else {
        ValidationResult::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, bounds: Option<Rect>) -> SceneNode {
        SceneNode {
            id: id.into(),
            name: id.to_uppercase(),
            bounds,
            parent: None,
        }
    }

    #[test]
    fn test_accepts_separated_nodes() {
        let a = node("a", Some(Rect::new(0.0, 0.0, 100.0, 50.0)));
        let b = node("b", Some(Rect::new(300.0, 0.0, 100.0, 50.0)));
        let result = validate_endpoints(&a.id, Some(&a), &b.id, Some(&b));
        assert!(result.is_valid());
    }

    #[test]
    fn test_rejects_missing_node() {
        let a = node("a", Some(Rect::new(0.0, 0.0, 100.0, 50.0)));
        let missing = NodeId::from("gone");
        let result = validate_endpoints(&a.id, Some(&a), &missing, None);
        assert_eq!(
            result,
            ValidationResult::Invalid(ValidationError::BoundsUnavailable(missing))
        );
    }

    #[test]
    fn test_rejects_node_without_bounds() {
        let a = node("a", None);
        let b = node("b", Some(Rect::new(300.0, 0.0, 100.0, 50.0)));
        let result = validate_endpoints(&a.id, Some(&a), &b.id, Some(&b));
        assert_eq!(
            result,
            ValidationResult::Invalid(ValidationError::BoundsUnavailable(a.id.clone()))
        );
    }

    #[test]
    fn test_missing_start_reported_before_missing_end() {
        let start = NodeId::from("gone");
        let end = NodeId::from("also-gone");
        let result = validate_endpoints(&start, None, &end, None);
        assert_eq!(
            result,
            ValidationResult::Invalid(ValidationError::BoundsUnavailable(start))
        );
    }

    #[test]
    fn test_rejects_same_node() {
        let a = node("a", Some(Rect::new(0.0, 0.0, 100.0, 50.0)));
        let result = validate_endpoints(&a.id, Some(&a), &a.id, Some(&a));
        assert_eq!(result, ValidationResult::Invalid(ValidationError::SameNode));
    }

    #[test]
    fn test_rejects_overlapping_nodes() {
        let a = node("a", Some(Rect::new(0.0, 0.0, 100.0, 50.0)));
        let b = node("b", Some(Rect::new(50.0, 20.0, 100.0, 50.0)));
        let result = validate_endpoints(&a.id, Some(&a), &b.id, Some(&b));
        assert_eq!(result, ValidationResult::Invalid(ValidationError::TooClose));
    }

    #[test]
    fn test_and_returns_first_error() {
        let result = ValidationResult::Valid
            .and(ValidationResult::Invalid(ValidationError::SameNode))
            .and(ValidationResult::Invalid(ValidationError::TooClose));
        assert_eq!(result, ValidationResult::Invalid(ValidationError::SameNode));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::TooClose.to_string(),
            "Nodes are too close to route a connector"
        );
        assert_eq!(
            ValidationError::BoundsUnavailable("1:2".into()).to_string(),
            "Node 1:2 has no position on the canvas"
        );
    }
}
