//! Request identity for log correlation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Request ID attached to every served HTTP request.
///
/// Format: `req-<date>-<time>-<random>`
/// Example: `req-20260115-143022-abc123`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID.
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        let random: String = uuid::Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(6)
            .collect();
        RequestId(format!("req-{}-{}", now.format("%Y%m%d-%H%M%S"), random))
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_format() {
        let id = RequestId::new();
        assert!(id.0.starts_with("req-"));
        assert_eq!(id.0.len(), "req-20260115-143022-abc123".len());
        assert!(id.0[20..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_request_ids_differ() {
        assert_ne!(RequestId::new(), RequestId::new());
    }
}
