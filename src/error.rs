use thiserror::Error;

/// Error type shared by the index, query and dispatch layers.
///
/// Malformed transport payloads never reach this type: the gateway drops
/// them before decoding completes. Everything that can fail after a request
/// has been routed is expressed here so the dispatcher can fold it into a
/// FAILED response envelope.
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("index {index_id} is corrupt: {detail}")]
    IndexCorrupt { index_id: String, detail: String },

    #[error("document {0} is indexed but missing from the metadata store")]
    MetadataMissing(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("a build for index {0} is already in progress")]
    BuildInProgress(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index cache error: {0}")]
    Cache(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for cluster operations
pub type Result<T> = std::result::Result<T, ClusterError>;

impl ClusterError {
    /// Check whether this error means the requested data simply is not
    /// there yet, as opposed to being present but unreadable.
    pub fn is_missing_data(&self) -> bool {
        match self {
            ClusterError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClusterError::UnknownAction("delete_index".to_string());
        assert_eq!(err.to_string(), "unknown action: delete_index");

        let err = ClusterError::IndexCorrupt {
            index_id: "idx1".to_string(),
            detail: "line 3: missing total separator".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "index idx1 is corrupt: line 3: missing total separator"
        );
    }

    #[test]
    fn test_missing_data_classification() {
        let missing = ClusterError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        assert!(missing.is_missing_data());
        assert!(!ClusterError::MetadataMissing("d1".to_string()).is_missing_data());
    }
}
