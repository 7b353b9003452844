//! Domain-level error taxonomy for pagemedic.

use std::path::PathBuf;

/// Pagemedic core errors.
///
/// Page-level symptoms are never represented here; those flow through the
/// pipeline as [`crate::domain::ErrorRecord`] data. These variants cover
/// manifest/artifact handling only.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid manifest: {reason}")]
    InvalidManifest { reason: String },

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("report artifact not found: {path}")]
    ArtifactMissing { path: PathBuf },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pagemedic core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::InvalidManifest {
            reason: "duplicate id 'home'".to_string(),
        };
        assert!(err.to_string().contains("invalid manifest"));
        assert!(err.to_string().contains("duplicate id"));

        let err = CoreError::DigestMismatch {
            expected: "abc123".to_string(),
            actual: "def456".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("abc123"));
        assert!(msg.contains("def456"));
    }
}
