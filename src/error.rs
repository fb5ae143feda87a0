/// Errors produced by the packaging engine.
///
/// The variants map to distinct failure classes: configuration mistakes are
/// reported before any filesystem side effect, resolution failures clean up
/// their temporary resources before surfacing, and a manifest validation
/// failure indicates a template defect rather than an environment fault.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("source resolution failed: {0}")]
    Resolve(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("manifest validation failed: {0}")]
    InvalidManifest(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = PackError::Config("source is required".to_string());
        assert_eq!(err.to_string(), "invalid configuration: source is required");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PackError = io.into();
        assert!(matches!(err, PackError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_invalid_manifest_is_distinct_from_io() {
        let err = PackError::InvalidManifest("missing schemaVersion".to_string());
        assert!(!matches!(err, PackError::Io(_)));
        assert!(err.to_string().contains("manifest validation failed"));
    }
}
