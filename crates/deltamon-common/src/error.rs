use std::path::PathBuf;

/// Errors surfaced by sources, engines and monitors.
///
/// Engines and monitors hand these back unchanged; a failed tick never leaves
/// partially updated metrics behind.
///
/// # Examples
///
/// ```rust
/// use deltamon_common::error::{MonitorError, SourceFault};
///
/// let err = MonitorError::unavailable("eth0", SourceFault::Missing {
///     what: "interface eth0".to_string(),
///     path: "/proc/net/dev".into(),
/// });
/// assert!(err.is_source_unavailable());
/// assert!(err.to_string().contains("eth0"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The backing counters could not be read or parsed this tick.
    #[error("{resource}: source unavailable: {cause}")]
    SourceUnavailable {
        resource: String,
        #[source]
        cause: SourceFault,
    },

    /// Invalid identifier or unit index supplied at construction time.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

/// Why a source read failed.
#[derive(Debug, thiserror::Error)]
pub enum SourceFault {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no entry for {what} in {}", path.display())]
    Missing { what: String, path: PathBuf },

    #[error("malformed data in {}: {detail}", path.display())]
    Malformed { path: PathBuf, detail: String },
}

impl MonitorError {
    pub fn unavailable(resource: impl Into<String>, cause: SourceFault) -> Self {
        Self::SourceUnavailable {
            resource: resource.into(),
            cause,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }
}

/// Convenience `Result` alias for monitoring operations.
pub type Result<T> = std::result::Result<T, MonitorError>;
