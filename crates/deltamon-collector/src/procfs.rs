//! Filesystem access shared by the procfs sources.

use deltamon_common::SourceFault;
use std::path::{Path, PathBuf};

/// Root under which `proc/...` and `sys/...` are resolved.
///
/// Production uses `/`; tests point it at a temporary directory holding
/// fixture files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcRoot {
    root: PathBuf,
}

impl ProcRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn host() -> Self {
        Self::new("/")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an absolute-looking path such as `/proc/stat` under this root.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel.trim_start_matches('/'))
    }

    pub fn read(&self, rel: &str) -> Result<String, SourceFault> {
        let path = self.path(rel);
        std::fs::read_to_string(&path).map_err(|source| SourceFault::Io { path, source })
    }
}

impl Default for ProcRoot {
    fn default() -> Self {
        Self::host()
    }
}

pub(crate) fn parse_u64(token: Option<&str>, path: &Path, what: &str) -> Result<u64, SourceFault> {
    let token = token.ok_or_else(|| SourceFault::Malformed {
        path: path.to_path_buf(),
        detail: format!("missing field {what}"),
    })?;
    token.parse::<u64>().map_err(|e| SourceFault::Malformed {
        path: path.to_path_buf(),
        detail: format!("field {what} = {token:?}: {e}"),
    })
}

pub(crate) fn parse_f64(token: Option<&str>, path: &Path, what: &str) -> Result<f64, SourceFault> {
    let token = token.ok_or_else(|| SourceFault::Malformed {
        path: path.to_path_buf(),
        detail: format!("missing field {what}"),
    })?;
    token.parse::<f64>().map_err(|e| SourceFault::Malformed {
        path: path.to_path_buf(),
        detail: format!("field {what} = {token:?}: {e}"),
    })
}

/// Leading decimal digits of a sysfs value such as `"512\n"`.
pub(crate) fn leading_u64(raw: &str) -> Option<u64> {
    let digits: String = raw
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
