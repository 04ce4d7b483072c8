use crate::procfs::{parse_u64, ProcRoot};
use crate::CounterSource;
use deltamon_common::{MonitorError, Result, SourceFault};

const PROC_MEMINFO: &str = "/proc/meminfo";
const RESOURCE: &str = "memory";

/// Memory pool sizes in kB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total_kb: u64,
    pub free_kb: u64,
    pub available_kb: u64,
    pub buffers_kb: u64,
    pub cached_kb: u64,
}

/// Reads `/proc/meminfo`.
#[derive(Debug, Clone, Default)]
pub struct ProcMeminfo {
    root: ProcRoot,
}

impl ProcMeminfo {
    pub fn new(root: ProcRoot) -> Self {
        Self { root }
    }
}

impl CounterSource for ProcMeminfo {
    type Counters = MemoryInfo;

    fn resource(&self) -> &str {
        RESOURCE
    }

    fn read(&mut self) -> Result<MemoryInfo> {
        let content = self
            .root
            .read(PROC_MEMINFO)
            .map_err(|fault| MonitorError::unavailable(RESOURCE, fault))?;
        parse_meminfo(&content, &self.root.path(PROC_MEMINFO))
            .map_err(|fault| MonitorError::unavailable(RESOURCE, fault))
    }
}

fn parse_meminfo(
    content: &str,
    path: &std::path::Path,
) -> std::result::Result<MemoryInfo, SourceFault> {
    let value = |key: &str| -> std::result::Result<u64, SourceFault> {
        let rest = content
            .lines()
            .find_map(|line| line.strip_prefix(key)?.strip_prefix(':'))
            .ok_or_else(|| SourceFault::Missing {
                what: key.to_string(),
                path: path.to_path_buf(),
            })?;
        parse_u64(rest.split_whitespace().next(), path, key)
    };

    Ok(MemoryInfo {
        total_kb: value("MemTotal")?,
        free_kb: value("MemFree")?,
        available_kb: value("MemAvailable")?,
        buffers_kb: value("Buffers")?,
        cached_kb: value("Cached")?,
    })
}
