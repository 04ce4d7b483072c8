use crate::devices;
use crate::procfs::{leading_u64, parse_u64, ProcRoot};
use crate::CounterSource;
use deltamon_common::{MonitorError, Result, SourceFault};

const PROC_DISKSTATS: &str = "/proc/diskstats";

/// Cumulative I/O counters of one block device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskCounters {
    pub read_count: u64,
    pub read_sectors: u64,
    pub write_count: u64,
    pub write_sectors: u64,
    pub sector_size: u64,
}

impl DiskCounters {
    pub fn read_bytes(&self) -> u64 {
        self.read_sectors.saturating_mul(self.sector_size)
    }

    pub fn write_bytes(&self) -> u64 {
        self.write_sectors.saturating_mul(self.sector_size)
    }
}

/// Reads one device's line of `/proc/diskstats`.
pub struct ProcDiskStats {
    root: ProcRoot,
    name: String,
    sector_size: u64,
}

impl ProcDiskStats {
    /// # Errors
    ///
    /// `Configuration` if `name` is not listed in `/proc/partitions` or its
    /// sector size cannot be determined.
    pub fn new(root: ProcRoot, name: &str) -> Result<Self> {
        let known = devices::list_disks(&root)
            .map_err(|e| MonitorError::config(format!("cannot list disks: {e}")))?;
        if !known.iter().any(|disk| disk == name) {
            return Err(MonitorError::config(format!(
                "{name} is not a valid disk identifier"
            )));
        }

        let sector_size = sector_size(&root, name).ok_or_else(|| {
            MonitorError::config(format!("cannot read sector size of disk {name}"))
        })?;

        Ok(Self {
            root,
            name: name.to_string(),
            sector_size,
        })
    }

    pub fn sector_size(&self) -> u64 {
        self.sector_size
    }
}

impl CounterSource for ProcDiskStats {
    type Counters = DiskCounters;

    fn resource(&self) -> &str {
        &self.name
    }

    fn read(&mut self) -> Result<DiskCounters> {
        let content = self
            .root
            .read(PROC_DISKSTATS)
            .map_err(|fault| MonitorError::unavailable(&self.name, fault))?;
        parse_diskstats(&content, &self.name, &self.root.path(PROC_DISKSTATS))
            .map(|mut counters| {
                counters.sector_size = self.sector_size;
                counters
            })
            .map_err(|fault| MonitorError::unavailable(&self.name, fault))
    }
}

fn parse_diskstats(
    content: &str,
    name: &str,
    path: &std::path::Path,
) -> std::result::Result<DiskCounters, SourceFault> {
    // major minor name reads merged sectors_read ms writes merged sectors_written ...
    let fields: Vec<&str> = content
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .find(|fields| fields.get(2) == Some(&name))
        .ok_or_else(|| SourceFault::Missing {
            what: format!("disk {name}"),
            path: path.to_path_buf(),
        })?;

    Ok(DiskCounters {
        read_count: parse_u64(fields.get(3).copied(), path, "reads completed")?,
        read_sectors: parse_u64(fields.get(5).copied(), path, "sectors read")?,
        write_count: parse_u64(fields.get(7).copied(), path, "writes completed")?,
        write_sectors: parse_u64(fields.get(9).copied(), path, "sectors written")?,
        sector_size: 0,
    })
}

/// `hw_sector_size` of the device, falling back to its parent (`sda1` → `sda`)
/// when the device's own file is absent or unreadable as a number.
fn sector_size(root: &ProcRoot, name: &str) -> Option<u64> {
    let own = format!("/sys/block/{name}/queue/hw_sector_size");
    if let Some(size) = root.read(&own).ok().and_then(|raw| leading_u64(&raw)) {
        return Some(size);
    }

    let parent: String = name.chars().take_while(|c| c.is_alphabetic()).collect();
    if parent.is_empty() || parent == name {
        return None;
    }
    let fallback = format!("/sys/block/{parent}/queue/hw_sector_size");
    tracing::debug!(disk = name, parent = %parent, "using parent device sector size");
    root.read(&fallback).ok().and_then(|raw| leading_u64(&raw))
}
