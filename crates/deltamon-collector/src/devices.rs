//! Enumeration of network interfaces and block devices.

use crate::procfs::ProcRoot;
use deltamon_common::SourceFault;

/// Interface names from `/proc/net/dev`, in file order.
pub fn list_nics(root: &ProcRoot) -> Result<Vec<String>, SourceFault> {
    let content = root.read("/proc/net/dev")?;
    Ok(content
        .lines()
        .skip(2)
        .filter_map(|line| line.split_once(':'))
        .map(|(name, _)| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}

/// Block device names from `/proc/partitions`, partitions included.
pub fn list_disks(root: &ProcRoot) -> Result<Vec<String>, SourceFault> {
    let content = root.read("/proc/partitions")?;
    Ok(content
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            // major minor #blocks name
            match fields.as_slice() {
                [major, _, _, name] if major.parse::<u32>().is_ok() => Some(name.to_string()),
                _ => None,
            }
        })
        .collect())
}

/// Heuristic for whole physical disks versus partitions and virtual devices.
pub fn is_whole_disk(name: &str) -> bool {
    const VIRTUAL: [&str; 8] = ["loop", "ram", "dm-", "md", "zram", "sr", "fd", "nbd"];
    if VIRTUAL.iter().any(|prefix| name.starts_with(prefix)) {
        return false;
    }
    if name.starts_with("nvme") || name.starts_with("mmcblk") {
        return !name.contains('p');
    }
    !name.chars().last().is_some_and(|c| c.is_ascii_digit())
}
