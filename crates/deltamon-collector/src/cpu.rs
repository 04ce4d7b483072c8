use crate::procfs::{parse_u64, ProcRoot};
use crate::CounterSource;
use deltamon_common::context::SystemContext;
use deltamon_common::{MonitorError, Result, SourceFault};

const PROC_STAT: &str = "/proc/stat";

/// Jiffies a single core spent in each state since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub usr: u64,
    pub nice: u64,
    pub sys: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
}

impl CpuTimes {
    /// Sum of the seven tracked states.
    pub fn total(&self) -> u64 {
        self.usr
            .saturating_add(self.nice)
            .saturating_add(self.sys)
            .saturating_add(self.idle)
            .saturating_add(self.iowait)
            .saturating_add(self.irq)
            .saturating_add(self.softirq)
    }
}

/// Reads the `cpuN` line of `/proc/stat`.
pub struct ProcStatCore {
    root: ProcRoot,
    core_id: usize,
    label: String,
}

impl ProcStatCore {
    /// # Errors
    ///
    /// `Configuration` if `core_id` is not below the host's core count.
    pub fn new(root: ProcRoot, core_id: usize, ctx: &SystemContext) -> Result<Self> {
        if core_id >= ctx.core_count {
            return Err(MonitorError::config(format!(
                "invalid core id {core_id} for available core count {}",
                ctx.core_count
            )));
        }
        Ok(Self {
            root,
            core_id,
            label: format!("cpu{core_id}"),
        })
    }

    /// One source per logical core, in core order.
    pub fn all(root: &ProcRoot, ctx: &SystemContext) -> Result<Vec<Self>> {
        (0..ctx.core_count)
            .map(|id| Self::new(root.clone(), id, ctx))
            .collect()
    }

    pub fn core_id(&self) -> usize {
        self.core_id
    }
}

impl CounterSource for ProcStatCore {
    type Counters = CpuTimes;

    fn resource(&self) -> &str {
        &self.label
    }

    fn read(&mut self) -> Result<CpuTimes> {
        let content = self
            .root
            .read(PROC_STAT)
            .map_err(|fault| MonitorError::unavailable(&self.label, fault))?;
        parse_core_line(&content, &self.label, &self.root.path(PROC_STAT))
            .map_err(|fault| MonitorError::unavailable(&self.label, fault))
    }
}

fn parse_core_line(
    content: &str,
    label: &str,
    path: &std::path::Path,
) -> std::result::Result<CpuTimes, SourceFault> {
    let line = content
        .lines()
        .find(|line| line.split_whitespace().next() == Some(label))
        .ok_or_else(|| SourceFault::Missing {
            what: label.to_string(),
            path: path.to_path_buf(),
        })?;

    let mut fields = line.split_whitespace().skip(1);
    Ok(CpuTimes {
        usr: parse_u64(fields.next(), path, "usr")?,
        nice: parse_u64(fields.next(), path, "nice")?,
        sys: parse_u64(fields.next(), path, "sys")?,
        idle: parse_u64(fields.next(), path, "idle")?,
        iowait: parse_u64(fields.next(), path, "iowait")?,
        irq: parse_u64(fields.next(), path, "irq")?,
        softirq: parse_u64(fields.next(), path, "softirq")?,
    })
}
