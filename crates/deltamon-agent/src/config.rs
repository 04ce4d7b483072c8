use deltamon_alert::{Direction, ThresholdSpec};
use deltamon_common::types::Severity;
use deltamon_common::MonitorError;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Append one CSV row per tick here when set.
    pub csv_path: Option<PathBuf>,
    #[serde(default = "default_delimiter")]
    pub csv_delimiter: char,
    #[serde(default = "default_true")]
    pub print_summary: bool,
    /// Where `proc/` and `sys/` are looked up.
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,
    #[serde(default)]
    pub cpu: CpuConfig,
    /// Absent means every whole disk in `/proc/partitions`.
    pub disks: Option<Vec<DiskConfig>>,
    /// Absent means every interface except loopback.
    pub nics: Option<Vec<NicConfig>>,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub load: LoadConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct CpuConfig {
    /// Add every core's columns after the aggregate's in the CSV export.
    #[serde(default)]
    pub cores: bool,
    #[serde(default)]
    pub thresholds: Vec<ThresholdConfig>,
}

#[derive(Debug, Deserialize)]
pub struct DiskConfig {
    pub name: String,
    #[serde(default)]
    pub read_throughput: Vec<ThresholdConfig>,
    #[serde(default)]
    pub write_throughput: Vec<ThresholdConfig>,
}

#[derive(Debug, Deserialize)]
pub struct NicConfig {
    /// Empty selects `lo`.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub receive_throughput: Vec<ThresholdConfig>,
    #[serde(default)]
    pub transmit_throughput: Vec<ThresholdConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub free_percent: Vec<ThresholdConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoadConfig {
    #[serde(default)]
    pub one_minute: Vec<ThresholdConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdConfig {
    pub name: String,
    pub value: f64,
    #[serde(default = "default_direction")]
    pub direction: String,
    #[serde(default = "default_required_hits")]
    pub required_hits: u32,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub severity: Severity,
}

fn default_interval() -> u64 {
    1
}

fn default_delimiter() -> char {
    ','
}

fn default_true() -> bool {
    true
}

fn default_proc_root() -> PathBuf {
    PathBuf::from("/")
}

fn default_direction() -> String {
    "exceed".to_string()
}

fn default_required_hits() -> u32 {
    1
}

impl ThresholdConfig {
    pub fn spec(&self) -> Result<ThresholdSpec, MonitorError> {
        if self.name.trim().is_empty() {
            return Err(MonitorError::config("threshold name must not be empty"));
        }
        if self.required_hits == 0 {
            return Err(MonitorError::config(format!(
                "threshold {}: required_hits must be at least 1",
                self.name
            )));
        }
        let direction: Direction = self
            .direction
            .parse()
            .map_err(|e| MonitorError::config(format!("threshold {}: {e}", self.name)))?;
        Ok(ThresholdSpec::new(&self.name, self.value, direction)
            .with_required_hits(self.required_hits)
            .with_limit(self.limit))
    }
}

impl AgentConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no monitor could run with, before any is built.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.interval_secs == 0 {
            return Err(MonitorError::config("interval_secs must be greater than 0"));
        }
        let d = self.csv_delimiter;
        if !d.is_ascii() || d.is_ascii_alphanumeric() || "._-+\"\r\n".contains(d) {
            return Err(MonitorError::config(format!(
                "csv_delimiter {d:?} cannot separate numeric fields"
            )));
        }
        for threshold in self.thresholds() {
            threshold.spec()?;
        }
        Ok(())
    }

    fn thresholds(&self) -> impl Iterator<Item = &ThresholdConfig> {
        let disks = self
            .disks
            .iter()
            .flatten()
            .flat_map(|d| d.read_throughput.iter().chain(&d.write_throughput));
        let nics = self
            .nics
            .iter()
            .flatten()
            .flat_map(|n| n.receive_throughput.iter().chain(&n.transmit_throughput));
        self.cpu
            .thresholds
            .iter()
            .chain(disks)
            .chain(nics)
            .chain(&self.memory.free_percent)
            .chain(&self.load.one_minute)
    }
}
