//! Delta/rate engines.
//!
//! A [`DeltaEngine`] owns two sample slots for one [`CounterSource`] and
//! swaps their roles on every successful tick. The resource engines built on
//! top of it ([`CpuCoreEngine`], [`CpuEngine`], [`DiskEngine`],
//! [`NetworkEngine`]) turn the window between the two slots into ratios and
//! throughputs. [`MemoryEngine`] and [`LoadEngine`] are gauges and keep a
//! single sample.
//!
//! [`CounterSource`]: deltamon_collector::CounterSource

pub mod cpu;
pub mod delta;
pub mod disk;
pub mod gauge;
pub mod network;


use deltamon_common::types::Report;
use deltamon_common::Result;

pub use cpu::{CpuCoreEngine, CpuEngine, CpuMetric, CpuUsage};
pub use delta::{DeltaEngine, Sample, Staged};
pub use disk::{DiskEngine, DiskMetric, DiskRates};
pub use gauge::{LoadEngine, LoadMetric, MemoryEngine, MemoryMetric, MemoryUsage};
pub use network::{Flow, NetMetric, NetRates, NetworkEngine};

/// A resource engine as seen by a monitor.
pub trait Engine: Report + Send {
    /// Selector for one derived scalar.
    type Metric: Copy + std::fmt::Debug + Send;

    fn name(&self) -> &str;

    /// Refresh from the source and recompute every derived value.
    ///
    /// # Errors
    ///
    /// Source failures are returned unchanged and leave the engine exactly as
    /// it was before the call.
    fn update(&mut self) -> Result<()>;

    /// Latest value of `metric`. Zero before the first successful update.
    fn metric(&self, metric: Self::Metric) -> f64;

    fn is_warm(&self) -> bool;
}

pub(crate) fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

pub(crate) fn pct(value: f64) -> String {
    format!("{:.2}", value * 100.0)
}
