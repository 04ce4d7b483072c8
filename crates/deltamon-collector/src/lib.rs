//! Raw counter acquisition for deltamon.
//!
//! Each [`CounterSource`] reads one resource instance (a CPU core, a disk, a
//! network interface, the memory pool) and returns a fresh, fully populated
//! counter value. Sources are the only place that touches `/proc` or `/sys`;
//! everything above them works on plain structs.

pub mod cpu;
pub mod devices;
pub mod disk;
pub mod load;
pub mod memory;
pub mod network;
pub mod procfs;
pub mod replay;

#[cfg(test)]
mod tests;

use deltamon_common::Result;

pub use cpu::{CpuTimes, ProcStatCore};
pub use disk::{DiskCounters, ProcDiskStats};
pub use load::{LoadAverage, ProcLoadAvg};
pub use memory::{MemoryInfo, ProcMeminfo};
pub use network::{NetCounters, ProcNetDev};
pub use procfs::ProcRoot;
pub use replay::{ReplayHandle, ReplaySource};

/// A point-in-time reader of cumulative counters for one resource instance.
///
/// `read` either returns a complete value or fails with
/// [`MonitorError::SourceUnavailable`](deltamon_common::MonitorError); it
/// never hands back a half-parsed struct. It must be safe to call repeatedly.
pub trait CounterSource: Send {
    type Counters: Copy + Default + std::fmt::Debug + PartialEq;

    /// Identifier of the resource (e.g. `"cpu3"`, `"sda"`, `"eth0"`).
    fn resource(&self) -> &str;

    /// Re-read the backing counters.
    ///
    /// # Errors
    ///
    /// Returns `SourceUnavailable` when the source cannot be read or parsed.
    fn read(&mut self) -> Result<Self::Counters>;
}

impl<S: CounterSource + ?Sized> CounterSource for Box<S> {
    type Counters = S::Counters;

    fn resource(&self) -> &str {
        (**self).resource()
    }

    fn read(&mut self) -> Result<Self::Counters> {
        (**self).read()
    }
}
