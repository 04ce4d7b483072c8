//! Monitors: one engine, the thresholds watching it, and its reporting.

pub mod monitor;

#[cfg(test)]
mod tests;

pub use monitor::{
    CpuCoreMonitor, CpuMonitor, DiskMonitor, LoadMonitor, MemoryMonitor, Monitor,
    NetworkMonitor, ResourceMonitor,
};
