//! Turns an [`AgentConfig`] into running monitors.

use crate::config::{AgentConfig, ThresholdConfig};
use deltamon_alert::{Firing, Threshold};
use deltamon_collector::devices::{is_whole_disk, list_disks, list_nics};
use deltamon_collector::{
    CounterSource, ProcDiskStats, ProcLoadAvg, ProcMeminfo, ProcNetDev, ProcRoot,
};
use deltamon_common::clock::SharedClock;
use deltamon_common::context::SystemContext;
use deltamon_common::types::Severity;
use deltamon_common::{MonitorError, Result};
use deltamon_engine::{CpuEngine, DiskEngine, LoadEngine, MemoryEngine, NetworkEngine};
use deltamon_monitor::{Monitor, ResourceMonitor};

pub type Monitors = Vec<Box<dyn ResourceMonitor>>;

/// Build one monitor per configured resource, in a fixed order: CPU, disks,
/// interfaces, memory, load average.
///
/// # Errors
///
/// `Configuration` for unknown devices or invalid thresholds.
pub fn build_monitors(
    config: &AgentConfig,
    ctx: &SystemContext,
    clock: SharedClock,
) -> Result<Monitors> {
    let root = ProcRoot::new(&config.proc_root);
    let mut monitors: Monitors = Vec::new();

    let engine = CpuEngine::host(&root, ctx, clock.clone())?.with_per_core(config.cpu.cores);
    let mut cpu = Monitor::new(engine);
    for t in &config.cpu.thresholds {
        cpu.add_cpu_usage_threshold(alarm("cpu", t)?);
    }
    monitors.push(Box::new(cpu));

    match &config.disks {
        Some(disks) => {
            for disk in disks {
                let mut monitor = Monitor::new(DiskEngine::new(
                    ProcDiskStats::new(root.clone(), &disk.name)?,
                    clock.clone(),
                ));
                for t in &disk.read_throughput {
                    monitor.add_read_throughput_threshold(alarm(&disk.name, t)?);
                }
                for t in &disk.write_throughput {
                    monitor.add_write_throughput_threshold(alarm(&disk.name, t)?);
                }
                monitors.push(Box::new(monitor));
            }
        }
        None => {
            let names = list_disks(&root)
                .map_err(|e| MonitorError::config(format!("cannot list disks: {e}")))?;
            for name in names.iter().filter(|n| is_whole_disk(n)) {
                let source = ProcDiskStats::new(root.clone(), name)?;
                monitors.push(Box::new(Monitor::new(DiskEngine::new(
                    source,
                    clock.clone(),
                ))));
            }
        }
    }

    match &config.nics {
        Some(nics) => {
            for nic in nics {
                let source = ProcNetDev::new(root.clone(), &nic.name)?;
                let name = source.resource().to_string();
                let mut monitor = Monitor::new(NetworkEngine::new(source, clock.clone()));
                for t in &nic.receive_throughput {
                    monitor.add_receive_throughput_threshold(alarm(&name, t)?);
                }
                for t in &nic.transmit_throughput {
                    monitor.add_transmit_throughput_threshold(alarm(&name, t)?);
                }
                monitors.push(Box::new(monitor));
            }
        }
        None => {
            let names = list_nics(&root)
                .map_err(|e| MonitorError::config(format!("cannot list interfaces: {e}")))?;
            for name in names.iter().filter(|n| n.as_str() != "lo") {
                let source = ProcNetDev::new(root.clone(), name)?;
                monitors.push(Box::new(Monitor::new(NetworkEngine::new(
                    source,
                    clock.clone(),
                ))));
            }
        }
    }

    let mut memory = Monitor::new(MemoryEngine::new(ProcMeminfo::new(root.clone())));
    for t in &config.memory.free_percent {
        memory.add_free_percent_threshold(alarm("memory", t)?);
    }
    monitors.push(Box::new(memory));

    let mut load = Monitor::new(LoadEngine::new(ProcLoadAvg::new(root)));
    for t in &config.load.one_minute {
        load.add_load_threshold(alarm("loadavg", t)?);
    }
    monitors.push(Box::new(load));

    Ok(monitors)
}

/// A threshold whose callback logs at the configured severity.
fn alarm(resource: &str, config: &ThresholdConfig) -> Result<Threshold> {
    let resource = resource.to_string();
    let severity = config.severity;
    Threshold::new(config.spec()?, move |firing| log_firing(&resource, severity, firing))
}

fn log_firing(resource: &str, severity: Severity, f: &Firing<'_>) {
    let threshold = f.spec.name.as_str();
    let direction = f.spec.direction.to_string();
    match severity {
        Severity::Info => tracing::info!(
            resource,
            threshold,
            %direction,
            value = f.value,
            limit = f.spec.value,
            fired = f.fire_count,
            "Threshold crossed"
        ),
        Severity::Warning => tracing::warn!(
            resource,
            threshold,
            %direction,
            value = f.value,
            limit = f.spec.value,
            fired = f.fire_count,
            "Threshold crossed"
        ),
        Severity::Critical => tracing::error!(
            resource,
            threshold,
            %direction,
            value = f.value,
            limit = f.spec.value,
            fired = f.fire_count,
            "Threshold crossed"
        ),
    }
}
