use deltamon_alert::Threshold;
use deltamon_collector::{
    CounterSource, CpuTimes, DiskCounters, LoadAverage, MemoryInfo, NetCounters, ProcDiskStats,
    ProcLoadAvg, ProcMeminfo, ProcNetDev, ProcStatCore,
};
use deltamon_common::types::Report;
use deltamon_common::Result;
use deltamon_engine::{
    CpuCoreEngine, CpuEngine, CpuMetric, DiskEngine, DiskMetric, Engine, LoadEngine, LoadMetric,
    MemoryEngine, MemoryMetric, NetMetric, NetworkEngine,
};
use tracing::debug;

/// Refreshes one engine per tick and feeds its metrics to registered
/// thresholds in registration order.
pub struct Monitor<E: Engine> {
    engine: E,
    thresholds: Vec<(E::Metric, Threshold)>,
}

pub type CpuMonitor<S = ProcStatCore> = Monitor<CpuEngine<S>>;
pub type CpuCoreMonitor<S = ProcStatCore> = Monitor<CpuCoreEngine<S>>;
pub type DiskMonitor<S = ProcDiskStats> = Monitor<DiskEngine<S>>;
pub type NetworkMonitor<S = ProcNetDev> = Monitor<NetworkEngine<S>>;
pub type MemoryMonitor<S = ProcMeminfo> = Monitor<MemoryEngine<S>>;
pub type LoadMonitor<S = ProcLoadAvg> = Monitor<LoadEngine<S>>;

impl<E: Engine> Monitor<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            thresholds: Vec::new(),
        }
    }

    pub fn add_threshold(&mut self, metric: E::Metric, threshold: Threshold) -> &mut Self {
        self.thresholds.push((metric, threshold));
        self
    }

    /// Refresh the engine, then evaluate every threshold.
    ///
    /// # Errors
    ///
    /// The engine's error, unchanged. No threshold sees a sample on a failed
    /// tick.
    pub fn update(&mut self) -> Result<()> {
        if let Err(e) = self.engine.update() {
            debug!(resource = self.engine.name(), error = %e, "tick skipped");
            return Err(e);
        }
        for (metric, threshold) in &mut self.thresholds {
            threshold.evaluate(self.engine.metric(*metric));
        }
        Ok(())
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn metric(&self, metric: E::Metric) -> f64 {
        self.engine.metric(metric)
    }

    pub fn thresholds(&self) -> impl Iterator<Item = &Threshold> {
        self.thresholds.iter().map(|(_, t)| t)
    }
}

impl<E: Engine> Report for Monitor<E> {
    fn summary(&self) -> String {
        self.engine.summary()
    }

    fn csv_header(&self) -> Vec<String> {
        self.engine.csv_header()
    }

    fn csv_row(&self) -> Vec<String> {
        self.engine.csv_row()
    }
}

impl<S: CounterSource<Counters = CpuTimes>> Monitor<CpuEngine<S>> {
    /// Aggregate usage percent; can exceed 100 on multi-core hosts.
    pub fn add_cpu_usage_threshold(&mut self, threshold: Threshold) -> &mut Self {
        self.add_threshold(CpuMetric::Usage, threshold)
    }
}

impl<S: CounterSource<Counters = CpuTimes>> Monitor<CpuCoreEngine<S>> {
    pub fn add_cpu_usage_threshold(&mut self, threshold: Threshold) -> &mut Self {
        self.add_threshold(CpuMetric::Usage, threshold)
    }
}

impl<S: CounterSource<Counters = DiskCounters>> Monitor<DiskEngine<S>> {
    /// Bytes per second.
    pub fn add_read_throughput_threshold(&mut self, threshold: Threshold) -> &mut Self {
        self.add_threshold(DiskMetric::ReadThroughput, threshold)
    }

    pub fn add_write_throughput_threshold(&mut self, threshold: Threshold) -> &mut Self {
        self.add_threshold(DiskMetric::WriteThroughput, threshold)
    }
}

impl<S: CounterSource<Counters = NetCounters>> Monitor<NetworkEngine<S>> {
    pub fn add_receive_throughput_threshold(&mut self, threshold: Threshold) -> &mut Self {
        self.add_threshold(NetMetric::ReceiveThroughput, threshold)
    }

    pub fn add_transmit_throughput_threshold(&mut self, threshold: Threshold) -> &mut Self {
        self.add_threshold(NetMetric::TransmitThroughput, threshold)
    }
}

impl<S: CounterSource<Counters = MemoryInfo>> Monitor<MemoryEngine<S>> {
    /// Free plus reclaimable memory as a percentage of the total.
    pub fn add_free_percent_threshold(&mut self, threshold: Threshold) -> &mut Self {
        self.add_threshold(MemoryMetric::FreePercent, threshold)
    }
}

impl<S: CounterSource<Counters = LoadAverage>> Monitor<LoadEngine<S>> {
    /// One-minute load average.
    pub fn add_load_threshold(&mut self, threshold: Threshold) -> &mut Self {
        self.add_threshold(LoadMetric::OneMinute, threshold)
    }
}

/// Object-safe view of a monitor, for driving a mixed set from one loop.
pub trait ResourceMonitor: Report + Send {
    fn name(&self) -> &str;

    fn update(&mut self) -> Result<()>;

    fn is_warm(&self) -> bool;
}

impl<E: Engine> ResourceMonitor for Monitor<E> {
    fn name(&self) -> &str {
        self.engine.name()
    }

    fn update(&mut self) -> Result<()> {
        Monitor::update(self)
    }

    fn is_warm(&self) -> bool {
        self.engine.is_warm()
    }
}
