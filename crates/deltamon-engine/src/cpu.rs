use crate::delta::DeltaEngine;
use crate::{pct, ratio, Engine};
use deltamon_collector::{CounterSource, CpuTimes, ProcRoot, ProcStatCore};
use deltamon_common::clock::SharedClock;
use deltamon_common::context::SystemContext;
use deltamon_common::types::Report;
use deltamon_common::{MonitorError, Result};
use std::ops::AddAssign;

/// Share of one window spent in each CPU state, as ratios in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuUsage {
    pub usage: f64,
    pub usr: f64,
    pub nice: f64,
    pub sys: f64,
    pub idle: f64,
    pub iowait: f64,
    pub irq: f64,
    pub softirq: f64,
}

impl CpuUsage {
    /// Ratios for the window `prev..cur`. A window with no elapsed jiffies is
    /// all zeros, and so is a window in which any counter went backwards.
    pub fn between(prev: &CpuTimes, cur: &CpuTimes) -> Self {
        let reset = states(prev)
            .iter()
            .zip(states(cur))
            .any(|(p, c)| c < *p);
        let total = cur.total().saturating_sub(prev.total());
        if reset || total == 0 {
            return Self::default();
        }
        let share = |p: u64, c: u64| ratio(c.saturating_sub(p), total);
        let idle = share(prev.idle, cur.idle);
        Self {
            usage: (1.0 - idle).clamp(0.0, 1.0),
            usr: share(prev.usr, cur.usr),
            nice: share(prev.nice, cur.nice),
            sys: share(prev.sys, cur.sys),
            idle,
            iowait: share(prev.iowait, cur.iowait),
            irq: share(prev.irq, cur.irq),
            softirq: share(prev.softirq, cur.softirq),
        }
    }

    pub fn get(&self, metric: CpuMetric) -> f64 {
        match metric {
            CpuMetric::Usage => self.usage,
            CpuMetric::User => self.usr,
            CpuMetric::Nice => self.nice,
            CpuMetric::System => self.sys,
            CpuMetric::Idle => self.idle,
            CpuMetric::IoWait => self.iowait,
            CpuMetric::Irq => self.irq,
            CpuMetric::SoftIrq => self.softirq,
        }
    }

    fn csv_fields(&self) -> impl Iterator<Item = String> + '_ {
        CpuMetric::ALL.into_iter().map(move |m| pct(self.get(m)))
    }
}

fn states(t: &CpuTimes) -> [u64; 7] {
    [t.usr, t.nice, t.sys, t.idle, t.iowait, t.irq, t.softirq]
}

impl AddAssign for CpuUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.usage += rhs.usage;
        self.usr += rhs.usr;
        self.nice += rhs.nice;
        self.sys += rhs.sys;
        self.idle += rhs.idle;
        self.iowait += rhs.iowait;
        self.irq += rhs.irq;
        self.softirq += rhs.softirq;
    }
}

/// CPU metrics, all reported as percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuMetric {
    Usage,
    User,
    Nice,
    System,
    Idle,
    IoWait,
    Irq,
    SoftIrq,
}

impl CpuMetric {
    pub const ALL: [CpuMetric; 8] = [
        CpuMetric::Usage,
        CpuMetric::User,
        CpuMetric::Nice,
        CpuMetric::System,
        CpuMetric::Idle,
        CpuMetric::IoWait,
        CpuMetric::Irq,
        CpuMetric::SoftIrq,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            CpuMetric::Usage => "usage",
            CpuMetric::User => "usr",
            CpuMetric::Nice => "nice",
            CpuMetric::System => "sys",
            CpuMetric::Idle => "idle",
            CpuMetric::IoWait => "iowait",
            CpuMetric::Irq => "irq",
            CpuMetric::SoftIrq => "softirq",
        }
    }
}

fn header(prefix: &str) -> impl Iterator<Item = String> + '_ {
    CpuMetric::ALL
        .into_iter()
        .map(move |m| format!("{prefix}_{}", m.column()))
}

fn summary_line(name: &str, usage: &CpuUsage) -> String {
    format!(
        "{name}: usage {:.2}% usr {:.2}% sys {:.2}% iowait {:.2}% idle {:.2}%",
        usage.usage * 100.0,
        usage.usr * 100.0,
        usage.sys * 100.0,
        usage.iowait * 100.0,
        usage.idle * 100.0,
    )
}

/// One logical core.
pub struct CpuCoreEngine<S: CounterSource<Counters = CpuTimes> = ProcStatCore> {
    delta: DeltaEngine<S>,
    name: String,
    usage: CpuUsage,
}

impl<S: CounterSource<Counters = CpuTimes>> CpuCoreEngine<S> {
    pub fn new(source: S, clock: SharedClock) -> Self {
        let name = source.resource().to_string();
        Self {
            delta: DeltaEngine::new(source, clock),
            name,
            usage: CpuUsage::default(),
        }
    }

    pub fn usage(&self) -> &CpuUsage {
        &self.usage
    }

    fn recompute(&mut self) {
        self.usage = CpuUsage::between(
            &self.delta.previous().counters,
            &self.delta.current().counters,
        );
    }
}

impl<S: CounterSource<Counters = CpuTimes>> Engine for CpuCoreEngine<S> {
    type Metric = CpuMetric;

    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self) -> Result<()> {
        self.delta.update()?;
        self.recompute();
        Ok(())
    }

    fn metric(&self, metric: CpuMetric) -> f64 {
        self.usage.get(metric) * 100.0
    }

    fn is_warm(&self) -> bool {
        self.delta.is_warm()
    }
}

impl<S: CounterSource<Counters = CpuTimes>> Report for CpuCoreEngine<S> {
    fn summary(&self) -> String {
        summary_line(&self.name, &self.usage)
    }

    fn csv_header(&self) -> Vec<String> {
        header(&self.name).collect()
    }

    fn csv_row(&self) -> Vec<String> {
        self.usage.csv_fields().collect()
    }
}

/// Whole-machine CPU: per-core ratios summed, so `N` busy cores read `N × 100%`.
///
/// Its tabular output carries every core's columns after the aggregate ones
/// unless per-core detail is switched off.
pub struct CpuEngine<S: CounterSource<Counters = CpuTimes> = ProcStatCore> {
    cores: Vec<CpuCoreEngine<S>>,
    usage: CpuUsage,
    per_core: bool,
}

impl CpuEngine<ProcStatCore> {
    /// One engine over every core the host reports.
    pub fn host(root: &ProcRoot, ctx: &SystemContext, clock: SharedClock) -> Result<Self> {
        Self::new(ProcStatCore::all(root, ctx)?, clock)
    }
}

impl<S: CounterSource<Counters = CpuTimes>> CpuEngine<S> {
    /// # Errors
    ///
    /// `Configuration` when `sources` is empty.
    pub fn new(sources: Vec<S>, clock: SharedClock) -> Result<Self> {
        if sources.is_empty() {
            return Err(MonitorError::config("cpu aggregate needs at least one core"));
        }
        let cores = sources
            .into_iter()
            .map(|source| CpuCoreEngine::new(source, clock.clone()))
            .collect();
        Ok(Self {
            cores,
            usage: CpuUsage::default(),
            per_core: true,
        })
    }

    pub fn with_per_core(mut self, per_core: bool) -> Self {
        self.per_core = per_core;
        self
    }

    pub fn cores(&self) -> &[CpuCoreEngine<S>] {
        &self.cores
    }

    pub fn usage(&self) -> &CpuUsage {
        &self.usage
    }

    fn detail(&self) -> impl Iterator<Item = &CpuCoreEngine<S>> {
        let shown = if self.per_core { self.cores.len() } else { 0 };
        self.cores.iter().take(shown)
    }
}

impl<S: CounterSource<Counters = CpuTimes>> Engine for CpuEngine<S> {
    type Metric = CpuMetric;

    fn name(&self) -> &str {
        "cpu"
    }

    fn update(&mut self) -> Result<()> {
        // Read every core before applying any, so one failing core leaves the
        // whole aggregate untouched.
        let staged = self
            .cores
            .iter_mut()
            .map(|core| core.delta.stage())
            .collect::<Result<Vec<_>>>()?;

        let mut total = CpuUsage::default();
        for (core, staged) in self.cores.iter_mut().zip(staged) {
            core.delta.commit(staged);
            core.recompute();
            total += core.usage;
        }
        self.usage = total;
        Ok(())
    }

    fn metric(&self, metric: CpuMetric) -> f64 {
        self.usage.get(metric) * 100.0
    }

    fn is_warm(&self) -> bool {
        self.cores.iter().all(|core| core.is_warm())
    }
}

impl<S: CounterSource<Counters = CpuTimes>> Report for CpuEngine<S> {
    fn summary(&self) -> String {
        summary_line("cpu", &self.usage)
    }

    fn csv_header(&self) -> Vec<String> {
        let cores = self.detail().flat_map(|core| header(&core.name));
        header("cpu").chain(cores).collect()
    }

    fn csv_row(&self) -> Vec<String> {
        let cores = self.detail().flat_map(|core| core.usage.csv_fields());
        self.usage.csv_fields().chain(cores).collect()
    }
}
