//! Engines over instantaneous values. They keep one sample and no window.

use crate::{pct, ratio, Engine};
use deltamon_collector::{CounterSource, LoadAverage, MemoryInfo, ProcLoadAvg, ProcMeminfo};
use deltamon_common::types::Report;
use deltamon_common::Result;

/// Latest successful reading of a source.
struct Gauge<S: CounterSource> {
    source: S,
    latest: S::Counters,
    warm: bool,
}

impl<S: CounterSource> Gauge<S> {
    fn new(source: S) -> Self {
        Self {
            source,
            latest: Default::default(),
            warm: false,
        }
    }

    fn update(&mut self) -> Result<&S::Counters> {
        self.latest = self.source.read()?;
        self.warm = true;
        Ok(&self.latest)
    }
}

/// Memory pool ratios in `[0, 1]`, all zero when the total is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryUsage {
    pub used_kb: u64,
    /// Free plus reclaimable (cache and buffers).
    pub free_ratio: f64,
    pub available_ratio: f64,
    pub buffer_ratio: f64,
    pub cache_ratio: f64,
    pub used_ratio: f64,
}

impl MemoryUsage {
    pub fn from_info(info: &MemoryInfo) -> Self {
        let total = info.total_kb;
        let used_kb = total
            .saturating_sub(info.free_kb)
            .saturating_sub(info.buffers_kb)
            .saturating_sub(info.cached_kb);
        let reclaimable = info
            .free_kb
            .saturating_add(info.cached_kb)
            .saturating_add(info.buffers_kb);
        Self {
            used_kb,
            free_ratio: ratio(reclaimable, total),
            available_ratio: ratio(info.available_kb, total),
            buffer_ratio: ratio(info.buffers_kb, total),
            cache_ratio: ratio(info.cached_kb, total),
            used_ratio: ratio(used_kb, total),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryMetric {
    FreePercent,
    AvailablePercent,
    UsedPercent,
    BufferPercent,
    CachePercent,
}

pub struct MemoryEngine<S: CounterSource<Counters = MemoryInfo> = ProcMeminfo> {
    gauge: Gauge<S>,
    usage: MemoryUsage,
}

impl<S: CounterSource<Counters = MemoryInfo>> MemoryEngine<S> {
    pub fn new(source: S) -> Self {
        Self {
            gauge: Gauge::new(source),
            usage: MemoryUsage::default(),
        }
    }

    pub fn info(&self) -> &MemoryInfo {
        &self.gauge.latest
    }

    pub fn usage(&self) -> &MemoryUsage {
        &self.usage
    }
}

impl<S: CounterSource<Counters = MemoryInfo>> Engine for MemoryEngine<S> {
    type Metric = MemoryMetric;

    fn name(&self) -> &str {
        "memory"
    }

    fn update(&mut self) -> Result<()> {
        let info = self.gauge.update()?;
        self.usage = MemoryUsage::from_info(info);
        Ok(())
    }

    fn metric(&self, metric: MemoryMetric) -> f64 {
        let u = &self.usage;
        let r = match metric {
            MemoryMetric::FreePercent => u.free_ratio,
            MemoryMetric::AvailablePercent => u.available_ratio,
            MemoryMetric::UsedPercent => u.used_ratio,
            MemoryMetric::BufferPercent => u.buffer_ratio,
            MemoryMetric::CachePercent => u.cache_ratio,
        };
        r * 100.0
    }

    fn is_warm(&self) -> bool {
        self.gauge.warm
    }
}

impl<S: CounterSource<Counters = MemoryInfo>> Report for MemoryEngine<S> {
    fn summary(&self) -> String {
        let (i, u) = (self.info(), &self.usage);
        format!(
            "memory: total {} kB used {} kB ({:.2}%) free {:.2}% available {:.2}% \
             buffers {:.2}% cached {:.2}%",
            i.total_kb,
            u.used_kb,
            u.used_ratio * 100.0,
            u.free_ratio * 100.0,
            u.available_ratio * 100.0,
            u.buffer_ratio * 100.0,
            u.cache_ratio * 100.0,
        )
    }

    fn csv_header(&self) -> Vec<String> {
        [
            "mem_total_kb",
            "mem_used_kb",
            "mem_used_pct",
            "mem_free_pct",
            "mem_available_pct",
            "mem_buffers_pct",
            "mem_cached_pct",
        ]
        .map(String::from)
        .to_vec()
    }

    fn csv_row(&self) -> Vec<String> {
        let (i, u) = (self.info(), &self.usage);
        vec![
            i.total_kb.to_string(),
            u.used_kb.to_string(),
            pct(u.used_ratio),
            pct(u.free_ratio),
            pct(u.available_ratio),
            pct(u.buffer_ratio),
            pct(u.cache_ratio),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadMetric {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
}

pub struct LoadEngine<S: CounterSource<Counters = LoadAverage> = ProcLoadAvg> {
    gauge: Gauge<S>,
}

impl<S: CounterSource<Counters = LoadAverage>> LoadEngine<S> {
    pub fn new(source: S) -> Self {
        Self {
            gauge: Gauge::new(source),
        }
    }

    pub fn load(&self) -> &LoadAverage {
        &self.gauge.latest
    }
}

impl<S: CounterSource<Counters = LoadAverage>> Engine for LoadEngine<S> {
    type Metric = LoadMetric;

    fn name(&self) -> &str {
        "loadavg"
    }

    fn update(&mut self) -> Result<()> {
        self.gauge.update().map(|_| ())
    }

    fn metric(&self, metric: LoadMetric) -> f64 {
        let l = self.load();
        match metric {
            LoadMetric::OneMinute => l.one,
            LoadMetric::FiveMinutes => l.five,
            LoadMetric::FifteenMinutes => l.fifteen,
        }
    }

    fn is_warm(&self) -> bool {
        self.gauge.warm
    }
}

impl<S: CounterSource<Counters = LoadAverage>> Report for LoadEngine<S> {
    fn summary(&self) -> String {
        let l = self.load();
        format!("loadavg: {:.2} {:.2} {:.2}", l.one, l.five, l.fifteen)
    }

    fn csv_header(&self) -> Vec<String> {
        ["load_1m", "load_5m", "load_15m"].map(String::from).to_vec()
    }

    fn csv_row(&self) -> Vec<String> {
        let l = self.load();
        [l.one, l.five, l.fifteen]
            .map(|v| format!("{v:.2}"))
            .to_vec()
    }
}
