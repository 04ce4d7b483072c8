use crate::delta::{DeltaEngine, Sample};
use crate::{pct, ratio, Engine};
use deltamon_collector::{CounterSource, DiskCounters, ProcDiskStats};
use deltamon_common::clock::SharedClock;
use deltamon_common::types::Report;
use deltamon_common::Result;

const NANOS_PER_SEC: f64 = 1e9;

/// I/O activity of one disk over the latest window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiskRates {
    pub read_count: u64,
    pub write_count: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
    /// Bytes per second.
    pub read_throughput: f64,
    pub write_throughput: f64,
    pub total_ops: u64,
    /// Share of operations that were reads.
    pub read_usage: f64,
    pub write_usage: f64,
}

impl DiskRates {
    pub fn between(prev: &Sample<DiskCounters>, cur: &Sample<DiskCounters>) -> Self {
        let secs = cur.elapsed_since(prev) as f64 / NANOS_PER_SEC;
        let (p, c) = (&prev.counters, &cur.counters);

        let read_count = c.read_count.saturating_sub(p.read_count);
        let write_count = c.write_count.saturating_sub(p.write_count);
        let read_bytes = if read_count == 0 {
            0
        } else {
            c.read_bytes().saturating_sub(p.read_bytes())
        };
        let write_bytes = if write_count == 0 {
            0
        } else {
            c.write_bytes().saturating_sub(p.write_bytes())
        };
        let total_ops = read_count.saturating_add(write_count);

        Self {
            read_count,
            write_count,
            read_bytes,
            write_bytes,
            read_throughput: per_second(read_bytes, secs),
            write_throughput: per_second(write_bytes, secs),
            total_ops,
            read_usage: ratio(read_count, total_ops),
            write_usage: ratio(write_count, total_ops),
        }
    }
}

fn per_second(bytes: u64, secs: f64) -> f64 {
    if secs <= 0.0 {
        0.0
    } else {
        bytes as f64 / secs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiskMetric {
    /// Bytes per second.
    ReadThroughput,
    WriteThroughput,
    ReadCount,
    WriteCount,
    ReadPercent,
    WritePercent,
}

/// One block device.
pub struct DiskEngine<S: CounterSource<Counters = DiskCounters> = ProcDiskStats> {
    delta: DeltaEngine<S>,
    name: String,
    rates: DiskRates,
}

impl<S: CounterSource<Counters = DiskCounters>> DiskEngine<S> {
    pub fn new(source: S, clock: SharedClock) -> Self {
        let name = source.resource().to_string();
        Self {
            delta: DeltaEngine::new(source, clock),
            name,
            rates: DiskRates::default(),
        }
    }

    pub fn rates(&self) -> &DiskRates {
        &self.rates
    }
}

impl<S: CounterSource<Counters = DiskCounters>> Engine for DiskEngine<S> {
    type Metric = DiskMetric;

    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self) -> Result<()> {
        self.delta.update()?;
        self.rates = DiskRates::between(self.delta.previous(), self.delta.current());
        Ok(())
    }

    fn metric(&self, metric: DiskMetric) -> f64 {
        let r = &self.rates;
        match metric {
            DiskMetric::ReadThroughput => r.read_throughput,
            DiskMetric::WriteThroughput => r.write_throughput,
            DiskMetric::ReadCount => r.read_count as f64,
            DiskMetric::WriteCount => r.write_count as f64,
            DiskMetric::ReadPercent => r.read_usage * 100.0,
            DiskMetric::WritePercent => r.write_usage * 100.0,
        }
    }

    fn is_warm(&self) -> bool {
        self.delta.is_warm()
    }
}

impl<S: CounterSource<Counters = DiskCounters>> Report for DiskEngine<S> {
    fn summary(&self) -> String {
        let r = &self.rates;
        format!(
            "{}: read {} ops {:.2} B/s ({:.2}%), write {} ops {:.2} B/s ({:.2}%)",
            self.name,
            r.read_count,
            r.read_throughput,
            r.read_usage * 100.0,
            r.write_count,
            r.write_throughput,
            r.write_usage * 100.0,
        )
    }

    fn csv_header(&self) -> Vec<String> {
        let n = &self.name;
        vec![
            format!("{n}_read_count"),
            format!("{n}_read_bytes"),
            format!("{n}_read_throughput"),
            format!("{n}_read_pct"),
            format!("{n}_write_count"),
            format!("{n}_write_bytes"),
            format!("{n}_write_throughput"),
            format!("{n}_write_pct"),
        ]
    }

    fn csv_row(&self) -> Vec<String> {
        let r = &self.rates;
        vec![
            r.read_count.to_string(),
            r.read_bytes.to_string(),
            format!("{:.2}", r.read_throughput),
            pct(r.read_usage),
            r.write_count.to_string(),
            r.write_bytes.to_string(),
            format!("{:.2}", r.write_throughput),
            pct(r.write_usage),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(
        reads: u64,
        read_sectors: u64,
        writes: u64,
        write_sectors: u64,
        secs: u64,
    ) -> Sample<DiskCounters> {
        Sample {
            counters: DiskCounters {
                read_count: reads,
                read_sectors,
                write_count: writes,
                write_sectors,
                sector_size: 512,
            },
            nanos: secs * 1_000_000_000,
        }
    }

    #[test]
    fn throughput_is_bytes_per_second() {
        let r = DiskRates::between(&sample(0, 0, 0, 0, 0), &sample(30, 2000, 10, 1000, 2));
        assert_eq!(r.read_bytes, 2000 * 512);
        assert_eq!(r.read_throughput, 512_000.0);
        assert_eq!(r.write_throughput, 256_000.0);
        assert_eq!(r.total_ops, 40);
        assert_eq!(r.read_usage, 0.75);
        assert_eq!(r.write_usage, 0.25);
    }

    #[test]
    fn sectors_without_completed_reads_count_as_idle() {
        let r = DiskRates::between(&sample(5, 0, 5, 0, 0), &sample(5, 100, 6, 8, 1));
        assert_eq!(r.read_bytes, 0);
        assert_eq!(r.read_throughput, 0.0);
        assert_eq!(r.write_bytes, 8 * 512);
        assert_eq!(r.read_usage, 0.0);
        assert_eq!(r.write_usage, 1.0);
    }

    #[test]
    fn no_elapsed_time_means_no_throughput() {
        let r = DiskRates::between(&sample(0, 0, 0, 0, 3), &sample(10, 10, 0, 0, 3));
        assert_eq!(r.read_count, 10);
        assert_eq!(r.read_throughput, 0.0);
    }

    #[test]
    fn wrapped_counters_read_as_zero() {
        let r = DiskRates::between(&sample(90, 900, 90, 900, 0), &sample(1, 1, 1, 1, 1));
        assert_eq!(r, DiskRates::default());
    }
}
