use crate::delta::{DeltaEngine, Sample};
use crate::{pct, ratio, Engine};
use deltamon_collector::{CounterSource, NetCounters, ProcNetDev};
use deltamon_common::clock::SharedClock;
use deltamon_common::types::Report;
use deltamon_common::Result;

/// Throughput is bytes per `Δns / 1e6` units of elapsed time.
const THROUGHPUT_DIVISOR: f64 = 1e6;

/// Traffic in one direction over the latest window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Flow {
    pub bytes: u64,
    pub packets: u64,
    pub errors: u64,
    pub drops: u64,
    pub success: u64,
    pub throughput: f64,
    pub error_usage: f64,
    pub drop_usage: f64,
    pub success_usage: f64,
}

impl Flow {
    /// A window with no new bytes reports no packets, errors or drops either.
    fn from_deltas(bytes: u64, packets: u64, errors: u64, drops: u64, elapsed: f64) -> Self {
        if bytes == 0 {
            return Self::default();
        }
        let success = packets.saturating_sub(errors.saturating_add(drops));
        Self {
            bytes,
            packets,
            errors,
            drops,
            success,
            throughput: if elapsed <= 0.0 {
                0.0
            } else {
                bytes as f64 / elapsed
            },
            error_usage: ratio(errors, packets),
            drop_usage: ratio(drops, packets),
            success_usage: ratio(success, packets),
        }
    }

    fn csv_fields(&self) -> [String; 8] {
        [
            self.bytes.to_string(),
            self.packets.to_string(),
            self.errors.to_string(),
            self.drops.to_string(),
            format!("{:.2}", self.throughput),
            pct(self.error_usage),
            pct(self.drop_usage),
            pct(self.success_usage),
        ]
    }
}

const FLOW_COLUMNS: [&str; 8] = [
    "bytes",
    "packets",
    "errors",
    "drops",
    "throughput",
    "error_pct",
    "drop_pct",
    "success_pct",
];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetRates {
    pub rx: Flow,
    pub tx: Flow,
    pub collisions: u64,
    /// Link speed of the latest sample in Mbit/s.
    pub link_speed_mbps: Option<u64>,
}

impl NetRates {
    pub fn between(prev: &Sample<NetCounters>, cur: &Sample<NetCounters>) -> Self {
        let elapsed = cur.elapsed_since(prev) as f64 / THROUGHPUT_DIVISOR;
        let (p, c) = (&prev.counters, &cur.counters);
        let d = |old: u64, new: u64| new.saturating_sub(old);

        let rx = Flow::from_deltas(
            d(p.rx_bytes, c.rx_bytes),
            d(p.rx_packets, c.rx_packets),
            d(p.rx_errors, c.rx_errors),
            d(p.rx_drops, c.rx_drops),
            elapsed,
        );
        let tx = Flow::from_deltas(
            d(p.tx_bytes, c.tx_bytes),
            d(p.tx_packets, c.tx_packets),
            d(p.tx_errors, c.tx_errors),
            d(p.tx_drops, c.tx_drops),
            elapsed,
        );
        let collisions = if tx.bytes == 0 {
            0
        } else {
            d(p.tx_collisions, c.tx_collisions)
        };
        Self {
            rx,
            tx,
            collisions,
            link_speed_mbps: c.link_speed_mbps,
        }
    }

    /// Link capacity in bytes per second, with a megabit counted as
    /// `1024 * 1024 / 8` bytes.
    pub fn max_bandwidth(&self) -> Option<u64> {
        self.link_speed_mbps.map(|mbps| mbps / 8 * 1024 * 1024)
    }

    fn link(&self) -> String {
        match (self.link_speed_mbps, self.max_bandwidth()) {
            (Some(mbps), Some(bw)) => format!("{mbps} mbit/s, {bw} B/s"),
            _ => "link speed unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetMetric {
    ReceiveThroughput,
    TransmitThroughput,
    ReceiveErrorPercent,
    ReceiveDropPercent,
    TransmitErrorPercent,
    TransmitDropPercent,
    Collisions,
}

/// One network interface.
pub struct NetworkEngine<S: CounterSource<Counters = NetCounters> = ProcNetDev> {
    delta: DeltaEngine<S>,
    name: String,
    rates: NetRates,
}

impl<S: CounterSource<Counters = NetCounters>> NetworkEngine<S> {
    pub fn new(source: S, clock: SharedClock) -> Self {
        let name = source.resource().to_string();
        Self {
            delta: DeltaEngine::new(source, clock),
            name,
            rates: NetRates::default(),
        }
    }

    pub fn rates(&self) -> &NetRates {
        &self.rates
    }
}

impl<S: CounterSource<Counters = NetCounters>> Engine for NetworkEngine<S> {
    type Metric = NetMetric;

    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self) -> Result<()> {
        self.delta.update()?;
        self.rates = NetRates::between(self.delta.previous(), self.delta.current());
        Ok(())
    }

    fn metric(&self, metric: NetMetric) -> f64 {
        let r = &self.rates;
        match metric {
            NetMetric::ReceiveThroughput => r.rx.throughput,
            NetMetric::TransmitThroughput => r.tx.throughput,
            NetMetric::ReceiveErrorPercent => r.rx.error_usage * 100.0,
            NetMetric::ReceiveDropPercent => r.rx.drop_usage * 100.0,
            NetMetric::TransmitErrorPercent => r.tx.error_usage * 100.0,
            NetMetric::TransmitDropPercent => r.tx.drop_usage * 100.0,
            NetMetric::Collisions => r.collisions as f64,
        }
    }

    fn is_warm(&self) -> bool {
        self.delta.is_warm()
    }
}

impl<S: CounterSource<Counters = NetCounters>> Report for NetworkEngine<S> {
    fn summary(&self) -> String {
        let r = &self.rates;
        format!(
            "{} ({}): rx {} B {} pkts {:.2}/ms err {:.2}% drop {:.2}%, \
             tx {} B {} pkts {:.2}/ms err {:.2}% drop {:.2}% colls {}",
            self.name,
            r.link(),
            r.rx.bytes,
            r.rx.packets,
            r.rx.throughput,
            r.rx.error_usage * 100.0,
            r.rx.drop_usage * 100.0,
            r.tx.bytes,
            r.tx.packets,
            r.tx.throughput,
            r.tx.error_usage * 100.0,
            r.tx.drop_usage * 100.0,
            r.collisions,
        )
    }

    fn csv_header(&self) -> Vec<String> {
        let n = &self.name;
        let rx = FLOW_COLUMNS.iter().map(|c| format!("{n}_rx_{c}"));
        let tx = FLOW_COLUMNS.iter().map(|c| format!("{n}_tx_{c}"));
        rx.chain(tx)
            .chain([
                format!("{n}_collisions"),
                format!("{n}_link_mbps"),
                format!("{n}_max_bandwidth"),
            ])
            .collect()
    }

    fn csv_row(&self) -> Vec<String> {
        let r = &self.rates;
        let known = |v: Option<u64>| v.map(|v| v.to_string()).unwrap_or_default();
        r.rx.csv_fields()
            .into_iter()
            .chain(r.tx.csv_fields())
            .chain([
                r.collisions.to_string(),
                known(r.link_speed_mbps),
                known(r.max_bandwidth()),
            ])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(
        ms: u64,
        rx_bytes: u64,
        rx_packets: u64,
        rx_errors: u64,
        rx_drops: u64,
    ) -> Sample<NetCounters> {
        Sample {
            counters: NetCounters {
                rx_bytes,
                rx_packets,
                rx_errors,
                rx_drops,
                ..Default::default()
            },
            nanos: ms * 1_000_000,
        }
    }

    #[test]
    fn receive_flow_ratios_are_over_packets() {
        let r = NetRates::between(&at(0, 0, 0, 0, 0), &at(1000, 50_000, 100, 5, 15));
        assert_eq!(r.rx.bytes, 50_000);
        assert_eq!(r.rx.throughput, 50.0);
        assert_eq!(r.rx.success, 80);
        assert_eq!(r.rx.error_usage, 0.05);
        assert_eq!(r.rx.drop_usage, 0.15);
        assert_eq!(r.rx.success_usage, 0.8);
        assert_eq!(r.tx, Flow::default());
    }

    #[test]
    fn packets_without_bytes_are_ignored() {
        let r = NetRates::between(&at(0, 10, 1, 0, 0), &at(1000, 10, 9, 3, 3));
        assert_eq!(r.rx, Flow::default());
    }

    #[test]
    fn errors_beyond_packets_saturate_success() {
        let r = NetRates::between(&at(0, 0, 0, 0, 0), &at(1000, 10, 2, 2, 2));
        assert_eq!(r.rx.success, 0);
        assert_eq!(r.rx.success_usage, 0.0);
    }

    #[test]
    fn counter_reset_reads_as_zero() {
        let r = NetRates::between(&at(0, 9_000, 90, 9, 9), &at(1000, 10, 1, 0, 0));
        assert_eq!(r, NetRates::default());
    }

    #[test]
    fn max_bandwidth_follows_link_speed() {
        let mut cur = at(1000, 0, 0, 0, 0);
        cur.counters.link_speed_mbps = Some(1000);
        let r = NetRates::between(&at(0, 0, 0, 0, 0), &cur);
        assert_eq!(r.link_speed_mbps, Some(1000));
        assert_eq!(r.max_bandwidth(), Some(125 * 1024 * 1024));
        assert_eq!(NetRates::default().max_bandwidth(), None);
    }
}
