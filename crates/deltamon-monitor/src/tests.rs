use crate::monitor::{CpuMonitor, DiskMonitor, Monitor, NetworkMonitor, ResourceMonitor};
use deltamon_alert::{Threshold, ThresholdSpec};
use deltamon_collector::{CpuTimes, DiskCounters, NetCounters, ReplayHandle, ReplaySource};
use deltamon_common::clock::ManualClock;
use deltamon_common::types::Report;
use deltamon_engine::{
    CpuEngine, CpuMetric, DiskEngine, DiskMetric, DiskRates, Engine, NetworkEngine,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn busy(usr: u64, idle: u64) -> CpuTimes {
    CpuTimes {
        usr,
        idle,
        ..Default::default()
    }
}

fn single_core() -> (CpuMonitor<ReplaySource<CpuTimes>>, ReplayHandle<CpuTimes>) {
    let (source, feed) = ReplaySource::new("cpu0");
    let engine = CpuEngine::new(vec![source], Arc::new(ManualClock::new())).unwrap();
    (Monitor::new(engine), feed)
}

fn logging(name: &str, log: &Arc<Mutex<Vec<String>>>) -> Threshold {
    let log = Arc::clone(log);
    Threshold::new(ThresholdSpec::exceed(name, -1.0), move |f| {
        log.lock().unwrap().push(f.spec.name.clone());
    })
    .unwrap()
}

#[test]
fn failed_refresh_skips_evaluation_and_keeps_metrics() {
    let (mut monitor, feed) = single_core();
    let evaluated = Arc::new(Mutex::new(Vec::new()));
    monitor.add_cpu_usage_threshold(logging("any", &evaluated));

    feed.push_all([busy(0, 0), busy(40, 60)]);
    monitor.update().unwrap();
    monitor.update().unwrap();
    let after_good_tick = monitor.metric(CpuMetric::Usage);
    let row = monitor.csv_row();
    assert_eq!(after_good_tick, 40.0);
    assert_eq!(evaluated.lock().unwrap().len(), 2);

    feed.fail();
    let err = monitor.update().unwrap_err();

    assert!(err.is_source_unavailable());
    assert_eq!(monitor.metric(CpuMetric::Usage), after_good_tick);
    assert_eq!(monitor.csv_row(), row);
    assert_eq!(evaluated.lock().unwrap().len(), 2);

    feed.push(busy(100, 100));
    monitor.update().unwrap();
    assert_eq!(monitor.metric(CpuMetric::Usage), 60.0);
    assert_eq!(evaluated.lock().unwrap().len(), 3);
}

#[test]
fn source_failure_on_second_tick_spans_the_next_window() {
    let clock = ManualClock::new();
    let (source, feed) = ReplaySource::new("sda");
    let mut monitor: DiskMonitor<_> =
        Monitor::new(DiskEngine::new(source, Arc::new(clock.clone())));
    let evaluated = Arc::new(Mutex::new(Vec::new()));
    monitor.add_read_throughput_threshold(logging("any", &evaluated));

    feed.push(DiskCounters {
        sector_size: 512,
        ..Default::default()
    });
    monitor.update().unwrap();
    assert_eq!(evaluated.lock().unwrap().len(), 1);

    clock.advance(Duration::from_secs(1));
    feed.fail();
    let err = monitor.update().unwrap_err();
    assert!(err.is_source_unavailable());
    assert_eq!(*monitor.engine().rates(), DiskRates::default());
    assert_eq!(evaluated.lock().unwrap().len(), 1);

    clock.advance(Duration::from_secs(1));
    feed.push(DiskCounters {
        read_count: 2,
        read_sectors: 8,
        sector_size: 512,
        ..Default::default()
    });
    monitor.update().unwrap();

    // 4096 bytes over the two seconds since the warm-up sample.
    assert_eq!(monitor.metric(DiskMetric::ReadThroughput), 2048.0);
    assert_eq!(evaluated.lock().unwrap().len(), 2);
}

#[test]
fn thresholds_run_in_registration_order() {
    let (mut monitor, feed) = single_core();
    let order = Arc::new(Mutex::new(Vec::new()));
    monitor
        .add_threshold(CpuMetric::Idle, logging("idle", &order))
        .add_cpu_usage_threshold(logging("usage-a", &order))
        .add_threshold(CpuMetric::User, logging("user", &order))
        .add_cpu_usage_threshold(logging("usage-b", &order));

    feed.push(busy(1, 1));
    monitor.update().unwrap();

    assert_eq!(
        *order.lock().unwrap(),
        vec!["idle", "usage-a", "user", "usage-b"]
    );
}

#[test]
fn sustained_cpu_load_fires_after_three_ticks() {
    let (mut monitor, feed) = single_core();
    let fired = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&fired);
    monitor.add_cpu_usage_threshold(
        Threshold::new(
            ThresholdSpec::exceed("cpu-high", 80.0).with_required_hits(3),
            move |f| log.lock().unwrap().push(f.value),
        )
        .unwrap(),
    );

    // Per-window usage: 0 (warm-up), 85, 90, 70, 95, 95, 95.
    let mut usr = 0;
    let mut idle = 0;
    feed.push(busy(usr, idle));
    for pct in [85, 90, 70, 95, 95, 95] {
        usr += pct;
        idle += 100 - pct;
        feed.push(busy(usr, idle));
    }
    for _ in 0..7 {
        monitor.update().unwrap();
    }

    assert_eq!(*fired.lock().unwrap(), vec![95.0]);
}

#[test]
fn disk_and_network_helpers_watch_throughput() {
    let clock = ManualClock::new();
    let (source, disk_feed) = ReplaySource::new("sda");
    let mut disk: DiskMonitor<_> = Monitor::new(DiskEngine::new(source, Arc::new(clock.clone())));
    let (source, net_feed) = ReplaySource::new("eth0");
    let mut net: NetworkMonitor<_> =
        Monitor::new(NetworkEngine::new(source, Arc::new(clock.clone())));

    let hits = Arc::new(Mutex::new(Vec::new()));
    let high = |name: &str, value: f64| {
        let log = Arc::clone(&hits);
        let name = name.to_string();
        Threshold::new(ThresholdSpec::exceed(name, value), move |f| {
            log.lock().unwrap().push(f.spec.name.clone());
        })
        .unwrap()
    };
    disk.add_read_throughput_threshold(high("disk-read", 1000.0))
        .add_write_throughput_threshold(high("disk-write", 1000.0));
    net.add_receive_throughput_threshold(high("net-rx", 1.0))
        .add_transmit_throughput_threshold(high("net-tx", 1.0));

    disk_feed.push_all([
        DiskCounters {
            sector_size: 512,
            ..Default::default()
        },
        DiskCounters {
            read_count: 1,
            read_sectors: 4,
            write_count: 1,
            write_sectors: 1,
            sector_size: 512,
        },
    ]);
    net_feed.push_all([
        NetCounters::default(),
        NetCounters {
            rx_bytes: 5000,
            rx_packets: 5,
            tx_bytes: 500,
            tx_packets: 1,
            ..Default::default()
        },
    ]);

    disk.update().unwrap();
    net.update().unwrap();
    clock.advance(Duration::from_secs(1));
    disk.update().unwrap();
    net.update().unwrap();

    // 2048 B/s read, 512 B/s write; 5 and 0.5 bytes per ms.
    assert_eq!(*hits.lock().unwrap(), vec!["disk-read", "net-rx"]);
}

#[test]
fn dyn_monitors_share_one_loop() {
    let (cpu, cpu_feed) = single_core();
    let (source, mem_feed) = ReplaySource::new("memory");
    let mut memory = Monitor::new(deltamon_engine::MemoryEngine::new(source));
    let low = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&low);
    memory.add_free_percent_threshold(
        Threshold::new(ThresholdSpec::deceed("free-low", 10.0), move |f| {
            log.lock().unwrap().push(f.value)
        })
        .unwrap(),
    );

    let mut monitors: Vec<Box<dyn ResourceMonitor>> = vec![Box::new(cpu), Box::new(memory)];
    cpu_feed.push(busy(1, 1));
    mem_feed.push(deltamon_collector::MemoryInfo {
        total_kb: 100,
        free_kb: 5,
        ..Default::default()
    });

    let results: Vec<_> = monitors.iter_mut().map(|m| m.update()).collect();

    assert!(results.iter().all(|r| r.is_ok()));
    assert!(monitors.iter().all(|m| m.is_warm()));
    assert_eq!(monitors[1].name(), "memory");
    assert!(monitors[0].summary().starts_with("cpu:"));
    assert_eq!(*low.lock().unwrap(), vec![5.0]);
}

#[test]
fn report_delegates_to_the_engine() {
    let (monitor, _feed) = single_core();
    assert_eq!(monitor.csv_header(), monitor.engine().csv_header());
    assert_eq!(monitor.engine().name(), "cpu");
}
