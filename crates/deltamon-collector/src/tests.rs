use crate::devices::{list_disks, list_nics};
use crate::*;
use deltamon_common::context::SystemContext;
use deltamon_common::MonitorError;
use std::fs;
use tempfile::TempDir;

fn write(root: &TempDir, rel: &str, content: &str) {
    let path = root.path().join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn fixture() -> (TempDir, ProcRoot) {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "proc/stat",
        "cpu  20 0 10 200 2 0 0 0 0 0\ncpu0 10 0 5 100 1 0 0 0 0 0\ncpu1 10 0 5 100 1 0 0 0 0 0\n",
    );
    write(
        &dir,
        "proc/partitions",
        "major minor  #blocks  name\n\n   8        0  488386584 sda\n   8        1     524288 sda1\n",
    );
    write(
        &dir,
        "proc/diskstats",
        "   8       0 sda 100 0 800 0 50 0 400 0 0 0 0\n   8       1 sda1 10 0 80 0 5 0 40 0 0 0 0\n",
    );
    write(&dir, "sys/block/sda/queue/hw_sector_size", "512\n");
    write(&dir, "sys/class/net/eth0/speed", "1000\n");
    write(
        &dir,
        "proc/net/dev",
        "Inter-| Receive | Transmit\n face |bytes packets|bytes packets\n    lo: 100 1 0 0 0 0 0 0 100 1 0 0 0 0 0 0\n  eth0: 2000 20 1 1 0 0 0 0 1000 10 0 0 0 2 0 0\n",
    );
    write(
        &dir,
        "proc/meminfo",
        "MemTotal: 1000 kB\nMemFree: 200 kB\nMemAvailable: 600 kB\nBuffers: 100 kB\nCached: 300 kB\n",
    );
    write(&dir, "proc/loadavg", "0.50 0.75 1.25 2/300 4242\n");
    let root = ProcRoot::new(dir.path());
    (dir, root)
}

#[test]
fn lists_interfaces_after_the_header() {
    let (_dir, root) = fixture();
    assert_eq!(list_nics(&root).unwrap(), vec!["lo", "eth0"]);
}

#[test]
fn lists_partitions_by_last_column() {
    let (_dir, root) = fixture();
    assert_eq!(list_disks(&root).unwrap(), vec!["sda", "sda1"]);
}

#[test]
fn cpu_sources_cover_every_core() {
    let (_dir, root) = fixture();
    let ctx = SystemContext::fixed(2);
    let mut sources = ProcStatCore::all(&root, &ctx).unwrap();
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[1].resource(), "cpu1");
    let times = sources[0].read().unwrap();
    assert_eq!(times.total(), 116);
}

#[test]
fn partition_sector_size_falls_back_to_parent() {
    let (_dir, root) = fixture();
    let mut disk = ProcDiskStats::new(root, "sda1").unwrap();
    assert_eq!(disk.sector_size(), 512);
    let counters = disk.read().unwrap();
    assert_eq!(counters.read_bytes(), 80 * 512);
    assert_eq!(counters.write_bytes(), 40 * 512);
}

#[test]
fn unparsable_partition_sector_size_falls_back_to_parent() {
    let (dir, root) = fixture();
    write(&dir, "sys/block/sda1/queue/hw_sector_size", "n/a\n");
    let disk = ProcDiskStats::new(root, "sda1").unwrap();
    assert_eq!(disk.sector_size(), 512);
}

#[test]
fn unknown_disk_is_rejected_at_construction() {
    let (_dir, root) = fixture();
    let err = ProcDiskStats::new(root, "sdz").err().unwrap();
    assert!(matches!(err, MonitorError::Configuration(_)));
}

#[test]
fn empty_interface_name_means_loopback() {
    let (_dir, root) = fixture();
    let mut nic = ProcNetDev::new(root, "").unwrap();
    assert_eq!(nic.resource(), "lo");
    assert_eq!(nic.read().unwrap().rx_bytes, 100);
}

#[test]
fn link_speed_is_read_from_sysfs() {
    let (_dir, root) = fixture();
    let mut eth0 = ProcNetDev::new(root.clone(), "eth0").unwrap();
    assert_eq!(eth0.link_speed_mbps(), Some(1000));
    assert_eq!(eth0.read().unwrap().link_speed_mbps, Some(1000));

    let lo = ProcNetDev::new(root, "lo").unwrap();
    assert_eq!(lo.link_speed_mbps(), None);
}

#[test]
fn negative_link_speed_is_unknown() {
    let (dir, root) = fixture();
    write(&dir, "sys/class/net/eth0/speed", "-1\n");
    let eth0 = ProcNetDev::new(root, "eth0").unwrap();
    assert_eq!(eth0.link_speed_mbps(), None);
}

#[test]
fn unknown_interface_is_rejected_at_construction() {
    let (_dir, root) = fixture();
    let err = ProcNetDev::new(root, "eth").err().unwrap();
    assert!(matches!(err, MonitorError::Configuration(_)));
}

#[test]
fn vanished_file_is_source_unavailable() {
    let (dir, root) = fixture();
    let mut nic = ProcNetDev::new(root, "eth0").unwrap();
    fs::remove_file(dir.path().join("proc/net/dev")).unwrap();
    let err = nic.read().unwrap_err();
    assert!(err.is_source_unavailable());
    assert!(err.to_string().starts_with("eth0"));
}

#[test]
fn gauges_read_from_fixtures() {
    let (_dir, root) = fixture();
    let mem = ProcMeminfo::new(root.clone()).read().unwrap();
    assert_eq!(mem.total_kb, 1000);
    assert_eq!(mem.cached_kb, 300);

    let load = ProcLoadAvg::new(root).read().unwrap();
    assert_eq!(load.one, 0.5);
    assert_eq!(load.fifteen, 1.25);
}

#[test]
fn replay_source_replays_then_fails() {
    let (mut source, handle) = ReplaySource::<CpuTimes>::new("cpu0");
    handle.push(CpuTimes {
        idle: 5,
        ..Default::default()
    });
    assert_eq!(handle.pending(), 1);
    assert_eq!(source.read().unwrap().idle, 5);
    assert!(source.read().unwrap_err().is_source_unavailable());
}
