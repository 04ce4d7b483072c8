use crate::devices;
use crate::procfs::{parse_u64, ProcRoot};
use crate::CounterSource;
use deltamon_common::{MonitorError, Result, SourceFault};

const PROC_NET_DEV: &str = "/proc/net/dev";
const DEFAULT_INTERFACE: &str = "lo";

/// Cumulative traffic counters of one interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetCounters {
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errors: u64,
    pub rx_drops: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errors: u64,
    pub tx_drops: u64,
    pub tx_collisions: u64,
    /// Negotiated link speed in Mbit/s, when the kernel reports one.
    pub link_speed_mbps: Option<u64>,
}

/// Reads one interface's line of `/proc/net/dev`.
pub struct ProcNetDev {
    root: ProcRoot,
    name: String,
    link_speed_mbps: Option<u64>,
}

impl ProcNetDev {
    /// An empty `name` selects the loopback interface.
    ///
    /// # Errors
    ///
    /// `Configuration` if the interface is not present in `/proc/net/dev`.
    pub fn new(root: ProcRoot, name: &str) -> Result<Self> {
        let name = if name.is_empty() {
            DEFAULT_INTERFACE
        } else {
            name
        };

        let known = devices::list_nics(&root)
            .map_err(|e| MonitorError::config(format!("cannot list interfaces: {e}")))?;
        if !known.iter().any(|nic| nic == name) {
            return Err(MonitorError::config(format!(
                "{name} is not a valid network interface"
            )));
        }

        let link_speed_mbps = link_speed(&root, name);
        Ok(Self {
            root,
            name: name.to_string(),
            link_speed_mbps,
        })
    }

    pub fn link_speed_mbps(&self) -> Option<u64> {
        self.link_speed_mbps
    }
}

impl CounterSource for ProcNetDev {
    type Counters = NetCounters;

    fn resource(&self) -> &str {
        &self.name
    }

    fn read(&mut self) -> Result<NetCounters> {
        let content = self
            .root
            .read(PROC_NET_DEV)
            .map_err(|fault| MonitorError::unavailable(&self.name, fault))?;
        parse_net_dev(&content, &self.name, &self.root.path(PROC_NET_DEV))
            .map(|mut counters| {
                counters.link_speed_mbps = self.link_speed_mbps;
                counters
            })
            .map_err(|fault| MonitorError::unavailable(&self.name, fault))
    }
}

fn parse_net_dev(
    content: &str,
    name: &str,
    path: &std::path::Path,
) -> std::result::Result<NetCounters, SourceFault> {
    let stats = content
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(iface, _)| iface.trim() == name)
        .map(|(_, stats)| stats)
        .ok_or_else(|| SourceFault::Missing {
            what: format!("interface {name}"),
            path: path.to_path_buf(),
        })?;

    // rx: bytes packets errs drop fifo frame compressed multicast
    // tx: bytes packets errs drop fifo colls carrier compressed
    let f: Vec<&str> = stats.split_whitespace().collect();
    let field = |i: usize, what: &str| parse_u64(f.get(i).copied(), path, what);

    Ok(NetCounters {
        rx_bytes: field(0, "rx bytes")?,
        rx_packets: field(1, "rx packets")?,
        rx_errors: field(2, "rx errs")?,
        rx_drops: field(3, "rx drop")?,
        tx_bytes: field(8, "tx bytes")?,
        tx_packets: field(9, "tx packets")?,
        tx_errors: field(10, "tx errs")?,
        tx_drops: field(11, "tx drop")?,
        tx_collisions: field(13, "tx colls")?,
        link_speed_mbps: None,
    })
}

/// `/sys/class/net/<name>/speed`. Virtual and down links report `-1` or
/// nothing at all.
fn link_speed(root: &ProcRoot, name: &str) -> Option<u64> {
    let raw = root.read(&format!("/sys/class/net/{name}/speed")).ok()?;
    let speed = raw.trim().parse::<i64>().ok()?;
    match u64::try_from(speed) {
        Ok(mbps) if mbps > 0 => Some(mbps),
        _ => {
            tracing::debug!(nic = name, speed, "link speed not reported");
            None
        }
    }
}
