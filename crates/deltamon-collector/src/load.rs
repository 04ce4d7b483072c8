use crate::procfs::{parse_f64, ProcRoot};
use crate::CounterSource;
use deltamon_common::{MonitorError, Result};

const PROC_LOADAVG: &str = "/proc/loadavg";
const RESOURCE: &str = "loadavg";

/// Run-queue averages over 1, 5 and 15 minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// Reads `/proc/loadavg`.
#[derive(Debug, Clone, Default)]
pub struct ProcLoadAvg {
    root: ProcRoot,
}

impl ProcLoadAvg {
    pub fn new(root: ProcRoot) -> Self {
        Self { root }
    }
}

impl CounterSource for ProcLoadAvg {
    type Counters = LoadAverage;

    fn resource(&self) -> &str {
        RESOURCE
    }

    fn read(&mut self) -> Result<LoadAverage> {
        let content = self
            .root
            .read(PROC_LOADAVG)
            .map_err(|fault| MonitorError::unavailable(RESOURCE, fault))?;
        let path = self.root.path(PROC_LOADAVG);
        let mut fields = content.split_whitespace();
        let mut next = |what: &str| {
            parse_f64(fields.next(), &path, what)
                .map_err(|fault| MonitorError::unavailable(RESOURCE, fault))
        };
        Ok(LoadAverage {
            one: next("1m")?,
            five: next("5m")?,
            fifteen: next("15m")?,
        })
    }
}
