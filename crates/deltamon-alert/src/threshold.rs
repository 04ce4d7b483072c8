use deltamon_common::{MonitorError, Result};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Which side of the threshold value qualifies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `value > threshold`
    #[default]
    Exceed,
    /// `value < threshold`
    Deceed,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exceed" | "above" | "gt" => Ok(Self::Exceed),
            "deceed" | "below" | "lt" => Ok(Self::Deceed),
            _ => Err(format!("unknown threshold direction: {s}")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exceed => write!(f, "exceed"),
            Self::Deceed => write!(f, "deceed"),
        }
    }
}

impl Direction {
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Exceed => value > threshold,
            Self::Deceed => value < threshold,
        }
    }
}

/// Fixed configuration of a threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdSpec {
    pub name: String,
    pub value: f64,
    pub direction: Direction,
    /// Consecutive qualifying samples needed to fire. At least 1.
    pub required_hits: u32,
    /// Maximum number of firings, 0 for unlimited.
    pub limit: u64,
}

impl ThresholdSpec {
    pub fn new(name: impl Into<String>, value: f64, direction: Direction) -> Self {
        Self {
            name: name.into(),
            value,
            direction,
            required_hits: 1,
            limit: 0,
        }
    }

    pub fn exceed(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, value, Direction::Exceed)
    }

    pub fn deceed(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, value, Direction::Deceed)
    }

    pub fn with_required_hits(mut self, hits: u32) -> Self {
        self.required_hits = hits;
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }
}

impl fmt::Display for ThresholdSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {} x{})",
            self.name, self.direction, self.value, self.required_hits
        )
    }
}

/// What a callback sees when its threshold fires.
#[derive(Debug, Clone, Copy)]
pub struct Firing<'a> {
    pub spec: &'a ThresholdSpec,
    /// The sample that completed the run.
    pub value: f64,
    /// Firings so far, this one included.
    pub fire_count: u64,
}

pub type Callback = Box<dyn FnMut(&Firing<'_>) + Send>;

/// A directional trigger with a consecutive-hit requirement.
///
/// ```
/// use deltamon_alert::{Threshold, ThresholdSpec};
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use std::sync::Arc;
///
/// let hits = Arc::new(AtomicU64::new(0));
/// let seen = Arc::clone(&hits);
/// let mut t = Threshold::new(
///     ThresholdSpec::exceed("cpu-high", 80.0).with_required_hits(2),
///     move |_| {
///         seen.fetch_add(1, Ordering::SeqCst);
///     },
/// )
/// .unwrap();
///
/// for v in [90.0, 50.0, 90.0, 90.0] {
///     t.evaluate(v);
/// }
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
pub struct Threshold {
    spec: ThresholdSpec,
    run: u32,
    fired: u64,
    callback: Callback,
}

impl Threshold {
    /// # Errors
    ///
    /// `Configuration` if `required_hits` is zero.
    pub fn new<F>(spec: ThresholdSpec, callback: F) -> Result<Self>
    where
        F: FnMut(&Firing<'_>) + Send + 'static,
    {
        if spec.required_hits == 0 {
            return Err(MonitorError::config(format!(
                "threshold {} needs at least one hit to fire",
                spec.name
            )));
        }
        Ok(Self {
            spec,
            run: 0,
            fired: 0,
            callback: Box::new(callback),
        })
    }

    /// Feed one sample. Returns `true` if the callback was invoked.
    ///
    /// Once `limit` firings have happened the run counter keeps cycling but
    /// the callback is no longer called.
    pub fn evaluate(&mut self, value: f64) -> bool {
        if !self.spec.direction.holds(value, self.spec.value) {
            self.run = 0;
            return false;
        }

        self.run += 1;
        if self.run < self.spec.required_hits {
            return false;
        }
        self.run = 0;

        if self.is_exhausted() {
            debug!(threshold = %self.spec.name, value, "firing suppressed, limit reached");
            return false;
        }

        self.fired += 1;
        debug!(
            threshold = %self.spec.name,
            value,
            fired = self.fired,
            "threshold fired"
        );
        (self.callback)(&Firing {
            spec: &self.spec,
            value,
            fire_count: self.fired,
        });
        true
    }

    pub fn spec(&self) -> &ThresholdSpec {
        &self.spec
    }

    /// Consecutive qualifying samples since the last reset.
    pub fn run_count(&self) -> u32 {
        self.run
    }

    pub fn fire_count(&self) -> u64 {
        self.fired
    }

    pub fn is_exhausted(&self) -> bool {
        self.spec.limit > 0 && self.fired >= self.spec.limit
    }
}

impl fmt::Debug for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Threshold")
            .field("spec", &self.spec)
            .field("run", &self.run)
            .field("fired", &self.fired)
            .finish_non_exhaustive()
    }
}
