use deltamon_collector::CounterSource;
use deltamon_common::clock::SharedClock;
use deltamon_common::Result;
use tracing::debug;

/// Counters plus the monotonic time they were read at.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample<C> {
    pub counters: C,
    pub nanos: u64,
}

impl<C> Sample<C> {
    /// Nanoseconds from `earlier` to `self`, zero if the clock went backwards.
    pub fn elapsed_since(&self, earlier: &Sample<C>) -> u64 {
        self.nanos.saturating_sub(earlier.nanos)
    }
}

/// A read that has succeeded but not yet been applied.
///
/// Composite engines stage every member first and only commit once all
/// reads have succeeded.
#[derive(Debug, Clone, Copy)]
#[must_use]
pub struct Staged<C> {
    baseline: bool,
    sample: Sample<C>,
}

/// Two sample slots for one source with an index naming the current one.
///
/// ```
/// use deltamon_collector::ReplaySource;
/// use deltamon_common::clock::ManualClock;
/// use deltamon_engine::DeltaEngine;
/// use std::sync::Arc;
///
/// let (source, feed) = ReplaySource::<u64>::new("ticks");
/// let mut engine = DeltaEngine::new(source, Arc::new(ManualClock::new()));
/// feed.push_all([10, 25]);
///
/// engine.update().unwrap();
/// assert_eq!(engine.previous().counters, engine.current().counters);
/// engine.update().unwrap();
/// assert_eq!((engine.previous().counters, engine.current().counters), (10, 25));
/// ```
pub struct DeltaEngine<S: CounterSource> {
    source: S,
    clock: SharedClock,
    slots: [Sample<S::Counters>; 2],
    current: usize,
    warm: bool,
}

impl<S: CounterSource> DeltaEngine<S> {
    pub fn new(source: S, clock: SharedClock) -> Self {
        Self {
            source,
            clock,
            slots: [Sample::default(); 2],
            current: 0,
            warm: false,
        }
    }

    pub fn resource(&self) -> &str {
        self.source.resource()
    }

    /// Read the source without touching either slot.
    pub fn stage(&mut self) -> Result<Staged<S::Counters>> {
        let counters = self.source.read()?;
        Ok(Staged {
            baseline: !self.warm,
            sample: Sample {
                counters,
                nanos: self.clock.now_nanos(),
            },
        })
    }

    /// Apply a staged read: it lands in the non-current slot, which then
    /// becomes current. On the first commit the same sample also becomes the
    /// baseline, so the first window is empty.
    pub fn commit(&mut self, staged: Staged<S::Counters>) {
        let next = 1 - self.current;
        if staged.baseline {
            self.slots[self.current] = staged.sample;
            debug!(resource = self.source.resource(), "baseline captured");
        }
        self.slots[next] = staged.sample;
        self.current = next;
        self.warm = true;
    }

    pub fn update(&mut self) -> Result<()> {
        let staged = self.stage()?;
        self.commit(staged);
        Ok(())
    }

    pub fn current(&self) -> &Sample<S::Counters> {
        &self.slots[self.current]
    }

    pub fn previous(&self) -> &Sample<S::Counters> {
        &self.slots[1 - self.current]
    }

    pub fn is_warm(&self) -> bool {
        self.warm
    }
}
