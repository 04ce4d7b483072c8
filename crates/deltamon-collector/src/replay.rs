//! A scripted [`CounterSource`] for driving engines without `/proc`.
//!
//! ```
//! use deltamon_collector::{CounterSource, ReplaySource};
//!
//! let (mut source, handle) = ReplaySource::<u64>::new("fake");
//! handle.push(10);
//! handle.fail();
//! assert_eq!(source.read().unwrap(), 10);
//! assert!(source.read().is_err());
//! ```

use crate::CounterSource;
use deltamon_common::{MonitorError, Result, SourceFault};
use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

type Script<C> = Arc<Mutex<VecDeque<Option<C>>>>;

/// Returns queued values one per `read`. An exhausted queue or a queued
/// failure yields `SourceUnavailable`.
pub struct ReplaySource<C> {
    resource: String,
    script: Script<C>,
}

/// Feeds a [`ReplaySource`] after it has been moved into an engine.
#[derive(Clone)]
pub struct ReplayHandle<C> {
    script: Script<C>,
}

impl<C> ReplaySource<C> {
    pub fn new(resource: impl Into<String>) -> (Self, ReplayHandle<C>) {
        let script: Script<C> = Arc::new(Mutex::new(VecDeque::new()));
        let source = Self {
            resource: resource.into(),
            script: Arc::clone(&script),
        };
        (source, ReplayHandle { script })
    }
}

impl<C> ReplayHandle<C> {
    pub fn push(&self, counters: C) {
        self.lock().push_back(Some(counters));
    }

    pub fn push_all(&self, counters: impl IntoIterator<Item = C>) {
        self.lock().extend(counters.into_iter().map(Some));
    }

    /// Make the next read fail.
    pub fn fail(&self) {
        self.lock().push_back(None);
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Option<C>>> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<C> CounterSource for ReplaySource<C>
where
    C: Copy + Default + Debug + PartialEq + Send,
{
    type Counters = C;

    fn resource(&self) -> &str {
        &self.resource
    }

    fn read(&mut self) -> Result<C> {
        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(Some(counters)) => Ok(counters),
            Some(None) => Err(self.fault("scripted failure")),
            None => Err(self.fault("script exhausted")),
        }
    }
}

impl<C> ReplaySource<C> {
    fn fault(&self, detail: &str) -> MonitorError {
        MonitorError::unavailable(
            &self.resource,
            SourceFault::Malformed {
                path: format!("replay://{}", self.resource).into(),
                detail: detail.to_string(),
            },
        )
    }
}
