//! Shared building blocks for the deltamon crates.
//!
//! Holds the error taxonomy every layer propagates, the monotonic clock the
//! engines stamp samples with, the once-queried [`context::SystemContext`],
//! and the [`types::Report`] trait used by the presentation layer.

pub mod clock;
pub mod context;
pub mod error;
pub mod types;

pub use error::{MonitorError, Result, SourceFault};
