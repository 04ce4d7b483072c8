//! Threshold evaluation over scalar metric streams.
//!
//! A [`Threshold`] counts consecutive samples on the configured side of its
//! value and invokes its callback when the run reaches `required_hits`, then
//! starts counting again from zero. With `required_hits == 1` every
//! qualifying sample fires.

pub mod threshold;

#[cfg(test)]
mod tests;

pub use threshold::{Callback, Direction, Firing, Threshold, ThresholdSpec};
