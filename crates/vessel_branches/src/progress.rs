//! Fractional progress reporting.
//!
//! Observers register a plain callback receiving values in `[0, 1]`. Stages
//! running on rayon workers finish units of work out of order; the reporter
//! serializes them and forwards only increasing values, so observers always
//! see a non-decreasing sequence ending at exactly `1.0`.
//!
//! ```ignore
//! let (observer, rx) = vessel_branches::progress::channel();
//! let result = decompose_with_progress(&grid, &junctions, &config, &observer)?;
//! let seen: Vec<f32> = rx.try_iter().collect();
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crossbeam_channel::Receiver;

/// Progress observer callback.
pub type ProgressFn<'a> = &'a (dyn Fn(f32) + Sync);

/// Callback forwarding every progress value into a channel.
///
/// The receiver may live on another thread; dropping it silently discards
/// further values.
pub fn channel() -> (impl Fn(f32) + Send + Sync, Receiver<f32>) {
  let (tx, rx) = crossbeam_channel::unbounded();
  let observer = move |fraction: f32| {
    let _ = tx.send(fraction);
  };
  (observer, rx)
}

/// Monotonic front end for an optional observer.
pub(crate) struct ProgressReporter<'a> {
  observer: Option<ProgressFn<'a>>,
  last: Mutex<f32>,
}

impl<'a> ProgressReporter<'a> {
  pub(crate) fn new(observer: Option<ProgressFn<'a>>) -> Self {
    Self {
      observer,
      last: Mutex::new(0.0),
    }
  }

  /// Reporter that drops every value.
  pub(crate) fn silent() -> Self {
    Self::new(None)
  }

  /// Forward `fraction` if it exceeds everything reported so far.
  pub(crate) fn report(&self, fraction: f32) {
    let Some(observer) = self.observer else {
      return;
    };
    let fraction = fraction.clamp(0.0, 1.0);
    let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
    if fraction > *last {
      *last = fraction;
      observer(fraction);
    }
  }

  /// Sub-range `[start, start + weight]` covering `total` units of work.
  pub(crate) fn stage(&self, start: f32, weight: f32, total: usize) -> StageProgress<'_, 'a> {
    StageProgress {
      reporter: self,
      start,
      weight,
      total: total.max(1),
      done: AtomicUsize::new(0),
    }
  }
}

/// Progress of one pipeline stage, shareable across rayon workers.
pub(crate) struct StageProgress<'r, 'a> {
  reporter: &'r ProgressReporter<'a>,
  start: f32,
  weight: f32,
  total: usize,
  done: AtomicUsize,
}

impl StageProgress<'_, '_> {
  /// Mark `units` more units of work as done.
  pub(crate) fn advance(&self, units: usize) {
    let done = (self.done.fetch_add(units, Ordering::Relaxed) + units).min(self.total);
    let fraction = done as f32 / self.total as f32;
    self.reporter.report(self.start + self.weight * fraction);
  }

  /// Mark the stage complete.
  pub(crate) fn finish(&self) {
    self.reporter.report(self.start + self.weight);
  }
}
