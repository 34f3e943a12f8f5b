//! Progress reporting for long scans
//!
//! The inspector drives a [`ScanProgress`] collaborator: `begin(total)` once,
//! `increment()` once per record, `end()` once. `end()` is issued from a
//! drop guard ([`ProgressScope`]), so it runs even if a check panics.
//!
//! Three implementations ship with the crate:
//!
//! - [`NoProgress`] ignores everything
//! - [`BarProgress`] renders an `indicatif` progress bar
//! - [`CallbackProgress`] forwards [`ProgressInfo`] snapshots to a closure

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

/// Receiver of scan progress
pub trait ScanProgress {
    /// A pass over `total` records is starting
    fn begin(&mut self, total: usize);

    /// One more record has been processed
    fn increment(&mut self);

    /// The pass is over, successfully or not
    fn end(&mut self);
}

/// Scoped begin/end pairing around a pass
///
/// Calls `begin` on creation and `end` on drop.
pub struct ProgressScope<'a> {
    progress: &'a mut dyn ScanProgress,
}

impl<'a> ProgressScope<'a> {
    /// Begin a pass over `total` records
    pub fn begin(progress: &'a mut dyn ScanProgress, total: usize) -> Self {
        progress.begin(total);
        Self { progress }
    }

    /// Report one processed record
    pub fn increment(&mut self) {
        self.progress.increment();
    }
}

impl Drop for ProgressScope<'_> {
    fn drop(&mut self) {
        self.progress.end();
    }
}

/// Progress sink that ignores all calls
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ScanProgress for NoProgress {
    fn begin(&mut self, _total: usize) {}
    fn increment(&mut self) {}
    fn end(&mut self) {}
}

/// Terminal progress bar
#[derive(Debug, Default)]
pub struct BarProgress {
    message: String,
    bar: Option<ProgressBar>,
}

impl BarProgress {
    /// Create a bar labelled with `message`
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            bar: None,
        }
    }
}

impl ScanProgress for BarProgress {
    fn begin(&mut self, total: usize) {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message(self.message.clone());
        self.bar = Some(bar);
    }

    fn increment(&mut self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn end(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Snapshot passed to progress callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressInfo {
    /// Records processed so far
    pub processed: usize,
    /// Records in the pass
    pub total: usize,
    /// Whether the pass has ended
    pub finished: bool,
}

impl ProgressInfo {
    /// Get progress as a percentage (0-100)
    pub fn percentage(&self) -> Option<f32> {
        match self.total {
            0 => None,
            total => Some((self.processed as f32 / total as f32) * 100.0),
        }
    }
}

/// Progress callback for long-running operations
pub type ProgressCallback = Arc<dyn Fn(ProgressInfo) + Send + Sync>;

/// Forwards every progress event to a callback
pub struct CallbackProgress {
    callback: ProgressCallback,
    info: ProgressInfo,
}

impl CallbackProgress {
    /// Wrap a callback
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback,
            info: ProgressInfo {
                processed: 0,
                total: 0,
                finished: false,
            },
        }
    }
}

impl std::fmt::Debug for CallbackProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackProgress")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl ScanProgress for CallbackProgress {
    fn begin(&mut self, total: usize) {
        self.info = ProgressInfo {
            processed: 0,
            total,
            finished: false,
        };
        (self.callback)(self.info);
    }

    fn increment(&mut self) {
        self.info.processed += 1;
        (self.callback)(self.info);
    }

    fn end(&mut self) {
        self.info.finished = true;
        (self.callback)(self.info);
    }
}
