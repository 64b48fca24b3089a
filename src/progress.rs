// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Meshmend Team

//! Progressive execution: bounded-increment passes, progress snapshots,
//! and cooperative cancellation.
//!
//! Long passes never run to completion in one call. Each implements
//! [`Pass`] and performs a bounded amount of work per [`Pass::step`],
//! returning a [`Report`] snapshot. A host driver pulls one snapshot per
//! scheduling tick (via [`Pass::snapshots`]) or loops to completion with
//! [`drive`]. Cancellation is checked only at step boundaries, so the
//! worst-case latency is one increment of work.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outer-loop vertices processed per weld increment
pub const WELD_STEP: usize = 500;

/// Triangles processed per scan increment (boundary, closure, volume)
pub const SCAN_STEP: usize = 300;

/// Shared cancellation signal. Cloning yields a handle to the same
/// underlying flag; each operation gets its own token so independent
/// operations cannot clobber each other.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The in-flight pass honors it at its next
    /// step boundary.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Snapshot of a pass in flight. Advisory only: drivers may display it,
/// but correctness never depends on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Fractional progress in [0, 1]
    pub progress: f64,
    /// Human-readable phase label
    pub phase: String,
    pub finished: bool,
    pub cancelled: bool,
}

impl Report {
    pub fn running(progress: f64, phase: impl Into<String>) -> Self {
        Self {
            progress: progress.clamp(0.0, 1.0),
            phase: phase.into(),
            finished: false,
            cancelled: false,
        }
    }

    pub fn finished(phase: impl Into<String>) -> Self {
        Self {
            progress: 1.0,
            phase: phase.into(),
            finished: true,
            cancelled: false,
        }
    }

    pub fn cancelled(progress: f64, phase: impl Into<String>) -> Self {
        Self {
            progress: progress.clamp(0.0, 1.0),
            phase: phase.into(),
            finished: false,
            cancelled: true,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.finished || self.cancelled
    }

    /// Remap this snapshot's progress into the [lo, hi] window of an
    /// enclosing composite pass
    pub fn rescaled(mut self, lo: f64, hi: f64) -> Self {
        self.progress = lo + self.progress * (hi - lo);
        self
    }
}

/// An incrementally-resumable computation.
///
/// `step` runs one bounded increment; once the returned snapshot is
/// terminal, further calls return the same snapshot and do no work.
pub trait Pass {
    type Output;

    fn step(&mut self) -> Report;

    /// Output of a finished pass; `None` if cancelled or never finished
    fn into_output(self) -> Option<Self::Output>;

    /// Lazy, finite sequence of progress snapshots, one per increment.
    /// Ends after the first terminal snapshot.
    fn snapshots(&mut self) -> Snapshots<'_, Self>
    where
        Self: Sized,
    {
        Snapshots {
            pass: self,
            done: false,
        }
    }
}

/// Pull-based snapshot iterator over a pass (see [`Pass::snapshots`])
pub struct Snapshots<'a, P: Pass> {
    pass: &'a mut P,
    done: bool,
}

impl<P: Pass> Iterator for Snapshots<'_, P> {
    type Item = Report;

    fn next(&mut self) -> Option<Report> {
        if self.done {
            return None;
        }
        let report = self.pass.step();
        self.done = report.is_terminal();
        Some(report)
    }
}

/// Terminal state of a driven pass. Cancellation is a first-class
/// outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Done(T),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    pub fn into_done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }
}

/// Run a pass to its terminal state, forwarding every snapshot to
/// `on_progress`
pub fn drive<P: Pass>(mut pass: P, mut on_progress: impl FnMut(&Report)) -> Outcome<P::Output> {
    loop {
        let report = pass.step();
        on_progress(&report);
        if report.cancelled {
            return Outcome::Cancelled;
        }
        if report.finished {
            break;
        }
    }
    match pass.into_output() {
        Some(output) => Outcome::Done(output),
        None => Outcome::Cancelled,
    }
}
