//! Cooperative interruption points.
//!
//! Long-running work calls [`Checkpoint::check`] at page boundaries and
//! cell flushes. An implementation may block (pause) or return
//! [`Interrupted`] (cancel); the caller unwinds with `?`.

use std::fmt;

/// Signals that processing was cancelled at a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("processing cancelled")
    }
}

impl std::error::Error for Interrupted {}

/// A point where processing may pause or stop.
pub trait Checkpoint {
    /// Returns once processing may continue, or `Err(Interrupted)` when
    /// it must stop.
    fn check(&self) -> Result<(), Interrupted>;
}

/// Checkpoint that never pauses or cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCheckpoint;

impl Checkpoint for NoCheckpoint {
    fn check(&self) -> Result<(), Interrupted> {
        Ok(())
    }
}

impl<C: Checkpoint + ?Sized> Checkpoint for &C {
    fn check(&self) -> Result<(), Interrupted> {
        (**self).check()
    }
}
