//! Pause, resume and cancel for a running parse.
//!
//! [`ParseControl`] is a cloneable handle shared between the thread that
//! runs [`DataParser::parse`](crate::DataParser::parse) and any thread that
//! wants to steer it. The parse polls it at page boundaries, cell flushes
//! and before each row emission through the [`Checkpoint`] trait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use pdfdata_core::{Checkpoint, Interrupted};
use tracing::debug;

/// Lifecycle of a [`DataParser`](crate::DataParser).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub enum ParserState {
    /// Not started.
    #[default]
    Idle,
    /// Iterating pages.
    Started,
    /// Started, but waiting for [`ParseControl::resume`].
    Paused,
    /// Stopped early because the stop heading was found.
    TableDone,
    /// All pages in scope were processed.
    Finished,
    /// Stopped by [`ParseControl::cancel`].
    Cancelled,
}

#[derive(Debug, Default)]
struct Shared {
    cancelled: AtomicBool,
    paused: Mutex<bool>,
    resumed: Condvar,
    state: Mutex<ParserState>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cloneable pause/resume/cancel handle.
#[derive(Debug, Clone, Default)]
pub struct ParseControl {
    shared: Arc<Shared>,
}

impl ParseControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block the parse at its next checkpoint until [`resume`](Self::resume)
    /// or [`cancel`](Self::cancel).
    pub fn pause(&self) {
        *lock(&self.shared.paused) = true;
        debug!("parse paused");
    }

    pub fn resume(&self) {
        *lock(&self.shared.paused) = false;
        self.shared.resumed.notify_all();
        debug!("parse resumed");
    }

    /// Stop the parse at its next checkpoint. Terminal: a cancelled
    /// control stays cancelled.
    pub fn cancel(&self) {
        let mut paused = lock(&self.shared.paused);
        self.shared.cancelled.store(true, Ordering::SeqCst);
        *paused = false;
        drop(paused);
        self.shared.resumed.notify_all();
        debug!("parse cancelled");
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        *lock(&self.shared.paused)
    }

    /// Current state as seen from any thread.
    pub fn state(&self) -> ParserState {
        if self.is_cancelled() {
            return ParserState::Cancelled;
        }
        let state = *lock(&self.shared.state);
        if state == ParserState::Started && self.is_paused() {
            ParserState::Paused
        } else {
            state
        }
    }

    pub(crate) fn set_state(&self, state: ParserState) {
        *lock(&self.shared.state) = state;
    }
}

impl Checkpoint for ParseControl {
    fn check(&self) -> Result<(), Interrupted> {
        let mut paused = lock(&self.shared.paused);
        while *paused && !self.is_cancelled() {
            paused = self
                .shared
                .resumed
                .wait(paused)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if self.is_cancelled() {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }
}
