//! First-error latch shared by the pipeline stages.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use crossbeam_channel::Sender;
use tracing::{debug, error};

use super::PipelineEvent;
use crate::error::ParserError;

/// Records the first stage failure and gates progress events.
///
/// Stages running in parallel all report into one latch. The first error
/// wins: it is logged, delivered as a single [`PipelineEvent::Error`] and
/// later returned by the pipeline. Later errors and all progress events
/// after the trip are dropped.
///
/// Checking the latch and sending happen under one lock, so no progress event
/// can be delivered after the error event.
#[derive(Debug)]
pub struct ErrorLatch<'s> {
    first: OnceLock<ParserError>,
    events: Option<&'s Sender<PipelineEvent>>,
    gate: Mutex<()>,
}

impl<'s> ErrorLatch<'s> {
    /// Creates an untripped latch forwarding events to `events`, if any.
    #[must_use]
    pub fn new(events: Option<&'s Sender<PipelineEvent>>) -> Self {
        Self {
            first: OnceLock::new(),
            events,
            gate: Mutex::new(()),
        }
    }

    /// Returns `true` once an error has been recorded.
    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.first.get().is_some()
    }

    /// Returns `true` if progress events have a receiver to go to.
    #[must_use]
    pub fn has_listener(&self) -> bool {
        self.events.is_some()
    }

    /// Sends a progress event unless the latch has tripped.
    pub fn emit(&self, event: PipelineEvent) {
        let _gate = self.lock();
        if self.is_tripped() {
            return;
        }
        self.send(event);
    }

    /// Records `err` if it is the first error.
    ///
    /// Returns `true` if this call tripped the latch.
    pub fn trip(&self, err: ParserError) -> bool {
        let message = err.to_string();
        let _gate = self.lock();
        if self.first.set(err).is_err() {
            debug!(%message, "Suppressed error after the first failure");
            return false;
        }

        error!(%message, "Replay parsing failed");
        self.send(PipelineEvent::Error { message });
        true
    }

    /// Consumes the latch, returning the recorded error.
    #[must_use]
    pub fn into_error(self) -> Option<ParserError> {
        self.first.into_inner()
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded data is (), so a poisoned lock is still usable
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send(&self, event: PipelineEvent) {
        if let Some(events) = self.events {
            // A dropped receiver only means nobody is listening
            let _ = events.send(event);
        }
    }
}
