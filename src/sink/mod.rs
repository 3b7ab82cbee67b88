//! Transcript fan-out boundary.
//!
//! The continuity engine hands every corrected result to a
//! [`TranscriptSink`].  Sinks are best-effort by contract: a slow or failing
//! sink must never stall or fail recognition, so [`publish`] is synchronous,
//! non-blocking and infallible from the caller's point of view — sink
//! implementations absorb their own failures.
//!
//! Provided sinks:
//! * [`ConsoleSink`] — interim line-rewriting terminal output.
//! * [`BroadcastSink`] — `tokio::sync::broadcast` fan-out for subscribers.
//! * [`FanoutSink`] — composite over several sinks.
//!
//! [`publish`]: TranscriptSink::publish

pub mod broadcast;
pub mod console;

pub use broadcast::BroadcastSink;
pub use console::ConsoleSink;

use std::sync::Arc;

// ---------------------------------------------------------------------------
// TranscriptEvent
// ---------------------------------------------------------------------------

/// The externally visible unit of transcription, independent of which
/// physical recognizer session produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEvent {
    /// Transcript text.
    pub text: String,
    /// `true` when the service will not revise this result further.
    pub is_final: bool,
    /// End time on the single continuous timeline, in milliseconds since the
    /// engine started.
    pub corrected_time_ms: u64,
}

// ---------------------------------------------------------------------------
// TranscriptSink trait
// ---------------------------------------------------------------------------

/// Consumer of transcript events.
///
/// Implementations must be `Send + Sync` so they can be shared behind an
/// `Arc<dyn TranscriptSink>`, and must return quickly — the call happens on
/// the engine's event path.
pub trait TranscriptSink: Send + Sync {
    /// Deliver one event.  Failures are the sink's problem, not the engine's.
    fn publish(&self, event: &TranscriptEvent);
}

// Compile-time assertion: Box<dyn TranscriptSink> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn TranscriptSink>) {}
};

// ---------------------------------------------------------------------------
// FanoutSink
// ---------------------------------------------------------------------------

/// Composite sink that forwards every event to each inner sink in order.
pub struct FanoutSink {
    sinks: Vec<Arc<dyn TranscriptSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn TranscriptSink>>) -> Self {
        Self { sinks }
    }
}

impl TranscriptSink for FanoutSink {
    fn publish(&self, event: &TranscriptEvent) {
        for sink in &self.sinks {
            sink.publish(event);
        }
    }
}

// ---------------------------------------------------------------------------
// CollectingSink (test double)
// ---------------------------------------------------------------------------

/// Test sink that records every published event.
#[cfg(test)]
#[derive(Default)]
pub struct CollectingSink {
    events: std::sync::Mutex<Vec<TranscriptEvent>>,
}

#[cfg(test)]
impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events published so far, in order.
    pub fn events(&self) -> Vec<TranscriptEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl TranscriptSink for CollectingSink {
    fn publish(&self, event: &TranscriptEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
