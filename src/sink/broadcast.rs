//! Broadcast transcript fan-out.
//!
//! [`BroadcastSink`] publishes every event onto a `tokio::sync::broadcast`
//! channel.  Any number of subscribers can attach and detach over the
//! engine's lifetime; a lagging subscriber loses old events rather than
//! applying backpressure, and having no subscribers at all is fine.  This is
//! the seam where a socket/server layer would attach.

use tokio::sync::broadcast;

use super::{TranscriptEvent, TranscriptSink};

/// Default channel capacity before the slowest subscriber starts lagging.
const DEFAULT_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// BroadcastSink
// ---------------------------------------------------------------------------

/// Fan-out sink backed by a `tokio::sync::broadcast` channel.
pub struct BroadcastSink {
    tx: broadcast::Sender<TranscriptEvent>,
}

impl BroadcastSink {
    /// Create a sink with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a sink holding up to `capacity` undelivered events per
    /// subscriber before the oldest are dropped.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Attach a new subscriber.  Events published before this call are not
    /// delivered to it.
    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptEvent> {
        self.tx.subscribe()
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptSink for BroadcastSink {
    fn publish(&self, event: &TranscriptEvent) {
        // send only fails when there are no subscribers; that is not an
        // error for a fan-out boundary.
        let _ = self.tx.send(event.clone());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
