//! Recognizer capability interface.
//!
//! # Overview
//!
//! [`Recognizer`] is the seam between the continuity engine and the remote
//! streaming speech service.  It is object-safe and `Send + Sync` so it can
//! be held behind an `Arc<dyn Recognizer>`.
//!
//! [`RecognizerSession`] models one logical duplex stream as a channel pair:
//! an audio sender (the write side) and an event receiver (the read side).
//! Dropping the session is the unsubscribe operation — both channel halves
//! close and the backend tears the stream down.
//!
//! [`ScriptedRecognizer`] (available under `#[cfg(test)]`) replays
//! pre-scripted event sequences and records every chunk written to every
//! session — useful for unit-testing the session manager without a backend.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::audio::AudioChunk;
use crate::recognizer::types::{ResultEvent, StreamingRequest};

// ---------------------------------------------------------------------------
// RecognizerError
// ---------------------------------------------------------------------------

/// All errors the recognizer collaborator can surface.
#[derive(Debug, Clone, Error)]
pub enum RecognizerError {
    /// The session outlived the service's maximum stream duration.
    ///
    /// This is the expected, periodic signal of long-running streams and is
    /// handled by an immediate restart — it never reaches the user.
    #[error("streaming session exceeded the service duration limit")]
    DurationExceeded,

    /// The service rejected the session or request (auth, quota, bad config).
    #[error("recognizer service error: {0}")]
    Service(String),

    /// The underlying transport failed.
    #[error("recognizer transport error: {0}")]
    Transport(String),
}

impl RecognizerError {
    /// Returns `true` for errors that are absorbed by restarting the session.
    ///
    /// Everything except [`DurationExceeded`](Self::DurationExceeded) is
    /// fatal: retrying auth or connectivity failures in a loop would only
    /// mask them.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RecognizerError::DurationExceeded)
    }
}

// ---------------------------------------------------------------------------
// RecognizerSession
// ---------------------------------------------------------------------------

/// One open duplex stream to the recognizer.
///
/// Audio chunks go in through `audio`; result events (or a terminal error)
/// come out of `events`.  The event stream is finite per session: it ends
/// when the stream closes or errors.  Backpressure on `audio.send().await`
/// is the only write throttle.
pub struct RecognizerSession {
    /// Write side: encoded audio chunks, in capture order.
    pub audio: mpsc::Sender<AudioChunk>,
    /// Read side: recognition results and the terminal error, if any.
    pub events: mpsc::Receiver<Result<ResultEvent, RecognizerError>>,
}

// ---------------------------------------------------------------------------
// Recognizer trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to the streaming speech service.
///
/// # Contract
///
/// - `open` establishes one logical stream configured by `request` and
///   returns its channel pair.
/// - The backend emits events in recognition order and terminates the event
///   stream on close or error.
/// - A stream older than the service's duration cap may fail with
///   [`RecognizerError::DurationExceeded`]; the caller restarts.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Open a new logical stream.
    async fn open(&self, request: &StreamingRequest) -> Result<RecognizerSession, RecognizerError>;
}

// Compile-time assertion: Box<dyn Recognizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Recognizer>) {}
};

// ---------------------------------------------------------------------------
// ScriptedRecognizer (test double)
// ---------------------------------------------------------------------------

/// Script for one session of a [`ScriptedRecognizer`].
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct SessionScript {
    events: Vec<Result<ResultEvent, RecognizerError>>,
    /// When `false`, the event channel closes after the script is delivered
    /// (simulates the service ending the stream).
    keep_open: bool,
}

#[cfg(test)]
impl SessionScript {
    /// A session that emits nothing and stays open.
    pub fn silent() -> Self {
        Self {
            events: Vec::new(),
            keep_open: true,
        }
    }

    /// A session that emits `events` and then stays open.
    pub fn events(events: Vec<Result<ResultEvent, RecognizerError>>) -> Self {
        Self {
            events,
            keep_open: true,
        }
    }

    /// A session that emits `events` and then ends its stream.
    pub fn ending(events: Vec<Result<ResultEvent, RecognizerError>>) -> Self {
        Self {
            events,
            keep_open: false,
        }
    }
}

/// Test recognizer that replays one [`SessionScript`] per opened session and
/// records every chunk written to each session.
///
/// Sessions opened beyond the scripted count behave like
/// [`SessionScript::silent`].
#[cfg(test)]
pub struct ScriptedRecognizer {
    scripts: std::sync::Mutex<std::collections::VecDeque<SessionScript>>,
    written: std::sync::Arc<std::sync::Mutex<Vec<Vec<AudioChunk>>>>,
    // Keeps scripted event channels open after delivery (keep_open sessions).
    event_senders:
        std::sync::Mutex<Vec<mpsc::Sender<Result<ResultEvent, RecognizerError>>>>,
}

#[cfg(test)]
impl ScriptedRecognizer {
    pub fn new(scripts: Vec<SessionScript>) -> Self {
        Self {
            scripts: std::sync::Mutex::new(scripts.into()),
            written: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
            event_senders: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Number of sessions opened so far.
    pub fn opened(&self) -> usize {
        self.written.lock().unwrap().len()
    }

    /// Chunks written to session `index` (in open order), in write order.
    pub fn session_chunks(&self, index: usize) -> Vec<AudioChunk> {
        self.written.lock().unwrap()[index].clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Recognizer for ScriptedRecognizer {
    async fn open(&self, _request: &StreamingRequest) -> Result<RecognizerSession, RecognizerError> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(SessionScript::silent);

        let (audio_tx, mut audio_rx) = mpsc::channel::<AudioChunk>(256);
        let (events_tx, events_rx) =
            mpsc::channel::<Result<ResultEvent, RecognizerError>>(256);

        let index = {
            let mut written = self.written.lock().unwrap();
            written.push(Vec::new());
            written.len() - 1
        };

        // Drain the write side into the per-session log.
        let written = std::sync::Arc::clone(&self.written);
        tokio::spawn(async move {
            while let Some(chunk) = audio_rx.recv().await {
                written.lock().unwrap()[index].push(chunk);
            }
        });

        for event in script.events {
            // Capacity 256 always fits a script; send cannot block here.
            events_tx
                .send(event)
                .await
                .expect("scripted event channel closed");
        }

        if script.keep_open {
            self.event_senders.lock().unwrap().push(events_tx);
        }

        Ok(RecognizerSession {
            audio: audio_tx,
            events: events_rx,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
