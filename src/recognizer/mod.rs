//! Recognizer collaborator contract.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                 Recognizer (trait)                     │
//! │                                                        │
//! │   open(StreamingRequest)                               │
//! │        │                                               │
//! │        ▼                                               │
//! │   RecognizerSession                                    │
//! │     audio:  mpsc::Sender<AudioChunk>      (write side) │
//! │     events: mpsc::Receiver<Result<ResultEvent, _>>     │
//! │                                                        │
//! │   SimulatedRecognizer — local stand-in backend         │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine only depends on this observable contract; the network protocol
//! to the real service is out of scope.  Error classification is the seam's
//! one piece of policy: [`RecognizerError::DurationExceeded`] is recoverable
//! (expected, periodic, absorbed by a restart), everything else is fatal.

pub mod client;
pub mod stub;
pub mod types;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use client::{Recognizer, RecognizerError, RecognizerSession};
pub use stub::SimulatedRecognizer;
pub use types::{ResultEvent, ResultTime, StreamingRequest};

// test-only re-export so the session test modules can import the scripted
// double without `use live_transcribe::recognizer::client::ScriptedRecognizer`.
#[cfg(test)]
pub use client::{ScriptedRecognizer, SessionScript};
