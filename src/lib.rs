//! live-transcribe — continuous live transcription over a duration-capped
//! streaming speech service.
//!
//! Streaming recognizers enforce a maximum session length; a naive client
//! stops transcribing when the cap hits.  This crate keeps one unbroken
//! transcript going indefinitely by restarting the session just before the
//! limit, replaying the audio the old session never confirmed, and shifting
//! every result onto a single monotonic timeline.
//!
//! Pipeline:
//!
//! ```text
//! microphone ──▶ audio (capture + convert + chunk)
//!                    │
//!                    ▼
//!               session (restart timer, bridging replay, time correction)
//!                    │                        ▲
//!                    ▼                        │ results
//!               recognizer (duplex stream) ───┘
//!                    │
//!                    ▼
//!               sink (console, broadcast)
//! ```

pub mod audio;
pub mod config;
pub mod recognizer;
pub mod session;
pub mod sink;
