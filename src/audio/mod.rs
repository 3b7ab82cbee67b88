//! Audio pipeline — microphone capture → format conversion → session buffers.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → CaptureFrame (mpsc) → downmix_to_mono
//!           → resample → pcm16_bytes → AudioChunk → SessionManager
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::mpsc;
//! use live_transcribe::audio::{AudioCapture, CaptureFrame};
//!
//! let (tx, rx) = mpsc::channel::<CaptureFrame>();
//! let capture = AudioCapture::new(None).unwrap();
//! let _handle = capture.start(tx).unwrap(); // drop handle → stop stream
//!
//! while let Ok(frame) = rx.recv() {
//!     println!("received {} samples @ {}Hz", frame.samples.len(), frame.sample_rate);
//! }
//! ```

pub mod capture;
pub mod chunk;
pub mod convert;

pub use capture::{AudioCapture, CaptureError, CaptureFrame, StreamHandle};
pub use chunk::{AudioChunk, SessionBuffer};
pub use convert::{downmix_to_mono, pcm16_bytes, resample};
