//! Simulated recognizer backend.
//!
//! [`SimulatedRecognizer`] stands in for the remote service so the binary can
//! run end-to-end without network credentials: it drains the audio it is
//! given, tracks how much stream time the received bytes represent, and emits
//! a synthetic final result once per utterance interval.  The timestamps it
//! reports are derived from the received audio, so the engine's restart,
//! replay and timeline-correction machinery is exercised exactly as it would
//! be against a real backend.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::audio::AudioChunk;
use crate::recognizer::client::{Recognizer, RecognizerError, RecognizerSession};
use crate::recognizer::types::{ResultEvent, StreamingRequest};

/// Default synthetic utterance length in milliseconds.
const DEFAULT_UTTERANCE_MS: u64 = 2_000;

// ---------------------------------------------------------------------------
// SimulatedRecognizer
// ---------------------------------------------------------------------------

/// Local stand-in for the streaming speech service.
///
/// Duration accounting assumes 16-bit PCM (two bytes per sample at the
/// request's sample rate) — the LINEAR16 default of
/// [`crate::config::RecognitionConfig`].
pub struct SimulatedRecognizer {
    utterance_ms: u64,
}

impl SimulatedRecognizer {
    /// Create a simulator emitting one final result every `utterance_ms` of
    /// received audio.  Zero falls back to the default interval.
    pub fn new(utterance_ms: u64) -> Self {
        Self {
            utterance_ms: if utterance_ms == 0 {
                DEFAULT_UTTERANCE_MS
            } else {
                utterance_ms
            },
        }
    }
}

impl Default for SimulatedRecognizer {
    fn default() -> Self {
        Self::new(DEFAULT_UTTERANCE_MS)
    }
}

#[async_trait]
impl Recognizer for SimulatedRecognizer {
    async fn open(&self, request: &StreamingRequest) -> Result<RecognizerSession, RecognizerError> {
        let (audio_tx, mut audio_rx) = mpsc::channel::<AudioChunk>(64);
        let (events_tx, events_rx) = mpsc::channel(64);

        let bytes_per_ms = ((request.sample_rate_hertz as u64 * 2) / 1_000).max(1);
        let utterance_ms = self.utterance_ms;

        tokio::spawn(async move {
            let mut received_bytes: u64 = 0;
            let mut emitted_ms: u64 = 0;
            let mut utterance: usize = 0;

            while let Some(chunk) = audio_rx.recv().await {
                received_bytes += chunk.len() as u64;
                let audio_ms = received_bytes / bytes_per_ms;

                while audio_ms >= emitted_ms + utterance_ms {
                    emitted_ms += utterance_ms;
                    utterance += 1;

                    let event =
                        ResultEvent::final_at(format!("simulated utterance {utterance}"), emitted_ms);
                    if events_tx.send(Ok(event)).await.is_err() {
                        return; // session dropped
                    }
                }
            }
        });

        Ok(RecognizerSession {
            audio: audio_tx,
            events: events_rx,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioChunk;
    use crate::config::RecognitionConfig;

    fn request() -> StreamingRequest {
        StreamingRequest::from(&RecognitionConfig::default()) // 16 kHz LINEAR16
    }

    /// 100 ms of 16 kHz 16-bit audio.
    fn chunk_100ms() -> AudioChunk {
        AudioChunk::new(vec![0u8; 3_200])
    }

    #[tokio::test]
    async fn emits_final_results_on_the_audio_timeline() {
        let recognizer = SimulatedRecognizer::new(2_000);
        let mut session = recognizer.open(&request()).await.unwrap();

        // 5 s of audio → finals at 2 000 ms and 4 000 ms.
        for _ in 0..50 {
            session.audio.send(chunk_100ms()).await.unwrap();
        }

        let first = session.events.recv().await.unwrap().unwrap();
        assert!(first.is_final);
        assert_eq!(first.end_time.as_millis(), 2_000);

        let second = session.events.recv().await.unwrap().unwrap();
        assert_eq!(second.end_time.as_millis(), 4_000);
        assert_ne!(first.transcript, second.transcript);
    }

    #[tokio::test]
    async fn silent_stream_emits_nothing_and_closes_on_drop() {
        let recognizer = SimulatedRecognizer::default();
        let mut session = recognizer.open(&request()).await.unwrap();

        // Less than one utterance of audio.
        session.audio.send(chunk_100ms()).await.unwrap();
        drop(session.audio);

        assert!(session.events.recv().await.is_none());
    }

    #[tokio::test]
    async fn each_session_restarts_its_own_clock() {
        let recognizer = SimulatedRecognizer::new(1_000);

        for _ in 0..2 {
            let mut session = recognizer.open(&request()).await.unwrap();
            for _ in 0..10 {
                session.audio.send(chunk_100ms()).await.unwrap();
            }
            let event = session.events.recv().await.unwrap().unwrap();
            // Per-session clock: the first final is always at 1 000 ms.
            assert_eq!(event.end_time.as_millis(), 1_000);
        }
    }

    #[test]
    fn zero_interval_falls_back_to_default() {
        let recognizer = SimulatedRecognizer::new(0);
        assert_eq!(recognizer.utterance_ms, DEFAULT_UTTERANCE_MS);
    }
}
