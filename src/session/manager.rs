//! Session manager — owns the recognizer session lifecycle.
//!
//! [`SessionManager`] drives the full continuity loop on one serialized
//! `tokio::select!` event loop:
//!
//! ```text
//! audio_rx (capture feed) ──▶ current buffer + active session write side
//! restart deadline        ──▶ restart (expected path, once per limit)
//! session events          ──▶ TranscriptEmitter → sink
//!                             recoverable error / stream end → early restart
//!                             fatal error → teardown, propagate
//! ```
//!
//! Because every transition runs on the same loop, sessions are strictly
//! sequential: the old session's channel halves are dropped before the new
//! stream is opened, no write can interleave with a restart, and the replay
//! of the previous buffer completes before any live chunk captured after the
//! restart decision is forwarded.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::audio::{AudioChunk, SessionBuffer};
use crate::recognizer::{
    Recognizer, RecognizerError, RecognizerSession, ResultEvent, StreamingRequest,
};
use crate::sink::TranscriptSink;

use super::corrector::TranscriptEmitter;
use super::timing::{plan_replay, TimingState};

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Fatal engine failures.
///
/// Recoverable conditions (duration-limit signals, benign stream ends) are
/// absorbed by restarts and never surface here.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The recognizer failed fatally, either mid-session or while opening a
    /// new session during a restart.
    #[error("recognizer failure: {0}")]
    Recognizer(#[from] RecognizerError),
}

// ---------------------------------------------------------------------------
// RestartReason
// ---------------------------------------------------------------------------

/// Why a session was restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RestartReason {
    /// The restart deadline elapsed — the expected, periodic path.
    TimerExpired,
    /// The service reported the session exceeded its duration limit before
    /// the local timer fired.
    DurationExceeded,
    /// The service ended the event stream without an error.
    StreamEnded,
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

/// Owns the active recognizer session, the current/previous buffer pair and
/// the timing state; restarts the session on a timer so transcription can
/// out-live the service's maximum stream duration without losing or
/// duplicating audio.
pub struct SessionManager {
    recognizer: Arc<dyn Recognizer>,
    request: StreamingRequest,
    streaming_limit_ms: u64,
    timing: TimingState,
    /// Chunks captured since the active session started.
    current: SessionBuffer,
    /// Frozen snapshot of the prior session's buffer; consulted once for
    /// replay, then replaced wholesale at the next restart.
    previous: SessionBuffer,
    /// Set at restart; the replay runs before the next live chunk is
    /// forwarded.
    replay_pending: bool,
    emitter: TranscriptEmitter,
}

impl SessionManager {
    /// Create a manager.
    ///
    /// # Arguments
    ///
    /// * `recognizer`         — backend used to open each session.
    /// * `request`            — open-time config, re-sent verbatim on every restart.
    /// * `streaming_limit_ms` — the service's maximum session duration.
    /// * `sink`               — destination for corrected transcript events.
    pub fn new(
        recognizer: Arc<dyn Recognizer>,
        request: StreamingRequest,
        streaming_limit_ms: u64,
        sink: Arc<dyn TranscriptSink>,
    ) -> Self {
        Self {
            recognizer,
            request,
            streaming_limit_ms,
            timing: TimingState::new(),
            current: SessionBuffer::new(),
            previous: SessionBuffer::new(),
            replay_pending: false,
            emitter: TranscriptEmitter::new(sink),
        }
    }

    // -----------------------------------------------------------------------
    // Main event loop
    // -----------------------------------------------------------------------

    /// Run the engine until the audio source closes (graceful shutdown) or a
    /// fatal error occurs.
    ///
    /// Consumes the manager; spawn as a tokio task and feed it captured
    /// [`AudioChunk`]s through `audio_rx`.
    pub async fn run(
        mut self,
        mut audio_rx: mpsc::Receiver<AudioChunk>,
    ) -> Result<(), SessionError> {
        let RecognizerSession {
            mut audio,
            mut events,
        } = self.open_session().await?;
        let mut deadline = Instant::now() + self.limit();

        loop {
            tokio::select! {
                // Expected path: the session is approaching the service's
                // duration cap.
                _ = tokio::time::sleep_until(deadline) => {
                    let next = self.restart(audio, events, RestartReason::TimerExpired).await?;
                    audio = next.audio;
                    events = next.events;
                    deadline = Instant::now() + self.limit();
                }

                event = events.recv() => match event {
                    Some(Ok(result)) => self.on_result(&result),
                    Some(Err(e)) if e.is_recoverable() => {
                        // Early restart; re-arming the deadline cancels the
                        // pending timer so the two triggers cannot race.
                        let next = self.restart(audio, events, RestartReason::DurationExceeded).await?;
                        audio = next.audio;
                        events = next.events;
                        deadline = Instant::now() + self.limit();
                    }
                    Some(Err(e)) => {
                        log::error!("session: fatal recognizer error: {e}");
                        return Err(SessionError::Recognizer(e));
                    }
                    None => {
                        let next = self.restart(audio, events, RestartReason::StreamEnded).await?;
                        audio = next.audio;
                        events = next.events;
                        deadline = Instant::now() + self.limit();
                    }
                },

                chunk = audio_rx.recv() => match chunk {
                    Some(chunk) => self.feed(&audio, chunk).await,
                    None => {
                        log::info!("session: audio source closed, shutting down");
                        return Ok(());
                    }
                },
            }
        }
    }

    // -----------------------------------------------------------------------
    // Capture feed path
    // -----------------------------------------------------------------------

    /// Accept one live chunk from the capture collaborator.
    ///
    /// Runs the pending replay first so the new session always sees the
    /// previous buffer's unacknowledged tail before any live audio, then
    /// appends the chunk to the current buffer and forwards it.
    async fn feed(&mut self, audio: &mpsc::Sender<AudioChunk>, chunk: AudioChunk) {
        if self.replay_pending {
            self.replay_previous(audio).await;
            self.replay_pending = false;
        }

        self.current.push(chunk.clone());

        if audio.send(chunk).await.is_err() {
            // The stream is going away; its terminal event arrives on the
            // events channel, which decides recoverable vs fatal.  The chunk
            // stays in the current buffer for replay.
            log::warn!("session: dropped write to a closing recognizer stream");
        }
    }

    /// Replay the unacknowledged suffix of the previous session's buffer
    /// into the new session, in order.
    async fn replay_previous(&mut self, audio: &mpsc::Sender<AudioChunk>) {
        let Some(plan) = plan_replay(
            self.previous.len(),
            self.streaming_limit_ms,
            self.timing.final_request_end_time_ms,
            self.timing.bridging_offset_ms,
        ) else {
            return;
        };

        self.timing.bridging_offset_ms = plan.next_bridging_offset_ms;

        let tail = self.previous.suffix(plan.first_chunk);
        log::debug!(
            "session: replaying {} of {} buffered chunks (bridging offset {} ms)",
            tail.len(),
            self.previous.len(),
            self.timing.bridging_offset_ms
        );

        for chunk in tail {
            if audio.send(chunk.clone()).await.is_err() {
                log::warn!("session: recognizer stream closed during replay");
                break;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    async fn open_session(&mut self) -> Result<RecognizerSession, SessionError> {
        log::debug!(
            "session: opening recognizer stream {}",
            self.timing.restart_counter
        );
        Ok(self.recognizer.open(&self.request).await?)
    }

    /// Tear down the old session and open its successor.
    ///
    /// The old channel halves are dropped first — no further writes, no
    /// further events — before any restart bookkeeping runs.
    async fn restart(
        &mut self,
        old_audio: mpsc::Sender<AudioChunk>,
        old_events: mpsc::Receiver<Result<ResultEvent, RecognizerError>>,
        reason: RestartReason,
    ) -> Result<RecognizerSession, SessionError> {
        drop(old_audio);
        drop(old_events);

        // Carry the last confirmed time forward only if this session
        // produced any result at all.
        if self.timing.result_end_time_ms > 0 {
            self.timing.final_request_end_time_ms = self.timing.is_final_end_time_ms;
        }
        self.timing.result_end_time_ms = 0;

        self.previous = self.current.take();
        self.timing.restart_counter += 1;
        self.replay_pending = true;

        log::info!(
            "session: restarting ({reason:?}) at {} ms, {} chunks buffered",
            self.timing.session_start_offset_ms(self.streaming_limit_ms),
            self.previous.len()
        );

        self.open_session().await
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn on_result(&mut self, result: &ResultEvent) {
        self.emitter
            .handle(&mut self.timing, self.streaming_limit_ms, result);
    }

    fn limit(&self) -> Duration {
        Duration::from_millis(self.streaming_limit_ms)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecognitionConfig;
    use crate::recognizer::{ScriptedRecognizer, SessionScript};
    use crate::sink::CollectingSink;
    use tokio::task::JoinHandle;

    const LIMIT: u64 = 10_000;

    fn chunk(byte: u8) -> AudioChunk {
        AudioChunk::new(vec![byte])
    }

    fn spawn_engine(
        scripts: Vec<SessionScript>,
        limit_ms: u64,
    ) -> (
        Arc<ScriptedRecognizer>,
        Arc<CollectingSink>,
        mpsc::Sender<AudioChunk>,
        JoinHandle<Result<(), SessionError>>,
    ) {
        let recognizer = Arc::new(ScriptedRecognizer::new(scripts));
        let sink = Arc::new(CollectingSink::new());
        let request = StreamingRequest::from(&RecognitionConfig::default());
        let manager = SessionManager::new(
            Arc::clone(&recognizer) as Arc<dyn Recognizer>,
            request,
            limit_ms,
            Arc::clone(&sink) as Arc<dyn TranscriptSink>,
        );

        let (tx, rx) = mpsc::channel(64);
        let handle = tokio::spawn(manager.run(rx));
        (recognizer, sink, tx, handle)
    }

    /// Let queued chunks, events and spawned tasks settle (paused clock:
    /// the sleep yields until the runtime is idle, then advances).
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    // -----------------------------------------------------------------------
    // Restart + replay
    // -----------------------------------------------------------------------

    /// The end-to-end restart scenario: 100 chunks in session 0, last final
    /// at 9 500 ms ⇒ the restart replays chunks [95, 100) into session 1,
    /// before any live chunk.
    #[tokio::test(start_paused = true)]
    async fn timer_restart_replays_unacknowledged_tail() {
        let (recognizer, sink, tx, _handle) = spawn_engine(
            vec![
                SessionScript::events(vec![Ok(ResultEvent::final_at("hello world", 9_500))]),
                SessionScript::silent(),
            ],
            LIMIT,
        );

        let session0: Vec<AudioChunk> = (0..100).map(chunk).collect();
        for c in &session0 {
            tx.send(c.clone()).await.unwrap();
        }
        settle().await;

        // Cross the streaming limit — the deadline fires exactly once.
        tokio::time::sleep(Duration::from_millis(LIMIT)).await;

        // First live chunk of session 1 triggers the pending replay.
        tx.send(chunk(200)).await.unwrap();
        settle().await;

        assert_eq!(recognizer.opened(), 2);

        // Session 0 received the live chunks, in order.
        assert_eq!(recognizer.session_chunks(0), session0);

        // Session 1 received exactly the unacknowledged tail, then the live
        // chunk — replayed-then-live ordering.
        let mut expected: Vec<AudioChunk> = session0[95..].to_vec();
        expected.push(chunk(200));
        assert_eq!(recognizer.session_chunks(1), expected);

        // The final result reached the sink on the uncorrected first-session
        // timeline.
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].text, "hello world");
        assert_eq!(events[0].corrected_time_ms, 9_500);
        assert!(events[0].is_final);
    }

    /// A chunk replayed during restart N is not replayed again during
    /// restart N+1; the previous buffer is replaced wholesale, and the
    /// replay range only covers the newer session's unacknowledged tail.
    #[tokio::test(start_paused = true)]
    async fn no_duplicate_replay_across_restarts() {
        let (recognizer, _sink, tx, _handle) = spawn_engine(
            vec![
                SessionScript::events(vec![Ok(ResultEvent::final_at("a", 5_000))]),
                SessionScript::events(vec![Ok(ResultEvent::final_at("b", 9_000))]),
                SessionScript::silent(),
            ],
            LIMIT,
        );

        // Session 0: chunks 0..10, confirmed through 5 000 ms.
        let batch_a: Vec<AudioChunk> = (0..10).map(chunk).collect();
        for c in &batch_a {
            tx.send(c.clone()).await.unwrap();
        }
        settle().await;
        tokio::time::sleep(Duration::from_millis(LIMIT)).await;

        // Session 1: chunks 100..110 (replay of A's tail runs first).
        let batch_b: Vec<AudioChunk> = (100..110).map(chunk).collect();
        for c in &batch_b {
            tx.send(c.clone()).await.unwrap();
        }
        settle().await;
        tokio::time::sleep(Duration::from_millis(LIMIT)).await;

        // Session 2: one live chunk to trigger the second replay.
        tx.send(chunk(250)).await.unwrap();
        settle().await;

        assert_eq!(recognizer.opened(), 3);

        // Restart 1: chunk time 1 000 ms, confirmed 5 000 ms ⇒ replay A[5..10).
        let mut expected_1: Vec<AudioChunk> = batch_a[5..].to_vec();
        expected_1.extend(batch_b.iter().cloned());
        assert_eq!(recognizer.session_chunks(1), expected_1);

        // Restart 2: bridging offset 5 000 carried, confirmed 9 000 ms ⇒
        // replay B[4..10).  Nothing from A appears again.
        let mut expected_2: Vec<AudioChunk> = batch_b[4..].to_vec();
        expected_2.push(chunk(250));
        assert_eq!(recognizer.session_chunks(2), expected_2);
    }

    /// An empty previous buffer means the restart opens a clean session with
    /// no replay and no error.
    #[tokio::test(start_paused = true)]
    async fn empty_previous_buffer_skips_replay() {
        let (recognizer, _sink, tx, handle) =
            spawn_engine(vec![SessionScript::silent(), SessionScript::silent()], LIMIT);

        // No audio at all in session 0.
        tokio::time::sleep(Duration::from_millis(LIMIT)).await;
        // The restart deadline shares this instant; let it win before any
        // audio is offered, so the chunk can only land in session 1.
        settle().await;

        tx.send(chunk(1)).await.unwrap();
        settle().await;

        assert_eq!(recognizer.opened(), 2);
        assert!(recognizer.session_chunks(0).is_empty());
        assert_eq!(recognizer.session_chunks(1), vec![chunk(1)]);
        assert!(!handle.is_finished());
    }

    // -----------------------------------------------------------------------
    // Error classification
    // -----------------------------------------------------------------------

    /// A duration-exceeded error restarts the session immediately, before
    /// the local timer would have fired.
    #[tokio::test(start_paused = true)]
    async fn recoverable_error_triggers_early_restart() {
        let (recognizer, _sink, tx, handle) = spawn_engine(
            vec![
                SessionScript::events(vec![Err(RecognizerError::DurationExceeded)]),
                SessionScript::silent(),
            ],
            // Far-off timer: only the error can cause the restart.
            600_000,
        );

        settle().await;
        assert_eq!(recognizer.opened(), 2);
        assert!(!handle.is_finished());

        // The engine keeps transcribing into the replacement session.
        tx.send(chunk(7)).await.unwrap();
        settle().await;
        assert_eq!(recognizer.session_chunks(1), vec![chunk(7)]);
    }

    /// Any non-duration error is fatal: the engine tears down and surfaces
    /// the failure instead of respawning into a broken backend.
    #[tokio::test(start_paused = true)]
    async fn fatal_error_stops_the_engine() {
        let (recognizer, _sink, _tx, handle) = spawn_engine(
            vec![SessionScript::events(vec![Err(RecognizerError::Service(
                "permission denied".into(),
            ))])],
            LIMIT,
        );

        let result = handle.await.unwrap();
        assert!(matches!(
            result,
            Err(SessionError::Recognizer(RecognizerError::Service(_)))
        ));
        assert_eq!(recognizer.opened(), 1);
    }

    /// The service ending its event stream without an error is absorbed the
    /// same way as a duration signal.
    #[tokio::test(start_paused = true)]
    async fn stream_end_restarts_the_session() {
        let (recognizer, _sink, _tx, handle) = spawn_engine(
            vec![SessionScript::ending(vec![]), SessionScript::silent()],
            600_000,
        );

        settle().await;
        assert_eq!(recognizer.opened(), 2);
        assert!(!handle.is_finished());
    }

    // -----------------------------------------------------------------------
    // Shutdown
    // -----------------------------------------------------------------------

    /// Closing the audio source shuts the engine down cleanly.
    #[tokio::test(start_paused = true)]
    async fn audio_source_close_is_graceful_shutdown() {
        let (_recognizer, _sink, tx, handle) =
            spawn_engine(vec![SessionScript::silent()], LIMIT);

        tx.send(chunk(1)).await.unwrap();
        drop(tx);

        let result = handle.await.unwrap();
        assert!(result.is_ok());
    }

    // -----------------------------------------------------------------------
    // No audio loss
    // -----------------------------------------------------------------------

    /// Every captured chunk is written to exactly one session's live path;
    /// the union of {replayed chunks at restart N} ∪ {live chunks of
    /// session N} covers the capture sequence without gaps.
    #[tokio::test(start_paused = true)]
    async fn no_chunk_is_lost_across_restarts() {
        let (recognizer, _sink, tx, _handle) = spawn_engine(
            vec![
                SessionScript::events(vec![Ok(ResultEvent::final_at("a", 9_000))]),
                SessionScript::silent(),
            ],
            LIMIT,
        );

        let all: Vec<AudioChunk> = (0..20).map(chunk).collect();
        for c in &all[..10] {
            tx.send(c.clone()).await.unwrap();
        }
        settle().await;
        tokio::time::sleep(Duration::from_millis(LIMIT)).await;
        for c in &all[10..] {
            tx.send(c.clone()).await.unwrap();
        }
        settle().await;

        // Live writes across both sessions cover every captured chunk once.
        let live_0 = recognizer.session_chunks(0);
        let session_1 = recognizer.session_chunks(1);

        assert_eq!(live_0, all[..10].to_vec());

        // Session 1 = replayed tail of session 0 (chunk time 1 000 ms,
        // confirmed 9 000 ms ⇒ A[9..10)) followed by the new live chunks.
        let mut expected_1: Vec<AudioChunk> = all[9..10].to_vec();
        expected_1.extend(all[10..].iter().cloned());
        assert_eq!(session_1, expected_1);
    }
}
