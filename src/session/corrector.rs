//! Timestamp correction and transcript emission.
//!
//! Result events arrive stamped on the producing session's own clock, which
//! restarts at zero after every restart.  [`corrected_time_ms`] folds in the
//! replay compensation (bridging offset) and the cumulative offset of all
//! completed sessions, producing one monotonic timeline.
//! [`TranscriptEmitter`] applies the correction, updates the timing
//! bookkeeping, and dispatches the event to the sink.

use std::sync::Arc;

use crate::recognizer::ResultEvent;
use crate::sink::{TranscriptEvent, TranscriptSink};

use super::timing::TimingState;

// ---------------------------------------------------------------------------
// corrected_time_ms
// ---------------------------------------------------------------------------

/// Convert a session-relative result end time into the engine's continuous
/// timeline:
///
/// `corrected = result_end − bridging_offset + streaming_limit × restart_counter`
///
/// The subtraction saturates at zero: an interim result may arrive before the
/// replayed audio has caught up with the carried offset, and the public
/// timeline stays unsigned.
pub fn corrected_time_ms(result_end_ms: u64, timing: &TimingState, streaming_limit_ms: u64) -> u64 {
    (result_end_ms + timing.session_start_offset_ms(streaming_limit_ms))
        .saturating_sub(timing.bridging_offset_ms)
}

// ---------------------------------------------------------------------------
// TranscriptEmitter
// ---------------------------------------------------------------------------

/// Routes recognizer results to the transcript sink.
///
/// The emitter reads `bridging_offset_ms` and `restart_counter` and writes
/// the result-time fields; it runs on the session manager's serialized loop,
/// so every corrected timestamp observes a timing state consistent with the
/// session it reports for.
pub struct TranscriptEmitter {
    sink: Arc<dyn TranscriptSink>,
}

impl TranscriptEmitter {
    pub fn new(sink: Arc<dyn TranscriptSink>) -> Self {
        Self { sink }
    }

    /// Process one result event from the active session.
    ///
    /// Updates `result_end_time_ms` (and, for finals, `is_final_end_time_ms`)
    /// in `timing`, then publishes the corrected event.  The sink call is
    /// best-effort by contract and cannot fail or block recognition.
    pub fn handle(
        &self,
        timing: &mut TimingState,
        streaming_limit_ms: u64,
        event: &ResultEvent,
    ) {
        timing.result_end_time_ms = event.end_time.as_millis();

        let corrected = corrected_time_ms(timing.result_end_time_ms, timing, streaming_limit_ms);

        if event.is_final {
            timing.is_final_end_time_ms = timing.result_end_time_ms;
            timing.last_transcript_was_final = true;
        } else {
            timing.last_transcript_was_final = false;
        }

        self.sink.publish(&TranscriptEvent {
            text: event.transcript.clone(),
            is_final: event.is_final,
            corrected_time_ms: corrected,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
