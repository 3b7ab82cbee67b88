//! Timing state and the bridging-offset calculator.
//!
//! Each recognizer session reports result times on its own clock, which
//! restarts at zero, and each restart must replay the tail of the previous
//! session's audio that the service never acknowledged.  [`TimingState`]
//! carries the bookkeeping; [`plan_replay`] is the pure function that decides
//! the replay range and the next bridging offset.
//!
//! The math deliberately approximates per-chunk duration as
//! `streaming_limit / buffer_len` instead of tagging chunks with capture
//! timestamps; small drift is accepted in exchange for keeping chunks opaque.

// ---------------------------------------------------------------------------
// TimingState
// ---------------------------------------------------------------------------

/// Session-timeline bookkeeping, owned exclusively by the session manager.
///
/// Created once at engine start; mutated only on the manager's serialized
/// event loop (result events, restarts), never concurrently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimingState {
    /// End time (ms) of the most recent result, on the current session's
    /// clock.  Reset to 0 when a session starts.
    pub result_end_time_ms: u64,

    /// `result_end_time_ms` at the moment the last *final* result was
    /// observed in the current session.
    pub is_final_end_time_ms: u64,

    /// Carries `is_final_end_time_ms` forward across a restart — the
    /// authoritative "last confirmed time" used to decide how much of the
    /// previous buffer is stale.
    pub final_request_end_time_ms: u64,

    /// Time (ms) of previous-buffer tail already consumed by the outgoing
    /// session.  Re-derived on every replay, never carried across more than
    /// one restart.
    pub bridging_offset_ms: u64,

    /// Number of restarts so far.  Session N's absolute start offset is
    /// `restart_counter × streaming_limit`.
    pub restart_counter: u64,

    /// Whether the most recent emitted result was final.  Affects only
    /// output formatting.
    pub last_transcript_was_final: bool,
}

impl TimingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute start offset (ms) of the current session on the corrected
    /// timeline.
    pub fn session_start_offset_ms(&self, streaming_limit_ms: u64) -> u64 {
        self.restart_counter * streaming_limit_ms
    }
}

// ---------------------------------------------------------------------------
// Bridging offset calculator
// ---------------------------------------------------------------------------

/// Outcome of [`plan_replay`]: which suffix of the previous buffer to replay
/// and the bridging offset the next cycle starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayPlan {
    /// Index of the first chunk to replay; the range is `[first_chunk, len)`.
    pub first_chunk: usize,
    /// Unconsumed time carried forward as the next cycle's starting offset.
    pub next_bridging_offset_ms: u64,
}

/// Clamp a carried-over bridging offset into `[0, final_request_end_time]`.
///
/// The lower bound is structural (unsigned); the upper bound prevents an
/// offset from a prior cycle exceeding the last confirmed time.
pub fn clamp_offset(bridging_offset_ms: u64, final_request_end_time_ms: u64) -> u64 {
    bridging_offset_ms.min(final_request_end_time_ms)
}

/// Decide which trailing chunks of the previous session's buffer must be
/// replayed into the new session.
///
/// `buffer_len` chunks covered roughly `streaming_limit_ms` of audio, so each
/// chunk is taken to last `streaming_limit_ms / buffer_len` ms.  Everything
/// up to `final_request_end_time_ms` (less the already-carried offset) was
/// acknowledged by the outgoing session and is skipped; the remainder — the
/// unacknowledged tail — is replayed.  Replaying less would lose audio,
/// replaying more would transcribe it twice.
///
/// Returns `None` when no replay should occur: an empty previous buffer, or
/// a degenerate zero per-chunk duration.  In both cases the caller's
/// bridging offset is left untouched (it is unused this cycle).
pub fn plan_replay(
    buffer_len: usize,
    streaming_limit_ms: u64,
    final_request_end_time_ms: u64,
    bridging_offset_ms: u64,
) -> Option<ReplayPlan> {
    if buffer_len == 0 {
        return None;
    }

    let chunk_time_ms = streaming_limit_ms as f64 / buffer_len as f64;
    if chunk_time_ms <= 0.0 {
        return None;
    }

    let offset = clamp_offset(bridging_offset_ms, final_request_end_time_ms);

    let consumed =
        (((final_request_end_time_ms - offset) as f64) / chunk_time_ms).floor() as usize;
    let consumed = consumed.min(buffer_len);

    let next_bridging_offset_ms = ((buffer_len - consumed) as f64 * chunk_time_ms).floor() as u64;

    Some(ReplayPlan {
        first_chunk: consumed,
        next_bridging_offset_ms,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- End-to-end numeric scenario ---------------------------------------

    /// streaming_limit = 10 000 ms, 100 chunks, last final at 9 500 ms,
    /// no carried offset ⇒ chunk time 100 ms, 95 chunks consumed, replay
    /// range [95, 100), next offset 500 ms.
    #[test]
    fn replay_range_covers_unacknowledged_tail() {
        let plan = plan_replay(100, 10_000, 9_500, 0).unwrap();
        assert_eq!(plan.first_chunk, 95);
        assert_eq!(plan.next_bridging_offset_ms, 500);
    }

    /// Second cycle: the 500 ms offset carried from the previous replay is
    /// subtracted from the confirmed time before chunks are counted.
    #[test]
    fn carried_offset_shifts_the_consumed_prefix() {
        let plan = plan_replay(100, 10_000, 9_500, 500).unwrap();
        assert_eq!(plan.first_chunk, 90);
        assert_eq!(plan.next_bridging_offset_ms, 1_000);
    }

    // ---- Clamp --------------------------------------------------------------

    /// With no confirmed results the offset clamps to zero — negative values
    /// cannot leak through.
    #[test]
    fn offset_clamps_to_zero_when_nothing_was_confirmed() {
        assert_eq!(clamp_offset(700, 0), 0);

        // A full replay follows: nothing was acknowledged.
        let plan = plan_replay(10, 10_000, 0, 700).unwrap();
        assert_eq!(plan.first_chunk, 0);
    }

    #[test]
    fn offset_clamps_to_final_request_end_time() {
        assert_eq!(clamp_offset(9_999, 4_000), 4_000);
        assert_eq!(clamp_offset(3_000, 4_000), 3_000);
    }

    // ---- Degenerate inputs --------------------------------------------------

    /// Empty previous buffer ⇒ no replay, no error.
    #[test]
    fn empty_buffer_yields_no_plan() {
        assert_eq!(plan_replay(0, 10_000, 9_500, 500), None);
    }

    /// Zero streaming limit ⇒ zero chunk time ⇒ replay skipped.
    #[test]
    fn zero_chunk_time_yields_no_plan() {
        assert_eq!(plan_replay(100, 0, 0, 0), None);
    }

    // ---- Boundary behaviour -------------------------------------------------

    /// Confirmed time equal to the full session ⇒ everything was consumed,
    /// nothing to replay, no time carried forward.
    #[test]
    fn fully_confirmed_session_replays_nothing() {
        let plan = plan_replay(100, 10_000, 10_000, 0).unwrap();
        assert_eq!(plan.first_chunk, 100);
        assert_eq!(plan.next_bridging_offset_ms, 0);
    }

    /// No confirmed results but a non-empty buffer ⇒ the whole buffer is
    /// replayed and a full session of time is carried forward.
    #[test]
    fn unconfirmed_session_replays_everything() {
        let plan = plan_replay(50, 10_000, 0, 0).unwrap();
        assert_eq!(plan.first_chunk, 0);
        assert_eq!(plan.next_bridging_offset_ms, 10_000);
    }

    /// The consumed prefix can never exceed the buffer, even when the
    /// confirmed time overshoots the nominal session length.
    #[test]
    fn consumed_prefix_is_capped_at_buffer_len() {
        let plan = plan_replay(10, 10_000, 25_000, 0).unwrap();
        assert_eq!(plan.first_chunk, 10);
        assert_eq!(plan.next_bridging_offset_ms, 0);
    }

    /// Each restart plans over its own session's buffer: the offset carried
    /// out of one replay feeds the next cycle's plan, whose indices refer to
    /// the newer buffer only.
    #[test]
    fn carried_offset_feeds_the_next_sessions_buffer() {
        // Session A: 10 chunks, confirmed through 5 000 ms.
        let first = plan_replay(10, 10_000, 5_000, 0).unwrap();
        assert_eq!(first.first_chunk, 5);
        assert_eq!(first.next_bridging_offset_ms, 5_000);

        // Session B: a fresh 10-chunk buffer, confirmed through 9 000 ms.
        // The carried offset accounts for the replayed tail of A, so only
        // the newly confirmed time consumes chunks of B.
        let second = plan_replay(10, 10_000, 9_000, first.next_bridging_offset_ms).unwrap();
        assert_eq!(second.first_chunk, 4);
        assert_eq!(second.next_bridging_offset_ms, 6_000);
    }

    // ---- TimingState --------------------------------------------------------

    #[test]
    fn fresh_timing_state_is_zeroed() {
        let t = TimingState::new();
        assert_eq!(t.result_end_time_ms, 0);
        assert_eq!(t.is_final_end_time_ms, 0);
        assert_eq!(t.final_request_end_time_ms, 0);
        assert_eq!(t.bridging_offset_ms, 0);
        assert_eq!(t.restart_counter, 0);
        assert!(!t.last_transcript_was_final);
    }

    #[test]
    fn session_start_offset_scales_with_restarts() {
        let mut t = TimingState::new();
        assert_eq!(t.session_start_offset_ms(10_000), 0);

        t.restart_counter = 3;
        assert_eq!(t.session_start_offset_ms(10_000), 30_000);
    }
}
