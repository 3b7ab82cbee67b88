//! Wire-level types of the recognizer contract.
//!
//! These model the observable surface of the remote streaming service: the
//! open-time request and the result events it emits.  The actual network
//! protocol is out of scope; any backend that can produce these types plugs
//! in behind [`crate::recognizer::Recognizer`].

use crate::config::{AudioEncoding, RecognitionConfig};

// ---------------------------------------------------------------------------
// ResultTime
// ---------------------------------------------------------------------------

/// End time of a recognition result, as reported by the service.
///
/// Protobuf-duration style: whole seconds plus a nanosecond remainder, both
/// relative to the start of the session that produced the result.  Each
/// session's clock restarts at zero; [`crate::session`] converts these into
/// one continuous timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultTime {
    /// Whole seconds since session start.
    pub seconds: i64,
    /// Nanosecond remainder.
    pub nanos: i32,
}

impl ResultTime {
    /// Build a `ResultTime` from a millisecond offset.
    pub fn from_millis(ms: u64) -> Self {
        Self {
            seconds: (ms / 1_000) as i64,
            nanos: ((ms % 1_000) * 1_000_000) as i32,
        }
    }

    /// Convert to milliseconds, rounding the nanosecond part.
    ///
    /// Negative components (never produced by a well-behaved service) clamp
    /// to zero so downstream time math stays unsigned.
    pub fn as_millis(&self) -> u64 {
        let seconds = self.seconds.max(0) as u64;
        let nanos = self.nanos.max(0) as u64;
        seconds * 1_000 + (nanos + 500_000) / 1_000_000
    }
}

// ---------------------------------------------------------------------------
// ResultEvent
// ---------------------------------------------------------------------------

/// One recognition result emitted by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultEvent {
    /// Best-hypothesis transcript text.
    pub transcript: String,
    /// `true` when the service will not revise this result further.
    pub is_final: bool,
    /// End time of the recognized audio, relative to session start.
    pub end_time: ResultTime,
}

impl ResultEvent {
    /// A final result ending at `ms` milliseconds into the session.
    pub fn final_at(transcript: impl Into<String>, ms: u64) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
            end_time: ResultTime::from_millis(ms),
        }
    }

    /// An interim result ending at `ms` milliseconds into the session.
    pub fn interim_at(transcript: impl Into<String>, ms: u64) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
            end_time: ResultTime::from_millis(ms),
        }
    }
}

// ---------------------------------------------------------------------------
// StreamingRequest
// ---------------------------------------------------------------------------

/// Open-time configuration sent to the recognizer when a session starts.
///
/// Every session of one engine run uses the same request; restarts re-send it
/// verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamingRequest {
    /// Audio wire encoding of the chunks that will follow.
    pub encoding: AudioEncoding,
    /// Sample rate of the audio chunks in Hz.
    pub sample_rate_hertz: u32,
    /// BCP-47 language tag.
    pub language_code: String,
    /// Whether provisional results should be emitted.
    pub interim_results: bool,
}

impl From<&RecognitionConfig> for StreamingRequest {
    fn from(config: &RecognitionConfig) -> Self {
        Self {
            encoding: config.encoding,
            sample_rate_hertz: config.sample_rate_hertz,
            language_code: config.language_code.clone(),
            interim_results: config.interim_results,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- ResultTime --------------------------------------------------------

    #[test]
    fn as_millis_combines_seconds_and_nanos() {
        let t = ResultTime {
            seconds: 9,
            nanos: 500_000_000,
        };
        assert_eq!(t.as_millis(), 9_500);
    }

    #[test]
    fn as_millis_rounds_nanos_to_nearest_ms() {
        // 1 500 000 ns = 1.5 ms → rounds to 2 ms.
        let t = ResultTime {
            seconds: 0,
            nanos: 1_500_000,
        };
        assert_eq!(t.as_millis(), 2);

        // 1 400 000 ns = 1.4 ms → rounds to 1 ms.
        let t = ResultTime {
            seconds: 0,
            nanos: 1_400_000,
        };
        assert_eq!(t.as_millis(), 1);
    }

    #[test]
    fn as_millis_clamps_negative_components() {
        let t = ResultTime {
            seconds: -3,
            nanos: -100,
        };
        assert_eq!(t.as_millis(), 0);
    }

    #[test]
    fn from_millis_round_trips() {
        for ms in [0u64, 1, 999, 1_000, 9_500, 290_000] {
            assert_eq!(ResultTime::from_millis(ms).as_millis(), ms);
        }
    }

    // ---- ResultEvent -------------------------------------------------------

    #[test]
    fn final_and_interim_constructors() {
        let f = ResultEvent::final_at("done", 2_000);
        assert!(f.is_final);
        assert_eq!(f.end_time.as_millis(), 2_000);

        let i = ResultEvent::interim_at("part", 300);
        assert!(!i.is_final);
        assert_eq!(i.end_time.as_millis(), 300);
    }

    // ---- StreamingRequest --------------------------------------------------

    #[test]
    fn request_mirrors_recognition_config() {
        let config = RecognitionConfig::default();
        let request = StreamingRequest::from(&config);

        assert_eq!(request.encoding, config.encoding);
        assert_eq!(request.sample_rate_hertz, config.sample_rate_hertz);
        assert_eq!(request.language_code, config.language_code);
        assert_eq!(request.interim_results, config.interim_results);
    }
}
