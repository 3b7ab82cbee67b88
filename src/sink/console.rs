//! Terminal transcript output.
//!
//! Interim results rewrite the current line in place (carriage return plus an
//! erase-line escape) so the reader watches the hypothesis evolve; final
//! results commit the text with a newline and a separator.  Output goes to
//! stdout; write failures are ignored per the sink contract.

use std::io::Write;
use std::sync::Mutex;

use super::{TranscriptEvent, TranscriptSink};

/// Interim lines longer than this are truncated with an ellipsis so the
/// in-place rewrite never wraps.
const MAX_INTERIM_COLS: usize = 120;

/// Erase the current terminal line and return the cursor to column 0.
const ERASE_LINE: &str = "\r\x1b[2K";

const SEPARATOR: &str = "################################";

// ---------------------------------------------------------------------------
// ConsoleSink
// ---------------------------------------------------------------------------

/// Writes transcripts to stdout with in-place interim updates.
pub struct ConsoleSink {
    /// Whether an interim line is currently displayed (must be erased or
    /// completed before the next write).
    line_open: Mutex<bool>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            line_open: Mutex::new(false),
        }
    }

    fn truncate_interim(text: &str) -> String {
        if text.chars().count() > MAX_INTERIM_COLS {
            let cut: String = text.chars().take(MAX_INTERIM_COLS - 3).collect();
            format!("{cut}...")
        } else {
            text.to_owned()
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptSink for ConsoleSink {
    fn publish(&self, event: &TranscriptEvent) {
        let mut line_open = match self.line_open.lock() {
            Ok(guard) => guard,
            Err(_) => return, // poisoned: a panicking writer already lost the terminal
        };

        let stdout = std::io::stdout();
        let mut out = stdout.lock();

        let result = if event.is_final {
            *line_open = false;
            writeln!(
                out,
                "{ERASE_LINE}{}: {}\n{SEPARATOR}",
                event.corrected_time_ms, event.text
            )
        } else {
            *line_open = true;
            write!(out, "{ERASE_LINE}{}", Self::truncate_interim(&event.text))
                .and_then(|_| out.flush())
        };

        if let Err(e) = result {
            log::debug!("console sink write failed: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_interim_text_is_untouched() {
        assert_eq!(ConsoleSink::truncate_interim("hello"), "hello");
    }

    #[test]
    fn long_interim_text_is_truncated_with_ellipsis() {
        let long = "x".repeat(300);
        let out = ConsoleSink::truncate_interim(&long);
        assert_eq!(out.chars().count(), MAX_INTERIM_COLS);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn boundary_length_is_not_truncated() {
        let exact = "y".repeat(MAX_INTERIM_COLS);
        assert_eq!(ConsoleSink::truncate_interim(&exact), exact);
    }

    #[test]
    fn publish_never_panics() {
        let sink = ConsoleSink::new();
        sink.publish(&TranscriptEvent {
            text: "interim".into(),
            is_final: false,
            corrected_time_ms: 10,
        });
        sink.publish(&TranscriptEvent {
            text: "final".into(),
            is_final: true,
            corrected_time_ms: 20,
        });
    }
}
