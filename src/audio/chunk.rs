//! Audio chunk and per-session buffer types.
//!
//! [`AudioChunk`] is the unit of audio that flows through the engine: an
//! opaque byte payload in the wire format the recognizer was configured for
//! (LINEAR16 by default).  Chunks are immutable once captured; their position
//! inside a [`SessionBuffer`] is their sequence position.
//!
//! [`SessionBuffer`] accumulates every chunk captured since the current
//! recognizer session started.  The session manager keeps exactly two of
//! these: the *current* buffer (being filled) and the *previous* buffer (a
//! frozen snapshot of the prior session, consulted once for replay after a
//! restart and then discarded wholesale).

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// A single opaque chunk of encoded audio.
///
/// The engine never inspects the payload; it only appends, replays and
/// forwards it.  Cloning is a buffer copy, which the replay path relies on
/// (the same chunk may be written to a session and kept in the buffer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    data: Vec<u8>,
}

impl AudioChunk {
    /// Wrap raw encoded bytes in a chunk.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// The encoded payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for AudioChunk {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

// ---------------------------------------------------------------------------
// SessionBuffer
// ---------------------------------------------------------------------------

/// Ordered sequence of [`AudioChunk`]s accumulated during one recognizer
/// session.
///
/// Append-only while the session is live.  At restart the whole buffer is
/// moved out with [`take`](Self::take) and becomes the *previous* buffer;
/// buffers are replaced wholesale, never merged.
#[derive(Debug, Default, Clone)]
pub struct SessionBuffer {
    chunks: Vec<AudioChunk>,
}

impl SessionBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk at the end of the sequence.
    pub fn push(&mut self, chunk: AudioChunk) {
        self.chunks.push(chunk);
    }

    /// Number of chunks stored.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns `true` when no chunks are stored.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// All chunks in capture order.
    pub fn chunks(&self) -> &[AudioChunk] {
        &self.chunks
    }

    /// The suffix starting at `first` in capture order — the replay range
    /// `[first, len)`.  Out-of-range `first` yields an empty slice.
    pub fn suffix(&self, first: usize) -> &[AudioChunk] {
        self.chunks.get(first.min(self.chunks.len())..).unwrap_or(&[])
    }

    /// Move the whole buffer out, leaving this one empty.
    pub fn take(&mut self) -> SessionBuffer {
        std::mem::take(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(byte: u8) -> AudioChunk {
        AudioChunk::new(vec![byte; 4])
    }

    // ---- AudioChunk --------------------------------------------------------

    #[test]
    fn chunk_exposes_payload() {
        let c = AudioChunk::new(vec![1, 2, 3]);
        assert_eq!(c.data(), &[1, 2, 3]);
        assert_eq!(c.len(), 3);
        assert!(!c.is_empty());
    }

    #[test]
    fn chunk_from_vec() {
        let c: AudioChunk = vec![9u8].into();
        assert_eq!(c.data(), &[9]);
    }

    // ---- SessionBuffer push / len ------------------------------------------

    #[test]
    fn push_preserves_capture_order() {
        let mut buf = SessionBuffer::new();
        buf.push(chunk(1));
        buf.push(chunk(2));
        buf.push(chunk(3));

        assert_eq!(buf.len(), 3);
        assert_eq!(buf.chunks()[0], chunk(1));
        assert_eq!(buf.chunks()[2], chunk(3));
    }

    #[test]
    fn new_buffer_is_empty() {
        let buf = SessionBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
    }

    // ---- suffix -------------------------------------------------------------

    #[test]
    fn suffix_returns_half_open_tail() {
        let mut buf = SessionBuffer::new();
        for b in 0..5 {
            buf.push(chunk(b));
        }

        let tail = buf.suffix(3);
        assert_eq!(tail, &[chunk(3), chunk(4)]);
    }

    #[test]
    fn suffix_zero_is_whole_buffer() {
        let mut buf = SessionBuffer::new();
        buf.push(chunk(7));
        assert_eq!(buf.suffix(0), buf.chunks());
    }

    #[test]
    fn suffix_at_len_is_empty() {
        let mut buf = SessionBuffer::new();
        buf.push(chunk(1));
        assert!(buf.suffix(1).is_empty());
    }

    #[test]
    fn suffix_past_len_is_empty() {
        let mut buf = SessionBuffer::new();
        buf.push(chunk(1));
        assert!(buf.suffix(100).is_empty());
    }

    // ---- take (wholesale buffer rotation) ----------------------------------

    #[test]
    fn take_moves_all_chunks_and_empties_source() {
        let mut buf = SessionBuffer::new();
        buf.push(chunk(1));
        buf.push(chunk(2));

        let prev = buf.take();
        assert_eq!(prev.len(), 2);
        assert!(buf.is_empty());

        // The source must be reusable as the next current buffer.
        buf.push(chunk(3));
        assert_eq!(buf.len(), 1);
    }
}
