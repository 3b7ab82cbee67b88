//! Audio format conversion utilities.
//!
//! The recognizer is configured for a fixed sample rate and a 16-bit PCM
//! encoding, while capture devices deliver interleaved `f32` at whatever
//! rate the hardware prefers.  The capture bridge applies three steps:
//!
//! 1. [`downmix_to_mono`] — average interleaved channels down to one.
//! 2. [`resample`] — linear interpolation to the configured rate.
//! 3. [`pcm16_bytes`] — encode `f32` samples as little-endian `i16` bytes.

// ---------------------------------------------------------------------------
// downmix_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all
/// channels.
///
/// The output length is `samples.len() / channels`.
///
/// * If `channels == 1` the input slice is returned as an owned `Vec` with no
///   averaging (fast path).
/// * If `channels == 0` an empty vector is returned.
///
/// # Example
///
/// ```rust
/// use live_transcribe::audio::downmix_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, -0.2]; // L R L R
/// let mono = downmix_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[0] - 0.0).abs() < 1e-6);
/// ```
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

/// Resample mono `samples` from `source_rate` Hz to `target_rate` Hz using
/// linear interpolation.
///
/// * If the rates already match the input is cloned and returned unchanged.
/// * If `samples` is empty, or either rate is zero, an empty vector is
///   returned.
///
/// The output length is approximately
/// `samples.len() * target_rate / source_rate`.
///
/// # Example
///
/// ```rust
/// use live_transcribe::audio::resample;
///
/// // Downsample 48 kHz → 16 kHz (ratio 1/3)
/// let hi = vec![0.5_f32; 480];
/// let lo = resample(&hi, 48_000, 16_000);
/// assert_eq!(lo.len(), 160);
/// ```
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate {
        return samples.to_vec();
    }

    if samples.is_empty() || source_rate == 0 || target_rate == 0 {
        return Vec::new();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples.len() as f64 * ratio).floor() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos.floor() as usize;
        let frac = (src_pos - idx as f64) as f32;

        let a = samples[idx.min(samples.len() - 1)];
        let b = samples[(idx + 1).min(samples.len() - 1)];
        output.push(a + (b - a) * frac);
    }

    output
}

// ---------------------------------------------------------------------------
// pcm16_bytes
// ---------------------------------------------------------------------------

/// Encode `f32` samples in `[-1.0, 1.0]` as little-endian signed 16-bit PCM.
///
/// Samples outside the valid range are clamped before conversion.  The output
/// is `samples.len() * 2` bytes — the LINEAR16 wire format the recognizer
/// expects.
///
/// # Example
///
/// ```rust
/// use live_transcribe::audio::pcm16_bytes;
///
/// let bytes = pcm16_bytes(&[0.0, 1.0, -1.0]);
/// assert_eq!(bytes.len(), 6);
/// assert_eq!(&bytes[0..2], &[0, 0]); // 0.0 → 0
/// ```
pub fn pcm16_bytes(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let clamped = s.clamp(-1.0, 1.0);
        let value = (clamped * i16::MAX as f32) as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
