//! Application entry point — live-transcribe.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the transcript sinks (console + broadcast fan-out).
//! 5. Build the recognizer backend.
//! 6. Spawn the session manager on the tokio runtime.
//! 7. Start cpal audio capture and the conversion bridge thread.
//! 8. Block on the session manager until the capture feed closes or a
//!    fatal recognizer error occurs.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;

use live_transcribe::{
    audio::{downmix_to_mono, pcm16_bytes, resample, AudioCapture, AudioChunk, CaptureFrame},
    config::AppConfig,
    recognizer::{Recognizer, SimulatedRecognizer, StreamingRequest},
    session::SessionManager,
    sink::{BroadcastSink, ConsoleSink, FanoutSink, TranscriptSink},
};

// ---------------------------------------------------------------------------
// Capture bridge
// ---------------------------------------------------------------------------

/// Drain raw cpal frames, convert each to the recognizer's wire format and
/// forward it to the session manager.
///
/// Runs on a plain thread: the cpal callback delivers frames through a
/// `std::sync::mpsc` channel, and conversion (downmix + resample + PCM16
/// encode) happens here rather than inside the realtime callback.  Each
/// frame becomes one [`AudioChunk`], so chunk durations stay uniform as long
/// as the device delivers uniform callback buffers.
fn run_capture_bridge(
    frame_rx: std::sync::mpsc::Receiver<CaptureFrame>,
    audio_tx: mpsc::Sender<AudioChunk>,
    target_rate: u32,
) {
    while let Ok(frame) = frame_rx.recv() {
        let mono = if frame.channels > 1 {
            downmix_to_mono(&frame.samples, frame.channels)
        } else {
            frame.samples
        };

        let samples = if frame.sample_rate != target_rate {
            resample(&mono, frame.sample_rate, target_rate)
        } else {
            mono
        };

        let chunk = AudioChunk::new(pcm16_bytes(&samples));
        if chunk.is_empty() {
            continue;
        }

        if audio_tx.blocking_send(chunk).is_err() {
            // Manager is gone; closing this thread drops frame_rx, which
            // stops the cpal stream's sends from piling up.
            log::info!("capture bridge: session manager gone, stopping");
            return;
        }
    }

    log::info!("capture bridge: audio stream closed");
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("live-transcribe starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    let streaming_limit_ms = config.stream.streaming_limit_ms;
    let sample_rate = config.recognition.sample_rate_hertz;

    // 3. Tokio runtime (2 worker threads — manager loop + recognizer tasks)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 4. Sinks: interim-aware console plus a broadcast channel other
    //    components can subscribe to.
    let broadcast = BroadcastSink::new();
    let sink: Arc<dyn TranscriptSink> = Arc::new(FanoutSink::new(vec![
        Arc::new(ConsoleSink::new()),
        Arc::new(broadcast),
    ]));

    // 5. Recognizer backend.  The simulated backend reports synthetic
    //    utterances derived from the audio it receives, so the whole
    //    restart/replay loop runs end-to-end without a cloud account.
    let recognizer: Arc<dyn Recognizer> = Arc::new(SimulatedRecognizer::default());
    let request = StreamingRequest::from(&config.recognition);

    // 6. Session manager
    let (audio_tx, audio_rx) = mpsc::channel::<AudioChunk>(64);
    let manager = SessionManager::new(recognizer, request, streaming_limit_ms, sink);
    let manager_task = rt.spawn(manager.run(audio_rx));

    // 7. cpal capture + conversion bridge thread
    let capture = AudioCapture::new(config.audio.input_device.as_deref())
        .context("audio capture unavailable")?;
    log::info!(
        "Audio capture: {} Hz, {} ch → {} Hz PCM16, restart every {} ms",
        capture.sample_rate(),
        capture.channels(),
        sample_rate,
        streaming_limit_ms
    );

    let (frame_tx, frame_rx) = std::sync::mpsc::channel::<CaptureFrame>();
    let bridge = std::thread::Builder::new()
        .name("capture-bridge".into())
        .spawn(move || run_capture_bridge(frame_rx, audio_tx, sample_rate))
        .context("failed to spawn capture bridge thread")?;

    let _stream_handle = capture
        .start(frame_tx)
        .context("failed to start audio stream")?;

    // 8. Run until the capture feed closes or the recognizer fails fatally.
    rt.block_on(manager_task)
        .context("session manager task panicked")??;

    drop(_stream_handle);
    let _ = bridge.join();

    Ok(())
}
