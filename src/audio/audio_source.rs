//! Audio source abstraction for live capture.

use anyhow::Result;
use tokio::sync::mpsc;

/// Trait for streaming audio capture sources.
///
/// A source pushes raw PCM frames (16-bit little-endian mono) into the
/// provided channel for the lifetime of a session. Pausing keeps the device
/// open but stops frames from flowing.
pub trait AudioSource {
    /// Start capturing into `frames`.
    fn start(&mut self, frames: mpsc::UnboundedSender<Vec<u8>>) -> Result<()>;

    /// Stop capturing and release the device.
    fn stop(&mut self) -> Result<()>;

    /// Suspend frame delivery without releasing the device.
    fn pause(&mut self);

    /// Resume frame delivery after a pause.
    fn resume(&mut self);

    /// Whether this source is currently capturing.
    fn is_active(&self) -> bool;

    /// The sample rate of captured audio.
    fn sample_rate(&self) -> u32;
}
