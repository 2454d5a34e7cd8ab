//! Microphone audio capture via cpal.

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::audio_source::AudioSource;

pub struct MicAudioSource {
    device: cpal::Device,
    config: cpal::StreamConfig,
    stream: Option<cpal::Stream>,
    paused: Arc<AtomicBool>,
    active: bool,
    target_sample_rate: u32,
}

impl MicAudioSource {
    /// Create a new mic source using the default input device.
    ///
    /// # Arguments
    /// * `sample_rate` - Capture rate in Hz (the speech service expects 16000)
    pub fn new(sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .context("No input device available for session capture")?;

        info!(
            "Session mic source using device: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        );

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        Ok(Self {
            device,
            config,
            stream: None,
            paused: Arc::new(AtomicBool::new(false)),
            active: false,
            target_sample_rate: sample_rate,
        })
    }
}

impl AudioSource for MicAudioSource {
    fn start(&mut self, frames: mpsc::UnboundedSender<Vec<u8>>) -> Result<()> {
        if self.active {
            return Err(anyhow::anyhow!("Mic source already capturing"));
        }

        self.paused.store(false, Ordering::Relaxed);
        let paused = self.paused.clone();
        let err_fn = |err| error!("Session mic stream error: {}", err);

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if paused.load(Ordering::Relaxed) {
                    return;
                }
                // f32 samples → s16le, the frame format the speech service
                // ingests.
                let mut frame = Vec::with_capacity(data.len() * 2);
                for &sample in data {
                    let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                    frame.extend_from_slice(&value.to_le_bytes());
                }
                // A closed receiver just means the session is tearing down.
                let _ = frames.send(frame);
            },
            err_fn,
            None,
        )?;

        stream.play()?;
        self.stream = Some(stream);
        self.active = true;

        info!("Session mic capture started");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if !self.active {
            return Err(anyhow::anyhow!("Mic source not capturing"));
        }

        // Drop the stream to stop capture.
        if let Some(stream) = self.stream.take() {
            debug!("Stopping session mic stream");
            drop(stream);
        }

        self.active = false;
        info!("Session mic capture stopped");
        Ok(())
    }

    fn pause(&mut self) {
        self.paused.store(true, Ordering::Relaxed);
        debug!("Session mic paused");
    }

    fn resume(&mut self) {
        self.paused.store(false, Ordering::Relaxed);
        debug!("Session mic resumed");
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn sample_rate(&self) -> u32 {
        self.target_sample_rate
    }
}

impl Drop for MicAudioSource {
    fn drop(&mut self) {
        if self.active {
            debug!("Dropping active MicAudioSource, cleaning up");
            let _ = self.stop();
        }
    }
}
