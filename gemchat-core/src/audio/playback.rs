//! Speaker output for synthesized speech, via cpal.
//! Clips are resampled to the device rate and copied to every channel.

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig, SupportedStreamConfig,
};
use rubato::{FftFixedIn, Resampler};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

use crate::voice::tts::types::AudioClip;

const RESAMPLE_CHUNK: usize = 1024;

pub struct AudioPlayer {
    device: Device,
    supported_config: SupportedStreamConfig,
}

/// Playing clip. Dropping the handle stops the stream.
pub struct AudioPlayback {
    _stream: Stream,
    finished: Arc<AtomicBool>,
}

impl AudioPlayback {
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    pub async fn wait(&self) {
        while !self.is_finished() {
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }
    }
}

impl AudioPlayer {
    /// Opens the default output device.
    pub fn new() -> Result<Self> {
        let device = cpal::default_host()
            .default_output_device()
            .context("no output device available")?;

        let supported_config = device
            .default_output_config()
            .context("failed to get default output config")?;

        Ok(Self {
            device,
            supported_config,
        })
    }

    pub fn play(&self, clip: &AudioClip) -> Result<AudioPlayback> {
        let device_rate = self.supported_config.sample_rate().0;
        let device_channels = self.supported_config.channels() as usize;
        let config: StreamConfig = self.supported_config.clone().into();

        let mono: Vec<f32> = clip
            .samples
            .samples()
            .iter()
            .map(|&sample| sample as f32 / 32768.0)
            .collect();

        let mono = if clip.sample_rate.get() == device_rate {
            mono
        } else {
            resample(&mono, clip.sample_rate.get(), device_rate)?
        };

        let frames: Vec<f32> = mono
            .iter()
            .flat_map(|&sample| std::iter::repeat(sample).take(device_channels))
            .collect();

        debug!(
            clip_rate = clip.sample_rate.get(),
            device_rate,
            device_channels,
            frames = frames.len(),
            "starting playback"
        );

        let frames = Arc::new(frames);
        let cursor = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let stream = match self.supported_config.sample_format() {
            SampleFormat::F32 => {
                self.build_stream::<f32>(&config, frames, cursor, finished.clone())?
            }
            SampleFormat::I16 => {
                self.build_stream::<i16>(&config, frames, cursor, finished.clone())?
            }
            format => anyhow::bail!("unsupported sample format: {:?}", format),
        };

        stream.play().context("failed to start playback stream")?;

        Ok(AudioPlayback {
            _stream: stream,
            finished,
        })
    }

    fn build_stream<T>(
        &self,
        config: &StreamConfig,
        frames: Arc<Vec<f32>>,
        cursor: Arc<AtomicUsize>,
        finished: Arc<AtomicBool>,
    ) -> Result<Stream>
    where
        T: SizedSample + FromSample<f32> + Default + Send + 'static,
    {
        self.device
            .build_output_stream(
                config,
                move |out: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let start = cursor.load(Ordering::SeqCst);
                    let available = frames.len().saturating_sub(start);
                    let n = available.min(out.len());

                    for (slot, &sample) in out.iter_mut().zip(&frames[start..start + n]) {
                        *slot = T::from_sample(sample);
                    }
                    out[n..].fill(T::default());

                    cursor.store(start + n, Ordering::SeqCst);
                    if available <= out.len() {
                        finished.store(true, Ordering::SeqCst);
                    }
                },
                move |err| {
                    error!(error = ?err, "playback stream error");
                },
                None,
            )
            .context("failed to build output stream")
    }
}

fn resample(samples: &[f32], from_hz: u32, to_hz: u32) -> Result<Vec<f32>> {
    let mut resampler =
        FftFixedIn::<f32>::new(from_hz as usize, to_hz as usize, RESAMPLE_CHUNK, 2, 1)
            .context("failed to create resampler")?;

    let mut output = Vec::with_capacity(samples.len() * to_hz as usize / from_hz as usize);
    let mut pos = 0;

    while pos < samples.len() {
        let needed = resampler.input_frames_next();
        let end = (pos + needed).min(samples.len());

        let mut chunk = samples[pos..end].to_vec();
        chunk.resize(needed, 0.0);

        let input = vec![chunk];
        let mut resampled = resampler
            .process(&input, None)
            .map_err(|e| anyhow::anyhow!("resampling failed: {:?}", e))?;
        if let Some(channel) = resampled.pop() {
            output.extend(channel);
        }

        pos = end;
    }

    Ok(output)
}
