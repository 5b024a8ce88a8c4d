use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::audio::{SampleBuffer, SampleRate, WavContainer};

/// Mono PCM audio returned from TTS synthesis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub samples: SampleBuffer,
    pub sample_rate: SampleRate,
}

impl AudioClip {
    pub fn new(samples: SampleBuffer, sample_rate: SampleRate) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration(&self) -> Duration {
        self.samples.duration(self.sample_rate)
    }

    pub fn to_wav(&self) -> WavContainer {
        self.samples.to_wav(self.sample_rate)
    }

    pub fn from_wav(wav: &WavContainer) -> Option<Self> {
        Some(Self::new(
            SampleBuffer::from_pcm16_le(wav.data()),
            wav.sample_rate()?,
        ))
    }
}

/// Voice configuration for TTS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub name: String,
}

impl Voice {
    pub fn named(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_recovered_from_wav() {
        let clip = AudioClip::new(
            SampleBuffer::from_samples(vec![5, -5, 300]),
            SampleRate::new(24_000).unwrap(),
        );
        assert_eq!(AudioClip::from_wav(&clip.to_wav()), Some(clip));
    }
}
