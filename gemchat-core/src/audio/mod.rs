//! Audio primitives for speech playback
//!
//! Text-to-speech replies arrive as raw mono PCM16. They are decoded into a
//! [`SampleBuffer`] and wrapped in a WAV container so any media sink can
//! play them.

pub mod pcm;
#[cfg(feature = "playback")]
pub mod playback;
pub mod wav;

use std::num::NonZeroU32;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use pcm::{decode_base64_pcm16, sample_rate_from_mime, AudioError};
pub use wav::{encode_wav, WavContainer};

/// Samples per second of a mono PCM stream. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SampleRate(NonZeroU32);

impl SampleRate {
    /// Rate of the raw PCM returned by the Gemini TTS models.
    pub const GEMINI_TTS: SampleRate = match NonZeroU32::new(16_000) {
        Some(rate) => SampleRate(rate),
        None => panic!("sample rate must be positive"),
    };

    pub fn new(hz: u32) -> Option<Self> {
        NonZeroU32::new(hz).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Bytes per second of mono 16-bit audio at this rate. Wraps at u32
    /// like the header field it fills.
    pub fn byte_rate(self) -> u32 {
        self.get().wrapping_mul(wav::BLOCK_ALIGN as u32)
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self::GEMINI_TTS
    }
}

impl TryFrom<u32> for SampleRate {
    type Error = String;

    fn try_from(hz: u32) -> Result<Self, Self::Error> {
        Self::new(hz).ok_or_else(|| "sample rate must be greater than zero".to_string())
    }
}

impl From<SampleRate> for u32 {
    fn from(rate: SampleRate) -> Self {
        rate.get()
    }
}

impl std::fmt::Display for SampleRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Hz", self.get())
    }
}

/// Ordered mono signed 16-bit samples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleBuffer(Vec<i16>);

impl SampleBuffer {
    pub fn from_samples(samples: Vec<i16>) -> Self {
        Self(samples)
    }

    /// Builds a buffer from wider integers, truncating each value to 16-bit
    /// two's complement instead of rejecting out-of-range input.
    pub fn from_wrapping<I>(values: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        values.into_iter().map(|value| value as i16).collect()
    }

    /// Reinterprets little-endian byte pairs as samples. A trailing odd byte
    /// is ignored.
    pub fn from_pcm16_le(bytes: &[u8]) -> Self {
        bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }

    pub fn samples(&self) -> &[i16] {
        &self.0
    }

    pub fn into_samples(self) -> Vec<i16> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn duration(&self, rate: SampleRate) -> Duration {
        Duration::from_secs_f64(self.0.len() as f64 / rate.get() as f64)
    }

    pub fn to_wav(&self, rate: SampleRate) -> WavContainer {
        encode_wav(&self.0, rate)
    }
}

impl From<Vec<i16>> for SampleBuffer {
    fn from(samples: Vec<i16>) -> Self {
        Self(samples)
    }
}

impl FromIterator<i16> for SampleBuffer {
    fn from_iter<T: IntoIterator<Item = i16>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl AsRef<[i16]> for SampleBuffer {
    fn as_ref(&self) -> &[i16] {
        &self.0
    }
}
