//! RIFF/WAVE container encoding for mono 16-bit PCM
//!
//! The layout is the canonical 44-byte header followed by the samples:
//!
//! ```text
//! 0   "RIFF"   4  36 + data size   8  "WAVE"
//! 12  "fmt "   16 16               20 1 (PCM)      22 channels
//! 24  rate     28 byte rate        32 block align  34 bits per sample
//! 36  "data"   40 data size        44 samples...
//! ```
//!
//! All integers are little-endian.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{AudioError, SampleRate};

pub(crate) const NUM_CHANNELS: u16 = 1;
pub(crate) const BITS_PER_SAMPLE: u16 = 16;
pub(crate) const BLOCK_ALIGN: u16 = NUM_CHANNELS * BITS_PER_SAMPLE / 8;
const FMT_CHUNK_SIZE: u32 = 16;
const FORMAT_PCM: u16 = 1;
/// Bytes of the RIFF header that follow the ChunkSize field, up to the data.
const RIFF_OVERHEAD: u32 = 36;

/// A complete, immutable WAV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavContainer {
    bytes: Bytes,
}

impl WavContainer {
    pub const MIME_TYPE: &'static str = "audio/wav";
    pub const HEADER_LEN: usize = 44;

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// The raw sample bytes following the header.
    pub fn data(&self) -> &[u8] {
        &self.bytes[Self::HEADER_LEN..]
    }

    pub fn sample_count(&self) -> usize {
        self.data().len() / BLOCK_ALIGN as usize
    }

    /// The rate stored in the fmt chunk. `None` only for a zero rate.
    pub fn sample_rate(&self) -> Option<SampleRate> {
        let field: [u8; 4] = self.bytes[24..28].try_into().ok()?;
        SampleRate::new(u32::from_le_bytes(field))
    }

    pub async fn write_to(&self, path: &Path) -> Result<(), AudioError> {
        tokio::fs::write(path, &self.bytes).await?;
        Ok(())
    }
}

impl AsRef<[u8]> for WavContainer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Serializes as base64 so containers can travel inside JSON events.
impl Serialize for WavContainer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.bytes))
    }
}

impl<'de> Deserialize<'de> for WavContainer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)?;
        if bytes.len() < Self::HEADER_LEN || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE"
        {
            return Err(serde::de::Error::custom("not a RIFF/WAVE container"));
        }
        Ok(Self {
            bytes: Bytes::from(bytes),
        })
    }
}

/// Encodes mono 16-bit samples into a WAV container.
///
/// Total over its inputs: the output is always `44 + 2 * samples.len()`
/// bytes. Size fields wrap at u32 for inputs too large for the format.
pub fn encode_wav(samples: &[i16], sample_rate: SampleRate) -> WavContainer {
    let data_size = (samples.len() as u32).wrapping_mul(BLOCK_ALIGN as u32);

    let mut buf = BytesMut::with_capacity(WavContainer::HEADER_LEN + samples.len() * 2);

    // RIFF header
    buf.put_slice(b"RIFF");
    buf.put_u32_le(RIFF_OVERHEAD.wrapping_add(data_size));
    buf.put_slice(b"WAVE");

    // fmt chunk
    buf.put_slice(b"fmt ");
    buf.put_u32_le(FMT_CHUNK_SIZE);
    buf.put_u16_le(FORMAT_PCM);
    buf.put_u16_le(NUM_CHANNELS);
    buf.put_u32_le(sample_rate.get());
    buf.put_u32_le(sample_rate.byte_rate());
    buf.put_u16_le(BLOCK_ALIGN);
    buf.put_u16_le(BITS_PER_SAMPLE);

    // data chunk
    buf.put_slice(b"data");
    buf.put_u32_le(data_size);
    for &sample in samples {
        buf.put_i16_le(sample);
    }

    WavContainer {
        bytes: buf.freeze(),
    }
}
