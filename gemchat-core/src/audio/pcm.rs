use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;
use tracing::warn;

use super::{SampleBuffer, SampleRate};

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Invalid base64 audio payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Audio I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Decodes a base64 raw PCM payload into little-endian 16-bit samples.
pub fn decode_base64_pcm16(payload: &str) -> Result<SampleBuffer, AudioError> {
    let bytes = STANDARD.decode(payload.trim())?;
    if bytes.len() % 2 != 0 {
        warn!(
            byte_len = bytes.len(),
            "PCM payload has an odd byte count; dropping the trailing byte"
        );
    }
    Ok(SampleBuffer::from_pcm16_le(&bytes))
}

/// Extracts the `rate=` parameter of a mime type such as
/// `audio/L16;codec=pcm;rate=24000`.
pub fn sample_rate_from_mime(mime: &str) -> Option<SampleRate> {
    mime.split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("rate"))
        .and_then(|(_, value)| value.trim().parse::<u32>().ok())
        .and_then(SampleRate::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_reinterprets_little_endian_pairs() {
        // 0x0000, 0x7FFF, 0x8000, 0x03E8
        let payload = STANDARD.encode([0x00, 0x00, 0xFF, 0x7F, 0x00, 0x80, 0xE8, 0x03]);
        let buffer = decode_base64_pcm16(&payload).unwrap();
        assert_eq!(buffer.samples(), &[0, 32767, -32768, 1000]);
    }

    #[test]
    fn test_decode_empty_payload() {
        let buffer = decode_base64_pcm16("").unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        let err = decode_base64_pcm16("not base64!").unwrap_err();
        assert!(matches!(err, AudioError::InvalidBase64(_)));
    }

    #[test]
    fn test_rate_from_mime() {
        assert_eq!(
            sample_rate_from_mime("audio/L16;codec=pcm;rate=24000").map(SampleRate::get),
            Some(24_000)
        );
        assert_eq!(
            sample_rate_from_mime("audio/L16; Rate = 16000").map(SampleRate::get),
            Some(16_000)
        );
        assert_eq!(sample_rate_from_mime("audio/L16;codec=pcm"), None);
        assert_eq!(sample_rate_from_mime("audio/L16;rate=0"), None);
        assert_eq!(sample_rate_from_mime("audio/L16;rate=fast"), None);
        assert_eq!(sample_rate_from_mime("rate=16000"), None);
    }
}
