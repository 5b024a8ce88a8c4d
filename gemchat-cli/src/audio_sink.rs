use anyhow::{Context, Result};
use chrono::Local;
use gemchat_core::WavContainer;
use std::path::PathBuf;
use tracing::info;

/// Where synthesized replies end up: a WAV file per reply, played as well
/// when built with the `playback` feature.
pub struct AudioSink {
    audio_dir: PathBuf,
    #[cfg(feature = "playback")]
    player: Option<gemchat_core::audio::playback::AudioPlayer>,
}

impl AudioSink {
    pub fn new(audio_dir: PathBuf) -> Self {
        Self {
            audio_dir,
            #[cfg(feature = "playback")]
            player: match gemchat_core::audio::playback::AudioPlayer::new() {
                Ok(player) => Some(player),
                Err(e) => {
                    tracing::warn!(error = ?e, "No audio output; replies will only be saved");
                    None
                }
            },
        }
    }

    /// Saves the reply and returns the file it was written to.
    pub async fn save(&self, wav: &WavContainer) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.audio_dir)
            .await
            .with_context(|| format!("Failed to create audio directory {:?}", self.audio_dir))?;

        let name = format!("reply-{}.wav", Local::now().format("%Y%m%d-%H%M%S%.3f"));
        let path = self.audio_dir.join(name);
        wav.write_to(&path)
            .await
            .with_context(|| format!("Failed to write {path:?}"))?;

        info!(
            ?path,
            mime = WavContainer::MIME_TYPE,
            bytes = wav.byte_len(),
            "Saved reply audio"
        );
        Ok(path)
    }

    #[cfg(feature = "playback")]
    pub async fn play(&self, wav: &WavContainer) -> Result<()> {
        use gemchat_core::voice::tts::AudioClip;

        let Some(player) = &self.player else {
            return Ok(());
        };
        let clip = AudioClip::from_wav(wav).context("WAV has no sample rate")?;
        player.play(&clip)?.wait().await;
        Ok(())
    }

    #[cfg(not(feature = "playback"))]
    pub async fn play(&self, _wav: &WavContainer) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemchat_core::audio::{SampleBuffer, SampleRate};

    #[tokio::test]
    async fn test_save_writes_reply_wav_into_missing_dir() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let sink = AudioSink {
            audio_dir: temp_dir.path().join("audio"),
            #[cfg(feature = "playback")]
            player: None,
        };
        let wav = SampleBuffer::from_samples(vec![1, -1, 512]).to_wav(SampleRate::GEMINI_TTS);

        let path = sink.save(&wav).await.unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("reply-") && name.ends_with(".wav"));
        assert_eq!(std::fs::read(&path).unwrap(), wav.as_bytes());
        assert_eq!(WavContainer::MIME_TYPE, "audio/wav");
    }
}
