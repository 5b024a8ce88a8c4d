//! Read-aloud through the actor, with a mock text-to-speech backend

use std::io::Cursor;

use gemchat_core::ai::mock::MockBehavior;
use gemchat_core::audio::{SampleBuffer, SampleRate};
use gemchat_core::chat::events::ChatEvent;
use gemchat_core::voice::tts::{AudioClip, MockTts};


use fixture::Fixture;

fn audio_event(event: &ChatEvent) -> bool {
    matches!(
        event,
        ChatEvent::AudioReady { .. } | ChatEvent::AudioFailed { .. }
    )
}

#[test]
fn test_listen_reads_latest_model_message() {
    fixture::run(|mut fixture| async move {
        fixture.step("Say something").await;

        fixture.actor.listen(None).unwrap();
        let event = fixture.wait_for(audio_event).await;

        let ChatEvent::AudioReady { message_index, wav } = event else {
            panic!("expected audio, got {event:?}");
        };
        assert_eq!(message_index, 2);

        let reader = hound::WavReader::new(Cursor::new(wav.as_bytes().to_vec())).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);
        assert_eq!(reader.len(), 1_600);

        let spoken = fixture.mock_tts().spoken();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].0, "Mock response");
    });
}

#[test]
fn test_listen_by_index_uses_that_message() {
    let clip = AudioClip::new(
        SampleBuffer::from_samples(vec![0, 32767, -32768, 1000]),
        SampleRate::new(24_000).unwrap(),
    );
    fixture::run_with(
        || Fixture::with_tts(MockTts::new(clip)),
        |mut fixture| async move {
            fixture.step("Hello").await;

            fixture.actor.listen(Some(0)).unwrap();
            let ChatEvent::AudioReady { message_index, wav } =
                fixture.wait_for(audio_event).await
            else {
                panic!("expected audio");
            };
            assert_eq!(message_index, 0);

            let mut reader =
                hound::WavReader::new(Cursor::new(wav.as_bytes().to_vec())).unwrap();
            assert_eq!(reader.spec().sample_rate, 24_000);
            let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
            assert_eq!(samples, vec![0, 32767, -32768, 1000]);

            let spoken = fixture.mock_tts().spoken();
            assert!(spoken[0].0.starts_with("Hello! I'm an advanced chatbot"));
        },
    );
}

#[test]
fn test_listen_failure_is_reported_not_recorded() {
    fixture::run_with(
        || Fixture::with_tts(MockTts::failing()),
        |mut fixture| async move {
            fixture.actor.listen(Some(0)).unwrap();

            let event = fixture.wait_for(audio_event).await;
            let ChatEvent::AudioFailed {
                message_index,
                error,
            } = event
            else {
                panic!("expected a failure, got {event:?}");
            };
            assert_eq!(message_index, Some(0));
            assert!(error.contains("Mock TTS failure"));

            assert_eq!(fixture.history().await.len(), 1);
        },
    );
}

#[test]
fn test_listen_rejects_non_model_messages() {
    fixture::run(|mut fixture| async move {
        fixture.step("Hi").await;

        fixture.actor.listen(Some(1)).unwrap();
        let event = fixture.wait_for(audio_event).await;
        assert!(matches!(
            event,
            ChatEvent::AudioFailed {
                message_index: Some(1),
                ..
            }
        ));

        fixture.actor.listen(Some(42)).unwrap();
        let event = fixture.wait_for(audio_event).await;
        assert!(matches!(event, ChatEvent::AudioFailed { .. }));
        assert!(fixture.mock_tts().spoken().is_empty());
    });
}

#[test]
fn test_listen_works_while_a_reply_is_pending() {
    fixture::run_with(
        || {
            Fixture::with_mock_behavior(MockBehavior::Gated {
                text: "Later".to_string(),
            })
        },
        |mut fixture| async move {
            fixture.send_message("Take your time");
            fixture
                .wait_for(|e| matches!(e, ChatEvent::TypingStatusChanged(true)))
                .await;

            fixture.actor.listen(None).unwrap();
            let event = fixture.wait_for(audio_event).await;
            assert!(matches!(
                event,
                ChatEvent::AudioReady {
                    message_index: 0,
                    ..
                }
            ));

            fixture.mock_provider().release();
            fixture.until_typing_stops().await;
        },
    );
}

#[test]
fn test_list_voices() {
    fixture::run(|mut fixture| async move {
        fixture.actor.list_voices().unwrap();

        let event = fixture
            .wait_for(|e| matches!(e, ChatEvent::VoicesList(_)))
            .await;
        let ChatEvent::VoicesList(voices) = event else {
            unreachable!()
        };
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].id, "mock");
    });
}
