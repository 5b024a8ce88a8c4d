use gemchat_core::ai::types::Role;
use gemchat_core::chat::events::ChatEvent;
use gemchat_core::chat::{ImageAttachment, MessageBody, MessageSender};


// A 1x1 transparent PNG
const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8/5+hHgAHggJ/PchI7wAAAABJRU5ErkJggg==";

fn test_image() -> ImageAttachment {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    let bytes = STANDARD.decode(PNG_BASE64).unwrap();
    ImageAttachment::from_bytes("image/png", &bytes)
}

#[test]
fn test_send_message_with_image() {
    fixture::run(|mut fixture| async move {
        fixture.actor.attach_image(test_image()).unwrap();
        let event = fixture.next_event().await;
        assert!(matches!(
            event,
            ChatEvent::ImageAttached { ref mime_type, bytes } if mime_type == "image/png" && bytes > 0
        ));

        let events = fixture.step("Describe this image").await;

        let user_message = events
            .iter()
            .find_map(|e| match e {
                ChatEvent::MessageAdded(msg) if msg.sender == MessageSender::User => Some(msg),
                _ => None,
            })
            .expect("Should receive user message event");
        let MessageBody::Image { text, image } = &user_message.body else {
            panic!("expected an image message");
        };
        assert_eq!(text, "Describe this image");
        assert_eq!(image.data, test_image().data);

        assert!(
            events.iter().any(|e| matches!(
                e,
                ChatEvent::MessageAdded(msg) if msg.sender == MessageSender::Model
            )),
            "Should receive model response after image message"
        );
    });
}

#[test]
fn test_image_in_ai_request() {
    fixture::run(|mut fixture| async move {
        fixture.actor.attach_image(test_image()).unwrap();
        fixture.step("What's in this image?").await;

        let request = fixture
            .mock_provider()
            .get_last_captured_request()
            .expect("Should have captured AI request");
        let last = request.turns.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.text(), "What's in this image?");

        let inline = last.inline_data();
        assert_eq!(inline.len(), 1);
        assert_eq!(inline[0].mime_type, "image/png");
        assert_eq!(inline[0].data, test_image().data);
    });
}

#[test]
fn test_image_is_resent_with_later_messages() {
    fixture::run(|mut fixture| async move {
        fixture.actor.attach_image(test_image()).unwrap();
        fixture.step("Look at this").await;
        fixture.step("Anything else?").await;

        let request = fixture.mock_provider().get_last_captured_request().unwrap();
        let with_images = request
            .turns
            .iter()
            .filter(|t| !t.inline_data().is_empty())
            .count();
        assert_eq!(with_images, 1);
        assert!(request.turns.last().unwrap().inline_data().is_empty());
    });
}

#[test]
fn test_image_without_text_is_sent() {
    fixture::run(|mut fixture| async move {
        fixture.actor.attach_image(test_image()).unwrap();
        let events = fixture.step("").await;

        assert!(events.iter().any(|e| matches!(
            e,
            ChatEvent::MessageAdded(msg) if msg.sender == MessageSender::Model
        )));
        let request = fixture.mock_provider().get_last_captured_request().unwrap();
        let last = request.turns.last().unwrap();
        assert_eq!(last.text(), "");
        assert_eq!(last.parts.len(), 1);
    });
}

#[test]
fn test_cleared_image_is_not_sent() {
    fixture::run(|mut fixture| async move {
        fixture.actor.attach_image(test_image()).unwrap();
        fixture.actor.clear_image().unwrap();
        fixture
            .wait_for(|e| matches!(e, ChatEvent::ImageCleared))
            .await;

        fixture.step("Plain text").await;

        let request = fixture.mock_provider().get_last_captured_request().unwrap();
        assert!(request.turns.iter().all(|t| t.inline_data().is_empty()));
    });
}

#[test]
fn test_rejected_message_keeps_pending_image() {
    fixture::run_with(
        || {
            fixture::Fixture::with_mock_behavior(
                gemchat_core::ai::mock::MockBehavior::Gated {
                    text: "done".to_string(),
                },
            )
        },
        |mut fixture| async move {
            fixture.send_message("first");
            fixture
                .wait_for(|e| matches!(e, ChatEvent::TypingStatusChanged(true)))
                .await;

            fixture.actor.attach_image(test_image()).unwrap();
            fixture.send_message("with image");
            fixture
                .wait_for(|e| matches!(e, ChatEvent::RequestRejected { .. }))
                .await;

            fixture.mock_provider().release();
            fixture.until_typing_stops().await;

            fixture.mock_provider().release();
            fixture.step("now with image").await;

            let request = fixture.mock_provider().get_last_captured_request().unwrap();
            let last = request.turns.last().unwrap();
            assert_eq!(last.text(), "now with image");
            assert_eq!(last.inline_data().len(), 1);
        },
    );
}
