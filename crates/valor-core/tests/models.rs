use valor_core::error::CoreError;
use valor_core::models::image::ImageAttachment;
use valor_core::models::message::{ContentPart, ImageUrl, Message, MessageContent, Role};
use valor_core::models::session::Session;

const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[test]
fn new_session_is_seeded_with_system_message() {
    let session = Session::new("alice", "You are Valor.");
    assert_eq!(session.len(), 1);
    let system = session.system_message().expect("system message");
    assert_eq!(system.role, Role::System);
    assert_eq!(system.content.as_text(), "You are Valor.");
    assert!(system.created_at.is_none());
}

#[test]
fn reset_keeps_only_the_system_message() {
    let mut session = Session::new("alice", "sys");
    session.push(Message::user("hi"));
    session.push(Message::assistant("hello"));
    assert_eq!(session.len(), 3);

    session.reset();
    assert_eq!(session.len(), 1);
    assert_eq!(session.messages[0].role, Role::System);
}

#[test]
fn reset_without_system_message_empties_the_transcript() {
    let mut session = Session {
        user_id: "bob".into(),
        messages: vec![Message::user("orphan")],
    };
    session.reset();
    assert!(session.is_empty());
}

#[test]
fn session_serializes_with_camel_case_user_id() {
    let session = Session::new("alice", "sys");
    let json = serde_json::to_value(&session).unwrap();
    assert_eq!(json["userId"], "alice");
    assert_eq!(json["messages"][0]["role"], "system");
    assert_eq!(json["messages"][0]["content"], "sys");
    assert!(json["messages"][0].get("created_at").is_none());
}

fn image_turn(image: &ImageAttachment) -> Message {
    Message::new(
        Role::User,
        MessageContent::Parts(vec![
            ContentPart::Text {
                text: "what is this?".into(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image.to_data_url(),
                },
            },
        ]),
    )
}

#[test]
fn multimodal_message_uses_openai_part_shape() {
    let image = ImageAttachment::from_bytes(PNG_HEADER.to_vec(), None).unwrap();
    let message = image_turn(&image);
    assert!(message.content.has_image());

    let json = serde_json::to_value(&message).unwrap();
    assert_eq!(json["content"][0]["type"], "text");
    assert_eq!(json["content"][0]["text"], "what is this?");
    assert_eq!(json["content"][1]["type"], "image_url");
    let url = json["content"][1]["image_url"]["url"].as_str().unwrap();
    assert!(url.starts_with("data:image/png;base64,"));

    let back: Message = serde_json::from_value(json).unwrap();
    assert_eq!(back, message);
}

#[test]
fn without_images_keeps_only_text() {
    let image = ImageAttachment::from_bytes(PNG_HEADER.to_vec(), None).unwrap();
    let stripped = image_turn(&image).content.without_images();

    assert!(!stripped.has_image());
    assert_eq!(stripped, MessageContent::Text("what is this?".into()));
    assert_eq!(
        MessageContent::from("plain").without_images(),
        MessageContent::Text("plain".into())
    );
}

#[test]
fn as_text_drops_image_parts() {
    let content = MessageContent::Parts(vec![
        ContentPart::Text { text: "a".into() },
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: "data:image/png;base64,AA==".into(),
            },
        },
        ContentPart::Text { text: "b".into() },
    ]);
    assert_eq!(content.as_text(), "a\nb");
}

#[test]
fn image_from_data_url_keeps_declared_type() {
    let image = ImageAttachment::from_base64("data:image/webp;base64,AAEC").unwrap();
    assert_eq!(image.media_type, "image/webp");
    assert_eq!(image.bytes, vec![0, 1, 2]);
}

#[test]
fn image_from_raw_base64_is_sniffed() {
    let encoded = ImageAttachment {
        media_type: "image/png".into(),
        bytes: PNG_HEADER.to_vec(),
    }
    .to_base64();

    let image = ImageAttachment::from_base64(&encoded).unwrap();
    assert_eq!(image.media_type, "image/png");
    assert_eq!(image.bytes, PNG_HEADER);
}

#[test]
fn jpeg_bytes_are_recognized() {
    let image = ImageAttachment::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0], None).unwrap();
    assert_eq!(image.media_type, "image/jpeg");
}

#[test]
fn malformed_base64_is_rejected() {
    let err = ImageAttachment::from_base64("not base64 at all!!").unwrap_err();
    assert!(matches!(err, CoreError::InvalidImage(_)));
}

#[test]
fn non_image_data_url_is_rejected() {
    let err = ImageAttachment::from_base64("data:text/plain;base64,aGVsbG8=").unwrap_err();
    assert!(matches!(err, CoreError::InvalidImage(_)));
}

#[test]
fn unrecognized_bytes_are_rejected() {
    let err = ImageAttachment::from_bytes(b"hello world".to_vec(), None).unwrap_err();
    assert!(matches!(err, CoreError::InvalidImage(_)));
}

#[test]
fn empty_image_is_rejected() {
    let err = ImageAttachment::from_bytes(Vec::new(), Some("image/png")).unwrap_err();
    assert!(matches!(err, CoreError::InvalidImage(_)));
}
