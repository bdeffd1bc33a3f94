use arch_bot_commons::useful_methods::MessageStuff;
use teloxide::types::{ChatId, Message, MessageEntityKind, MessageEntityRef, MessageId, UserId};

/// A piece of message text marked by Telegram as a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAnnotation {
    /// The annotated piece of text is the link itself.
    Url { text: String },
    /// The annotated piece of text is a label; the link is hidden behind it.
    TextLink { url: String },
}

impl LinkAnnotation {
    /// Convert a Telegram entity, if it's a link kind.
    fn from_entity(entity: &MessageEntityRef) -> Option<Self> {
        match entity.kind() {
            MessageEntityKind::Url => Some(LinkAnnotation::Url {
                text: entity.text().to_string(),
            }),
            MessageEntityKind::TextLink { url } => Some(LinkAnnotation::TextLink {
                url: url.to_string(),
            }),
            _ => None,
        }
    }
}

/// The person who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderInfo {
    pub id: UserId,
    pub is_bot: bool,
}

/// Everything moderation needs to know about a message, detached from Telegram's types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    /// Text and caption joined with a space.
    pub text: String,
    /// Link annotations of both text and caption.
    pub links: Vec<LinkAnnotation>,
    pub sender: Option<SenderInfo>,
    /// Posted on behalf of a channel or the group itself rather than by a user.
    pub on_behalf_of_chat: bool,
    /// Album ID, only set for photos that are part of an album.
    pub album_id: Option<String>,
}

impl MessageView {
    #[must_use]
    pub fn from_message(message: &Message) -> Self {
        let links = message
            .parse_entities()
            .into_iter()
            .chain(message.parse_caption_entities())
            .flatten()
            .filter_map(|entity| LinkAnnotation::from_entity(&entity))
            .collect();

        MessageView {
            chat_id: message.chat.id,
            message_id: message.id,
            text: message.text_and_caption(),
            links,
            sender: message.from.as_ref().map(|user| SenderInfo {
                id: user.id,
                is_bot: user.is_bot,
            }),
            on_behalf_of_chat: message.sender_chat.is_some(),
            album_id: message.photo_album_id().map(ToString::to_string),
        }
    }

    /// A plain text message from a regular user, for tests.
    #[cfg(test)]
    pub fn test_text(user: u64, text: &str) -> Self {
        MessageView {
            chat_id: ChatId(-100),
            message_id: MessageId(1),
            text: text.to_string(),
            links: Vec::new(),
            sender: Some(SenderInfo {
                id: UserId(user),
                is_bot: false,
            }),
            on_behalf_of_chat: false,
            album_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::{json, Value};

    use super::*;

    /// A message in a supergroup from a regular user, with `extra` fields added on top.
    fn group_message(message_id: i32, extra: Value) -> Message {
        let mut message = json!({
            "message_id": message_id,
            "date": 1_700_000_000,
            "chat": {"id": -1_001_234_567_890_i64, "title": "Test group", "type": "supergroup"},
            "from": {"id": 42, "is_bot": false, "first_name": "Jane"},
        });
        for (key, value) in extra.as_object().unwrap() {
            message[key] = value.clone();
        }
        serde_json::from_value(message).unwrap()
    }

    #[test]
    fn links_from_text_entities() {
        let message = group_message(
            10,
            json!({
                "text": "😀 see example.com and this",
                "entities": [
                    {"offset": 0, "length": 2, "type": "bold"},
                    {"offset": 7, "length": 11, "type": "url"},
                    {"offset": 23, "length": 4, "type": "text_link", "url": "https://hidden.example/"},
                ],
            }),
        );

        let view = MessageView::from_message(&message);
        assert_eq!(view.chat_id, ChatId(-1_001_234_567_890));
        assert_eq!(view.message_id, MessageId(10));
        assert_eq!(view.text, "😀 see example.com and this");
        assert_eq!(
            view.links,
            vec![
                LinkAnnotation::Url {
                    text: "example.com".to_string()
                },
                LinkAnnotation::TextLink {
                    url: "https://hidden.example/".to_string()
                },
            ]
        );
        assert_eq!(
            view.sender,
            Some(SenderInfo {
                id: UserId(42),
                is_bot: false
            })
        );
        assert!(!view.on_behalf_of_chat);
        assert_eq!(view.album_id, None);
    }

    #[test]
    fn album_photo_with_caption_link() {
        let message = group_message(
            11,
            json!({
                "media_group_id": "13579",
                "photo": [{
                    "file_id": "AgADBAAD",
                    "file_unique_id": "AQADBAAD",
                    "width": 90,
                    "height": 60,
                    "file_size": 1234,
                }],
                "caption": "Buy at shop.example",
                "caption_entities": [{"offset": 7, "length": 12, "type": "url"}],
            }),
        );

        let view = MessageView::from_message(&message);
        assert_eq!(view.text, "Buy at shop.example");
        assert_eq!(
            view.links,
            vec![LinkAnnotation::Url {
                text: "shop.example".to_string()
            }]
        );
        assert_eq!(view.album_id.as_deref(), Some("13579"));
    }

    #[test]
    fn only_photos_get_an_album_id() {
        let message = group_message(
            12,
            json!({
                "media_group_id": "24680",
                "document": {"file_id": "BQADBAAD", "file_unique_id": "AgADBAAD"},
            }),
        );

        let view = MessageView::from_message(&message);
        assert_eq!(view.album_id, None);
        assert!(view.links.is_empty());
    }

    #[test]
    fn posted_on_behalf_of_channel() {
        let message = group_message(
            13,
            json!({
                "from": {"id": 136_817_688, "is_bot": true, "first_name": "Channel", "username": "Channel_Bot"},
                "sender_chat": {"id": -1_009_876_543_210_i64, "title": "Some channel", "type": "channel"},
                "text": "hello",
            }),
        );

        let view = MessageView::from_message(&message);
        assert!(view.on_behalf_of_chat);
        assert_eq!(
            view.sender,
            Some(SenderInfo {
                id: UserId(136_817_688),
                is_bot: true
            })
        );
    }
}
