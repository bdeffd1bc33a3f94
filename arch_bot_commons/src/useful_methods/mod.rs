use teloxide::types::{Message, MessageKind};

pub trait MessageStuff {
    /// Text and caption of the message joined with a space, trimmed.
    /// Empty if the message has neither.
    fn text_and_caption(&self) -> String;
    /// Album ID of this message, but only if it is a photo.
    fn photo_album_id(&self) -> Option<&str>;
    /// `true` for joins, leaves, pins, title changes and such.
    fn is_service_message(&self) -> bool;
}

impl MessageStuff for Message {
    fn text_and_caption(&self) -> String {
        join_text_and_caption(self.text(), self.caption())
    }
    fn photo_album_id(&self) -> Option<&str> {
        self.photo()?;
        self.media_group_id().map(|id| id.0.as_str())
    }
    fn is_service_message(&self) -> bool {
        !matches!(self.kind, MessageKind::Common(_))
    }
}

/// Joins whichever of the two parts are present with a space and trims the result.
#[must_use]
pub fn join_text_and_caption(text: Option<&str>, caption: Option<&str>) -> String {
    let joined = match (text, caption) {
        (Some(text), Some(caption)) => format!("{text} {caption}"),
        (Some(only), None) | (None, Some(only)) => only.to_string(),
        (None, None) => return String::new(),
    };

    joined.trim().to_string()
}
