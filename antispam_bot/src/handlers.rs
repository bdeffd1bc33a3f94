use std::{sync::Arc, time::Instant};

use arch_bot_commons::useful_methods::MessageStuff;
use teloxide::{prelude::*, types::Me, RequestError};

use crate::{
    actions::{delete_offending_message, flush_album, ChatModerator, FlushReport},
    album::AlbumOutcome,
    classifier::{classify, is_exempt, Verdict},
    commands::{handle_command, Command},
    state::ModerationState,
    types::MessageView,
};

/// What moderation did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationOutcome {
    /// Sender is not subject to moderation.
    Exempt,
    /// Message made an album oversized, or belongs to one; the album messages were deleted.
    AlbumFlushed(FlushReport),
    /// Nothing wrong with the message.
    Clean,
    /// Message failed the checks and was deleted.
    Deleted(Verdict),
    /// Message failed the checks, but deleting it didn't work out.
    DeleteFailed(Verdict),
}

/// Run a message through exemptions, the album guard and the classifier, and act on the result.
pub async fn moderate(
    moderator: &impl ChatModerator,
    state: &ModerationState,
    view: &MessageView,
    now: Instant,
) -> ModerationOutcome {
    if is_exempt(&state.config, view) {
        return ModerationOutcome::Exempt;
    }

    if let Some(album_id) = &view.album_id {
        match state
            .albums
            .record(view.chat_id, album_id, view.message_id, now)
        {
            AlbumOutcome::Flushed { message_ids } => {
                let report =
                    flush_album(moderator, state, view.chat_id, album_id, &message_ids).await;
                return ModerationOutcome::AlbumFlushed(report);
            }
            AlbumOutcome::Accumulating { count } => {
                log::debug!("Album {album_id} in {} is at {count} photo(s)", view.chat_id);
            }
        }
    }

    let verdict = classify(&state.config, view);
    if !verdict.should_delete() {
        return ModerationOutcome::Clean;
    }

    if delete_offending_message(moderator, state, view, &verdict).await {
        ModerationOutcome::Deleted(verdict)
    } else {
        ModerationOutcome::DeleteFailed(verdict)
    }
}

pub async fn handle_message(
    bot: Bot,
    me: Me,
    message: Message,
    state: Arc<ModerationState>,
) -> Result<(), RequestError> {
    // Joins, leaves, pins and such.
    if message.is_service_message() {
        return Ok(());
    }

    if let Some(command) = message
        .text()
        .and_then(|text| Command::parse(text, me.username()))
    {
        return handle_command(&bot, &message, command, &state).await;
    }

    // Nothing to moderate in DMs with the bot.
    if message.chat.is_private() {
        return Ok(());
    }

    let view = MessageView::from_message(&message);
    let outcome = moderate(&bot, &state, &view, Instant::now()).await;
    log::trace!("Message {} in {}: {outcome:?}", view.message_id.0, view.chat_id);

    Ok(())
}
