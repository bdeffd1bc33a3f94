use std::future::Future;

use teloxide::{
    prelude::Requester,
    types::{ChatId, MessageId},
    ApiError, Bot, RequestError,
};

use crate::{classifier::Verdict, state::ModerationState, types::MessageView};

/// Sent to the chat when a spam message could not be deleted.
pub const NO_RIGHTS_WARNING: &str =
    "⚠️ Не удалось удалить подозрительное сообщение. Дайте боту право Delete Messages.";

/// The two things moderation needs to do in a chat. [`Bot`] does them for real.
pub trait ChatModerator {
    fn remove_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;

    fn post_text(
        &self,
        chat_id: ChatId,
        text: &str,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;
}

impl ChatModerator for Bot {
    async fn remove_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), RequestError> {
        self.delete_message(chat_id, message_id).await?;
        Ok(())
    }
    async fn post_text(&self, chat_id: ChatId, text: &str) -> Result<(), RequestError> {
        self.send_message(chat_id, text).await?;
        Ok(())
    }
}

/// Returns `true` if this error means the message is already gone.
fn is_already_deleted(error: &RequestError) -> bool {
    matches!(
        error,
        RequestError::Api(ApiError::MessageIdInvalid | ApiError::MessageToDeleteNotFound)
    )
}

/// Delete a message that failed the checks. If that doesn't work, tell the chat that the bot
/// probably lacks rights.
///
/// Returns `true` if the message was deleted.
pub async fn delete_offending_message(
    moderator: &impl ChatModerator,
    state: &ModerationState,
    view: &MessageView,
    verdict: &Verdict,
) -> bool {
    let user_id = view
        .sender
        .map_or_else(|| "unknown".to_string(), |s| s.id.to_string());

    match moderator.remove_message(view.chat_id, view.message_id).await {
        Ok(()) => {
            state.record_deletions(1);
            log::info!(
                "Deleted in {} by {}. Reasons: {}",
                view.chat_id,
                user_id,
                verdict.reasons_list()
            );
            true
        }
        Err(e) if is_already_deleted(&e) => {
            // Someone else probably has already deleted it. That's fine.
            log::debug!("Message {} in {} is already gone", view.message_id.0, view.chat_id);
            false
        }
        Err(e) => {
            log::error!("Failed to delete message in {}: {e}", view.chat_id);
            if let Err(e) = moderator.post_text(view.chat_id, NO_RIGHTS_WARNING).await {
                log::debug!("Couldn't warn {} about missing rights either: {e}", view.chat_id);
            }
            false
        }
    }
}

/// Send the bot's status to the first admin from the config, if there is one.
/// Failing to do so is only worth a warning.
pub async fn notify_first_admin(moderator: &impl ChatModerator, state: &ModerationState) {
    let Some(admin) = state.config.first_admin() else {
        log::info!("No admin_ids configured, not sending the startup message");
        return;
    };

    let text = format!("✅ Анти-спам бот запущен.\n{}", state.status_line());
    if let Err(e) = moderator.post_text(ChatId::from(admin), &text).await {
        log::warn!("Failed to send the startup message to admin {admin}: {e}");
    }
}

/// Launches an ever-running loop that forgets album records nobody finished in time.
/// Stops once the state is dropped.
pub async fn sweep_albums_spinloop(state: std::sync::Weak<ModerationState>) {
    use tokio::time::{sleep, Duration};
    loop {
        sleep(Duration::from_secs(60)).await;

        let Some(state) = state.upgrade() else {
            // No more state!
            return;
        };

        let evicted = state.albums.evict_expired(std::time::Instant::now());
        if evicted > 0 {
            log::debug!("Forgot {evicted} stale album record(s)");
        }
    }
}

/// How a bulk deletion went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub deleted: usize,
    pub failed: usize,
}

/// Delete every message of an oversized album. Each deletion is on its own; failures are
/// logged and skipped.
pub async fn flush_album(
    moderator: &impl ChatModerator,
    state: &ModerationState,
    chat_id: ChatId,
    album_id: &str,
    message_ids: &[MessageId],
) -> FlushReport {
    let mut report = FlushReport::default();

    for &message_id in message_ids {
        match moderator.remove_message(chat_id, message_id).await {
            Ok(()) => report.deleted += 1,
            Err(e) => {
                log::warn!(
                    "Failed to delete album message {} in {chat_id}: {e}",
                    message_id.0
                );
                report.failed += 1;
            }
        }
    }

    state.record_deletions(report.deleted as u64);
    log::info!(
        "Album {album_id} in {chat_id} went over the limit: deleted {}, failed {}",
        report.deleted,
        report.failed
    );

    report
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Mutex;

    use super::*;
    use crate::{classifier::Reason, config::Config};

    /// Records what it was asked to do instead of talking to Telegram.
    #[derive(Default)]
    struct MockModerator {
        /// Message IDs that fail to delete, and how.
        failing: Vec<(MessageId, Failure)>,
        fail_posting: bool,
        removed: Mutex<Vec<MessageId>>,
        posted: Mutex<Vec<String>>,
    }

    #[derive(Clone, Copy)]
    enum Failure {
        NoRights,
        NotFound,
    }

    impl ChatModerator for MockModerator {
        async fn remove_message(
            &self,
            _chat_id: ChatId,
            message_id: MessageId,
        ) -> Result<(), RequestError> {
            if let Some((_, failure)) = self.failing.iter().find(|(id, _)| *id == message_id) {
                return Err(RequestError::Api(match failure {
                    Failure::NoRights => ApiError::MessageCantBeDeleted,
                    Failure::NotFound => ApiError::MessageToDeleteNotFound,
                }));
            }
            self.removed.lock().unwrap().push(message_id);
            Ok(())
        }
        async fn post_text(&self, _chat_id: ChatId, text: &str) -> Result<(), RequestError> {
            if self.fail_posting {
                return Err(RequestError::Api(ApiError::BotKicked));
            }
            self.posted.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn spam_verdict() -> Verdict {
        Verdict {
            reasons: vec![Reason::ExternalLink, Reason::BlockedKeywords],
        }
    }

    #[tokio::test]
    async fn deleting_spam() {
        let moderator = MockModerator::default();
        let state = ModerationState::new(Config::default());
        let view = MessageView::test_text(1, "spam");

        assert!(delete_offending_message(&moderator, &state, &view, &spam_verdict()).await);
        assert_eq!(*moderator.removed.lock().unwrap(), vec![view.message_id]);
        assert!(moderator.posted.lock().unwrap().is_empty());
        assert_eq!(state.deleted_count(), 1);
    }

    #[tokio::test]
    async fn warning_about_missing_rights() {
        let view = MessageView::test_text(1, "spam");
        let moderator = MockModerator {
            failing: vec![(view.message_id, Failure::NoRights)],
            ..Default::default()
        };
        let state = ModerationState::new(Config::default());

        assert!(!delete_offending_message(&moderator, &state, &view, &spam_verdict()).await);
        assert_eq!(*moderator.posted.lock().unwrap(), vec![NO_RIGHTS_WARNING]);
        assert_eq!(state.deleted_count(), 0);
    }

    #[tokio::test]
    async fn failing_to_warn_is_fine() {
        let view = MessageView::test_text(1, "spam");
        let moderator = MockModerator {
            failing: vec![(view.message_id, Failure::NoRights)],
            fail_posting: true,
            ..Default::default()
        };
        let state = ModerationState::new(Config::default());

        assert!(!delete_offending_message(&moderator, &state, &view, &spam_verdict()).await);
        assert!(moderator.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn already_deleted_message_is_not_a_rights_problem() {
        let view = MessageView::test_text(1, "spam");
        let moderator = MockModerator {
            failing: vec![(view.message_id, Failure::NotFound)],
            ..Default::default()
        };
        let state = ModerationState::new(Config::default());

        assert!(!delete_offending_message(&moderator, &state, &view, &spam_verdict()).await);
        assert!(moderator.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn startup_message_goes_to_first_admin() {
        let moderator = MockModerator::default();
        let state = ModerationState::new(Config::from_yaml_str("admin_ids: [10, 20]").unwrap());

        notify_first_admin(&moderator, &state).await;

        let posted = moderator.posted.lock().unwrap();
        assert_eq!(posted.len(), 1);
        assert!(posted[0].contains("Удалено сообщений: 0"));
    }

    #[tokio::test]
    async fn no_admins_no_startup_message() {
        let moderator = MockModerator {
            fail_posting: true,
            ..Default::default()
        };
        let state = ModerationState::new(Config::default());

        // Would fail posting, but doesn't even try.
        notify_first_admin(&moderator, &state).await;
        assert!(moderator.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn flushing_album_continues_past_failures() {
        let moderator = MockModerator {
            failing: vec![(MessageId(2), Failure::NoRights)],
            ..Default::default()
        };
        let state = ModerationState::new(Config::default());
        let ids = [MessageId(1), MessageId(2), MessageId(3), MessageId(4)];

        let report = flush_album(&moderator, &state, ChatId(-1), "album", &ids).await;

        assert_eq!(
            report,
            FlushReport {
                deleted: 3,
                failed: 1
            }
        );
        assert_eq!(
            *moderator.removed.lock().unwrap(),
            vec![MessageId(1), MessageId(3), MessageId(4)]
        );
        assert!(moderator.posted.lock().unwrap().is_empty());
        assert_eq!(state.deleted_count(), 3);
    }
}
