use teloxide::{
    prelude::*,
    sugar::request::RequestReplyExt,
    types::{BotCommand, ChatMemberStatus},
    RequestError,
};

use crate::state::ModerationState;

/// Commands this bot answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Ping,
    MyId,
    GetAdmins,
    Stats,
}

/// Call names and descriptions, in the order they show up in Telegram's command menu.
static COMMANDS: &[(Command, &str, &str)] = &[
    (Command::Start, "start", "Что умеет этот бот"),
    (Command::Ping, "ping", "Проверить, что бот жив"),
    (Command::MyId, "myid", "Показать ваш user_id"),
    (Command::GetAdmins, "getadmins", "Список администраторов чата"),
    (Command::Stats, "stats", "Аптайм и число удалённых сообщений"),
];

impl Command {
    /// Parse a command from the start of the message text. A command addressed to another bot,
    /// like `/ping@other_bot`, is not ours and gives [`None`].
    #[must_use]
    pub fn parse(text: &str, bot_username: &str) -> Option<Command> {
        let word = text.split_whitespace().next()?.strip_prefix('/')?;

        let name = match word.split_once('@') {
            Some((name, target)) if target.eq_ignore_ascii_case(bot_username) => name,
            Some(_) => return None,
            None => word,
        };
        let name = name.to_lowercase();

        COMMANDS
            .iter()
            .find(|(_, callname, _)| *callname == name)
            .map(|(command, _, _)| *command)
    }

    #[must_use]
    pub fn generate_bot_commands() -> Vec<BotCommand> {
        COMMANDS
            .iter()
            .map(|(_, callname, description)| BotCommand {
                command: callname.to_string(),
                description: description.to_string(),
            })
            .collect()
    }
}

fn status_name(status: ChatMemberStatus) -> &'static str {
    match status {
        ChatMemberStatus::Owner => "creator",
        ChatMemberStatus::Administrator => "administrator",
        ChatMemberStatus::Member => "member",
        ChatMemberStatus::Restricted => "restricted",
        ChatMemberStatus::Left => "left",
        ChatMemberStatus::Banned => "kicked",
    }
}

/// One line of the `/getadmins` answer.
fn admin_line(full_name: &str, id: UserId, status: ChatMemberStatus) -> String {
    format!("{full_name} — {id} ({})", status_name(status))
}

async fn reply(bot: &Bot, message: &Message, text: String) -> Result<(), RequestError> {
    bot.send_message(message.chat.id, text)
        .reply_to(message.id)
        .await?;
    Ok(())
}

pub async fn handle_command(
    bot: &Bot,
    message: &Message,
    command: Command,
    state: &ModerationState,
) -> Result<(), RequestError> {
    log::debug!("Got {command:?} in {}", message.chat.id);

    let text = match command {
        Command::Start => {
            if message.chat.is_group() || message.chat.is_supergroup() {
                "👋 Я анти-спам бот. Дайте права Delete Messages и настройте config.yml.".to_string()
            } else {
                "Привет! Добавь меня в группу и выдай права на удаление. Настройки — в config.yml."
                    .to_string()
            }
        }
        Command::Ping => "pong".to_string(),
        Command::MyId => match &message.from {
            Some(user) => format!("Ваш Telegram user_id: {}", user.id),
            None => "Не удалось определить ID.".to_string(),
        },
        Command::GetAdmins => {
            if !(message.chat.is_group() || message.chat.is_supergroup()) {
                "Эта команда работает только в группе/супергруппе.".to_string()
            } else {
                let admins = bot.get_chat_administrators(message.chat.id).await?;
                let lines = admins
                    .iter()
                    .map(|admin| {
                        admin_line(&admin.user.full_name(), admin.user.id, admin.kind.status())
                    })
                    .collect::<Vec<_>>();
                format!("Администраторы чата:\n{}", lines.join("\n"))
            }
        }
        Command::Stats => format!("📊 {}", state.status_line()),
    };

    reply(bot, message, text).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_commands() {
        assert_eq!(Command::parse("/ping", "spam_bot"), Some(Command::Ping));
        assert_eq!(Command::parse("/PING", "spam_bot"), Some(Command::Ping));
        assert_eq!(Command::parse("/myid please", "spam_bot"), Some(Command::MyId));
        assert_eq!(
            Command::parse("/getadmins@Spam_Bot", "spam_bot"),
            Some(Command::GetAdmins)
        );
        assert_eq!(Command::parse("/stats@other_bot", "spam_bot"), None);
        assert_eq!(Command::parse("/unknown", "spam_bot"), None);
        assert_eq!(Command::parse("ping", "spam_bot"), None);
        assert_eq!(Command::parse("", "spam_bot"), None);
        assert_eq!(Command::parse("  /start", "spam_bot"), Some(Command::Start));
    }

    #[test]
    fn formatting_admins() {
        assert_eq!(
            admin_line("Jane Doe", UserId(123), ChatMemberStatus::Owner),
            "Jane Doe — 123 (creator)"
        );
        assert_eq!(
            admin_line("Bot", UserId(5), ChatMemberStatus::Administrator),
            "Bot — 5 (administrator)"
        );
    }

    #[test]
    /// Validate that bot commands match requirements by Telegram's Bot API
    fn validate_bot_commands() {
        let commands = Command::generate_bot_commands();
        // "At most 100 commands can be specified"
        // - https://core.telegram.org/bots/api#setmycommands
        assert!(commands.len() <= 100);
        for command in commands {
            // "Text of the command; 1-32 characters."
            assert!(!command.command.is_empty());
            assert!(command.command.len() <= 32);

            // "Can contain only lowercase English letters, digits and underscores."
            for chr in command.command.chars() {
                assert!(chr.is_ascii_lowercase() || chr.is_ascii_digit() || chr == '_');
            }

            // "Description of the command; 1-256 characters."
            assert!(!command.description.is_empty());
            assert!(command.description.chars().count() <= 256);
        }
    }
}
