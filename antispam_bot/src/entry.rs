use std::sync::Arc;
use teloxide::{dptree::deps, prelude::*};

use crate::{
    actions::{notify_first_admin, sweep_albums_spinloop},
    commands::Command,
    config::Config,
    state::ModerationState,
};

/// Environment variable holding the bot token.
pub const TOKEN_VAR: &str = "BOT_TOKEN";

/// # Panics
///
/// Panics if there's no bot token, or if the config file exists but is broken.
pub async fn entry() {
    if let Err(e) = dotenvy::dotenv() {
        log::debug!("Not loading a .env file: {e}");
    }

    let Ok(token) = std::env::var(TOKEN_VAR) else {
        log::error!("{TOKEN_VAR} is not set, can't start without a bot token.");
        panic!("{TOKEN_VAR} environment variable is not set!");
    };

    let config = Config::load().expect("Failed to load the config!");

    log::info!(concat!(
        "Only users listed in admin_ids bypass moderation. ",
        "Chat administrators not listed there are moderated like everyone else."
    ));

    let state = Arc::new(ModerationState::new(config));

    let bot = Bot::new(token);

    if let Err(e) = bot
        .set_my_commands(Command::generate_bot_commands())
        .await
    {
        log::warn!("Failed to set bot commands: {e}");
    }

    tokio::spawn(sweep_albums_spinloop(Arc::downgrade(&state)));

    notify_first_admin(&bot, &state).await;

    log::info!("Creating the handler...");

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(crate::handlers::handle_message));

    log::info!("Bot started. Waiting for updates...");

    Dispatcher::builder(bot, handler)
        .default_handler(|_| async {})
        .dependencies(deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("it appears we have been bonked.");
}
