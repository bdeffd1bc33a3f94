//! Source code for a group anti-spam bot for Telegram. It deletes messages with invite links,
//! links to sites that are not allowed, phone numbers, spammy phrases, and oversized photo albums.

/// Various types used throughout.
pub mod types;

/// Settings file.
pub mod config;

/// Pulling links out of messages.
pub mod links;

/// Deciding whether a message is spam.
pub mod classifier;

/// Photo album flood detection.
pub mod album;

/// In-memory state of the running bot.
pub mod state;

/// Functions that perform stuff via the bot.
pub mod actions;

/// Bot commands.
mod commands;

/// Functions that handle events from Telegram.
pub mod handlers;

/// Entry function that starts the bot.
mod entry;
pub use entry::*;
