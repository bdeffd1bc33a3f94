use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use chrono::{DateTime, Utc};

use crate::{album::AlbumGuard, config::Config};

/// Everything the bot keeps in memory while it runs. Lost on restart.
#[derive(Debug)]
pub struct ModerationState {
    pub config: Config,
    pub albums: AlbumGuard,
    started_at: DateTime<Utc>,
    deleted_count: AtomicU64,
}

impl ModerationState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        ModerationState {
            config,
            albums: AlbumGuard::default(),
            started_at: Utc::now(),
            deleted_count: AtomicU64::new(0),
        }
    }

    /// Count `amount` more deleted messages.
    pub fn record_deletions(&self, amount: u64) {
        self.deleted_count.fetch_add(amount, Ordering::Relaxed);
    }

    #[must_use]
    pub fn deleted_count(&self) -> u64 {
        self.deleted_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn uptime(&self) -> Duration {
        (Utc::now() - self.started_at).to_std().unwrap_or_default()
    }

    /// Uptime and deletion count, for `/stats` and the startup message.
    #[must_use]
    pub fn status_line(&self) -> String {
        format!(
            "Аптайм: {} (с {} UTC)\nУдалено сообщений: {}",
            format_uptime(self.uptime()),
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            self.deleted_count()
        )
    }
}

/// Format a duration like `1д 2ч 3м 4с`, skipping leading zero parts.
#[must_use]
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let (days, hours, minutes, seconds) = (
        total / 86400,
        total / 3600 % 24,
        total / 60 % 60,
        total % 60,
    );

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}д"));
    }
    if days > 0 || hours > 0 {
        parts.push(format!("{hours}ч"));
    }
    if days > 0 || hours > 0 || minutes > 0 {
        parts.push(format!("{minutes}м"));
    }
    parts.push(format!("{seconds}с"));

    parts.join(" ")
}
