use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use teloxide::types::{ChatId, MessageId};

/// An album with more photos than this gets deleted whole.
pub const ALBUM_LIMIT: usize = 3;

/// Album records not flushed within this time are forgotten. Telegram delivers all parts of an
/// album within seconds, so this is plenty.
pub const ALBUM_RECORD_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug)]
struct AlbumRecord {
    message_ids: Vec<MessageId>,
    first_seen: Instant,
    /// Went over the limit already; whatever else arrives of it is deleted right away.
    flushed: bool,
}

/// What happened to an album after recording a message of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumOutcome {
    /// Still within limits; this many messages of the album were seen so far.
    Accumulating { count: usize },
    /// Limit exceeded, all of these messages should be deleted. Once an album is flushed, its
    /// later messages come out like this one by one until the record expires.
    Flushed { message_ids: Vec<MessageId> },
}

/// Counts photos of albums per chat and reports albums that are too big.
#[derive(Debug)]
pub struct AlbumGuard {
    limit: usize,
    ttl: Duration,
    records: Mutex<HashMap<(ChatId, String), AlbumRecord>>,
}

impl Default for AlbumGuard {
    fn default() -> Self {
        Self::new(ALBUM_LIMIT, ALBUM_RECORD_TTL)
    }
}

impl AlbumGuard {
    #[must_use]
    pub fn new(limit: usize, ttl: Duration) -> Self {
        AlbumGuard {
            limit,
            ttl,
            records: Mutex::new(HashMap::new()),
        }
    }

    fn records(&self) -> std::sync::MutexGuard<'_, HashMap<(ChatId, String), AlbumRecord>> {
        // Nothing in here can panic halfway through a change, so a poisoned map is still fine.
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Record a photo message of an album.
    pub fn record(
        &self,
        chat_id: ChatId,
        album_id: &str,
        message_id: MessageId,
        now: Instant,
    ) -> AlbumOutcome {
        let mut records = self.records();

        let record = records
            .entry((chat_id, album_id.to_string()))
            .or_insert_with(|| AlbumRecord {
                message_ids: Vec::new(),
                first_seen: now,
                flushed: false,
            });

        if now.saturating_duration_since(record.first_seen) > self.ttl {
            // Stale leftover of an album with a reused ID. Start over.
            record.message_ids.clear();
            record.first_seen = now;
            record.flushed = false;
        }

        if record.flushed {
            return AlbumOutcome::Flushed {
                message_ids: vec![message_id],
            };
        }

        record.message_ids.push(message_id);
        let count = record.message_ids.len();

        if count > self.limit {
            record.flushed = true;
            AlbumOutcome::Flushed {
                message_ids: std::mem::take(&mut record.message_ids),
            }
        } else {
            AlbumOutcome::Accumulating { count }
        }
    }

    /// Forget albums first seen longer than the TTL ago. Returns how many were forgotten.
    pub fn evict_expired(&self, now: Instant) -> usize {
        let mut records = self.records();
        let before = records.len();
        records.retain(|_, record| now.saturating_duration_since(record.first_seen) <= self.ttl);
        before - records.len()
    }

    /// How many albums are being tracked right now.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.records().len()
    }
}
