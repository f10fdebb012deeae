//! Core data model: track identity, load jobs/results, queue items, and
//! history entries (§3).

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

/// Opaque track identity, stable across retries (unlike the resolved URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(String);

impl TrackId {
    /// Wraps a raw identity string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identity string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Minimal identity + display title pair, carried through retries and
/// recovery without the one-shot load artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Stable identity.
    pub identity: TrackId,
    /// Display title.
    pub title: String,
}

/// Who requested a track: a real user, or the synthetic radio requester
/// (§4.C Radio auto-queue).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Requester {
    /// A real chat-platform user.
    User {
        /// Platform user id.
        id: String,
        /// Display name, if known.
        name: Option<String>,
    },
    /// The radio auto-queue (§4.C).
    Radio,
}

/// An immutable unit of work submitted to the [`crate::loader::Loader`].
#[derive(Debug, Clone)]
pub struct LoadJob {
    /// Track identity.
    pub identity: TrackId,
    /// Freshly resolved stream URL (not stable across retries).
    pub stream_url: String,
    /// Display title.
    pub title: String,
}

/// One-shot, streaming, non-seekable PCM byte source boxed behind
/// `AsyncRead`. Owned exclusively by whoever receives it; dropping it
/// without fully consuming the stream must terminate the underlying
/// subprocess (enforced by the concrete reader's `Drop` impl, §4.A/§9).
pub type PcmReader = Box<dyn AsyncRead + Send + Unpin>;

/// The terminal, successful result of a load (§3).
///
/// `reader` is consumed exactly once by a single playback attempt; it must
/// never be reused after a `play()` call, successful or not (§9).
pub struct LoadResult {
    /// Track identity.
    pub identity: TrackId,
    /// Display title.
    pub title: String,
    /// One-shot streaming PCM reader, signed-16-bit LE, 48 kHz, stereo.
    pub reader: PcmReader,
    /// Wall time spent spawning and confirming the transcoder subprocess.
    pub elapsed: Duration,
}

impl fmt::Debug for LoadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadResult")
            .field("identity", &self.identity)
            .field("title", &self.title)
            .field("elapsed", &self.elapsed)
            .finish_non_exhaustive()
    }
}

/// An entry in a guild's queue.
///
/// `load_result` and `stream_url` are populated asynchronously after
/// enqueue; ownership of the whole item is exclusive to the `GuildPlayer`.
pub struct QueueItem {
    /// Track identity + title.
    pub track: Track,
    /// Who requested this track.
    pub requester: Requester,
    /// Unix epoch milliseconds at enqueue time.
    pub arrival_time_ms: u64,
    /// Populated once the loader succeeds; `None` while loading or pending.
    pub load_result: Option<LoadResult>,
    /// Resolved stream URL, if already known (e.g. carried from a prior
    /// resolve attempt); `None` until the locator resolver runs.
    pub resolved_stream_url: Option<String>,
    /// Opaque handle back to the originating chat-platform interaction, used
    /// only to route `send_followup` calls; the core never inspects it.
    pub interaction: Option<String>,
}

impl QueueItem {
    /// Builds a fresh queue item for a track, with no load artifacts
    /// attached. Used both for normal enqueue and for recovery (§4.C), where
    /// only `track` is ever copied from a snapshot — never `load_result`.
    #[must_use]
    pub fn fresh(track: Track, requester: Requester, arrival_time_ms: u64) -> Self {
        Self {
            track,
            requester,
            arrival_time_ms,
            load_result: None,
            resolved_stream_url: None,
            interaction: None,
        }
    }
}

impl fmt::Debug for QueueItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueItem")
            .field("track", &self.track)
            .field("requester", &self.requester)
            .field("arrival_time_ms", &self.arrival_time_ms)
            .field("has_load_result", &self.load_result.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_id_display_round_trips() {
        let id = TrackId::new("abc-123");
        assert_eq!(id.as_str(), "abc-123");
        assert_eq!(id.to_string(), "abc-123");
    }

    #[test]
    fn fresh_queue_item_has_no_load_artifacts() {
        let track = Track {
            identity: TrackId::new("abc"),
            title: "Song".into(),
        };
        let item = QueueItem::fresh(track, Requester::Radio, 0);
        assert!(item.load_result.is_none());
        assert!(item.resolved_stream_url.is_none());
    }
}
