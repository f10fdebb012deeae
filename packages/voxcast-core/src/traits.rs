//! Thin interfaces to external collaborators (§1 out-of-scope list, §6).
//!
//! The core only calls these traits; it never implements the chat-platform
//! HTTP endpoint, metadata providers, AI text generation, or history
//! persistence itself. Embeddings supply concrete implementations.

use async_trait::async_trait;

use crate::error::VoxResult;
use crate::model::{Track, TrackId};

/// Resolves a track identity to a fresh, signed stream URL.
#[async_trait]
pub trait LocatorResolver: Send + Sync {
    /// Resolves `identity` to a playable stream URL. May take 1-2 seconds;
    /// failures are surfaced as a [`crate::error::VoxError::Load`].
    async fn resolve(&self, identity: &TrackId) -> VoxResult<String>;
}

/// Searches for tracks by free-text query (user requests, radio auto-queue).
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns an ordered list of candidate tracks for `query`.
    async fn search(&self, query: &str) -> VoxResult<Vec<Track>>;
}

/// Produces a single search query from recent play history, for radio
/// auto-queue (§4.C Radio auto-queue). Best-effort: an empty string
/// disables radio for that round.
#[async_trait]
pub trait RecommendationProvider: Send + Sync {
    /// Returns one search query derived from `recent_titles`, or an empty
    /// string if no recommendation is available.
    async fn recommend(&self, recent_titles: &[String]) -> VoxResult<String>;
}

/// Status of the platform-supplied voice connection (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceStatus {
    /// Connection is being established.
    Connecting,
    /// Connection is established and ready to accept audio.
    Ready,
    /// Connection has been closed, by us or the remote end.
    Disconnected,
}

/// Bidirectional voice sink capability required by the [`crate::player::Player`]
/// (§6).
#[async_trait]
pub trait VoiceConnection: Send + Sync {
    /// Sends one encoded Opus packet (typically <= 3840 bytes). May block
    /// briefly; fails if the connection is closed.
    async fn send_opus_packet(&self, packet: &[u8]) -> VoxResult<()>;

    /// Sets the "speaking" indicator.
    async fn speaking(&self, on: bool) -> VoxResult<()>;

    /// Returns the current connection status.
    fn status(&self) -> VoiceStatus;

    /// Closes the connection.
    async fn close(&self);
}

/// Fire-and-forget announcement sink (§6). The core never inspects the
/// result beyond logging a failure; user-visible follow-ups are best-effort.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Sends an ephemeral or public follow-up tied to an interaction token.
    async fn send_followup(&self, interaction_token: &str, content: &str, ephemeral: bool);

    /// Sends a message to a channel, independent of any interaction.
    async fn send_channel_message(&self, channel_id: &str, content: &str);
}

/// Optional persistence collaborator for play history/logging (§6). The
/// core itself holds nothing on disk.
#[async_trait]
pub trait PersistenceCollaborator: Send + Sync {
    /// Records a completed (or partially completed) play.
    #[allow(clippy::too_many_arguments)]
    async fn record_play(
        &self,
        guild_id: &str,
        identity: &TrackId,
        title: &str,
        url: &str,
        requester_id: &str,
        requester_name: &str,
        duration_s: u64,
    );

    /// Resolves (fetching if necessary) a display username for a user id.
    async fn get_or_fetch_username(&self, guild_id: &str, user_id: &str) -> String;
}
