//! Demo collaborator implementations.
//!
//! A real deployment wires [`voxcast_core::Collaborators`] to a chat
//! platform's gateway, a search/metadata API, and a real voice connection.
//! This binary only needs to prove the runtime wires together end to end,
//! so it logs instead of calling out to anything external.

use async_trait::async_trait;
use voxcast_core::{
    LocatorResolver, NotificationSink, RecommendationProvider, SearchProvider, Track, TrackId,
    VoiceConnection, VoiceStatus, VoxResult,
};

/// Resolves every identity to itself as a stream URL; logs the attempt.
pub struct LoggingLocator;

#[async_trait]
impl LocatorResolver for LoggingLocator {
    async fn resolve(&self, identity: &TrackId) -> VoxResult<String> {
        tracing::info!(%identity, "resolving track (demo locator)");
        Ok(identity.as_str().to_string())
    }
}

/// Always returns no candidates; a real deployment would call a search API.
pub struct NoopSearch;

#[async_trait]
impl SearchProvider for NoopSearch {
    async fn search(&self, query: &str) -> VoxResult<Vec<Track>> {
        tracing::debug!(%query, "search (demo provider, no results)");
        Ok(vec![])
    }
}

/// Never recommends anything, disabling radio auto-queue in the demo host.
pub struct NoopRecommendation;

#[async_trait]
impl RecommendationProvider for NoopRecommendation {
    async fn recommend(&self, _recent_titles: &[String]) -> VoxResult<String> {
        Ok(String::new())
    }
}

/// Logs announcements instead of sending them to a chat platform.
pub struct LoggingNotifications;

#[async_trait]
impl NotificationSink for LoggingNotifications {
    async fn send_followup(&self, interaction_token: &str, content: &str, ephemeral: bool) {
        tracing::info!(%interaction_token, %content, ephemeral, "followup (demo sink)");
    }

    async fn send_channel_message(&self, channel_id: &str, content: &str) {
        tracing::info!(%channel_id, %content, "channel message (demo sink)");
    }
}

/// Logs every packet/speaking toggle instead of sending real voice data.
/// Stands in until a platform gateway's voice connection is attached via
/// [`voxcast_core::GuildPlayer::attach_voice_connection`].
#[allow(dead_code)]
pub struct LoggingVoiceConnection;

#[async_trait]
impl VoiceConnection for LoggingVoiceConnection {
    async fn send_opus_packet(&self, packet: &[u8]) -> VoxResult<()> {
        tracing::trace!(bytes = packet.len(), "send_opus_packet (demo sink)");
        Ok(())
    }

    async fn speaking(&self, on: bool) -> VoxResult<()> {
        tracing::debug!(on, "speaking (demo sink)");
        Ok(())
    }

    fn status(&self) -> VoiceStatus {
        VoiceStatus::Ready
    }

    async fn close(&self) {
        tracing::debug!("voice connection closed (demo sink)");
    }
}
