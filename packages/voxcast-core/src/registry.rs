//! Controller registry: one [`GuildPlayer`] per guild, created lazily and
//! kept alive for the process lifetime (§4.D).
//!
//! Grounded on the teacher's `PlaybackSessionStore` (DashMap-backed,
//! `O(1)` keyed lookups): here the key is a guild id rather than a
//! `(stream_id, speaker_ip)` pair, and the stored value is a live,
//! task-owning `GuildPlayer` rather than a plain data record.

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::Config;
use crate::guild_player::{Collaborators, GuildPlayer};

/// Builds the [`Collaborators`] bundle for a newly constructed
/// [`GuildPlayer`]. Boxed so the registry doesn't need to be generic over
/// the embedding's concrete collaborator types.
pub type CollaboratorsFactory = Box<dyn Fn(&str) -> Collaborators + Send + Sync>;

/// Process-wide lookup of per-guild playback controllers (§4.D).
///
/// `get_or_create` is the only way to obtain a [`GuildPlayer`]; construction
/// is idempotent per guild id; `DashMap::entry` gives atomic get-or-insert
/// without a registry-wide lock.
pub struct ControllerRegistry {
    players: DashMap<String, Arc<GuildPlayer>>,
    config: Config,
    collaborators_factory: CollaboratorsFactory,
}

impl ControllerRegistry {
    /// Creates an empty registry. `collaborators_factory` is invoked once
    /// per guild, the first time that guild is looked up, to build its
    /// external-collaborator bundle.
    #[must_use]
    pub fn new(config: Config, collaborators_factory: CollaboratorsFactory) -> Self {
        Self {
            players: DashMap::new(),
            config,
            collaborators_factory,
        }
    }

    /// Returns the existing `GuildPlayer` for `guild_id`, or lazily
    /// constructs one.
    #[must_use]
    pub fn get_or_create(&self, guild_id: &str) -> Arc<GuildPlayer> {
        self.players
            .entry(guild_id.to_string())
            .or_insert_with(|| {
                let collaborators = (self.collaborators_factory)(guild_id);
                GuildPlayer::new(guild_id, self.config.clone(), collaborators)
            })
            .value()
            .clone()
    }

    /// Returns the existing `GuildPlayer` for `guild_id`, if one has been
    /// constructed, without creating it.
    #[must_use]
    pub fn get(&self, guild_id: &str) -> Option<Arc<GuildPlayer>> {
        self.players.get(guild_id).map(|r| r.value().clone())
    }

    /// Drops a guild's controller entirely (e.g. bot removed from guild).
    /// The `GuildPlayer`'s `Drop` impl tears down its listener tasks.
    pub fn remove(&self, guild_id: &str) {
        self.players.remove(guild_id);
    }

    /// Number of guilds with a constructed controller.
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether no controllers have been constructed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoopEventEmitter;
    use crate::error::VoxResult;
    use crate::model::{Track, TrackId};
    use crate::traits::{
        LocatorResolver, NotificationSink, RecommendationProvider, SearchProvider,
    };
    use async_trait::async_trait;

    struct FakeLocator;
    #[async_trait]
    impl LocatorResolver for FakeLocator {
        async fn resolve(&self, _identity: &TrackId) -> VoxResult<String> {
            Ok("https://example.test/stream".into())
        }
    }

    struct FakeSearch;
    #[async_trait]
    impl SearchProvider for FakeSearch {
        async fn search(&self, _query: &str) -> VoxResult<Vec<Track>> {
            Ok(vec![])
        }
    }

    struct FakeRecommendation;
    #[async_trait]
    impl RecommendationProvider for FakeRecommendation {
        async fn recommend(&self, _recent_titles: &[String]) -> VoxResult<String> {
            Ok(String::new())
        }
    }

    struct FakeNotifications;
    #[async_trait]
    impl NotificationSink for FakeNotifications {
        async fn send_followup(&self, _interaction_token: &str, _content: &str, _ephemeral: bool) {}
        async fn send_channel_message(&self, _channel_id: &str, _content: &str) {}
    }

    fn test_registry() -> ControllerRegistry {
        ControllerRegistry::new(
            Config::default(),
            Box::new(|_guild_id| Collaborators {
                locator: Arc::new(FakeLocator),
                search: Arc::new(FakeSearch),
                recommendation: Arc::new(FakeRecommendation),
                notifications: Arc::new(FakeNotifications),
                emitter: Arc::new(NoopEventEmitter),
            }),
        )
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent_per_guild() {
        let registry = test_registry();
        let a = registry.get_or_create("guild-1");
        let b = registry.get_or_create("guild-1");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn distinct_guilds_get_distinct_players() {
        let registry = test_registry();
        let a = registry.get_or_create("guild-1");
        let b = registry.get_or_create("guild-2");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn get_without_create_returns_none_for_unknown_guild() {
        let registry = test_registry();
        assert!(registry.get("guild-1").is_none());
        registry.get_or_create("guild-1");
        assert!(registry.get("guild-1").is_some());
    }

    #[tokio::test]
    async fn remove_drops_the_controller() {
        let registry = test_registry();
        registry.get_or_create("guild-1");
        registry.remove("guild-1");
        assert!(registry.is_empty());
    }
}
