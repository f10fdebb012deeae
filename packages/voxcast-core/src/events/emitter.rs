//! Event emitter abstraction for decoupling the core from any particular
//! announcement transport.
//!
//! `GuildPlayer` depends on this trait rather than a concrete broadcast
//! channel, so tests can assert on emitted events without a live voice
//! connection or chat-platform session.

use super::{GuildEvent, LoaderEvent, PlayerEvent};

/// Trait for observing domain events without coupling to a transport.
pub trait EventEmitter: Send + Sync {
    /// Emits a loader lifecycle event.
    fn emit_loader(&self, event: LoaderEvent);

    /// Emits a player lifecycle event.
    fn emit_player(&self, event: PlayerEvent);

    /// Emits a guild/queue lifecycle event.
    fn emit_guild(&self, event: GuildEvent);
}

/// No-op emitter; events are silently discarded. Useful as a default for
/// embeddings that don't need observability beyond logging.
pub struct NoopEventEmitter;

impl EventEmitter for NoopEventEmitter {
    fn emit_loader(&self, _event: LoaderEvent) {}
    fn emit_player(&self, _event: PlayerEvent) {}
    fn emit_guild(&self, _event: GuildEvent) {}
}

/// Logging emitter; logs all events at debug level via `tracing`.
pub struct LoggingEventEmitter;

impl EventEmitter for LoggingEventEmitter {
    fn emit_loader(&self, event: LoaderEvent) {
        tracing::debug!(?event, "loader_event");
    }

    fn emit_player(&self, event: PlayerEvent) {
        tracing::debug!(?event, "player_event");
    }

    fn emit_guild(&self, event: GuildEvent) {
        tracing::debug!(?event, "guild_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrackId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Test emitter that counts events by category.
    struct CountingEventEmitter {
        loader_count: AtomicUsize,
        player_count: AtomicUsize,
        guild_count: AtomicUsize,
    }

    impl CountingEventEmitter {
        fn new() -> Self {
            Self {
                loader_count: AtomicUsize::new(0),
                player_count: AtomicUsize::new(0),
                guild_count: AtomicUsize::new(0),
            }
        }
    }

    impl EventEmitter for CountingEventEmitter {
        fn emit_loader(&self, _event: LoaderEvent) {
            self.loader_count.fetch_add(1, Ordering::SeqCst);
        }
        fn emit_player(&self, _event: PlayerEvent) {
            self.player_count.fetch_add(1, Ordering::SeqCst);
        }
        fn emit_guild(&self, _event: GuildEvent) {
            self.guild_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn counting_emitter_tracks_events() {
        let emitter = Arc::new(CountingEventEmitter::new());

        emitter.emit_loader(LoaderEvent::Loading {
            identity: TrackId::new("abc"),
        });
        emitter.emit_player(PlayerEvent::Started {
            identity: TrackId::new("abc"),
            title: "Track".into(),
        });
        emitter.emit_guild(GuildEvent::Clear);

        assert_eq!(emitter.loader_count.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.player_count.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.guild_count.load(Ordering::SeqCst), 1);
    }
}
