//! Voxcast Core - shared library for the Voxcast voice-channel music player.
//!
//! This crate provides the per-guild playback runtime used by a chat-platform
//! voice bot: resolving a track identity to a stream, transcoding and
//! Opus-encoding it, and sending it to a voice connection in real time,
//! multiplexed across any number of guilds.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`model`]: Core data types (tracks, queue items, load results)
//! - [`loader`]: Stream loader supervising the transcoder subprocess
//! - [`player`]: Real-time Opus streamer
//! - [`queue`]: Per-guild pending-track queue
//! - [`history`]: Fixed-capacity ring buffer of recently played tracks
//! - [`guild_player`]: Per-guild orchestrator tying the above together
//! - [`registry`]: Process-wide lookup of per-guild controllers
//! - [`traits`]: Thin interfaces to external collaborators (locator, search,
//!   voice connection, notifications)
//! - [`events`]: Event system for observability and cross-component signaling
//! - [`config`]: Runtime configuration
//! - [`error`]: Centralized error types
//! - [`runtime`]: Task spawning abstraction for async runtime independence
//!
//! # Abstraction Traits
//!
//! The crate defines several traits to decouple core logic from
//! platform-specific implementations:
//!
//! - [`TaskSpawner`](runtime::TaskSpawner): spawning background tasks
//! - [`EventEmitter`](events::EventEmitter): emitting domain events
//! - [`LocatorResolver`](traits::LocatorResolver),
//!   [`SearchProvider`](traits::SearchProvider),
//!   [`RecommendationProvider`](traits::RecommendationProvider),
//!   [`VoiceConnection`](traits::VoiceConnection),
//!   [`NotificationSink`](traits::NotificationSink),
//!   [`PersistenceCollaborator`](traits::PersistenceCollaborator): external
//!   collaborators supplied by the embedding binary.
//!
//! This library never installs a `tracing` subscriber, never opens an HTTP
//! listener, and never touches disk; an embedding binary wires all of that
//! up (§10/§11/§12 of the design spec).

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod events;
pub mod guild_player;
pub mod history;
pub mod loader;
pub mod model;
pub mod player;
pub mod queue;
pub mod registry;
pub mod runtime;
pub mod traits;
pub mod utils;

pub use config::Config;
pub use error::{ErrorCode, VoxError, VoxResult};
pub use events::{EventEmitter, GuildEvent, LoaderEvent, LoggingEventEmitter, NoopEventEmitter, PlayerEvent};
pub use guild_player::{Collaborators, GuildPlayer, State as GuildState};
pub use history::{History, HistoryEntry};
pub use loader::{LoadOutcome, Loader};
pub use model::{LoadJob, LoadResult, PcmReader, QueueItem, Requester, Track, TrackId};
pub use player::Player;
pub use queue::Queue;
pub use registry::{CollaboratorsFactory, ControllerRegistry};
pub use runtime::{TaskSpawner, TokioSpawner};
pub use traits::{
    LocatorResolver, NotificationSink, PersistenceCollaborator, RecommendationProvider,
    SearchProvider, VoiceConnection, VoiceStatus,
};
pub use utils::now_millis;
