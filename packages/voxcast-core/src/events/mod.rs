//! Typed notification streams connecting the loader, player, and guild
//! controller.
//!
//! - [`LoaderEvent`] flows Loader -> GuildPlayer's load listener.
//! - [`PlayerEvent`] flows Player -> GuildPlayer's playback listener.
//! - [`GuildEvent`] flows the queue listener -> observers (e.g. logging,
//!   a future UI bridge); it is also the channel the queue listener itself
//!   selects on.
//!
//! The transport (a `tokio::sync::mpsc` buffered channel per §4.C) is chosen
//! by the caller; this module only defines the payloads and the
//! [`EventEmitter`] abstraction used for the user-visible announcement
//! side-channel (`mod emitter`).

mod emitter;

pub use emitter::{EventEmitter, LoggingEventEmitter, NoopEventEmitter};

use serde::Serialize;

use crate::model::TrackId;

/// Events emitted by the [`crate::loader::Loader`] for a single job, in order:
/// `Loading` always first, then exactly one terminal variant.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LoaderEvent {
    /// The transcoder subprocess has been spawned for this identity.
    Loading {
        /// Track identity being loaded.
        identity: TrackId,
    },
    /// The transcoder produced a usable stream; the attached reader is
    /// handed off to exactly one playback task.
    Loaded {
        /// Track identity that finished loading.
        identity: TrackId,
        /// Display title resolved for this track.
        title: String,
        /// Milliseconds spent spawning and confirming the subprocess.
        elapsed_ms: u64,
    },
    /// The load failed (spawn failure, crash, 30 s timeout, empty stream).
    LoadError {
        /// Track identity that failed to load.
        identity: TrackId,
        /// Human-readable error, with captured stderr appended where available.
        error: String,
    },
    /// The load was pre-empted by [`crate::loader::Loader::cancel`].
    LoadCanceled {
        /// Track identity whose load was canceled.
        identity: TrackId,
    },
}

/// Events emitted by the [`crate::player::Player`] over the lifetime of one
/// `play()` call.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerEvent {
    /// Playback of this track has begun (after pre-roll).
    Started {
        /// Track identity now playing.
        identity: TrackId,
        /// Display title now playing.
        title: String,
    },
    /// The track reached EOF naturally.
    Completed {
        /// Track identity that finished.
        identity: TrackId,
    },
    /// The track was stopped before EOF (skip, reset, or voice drop).
    Stopped {
        /// Track identity that was stopped.
        identity: TrackId,
    },
    /// An unrecoverable decode/send failure ended the track early.
    Error {
        /// Track identity that errored.
        identity: TrackId,
        /// Human-readable error.
        error: String,
    },
    /// `pause()` was called; the loop has observed the `paused` flag and is
    /// fading into silence mode (or already emitting silence).
    Paused {
        /// Track identity that was paused.
        identity: TrackId,
    },
    /// The loop has left silence mode and resumed sending decoded audio.
    Resumed {
        /// Track identity that was resumed.
        identity: TrackId,
    },
}

/// Events the queue listener reacts to / re-broadcasts for observers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GuildEvent {
    /// An item was appended to the queue.
    Add {
        /// Track identity that was enqueued.
        identity: TrackId,
        /// Display title that was enqueued.
        title: String,
    },
    /// The queue was cleared.
    Clear,
    /// The queue was shuffled; the head (if playing) was preserved.
    Shuffled {
        /// Number of items shuffled.
        count: usize,
    },
}
