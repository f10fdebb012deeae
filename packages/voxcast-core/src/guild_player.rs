//! Per-guild orchestrator (§4.C): queue, current item, voice connection,
//! event routing, recovery, idle timeout, and radio auto-queue.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};
use tokio::time::interval;

use crate::config::Config;
use crate::error::VoxResult;
use crate::events::{EventEmitter, GuildEvent, PlayerEvent};
use crate::history::{History, HistoryEntry};
use crate::loader::{LoadOutcome, Loader};
use crate::model::{LoadJob, QueueItem, Requester, Track, TrackId};
use crate::player::Player;
use crate::queue::Queue;
use crate::traits::{
    LocatorResolver, NotificationSink, RecommendationProvider, SearchProvider, VoiceConnection,
};
use crate::utils::now_millis;

/// High-level lifecycle phase of a guild's playback (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No track active, listeners idle.
    Idle,
    /// A track is actively streaming.
    Playing,
    /// A track is loaded but paused (silence frames).
    Paused,
    /// The most recent track was stopped (skip/reset/recovery) and no new
    /// one has started yet.
    Stopped,
}

/// Exponential backoff schedule for voice reconnection (§4.C Recovery),
/// grounded on the same 3-attempt cadence as other retry helpers in the
/// corpus.
const RECONNECT_DELAYS_MS: [u64; 3] = [200, 500, 1000];

/// Maximum reconnect attempts for a dropped voice connection (§4.C).
const MAX_RECONNECT_ATTEMPTS: usize = 3;

/// Bound on retries when a radio recommendation keeps colliding with
/// history/queue (§8 E6).
const RADIO_RETRY_BOUND: usize = 3;

/// Collaborators a `GuildPlayer` needs injected by the controller registry
/// (§4.D) at construction time.
pub struct Collaborators {
    /// Resolves a track identity to a fresh stream URL.
    pub locator: Arc<dyn LocatorResolver>,
    /// Searches for tracks by free-text query.
    pub search: Arc<dyn SearchProvider>,
    /// Produces a recommendation query from recent history.
    pub recommendation: Arc<dyn RecommendationProvider>,
    /// Fire-and-forget user-visible announcements.
    pub notifications: Arc<dyn NotificationSink>,
    /// Event observability sink.
    pub emitter: Arc<dyn EventEmitter>,
}

struct ListenerHandles {
    queue: tokio::task::JoinHandle<()>,
    load: tokio::task::JoinHandle<()>,
    playback: tokio::task::JoinHandle<()>,
    idle: tokio::task::JoinHandle<()>,
}

struct StopSignals {
    queue_stop: watch::Sender<bool>,
    playback_stop: watch::Sender<bool>,
    load_stop: watch::Sender<bool>,
    idle_stop: watch::Sender<bool>,
}

impl StopSignals {
    fn new() -> Self {
        Self {
            queue_stop: watch::channel(false).0,
            playback_stop: watch::channel(false).0,
            load_stop: watch::channel(false).0,
            idle_stop: watch::channel(false).0,
        }
    }

    fn fire_all(&self) {
        let _ = self.queue_stop.send(true);
        let _ = self.playback_stop.send(true);
        let _ = self.load_stop.send(true);
        let _ = self.idle_stop.send(true);
    }
}

/// Per-guild state machine orchestrating the loader and player (§4.C).
pub struct GuildPlayer {
    guild_id: String,
    config: Config,
    collaborators: Collaborators,

    queue: Arc<Queue>,
    history: Arc<History>,
    player: Arc<Player>,

    state: RwLock<State>,
    current_item: RwLock<Option<QueueItem>>,
    current_song: RwLock<Option<String>>,
    radio_enabled: std::sync::atomic::AtomicBool,
    last_activity_at_ms: std::sync::atomic::AtomicU64,
    /// Set by `skip()` just before stopping the player so the playback
    /// listener's `Stopped` arm knows to advance to the next item, without
    /// also advancing on the `reset()`/voice-drop stop paths (§4.C, §8 E2).
    skip_pending: std::sync::atomic::AtomicBool,

    voice: RwLock<Option<Arc<dyn VoiceConnection>>>,
    voice_channel_id: RwLock<Option<String>>,

    guild_events_tx: RwLock<mpsc::Sender<GuildEvent>>,
    load_outcomes_tx: RwLock<mpsc::Sender<LoadOutcome>>,
    player_events_tx: RwLock<mpsc::Sender<PlayerEvent>>,

    loader: Arc<Loader>,

    stop_signals: RwLock<Arc<StopSignals>>,
    listeners: AsyncMutex<Option<ListenerHandles>>,
    self_weak: std::sync::Weak<GuildPlayer>,
}

impl GuildPlayer {
    /// Constructs a new, idle `GuildPlayer` and starts its listener tasks.
    /// Lazily called once per guild by the [`crate::registry::ControllerRegistry`]
    /// (§4.D).
    pub fn new(guild_id: impl Into<String>, config: Config, collaborators: Collaborators) -> Arc<Self> {
        let (guild_events_tx, guild_events_rx) = mpsc::channel(128);
        let (load_outcomes_tx, load_outcomes_rx) = mpsc::channel(128);
        let (player_events_tx, player_events_rx) = mpsc::channel(128);

        let loader = Arc::new(Loader::new(load_outcomes_tx.clone(), collaborators.emitter.clone()));
        let signals = Arc::new(StopSignals::new());

        let this = Arc::new_cyclic(|weak| Self {
            guild_id: guild_id.into(),
            history: Arc::new(History::new(config.history_size)),
            radio_enabled: std::sync::atomic::AtomicBool::new(config.radio_enabled),
            config,
            collaborators,
            queue: Arc::new(Queue::new()),
            player: Arc::new(Player::new()),
            state: RwLock::new(State::Idle),
            current_item: RwLock::new(None),
            current_song: RwLock::new(None),
            last_activity_at_ms: std::sync::atomic::AtomicU64::new(now_millis()),
            skip_pending: std::sync::atomic::AtomicBool::new(false),
            voice: RwLock::new(None),
            voice_channel_id: RwLock::new(None),
            guild_events_tx: RwLock::new(guild_events_tx),
            load_outcomes_tx: RwLock::new(load_outcomes_tx),
            player_events_tx: RwLock::new(player_events_tx),
            loader,
            stop_signals: RwLock::new(signals.clone()),
            listeners: AsyncMutex::new(None),
            self_weak: weak.clone(),
        });

        Self::spawn_listeners(&this, signals, guild_events_rx, load_outcomes_rx, player_events_rx);
        this
    }

    /// Tears down the current dispatch listeners and spawns fresh ones on
    /// freshly created channels and stop signals (§4.C Reset, §9 "Stop
    /// signals are single-use signals re-created on reset"). Called from
    /// `reset()` only; initial construction spawns listeners directly since
    /// there is nothing yet to tear down.
    fn respawn_listeners(this: &Arc<Self>) {
        let (guild_events_tx, guild_events_rx) = mpsc::channel(128);
        let (load_outcomes_tx, load_outcomes_rx) = mpsc::channel(128);
        let (player_events_tx, player_events_rx) = mpsc::channel(128);

        let old_signals = { this.stop_signals.read().clone() };
        old_signals.fire_all();

        this.loader.rebind_outcomes(load_outcomes_tx.clone());
        *this.guild_events_tx.write() = guild_events_tx;
        *this.load_outcomes_tx.write() = load_outcomes_tx;
        *this.player_events_tx.write() = player_events_tx;

        let signals = Arc::new(StopSignals::new());
        *this.stop_signals.write() = signals.clone();

        Self::spawn_listeners(this, signals, guild_events_rx, load_outcomes_rx, player_events_rx);
    }

    fn spawn_listeners(
        this: &Arc<Self>,
        signals: Arc<StopSignals>,
        mut guild_events_rx: mpsc::Receiver<GuildEvent>,
        mut load_outcomes_rx: mpsc::Receiver<LoadOutcome>,
        mut player_events_rx: mpsc::Receiver<PlayerEvent>,
    ) {
        let queue_handle = {
            let this = this.clone();
            let mut stop = signals.queue_stop.subscribe();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = stop.changed() => { if *stop.borrow() { break; } }
                        event = guild_events_rx.recv() => {
                            match event {
                                None => break,
                                Some(GuildEvent::Add { identity, .. }) => {
                                    // §4.C queue listener: only kick off a load
                                    // when nothing is already loaded/playing and
                                    // this identity is (still) the head.
                                    if this.current_song.read().is_none() && !this.player.is_playing() {
                                        this.maybe_start_head_load(&identity).await;
                                    }
                                }
                                Some(_) => {}
                            }
                        }
                    }
                }
            })
        };

        let load_handle = {
            let this = this.clone();
            let mut stop = signals.load_stop.subscribe();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = stop.changed() => { if *stop.borrow() { break; } }
                        outcome = load_outcomes_rx.recv() => {
                            match outcome {
                                None => break,
                                Some(outcome) => this.handle_load_outcome(outcome).await,
                            }
                        }
                    }
                }
            })
        };

        let playback_handle = {
            let this = this.clone();
            let mut stop = signals.playback_stop.subscribe();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = stop.changed() => { if *stop.borrow() { break; } }
                        event = player_events_rx.recv() => {
                            match event {
                                None => break,
                                Some(event) => this.handle_player_event(event).await,
                            }
                        }
                    }
                }
            })
        };

        let idle_handle = {
            let this = this.clone();
            let mut stop = signals.idle_stop.subscribe();
            tokio::spawn(async move {
                this.idle_timeout_loop(&mut stop).await;
            })
        };

        // `try_lock` is safe here: called only from construction (nothing
        // else holds `listeners` yet) or from `reset()`, which never calls
        // this while also awaiting the lock elsewhere.
        if let Ok(mut guard) = this.listeners.try_lock() {
            *guard = Some(ListenerHandles {
                queue: queue_handle,
                load: load_handle,
                playback: playback_handle,
                idle: idle_handle,
            });
        }
    }

    // ---- Queue operations (§4.C) ----

    /// Appends `track` to the queue on behalf of `requester` and emits
    /// `Add`; the queue listener decides whether to kick off a load (§4.C).
    pub async fn add(&self, track: Track, requester: Requester, interaction: Option<String>) {
        self.touch_activity();
        let identity = track.identity.clone();
        let title = track.title.clone();
        let mut item = QueueItem::fresh(track, requester, now_millis());
        item.interaction = interaction;
        self.queue.add(item);
        let guild_events_tx = self.guild_events_tx.read().clone();
        let _ = guild_events_tx.send(GuildEvent::Add { identity, title }).await;
    }

    /// Removes and returns the title at 1-based position `i` (default 1).
    pub fn remove(&self, i: usize) -> VoxResult<String> {
        self.queue.remove(i)
    }

    /// Clears the queue.
    pub async fn clear(&self) {
        self.queue.clear();
        let guild_events_tx = self.guild_events_tx.read().clone();
        let _ = guild_events_tx.send(GuildEvent::Clear).await;
    }

    /// Shuffles the queue, preserving the head if something is playing.
    pub async fn shuffle(&self) -> usize {
        let count = self.queue.shuffle(self.player.is_playing());
        let guild_events_tx = self.guild_events_tx.read().clone();
        let _ = guild_events_tx.send(GuildEvent::Shuffled { count }).await;
        count
    }

    async fn maybe_start_head_load(&self, expected_head: &TrackId) {
        let Some(job) = self.queue.with_head(|item| {
            if &item.track.identity == expected_head {
                Some(LoadJob {
                    identity: item.track.identity.clone(),
                    stream_url: item.resolved_stream_url.clone().unwrap_or_default(),
                    title: item.track.title.clone(),
                })
            } else {
                None
            }
        }).flatten() else {
            return;
        };

        let job = if job.stream_url.is_empty() {
            match self.collaborators.locator.resolve(&job.identity).await {
                Ok(url) => LoadJob { stream_url: url, ..job },
                Err(e) => {
                    tracing::warn!(error = %e, identity = %job.identity, "locator resolve failed");
                    let load_outcomes_tx = self.load_outcomes_tx.read().clone();
                    let _ = load_outcomes_tx
                        .send(LoadOutcome::LoadError {
                            identity: job.identity,
                            error: e.to_string(),
                        })
                        .await;
                    return;
                }
            }
        } else {
            job
        };

        self.loader.load(job);
    }

    // ---- Load listener (§4.C) ----

    async fn handle_load_outcome(&self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Loading { .. } => {}
            LoadOutcome::Loaded(result) => {
                let identity = result.identity.clone();
                let attached = self.queue.with_head_mut(|item| {
                    if item.track.identity == identity {
                        item.load_result = Some(result);
                        true
                    } else {
                        false
                    }
                });
                if attached != Some(true) {
                    return;
                }
                if !self.player.is_playing() {
                    self.spawn_playback_task();
                }
            }
            LoadOutcome::LoadError { identity, error } => {
                tracing::error!(%identity, %error, "load failed");
                self.queue.pop_front();
                self.announce(&format!("Failed to load track: {error}")).await;
                self.advance_after_track_end().await;
            }
            LoadOutcome::LoadCanceled { .. } => {}
        }
    }

    fn spawn_playback_task(&self) {
        let Some(item) = self.queue.pop_front() else { return };
        let Some(load_result) = item.load_result else {
            // Nothing to play yet; put it back at the head and wait for the
            // load listener to attach a result.
            self.queue.prepend(QueueItem::fresh(item.track, item.requester, item.arrival_time_ms));
            return;
        };
        let Some(voice) = self.voice.read().clone() else {
            return;
        };
        let player = self.player.clone();
        let events_tx = self.player_events_tx.read().clone();
        let track = item.track.clone();
        *self.current_item.write() = Some(QueueItem::fresh(track.clone(), item.requester, item.arrival_time_ms));
        *self.current_song.write() = Some(track.title.clone());
        tokio::spawn(async move {
            if let Err(e) = player.play(load_result, voice, events_tx).await {
                tracing::error!(error = %e, "play() returned an error");
            }
        });
    }

    // ---- Playback listener (§4.C) ----

    async fn handle_player_event(&self, event: PlayerEvent) {
        self.collaborators.emitter.emit_player(event.clone());
        match event {
            PlayerEvent::Started { identity, title } => {
                *self.state.write() = State::Playing;
                self.history.record(HistoryEntry { identity, title: title.clone() });
                self.announce(&format!("Now playing: {title}")).await;
            }
            PlayerEvent::Completed { .. } => {
                self.clear_current();
                *self.state.write() = State::Idle;
                self.advance_after_track_end().await;
            }
            PlayerEvent::Stopped { .. } => {
                self.clear_current();
                *self.state.write() = State::Stopped;
                if self.skip_pending.swap(false, std::sync::atomic::Ordering::SeqCst) {
                    self.advance_after_track_end().await;
                }
            }
            PlayerEvent::Error { error, .. } => {
                self.clear_current();
                *self.state.write() = State::Idle;
                self.announce(&format!("Playback error: {error}")).await;
                self.advance_after_track_end().await;
            }
            PlayerEvent::Paused { .. } => {
                *self.state.write() = State::Paused;
            }
            PlayerEvent::Resumed { .. } => {
                *self.state.write() = State::Playing;
            }
        }
    }

    fn clear_current(&self) {
        *self.current_item.write() = None;
        *self.current_song.write() = None;
    }

    async fn advance_after_track_end(&self) {
        let next_identity = self.queue.with_head(|i| i.track.identity.clone());
        if let Some(identity) = next_identity {
            self.maybe_start_head_load(&identity).await;
        } else if self.radio_enabled.load(std::sync::atomic::Ordering::SeqCst) {
            self.trigger_radio().await;
        } else {
            self.touch_activity();
        }
    }

    // ---- Voice connection (§4.C) ----

    /// Attaches an already-established voice connection and records the
    /// channel id + join time. Connection establishment itself (discovering
    /// the user's channel, waiting for `Ready`) is the platform embedding's
    /// responsibility; the core only owns the connection once handed one.
    pub fn attach_voice_connection(&self, channel_id: String, conn: Arc<dyn VoiceConnection>) {
        *self.voice.write() = Some(conn);
        *self.voice_channel_id.write() = Some(channel_id);
        self.touch_activity();
    }

    /// Null-safe speaking toggle: no-ops if the connection is gone.
    pub async fn speak(&self, on: bool) {
        if let Some(conn) = self.voice.read().clone() {
            let _ = conn.speaking(on).await;
        }
    }

    async fn idle_timeout_loop(&self, stop: &mut watch::Receiver<bool>) {
        let mut ticker = interval(Duration::from_secs(60));
        let timeout = Duration::from_secs(self.config.idle_timeout_minutes * 60);
        loop {
            tokio::select! {
                _ = stop.changed() => { if *stop.borrow() { break; } }
                _ = ticker.tick() => {
                    let idle_for_ms = now_millis().saturating_sub(
                        self.last_activity_at_ms.load(std::sync::atomic::Ordering::SeqCst),
                    );
                    if *self.state.read() == State::Idle
                        && Duration::from_millis(idle_for_ms) >= timeout
                        && self.voice.read().is_some()
                    {
                        if let Some(conn) = self.voice.write().take() {
                            conn.close().await;
                        }
                        *self.voice_channel_id.write() = None;
                    }
                }
            }
        }
    }

    fn touch_activity(&self) {
        self.last_activity_at_ms
            .store(now_millis(), std::sync::atomic::Ordering::SeqCst);
    }

    // ---- Recovery (mid-song voice drop, §4.C) ----

    /// Reacts to an unexpected voice disconnect observed by an external
    /// watchdog. Snapshots and clears `current_item`, stops the player,
    /// attempts reconnection with exponential backoff, and on success
    /// re-queues a fresh copy of the in-flight track.
    pub async fn handle_voice_drop<F, Fut>(&self, reconnect: F)
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Option<Arc<dyn VoiceConnection>>>,
    {
        let snapshot = self.current_item.write().take();
        *self.current_song.write() = None;
        *self.voice.write() = None;

        if snapshot.is_some() {
            self.player.stop();
        }

        let mut reconnected = None;
        for (attempt, delay_ms) in RECONNECT_DELAYS_MS.iter().enumerate() {
            if attempt >= MAX_RECONNECT_ATTEMPTS {
                break;
            }
            if let Some(conn) = reconnect().await {
                reconnected = Some(conn);
                break;
            }
            tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
        }

        let Some(conn) = reconnected else {
            tracing::warn!(guild_id = %self.guild_id, "voice reconnect exhausted retries");
            return;
        };
        *self.voice.write() = Some(conn);

        if let Some(item) = snapshot {
            let fresh = QueueItem::fresh(item.track, item.requester, now_millis());
            let identity = fresh.track.identity.clone();
            self.queue.prepend(fresh);
            self.maybe_start_head_load(&identity).await;
        }
    }

    // ---- Reset (§4.C) ----

    /// Stops the player, closes voice, drains the queue, fires the current
    /// dispatch listeners' stop signal, and respawns fresh listeners on
    /// fresh channels and stop signals (§4.C, §9 "Stop signals are
    /// single-use ... re-created on reset"). After `reset()` returns, the
    /// `GuildPlayer` is usable as if newly created.
    pub async fn reset(&self) {
        self.player.stop();
        self.loader.cancel();
        if let Some(conn) = self.voice.write().take() {
            conn.close().await;
        }
        *self.voice_channel_id.write() = None;
        self.queue.clear();
        self.clear_current();
        *self.state.write() = State::Idle;

        let Some(this) = self.self_weak.upgrade() else {
            return;
        };
        Self::respawn_listeners(&this);
    }

    /// Stops the current track and advances to the next queued item once
    /// the player's `Stopped` event arrives (§4.C, §8 E2).
    pub fn skip(&self) {
        self.skip_pending.store(true, std::sync::atomic::Ordering::SeqCst);
        self.player.stop();
    }

    /// Begins the fade-out/silence pause of the current track (§4.B, §1).
    pub fn pause(&self) {
        self.touch_activity();
        self.player.pause();
    }

    /// Cancels a pending or active pause (§4.B, §1).
    pub fn resume(&self) {
        self.touch_activity();
        self.player.resume();
    }

    /// Sets playback volume, clamped to [0, 150] (§1).
    pub fn set_volume(&self, v: u32) {
        self.player.set_volume(v);
    }

    /// Current playback position of the track under way, if any.
    #[must_use]
    pub fn get_position(&self) -> Duration {
        self.player.get_position()
    }

    // ---- Radio auto-queue (§4.C) ----

    async fn trigger_radio(&self) {
        for _ in 0..RADIO_RETRY_BOUND {
            let recent: Vec<String> = self
                .history
                .get_recent(5)
                .into_iter()
                .map(|e| e.title)
                .collect();
            let query = match self.collaborators.recommendation.recommend(&recent).await {
                Ok(q) if !q.is_empty() => q,
                _ => return,
            };
            let candidates = match self.collaborators.search.search(&query).await {
                Ok(c) => c,
                Err(_) => return,
            };
            let Some(track) = candidates.into_iter().next() else {
                return;
            };
            let in_history = self.history.contains(&track.identity);
            let in_queue = self.queue.contains_identity(&track.identity);
            if in_history || in_queue {
                continue;
            }
            self.add(track, Requester::Radio, None).await;
            return;
        }
    }

    async fn announce(&self, message: &str) {
        if let Some(channel_id) = self.voice_channel_id.read().clone() {
            self.collaborators
                .notifications
                .send_channel_message(&channel_id, message)
                .await;
        }
    }

    /// Toggles radio auto-queue at runtime (§6).
    pub fn set_radio_enabled(&self, enabled: bool) {
        self.radio_enabled
            .store(enabled, std::sync::atomic::Ordering::SeqCst);
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn state(&self) -> State {
        *self.state.read()
    }

    /// Guild identity this player is scoped to.
    #[must_use]
    pub fn guild_id(&self) -> &str {
        &self.guild_id
    }
}

impl Drop for GuildPlayer {
    fn drop(&mut self) {
        self.stop_signals.read().fire_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoopEventEmitter;
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

    fn fake_collaborators() -> Collaborators {
        Collaborators {
            locator: Arc::new(FakeLocator),
            search: Arc::new(FakeSearch),
            recommendation: Arc::new(FakeRecommendation),
            notifications: Arc::new(FakeNotifications),
            emitter: Arc::new(NoopEventEmitter),
        }
    }

    #[tokio::test]
    async fn new_guild_player_starts_idle() {
        let gp = GuildPlayer::new("guild-1", Config::default(), fake_collaborators());
        assert_eq!(gp.state(), State::Idle);
        assert!(gp.queue.is_empty());
    }

    #[tokio::test]
    async fn add_enqueues_and_emits_add_event() {
        let gp = GuildPlayer::new("guild-1", Config::default(), fake_collaborators());
        let track = Track {
            identity: TrackId::new("abc"),
            title: "Song".into(),
        };
        gp.add(track, Requester::User { id: "u1".into(), name: None }, None).await;
        assert_eq!(gp.queue.len(), 1);
    }

    #[tokio::test]
    async fn reset_clears_queue_and_state() {
        let gp = GuildPlayer::new("guild-1", Config::default(), fake_collaborators());
        let track = Track {
            identity: TrackId::new("abc"),
            title: "Song".into(),
        };
        gp.add(track, Requester::User { id: "u1".into(), name: None }, None).await;
        gp.reset().await;
        assert!(gp.queue.is_empty());
        assert_eq!(gp.state(), State::Idle);
    }

    #[tokio::test]
    async fn reset_respawns_listeners_so_add_still_dispatches() {
        let gp = GuildPlayer::new("guild-1", Config::default(), fake_collaborators());
        gp.reset().await;

        let track = Track {
            identity: TrackId::new("xyz"),
            title: "Song After Reset".into(),
        };
        gp.add(track, Requester::User { id: "u1".into(), name: None }, None).await;
        assert_eq!(gp.queue.len(), 1);

        // Give the respawned queue listener a chance to run; it drives the
        // head load once it observes the `Add` event.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
