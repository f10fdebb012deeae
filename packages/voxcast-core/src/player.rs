//! Real-time Opus streamer (§4.B).
//!
//! Consumes one [`LoadResult`] at a time and streams 20 ms Opus frames to a
//! [`VoiceConnection`] at real-time rate, with lock-free pause/stop/volume
//! control so that control operations never contend with the play loop's
//! per-frame mutex (§5 critical deadlock avoidance).

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicI64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use audiopus::coder::Encoder as OpusEncoder;
use audiopus::{Application, Channels, SampleRate};
use parking_lot::Mutex;
use tokio::io::AsyncReadExt;
use tokio::time::sleep;

use crate::error::{VoxError, VoxResult};
use crate::events::PlayerEvent;
use crate::model::LoadResult;
use crate::traits::{VoiceConnection, VoiceStatus};

/// Stereo samples per 20 ms frame at 48 kHz.
const FRAME_SAMPLES: usize = 960;
/// int16 values per frame (stereo).
const FRAME_I16: usize = FRAME_SAMPLES * 2;
/// Bytes per frame (PCM, signed 16-bit LE).
const FRAME_BYTES: usize = FRAME_I16 * 2;
/// Upper bound for one encoded Opus packet.
const OPUS_SCRATCH_BYTES: usize = 3840;
/// Frame period.
const FRAME_PERIOD: Duration = Duration::from_millis(20);
/// Frames over which pause/stop fade out, per §4.B.
const FADE_FRAMES: i32 = 5;
/// Wait before the first frame so the remote pipeline is ready (§4.B pre-roll).
const PRE_ROLL: Duration = Duration::from_millis(50);
/// Consecutive transient read errors tolerated before declaring `DecodeError`.
const MAX_READ_RETRIES: u32 = 3;

/// Lock-free playback flags/counters shared between the play loop and
/// concurrently-callable control operations (§5).
struct PlayerState {
    playing: AtomicBool,
    paused: AtomicBool,
    stopping: AtomicBool,
    volume: AtomicU8,
    position_us: AtomicI64,
    /// Frames left in the current fade-out, shared with the play loop so
    /// `pause()` can start one without taking the play mutex (§4.B, §5).
    fade_out_remaining: AtomicI32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            playing: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            stopping: AtomicBool::new(false),
            volume: AtomicU8::new(100),
            position_us: AtomicI64::new(0),
            fade_out_remaining: AtomicI32::new(0),
        }
    }
}

/// Per-guild real-time Opus player (§4.B).
pub struct Player {
    state: Arc<PlayerState>,
    play_mutex: Mutex<()>,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    /// Creates an idle player with default volume (100) and no active track.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(PlayerState::default()),
            play_mutex: Mutex::new(()),
        }
    }

    /// Runs the play loop for `result` until completion, a clean stop, or an
    /// unrecoverable error. Holds the internal play mutex for the whole
    /// track so only one `play()` is active per player at a time (§4.B, §5).
    ///
    /// # Errors
    ///
    /// Returns [`VoxError::Decode`] after 3 consecutive transient read
    /// failures in the normal (non-fade, non-pause) path.
    pub async fn play(
        &self,
        mut result: LoadResult,
        voice: Arc<dyn VoiceConnection>,
        events_tx: tokio::sync::mpsc::Sender<PlayerEvent>,
    ) -> VoxResult<()> {
        let _guard = self.play_mutex.lock();
        let identity = result.identity.clone();

        self.state.position_us.store(0, Ordering::SeqCst);
        self.state.paused.store(false, Ordering::SeqCst);
        self.state.stopping.store(false, Ordering::SeqCst);
        self.state.fade_out_remaining.store(0, Ordering::SeqCst);
        self.state.playing.store(true, Ordering::SeqCst);

        let mut encoder = OpusEncoder::new(SampleRate::Hz48000, Channels::Stereo, Application::Audio)
            .map_err(|e| VoxError::Encode { reason: e.to_string() })?;
        encoder
            .set_bitrate(audiopus::Bitrate::Max)
            .map_err(|e| VoxError::Encode { reason: e.to_string() })?;

        let _ = voice.speaking(true).await;
        sleep(PRE_ROLL).await;
        let _ = events_tx
            .send(PlayerEvent::Started {
                identity: identity.clone(),
                title: result.title.clone(),
            })
            .await;

        let mut pcm = [0i16; FRAME_I16];
        let silence_pcm = [0i16; FRAME_I16];
        let mut opus_buf = [0u8; OPUS_SCRATCH_BYTES];
        let mut read_retries: u32 = 0;
        let mut paused_reported = false;

        let outcome = loop {
            let paused_now = self.state.paused.load(Ordering::SeqCst);
            if paused_now && !paused_reported {
                paused_reported = true;
                let _ = events_tx
                    .send(PlayerEvent::Paused { identity: identity.clone() })
                    .await;
            } else if !paused_now && paused_reported {
                paused_reported = false;
                let _ = events_tx
                    .send(PlayerEvent::Resumed { identity: identity.clone() })
                    .await;
            }

            let fade_out_remaining = self.state.fade_out_remaining.load(Ordering::SeqCst);
            if fade_out_remaining > 0 {
                match read_frame(&mut result, &mut pcm).await {
                    ReadOutcome::Eof => {
                        self.state.fade_out_remaining.store(0, Ordering::SeqCst);
                        break Outcome::Completed;
                    }
                    ReadOutcome::Err(_) => {
                        self.state.fade_out_remaining.store(0, Ordering::SeqCst);
                        continue;
                    }
                    ReadOutcome::Ok => {
                        let multiplier =
                            (fade_out_remaining as f64 / FADE_FRAMES as f64).powi(3);
                        apply_gain_f64(&mut pcm, multiplier);
                        match encoder.encode(&pcm, &mut opus_buf) {
                            Ok(n) => {
                                if !safe_send(&voice, &opus_buf[..n]).await {
                                    break Outcome::Stopped;
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, %identity, "opus encode failed during fade, skipping frame");
                            }
                        }
                        let remaining = fade_out_remaining - 1;
                        self.state.fade_out_remaining.store(remaining, Ordering::SeqCst);
                        if remaining == 0 && self.state.stopping.load(Ordering::SeqCst) {
                            break Outcome::Stopped;
                        }
                    }
                }
            } else if self.state.stopping.load(Ordering::SeqCst) {
                self.state.fade_out_remaining.store(FADE_FRAMES, Ordering::SeqCst);
            } else if paused_now {
                if self.state.stopping.load(Ordering::SeqCst) {
                    self.state.paused.store(false, Ordering::SeqCst);
                    continue;
                }
                let _ = read_frame(&mut result, &mut pcm).await;
                match encoder.encode(&silence_pcm, &mut opus_buf) {
                    Ok(n) => {
                        if !safe_send(&voice, &opus_buf[..n]).await {
                            break Outcome::Stopped;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, %identity, "opus encode failed on silence frame, skipping");
                    }
                }
                sleep(FRAME_PERIOD).await;
            } else {
                match read_frame(&mut result, &mut pcm).await {
                    ReadOutcome::Eof => break Outcome::Completed,
                    ReadOutcome::Err(_) => {
                        read_retries += 1;
                        if read_retries > MAX_READ_RETRIES {
                            self.state.playing.store(false, Ordering::SeqCst);
                            let _ = events_tx
                                .send(PlayerEvent::Error {
                                    identity: identity.clone(),
                                    error: "PCM read failed 3 times".into(),
                                })
                                .await;
                            return Err(VoxError::Decode {
                                identity: identity.to_string(),
                                reason: "PCM read failed 3 times".into(),
                            });
                        }
                        continue;
                    }
                    ReadOutcome::Ok => {
                        read_retries = 0;
                        let volume = self.state.volume.load(Ordering::SeqCst);
                        if volume != 100 {
                            apply_gain_u8(&mut pcm, volume);
                        }
                        match encoder.encode(&pcm, &mut opus_buf) {
                            Ok(n) => {
                                // Advance position before the send so it stays
                                // accurate even if the send itself fails (§4.B).
                                self.state.position_us.fetch_add(
                                    FRAME_PERIOD.as_micros() as i64,
                                    Ordering::SeqCst,
                                );
                                if !safe_send(&voice, &opus_buf[..n]).await {
                                    break Outcome::Stopped;
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, %identity, "opus encode failed, skipping frame");
                            }
                        }
                    }
                }
            }
        };

        self.state.playing.store(false, Ordering::SeqCst);
        self.state.stopping.store(false, Ordering::SeqCst);
        self.state.paused.store(false, Ordering::SeqCst);

        let event = match outcome {
            Outcome::Completed => PlayerEvent::Completed { identity },
            Outcome::Stopped => PlayerEvent::Stopped { identity },
        };
        let _ = events_tx.send(event).await;
        Ok(())
    }

    /// Begins a 5-frame fade-out then raises `paused` (§4.B). The loop fades
    /// real audio down to silence before it starts emitting silence frames.
    pub fn pause(&self) {
        self.state.paused.store(true, Ordering::SeqCst);
        self.state.fade_out_remaining.store(FADE_FRAMES, Ordering::SeqCst);
    }

    /// Cancels any pending fade and lowers `paused` (§4.B). No-op on a
    /// player that isn't paused.
    pub fn resume(&self) {
        self.state.paused.store(false, Ordering::SeqCst);
        self.state.fade_out_remaining.store(0, Ordering::SeqCst);
    }

    /// Raises `stopping`; the loop fades out and exits (§4.B). Does not
    /// take the play mutex, so it is always non-blocking even while a track
    /// is playing (§5 critical deadlock avoidance).
    pub fn stop(&self) {
        self.state.stopping.store(true, Ordering::SeqCst);
    }

    /// Sets playback volume, clamped to [0, 150].
    pub fn set_volume(&self, v: u32) {
        self.state.volume.store(v.min(150) as u8, Ordering::SeqCst);
    }

    /// Current playback position; zero if not playing.
    #[must_use]
    pub fn get_position(&self) -> Duration {
        if !self.is_playing() {
            return Duration::ZERO;
        }
        Duration::from_micros(self.state.position_us.load(Ordering::SeqCst).max(0) as u64)
    }

    /// Whether a play loop is currently active.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state.playing.load(Ordering::SeqCst)
    }

    /// Whether the loop is currently emitting silence frames.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state.paused.load(Ordering::SeqCst)
    }
}

enum Outcome {
    Completed,
    Stopped,
}

enum ReadOutcome {
    Ok,
    Eof,
    Err(std::io::Error),
}

async fn read_frame(result: &mut LoadResult, pcm: &mut [i16; FRAME_I16]) -> ReadOutcome {
    let mut bytes = [0u8; FRAME_BYTES];
    let mut filled = 0;
    while filled < FRAME_BYTES {
        match result.reader.read(&mut bytes[filled..]).await {
            Ok(0) => {
                return if filled == 0 {
                    ReadOutcome::Eof
                } else {
                    ReadOutcome::Err(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "short frame at EOF",
                    ))
                };
            }
            Ok(n) => filled += n,
            Err(e) => return ReadOutcome::Err(e),
        }
    }
    for (i, chunk) in bytes.chunks_exact(2).enumerate() {
        pcm[i] = i16::from_le_bytes([chunk[0], chunk[1]]);
    }
    ReadOutcome::Ok
}

fn apply_gain_f64(pcm: &mut [i16; FRAME_I16], multiplier: f64) {
    for sample in pcm.iter_mut() {
        let scaled = (*sample as f64) * multiplier;
        *sample = scaled.clamp(i16::MIN as f64, i16::MAX as f64) as i16;
    }
}

fn apply_gain_u8(pcm: &mut [i16; FRAME_I16], volume: u8) {
    for sample in pcm.iter_mut() {
        let scaled = (*sample as i64 * volume as i64) / 100;
        *sample = scaled.clamp(i16::MIN as i64, i16::MAX as i64) as i16;
    }
}

/// Attempts to send one Opus packet, swallowing closed-sink failures rather
/// than propagating a panic or error; returns whether the send succeeded.
async fn safe_send(voice: &Arc<dyn VoiceConnection>, packet: &[u8]) -> bool {
    if voice.status() == VoiceStatus::Disconnected {
        return false;
    }
    voice.send_opus_packet(packet).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_fade_attenuates_more_near_zero() {
        let mut near_end = [1000i16; FRAME_I16];
        apply_gain_f64(&mut near_end, (1.0_f64 / 5.0).powi(3));
        let mut near_start = [1000i16; FRAME_I16];
        apply_gain_f64(&mut near_start, (5.0_f64 / 5.0).powi(3));
        assert!(near_end[0].abs() < near_start[0].abs());
    }

    #[test]
    fn volume_scaling_clamps_to_i16_range() {
        let mut pcm = [i16::MAX; FRAME_I16];
        apply_gain_u8(&mut pcm, 150);
        assert_eq!(pcm[0], i16::MAX);
    }

    #[test]
    fn default_player_is_not_playing() {
        let player = Player::new();
        assert!(!player.is_playing());
        assert!(!player.is_paused());
        assert_eq!(player.get_position(), Duration::ZERO);
    }

    #[test]
    fn set_volume_clamps_to_150() {
        let player = Player::new();
        player.set_volume(9999);
        assert_eq!(player.state.volume.load(Ordering::SeqCst), 150);
    }
}
