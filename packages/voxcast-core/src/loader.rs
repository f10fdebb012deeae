//! Stream loader: supervises the external transcoder subprocess that turns a
//! stream URL into a raw PCM byte stream (§4.A).
//!
//! Grounded on the serenity voice pipeline's `ChildContainer`/`Drop`-kills
//! pattern: the transcoder is a child process piping signed-16-bit LE PCM on
//! stdout, and the reader handed to callers owns that child for its entire
//! lifetime.

use std::io;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use parking_lot::Mutex as SyncMutex;
use tokio::io::{AsyncRead, ReadBuf};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::events::{EventEmitter, LoaderEvent};
use crate::model::{LoadJob, LoadResult, PcmReader, TrackId};

/// Hard ceiling on how long the transcoder subprocess gets to prove it is
/// alive and streaming before the load is declared failed (§4.A).
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// The Loader's primary notification stream (§2 component E, §4.A).
///
/// Unlike [`LoaderEvent`] (a lightweight, `Serialize`-able event used purely
/// for observability), `LoadOutcome` carries the actual one-shot
/// [`LoadResult`] so the load listener can attach it to the matching queue
/// item (§4.C).
pub enum LoadOutcome {
    /// The transcoder subprocess has been spawned for this identity.
    Loading {
        /// Track identity being loaded.
        identity: TrackId,
    },
    /// The transcoder produced a usable stream.
    Loaded(LoadResult),
    /// The load failed (spawn failure, crash, 30 s timeout, empty stream).
    LoadError {
        /// Track identity that failed to load.
        identity: TrackId,
        /// Human-readable error, with captured stderr appended where available.
        error: String,
    },
    /// The load was pre-empted by [`Loader::cancel`].
    LoadCanceled {
        /// Track identity whose load was canceled.
        identity: TrackId,
    },
}

/// Wraps a spawned transcoder child process and its stdout pipe.
///
/// `Drop` kills the child unconditionally, which is what makes `LoadResult`'s
/// reader a true one-shot resource: whether the caller reads it to EOF,
/// drops it after partial consumption, or never touches it, the subprocess
/// is always reaped (§3, §9).
struct TranscoderReader {
    stdout: ChildStdout,
    child: Child,
}

impl AsyncRead for TranscoderReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stdout).poll_read(cx, buf)
    }
}

impl Drop for TranscoderReader {
    fn drop(&mut self) {
        if let Err(err) = self.child.start_kill() {
            tracing::debug!(?err, "transcoder child already exited");
        }
    }
}

/// Replays the probe bytes read while confirming the subprocess is alive,
/// before delegating the rest of the stream to the transcoder reader.
struct PrefixedReader {
    prefix: Option<Vec<u8>>,
    inner: TranscoderReader,
}

impl AsyncRead for PrefixedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if let Some(mut prefix) = self.prefix.take() {
            if !prefix.is_empty() {
                let n = prefix.len().min(buf.remaining());
                buf.put_slice(&prefix[..n]);
                if n < prefix.len() {
                    self.prefix = Some(prefix.split_off(n));
                }
                return Poll::Ready(Ok(()));
            }
        }
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

/// Spawns a transcoder subprocess for `stream_url`, following §6's argument
/// contract: signed 16-bit LE PCM, 48 kHz, stereo, resampled, stdout piped,
/// stderr captured for diagnostics.
fn spawn_transcoder(stream_url: &str) -> io::Result<Child> {
    Command::new("ffmpeg")
        .args([
            "-loglevel", "error",
            "-i", stream_url,
            "-f", "s16le",
            "-ar", "48000",
            "-ac", "2",
            "pipe:1",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
}

async fn capture_stderr(stderr: Option<tokio::process::ChildStderr>) -> String {
    use tokio::io::AsyncReadExt;
    let Some(mut stderr) = stderr else {
        return String::new();
    };
    let mut buf = Vec::new();
    let _ = stderr.read_to_end(&mut buf).await;
    if buf.is_empty() {
        String::new()
    } else {
        format!(": {}", String::from_utf8_lossy(&buf))
    }
}

async fn run_load(job: LoadJob) -> Result<(PcmReader, Duration), String> {
    let start = Instant::now();
    let mut child = spawn_transcoder(&job.stream_url).map_err(|e| format!("spawn failed: {e}"))?;
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| "transcoder stdout not piped".to_string())?;
    let stderr = child.stderr.take();

    // A transcoder that never produces a readable stdout within the timeout
    // is as good as dead; race the first byte against the hard ceiling so a
    // hung subprocess doesn't block the loader indefinitely.
    let mut probe = [0u8; 1];
    let read_result = timeout(
        LOAD_TIMEOUT,
        tokio::io::AsyncReadExt::read(&mut stdout, &mut probe),
    )
    .await;

    match read_result {
        Err(_) => {
            let _ = child.start_kill();
            Err("transcoder timed out before producing audio".to_string())
        }
        Ok(Err(e)) => {
            let _ = child.start_kill();
            Err(format!("transcoder read error: {e}"))
        }
        Ok(Ok(0)) => {
            let stderr_text = capture_stderr(stderr).await;
            let _ = child.start_kill();
            Err(format!("transcoder produced an empty stream{stderr_text}"))
        }
        Ok(Ok(n)) => {
            let prefix = probe[..n].to_vec();
            let reader: PcmReader = Box::new(PrefixedReader {
                prefix: Some(prefix),
                inner: TranscoderReader { stdout, child },
            });
            Ok((reader, start.elapsed()))
        }
    }
}

/// Supervises exactly one outstanding transcoder load at a time (§4.A).
///
/// Serialized by an internal mutex holding the in-flight job's task handle;
/// starting a new load cancels whatever was outstanding, matching the
/// contract "exactly one outstanding load per Loader".
pub struct Loader {
    outcomes_tx: SyncMutex<mpsc::Sender<LoadOutcome>>,
    emitter: Arc<dyn EventEmitter>,
    inflight: SyncMutex<Option<(TrackId, tokio::task::JoinHandle<()>)>>,
}

impl Loader {
    /// Creates a loader that publishes load outcomes on `outcomes_tx`
    /// (buffered per §4.C, capacity >= 100 recommended) and lightweight
    /// observability events via `emitter`.
    #[must_use]
    pub fn new(outcomes_tx: mpsc::Sender<LoadOutcome>, emitter: Arc<dyn EventEmitter>) -> Self {
        Self {
            outcomes_tx: SyncMutex::new(outcomes_tx),
            emitter,
            inflight: SyncMutex::new(None),
        }
    }

    /// Rebinds the loader to a freshly created outcomes channel. Used when a
    /// [`crate::guild_player::GuildPlayer`] recreates its listener
    /// infrastructure on `reset()`; any load already in flight keeps sending
    /// to whichever sender it captured when it started.
    pub fn rebind_outcomes(&self, outcomes_tx: mpsc::Sender<LoadOutcome>) {
        *self.outcomes_tx.lock() = outcomes_tx;
    }

    /// Starts loading `job`, spawning the transcoder and emitting
    /// `Loading` then exactly one terminal outcome (§4.A contract).
    pub fn load(&self, job: LoadJob) {
        self.cancel();
        let outcomes_tx = self.outcomes_tx.lock().clone();
        let emitter = self.emitter.clone();
        let identity = job.identity.clone();
        let title = job.title.clone();
        let handle = tokio::spawn({
            let identity = identity.clone();
            async move {
                emitter.emit_loader(LoaderEvent::Loading {
                    identity: identity.clone(),
                });
                let _ = outcomes_tx
                    .send(LoadOutcome::Loading {
                        identity: identity.clone(),
                    })
                    .await;

                match run_load(job).await {
                    Ok((reader, elapsed)) => {
                        let result = LoadResult {
                            identity: identity.clone(),
                            title,
                            reader,
                            elapsed,
                        };
                        emitter.emit_loader(LoaderEvent::Loaded {
                            identity: identity.clone(),
                            title: result.title.clone(),
                            elapsed_ms: elapsed.as_millis() as u64,
                        });
                        let _ = outcomes_tx.send(LoadOutcome::Loaded(result)).await;
                    }
                    Err(error) => {
                        emitter.emit_loader(LoaderEvent::LoadError {
                            identity: identity.clone(),
                            error: error.clone(),
                        });
                        let _ = outcomes_tx
                            .send(LoadOutcome::LoadError { identity, error })
                            .await;
                    }
                }
            }
        });
        *self.inflight.lock() = Some((identity, handle));
    }

    /// Pre-empts the current load, killing its subprocess and emitting
    /// `LoadCanceled`.
    pub fn cancel(&self) {
        if let Some((identity, handle)) = self.inflight.lock().take() {
            handle.abort();
            self.emitter
                .emit_loader(LoaderEvent::LoadCanceled { identity: identity.clone() });
            let outcomes_tx = self.outcomes_tx.lock().clone();
            tokio::spawn(async move {
                let _ = outcomes_tx.send(LoadOutcome::LoadCanceled { identity }).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawn_transcoder_with_bad_binary_errors_immediately() {
        let result = Command::new("voxcast-definitely-not-a-real-binary")
            .stdout(Stdio::piped())
            .spawn();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn loader_cancel_without_inflight_load_is_a_no_op() {
        let (tx, _rx) = mpsc::channel(8);
        let loader = Loader::new(tx, Arc::new(crate::events::NoopEventEmitter));
        loader.cancel();
    }
}
