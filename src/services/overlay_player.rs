use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{Instant, interval_at, sleep};

use crate::config::OverlayConfig;
use crate::error::StoreError;
use crate::external::{SpeechSynthesizer, estimate_duration};
use crate::models::*;
use crate::services::QueueStore;

#[derive(Debug, Clone)]
pub struct PlaybackTimings {
    pub poll_interval: Duration,
    pub progress_tick: Duration,
    pub linger_after_end: Duration,
    pub linger_after_error: Duration,
    pub fade: Duration,
    pub chars_per_second: f64,
    pub claim_ttl: Option<Duration>,
}

impl From<&OverlayConfig> for PlaybackTimings {
    fn from(config: &OverlayConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            progress_tick: Duration::from_millis(config.progress_tick_ms.max(1)),
            linger_after_end: Duration::from_millis(config.linger_after_end_ms),
            linger_after_error: Duration::from_millis(config.linger_after_error_ms),
            fade: Duration::from_millis(config.fade_ms),
            chars_per_second: config.chars_per_second,
            claim_ttl: config.claim_ttl(),
        }
    }
}

impl Default for PlaybackTimings {
    fn default() -> Self {
        Self::from(&OverlayConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayEnd {
    Removed,
    /// Playback finished but the record could not be removed yet.
    RemovalPending(i64),
    /// Shutdown hit while speaking, the record stays claimed.
    Interrupted,
}

/// Consumer side of the alert queue. Plays one donation at a time.
#[derive(Clone)]
pub struct OverlayPlayer {
    store: QueueStore,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    timings: PlaybackTimings,
    state: Arc<watch::Sender<PlaybackSnapshot>>,
}

impl OverlayPlayer {
    pub fn new(
        store: QueueStore,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        timings: PlaybackTimings,
    ) -> Self {
        let (state, _) = watch::channel(PlaybackSnapshot::idle());
        Self {
            store,
            synthesizer,
            timings,
            state: Arc::new(state),
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.state.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.state.subscribe()
    }

    /// Claims and plays records until `shutdown` flips to true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut changes = self.store.subscribe();
        let mut pending_removal: Option<i64> = None;
        log::info!("Overlay player started on queue '{}'", self.store.key());

        loop {
            if is_shutdown(&shutdown) {
                break;
            }
            changes.borrow_and_update();

            // 上一条播完但未能移除时，先重试移除再认领下一条
            let step = match pending_removal {
                Some(id) => match self.store.remove(id).await {
                    Ok(_) => {
                        log::info!("Removed donation {id} on retry");
                        pending_removal = None;
                        continue;
                    }
                    Err(e) => Err(e),
                },
                None => self.play_next(&mut shutdown).await,
            };

            match step {
                Ok(Some(PlayEnd::Removed)) => continue,
                Ok(Some(PlayEnd::RemovalPending(id))) => pending_removal = Some(id),
                Ok(Some(PlayEnd::Interrupted)) => break,
                Ok(None) => {}
                Err(e) => log::error!("Overlay player store error: {e}"),
            }

            let stop = tokio::select! {
                _ = changes.changed() => false,
                _ = sleep(self.timings.poll_interval) => false,
                changed = shutdown.changed() => changed.is_err(),
            };
            if stop {
                break;
            }
        }

        if let Some(id) = pending_removal {
            log::warn!("Stopping with donation {id} still in the queue after playback");
        }
        self.state.send_replace(PlaybackSnapshot::idle());
        log::info!("Overlay player stopped");
    }

    /// One IDLE step: reap stale claims, then claim and play the head record.
    async fn play_next(
        &self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<Option<PlayEnd>, StoreError> {
        let now_ms = Utc::now().timestamp_millis();

        if let Some(ttl) = self.timings.claim_ttl {
            for orphan in self.store.reap_orphans(now_ms, ttl).await? {
                log::warn!(
                    "Removed orphaned donation {} from {} claimed at {:?}",
                    orphan.id,
                    orphan.username,
                    orphan.claimed_at
                );
            }
        }

        let Some(record) = self.store.claim_next(now_ms).await? else {
            return Ok(None);
        };
        self.play(record, shutdown).await.map(Some)
    }

    async fn play(
        &self,
        record: DonationRecord,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<PlayEnd, StoreError> {
        let id = record.id;
        let utterance = Utterance::for_voice(record.speech_text(), &record.voice);
        log::info!(
            "Playing donation {} ({} from {}, tier {:?})",
            id,
            record.amount,
            record.username,
            record.tier()
        );

        self.state.send_replace(PlaybackSnapshot::claimed(record));
        self.state.send_modify(|s| s.phase = PlaybackPhase::Speaking);

        let estimate = estimate_duration(utterance.len_chars(), self.timings.chars_per_second);
        let tick = self.timings.progress_tick;
        let step = if estimate.is_zero() {
            100.0
        } else {
            100.0 * tick.as_secs_f64() / estimate.as_secs_f64()
        };
        let mut ticker = interval_at(Instant::now() + tick, tick);

        let speech = self.synthesizer.speak(&utterance);
        tokio::pin!(speech);

        let result = loop {
            tokio::select! {
                result = &mut speech => break result,
                _ = ticker.tick() => {
                    self.state.send_modify(|s| s.progress = (s.progress + step).min(100.0));
                }
                _ = shutdown.changed() => {
                    self.synthesizer.cancel();
                    log::warn!("Shutdown while speaking donation {id}, leaving it claimed");
                    return Ok(PlayEnd::Interrupted);
                }
            }
        };

        let (outcome, linger) = match result {
            Ok(()) => (PlaybackOutcome::Finished, self.timings.linger_after_end),
            Err(e) => {
                log::warn!("Speech failed for donation {id}: {e}");
                (PlaybackOutcome::Failed, self.timings.linger_after_error)
            }
        };
        self.state.send_modify(|s| {
            s.phase = PlaybackPhase::Completing;
            s.outcome = Some(outcome);
            if outcome == PlaybackOutcome::Finished {
                s.progress = 100.0;
            }
        });

        // 已播完，收到关闭信号时直接跳到移除
        if self.wait_unless_shutdown(linger, shutdown).await {
            self.state.send_modify(|s| s.fading = true);
            self.wait_unless_shutdown(self.timings.fade, shutdown).await;
        }

        let removed = self.store.remove(id).await;
        self.state.send_replace(PlaybackSnapshot::idle());
        match removed {
            Ok(true) => Ok(PlayEnd::Removed),
            Ok(false) => {
                log::debug!("Donation {id} was already gone from the queue");
                Ok(PlayEnd::Removed)
            }
            Err(e) => {
                log::error!("Failed to remove donation {id} after playback: {e}");
                Ok(PlayEnd::RemovalPending(id))
            }
        }
    }

    /// Returns false if the wait was cut short by shutdown.
    async fn wait_unless_shutdown(
        &self,
        duration: Duration,
        shutdown: &mut watch::Receiver<bool>,
    ) -> bool {
        if is_shutdown(shutdown) {
            return false;
        }
        tokio::select! {
            _ = sleep(duration) => true,
            _ = shutdown.changed() => false,
        }
    }
}

/// A dropped sender counts as a shutdown request.
fn is_shutdown(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}
