use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{editor::ValidatedSession, settings::PlaybackSettings};

use super::{PlaybackSnapshot, PlaybackState, PlaybackStatus, TickOutcome};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const EVENT_CAPACITY: usize = 256;

/// Lifecycle and per-tick notifications. Every tick produces exactly one of
/// `Tick`, `SegmentChanged` or `Finished`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum PlaybackEvent {
    Started { snapshot: PlaybackSnapshot },
    Tick { snapshot: PlaybackSnapshot },
    SegmentChanged {
        from: usize,
        to: usize,
        snapshot: PlaybackSnapshot,
    },
    Paused { snapshot: PlaybackSnapshot },
    Resumed { snapshot: PlaybackSnapshot },
    Finished { snapshot: PlaybackSnapshot },
    Cancelled,
}

impl PlaybackEvent {
    pub fn snapshot(&self) -> Option<&PlaybackSnapshot> {
        match self {
            PlaybackEvent::Started { snapshot }
            | PlaybackEvent::Tick { snapshot }
            | PlaybackEvent::SegmentChanged { snapshot, .. }
            | PlaybackEvent::Paused { snapshot }
            | PlaybackEvent::Resumed { snapshot }
            | PlaybackEvent::Finished { snapshot } => Some(snapshot),
            PlaybackEvent::Cancelled => None,
        }
    }
}

struct Ticker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Drives a [`PlaybackState`] from a one-second ticker task.
///
/// The ticker exists only while playback is `Running`: it is spawned on
/// start and resume and torn down on pause, cancel and finish.
#[derive(Clone)]
pub struct PlaybackController {
    state: Arc<Mutex<Option<PlaybackState>>>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    events: broadcast::Sender<PlaybackEvent>,
    tick_interval: Duration,
    near_expiry_secs: u32,
}

impl PlaybackController {
    pub fn new(settings: &PlaybackSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(None)),
            ticker: Arc::new(Mutex::new(None)),
            events,
            tick_interval: settings.tick_interval(),
            near_expiry_secs: settings.near_expiry_secs,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Current playback snapshot, or `None` when nothing has been started
    /// (or the last run was cancelled).
    pub async fn get_snapshot(&self) -> Option<PlaybackSnapshot> {
        let guard = self.state.lock().await;
        guard
            .as_ref()
            .map(|playback| playback.snapshot_with_window(self.near_expiry_secs))
    }

    // Every operation that changes status takes the ticker slot before the
    // state and keeps it until the ticker matches the new status. The ticker
    // task itself only ever locks the state.

    pub async fn start(&self, session: &ValidatedSession) -> Result<PlaybackSnapshot> {
        let mut ticker_slot = self.ticker.lock().await;
        let snapshot = {
            let mut guard = self.state.lock().await;
            if let Some(existing) = guard.as_ref() {
                if existing.status() != PlaybackStatus::Finished {
                    bail!("playback already active");
                }
            }

            let playback = PlaybackState::new(session.segments().to_vec(), Utc::now())
                .ok_or_else(|| anyhow!("session has no segments"))?;
            let snapshot = playback.snapshot_with_window(self.near_expiry_secs);
            *guard = Some(playback);
            snapshot
        };

        self.spawn_ticker(&mut ticker_slot).await;

        log_info!(
            "Started session {} ({} segments, {}s)",
            session.session().name,
            snapshot.segment_count,
            snapshot.total_remaining
        );
        self.emit(PlaybackEvent::Started {
            snapshot: snapshot.clone(),
        });

        Ok(snapshot)
    }

    /// Pausing an already paused run changes nothing and emits nothing.
    pub async fn pause(&self) -> Result<PlaybackSnapshot> {
        let mut ticker_slot = self.ticker.lock().await;
        self.pause_with(&mut ticker_slot).await
    }

    /// Resuming a run that is not paused changes nothing and emits nothing.
    pub async fn resume(&self) -> Result<PlaybackSnapshot> {
        let mut ticker_slot = self.ticker.lock().await;
        self.resume_with(&mut ticker_slot).await
    }

    pub async fn toggle_pause(&self) -> Result<PlaybackSnapshot> {
        let mut ticker_slot = self.ticker.lock().await;
        let status = {
            let guard = self.state.lock().await;
            guard
                .as_ref()
                .map(PlaybackState::status)
                .ok_or_else(|| anyhow!("no active playback"))?
        };

        match status {
            PlaybackStatus::Running => self.pause_with(&mut ticker_slot).await,
            PlaybackStatus::Paused => self.resume_with(&mut ticker_slot).await,
            PlaybackStatus::Finished => self
                .get_snapshot()
                .await
                .ok_or_else(|| anyhow!("no active playback")),
        }
    }

    /// Stops the ticker and throws the playback state away. Cancelling with
    /// nothing running is fine.
    pub async fn cancel(&self) -> Result<()> {
        let mut ticker_slot = self.ticker.lock().await;
        let previous = self.state.lock().await.take();
        stop_ticker(&mut ticker_slot).await;
        drop(ticker_slot);

        match previous {
            Some(playback) if playback.status() != PlaybackStatus::Finished => {
                log_info!(
                    "Cancelled at segment {} of {}",
                    playback.current_index() + 1,
                    playback.segments().len()
                );
                self.emit(PlaybackEvent::Cancelled);
            }
            _ => {}
        }

        Ok(())
    }

    async fn pause_with(&self, ticker_slot: &mut Option<Ticker>) -> Result<PlaybackSnapshot> {
        let (changed, snapshot) = {
            let mut guard = self.state.lock().await;
            let playback = guard
                .as_mut()
                .ok_or_else(|| anyhow!("no active playback to pause"))?;
            let changed = playback.pause();
            (changed, playback.snapshot_with_window(self.near_expiry_secs))
        };

        if changed {
            stop_ticker(ticker_slot).await;
            log_info!(
                "Paused at segment {} with {}s left",
                snapshot.current_index + 1,
                snapshot.segment_remaining
            );
            self.emit(PlaybackEvent::Paused {
                snapshot: snapshot.clone(),
            });
        }

        Ok(snapshot)
    }

    async fn resume_with(&self, ticker_slot: &mut Option<Ticker>) -> Result<PlaybackSnapshot> {
        let (changed, snapshot) = {
            let mut guard = self.state.lock().await;
            let playback = guard
                .as_mut()
                .ok_or_else(|| anyhow!("no active playback to resume"))?;
            let changed = playback.resume();
            (changed, playback.snapshot_with_window(self.near_expiry_secs))
        };

        if changed {
            self.spawn_ticker(ticker_slot).await;
            log_info!("Resumed at segment {}", snapshot.current_index + 1);
            self.emit(PlaybackEvent::Resumed {
                snapshot: snapshot.clone(),
            });
        }

        Ok(snapshot)
    }

    async fn spawn_ticker(&self, ticker_slot: &mut Option<Ticker>) {
        stop_ticker(ticker_slot).await;

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(ticker_loop(
            self.state.clone(),
            self.events.clone(),
            self.tick_interval,
            self.near_expiry_secs,
            cancel_token.clone(),
        ));

        *ticker_slot = Some(Ticker {
            handle,
            cancel_token,
        });
    }

    fn emit(&self, event: PlaybackEvent) {
        // No subscribers is fine; events are advisory.
        let _ = self.events.send(event);
    }
}

async fn stop_ticker(ticker_slot: &mut Option<Ticker>) {
    let Some(ticker) = ticker_slot.take() else {
        return;
    };
    ticker.cancel_token.cancel();
    if let Err(err) = ticker.handle.await {
        if !err.is_cancelled() {
            log_warn!("playback ticker task failed: {err}");
        }
    }
}

async fn ticker_loop(
    state: Arc<Mutex<Option<PlaybackState>>>,
    events: broadcast::Sender<PlaybackEvent>,
    tick_interval: Duration,
    near_expiry_secs: u32,
    cancel_token: CancellationToken,
) {
    // First tick lands one full interval after (re)start, never immediately.
    let mut interval = time::interval_at(Instant::now() + tick_interval, tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                break;
            }
            _ = interval.tick() => {
                let (outcome, snapshot) = {
                    let mut guard = state.lock().await;
                    let Some(playback) = guard.as_mut() else {
                        break;
                    };
                    let outcome = playback.tick();
                    (outcome, playback.snapshot_with_window(near_expiry_secs))
                };

                let event = match outcome {
                    TickOutcome::Ignored => break,
                    TickOutcome::Counted => PlaybackEvent::Tick { snapshot },
                    TickOutcome::Advanced { from, to } => {
                        log_info!("Segment {} done, moving to segment {}", from + 1, to + 1);
                        PlaybackEvent::SegmentChanged { from, to, snapshot }
                    }
                    TickOutcome::Finished => {
                        log_info!("Session finished");
                        let _ = events.send(PlaybackEvent::Finished { snapshot });
                        break;
                    }
                };
                let _ = events.send(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::SessionEditor;
    use crate::models::{Segment, Session};
    use tokio::sync::broadcast::error::TryRecvError;

    fn validated(durations: &[u32]) -> ValidatedSession {
        let segments = durations
            .iter()
            .map(|&secs| Segment::new(secs, 4.0, 1.0))
            .collect();
        SessionEditor::new(Session::new("test", "Test", segments))
            .validate_for_playback()
            .unwrap()
    }

    fn controller() -> PlaybackController {
        PlaybackController::new(&PlaybackSettings::default())
    }

    fn counters(event: &PlaybackEvent) -> (u32, u64, usize) {
        let snapshot = event.snapshot().unwrap();
        (
            snapshot.segment_remaining,
            snapshot.total_remaining,
            snapshot.current_index,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn runs_to_completion_one_event_per_tick() {
        let controller = controller();
        let mut rx = controller.subscribe();
        let session = validated(&[2, 0, 1, 1, 1]);

        let begin = Instant::now();
        let started = controller.start(&session).await.unwrap();
        assert_eq!(
            (started.segment_remaining, started.total_remaining, started.current_index),
            (2, 5, 0)
        );

        let mut events = Vec::new();
        loop {
            let event = rx.recv().await.unwrap();
            let done = matches!(event, PlaybackEvent::Finished { .. });
            events.push(event);
            if done {
                break;
            }
        }

        assert_eq!(begin.elapsed(), Duration::from_secs(5));
        assert!(matches!(events[0], PlaybackEvent::Started { .. }));
        assert!(matches!(events[1], PlaybackEvent::Tick { .. }));
        assert_eq!(counters(&events[1]), (1, 4, 0));
        assert!(matches!(
            events[2],
            PlaybackEvent::SegmentChanged { from: 0, to: 2, .. }
        ));
        assert_eq!(counters(&events[2]), (1, 3, 2));
        assert!(matches!(
            events[3],
            PlaybackEvent::SegmentChanged { from: 2, to: 3, .. }
        ));
        assert!(matches!(
            events[4],
            PlaybackEvent::SegmentChanged { from: 3, to: 4, .. }
        ));
        assert!(matches!(events[5], PlaybackEvent::Finished { .. }));
        assert_eq!(counters(&events[5]), (0, 0, 4));
        assert_eq!(events.len(), 6);

        let finished = controller.get_snapshot().await.unwrap();
        assert_eq!(finished.status, PlaybackStatus::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_run_does_not_move() {
        let controller = controller();
        let mut rx = controller.subscribe();
        controller.start(&validated(&[10, 10, 10, 10, 10])).await.unwrap();

        rx.recv().await.unwrap();
        let tick = rx.recv().await.unwrap();
        assert_eq!(counters(&tick), (9, 49, 0));

        let paused = controller.pause().await.unwrap();
        assert_eq!(paused.status, PlaybackStatus::Paused);
        assert!(matches!(rx.recv().await.unwrap(), PlaybackEvent::Paused { .. }));

        time::sleep(Duration::from_secs(30)).await;
        let still = controller.get_snapshot().await.unwrap();
        assert_eq!((still.segment_remaining, still.total_remaining), (9, 49));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

        // Pausing again is a no-op.
        controller.pause().await.unwrap();
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

        let resumed_at = Instant::now();
        controller.resume().await.unwrap();
        assert!(matches!(rx.recv().await.unwrap(), PlaybackEvent::Resumed { .. }));
        let tick = rx.recv().await.unwrap();
        assert_eq!(resumed_at.elapsed(), Duration::from_secs(1));
        assert_eq!(counters(&tick), (8, 48, 0));

        controller.cancel().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn resume_while_running_is_noop() {
        let controller = controller();
        let mut rx = controller.subscribe();
        controller.start(&validated(&[5, 5, 5, 5, 5])).await.unwrap();
        rx.recv().await.unwrap();

        let snapshot = controller.resume().await.unwrap();
        assert_eq!(snapshot.status, PlaybackStatus::Running);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

        controller.cancel().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_switches_between_paused_and_running() {
        let controller = controller();
        controller.start(&validated(&[5, 5, 5, 5, 5])).await.unwrap();

        let paused = controller.toggle_pause().await.unwrap();
        assert_eq!(paused.status, PlaybackStatus::Paused);
        let running = controller.toggle_pause().await.unwrap();
        assert_eq!(running.status, PlaybackStatus::Running);

        controller.cancel().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_state_and_stops_ticking() {
        let controller = controller();
        let mut rx = controller.subscribe();
        controller.start(&validated(&[3, 3, 3, 3, 3])).await.unwrap();
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();

        controller.cancel().await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), PlaybackEvent::Cancelled);
        assert!(controller.get_snapshot().await.is_none());

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

        // Nothing left to cancel.
        controller.cancel().await.unwrap();
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn cannot_start_twice_while_active() {
        let controller = controller();
        let session = validated(&[3, 3, 3, 3, 3]);
        controller.start(&session).await.unwrap();

        assert!(controller.start(&session).await.is_err());
        controller.pause().await.unwrap();
        assert!(controller.start(&session).await.is_err());

        controller.cancel().await.unwrap();
        assert!(controller.start(&session).await.is_ok());
        controller.cancel().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn can_restart_after_finishing() {
        let controller = controller();
        let mut rx = controller.subscribe();
        let session = validated(&[1, 0, 0, 0, 0]);

        controller.start(&session).await.unwrap();
        while !matches!(rx.recv().await.unwrap(), PlaybackEvent::Finished { .. }) {}

        let again = controller.start(&session).await.unwrap();
        assert_eq!(again.status, PlaybackStatus::Running);
        controller.cancel().await.unwrap();
    }

    #[tokio::test]
    async fn commands_without_playback_fail() {
        let controller = controller();
        assert!(controller.pause().await.is_err());
        assert!(controller.resume().await.is_err());
        assert!(controller.toggle_pause().await.is_err());
        assert!(controller.cancel().await.is_ok());
        assert!(controller.get_snapshot().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlapping_pause_and_resume_keep_ticker_in_step() {
        let settings = PlaybackSettings {
            tick_interval_ms: 60_000,
            ..PlaybackSettings::default()
        };
        let controller = PlaybackController::new(&settings);
        let session = validated(&[600, 600, 600, 600, 600]);

        for round in 0..300 {
            controller.start(&session).await.unwrap();
            controller.pause().await.unwrap();

            let resumer = controller.clone();
            let flipper = controller.clone();
            let (a, b) = tokio::join!(
                tokio::spawn(async move { resumer.resume().await }),
                tokio::spawn(async move {
                    flipper.resume().await?;
                    flipper.pause().await
                }),
            );
            a.unwrap().unwrap();
            b.unwrap().unwrap();

            let status = controller.get_snapshot().await.unwrap().status;
            let ticking = controller
                .ticker
                .lock()
                .await
                .as_ref()
                .is_some_and(|ticker| !ticker.handle.is_finished());
            assert_eq!(
                ticking,
                status == PlaybackStatus::Running,
                "round {round}: status {status:?}, ticker alive {ticking}"
            );

            controller.cancel().await.unwrap();
            assert!(controller.ticker.lock().await.is_none());
        }
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_value(PlaybackEvent::Cancelled).unwrap();
        assert_eq!(json, serde_json::json!({ "event": "cancelled" }));
    }
}
