//! Runs animation timelines on tokio timers.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, instrument};

use super::animation::{AnimationBoard, AnimationSnapshot};
use super::timeline::{Cue, Timeline};
use crate::error::{Error, Result};
use crate::telemetry;

/// Timer tasks and cancel signal of the run in progress
#[derive(Debug)]
struct ActiveRun {
    generation: u64,
    handles: Vec<JoinHandle<()>>,
    cancel: oneshot::Sender<()>,
}

impl ActiveRun {
    fn abort(self) -> usize {
        let count = self.handles.len();
        for handle in self.handles {
            handle.abort();
        }
        let _ = self.cancel.send(());
        count
    }
}

/// Plays one timeline at a time on an [`AnimationBoard`].
///
/// Every cue task belongs to the run that spawned it. Starting a run
/// supersedes the previous one; completion, cancellation and supersession all
/// abort the run's tasks.
#[derive(Debug, Default)]
pub struct AnimationScheduler {
    board: AnimationBoard,
    active: Mutex<Option<ActiveRun>>,
}

impl AnimationScheduler {
    /// Scheduler writing to `board`
    pub fn new(board: AnimationBoard) -> Self {
        Self {
            board,
            active: Mutex::new(None),
        }
    }

    /// The board this scheduler drives
    pub fn board(&self) -> &AnimationBoard {
        &self.board
    }

    /// Current flags
    pub async fn snapshot(&self) -> AnimationSnapshot {
        self.board.snapshot().await
    }

    /// Whether a run is in progress
    pub async fn is_running(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Play `timeline` and resolve after `total`.
    ///
    /// Returns [`Error::Cancelled`] if the run is cancelled or superseded
    /// before `total` elapses.
    #[instrument(skip(self, timeline), fields(cues = timeline.len()))]
    pub async fn run(&self, timeline: Timeline, total: Duration) -> Result<()> {
        let _span_guard = telemetry::span_duration("animation_run");
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let generation = {
            let mut active = self.active.lock().await;
            if let Some(previous) = active.take() {
                let previous_generation = previous.generation;
                let aborted = previous.abort();
                debug!(
                    "Superseded run {} ({} timers aborted)",
                    previous_generation, aborted
                );
            }

            let generation = self.board.begin_generation().await;
            let handles = timeline
                .into_cues()
                .into_iter()
                .map(|cue| spawn_cue(self.board.clone(), generation, cue))
                .collect::<Vec<_>>();

            debug!("Started run {} with {} timers", generation, handles.len());
            *active = Some(ActiveRun {
                generation,
                handles,
                cancel: cancel_tx,
            });
            generation
        };

        tokio::select! {
            _ = time::sleep(total) => {
                self.finish(generation).await;
                Ok(())
            }
            _ = cancel_rx => {
                debug!("Run {} cancelled", generation);
                Err(Error::Cancelled)
            }
        }
    }

    /// Cancel the run in progress. Returns whether there was one.
    #[instrument(skip(self))]
    pub async fn cancel(&self) -> bool {
        let mut active = self.active.lock().await;
        let Some(run) = active.take() else {
            return false;
        };

        let aborted = run.abort();
        // stale cue tasks that already passed their abort point see a new generation
        let generation = self.board.begin_generation().await;
        telemetry::add_metrics(HashMap::from([("animation_timers_aborted", aborted as f64)]));
        debug!("Cancelled run, board now at generation {}", generation);
        true
    }

    async fn finish(&self, generation: u64) {
        let mut active = self.active.lock().await;
        if active.as_ref().map(|run| run.generation) != Some(generation) {
            return;
        }
        if let Some(run) = active.take() {
            run.abort();
        }
        self.board.clear_simulation(generation).await;
    }
}

fn spawn_cue(board: AnimationBoard, generation: u64, cue: Cue) -> JoinHandle<()> {
    tokio::spawn(async move {
        time::sleep(cue.at).await;
        if !board.set(generation, &cue.flag, true).await {
            return;
        }
        time::sleep(cue.hold).await;
        board.set(generation, &cue.flag, false).await;
    })
}
