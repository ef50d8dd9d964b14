//! Fixed-interval evaluation loop.
//!
//! Each tick awaits one detection, evaluates every face against the debouncer
//! and renders the overlay. A pass always completes before the next tick is
//! taken, so a slow detector delays ticks instead of overlapping them. The
//! shutdown future is raced against the pass itself, so a stalled detector
//! cannot hold the loop open.

use crate::engine::{EngineError, EngineHandle};
use crate::render::Renderer;
use facelabel_core::{compose_frame, RandomSource, StatusDebouncer, StdRandom};
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::MissedTickBehavior;

#[derive(Error, Debug)]
pub enum TickError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("render failed: {0}")]
    Render(#[from] std::io::Error),
}

/// Counters for a tick loop run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Ticks that rendered an overlay.
    pub frames: u64,
    /// Ticks abandoned because detection or rendering failed.
    pub skipped: u64,
    /// Passes that took longer than the tick interval.
    pub overruns: u64,
    pub worst_case: Duration,
}

pub struct Ticker<Rd, R = StdRandom> {
    engine: EngineHandle,
    debouncer: StatusDebouncer<R>,
    renderer: Rd,
    interval: Duration,
    tick: u64,
    stats: TickStats,
}

impl<Rd: Renderer, R: RandomSource + Clone> Ticker<Rd, R> {
    pub fn new(
        engine: EngineHandle,
        debouncer: StatusDebouncer<R>,
        renderer: Rd,
        interval: Duration,
    ) -> Self {
        Self {
            engine,
            debouncer,
            renderer,
            interval,
            tick: 0,
            stats: TickStats::default(),
        }
    }

    pub fn debouncer(&self) -> &StatusDebouncer<R> {
        &self.debouncer
    }

    pub fn renderer(&self) -> &Rd {
        &self.renderer
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// One evaluation pass. Returns the number of faces rendered.
    ///
    /// On error nothing is rendered and the debouncer is untouched.
    pub async fn tick_once(&mut self) -> Result<usize, TickError> {
        self.tick += 1;
        let records = self.engine.detect().await?;
        let snapshot = self.debouncer.clone();
        let frame = compose_frame(self.tick, &records, &mut self.debouncer);
        if let Err(err) = self.renderer.render(&frame) {
            self.debouncer = snapshot;
            return Err(err.into());
        }
        Ok(frame.face_count())
    }

    /// Tick every interval until `shutdown` resolves or detection ends.
    pub async fn run<F: Future<Output = ()>>(&mut self, shutdown: F) -> TickStats {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            policy = %self.debouncer.policy(),
            "tick loop started"
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                _ = interval.tick() => {}
            }

            let started = Instant::now();
            let result = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested during pass");
                    break;
                }
                result = self.tick_once() => result,
            };
            self.record_elapsed(started.elapsed());

            match result {
                Ok(faces) => {
                    self.stats.frames += 1;
                    tracing::trace!(tick = self.tick, faces, "tick rendered");
                }
                Err(TickError::Engine(err)) if err.is_end_of_stream() => {
                    tracing::info!(tick = self.tick, "detection stream ended");
                    break;
                }
                Err(TickError::Engine(EngineError::ChannelClosed)) => {
                    tracing::error!("engine thread gone; stopping");
                    break;
                }
                Err(err) => {
                    self.stats.skipped += 1;
                    tracing::warn!(tick = self.tick, error = %err, "tick skipped");
                }
            }
        }

        tracing::info!(
            frames = self.stats.frames,
            skipped = self.stats.skipped,
            overruns = self.stats.overruns,
            "tick loop stopped"
        );
        self.stats.clone()
    }

    fn record_elapsed(&mut self, elapsed: Duration) {
        if elapsed > self.interval {
            self.stats.overruns += 1;
        }
        if elapsed > self.stats.worst_case {
            self.stats.worst_case = elapsed;
        }
    }
}
