use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use mandelband_core::{TileKernel, Viewport};

use crate::assembler::ImageAssembler;
use crate::messages::{DispatchMessage, WorkerEvent};
use crate::tile::{build_tiles, RenderRequest, BAND_HEIGHT};
use crate::worker::WorkerPool;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What happens to the compute pool when a render is superseded mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelPolicy {
    /// Retire the whole pool and spawn a fresh one. Queued tiles are
    /// abandoned and late results have no channel to arrive on.
    #[default]
    Respawn,
    /// Keep the pool. Workers skip queued tiles of old generations and any
    /// tile already in hand is discarded on arrival.
    Retain,
}

/// Pool size matching the host's available parallelism (at least 1).
pub fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Number of compute threads. Zero means [`default_pool_size`].
    pub pool_size: usize,
    pub band_height: u32,
    pub cancel_policy: CancelPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            band_height: BAND_HEIGHT,
            cancel_policy: CancelPolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// A frame whose every tile has landed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletedFrame {
    pub generation: u64,
    pub viewport: Viewport,
    pub elapsed: Duration,
}

/// What one call to [`TileScheduler::poll`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PollOutcome {
    /// Tiles of the current generation written to the raster.
    pub applied: usize,
    /// Tiles of older generations dropped unseen.
    pub discarded: usize,
    /// Set when this poll landed the last tile of the current frame.
    pub completed: Option<CompletedFrame>,
}

impl PollOutcome {
    fn merge(&mut self, other: PollOutcome) {
        self.applied += other.applied;
        self.discarded += other.discarded;
        if other.completed.is_some() {
            self.completed = other.completed;
        }
    }
}

/// The scheduler's view of the current generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameStatus {
    Idle,
    Rendering { generation: u64, remaining: usize },
    Complete { generation: u64 },
}

struct ActiveRender {
    generation: u64,
    request: RenderRequest,
    outstanding: usize,
    started: Instant,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Splits frames into bands, farms them out to a compute pool, and composites
/// whatever comes back for the current generation.
///
/// Every call to [`start_render`](Self::start_render) or
/// [`cancel`](Self::cancel) advances the generation. Results are tagged with
/// the generation they were dispatched under, and anything not matching the
/// current one is dropped before it reaches the [`ImageAssembler`].
///
/// The scheduler lives on the control thread. [`poll`](Self::poll) never
/// blocks and is meant to be called once per display refresh.
pub struct TileScheduler<K: TileKernel + 'static> {
    kernel: Arc<K>,
    config: SchedulerConfig,
    pool: WorkerPool,
    events_tx: mpsc::Sender<WorkerEvent>,
    events: mpsc::Receiver<WorkerEvent>,
    live_generation: Arc<AtomicU64>,
    generation: u64,
    active: Option<ActiveRender>,
    last_completed: Option<u64>,
}

impl<K: TileKernel + 'static> TileScheduler<K> {
    /// Spawn the compute pool. Failure to start any worker is fatal.
    pub fn new(kernel: K, config: SchedulerConfig) -> crate::Result<Self> {
        let config = SchedulerConfig {
            pool_size: if config.pool_size == 0 {
                default_pool_size()
            } else {
                config.pool_size
            },
            ..config
        };
        if config.band_height == 0 {
            return Err(crate::RenderError::InvalidBandHeight(0));
        }

        let kernel = Arc::new(kernel);
        let live_generation = Arc::new(AtomicU64::new(0));
        let (events_tx, events) = mpsc::channel();
        let pool = WorkerPool::spawn(config.pool_size, &kernel, &live_generation, &events_tx)?;

        Ok(Self {
            kernel,
            config,
            pool,
            events_tx,
            events,
            live_generation,
            generation: 0,
            active: None,
            last_completed: None,
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The current generation. Zero until the first render.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn status(&self) -> FrameStatus {
        match (&self.active, self.last_completed) {
            (Some(active), _) => FrameStatus::Rendering {
                generation: active.generation,
                remaining: active.outstanding,
            },
            (None, Some(generation)) if generation == self.generation => {
                FrameStatus::Complete { generation }
            }
            _ => FrameStatus::Idle,
        }
    }

    /// Begin rendering `request`, superseding whatever was in flight.
    ///
    /// Returns the new generation. The generation advances even if the
    /// request is then rejected, so nothing older can land afterward.
    pub fn start_render(&mut self, request: RenderRequest) -> crate::Result<u64> {
        let generation = self.advance()?;
        request.validate()?;

        let tiles = build_tiles(&request, self.config.band_height, generation)?;
        debug!(
            generation,
            tiles = tiles.len(),
            width = request.width,
            height = request.height,
            scale = request.viewport.scale,
            "Starting banded render"
        );

        for (i, tile) in tiles.iter().enumerate() {
            let worker = i % self.pool.len();
            let msg = DispatchMessage::calc_area(tile, request.max_iterations);
            if self.pool.dispatch(worker, msg).is_err() {
                warn!(
                    generation,
                    worker,
                    y_start = tile.y_start,
                    "Worker unavailable; band left stale"
                );
                // The next render rebuilds the pool.
                self.pool.mark_dead(worker);
            }
        }

        self.active = Some(ActiveRender {
            generation,
            request,
            outstanding: tiles.len(),
            started: Instant::now(),
        });
        Ok(generation)
    }

    /// Abandon the current render without starting another.
    ///
    /// Used when a cached snapshot replaces the frame outright.
    pub fn cancel(&mut self) -> crate::Result<u64> {
        let generation = self.advance()?;
        debug!(generation, "Render cancelled");
        Ok(generation)
    }

    /// Bump the generation and deal with any work still in flight.
    fn advance(&mut self) -> crate::Result<u64> {
        self.generation += 1;
        self.live_generation.store(self.generation, Ordering::Release);

        let interrupted = self.active.take().filter(|a| a.outstanding > 0);
        if let Some(old) = &interrupted {
            debug!(
                generation = old.generation,
                remaining = old.outstanding,
                "Superseding in-flight render"
            );
        }

        let respawn = (interrupted.is_some()
            && self.config.cancel_policy == CancelPolicy::Respawn)
            || self.pool.has_dead_workers();
        if respawn {
            self.respawn_pool()?;
        }
        Ok(self.generation)
    }

    fn respawn_pool(&mut self) -> crate::Result<()> {
        let (events_tx, events) = mpsc::channel();
        let pool = WorkerPool::spawn(
            self.config.pool_size,
            &self.kernel,
            &self.live_generation,
            &events_tx,
        )?;
        // Dropping the old pool retires its workers; dropping the old
        // receiver makes their late sends fail.
        self.pool = pool;
        self.events_tx = events_tx;
        self.events = events;
        Ok(())
    }

    /// Composite everything that has arrived so far. Never blocks.
    pub fn poll(&mut self, assembler: &mut ImageAssembler) -> PollOutcome {
        let mut outcome = PollOutcome::default();
        while let Ok(event) = self.events.try_recv() {
            outcome.merge(self.handle_event(event, assembler));
        }
        outcome
    }

    /// Block until the current frame completes or `timeout` elapses,
    /// compositing as results arrive.
    pub fn wait_frame(
        &mut self,
        assembler: &mut ImageAssembler,
        timeout: Duration,
    ) -> PollOutcome {
        let deadline = Instant::now() + timeout;
        let mut outcome = PollOutcome::default();
        while self.active.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events.recv_timeout(remaining) {
                Ok(event) => outcome.merge(self.handle_event(event, assembler)),
                Err(_) => break,
            }
        }
        outcome
    }

    pub(crate) fn handle_event(
        &mut self,
        event: WorkerEvent,
        assembler: &mut ImageAssembler,
    ) -> PollOutcome {
        let mut outcome = PollOutcome::default();
        match event {
            WorkerEvent::Completed(msg) => {
                let tile = msg.dispatch.tile();
                let active = match &mut self.active {
                    Some(active) if active.generation == tile.generation => active,
                    _ => {
                        debug!(
                            generation = tile.generation,
                            current = self.generation,
                            y_start = tile.y_start,
                            "Discarding stale tile"
                        );
                        outcome.discarded = 1;
                        return outcome;
                    }
                };

                if let Err(err) =
                    assembler.apply_tile(&tile, &msg.result, active.request.max_iterations)
                {
                    error!(generation = tile.generation, "Dropping malformed tile: {err}");
                    return outcome;
                }
                outcome.applied = 1;
                active.outstanding -= 1;

                if active.outstanding == 0 {
                    let elapsed = active.started.elapsed();
                    info!(
                        generation = active.generation,
                        elapsed_ms = elapsed.as_millis(),
                        "Frame complete"
                    );
                    outcome.completed = Some(CompletedFrame {
                        generation: active.generation,
                        viewport: active.request.viewport,
                        elapsed,
                    });
                    self.last_completed = Some(active.generation);
                    self.active = None;
                }
            }
            WorkerEvent::Failed {
                worker,
                generation,
                error,
            } => {
                error!(worker, generation, "Compute worker lost: {error}");
                self.pool.mark_dead(worker);
            }
        }
        outcome
    }
}
