use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, error};

use mandelband_core::TileKernel;

use crate::error::RenderError;
use crate::messages::{DispatchMessage, ResultMessage, WorkerEvent, CALC_AREA};

/// Run one dispatch through the kernel.
///
/// The worker derives the band's own plane origin from `y_start`, so the
/// kernel always sees absolute coordinates.
pub fn handle_dispatch<K: TileKernel + ?Sized>(
    kernel: &K,
    msg: DispatchMessage,
) -> crate::Result<ResultMessage> {
    if msg.method != CALC_AREA {
        return Err(RenderError::UnknownMethod(msg.method));
    }
    let args = msg.args;
    let origin_y = args.y_start as f64 / args.scale + args.offset_y;
    let result = kernel.compute_tile(
        args.width,
        args.height,
        args.offset_x,
        origin_y,
        args.scale,
        args.i_max,
    );
    Ok(ResultMessage {
        dispatch: msg,
        result,
    })
}

struct WorkerHandle {
    jobs: mpsc::Sender<DispatchMessage>,
    join: Option<JoinHandle<()>>,
    alive: bool,
}

/// A fixed set of compute threads fed round-robin by the scheduler.
///
/// Every worker shares one event channel back to the control thread. Before
/// starting a job a worker checks two things: that its pool has not been
/// retired, and that the job's generation is still the live one. Either
/// failing drops the job unseen.
pub(crate) struct WorkerPool {
    workers: Vec<WorkerHandle>,
    retired: Arc<AtomicBool>,
}

impl WorkerPool {
    pub(crate) fn spawn<K: TileKernel + 'static>(
        size: usize,
        kernel: &Arc<K>,
        live_generation: &Arc<AtomicU64>,
        events: &mpsc::Sender<WorkerEvent>,
    ) -> crate::Result<Self> {
        let retired = Arc::new(AtomicBool::new(false));
        let mut workers = Vec::with_capacity(size);

        for index in 0..size.max(1) {
            let (job_tx, job_rx) = mpsc::channel::<DispatchMessage>();
            let kernel = Arc::clone(kernel);
            let live = Arc::clone(live_generation);
            let retired_flag = Arc::clone(&retired);
            let events = events.clone();

            let join = std::thread::Builder::new()
                .name(format!("compute-{index}"))
                .spawn(move || run_worker(index, kernel, job_rx, events, live, retired_flag))
                .map_err(|source| RenderError::WorkerSpawn { index, source })?;

            workers.push(WorkerHandle {
                jobs: job_tx,
                join: Some(join),
                alive: true,
            });
        }

        debug!(workers = workers.len(), "Spawned compute pool");
        Ok(Self { workers, retired })
    }

    pub(crate) fn len(&self) -> usize {
        self.workers.len()
    }

    /// Queue `msg` on worker `index`. Hands the message back if that worker
    /// is gone.
    pub(crate) fn dispatch(
        &self,
        index: usize,
        msg: DispatchMessage,
    ) -> Result<(), DispatchMessage> {
        let worker = &self.workers[index];
        if !worker.alive {
            return Err(msg);
        }
        worker.jobs.send(msg).map_err(|e| e.0)
    }

    pub(crate) fn mark_dead(&mut self, index: usize) {
        if let Some(worker) = self.workers.get_mut(index) {
            worker.alive = false;
        }
    }

    /// True if any worker reported a failure or its thread has exited.
    pub(crate) fn has_dead_workers(&self) -> bool {
        self.workers.iter().any(|w| {
            !w.alive || w.join.as_ref().map_or(true, |j| j.is_finished())
        })
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Workers finish the tile in hand, then see the flag and exit. Their
        // join handles are detached rather than awaited so the control thread
        // never blocks on a long tile.
        self.retired.store(true, Ordering::Release);
        for worker in &mut self.workers {
            worker.join.take();
        }
    }
}

fn run_worker<K: TileKernel>(
    index: usize,
    kernel: Arc<K>,
    jobs: mpsc::Receiver<DispatchMessage>,
    events: mpsc::Sender<WorkerEvent>,
    live_generation: Arc<AtomicU64>,
    retired: Arc<AtomicBool>,
) {
    debug!(worker = index, "Compute worker started");
    while let Ok(msg) = jobs.recv() {
        if retired.load(Ordering::Acquire) {
            break;
        }
        let generation = msg.render_generation;
        if generation != live_generation.load(Ordering::Acquire) {
            debug!(worker = index, generation, "Skipping superseded tile");
            continue;
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            handle_dispatch(kernel.as_ref(), msg)
        }))
        .unwrap_or_else(|payload| Err(RenderError::KernelPanic(panic_message(&*payload))));
        match outcome {
            Ok(result) => {
                if events.send(WorkerEvent::Completed(result)).is_err() {
                    break;
                }
            }
            Err(err) => {
                error!(worker = index, generation, "Compute worker failed: {err}");
                let _ = events.send(WorkerEvent::Failed {
                    worker: index,
                    generation,
                    error: err,
                });
                break;
            }
        }
    }
    debug!(worker = index, "Compute worker exiting");
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mandelband_core::{EscapeTime, Viewport};

    use super::*;
    use crate::tile::Tile;

    /// Fills every pixel with its canvas row, so band placement is visible.
    struct RowKernel;

    impl TileKernel for RowKernel {
        fn compute_tile(
            &self,
            width: u32,
            height: u32,
            _offset_x: f64,
            offset_y: f64,
            scale: f64,
            _max_iterations: u32,
        ) -> Vec<u32> {
            (0..height)
                .flat_map(|py| {
                    let row = (offset_y * scale).round() as u32 + py;
                    std::iter::repeat(row).take(width as usize)
                })
                .collect()
        }
    }

    fn dispatch(generation: u64, y_start: u32) -> DispatchMessage {
        let tile = Tile {
            y_start,
            width: 3,
            height: 2,
            viewport: Viewport::new(0.0, 0.0, 1.0).unwrap(),
            generation,
        };
        DispatchMessage::calc_area(&tile, 100)
    }

    #[test]
    fn handle_dispatch_uses_band_origin() {
        let result = handle_dispatch(&RowKernel, dispatch(1, 40)).unwrap();
        assert_eq!(result.result, vec![40, 40, 40, 41, 41, 41]);
        assert_eq!(result.dispatch.args.y_start, 40);
    }

    #[test]
    fn handle_dispatch_matches_direct_kernel_call() {
        let vp = Viewport::default_for(16, 16);
        let tile = Tile {
            y_start: 8,
            width: 16,
            height: 4,
            viewport: vp,
            generation: 1,
        };
        let msg = DispatchMessage::calc_area(&tile, 64);
        let via_worker = handle_dispatch(&EscapeTime, msg).unwrap().result;
        let direct = EscapeTime.compute_tile(16, 4, vp.offset_x, tile.origin_y(), vp.scale, 64);
        assert_eq!(via_worker, direct);
    }

    #[test]
    fn unknown_method_is_an_error() {
        let mut msg = dispatch(1, 0);
        msg.method = "calc_everything".into();
        assert!(matches!(
            handle_dispatch(&RowKernel, msg),
            Err(RenderError::UnknownMethod(m)) if m == "calc_everything"
        ));
    }

    #[test]
    fn unknown_method_kills_only_that_worker() {
        let live = Arc::new(AtomicU64::new(1));
        let (tx, rx) = mpsc::channel();
        let mut pool = WorkerPool::spawn(2, &Arc::new(RowKernel), &live, &tx).unwrap();

        let mut bad = dispatch(1, 0);
        bad.method = "bogus".into();
        pool.dispatch(0, bad).unwrap();
        pool.dispatch(1, dispatch(1, 10)).unwrap();

        let mut failed = None;
        let mut completed = None;
        for _ in 0..2 {
            match rx.recv_timeout(Duration::from_secs(10)).unwrap() {
                WorkerEvent::Failed { worker, .. } => failed = Some(worker),
                WorkerEvent::Completed(msg) => completed = Some(msg.dispatch.args.y_start),
            }
        }
        assert_eq!(failed, Some(0));
        assert_eq!(completed, Some(10));

        // The failed worker's thread has exited.
        let join = pool.workers[0].join.take().unwrap();
        join.join().unwrap();
        pool.mark_dead(0);
        assert!(pool.has_dead_workers());
        assert!(pool.dispatch(0, dispatch(1, 0)).is_err());
    }

    #[test]
    fn superseded_jobs_are_skipped() {
        let live = Arc::new(AtomicU64::new(2));
        let (tx, rx) = mpsc::channel();
        let pool = WorkerPool::spawn(1, &Arc::new(RowKernel), &live, &tx).unwrap();

        pool.dispatch(0, dispatch(1, 0)).unwrap();
        pool.dispatch(0, dispatch(2, 5)).unwrap();

        match rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            WorkerEvent::Completed(msg) => assert_eq!(msg.generation(), 2),
            WorkerEvent::Failed { .. } => panic!("worker should not fail"),
        }
    }

    struct PanicKernel;

    impl TileKernel for PanicKernel {
        fn compute_tile(&self, _: u32, _: u32, _: f64, _: f64, _: f64, _: u32) -> Vec<u32> {
            panic!("kernel blew up");
        }
    }

    #[test]
    fn kernel_panic_is_reported_as_failure() {
        let live = Arc::new(AtomicU64::new(1));
        let (tx, rx) = mpsc::channel();
        let mut pool = WorkerPool::spawn(1, &Arc::new(PanicKernel), &live, &tx).unwrap();

        pool.dispatch(0, dispatch(1, 0)).unwrap();
        match rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            WorkerEvent::Failed { worker, error, .. } => {
                assert_eq!(worker, 0);
                assert!(matches!(error, RenderError::KernelPanic(m) if m == "kernel blew up"));
            }
            WorkerEvent::Completed(_) => panic!("panicking kernel produced a result"),
        }

        pool.workers[0].join.take().unwrap().join().unwrap();
        assert!(pool.has_dead_workers());
    }

    #[test]
    fn exited_thread_counts_as_dead() {
        let live = Arc::new(AtomicU64::new(1));
        let (tx, rx) = mpsc::channel();
        let pool = WorkerPool::spawn(1, &Arc::new(RowKernel), &live, &tx).unwrap();
        assert!(!pool.has_dead_workers());

        // With nobody listening the worker's first send fails and it exits.
        drop(rx);
        pool.dispatch(0, dispatch(1, 0)).unwrap();
        let join = pool.workers[0].join.as_ref().unwrap();
        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while !join.is_finished() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(pool.has_dead_workers());
    }
}
