use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use mandelband_core::{Canvas, DragPoint, SelectionRect, TileKernel, Viewport};
use mandelband_render::{
    CompletedFrame, Direction, FrameStatus, HistoryStack, ImageAssembler, PollOutcome, Raster,
    RenderRequest, SchedulerConfig, TileScheduler,
};

/// Pointer and navigation input, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    DragStart { x: f64, y: f64 },
    DragMove { x: f64, y: f64 },
    DragEnd { x: f64, y: f64 },
    Back,
    Forward,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    origin: DragPoint,
    current: DragPoint,
}

/// Explorer tuning that is fixed for the session.
#[derive(Debug, Clone, Copy)]
pub struct ExplorerSettings {
    pub max_iterations: u32,
    pub scheduler: SchedulerConfig,
    pub history_capacity: usize,
}

/// Ties input, navigation history and the tile scheduler together.
///
/// Everything here runs on the control thread: `handle` for each input
/// event and `tick` once per refresh.
pub struct Explorer<K: TileKernel + 'static> {
    canvas: Canvas,
    viewport: Viewport,
    max_iterations: u32,
    scheduler: TileScheduler<K>,
    assembler: ImageAssembler,
    history: HistoryStack,
    drag: Option<Drag>,
}

impl<K: TileKernel + 'static> Explorer<K> {
    pub fn new(
        kernel: K,
        canvas: Canvas,
        viewport: Viewport,
        settings: ExplorerSettings,
    ) -> mandelband_render::Result<Self> {
        Ok(Self {
            canvas,
            viewport,
            max_iterations: settings.max_iterations,
            scheduler: TileScheduler::new(kernel, settings.scheduler)?,
            assembler: ImageAssembler::new(canvas.width, canvas.height),
            history: HistoryStack::new(viewport, settings.history_capacity),
            drag: None,
        })
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn raster(&self) -> &Raster {
        self.assembler.raster()
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn status(&self) -> FrameStatus {
        self.scheduler.status()
    }

    pub fn generation(&self) -> u64 {
        self.scheduler.generation()
    }

    /// Shareable query string for the current view.
    pub fn query(&self) -> String {
        self.viewport.to_query()
    }

    /// Render the current viewport from scratch.
    pub fn start(&mut self) -> mandelband_render::Result<u64> {
        self.render(self.viewport)
    }

    fn render(&mut self, viewport: Viewport) -> mandelband_render::Result<u64> {
        let request = RenderRequest::new(
            viewport,
            self.canvas.width,
            self.canvas.height,
            self.max_iterations,
        );
        self.scheduler.start_render(request)
    }

    /// The aspect-locked rectangle to draw while a drag is in progress.
    pub fn selection_overlay(&self) -> Option<SelectionRect> {
        let drag = self.drag?;
        let rect = self.canvas.lock_aspect(drag.origin, drag.current);
        (!rect.is_degenerate()).then_some(rect)
    }

    pub fn handle(&mut self, event: InputEvent) -> mandelband_render::Result<()> {
        match event {
            InputEvent::DragStart { x, y } => {
                let p = DragPoint::new(x, y);
                self.drag = Some(Drag {
                    origin: p,
                    current: p,
                });
            }
            InputEvent::DragMove { x, y } => {
                if let Some(drag) = &mut self.drag {
                    drag.current = DragPoint::new(x, y);
                }
            }
            InputEvent::DragEnd { x, y } => {
                if let Some(drag) = self.drag.take() {
                    self.zoom_to_selection(drag.origin, DragPoint::new(x, y))?;
                }
            }
            InputEvent::Back => self.navigate(Direction::Back)?,
            InputEvent::Forward => self.navigate(Direction::Forward)?,
        }
        Ok(())
    }

    fn zoom_to_selection(
        &mut self,
        origin: DragPoint,
        end: DragPoint,
    ) -> mandelband_render::Result<()> {
        let rect = match self.canvas.select(origin, end) {
            Ok(rect) => rect,
            Err(err) => {
                debug!("Ignoring selection: {err}");
                return Ok(());
            }
        };
        let viewport = self.viewport.zoom_to_rect(&rect, &self.canvas)?;

        let (x, y, w, h) = rect.to_backing(&self.canvas);
        let preview = self.assembler.raster().resample(x, y, w, h);
        self.render(viewport)?;
        self.assembler.replace_raster(preview);

        self.viewport = viewport;
        self.history.push(viewport);
        info!(query = %self.history.current().query, "Zoomed to selection");
        Ok(())
    }

    fn navigate(&mut self, direction: Direction) -> mandelband_render::Result<()> {
        let Some(entry) = self.history.navigate(direction) else {
            debug!(?direction, "No history in that direction");
            return Ok(());
        };
        let viewport = entry.viewport;
        match entry.snapshot.clone() {
            Some(snapshot) => {
                self.scheduler.cancel()?;
                self.assembler.replace_raster(snapshot);
                debug!(query = %viewport.to_query(), "Restored snapshot");
            }
            None => {
                self.render(viewport)?;
            }
        }
        self.viewport = viewport;
        Ok(())
    }

    /// Refresh callback: composite whatever has arrived.
    pub fn tick(&mut self) -> PollOutcome {
        let outcome = self.scheduler.poll(&mut self.assembler);
        if let Some(done) = &outcome.completed {
            self.capture(done);
        }
        outcome
    }

    /// Block until the current frame completes or `timeout` passes.
    pub fn settle(&mut self, timeout: Duration) -> Option<CompletedFrame> {
        let outcome = self.scheduler.wait_frame(&mut self.assembler, timeout);
        if let Some(done) = &outcome.completed {
            self.capture(done);
        }
        outcome.completed
    }

    fn capture(&mut self, done: &CompletedFrame) {
        if self
            .history
            .capture_snapshot(&done.viewport, self.assembler.raster())
        {
            debug!(generation = done.generation, "Snapshot captured");
        }
    }
}
