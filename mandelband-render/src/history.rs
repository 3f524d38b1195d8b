use mandelband_core::Viewport;
use tracing::debug;

use crate::raster::Raster;

/// Default number of entries kept before the oldest are dropped.
pub const MAX_HISTORY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Back,
    Forward,
}

/// One step of navigation history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub viewport: Viewport,
    /// Shareable query string for `viewport`.
    pub query: String,
    /// The finished frame for this view, once one has completed.
    pub snapshot: Option<Raster>,
}

impl HistoryEntry {
    fn new(viewport: Viewport) -> Self {
        Self {
            query: viewport.to_query(),
            viewport,
            snapshot: None,
        }
    }
}

/// Linear back/forward history of viewports with optional frame snapshots.
///
/// There is always a current entry. Pushing drops everything ahead of the
/// cursor; once `capacity` is exceeded the oldest entries fall off the front.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: Vec<HistoryEntry>,
    pos: usize,
    capacity: usize,
}

impl HistoryStack {
    pub fn new(initial: Viewport, capacity: usize) -> Self {
        Self {
            entries: vec![HistoryEntry::new(initial)],
            pos: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.entries[self.pos]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn can_go_back(&self) -> bool {
        self.pos > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.pos + 1 < self.entries.len()
    }

    /// Make `viewport` the current entry, discarding any forward entries.
    pub fn push(&mut self, viewport: Viewport) {
        self.entries.truncate(self.pos + 1);
        self.entries.push(HistoryEntry::new(viewport));
        if self.entries.len() > self.capacity {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(..excess);
        }
        self.pos = self.entries.len() - 1;
        debug!(depth = self.entries.len(), "History push");
    }

    /// Attach a copy of `raster` to the current entry.
    ///
    /// Ignored unless `viewport` is the current entry's viewport, so a frame
    /// that finishes after the user has moved on is never filed under the
    /// wrong view. Returns whether the snapshot was stored.
    pub fn capture_snapshot(&mut self, viewport: &Viewport, raster: &Raster) -> bool {
        let entry = &mut self.entries[self.pos];
        if entry.viewport != *viewport {
            return false;
        }
        entry.snapshot = Some(raster.clone());
        true
    }

    /// Step one entry in `direction` and return it, or `None` at either end.
    pub fn navigate(&mut self, direction: Direction) -> Option<&HistoryEntry> {
        match direction {
            Direction::Back if self.can_go_back() => self.pos -= 1,
            Direction::Forward if self.can_go_forward() => self.pos += 1,
            _ => return None,
        }
        debug!(position = self.pos, ?direction, "History navigate");
        Some(&self.entries[self.pos])
    }
}
