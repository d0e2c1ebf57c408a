//! Screen-space velocity field and its incremental construction.
//!
//! A [`FieldJob`] walks the visible bounds column by column with a stride
//! of two pixels. Each sample is inverted to geography, interpolated from
//! the grid and distorted into a pixel displacement. Work is split into
//! batches bounded by a wall-clock budget so the host's frame callback
//! never blocks on a full rebuild; the job is resumed on the next frame.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use projection::{distort, Projection};
use tracing::debug;
use vector_grid::Grid;
use velocity_common::{FieldVector, GeoExtent, PixelBounds};

/// Shared build generation.
///
/// Every rebuild advances the counter; a job only makes progress while the
/// generation it was created with is still current.
#[derive(Debug, Clone, Default)]
pub struct GenerationToken {
    current: Arc<AtomicU64>,
}

impl GenerationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// Invalidate all outstanding jobs and return the new generation.
    pub fn advance(&self) -> u64 {
        self.current.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

/// Distorted velocity samples over the visible bounds.
///
/// Samples are stored at half resolution; a pixel maps to the sample of
/// its even-aligned neighbour, so each sample covers a 2x2 block.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenField {
    bounds: PixelBounds,
    columns: usize,
    rows: usize,
    cells: Vec<Option<FieldVector>>,
}

impl ScreenField {
    /// Vector under a pixel position, or `None` for no data.
    ///
    /// The position is rounded to the nearest pixel (half up).
    pub fn sample(&self, x: f32, y: f32) -> Option<FieldVector> {
        let px = (x + 0.5).floor();
        let py = (y + 0.5).floor();
        if !px.is_finite() || !py.is_finite() {
            return None;
        }
        let dx = px as i64 - self.bounds.x as i64;
        let dy = py as i64 - self.bounds.y as i64;
        if dx < 0 || dy < 0 {
            return None;
        }
        let column = (dx / 2) as usize;
        let row = (dy / 2) as usize;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.cells[column * self.rows + row]
    }

    /// Whether a position has a defined vector.
    pub fn is_defined(&self, x: f32, y: f32) -> bool {
        self.sample(x, y).is_some()
    }

    pub fn bounds(&self) -> PixelBounds {
        self.bounds
    }

    /// Number of sampled columns (half the pixel width, rounded up).
    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of samples holding a vector.
    pub fn defined_samples(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Free the sample storage. Every lookup returns `None` afterwards.
    pub fn release(&mut self) {
        self.cells = Vec::new();
        self.columns = 0;
        self.rows = 0;
    }

    pub fn is_released(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether every sample matches `other` within `tolerance`.
    pub fn approx_eq(&self, other: &ScreenField, tolerance: f32) -> bool {
        self.bounds == other.bounds
            && self.columns == other.columns
            && self.rows == other.rows
            && self.cells.iter().zip(&other.cells).all(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => a.approx_eq(b, tolerance),
                (None, None) => true,
                _ => false,
            })
    }
}

/// Result of running one batch of a [`FieldJob`].
#[derive(Debug)]
pub enum BatchOutcome {
    /// More columns remain; run the returned job again on a later frame.
    Pending(FieldJob),
    /// All columns are sampled.
    Complete(ScreenField),
    /// A newer build superseded this one; its work was discarded.
    Cancelled,
}

/// An in-progress screen field build.
#[derive(Debug)]
pub struct FieldJob {
    generation: u64,
    token: GenerationToken,
    bounds: PixelBounds,
    velocity_scale: f64,
    budget: Duration,
    columns: usize,
    rows: usize,
    next_column: usize,
    cells: Vec<Option<FieldVector>>,
    started: Instant,
}

impl FieldJob {
    /// Prepare a build for the current generation of `token`.
    ///
    /// `velocity_scale` is the final displacement scale (already adjusted
    /// for zoom and display density); `budget` bounds each batch.
    pub fn new(
        token: &GenerationToken,
        bounds: PixelBounds,
        velocity_scale: f64,
        budget: Duration,
    ) -> Self {
        let columns = half_count(bounds.width());
        let rows = half_count(bounds.height());
        Self {
            generation: token.current(),
            token: token.clone(),
            bounds,
            velocity_scale,
            budget,
            columns,
            rows,
            next_column: 0,
            cells: vec![None; columns * rows],
            started: Instant::now(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn bounds(&self) -> PixelBounds {
        self.bounds
    }

    pub fn velocity_scale(&self) -> f64 {
        self.velocity_scale
    }

    pub fn total_columns(&self) -> usize {
        self.columns
    }

    pub fn completed_columns(&self) -> usize {
        self.next_column
    }

    /// Fraction of columns sampled so far.
    pub fn progress(&self) -> f32 {
        if self.columns == 0 {
            1.0
        } else {
            self.next_column as f32 / self.columns as f32
        }
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    /// Time since the job was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Sample columns until the budget is spent or the field is complete.
    ///
    /// At least one column is sampled per batch so that progress is
    /// guaranteed even with a zero budget.
    pub fn run_batch<P: Projection + ?Sized>(mut self, grid: &Grid, projection: &P) -> BatchOutcome {
        if !self.token.is_current(self.generation) {
            debug!(generation = self.generation, "Discarding stale field batch");
            return BatchOutcome::Cancelled;
        }

        let batch_start = Instant::now();
        let first = self.next_column;
        while self.next_column < self.columns {
            self.sample_column(grid, projection);
            self.next_column += 1;
            if batch_start.elapsed() >= self.budget {
                break;
            }
        }

        debug!(
            generation = self.generation,
            columns = self.next_column - first,
            progress = self.progress(),
            "Field batch finished"
        );

        if self.next_column < self.columns {
            return BatchOutcome::Pending(self);
        }

        BatchOutcome::Complete(ScreenField {
            bounds: self.bounds,
            columns: self.columns,
            rows: self.rows,
            cells: self.cells,
        })
    }

    /// Run batches back to back until the job completes or is cancelled.
    pub fn run_to_completion<P: Projection + ?Sized>(
        self,
        grid: &Grid,
        projection: &P,
    ) -> Option<ScreenField> {
        let mut job = self;
        loop {
            match job.run_batch(grid, projection) {
                BatchOutcome::Pending(next) => job = next,
                BatchOutcome::Complete(field) => return Some(field),
                BatchOutcome::Cancelled => return None,
            }
        }
    }

    fn sample_column<P: Projection + ?Sized>(&mut self, grid: &Grid, projection: &P) {
        let column = self.next_column;
        let x = self.bounds.x as f64 + 2.0 * column as f64;
        for row in 0..self.rows {
            let y = self.bounds.y as f64 + 2.0 * row as f64;
            self.cells[column * self.rows + row] = sample_point(grid, projection, x, y, self.velocity_scale);
        }
    }
}

/// Distorted vector for a single pixel, or `None` off the globe or over
/// missing data.
pub fn sample_point<P: Projection + ?Sized>(
    grid: &Grid,
    projection: &P,
    x: f64,
    y: f64,
    velocity_scale: f64,
) -> Option<FieldVector> {
    let (lon, lat) = projection.invert(x, y)?;
    if !lon.is_finite() || !lat.is_finite() {
        return None;
    }
    let wind = grid.interpolate(lon, lat)?;
    Some(distort(projection, lon, lat, x, y, velocity_scale, wind))
}

/// Displacement scale for a view: the configured base scale adjusted for
/// the visible geographic area and display density.
pub fn effective_velocity_scale(base: f64, extent: &GeoExtent, density_boost: f64) -> f64 {
    base * density_boost * extent.area_radians().powf(0.4)
}

fn half_count(pixels: u32) -> usize {
    (pixels as usize + 1) / 2
}
