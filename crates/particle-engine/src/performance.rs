//! Frame rate monitoring and particle load shedding.
//!
//! The monitor counts frame callbacks over one-second windows and keeps a
//! short history of window rates. When the moving average stays below the
//! low threshold the particle scale is reduced by the configured factor;
//! it is raised again only once the average climbs above the (higher)
//! recovery threshold.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::AdaptiveConfig;

const WINDOW: Duration = Duration::from_secs(1);

/// Change to the particle scale requested after a window closes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadAdjustment {
    /// Scale lowered to the contained value
    Reduced(f64),
    /// Scale raised to the contained value
    Restored(f64),
}

/// Rolling FPS tracker with hysteresis-controlled particle scaling.
#[derive(Debug)]
pub struct PerformanceMonitor {
    config: AdaptiveConfig,
    window_start: Option<Instant>,
    frames: u32,
    current_fps: f64,
    history: VecDeque<f64>,
    particle_scale: f64,
}

impl PerformanceMonitor {
    pub fn new(config: AdaptiveConfig) -> Self {
        let history = VecDeque::with_capacity(config.fps_history.max(1));
        Self {
            config,
            window_start: None,
            frames: 0,
            current_fps: 0.0,
            history,
            particle_scale: 1.0,
        }
    }

    /// Count one frame callback at `now`.
    ///
    /// Returns an adjustment when a window closed and the moving average
    /// crossed a threshold.
    pub fn record_frame(&mut self, now: Instant) -> Option<LoadAdjustment> {
        let start = match self.window_start {
            Some(start) => start,
            None => {
                self.window_start = Some(now);
                self.frames = 0;
                return None;
            }
        };

        self.frames += 1;
        let elapsed = now.saturating_duration_since(start);
        if elapsed < WINDOW {
            return None;
        }

        self.current_fps = self.frames as f64 / elapsed.as_secs_f64();
        self.frames = 0;
        self.window_start = Some(now);

        if self.history.len() >= self.config.fps_history.max(1) {
            self.history.pop_front();
        }
        self.history.push_back(self.current_fps);

        let average = self.average_fps();
        metrics::gauge!("velocity_fps").set(self.current_fps);
        metrics::gauge!("velocity_fps_average").set(average);
        debug!(fps = self.current_fps, average = average, "Frame rate window closed");

        self.evaluate(average)
    }

    fn evaluate(&mut self, average: f64) -> Option<LoadAdjustment> {
        if average < self.config.low_fps_threshold {
            warn!(
                average_fps = average,
                threshold = self.config.low_fps_threshold,
                "Sustained low frame rate"
            );
            if !self.config.enabled || self.particle_scale <= self.config.min_particle_scale {
                return None;
            }
            self.particle_scale = (self.particle_scale * self.config.reduction_factor)
                .max(self.config.min_particle_scale);
            self.history.clear();
            info!(scale = self.particle_scale, "Reducing particle count");
            return Some(LoadAdjustment::Reduced(self.particle_scale));
        }

        if average > self.config.recovery_fps_threshold && self.particle_scale < 1.0 {
            self.particle_scale = (self.particle_scale / self.config.reduction_factor).min(1.0);
            self.history.clear();
            info!(scale = self.particle_scale, "Restoring particle count");
            return Some(LoadAdjustment::Restored(self.particle_scale));
        }

        None
    }

    /// Rate of the last closed window.
    pub fn current_fps(&self) -> f64 {
        self.current_fps
    }

    /// Mean of the retained window rates, 0 before the first window closes.
    pub fn average_fps(&self) -> f64 {
        if self.history.is_empty() {
            0.0
        } else {
            self.history.iter().sum::<f64>() / self.history.len() as f64
        }
    }

    pub fn particle_scale(&self) -> f64 {
        self.particle_scale
    }

    /// Forget the open window and the history. The particle scale is kept.
    pub fn reset(&mut self) {
        self.window_start = None;
        self.frames = 0;
        self.current_fps = 0.0;
        self.history.clear();
    }
}
