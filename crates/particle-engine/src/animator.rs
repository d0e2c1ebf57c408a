//! Frame pacing and trail compositing.

use std::time::{Duration, Instant};

use renderer::TrailCanvas;
use velocity_common::{PixelBounds, VelocityResult};

use crate::config::VelocityConfig;
use crate::particles::ParticleSystem;

/// Share of the bucket colour's alpha used for new strokes.
const STROKE_ALPHA: f32 = 0.9;

/// Whether a frame callback should do work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDecision {
    Render,
    Skip,
}

/// Drop-frame pacing against a target frame interval.
///
/// A callback that arrives before the interval elapsed is skipped, but
/// never more than `max_consecutive_skips` times in a row.
#[derive(Debug)]
pub struct AdaptiveAnimator {
    interval: Duration,
    max_consecutive_skips: u32,
    consecutive_skips: u32,
    last_frame: Option<Instant>,
    opacity: f32,
    line_width: f32,
}

impl AdaptiveAnimator {
    pub fn new(config: &VelocityConfig) -> Self {
        Self {
            interval: config.frame_interval(),
            max_consecutive_skips: config.adaptive.max_consecutive_skips,
            consecutive_skips: 0,
            last_frame: None,
            opacity: config.opacity,
            line_width: config.line_width,
        }
    }

    pub fn decide(&mut self, now: Instant) -> FrameDecision {
        let last = match self.last_frame {
            Some(last) => last,
            None => {
                self.last_frame = Some(now);
                self.consecutive_skips = 0;
                return FrameDecision::Render;
            }
        };

        let delta = now.saturating_duration_since(last);
        if delta < self.interval && self.consecutive_skips < self.max_consecutive_skips {
            self.consecutive_skips += 1;
            return FrameDecision::Skip;
        }

        self.consecutive_skips = 0;
        // Keep the remainder so frames stay aligned to the interval grid
        self.last_frame = Some(if delta >= self.interval && !self.interval.is_zero() {
            let remainder = Duration::from_nanos((delta.as_nanos() % self.interval.as_nanos()) as u64);
            now.checked_sub(remainder).unwrap_or(now)
        } else {
            now
        });
        FrameDecision::Render
    }

    /// Forget the last frame time so the next callback renders.
    pub fn reset_clock(&mut self) {
        self.last_frame = None;
        self.consecutive_skips = 0;
    }

    pub fn consecutive_skips(&self) -> u32 {
        self.consecutive_skips
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fade existing trails, then stroke the new segments of every colour
    /// bucket with one call per bucket. Returns the number of segments drawn.
    ///
    /// Particles are advanced to their trail ends only after every stroke
    /// succeeded.
    pub fn render<C: TrailCanvas + ?Sized>(
        &self,
        canvas: &mut C,
        particles: &mut ParticleSystem,
        bounds: &PixelBounds,
    ) -> VelocityResult<usize> {
        canvas.fade(bounds, self.opacity)?;

        let mut drawn = 0;
        for bucket in 0..particles.buckets().len() {
            let segments = particles.bucket_segments(bucket);
            if segments.is_empty() {
                continue;
            }
            if let Some(color) = particles.bucket_color(bucket) {
                let alpha = (color[3] as f32 * self.opacity * STROKE_ALPHA).round() as u8;
                canvas.stroke_segments([color[0], color[1], color[2], alpha], self.line_width, &segments)?;
                drawn += segments.len();
            }
        }

        particles.commit_trails();
        Ok(drawn)
    }
}
