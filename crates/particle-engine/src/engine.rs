//! The per-view animation engine.
//!
//! An [`Engine`] owns everything one map view needs: the decoded grid, the
//! current viewport, the screen field, the particle pool and the frame
//! pacing state. The host drives it with a handful of calls:
//!
//! - [`Engine::notify_data_changed`] when a new time step is available
//! - [`Engine::notify_bounds_changed`] after pans, zooms and resizes
//! - [`Engine::start`], [`Engine::stop`], [`Engine::pause`], [`Engine::resume`]
//! - [`Engine::on_animation_frame`] from its per-frame callback
//!
//! Field construction is incremental: each frame callback in the
//! `Building` state runs one time-boxed batch, so no call blocks for a
//! full rebuild.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use projection::Projection;
use rand::rngs::StdRng;
use rand::SeedableRng;
use renderer::TrailCanvas;
use tracing::{debug, error, info, warn};
use vector_grid::DecodedGrid;
use velocity_common::{
    FieldVector, GeoExtent, PixelBounds, VectorRecord, VelocityError, VelocityResult,
};

use crate::animator::{AdaptiveAnimator, FrameDecision};
use crate::config::VelocityConfig;
use crate::events::{EngineEvent, EventListener, FrameCallback, FrameContext};
use crate::field::{effective_velocity_scale, BatchOutcome, FieldJob, GenerationToken, ScreenField};
use crate::particles::ParticleSystem;
use crate::performance::{LoadAdjustment, PerformanceMonitor};
use crate::readout::{AngleConvention, Readout, SpeedUnit};

/// Lifecycle state. The field job lives inside `Building`.
#[derive(Debug)]
pub enum EngineState {
    Idle,
    Building(FieldJob),
    Animating,
    Paused,
    Stopped,
}

/// Copyable summary of [`EngineState`] for hosts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineStatus {
    Idle,
    Building { progress: f32 },
    Animating,
    Paused,
    Stopped,
}

/// What a frame callback did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Nothing to do in the current state
    Inactive,
    /// One field batch ran; the build continues next frame
    Building { progress: f32 },
    /// The build was superseded and discarded
    Cancelled,
    /// The field completed and the particles were spawned
    Started { particles: usize },
    /// Frame dropped by the pacing logic
    Skipped,
    Rendered { segments: usize },
    /// The frame raised an error; the animation continues
    Failed,
}

struct View<P> {
    projection: P,
    bounds: PixelBounds,
    extent: GeoExtent,
}

pub struct Engine<P: Projection, C: TrailCanvas> {
    config: VelocityConfig,
    canvas: C,
    data: Option<DecodedGrid>,
    view: Option<View<P>>,
    state: EngineState,
    token: GenerationToken,
    field: Option<ScreenField>,
    particles: ParticleSystem,
    animator: AdaptiveAnimator,
    monitor: PerformanceMonitor,
    frames: u64,
    listeners: Vec<EventListener>,
    frame_callback: Option<FrameCallback>,
}

impl<P: Projection, C: TrailCanvas> Engine<P, C> {
    /// Create an idle engine drawing onto `canvas`.
    pub fn new(config: VelocityConfig, canvas: C) -> VelocityResult<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            particles: ParticleSystem::new(&config, rng),
            animator: AdaptiveAnimator::new(&config),
            monitor: PerformanceMonitor::new(config.adaptive.clone()),
            config,
            canvas,
            data: None,
            view: None,
            state: EngineState::Idle,
            token: GenerationToken::new(),
            field: None,
            frames: 0,
            listeners: Vec::new(),
            frame_callback: None,
        })
    }

    /// Register a lifecycle listener.
    pub fn on_event<F>(&mut self, listener: F)
    where
        F: FnMut(&EngineEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Register the callback invoked after every committed frame.
    pub fn on_frame<F>(&mut self, callback: F)
    where
        F: for<'a> FnMut(&FrameContext<'a>) + 'static,
    {
        self.frame_callback = Some(Box::new(callback));
    }

    /// Load a new time step.
    ///
    /// A running or building animation is rebuilt from the new grid; a
    /// paused one is stopped. On a decode error the current animation is
    /// stopped, the old grid is dropped and the error is returned.
    pub fn notify_data_changed(&mut self, records: &[VectorRecord]) -> VelocityResult<()> {
        match vector_grid::decode(records) {
            Ok(decoded) => {
                info!(
                    ni = decoded.grid.ni(),
                    nj = decoded.grid.nj(),
                    valid_time = %decoded.valid_time,
                    "Vector data loaded"
                );
                self.data = Some(decoded);
                self.refresh()
            }
            Err(e) => {
                error!(error = %e, "Failed to decode vector data");
                self.stop();
                self.data = None;
                Err(e.into())
            }
        }
    }

    /// Replace the viewport. Clears the canvas and rebuilds a running
    /// animation for the new bounds.
    pub fn notify_bounds_changed(
        &mut self,
        projection: P,
        bounds: PixelBounds,
        extent: GeoExtent,
    ) -> VelocityResult<()> {
        debug!(
            x = bounds.x,
            y = bounds.y,
            x_max = bounds.x_max,
            y_max = bounds.y_max,
            "Viewport changed"
        );
        self.view = Some(View {
            projection,
            bounds,
            extent,
        });
        self.canvas.clear();
        self.refresh()
    }

    fn refresh(&mut self) -> VelocityResult<()> {
        match self.state {
            EngineState::Building(_) | EngineState::Animating => self.start(),
            EngineState::Paused => {
                self.stop();
                Ok(())
            }
            EngineState::Idle | EngineState::Stopped => Ok(()),
        }
    }

    /// Begin building the screen field for the current data and viewport.
    ///
    /// Any in-flight build or running animation is discarded first.
    pub fn start(&mut self) -> VelocityResult<()> {
        if self.data.is_none() {
            return Err(VelocityError::NotReady("no vector data loaded".to_string()));
        }
        let (bounds, extent) = match &self.view {
            Some(view) => (view.bounds, view.extent),
            None => return Err(VelocityError::NotReady("no viewport set".to_string())),
        };

        if matches!(self.state, EngineState::Animating | EngineState::Paused) {
            self.emit(EngineEvent::AnimationStopped);
        }
        self.discard_animation();

        let generation = self.token.advance();
        let scale = effective_velocity_scale(
            self.config.velocity_scale,
            &extent,
            self.config.device.velocity_boost(),
        );
        let job = FieldJob::new(&self.token, bounds, scale, self.config.adaptive.batch_budget());
        let columns = job.total_columns();

        metrics::counter!("velocity_field_builds_total").increment(1);
        info!(generation, columns, velocity_scale = scale, "Field build started");

        self.state = EngineState::Building(job);
        self.emit(EngineEvent::BuildStarted {
            generation,
            columns,
        });
        Ok(())
    }

    /// Stop animating and release the field. Safe to call in any state.
    pub fn stop(&mut self) {
        let was_building = matches!(self.state, EngineState::Building(_));
        let was_animating = matches!(self.state, EngineState::Animating | EngineState::Paused);
        self.discard_animation();
        self.canvas.clear();
        self.state = EngineState::Stopped;
        if was_building {
            info!("Field build abandoned");
        }
        if was_animating {
            info!("Animation stopped");
            self.emit(EngineEvent::AnimationStopped);
        }
    }

    /// Freeze a running animation, keeping its field. Returns whether the
    /// engine was animating.
    pub fn pause(&mut self) -> bool {
        if matches!(self.state, EngineState::Animating) {
            self.state = EngineState::Paused;
            info!("Animation paused");
            true
        } else {
            false
        }
    }

    /// Continue a paused animation. The next frame callback renders.
    pub fn resume(&mut self) -> bool {
        if matches!(self.state, EngineState::Paused) {
            self.animator.reset_clock();
            self.monitor.reset();
            self.state = EngineState::Animating;
            info!("Animation resumed");
            true
        } else {
            false
        }
    }

    /// Advance the engine from the host's animation-frame callback.
    pub fn on_animation_frame(&mut self, now: Instant) -> FrameOutcome {
        match std::mem::replace(&mut self.state, EngineState::Idle) {
            EngineState::Building(job) => self.continue_build(job),
            EngineState::Animating => {
                self.state = EngineState::Animating;
                self.animate(now)
            }
            other => {
                self.state = other;
                FrameOutcome::Inactive
            }
        }
    }

    fn continue_build(&mut self, job: FieldJob) -> FrameOutcome {
        let generation = job.generation();
        let started = job.started();

        let outcome = match (&self.data, &self.view) {
            (Some(data), Some(view)) => job.run_batch(&data.grid, &view.projection),
            _ => return FrameOutcome::Inactive,
        };

        match outcome {
            BatchOutcome::Pending(job) => {
                let progress = job.progress();
                self.state = EngineState::Building(job);
                FrameOutcome::Building { progress }
            }
            BatchOutcome::Cancelled => {
                metrics::counter!("velocity_field_builds_cancelled_total").increment(1);
                debug!(generation, "Field build cancelled");
                FrameOutcome::Cancelled
            }
            BatchOutcome::Complete(field) => {
                let elapsed = started.elapsed();
                info!(
                    generation,
                    elapsed_ms = elapsed.as_millis() as u64,
                    defined = field.defined_samples(),
                    "Field build complete"
                );
                self.emit(EngineEvent::BuildComplete {
                    generation,
                    elapsed,
                });
                self.begin_animation(field);
                FrameOutcome::Started {
                    particles: self.particles.len(),
                }
            }
        }
    }

    fn begin_animation(&mut self, field: ScreenField) {
        self.particles.set_scale(self.monitor.particle_scale());
        self.particles.populate(&field);
        self.field = Some(field);
        self.animator.reset_clock();
        self.monitor.reset();
        self.frames = 0;
        self.state = EngineState::Animating;

        let particles = self.particles.len();
        metrics::gauge!("velocity_particle_count").set(particles as f64);
        info!(particles, "Animation started");
        self.emit(EngineEvent::AnimationStarted { particles });
    }

    fn animate(&mut self, now: Instant) -> FrameOutcome {
        match self.monitor.record_frame(now) {
            Some(LoadAdjustment::Reduced(scale)) | Some(LoadAdjustment::Restored(scale)) => {
                self.particles.set_scale(scale);
            }
            None => {}
        }

        match self.animator.decide(now) {
            FrameDecision::Skip => {
                metrics::counter!("velocity_frames_skipped_total").increment(1);
                FrameOutcome::Skipped
            }
            FrameDecision::Render => self.run_frame(),
        }
    }

    /// Evolve, render and notify. Errors and panics cost this frame only.
    fn run_frame(&mut self) -> FrameOutcome {
        let field = match &self.field {
            Some(field) => field,
            None => return FrameOutcome::Inactive,
        };
        let bounds = field.bounds();
        let frame = self.frames + 1;
        let fps = self.monitor.current_fps();
        let particles = &mut self.particles;
        let canvas = &mut self.canvas;
        let animator = &self.animator;
        let callback = &mut self.frame_callback;

        let result = panic::catch_unwind(AssertUnwindSafe(|| -> VelocityResult<usize> {
            particles.evolve(field);
            let segments = animator.render(canvas, particles, &bounds)?;
            if let Some(callback) = callback.as_mut() {
                callback(&FrameContext {
                    field,
                    particles,
                    frame,
                    fps,
                });
            }
            Ok(segments)
        }));

        let failure = match result {
            Ok(Ok(segments)) => {
                self.frames = frame;
                metrics::counter!("velocity_frames_total").increment(1);
                metrics::gauge!("velocity_particle_count").set(self.particles.len() as f64);
                return FrameOutcome::Rendered { segments };
            }
            Ok(Err(e)) => e,
            Err(payload) => VelocityError::Frame(panic_message(payload.as_ref())),
        };

        metrics::counter!("velocity_frame_failures_total").increment(1);
        warn!(error = %failure, frame, "Frame failed, continuing");
        FrameOutcome::Failed
    }

    /// Invalidate in-flight builds, free the field and empty the pool.
    fn discard_animation(&mut self) {
        self.token.advance();
        if let Some(mut field) = self.field.take() {
            field.release();
        }
        self.particles.clear();
    }

    fn emit(&mut self, event: EngineEvent) {
        debug!(event = event.name(), "Engine event");
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    /// Interpolated grid vector at a geographic position, independent of
    /// the animation state.
    pub fn interpolate_point(&self, lon: f64, lat: f64) -> Option<FieldVector> {
        self.data.as_ref()?.grid.interpolate(lon, lat)
    }

    pub fn readout(
        &self,
        lon: f64,
        lat: f64,
        unit: SpeedUnit,
        convention: AngleConvention,
    ) -> Option<Readout> {
        self.interpolate_point(lon, lat)
            .map(|vector| Readout::new(lon, lat, vector, unit, convention))
    }

    pub fn status(&self) -> EngineStatus {
        match &self.state {
            EngineState::Idle => EngineStatus::Idle,
            EngineState::Building(job) => EngineStatus::Building {
                progress: job.progress(),
            },
            EngineState::Animating => EngineStatus::Animating,
            EngineState::Paused => EngineStatus::Paused,
            EngineState::Stopped => EngineStatus::Stopped,
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Handle that invalidates in-flight builds when advanced.
    pub fn generation_token(&self) -> GenerationToken {
        self.token.clone()
    }

    pub fn config(&self) -> &VelocityConfig {
        &self.config
    }

    pub fn data(&self) -> Option<&DecodedGrid> {
        self.data.as_ref()
    }

    pub fn field(&self) -> Option<&ScreenField> {
        self.field.as_ref()
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    /// Committed frames since the animation started.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn frame_interval(&self) -> Duration {
        self.animator.interval()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic in frame".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "panic in frame");
    }
}
