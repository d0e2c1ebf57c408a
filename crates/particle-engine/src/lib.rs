//! Particle animation over a vector grid.
//!
//! This crate turns a decoded [`vector_grid::Grid`] into animated particle
//! trails on a [`renderer::TrailCanvas`]:
//!
//! - [`field`]: incremental, time-boxed screen field construction
//! - [`particles`]: particle pool, advection and colour bucketing
//! - [`animator`]: frame pacing and trail compositing
//! - [`performance`]: rolling FPS and particle load shedding
//! - [`engine`]: the state machine hosts drive per map view
//!
//! # Example
//!
//! ```ignore
//! use particle_engine::{Engine, VelocityConfig};
//! use projection::MercatorViewport;
//! use renderer::PixmapCanvas;
//!
//! let canvas = PixmapCanvas::new(800, 600)?;
//! let mut engine = Engine::new(VelocityConfig::default(), canvas)?;
//! engine.notify_data_changed(&records)?;
//! engine.notify_bounds_changed(viewport, bounds, extent)?;
//! engine.start()?;
//! loop {
//!     engine.on_animation_frame(std::time::Instant::now());
//! }
//! ```

pub mod animator;
pub mod config;
pub mod engine;
pub mod events;
pub mod field;
pub mod particles;
pub mod performance;
pub mod readout;

pub use animator::{AdaptiveAnimator, FrameDecision};
pub use config::{AdaptiveConfig, DeviceProfile, VelocityConfig, MAX_PARTICLE_AGE};
pub use engine::{Engine, EngineState, EngineStatus, FrameOutcome};
pub use events::{EngineEvent, FrameContext};
pub use field::{
    effective_velocity_scale, sample_point, BatchOutcome, FieldJob, GenerationToken, ScreenField,
};
pub use particles::{Particle, ParticleSystem, MAX_RESPAWN_ATTEMPTS};
pub use performance::{LoadAdjustment, PerformanceMonitor};
pub use readout::{vector_to_degrees, vector_to_speed, AngleConvention, Readout, SpeedUnit};
