//! Engine configuration.
//!
//! Option names follow the host-facing camelCase layout so a layer options
//! object deserializes directly:
//!
//! ```json
//! { "maxVelocity": 15, "particleAge": 64, "colorScale": ["#3288bd", "#d53e4f"] }
//! ```
//!
//! Missing options take their defaults. Values can be overridden from
//! `VELOCITY_*` environment variables.

use std::path::Path;
use std::time::Duration;

use renderer::ColorScale;
use serde::{Deserialize, Serialize};
use velocity_common::{VelocityError, VelocityResult};

/// Largest accepted `particleAge`; ages count one past it before respawn.
pub const MAX_PARTICLE_AGE: u32 = u32::MAX - 1;

/// Recognized layer options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VelocityConfig {
    /// Speed (m/s) mapped to the first colour bucket
    pub min_velocity: f32,
    /// Speed (m/s) mapped to the last colour bucket
    pub max_velocity: f32,
    /// Base displacement per tick per m/s
    pub velocity_scale: f64,
    /// Ticks a particle lives before it is respawned
    pub particle_age: u32,
    /// Particles per square pixel of visible bounds
    pub particle_multiplier: f64,
    pub line_width: f32,
    /// Target rendered frames per second
    pub frame_rate: f64,
    /// Fraction of trail alpha kept each frame
    pub opacity: f32,
    pub color_scale: ColorScale,
    pub adaptive: AdaptiveConfig,
    pub device: DeviceProfile,
    /// Fixed seed for particle placement; random when unset
    pub seed: Option<u64>,
}

/// Frame pacing and load shedding tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdaptiveConfig {
    /// Wall-clock budget for one field sampling batch
    pub batch_budget_ms: u64,
    pub max_consecutive_skips: u32,
    pub low_fps_threshold: f64,
    pub recovery_fps_threshold: f64,
    /// Particle scale multiplier applied on each reduction
    pub reduction_factor: f64,
    pub min_particle_scale: f64,
    /// Number of one-second windows in the moving average
    pub fps_history: usize,
    /// Whether low frame rates reduce the particle count
    pub enabled: bool,
}

/// Display density hints supplied by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceProfile {
    pub device_pixel_ratio: f64,
    /// Low-power device; reduces the particle budget
    pub constrained: bool,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            min_velocity: 0.0,
            max_velocity: 10.0,
            velocity_scale: 0.005,
            particle_age: 90,
            particle_multiplier: 1.0 / 300.0,
            line_width: 1.0,
            frame_rate: 15.0,
            opacity: 0.97,
            color_scale: ColorScale::default(),
            adaptive: AdaptiveConfig::default(),
            device: DeviceProfile::default(),
            seed: None,
        }
    }
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            batch_budget_ms: 100,
            max_consecutive_skips: 3,
            low_fps_threshold: 15.0,
            recovery_fps_threshold: 25.0,
            reduction_factor: 0.75,
            min_particle_scale: 0.1,
            fps_history: 5,
            enabled: true,
        }
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            device_pixel_ratio: 1.0,
            constrained: false,
        }
    }
}

impl AdaptiveConfig {
    pub fn batch_budget(&self) -> Duration {
        Duration::from_millis(self.batch_budget_ms)
    }
}

impl DeviceProfile {
    /// Multiplier on the particle budget: `1 / dpr^(1/3)` on constrained
    /// devices, never above 1.
    pub fn particle_reduction(&self) -> f64 {
        if self.constrained {
            (1.0 / self.device_pixel_ratio.cbrt()).min(1.0)
        } else {
            1.0
        }
    }

    /// Multiplier on the displacement scale, `dpr^(1/3)`.
    pub fn velocity_boost(&self) -> f64 {
        self.device_pixel_ratio.cbrt()
    }
}

impl VelocityConfig {
    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> VelocityResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse options from YAML. Missing fields take their defaults.
    pub fn from_yaml(yaml: &str) -> VelocityResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load options from a `.json`, `.yaml` or `.yml` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> VelocityResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            Some("yaml") | Some("yml") => Self::from_yaml(&contents),
            other => Err(VelocityError::invalid_config(
                "path",
                format!("unsupported config extension {:?}", other),
            )),
        }
    }

    /// Defaults overridden from `VELOCITY_*` environment variables.
    pub fn from_env() -> VelocityResult<Self> {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Recognized variables: `VELOCITY_MIN_VELOCITY`, `VELOCITY_MAX_VELOCITY`,
    /// `VELOCITY_SCALE`, `VELOCITY_PARTICLE_AGE`, `VELOCITY_PARTICLE_MULTIPLIER`,
    /// `VELOCITY_LINE_WIDTH`, `VELOCITY_FRAME_RATE`, `VELOCITY_OPACITY`,
    /// `VELOCITY_COLOR_SCALE` (semicolon separated), `VELOCITY_SEED`,
    /// `VELOCITY_DEVICE_PIXEL_RATIO`, `VELOCITY_CONSTRAINED`,
    /// `VELOCITY_ADAPTIVE`.
    pub fn with_env<F>(mut self, lookup: F) -> VelocityResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "VELOCITY_MIN_VELOCITY")? {
            self.min_velocity = v;
        }
        if let Some(v) = parse_var(&lookup, "VELOCITY_MAX_VELOCITY")? {
            self.max_velocity = v;
        }
        if let Some(v) = parse_var(&lookup, "VELOCITY_SCALE")? {
            self.velocity_scale = v;
        }
        if let Some(v) = parse_var(&lookup, "VELOCITY_PARTICLE_AGE")? {
            self.particle_age = v;
        }
        if let Some(v) = parse_var(&lookup, "VELOCITY_PARTICLE_MULTIPLIER")? {
            self.particle_multiplier = v;
        }
        if let Some(v) = parse_var(&lookup, "VELOCITY_LINE_WIDTH")? {
            self.line_width = v;
        }
        if let Some(v) = parse_var(&lookup, "VELOCITY_FRAME_RATE")? {
            self.frame_rate = v;
        }
        if let Some(v) = parse_var(&lookup, "VELOCITY_OPACITY")? {
            self.opacity = v;
        }
        if let Some(v) = lookup("VELOCITY_COLOR_SCALE") {
            let entries: Vec<&str> = v.split(';').map(str::trim).filter(|s| !s.is_empty()).collect();
            self.color_scale = ColorScale::parse(&entries)
                .map_err(|e| VelocityError::invalid_config("VELOCITY_COLOR_SCALE", e.to_string()))?;
        }
        if let Some(v) = parse_var(&lookup, "VELOCITY_SEED")? {
            self.seed = Some(v);
        }
        if let Some(v) = parse_var(&lookup, "VELOCITY_DEVICE_PIXEL_RATIO")? {
            self.device.device_pixel_ratio = v;
        }
        if let Some(v) = parse_var(&lookup, "VELOCITY_CONSTRAINED")? {
            self.device.constrained = v;
        }
        if let Some(v) = parse_var(&lookup, "VELOCITY_ADAPTIVE")? {
            self.adaptive.enabled = v;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check option values and their relationships.
    pub fn validate(&self) -> VelocityResult<()> {
        if !(self.min_velocity.is_finite() && self.max_velocity.is_finite())
            || self.min_velocity >= self.max_velocity
        {
            return Err(VelocityError::invalid_config(
                "maxVelocity",
                format!(
                    "must be greater than minVelocity ({} >= {})",
                    self.min_velocity, self.max_velocity
                ),
            ));
        }
        if !(self.velocity_scale.is_finite() && self.velocity_scale > 0.0) {
            return Err(VelocityError::invalid_config("velocityScale", "must be positive"));
        }
        if self.particle_age == 0 || self.particle_age > MAX_PARTICLE_AGE {
            return Err(VelocityError::invalid_config(
                "particleAge",
                format!("must be within [1, {}]", MAX_PARTICLE_AGE),
            ));
        }
        if !(self.particle_multiplier.is_finite() && self.particle_multiplier > 0.0) {
            return Err(VelocityError::invalid_config("particleMultiplier", "must be positive"));
        }
        if !(self.line_width.is_finite() && self.line_width > 0.0) {
            return Err(VelocityError::invalid_config("lineWidth", "must be positive"));
        }
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0)
            || Duration::try_from_secs_f64(1.0 / self.frame_rate).is_err()
        {
            return Err(VelocityError::invalid_config(
                "frameRate",
                format!("must be positive with a representable frame interval, got {}", self.frame_rate),
            ));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(VelocityError::invalid_config(
                "opacity",
                format!("must be within [0, 1], got {}", self.opacity),
            ));
        }
        if self.color_scale.is_empty() {
            return Err(VelocityError::invalid_config("colorScale", "must not be empty"));
        }
        if !(self.device.device_pixel_ratio.is_finite() && self.device.device_pixel_ratio > 0.0) {
            return Err(VelocityError::invalid_config("devicePixelRatio", "must be positive"));
        }

        let adaptive = &self.adaptive;
        for (param, value) in [
            ("adaptive.lowFpsThreshold", adaptive.low_fps_threshold),
            ("adaptive.recoveryFpsThreshold", adaptive.recovery_fps_threshold),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(VelocityError::invalid_config(param, "must be a non-negative number"));
            }
        }
        if adaptive.low_fps_threshold >= adaptive.recovery_fps_threshold {
            return Err(VelocityError::invalid_config(
                "adaptive.lowFpsThreshold",
                "must be below recoveryFpsThreshold",
            ));
        }
        if !(adaptive.reduction_factor > 0.0 && adaptive.reduction_factor < 1.0) {
            return Err(VelocityError::invalid_config(
                "adaptive.reductionFactor",
                "must be within (0, 1)",
            ));
        }
        if !(adaptive.min_particle_scale > 0.0 && adaptive.min_particle_scale <= 1.0) {
            return Err(VelocityError::invalid_config(
                "adaptive.minParticleScale",
                "must be within (0, 1]",
            ));
        }
        if adaptive.fps_history == 0 {
            return Err(VelocityError::invalid_config("adaptive.fpsHistory", "must be at least 1"));
        }

        Ok(())
    }

    /// Time between rendered frames. Saturates for rates `validate` rejects.
    pub fn frame_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.frame_rate).unwrap_or(Duration::MAX)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> VelocityResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| VelocityError::invalid_config(key, format!("{}: {:?}", e, raw))),
    }
}
