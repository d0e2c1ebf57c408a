//! Particle pool: advection, ageing, respawn and colour bucketing.

use rand::rngs::StdRng;
use rand::Rng;
use renderer::{ColorScale, Segment};
use tracing::debug;
use velocity_common::PixelBounds;

use crate::config::VelocityConfig;
use crate::field::ScreenField;

/// Respawn draws attempted before settling for the last one.
pub const MAX_RESPAWN_ATTEMPTS: usize = 30;

/// One animated particle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    /// Trail end for the current frame
    pub xt: f32,
    pub yt: f32,
    pub age: u32,
}

/// Fixed-capacity pool of particles bound to a screen field.
#[derive(Debug)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    buckets: Vec<Vec<usize>>,
    rng: StdRng,
    max_age: u32,
    min_velocity: f32,
    max_velocity: f32,
    multiplier: f64,
    device_reduction: f64,
    base_count: usize,
    scale: f64,
    color_scale: ColorScale,
}

impl ParticleSystem {
    pub fn new(config: &VelocityConfig, rng: StdRng) -> Self {
        Self {
            particles: Vec::new(),
            buckets: vec![Vec::new(); config.color_scale.len()],
            rng,
            max_age: config.particle_age,
            min_velocity: config.min_velocity,
            max_velocity: config.max_velocity,
            multiplier: config.particle_multiplier,
            device_reduction: config.device.particle_reduction(),
            base_count: 0,
            scale: 1.0,
            color_scale: config.color_scale.clone(),
        }
    }

    /// Particle budget for `bounds` before load shedding.
    pub fn budget_for(&self, bounds: &PixelBounds) -> usize {
        (bounds.area() as f64 * self.multiplier * self.device_reduction).round() as usize
    }

    /// Fill the pool for a freshly built field.
    ///
    /// Particles get random positions over defined data and random ages so
    /// respawns are spread over time.
    pub fn populate(&mut self, field: &ScreenField) {
        self.base_count = self.budget_for(&field.bounds());
        self.particles.clear();
        self.clear_buckets();

        let target = self.target_count();
        self.particles.reserve(target);
        for _ in 0..target {
            self.spawn(field);
        }

        debug!(
            particles = self.particles.len(),
            base = self.base_count,
            scale = self.scale,
            "Populated particle pool"
        );
    }

    /// Drop every particle and the trail buckets.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.clear_buckets();
        self.base_count = 0;
    }

    /// Load shedding scale in `(0, 1]`, applied on the next evolve.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale.clamp(0.0, 1.0);
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Particle count the pool converges to.
    pub fn target_count(&self) -> usize {
        (self.base_count as f64 * self.scale).round() as usize
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn max_age(&self) -> u32 {
        self.max_age
    }

    /// Particle indices per colour bucket from the last evolve.
    pub fn buckets(&self) -> &[Vec<usize>] {
        &self.buckets
    }

    /// Colour of a bucket.
    pub fn bucket_color(&self, bucket: usize) -> Option<[u8; 4]> {
        self.color_scale.color(bucket)
    }

    /// Trail segments of one bucket, from current position to target.
    pub fn bucket_segments(&self, bucket: usize) -> Vec<Segment> {
        self.buckets
            .get(bucket)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| {
                        let p = &self.particles[i];
                        Segment::new(p.x, p.y, p.xt, p.yt)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Advance every particle by one tick.
    pub fn evolve(&mut self, field: &ScreenField) {
        self.clear_buckets();
        self.resize_to_target(field);

        let bounds = field.bounds();
        let max_age = self.max_age;
        let bucket_count = self.buckets.len();

        for index in 0..self.particles.len() {
            if self.particles[index].age > max_age {
                let (x, y) = self.random_position(field);
                let particle = &mut self.particles[index];
                *particle = Particle {
                    x,
                    y,
                    xt: x,
                    yt: y,
                    age: 0,
                };
            }

            let particle = &mut self.particles[index];
            match field.sample(particle.x, particle.y) {
                None => particle.age = max_age,
                Some(vector) => {
                    let xt = particle.x + vector.u;
                    let yt = particle.y + vector.v;
                    if !bounds.contains(xt, yt) {
                        // Leaving the view; respawn on the next tick
                        particle.age = max_age;
                    } else if field.is_defined(xt, yt) {
                        particle.xt = xt;
                        particle.yt = yt;
                        if bucket_count > 0 {
                            let bucket = self.color_scale.index_for(
                                vector.magnitude,
                                self.min_velocity,
                                self.max_velocity,
                            );
                            self.buckets[bucket].push(index);
                        }
                    } else {
                        // Moves through a data hole without drawing
                        particle.x = xt;
                        particle.y = yt;
                    }
                }
            }
            particle.age = particle.age.saturating_add(1);
        }
    }

    /// Move every drawn particle to its trail end.
    pub fn commit_trails(&mut self) {
        for bucket in &self.buckets {
            for &i in bucket {
                let p = &mut self.particles[i];
                p.x = p.xt;
                p.y = p.yt;
            }
        }
    }

    fn clear_buckets(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    fn resize_to_target(&mut self, field: &ScreenField) {
        let target = self.target_count();
        if self.particles.len() > target {
            self.particles.truncate(target);
        } else {
            while self.particles.len() < target {
                self.spawn(field);
            }
        }
    }

    fn spawn(&mut self, field: &ScreenField) {
        let (x, y) = self.random_position(field);
        let age = if self.max_age > 0 {
            self.rng.gen_range(0..self.max_age)
        } else {
            0
        };
        self.particles.push(Particle {
            x,
            y,
            xt: x,
            yt: y,
            age,
        });
    }

    /// Rejection-sample an integer position over defined data.
    fn random_position(&mut self, field: &ScreenField) -> (f32, f32) {
        let bounds = field.bounds();
        if bounds.is_empty() {
            return (bounds.x as f32, bounds.y as f32);
        }

        let mut position = (bounds.x as f32, bounds.y as f32);
        for _ in 0..MAX_RESPAWN_ATTEMPTS {
            let x = self.rng.gen_range(bounds.x..=bounds.x_max) as f32;
            let y = self.rng.gen_range(bounds.y..=bounds.y_max) as f32;
            position = (x, y);
            if field.is_defined(x, y) {
                break;
            }
        }
        position
    }
}
