//! Pairing of u and v component records.

use serde::Serialize;
use velocity_common::VectorRecord;

/// Reads matching u/v values out of two component records.
#[derive(Debug, Clone, Copy)]
pub struct WindBuilder<'a> {
    u: &'a VectorRecord,
    v: &'a VectorRecord,
}

impl<'a> WindBuilder<'a> {
    /// Pair two records. Geometry agreement is checked by the decoder.
    pub fn new(u: &'a VectorRecord, v: &'a VectorRecord) -> Self {
        Self { u, v }
    }

    /// The `[u, v]` pair at a flat row-major index, or `None` when either
    /// component is missing there.
    pub fn data(&self, index: usize) -> Option<[f32; 2]> {
        Some([self.u.value(index)?, self.v.value(index)?])
    }

    /// Number of values in each component.
    pub fn len(&self) -> usize {
        self.u.data.len().min(self.v.data.len())
    }

    /// Check if there are no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value ranges over every point where both components are present.
    pub fn ranges(&self) -> ComponentRanges {
        let mut ranges = ComponentRanges::default();
        for index in 0..self.len() {
            match self.data(index) {
                Some([u, v]) => ranges.include(u, v),
                None => ranges.missing_points += 1,
            }
        }
        ranges
    }
}

/// Summary statistics of a decoded vector payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentRanges {
    pub u_min: f32,
    pub u_max: f32,
    pub v_min: f32,
    pub v_max: f32,
    pub speed_max: f32,
    pub valid_points: usize,
    pub missing_points: usize,
}

impl Default for ComponentRanges {
    fn default() -> Self {
        Self {
            u_min: f32::INFINITY,
            u_max: f32::NEG_INFINITY,
            v_min: f32::INFINITY,
            v_max: f32::NEG_INFINITY,
            speed_max: 0.0,
            valid_points: 0,
            missing_points: 0,
        }
    }
}

impl ComponentRanges {
    fn include(&mut self, u: f32, v: f32) {
        self.u_min = self.u_min.min(u);
        self.u_max = self.u_max.max(u);
        self.v_min = self.v_min.min(v);
        self.v_max = self.v_max.max(v);
        self.speed_max = self.speed_max.max((u * u + v * v).sqrt());
        self.valid_points += 1;
    }

    /// Check if any point carried data.
    pub fn has_data(&self) -> bool {
        self.valid_points > 0
    }
}
