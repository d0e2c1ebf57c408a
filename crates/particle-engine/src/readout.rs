//! Cursor readouts: speed in display units and direction in degrees.

use std::fmt;

use serde::{Deserialize, Serialize};
use velocity_common::FieldVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedUnit {
    MetersPerSecond,
    KilometersPerHour,
    Knots,
    MilesPerHour,
}

impl SpeedUnit {
    pub fn label(&self) -> &'static str {
        match self {
            SpeedUnit::MetersPerSecond => "m/s",
            SpeedUnit::KilometersPerHour => "km/h",
            SpeedUnit::Knots => "kt",
            SpeedUnit::MilesPerHour => "mph",
        }
    }

    /// Convert a speed in m/s.
    pub fn convert(&self, meters_per_second: f64) -> f64 {
        match self {
            SpeedUnit::MetersPerSecond => meters_per_second,
            SpeedUnit::KilometersPerHour => meters_per_second * 3.6,
            SpeedUnit::Knots => meters_per_second / 0.514,
            SpeedUnit::MilesPerHour => meters_per_second * 2.23694,
        }
    }
}

/// How a direction angle is reported.
///
/// Bearing conventions give the direction the flow moves towards,
/// meteorological ones the direction it comes from. `Cw`/`Ccw` is the
/// sense of increasing angle from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleConvention {
    BearingCw,
    BearingCcw,
    MeteoCw,
    MeteoCcw,
}

pub fn vector_to_speed(u: f64, v: f64, unit: SpeedUnit) -> f64 {
    unit.convert(u.hypot(v))
}

/// Direction of `(u, v)` in `[0, 360)`, `None` for a zero vector.
pub fn vector_to_degrees(u: f64, v: f64, convention: AngleConvention) -> Option<f64> {
    let magnitude = u.hypot(v);
    if magnitude == 0.0 || !magnitude.is_finite() {
        return None;
    }

    let v = match convention {
        AngleConvention::BearingCcw | AngleConvention::MeteoCcw => -v,
        AngleConvention::BearingCw | AngleConvention::MeteoCw => v,
    };

    // Direction the flow comes from, clockwise from north
    let mut degrees = (u / magnitude).atan2(v / magnitude).to_degrees() + 180.0;
    if matches!(convention, AngleConvention::BearingCw | AngleConvention::MeteoCcw) {
        degrees += 180.0;
    }
    Some(degrees.rem_euclid(360.0))
}

/// Values shown for a cursor position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Readout {
    pub lon: f64,
    pub lat: f64,
    pub u: f32,
    pub v: f32,
    pub speed: f64,
    pub unit: SpeedUnit,
    pub direction: Option<f64>,
}

impl Readout {
    pub fn new(lon: f64, lat: f64, vector: FieldVector, unit: SpeedUnit, convention: AngleConvention) -> Self {
        let (u, v) = (vector.u as f64, vector.v as f64);
        Self {
            lon,
            lat,
            u: vector.u,
            v: vector.v,
            speed: vector_to_speed(u, v, unit),
            unit,
            direction: vector_to_degrees(u, v, convention),
        }
    }
}

impl fmt::Display for Readout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.speed, self.unit.label())?;
        if let Some(direction) = self.direction {
            write!(f, " @ {:.0}°", direction)?;
        }
        write!(f, " ({:.3}, {:.3})", self.lon, self.lat)
    }
}
