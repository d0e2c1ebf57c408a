//! Decoded vector component records as delivered by the data transport.

use crate::{GridGeometry, VelocityResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Header metadata for one component layer.
///
/// Field names follow the JSON layout used by web velocity layers so a
/// payload can be deserialized without a mapping step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordHeader {
    /// Parameter category (1 = momentum for currents, 2 = momentum for wind)
    pub parameter_category: u8,
    /// Parameter number within the category (2 = u, 3 = v)
    pub parameter_number: u8,
    /// Human readable parameter name, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_number_name: Option<String>,
    /// Unit of the values, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_unit: Option<String>,
    /// Longitude of the first grid point (degrees)
    pub lo1: f64,
    /// Latitude of the first grid point (degrees)
    pub la1: f64,
    /// Longitude increment (degrees)
    pub dx: f64,
    /// Latitude increment (degrees)
    pub dy: f64,
    /// Points along a row
    pub nx: usize,
    /// Number of rows
    pub ny: usize,
    /// Model reference time
    pub ref_time: DateTime<Utc>,
    /// Forecast offset from the reference time, in hours
    #[serde(default)]
    pub forecast_time: i64,
    /// GRIB2 scanning mode flag byte
    #[serde(default)]
    pub scan_mode: u8,
    /// Grid definition template number (0 = regular lat/lon)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_definition_template: Option<u8>,
}

impl RecordHeader {
    /// Grid geometry declared by this header, before scan-mode correction.
    pub fn geometry(&self) -> GridGeometry {
        GridGeometry {
            lo1: self.lo1,
            la1: self.la1,
            dx: self.dx,
            dy: self.dy,
            nx: self.nx,
            ny: self.ny,
        }
    }

    /// Reference time shifted by the forecast offset.
    pub fn valid_time(&self) -> DateTime<Utc> {
        self.ref_time + chrono::Duration::hours(self.forecast_time)
    }
}

/// One component layer: header plus row-major values.
///
/// `None` (JSON `null`) marks a no-data cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub header: RecordHeader,
    pub data: Vec<Option<f32>>,
}

impl VectorRecord {
    /// Parse a JSON array of records.
    pub fn from_json_array(json: &str) -> VelocityResult<Vec<VectorRecord>> {
        Ok(serde_json::from_str(json)?)
    }

    /// Value at a flat index, treating NaN as missing.
    pub fn value(&self, index: usize) -> Option<f32> {
        self.data
            .get(index)
            .copied()
            .flatten()
            .filter(|v| !v.is_nan())
    }
}
