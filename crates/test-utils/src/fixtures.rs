//! Common test fixtures for velocity layer tests.
//!
//! This module provides pre-defined extents, layouts and payloads that
//! represent common scenarios.

use velocity_common::GeoExtent;

use crate::generators::GridLayout;

/// Common geographic extents for testing.
pub mod extent {
    use super::GeoExtent;

    /// Whole globe within web-mercator latitudes
    pub const WORLD: GeoExtent = GeoExtent {
        west: -180.0,
        south: -85.0,
        east: 180.0,
        north: 85.0,
    };

    /// Angola coast and the Benguela current
    pub const ANGOLA: GeoExtent = GeoExtent {
        west: 8.0,
        south: -18.5,
        east: 24.0,
        north: -4.0,
    };

    /// Continental United States
    pub const CONUS: GeoExtent = GeoExtent {
        west: -130.0,
        south: 20.0,
        east: -60.0,
        north: 55.0,
    };

    /// High latitude strip where projection distortion is strong
    pub const ARCTIC: GeoExtent = GeoExtent {
        west: -40.0,
        south: 60.0,
        east: 40.0,
        north: 80.0,
    };
}

/// The 2x2 grid used in the interpolation scenarios:
/// λ0 = 0, φ0 = 10, Δλ = Δφ = 10.
pub fn scenario_layout() -> GridLayout {
    GridLayout::new(0.0, 10.0, 10.0, 10.0, 2, 2)
}

/// A one-degree global layout (continuous in longitude).
pub fn global_layout() -> GridLayout {
    GridLayout::global(1.0)
}

/// Regional one-degree layout covering the Angola extent with margin.
pub fn angola_layout() -> GridLayout {
    GridLayout::new(5.0, -1.0, 1.0, 1.0, 23, 21)
}

/// A minimal JSON payload in the web velocity layer format.
pub const SAMPLE_PAYLOAD_JSON: &str = r#"[
  {
    "header": {
      "parameterCategory": 2,
      "parameterNumber": 2,
      "parameterNumberName": "U-component_of_wind",
      "parameterUnit": "m.s-1",
      "lo1": 0.0, "la1": 10.0, "dx": 10.0, "dy": 10.0,
      "nx": 2, "ny": 2,
      "refTime": "2024-03-01T00:00:00.000Z",
      "forecastTime": 6,
      "scanMode": 0,
      "gridDefinitionTemplate": 0
    },
    "data": [1.0, 1.0, 1.0, 1.0]
  },
  {
    "header": {
      "parameterCategory": 2,
      "parameterNumber": 3,
      "parameterNumberName": "V-component_of_wind",
      "parameterUnit": "m.s-1",
      "lo1": 0.0, "la1": 10.0, "dx": 10.0, "dy": 10.0,
      "nx": 2, "ny": 2,
      "refTime": "2024-03-01T00:00:00.000Z",
      "forecastTime": 6,
      "scanMode": 0,
      "gridDefinitionTemplate": 0
    },
    "data": [0.0, 0.0, 0.0, 0.0]
  }
]"#;
