//! Grid geometry and scan-mode handling for vector component layers.

use serde::{Deserialize, Serialize};

/// Geometry of a regular lat/lon grid as declared by a record header.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Longitude of the first grid point (λ0)
    pub lo1: f64,
    /// Latitude of the first grid point (φ0)
    pub la1: f64,
    /// Longitude spacing in degrees (Δλ)
    pub dx: f64,
    /// Latitude spacing in degrees (Δφ)
    pub dy: f64,
    /// Number of points along a row (ni)
    pub nx: usize,
    /// Number of rows (nj)
    pub ny: usize,
}

impl GridGeometry {
    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }

    /// Whether a row spans the full globe, so the first column can be
    /// repeated after the last one for wraparound lookups.
    pub fn is_continuous(&self) -> bool {
        self.nx as f64 * self.dx.abs() >= 360.0
    }
}

/// Scan mode flags for grid data ordering.
///
/// Based on GRIB2 scanning mode (Flag Table 3.4). Only the direction of
/// the i and j axes can be honoured; every other flag describes a storage
/// layout the decoder does not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanMode {
    /// +i direction: false = +x (east), true = -x (west)
    pub i_negative: bool,
    /// +j direction: false = -y (south), true = +y (north)
    pub j_positive: bool,
}

impl ScanMode {
    /// Flag bit for westward i scanning.
    pub const I_NEGATIVE: u8 = 0x80;
    /// Flag bit for northward j scanning.
    pub const J_POSITIVE: u8 = 0x40;
    /// Every flag bit besides the two direction bits.
    pub const UNSUPPORTED_MASK: u8 = 0x3F;

    /// Most common mode: data starts at top-left, rows go west to east,
    /// columns go north to south.
    pub fn standard() -> Self {
        Self {
            i_negative: false,
            j_positive: false,
        }
    }

    /// Create from GRIB2 flag byte.
    ///
    /// Returns the offending bits when the flag requests a layout other
    /// than a plain row-major scan.
    pub fn from_grib2_flag(flag: u8) -> Result<Self, u8> {
        let unsupported = flag & Self::UNSUPPORTED_MASK;
        if unsupported != 0 {
            return Err(unsupported);
        }

        Ok(Self {
            i_negative: (flag & Self::I_NEGATIVE) != 0,
            j_positive: (flag & Self::J_POSITIVE) != 0,
        })
    }

    /// Apply the scan direction to the header spacings.
    pub fn signed_spacing(&self, dx: f64, dy: f64) -> (f64, f64) {
        let dx = if self.i_negative { -dx } else { dx };
        let dy = if self.j_positive { -dy } else { dy };
        (dx, dy)
    }
}

impl Default for ScanMode {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_mode_from_grib2() {
        let mode = ScanMode::from_grib2_flag(0x40).unwrap();
        assert!(!mode.i_negative);
        assert!(mode.j_positive);

        let mode = ScanMode::from_grib2_flag(0xC0).unwrap();
        assert!(mode.i_negative);
        assert!(mode.j_positive);
    }

    #[test]
    fn test_scan_mode_rejects_layout_bits() {
        assert_eq!(ScanMode::from_grib2_flag(0x20), Err(0x20));
        assert_eq!(ScanMode::from_grib2_flag(0x90), Err(0x10));
        assert_eq!(ScanMode::from_grib2_flag(0x01), Err(0x01));
    }

    #[test]
    fn test_signed_spacing() {
        let mode = ScanMode::from_grib2_flag(0xC0).unwrap();
        assert_eq!(mode.signed_spacing(1.0, 1.0), (-1.0, -1.0));
        assert_eq!(ScanMode::standard().signed_spacing(0.5, 0.5), (0.5, 0.5));
    }

    #[test]
    fn test_gfs_is_continuous() {
        let gfs = GridGeometry {
            lo1: 0.0,
            la1: 90.0,
            dx: 0.25,
            dy: 0.25,
            nx: 1440,
            ny: 721,
        };
        assert!(gfs.is_continuous());
        assert_eq!(gfs.len(), 1440 * 721);

        let regional = GridGeometry { nx: 100, ..gfs };
        assert!(!regional.is_continuous());
    }
}
