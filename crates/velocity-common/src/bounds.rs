//! Screen-space and geographic bounds.

use serde::{Deserialize, Serialize};

/// Visible pixel region of the canvas that holds vector data.
///
/// Both corners are inclusive: a position is inside when
/// `x <= px <= x_max` and `y <= py <= y_max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBounds {
    pub x: i32,
    pub y: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl PixelBounds {
    /// Create bounds from inclusive corner coordinates.
    pub fn new(x: i32, y: i32, x_max: i32, y_max: i32) -> Self {
        Self { x, y, x_max, y_max }
    }

    /// Bounds covering an entire `width` x `height` canvas.
    pub fn full_canvas(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32 - 1, height as i32 - 1)
    }

    /// Build bounds from the projected corners of the data extent,
    /// clamped to the canvas.
    ///
    /// `upper_left` and `lower_right` are pixel positions and may lie
    /// outside the canvas when the data covers more than the view.
    pub fn from_corners(
        upper_left: (f64, f64),
        lower_right: (f64, f64),
        width: u32,
        height: u32,
    ) -> Self {
        let canvas_x_max = width as i32 - 1;
        let canvas_y_max = height as i32 - 1;

        let x = (upper_left.0.round() as i32).clamp(0, canvas_x_max.max(0));
        let y = (upper_left.1.floor() as i32).clamp(0, canvas_y_max.max(0));
        let x_max = (lower_right.0.ceil() as i32).clamp(x, canvas_x_max.max(x));
        let y_max = (lower_right.1.ceil() as i32).clamp(y, canvas_y_max.max(y));

        Self { x, y, x_max, y_max }
    }

    /// Number of pixel columns covered.
    pub fn width(&self) -> u32 {
        (self.x_max - self.x + 1).max(0) as u32
    }

    /// Number of pixel rows covered.
    pub fn height(&self) -> u32 {
        (self.y_max - self.y + 1).max(0) as u32
    }

    /// Covered area in pixels.
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Check if these bounds cover no pixels.
    pub fn is_empty(&self) -> bool {
        self.x_max < self.x || self.y_max < self.y
    }

    /// Check if a (possibly fractional) position lies inside the bounds.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x as f32 && px <= self.x_max as f32 && py >= self.y as f32 && py <= self.y_max as f32
    }
}

/// Geographic extent of the visible map in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoExtent {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeoExtent {
    /// Create a new extent from its edges in degrees.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// The whole globe in web-mercator friendly latitudes.
    pub fn world() -> Self {
        Self::new(-180.0, -85.0, 180.0, 85.0)
    }

    /// Parse an extent string: "west,south,east,north"
    pub fn from_bbox_string(s: &str) -> Result<Self, BoundsParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BoundsParseError::InvalidFormat(s.to_string()));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| BoundsParseError::InvalidNumber(part.to_string()))?;
        }

        let extent = Self::new(values[0], values[1], values[2], values[3]);
        if extent.south >= extent.north || extent.west >= extent.east {
            return Err(BoundsParseError::Degenerate(s.to_string()));
        }
        Ok(extent)
    }

    /// Longitude span in degrees.
    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    /// Latitude span in degrees.
    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    /// Area of the extent measured in squared radians.
    pub fn area_radians(&self) -> f64 {
        (self.lat_span().to_radians() * self.lon_span().to_radians()).abs()
    }

    /// Check if a point is contained within this extent.
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        lon >= self.west && lon <= self.east && lat >= self.south && lat <= self.north
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BoundsParseError {
    #[error("Invalid extent format: {0}. Expected 'west,south,east,north'")]
    InvalidFormat(String),

    #[error("Invalid number in extent: {0}")]
    InvalidNumber(String),

    #[error("Extent has no area: {0}")]
    Degenerate(String),
}
