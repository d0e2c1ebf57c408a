//! Addressable vector grid and bilinear sampling.

use velocity_common::FieldVector;

/// Decoded 2D array of `[u, v]` samples over a lat/lon lattice.
///
/// Rows run from `la1` in steps of `dy`, columns from `lo1` in steps of
/// `dx`; both spacings already carry the scan-mode sign. When a row spans
/// the full globe the first column is repeated after the last one, so the
/// sampler never has to branch on longitude wraparound.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    lo1: f64,
    la1: f64,
    dx: f64,
    dy: f64,
    ni: usize,
    nj: usize,
    continuous: bool,
    row_width: usize,
    cells: Vec<Option<[f32; 2]>>,
}

impl Grid {
    /// Build a grid from row-major cells.
    ///
    /// `cells` must hold `ni * nj` entries; the decoder guarantees this.
    pub(crate) fn from_cells(
        lo1: f64,
        la1: f64,
        dx: f64,
        dy: f64,
        ni: usize,
        nj: usize,
        cells: Vec<Option<[f32; 2]>>,
    ) -> Self {
        let continuous = ni as f64 * dx.abs() >= 360.0;
        let row_width = if continuous { ni + 1 } else { ni };

        let cells = if continuous {
            let mut wrapped = Vec::with_capacity(row_width * nj);
            for row in cells.chunks(ni) {
                wrapped.extend_from_slice(row);
                wrapped.push(row[0]);
            }
            wrapped
        } else {
            cells
        };

        Self {
            lo1,
            la1,
            dx,
            dy,
            ni,
            nj,
            continuous,
            row_width,
            cells,
        }
    }

    /// Longitude of the first column (λ0).
    pub fn lo1(&self) -> f64 {
        self.lo1
    }

    /// Latitude of the first row (φ0).
    pub fn la1(&self) -> f64 {
        self.la1
    }

    /// Signed longitude spacing (Δλ).
    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// Signed latitude spacing (Δφ).
    pub fn dy(&self) -> f64 {
        self.dy
    }

    /// Number of data columns, excluding the wraparound duplicate.
    pub fn ni(&self) -> usize {
        self.ni
    }

    /// Number of rows.
    pub fn nj(&self) -> usize {
        self.nj
    }

    /// Whether rows wrap around the globe.
    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    /// Stored sample at column `i`, row `j`.
    ///
    /// For continuous grids `i == ni` addresses the duplicated first column.
    pub fn cell(&self, i: usize, j: usize) -> Option<[f32; 2]> {
        if i >= self.row_width || j >= self.nj {
            return None;
        }
        self.cells[j * self.row_width + i]
    }

    /// Interpolated vector at a geographic position, or `None` when any of
    /// the four surrounding cells is outside the grid or holds no data.
    pub fn interpolate(&self, lon: f64, lat: f64) -> Option<FieldVector> {
        let i = floor_mod((lon - self.lo1) * self.dx.signum(), 360.0) / self.dx.abs();
        let j = (self.la1 - lat) / self.dy;

        if !i.is_finite() || !j.is_finite() || j < 0.0 {
            return None;
        }

        let fi = i.floor() as usize;
        let fj = j.floor() as usize;
        let ci = fi + 1;
        let cj = fj + 1;

        let g00 = self.cell(fi, fj)?;
        let g10 = self.cell(ci, fj)?;
        let g01 = self.cell(fi, cj)?;
        let g11 = self.cell(ci, cj)?;

        Some(bilinear_interpolate_vector(
            i - fi as f64,
            j - fj as f64,
            g00,
            g10,
            g01,
            g11,
        ))
    }
}

/// Area-weighted bilinear blend of four `[u, v]` samples.
///
/// `x` and `y` are the fractional offsets from `g00` towards `g10` and
/// `g01`. The magnitude is recomputed from the blended components.
pub fn bilinear_interpolate_vector(
    x: f64,
    y: f64,
    g00: [f32; 2],
    g10: [f32; 2],
    g01: [f32; 2],
    g11: [f32; 2],
) -> FieldVector {
    let rx = 1.0 - x;
    let ry = 1.0 - y;
    let a = rx * ry;
    let b = x * ry;
    let c = rx * y;
    let d = x * y;

    let u = g00[0] as f64 * a + g10[0] as f64 * b + g01[0] as f64 * c + g11[0] as f64 * d;
    let v = g00[1] as f64 * a + g10[1] as f64 * b + g01[1] as f64 * c + g11[1] as f64 * d;

    FieldVector::with_magnitude(u as f32, v as f32, (u * u + v * v).sqrt() as f32)
}

/// Modulo that always returns a value in `[0, n)` for positive `n`.
pub fn floor_mod(a: f64, n: f64) -> f64 {
    a - n * (a / n).floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(ni: usize, nj: usize, value: [f32; 2]) -> Vec<Option<[f32; 2]>> {
        vec![Some(value); ni * nj]
    }

    #[test]
    fn test_floor_mod() {
        assert_eq!(floor_mod(370.0, 360.0), 10.0);
        assert_eq!(floor_mod(-10.0, 360.0), 350.0);
        assert_eq!(floor_mod(0.0, 360.0), 0.0);
    }

    #[test]
    fn test_bilinear_corners_and_center() {
        let g00 = [1.0, 0.0];
        let g10 = [2.0, 0.0];
        let g01 = [3.0, 0.0];
        let g11 = [4.0, 0.0];

        assert_eq!(bilinear_interpolate_vector(0.0, 0.0, g00, g10, g01, g11).u, 1.0);
        assert_eq!(bilinear_interpolate_vector(1.0, 0.0, g00, g10, g01, g11).u, 2.0);
        assert_eq!(bilinear_interpolate_vector(0.0, 1.0, g00, g10, g01, g11).u, 3.0);
        assert_eq!(bilinear_interpolate_vector(1.0, 1.0, g00, g10, g01, g11).u, 4.0);

        let center = bilinear_interpolate_vector(0.5, 0.5, g00, g10, g01, g11);
        assert!((center.u - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_continuous_grid_duplicates_first_column() {
        let mut cells = uniform(4, 2, [0.0, 0.0]);
        cells[0] = Some([7.0, 1.0]);
        cells[4] = Some([8.0, 2.0]);
        let grid = Grid::from_cells(0.0, 0.0, 90.0, 10.0, 4, 2, cells);

        assert!(grid.is_continuous());
        assert_eq!(grid.cell(4, 0), Some([7.0, 1.0]));
        assert_eq!(grid.cell(4, 1), Some([8.0, 2.0]));
        assert_eq!(grid.cell(5, 0), None);
    }

    #[test]
    fn test_regional_grid_has_no_duplicate_column() {
        let grid = Grid::from_cells(0.0, 10.0, 10.0, 10.0, 2, 2, uniform(2, 2, [1.0, 0.0]));
        assert!(!grid.is_continuous());
        assert_eq!(grid.cell(2, 0), None);
    }

    #[test]
    fn test_interpolate_outside_rows() {
        let grid = Grid::from_cells(0.0, 10.0, 10.0, 10.0, 2, 2, uniform(2, 2, [1.0, 0.0]));
        // North of the first row
        assert!(grid.interpolate(5.0, 15.0).is_none());
        // South of the last row
        assert!(grid.interpolate(5.0, -5.0).is_none());
        // East of the last column on a regional grid
        assert!(grid.interpolate(15.0, 5.0).is_none());
    }
}
