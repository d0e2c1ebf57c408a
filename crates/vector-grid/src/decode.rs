//! Grid decoding from component records.
//!
//! The decoder locates the u and v layers in a payload, validates that
//! they describe the same regular lat/lon lattice, applies the scan-mode
//! sign correction and produces an immutable [`Grid`].

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use velocity_common::{RecordHeader, ScanMode, VectorRecord};

use crate::builder::{ComponentRanges, WindBuilder};
use crate::error::DecodeError;
use crate::grid::Grid;
use crate::tables::ComponentKind;

/// Result of a successful decode.
#[derive(Debug, Clone)]
pub struct DecodedGrid {
    /// The addressable vector grid.
    pub grid: Grid,
    /// Model reference time of the u component.
    pub reference_time: DateTime<Utc>,
    /// Reference time plus the forecast offset.
    pub valid_time: DateTime<Utc>,
    /// Scan mode declared by the records.
    pub scan_mode: ScanMode,
    /// Value ranges of the paired components.
    pub ranges: ComponentRanges,
}

/// Decode an ordered list of records into a vector grid.
///
/// The first u-typed and first v-typed record are used; scalar layers are
/// ignored. Fails without producing a grid when components are missing,
/// when the grid template or scan mode is unsupported, or when the two
/// components disagree on geometry.
pub fn decode(records: &[VectorRecord]) -> Result<DecodedGrid, DecodeError> {
    let u_record = records
        .iter()
        .find(|r| ComponentKind::of(&r.header) == ComponentKind::U);
    let v_record = records
        .iter()
        .find(|r| ComponentKind::of(&r.header) == ComponentKind::V);

    let (u_record, v_record) = match (u_record, v_record) {
        (Some(u), Some(v)) => (u, v),
        (u, v) => {
            return Err(DecodeError::MissingComponents {
                found: u.is_some() as usize + v.is_some() as usize,
            })
        }
    };

    check_template(&u_record.header)?;
    check_template(&v_record.header)?;

    let scan_mode =
        ScanMode::from_grib2_flag(u_record.header.scan_mode).map_err(DecodeError::UnsupportedScanMode)?;
    if v_record.header.scan_mode != u_record.header.scan_mode {
        return Err(DecodeError::GeometryMismatch(format!(
            "scan mode {:#04x} vs {:#04x}",
            u_record.header.scan_mode, v_record.header.scan_mode
        )));
    }

    let geometry = u_record.header.geometry();
    let v_geometry = v_record.header.geometry();
    if geometry != v_geometry {
        return Err(DecodeError::GeometryMismatch(format!(
            "{:?} vs {:?}",
            geometry, v_geometry
        )));
    }

    if geometry.is_empty() {
        return Err(DecodeError::EmptyGrid);
    }
    if !valid_spacing(geometry.dx) || !valid_spacing(geometry.dy) {
        return Err(DecodeError::InvalidSpacing);
    }

    check_length("u", u_record, geometry.len())?;
    check_length("v", v_record, geometry.len())?;

    let (dx, dy) = scan_mode.signed_spacing(geometry.dx, geometry.dy);
    let builder = WindBuilder::new(u_record, v_record);
    let cells: Vec<Option<[f32; 2]>> = (0..geometry.len()).map(|p| builder.data(p)).collect();
    let ranges = builder.ranges();

    let grid = Grid::from_cells(geometry.lo1, geometry.la1, dx, dy, geometry.nx, geometry.ny, cells);

    debug!(
        nx = geometry.nx,
        ny = geometry.ny,
        dx = dx,
        dy = dy,
        continuous = grid.is_continuous(),
        "Built vector grid"
    );
    info!(
        valid_time = %u_record.header.valid_time(),
        u_min = ranges.u_min,
        u_max = ranges.u_max,
        v_min = ranges.v_min,
        v_max = ranges.v_max,
        missing_points = ranges.missing_points,
        "Decoded vector payload"
    );

    Ok(DecodedGrid {
        grid,
        reference_time: u_record.header.ref_time,
        valid_time: u_record.header.valid_time(),
        scan_mode,
        ranges,
    })
}

fn check_template(header: &RecordHeader) -> Result<(), DecodeError> {
    match header.grid_definition_template {
        None | Some(0) => Ok(()),
        Some(template) => Err(DecodeError::UnsupportedTemplate(template)),
    }
}

fn check_length(
    component: &'static str,
    record: &VectorRecord,
    expected: usize,
) -> Result<(), DecodeError> {
    if record.data.len() != expected {
        return Err(DecodeError::DataLength {
            component,
            expected,
            actual: record.data.len(),
        });
    }
    Ok(())
}

fn valid_spacing(spacing: f64) -> bool {
    spacing.is_finite() && spacing != 0.0
}
