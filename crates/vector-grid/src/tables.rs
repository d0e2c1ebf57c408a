//! Parameter discriminator table for vector component records.
//!
//! Records are identified by their GRIB2 (category, number) pair. Both the
//! oceanographic (category 1) and meteorological (category 2) momentum
//! tables put the eastward component at number 2 and the northward
//! component at number 3.

use velocity_common::RecordHeader;

/// Role of a record within a vector payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Eastward component (UGRD, UOGRD)
    U,
    /// Northward component (VGRD, VOGRD)
    V,
    /// Any other layer, carried along but not animated
    Scalar,
}

impl ComponentKind {
    /// Classify a (category, number) pair.
    pub fn from_discriminator(category: u8, number: u8) -> Self {
        match (category, number) {
            (1, 2) | (2, 2) => ComponentKind::U,
            (1, 3) | (2, 3) => ComponentKind::V,
            _ => ComponentKind::Scalar,
        }
    }

    /// Classify a record header.
    pub fn of(header: &RecordHeader) -> Self {
        Self::from_discriminator(header.parameter_category, header.parameter_number)
    }

    /// Short parameter name used in logs.
    pub fn short_name(&self) -> &'static str {
        match self {
            ComponentKind::U => "u",
            ComponentKind::V => "v",
            ComponentKind::Scalar => "scalar",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wind_components() {
        assert_eq!(ComponentKind::from_discriminator(2, 2), ComponentKind::U);
        assert_eq!(ComponentKind::from_discriminator(2, 3), ComponentKind::V);
    }

    #[test]
    fn test_current_components() {
        assert_eq!(ComponentKind::from_discriminator(1, 2), ComponentKind::U);
        assert_eq!(ComponentKind::from_discriminator(1, 3), ComponentKind::V);
    }

    #[test]
    fn test_other_parameters_are_scalar() {
        // Temperature (0, 0) and wind speed (2, 1)
        assert_eq!(ComponentKind::from_discriminator(0, 0), ComponentKind::Scalar);
        assert_eq!(ComponentKind::from_discriminator(2, 1), ComponentKind::Scalar);
    }
}
