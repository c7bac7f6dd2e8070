// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Height modes and Z correction

use citymodel_model::{BoundingBox, Coord, Z};
use std::fmt;
use std::str::FromStr;

/// How the offset is interpreted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum HeightMode {
    /// Add the offset to every Z value
    #[default]
    Relative,
    /// Move the document so its lowest point lands at the offset
    Absolute,
}

impl fmt::Display for HeightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeightMode::Relative => f.write_str("relative"),
            HeightMode::Absolute => f.write_str("absolute"),
        }
    }
}

impl FromStr for HeightMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relative" => Ok(HeightMode::Relative),
            "absolute" => Ok(HeightMode::Absolute),
            other => Err(format!("unknown height mode '{other}'")),
        }
    }
}

/// Applies one additive Z correction
///
/// In absolute mode the document correction `offset - original_lower_z` is
/// fixed at construction and then used exactly like a relative offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightCorrector {
    mode: HeightMode,
    offset: f64,
    document_correction: f64,
}

impl HeightCorrector {
    /// Corrector adding `offset` to every Z
    pub fn relative(offset: f64) -> Self {
        Self {
            mode: HeightMode::Relative,
            offset,
            document_correction: offset,
        }
    }

    /// Corrector moving `original_lower_z` to `offset`
    pub fn absolute(offset: f64, original_lower_z: f64) -> Self {
        Self {
            mode: HeightMode::Absolute,
            offset,
            document_correction: offset - original_lower_z,
        }
    }

    /// Height mode
    pub fn mode(&self) -> HeightMode {
        self.mode
    }

    /// Offset as given by the user
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Constant added to every Z value
    pub fn correction(&self) -> f64 {
        match self.mode {
            HeightMode::Relative => self.offset,
            HeightMode::Absolute => self.document_correction,
        }
    }

    /// Correct a single Z value
    ///
    /// Non-finite values are returned unchanged.
    #[inline]
    pub fn correct_z(&self, z: f64) -> f64 {
        if z.is_finite() {
            z + self.correction()
        } else {
            z
        }
    }

    /// Correct the Z of a coordinate in place
    ///
    /// Returns `false` if the value was non-finite and left untouched.
    #[inline]
    pub fn correct_coord(&self, coord: &mut Coord) -> bool {
        let finite = coord[Z].is_finite();
        coord[Z] = self.correct_z(coord[Z]);
        finite
    }

    /// Shift both corners of a bounding box
    pub fn correct_bounding_box(&self, bbox: &mut BoundingBox) {
        bbox.lower_corner[Z] = self.correct_z(bbox.lower_corner[Z]);
        bbox.upper_corner[Z] = self.correct_z(bbox.upper_corner[Z]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_relative_correction() {
        let corrector = HeightCorrector::relative(10.0);
        assert_eq!(corrector.correct_z(5.0), 15.0);
        assert_eq!(corrector.correction(), 10.0);
    }

    #[test]
    fn test_absolute_correction() {
        let corrector = HeightCorrector::absolute(100.0, 20.0);
        assert_eq!(corrector.correction(), 80.0);
        assert_eq!(corrector.correct_z(25.0), 105.0);
        assert_eq!(corrector.offset(), 100.0);
    }

    #[test]
    fn test_absolute_at_original_lower_z_is_identity() {
        let corrector = HeightCorrector::absolute(34.25, 34.25);
        assert_eq!(corrector.correction(), 0.0);

        let mut bbox = BoundingBox::new([0.0, 0.0, 34.25], [1.0, 1.0, 80.0]);
        corrector.correct_bounding_box(&mut bbox);
        assert_eq!(bbox.lower_z(), 34.25);
        assert_eq!(bbox.upper_z(), 80.0);
    }

    #[test]
    fn test_non_finite_passes_through() {
        let corrector = HeightCorrector::relative(1.5);
        assert!(corrector.correct_z(f64::NAN).is_nan());
        assert_eq!(corrector.correct_z(f64::INFINITY), f64::INFINITY);

        let mut coord = [1.0, 2.0, f64::NEG_INFINITY];
        assert!(!corrector.correct_coord(&mut coord));
        assert_eq!(coord[Z], f64::NEG_INFINITY);

        let mut coord = [1.0, 2.0, 0.1];
        assert!(corrector.correct_coord(&mut coord));
        assert_relative_eq!(coord[Z], 1.6);
        assert_eq!(coord[0], 1.0);
    }

    #[test]
    fn test_bounding_box_uses_same_constant() {
        let corrector = HeightCorrector::relative(10.0);
        let mut bbox = BoundingBox::new([0.0, 0.0, 0.0], [5.0, 5.0, 12.0]);
        corrector.correct_bounding_box(&mut bbox);
        assert_eq!(bbox.lower_z(), 10.0);
        assert_eq!(bbox.upper_z(), 22.0);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("ABSOLUTE".parse::<HeightMode>(), Ok(HeightMode::Absolute));
        assert_eq!("relative".parse::<HeightMode>(), Ok(HeightMode::Relative));
        assert!("sideways".parse::<HeightMode>().is_err());
        assert_eq!(HeightMode::default().to_string(), "relative");
    }
}
