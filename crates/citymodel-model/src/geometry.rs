// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry nodes attached to features

use crate::{Coord, Members, TemplateId, Z};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Row-major 4x4 identity matrix
pub const IDENTITY_MATRIX: [f64; 16] = [
    1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
];

/// Geometry whose coordinates are stored directly on the feature
///
/// Coordinates are grouped into rings (one ring per surface boundary, curve or
/// point set), each an ordered sequence of 3D tuples.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExplicitGeometry {
    /// Geometry type name (e.g. `MultiSurface`, `Solid`)
    #[serde(rename = "type")]
    pub kind: String,
    /// Level of detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lod: Option<String>,
    /// Coordinate rings
    #[serde(default)]
    pub rings: Vec<Vec<Coord>>,
    /// Remaining members, written back verbatim
    #[serde(flatten)]
    pub extra: Members,
}

impl ExplicitGeometry {
    /// Create an explicit geometry from rings
    pub fn new(kind: impl Into<String>, rings: Vec<Vec<Coord>>) -> Self {
        Self {
            kind: kind.into(),
            lod: None,
            rings,
            extra: Members::new(),
        }
    }

    /// Iterate over all coordinates
    pub fn coords(&self) -> impl Iterator<Item = &Coord> {
        self.rings.iter().flatten()
    }

    /// Iterate mutably over all coordinates
    pub fn coords_mut(&mut self) -> impl Iterator<Item = &mut Coord> {
        self.rings.iter_mut().flatten()
    }

    /// Total coordinate count
    pub fn coord_count(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }
}

/// Geometry instantiated from a shared template
///
/// The visible position is `reference_point + transformation_matrix · p` for
/// every template coordinate `p`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplicitGeometry {
    /// Referenced template
    pub template: TemplateId,
    /// Anchor point in world coordinates
    pub reference_point: Coord,
    /// Row-major 4x4 transform applied to template coordinates; identity when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation_matrix: Option<[f64; 16]>,
    /// Remaining members, written back verbatim
    #[serde(flatten)]
    pub extra: Members,
}

impl ImplicitGeometry {
    /// Item kind name used for implicit geometry nodes
    pub const KIND: &'static str = "ImplicitGeometry";

    /// Create an implicit geometry with identity transform
    pub fn new(template: impl Into<TemplateId>, reference_point: Coord) -> Self {
        let mut extra = Members::new();
        extra.insert("type".to_string(), Self::KIND.into());
        Self {
            template: template.into(),
            reference_point,
            transformation_matrix: None,
            extra,
        }
    }

    /// Set the transform
    pub fn with_transform(mut self, matrix: [f64; 16]) -> Self {
        self.transformation_matrix = Some(matrix);
        self
    }

    /// Effective transform
    pub fn matrix(&self) -> [f64; 16] {
        self.transformation_matrix.unwrap_or(IDENTITY_MATRIX)
    }

    /// Check whether the transform is the identity
    pub fn has_identity_transform(&self) -> bool {
        self.matrix() == IDENTITY_MATRIX
    }
}

/// A geometry node: either explicit coordinates or a template reference
///
/// Nodes whose `type` is `ImplicitGeometry` must decode as template
/// instances; a malformed instance is an error, never explicit geometry.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Geometry {
    /// Template instance
    Implicit(ImplicitGeometry),
    /// Inline coordinates
    Explicit(ExplicitGeometry),
}

impl<'de> Deserialize<'de> for Geometry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let kind = value.get("type").and_then(Value::as_str);

        if kind == Some(ImplicitGeometry::KIND) {
            ImplicitGeometry::deserialize(value)
                .map(Geometry::Implicit)
                .map_err(|e| de::Error::custom(format!("invalid implicit geometry: {e}")))
        } else {
            ExplicitGeometry::deserialize(value)
                .map(Geometry::Explicit)
                .map_err(de::Error::custom)
        }
    }
}

impl Geometry {
    /// Check if this is a template instance
    pub fn is_implicit(&self) -> bool {
        matches!(self, Geometry::Implicit(_))
    }

    /// Get as explicit geometry
    pub fn as_explicit(&self) -> Option<&ExplicitGeometry> {
        match self {
            Geometry::Explicit(g) => Some(g),
            _ => None,
        }
    }

    /// Get as implicit geometry
    pub fn as_implicit(&self) -> Option<&ImplicitGeometry> {
        match self {
            Geometry::Implicit(g) => Some(g),
            _ => None,
        }
    }
}

/// Reusable geometry stored once and instantiated by [`ImplicitGeometry`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryTemplate {
    /// Template identifier
    pub id: TemplateId,
    /// Template coordinates in local space
    #[serde(default)]
    pub rings: Vec<Vec<Coord>>,
    /// Remaining members, written back verbatim
    #[serde(flatten)]
    pub extra: Members,
}

impl GeometryTemplate {
    /// Item kind name of template items
    pub const KIND: &'static str = "GeometryTemplate";

    /// Create a template from rings
    pub fn new(id: impl Into<TemplateId>, rings: Vec<Vec<Coord>>) -> Self {
        Self {
            id: id.into(),
            rings,
            extra: Members::new(),
        }
    }

    /// Iterate over all local coordinates
    pub fn coords(&self) -> impl Iterator<Item = &Coord> {
        self.rings.iter().flatten()
    }
}

/// Lowest finite Z among the given coordinates
pub fn lowest_z<'a>(coords: impl IntoIterator<Item = &'a Coord>) -> Option<f64> {
    coords
        .into_iter()
        .map(|c| c[Z])
        .filter(|z| z.is_finite())
        .fold(None, |acc: Option<f64>, z| Some(acc.map_or(z, |m| m.min(z))))
}
