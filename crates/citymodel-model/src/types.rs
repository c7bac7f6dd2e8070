// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for city-model documents
//!
//! This module defines the fundamental value types shared by readers, writers
//! and transformation code.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A 3D coordinate tuple `[x, y, z]`
pub type Coord = [f64; 3];

/// Index of the Z component within a [`Coord`]
pub const Z: usize = 2;

/// Opaque JSON members carried through a round trip unchanged
pub type Members = Map<String, Value>;

/// Type-safe geometry template identifier
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct TemplateId(pub String);

impl TemplateId {
    /// Create a new template identifier
    pub fn new(id: impl Into<String>) -> Self {
        TemplateId(id.into())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(id: &str) -> Self {
        TemplateId(id.to_string())
    }
}

impl From<String> for TemplateId {
    fn from(id: String) -> Self {
        TemplateId(id)
    }
}

/// Axis-aligned bounding box given by two corner points
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    /// Lower corner (minimum x, y, z)
    pub lower_corner: Coord,
    /// Upper corner (maximum x, y, z)
    pub upper_corner: Coord,
}

impl BoundingBox {
    /// Create a bounding box from its corners
    pub fn new(lower_corner: Coord, upper_corner: Coord) -> Self {
        Self {
            lower_corner,
            upper_corner,
        }
    }

    /// Lowest Z value of the box
    pub fn lower_z(&self) -> f64 {
        self.lower_corner[Z]
    }

    /// Highest Z value of the box
    pub fn upper_z(&self) -> f64 {
        self.upper_corner[Z]
    }
}

/// Document-level metadata (the city model header)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Document format version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Spatial reference system name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srs_name: Option<String>,
    /// Envelope of the whole document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounded_by: Option<BoundingBox>,
    /// Remaining header members, written back verbatim
    #[serde(flatten)]
    pub extra: Members,
}

impl DocumentMetadata {
    /// Item kind name of the document header
    pub const KIND: &'static str = "CityModel";

    /// Create metadata with a bounding box
    pub fn with_bounding_box(bbox: BoundingBox) -> Self {
        Self {
            bounded_by: Some(bbox),
            ..Self::default()
        }
    }
}
