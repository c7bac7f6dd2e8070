// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Features and stream items

use crate::{DocumentMetadata, Geometry, GeometryTemplate, Members};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A spatially located object (building, terrain, city furniture, ...)
///
/// Features form a tree through `children`; geometry and children are kept in
/// document order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Stable textual identifier
    pub id: String,
    /// Feature type name (e.g. `Building`, `BuildingPart`)
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// Geometry nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geometry: Vec<Geometry>,
    /// Nested child features
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Feature>,
    /// Remaining members (attributes, appearance, ...), written back verbatim
    #[serde(flatten)]
    pub extra: Members,
}

impl Feature {
    /// Create an empty feature
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            geometry: Vec::new(),
            children: Vec::new(),
            extra: Members::new(),
        }
    }

    /// Add a geometry node
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry.push(geometry);
        self
    }

    /// Add a child feature
    pub fn with_child(mut self, child: Feature) -> Self {
        self.children.push(child);
        self
    }

    /// Check whether this feature or any descendant exposes geometry
    pub fn has_geometry(&self) -> bool {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if !node.geometry.is_empty() {
                return true;
            }
            stack.extend(node.children.iter());
        }
        false
    }
}

/// One item of a document stream
/// Item that could not be decoded into the model, kept as its source text
#[derive(Clone, Debug, PartialEq)]
pub struct UndecodedItem {
    /// Identifier, when it could be read
    pub id: Option<String>,
    /// Source text, written back verbatim
    pub text: String,
    /// Why decoding failed
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DocumentItem {
    /// Document header
    Metadata(DocumentMetadata),
    /// Spatial feature
    Feature(Feature),
    /// Reusable geometry template
    Template(GeometryTemplate),
    /// Any other item (appearance data, extensions, ...), kept verbatim
    Opaque(Value),
    /// Feature-like item that failed to decode; passed through untouched
    Undecoded(UndecodedItem),
}

impl DocumentItem {
    /// Kind name of this item, if known
    pub fn kind(&self) -> Option<&str> {
        match self {
            DocumentItem::Metadata(_) => Some(DocumentMetadata::KIND),
            DocumentItem::Feature(f) => Some(f.kind.as_str()),
            DocumentItem::Template(_) => Some(GeometryTemplate::KIND),
            DocumentItem::Opaque(v) => v.get("type").and_then(Value::as_str),
            DocumentItem::Undecoded(_) => None,
        }
    }

    /// Borrow the item as a geometry-bearing feature
    ///
    /// Returns `None` for every item that does not expose geometry, so new
    /// item kinds pass through untouched.
    pub fn as_feature_mut(&mut self) -> Option<&mut Feature> {
        match self {
            DocumentItem::Feature(f) if f.has_geometry() => Some(f),
            _ => None,
        }
    }

    /// Check if this item is a feature
    pub fn is_feature(&self) -> bool {
        matches!(self, DocumentItem::Feature(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExplicitGeometry;

    fn surface(z: f64) -> Geometry {
        Geometry::Explicit(ExplicitGeometry::new(
            "MultiSurface",
            vec![vec![[0.0, 0.0, z], [1.0, 0.0, z], [1.0, 1.0, z]]],
        ))
    }

    #[test]
    fn test_has_geometry_in_descendant() {
        let feature = Feature::new("b1", "Building")
            .with_child(Feature::new("b1-p1", "BuildingPart").with_geometry(surface(2.0)));
        assert!(feature.has_geometry());
        assert!(!Feature::new("empty", "Building").has_geometry());
    }

    #[test]
    fn test_feature_without_geometry_is_not_walked() {
        let mut item = DocumentItem::Feature(Feature::new("g1", "CityObjectGroup"));
        assert!(item.as_feature_mut().is_none());
        assert!(item.is_feature());
    }

    #[test]
    fn test_opaque_kind() {
        let item = DocumentItem::Opaque(serde_json::json!({"type": "Appearance", "theme": "summer"}));
        assert_eq!(item.kind(), Some("Appearance"));
    }

    #[test]
    fn test_feature_serde_keeps_attributes() {
        let json = r#"{"id":"b1","type":"Building","attributes":{"roofType":"1000"},"geometry":[{"type":"Solid","rings":[[[0,0,0]]]}]}"#;
        let feature: Feature = serde_json::from_str(json).unwrap();
        assert_eq!(feature.kind, "Building");
        assert_eq!(feature.geometry.len(), 1);
        assert!(feature.extra.contains_key("attributes"));

        let back = serde_json::to_value(&feature).unwrap();
        assert_eq!(back["attributes"]["roofType"], "1000");
    }
}
