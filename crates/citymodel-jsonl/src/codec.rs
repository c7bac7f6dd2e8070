// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line codec: one JSON object <-> one `DocumentItem`

use citymodel_model::{
    DocumentItem, DocumentMetadata, GeometryTemplate, ParseError, Result, UndecodedItem,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Member holding the item kind
const TYPE_KEY: &str = "type";

/// Deepest JSON nesting decoded; stays below `serde_json`'s recursion limit
pub const MAX_NESTING: usize = 120;

/// Deepest array/object nesting of a JSON text
///
/// Brackets inside strings are ignored. The text is not validated.
pub fn nesting_depth(text: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0;
    let mut in_string = false;
    let mut escaped = false;

    for &b in text.as_bytes() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

/// Check whether an object exposes feature structure
///
/// Anything with an identifier and geometry or children is a feature; every
/// other object stays opaque.
fn is_feature_object(object: &Map<String, Value>) -> bool {
    object.contains_key("id") && (object.contains_key("geometry") || object.contains_key("children"))
}

fn from_object<T: DeserializeOwned>(object: Map<String, Value>, line: usize) -> Result<T> {
    serde_json::from_value(Value::Object(object)).map_err(|e| ParseError::line(line, e.to_string()))
}

/// Decode one line into an item
///
/// `line` is the 1-based line number used in error messages. Lines nested
/// deeper than [`MAX_NESTING`] and feature objects that do not match the
/// model become [`DocumentItem::Undecoded`]; every other failure is an error.
pub fn decode_item(text: &str, line: usize) -> Result<DocumentItem> {
    let depth = nesting_depth(text);
    if depth > MAX_NESTING {
        return Ok(DocumentItem::Undecoded(UndecodedItem {
            id: None,
            text: text.to_string(),
            reason: format!("line {line} nests {depth} levels deep, more than {MAX_NESTING}"),
        }));
    }

    let value: Value =
        serde_json::from_str(text).map_err(|e| ParseError::line(line, e.to_string()))?;

    let Value::Object(mut object) = value else {
        return Err(ParseError::line(line, "expected a JSON object"));
    };

    let kind = object.get(TYPE_KEY).and_then(Value::as_str).map(str::to_owned);
    match kind.as_deref() {
        Some(DocumentMetadata::KIND) => {
            object.remove(TYPE_KEY);
            Ok(DocumentItem::Metadata(from_object(object, line)?))
        }
        Some(GeometryTemplate::KIND) => {
            object.remove(TYPE_KEY);
            Ok(DocumentItem::Template(from_object(object, line)?))
        }
        _ if is_feature_object(&object) => {
            let id = object.get("id").and_then(Value::as_str).map(str::to_owned);
            match serde_json::from_value(Value::Object(object)) {
                Ok(feature) => Ok(DocumentItem::Feature(feature)),
                Err(e) => Ok(DocumentItem::Undecoded(UndecodedItem {
                    id,
                    text: text.to_string(),
                    reason: format!("line {line}: {e}"),
                })),
            }
        }
        _ => Ok(DocumentItem::Opaque(Value::Object(object))),
    }
}

/// Serialize a value and put `"type": kind` in front of its members
fn tagged<T: Serialize>(kind: &str, value: &T) -> Result<Value> {
    let mut object = Map::new();
    object.insert(TYPE_KEY.to_string(), Value::from(kind));
    match serde_json::to_value(value)? {
        Value::Object(members) => object.extend(members),
        other => return Err(ParseError::format(format!("{kind} did not encode to an object: {other}"))),
    }
    Ok(Value::Object(object))
}

/// Encode one item as a single line (without trailing newline)
pub fn encode_item(item: &DocumentItem) -> Result<String> {
    let value = match item {
        DocumentItem::Metadata(metadata) => tagged(DocumentMetadata::KIND, metadata)?,
        DocumentItem::Template(template) => tagged(GeometryTemplate::KIND, template)?,
        DocumentItem::Feature(feature) => serde_json::to_value(feature)?,
        DocumentItem::Opaque(value) => return Ok(serde_json::to_string(value)?),
        DocumentItem::Undecoded(item) => return Ok(item.text.clone()),
    };
    Ok(serde_json::to_string(&value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use citymodel_model::Geometry;

    #[test]
    fn test_decode_header() {
        let item = decode_item(
            r#"{"type":"CityModel","version":"2.0","boundedBy":{"lowerCorner":[0,0,0],"upperCorner":[10,10,30]}}"#,
            1,
        )
        .unwrap();
        match item {
            DocumentItem::Metadata(m) => {
                assert_eq!(m.bounded_by.unwrap().upper_z(), 30.0);
                assert!(m.extra.is_empty());
            }
            other => panic!("Expected metadata, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_feature_with_implicit_geometry() {
        let item = decode_item(
            r#"{"id":"tree-7","type":"SolitaryVegetationObject","geometry":[{"type":"ImplicitGeometry","template":"oak","referencePoint":[3,4,12.5]}]}"#,
            2,
        )
        .unwrap();
        let DocumentItem::Feature(feature) = item else {
            panic!("Expected feature");
        };
        assert_eq!(feature.id, "tree-7");
        assert!(matches!(feature.geometry[0], Geometry::Implicit(_)));
    }

    #[test]
    fn test_decode_appearance_is_opaque() {
        let item = decode_item(r#"{"type":"Appearance","id":"app-1","theme":"rgb"}"#, 3).unwrap();
        assert!(matches!(item, DocumentItem::Opaque(_)));
        assert_eq!(item.kind(), Some("Appearance"));
    }

    #[test]
    fn test_decode_error_has_line_number() {
        let err = decode_item(r#"{"id": "b1", "geometry": [ }"#, 17).unwrap_err();
        assert!(matches!(err, ParseError::Line { line: 17, .. }));

        let err = decode_item("[1, 2, 3]", 4).unwrap_err();
        assert!(err.to_string().contains("expected a JSON object"));
    }

    #[test]
    fn test_malformed_feature_is_kept_verbatim() {
        let text = r#"{"id":"t1","type":"SolitaryVegetationObject","geometry":[{"type":"ImplicitGeometry","template":"oak","referencePoint":[1,2,3],"transformationMatrix":[1,0,0,0,0,1,0,0,0,0,1,0]}]}"#;
        let item = decode_item(text, 5).unwrap();
        let DocumentItem::Undecoded(undecoded) = &item else {
            panic!("Expected undecoded item, got {:?}", item);
        };
        assert_eq!(undecoded.id.as_deref(), Some("t1"));
        assert!(undecoded.reason.contains("implicit geometry"));
        assert!(!item.is_feature());
        assert_eq!(encode_item(&item).unwrap(), text);
    }

    #[test]
    fn test_nesting_depth_ignores_strings() {
        assert_eq!(nesting_depth(r#"{"a":[[1]],"b":"[[[[{{"}"#), 3);
        assert_eq!(nesting_depth(r#"{"a":"\"[["}"#), 1);
        assert_eq!(nesting_depth("42"), 0);
    }

    #[test]
    fn test_deep_line_is_undecoded() {
        let text = format!("{}{}", "[".repeat(MAX_NESTING + 1), "]".repeat(MAX_NESTING + 1));
        let item = decode_item(&text, 9).unwrap();
        assert!(matches!(item, DocumentItem::Undecoded(UndecodedItem { id: None, .. })));
        assert_eq!(encode_item(&item).unwrap(), text);
    }

    #[test]
    fn test_encode_puts_type_first() {
        let template = GeometryTemplate::new("oak", vec![vec![[0.0, 0.0, -0.5]]]);
        let line = encode_item(&DocumentItem::Template(template)).unwrap();
        assert!(line.starts_with(r#"{"type":"GeometryTemplate","id":"oak""#));
    }

    #[test]
    fn test_opaque_round_trip_is_verbatim() {
        let text = r##"{"type":"Appearance","surfaceData":[{"target":"#poly1","uv":[0.1,0.2]}]}"##;
        let item = decode_item(text, 1).unwrap();
        assert_eq!(encode_item(&item).unwrap(), text);
    }
}
