// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry template pre-scan
//!
//! Walks the whole document once, decoding only lines that can hold a template
//! or feature geometry. Other lines are rejected with a byte search and never
//! parsed.

use crate::codec::decode_item;
use citymodel_model::{lowest_z, DocumentItem, Feature, ParseError, Result, TemplateScan};
use memchr::memmem;
use std::io::BufRead;

/// One-pass template scanner
pub struct TemplateScanner<R> {
    input: R,
    template_finder: memmem::Finder<'static>,
    geometry_finder: memmem::Finder<'static>,
}

impl<R: BufRead> TemplateScanner<R> {
    /// Create a scanner over the given input
    pub fn new(input: R) -> Self {
        Self {
            input,
            template_finder: memmem::Finder::new(b"\"GeometryTemplate\""),
            geometry_finder: memmem::Finder::new(b"\"geometry\""),
        }
    }

    /// Scan to the end of input
    pub fn scan(mut self) -> Result<TemplateScan> {
        let mut scan = TemplateScan::default();
        let mut buffer = Vec::new();
        let mut line = 0;

        loop {
            buffer.clear();
            if self.input.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }
            line += 1;

            let is_candidate = self.template_finder.find(&buffer).is_some()
                || self.geometry_finder.find(&buffer).is_some();
            if !is_candidate {
                continue;
            }

            let text = std::str::from_utf8(&buffer)
                .map_err(|e| ParseError::line(line, e.to_string()))?;
            match decode_item(text.trim_end(), line)? {
                DocumentItem::Template(template) => scan.templates.push(template),
                DocumentItem::Feature(feature) => {
                    if let Some(z) = feature_lowest_z(&feature) {
                        scan.observed_lower_z = Some(scan.observed_lower_z.map_or(z, |m| m.min(z)));
                    }
                }
                _ => {}
            }
        }

        Ok(scan)
    }
}

/// Lowest explicit Z in a feature tree
fn feature_lowest_z(feature: &Feature) -> Option<f64> {
    let mut lowest: Option<f64> = None;
    let mut stack = vec![feature];
    while let Some(node) = stack.pop() {
        let coords = node
            .geometry
            .iter()
            .filter_map(|g| g.as_explicit())
            .flat_map(|g| g.coords());
        if let Some(z) = lowest_z(coords) {
            lowest = Some(lowest.map_or(z, |m| m.min(z)));
        }
        stack.extend(node.children.iter());
    }
    lowest
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TEST_DOC: &str = r#"{"type":"CityModel"}
{"type":"GeometryTemplate","id":"oak","rings":[[[0,0,-0.5],[0,0,8]]]}
{"type":"Appearance","theme":"rgb","role":"geometry"}
{"id":"b1","type":"Building","children":[{"id":"b1-p","type":"BuildingPart","geometry":[{"type":"Solid","rings":[[[0,0,12.5],[0,0,30]]]}]}]}
{"id":"t1","type":"SolitaryVegetationObject","geometry":[{"type":"ImplicitGeometry","template":"oak","referencePoint":[1,1,3]}]}
{"type":"GeometryTemplate","id":"bench","rings":[[[0,0,0]]]}
"#;

    #[test]
    fn test_collects_templates_in_order() {
        let scan = TemplateScanner::new(Cursor::new(TEST_DOC)).scan().unwrap();
        let ids: Vec<&str> = scan.templates.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["oak", "bench"]);
    }

    #[test]
    fn test_observes_lowest_explicit_z() {
        let scan = TemplateScanner::new(Cursor::new(TEST_DOC)).scan().unwrap();
        // Template coordinates and reference points do not count
        assert_eq!(scan.observed_lower_z, Some(12.5));
    }

    #[test]
    fn test_malformed_template_fails() {
        let doc = "{\"type\":\"GeometryTemplate\",\"id\":\"oak\",\"rings\":[[[0,0]]]}\n";
        assert!(TemplateScanner::new(Cursor::new(doc)).scan().is_err());
    }
}
