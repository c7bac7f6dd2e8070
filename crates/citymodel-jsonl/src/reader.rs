// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Streaming line reader

use crate::codec::decode_item;
use citymodel_model::{DocumentItem, DocumentMetadata, DocumentReader, Result, SkipFilter};
use std::io::BufRead;

/// Streaming reader over line-delimited JSON
///
/// Reads one line per item. Items whose kind is in the skip filter are
/// dropped; a skipped header is kept as parent context.
pub struct JsonlReader<R> {
    input: R,
    buffer: String,
    line: usize,
    skip: SkipFilter,
    parent: Option<DocumentMetadata>,
}

impl<R: BufRead> JsonlReader<R> {
    /// Create a reader that skips nothing
    pub fn new(input: R) -> Self {
        Self {
            input,
            buffer: String::new(),
            line: 0,
            skip: SkipFilter::none(),
            parent: None,
        }
    }

    /// Set the skip filter
    pub fn with_skip_filter(mut self, skip: SkipFilter) -> Self {
        self.skip = skip;
        self
    }

    /// Number of lines consumed so far
    pub fn line(&self) -> usize {
        self.line
    }

    /// Read the next non-blank line into the buffer
    fn next_line(&mut self) -> Result<bool> {
        loop {
            self.buffer.clear();
            if self.input.read_line(&mut self.buffer)? == 0 {
                return Ok(false);
            }
            self.line += 1;
            if !self.buffer.trim().is_empty() {
                return Ok(true);
            }
        }
    }
}

impl<R: BufRead> DocumentReader for JsonlReader<R> {
    fn next_item(&mut self) -> Result<Option<DocumentItem>> {
        while self.next_line()? {
            let item = decode_item(self.buffer.trim_end(), self.line)?;
            if !self.skip.skips(&item) {
                return Ok(Some(item));
            }
            if let DocumentItem::Metadata(metadata) = item {
                self.parent = Some(metadata);
            }
        }
        Ok(None)
    }

    fn parent_context(&self) -> Option<&DocumentMetadata> {
        self.parent.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citymodel_model::ParseError;
    use std::io::Cursor;

    const TEST_DOC: &str = r#"{"type":"CityModel","version":"2.0","boundedBy":{"lowerCorner":[0,0,5],"upperCorner":[9,9,40]}}

{"id":"b1","type":"Building","geometry":[{"type":"Solid","rings":[[[0,0,5],[1,0,5],[1,1,40]]]}]}
{"type":"Appearance","theme":"rgb"}
"#;

    #[test]
    fn test_reads_all_items_in_order() {
        let mut reader = JsonlReader::new(Cursor::new(TEST_DOC));
        let kinds: Vec<String> = std::iter::from_fn(|| reader.next_item().unwrap())
            .map(|item| item.kind().unwrap_or_default().to_string())
            .collect();
        assert_eq!(kinds, vec!["CityModel", "Building", "Appearance"]);
        assert!(reader.parent_context().is_none());
    }

    #[test]
    fn test_skipped_header_becomes_parent_context() {
        let mut reader = JsonlReader::new(Cursor::new(TEST_DOC))
            .with_skip_filter(SkipFilter::none().skip(DocumentMetadata::KIND));

        let first = reader.next_item().unwrap().unwrap();
        assert!(first.is_feature());

        let parent = reader.parent_context().unwrap();
        assert_eq!(parent.bounded_by.unwrap().lower_z(), 5.0);
    }

    #[test]
    fn test_error_reports_physical_line() {
        let doc = "{\"type\":\"CityModel\"}\n\n{\"id\":\"b1\",\"geometry\":oops}\n";
        let mut reader = JsonlReader::new(Cursor::new(doc));
        reader.next_item().unwrap();
        let err = reader.next_item().unwrap_err();
        assert!(matches!(err, ParseError::Line { line: 3, .. }));
    }

    #[test]
    fn test_empty_input() {
        let mut reader = JsonlReader::new(Cursor::new(""));
        assert!(reader.next_item().unwrap().is_none());
        assert_eq!(reader.line(), 0);
    }
}
