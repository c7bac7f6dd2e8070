// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reader, writer and format traits
//!
//! These traits are the seam between transformation code and a concrete
//! document encoding.

use crate::{DocumentItem, DocumentMetadata, GeometryTemplate, Result};
use std::collections::HashSet;
use std::path::Path;

/// Item kinds a reader must hide from the stream
///
/// A skipped [`DocumentMetadata`] item is still recorded and exposed through
/// [`DocumentReader::parent_context`].
#[derive(Clone, Debug, Default)]
pub struct SkipFilter {
    kinds: HashSet<String>,
}

impl SkipFilter {
    /// A filter that skips nothing
    pub fn none() -> Self {
        Self::default()
    }

    /// Add a kind to skip
    pub fn skip(mut self, kind: impl Into<String>) -> Self {
        self.kinds.insert(kind.into());
        self
    }

    /// Check whether an item kind is skipped
    pub fn is_skipped(&self, kind: &str) -> bool {
        self.kinds.contains(kind)
    }

    /// Check whether a whole item is skipped
    pub fn skips(&self, item: &DocumentItem) -> bool {
        item.kind().is_some_and(|kind| self.is_skipped(kind))
    }
}

/// Pull-based document source
///
/// Items are produced strictly in document order, one at a time.
pub trait DocumentReader {
    /// Read the next item, or `None` when the source is exhausted
    fn next_item(&mut self) -> Result<Option<DocumentItem>>;

    /// Document metadata seen so far but not yielded as an item
    fn parent_context(&self) -> Option<&DocumentMetadata>;
}

/// Document sink
///
/// Call order: [`set_metadata`](Self::set_metadata),
/// [`write_header`](Self::write_header), any number of
/// [`write_item`](Self::write_item), then [`finish`](Self::finish).
pub trait DocumentWriter {
    /// Provide the metadata emitted by the header
    fn set_metadata(&mut self, metadata: DocumentMetadata);

    /// Emit the document header
    fn write_header(&mut self) -> Result<()>;

    /// Emit one stream item
    fn write_item(&mut self, item: &DocumentItem) -> Result<()>;

    /// Flush and close the sink
    fn finish(&mut self) -> Result<()>;
}

/// Result of a geometry template pre-scan
#[derive(Clone, Debug, Default)]
pub struct TemplateScan {
    /// All templates found, in document order
    pub templates: Vec<GeometryTemplate>,
    /// Lowest finite Z found in explicit feature geometry
    pub observed_lower_z: Option<f64>,
}

/// A concrete document encoding
///
/// Formats are plain values handed to the code that needs them; there is no
/// global registry.
pub trait DocumentFormat: Send + Sync {
    /// Human readable name
    fn name(&self) -> &str;

    /// File extensions (without dot) recognised by this format
    fn extensions(&self) -> &[&str];

    /// Open a streaming reader
    fn open_reader(&self, path: &Path, skip: &SkipFilter) -> Result<Box<dyn DocumentReader>>;

    /// Create a writer, truncating any existing file
    fn open_writer(&self, path: &Path) -> Result<Box<dyn DocumentWriter>>;

    /// Scan the whole document once for geometry templates
    fn scan_templates(&self, path: &Path) -> Result<TemplateScan>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Feature;

    #[test]
    fn test_skip_filter() {
        let filter = SkipFilter::none().skip(DocumentMetadata::KIND);
        assert!(filter.skips(&DocumentItem::Metadata(DocumentMetadata::default())));
        assert!(!filter.skips(&DocumentItem::Feature(Feature::new("b1", "Building"))));
        assert!(!filter.skips(&DocumentItem::Opaque(serde_json::json!({"theme": "x"}))));
    }
}
