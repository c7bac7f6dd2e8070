// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Streaming line writer

use crate::codec::encode_item;
use citymodel_model::{DocumentItem, DocumentMetadata, DocumentWriter, ParseError, Result};
use std::io::Write;

/// Streaming writer producing line-delimited JSON
pub struct JsonlWriter<W: Write> {
    output: W,
    metadata: Option<DocumentMetadata>,
    header_written: bool,
    items_written: usize,
}

impl<W: Write> JsonlWriter<W> {
    /// Create a writer over the given sink
    pub fn new(output: W) -> Self {
        Self {
            output,
            metadata: None,
            header_written: false,
            items_written: 0,
        }
    }

    /// Number of items written after the header
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Consume the writer and return the sink
    pub fn into_inner(self) -> W {
        self.output
    }

    fn write_line(&mut self, item: &DocumentItem) -> Result<()> {
        let line = encode_item(item)?;
        self.output.write_all(line.as_bytes())?;
        self.output.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write> DocumentWriter for JsonlWriter<W> {
    fn set_metadata(&mut self, metadata: DocumentMetadata) {
        self.metadata = Some(metadata);
    }

    fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Err(ParseError::state("header already written"));
        }
        let metadata = self.metadata.take().unwrap_or_default();
        self.write_line(&DocumentItem::Metadata(metadata))?;
        self.header_written = true;
        Ok(())
    }

    fn write_item(&mut self, item: &DocumentItem) -> Result<()> {
        if !self.header_written {
            return Err(ParseError::state("item written before header"));
        }
        self.write_line(item)?;
        self.items_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }
}
