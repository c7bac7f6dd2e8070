// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CityModel JSONL - Streaming line-delimited JSON encoding
//!
//! One JSON object per line. The first line is usually the `CityModel` header;
//! every following line is a feature, a geometry template or an opaque item.
//! The reader never holds more than one line in memory.
//!
//! # Example
//!
//! ```ignore
//! use citymodel_jsonl::JsonlFormat;
//! use citymodel_model::{DocumentFormat, SkipFilter};
//!
//! let format = JsonlFormat::new();
//! let mut reader = format.open_reader(path, &SkipFilter::none())?;
//! while let Some(item) = reader.next_item()? {
//!     println!("{:?}", item.kind());
//! }
//! ```

mod codec;
mod reader;
mod scanner;
mod writer;

pub use codec::{decode_item, encode_item, nesting_depth, MAX_NESTING};
pub use reader::JsonlReader;
pub use scanner::TemplateScanner;
pub use writer::JsonlWriter;

use citymodel_model::{
    DocumentFormat, DocumentReader, DocumentWriter, Result, SkipFilter, TemplateScan,
};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Read/write buffer size
const BUFFER_SIZE: usize = 1 << 16;

/// Line-delimited JSON city-model format implementing `DocumentFormat`
#[derive(Clone, Debug)]
pub struct JsonlFormat {
    extensions: Vec<&'static str>,
}

impl JsonlFormat {
    /// Create the format with its default extensions
    pub fn new() -> Self {
        Self {
            extensions: vec!["jsonl", "cityjsonl"],
        }
    }
}

impl Default for JsonlFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentFormat for JsonlFormat {
    fn name(&self) -> &str {
        "CityModel JSONL"
    }

    fn extensions(&self) -> &[&str] {
        &self.extensions
    }

    fn open_reader(&self, path: &Path, skip: &SkipFilter) -> Result<Box<dyn DocumentReader>> {
        let file = File::open(path)?;
        let reader = JsonlReader::new(BufReader::with_capacity(BUFFER_SIZE, file))
            .with_skip_filter(skip.clone());
        Ok(Box::new(reader))
    }

    fn open_writer(&self, path: &Path) -> Result<Box<dyn DocumentWriter>> {
        let file = File::create(path)?;
        Ok(Box::new(JsonlWriter::new(BufWriter::with_capacity(
            BUFFER_SIZE,
            file,
        ))))
    }

    fn scan_templates(&self, path: &Path) -> Result<TemplateScan> {
        let file = File::open(path)?;
        TemplateScanner::new(BufReader::with_capacity(BUFFER_SIZE, file)).scan()
    }
}
