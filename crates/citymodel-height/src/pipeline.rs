// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Streaming pipeline
//!
//! Reads one item, transforms it, writes it, and drops it before reading the
//! next. The document header is corrected and written exactly once, when the
//! first item arrives.

use crate::corrector::{HeightCorrector, HeightMode};
use crate::error::{PipelineError, Result};
use crate::options::HeightChangeOptions;
use crate::templates::GeometryTemplateIndex;
use crate::walker::FeatureWalker;
use citymodel_model::{
    DocumentFormat, DocumentItem, DocumentMetadata, DocumentReader, DocumentWriter, SkipFilter,
};
use log::{debug, warn};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Pipeline states
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    HeaderPending,
    Streaming,
    Finalizing,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Shared flag checked between items
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Statistics for one processed document
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineSummary {
    /// Features whose heights were changed
    pub features_changed: usize,
    /// Features written unmutated after a height change or decode error
    pub features_passed_through: usize,
    /// Items written after the header
    pub items_written: usize,
    /// Explicit coordinates corrected
    pub coordinates: usize,
    /// Implicit geometries moved
    pub implicit_geometries: usize,
    /// Non-finite Z values left untouched
    pub non_finite: usize,
    /// Constant added to explicit Z values
    pub correction: f64,
}

/// Per-file streaming transformation
pub struct StreamingPipeline<'f> {
    format: &'f dyn DocumentFormat,
    options: HeightChangeOptions,
    cancel: CancelFlag,
}

impl<'f> StreamingPipeline<'f> {
    /// Create a pipeline for a document format
    pub fn new(format: &'f dyn DocumentFormat, options: HeightChangeOptions) -> Self {
        Self {
            format,
            options,
            cancel: CancelFlag::new(),
        }
    }

    /// Use a shared cancellation flag
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Transform `input` into `output`
    ///
    /// In absolute mode the template index is built first; a failure there
    /// aborts before the output is created.
    pub fn run(&self, input: &Path, output: &Path) -> Result<PipelineSummary> {
        let templates = match self.options.mode {
            HeightMode::Absolute => Some(GeometryTemplateIndex::build(self.format, input)?),
            HeightMode::Relative => None,
        };

        debug!("Reading city objects from input file and changing height values.");
        let skip = SkipFilter::none().skip(DocumentMetadata::KIND);
        let mut reader = self
            .format
            .open_reader(input, &skip)
            .map_err(PipelineError::SourceRead)?;
        let mut writer = self
            .format
            .open_writer(output)
            .map_err(PipelineError::SinkWrite)?;

        self.process(reader.as_mut(), writer.as_mut(), templates.as_ref())
    }

    /// Drive an already opened reader and writer to completion
    pub fn process(
        &self,
        reader: &mut dyn DocumentReader,
        writer: &mut dyn DocumentWriter,
        templates: Option<&GeometryTemplateIndex>,
    ) -> Result<PipelineSummary> {
        let mut run = Run::new(&self.options, templates);
        match run.drive(reader, writer, &self.cancel) {
            Ok(()) => {
                run.transition(PipelineState::Done);
                Ok(run.summary)
            }
            Err(e) => {
                run.transition(PipelineState::Failed);
                Err(e)
            }
        }
    }
}

/// State of one document run
struct Run<'r> {
    options: &'r HeightChangeOptions,
    templates: Option<&'r GeometryTemplateIndex>,
    state: PipelineState,
    summary: PipelineSummary,
}

impl<'r> Run<'r> {
    fn new(options: &'r HeightChangeOptions, templates: Option<&'r GeometryTemplateIndex>) -> Self {
        Self {
            options,
            templates,
            state: PipelineState::Idle,
            summary: PipelineSummary::default(),
        }
    }

    fn transition(&mut self, next: PipelineState) {
        debug!("Pipeline state {} -> {}", self.state, next);
        self.state = next;
    }

    fn drive(
        &mut self,
        reader: &mut dyn DocumentReader,
        writer: &mut dyn DocumentWriter,
        cancel: &CancelFlag,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let first = reader.next_item().map_err(PipelineError::SourceRead)?;
        self.transition(PipelineState::HeaderPending);

        // `pending` is `None` when the first item was the header itself
        let (metadata, pending) = match first {
            Some(DocumentItem::Metadata(metadata)) => (metadata, None),
            other => (reader.parent_context().cloned().unwrap_or_default(), Some(other)),
        };
        let walker = self.write_header(metadata, writer)?;
        self.transition(PipelineState::Streaming);

        let mut next = match pending {
            Some(item) => item,
            None => reader.next_item().map_err(PipelineError::SourceRead)?,
        };

        while let Some(mut item) = next {
            if let DocumentItem::Undecoded(undecoded) = &item {
                match &undecoded.id {
                    Some(id) => warn!("Not changing height for feature with id '{}': {}", id, undecoded.reason),
                    None => warn!("Not changing height for undecoded item: {}", undecoded.reason),
                }
                self.summary.features_passed_through += 1;
            } else if let Some(feature) = item.as_feature_mut() {
                match walker.visit(feature) {
                    Ok(report) => {
                        self.summary.features_changed += 1;
                        self.summary.coordinates += report.coordinates;
                        self.summary.implicit_geometries += report.implicit_geometries;
                        if report.non_finite > 0 {
                            warn!(
                                "Feature '{}' contains {} non-finite height value(s); left unchanged.",
                                feature.id, report.non_finite
                            );
                            self.summary.non_finite += report.non_finite;
                        }
                    }
                    Err(e) => {
                        warn!("Not changing height for {} with id '{}': {}", feature.kind, feature.id, e);
                        self.summary.features_passed_through += 1;
                    }
                }
            }

            writer.write_item(&item).map_err(PipelineError::SinkWrite)?;
            self.summary.items_written += 1;
            drop(item);

            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }
            next = reader.next_item().map_err(PipelineError::SourceRead)?;
        }

        self.transition(PipelineState::Finalizing);
        writer.finish().map_err(PipelineError::SinkWrite)
    }

    /// Correct and emit the document header, returning the walker for the body
    fn write_header(
        &mut self,
        mut metadata: DocumentMetadata,
        writer: &mut dyn DocumentWriter,
    ) -> Result<FeatureWalker<'r>> {
        let corrector = self.corrector_for(&metadata);
        if let Some(bbox) = metadata.bounded_by.as_mut() {
            corrector.correct_bounding_box(bbox);
        }
        self.summary.correction = corrector.correction();
        debug!("Height correction for this document: {}", corrector.correction());

        writer.set_metadata(metadata);
        writer.write_header().map_err(PipelineError::SinkWrite)?;

        Ok(FeatureWalker::new(corrector)
            .with_templates(self.templates)
            .with_max_depth(self.options.max_depth))
    }

    fn corrector_for(&self, metadata: &DocumentMetadata) -> HeightCorrector {
        let offset = self.options.offset;
        if self.options.mode == HeightMode::Relative {
            return HeightCorrector::relative(offset);
        }

        let from_bbox = metadata
            .bounded_by
            .map(|bbox| bbox.lower_z())
            .filter(|z| z.is_finite());
        if let Some(lower_z) = from_bbox {
            return HeightCorrector::absolute(offset, lower_z);
        }

        match self.templates.and_then(GeometryTemplateIndex::observed_lower_z) {
            Some(lower_z) => {
                warn!("Document has no bounding box; using lowest feature height {lower_z}.");
                HeightCorrector::absolute(offset, lower_z)
            }
            None => {
                warn!("Document has no bounding box and no feature heights; heights stay unchanged.");
                HeightCorrector::absolute(offset, offset)
            }
        }
    }
}
