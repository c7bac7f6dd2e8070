// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # CityModel Height
//!
//! Streaming height correction for city-model documents. This crate works
//! against the `DocumentFormat` trait from `citymodel-model` and does not
//! depend on any particular encoding.
//!
//! ## Overview
//!
//! - **Correction**: relative shift or absolute placement of the lowest point
//! - **Traversal**: every geometry of a feature and its nested children
//! - **Implicit geometry**: reference points placed via their templates
//! - **Streaming**: one item in memory at a time, header written exactly once
//! - **Batch**: sequential files, per-file failure isolation, in-place overwrite
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use citymodel_height::{BatchRunner, HeightChangeOptions, HeightMode};
//! use citymodel_jsonl::JsonlFormat;
//!
//! let format = JsonlFormat::new();
//! let options = HeightChangeOptions::new(100.0).with_mode(HeightMode::Absolute);
//! let report = BatchRunner::new(&format, options).run(&files);
//! std::process::exit(report.exit_code().into());
//! ```

pub mod batch;
pub mod commit;
pub mod corrector;
pub mod error;
pub mod options;
pub mod pipeline;
pub mod templates;
pub mod walker;

pub use batch::{BatchReport, BatchRunner, FileOutcome};
pub use commit::{OutputCommitter, DEFAULT_SUFFIX};
pub use corrector::{HeightCorrector, HeightMode};
pub use error::{CommitError, FileError, HeightChangeError, PipelineError, Result};
pub use options::HeightChangeOptions;
pub use pipeline::{CancelFlag, PipelineState, PipelineSummary, StreamingPipeline};
pub use templates::{GeometryTemplateIndex, Template};
pub use walker::{FeatureWalker, VisitReport, DEFAULT_MAX_DEPTH};
