// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for height correction
//!
//! Errors are layered by blast radius: a [`HeightChangeError`] affects one
//! feature, a [`PipelineError`] or [`CommitError`] one file.

use citymodel_model::{ParseError, TemplateId};
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline result type
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Recoverable per-feature errors
///
/// The feature is written through unmutated and processing continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HeightChangeError {
    /// Implicit geometry references a template that does not exist
    #[error("Feature '{feature}' references unknown geometry template '{template}'")]
    UnresolvedTemplate { feature: String, template: TemplateId },

    /// Template has no finite coordinates to place
    #[error("Geometry template '{template}' used by feature '{feature}' has no finite coordinates")]
    EmptyTemplate { feature: String, template: TemplateId },

    /// Feature tree nests deeper than allowed
    #[error("Feature '{feature}' exceeds the maximum nesting depth of {max_depth}")]
    DepthLimitExceeded { feature: String, max_depth: usize },
}

impl HeightChangeError {
    /// Create an unresolved template error
    pub fn unresolved(feature: impl Into<String>, template: TemplateId) -> Self {
        HeightChangeError::UnresolvedTemplate {
            feature: feature.into(),
            template,
        }
    }

    /// Create an empty template error
    pub fn empty_template(feature: impl Into<String>, template: TemplateId) -> Self {
        HeightChangeError::EmptyTemplate {
            feature: feature.into(),
            template,
        }
    }
}

/// Fatal per-file errors raised while streaming a document
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Template pre-scan failed; no feature was touched
    #[error("Failed to read geometry templates: {0}")]
    TemplateRead(#[source] ParseError),

    /// Input could not be opened or read
    #[error("Failed to read city objects: {0}")]
    SourceRead(#[source] ParseError),

    /// Output could not be opened, written or closed
    #[error("Failed to write city objects: {0}")]
    SinkWrite(#[source] ParseError),

    /// Processing was cancelled between two items
    #[error("Processing cancelled")]
    Cancelled,
}

/// Failure to place an output
///
/// After a failed overwrite the temporary file is left on disk for manual
/// recovery.
#[derive(Error, Debug)]
pub enum CommitError {
    /// Output directory could not be created
    #[error("Failed to create output directory '{}': {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Original could not be deleted
    #[error("Failed to delete input file '{}': {source}", path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Temporary file could not be renamed
    #[error("Failed to move '{}' to '{}': {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Any fatal error for a single file of a batch
#[derive(Error, Debug)]
pub enum FileError {
    /// Streaming failed
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Placing the output failed
    #[error(transparent)]
    Commit(#[from] CommitError),

    /// An earlier file of the batch already wrote this output
    #[error("Output '{}' was already written by another input file", path.display())]
    OutputCollision { path: PathBuf },
}
