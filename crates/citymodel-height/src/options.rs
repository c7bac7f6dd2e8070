// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Run configuration

use crate::commit::DEFAULT_SUFFIX;
use crate::corrector::HeightMode;
use crate::walker::DEFAULT_MAX_DEPTH;
use std::path::PathBuf;

/// Settings shared by every file of a run
#[derive(Clone, Debug, PartialEq)]
pub struct HeightChangeOptions {
    /// Offset added to heights, or target height in absolute mode
    pub offset: f64,
    /// Interpretation of the offset
    pub mode: HeightMode,
    /// Replace input files instead of writing siblings
    pub overwrite: bool,
    /// Directory for outputs (ignored when overwriting)
    pub output_dir: Option<PathBuf>,
    /// Directory the inputs were discovered under; the output directory
    /// mirrors the layout below it
    pub input_root: Option<PathBuf>,
    /// Suffix appended to output file stems
    pub suffix: String,
    /// Nesting limit for feature trees
    pub max_depth: usize,
}

impl HeightChangeOptions {
    /// Options with a relative offset and default settings
    pub fn new(offset: f64) -> Self {
        Self {
            offset,
            mode: HeightMode::Relative,
            overwrite: false,
            output_dir: None,
            input_root: None,
            suffix: DEFAULT_SUFFIX.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the height mode
    pub fn with_mode(mut self, mode: HeightMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set whether inputs are replaced in place
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set the directory inputs were discovered under
    pub fn with_input_root(mut self, root: Option<PathBuf>) -> Self {
        self.input_root = root;
        self
    }

    /// Set the output file suffix
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Set the nesting limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for HeightChangeOptions {
    fn default() -> Self {
        Self::new(0.0)
    }
}
