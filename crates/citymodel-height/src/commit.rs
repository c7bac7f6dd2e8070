// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Output placement and in-place replacement

use crate::error::CommitError;
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Suffix appended to output file stems
pub const DEFAULT_SUFFIX: &str = "_adapted-height";

/// Prefix of temporary files written next to an input
const TEMP_PREFIX: &str = ".tmp-";

/// Decides where output goes and swaps it into place
#[derive(Clone, Debug)]
pub struct OutputCommitter {
    suffix: String,
    output_dir: Option<PathBuf>,
    input_root: Option<PathBuf>,
}

impl OutputCommitter {
    /// Committer writing siblings with the given suffix
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            output_dir: None,
            input_root: None,
        }
    }

    /// Write non-overwrite outputs into another directory
    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.output_dir = dir;
        self
    }

    /// Directory the inputs were discovered under
    ///
    /// Outputs in the output directory keep their path relative to it.
    pub fn with_input_root(mut self, root: Option<PathBuf>) -> Self {
        self.input_root = root;
        self
    }

    /// Check whether a path already carries the output suffix
    pub fn is_output_path(&self, path: &Path) -> bool {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| stem.ends_with(&self.suffix))
    }

    /// Destination for the transformed document
    ///
    /// Without overwrite this is the final path (`name<suffix>.ext`); with
    /// overwrite it is a hidden temporary sibling of the input.
    pub fn resolve_output_path(&self, input: &Path, overwrite: bool) -> PathBuf {
        if overwrite {
            return input.with_file_name(format!("{TEMP_PREFIX}{}", Uuid::new_v4()));
        }

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_name = match input.extension() {
            Some(ext) => format!("{stem}{}.{}", self.suffix, ext.to_string_lossy()),
            None => format!("{stem}{}", self.suffix),
        };

        match &self.output_dir {
            Some(dir) => {
                let relative = self
                    .input_root
                    .as_deref()
                    .and_then(|root| input.parent()?.strip_prefix(root).ok())
                    .unwrap_or(Path::new(""));
                dir.join(relative).join(file_name)
            }
            None => input.with_file_name(file_name),
        }
    }

    /// Create the directory an output goes into
    pub fn prepare(&self, output: &Path) -> Result<(), CommitError> {
        match output.parent() {
            Some(dir) if self.output_dir.is_some() => {
                fs::create_dir_all(dir).map_err(|source| CommitError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })
            }
            _ => Ok(()),
        }
    }

    /// Replace `input` with `output` when overwriting
    ///
    /// No-op otherwise. A failed rename leaves the original deleted and the
    /// temporary file in place.
    pub fn commit(&self, input: &Path, output: &Path, overwrite: bool) -> Result<(), CommitError> {
        if !overwrite {
            return Ok(());
        }

        debug!("Replacing input file with temporary file.");
        replace_with(input, output, |from, to| fs::rename(from, to))
    }
}

/// Delete `input`, then move `output` into its place with `rename`
fn replace_with(
    input: &Path,
    output: &Path,
    rename: impl FnOnce(&Path, &Path) -> io::Result<()>,
) -> Result<(), CommitError> {
    fs::remove_file(input).map_err(|source| CommitError::Delete {
        path: input.to_path_buf(),
        source,
    })?;
    rename(output, input).map_err(|source| CommitError::Rename {
        from: output.to_path_buf(),
        to: input.to_path_buf(),
        source,
    })
}

impl Default for OutputCommitter {
    fn default() -> Self {
        Self::new(DEFAULT_SUFFIX)
    }
}
