// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sequential batch processing
//!
//! Files are processed one after another. A failing file is reported and the
//! batch moves on; the report carries the aggregate failure flag.

use crate::commit::OutputCommitter;
use crate::error::{FileError, PipelineError};
use crate::options::HeightChangeOptions;
use crate::pipeline::{CancelFlag, PipelineSummary, StreamingPipeline};
use citymodel_model::DocumentFormat;
use log::{error, info, warn};
use rustc_hash::FxHashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome for one input file
#[derive(Debug)]
pub struct FileOutcome {
    /// Input path
    pub input: PathBuf,
    /// Where the result ended up, on success
    pub output: Option<PathBuf>,
    /// Summary or fatal error
    pub result: Result<PipelineSummary, FileError>,
}

impl FileOutcome {
    /// Check whether the file succeeded
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes for a whole batch
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Per-file outcomes in processing order
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    /// Check whether any file failed
    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|o| !o.is_ok())
    }

    /// Number of failed files
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count()
    }

    /// Number of succeeded files
    pub fn succeeded(&self) -> usize {
        self.outcomes.len() - self.failed()
    }

    /// Process exit status: 0 on success, 1 if any file failed
    pub fn exit_code(&self) -> u8 {
        u8::from(self.has_failures())
    }
}

/// Runs the pipeline over many files
pub struct BatchRunner<'f> {
    format: &'f dyn DocumentFormat,
    options: HeightChangeOptions,
    committer: OutputCommitter,
    cancel: CancelFlag,
}

impl<'f> BatchRunner<'f> {
    /// Create a runner
    pub fn new(format: &'f dyn DocumentFormat, options: HeightChangeOptions) -> Self {
        let committer = OutputCommitter::new(options.suffix.clone())
            .with_output_dir(options.output_dir.clone())
            .with_input_root(options.input_root.clone());
        Self {
            format,
            options,
            committer,
            cancel: CancelFlag::new(),
        }
    }

    /// Use a shared cancellation flag
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Output placement policy
    pub fn committer(&self) -> &OutputCommitter {
        &self.committer
    }

    /// Process all files in order
    ///
    /// Without overwrite, an input whose output path was already written by an
    /// earlier input of the batch fails instead of replacing that output.
    pub fn run(&self, inputs: &[PathBuf]) -> BatchReport {
        let mut report = BatchReport::default();
        let mut written = FxHashSet::default();

        for (i, input) in inputs.iter().enumerate() {
            info!(
                "[{}|{}] Processing file '{}'.",
                i + 1,
                inputs.len(),
                input.display()
            );

            let outcome = if self.cancel.is_cancelled() {
                FileOutcome {
                    input: input.clone(),
                    output: None,
                    result: Err(PipelineError::Cancelled.into()),
                }
            } else if let Some(path) = self.claim_output(input, &mut written) {
                FileOutcome {
                    input: input.clone(),
                    output: None,
                    result: Err(FileError::OutputCollision { path }),
                }
            } else {
                self.process_file(input)
            };

            if let Err(e) = &outcome.result {
                error!("{}", e);
            }
            report.outcomes.push(outcome);
        }

        report
    }

    /// Record the output of `input`; returns the path if it is already taken
    fn claim_output(&self, input: &Path, written: &mut FxHashSet<PathBuf>) -> Option<PathBuf> {
        if self.options.overwrite {
            return None;
        }
        let output = self.committer.resolve_output_path(input, false);
        if written.insert(output.clone()) {
            None
        } else {
            Some(output)
        }
    }

    /// Process a single file
    pub fn process_file(&self, input: &Path) -> FileOutcome {
        let overwrite = self.options.overwrite;
        let output = self.committer.resolve_output_path(input, overwrite);
        if let Err(e) = self.committer.prepare(&output) {
            return FileOutcome {
                input: input.to_path_buf(),
                output: None,
                result: Err(e.into()),
            };
        }
        if overwrite {
            info!("Writing temporary output file '{}'.", output.display());
        } else {
            info!("Writing output to file '{}'.", output.display());
        }

        let pipeline = StreamingPipeline::new(self.format, self.options.clone())
            .with_cancel_flag(self.cancel.clone());

        let result = match pipeline.run(input, &output) {
            Ok(summary) => self
                .committer
                .commit(input, &output, overwrite)
                .map(|()| summary)
                .map_err(FileError::from),
            Err(e) => {
                remove_partial_output(&output);
                Err(FileError::from(e))
            }
        };

        match result {
            Ok(summary) => {
                let placed = if overwrite { input.to_path_buf() } else { output };
                info!(
                    "Changed {} feature(s), passed through {} unchanged.",
                    summary.features_changed, summary.features_passed_through
                );
                FileOutcome {
                    input: input.to_path_buf(),
                    output: Some(placed),
                    result: Ok(summary),
                }
            }
            Err(e) => FileOutcome {
                input: input.to_path_buf(),
                output: None,
                result: Err(e),
            },
        }
    }
}

/// Delete output left behind by a failed run
fn remove_partial_output(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = fs::remove_file(path) {
        warn!("Failed to remove incomplete output '{}': {}", path.display(), e);
    }
}
