// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `change-height`: shift or re-base the heights of city-model documents

mod discovery;

use anyhow::{Context, Result};
use citymodel_height::{BatchRunner, HeightChangeOptions, HeightMode, DEFAULT_MAX_DEPTH};
use citymodel_jsonl::JsonlFormat;
use citymodel_model::DocumentFormat;
use clap::Parser;
use log::{info, warn, LevelFilter};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug, Clone)]
#[command(name = "change-height", version, about)]
struct Args {
    /// Input file or directory (searched recursively)
    input: PathBuf,

    /// Offset to add to height values, or target lowest height in absolute mode
    #[arg(long, allow_hyphen_values = true)]
    offset: f64,

    /// How to interpret the offset: relative or absolute
    #[arg(long, default_value_t = HeightMode::Relative)]
    height_mode: HeightMode,

    /// Overwrite input files instead of writing `<name>_adapted-height` siblings
    #[arg(long, default_value_t = false)]
    overwrite_files: bool,

    /// Directory for output files (ignored with --overwrite-files)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Maximum nesting depth of feature children
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Log level; RUST_LOG takes precedence
    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
}

impl Args {
    fn options(&self) -> HeightChangeOptions {
        HeightChangeOptions::new(self.offset)
            .with_mode(self.height_mode)
            .with_overwrite(self.overwrite_files)
            .with_output_dir(self.output_dir.clone())
            .with_input_root(self.input_root())
            .with_max_depth(self.max_depth)
    }

    /// Directory whose layout the output directory mirrors
    fn input_root(&self) -> Option<PathBuf> {
        if self.input.is_dir() {
            Some(self.input.clone())
        } else {
            self.input.parent().map(Path::to_path_buf)
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .parse_default_env()
        .init();

    if args.overwrite_files && args.output_dir.is_some() {
        warn!("--output-dir is ignored when overwriting input files.");
    } else if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory '{}'", dir.display()))?;
    }

    let format = JsonlFormat::new();
    let runner = BatchRunner::new(&format, args.options());
    let files = discovery::find_inputs(&args.input, format.extensions(), runner.committer())?;

    if files.is_empty() {
        warn!("No {} files found at '{}'.", format.name(), args.input.display());
        return Ok(ExitCode::SUCCESS);
    }

    info!(
        "Changing heights of {} file(s) ({} mode, offset {}).",
        files.len(),
        args.height_mode,
        args.offset
    );
    let report = runner.run(&files);

    if report.has_failures() {
        warn!(
            "{} of {} file(s) failed; see errors above.",
            report.failed(),
            report.outcomes.len()
        );
    } else {
        info!("Processed {} file(s).", report.succeeded());
    }

    Ok(ExitCode::from(report.exit_code()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let args = Args::try_parse_from([
            "change-height",
            "--offset",
            "-12.5",
            "--height-mode",
            "absolute",
            "--overwrite-files",
            "tiles",
        ])
        .unwrap();

        let options = args.options();
        assert_eq!(options.offset, -12.5);
        assert_eq!(options.mode, HeightMode::Absolute);
        assert!(options.overwrite);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(args.log_level, LevelFilter::Info);
    }

    #[test]
    fn test_directory_input_is_output_root() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().to_str().unwrap();
        let args =
            Args::try_parse_from(["change-height", "--offset", "1", "--output-dir", "out", input])
                .unwrap();
        assert_eq!(args.options().input_root.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_offset_is_required() {
        assert!(Args::try_parse_from(["change-height", "tiles"]).is_err());
    }

    #[test]
    fn test_rejects_unknown_mode() {
        let result =
            Args::try_parse_from(["change-height", "--offset", "1", "--height-mode", "up", "x"]);
        assert!(result.is_err());
    }
}
