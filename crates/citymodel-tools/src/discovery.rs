// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Input file discovery

use anyhow::{bail, Result};
use citymodel_height::OutputCommitter;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Collect input files below `root`
///
/// A file root is returned as-is. Directories are walked recursively for the
/// given extensions, skipping earlier outputs. The result is sorted.
pub fn find_inputs(
    root: &Path,
    extensions: &[&str],
    committer: &OutputCommitter,
) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.is_dir() {
        bail!("Input path '{}' does not exist", root.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| has_extension(path, extensions))
        .filter(|path| !committer.is_output_path(path))
        .collect();

    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();
    extensions.contains(&ext.as_str())
}
