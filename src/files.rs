// Local artifact discovery: a flat listing of the working directory,
// filtered by file-name substring.

use crate::error::Result;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// An entry of the listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Exact on-disk name, used to build the path.
    pub name: OsString,
    /// Lossy UTF-8 form, used for matching and display.
    pub label: String,
}

impl LocalFile {
    pub fn new(name: impl Into<OsString>) -> Self {
        let name = name.into();
        let label = name.to_string_lossy().into_owned();
        LocalFile { name, label }
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(&self.name)
    }
}

/// Entries directly inside `dir`, sorted by label. Not recursive.
pub fn list_entries(dir: &Path) -> Result<Vec<LocalFile>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        entries.push(LocalFile::new(entry.file_name()));
    }
    entries.sort_by(|a, b| a.label.cmp(&b.label));
    Ok(entries)
}

/// Keep the entries whose name contains `marker`.
pub fn filter_by_marker(entries: &[LocalFile], marker: &str) -> Vec<LocalFile> {
    entries
        .iter()
        .filter(|entry| entry.label.contains(marker))
        .cloned()
        .collect()
}
