//! Input collection and document loading.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{ReportError, Result};
use crate::schema::ResultDocument;

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Expand inputs into result files.
///
/// Files are taken as given; directories are walked recursively for `*.json`
/// and their matches are sorted. Unreadable inputs are logged and skipped.
pub fn collect_result_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for input in inputs {
        if input.is_file() {
            out.push(input.clone());
            continue;
        }
        if !input.is_dir() {
            warn!(path = %input.display(), "input does not exist, skipping");
            continue;
        }

        let mut found = Vec::new();
        for entry in walkdir::WalkDir::new(input).follow_links(false) {
            match entry {
                Ok(entry) if entry.file_type().is_file() && is_json(entry.path()) => {
                    found.push(entry.path().to_path_buf());
                }
                Ok(_) => {}
                Err(e) => warn!(path = %input.display(), error = %e, "failed to walk directory"),
            }
        }
        found.sort();
        out.extend(found);
    }
    out
}

/// Label used for records from `path`: the file stem.
pub fn source_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn load_document(path: &Path) -> Result<ResultDocument> {
    let text = fs::read_to_string(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ResultDocument::from_json(&text)
        .map_err(|e| ReportError::malformed(path.display().to_string(), e.to_string()))
}
