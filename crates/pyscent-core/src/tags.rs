//! Tags file persistence and discovery.
//!
//! The index lives in a JSON tags file, `SCENTTAGS` by default. Completion
//! finds the right one by walking up from the edited file's directory:
//! every level contributes its `SCENTTAGS.*` fragments, and the first level
//! holding a primary `SCENTTAGS` file finishes the merge. No primary on the
//! whole walk means no project index.
//!
//! Writes go through a temp file in the target directory plus a rename, so
//! a reader never observes a half-written index.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{ScentError, ScentResult};
use crate::table::SymbolTable;

/// Primary tags file name.
pub const TAGS_FILE: &str = "SCENTTAGS";

/// Prefix shared by partial tags files merged in before the primary.
pub const TAGS_FRAGMENT_PREFIX: &str = "SCENTTAGS.";

// ============================================================================
// Reading and Writing
// ============================================================================

/// Read and deserialize one tags file.
pub fn read_table(path: &Path) -> ScentResult<SymbolTable> {
    let raw = fs::read_to_string(path).map_err(|source| ScentError::TagsRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ScentError::TagsFormat {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize and write the table, replacing `path` atomically.
pub fn write_table(path: &Path, table: &SymbolTable) -> ScentResult<()> {
    let rendered = serde_json::to_string_pretty(table).map_err(|source| {
        ScentError::internal(format!("tags serialization failed: {source}"))
    })?;
    atomic_write(path, rendered.as_bytes()).map_err(|source| ScentError::TagsWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Temp + rename in the destination directory, so readers see either the
/// old or the new index. The temp name carries the PID to keep concurrent
/// writers from colliding.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let temp_path = path.with_file_name(format!(
        ".{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
    ));
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)
}

// ============================================================================
// Discovery
// ============================================================================

/// Merge one tags file into the accumulator. Unreadable or malformed files
/// are logged and skipped, so a stale fragment cannot take completion down.
fn try_merge(path: &Path, table: &mut SymbolTable) -> bool {
    match read_table(path) {
        Ok(partial) => {
            table.merge(partial);
            true
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "skipping unreadable tags file");
            false
        }
    }
}

/// Fragment file names directly inside `directory`, in name order.
fn fragment_names(directory: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(directory) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(TAGS_FRAGMENT_PREFIX))
        .collect();
    names.sort();
    names
}

/// Locate and load the index for an edited source file.
///
/// Walks from the file's directory upward. Fragments accumulate along the
/// way; the primary file, merged last so its map entries win, ends the
/// walk. `None` when no directory on the way up holds a primary file.
pub fn find_project_table(source_path: &Path) -> Option<SymbolTable> {
    let mut table = SymbolTable::new();
    let start = source_path.parent()?;
    for directory in start.ancestors() {
        if directory.as_os_str().is_empty() {
            continue;
        }
        for name in fragment_names(directory) {
            try_merge(&directory.join(name), &mut table);
        }
        let primary: PathBuf = directory.join(TAGS_FILE);
        if primary.exists() {
            try_merge(&primary, &mut table);
            debug!(path = %primary.display(), "loaded project tags");
            return Some(table);
        }
    }
    None
}

// ============================================================================
// Tests
// ============================================================================
