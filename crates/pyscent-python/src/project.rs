//! Project indexing: walk package trees and fold per-file contributions
//! into one symbol table.

use std::fs;
use std::path::{Path, PathBuf};

use pyscent_core::error::{ScentError, ScentResult};
use pyscent_core::table::SymbolTable;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::parse::parse_module;
use crate::probe::FileProbe;
use crate::walker::analyze_unit;

/// Analyze one Python source file into its symbol-table contribution.
pub fn process_file(path: &Path, probe: &dyn FileProbe) -> ScentResult<SymbolTable> {
    let source = fs::read_to_string(path)
        .map_err(|err| ScentError::analysis(path.display().to_string(), err.to_string()))?;
    let parsed = parse_module(&source)
        .ok_or_else(|| ScentError::analysis(path.display().to_string(), "source does not parse"))?;
    analyze_unit(path, &parsed, probe)
}

/// Index every target on top of `initial`.
///
/// Directory targets are walked recursively with excluded directory names
/// pruned at any depth; file targets are analyzed as-is. A file that fails
/// to read or analyze is logged and skipped, so one broken file never sinks
/// an index run.
pub fn build_index(
    targets: &[PathBuf],
    excluded: &[String],
    initial: SymbolTable,
    probe: &dyn FileProbe,
) -> SymbolTable {
    let mut table = initial;
    for target in targets {
        if target.is_dir() {
            for path in python_files_under(target, excluded) {
                fold_file(&mut table, &path, probe);
            }
        } else {
            fold_file(&mut table, target, probe);
        }
    }
    table
}

fn fold_file(table: &mut SymbolTable, path: &Path, probe: &dyn FileProbe) {
    debug!(path = %path.display(), "analyzing");
    match process_file(path, probe) {
        Ok(contribution) => table.merge(contribution),
        Err(err) => warn!("{err}"),
    }
}

/// All `.py` files under `root` in sorted order. A directory whose name
/// appears in `excluded` is skipped along with everything beneath it.
fn python_files_under(root: &Path, excluded: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
    {
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let under_excluded_dir = relative.parent().is_some_and(|parent| {
            parent.components().any(|component| {
                let name = component.as_os_str().to_string_lossy();
                excluded.iter().any(|excluded| name == excluded.as_str())
            })
        });
        if under_excluded_dir {
            continue;
        }
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "py") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files
}
