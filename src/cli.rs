//! Command executors for the scent CLI.
//!
//! The binary parses arguments and delegates here; everything below returns
//! `ScentResult` so error rendering and exit codes stay uniform.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::info;

use pyscent_core::complete::find_completions;
use pyscent_core::error::{ScentError, ScentResult};
use pyscent_core::matchers::MatchMode;
use pyscent_core::table::SymbolTable;
use pyscent_core::tags;
use pyscent_python::detect::{base_at, detect_context, CompletionQuery};
use pyscent_python::probe::OsProbe;
use pyscent_python::project::build_index;

// ============================================================================
// Locations
// ============================================================================

/// Cursor position in "path:line:col" form. Lines are 1-based; columns are
/// 0-based character offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorTarget {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl CursorTarget {
    /// Parse "path:line:col". Robust against colons inside the path.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.rsplitn(3, ':').collect();
        if parts.len() != 3 {
            return None;
        }
        let column: usize = parts[0].parse().ok()?;
        let line: usize = parts[1].parse().ok()?;
        if line == 0 {
            return None;
        }
        Some(CursorTarget {
            file: PathBuf::from(parts[2]),
            line,
            column,
        })
    }
}

// ============================================================================
// Command Executors
// ============================================================================

/// Build or update a tags file from the given packages and files.
pub fn run_index(
    targets: &[PathBuf],
    excluded: &[String],
    output: &Path,
    input: Option<&Path>,
    timing: bool,
) -> ScentResult<()> {
    let initial = match input {
        Some(path) => tags::read_table(path)?,
        None => SymbolTable::new(),
    };
    let started = Instant::now();
    info!(targets = targets.len(), output = %output.display(), "indexing");
    let table = build_index(targets, excluded, initial, &OsProbe);
    tags::write_table(output, &table)?;
    if timing {
        println!("took {:.3} seconds", started.elapsed().as_secs_f64());
    }
    Ok(())
}

/// Answer one completion query, returning the candidate list as pretty JSON.
///
/// The index comes from `--tags` when given, otherwise from upward fragment
/// discovery starting at the query file. No index found means an empty one:
/// the query still answers from the live buffer.
pub fn run_query(
    at: &str,
    tags_path: Option<&Path>,
    matcher: &str,
    update: bool,
) -> ScentResult<String> {
    let target = CursorTarget::parse(at).ok_or_else(|| {
        ScentError::invalid_args(format!("invalid location '{at}', expected path:line:col"))
    })?;
    let source = fs::read_to_string(&target.file)
        .map_err(|_| ScentError::file_not_found(target.file.display().to_string()))?;
    let mut table = match tags_path {
        Some(path) => tags::read_table(path)?,
        None => tags::find_project_table(&target.file).unwrap_or_default(),
    };
    let line_text = source.lines().nth(target.line - 1).unwrap_or("");
    let base = base_at(line_text, target.column);
    let query = CompletionQuery {
        path: &target.file,
        source: &source,
        line: target.line,
        column: target.column,
        base: &base,
    };
    let context = detect_context(&query, &mut table, update, &OsProbe);
    let entries = find_completions(&base, &table, &context, MatchMode::from_name(matcher));
    serde_json::to_string_pretty(&entries).map_err(|err| ScentError::internal(err.to_string()))
}
