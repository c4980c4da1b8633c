//! Parsing with mid-edit repair.
//!
//! Completion queries arrive while the buffer is being typed, so the line
//! under the cursor is usually a syntax error. When a parse fails, the
//! failing line is replaced with a `pass` statement at the same indentation
//! and the source is parsed once more. If that still fails, callers fall
//! back to table-only inference.

use tracing::{debug, error};
use tree_sitter::{Parser, Tree};

/// A parse tree together with the exact text it was built from. Node byte
/// ranges are only meaningful against this text.
pub struct ParsedModule {
    pub tree: Tree,
    pub text: String,
}

fn python_parser() -> Option<Parser> {
    let mut parser = Parser::new();
    if let Err(err) = parser.set_language(&tree_sitter_python::LANGUAGE.into()) {
        error!("python grammar rejected by parser: {err}");
        return None;
    }
    Some(parser)
}

fn parse_text(text: String) -> Option<ParsedModule> {
    let mut parser = python_parser()?;
    let tree = parser.parse(&text, None)?;
    if tree.root_node().has_error() {
        return None;
    }
    Some(ParsedModule { tree, text })
}

/// Parse a complete source unit. Returns `None` when the source has syntax
/// errors.
pub fn parse_module(source: &str) -> Option<ParsedModule> {
    parse_text(source.replace("\r\n", "\n"))
}

/// Parse an edited buffer, repairing the cursor line on failure.
/// `cursor_line` is 1-based.
pub fn parse_with_repair(source: &str, cursor_line: usize) -> Option<ParsedModule> {
    let normalized = source.replace("\r\n", "\n");
    if let Some(parsed) = parse_text(normalized.clone()) {
        return Some(parsed);
    }
    let index = cursor_line.checked_sub(1)?;
    let mut lines: Vec<String> = normalized.split('\n').map(str::to_string).collect();
    let line = lines.get(index)?;
    let stripped = line.trim_start();
    let indent_width = line.chars().count() - stripped.chars().count();
    let indent_char = if line.starts_with('\t') { '\t' } else { ' ' };
    let mut repaired_line = indent_char.to_string().repeat(indent_width);
    repaired_line.push_str("pass");
    debug!(line = cursor_line, "replacing unparsable line with placeholder");
    lines[index] = repaired_line;
    parse_text(lines.join("\n"))
}
