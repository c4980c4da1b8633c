//! Completion-context detection for an edited buffer position.
//!
//! Given the buffer text, a cursor position, and the partially-typed base,
//! decide what the editor is asking for: module paths in an import line,
//! an argument list after `name(`, members of `self`, members of a module
//! alias, members of a constructor-typed local, or plain top-level names.
//! The decision runs on the text left of the cursor plus a (possibly
//! repaired) parse tree of the whole buffer.

use std::path::Path;
use std::sync::OnceLock;

use pyscent_core::context::CompletionContext;
use pyscent_core::table::SymbolTable;
use regex::Regex;
use tracing::warn;

use crate::enclosing::class_and_parents_at;
use crate::names::{collect_imports, source_names};
use crate::parse::{parse_with_repair, ParsedModule};
use crate::probe::{root_package_list, FileProbe};
use crate::walker::analyze_unit;

/// Characters that terminate a dotted attribute chain when scanning left.
/// The dot itself is not a terminator.
const DELIMITERS: &str = " ()[]{}'\"<>,/-=+*:%^|!@`;";

/// One completion request against an edited buffer.
pub struct CompletionQuery<'a> {
    /// Path of the file being edited.
    pub path: &'a Path,
    /// Current buffer text, probably unsaved.
    pub source: &'a str,
    /// Cursor line, 1-based.
    pub line: usize,
    /// Cursor column as a character offset, 0-based.
    pub column: usize,
    /// The token the editor will replace with the completion.
    pub base: &'a str,
}

/// Start of the completion base on `line`: scan left from `column` until a
/// dot or space, returning a 0-based character index.
pub fn find_base(line: &str, column: usize) -> usize {
    let chars: Vec<char> = line.chars().collect();
    let mut index = column.min(chars.len());
    while index > 0 {
        index -= 1;
        if chars[index] == '.' || chars[index] == ' ' {
            index += 1;
            break;
        }
    }
    index
}

/// The base token itself: the text between [`find_base`] and the cursor.
pub fn base_at(line: &str, column: usize) -> String {
    let start = find_base(line, column);
    line.chars()
        .take(column)
        .skip(start)
        .collect()
}

/// Last dotted access chain at the end of `line`, e.g. `some.thing.other`.
fn last_chain(line: &str) -> String {
    let mut chain: Vec<char> = Vec::new();
    for c in line.chars().rev() {
        if DELIMITERS.contains(c) {
            break;
        }
        chain.push(c);
    }
    chain.into_iter().rev().collect()
}

fn call_expression() -> &'static Regex {
    static CALL_EXPRESSION: OnceLock<Regex> = OnceLock::new();
    CALL_EXPRESSION.get_or_init(|| Regex::new(r"^(.+)\(.*\)").expect("static pattern compiles"))
}

/// Classify the completion request at the query position.
///
/// In update mode the buffer's own contribution is walked and merged into
/// `table` first, so symbols typed moments ago resolve like indexed ones.
pub fn detect_context(
    query: &CompletionQuery<'_>,
    table: &mut SymbolTable,
    update: bool,
    probe: &dyn FileProbe,
) -> CompletionContext {
    let parsed = parse_with_repair(query.source, query.line);
    if update {
        if let Some(parsed) = &parsed {
            match analyze_unit(query.path, parsed, probe) {
                Ok(contribution) => table.merge(contribution),
                Err(err) => warn!("buffer contribution skipped: {err}"),
            }
        }
    }

    let line_text = query.source.lines().nth(query.line - 1).unwrap_or("");
    let chars: Vec<char> = line_text.chars().collect();
    let column = query.column.min(chars.len());
    let left: String = chars[..column].iter().collect();
    let right: String = chars[column..].iter().collect();
    let stripped = left.trim_start();

    if stripped.starts_with("from ") || stripped.starts_with("import ") {
        let mut module = stripped.split(' ').nth(1).unwrap_or("").to_string();
        if module.contains('.') && !stripped.contains(" import ") {
            if let Some((head, _)) = module.rsplit_once('.') {
                module = head.to_string();
            }
        }
        return CompletionContext::Module {
            path: module,
            show_members: left.contains(" import "),
        };
    }

    let is_attr_lookup = left.contains('.');
    if query.base.ends_with('(') && left.ends_with(query.base) {
        let strip_closing_paren = right.starts_with(')');
        let after_dot = match left.rfind('.') {
            Some(dot) => &left[dot + 1..],
            None => left.as_str(),
        };
        let name = after_dot
            .strip_suffix('(')
            .unwrap_or(after_dot)
            .trim_start()
            .to_string();
        return if is_attr_lookup {
            CompletionContext::Method {
                name,
                strip_closing_paren,
            }
        } else {
            CompletionContext::Function {
                name,
                strip_closing_paren,
            }
        };
    }

    if is_attr_lookup {
        if let Some(parsed) = &parsed {
            let var = match stripped.rfind('.') {
                Some(dot) => &stripped[..dot],
                None => stripped,
            };
            if var == "self" {
                let (class, parents) = infer_class(query.path, parsed, query.line, table, probe);
                return CompletionContext::Instance { class, parents };
            }
            let mut chain = last_chain(stripped);
            if !query.base.is_empty() {
                if let Some(shorter) = chain.strip_suffix(query.base) {
                    chain = shorter.to_string();
                }
            }
            if let Some(shorter) = chain.strip_suffix('.') {
                chain = shorter.to_string();
            }
            if let Some(module) = infer_module(&chain, parsed) {
                return CompletionContext::Module {
                    path: module,
                    show_members: true,
                };
            }
            let (class, parents) = infer_instance(query.path, parsed, var, table, probe);
            return CompletionContext::Instance { class, parents };
        }
    }

    CompletionContext::TopLevel
}

/// Substitute import aliases into a dotted chain. The chain names a module
/// only if at least one segment hit the import map.
fn infer_module(chain: &str, parsed: &ParsedModule) -> Option<String> {
    let imports = collect_imports(&parsed.tree, &parsed.text);
    let mut parts = Vec::new();
    let mut valid = false;
    for part in chain.split('.') {
        match imports.get(part) {
            Some(target) => {
                parts.push(target.clone());
                valid = true;
            }
            None => parts.push(part.to_string()),
        }
    }
    valid.then(|| parts.join("."))
}

/// Resolve a local variable to the class its constructor call named.
fn infer_instance(
    path: &Path,
    parsed: &ParsedModule,
    var: &str,
    table: &SymbolTable,
    probe: &dyn FileProbe,
) -> (Option<String>, Vec<String>) {
    let found = source_names(&parsed.tree, &parsed.text);
    let Some(assignment) = found.names.get(var) else {
        return (None, Vec::new());
    };
    let Some(captures) = call_expression().captures(assignment) else {
        return (None, Vec::new());
    };
    let called = captures[1].to_string();
    let class = if found.classes.iter().any(|c| c == &called) {
        qualify_in_file(path, probe, &called)
    } else {
        let referenced = found.names.get(&called).cloned().unwrap_or(called);
        table.resolve_pointer(&referenced)
    };
    let parents = table
        .classes
        .get(&class)
        .map(|entry| entry.bases.clone())
        .unwrap_or_default();
    (Some(class), parents)
}

/// Fully qualify the class enclosing a `self.` completion.
///
/// The class name is joined with path components right-to-left until a key
/// in the table matches; when none does, package markers on disk decide the
/// qualifier.
fn infer_class(
    path: &Path,
    parsed: &ParsedModule,
    line: usize,
    table: &SymbolTable,
    probe: &dyn FileProbe,
) -> (Option<String>, Vec<String>) {
    let (class, mut parents) = class_and_parents_at(parsed, line);
    for parent in &mut parents {
        *parent = table.resolve_pointer(parent);
    }
    let Some(class) = class else {
        return (None, parents);
    };
    let mut path_parts = path_components(path);
    let mut full_class = class.clone();
    while let Some(part) = path_parts.pop() {
        full_class = format!("{part}.{full_class}");
        if table.classes.contains_key(&full_class) {
            return (Some(full_class), parents);
        }
    }
    (Some(qualify_in_file(path, probe, &class)), parents)
}

/// Qualify a name defined in the edited file itself: package path from
/// `__init__` markers, then the module stem.
fn qualify_in_file(path: &Path, probe: &dyn FileProbe, name: &str) -> String {
    let directory = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let packages = root_package_list(probe, directory);
    if packages.is_empty() {
        format!("{stem}.{name}")
    } else {
        format!("{}.{}.{}", packages.join("."), stem, name)
    }
}

/// Path components of the file with its extension dropped, root included.
fn path_components(path: &Path) -> Vec<String> {
    path.with_extension("")
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect()
}
