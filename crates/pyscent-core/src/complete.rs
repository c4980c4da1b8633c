//! Completion resolution against a symbol table.
//!
//! [`find_completions`] turns a detected [`CompletionContext`] into a sorted
//! list of [`CompletionEntry`] values:
//!
//! 1. collect the candidate pool the context calls for
//! 2. filter by the typed base under the selected [`MatchMode`]
//! 3. sort, demoting underscore-prefixed words
//! 4. for call contexts, swap the winning word for the full call signature
//!
//! Instance pools walk the ancestor chain depth-first through recorded
//! bases, skipping builtins and anything already visited, so cyclic or
//! diamond-shaped hierarchies contribute each class once.

use std::collections::{BTreeSet, HashSet};
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::builtins::is_builtin;
use crate::context::CompletionContext;
use crate::matchers::{matcher, MatchFn, MatchMode};
use crate::table::{ClassEntry, FunctionEntry, SymbolTable};

// ============================================================================
// Entries
// ============================================================================

/// What a completion candidate is, in menu terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionKind {
    #[serde(rename = "d")]
    Constant,
    #[serde(rename = "f")]
    Function,
    #[serde(rename = "t")]
    Class,
    #[serde(rename = "m")]
    Member,
}

/// One completion candidate. `word` is the replacement text, `menu` the
/// defining module (or `module:Class` for members), `abbr` the rendered
/// call signature for callables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEntry {
    pub word: String,
    pub kind: CompletionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<String>,
    pub dup: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbr: Option<String>,
}

fn constant_entry(name: &str) -> CompletionEntry {
    let (module, word) = name.rsplit_once('.').unwrap_or(("", name));
    CompletionEntry {
        word: word.to_string(),
        kind: CompletionKind::Constant,
        menu: Some(module.to_string()),
        dup: true,
        abbr: None,
    }
}

/// Entry for a callable. With `menu` given the recorded name is used as-is;
/// without it the qualified name splits into menu and word.
fn function_entry(func: &FunctionEntry, kind: CompletionKind, menu: Option<&str>) -> CompletionEntry {
    let (module, word) = match menu {
        Some(menu) => (menu, func.name.as_str()),
        None => func.name.rsplit_once('.').unwrap_or(("", func.name.as_str())),
    };
    CompletionEntry {
        word: word.to_string(),
        kind,
        menu: Some(module.to_string()),
        dup: true,
        abbr: Some(format!("{}({})", word, func.args.join(", "))),
    }
}

fn constructor_entry(class: &str, entry: &ClassEntry) -> CompletionEntry {
    let (module, word) = class.rsplit_once('.').unwrap_or(("", class));
    CompletionEntry {
        word: word.to_string(),
        kind: CompletionKind::Class,
        menu: Some(module.to_string()),
        dup: true,
        abbr: Some(format!("{}({})", word, entry.constructor.join(", "))),
    }
}

fn module_child_entry(name: String) -> CompletionEntry {
    CompletionEntry {
        word: name,
        kind: CompletionKind::Class,
        menu: None,
        dup: true,
        abbr: None,
    }
}

// ============================================================================
// Candidate pools
// ============================================================================

/// Properties first, then methods, both labeled `module:Class`.
fn add_class_members(class: &str, entry: &ClassEntry, completions: &mut Vec<CompletionEntry>) {
    let (module, name) = class.rsplit_once('.').unwrap_or(("", class));
    let menu = format!("{}:{}", module, name);
    for property in &entry.properties {
        completions.push(CompletionEntry {
            word: property.clone(),
            kind: CompletionKind::Member,
            menu: Some(menu.clone()),
            dup: true,
            abbr: None,
        });
    }
    for method in &entry.methods {
        completions.push(function_entry(method, CompletionKind::Member, Some(&menu)));
    }
}

/// Depth-first over recorded bases. Builtins never enter the chain; the
/// visited set keeps cyclic hierarchies finite.
fn collect_ancestors(
    table: &SymbolTable,
    class: &str,
    ancestors: &mut Vec<String>,
    visited: &mut HashSet<String>,
) {
    let Some(entry) = table.classes.get(class) else {
        return;
    };
    for base in &entry.bases {
        if is_builtin(base) || !visited.insert(base.clone()) {
            continue;
        }
        ancestors.push(base.clone());
        collect_ancestors(table, base, ancestors, visited);
    }
}

/// Members of a class and all its non-builtin ancestors, own members first.
///
/// An unknown class still completes through its recorded parents, so
/// editing a class whose definition has not been indexed yet degrades to
/// inherited members instead of nothing.
pub fn class_completions(
    table: &SymbolTable,
    class: &str,
    parents: &[String],
) -> Vec<CompletionEntry> {
    let mut completions = Vec::new();
    let mut ancestors = Vec::new();
    let mut visited = HashSet::new();
    match table.classes.get(class) {
        Some(entry) => {
            visited.insert(class.to_string());
            collect_ancestors(table, class, &mut ancestors, &mut visited);
            add_class_members(class, entry, &mut completions);
        }
        None => {
            let non_builtin: Vec<&String> = parents.iter().filter(|p| !is_builtin(p)).collect();
            if non_builtin.is_empty() {
                return completions;
            }
            for parent in &non_builtin {
                visited.insert((*parent).clone());
            }
            for parent in &non_builtin {
                collect_ancestors(table, parent, &mut ancestors, &mut visited);
                if let Some(entry) = table.classes.get(parent.as_str()) {
                    add_class_members(parent, entry, &mut completions);
                }
            }
        }
    }
    for ancestor in &ancestors {
        if let Some(entry) = table.classes.get(ancestor) {
            add_class_members(ancestor, entry, &mut completions);
        }
    }
    completions
}

/// Members of one inferred class, or of every recorded class when the
/// receiver could not be pinned down.
fn instance_completions(
    table: &SymbolTable,
    class: Option<&str>,
    parents: &[String],
) -> Vec<CompletionEntry> {
    match class.filter(|c| !c.is_empty()) {
        Some(class) => class_completions(table, class, parents),
        None => {
            let mut completions = Vec::new();
            for (name, entry) in &table.classes {
                add_class_members(name, entry, &mut completions);
            }
            completions
        }
    }
}

/// Constants, functions, and constructors, in that pool order.
fn top_level_completions(table: &SymbolTable) -> Vec<CompletionEntry> {
    let mut completions = Vec::new();
    completions.extend(table.constants.iter().map(|c| constant_entry(c)));
    completions.extend(
        table
            .functions
            .iter()
            .map(|f| function_entry(f, CompletionKind::Function, None)),
    );
    completions.extend(
        table
            .classes
            .iter()
            .map(|(name, entry)| constructor_entry(name, entry)),
    );
    completions
}

/// Children and (optionally) members of a module path.
///
/// Children come from the hierarchy: for each recorded module extending the
/// path, the first segment past the shared prefix becomes a candidate.
/// With `complete_members` set, the module's own public constants,
/// functions, and classes join in, plus single-segment import pointers
/// under the path; a wildcard pointer pulls in the pointed-to module's
/// members wholesale.
fn module_completions(
    table: &SymbolTable,
    module: &str,
    complete_members: bool,
) -> Vec<CompletionEntry> {
    let mut visited = HashSet::new();
    visited.insert(module.to_string());
    collect_module_completions(table, module, complete_members, &mut visited)
}

/// The visited set keeps wildcard-pointer cycles finite.
fn collect_module_completions(
    table: &SymbolTable,
    module: &str,
    complete_members: bool,
    visited: &mut HashSet<String>,
) -> Vec<CompletionEntry> {
    let mut completions = Vec::new();
    let mut split_modules = BTreeSet::new();
    for reference in &table.hierarchy {
        if !reference.starts_with(module) || reference == module {
            continue;
        }
        let module_parts: Vec<&str> = module.split('.').collect();
        let reference_parts: Vec<&str> = reference.split('.').collect();
        for i in 0..module_parts.len().max(reference_parts.len()) {
            if module_parts.get(i) != reference_parts.get(i) {
                if let Some(part) = reference_parts.get(i) {
                    split_modules.insert((*part).to_string());
                }
                break;
            }
        }
    }
    if complete_members {
        completions.extend(
            top_level_completions(table)
                .into_iter()
                .filter(|c| c.menu.as_deref() == Some(module) && !c.word.starts_with('_')),
        );
        for (pointer, target) in &table.pointers {
            if !pointer.starts_with(module) {
                continue;
            }
            let basename = pointer.get(module.len() + 1..).unwrap_or("");
            if basename.contains('.') {
                continue;
            }
            if pointer.ends_with(".*") {
                let other = target.strip_suffix(".*").unwrap_or(target);
                if visited.insert(other.to_string()) {
                    completions.extend(collect_module_completions(table, other, true, visited));
                }
            } else {
                split_modules.insert(basename.to_string());
            }
        }
    }
    completions.extend(split_modules.into_iter().map(module_child_entry));
    completions
}

// ============================================================================
// Ordering
// ============================================================================

/// Lexicographic order with underscore-prefixed words pushed down: each
/// leading underscore adds a fixed penalty before the remainders compare.
fn compare_words(word1: &str, word2: &str) -> Ordering {
    word_score(word1, word2).cmp(&0)
}

fn word_score(word1: &str, word2: &str) -> i32 {
    if let Some(rest) = word1.strip_prefix('_') {
        return word_score(rest, word2) + 2;
    }
    if let Some(rest) = word2.strip_prefix('_') {
        return word_score(word1, rest) - 2;
    }
    match word1.cmp(word2) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve completions for a typed base in a detected context.
pub fn find_completions(
    base: &str,
    table: &SymbolTable,
    context: &CompletionContext,
    mode: MatchMode,
) -> Vec<CompletionEntry> {
    let call = match context {
        CompletionContext::Function {
            name,
            strip_closing_paren,
        }
        | CompletionContext::Method {
            name,
            strip_closing_paren,
        } => Some((name.clone(), *strip_closing_paren)),
        _ => None,
    };

    let mut completions = match context {
        CompletionContext::TopLevel => top_level_completions(table),
        CompletionContext::Module { path, show_members } => {
            module_completions(table, path, *show_members)
        }
        CompletionContext::Instance { class, parents } => {
            instance_completions(table, class.as_deref(), parents)
        }
        CompletionContext::Method { .. } => instance_completions(table, None, &[]),
        CompletionContext::Function { .. } => table
            .functions
            .iter()
            .map(|f| function_entry(f, CompletionKind::Function, None))
            .collect(),
    };

    if !base.is_empty() {
        let matches: MatchFn = match &call {
            Some((name, _)) => {
                let name = name.clone();
                Box::new(move |word: &str| word == name)
            }
            None => matcher(mode, base),
        };
        completions.retain(|c| matches(&c.word));
    }

    completions.sort_by(|a, b| compare_words(&a.word, &b.word));

    // a call context completes to the whole signature, not just the name
    if let Some((name, strip_closing_paren)) = call {
        if let Some(first) = completions.first_mut() {
            if first.word == name {
                if let Some(abbr) = &first.abbr {
                    first.word = if strip_closing_paren {
                        abbr.strip_suffix(')').unwrap_or(abbr).to_string()
                    } else {
                        abbr.clone()
                    };
                }
            }
        }
    }
    completions
}

// ============================================================================
// Tests
// ============================================================================
