//! Import maps, name qualification, and lightweight name scans.
//!
//! These helpers answer "what does this identifier refer to" questions
//! without building a full symbol table: which aliases the imports bind,
//! which expression a local name was assigned from, and which class names
//! appear anywhere in the file.

use std::collections::BTreeMap;

use pyscent_core::builtins::is_builtin;
use tree_sitter::{Node, Tree};

use crate::render::render;

fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or_default()
}

// ============================================================================
// Import statements
// ============================================================================

pub(crate) struct ImportedName {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportedName {
    pub fn bound_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

pub(crate) struct FromImport {
    /// Dotted module path with any leading relative dots stripped.
    pub module: String,
    /// Leading-dot relative form (`from . import x`, `from .sibling import y`).
    pub explicit_relative: bool,
    pub wildcard: bool,
    pub names: Vec<ImportedName>,
}

impl FromImport {
    /// Fully-dotted target for one imported name.
    pub fn target(&self, name: &str) -> String {
        if self.module.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.module, name)
        }
    }
}

fn imported_name(node: Node<'_>, source: &str) -> Option<ImportedName> {
    match node.kind() {
        "dotted_name" | "identifier" => Some(ImportedName {
            name: text(node, source).to_string(),
            alias: None,
        }),
        "aliased_import" => {
            let name = node.child_by_field_name("name")?;
            let alias = node.child_by_field_name("alias")?;
            Some(ImportedName {
                name: text(name, source).to_string(),
                alias: Some(text(alias, source).to_string()),
            })
        }
        _ => None,
    }
}

pub(crate) fn parse_import(node: Node<'_>, source: &str) -> Vec<ImportedName> {
    let mut cursor = node.walk();
    node.children_by_field_name("name", &mut cursor)
        .filter_map(|child| imported_name(child, source))
        .collect()
}

pub(crate) fn parse_from_import(node: Node<'_>, source: &str) -> Option<FromImport> {
    let module_node = node.child_by_field_name("module_name")?;
    let (module, explicit_relative) = match module_node.kind() {
        "relative_import" => {
            let mut cursor = module_node.walk();
            let dotted = module_node
                .named_children(&mut cursor)
                .find(|child| child.kind() == "dotted_name")
                .map(|child| text(child, source).to_string())
                .unwrap_or_default();
            (dotted, true)
        }
        _ => (text(module_node, source).to_string(), false),
    };
    let mut wildcard = false;
    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "wildcard_import" {
            wildcard = true;
        }
    }
    let mut name_cursor = node.walk();
    for child in node.children_by_field_name("name", &mut name_cursor) {
        if let Some(name) = imported_name(child, source) {
            names.push(name);
        }
    }
    Some(FromImport {
        module,
        explicit_relative,
        wildcard,
        names,
    })
}

pub(crate) fn record_imports(node: Node<'_>, source: &str, imports: &mut BTreeMap<String, String>) {
    match node.kind() {
        "import_statement" => {
            for imported in parse_import(node, source) {
                imports.insert(imported.bound_name().to_string(), imported.name.clone());
            }
        }
        "import_from_statement" => {
            let Some(from) = parse_from_import(node, source) else {
                return;
            };
            if from.wildcard {
                imports.insert("*".to_string(), from.target("*"));
            }
            for imported in &from.names {
                imports.insert(
                    imported.bound_name().to_string(),
                    from.target(&imported.name),
                );
            }
        }
        _ => {}
    }
}

/// All import aliases in the file, keyed by locally-bound name. A wildcard
/// import records the key `*`.
pub fn collect_imports(tree: &Tree, source: &str) -> BTreeMap<String, String> {
    let mut imports = BTreeMap::new();
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "import_statement" | "import_from_statement" => {
                record_imports(node, source, &mut imports);
            }
            _ => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    stack.push(child);
                }
            }
        }
    }
    imports
}

// ============================================================================
// Qualification
// ============================================================================

/// Resolve a dotted name against an import-alias map. Builtins pass through
/// untouched. An exact alias hit substitutes the whole name; otherwise the
/// longest textual prefix match rewrites the head. Unmatched names fall back
/// to `module.name` qualification when a module is given.
pub fn qualify(
    name: &str,
    imports: &BTreeMap<String, String>,
    current_module: Option<&str>,
) -> String {
    if is_builtin(name) {
        return name.to_string();
    }
    if let Some(target) = imports.get(name) {
        return target.clone();
    }
    let longest = imports
        .iter()
        .filter(|(alias, _)| alias.as_str() != "*" && name.starts_with(alias.as_str()))
        .max_by_key(|(alias, _)| alias.len());
    if let Some((alias, target)) = longest {
        return format!("{}{}", target, &name[alias.len()..]);
    }
    match current_module {
        Some(module) if !module.is_empty() => format!("{module}.{name}"),
        _ => name.to_string(),
    }
}

// ============================================================================
// Name and class scans
// ============================================================================

/// Locally-visible names mapped to the expression text they were assigned
/// from, plus every class name defined anywhere in the file.
pub struct SourceNames {
    pub names: BTreeMap<String, String>,
    pub classes: Vec<String>,
}

fn record_assignment(node: Node<'_>, source: &str, names: &mut BTreeMap<String, String>) {
    let mut targets = Vec::new();
    let mut value = node;
    loop {
        if let Some(left) = value.child_by_field_name("left") {
            targets.push(left);
        }
        match value.child_by_field_name("right") {
            Some(right) if right.kind() == "assignment" => value = right,
            Some(right) => {
                value = right;
                break;
            }
            None => return,
        }
    }
    // A value the renderer cannot express just drops this binding.
    let Ok(rendered) = render(value, source) else {
        return;
    };
    for target in targets {
        match target.kind() {
            "identifier" => {
                names.insert(text(target, source).to_string(), rendered.clone());
            }
            "attribute" => {
                if let Some(attr) = target.child_by_field_name("attribute") {
                    names.insert(text(attr, source).to_string(), rendered.clone());
                }
            }
            _ => {}
        }
    }
}

/// Scan the whole file for assignments, class definitions, and imports.
/// Import aliases override same-named assignments in the result.
pub fn source_names(tree: &Tree, source: &str) -> SourceNames {
    let mut names = BTreeMap::new();
    let mut classes = Vec::new();
    scan(tree.root_node(), source, &mut names, &mut classes);
    for (alias, target) in collect_imports(tree, source) {
        names.insert(alias, target);
    }
    SourceNames { names, classes }
}

fn scan(
    node: Node<'_>,
    source: &str,
    names: &mut BTreeMap<String, String>,
    classes: &mut Vec<String>,
) {
    match node.kind() {
        "assignment" => {
            record_assignment(node, source, names);
        }
        "class_definition" => {
            if let Some(name) = node.child_by_field_name("name") {
                classes.push(text(name, source).to_string());
            }
            if let Some(body) = node.child_by_field_name("body") {
                scan(body, source, names, classes);
            }
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                scan(child, source, names, classes);
            }
        }
    }
}
