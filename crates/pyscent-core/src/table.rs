//! The aggregate symbol table built by static analysis.
//!
//! A [`SymbolTable`] has five members, all built incrementally while walking
//! source files:
//!
//! - `classes`: fully-qualified class name → bases, docstring, constructor
//!   signature, methods, properties
//! - `functions`: top-level functions with qualified names
//! - `constants`: qualified module-level assignment targets
//! - `pointers`: import-alias name → fully-qualified target, including
//!   wildcard entries ending in `.*`
//! - `hierarchy`: every module/package name encountered, in walk order
//!
//! Names are fully qualified when they enter the table; nothing re-qualifies
//! lazily. Merging two tables concatenates the list members and dict-merges
//! the map members, last writer wins per key, so merging contributions from
//! disjoint file sets commutes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Entries
// ============================================================================

/// A callable recorded in the table: a top-level function (qualified name)
/// or a method (bare name) with its rendered parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionEntry {
    pub name: String,
    pub args: Vec<String>,
    pub docstring: String,
}

impl FunctionEntry {
    pub fn new(
        name: impl Into<String>,
        args: Vec<String>,
        docstring: impl Into<String>,
    ) -> Self {
        FunctionEntry {
            name: name.into(),
            args,
            docstring: docstring.into(),
        }
    }
}

/// Everything recorded about one class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub bases: Vec<String>,
    pub constructor: Vec<String>,
    pub docstring: String,
    pub methods: Vec<FunctionEntry>,
    pub properties: Vec<String>,
}

impl ClassEntry {
    /// Fresh entry holding only bases and docstring; members are added as
    /// the class body is walked.
    pub fn new(bases: Vec<String>, docstring: impl Into<String>) -> Self {
        ClassEntry {
            bases,
            docstring: docstring.into(),
            ..ClassEntry::default()
        }
    }
}

// ============================================================================
// Symbol Table
// ============================================================================

/// The aggregate index of classes, functions, constants, pointers, and the
/// module hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolTable {
    #[serde(rename = "CLASSES")]
    pub classes: BTreeMap<String, ClassEntry>,
    #[serde(rename = "FUNCTIONS")]
    pub functions: Vec<FunctionEntry>,
    #[serde(rename = "CONSTANTS")]
    pub constants: Vec<String>,
    #[serde(rename = "POINTERS")]
    pub pointers: BTreeMap<String, String>,
    #[serde(rename = "HIERARCHY")]
    pub hierarchy: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
            && self.functions.is_empty()
            && self.constants.is_empty()
            && self.pointers.is_empty()
            && self.hierarchy.is_empty()
    }

    // ------------------------------------------------------------------
    // Incremental construction
    // ------------------------------------------------------------------

    /// Record a module/package name in the hierarchy.
    pub fn push_module(&mut self, module: impl Into<String>) {
        self.hierarchy.push(module.into());
    }

    /// Register a class under its fully-qualified name. Re-registering
    /// replaces the previous entry wholesale.
    pub fn add_class(&mut self, name: impl Into<String>, bases: Vec<String>, docstring: impl Into<String>) {
        self.classes.insert(name.into(), ClassEntry::new(bases, docstring));
    }

    /// Record the constructor signature of a registered class.
    pub fn set_constructor(&mut self, class: &str, args: Vec<String>) {
        if let Some(entry) = self.classes.get_mut(class) {
            entry.constructor = args;
        }
    }

    /// Record a method of a registered class. Duplicate (name, args,
    /// docstring) entries are suppressed.
    pub fn add_method(
        &mut self,
        class: &str,
        name: impl Into<String>,
        args: Vec<String>,
        docstring: impl Into<String>,
    ) {
        if let Some(entry) = self.classes.get_mut(class) {
            let method = FunctionEntry::new(name, args, docstring);
            if !entry.methods.contains(&method) {
                entry.methods.push(method);
            }
        }
    }

    /// Record a property of a registered class, keeping first-occurrence
    /// order and suppressing duplicates.
    pub fn add_property(&mut self, class: &str, property: impl Into<String>) {
        if let Some(entry) = self.classes.get_mut(class) {
            let property = property.into();
            if !entry.properties.contains(&property) {
                entry.properties.push(property);
            }
        }
    }

    /// Record a top-level function under its fully-qualified name.
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        args: Vec<String>,
        docstring: impl Into<String>,
    ) {
        self.functions.push(FunctionEntry::new(name, args, docstring));
    }

    /// Record a module-level constant under its fully-qualified name.
    pub fn add_constant(&mut self, name: impl Into<String>) {
        self.constants.push(name.into());
    }

    /// Record an import-alias pointer.
    pub fn add_pointer(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.pointers.insert(alias.into(), target.into());
    }

    // ------------------------------------------------------------------
    // Merging
    // ------------------------------------------------------------------

    /// Merge another table's contribution into this one: list members
    /// concatenate, map members update with last writer winning per key.
    pub fn merge(&mut self, other: SymbolTable) {
        self.constants.extend(other.constants);
        self.functions.extend(other.functions);
        self.hierarchy.extend(other.hierarchy);
        self.classes.extend(other.classes);
        self.pointers.extend(other.pointers);
    }

    // ------------------------------------------------------------------
    // Pointer resolution
    // ------------------------------------------------------------------

    /// Resolve a name through the pointer map.
    ///
    /// An exact pointer wins. Otherwise a wildcard pointer `"A.*" → "B.*"`
    /// maps `A`-prefixed names into the corresponding child of `B`. Names
    /// with no applicable pointer come back unchanged.
    pub fn resolve_pointer(&self, name: &str) -> String {
        if let Some(target) = self.pointers.get(name) {
            return target.clone();
        }
        for (pointer, target) in &self.pointers {
            if let Some(prefix) = pointer.strip_suffix(".*") {
                if name.starts_with(prefix) {
                    let tail = name.split_once('.').map(|(_, t)| t).unwrap_or(name);
                    let target_prefix = target.strip_suffix(".*").unwrap_or(target);
                    return format!("{}.{}", target_prefix, tail);
                }
            }
        }
        name.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> FunctionEntry {
        FunctionEntry::new(name, vec![], "")
    }

    mod construction {
        use super::*;

        #[test]
        fn re_registering_a_class_replaces_its_entry() {
            let mut table = SymbolTable::new();
            table.add_class("Mod.A", vec!["object".to_string()], "doc");
            table.add_method("Mod.A", "m", vec![], "");
            table.add_class("Mod.A", vec![], "");
            assert!(table.classes["Mod.A"].methods.is_empty());
            assert!(table.classes["Mod.A"].bases.is_empty());
        }

        #[test]
        fn duplicate_methods_are_suppressed() {
            let mut table = SymbolTable::new();
            table.add_class("Mod.A", vec![], "");
            table.add_method("Mod.A", "m", vec!["x".to_string()], "doc");
            table.add_method("Mod.A", "m", vec!["x".to_string()], "doc");
            assert_eq!(table.classes["Mod.A"].methods.len(), 1);
        }

        #[test]
        fn same_name_different_args_is_not_a_duplicate() {
            let mut table = SymbolTable::new();
            table.add_class("Mod.A", vec![], "");
            table.add_method("Mod.A", "m", vec![], "");
            table.add_method("Mod.A", "m", vec!["x".to_string()], "");
            assert_eq!(table.classes["Mod.A"].methods.len(), 2);
        }

        #[test]
        fn properties_keep_first_occurrence_order_without_duplicates() {
            let mut table = SymbolTable::new();
            table.add_class("Mod.A", vec![], "");
            table.add_property("Mod.A", "b");
            table.add_property("Mod.A", "a");
            table.add_property("Mod.A", "b");
            assert_eq!(table.classes["Mod.A"].properties, vec!["b", "a"]);
        }

        #[test]
        fn members_of_unregistered_classes_are_ignored() {
            let mut table = SymbolTable::new();
            table.add_method("Mod.Ghost", "m", vec![], "");
            table.add_property("Mod.Ghost", "p");
            table.set_constructor("Mod.Ghost", vec![]);
            assert!(table.classes.is_empty());
        }
    }

    mod merging {
        use super::*;

        fn table_one() -> SymbolTable {
            let mut table = SymbolTable::new();
            table.push_module("PackageA");
            table.add_constant("PackageA.CONSTANT");
            table.add_function("PackageA.func", vec![], "");
            table.add_class("PackageA.ClassA", vec![], "");
            table.add_pointer("PackageA.os", "os");
            table
        }

        fn table_two() -> SymbolTable {
            let mut table = SymbolTable::new();
            table.push_module("PackageB");
            table.add_constant("PackageB.OTHER");
            table.add_class("PackageB.ClassB", vec![], "");
            table
        }

        #[test]
        fn lists_concatenate_and_maps_union() {
            let mut merged = table_one();
            merged.merge(table_two());
            assert_eq!(merged.hierarchy, vec!["PackageA", "PackageB"]);
            assert_eq!(merged.constants, vec!["PackageA.CONSTANT", "PackageB.OTHER"]);
            assert_eq!(merged.classes.len(), 2);
            assert_eq!(merged.pointers.len(), 1);
        }

        #[test]
        fn disjoint_merge_commutes_on_map_members() {
            let mut ab = table_one();
            ab.merge(table_two());
            let mut ba = table_two();
            ba.merge(table_one());
            assert_eq!(ab.classes, ba.classes);
            assert_eq!(ab.pointers, ba.pointers);
        }

        #[test]
        fn colliding_class_keys_take_the_later_entry() {
            let mut first = SymbolTable::new();
            first.add_class("Mod.A", vec!["object".to_string()], "old");
            let mut second = SymbolTable::new();
            second.add_class("Mod.A", vec![], "new");
            first.merge(second);
            assert_eq!(first.classes["Mod.A"].docstring, "new");
        }

        #[test]
        fn merging_an_empty_table_changes_nothing() {
            let mut table = table_one();
            let before = table.clone();
            table.merge(SymbolTable::new());
            assert_eq!(table, before);
        }
    }

    mod pointer_resolution {
        use super::*;

        fn nested_table() -> SymbolTable {
            let mut table = SymbolTable::new();
            table.add_pointer("Star.*", "Nested.Package.Module.*");
            table.add_pointer("Mod.Alias", "Other.Thing");
            table
        }

        #[test]
        fn exact_pointer_resolves() {
            let table = nested_table();
            assert_eq!(table.resolve_pointer("Mod.Alias"), "Other.Thing");
        }

        #[test]
        fn wildcard_pointer_maps_children() {
            let table = nested_table();
            assert_eq!(
                table.resolve_pointer("Star.AClass"),
                "Nested.Package.Module.AClass"
            );
        }

        #[test]
        fn exact_pointer_takes_precedence_over_wildcard() {
            let mut table = SymbolTable::new();
            table.add_pointer("Star.*", "Wild.*");
            table.add_pointer("Star.Special", "Elsewhere.Special");
            assert_eq!(table.resolve_pointer("Star.Special"), "Elsewhere.Special");
        }

        #[test]
        fn unknown_names_come_back_unchanged() {
            let table = nested_table();
            assert_eq!(table.resolve_pointer("Nowhere.Thing"), "Nowhere.Thing");
        }

        #[test]
        fn repeated_wildcard_resolution_is_stable() {
            let table = nested_table();
            let first = table.resolve_pointer("Star.AClass");
            let second = table.resolve_pointer("Star.AClass");
            assert_eq!(first, second);
        }
    }

    mod serialization {
        use super::*;

        #[test]
        fn canonical_keys_are_uppercase() {
            let mut table = SymbolTable::new();
            table.push_module("Mod");
            table.add_constant("Mod.X");
            let json = serde_json::to_value(&table).expect("serializes");
            assert!(json.get("CLASSES").is_some());
            assert!(json.get("FUNCTIONS").is_some());
            assert!(json.get("CONSTANTS").is_some());
            assert!(json.get("POINTERS").is_some());
            assert!(json.get("HIERARCHY").is_some());
        }

        #[test]
        fn round_trip_reproduces_the_table() {
            let mut table = SymbolTable::new();
            table.push_module("PackageA.ModuleA");
            table.add_class("PackageA.ModuleA.ClassA", vec!["object".to_string()], "doc");
            table.set_constructor("PackageA.ModuleA.ClassA", vec!["x".to_string()]);
            table.add_method("PackageA.ModuleA.ClassA", "method_a", vec![], "m doc");
            table.add_property("PackageA.ModuleA.ClassA", "prop");
            table.add_function("PackageA.ModuleA.func", vec!["a=1".to_string()], "");
            table.add_constant("PackageA.ModuleA.CONSTANT");
            table.add_pointer("PackageA.ModuleA.path", "os.path");

            let json = serde_json::to_string(&table).expect("serializes");
            let back: SymbolTable = serde_json::from_str(&json).expect("deserializes");
            assert_eq!(back, table);
        }

        #[test]
        fn function_entries_survive_round_trips() {
            let original = entry("Mod.f");
            let json = serde_json::to_string(&original).expect("serializes");
            let back: FunctionEntry = serde_json::from_str(&json).expect("deserializes");
            assert_eq!(back, original);
        }
    }
}
