//! Module walker: turns one parse tree into a symbol-table contribution.
//!
//! The walker keeps a scope stack while descending statements. Only nesting
//! depth 1 registers classes and functions; deeper definitions are walked for
//! their side effects (self-assignments, imports) but never surfaced. Base
//! classes and pointer targets are fully qualified at walk time against the
//! import aliases seen so far, so the resulting table never re-resolves
//! names lazily.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pyscent_core::error::{ScentError, ScentResult};
use pyscent_core::table::SymbolTable;
use tree_sitter::Node;

use crate::names::{self, parse_from_import, parse_import};
use crate::parse::ParsedModule;
use crate::probe::{package_of, FileProbe};
use crate::render::{render, render_parameters, string_body, RenderError};

/// Identity of the source unit being walked.
pub struct SourceUnit<'a> {
    /// Module stem, e.g. `TestModule` or `__init__`.
    pub module: &'a str,
    /// Dotted package of the containing directory, possibly empty.
    pub package: &'a str,
    /// Directory holding the file, used for relative-import probing.
    pub directory: &'a Path,
}

fn with_package(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}.{name}")
    }
}

/// Walk a parsed module and collect its symbol-table contribution.
///
/// Fails on the first expression the renderer cannot express; callers treat
/// that as "skip this file" rather than recording wrong signatures.
pub fn walk_module(
    parsed: &ParsedModule,
    unit: &SourceUnit<'_>,
    probe: &dyn FileProbe,
) -> Result<SymbolTable, RenderError> {
    let module = if unit.module == "__init__" {
        unit.package.to_string()
    } else {
        with_package(unit.package, unit.module)
    };
    let mut walker = Walker {
        source: &parsed.text,
        module,
        package: unit.package.to_string(),
        directory: unit.directory,
        probe,
        scope: Vec::new(),
        imports: BTreeMap::new(),
        table: SymbolTable::new(),
    };
    walker.table.push_module(walker.module.clone());
    let root = parsed.tree.root_node();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        walker.visit(child)?;
    }
    Ok(walker.table)
}

/// Walk a parsed module identified by its filesystem path.
///
/// The module stem and the dotted package are derived from the path, with
/// package markers located through `probe`. Render failures surface as
/// analysis errors naming the file.
pub fn analyze_unit(
    path: &Path,
    parsed: &ParsedModule,
    probe: &dyn FileProbe,
) -> ScentResult<SymbolTable> {
    let module = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let directory = path.parent().unwrap_or_else(|| Path::new(""));
    let package = package_of(probe, directory);
    let unit = SourceUnit {
        module: &module,
        package: &package,
        directory,
    };
    walk_module(parsed, &unit, probe)
        .map_err(|err| ScentError::analysis(path.display().to_string(), err.to_string()))
}

enum Scope {
    Class(String),
    Function,
}

struct Walker<'a> {
    source: &'a str,
    module: String,
    package: String,
    directory: &'a Path,
    probe: &'a dyn FileProbe,
    scope: Vec<Scope>,
    imports: BTreeMap<String, String>,
    table: SymbolTable,
}

impl Walker<'_> {
    fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or_default()
    }

    fn with_module(&self, name: &str) -> String {
        format!("{}.{}", self.module, name)
    }

    /// Table key of the class a method body belongs to, when the scope is
    /// exactly class-then-function.
    fn method_class_key(&self) -> Option<String> {
        match self.scope.as_slice() {
            [Scope::Class(name), Scope::Function] => Some(self.with_module(name)),
            _ => None,
        }
    }

    fn is_relative_import(&self, imported: &str) -> bool {
        if imported.is_empty() {
            return false;
        }
        let mut path = self.directory.to_path_buf();
        for part in imported.split('.') {
            path.push(part);
        }
        if self.probe.exists(&path) {
            return true;
        }
        self.probe.exists(&PathBuf::from(format!("{}.py", path.display())))
    }

    fn docstring_of(&self, definition: Node<'_>) -> String {
        let Some(body) = definition.child_by_field_name("body") else {
            return String::new();
        };
        let Some(first) = body.named_child(0) else {
            return String::new();
        };
        if first.kind() != "expression_statement" {
            return String::new();
        }
        match first.named_child(0) {
            Some(expr) if expr.kind() == "string" => string_body(expr, self.source),
            _ => String::new(),
        }
    }

    fn parameters(&self, definition: Node<'_>, drop_receiver: bool) -> Result<Vec<String>, RenderError> {
        match definition.child_by_field_name("parameters") {
            Some(parameters) => render_parameters(parameters, self.source, drop_receiver),
            None => Ok(Vec::new()),
        }
    }

    fn visit(&mut self, node: Node<'_>) -> Result<(), RenderError> {
        match node.kind() {
            "class_definition" => self.visit_class(node),
            "function_definition" => self.visit_function(node, &[]),
            "decorated_definition" => self.visit_decorated(node),
            "import_statement" => {
                self.visit_import(node);
                Ok(())
            }
            "import_from_statement" => {
                self.visit_from_import(node);
                Ok(())
            }
            "assignment" => {
                self.visit_assignment(node);
                Ok(())
            }
            "augmented_assignment" => Ok(()),
            _ => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.visit(child)?;
                }
                Ok(())
            }
        }
    }

    fn visit_decorated(&mut self, node: Node<'_>) -> Result<(), RenderError> {
        let mut cursor = node.walk();
        let decorators: Vec<Node> = node
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "decorator")
            .collect();
        let Some(definition) = node.child_by_field_name("definition") else {
            return Ok(());
        };
        match definition.kind() {
            "class_definition" => self.visit_class(definition),
            "function_definition" => self.visit_function(definition, &decorators),
            _ => Ok(()),
        }
    }

    fn visit_class(&mut self, node: Node<'_>) -> Result<(), RenderError> {
        let Some(name_node) = node.child_by_field_name("name") else {
            return Ok(());
        };
        let name = self.text(name_node).to_string();
        self.scope.push(Scope::Class(name.clone()));
        if self.scope.len() == 1 {
            let mut bases = Vec::new();
            if let Some(superclasses) = node.child_by_field_name("superclasses") {
                let mut cursor = superclasses.walk();
                for child in superclasses.named_children(&mut cursor) {
                    // metaclass=... and other keyword arguments are not bases
                    if child.kind() == "keyword_argument" {
                        continue;
                    }
                    let rendered = render(child, self.source)?;
                    bases.push(names::qualify(&rendered, &self.imports, Some(&self.module)));
                }
            }
            let docstring = self.docstring_of(node);
            self.table
                .add_class(self.with_module(&name), bases, docstring);
        }
        self.visit_body(node)?;
        self.scope.pop();
        Ok(())
    }

    fn visit_function(&mut self, node: Node<'_>, decorators: &[Node<'_>]) -> Result<(), RenderError> {
        let Some(name_node) = node.child_by_field_name("name") else {
            return Ok(());
        };
        let name = self.text(name_node).to_string();
        self.scope.push(Scope::Function);
        if let Some(class_key) = self.method_class_key() {
            if name == "__init__" {
                let args = self.parameters(node, true)?;
                self.table.set_constructor(&class_key, args);
            } else if self.has_property_decorator(decorators)? {
                self.table.add_property(&class_key, name);
            } else {
                let args = self.parameters(node, true)?;
                let docstring = self.docstring_of(node);
                self.table.add_method(&class_key, name, args, docstring);
            }
        } else if self.scope.len() == 1 {
            let args = self.parameters(node, false)?;
            let docstring = self.docstring_of(node);
            self.table
                .add_function(self.with_module(&name), args, docstring);
        }
        self.visit_body(node)?;
        self.scope.pop();
        Ok(())
    }

    fn has_property_decorator(&self, decorators: &[Node<'_>]) -> Result<bool, RenderError> {
        for decorator in decorators {
            if let Some(expression) = decorator.named_child(0) {
                if render(expression, self.source)? == "property" {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn visit_body(&mut self, node: Node<'_>) -> Result<(), RenderError> {
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                self.visit(child)?;
            }
        }
        Ok(())
    }

    fn visit_import(&mut self, node: Node<'_>) {
        for imported in parse_import(node, self.source) {
            self.imports
                .insert(imported.bound_name().to_string(), imported.name.clone());
            let target = if self.is_relative_import(&imported.name) {
                with_package(&self.package, &imported.name)
            } else {
                imported.name.clone()
            };
            let alias = self.with_module(imported.bound_name());
            self.table.add_pointer(alias, target);
        }
    }

    fn visit_from_import(&mut self, node: Node<'_>) {
        let Some(from) = parse_from_import(node, self.source) else {
            return;
        };
        let relative = from.explicit_relative || self.is_relative_import(&from.module);
        let mut bound: Vec<(String, String)> = Vec::new();
        if from.wildcard {
            bound.push(("*".to_string(), "*".to_string()));
        }
        for imported in &from.names {
            bound.push((imported.bound_name().to_string(), imported.name.clone()));
        }
        for (alias, name) in bound {
            self.imports.insert(alias.clone(), from.target(&name));
            let dotted = from.target(&name);
            let target = if relative {
                with_package(&self.package, &dotted)
            } else {
                dotted
            };
            self.table.add_pointer(self.with_module(&alias), target);
        }
    }

    fn visit_assignment(&mut self, node: Node<'_>) {
        let mut value = node;
        loop {
            if let Some(left) = value.child_by_field_name("left") {
                self.record_target(left);
            }
            match value.child_by_field_name("right") {
                Some(right) if right.kind() == "assignment" => value = right,
                _ => break,
            }
        }
    }

    fn record_target(&mut self, node: Node<'_>) {
        match node.kind() {
            "identifier" => {
                let name = self.text(node).to_string();
                let class_key = match self.scope.as_slice() {
                    [] => None,
                    [Scope::Class(class)] => Some(self.with_module(class)),
                    _ => return,
                };
                match class_key {
                    Some(key) => self.table.add_property(&key, name),
                    None => {
                        let constant = self.with_module(&name);
                        self.table.add_constant(constant);
                    }
                }
            }
            "pattern_list" | "tuple_pattern" | "list_pattern" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    self.record_target(child);
                }
            }
            "attribute" => {
                let Some(class_key) = self.method_class_key() else {
                    return;
                };
                let receiver_is_self = node
                    .child_by_field_name("object")
                    .is_some_and(|object| {
                        object.kind() == "identifier" && self.text(object) == "self"
                    });
                if receiver_is_self {
                    if let Some(attr) = node.child_by_field_name("attribute") {
                        let property = self.text(attr).to_string();
                        self.table.add_property(&class_key, property);
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_module;
    use crate::probe::StaticProbe;
    use pyscent_core::table::{ClassEntry, FunctionEntry};

    fn walk_unit(source: &str, module: &str, probe: &StaticProbe) -> SymbolTable {
        let parsed = parse_module(source).expect("fixture parses");
        let unit = SourceUnit {
            module,
            package: "TestPackage",
            directory: Path::new("TestData"),
        };
        walk_module(&parsed, &unit, probe).expect("fixture walks")
    }

    fn walk(source: &str) -> SymbolTable {
        walk_unit(source, "TestModule", &StaticProbe::default())
    }

    fn method_names(table: &SymbolTable, class: &str) -> Vec<String> {
        table.classes[class]
            .methods
            .iter()
            .map(|m| m.name.clone())
            .collect()
    }

    mod classes {
        use super::*;

        #[test]
        fn package_init_modules_register_under_the_package_name() {
            let table = walk_unit("class A(object):\n    pass\n", "__init__", &StaticProbe::default());
            assert_eq!(table.hierarchy, vec!["TestPackage"]);
            assert_eq!(table.classes["TestPackage.A"].bases, vec!["object"]);
        }

        #[test]
        fn unimported_bases_qualify_under_the_current_module() {
            let source = "class Parent(object):\n    pass\n\nclass A(Parent):\n    pass\n";
            let table = walk(source);
            assert_eq!(
                table.classes["TestPackage.TestModule.A"].bases,
                vec!["TestPackage.TestModule.Parent"]
            );
        }

        #[test]
        fn aliased_and_attribute_bases_resolve_through_imports() {
            let source = "\
from TestPackage.AnotherModule import AnotherClass as Nyer
from TestPackage import AbsoluteModule

class A(Nyer, AbsoluteModule.AbsoluteClass):
    pass
";
            let table = walk(source);
            assert_eq!(
                table.classes["TestPackage.TestModule.A"].bases,
                vec![
                    "TestPackage.AnotherModule.AnotherClass",
                    "TestPackage.AbsoluteModule.AbsoluteClass"
                ]
            );
        }

        #[test]
        fn dotted_bases_resolve_through_plain_and_aliased_imports() {
            let source = "\
import TestPackage.AnotherModule
import TestPackage as Hmer

class A(TestPackage.AnotherModule.AnotherClass):
    pass

class B(Hmer.AnotherModule.AnotherClass):
    pass
";
            let table = walk(source);
            assert_eq!(
                table.classes["TestPackage.TestModule.A"].bases,
                vec!["TestPackage.AnotherModule.AnotherClass"]
            );
            assert_eq!(
                table.classes["TestPackage.TestModule.B"].bases,
                vec!["TestPackage.AnotherModule.AnotherClass"]
            );
        }

        #[test]
        fn keyword_arguments_in_the_class_head_are_not_bases() {
            let source = "class A(Base, metaclass=Meta):\n    pass\n";
            let table = walk(source);
            assert_eq!(
                table.classes["TestPackage.TestModule.A"].bases,
                vec!["TestPackage.TestModule.Base"]
            );
        }

        #[test]
        fn class_docstrings_are_recorded() {
            let source = "class A(object):\n    'docstring of A'\n    pass\n";
            let table = walk(source);
            assert_eq!(
                table.classes["TestPackage.TestModule.A"].docstring,
                "docstring of A"
            );
        }

        #[test]
        fn a_minimal_class_produces_the_expected_entry() {
            let source = "\
class A(object):
    def __init__(self):
        self.x = 1

    def m(self):
        pass
";
            let table = walk(source);
            assert_eq!(
                table.classes["TestPackage.TestModule.A"],
                ClassEntry {
                    bases: vec!["object".to_string()],
                    constructor: Vec::new(),
                    docstring: String::new(),
                    methods: vec![FunctionEntry::new("m", Vec::new(), "")],
                    properties: vec!["x".to_string()],
                }
            );
        }

        #[test]
        fn nested_classes_are_walked_but_not_registered() {
            let source = "\
class A(object):
    def level1(self):
        class B(object):
            def level2(self):
                pass
        pass
";
            let table = walk(source);
            assert_eq!(table.classes.len(), 1);
            assert_eq!(method_names(&table, "TestPackage.TestModule.A"), vec!["level1"]);
            assert!(table.functions.is_empty());
        }
    }

    mod methods_and_properties {
        use super::*;

        #[test]
        fn constructor_signatures_drop_the_receiver() {
            let source = "\
class A(object):
    def __init__(self, arg1, arg2=1):
        pass
";
            let table = walk(source);
            assert_eq!(
                table.classes["TestPackage.TestModule.A"].constructor,
                vec!["arg1", "arg2=1"]
            );
        }

        #[test]
        fn method_signatures_and_docstrings_are_recorded() {
            let source = "\
class A(object):
    def method(self):
        'random docstring'
        pass

    def methodArgs(self, arg1, arg2):
        pass

    def methodDefaultArgs(self, arg1, arg2=None):
        pass

    def methodStar(self, arg1, *args):
        pass

    def methodKW(self, arg1, **kwargs):
        pass

    def methodAll(self, arg1, *args, **kwargs):
        pass

    def methodReallyAll(self, arg1, arg2='a string', *args, **kwargs):
        pass
";
            let table = walk(source);
            let methods = &table.classes["TestPackage.TestModule.A"].methods;
            let by_name = |name: &str| {
                methods
                    .iter()
                    .find(|m| m.name == name)
                    .unwrap_or_else(|| panic!("missing method {name}"))
            };
            assert_eq!(by_name("method").args, Vec::<String>::new());
            assert_eq!(by_name("method").docstring, "random docstring");
            assert_eq!(by_name("methodArgs").args, vec!["arg1", "arg2"]);
            assert_eq!(by_name("methodDefaultArgs").args, vec!["arg1", "arg2=None"]);
            assert_eq!(by_name("methodStar").args, vec!["arg1", "*args"]);
            assert_eq!(by_name("methodKW").args, vec!["arg1", "**kwargs"]);
            assert_eq!(by_name("methodAll").args, vec!["arg1", "*args", "**kwargs"]);
            assert_eq!(
                by_name("methodReallyAll").args,
                vec!["arg1", "arg2='a string'", "*args", "**kwargs"]
            );
        }

        #[test]
        fn properties_keep_first_occurrence_order() {
            let source = "\
class A(object):
    classprop = 1
    def __init__(self):
        self.plainprop = 2
        self.plainprop = 3
    @property
    def methodProp(self):
        pass
";
            let table = walk(source);
            assert_eq!(
                table.classes["TestPackage.TestModule.A"].properties,
                vec!["classprop", "plainprop", "methodProp"]
            );
        }

        #[test]
        fn old_style_property_wrappers_keep_the_wrapped_method() {
            let source = "\
class A(object):
    def __a(self):
        pass
    a = property(__a)
";
            let table = walk(source);
            let entry = &table.classes["TestPackage.TestModule.A"];
            assert_eq!(entry.properties, vec!["a"]);
            assert_eq!(method_names(&table, "TestPackage.TestModule.A"), vec!["__a"]);
        }

        #[test]
        fn self_assignments_anywhere_in_a_method_count() {
            let source = "\
class A(object):
    def m(self, flag):
        if flag:
            self.conditional = 1
        self.left, self.right = 1, 2
";
            let table = walk(source);
            assert_eq!(
                table.classes["TestPackage.TestModule.A"].properties,
                vec!["conditional", "left", "right"]
            );
        }

        #[test]
        fn assignments_to_other_receivers_are_ignored() {
            let source = "\
class A(object):
    def m(self, other):
        other.prop = 1
";
            let table = walk(source);
            assert!(table.classes["TestPackage.TestModule.A"].properties.is_empty());
        }

        #[test]
        fn walking_the_same_source_twice_and_merging_adds_nothing() {
            let source = "\
class A(object):
    def m(self, arg):
        self.prop = arg
";
            let mut table = walk(source);
            table.merge(walk(source));
            assert_eq!(method_names(&table, "TestPackage.TestModule.A"), vec!["m"]);
            assert_eq!(
                table.classes["TestPackage.TestModule.A"].properties,
                vec!["prop"]
            );
        }
    }

    mod functions_and_constants {
        use super::*;

        #[test]
        fn top_level_functions_are_fully_qualified() {
            let source = "\
def TopFunction1(arg1, arg2=True, **spinach):
    'docstring1'
    pass

def TopFunction2(arg1, arg2=False):
    'docstring2'
    pass
";
            let table = walk(source);
            assert_eq!(table.functions.len(), 2);
            assert_eq!(table.functions[0].name, "TestPackage.TestModule.TopFunction1");
            assert_eq!(
                table.functions[0].args,
                vec!["arg1", "arg2=True", "**spinach"]
            );
            assert_eq!(table.functions[0].docstring, "docstring1");
            assert_eq!(table.functions[1].name, "TestPackage.TestModule.TopFunction2");
            assert_eq!(table.functions[1].args, vec!["arg1", "arg2=False"]);
            assert_eq!(table.functions[1].docstring, "docstring2");
        }

        #[test]
        fn module_level_assignments_become_constants() {
            let table = walk("CONSTANT = 1\n");
            assert_eq!(table.constants, vec!["TestPackage.TestModule.CONSTANT"]);
        }

        #[test]
        fn unpacking_assignments_record_every_target() {
            let table = walk("FIRST, SECOND = 1, 2\n");
            assert_eq!(
                table.constants,
                vec!["TestPackage.TestModule.FIRST", "TestPackage.TestModule.SECOND"]
            );
        }

        #[test]
        fn function_local_assignments_are_not_constants() {
            let table = walk("def f():\n    local = 1\n");
            assert!(table.constants.is_empty());
        }

        #[test]
        fn unrenderable_defaults_fail_the_walk() {
            let parsed = parse_module("def f(x=[i for i in y]):\n    pass\n").unwrap();
            let unit = SourceUnit {
                module: "TestModule",
                package: "TestPackage",
                directory: Path::new("TestData"),
            };
            let err = walk_module(&parsed, &unit, &StaticProbe::default()).unwrap_err();
            assert_eq!(err.kind, "list_comprehension");
        }
    }

    mod imports_and_pointers {
        use super::*;

        #[test]
        fn imported_names_record_pointers_under_the_current_module() {
            let source = "\
from somewhere.something import other as mother
import somewhere.something as thing
";
            let table = walk(source);
            assert_eq!(
                table.pointers["TestPackage.TestModule.mother"],
                "somewhere.something.other"
            );
            assert_eq!(
                table.pointers["TestPackage.TestModule.thing"],
                "somewhere.something"
            );
        }

        #[test]
        fn wildcard_imports_record_a_wildcard_pointer() {
            let table = walk("from somewhere.something import *\n");
            assert_eq!(
                table.pointers["TestPackage.TestModule.*"],
                "somewhere.something.*"
            );
        }

        #[test]
        fn relative_imports_qualify_under_the_package() {
            let probe = StaticProbe::new(vec![
                PathBuf::from("TestData/relative"),
                PathBuf::from("TestData/relative/removed"),
            ]);
            let source = "\
import relative
from relative.removed import brother as bro
";
            let table = walk_unit(source, "TestModule", &probe);
            assert_eq!(
                table.pointers["TestPackage.TestModule.relative"],
                "TestPackage.relative"
            );
            assert_eq!(
                table.pointers["TestPackage.TestModule.bro"],
                "TestPackage.relative.removed.brother"
            );
        }

        #[test]
        fn dot_relative_imports_skip_the_filesystem_probe() {
            let table = walk("from .sibling import helper\n");
            assert_eq!(
                table.pointers["TestPackage.TestModule.helper"],
                "TestPackage.sibling.helper"
            );
        }

        #[test]
        fn imports_inside_functions_still_record_pointers() {
            let table = walk("def f():\n    import json\n");
            assert_eq!(table.pointers["TestPackage.TestModule.json"], "json");
        }
    }
}
