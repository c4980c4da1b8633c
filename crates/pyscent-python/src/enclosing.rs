//! Line-to-class resolution for `self.` completion.
//!
//! Walks a parse tree once, recording for every class definition the line
//! span its body occupies. The walk keeps a watermark of the last visited
//! line; a class's span runs from its `class` keyword line to the watermark
//! at body exit. Spans of nested classes punch holes in the enclosing span,
//! so a query line inside a nested helper class resolves to the helper, not
//! the outer class. Queries take the latest-starting span whose start is at
//! or above the line.

use std::collections::BTreeMap;

use tracing::debug;
use tree_sitter::Node;

use crate::names::{qualify, record_imports};
use crate::parse::ParsedModule;
use crate::render::render;

/// One contiguous stretch of lines belonging to a class body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRange {
    pub name: String,
    pub bases: Vec<String>,
    /// 1-based, inclusive.
    pub start: usize,
    pub end: usize,
}

/// All class line spans of a module, in traversal order. Nested class spans
/// split the spans of their enclosing classes.
pub fn class_ranges(parsed: &ParsedModule) -> Vec<ClassRange> {
    let mut inferer = Inferer {
        source: &parsed.text,
        imports: BTreeMap::new(),
        ranges: Vec::new(),
        watermark: 1,
    };
    let root = parsed.tree.root_node();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        inferer.visit(child);
    }
    inferer.ranges
}

/// Class name and base list enclosing a 1-based line, or `(None, [])` when
/// the line sits outside every class body.
pub fn class_and_parents_at(parsed: &ParsedModule, line: usize) -> (Option<String>, Vec<String>) {
    let mut ranges = class_ranges(parsed);
    ranges.sort_by(|a, b| b.start.cmp(&a.start));
    for range in ranges {
        if line >= range.start {
            return (Some(range.name), range.bases);
        }
    }
    (None, Vec::new())
}

struct Inferer<'a> {
    source: &'a str,
    imports: BTreeMap<String, String>,
    ranges: Vec<ClassRange>,
    watermark: usize,
}

impl Inferer<'_> {
    fn visit(&mut self, node: Node<'_>) {
        match node.kind() {
            "class_definition" => self.visit_class(node),
            "import_statement" | "import_from_statement" => {
                self.watermark = node.start_position().row + 1;
                record_imports(node, self.source, &mut self.imports);
            }
            // comments never move the watermark
            "comment" => {}
            _ => {
                self.watermark = node.start_position().row + 1;
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    self.visit(child);
                }
            }
        }
    }

    fn visit_class(&mut self, node: Node<'_>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = name_node
            .utf8_text(self.source.as_bytes())
            .unwrap_or_default()
            .to_string();
        let class_line = node.start_position().row + 1;
        self.watermark = class_line;
        let bases = self.class_bases(node);
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in body.named_children(&mut cursor) {
                self.visit(child);
            }
        }
        self.push_ranges(name, bases, class_line, self.watermark);
        self.watermark = class_line;
    }

    fn class_bases(&self, node: Node<'_>) -> Vec<String> {
        let Some(superclasses) = node.child_by_field_name("superclasses") else {
            return Vec::new();
        };
        let mut bases = Vec::new();
        let mut cursor = superclasses.walk();
        for child in superclasses.named_children(&mut cursor) {
            if child.kind() == "keyword_argument" {
                continue;
            }
            match render(child, self.source) {
                Ok(rendered) => bases.push(qualify(&rendered, &self.imports, None)),
                Err(err) => debug!("skipping base of inferred class: {err}"),
            }
        }
        bases
    }

    /// Record the span `[start, end]`, split around any already-recorded
    /// spans it strictly contains.
    fn push_ranges(&mut self, name: String, bases: Vec<String>, start: usize, end: usize) {
        let mut contained: Vec<(usize, usize)> = self
            .ranges
            .iter()
            .filter(|range| range.start > start && range.end < end)
            .map(|range| (range.start, range.end))
            .collect();
        contained.sort_unstable();
        let mut holes: Vec<(usize, usize)> = Vec::new();
        for (hole_start, hole_end) in contained {
            match holes.last_mut() {
                Some(last) if hole_start <= last.1 + 1 => last.1 = last.1.max(hole_end),
                _ => holes.push((hole_start, hole_end)),
            }
        }
        let mut segment_start = start;
        for (hole_start, hole_end) in holes {
            self.ranges.push(ClassRange {
                name: name.clone(),
                bases: bases.clone(),
                start: segment_start,
                end: hole_start - 1,
            });
            segment_start = hole_end + 1;
        }
        self.ranges.push(ClassRange {
            name,
            bases,
            start: segment_start,
            end,
        });
    }
}
