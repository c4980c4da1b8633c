//! Canonical rendering of expression nodes back into source-like text.
//!
//! Symbol tables store default argument values, base-class references, and
//! decorator names as plain strings. The renderer reconstructs that text from
//! parse-tree nodes. Unrecognized node kinds fail loudly: a wrong signature in
//! the table is worse than a skipped file, so callers catch [`RenderError`]
//! per file rather than per expression.

use thiserror::Error;
use tree_sitter::Node;

#[derive(Debug, Error)]
#[error("cannot render `{kind}` expression")]
pub struct RenderError {
    pub kind: String,
}

impl RenderError {
    fn new(kind: &str) -> Self {
        RenderError {
            kind: kind.to_string(),
        }
    }
}

fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or_default()
}

/// Raw text between the opening and closing quote tokens, escapes kept as
/// written.
pub(crate) fn string_body(node: Node<'_>, source: &str) -> String {
    let mut cursor = node.walk();
    let mut start = node.start_byte();
    let mut end = node.end_byte();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "string_start" => start = child.end_byte(),
            "string_end" => end = child.start_byte(),
            _ => {}
        }
    }
    if start <= end {
        source[start..end].to_string()
    } else {
        String::new()
    }
}

/// Quote a string the way `repr` would: single quotes unless the content
/// contains one and no double quote.
fn quote_string(content: &str) -> String {
    if !content.contains('\'') {
        format!("'{content}'")
    } else if !content.contains('"') {
        format!("\"{content}\"")
    } else {
        format!("'{}'", content.replace('\'', "\\'"))
    }
}

fn render_string(node: Node<'_>, source: &str) -> String {
    let content = string_body(node, source);
    if content.parse::<f64>().is_ok() {
        content
    } else {
        quote_string(&content)
    }
}

fn render_joined(
    node: Node<'_>,
    source: &str,
    separator: &str,
) -> Result<String, RenderError> {
    let mut cursor = node.walk();
    let mut parts = Vec::new();
    for child in node.named_children(&mut cursor) {
        parts.push(render(child, source)?);
    }
    Ok(parts.join(separator))
}

/// Render an expression node into its canonical textual form.
pub fn render(node: Node<'_>, source: &str) -> Result<String, RenderError> {
    match node.kind() {
        "identifier" | "integer" | "float" | "true" | "false" | "none" | "ellipsis" => {
            Ok(text(node, source).to_string())
        }
        "string" => Ok(render_string(node, source)),
        "concatenated_string" => {
            let mut cursor = node.walk();
            let content: String = node
                .named_children(&mut cursor)
                .filter(|child| child.kind() == "string")
                .map(|child| string_body(child, source))
                .collect();
            if content.parse::<f64>().is_ok() {
                Ok(content)
            } else {
                Ok(quote_string(&content))
            }
        }
        "attribute" => {
            let object = required_child(node, "object")?;
            let attr = required_child(node, "attribute")?;
            Ok(format!("{}.{}", render(object, source)?, text(attr, source)))
        }
        "call" => {
            let function = required_child(node, "function")?;
            let arguments = required_child(node, "arguments")?;
            let mut cursor = arguments.walk();
            let mut parts = Vec::new();
            for child in arguments.named_children(&mut cursor) {
                parts.push(render(child, source)?);
            }
            Ok(format!("{}({})", render(function, source)?, parts.join(", ")))
        }
        "keyword_argument" => {
            let name = required_child(node, "name")?;
            let value = required_child(node, "value")?;
            Ok(format!("{}={}", text(name, source), render(value, source)?))
        }
        "binary_operator" => {
            let left = required_child(node, "left")?;
            let operator = required_child(node, "operator")?;
            let right = required_child(node, "right")?;
            Ok(format!(
                "{}{}{}",
                render(left, source)?,
                text(operator, source),
                render(right, source)?
            ))
        }
        "boolean_operator" => {
            let left = required_child(node, "left")?;
            let operator = required_child(node, "operator")?;
            let right = required_child(node, "right")?;
            Ok(format!(
                "{} {} {}",
                render(left, source)?,
                text(operator, source),
                render(right, source)?
            ))
        }
        "not_operator" => {
            let argument = required_child(node, "argument")?;
            Ok(format!("not {}", render(argument, source)?))
        }
        "comparison_operator" => {
            let mut parts = Vec::new();
            for i in 0..node.child_count() {
                if let Some(child) = node.child(i) {
                    if child.is_named() {
                        parts.push(render(child, source)?);
                    } else {
                        parts.push(text(child, source).to_string());
                    }
                }
            }
            Ok(parts.join(" "))
        }
        "unary_operator" => {
            let operator = required_child(node, "operator")?;
            let argument = required_child(node, "argument")?;
            Ok(format!(
                "{}{}",
                text(operator, source),
                render(argument, source)?
            ))
        }
        "list" => Ok(format!("[{}]", render_joined(node, source, ", ")?)),
        "set" => Ok(format!("{{{}}}", render_joined(node, source, ", ")?)),
        "tuple" => {
            let mut cursor = node.walk();
            let mut parts = Vec::new();
            for child in node.named_children(&mut cursor) {
                parts.push(render(child, source)?);
            }
            if parts.len() == 1 {
                Ok(format!("({},)", parts[0]))
            } else {
                Ok(format!("({})", parts.join(", ")))
            }
        }
        "dictionary" => {
            let mut cursor = node.walk();
            let mut parts = Vec::new();
            for child in node.named_children(&mut cursor) {
                parts.push(render(child, source)?);
            }
            Ok(format!("{{{}}}", parts.join(", ")))
        }
        "pair" => {
            let key = required_child(node, "key")?;
            let value = required_child(node, "value")?;
            Ok(format!(
                "{}: {}",
                render(key, source)?,
                render(value, source)?
            ))
        }
        "lambda" => {
            let names = match node.child_by_field_name("parameters") {
                Some(parameters) => lambda_names(parameters, source)?,
                None => Vec::new(),
            };
            let body = required_child(node, "body")?;
            Ok(format!(
                "lambda {}: {}",
                names.join(", "),
                render(body, source)?
            ))
        }
        "subscript" => {
            let value = required_child(node, "value")?;
            let mut cursor = node.walk();
            let mut inner = String::new();
            for child in node.children_by_field_name("subscript", &mut cursor) {
                if !inner.is_empty() {
                    inner.push_str(", ");
                }
                inner.push_str(&render(child, source)?);
            }
            Ok(format!("{}[{}]", render(value, source)?, inner))
        }
        "slice" => {
            let mut parts = String::new();
            for i in 0..node.child_count() {
                if let Some(child) = node.child(i) {
                    if child.is_named() {
                        parts.push_str(&render(child, source)?);
                    } else {
                        parts.push_str(text(child, source));
                    }
                }
            }
            Ok(parts)
        }
        "parenthesized_expression" => match node.named_child(0) {
            Some(inner) => render(inner, source),
            None => Err(RenderError::new(node.kind())),
        },
        "list_splat" | "list_splat_pattern" | "dictionary_splat" | "dictionary_splat_pattern" => {
            Ok(text(node, source).to_string())
        }
        other => Err(RenderError::new(other)),
    }
}

fn required_child<'tree>(
    node: Node<'tree>,
    field: &str,
) -> Result<Node<'tree>, RenderError> {
    node.child_by_field_name(field)
        .ok_or_else(|| RenderError::new(node.kind()))
}

// ============================================================================
// Parameter lists
// ============================================================================

/// Default values keep `repr` semantics: string literals are always quoted,
/// everything else goes through the renderer.
fn render_default(node: Node<'_>, source: &str) -> Result<String, RenderError> {
    if node.kind() == "string" {
        Ok(quote_string(&string_body(node, source)))
    } else {
        render(node, source)
    }
}

fn tuple_parameter(node: Node<'_>, source: &str) -> Result<String, RenderError> {
    let mut cursor = node.walk();
    let mut parts = Vec::new();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "identifier" => parts.push(text(child, source).to_string()),
            "tuple_pattern" => parts.push(tuple_parameter(child, source)?),
            other => return Err(RenderError::new(other)),
        }
    }
    if parts.len() == 1 {
        Ok(format!("({},)", parts[0]))
    } else {
        Ok(format!("({})", parts.join(", ")))
    }
}

fn parameter_slot(node: Node<'_>, source: &str) -> Result<String, RenderError> {
    match node.kind() {
        "identifier" => Ok(text(node, source).to_string()),
        "default_parameter" => {
            let name = required_child(node, "name")?;
            let value = required_child(node, "value")?;
            let rendered_name = if name.kind() == "tuple_pattern" {
                tuple_parameter(name, source)?
            } else {
                text(name, source).to_string()
            };
            Ok(format!("{}={}", rendered_name, render_default(value, source)?))
        }
        "typed_parameter" => match node.named_child(0) {
            Some(inner) => parameter_slot(inner, source),
            None => Err(RenderError::new(node.kind())),
        },
        "typed_default_parameter" => {
            let name = required_child(node, "name")?;
            let value = required_child(node, "value")?;
            Ok(format!(
                "{}={}",
                text(name, source),
                render_default(value, source)?
            ))
        }
        "list_splat_pattern" | "dictionary_splat_pattern" => {
            Ok(text(node, source).to_string())
        }
        "tuple_pattern" => tuple_parameter(node, source),
        "keyword_separator" => Ok("*".to_string()),
        "positional_separator" => Ok("/".to_string()),
        other => Err(RenderError::new(other)),
    }
}

/// Render a `parameters` node into one string per slot, `name=value` for
/// defaulted slots and `*`/`**` markers kept. `drop_receiver` removes the
/// first slot for methods.
pub fn render_parameters(
    parameters: Node<'_>,
    source: &str,
    drop_receiver: bool,
) -> Result<Vec<String>, RenderError> {
    let mut cursor = parameters.walk();
    let mut slots = Vec::new();
    for child in parameters.named_children(&mut cursor) {
        slots.push(parameter_slot(child, source)?);
    }
    if drop_receiver && !slots.is_empty() {
        slots.remove(0);
    }
    Ok(slots)
}

/// Bare parameter names for lambda rendering, stars and defaults dropped.
fn lambda_names(parameters: Node<'_>, source: &str) -> Result<Vec<String>, RenderError> {
    let mut cursor = parameters.walk();
    let mut names = Vec::new();
    for child in parameters.named_children(&mut cursor) {
        match child.kind() {
            "identifier" => names.push(text(child, source).to_string()),
            "default_parameter" => {
                let name = required_child(child, "name")?;
                names.push(text(name, source).to_string());
            }
            "typed_parameter" | "typed_default_parameter" => {
                if let Some(name) = child.child_by_field_name("name").or_else(|| child.named_child(0)) {
                    names.push(text(name, source).to_string());
                }
            }
            "list_splat_pattern" | "dictionary_splat_pattern" => {
                if let Some(inner) = child.named_child(0) {
                    names.push(text(inner, source).to_string());
                }
            }
            "tuple_pattern" => names.push(tuple_parameter(child, source)?),
            "keyword_separator" | "positional_separator" => {}
            other => return Err(RenderError::new(other)),
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::{Parser, Tree};

    fn parse(source: &str) -> Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    /// Render the right-hand side of `x = <expr>`.
    fn rendered(expression: &str) -> String {
        let source = format!("x = {expression}\n");
        let tree = parse(&source);
        let module = tree.root_node();
        let statement = module.named_child(0).unwrap();
        let assignment = statement.named_child(0).unwrap();
        let value = assignment.child_by_field_name("right").unwrap();
        render(value, &source).unwrap()
    }

    fn assert_round_trip(expression: &str) {
        assert_eq!(rendered(expression), expression);
    }

    mod expressions {
        use super::*;

        #[test]
        fn names_and_literals_render_as_written() {
            assert_round_trip("A.B.C(1)");
            assert_round_trip("A.B.C");
            assert_round_trip("{a: b, c: d}");
            assert_round_trip("(a, b, c)");
            assert_round_trip("[a, b, c]");
            assert_round_trip("-180");
            assert_round_trip("1123.001");
            assert_round_trip("Some(opts=None)");
        }

        #[test]
        fn operators_keep_their_glyphs_without_spaces() {
            assert_round_trip("s%s");
            assert_round_trip("s|s|b");
            assert_round_trip("s-s");
            assert_round_trip("10*180");
            assert_round_trip("10/180");
            assert_round_trip("10**180");
            assert_round_trip("10>>180");
            assert_round_trip("10<<180");
        }

        #[test]
        fn boolean_operators_are_spaced() {
            assert_round_trip("a or b");
            assert_round_trip("a and b");
            assert_round_trip("not x.ishidden()");
        }

        #[test]
        fn lambdas_render_parameter_names_and_body() {
            assert_round_trip("lambda a: (c, b)");
            assert_round_trip("lambda name: name[:1] != '_'");
        }

        #[test]
        fn slices_omit_absent_bounds() {
            assert_round_trip("name[1:]");
            assert_round_trip("name[1:2]");
        }

        #[test]
        fn strings_follow_repr_rules() {
            assert_eq!(rendered("''"), "''");
            assert_eq!(rendered("'words'"), "'words'");
            assert_eq!(rendered("\"it's\""), "\"it's\"");
            // Numeric-looking string content loses its quotes.
            assert_eq!(rendered("'123'"), "123");
            assert_round_trip("'='+repr(v)");
        }

        #[test]
        fn comparisons_join_operands_and_glyphs_with_spaces() {
            assert_round_trip("a < b < c");
            assert_eq!(rendered("x!=2"), "x != 2");
        }

        #[test]
        fn unrenderable_kinds_fail_loudly() {
            let source = "x = [i for i in y]\n";
            let tree = parse(source);
            let assignment = tree
                .root_node()
                .named_child(0)
                .unwrap()
                .named_child(0)
                .unwrap();
            let value = assignment.child_by_field_name("right").unwrap();
            let err = render(value, source).unwrap_err();
            assert_eq!(err.kind, "list_comprehension");
        }
    }

    mod parameters {
        use super::*;

        fn slots(def: &str, drop_receiver: bool) -> Vec<String> {
            let source = format!("{def}\n    pass\n");
            let tree = parse(&source);
            let function = tree.root_node().named_child(0).unwrap();
            let parameters = function.child_by_field_name("parameters").unwrap();
            render_parameters(parameters, &source, drop_receiver).unwrap()
        }

        #[test]
        fn plain_and_defaulted_slots() {
            assert_eq!(
                slots("def f(a, b=2, c=None, d=4, e='string', f=A, g={}):", false),
                vec!["a", "b=2", "c=None", "d=4", "e='string'", "f=A", "g={}"]
            );
        }

        #[test]
        fn star_slots_keep_their_markers() {
            assert_eq!(
                slots("def m(self, arg1, *args, **kwargs):", true),
                vec!["arg1", "*args", "**kwargs"]
            );
            assert_eq!(
                slots("def m(self, arg1, arg2='a string', *args, **kwargs):", true),
                vec!["arg1", "arg2='a string'", "*args", "**kwargs"]
            );
        }

        #[test]
        fn receiver_slot_is_dropped_for_methods() {
            assert_eq!(slots("def m(self, arg1, arg2):", true), vec!["arg1", "arg2"]);
            assert_eq!(slots("def m(self):", true), Vec::<String>::new());
        }

        #[test]
        fn numeric_string_defaults_stay_quoted() {
            assert_eq!(slots("def f(a='123'):", false), vec!["a='123'"]);
        }

        #[test]
        fn annotations_are_dropped_from_slots() {
            assert_eq!(
                slots("def f(a: int, b: str = 'x'):", false),
                vec!["a", "b='x'"]
            );
        }

        #[test]
        fn rendering_its_own_output_is_stable() {
            let first = slots("def f(a, b=2, *args, **kwargs):", false);
            let rebuilt = format!("def f({}):", first.join(", "));
            assert_eq!(slots(&rebuilt, false), first);
        }
    }
}
