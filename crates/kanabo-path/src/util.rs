//! Path rendering and inspection helpers.
//!
//! Three operations over [`crate::parser`]'s `JsonPath`/`Step`/`NodeTest`/
//! `Predicate` types: rendering a parsed path back to text, structural
//! equality between two parsed paths, and listing the mapping keys a path
//! accesses.

use crate::parser::{JsonPath, NodeTest, PathKind, Predicate, Step};

const BARE_NAME_STOP: &[char] = &['.', '[', ']', '*', '(', ')', ':', ',', '\''];

/// Renders a parsed path back into JSONPath syntax. Not guaranteed to
/// reproduce the original expression byte-for-byte (e.g. quoting choice and
/// whitespace are not preserved), only an equivalent expression.
pub fn path_to_string(path: &JsonPath) -> String {
    let mut out = String::new();
    for step in &path.steps {
        render_step(&mut out, step, path.kind);
    }
    out
}

fn render_step(out: &mut String, step: &Step, kind: PathKind) {
    match &step.test {
        NodeTest::None => out.push_str(match kind {
            PathKind::Absolute => "$",
            PathKind::Relative => "@",
        }),
        NodeTest::Wildcard if step.axis == crate::parser::StepAxis::Recursive => {
            out.push_str("..*")
        }
        NodeTest::Wildcard => out.push_str(".*"),
        NodeTest::Type(type_kind) => {
            out.push_str(if step.axis == crate::parser::StepAxis::Recursive {
                ".."
            } else {
                "."
            });
            out.push_str(type_test_keyword(*type_kind));
            out.push_str("()");
        }
        NodeTest::Name(name) => {
            out.push_str(if step.axis == crate::parser::StepAxis::Recursive {
                ".."
            } else {
                "."
            });
            render_name(out, name);
        }
    }
    if let Some(predicate) = &step.predicate {
        render_predicate(out, predicate);
    }
}

fn type_test_keyword(kind: crate::parser::TypeTestKind) -> &'static str {
    use crate::parser::TypeTestKind::*;
    match kind {
        Object => "object",
        Array => "array",
        String => "string",
        Number => "number",
        Boolean => "boolean",
        Null => "null",
    }
}

fn render_name(out: &mut String, name: &[u8]) {
    let text = String::from_utf8_lossy(name);
    if text.is_empty() || text.chars().any(|c| c.is_whitespace() || BARE_NAME_STOP.contains(&c)) {
        out.push('\'');
        out.push_str(&text.replace('\\', "\\\\").replace('\'', "\\'"));
        out.push('\'');
    } else {
        out.push_str(&text);
    }
}

fn render_predicate(out: &mut String, predicate: &Predicate) {
    out.push('[');
    match predicate {
        Predicate::Wildcard => out.push('*'),
        Predicate::Subscript { index } => out.push_str(&index.to_string()),
        Predicate::Slice { from, to, step } => {
            if let Some(from) = from {
                out.push_str(&from.to_string());
            }
            out.push(':');
            if let Some(to) = to {
                out.push_str(&to.to_string());
            }
            if let Some(step) = step {
                out.push(':');
                out.push_str(&step.to_string());
            }
        }
        Predicate::Join { left, right } => {
            out.push_str(&path_to_string(left));
            out.push(',');
            out.push_str(&path_to_string(right));
        }
    }
    out.push(']');
}

/// Structural equality between two parsed paths.
pub fn path_equals(left: &JsonPath, right: &JsonPath) -> bool {
    left == right
}

/// Every name a `Name` node test in `path` matches against, in step order.
/// Used by the emitter to report which mapping keys a query touches.
pub fn accessed_names(path: &JsonPath) -> Vec<&[u8]> {
    path.steps
        .iter()
        .filter_map(|step| match &step.test {
            NodeTest::Name(name) => Some(name.as_slice()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn renders_a_simple_chain() {
        let path = parse(b"$.store.book[0].title").unwrap();
        assert_eq!(path_to_string(&path), "$.store.book[0].title");
    }

    #[test]
    fn renders_recursive_wildcard() {
        let path = parse(b"$..*").unwrap();
        assert_eq!(path_to_string(&path), "$..*");
    }

    #[test]
    fn renders_a_slice_predicate() {
        let path = parse(b"$.xs[1:4:2]").unwrap();
        assert_eq!(path_to_string(&path), "$.xs[1:4:2]");
    }

    #[test]
    fn quotes_names_that_are_not_bare_words() {
        let path = parse(b"$['a b']").unwrap();
        assert_eq!(path_to_string(&path), "$['a b']");
    }

    #[test]
    fn equals_is_structural() {
        let a = parse(b"$.store.book").unwrap();
        let b = parse(b"$.store.book").unwrap();
        let c = parse(b"$.store.magazine").unwrap();
        assert!(path_equals(&a, &b));
        assert!(!path_equals(&a, &c));
    }

    #[test]
    fn collects_accessed_names() {
        let path = parse(b"$.store.book[0].title").unwrap();
        assert_eq!(accessed_names(&path), vec![b"store".as_slice(), b"book", b"title"]);
    }
}
