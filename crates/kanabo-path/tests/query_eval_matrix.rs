//! End-to-end coverage driving `parse` and `evaluate` together against a
//! small bookstore-shaped document, the way a real caller would use this
//! crate (a loader builds the tree, then repeatedly parses and evaluates
//! queries against it).

use std::rc::Rc;

use kanabo_path::{
    evaluate, parse, path_to_string, AliasNode, DocumentNode, DocumentSet, MappingEntry,
    MappingNode, Node, ScalarKind, ScalarNode, SequenceNode,
};

fn scalar_str(text: &str) -> Rc<Node> {
    Rc::new(Node::Scalar(ScalarNode {
        kind: ScalarKind::String,
        bytes: text.as_bytes().to_vec(),
        tag: None,
        anchor: None,
    }))
}

fn scalar_int(n: i64) -> Rc<Node> {
    Rc::new(Node::Scalar(ScalarNode {
        kind: ScalarKind::Integer,
        bytes: n.to_string().into_bytes(),
        tag: None,
        anchor: None,
    }))
}

fn key(text: &str) -> ScalarNode {
    ScalarNode {
        kind: ScalarKind::String,
        bytes: text.as_bytes().to_vec(),
        tag: None,
        anchor: None,
    }
}

fn mapping(entries: Vec<(&str, Rc<Node>)>) -> Rc<Node> {
    Rc::new(Node::Mapping(MappingNode {
        entries: entries
            .into_iter()
            .map(|(k, v)| MappingEntry { key: key(k), value: v })
            .collect(),
        tag: None,
        anchor: None,
    }))
}

fn sequence(items: Vec<Rc<Node>>) -> Rc<Node> {
    Rc::new(Node::Sequence(SequenceNode {
        items,
        tag: None,
        anchor: None,
    }))
}

/// A small bookstore document with a shared `price` anchor aliased from a
/// second book, so the alias-dedup tests below have something real to
/// exercise.
fn bookstore() -> DocumentSet {
    let shared_price = scalar_int(10);
    let book_a = mapping(vec![
        ("title", scalar_str("Tortilla Flat")),
        ("author", scalar_str("Steinbeck")),
        ("price", Rc::clone(&shared_price)),
    ]);
    let book_b = mapping(vec![
        ("title", scalar_str("Of Mice and Men")),
        ("author", scalar_str("Steinbeck")),
        ("price", Rc::new(Node::Alias(AliasNode { target: shared_price }))),
    ]);
    let store = mapping(vec![("book", sequence(vec![book_a, book_b]))]);
    let root = mapping(vec![("store", store)]);
    DocumentSet::new(vec![Rc::new(Node::Document(DocumentNode { root }))])
}

fn run(expression: &str, documents: &DocumentSet) -> Vec<Rc<Node>> {
    let path = parse(expression.as_bytes()).expect("expression should parse");
    evaluate(documents, &path).expect("evaluation should succeed")
}

fn text_of(node: &Node) -> String {
    match node {
        Node::Scalar(s) => String::from_utf8_lossy(&s.bytes).into_owned(),
        other => panic!("expected a scalar, got {other:?}"),
    }
}

#[test]
fn dotted_path_reaches_a_nested_leaf() {
    let result = run("$.store.book[0].title", &bookstore());
    assert_eq!(result.len(), 1);
    assert_eq!(text_of(&result[0]), "Tortilla Flat");
}

#[test]
fn wildcard_predicate_collects_every_author() {
    let result = run("$.store.book[*].author", &bookstore());
    let names: Vec<String> = result.iter().map(|n| text_of(n)).collect();
    assert_eq!(names, vec!["Steinbeck", "Steinbeck"]);
}

#[test]
fn recursive_descent_dedupes_a_shared_anchor() {
    let result = run("$..price", &bookstore());
    assert_eq!(result.len(), 1);
    assert_eq!(text_of(&result[0]), "10");
}

#[test]
fn negative_subscript_is_bug_compatibly_dropped() {
    let result = run("$.store.book[-1]", &bookstore());
    assert!(result.is_empty());
}

#[test]
fn slice_selects_a_sub_range() {
    let result = run("$.store.book[0:1].title", &bookstore());
    assert_eq!(result.len(), 1);
    assert_eq!(text_of(&result[0]), "Tortilla Flat");
}

#[test]
fn parse_error_reports_a_one_based_column() {
    let errors = parse(b"$.").unwrap_err();
    assert!(!errors.is_empty());
    assert!(errors[0].position.column >= 1);
}

#[test]
fn rendered_path_round_trips_through_the_parser() {
    let path = parse(b"$.store.book[*].title").unwrap();
    let rendered = path_to_string(&path);
    let reparsed = parse(rendered.as_bytes()).unwrap();
    assert_eq!(path, reparsed);
}

#[test]
fn empty_expression_is_rejected_before_scanning() {
    let errors = parse(b"").unwrap_err();
    assert_eq!(errors.len(), 1);
}
