//! Evaluator: applies a [`JsonPath`] to a [`DocumentSet`], producing an
//! ordered [`Nodelist`].
//!
//! Each step runs against a working result list that starts as the document
//! roots and is replaced, step by step, by whatever that step's axis and
//! node test matched in the previous list — no parallel path-components
//! bookkeeping is carried alongside it.

use std::collections::HashSet;
use std::rc::Rc;

use log::{debug, error, trace};

use crate::error::EvalError;
use crate::model::{DocumentSet, Node, Nodelist, ScalarKind};
use crate::parser::{JsonPath, NodeTest, Predicate, Step, StepAxis, TypeTestKind};

/// Evaluates `path` against `documents`. Preconditions: documents
/// non-empty, first document has a root, path has at least one step.
pub fn evaluate(documents: &DocumentSet, path: &JsonPath) -> Result<Nodelist, EvalError> {
    if documents.is_empty() {
        error!("no document in model");
        return Err(EvalError::NoDocumentInModel);
    }
    if path.steps.is_empty() {
        error!("path has no steps");
        return Err(EvalError::PathIsEmpty);
    }
    let Node::Document(first) = documents.documents[0].as_ref() else {
        error!("first document slot did not contain a Document node");
        return Err(EvalError::NoRootInDocument);
    };
    let _ = first; // existence check only; root is re-fetched per step below

    debug!("beginning evaluation of {} steps", path.steps.len());

    let mut working: Nodelist = vec![Rc::clone(&documents.documents[0])];

    for (index, step) in path.steps.iter().enumerate() {
        trace!("step {index}: {:?}", step.axis);
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        for node in &working {
            apply_node_test(node, step, index, &mut result, &mut visited)?;
        }
        working = result;

        if let Some(predicate) = &step.predicate {
            let mut result = Vec::new();
            for node in &working {
                apply_predicate(node, predicate, index, &mut result)?;
            }
            working = result;
        }
    }

    Ok(working)
}

fn apply_node_test(
    node: &Rc<Node>,
    step: &Step,
    index: usize,
    out: &mut Nodelist,
    visited: &mut HashSet<*const Node>,
) -> Result<(), EvalError> {
    match step.axis {
        StepAxis::Root => {
            trace!("evaluating root step");
            match node.as_ref() {
                Node::Document(doc) => out.push(Rc::clone(&doc.root)),
                _ => {
                    error!("root step applied to a non-document node at step {index}");
                    return Err(EvalError::UnexpectedDocumentNode(index));
                }
            }
            Ok(())
        }
        StepAxis::Single => {
            if node.is_document() {
                error!("unexpected document node encountered mid-path at step {index}");
                return Err(EvalError::UnexpectedDocumentNode(index));
            }
            apply_single_test(node, &step.test, out);
            Ok(())
        }
        StepAxis::Recursive => {
            if node.is_document() {
                error!("unexpected document node encountered mid-path at step {index}");
                return Err(EvalError::UnexpectedDocumentNode(index));
            }
            recurse(node, &step.test, out, visited);
            Ok(())
        }
    }
}

fn apply_single_test(node: &Rc<Node>, test: &NodeTest, out: &mut Nodelist) {
    match test {
        NodeTest::Wildcard => emit_children(node, out),
        NodeTest::Type(kind) => {
            let resolved = node.resolve();
            if node_matches_type(&resolved, *kind) {
                out.push(resolved);
            }
        }
        NodeTest::Name(name) => {
            let resolved = node.resolve();
            if let Node::Mapping(m) = resolved.as_ref() {
                if let Some(value) = m.get(name) {
                    out.push(value.resolve());
                }
            }
        }
        NodeTest::None => {
            // Only ever occurs on the synthesized Root step, handled
            // above in apply_node_test before we get here.
        }
    }
}

/// The node test applied at each node visited during a recursive descent.
/// Differs from [`apply_single_test`] in two ways:
///
/// - `Wildcard` emits every node it *visits* (mapping, sequence, and scalar
///   alike), not each visited node's children — the `Single` step's
///   children-emitting wildcard would double-count every node once as a
///   sibling's child and again as its own visit.
/// - `Name` routes its matched value through `visited` before emitting:
///   two distinct visited nodes (e.g. two sibling mappings) can each carry
///   the same key resolving to the same shared anchor target, and that
///   target must be emitted at most once per recursive descent, the same
///   guarantee `recurse` itself gives its direct visits.
fn apply_recursive_test(
    node: &Rc<Node>,
    test: &NodeTest,
    out: &mut Nodelist,
    visited: &mut HashSet<*const Node>,
) {
    match test {
        NodeTest::Wildcard => out.push(Rc::clone(node)),
        NodeTest::Name(name) => {
            if let Node::Mapping(m) = node.as_ref() {
                if let Some(value) = m.get(name) {
                    push_deduped(value.resolve(), out, visited);
                }
            }
        }
        NodeTest::Type(kind) => {
            if node_matches_type(node, *kind) {
                out.push(Rc::clone(node));
            }
        }
        NodeTest::None => {}
    }
}

/// Emits `node` unless its resolved identity has already been recorded in
/// `visited`, so a node test match reached through two different paths
/// (e.g. a shared anchor aliased from a sibling) is only emitted once.
fn push_deduped(node: Rc<Node>, out: &mut Nodelist, visited: &mut HashSet<*const Node>) {
    if visited.insert(Rc::as_ptr(&node)) {
        out.push(node);
    } else {
        trace!("recursive step: matched node already emitted, skipping duplicate");
    }
}

fn emit_children(node: &Rc<Node>, out: &mut Nodelist) {
    match node.as_ref() {
        Node::Mapping(m) => {
            for entry in &m.entries {
                out.push(entry.value.resolve());
            }
        }
        Node::Sequence(s) => {
            for item in &s.items {
                out.push(item.resolve());
            }
        }
        Node::Scalar(_) => out.push(Rc::clone(node)),
        Node::Alias(a) => emit_children(&a.target, out),
        Node::Document(_) => {
            // Never reached: apply_node_test rejects Document nodes before
            // they can hit a Single/Wildcard test.
        }
    }
}

fn node_matches_type(node: &Rc<Node>, kind: TypeTestKind) -> bool {
    match (node.as_ref(), kind) {
        (Node::Mapping(_), TypeTestKind::Object) => true,
        (Node::Sequence(_), TypeTestKind::Array) => true,
        (Node::Scalar(s), TypeTestKind::String) => s.kind == ScalarKind::String,
        (Node::Scalar(s), TypeTestKind::Number) => {
            matches!(s.kind, ScalarKind::Integer | ScalarKind::Decimal)
        }
        (Node::Scalar(s), TypeTestKind::Boolean) => s.kind == ScalarKind::Boolean,
        (Node::Scalar(s), TypeTestKind::Null) => s.kind == ScalarKind::Null,
        _ => false,
    }
}

/// Depth-first, pre-order walk applying `test` at every node visited, then
/// descending into sequence items / mapping values. A
/// `Recursive + Wildcard` step therefore emits every node visited,
/// interior nodes included, not just leaves.
///
/// Every node's resolved identity is recorded in `visited` (keyed on `Rc`
/// pointer identity) the first time it is reached, whether directly or
/// through an alias. The only way the same pointer can be reached twice in
/// a tree is via an anchor/alias pair or an alias cycle, so this single
/// check both de-duplicates a shared anchor target and terminates cycles
/// without needing to special-case `Alias` nodes.
fn recurse(node: &Rc<Node>, test: &NodeTest, out: &mut Nodelist, visited: &mut HashSet<*const Node>) {
    let node = node.resolve();
    let ptr = Rc::as_ptr(&node);
    if !visited.insert(ptr) {
        trace!("recursive step: node already visited, skipping (shared anchor or cycle)");
        return;
    }

    apply_recursive_test(&node, test, out, visited);

    match node.as_ref() {
        Node::Mapping(m) => {
            for entry in &m.entries {
                recurse(&entry.value, test, out, visited);
            }
        }
        Node::Sequence(s) => {
            for item in &s.items {
                recurse(item, test, out, visited);
            }
        }
        Node::Scalar(_) => {
            trace!("recursive step: found scalar, recursion finished on this path");
        }
        Node::Alias(_) | Node::Document(_) => {
            // Alias was already unwrapped above; Document never occurs here.
        }
    }
}

fn apply_predicate(
    node: &Rc<Node>,
    predicate: &Predicate,
    index: usize,
    out: &mut Nodelist,
) -> Result<(), EvalError> {
    match predicate {
        Predicate::Wildcard => {
            let resolved = node.resolve();
            match resolved.as_ref() {
                Node::Sequence(s) => out.extend(s.items.iter().map(|n| n.resolve())),
                _ => out.push(resolved),
            }
        }
        Predicate::Subscript { index: i } => {
            let resolved = node.resolve();
            if let Node::Sequence(s) = resolved.as_ref() {
                apply_subscript(s, *i, out);
            }
        }
        Predicate::Slice { from, to, step } => {
            let resolved = node.resolve();
            if let Node::Sequence(s) = resolved.as_ref() {
                apply_slice(s, *from, *to, *step, out);
            }
        }
        Predicate::Join { .. } => {
            error!("unsupported join predicate at step {index}");
            return Err(EvalError::UnsupportedPath(index));
        }
    }
    Ok(())
}

/// Negative indices are *not* normalized: a negative index casts to a
/// huge unsigned comparison against size and so is always dropped. This is
/// intentionally bug-compatible rather than Pythonic.
fn apply_subscript(sequence: &crate::model::SequenceNode, index: i64, out: &mut Nodelist) {
    if index < 0 {
        trace!("subscript predicate: negative index dropped (bug-compatible)");
        return;
    }
    let size = sequence.items.len() as i64;
    if index >= size {
        trace!("subscript predicate: index out of range, dropping");
        return;
    }
    out.push(sequence.items[index as usize].resolve());
}

fn apply_slice(
    sequence: &crate::model::SequenceNode,
    from: Option<i64>,
    to: Option<i64>,
    step: Option<i64>,
    out: &mut Nodelist,
) {
    let n = sequence.items.len() as i64;
    let step = step.unwrap_or(1);

    if step > 0 {
        let start = normalize_extent(from, 0, n);
        let end = normalize_extent(to, n, n);
        let mut i = start;
        while i < end && i < n {
            if i >= 0 {
                out.push(sequence.items[i as usize].resolve());
            }
            i += step;
        }
    } else {
        // step < 0: endpoints swap — `[a:b:-1]`
        // traverses from `b-1` down to `a`.
        let start = normalize_extent(to, n, n) - 1;
        let end = normalize_extent(from, 0, n);
        let mut i = start;
        while i >= end && i >= 0 {
            if i < n {
                out.push(sequence.items[i as usize].resolve());
            }
            i += step;
        }
    }
}

/// `normalize(v, default, limit)`: absent → `default`;
/// negative → add `limit`; then clamp to `[0, limit]`.
fn normalize_extent(value: Option<i64>, default: i64, limit: i64) -> i64 {
    match value {
        None => default,
        Some(v) => {
            let r = if v < 0 { v + limit } else { v };
            r.clamp(0, limit)
        }
    }
}
