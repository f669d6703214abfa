//! The in-memory document tree evaluated by [`crate::eval`] and produced
//! by a loader outside this crate.
//!
//! A single tagged `enum` covers the five node kinds; pattern matching
//! replaces the virtual dispatch a `Node` base class would otherwise need.

use std::rc::Rc;

/// One node of a document tree.
///
/// A `Document` only ever appears as a top-level member of a
/// [`DocumentSet`] — it never occurs as the child of another node.
#[derive(Debug, Clone)]
pub enum Node {
    Document(DocumentNode),
    Scalar(ScalarNode),
    Sequence(SequenceNode),
    Mapping(MappingNode),
    Alias(AliasNode),
}

#[derive(Debug, Clone)]
pub struct DocumentNode {
    pub root: Rc<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Integer,
    Decimal,
    Timestamp,
    Boolean,
    Null,
}

#[derive(Debug, Clone)]
pub struct ScalarNode {
    pub kind: ScalarKind,
    pub bytes: Vec<u8>,
    pub tag: Option<String>,
    pub anchor: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SequenceNode {
    pub items: Vec<Rc<Node>>,
    pub tag: Option<String>,
    pub anchor: Option<String>,
}

/// A mapping entry. Keys are restricted to scalars and are unique under
/// byte-equality of the scalar value; the loader is responsible for
/// enforcing that invariant (duplicate-key policy is a loader concern).
#[derive(Debug, Clone)]
pub struct MappingEntry {
    pub key: ScalarNode,
    pub value: Rc<Node>,
}

#[derive(Debug, Clone)]
pub struct MappingNode {
    pub entries: Vec<MappingEntry>,
    pub tag: Option<String>,
    pub anchor: Option<String>,
}

/// A non-owning reference to a node already present elsewhere in the tree
/// (YAML `&anchor` / `*alias`). Equality follows the target, not the
/// `Alias` wrapper itself.
#[derive(Debug, Clone)]
pub struct AliasNode {
    pub target: Rc<Node>,
}

impl Node {
    /// Byte length for scalars, entry count for sequences/mappings, 1 for
    /// a document, 0 for an alias.
    pub fn size(&self) -> usize {
        match self {
            Node::Scalar(s) => s.bytes.len(),
            Node::Sequence(s) => s.items.len(),
            Node::Mapping(m) => m.entries.len(),
            Node::Document(_) => 1,
            Node::Alias(_) => 0,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => s.tag.as_deref(),
            Node::Sequence(s) => s.tag.as_deref(),
            Node::Mapping(m) => m.tag.as_deref(),
            Node::Document(_) | Node::Alias(_) => None,
        }
    }

    pub fn anchor(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => s.anchor.as_deref(),
            Node::Sequence(s) => s.anchor.as_deref(),
            Node::Mapping(m) => m.anchor.as_deref(),
            Node::Document(_) | Node::Alias(_) => None,
        }
    }

    /// Follow `Alias` chains until a non-alias node is reached. Does not
    /// itself guard against cycles — callers that walk the tree (the
    /// evaluator) track visited alias targets themselves.
    pub fn resolve(self: &Rc<Node>) -> Rc<Node> {
        let mut current = Rc::clone(self);
        loop {
            match current.as_ref() {
                Node::Alias(a) => current = Rc::clone(&a.target),
                _ => return current,
            }
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Node::Document(_))
    }

    /// Follow `Alias` chains on a borrowed node, the same as [`Node::resolve`]
    /// but without an `Rc` receiver. Used by equality, which only ever has
    /// `&Node` on hand.
    fn resolve_ref(&self) -> &Node {
        let mut current = self;
        while let Node::Alias(a) = current {
            current = &a.target;
        }
        current
    }
}

/// Structural equality: kinds and contents match element-wise; alias
/// equality compares resolved targets.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.resolve_ref(), other.resolve_ref());
        match (a, b) {
            (Node::Document(a), Node::Document(b)) => a.root == b.root,
            (Node::Scalar(a), Node::Scalar(b)) => a.kind == b.kind && a.bytes == b.bytes,
            (Node::Sequence(a), Node::Sequence(b)) => a.items == b.items,
            (Node::Mapping(a), Node::Mapping(b)) => {
                a.entries.len() == b.entries.len()
                    && a.entries.iter().zip(b.entries.iter()).all(|(x, y)| {
                        x.key.kind == y.key.kind && x.key.bytes == y.key.bytes && x.value == y.value
                    })
            }
            _ => false,
        }
    }
}

/// SDBM-style byte hash, used for mapping-key lookup. Any consistent
/// function works; SDBM is cheap and pulls in no external crate.
pub fn key_hash(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0;
    for &b in bytes {
        hash = (b as u64)
            .wrapping_add(hash.wrapping_shl(6))
            .wrapping_add(hash.wrapping_shl(16))
            .wrapping_sub(hash);
    }
    hash
}

impl MappingNode {
    pub fn get(&self, key: &[u8]) -> Option<&Rc<Node>> {
        self.entries
            .iter()
            .find(|entry| entry.key.bytes == key)
            .map(|entry| &entry.value)
    }
}

/// Owns every document produced by a load, and thus every node reachable
/// from them. `Nodelist`s elsewhere in the crate hold `Rc` clones into
/// this arena and must not outlive it.
#[derive(Debug, Clone, Default)]
pub struct DocumentSet {
    pub documents: Vec<Rc<Node>>,
}

impl DocumentSet {
    pub fn new(documents: Vec<Rc<Node>>) -> Self {
        Self { documents }
    }

    pub fn single(root: Rc<Node>) -> Self {
        Self {
            documents: vec![Rc::new(Node::Document(DocumentNode { root }))],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Ordered, possibly-duplicate result of an evaluation.
pub type Nodelist = Vec<Rc<Node>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(bytes: &str) -> Rc<Node> {
        Rc::new(Node::Scalar(ScalarNode {
            kind: ScalarKind::String,
            bytes: bytes.as_bytes().to_vec(),
            tag: None,
            anchor: None,
        }))
    }

    #[test]
    fn size_counts_scalar_bytes_and_sequence_length() {
        let doc = Rc::new(Node::Document(DocumentNode { root: scalar("x") }));
        assert_eq!(doc.size(), 1);
        assert_eq!(scalar("hello").size(), 5);

        let seq = Node::Sequence(SequenceNode {
            items: vec![scalar("a"), scalar("b")],
            tag: None,
            anchor: None,
        });
        assert_eq!(seq.size(), 2);

        let alias = Node::Alias(AliasNode {
            target: scalar("a"),
        });
        assert_eq!(alias.size(), 0);
    }

    #[test]
    fn alias_equality_follows_target() {
        let target = scalar("shared");
        let alias = Rc::new(Node::Alias(AliasNode {
            target: Rc::clone(&target),
        }));
        assert_eq!(alias.resolve().as_ref(), target.as_ref());
    }

    #[test]
    fn mapping_lookup_is_byte_equality() {
        let value = scalar("1");
        let mapping = MappingNode {
            entries: vec![MappingEntry {
                key: ScalarNode {
                    kind: ScalarKind::String,
                    bytes: b"a".to_vec(),
                    tag: None,
                    anchor: None,
                },
                value: Rc::clone(&value),
            }],
            tag: None,
            anchor: None,
        };
        assert!(mapping.get(b"a").is_some());
        assert!(mapping.get(b"b").is_none());
    }
}
