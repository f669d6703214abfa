//! Builds a [`kanabo_path::DocumentSet`] from source text.
//!
//! JSON input goes through `serde_json::Value` directly — JSON has no
//! anchors, so every node is freshly owned. YAML input is driven off
//! `yaml_rust2`'s low-level event stream rather than its resolved `Yaml`
//! value type: `Yaml` clones a shared anchor's value at every alias site,
//! which is exactly the identity the evaluator needs to preserve so a
//! recursive descent visits a shared anchor's target only once.

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use kanabo_path::{
    AliasNode, DocumentSet, MappingEntry, MappingNode, Node, ScalarKind, ScalarNode, SequenceNode,
};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle, TokenType};

use crate::error::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DuplicatePolicy {
    First,
    Last,
    Error,
}

/// Parses `text` as JSON if its first non-whitespace byte opens an object or
/// array, otherwise as YAML (a superset of JSON, so this also covers bare
/// JSON scalars/documents that don't start with `{`/`[`).
pub fn load(path: &Path, text: &str, duplicate: DuplicatePolicy) -> Result<DocumentSet, CliError> {
    if looks_like_json(text) {
        load_json(path, text)
    } else {
        load_yaml(path, text, duplicate)
    }
}

fn looks_like_json(text: &str) -> bool {
    matches!(text.trim_start().as_bytes().first(), Some(b'{') | Some(b'['))
}

fn load_json(path: &Path, text: &str) -> Result<DocumentSet, CliError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|source| CliError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    let root = json_to_node(&value);
    Ok(DocumentSet::single(root))
}

fn json_to_node(value: &serde_json::Value) -> Rc<Node> {
    match value {
        serde_json::Value::Null => scalar(ScalarKind::Null, "null"),
        serde_json::Value::Bool(b) => scalar(ScalarKind::Boolean, if *b { "true" } else { "false" }),
        serde_json::Value::Number(n) => {
            let kind = if n.is_i64() || n.is_u64() {
                ScalarKind::Integer
            } else {
                ScalarKind::Decimal
            };
            scalar(kind, &n.to_string())
        }
        serde_json::Value::String(s) => scalar(ScalarKind::String, s),
        serde_json::Value::Array(items) => Rc::new(Node::Sequence(SequenceNode {
            items: items.iter().map(json_to_node).collect(),
            tag: None,
            anchor: None,
        })),
        serde_json::Value::Object(map) => Rc::new(Node::Mapping(MappingNode {
            entries: map
                .iter()
                .map(|(k, v)| MappingEntry {
                    key: string_scalar(k),
                    value: json_to_node(v),
                })
                .collect(),
            tag: None,
            anchor: None,
        })),
    }
}

fn scalar(kind: ScalarKind, text: &str) -> Rc<Node> {
    Rc::new(Node::Scalar(ScalarNode {
        kind,
        bytes: text.as_bytes().to_vec(),
        tag: None,
        anchor: None,
    }))
}

fn string_scalar(text: &str) -> ScalarNode {
    ScalarNode {
        kind: ScalarKind::String,
        bytes: text.as_bytes().to_vec(),
        tag: None,
        anchor: None,
    }
}

fn load_yaml(path: &Path, text: &str, duplicate: DuplicatePolicy) -> Result<DocumentSet, CliError> {
    let mut builder = YamlBuilder::new(path.to_path_buf(), duplicate);
    let mut parser = Parser::new(text.chars());
    parser
        .load(&mut builder, true)
        .map_err(|err| CliError::Yaml {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    builder.finish()
}

enum Frame {
    Sequence {
        anchor_id: usize,
        tag: Option<String>,
        items: Vec<Rc<Node>>,
    },
    Mapping {
        anchor_id: usize,
        tag: Option<String>,
        entries: Vec<MappingEntry>,
        pending_key: Option<ScalarNode>,
    },
}

/// Stack machine consuming a flat event stream into [`Node`] trees.
/// Anchors are recorded as they complete (keyed on `yaml_rust2`'s numeric
/// anchor id) and looked up again on [`Event::Alias`], which is the only
/// place the resulting tree shares an `Rc` rather than owning a fresh node.
struct YamlBuilder {
    path: std::path::PathBuf,
    duplicate: DuplicatePolicy,
    anchors: HashMap<usize, Rc<Node>>,
    stack: Vec<Frame>,
    documents: Vec<Rc<Node>>,
    error: Option<CliError>,
}

impl YamlBuilder {
    fn new(path: std::path::PathBuf, duplicate: DuplicatePolicy) -> Self {
        Self {
            path,
            duplicate,
            anchors: HashMap::new(),
            stack: Vec::new(),
            documents: Vec::new(),
            error: None,
        }
    }

    fn finish(self) -> Result<DocumentSet, CliError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(DocumentSet::new(self.documents))
    }

    fn fail(&mut self, err: CliError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn record_anchor(&mut self, anchor_id: usize, node: &Rc<Node>) {
        if anchor_id != 0 {
            self.anchors.insert(anchor_id, Rc::clone(node));
        }
    }

    fn push_value(&mut self, node: Rc<Node>) {
        match self.stack.last_mut() {
            None => {
                self.documents
                    .push(Rc::new(Node::Document(kanabo_path::DocumentNode { root: node })));
            }
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping {
                entries,
                pending_key,
                ..
            }) => match pending_key.take() {
                None => match key_scalar(&node) {
                    Some(key) => *pending_key = Some(key),
                    None => {
                        self.fail(CliError::NonScalarMappingKey {
                            path: self.path.clone(),
                        });
                    }
                },
                Some(key) => {
                    if let Some(existing) = entries
                        .iter()
                        .position(|e| e.key.bytes == key.bytes)
                    {
                        match self.duplicate {
                            DuplicatePolicy::First => {}
                            DuplicatePolicy::Last => entries[existing].value = node,
                            DuplicatePolicy::Error => {
                                self.fail(CliError::DuplicateKey {
                                    path: self.path.clone(),
                                    key: String::from_utf8_lossy(&key.bytes).into_owned(),
                                });
                            }
                        }
                    } else {
                        entries.push(MappingEntry { key, value: node });
                    }
                }
            },
        }
    }
}

fn key_scalar(node: &Rc<Node>) -> Option<ScalarNode> {
    match node.as_ref() {
        Node::Scalar(s) => Some(s.clone()),
        Node::Alias(a) => key_scalar(&a.target),
        _ => None,
    }
}

fn tag_string(tag: &Option<TokenType>) -> Option<String> {
    match tag {
        Some(TokenType::Tag(handle, suffix)) => Some(format!("{handle}{suffix}")),
        _ => None,
    }
}

fn resolve_scalar(value: &str, style: TScalarStyle, tag: &Option<String>) -> ScalarNode {
    let kind = match tag.as_deref() {
        Some("!!str") => ScalarKind::String,
        Some("!!int") => ScalarKind::Integer,
        Some("!!float") => ScalarKind::Decimal,
        Some("!!bool") => ScalarKind::Boolean,
        Some("!!null") => ScalarKind::Null,
        Some("!!timestamp") => ScalarKind::Timestamp,
        _ if style != TScalarStyle::Plain => ScalarKind::String,
        _ => implicit_kind(value),
    };
    ScalarNode {
        kind,
        bytes: value.as_bytes().to_vec(),
        tag: tag.clone(),
        anchor: None,
    }
}

/// YAML 1.1 core-schema-style implicit resolution for an unquoted plain
/// scalar: null/bool/int/float literals, timestamp left unresolved (the
/// regex is out of scope for this loader), everything else a string.
fn implicit_kind(value: &str) -> ScalarKind {
    match value {
        "" | "~" | "null" | "Null" | "NULL" => ScalarKind::Null,
        "true" | "True" | "TRUE" | "false" | "False" | "FALSE" => ScalarKind::Boolean,
        _ if value.parse::<i64>().is_ok() => ScalarKind::Integer,
        _ if value.parse::<f64>().is_ok() => ScalarKind::Decimal,
        _ => ScalarKind::String,
    }
}

impl MarkedEventReceiver for YamlBuilder {
    fn on_event(&mut self, event: Event, _marker: Marker) {
        if self.error.is_some() {
            return;
        }
        match event {
            Event::Nothing | Event::StreamStart | Event::StreamEnd | Event::DocumentEnd => {}
            Event::DocumentStart => {
                self.anchors.clear();
            }
            Event::Scalar(value, style, anchor_id, tag) => {
                let tag = tag_string(&tag);
                let mut scalar_node = resolve_scalar(&value, style, &tag);
                if anchor_id != 0 {
                    scalar_node.anchor = Some(anchor_id.to_string());
                }
                let node = Rc::new(Node::Scalar(scalar_node));
                self.record_anchor(anchor_id, &node);
                self.push_value(node);
            }
            Event::Alias(anchor_id) => match self.anchors.get(&anchor_id) {
                Some(target) => {
                    let alias = Rc::new(Node::Alias(AliasNode {
                        target: Rc::clone(target),
                    }));
                    self.push_value(alias);
                }
                None => self.fail(CliError::Yaml {
                    path: self.path.clone(),
                    message: format!("undefined alias for anchor {anchor_id}"),
                }),
            },
            Event::SequenceStart(anchor_id, tag) => {
                self.stack.push(Frame::Sequence {
                    anchor_id,
                    tag: tag_string(&tag),
                    items: Vec::new(),
                });
            }
            Event::SequenceEnd => {
                if let Some(Frame::Sequence {
                    anchor_id,
                    tag,
                    items,
                }) = self.stack.pop()
                {
                    let node = Rc::new(Node::Sequence(SequenceNode {
                        items,
                        tag,
                        anchor: (anchor_id != 0).then(|| anchor_id.to_string()),
                    }));
                    self.record_anchor(anchor_id, &node);
                    self.push_value(node);
                }
            }
            Event::MappingStart(anchor_id, tag) => {
                self.stack.push(Frame::Mapping {
                    anchor_id,
                    tag: tag_string(&tag),
                    entries: Vec::new(),
                    pending_key: None,
                });
            }
            Event::MappingEnd => {
                if let Some(Frame::Mapping {
                    anchor_id,
                    tag,
                    entries,
                    ..
                }) = self.stack.pop()
                {
                    let node = Rc::new(Node::Mapping(MappingNode {
                        entries,
                        tag,
                        anchor: (anchor_id != 0).then(|| anchor_id.to_string()),
                    }));
                    self.record_anchor(anchor_id, &node);
                    self.push_value(node);
                }
            }
        }
    }
}
