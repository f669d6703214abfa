//! Renders a [`Nodelist`] in one of the supported output formats.
//!
//! Walks the matched nodes and prints one value per line. Only `bash` and
//! `json` are implemented; `yaml`/`zsh` are out of scope for this loader.

use std::io::{self, Write};
use std::str::FromStr;

use kanabo_path::{Node, Nodelist, ScalarKind};

use crate::error::CliError;

/// Not a `clap::ValueEnum`: of the four output formats the CLI surface
/// names, only two are implemented, so an unsupported value needs to reach
/// [`CliError::UnsupportedOutputFormat`] rather than being rejected by
/// clap's own "possible values" error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Bash,
    Json,
}

impl FromStr for OutputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bash" => Ok(OutputFormat::Bash),
            "json" => Ok(OutputFormat::Json),
            other => Err(CliError::UnsupportedOutputFormat(other.to_string())),
        }
    }
}

pub fn emit(nodes: &Nodelist, format: OutputFormat, out: &mut impl Write) -> io::Result<()> {
    match format {
        OutputFormat::Bash => emit_bash(nodes, out),
        OutputFormat::Json => emit_json(nodes, out),
    }
}

fn emit_bash(nodes: &Nodelist, out: &mut impl Write) -> io::Result<()> {
    for node in nodes {
        writeln!(out, "{}", bash_token(node))?;
    }
    Ok(())
}

/// One matched node rendered as a single shell-safe token: scalars print
/// their text value, single-quoted whenever it isn't already a bare
/// shell-safe word; mappings and sequences print their compact JSON form,
/// always quoted.
fn bash_token(node: &Node) -> String {
    match node {
        Node::Scalar(s) => {
            let text = String::from_utf8_lossy(&s.bytes).into_owned();
            if needs_quoting(&text) {
                quote_single(&text)
            } else {
                text
            }
        }
        Node::Mapping(_) | Node::Sequence(_) => quote_single(&node_to_json(node).to_string()),
        Node::Alias(a) => bash_token(&a.target),
        Node::Document(d) => bash_token(&d.root),
    }
}

fn needs_quoting(text: &str) -> bool {
    text.is_empty()
        || !text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':'))
}

fn quote_single(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        match ch {
            '\'' => out.push_str("'\\''"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

fn emit_json(nodes: &Nodelist, out: &mut impl Write) -> io::Result<()> {
    let values: Vec<serde_json::Value> = nodes.iter().map(|n| node_to_json(n)).collect();
    serde_json::to_writer(&mut *out, &values)?;
    writeln!(out)
}

fn node_to_json(node: &Node) -> serde_json::Value {
    match node {
        Node::Scalar(s) => scalar_to_json(s.kind, &s.bytes),
        Node::Sequence(seq) => serde_json::Value::Array(seq.items.iter().map(|n| node_to_json(n)).collect()),
        Node::Mapping(m) => {
            let mut map = serde_json::Map::with_capacity(m.entries.len());
            for entry in &m.entries {
                let key = String::from_utf8_lossy(&entry.key.bytes).into_owned();
                map.insert(key, node_to_json(&entry.value));
            }
            serde_json::Value::Object(map)
        }
        Node::Alias(a) => node_to_json(&a.target),
        Node::Document(d) => node_to_json(&d.root),
    }
}

fn scalar_to_json(kind: ScalarKind, bytes: &[u8]) -> serde_json::Value {
    let text = String::from_utf8_lossy(bytes);
    match kind {
        ScalarKind::Null => serde_json::Value::Null,
        ScalarKind::Boolean => serde_json::Value::Bool(text == "true" || text == "True" || text == "TRUE"),
        ScalarKind::Integer => text
            .parse::<i64>()
            .map(serde_json::Value::from)
            .unwrap_or_else(|_| serde_json::Value::String(text.into_owned())),
        ScalarKind::Decimal => serde_json::Number::from_str(&text)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|_| serde_json::Value::String(text.into_owned())),
        ScalarKind::String | ScalarKind::Timestamp => serde_json::Value::String(text.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanabo_path::{MappingEntry, MappingNode, ScalarNode, SequenceNode};
    use std::rc::Rc;

    fn scalar(kind: ScalarKind, text: &str) -> Rc<Node> {
        Rc::new(Node::Scalar(ScalarNode {
            kind,
            bytes: text.as_bytes().to_vec(),
            tag: None,
            anchor: None,
        }))
    }

    #[test]
    fn bash_quotes_values_with_spaces() {
        let node = scalar(ScalarKind::String, "hello world");
        assert_eq!(bash_token(&node), "'hello world'");
    }

    #[test]
    fn bash_leaves_bare_words_unquoted() {
        let node = scalar(ScalarKind::String, "hello");
        assert_eq!(bash_token(&node), "hello");
    }

    #[test]
    fn bash_escapes_embedded_single_quotes() {
        let node = scalar(ScalarKind::String, "it's");
        assert_eq!(bash_token(&node), "'it'\\''s'");
    }

    #[test]
    fn json_roundtrips_a_mapping() {
        let nodes: Nodelist = vec![Rc::new(Node::Mapping(MappingNode {
            entries: vec![MappingEntry {
                key: ScalarNode {
                    kind: ScalarKind::String,
                    bytes: b"a".to_vec(),
                    tag: None,
                    anchor: None,
                },
                value: scalar(ScalarKind::Integer, "1"),
            }],
            tag: None,
            anchor: None,
        }))];
        let mut buf = Vec::new();
        emit_json(&nodes, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "[{\"a\":1}]\n");
    }

    #[test]
    fn json_renders_a_sequence_of_scalars() {
        let nodes: Nodelist = vec![Rc::new(Node::Sequence(SequenceNode {
            items: vec![scalar(ScalarKind::Integer, "1"), scalar(ScalarKind::Integer, "2")],
            tag: None,
            anchor: None,
        }))];
        let mut buf = Vec::new();
        emit_json(&nodes, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "[[1,2]]\n");
    }
}
