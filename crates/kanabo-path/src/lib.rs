//! JSONPath-style query language for YAML/JSON document trees: scan, parse,
//! and evaluate an expression against a loaded [`model::DocumentSet`].
//!
//! A loader (outside this crate; see `kanabo-cli`) builds a [`model::Node`]
//! tree from source text and hands it to [`eval::evaluate`] together with a
//! [`parser::JsonPath`] produced by [`parser::parse`].

mod error;
mod eval;
mod model;
mod parser;
mod scanner;
mod util;

pub use error::{EvalError, ParseError, ParseErrorCode, ScanError};
pub use eval::evaluate;
pub use model::{
    key_hash, AliasNode, DocumentNode, DocumentSet, MappingEntry, MappingNode, Node, Nodelist,
    ScalarKind, ScalarNode, SequenceNode,
};
pub use parser::{parse, JsonPath, NodeTest, PathKind, Predicate, Step, StepAxis, TypeTestKind};
pub use scanner::{Position, Token};
pub use util::{accessed_names, path_equals, path_to_string};
