//! Textproto front-end: parses textual protobuf against a descriptor pool.
//!
//! The parser is deliberately relaxed, matching how the analyzer wants to
//! treat partially invalid input: required fields are never enforced and
//! unknown extensions can be skipped. Alongside the parsed message it
//! produces a [`ParseInfoTree`] recording where each field name occurred;
//! the analyzer turns those locations into anchors.
//!
//! `google.protobuf.Any` literals (`[domain/full.Name] { ... }`) are parsed
//! into a fresh message of the named type and re-serialized into the outer
//! `Any` as `type_url`/`value` bytes. The body's field locations are still
//! recorded into the Any field's nested subtree, so the analyzer can decode
//! the bytes (via the wire codec) and match the fields back up with their
//! source positions.

mod error;
mod lexer;
pub mod message;
pub mod parse_tree;
pub mod parser;
pub mod wire;

pub use error::ParseError;
pub use lexer::{tokenize, Token, TokenKind};
pub use message::{DynamicMessage, FieldValue, Value};
pub use parse_tree::ParseInfoTree;
pub use parser::{parse, parse_with_options, ParseOptions};
