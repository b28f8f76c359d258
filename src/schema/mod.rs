//! Schema front-end: `.proto` files in, descriptor pool out.
//!
//! The pipeline mirrors the rest of the crate:
//!
//! ```text
//! Source Text (in-memory SourceTree)
//!     ↓
//! Lexer (logos) → Tokens
//!     ↓
//! Parser → FileAst (messages, enums, extensions, imports)
//!     ↓
//! DescriptorPool → resolved message/field/enum descriptors
//! ```
//!
//! Files are always imported by their search-path-relative name so that a
//! file reached through two different paths never registers twice.

pub mod ast;
pub mod descriptor;
mod error;
mod lexer;
pub mod parser;
pub mod search_path;
pub mod source_tree;

pub use descriptor::{
    DescriptorPool, EnumDescriptor, EnumId, FieldDescriptor, FieldId, FieldLabel, FieldType,
    FileDescriptor, FileId, MessageDescriptor, MessageId,
};
pub use error::SchemaError;
pub use lexer::{tokenize, Token, TokenKind};
pub use search_path::{
    full_to_relative, parse_substitution_args, PathSubstitution, SubstitutionCache,
};
pub use source_tree::SourceTree;
