//! Untyped AST for a single `.proto` file.
//!
//! Only the surface the indexer consumes survives parsing: messages, fields,
//! enums, extensions, and imports. Options and reserved ranges are consumed
//! syntactically and dropped.

/// Declared syntax level of a file. Proto3 files carry no field labels;
/// neither level is enforced beyond parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Syntax {
    #[default]
    Proto2,
    Proto3,
}

#[derive(Debug, Clone, Default)]
pub struct FileAst {
    pub syntax: Syntax,
    pub package: String,
    pub imports: Vec<String>,
    pub messages: Vec<MessageAst>,
    pub enums: Vec<EnumAst>,
    pub extends: Vec<ExtendAst>,
}

#[derive(Debug, Clone)]
pub struct MessageAst {
    pub name: String,
    pub fields: Vec<FieldAst>,
    pub messages: Vec<MessageAst>,
    pub enums: Vec<EnumAst>,
    pub extends: Vec<ExtendAst>,
}

#[derive(Debug, Clone)]
pub struct FieldAst {
    pub label: LabelAst,
    pub field_type: TypeAst,
    pub name: String,
    pub number: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelAst {
    /// Proto3 fields carry no label and parse as singular.
    Singular,
    Optional,
    Required,
    Repeated,
}

#[derive(Debug, Clone)]
pub enum TypeAst {
    Scalar(ScalarAst),
    /// Message or enum reference, resolved during pool construction.
    /// A leading `.` marks a fully-qualified name.
    Named(String),
    /// `map<key, value>`, desugared to a synthesized entry message.
    Map(ScalarAst, Box<TypeAst>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarAst {
    Double,
    Float,
    Int32,
    Int64,
    UInt32,
    UInt64,
    SInt32,
    SInt64,
    Fixed32,
    Fixed64,
    SFixed32,
    SFixed64,
    Bool,
    String,
    Bytes,
}

impl ScalarAst {
    /// Map a type keyword to its scalar, if it is one.
    pub fn from_keyword(word: &str) -> Option<ScalarAst> {
        Some(match word {
            "double" => Self::Double,
            "float" => Self::Float,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint32" => Self::UInt32,
            "uint64" => Self::UInt64,
            "sint32" => Self::SInt32,
            "sint64" => Self::SInt64,
            "fixed32" => Self::Fixed32,
            "fixed64" => Self::Fixed64,
            "sfixed32" => Self::SFixed32,
            "sfixed64" => Self::SFixed64,
            "bool" => Self::Bool,
            "string" => Self::String,
            "bytes" => Self::Bytes,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct EnumAst {
    pub name: String,
    pub values: Vec<EnumValueAst>,
}

#[derive(Debug, Clone)]
pub struct EnumValueAst {
    pub name: String,
    pub number: i32,
}

#[derive(Debug, Clone)]
pub struct ExtendAst {
    /// Name of the extended message, resolved against the declaring scope.
    pub extendee: String,
    pub fields: Vec<FieldAst>,
}
