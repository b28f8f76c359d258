//! Descriptor pool: resolved schema metadata for messages, fields, and enums.
//!
//! Descriptors live in arena vectors owned by the pool; handles are copyable
//! indices. Construction runs in two phases: every symbol is registered
//! under its package-qualified full name, then field type references are
//! resolved with protobuf scoping rules (innermost scope outward, leading
//! `.` meaning fully qualified).

use std::collections::{HashMap, HashSet};

use tracing::{debug, error};

use super::ast::{EnumAst, ExtendAst, FieldAst, FileAst, LabelAst, MessageAst, ScalarAst, TypeAst};
use super::parser::parse_file;
use super::search_path::{PathSubstitution, SubstitutionCache};
use super::source_tree::SourceTree;
use super::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumId(pub(crate) usize);

#[derive(Debug, Clone)]
pub struct FileDescriptor {
    /// Search-path-relative path the file was imported under.
    pub path: String,
    pub package: String,
    pub messages: Vec<MessageId>,
    pub enums: Vec<EnumId>,
    pub extensions: Vec<FieldId>,
}

#[derive(Debug, Clone)]
pub struct MessageDescriptor {
    pub name: String,
    pub full_name: String,
    pub file: FileId,
    /// Declaration order; the analyzer walk depends on it.
    pub fields: Vec<FieldId>,
    pub nested_messages: Vec<MessageId>,
    pub nested_enums: Vec<EnumId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLabel {
    Optional,
    Required,
    Repeated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
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
    Message(MessageId),
    Enum(EnumId),
}

impl From<ScalarAst> for FieldType {
    fn from(scalar: ScalarAst) -> Self {
        match scalar {
            ScalarAst::Double => Self::Double,
            ScalarAst::Float => Self::Float,
            ScalarAst::Int32 => Self::Int32,
            ScalarAst::Int64 => Self::Int64,
            ScalarAst::UInt32 => Self::UInt32,
            ScalarAst::UInt64 => Self::UInt64,
            ScalarAst::SInt32 => Self::SInt32,
            ScalarAst::SInt64 => Self::SInt64,
            ScalarAst::Fixed32 => Self::Fixed32,
            ScalarAst::Fixed64 => Self::Fixed64,
            ScalarAst::SFixed32 => Self::SFixed32,
            ScalarAst::SFixed64 => Self::SFixed64,
            ScalarAst::Bool => Self::Bool,
            ScalarAst::String => Self::String,
            ScalarAst::Bytes => Self::Bytes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    /// `pkg.Message.field`; for extensions, qualified by the declaring
    /// scope (`pkg.ext`), which is also how textprotos spell them.
    pub full_name: String,
    pub number: i32,
    pub label: FieldLabel,
    pub field_type: FieldType,
    /// The message this field belongs to; for extensions, the extendee.
    pub containing_type: MessageId,
    pub is_extension: bool,
    pub file: FileId,
}

impl FieldDescriptor {
    pub fn is_repeated(&self) -> bool {
        self.label == FieldLabel::Repeated
    }

    /// The message type for message-typed fields.
    pub fn message_type(&self) -> Option<MessageId> {
        match self.field_type {
            FieldType::Message(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    pub name: String,
    pub full_name: String,
    pub file: FileId,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}

impl EnumDescriptor {
    pub fn value_by_name(&self, name: &str) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.name == name)
    }

    pub fn value_by_number(&self, number: i32) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.number == number)
    }
}

/// Immutable descriptor database for one compilation unit.
#[derive(Debug, Default)]
pub struct DescriptorPool {
    files: Vec<FileDescriptor>,
    messages: Vec<MessageDescriptor>,
    fields: Vec<FieldDescriptor>,
    enums: Vec<EnumDescriptor>,
    messages_by_name: HashMap<String, MessageId>,
    enums_by_name: HashMap<String, EnumId>,
    extensions_by_name: HashMap<String, FieldId>,
}

impl DescriptorPool {
    /// Import `roots` (by relative path) and everything they transitively
    /// import, then resolve all type references.
    ///
    /// Import problems are logged as they are found; the first failing root
    /// aborts the build with an error naming the file.
    pub fn build(
        tree: &SourceTree,
        roots: &[String],
        substitutions: &[PathSubstitution],
        cache: &mut SubstitutionCache,
    ) -> Result<Self, SchemaError> {
        let mut builder = PoolBuilder::default();
        let mut collector = LoggingErrorCollector::default();
        for root in roots {
            builder.import(tree, root, substitutions, cache, &mut collector)?;
        }
        builder.finish(&mut collector)
    }

    pub fn file(&self, id: FileId) -> &FileDescriptor {
        &self.files[id.0]
    }

    pub fn message(&self, id: MessageId) -> &MessageDescriptor {
        &self.messages[id.0]
    }

    pub fn field(&self, id: FieldId) -> &FieldDescriptor {
        &self.fields[id.0]
    }

    pub fn enum_type(&self, id: EnumId) -> &EnumDescriptor {
        &self.enums[id.0]
    }

    pub fn find_message_by_name(&self, full_name: &str) -> Option<MessageId> {
        self.messages_by_name.get(full_name).copied()
    }

    pub fn find_enum_by_name(&self, full_name: &str) -> Option<EnumId> {
        self.enums_by_name.get(full_name).copied()
    }

    pub fn find_extension_by_name(&self, full_name: &str) -> Option<FieldId> {
        self.extensions_by_name.get(full_name).copied()
    }

    pub fn field_by_name(&self, message: MessageId, name: &str) -> Option<FieldId> {
        self.message(message)
            .fields
            .iter()
            .copied()
            .find(|&id| self.field(id).name == name)
    }

    pub fn field_by_number(&self, message: MessageId, number: i32) -> Option<FieldId> {
        self.message(message)
            .fields
            .iter()
            .copied()
            .find(|&id| self.field(id).number == number)
    }
}

/// Import-error sink that logs without halting, mirroring how descriptor
/// importers traditionally report multiple problems per run.
#[derive(Debug, Default)]
struct LoggingErrorCollector {
    errors: usize,
}

impl LoggingErrorCollector {
    fn add_error(&mut self, err: &SchemaError) {
        self.errors += 1;
        error!("schema import: {err}");
    }
}

/// How a field's type will be known once every file is registered.
#[derive(Debug, Clone)]
enum TypeRef {
    Resolved(FieldType),
    /// (written name, scope full name to resolve from)
    Named(String, String),
}

#[derive(Debug, Clone)]
enum Containing {
    Known(MessageId),
    /// (extendee name, scope full name to resolve from)
    Extendee(String, String),
}

#[derive(Debug, Clone)]
struct FieldBuild {
    name: String,
    full_name: String,
    number: i32,
    label: FieldLabel,
    type_ref: TypeRef,
    containing: Containing,
    is_extension: bool,
    file: FileId,
}

#[derive(Debug, Default)]
struct PoolBuilder {
    files: Vec<FileDescriptor>,
    messages: Vec<MessageDescriptor>,
    fields: Vec<FieldBuild>,
    enums: Vec<EnumDescriptor>,
    messages_by_name: HashMap<String, MessageId>,
    enums_by_name: HashMap<String, EnumId>,
    extensions_by_name: HashMap<String, FieldId>,
    imported: HashSet<String>,
}

impl PoolBuilder {
    fn import(
        &mut self,
        tree: &SourceTree,
        rel_path: &str,
        substitutions: &[PathSubstitution],
        cache: &mut SubstitutionCache,
        collector: &mut LoggingErrorCollector,
    ) -> Result<(), SchemaError> {
        if !self.imported.insert(rel_path.to_string()) {
            return Ok(());
        }

        let Some(content) = tree.open(rel_path, substitutions, cache) else {
            let err = SchemaError::FileNotFound {
                path: rel_path.to_string(),
            };
            collector.add_error(&err);
            return Err(err);
        };
        let source = match std::str::from_utf8(content) {
            Ok(source) => source.to_string(),
            Err(_) => {
                let err = SchemaError::InvalidUtf8 {
                    path: rel_path.to_string(),
                };
                collector.add_error(&err);
                return Err(err);
            }
        };
        let ast = match parse_file(rel_path, &source) {
            Ok(ast) => ast,
            Err(err) => {
                collector.add_error(&err);
                return Err(err);
            }
        };

        for import in &ast.imports {
            self.import(tree, import, substitutions, cache, collector)?;
        }

        if let Err(err) = self.register_file(rel_path, &ast) {
            collector.add_error(&err);
            return Err(err);
        }
        debug!("added proto to descriptor pool: {rel_path}");
        Ok(())
    }

    fn register_file(&mut self, rel_path: &str, ast: &FileAst) -> Result<FileId, SchemaError> {
        let file_id = FileId(self.files.len());
        self.files.push(FileDescriptor {
            path: rel_path.to_string(),
            package: ast.package.clone(),
            messages: Vec::new(),
            enums: Vec::new(),
            extensions: Vec::new(),
        });

        let scope = ast.package.clone();
        for message in &ast.messages {
            let id = self.register_message(file_id, &scope, message)?;
            self.files[file_id.0].messages.push(id);
        }
        for enum_ast in &ast.enums {
            let id = self.register_enum(file_id, &scope, enum_ast)?;
            self.files[file_id.0].enums.push(id);
        }
        for extend in &ast.extends {
            self.register_extend(file_id, &scope, extend)?;
        }
        Ok(file_id)
    }

    fn register_message(
        &mut self,
        file: FileId,
        scope: &str,
        ast: &MessageAst,
    ) -> Result<MessageId, SchemaError> {
        let full_name = qualify(scope, &ast.name);
        self.check_fresh_symbol(file, &full_name)?;
        let id = MessageId(self.messages.len());
        self.messages.push(MessageDescriptor {
            name: ast.name.clone(),
            full_name: full_name.clone(),
            file,
            fields: Vec::new(),
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
        });
        self.messages_by_name.insert(full_name.clone(), id);

        for field in &ast.fields {
            let field_id = self.register_field(file, id, &full_name, field)?;
            self.messages[id.0].fields.push(field_id);
        }
        for nested in &ast.messages {
            let nested_id = self.register_message(file, &full_name, nested)?;
            self.messages[id.0].nested_messages.push(nested_id);
        }
        for enum_ast in &ast.enums {
            let enum_id = self.register_enum(file, &full_name, enum_ast)?;
            self.messages[id.0].nested_enums.push(enum_id);
        }
        for extend in &ast.extends {
            self.register_extend(file, &full_name, extend)?;
        }
        Ok(id)
    }

    fn register_field(
        &mut self,
        file: FileId,
        message: MessageId,
        scope: &str,
        ast: &FieldAst,
    ) -> Result<FieldId, SchemaError> {
        let (label, type_ref) = match &ast.field_type {
            TypeAst::Scalar(scalar) => (
                label_from_ast(ast.label),
                TypeRef::Resolved(FieldType::from(*scalar)),
            ),
            TypeAst::Named(name) => (
                label_from_ast(ast.label),
                TypeRef::Named(name.clone(), scope.to_string()),
            ),
            TypeAst::Map(key, value) => {
                // map<k, v> desugars to a synthesized repeated entry message.
                let entry_id = self.register_map_entry(file, scope, ast, *key, value)?;
                (
                    FieldLabel::Repeated,
                    TypeRef::Resolved(FieldType::Message(entry_id)),
                )
            }
        };
        let id = FieldId(self.fields.len());
        self.fields.push(FieldBuild {
            name: ast.name.clone(),
            full_name: qualify(scope, &ast.name),
            number: ast.number,
            label,
            type_ref,
            containing: Containing::Known(message),
            is_extension: false,
            file,
        });
        Ok(id)
    }

    fn register_map_entry(
        &mut self,
        file: FileId,
        scope: &str,
        map_field: &FieldAst,
        key: ScalarAst,
        value: &TypeAst,
    ) -> Result<MessageId, SchemaError> {
        let entry_name = format!("{}Entry", camel_case(&map_field.name));
        let full_name = qualify(scope, &entry_name);
        self.check_fresh_symbol(file, &full_name)?;
        let id = MessageId(self.messages.len());
        self.messages.push(MessageDescriptor {
            name: entry_name,
            full_name: full_name.clone(),
            file,
            fields: Vec::new(),
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
        });
        self.messages_by_name.insert(full_name.clone(), id);

        let value_ref = match value {
            TypeAst::Scalar(scalar) => TypeRef::Resolved(FieldType::from(*scalar)),
            TypeAst::Named(name) => TypeRef::Named(name.clone(), scope.to_string()),
            TypeAst::Map(..) => {
                return Err(SchemaError::UnresolvedType {
                    path: self.files[file.0].path.clone(),
                    type_name: "map".to_string(),
                    context: full_name,
                })
            }
        };
        for (name, number, type_ref) in [
            ("key", 1, TypeRef::Resolved(FieldType::from(key))),
            ("value", 2, value_ref),
        ] {
            let field_id = FieldId(self.fields.len());
            self.fields.push(FieldBuild {
                name: name.to_string(),
                full_name: format!("{full_name}.{name}"),
                number,
                label: FieldLabel::Optional,
                type_ref,
                containing: Containing::Known(id),
                is_extension: false,
                file,
            });
            self.messages[id.0].fields.push(field_id);
        }
        Ok(id)
    }

    fn register_enum(
        &mut self,
        file: FileId,
        scope: &str,
        ast: &EnumAst,
    ) -> Result<EnumId, SchemaError> {
        let full_name = qualify(scope, &ast.name);
        self.check_fresh_symbol(file, &full_name)?;
        let id = EnumId(self.enums.len());
        self.enums.push(EnumDescriptor {
            name: ast.name.clone(),
            full_name: full_name.clone(),
            file,
            values: ast
                .values
                .iter()
                .map(|v| EnumValue {
                    name: v.name.clone(),
                    number: v.number,
                })
                .collect(),
        });
        self.enums_by_name.insert(full_name, id);
        Ok(id)
    }

    fn register_extend(
        &mut self,
        file: FileId,
        scope: &str,
        ast: &ExtendAst,
    ) -> Result<(), SchemaError> {
        for field in &ast.fields {
            let full_name = qualify(scope, &field.name);
            if self.extensions_by_name.contains_key(&full_name) {
                return Err(SchemaError::DuplicateSymbol {
                    path: self.files[file.0].path.clone(),
                    symbol: full_name,
                });
            }
            let type_ref = match &field.field_type {
                TypeAst::Scalar(scalar) => TypeRef::Resolved(FieldType::from(*scalar)),
                TypeAst::Named(name) => TypeRef::Named(name.clone(), scope.to_string()),
                TypeAst::Map(..) => {
                    return Err(SchemaError::UnresolvedType {
                        path: self.files[file.0].path.clone(),
                        type_name: "map".to_string(),
                        context: full_name,
                    })
                }
            };
            let id = FieldId(self.fields.len());
            self.fields.push(FieldBuild {
                name: field.name.clone(),
                full_name: full_name.clone(),
                number: field.number,
                label: label_from_ast(field.label),
                type_ref,
                containing: Containing::Extendee(ast.extendee.clone(), scope.to_string()),
                is_extension: true,
                file,
            });
            self.extensions_by_name.insert(full_name, id);
            self.files[file.0].extensions.push(id);
        }
        Ok(())
    }

    fn check_fresh_symbol(&self, file: FileId, full_name: &str) -> Result<(), SchemaError> {
        if self.messages_by_name.contains_key(full_name)
            || self.enums_by_name.contains_key(full_name)
        {
            return Err(SchemaError::DuplicateSymbol {
                path: self.files[file.0].path.clone(),
                symbol: full_name.to_string(),
            });
        }
        Ok(())
    }

    fn finish(self, collector: &mut LoggingErrorCollector) -> Result<DescriptorPool, SchemaError> {
        let mut pool = DescriptorPool {
            files: self.files,
            messages: self.messages,
            fields: Vec::with_capacity(self.fields.len()),
            enums: self.enums,
            messages_by_name: self.messages_by_name,
            enums_by_name: self.enums_by_name,
            extensions_by_name: self.extensions_by_name,
        };

        for build in self.fields {
            let field_type = match &build.type_ref {
                TypeRef::Resolved(field_type) => *field_type,
                TypeRef::Named(name, scope) => {
                    match resolve_named(&pool, name, scope) {
                        Some(field_type) => field_type,
                        None => {
                            let err = SchemaError::UnresolvedType {
                                path: pool.files[build.file.0].path.clone(),
                                type_name: name.clone(),
                                context: build.full_name.clone(),
                            };
                            collector.add_error(&err);
                            return Err(err);
                        }
                    }
                }
            };
            let containing_type = match &build.containing {
                Containing::Known(id) => *id,
                Containing::Extendee(name, scope) => {
                    match resolve_named(&pool, name, scope) {
                        Some(FieldType::Message(id)) => id,
                        _ => {
                            let err = SchemaError::UnresolvedType {
                                path: pool.files[build.file.0].path.clone(),
                                type_name: name.clone(),
                                context: build.full_name.clone(),
                            };
                            collector.add_error(&err);
                            return Err(err);
                        }
                    }
                }
            };
            pool.fields.push(FieldDescriptor {
                name: build.name,
                full_name: build.full_name,
                number: build.number,
                label: build.label,
                field_type,
                containing_type,
                is_extension: build.is_extension,
                file: build.file,
            });
        }
        Ok(pool)
    }
}

/// Resolve a written type name from a scope, walking outward.
fn resolve_named(pool: &DescriptorPool, name: &str, scope: &str) -> Option<FieldType> {
    if let Some(absolute) = name.strip_prefix('.') {
        return lookup_symbol(pool, absolute);
    }
    let mut scope = scope;
    loop {
        let candidate = qualify(scope, name);
        if let Some(found) = lookup_symbol(pool, &candidate) {
            return Some(found);
        }
        if scope.is_empty() {
            return None;
        }
        scope = match scope.rfind('.') {
            Some(dot) => &scope[..dot],
            None => "",
        };
    }
}

fn lookup_symbol(pool: &DescriptorPool, full_name: &str) -> Option<FieldType> {
    if let Some(&id) = pool.messages_by_name.get(full_name) {
        return Some(FieldType::Message(id));
    }
    pool.enums_by_name.get(full_name).map(|&id| FieldType::Enum(id))
}

fn label_from_ast(label: LabelAst) -> FieldLabel {
    match label {
        LabelAst::Singular | LabelAst::Optional => FieldLabel::Optional,
        LabelAst::Required => FieldLabel::Required,
        LabelAst::Repeated => FieldLabel::Repeated,
    }
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}.{name}")
    }
}

/// `my_map` → `MyMap`, matching how entry messages are conventionally named.
fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for part in name.split('_') {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.extend(chars);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_pool(files: &[(&str, &str)], roots: &[&str]) -> Result<DescriptorPool, SchemaError> {
        let mut tree = SourceTree::new();
        for (path, content) in files {
            tree.add_file(path, content.as_bytes().to_vec()).unwrap();
        }
        let roots: Vec<String> = roots.iter().map(|s| s.to_string()).collect();
        let mut cache = SubstitutionCache::new();
        DescriptorPool::build(&tree, &roots, &[], &mut cache)
    }

    #[test]
    fn test_single_file_pool() {
        let pool = build_pool(
            &[(
                "m.proto",
                "package pkg;\nmessage M { optional string my_string = 1; }",
            )],
            &["m.proto"],
        )
        .unwrap();
        let m = pool.find_message_by_name("pkg.M").unwrap();
        let field = pool.field_by_name(m, "my_string").unwrap();
        assert_eq!(pool.field(field).full_name, "pkg.M.my_string");
        assert_eq!(pool.field(field).field_type, FieldType::String);
        assert_eq!(pool.file(pool.message(m).file).path, "m.proto");
    }

    #[test]
    fn test_resolution_walks_scopes_outward() {
        let pool = build_pool(
            &[(
                "m.proto",
                r#"
                package pkg;
                message Outer {
                    message Inner { optional int32 x = 1; }
                    optional Inner inner = 1;
                }
                message Other { optional Outer.Inner deep = 1; }
                "#,
            )],
            &["m.proto"],
        )
        .unwrap();
        let outer = pool.find_message_by_name("pkg.Outer").unwrap();
        let inner = pool.find_message_by_name("pkg.Outer.Inner").unwrap();
        let field = pool.field_by_name(outer, "inner").unwrap();
        assert_eq!(pool.field(field).field_type, FieldType::Message(inner));
        let other = pool.find_message_by_name("pkg.Other").unwrap();
        let deep = pool.field_by_name(other, "deep").unwrap();
        assert_eq!(pool.field(deep).field_type, FieldType::Message(inner));
    }

    #[test]
    fn test_imports_resolve_across_files() {
        let pool = build_pool(
            &[
                (
                    "a.proto",
                    "package a;\nimport \"b.proto\";\nmessage A { optional b.B other = 1; }",
                ),
                ("b.proto", "package b;\nmessage B {}"),
            ],
            &["a.proto"],
        )
        .unwrap();
        let a = pool.find_message_by_name("a.A").unwrap();
        let b = pool.find_message_by_name("b.B").unwrap();
        let field = pool.field_by_name(a, "other").unwrap();
        assert_eq!(pool.field(field).field_type, FieldType::Message(b));
    }

    #[test]
    fn test_extension_registration() {
        let pool = build_pool(
            &[(
                "e.proto",
                "package pkg;\nmessage M { extensions 10 to 20; }\nextend M { optional int32 ext = 10; }",
            )],
            &["e.proto"],
        )
        .unwrap();
        let m = pool.find_message_by_name("pkg.M").unwrap();
        let ext = pool.find_extension_by_name("pkg.ext").unwrap();
        let field = pool.field(ext);
        assert!(field.is_extension);
        assert_eq!(field.containing_type, m);
        assert_eq!(field.full_name, "pkg.ext");
    }

    #[test]
    fn test_map_field_desugars_to_entry_message() {
        let pool = build_pool(
            &[("m.proto", "package p;\nmessage M { map<string, int64> row_counts = 1; }")],
            &["m.proto"],
        )
        .unwrap();
        let m = pool.find_message_by_name("p.M").unwrap();
        let entry = pool.find_message_by_name("p.M.RowCountsEntry").unwrap();
        let field = pool.field_by_name(m, "row_counts").unwrap();
        assert!(pool.field(field).is_repeated());
        assert_eq!(pool.field(field).field_type, FieldType::Message(entry));
        let value = pool.field_by_name(entry, "value").unwrap();
        assert_eq!(pool.field(value).field_type, FieldType::Int64);
    }

    #[test]
    fn test_duplicate_symbol_fails() {
        let err = build_pool(
            &[("m.proto", "message M {}\nmessage M {}")],
            &["m.proto"],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateSymbol { .. }));
    }

    #[test]
    fn test_unresolved_type_fails() {
        let err = build_pool(
            &[("m.proto", "message M { optional Missing x = 1; }")],
            &["m.proto"],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvedType { .. }));
    }

    #[test]
    fn test_missing_import_fails() {
        let err = build_pool(
            &[("a.proto", "import \"nope.proto\";\nmessage A {}")],
            &["a.proto"],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::FileNotFound { .. }));
    }

    #[test]
    fn test_file_imported_once_under_one_name() {
        // Diamond: both b and c import d; d registers once.
        let pool = build_pool(
            &[
                ("b.proto", "import \"d.proto\";\nmessage B { optional D d = 1; }"),
                ("c.proto", "import \"d.proto\";\nmessage C { optional D d = 1; }"),
                ("d.proto", "message D {}"),
            ],
            &["b.proto", "c.proto"],
        )
        .unwrap();
        assert!(pool.find_message_by_name("D").is_some());
    }

    #[test]
    fn test_enum_values() {
        let pool = build_pool(
            &[("m.proto", "package p;\nenum E { A = 0; B = 2; }")],
            &["m.proto"],
        )
        .unwrap();
        let e = pool.find_enum_by_name("p.E").unwrap();
        assert_eq!(pool.enum_type(e).value_by_name("B").unwrap().number, 2);
        assert_eq!(pool.enum_type(e).value_by_number(0).unwrap().name, "A");
    }
}
