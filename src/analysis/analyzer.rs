//! The message analyzer: walks a parsed textproto against its descriptors
//! and emits anchors plus `ref` edges for every field mention.
//!
//! The walk visits declared fields in declaration order, then sweeps the
//! set fields once more to pick up extensions. Locations come from the
//! parse-info tree; a missing location means different things depending on
//! context (unset field, inline repeated entry, or an indexer bug) and is
//! interpreted per field.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::error;

use crate::base::{ParseLocation, Span};
use crate::core::LineIndex;
use crate::schema::{DescriptorPool, FieldId, FileId, MessageId, SubstitutionCache};
use crate::textformat::wire;
use crate::textformat::{DynamicMessage, ParseInfoTree};

use super::recorder::{EdgeKind, GraphRecorder, NodeKind, Property, PropertyValue};
use super::schema_comments;
use super::unit::{CompilationUnit, VName};
use super::AnalyzerError;

/// Language component of every anchor VName.
pub const LANGUAGE_NAME: &str = "textproto";
/// Language component of schema-entity VNames.
const PROTO_LANGUAGE: &str = "protobuf";
const ANY_FULL_NAME: &str = "google.protobuf.Any";

// Grammar for recovering the Any type-URL span from raw text, starting at
// the Any-typed field's own location: the field name with optional colon
// and opening brace, any number of comment lines, then `[domain/Name]`
// capturing the message name.
static ANY_FIELD_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A[a-zA-Z0-9_]+:?\s*\{\s*").unwrap());
static ANY_COMMENT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A\s*#.*\n*").unwrap());
static ANY_TYPE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A\s*\[\s*[^/]+/([^\s\]]+)\s*\]").unwrap());

/// Walks one parsed textproto. Borrows everything; nothing outlives the
/// enclosing `analyze_compilation_unit` call.
pub(super) struct TextprotoAnalyzer<'a> {
    unit: &'a CompilationUnit,
    content: &'a str,
    line_index: LineIndex<'a>,
    substitution_cache: &'a SubstitutionCache,
    pool: &'a DescriptorPool,
    recorder: &'a mut dyn GraphRecorder,
}

impl<'a> TextprotoAnalyzer<'a> {
    pub fn new(
        unit: &'a CompilationUnit,
        content: &'a str,
        substitution_cache: &'a SubstitutionCache,
        recorder: &'a mut dyn GraphRecorder,
        pool: &'a DescriptorPool,
    ) -> Self {
        Self {
            unit,
            content,
            line_index: LineIndex::new(content),
            substitution_cache,
            pool,
            recorder,
        }
    }

    /// Recursively analyze `message` and its submessages, emitting refs for
    /// every field mention.
    pub fn analyze_message(
        &mut self,
        file_vname: &VName,
        message: &DynamicMessage,
        parse_tree: &ParseInfoTree,
    ) -> Result<(), AnalyzerError> {
        let pool = self.pool;
        let descriptor = pool.message(message.descriptor());

        // Walk every declared field: presence bits are not available for
        // proto3, so unset fields are filtered by their missing location
        // (singular) or zero size (repeated).
        for &field in &descriptor.fields {
            if pool.field(field).is_repeated() {
                let count = message.field_size(field);
                if count == 0 {
                    continue;
                }
                for index in 0..count {
                    self.analyze_field(file_vname, message, parse_tree, field, Some(index))?;
                }
            } else {
                self.analyze_field(file_vname, message, parse_tree, field, None)?;
            }
        }

        // Extensions never appear in the declared-field list; find them by
        // enumerating what is actually set.
        let set_fields: Vec<FieldId> = message.set_fields().map(|(id, _)| id).collect();
        for field in set_fields {
            if !pool.field(field).is_extension {
                continue;
            }
            if pool.field(field).is_repeated() {
                for index in 0..message.field_size(field) {
                    self.analyze_field(file_vname, message, parse_tree, field, Some(index))?;
                }
            } else {
                self.analyze_field(file_vname, message, parse_tree, field, None)?;
            }
        }
        Ok(())
    }

    fn analyze_field(
        &mut self,
        file_vname: &VName,
        message: &DynamicMessage,
        parse_tree: &ParseInfoTree,
        field: FieldId,
        index: Option<usize>,
    ) -> Result<(), AnalyzerError> {
        let pool = self.pool;
        let descriptor = pool.field(field);

        let mut anchored_location = None;
        match parse_tree.location(field, index) {
            Some(mut location) => {
                let length = if descriptor.is_extension {
                    location.column += 1; // skip the leading '['
                    descriptor.full_name.len()
                } else {
                    descriptor.name.len()
                };
                let begin = self
                    .line_index
                    .offset(location.line + 1, location.column)
                    .ok_or_else(|| {
                        AnalyzerError::Unknown(format!(
                            "location of field '{}' is outside the source buffer",
                            descriptor.full_name
                        ))
                    })?;
                let anchor = self.add_anchor(file_vname, begin, begin + length);
                let field_vname = self.vname_for_descriptor(&descriptor.full_name, descriptor.file)?;
                self.recorder.add_edge(&anchor, EdgeKind::Ref, &field_vname);
                anchored_location = Some(location);
            }
            None => {
                if matches!(index, Some(i) if i > 0) {
                    // Inline repeated syntax: only the first entry carries
                    // the field name. No anchor, but the value is still
                    // analyzed below.
                } else if descriptor.is_extension || index.is_some() {
                    // A set extension or the first entry of a repeated
                    // field always has a recorded location.
                    return Err(AnalyzerError::Unknown(format!(
                        "failed to find location of field: {}; this is a bug in the textproto indexer",
                        descriptor.full_name
                    )));
                } else {
                    // Plain field with no location: simply not set.
                    return Ok(());
                }
            }
        }

        let Some(submessage_type) = descriptor.message_type() else {
            return Ok(());
        };
        let subtree = parse_tree.nested(field, index).ok_or_else(|| {
            AnalyzerError::Unknown(format!(
                "missing parse subtree for field: {}",
                descriptor.full_name
            ))
        })?;
        let submessage = match index {
            None => message.get_message(field),
            Some(i) => message.get_repeated_message(field, i),
        }
        .ok_or_else(|| {
            AnalyzerError::Unknown(format!(
                "missing submessage value for field: {}",
                descriptor.full_name
            ))
        })?;

        if pool.message(submessage_type).full_name == ANY_FULL_NAME {
            // The field's own location seeds the search for the type URL.
            self.analyze_any(file_vname, submessage, subtree, anchored_location)
        } else {
            self.analyze_message(file_vname, submessage, subtree)
        }
    }

    /// Analyze the message inside a `google.protobuf.Any`.
    ///
    /// The parser stored the inner message as `type_url` + serialized
    /// `value` bytes but recorded the literal body's field locations into
    /// the Any field's nested subtree. The type-URL span is recovered from
    /// the raw text; the inner message is decoded and walked against that
    /// same subtree so its fields match up with their source positions.
    fn analyze_any(
        &mut self,
        file_vname: &VName,
        any: &DynamicMessage,
        parse_tree: &ParseInfoTree,
        field_location: Option<ParseLocation>,
    ) -> Result<(), AnalyzerError> {
        let pool = self.pool;
        let Some(span) = field_location.and_then(|loc| self.find_any_type_url_span(loc)) else {
            // Direct `type_url: ... value: ...` form; analyze as ordinary
            // fields.
            return self.analyze_message(file_vname, any, parse_tree);
        };
        let type_url_anchor = self.add_anchor(file_vname, span.begin, span.end);

        let any_descriptor = any.descriptor();
        let (Some(type_url_field), Some(value_field)) = (
            pool.field_by_name(any_descriptor, "type_url"),
            pool.field_by_name(any_descriptor, "value"),
        ) else {
            return Err(AnalyzerError::Unknown(
                "unable to get field descriptors for Any".to_string(),
            ));
        };

        let type_url = any.get_str(type_url_field).unwrap_or_default();
        let message_name = type_url.rsplit('/').next().unwrap_or_default();
        let Some(inner_type) = pool.find_message_by_name(message_name) else {
            // Indexing the rest of the file matters more than one missing
            // Any descriptor.
            error!("unable to find descriptor for message named {message_name}");
            return Ok(());
        };
        let message_vname =
            self.vname_for_descriptor(&pool.message(inner_type).full_name, pool.message(inner_type).file)?;
        self.recorder
            .add_edge(&type_url_anchor, EdgeKind::Ref, &message_vname);

        let value_bytes = any.get_bytes(value_field).unwrap_or_default();
        if value_bytes.is_empty() {
            return Ok(());
        }
        let inner = wire::decode(value_bytes, inner_type, pool).map_err(|err| {
            AnalyzerError::Unknown(format!(
                "unable to parse Any.value bytes into a {message_name} message: {err}"
            ))
        })?;
        self.analyze_message(file_vname, &inner, parse_tree)
    }

    /// Starting at the Any-typed field's location, find the byte span of
    /// the message name inside `[domain/Name]`. `None` means the literal
    /// form was not used.
    fn find_any_type_url_span(&self, location: ParseLocation) -> Option<Span> {
        let start = self.line_index.offset(location.line + 1, location.column)?;
        let mut cursor = start;

        let prefix = ANY_FIELD_PREFIX.find(&self.content[cursor..])?;
        cursor += prefix.end();
        while let Some(comment) = ANY_COMMENT_LINE.find(&self.content[cursor..]) {
            cursor += comment.end();
        }
        let captures = ANY_TYPE_URL.captures(&self.content[cursor..])?;
        let group = captures.get(1)?;
        Some(Span::new(cursor + group.start(), cursor + group.end()))
    }

    /// Emit anchors and refs for `proto-file` / `proto-message` /
    /// `proto-import` directives in the leading comments.
    pub fn analyze_schema_comments(
        &mut self,
        file_vname: &VName,
        top_level_message: MessageId,
    ) -> Result<(), AnalyzerError> {
        let comments = schema_comments::scan(self.content);

        if let Some(directive) = &comments.proto_message {
            let anchor = self.add_anchor(file_vname, directive.span.begin, directive.span.end);
            let descriptor = self.pool.message(top_level_message);
            let message_vname = self.vname_for_descriptor(&descriptor.full_name, descriptor.file)?;
            self.recorder.add_edge(&anchor, EdgeKind::Ref, &message_vname);
        }

        let mut file_directives = comments.proto_imports.clone();
        if let Some(directive) = &comments.proto_file {
            file_directives.push(directive.clone());
        }
        for directive in file_directives {
            let anchor = self.add_anchor(file_vname, directive.span.begin, directive.span.end);
            let target = self
                .vname_for_rel_path(directive.value)
                .cloned()
                .ok_or_else(|| {
                    AnalyzerError::Unknown(format!(
                        "unable to lookup vname for rel path: {}",
                        directive.value
                    ))
                })?;
            self.recorder.add_edge(&anchor, EdgeKind::Ref, &target);
        }
        Ok(())
    }

    /// Attach a diagnostic node to the file via a `tagged` edge.
    pub fn emit_diagnostic(&mut self, file_vname: &VName, signature: &str, message: &str) {
        let mut diagnostic = file_vname.clone();
        diagnostic.signature = signature.to_string();
        self.recorder.add_node(&diagnostic, NodeKind::Diagnostic);
        self.recorder.add_property(
            &diagnostic,
            Property::DiagnosticMessage,
            PropertyValue::String(message.to_string()),
        );
        self.recorder
            .add_edge(file_vname, EdgeKind::Tagged, &diagnostic);
    }

    /// Content-addressed anchor over `[begin, end)`, emitted immediately.
    fn add_anchor(&mut self, file_vname: &VName, begin: usize, end: usize) -> VName {
        let mut anchor = file_vname.clone();
        anchor.language = LANGUAGE_NAME.to_string();
        anchor.signature = format!("@{begin}:{end}");
        self.recorder.add_node(&anchor, NodeKind::Anchor);
        self.recorder
            .add_property(&anchor, Property::LocationStartOffset, PropertyValue::Offset(begin));
        self.recorder
            .add_property(&anchor, Property::LocationEndOffset, PropertyValue::Offset(end));
        anchor
    }

    /// VName for a schema entity: corpus/root/path from the defining
    /// file's VName, signature from the protobuf full name.
    fn vname_for_descriptor(
        &self,
        full_name: &str,
        file: FileId,
    ) -> Result<VName, AnalyzerError> {
        let rel_path = &self.pool.file(file).path;
        let file_vname = self.vname_for_rel_path(rel_path).ok_or_else(|| {
            AnalyzerError::Unknown(format!("unable to lookup vname for rel path: {rel_path}"))
        })?;
        Ok(VName {
            signature: full_name.to_string(),
            corpus: file_vname.corpus.clone(),
            root: file_vname.root.clone(),
            path: file_vname.path.clone(),
            language: PROTO_LANGUAGE.to_string(),
        })
    }

    /// Map a search-path-relative path back to its VName: through the
    /// substitution cache to the full path, then into the unit's inputs.
    fn vname_for_rel_path(&self, rel_path: &str) -> Option<&VName> {
        let full_path = self
            .substitution_cache
            .get(rel_path)
            .map(String::as_str)
            .unwrap_or(rel_path);
        self.unit.vname_for_full_path(full_path)
    }
}
