//! Relaxed recursive descent parser for textual protobuf.
//!
//! Drives a [`DynamicMessage`] and a [`ParseInfoTree`] in lockstep: one
//! location per field-name occurrence, one subtree per message element.
//! Partial messages are always accepted (required fields are never
//! enforced); unknown extensions and unknown `Any` types can be skipped
//! with [`ParseOptions::allow_unknown_extension`].

use tracing::warn;

use crate::base::ParseLocation;
use crate::core::strings::{unquote, unquote_bytes};
use crate::core::LineIndex;
use crate::schema::{DescriptorPool, EnumId, FieldId, FieldType, MessageId};

use super::lexer::{tokenize, Token, TokenKind};
use super::message::{DynamicMessage, Value};
use super::parse_tree::ParseInfoTree;
use super::wire;
use super::ParseError;

const ANY_FULL_NAME: &str = "google.protobuf.Any";

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Skip `[ext.name]` fields whose descriptor is not in the pool, and
    /// `Any` literals whose type is unknown, instead of failing.
    pub allow_unknown_extension: bool,
}

/// Parse with default (strict) options.
pub fn parse(
    source: &str,
    root: MessageId,
    pool: &DescriptorPool,
) -> Result<(DynamicMessage, ParseInfoTree), ParseError> {
    parse_with_options(source, root, pool, ParseOptions::default())
}

pub fn parse_with_options(
    source: &str,
    root: MessageId,
    pool: &DescriptorPool,
    options: ParseOptions,
) -> Result<(DynamicMessage, ParseInfoTree), ParseError> {
    let mut parser = Parser {
        pool,
        options,
        tokens: tokenize(source),
        pos: 0,
        line_index: LineIndex::new(source),
        source_len: source.len(),
    };
    let mut message = DynamicMessage::new(root);
    let mut tree = ParseInfoTree::default();
    parser.parse_field_list(&mut message, &mut tree, None)?;
    Ok((message, tree))
}

struct Parser<'a> {
    pool: &'a DescriptorPool,
    options: ParseOptions,
    tokens: Vec<Token<'a>>,
    pos: usize,
    line_index: LineIndex<'a>,
    source_len: usize,
}

impl<'a> Parser<'a> {
    /// Parse fields until `terminator` (or end of input when `None`).
    fn parse_field_list(
        &mut self,
        message: &mut DynamicMessage,
        tree: &mut ParseInfoTree,
        terminator: Option<TokenKind>,
    ) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                None => {
                    return match terminator {
                        None => Ok(()),
                        Some(_) => self.error("unexpected end of input in message value"),
                    }
                }
                Some(token) if Some(token.kind) == terminator => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => {
                    self.parse_field(message, tree)?;
                    while self.at(TokenKind::Comma) || self.at(TokenKind::Semicolon) {
                        self.bump();
                    }
                }
            }
        }
    }

    fn parse_field(
        &mut self,
        message: &mut DynamicMessage,
        tree: &mut ParseInfoTree,
    ) -> Result<(), ParseError> {
        let start = self.peek_or_eof("field name")?;
        let location = self.line_index.location(start.offset);

        match start.kind {
            TokenKind::LBracket => {
                let name = self.parse_bracketed_name()?;
                if name.contains('/') {
                    // An Any type URL is only meaningful inside an Any value.
                    let descriptor = message.descriptor();
                    if self.pool.message(descriptor).full_name != ANY_FULL_NAME {
                        return self.error_at(
                            start.offset,
                            format!("type URL '[{name}]' outside google.protobuf.Any"),
                        );
                    }
                    return self.parse_any_contents(message, tree, name, start.offset);
                }
                match self.pool.find_extension_by_name(&name) {
                    Some(ext) if self.pool.field(ext).containing_type == message.descriptor() => {
                        self.parse_field_value(message, tree, ext, location)
                    }
                    Some(_) => self.error_at(
                        start.offset,
                        format!(
                            "extension '{name}' does not extend message '{}'",
                            self.pool.message(message.descriptor()).full_name
                        ),
                    ),
                    None if self.options.allow_unknown_extension => {
                        warn!("skipping unknown extension field: [{name}]");
                        self.skip_field_value()
                    }
                    None => self.error_at(start.offset, format!("unknown extension '{name}'")),
                }
            }
            TokenKind::Ident => {
                self.bump();
                match self.pool.field_by_name(message.descriptor(), start.text) {
                    Some(field) => self.parse_field_value(message, tree, field, location),
                    None => self.error_at(
                        start.offset,
                        format!(
                            "message type '{}' has no field named '{}'",
                            self.pool.message(message.descriptor()).full_name,
                            start.text
                        ),
                    ),
                }
            }
            _ => self.error_at(
                start.offset,
                format!("expected field name, found '{}'", start.text),
            ),
        }
    }

    fn parse_field_value(
        &mut self,
        message: &mut DynamicMessage,
        tree: &mut ParseInfoTree,
        field: FieldId,
        location: ParseLocation,
    ) -> Result<(), ParseError> {
        tree.record_location(field, location);
        let descriptor = self.pool.field(field);
        if !descriptor.is_repeated() && message.is_set(field) {
            return self.error(format!(
                "non-repeated field '{}' is specified multiple times",
                descriptor.full_name
            ));
        }

        let has_colon = if self.at(TokenKind::Colon) {
            self.bump();
            true
        } else {
            false
        };

        if self.at(TokenKind::LBracket) {
            // Inline repeated list: one field name, many values.
            if !descriptor.is_repeated() {
                return self.error(format!(
                    "non-repeated field '{}' cannot use list syntax",
                    descriptor.full_name
                ));
            }
            self.bump();
            if self.at(TokenKind::RBracket) {
                self.bump();
                return Ok(());
            }
            loop {
                self.parse_single_value(message, tree, field, has_colon)?;
                if self.at(TokenKind::Comma) {
                    self.bump();
                    continue;
                }
                break;
            }
            self.expect(TokenKind::RBracket, "']'")?;
            return Ok(());
        }

        self.parse_single_value(message, tree, field, has_colon)
    }

    fn parse_single_value(
        &mut self,
        message: &mut DynamicMessage,
        tree: &mut ParseInfoTree,
        field: FieldId,
        has_colon: bool,
    ) -> Result<(), ParseError> {
        let descriptor = self.pool.field(field);
        let repeated = descriptor.is_repeated();
        if let Some(sub) = descriptor.message_type() {
            let value = self.parse_message_value(tree, field, sub)?;
            if repeated {
                message.push(field, value);
            } else {
                message.set(field, value);
            }
            return Ok(());
        }

        if !has_colon {
            return self.error(format!(
                "expected ':' after field '{}'",
                descriptor.full_name
            ));
        }
        let value = self.parse_scalar_value(descriptor.field_type)?;
        if repeated {
            message.push(field, value);
        } else {
            message.set(field, value);
        }
        Ok(())
    }

    fn parse_message_value(
        &mut self,
        tree: &mut ParseInfoTree,
        field: FieldId,
        sub: MessageId,
    ) -> Result<Value, ParseError> {
        let open = self.peek_or_eof("'{' or '<'")?;
        let close = match open.kind {
            TokenKind::LBrace => TokenKind::RBrace,
            TokenKind::LAngle => TokenKind::RAngle,
            _ => {
                return self.error_at(
                    open.offset,
                    format!("expected '{{' or '<', found '{}'", open.text),
                )
            }
        };
        self.bump();
        let subtree = tree.create_nested(field);
        let mut submessage = DynamicMessage::new(sub);
        self.parse_field_list(&mut submessage, subtree, Some(close))?;
        Ok(Value::Message(submessage))
    }

    /// `[domain/full.Name] { ... }` inside an Any value: parse the body as
    /// the named type, then re-serialize into `type_url`/`value`. The
    /// message content round-trips through bytes, but the body's field
    /// locations are recorded into `tree` (the Any field's nested subtree)
    /// so the analyzer can match the decoded message back up. The type-URL
    /// span itself is recovered from the raw text.
    fn parse_any_contents(
        &mut self,
        message: &mut DynamicMessage,
        tree: &mut ParseInfoTree,
        type_url: String,
        bracket_offset: usize,
    ) -> Result<(), ParseError> {
        let message_name = type_url.rsplit('/').next().unwrap_or_default().to_string();
        let Some(inner_descriptor) = self.pool.find_message_by_name(&message_name) else {
            if self.options.allow_unknown_extension {
                warn!("skipping Any with unknown message type: {message_name}");
                return self.skip_field_value();
            }
            return self.error_at(
                bracket_offset,
                format!("unknown Any message type '{message_name}'"),
            );
        };

        let open = self.peek_or_eof("'{' or '<'")?;
        let close = match open.kind {
            TokenKind::LBrace => TokenKind::RBrace,
            TokenKind::LAngle => TokenKind::RAngle,
            _ => {
                return self.error_at(
                    open.offset,
                    format!("expected '{{' or '<', found '{}'", open.text),
                )
            }
        };
        self.bump();
        let mut inner = DynamicMessage::new(inner_descriptor);
        self.parse_field_list(&mut inner, tree, Some(close))?;

        let any = message.descriptor();
        let (Some(type_url_field), Some(value_field)) = (
            self.pool.field_by_name(any, "type_url"),
            self.pool.field_by_name(any, "value"),
        ) else {
            return self.error_at(bracket_offset, "google.protobuf.Any is missing its fields");
        };
        message.set(type_url_field, Value::String(type_url));
        message.set(value_field, Value::Bytes(wire::encode(&inner, self.pool)));
        Ok(())
    }

    /// `[` already peeked; consumes through `]`, returning the joined name.
    fn parse_bracketed_name(&mut self) -> Result<String, ParseError> {
        self.expect(TokenKind::LBracket, "'['")?;
        let mut name = String::new();
        loop {
            let token = self.peek_or_eof("extension name or ']'")?;
            match token.kind {
                TokenKind::RBracket => {
                    self.bump();
                    if name.is_empty() {
                        return self.error("empty '[]' field name");
                    }
                    return Ok(name);
                }
                TokenKind::Ident
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::Dot
                | TokenKind::Slash
                | TokenKind::Minus => {
                    name.push_str(token.text);
                    self.bump();
                }
                _ => {
                    return self.error_at(
                        token.offset,
                        format!("unexpected '{}' in bracketed field name", token.text),
                    )
                }
            }
        }
    }

    fn parse_scalar_value(&mut self, field_type: FieldType) -> Result<Value, ParseError> {
        match field_type {
            FieldType::String => {
                let mut out = String::new();
                for piece in self.string_pieces()? {
                    match unquote(piece) {
                        Ok(s) => out.push_str(&s),
                        Err(message) => return self.error(message),
                    }
                }
                Ok(Value::String(out))
            }
            FieldType::Bytes => {
                let mut out = Vec::new();
                for piece in self.string_pieces()? {
                    match unquote_bytes(piece) {
                        Ok(mut b) => out.append(&mut b),
                        Err(message) => return self.error(message),
                    }
                }
                Ok(Value::Bytes(out))
            }
            FieldType::Bool => self.parse_bool(),
            FieldType::Enum(id) => self.parse_enum(id),
            FieldType::Int32 | FieldType::SInt32 | FieldType::SFixed32 => {
                let value = self.parse_signed()?;
                match i32::try_from(value) {
                    Ok(v) => Ok(Value::Int32(v)),
                    Err(_) => self.error(format!("integer out of range for int32: {value}")),
                }
            }
            FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64 => {
                Ok(Value::Int64(self.parse_signed()?))
            }
            FieldType::UInt32 | FieldType::Fixed32 => {
                let value = self.parse_unsigned()?;
                match u32::try_from(value) {
                    Ok(v) => Ok(Value::UInt32(v)),
                    Err(_) => self.error(format!("integer out of range for uint32: {value}")),
                }
            }
            FieldType::UInt64 | FieldType::Fixed64 => Ok(Value::UInt64(self.parse_unsigned()?)),
            FieldType::Float => Ok(Value::Float(self.parse_float()? as f32)),
            FieldType::Double => Ok(Value::Double(self.parse_float()?)),
            FieldType::Message(_) => self.error("message value handled elsewhere"),
        }
    }

    /// One or more adjacent string literals (textformat concatenates them).
    fn string_pieces(&mut self) -> Result<Vec<&'a str>, ParseError> {
        let first = self.peek_or_eof("string literal")?;
        if first.kind != TokenKind::Str {
            return self.error_at(
                first.offset,
                format!("expected string literal, found '{}'", first.text),
            );
        }
        let mut pieces = Vec::new();
        while let Some(token) = self.peek() {
            if token.kind != TokenKind::Str {
                break;
            }
            pieces.push(token.text);
            self.bump();
        }
        Ok(pieces)
    }

    fn parse_bool(&mut self) -> Result<Value, ParseError> {
        let token = self.peek_or_eof("boolean")?;
        let value = match (token.kind, token.text) {
            (TokenKind::Ident, "true" | "True" | "t") => true,
            (TokenKind::Ident, "false" | "False" | "f") => false,
            (TokenKind::Int, "1") => true,
            (TokenKind::Int, "0") => false,
            _ => {
                return self.error_at(
                    token.offset,
                    format!("expected boolean, found '{}'", token.text),
                )
            }
        };
        self.bump();
        Ok(Value::Bool(value))
    }

    fn parse_enum(&mut self, id: EnumId) -> Result<Value, ParseError> {
        let token = self.peek_or_eof("enum value")?;
        match token.kind {
            TokenKind::Ident => {
                let descriptor = self.pool.enum_type(id);
                match descriptor.value_by_name(token.text) {
                    Some(value) => {
                        let number = value.number;
                        self.bump();
                        Ok(Value::Enum(number))
                    }
                    None => self.error_at(
                        token.offset,
                        format!(
                            "unknown value '{}' for enum '{}'",
                            token.text, descriptor.full_name
                        ),
                    ),
                }
            }
            TokenKind::Int | TokenKind::Minus => {
                let value = self.parse_signed()?;
                match i32::try_from(value) {
                    Ok(v) => Ok(Value::Enum(v)),
                    Err(_) => self.error(format!("enum number out of range: {value}")),
                }
            }
            _ => self.error_at(
                token.offset,
                format!("expected enum value, found '{}'", token.text),
            ),
        }
    }

    fn parse_signed(&mut self) -> Result<i64, ParseError> {
        let (negative, magnitude) = self.parse_int_token()?;
        if negative {
            if magnitude > (i64::MAX as u64) + 1 {
                return self.error("integer underflows int64");
            }
            Ok((magnitude as i128).wrapping_neg() as i64)
        } else {
            match i64::try_from(magnitude) {
                Ok(v) => Ok(v),
                Err(_) => self.error("integer overflows int64"),
            }
        }
    }

    fn parse_unsigned(&mut self) -> Result<u64, ParseError> {
        let (negative, magnitude) = self.parse_int_token()?;
        if negative {
            return self.error("negative value for unsigned field");
        }
        Ok(magnitude)
    }

    fn parse_int_token(&mut self) -> Result<(bool, u64), ParseError> {
        let negative = if self.at(TokenKind::Minus) {
            self.bump();
            true
        } else {
            false
        };
        let token = self.peek_or_eof("integer")?;
        if token.kind != TokenKind::Int {
            return self.error_at(
                token.offset,
                format!("expected integer, found '{}'", token.text),
            );
        }
        let text = token.text;
        let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            u64::from_str_radix(hex, 16)
        } else if text.len() > 1 && text.starts_with('0') {
            u64::from_str_radix(&text[1..], 8)
        } else {
            text.parse()
        };
        match parsed {
            Ok(value) => {
                self.bump();
                Ok((negative, value))
            }
            Err(_) => self.error_at(token.offset, format!("invalid integer '{text}'")),
        }
    }

    fn parse_float(&mut self) -> Result<f64, ParseError> {
        let negative = if self.at(TokenKind::Minus) {
            self.bump();
            true
        } else {
            false
        };
        let token = self.peek_or_eof("number")?;
        let value = match token.kind {
            TokenKind::Float | TokenKind::Int => {
                let text = token.text.trim_end_matches(['f', 'F']);
                match text.parse::<f64>() {
                    Ok(v) => v,
                    Err(_) => {
                        return self.error_at(token.offset, format!("invalid number '{}'", token.text))
                    }
                }
            }
            TokenKind::Ident if token.text.eq_ignore_ascii_case("inf") => f64::INFINITY,
            TokenKind::Ident if token.text.eq_ignore_ascii_case("infinity") => f64::INFINITY,
            TokenKind::Ident if token.text.eq_ignore_ascii_case("nan") => f64::NAN,
            _ => {
                return self.error_at(
                    token.offset,
                    format!("expected number, found '{}'", token.text),
                )
            }
        };
        self.bump();
        Ok(if negative { -value } else { value })
    }

    // === skipping (unknown extensions, unknown Any types) ===

    fn skip_field_value(&mut self) -> Result<(), ParseError> {
        if self.at(TokenKind::Colon) {
            self.bump();
        }
        match self.peek_or_eof("value")?.kind {
            TokenKind::LBrace | TokenKind::LAngle => self.skip_balanced_message(),
            TokenKind::LBracket => {
                self.bump();
                if self.at(TokenKind::RBracket) {
                    self.bump();
                    return Ok(());
                }
                loop {
                    self.skip_single_value()?;
                    if self.at(TokenKind::Comma) {
                        self.bump();
                        continue;
                    }
                    break;
                }
                self.expect(TokenKind::RBracket, "']'")?;
                Ok(())
            }
            _ => self.skip_single_value(),
        }
    }

    fn skip_single_value(&mut self) -> Result<(), ParseError> {
        if self.at(TokenKind::Minus) {
            self.bump();
        }
        let token = self.peek_or_eof("value")?;
        match token.kind {
            TokenKind::LBrace | TokenKind::LAngle => self.skip_balanced_message(),
            TokenKind::Str => {
                while self.at(TokenKind::Str) {
                    self.bump();
                }
                Ok(())
            }
            TokenKind::Ident | TokenKind::Int | TokenKind::Float => {
                self.bump();
                Ok(())
            }
            _ => self.error_at(
                token.offset,
                format!("expected value, found '{}'", token.text),
            ),
        }
    }

    fn skip_balanced_message(&mut self) -> Result<(), ParseError> {
        let mut stack: Vec<TokenKind> = Vec::new();
        loop {
            let token = self.peek_or_eof("matching close delimiter")?;
            match token.kind {
                TokenKind::LBrace => stack.push(TokenKind::RBrace),
                TokenKind::LAngle => stack.push(TokenKind::RAngle),
                TokenKind::RBrace | TokenKind::RAngle => {
                    if stack.pop() != Some(token.kind) {
                        return self.error_at(
                            token.offset,
                            format!("mismatched '{}' in skipped value", token.text),
                        );
                    }
                }
                _ => {}
            }
            self.bump();
            if stack.is_empty() {
                return Ok(());
            }
        }
    }

    // === token helpers ===

    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn peek_or_eof(&self, what: &str) -> Result<Token<'a>, ParseError> {
        match self.tokens.get(self.pos) {
            Some(token) => Ok(*token),
            None => self.error(format!("expected {what}, found end of input")),
        }
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    fn bump(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ParseError> {
        let token = self.peek_or_eof(what)?;
        if token.kind != kind {
            return self.error_at(token.offset, format!("expected {what}, found '{}'", token.text));
        }
        self.bump();
        Ok(())
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T, ParseError> {
        let offset = self
            .peek()
            .map(|t| t.offset)
            .unwrap_or(self.source_len);
        self.error_at(offset, message)
    }

    fn error_at<T>(&self, offset: usize, message: impl Into<String>) -> Result<T, ParseError> {
        let location = self.line_index.location(offset);
        Err(ParseError::new(
            location.line + 1,
            location.column + 1,
            message,
        ))
    }
}
