//! Recursive descent parser for `.proto` files.
//!
//! Produces a [`FileAst`]. Constructs the indexer has no use for (options,
//! reserved ranges, services) are consumed and dropped; everything that can
//! appear in a textproto (messages, fields, enums, extensions, maps, oneofs)
//! is kept.

use crate::core::LineIndex;

use super::ast::*;
use super::lexer::{tokenize, Token, TokenKind};
use super::SchemaError;

/// Parse one `.proto` file into its AST. `path` is only used in errors.
pub fn parse_file(path: &str, source: &str) -> Result<FileAst, SchemaError> {
    let tokens = tokenize(source);
    let mut parser = Parser {
        path,
        source,
        tokens,
        pos: 0,
    };
    parser.parse_file()
}

struct Parser<'a> {
    path: &'a str,
    source: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse_file(&mut self) -> Result<FileAst, SchemaError> {
        let mut file = FileAst::default();
        while let Some(token) = self.peek() {
            match (token.kind, token.text) {
                (TokenKind::Semicolon, _) => {
                    self.bump();
                }
                (TokenKind::Ident, "syntax") => {
                    self.bump();
                    self.expect(TokenKind::Eq, "'='")?;
                    let level = self.expect_string("syntax level")?;
                    file.syntax = match level.as_str() {
                        "proto3" => Syntax::Proto3,
                        _ => Syntax::Proto2,
                    };
                    self.expect(TokenKind::Semicolon, "';'")?;
                }
                (TokenKind::Ident, "package") => {
                    self.bump();
                    file.package = self.parse_dotted_name()?;
                    self.expect(TokenKind::Semicolon, "';'")?;
                }
                (TokenKind::Ident, "import") => {
                    self.bump();
                    // `public` / `weak` modifiers change linkage, not content.
                    if self.at_keyword("public") || self.at_keyword("weak") {
                        self.bump();
                    }
                    file.imports.push(self.expect_string("import path")?);
                    self.expect(TokenKind::Semicolon, "';'")?;
                }
                (TokenKind::Ident, "option") => self.skip_option()?,
                (TokenKind::Ident, "message") => {
                    self.bump();
                    file.messages.push(self.parse_message()?);
                }
                (TokenKind::Ident, "enum") => {
                    self.bump();
                    file.enums.push(self.parse_enum()?);
                }
                (TokenKind::Ident, "extend") => {
                    self.bump();
                    file.extends.push(self.parse_extend()?);
                }
                (TokenKind::Ident, "service") => {
                    self.bump();
                    self.expect(TokenKind::Ident, "service name")?;
                    self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
                }
                _ => return self.error(format!("unexpected '{}' at file scope", token.text)),
            }
        }
        Ok(file)
    }

    fn parse_message(&mut self) -> Result<MessageAst, SchemaError> {
        let name = self.expect_ident("message name")?;
        let mut message = MessageAst {
            name,
            fields: Vec::new(),
            messages: Vec::new(),
            enums: Vec::new(),
            extends: Vec::new(),
        };
        self.expect(TokenKind::LBrace, "'{'")?;
        while let Some(token) = self.peek() {
            match (token.kind, token.text) {
                (TokenKind::RBrace, _) => {
                    self.bump();
                    return Ok(message);
                }
                (TokenKind::Semicolon, _) => {
                    self.bump();
                }
                (TokenKind::Ident, "message") => {
                    self.bump();
                    message.messages.push(self.parse_message()?);
                }
                (TokenKind::Ident, "enum") => {
                    self.bump();
                    message.enums.push(self.parse_enum()?);
                }
                (TokenKind::Ident, "extend") => {
                    self.bump();
                    message.extends.push(self.parse_extend()?);
                }
                (TokenKind::Ident, "option") => self.skip_option()?,
                (TokenKind::Ident, "reserved") | (TokenKind::Ident, "extensions") => {
                    self.skip_until_semicolon()
                }
                (TokenKind::Ident, "oneof") => {
                    self.bump();
                    self.expect_ident("oneof name")?;
                    self.expect(TokenKind::LBrace, "'{'")?;
                    // Oneof members behave like ordinary singular fields.
                    while !self.at(TokenKind::RBrace) {
                        if self.at_keyword("option") {
                            self.skip_option()?;
                        } else {
                            message.fields.push(self.parse_field(LabelAst::Singular)?);
                        }
                    }
                    self.expect(TokenKind::RBrace, "'}'")?;
                }
                _ => {
                    let label = self.parse_label();
                    message.fields.push(self.parse_field(label)?);
                }
            }
        }
        self.error("unclosed message body".to_string())
    }

    fn parse_label(&mut self) -> LabelAst {
        let label = match self.peek() {
            Some(t) if t.kind == TokenKind::Ident => match t.text {
                "optional" => LabelAst::Optional,
                "required" => LabelAst::Required,
                "repeated" => LabelAst::Repeated,
                _ => return LabelAst::Singular,
            },
            _ => return LabelAst::Singular,
        };
        self.bump();
        label
    }

    fn parse_field(&mut self, label: LabelAst) -> Result<FieldAst, SchemaError> {
        let field_type = self.parse_type()?;
        let name = self.expect_ident("field name")?;
        self.expect(TokenKind::Eq, "'='")?;
        let number = self.parse_int("field number")?;
        if self.at(TokenKind::LBracket) {
            self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket)?;
        }
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(FieldAst {
            label,
            field_type,
            name,
            number,
        })
    }

    fn parse_type(&mut self) -> Result<TypeAst, SchemaError> {
        if self.at_keyword("map") {
            self.bump();
            self.expect(TokenKind::LAngle, "'<'")?;
            let key_word = self.expect_ident("map key type")?;
            let key = match ScalarAst::from_keyword(&key_word) {
                Some(scalar) => scalar,
                None => return self.error(format!("invalid map key type '{key_word}'")),
            };
            self.expect(TokenKind::Comma, "','")?;
            let value = self.parse_type()?;
            self.expect(TokenKind::RAngle, "'>'")?;
            return Ok(TypeAst::Map(key, Box::new(value)));
        }
        if self.at_keyword("group") {
            return self.error("group fields are not supported".to_string());
        }
        if self.at(TokenKind::Dot) {
            // Fully-qualified reference; keep the leading dot.
            self.bump();
            let name = self.parse_dotted_name()?;
            return Ok(TypeAst::Named(format!(".{name}")));
        }
        let name = self.parse_dotted_name()?;
        if !name.contains('.') {
            if let Some(scalar) = ScalarAst::from_keyword(&name) {
                return Ok(TypeAst::Scalar(scalar));
            }
        }
        Ok(TypeAst::Named(name))
    }

    fn parse_enum(&mut self) -> Result<EnumAst, SchemaError> {
        let name = self.expect_ident("enum name")?;
        let mut values = Vec::new();
        self.expect(TokenKind::LBrace, "'{'")?;
        while let Some(token) = self.peek() {
            match (token.kind, token.text) {
                (TokenKind::RBrace, _) => {
                    self.bump();
                    return Ok(EnumAst { name, values });
                }
                (TokenKind::Semicolon, _) => {
                    self.bump();
                }
                (TokenKind::Ident, "option") => self.skip_option()?,
                (TokenKind::Ident, "reserved") => self.skip_until_semicolon(),
                (TokenKind::Ident, _) => {
                    let value_name = self.expect_ident("enum value name")?;
                    self.expect(TokenKind::Eq, "'='")?;
                    let number = self.parse_int("enum value number")?;
                    if self.at(TokenKind::LBracket) {
                        self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket)?;
                    }
                    self.expect(TokenKind::Semicolon, "';'")?;
                    values.push(EnumValueAst {
                        name: value_name,
                        number,
                    });
                }
                _ => return self.error(format!("unexpected '{}' in enum body", token.text)),
            }
        }
        self.error("unclosed enum body".to_string())
    }

    fn parse_extend(&mut self) -> Result<ExtendAst, SchemaError> {
        let extendee = if self.at(TokenKind::Dot) {
            self.bump();
            format!(".{}", self.parse_dotted_name()?)
        } else {
            self.parse_dotted_name()?
        };
        let mut fields = Vec::new();
        self.expect(TokenKind::LBrace, "'{'")?;
        while let Some(token) = self.peek() {
            match (token.kind, token.text) {
                (TokenKind::RBrace, _) => {
                    self.bump();
                    return Ok(ExtendAst { extendee, fields });
                }
                (TokenKind::Semicolon, _) => {
                    self.bump();
                }
                _ => {
                    let label = self.parse_label();
                    fields.push(self.parse_field(label)?);
                }
            }
        }
        self.error("unclosed extend body".to_string())
    }

    /// Consume `option ... ;` including aggregate `{ ... }` values.
    fn skip_option(&mut self) -> Result<(), SchemaError> {
        self.bump(); // 'option'
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Semicolon => {
                    self.bump();
                    return Ok(());
                }
                TokenKind::LBrace => {
                    self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
                }
                _ => {
                    self.bump();
                }
            }
        }
        self.error("unterminated option".to_string())
    }

    fn skip_until_semicolon(&mut self) {
        while let Some(token) = self.peek() {
            let done = token.kind == TokenKind::Semicolon;
            self.bump();
            if done {
                return;
            }
        }
    }

    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) -> Result<(), SchemaError> {
        self.expect(open, "opening delimiter")?;
        let mut depth = 1usize;
        while let Some(token) = self.peek() {
            if token.kind == open {
                depth += 1;
            } else if token.kind == close {
                depth -= 1;
            }
            self.bump();
            if depth == 0 {
                return Ok(());
            }
        }
        self.error("unbalanced delimiters".to_string())
    }

    // === token helpers ===

    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    fn at_keyword(&self, word: &str) -> bool {
        self.peek()
            .is_some_and(|t| t.kind == TokenKind::Ident && t.text == word)
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token<'a>, SchemaError> {
        match self.peek().copied() {
            Some(t) if t.kind == kind => {
                self.pos += 1;
                Ok(t)
            }
            Some(t) => self.error(format!("expected {what}, found '{}'", t.text)),
            None => self.error(format!("expected {what}, found end of file")),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, SchemaError> {
        self.expect(TokenKind::Ident, what).map(|t| t.text.to_string())
    }

    fn expect_string(&mut self, what: &str) -> Result<String, SchemaError> {
        let token = self.expect(TokenKind::Str, what)?;
        match crate::core::strings::unquote(token.text) {
            Ok(value) => Ok(value),
            Err(message) => self.error_at(token.offset, message),
        }
    }

    /// `a` or `a.b.c`
    fn parse_dotted_name(&mut self) -> Result<String, SchemaError> {
        let mut name = self.expect_ident("name")?;
        while self.at(TokenKind::Dot) {
            self.bump();
            name.push('.');
            name.push_str(&self.expect_ident("name")?);
        }
        Ok(name)
    }

    fn parse_int(&mut self, what: &str) -> Result<i32, SchemaError> {
        let negative = if self.at(TokenKind::Minus) {
            self.bump();
            true
        } else {
            false
        };
        let token = self.expect(TokenKind::Int, what)?;
        let parsed = if let Some(hex) = token.text.strip_prefix("0x").or_else(|| token.text.strip_prefix("0X")) {
            i64::from_str_radix(hex, 16)
        } else if token.text.len() > 1 && token.text.starts_with('0') {
            i64::from_str_radix(&token.text[1..], 8)
        } else {
            token.text.parse()
        };
        match parsed {
            Ok(value) => {
                let value = if negative { -value } else { value };
                Ok(value as i32)
            }
            Err(_) => self.error(format!("invalid integer '{}'", token.text)),
        }
    }

    fn error<T>(&self, message: String) -> Result<T, SchemaError> {
        let offset = self
            .peek()
            .map(|t| t.offset)
            .unwrap_or_else(|| self.source.len());
        self.error_at(offset, message)
    }

    fn error_at<T>(&self, offset: usize, message: String) -> Result<T, SchemaError> {
        let location = LineIndex::new(self.source).location(offset);
        Err(SchemaError::Parse {
            path: self.path.to_string(),
            line: location.line + 1,
            column: location.column + 1,
            message,
        })
    }
}
