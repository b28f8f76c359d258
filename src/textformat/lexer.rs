//! Logos-based lexer for textual protobuf.
//!
//! `#` comments and whitespace are trivia. The schema-comment scanner and
//! the Any type-URL recovery both work on the raw buffer, so comments never
//! need to survive tokenization.

use logos::Logos;

/// A token with its kind, text, and byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub offset: usize,
}

/// Token kinds handed to the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Int,
    Float,
    Str,
    LBrace,
    RBrace,
    LAngle,
    RAngle,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Semicolon,
    Slash,
    Dot,
    Minus,
    /// Byte sequence no rule matched
    Error,
}

/// Tokenize an entire textproto source string
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut lexer = LogosToken::lexer(input);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let kind = match result {
            Ok(t) => t.into(),
            Err(()) => TokenKind::Error,
        };
        tokens.push(Token {
            kind,
            text: lexer.slice(),
            offset: lexer.span().start,
        });
    }
    tokens
}

/// Logos token enum - maps to TokenKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"#[^\n]*")]
enum LogosToken {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"0[xX][0-9a-fA-F]+|[0-9]+")]
    Int,

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?[fF]?|\.[0-9]+([eE][+-]?[0-9]+)?[fF]?|[0-9]+[eE][+-]?[0-9]+[fF]?|[0-9]+[fF]")]
    Float,

    #[regex(r#""([^"\\\n]|\\.)*"|'([^'\\\n]|\\.)*'"#)]
    Str,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("<")]
    LAngle,
    #[token(">")]
    RAngle,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("/")]
    Slash,
    #[token(".")]
    Dot,
    #[token("-")]
    Minus,
}

impl From<LogosToken> for TokenKind {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::Ident => Self::Ident,
            LogosToken::Int => Self::Int,
            LogosToken::Float => Self::Float,
            LogosToken::Str => Self::Str,
            LogosToken::LBrace => Self::LBrace,
            LogosToken::RBrace => Self::RBrace,
            LogosToken::LAngle => Self::LAngle,
            LogosToken::RAngle => Self::RAngle,
            LogosToken::LBracket => Self::LBracket,
            LogosToken::RBracket => Self::RBracket,
            LogosToken::Colon => Self::Colon,
            LogosToken::Comma => Self::Comma,
            LogosToken::Semicolon => Self::Semicolon,
            LogosToken::Slash => Self::Slash,
            LogosToken::Dot => Self::Dot,
            LogosToken::Minus => Self::Minus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_scalar_field() {
        let toks = tokenize("my_string: \"hello\"");
        assert_eq!(toks[0].kind, TokenKind::Ident);
        assert_eq!(toks[0].text, "my_string");
        assert_eq!(toks[0].offset, 0);
        assert_eq!(toks[1].kind, TokenKind::Colon);
        assert_eq!(toks[2].kind, TokenKind::Str);
    }

    #[test]
    fn test_comments_are_trivia() {
        assert_eq!(
            kinds("# proto-file: m.proto\nx: 1"),
            vec![TokenKind::Ident, TokenKind::Colon, TokenKind::Int]
        );
    }

    #[test]
    fn test_extension_brackets() {
        assert_eq!(
            kinds("[pkg.ext]: 5"),
            vec![
                TokenKind::LBracket,
                TokenKind::Ident,
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::RBracket,
                TokenKind::Colon,
                TokenKind::Int
            ]
        );
    }

    #[test]
    fn test_any_type_url_tokens() {
        let toks = tokenize("[type.googleapis.com/pkg.Inner]");
        let slash: Vec<_> = toks.iter().filter(|t| t.kind == TokenKind::Slash).collect();
        assert_eq!(slash.len(), 1);
    }

    #[test]
    fn test_float_suffixes() {
        assert_eq!(
            kinds("1.5 2.5f 3e8 4f"),
            vec![TokenKind::Float, TokenKind::Float, TokenKind::Float, TokenKind::Float]
        );
    }

    #[test]
    fn test_offsets_count_bytes() {
        // Multi-byte character inside a comment shifts following offsets.
        let toks = tokenize("# é\nx: 1");
        assert_eq!(toks[0].text, "x");
        assert_eq!(toks[0].offset, 5);
    }
}
