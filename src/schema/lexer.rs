//! Logos-based lexer for `.proto` schema files.
//!
//! Whitespace and comments are trivia and never reach the parser.

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
    LBracket,
    RBracket,
    LParen,
    RParen,
    LAngle,
    RAngle,
    Eq,
    Comma,
    Semicolon,
    Colon,
    Dot,
    Minus,
    Plus,
    /// Byte sequence no rule matched
    Error,
}

/// Tokenize an entire `.proto` source string
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
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*[^/])*\*/")]
enum LogosToken {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"0[xX][0-9a-fA-F]+|[0-9]+")]
    Int,

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?|\.[0-9]+([eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+")]
    Float,

    #[regex(r#""([^"\\\n]|\\.)*"|'([^'\\\n]|\\.)*'"#)]
    Str,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("<")]
    LAngle,
    #[token(">")]
    RAngle,
    #[token("=")]
    Eq,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
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
            LogosToken::LBracket => Self::LBracket,
            LogosToken::RBracket => Self::RBracket,
            LogosToken::LParen => Self::LParen,
            LogosToken::RParen => Self::RParen,
            LogosToken::LAngle => Self::LAngle,
            LogosToken::RAngle => Self::RAngle,
            LogosToken::Eq => Self::Eq,
            LogosToken::Comma => Self::Comma,
            LogosToken::Semicolon => Self::Semicolon,
            LogosToken::Colon => Self::Colon,
            LogosToken::Dot => Self::Dot,
            LogosToken::Minus => Self::Minus,
            LogosToken::Plus => Self::Plus,
        }
    }
}
