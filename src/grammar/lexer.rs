//! Logos-based lexer for grammar files

use logos::Logos;

/// A token with its kind, text, and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub offset: usize,
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let kind = match self.inner.next()? {
            Ok(token) => token.into(),
            Err(()) => TokenKind::Error,
        };
        Some(Token {
            kind,
            text: self.inner.slice(),
            offset: self.inner.span().start,
        })
    }
}

/// Tokenize an entire grammar into a Vec
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

/// Token kinds of the grammar language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    GrammarKw,
    StartKw,
    RecoverKw,
    TokenKw,
    EndKw,
    Ident,
    String,
    Pattern,
    Eq,
    Semicolon,
    Colon,
    Pipe,
    LParen,
    RParen,
    Star,
    Plus,
    Question,
    Bang,
    Amp,
    /// Anything logos could not match
    Error,
}

/// Logos token enum - maps to TokenKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
enum LogosToken {
    // =========================================================================
    // DIRECTIVES
    // =========================================================================
    #[token("@grammar")]
    GrammarKw,

    #[token("@start")]
    StartKw,

    #[token("@recover")]
    RecoverKw,

    #[token("@token")]
    TokenKw,

    #[token("@end")]
    EndKw,

    // =========================================================================
    // ATOMS
    // =========================================================================
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String,

    #[regex(r"/([^/\\\n]|\\.)+/")]
    Pattern,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[token("=")]
    Eq,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token("|")]
    Pipe,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    #[token("?")]
    Question,

    #[token("!")]
    Bang,

    #[token("&")]
    Amp,
}

impl From<LogosToken> for TokenKind {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::GrammarKw => TokenKind::GrammarKw,
            LogosToken::StartKw => TokenKind::StartKw,
            LogosToken::RecoverKw => TokenKind::RecoverKw,
            LogosToken::TokenKw => TokenKind::TokenKw,
            LogosToken::EndKw => TokenKind::EndKw,
            LogosToken::Ident => TokenKind::Ident,
            LogosToken::String => TokenKind::String,
            LogosToken::Pattern => TokenKind::Pattern,
            LogosToken::Eq => TokenKind::Eq,
            LogosToken::Semicolon => TokenKind::Semicolon,
            LogosToken::Colon => TokenKind::Colon,
            LogosToken::Pipe => TokenKind::Pipe,
            LogosToken::LParen => TokenKind::LParen,
            LogosToken::RParen => TokenKind::RParen,
            LogosToken::Star => TokenKind::Star,
            LogosToken::Plus => TokenKind::Plus,
            LogosToken::Question => TokenKind::Question,
            LogosToken::Bang => TokenKind::Bang,
            LogosToken::Amp => TokenKind::Amp,
        }
    }
}
