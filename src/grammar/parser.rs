//! Recursive descent parser for grammar files
//!
//! ```text
//! file     = item*
//! item     = "@grammar" IDENT ";" | "@start" IDENT ";" | "@recover" PATTERN ";"
//!          | IDENT "=" choice ";"
//! choice   = seq ("|" seq)*
//! seq      = prefixed+
//! prefixed = ("!" | "&")? postfix
//! postfix  = primary ("*" | "+" | "?")*
//! primary  = IDENT ":" postfix | IDENT | STRING | PATTERN | "(" choice? ")"
//!          | "@token" "(" choice ")" | "@end"
//! ```

use smol_str::SmolStr;

use super::error::GrammarError;
use super::lexer::{Token, TokenKind, tokenize};
use super::{Expr, Grammar, RuleDef};

type Result<T> = std::result::Result<T, GrammarError>;

/// Parse grammar text into a [`Grammar`]
pub(crate) fn parse_grammar(input: &str) -> Result<Grammar> {
    let tokens = tokenize(input);
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        end: input.len(),
    };
    parser.parse_file()
}

struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    end: usize,
}

impl<'a> Parser<'a> {
    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current().is_some_and(|t| t.kind == kind)
    }

    fn offset(&self) -> usize {
        self.current().map(|t| t.offset).unwrap_or(self.end)
    }

    fn describe_current(&self) -> String {
        match self.current() {
            Some(token) => format!("`{}`", token.text),
            None => "end of file".to_string(),
        }
    }

    fn error<T>(&self, expected: &str) -> Result<T> {
        Err(GrammarError::syntax(
            self.offset(),
            format!("expected {expected}, found {}", self.describe_current()),
        ))
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<&'a Token<'a>> {
        match self.tokens.get(self.pos) {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(token)
            }
            _ => self.error(what),
        }
    }

    // =========================================================================
    // Items
    // =========================================================================

    fn parse_file(&mut self) -> Result<Grammar> {
        let mut name = None;
        let mut start = None;
        let mut recover = None;
        let mut rules = Vec::new();

        while let Some(kind) = self.current().map(|t| t.kind) {
            match kind {
                TokenKind::GrammarKw => {
                    self.pos += 1;
                    name = Some(SmolStr::new(self.expect(TokenKind::Ident, "grammar name")?.text));
                    self.expect(TokenKind::Semicolon, "`;`")?;
                }
                TokenKind::StartKw => {
                    self.pos += 1;
                    start = Some(SmolStr::new(self.expect(TokenKind::Ident, "start rule")?.text));
                    self.expect(TokenKind::Semicolon, "`;`")?;
                }
                TokenKind::RecoverKw => {
                    self.pos += 1;
                    let pattern = self.expect(TokenKind::Pattern, "recovery pattern")?;
                    recover = Some(pattern_source(pattern.text).to_string());
                    self.expect(TokenKind::Semicolon, "`;`")?;
                }
                TokenKind::Ident => rules.push(self.parse_rule()?),
                _ => return self.error("a rule or directive"),
            }
        }

        Ok(Grammar {
            name: name.ok_or(GrammarError::MissingDirective("grammar"))?,
            start: start.ok_or(GrammarError::MissingDirective("start"))?,
            recover,
            rules,
        })
    }

    fn parse_rule(&mut self) -> Result<RuleDef> {
        let name = self.expect(TokenKind::Ident, "rule name")?;
        let offset = name.offset;
        let name = SmolStr::new(name.text);
        self.expect(TokenKind::Eq, "`=`")?;
        let body = self.parse_choice()?;
        self.expect(TokenKind::Semicolon, "`;`")?;
        Ok(RuleDef { name, body, offset })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_choice(&mut self) -> Result<Expr> {
        let mut alternatives = vec![self.parse_seq()?];
        while self.at(TokenKind::Pipe) {
            self.pos += 1;
            alternatives.push(self.parse_seq()?);
        }
        Ok(if alternatives.len() == 1 {
            alternatives.remove(0)
        } else {
            Expr::Choice(alternatives)
        })
    }

    fn at_primary_start(&self) -> bool {
        self.current().is_some_and(|t| {
            matches!(
                t.kind,
                TokenKind::Ident
                    | TokenKind::String
                    | TokenKind::Pattern
                    | TokenKind::LParen
                    | TokenKind::TokenKw
                    | TokenKind::EndKw
                    | TokenKind::Bang
                    | TokenKind::Amp
            )
        })
    }

    fn parse_seq(&mut self) -> Result<Expr> {
        if !self.at_primary_start() {
            return self.error("an expression");
        }
        let mut items = Vec::new();
        while self.at_primary_start() {
            items.push(self.parse_prefixed()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::Seq(items)
        })
    }

    fn parse_prefixed(&mut self) -> Result<Expr> {
        if self.at(TokenKind::Bang) {
            self.pos += 1;
            return Ok(Expr::Not(Box::new(self.parse_postfix()?)));
        }
        if self.at(TokenKind::Amp) {
            self.pos += 1;
            return Ok(Expr::And(Box::new(self.parse_postfix()?)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            expr = match self.current().map(|t| t.kind) {
                Some(TokenKind::Star) => Expr::Repeat(Box::new(expr)),
                Some(TokenKind::Plus) => Expr::Repeat1(Box::new(expr)),
                Some(TokenKind::Question) => Expr::Optional(Box::new(expr)),
                _ => return Ok(expr),
            };
            self.pos += 1;
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let Some(token) = self.tokens.get(self.pos) else {
            return self.error("an expression");
        };
        match token.kind {
            TokenKind::Ident => {
                self.pos += 1;
                let name = SmolStr::new(token.text);
                if self.at(TokenKind::Colon) {
                    self.pos += 1;
                    return Ok(Expr::Field(name, Box::new(self.parse_postfix()?)));
                }
                Ok(Expr::Rule(name))
            }
            TokenKind::String => {
                self.pos += 1;
                Ok(Expr::Literal(unescape(token)?))
            }
            TokenKind::Pattern => {
                self.pos += 1;
                Ok(Expr::Pattern(pattern_source(token.text).to_string()))
            }
            TokenKind::LParen => {
                self.pos += 1;
                if self.at(TokenKind::RParen) {
                    self.pos += 1;
                    return Ok(Expr::Seq(Vec::new()));
                }
                let inner = self.parse_choice()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(inner)
            }
            TokenKind::TokenKw => {
                self.pos += 1;
                self.expect(TokenKind::LParen, "`(` after @token")?;
                let inner = self.parse_choice()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(Expr::Token(Box::new(inner)))
            }
            TokenKind::EndKw => {
                self.pos += 1;
                Ok(Expr::End)
            }
            _ => self.error("an expression"),
        }
    }
}

/// Strip the slashes around a pattern token
fn pattern_source(text: &str) -> &str {
    &text[1..text.len() - 1]
}

fn unescape(token: &Token<'_>) -> Result<String> {
    let body = &token.text[1..token.text.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next().map(|(_, c)| c) {
            Some('\\') => '\\',
            Some('"') => '"',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            other => {
                return Err(GrammarError::syntax(
                    token.offset + 1 + i,
                    format!("unknown escape `\\{}` in string", other.unwrap_or(' ')),
                ));
            }
        };
        out.push(escaped);
    }
    Ok(out)
}
