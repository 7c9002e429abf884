//! Tokenizer for the style configuration language.

use crate::{Span, Token, TokenKind};
use tracing::trace;

/// A tokenizer that produces tokens from style configuration source text.
#[derive(Clone)]
pub struct Tokenizer<'src> {
    /// The source text being tokenized.
    source: &'src str,
    /// The remaining source text (suffix of `source`).
    remaining: &'src str,
    /// Current byte position in `source`.
    pos: u32,
}

impl<'src> Tokenizer<'src> {
    /// Create a new tokenizer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            remaining: source,
            pos: 0,
        }
    }

    /// Get the current byte position.
    #[inline]
    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Check if we're at the end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Peek at the next character without consuming it.
    #[inline]
    fn peek(&self) -> Option<char> {
        self.remaining.chars().next()
    }

    /// Peek at the nth character (0-indexed) without consuming.
    #[inline]
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining.chars().nth(n)
    }

    /// Advance by one character and return it.
    #[inline]
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8() as u32;
        self.remaining = &self.remaining[c.len_utf8()..];
        Some(c)
    }

    /// Advance while `pred` holds for the next character.
    #[inline]
    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.advance();
        }
    }

    /// Check if the remaining text starts with the given prefix.
    #[inline]
    fn starts_with(&self, prefix: &str) -> bool {
        self.remaining.starts_with(prefix)
    }

    /// Create a token from the given start position to current position.
    fn token(&self, kind: TokenKind, start: u32) -> Token<'src> {
        let span = Span::new(start, self.pos);
        let text = &self.source[start as usize..self.pos as usize];
        trace!("Token {:?} at {:?}: {:?}", kind, span, text);
        Token::new(kind, span, text)
    }

    /// Consume one character and emit a token of `kind` for it.
    fn single(&mut self, kind: TokenKind) -> Token<'src> {
        let start = self.pos;
        self.advance();
        self.token(kind, start)
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token<'src> {
        let Some(c) = self.peek() else {
            return self.token(TokenKind::Eof, self.pos);
        };
        let start = self.pos;

        match c {
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '<' => self.single(TokenKind::Lt),
            '>' => self.single(TokenKind::Gt),
            '=' => self.single(TokenKind::Eq),
            '!' => self.single(TokenKind::Bang),
            ',' => self.single(TokenKind::Comma),
            ':' => self.single(TokenKind::Colon),
            ';' => self.single(TokenKind::Semicolon),
            '*' => self.single(TokenKind::Star),
            '@' => self.single(TokenKind::At),
            '-' => self.single(TokenKind::Minus),
            '+' => self.single(TokenKind::Plus),
            '.' => self.single(TokenKind::Dot),
            '%' => self.single(TokenKind::Percent),

            '/' if self.starts_with("/*") => self.tokenize_comment(),
            '/' => self.single(TokenKind::Slash),

            '#' => self.tokenize_hash(),
            '\'' | '"' => self.tokenize_quoted_string(c),

            ' ' | '\t' | '\u{000C}' => {
                self.advance_while(|c| matches!(c, ' ' | '\t' | '\u{000C}'));
                self.token(TokenKind::Whitespace, start)
            }
            '\n' => self.single(TokenKind::Newline),
            '\r' => {
                self.advance();
                if self.peek() == Some('\n') {
                    self.advance();
                }
                self.token(TokenKind::Newline, start)
            }

            _ if c.is_ascii_digit() => self.tokenize_number(),
            _ if is_ident_start(c) => {
                self.advance_while(is_ident_char);
                self.token(TokenKind::Ident, start)
            }

            // Error: unrecognized character
            _ => self.single(TokenKind::Error),
        }
    }

    /// Tokenize `[0-9]+(\.[0-9]+)?`.
    fn tokenize_number(&mut self) -> Token<'src> {
        let start = self.pos;
        self.advance_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') && matches!(self.peek_nth(1), Some(c) if c.is_ascii_digit()) {
            self.advance();
            self.advance_while(|c| c.is_ascii_digit());
        }
        self.token(TokenKind::Number, start)
    }

    /// Tokenize `#name`; a bare `#` is an error.
    fn tokenize_hash(&mut self) -> Token<'src> {
        let start = self.pos;
        self.advance();
        if !matches!(self.peek(), Some(c) if is_ident_char(c)) {
            return self.token(TokenKind::Error, start);
        }
        self.advance_while(is_ident_char);
        self.token(TokenKind::Hash, start)
    }

    /// Tokenize a quoted string. A doubled quote is an escaped quote.
    fn tokenize_quoted_string(&mut self, quote: char) -> Token<'src> {
        let start = self.pos;
        self.advance();

        loop {
            match self.advance() {
                None | Some('\n') | Some('\r') => {
                    // Unterminated string
                    return self.token(TokenKind::Error, start);
                }
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(_) => {}
            }
        }

        self.token(TokenKind::QuotedString, start)
    }

    /// Tokenize a block comment: `/* ... */`.
    fn tokenize_comment(&mut self) -> Token<'src> {
        let start = self.pos;

        // Consume `/*`
        self.advance();
        self.advance();

        while !self.starts_with("*/") {
            if self.advance().is_none() {
                return self.token(TokenKind::Error, start);
            }
        }
        self.advance();
        self.advance();

        self.token(TokenKind::Comment, start)
    }
}

impl<'src> Iterator for Tokenizer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

/// Check if a character can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier.
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    fn tokenize(source: &str) -> Vec<(TokenKind, &str)> {
        Tokenizer::new(source).map(|t| (t.kind, t.text)).collect()
    }

    fn significant(source: &str) -> Vec<(TokenKind, &str)> {
        Tokenizer::new(source)
            .filter(|t| !t.kind.is_trivia())
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_structural_tokens() {
        assert_eq!(tokenize("{"), vec![(TokenKind::LBrace, "{")]);
        assert_eq!(tokenize("}"), vec![(TokenKind::RBrace, "}")]);
        assert_eq!(tokenize("["), vec![(TokenKind::LBracket, "[")]);
        assert_eq!(tokenize("]"), vec![(TokenKind::RBracket, "]")]);
        assert_eq!(tokenize("<"), vec![(TokenKind::Lt, "<")]);
        assert_eq!(tokenize(">"), vec![(TokenKind::Gt, ">")]);
        assert_eq!(tokenize("="), vec![(TokenKind::Eq, "=")]);
        assert_eq!(tokenize(";"), vec![(TokenKind::Semicolon, ";")]);
        assert_eq!(tokenize("@"), vec![(TokenKind::At, "@")]);
        assert_eq!(tokenize("/"), vec![(TokenKind::Slash, "/")]);
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(tokenize("aeroway"), vec![(TokenKind::Ident, "aeroway")]);
        assert_eq!(
            tokenize("stroke-width"),
            vec![(TokenKind::Ident, "stroke-width")]
        );
        assert_eq!(tokenize("_x1"), vec![(TokenKind::Ident, "_x1")]);
    }

    #[test]
    fn test_numbers_and_units() {
        assert_eq!(
            tokenize("10k"),
            vec![(TokenKind::Number, "10"), (TokenKind::Ident, "k")]
        );
        assert_eq!(tokenize("0.5"), vec![(TokenKind::Number, "0.5")]);
        assert_eq!(
            tokenize("3."),
            vec![(TokenKind::Number, "3"), (TokenKind::Dot, ".")]
        );
        assert_eq!(
            significant("0-10"),
            vec![
                (TokenKind::Number, "0"),
                (TokenKind::Minus, "-"),
                (TokenKind::Number, "10"),
            ]
        );
    }

    #[test]
    fn test_hash() {
        assert_eq!(tokenize("#ff0000"), vec![(TokenKind::Hash, "#ff0000")]);
        assert_eq!(tokenize("# "), vec![(TokenKind::Error, "#"), (TokenKind::Whitespace, " ")]);
    }

    #[test]
    fn test_quoted_strings() {
        assert_eq!(
            tokenize("'aerodrome'"),
            vec![(TokenKind::QuotedString, "'aerodrome'")]
        );
        assert_eq!(
            tokenize(r#""a b""#),
            vec![(TokenKind::QuotedString, r#""a b""#)]
        );
        let token = Tokenizer::new("'it''s'").next_token();
        assert_eq!(token.kind, TokenKind::QuotedString);
        assert_eq!(token.unquoted(), "it's");
        assert_eq!(tokenize("'open"), vec![(TokenKind::Error, "'open")]);
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            tokenize("/* note */"),
            vec![(TokenKind::Comment, "/* note */")]
        );
        assert_eq!(tokenize("/* open"), vec![(TokenKind::Error, "/* open")]);
        assert_eq!(
            significant("a /* x */ b"),
            vec![(TokenKind::Ident, "a"), (TokenKind::Ident, "b")]
        );
    }

    #[test]
    fn test_whitespace_and_newlines() {
        assert_eq!(
            tokenize(" \t\u{000C}\r\n\r\r\n\n"),
            vec![
                (TokenKind::Whitespace, " \t\u{000C}"),
                (TokenKind::Newline, "\r\n"),
                (TokenKind::Newline, "\r"),
                (TokenKind::Newline, "\r\n"),
                (TokenKind::Newline, "\n"),
            ]
        );
    }

    #[test]
    fn test_feature_header() {
        assert_eq!(
            significant("[aeroway] {\n  [undefined] {"),
            vec![
                (TokenKind::LBracket, "["),
                (TokenKind::Ident, "aeroway"),
                (TokenKind::RBracket, "]"),
                (TokenKind::LBrace, "{"),
                (TokenKind::LBracket, "["),
                (TokenKind::Ident, "undefined"),
                (TokenKind::RBracket, "]"),
                (TokenKind::LBrace, "{"),
            ]
        );
    }

    #[test]
    fn test_spans_are_contiguous() {
        let source = "<Simple> { * { fill: #000000; } }";
        let mut expected_start = 0;
        for token in Tokenizer::new(source) {
            assert_eq!(token.span.start, expected_start);
            assert_eq!(token.span.slice(source), token.text);
            expected_start = token.span.end;
        }
        assert_eq!(expected_start as usize, source.len());
    }

    #[test]
    fn test_unknown_character() {
        assert_eq!(tokenize("$"), vec![(TokenKind::Error, "$")]);
    }
}
