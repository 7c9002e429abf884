//! Token types for the style configuration lexer.

use crate::Span;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Structural tokens
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `=`
    Eq,
    /// `!`
    Bang,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `*`
    Star,
    /// `@`
    At,
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `.`
    Dot,
    /// `%`
    Percent,
    /// `/` not starting a comment
    Slash,

    // Value tokens
    /// Identifier: `aeroway`, `stroke-width`, `_private`
    Ident,
    /// Unsigned decimal number: `10`, `0.5`
    Number,
    /// Hash name: `#ff0000`, `#main`
    Hash,
    /// Quoted string: `'primary'` or `"primary"`
    QuotedString,

    // Trivia
    /// Block comment: `/* ... */`
    Comment,
    /// Horizontal whitespace: spaces, tabs, form feeds
    Whitespace,
    /// Newline: `\n`, `\r\n` or `\r`
    Newline,

    // Special tokens
    /// End of file
    Eof,
    /// Lexer error (unrecognized or unterminated input)
    Error,
}

impl TokenKind {
    /// Whether this token is trivia (whitespace or comments).
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Newline | TokenKind::Comment
        )
    }

    /// Human readable description used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::Lt => "`<`",
            TokenKind::Gt => "`>`",
            TokenKind::Eq => "`=`",
            TokenKind::Bang => "`!`",
            TokenKind::Comma => "`,`",
            TokenKind::Colon => "`:`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Star => "`*`",
            TokenKind::At => "`@`",
            TokenKind::Minus => "`-`",
            TokenKind::Plus => "`+`",
            TokenKind::Dot => "`.`",
            TokenKind::Percent => "`%`",
            TokenKind::Slash => "`/`",
            TokenKind::Ident => "identifier",
            TokenKind::Number => "number",
            TokenKind::Hash => "hash name",
            TokenKind::QuotedString => "quoted string",
            TokenKind::Comment => "comment",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Newline => "newline",
            TokenKind::Eof => "end of input",
            TokenKind::Error => "invalid input",
        }
    }
}

/// A token with its kind, span, and source text slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span in the source text.
    pub span: Span,
    /// The source text of this token.
    pub text: &'src str,
}

impl<'src> Token<'src> {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span, text: &'src str) -> Self {
        Self { kind, span, text }
    }

    /// Whether this is an identifier spelled exactly `word`.
    pub fn is_ident(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == word
    }

    /// Whether this is an identifier matching `word` ignoring ASCII case.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text.eq_ignore_ascii_case(word)
    }

    /// Contents of a quoted string with the quotes removed.
    ///
    /// A doubled quote character inside the string stands for one quote.
    pub fn unquoted(&self) -> String {
        if self.kind != TokenKind::QuotedString || self.text.len() < 2 {
            return self.text.to_string();
        }
        let quote = &self.text[..1];
        let inner = &self.text[1..self.text.len() - 1];
        inner.replace(&format!("{quote}{quote}"), quote)
    }
}
