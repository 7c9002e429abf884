//! Bounded views over the significant tokens of a source text.

use ohdm_style_tokenizer::{Span, Token, TokenKind, Tokenizer};

use crate::diagnostic::{Diagnostics, SyntaxErrorKind};

/// Significant tokens of a source, with `{`/`}` pairs matched up front.
pub(crate) struct TokenStream<'src> {
    tokens: Vec<Token<'src>>,
    /// For every `{`, the index of its `}` (or `tokens.len()` when unclosed).
    matching: Vec<usize>,
}

impl<'src> TokenStream<'src> {
    /// Tokenize `source`, dropping trivia and reporting unbalanced braces.
    ///
    /// A stray `}` is reported and removed. An unclosed `{` is reported and
    /// its block runs to the end of input.
    pub(crate) fn lex(source: &'src str, diagnostics: &mut Diagnostics<'src>) -> Self {
        let mut tokens = Vec::new();
        let mut open = Vec::new();
        let mut pairs = Vec::new();

        for token in Tokenizer::new(source) {
            if token.kind.is_trivia() {
                continue;
            }
            match token.kind {
                TokenKind::LBrace => open.push(tokens.len()),
                TokenKind::RBrace => match open.pop() {
                    Some(start) => pairs.push((start, tokens.len())),
                    None => {
                        diagnostics.error(SyntaxErrorKind::UnmatchedBrace, token.span);
                        continue;
                    }
                },
                _ => {}
            }
            tokens.push(token);
        }

        let mut matching = vec![tokens.len(); tokens.len()];
        for (start, end) in pairs {
            matching[start] = end;
        }
        for start in open {
            diagnostics.error(SyntaxErrorKind::UnclosedBlock, tokens[start].span);
        }

        Self { tokens, matching }
    }

    /// Cursor over the whole stream.
    pub(crate) fn cursor(&self) -> Cursor<'_, 'src> {
        Cursor {
            tokens: &self.tokens,
            matching: &self.matching,
            pos: 0,
            end: self.tokens.len(),
        }
    }
}

/// A position inside a bounded range of tokens.
#[derive(Clone, Copy)]
pub(crate) struct Cursor<'t, 'src> {
    tokens: &'t [Token<'src>],
    matching: &'t [usize],
    pos: usize,
    end: usize,
}

impl<'t, 'src> Cursor<'t, 'src> {
    /// Peek at the next token.
    pub(crate) fn peek(&self) -> Option<Token<'src>> {
        self.peek_nth(0)
    }

    /// Peek `n` tokens ahead.
    pub(crate) fn peek_nth(&self, n: usize) -> Option<Token<'src>> {
        let index = self.pos + n;
        (index < self.end).then(|| self.tokens[index])
    }

    /// Kind of the next token, `Eof` at the end of the range.
    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().map_or(TokenKind::Eof, |t| t.kind)
    }

    /// Whether the next token has the given kind.
    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// Whether the next token is the identifier `word`.
    pub(crate) fn at_ident(&self, word: &str) -> bool {
        self.peek().is_some_and(|t| t.is_ident(word))
    }

    /// Whether the range is exhausted.
    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.end
    }

    /// Consume the next token.
    pub(crate) fn bump(&mut self) -> Option<Token<'src>> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    /// Consume the next token if it has the given kind.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        if self.at(kind) { self.bump() } else { None }
    }

    /// Whether the next token directly follows the previous one, without
    /// whitespace or comments in between.
    pub(crate) fn next_is_adjacent(&self) -> bool {
        match (self.pos.checked_sub(1), self.peek()) {
            (Some(prev), Some(next)) => self.tokens[prev].span.touches(next.span),
            _ => false,
        }
    }

    /// Span of the next token, or of the end of the range.
    pub(crate) fn span(&self) -> Span {
        match self.peek() {
            Some(token) => token.span,
            None => self.end_span(),
        }
    }

    /// Span just past the range: its closing token, or the end of input.
    pub(crate) fn end_span(&self) -> Span {
        match self.tokens.get(self.end) {
            Some(token) => token.span,
            None => Span::empty(self.tokens.last().map_or(0, |t| t.span.end)),
        }
    }

    /// Span of the most recently consumed token.
    pub(crate) fn prev_span(&self) -> Span {
        match self.pos.checked_sub(1) {
            Some(prev) => self.tokens[prev].span,
            None => self.span(),
        }
    }

    /// Source text from the start of the next token to the end of the range.
    pub(crate) fn remaining_text(&self, source: &'src str) -> &'src str {
        match (self.peek(), self.end.checked_sub(1)) {
            (Some(first), Some(last)) => {
                Span::new(first.span.start, self.tokens[last].span.end).slice(source)
            }
            _ => "",
        }
    }

    /// Enter the `{ ... }` block at the cursor.
    ///
    /// Returns a cursor over the block contents and moves past the closing
    /// brace. Returns `None` without moving when not at `{`.
    pub(crate) fn block(&mut self) -> Option<Cursor<'t, 'src>> {
        if !self.at(TokenKind::LBrace) {
            return None;
        }
        let close = self.matching[self.pos].min(self.end);
        let inner = Cursor {
            pos: self.pos + 1,
            end: close,
            ..*self
        };
        self.pos = (close + 1).min(self.end);
        Some(inner)
    }

    /// Enter a `[ ... ]` or `( ... )` group at the cursor.
    ///
    /// Groups nest but never cross braces. On success returns a cursor over
    /// the contents and moves past the closer; otherwise returns the span of
    /// the unclosed opener and leaves the cursor unchanged.
    pub(crate) fn group(
        &mut self,
        open: TokenKind,
        close: TokenKind,
    ) -> Result<Cursor<'t, 'src>, Span> {
        let opener = self.span();
        if !self.at(open) {
            return Err(opener);
        }
        let mut depth = 0usize;
        let mut index = self.pos;
        while index < self.end {
            let kind = self.tokens[index].kind;
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
                if depth == 0 {
                    let inner = Cursor {
                        pos: self.pos + 1,
                        end: index,
                        ..*self
                    };
                    self.pos = index + 1;
                    return Ok(inner);
                }
            } else if matches!(kind, TokenKind::LBrace | TokenKind::RBrace) {
                break;
            }
            index += 1;
        }
        Err(opener)
    }

    /// Skip the current declaration: everything up to and including the next
    /// `{ ... }` block, or up to `stop` (consumed) if that comes first.
    pub(crate) fn skip_declaration(&mut self, stop: Option<TokenKind>) {
        while let Some(token) = self.peek() {
            if token.kind == TokenKind::LBrace {
                self.block();
                return;
            }
            self.pos += 1;
            if Some(token.kind) == stop {
                return;
            }
        }
    }

    /// Skip to the first token of kind `kind` at this nesting level without
    /// consuming it. Nested blocks are skipped whole.
    pub(crate) fn skip_until(&mut self, kind: TokenKind) {
        while let Some(token) = self.peek() {
            if token.kind == kind {
                return;
            }
            if token.kind == TokenKind::LBrace {
                self.block();
            } else {
                self.pos += 1;
            }
        }
    }

    /// Kind of the first token among `kinds` at this nesting level.
    pub(crate) fn find_first(&self, kinds: &[TokenKind]) -> Option<TokenKind> {
        let mut lookahead = *self;
        while let Some(token) = lookahead.peek() {
            if kinds.contains(&token.kind) {
                return Some(token.kind);
            }
            if token.kind == TokenKind::LBrace {
                lookahead.block();
            } else {
                lookahead.pos += 1;
            }
        }
        None
    }
}
