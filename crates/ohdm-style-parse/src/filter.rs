//! Filter expressions used inside CSS `[...]` selectors.
//!
//! ```text
//! or  := and ('OR' and)*
//! and := not ('AND' not)*
//! not := 'NOT' not | '(' or ')' | cmp
//! cmp := 'INCLUDE' | 'EXCLUDE' | ident op literal | ident 'LIKE' string
//! ```

use ohdm_style_model::{CompareOp, Filter, Literal};
use ohdm_style_tokenizer::TokenKind;

use crate::{MAX_NESTING_DEPTH, ParseError};
use crate::cursor::{Cursor, TokenStream};
use crate::diagnostic::{Diagnostics, SyntaxErrorKind};

/// Parse a standalone filter expression such as `pop > 3 AND name = 'x'`.
pub fn parse_filter(source: &str) -> Result<Filter, ParseError> {
    let mut diagnostics = Diagnostics::new(source);
    let stream = TokenStream::lex(source, &mut diagnostics);
    let mut cursor = stream.cursor();
    let filter = filter_expression(&mut cursor, &mut diagnostics);
    diagnostics.finish(filter.unwrap_or_default())
}

/// Parse a whole filter expression filling `cursor`.
pub(crate) fn filter_expression(
    cursor: &mut Cursor<'_, '_>,
    diagnostics: &mut Diagnostics<'_>,
) -> Option<Filter> {
    nested_expression(cursor, diagnostics, 0)
}

fn nested_expression(
    cursor: &mut Cursor<'_, '_>,
    diagnostics: &mut Diagnostics<'_>,
    depth: usize,
) -> Option<Filter> {
    let filter = or_expr(cursor, diagnostics, depth)?;
    if let Some(token) = cursor.peek() {
        diagnostics.unexpected("`AND`, `OR` or end of filter", Some(token), token.span);
        return None;
    }
    Some(filter)
}

fn or_expr(
    cursor: &mut Cursor<'_, '_>,
    diagnostics: &mut Diagnostics<'_>,
    depth: usize,
) -> Option<Filter> {
    let mut branches = vec![and_expr(cursor, diagnostics, depth)?];
    while cursor.peek().is_some_and(|t| t.is_keyword("OR")) {
        cursor.bump();
        branches.push(and_expr(cursor, diagnostics, depth)?);
    }
    Some(match branches.len() {
        1 => branches.remove(0),
        _ => Filter::Or(branches),
    })
}

fn and_expr(
    cursor: &mut Cursor<'_, '_>,
    diagnostics: &mut Diagnostics<'_>,
    depth: usize,
) -> Option<Filter> {
    let mut filter = not_expr(cursor, diagnostics, depth)?;
    while cursor.peek().is_some_and(|t| t.is_keyword("AND")) {
        cursor.bump();
        filter = filter.and(not_expr(cursor, diagnostics, depth)?);
    }
    Some(filter)
}

fn not_expr(
    cursor: &mut Cursor<'_, '_>,
    diagnostics: &mut Diagnostics<'_>,
    depth: usize,
) -> Option<Filter> {
    let nests = cursor.at(TokenKind::LParen) || cursor.peek().is_some_and(|t| t.is_keyword("NOT"));
    if nests && depth >= MAX_NESTING_DEPTH {
        diagnostics.error(
            SyntaxErrorKind::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
            },
            cursor.span(),
        );
        return None;
    }
    if cursor.peek().is_some_and(|t| t.is_keyword("NOT")) {
        cursor.bump();
        return Some(not_expr(cursor, diagnostics, depth + 1)?.negate());
    }
    if cursor.at(TokenKind::LParen) {
        return match cursor.group(TokenKind::LParen, TokenKind::RParen) {
            Ok(mut inner) => nested_expression(&mut inner, diagnostics, depth + 1),
            Err(opener) => {
                diagnostics.error(SyntaxErrorKind::UnclosedGroup, opener);
                None
            }
        };
    }
    comparison(cursor, diagnostics)
}

fn comparison(cursor: &mut Cursor<'_, '_>, diagnostics: &mut Diagnostics<'_>) -> Option<Filter> {
    let Some(property) = cursor.eat(TokenKind::Ident) else {
        diagnostics.unexpected("attribute name", cursor.peek(), cursor.span());
        return None;
    };
    if property.is_keyword("INCLUDE") {
        return Some(Filter::Include);
    }
    if property.is_keyword("EXCLUDE") {
        return Some(Filter::Include.negate());
    }

    let op = compare_op(cursor, diagnostics)?;
    let value = literal(cursor, diagnostics, op)?;
    Some(Filter::compare(property.text, op, value))
}

fn compare_op(cursor: &mut Cursor<'_, '_>, diagnostics: &mut Diagnostics<'_>) -> Option<CompareOp> {
    let Some(token) = cursor.peek() else {
        diagnostics.unexpected("comparison operator", None, cursor.span());
        return None;
    };
    cursor.bump();
    let followed_by = |cursor: &mut Cursor<'_, '_>, kind: TokenKind| {
        if cursor.at(kind) && cursor.next_is_adjacent() {
            cursor.bump();
            true
        } else {
            false
        }
    };
    let op = match token.kind {
        TokenKind::Eq => CompareOp::Eq,
        TokenKind::Lt if followed_by(cursor, TokenKind::Eq) => CompareOp::LtEq,
        TokenKind::Lt if followed_by(cursor, TokenKind::Gt) => CompareOp::NotEq,
        TokenKind::Lt => CompareOp::Lt,
        TokenKind::Gt if followed_by(cursor, TokenKind::Eq) => CompareOp::GtEq,
        TokenKind::Gt => CompareOp::Gt,
        TokenKind::Bang if followed_by(cursor, TokenKind::Eq) => CompareOp::NotEq,
        TokenKind::Ident if token.is_keyword("LIKE") => CompareOp::Like,
        _ => {
            diagnostics.unexpected("comparison operator", Some(token), token.span);
            return None;
        }
    };
    Some(op)
}

fn literal(
    cursor: &mut Cursor<'_, '_>,
    diagnostics: &mut Diagnostics<'_>,
    op: CompareOp,
) -> Option<Literal> {
    let expected = if op == CompareOp::Like {
        "quoted pattern"
    } else {
        "literal value"
    };
    let Some(token) = cursor.peek() else {
        diagnostics.unexpected(expected, None, cursor.span());
        return None;
    };

    match token.kind {
        TokenKind::QuotedString => {
            cursor.bump();
            Some(Literal::Text(token.unquoted()))
        }
        _ if op == CompareOp::Like => {
            diagnostics.unexpected(expected, Some(token), token.span);
            None
        }
        TokenKind::Ident => {
            cursor.bump();
            Some(Literal::Text(token.text.to_string()))
        }
        TokenKind::Number => {
            cursor.bump();
            number(token.text, token.span, diagnostics).map(Literal::Number)
        }
        TokenKind::Minus | TokenKind::Plus => {
            cursor.bump();
            match cursor.peek() {
                Some(digits) if digits.kind == TokenKind::Number && cursor.next_is_adjacent() => {
                    cursor.bump();
                    let value = number(digits.text, digits.span, diagnostics)?;
                    Some(Literal::Number(if token.kind == TokenKind::Minus {
                        -value
                    } else {
                        value
                    }))
                }
                other => {
                    diagnostics.unexpected("number", other, cursor.span());
                    None
                }
            }
        }
        _ => {
            diagnostics.unexpected(expected, Some(token), token.span);
            None
        }
    }
}

/// Parse the text of a `Number` token.
pub(crate) fn number(
    text: &str,
    span: ohdm_style_tokenizer::Span,
    diagnostics: &mut Diagnostics<'_>,
) -> Option<f64> {
    match text.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            diagnostics.error(SyntaxErrorKind::InvalidToken(text.to_string()), span);
            None
        }
    }
}
