//! Syntax errors and their rendering.

use std::fmt;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use ohdm_style_model::ZoomError;
use ohdm_style_tokenizer::{Span, Token, TokenKind};

fn ariadne_config() -> Config {
    if std::env::var("NO_COLOR").is_ok() {
        Config::default().with_color(false)
    } else {
        Config::default()
    }
}

/// What went wrong at a syntax error location.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxErrorKind {
    /// A token other than the expected one.
    Expected {
        /// What the grammar allows here.
        expected: &'static str,
        /// What was found instead.
        found: String,
    },
    /// Character sequence the tokenizer does not recognize.
    InvalidToken(String),
    /// Quoted string without closing quote.
    UnterminatedString,
    /// `/*` without `*/`.
    UnterminatedComment,
    /// `{` without matching `}`.
    UnclosedBlock,
    /// `[` or `(` without its closer.
    UnclosedGroup,
    /// `}` without matching `{`.
    UnmatchedBrace,
    /// Identifier outside `[A-Za-z][A-Za-z0-9_-]*`.
    InvalidIdentifier(String),
    /// Zoom token with a level outside 0-19 or malformed digits.
    InvalidZoom(ZoomError),
    /// Feature name declared twice (names compare case-insensitively).
    DuplicateFeature {
        /// The repeated name.
        name: String,
        /// Where the name was first declared.
        original: Span,
    },
    /// Style group name declared twice.
    DuplicateStyleGroup {
        /// The repeated name.
        name: String,
        /// Where the name was first declared.
        original: Span,
    },
    /// Feature declaration after the first style group.
    FeatureAfterStyleGroup {
        /// The first style group.
        first_group: Span,
    },
    /// Pseudo-class other than `mark`, `stroke`, `fill`, `symbol`, `shield`.
    UnknownPseudoClass(String),
    /// `#` value that is not a 3 or 6 digit hex color.
    InvalidColor(String),
    /// Blocks, filter groups or function values nested past the limit.
    NestingTooDeep {
        /// Deepest nesting accepted.
        limit: usize,
    },
}

impl SyntaxErrorKind {
    /// Error for an unexpected token, or for running out of tokens.
    pub(crate) fn unexpected(expected: &'static str, found: Option<Token<'_>>) -> Self {
        match found {
            None => SyntaxErrorKind::Expected {
                expected,
                found: "end of block".to_string(),
            },
            Some(token) if token.kind == TokenKind::Error => {
                if token.text.starts_with("/*") {
                    SyntaxErrorKind::UnterminatedComment
                } else if token.text.starts_with(['\'', '"']) {
                    SyntaxErrorKind::UnterminatedString
                } else {
                    SyntaxErrorKind::InvalidToken(token.text.to_string())
                }
            }
            Some(token) => SyntaxErrorKind::Expected {
                expected,
                found: match token.kind {
                    TokenKind::Ident | TokenKind::Number | TokenKind::Hash => {
                        format!("`{}`", token.text)
                    }
                    kind => kind.describe().to_string(),
                },
            },
        }
    }
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxErrorKind::Expected { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            SyntaxErrorKind::InvalidToken(text) => write!(f, "invalid token `{text}`"),
            SyntaxErrorKind::UnterminatedString => write!(f, "unterminated string"),
            SyntaxErrorKind::UnterminatedComment => write!(f, "unterminated comment"),
            SyntaxErrorKind::UnclosedBlock => write!(f, "unclosed block"),
            SyntaxErrorKind::UnclosedGroup => write!(f, "unclosed bracket"),
            SyntaxErrorKind::UnmatchedBrace => write!(f, "unmatched `}}`"),
            SyntaxErrorKind::InvalidIdentifier(name) => write!(f, "invalid identifier `{name}`"),
            SyntaxErrorKind::InvalidZoom(e) => write!(f, "{e}"),
            SyntaxErrorKind::DuplicateFeature { name, .. } => {
                write!(f, "duplicate feature `{name}`")
            }
            SyntaxErrorKind::DuplicateStyleGroup { name, .. } => {
                write!(f, "duplicate style group `{name}`")
            }
            SyntaxErrorKind::FeatureAfterStyleGroup { .. } => {
                write!(f, "feature declared after a style group")
            }
            SyntaxErrorKind::UnknownPseudoClass(name) => write!(f, "unknown pseudo-class `{name}`"),
            SyntaxErrorKind::InvalidColor(text) => write!(f, "invalid color `{text}`"),
            SyntaxErrorKind::NestingTooDeep { limit } => {
                write!(f, "nesting deeper than {limit} levels")
            }
        }
    }
}

/// A syntax error with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    /// The kind of error.
    pub kind: SyntaxErrorKind,
    /// Source location.
    pub span: Span,
    /// 1-based line of the span start.
    pub line: usize,
    /// 1-based column (in characters) of the span start.
    pub column: usize,
}

impl SyntaxError {
    /// Create a syntax error, computing line and column from `source`.
    pub fn new(kind: SyntaxErrorKind, span: Span, source: &str) -> Self {
        let (line, column) = span.line_col(source);
        Self {
            kind,
            span,
            line,
            column,
        }
    }

    /// Render this error with ariadne.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    /// Write the error report to a writer.
    pub fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, writer: W) {
        let report = self.build_report(filename).with_config(ariadne_config());
        let _ = report
            .finish()
            .write((filename, Source::from(source)), writer);
    }

    fn build_report<'a>(
        &self,
        filename: &'a str,
    ) -> ariadne::ReportBuilder<'static, (&'a str, std::ops::Range<usize>)> {
        let range: std::ops::Range<usize> = self.span.into();
        let message = self.kind.to_string();

        match &self.kind {
            SyntaxErrorKind::DuplicateFeature { original, .. }
            | SyntaxErrorKind::DuplicateStyleGroup { original, .. } => {
                Report::build(ReportKind::Error, (filename, range.clone()))
                    .with_message(message)
                    .with_label(
                        Label::new((filename, std::ops::Range::<usize>::from(*original)))
                            .with_message("first declared here")
                            .with_color(Color::Blue),
                    )
                    .with_label(
                        Label::new((filename, range))
                            .with_message("declared again here")
                            .with_color(Color::Red),
                    )
                    .with_help("feature and style group names must be unique")
            }

            SyntaxErrorKind::FeatureAfterStyleGroup { first_group } => {
                Report::build(ReportKind::Error, (filename, range.clone()))
                    .with_message(message)
                    .with_label(
                        Label::new((filename, std::ops::Range::<usize>::from(*first_group)))
                            .with_message("first style group")
                            .with_color(Color::Blue),
                    )
                    .with_label(
                        Label::new((filename, range))
                            .with_message("feature declared here")
                            .with_color(Color::Red),
                    )
                    .with_help("declare all features before the first style group")
            }

            SyntaxErrorKind::UnclosedBlock => Report::build(ReportKind::Error, (filename, range.clone()))
                .with_message(message)
                .with_label(
                    Label::new((filename, range))
                        .with_message("block opened here")
                        .with_color(Color::Red),
                )
                .with_help("add a closing '}'"),

            SyntaxErrorKind::InvalidIdentifier(_) => Report::build(ReportKind::Error, (filename, range.clone()))
                .with_message(message)
                .with_label(
                    Label::new((filename, range))
                        .with_message("invalid name")
                        .with_color(Color::Red),
                )
                .with_help("names must match [A-Za-z][A-Za-z0-9_-]*"),

            SyntaxErrorKind::InvalidZoom(_) => Report::build(ReportKind::Error, (filename, range.clone()))
                .with_message(message)
                .with_label(
                    Label::new((filename, range))
                        .with_message("invalid zoom")
                        .with_color(Color::Red),
                )
                .with_help("zoom is `N-M`, `>N`, `<N` or `default` with levels 0-19"),

            SyntaxErrorKind::UnknownPseudoClass(_) => Report::build(ReportKind::Error, (filename, range.clone()))
                .with_message(message)
                .with_label(
                    Label::new((filename, range))
                        .with_message("unknown pseudo-class")
                        .with_color(Color::Red),
                )
                .with_help("pseudo-classes are :mark, :stroke, :fill, :symbol and :shield"),

            SyntaxErrorKind::NestingTooDeep { .. } => Report::build(ReportKind::Error, (filename, range.clone()))
                .with_message(message)
                .with_label(
                    Label::new((filename, range))
                        .with_message("nested too deeply")
                        .with_color(Color::Red),
                )
                .with_help("flatten the nested rules or expressions"),

            _ => Report::build(ReportKind::Error, (filename, range.clone()))
                .with_message(message)
                .with_label(
                    Label::new((filename, range))
                        .with_message("here")
                        .with_color(Color::Red),
                ),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {}, column {})", self.kind, self.line, self.column)
    }
}

impl std::error::Error for SyntaxError {}

/// Every syntax error found while parsing one source text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Errors in source order. Never empty.
    pub errors: Vec<SyntaxError>,
}

impl ParseError {
    /// Render all errors with ariadne.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    /// Write a report for every error to a writer.
    pub fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, mut writer: W) {
        for error in &self.errors {
            error.write_report(filename, source, &mut writer);
        }
    }

    /// `(line, column)` of every error.
    pub fn positions(&self) -> Vec<(usize, usize)> {
        self.errors.iter().map(|e| (e.line, e.column)).collect()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [single] => write!(f, "{single}"),
            errors => {
                write!(f, "{} syntax errors", errors.len())?;
                for error in errors {
                    write!(f, "\n  {error}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Collects syntax errors during one parse.
pub(crate) struct Diagnostics<'src> {
    source: &'src str,
    errors: Vec<SyntaxError>,
}

impl<'src> Diagnostics<'src> {
    pub(crate) fn new(source: &'src str) -> Self {
        Self {
            source,
            errors: Vec::new(),
        }
    }

    pub(crate) fn source(&self) -> &'src str {
        self.source
    }

    pub(crate) fn error(&mut self, kind: SyntaxErrorKind, span: Span) {
        tracing::debug!("syntax error at {:?}: {}", span, kind);
        self.errors.push(SyntaxError::new(kind, span, self.source));
    }

    /// Record that `expected` was wanted where `found` (or the end) was.
    pub(crate) fn unexpected(&mut self, expected: &'static str, found: Option<Token<'_>>, span: Span) {
        self.error(SyntaxErrorKind::unexpected(expected, found), span);
    }

    pub(crate) fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// `Err` with every collected error in source order, or `Ok(value)`.
    pub(crate) fn finish<T>(mut self, value: T) -> Result<T, ParseError> {
        if self.errors.is_empty() {
            return Ok(value);
        }
        self.errors.sort_by_key(|e| e.span.start);
        Err(ParseError {
            errors: self.errors,
        })
    }
}
