//! CSS-like rule blocks of detailed style declarations.
//!
//! ```text
//! stylesheet := directive* cssRule+
//! directive  := '@' ident value ';'
//! cssRule    := selector '{' contents '}'
//! contents   := (cssRule | property) (';' (cssRule | property))* ';'?
//! selector   := compound (',' compound)*
//! compound   := basic+
//! basic      := '*' | '[' scaleFilter ']' | '[' filter ']' | '#' id
//!             | ':' pseudoClass | typename
//! property   := ident ':' value (',' value)*
//! ```
//!
//! Nested rules are flattened: a child's selector is conjoined with its
//! parent's and the child inherits the parent's properties. A nested rule
//! whose selector is only pseudo-classes (`:mark { fill: #f00 }`) configures
//! the parent's symbolizers instead of producing a rule of its own.

use ohdm_style_model::{
    Filter, Property, PropertyValue, Rule, ScaleRange, Symbolizer, SymbolizerKind,
};
use ohdm_style_tokenizer::{Span, TokenKind};
use tracing::debug;

use crate::{MAX_NESTING_DEPTH, ParseError};
use crate::cursor::{Cursor, TokenStream};
use crate::diagnostic::{Diagnostics, SyntaxErrorKind};
use crate::filter::{filter_expression, number};

/// Parse a standalone style sheet such as `* { stroke: #000; }`.
pub fn parse_stylesheet(source: &str) -> Result<Vec<Rule>, ParseError> {
    let mut diagnostics = Diagnostics::new(source);
    let stream = TokenStream::lex(source, &mut diagnostics);
    let mut cursor = stream.cursor();
    let rules = StyleSheetParser::new(&mut diagnostics).stylesheet(&mut cursor);
    diagnostics.finish(rules.unwrap_or_default())
}

/// One comma separated branch of a selector.
#[derive(Debug, Clone)]
struct Compound {
    filter: Filter,
    scale: ScaleRange,
    /// Symbolizer kinds named by pseudo-classes.
    pseudo: Vec<SymbolizerKind>,
    /// Whether anything other than pseudo-classes was written.
    has_subject: bool,
}

impl Compound {
    fn root() -> Self {
        Self {
            filter: Filter::Include,
            scale: ScaleRange::UNBOUNDED,
            pseudo: Vec::new(),
            has_subject: true,
        }
    }

    fn is_pure_pseudo(&self) -> bool {
        !self.has_subject && !self.pseudo.is_empty()
    }

    fn within(&self, parent: &Compound) -> Compound {
        Compound {
            filter: parent.filter.clone().and(self.filter.clone()),
            scale: parent.scale.intersect(self.scale),
            pseudo: self.pseudo.clone(),
            has_subject: true,
        }
    }
}

/// What a nested rule inherits from its enclosing rules.
#[derive(Debug, Clone)]
struct Scope {
    selectors: Vec<Compound>,
    properties: Vec<Property>,
    pseudo: Vec<(SymbolizerKind, Property)>,
    /// Rule blocks enclosing this scope.
    depth: usize,
}

pub(crate) struct StyleSheetParser<'d, 'src> {
    diagnostics: &'d mut Diagnostics<'src>,
    /// Function values enclosing the value being parsed.
    value_depth: usize,
}

impl<'d, 'src> StyleSheetParser<'d, 'src> {
    pub(crate) fn new(diagnostics: &'d mut Diagnostics<'src>) -> Self {
        Self {
            diagnostics,
            value_depth: 0,
        }
    }

    fn too_deep(&mut self, span: Span) {
        self.diagnostics.error(
            SyntaxErrorKind::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
            },
            span,
        );
    }

    /// Parse a whole style sheet filling `cursor`. Returns `None` if any
    /// error was reported.
    pub(crate) fn stylesheet(&mut self, cursor: &mut Cursor<'_, 'src>) -> Option<Vec<Rule>> {
        let errors_before = self.diagnostics.error_count();

        while cursor.at(TokenKind::At) {
            self.directive(cursor);
        }

        let root = Scope {
            selectors: vec![Compound::root()],
            properties: Vec::new(),
            pseudo: Vec::new(),
            depth: 0,
        };
        let mut rules = Vec::new();
        let mut declared = 0;
        while !cursor.at_end() {
            declared += 1;
            if let Some((selectors, body)) = self.rule_head(cursor) {
                self.rule_body(&selectors, body, &root, &mut rules);
            }
        }
        if declared == 0 {
            self.diagnostics
                .unexpected("style rule `selector { ... }`", None, cursor.span());
        }

        (self.diagnostics.error_count() == errors_before).then_some(rules)
    }

    /// `@name value;`. Directives are accepted and ignored.
    fn directive(&mut self, cursor: &mut Cursor<'_, 'src>) {
        cursor.bump();
        let name = match cursor.peek() {
            Some(token) if token.kind == TokenKind::Ident && cursor.next_is_adjacent() => {
                cursor.bump();
                token.text
            }
            other => {
                self.diagnostics
                    .unexpected("directive name", other, cursor.span());
                cursor.skip_declaration(Some(TokenKind::Semicolon));
                return;
            }
        };
        cursor.skip_until(TokenKind::Semicolon);
        if cursor.eat(TokenKind::Semicolon).is_none() {
            self.diagnostics
                .unexpected("`;` after directive", None, cursor.span());
        }
        debug!("Ignoring style sheet directive @{}", name);
    }

    /// Selector and block of a rule. On error, reports it and skips past the
    /// rule's block.
    fn rule_head<'t>(
        &mut self,
        cursor: &mut Cursor<'t, 'src>,
    ) -> Option<(Vec<Compound>, Cursor<'t, 'src>)> {
        let Some(selectors) = self.selector(cursor) else {
            cursor.skip_declaration(None);
            return None;
        };
        match cursor.block() {
            Some(body) => Some((selectors, body)),
            None => {
                self.diagnostics
                    .unexpected("`{` after selector", cursor.peek(), cursor.span());
                cursor.skip_declaration(None);
                None
            }
        }
    }

    fn rule_body(
        &mut self,
        selectors: &[Compound],
        mut body: Cursor<'_, 'src>,
        parent: &Scope,
        out: &mut Vec<Rule>,
    ) {
        let mut scope = Scope {
            selectors: parent
                .selectors
                .iter()
                .flat_map(|p| selectors.iter().map(move |c| c.within(p)))
                .collect(),
            properties: parent.properties.clone(),
            pseudo: parent.pseudo.clone(),
            depth: parent.depth + 1,
        };
        let mut own_properties = 0;
        let mut children = Vec::new();

        while !body.at_end() {
            if body.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            if body.find_first(&[TokenKind::Semicolon, TokenKind::LBrace]) == Some(TokenKind::LBrace)
            {
                let selector_span = body.span();
                let Some((child, child_body)) = self.rule_head(&mut body) else {
                    continue;
                };
                if child.iter().all(Compound::is_pure_pseudo) {
                    let kinds: Vec<SymbolizerKind> =
                        child.iter().flat_map(|c| c.pseudo.iter().copied()).collect();
                    self.pseudo_body(&kinds, child_body, &mut scope.pseudo);
                } else if scope.depth >= MAX_NESTING_DEPTH {
                    self.too_deep(selector_span);
                } else {
                    children.push((child, child_body));
                }
                continue;
            }
            match self.property(&mut body) {
                Some(property) => {
                    set_property(&mut scope.properties, property);
                    own_properties += 1;
                }
                None => body.skip_until(TokenKind::Semicolon),
            }
        }

        if own_properties > 0 {
            emit_rules(&scope, out);
        }
        for (child, child_body) in children {
            self.rule_body(&child, child_body, &scope, out);
        }
    }

    /// Properties of a pseudo-class block, attached to the given kinds.
    fn pseudo_body(
        &mut self,
        kinds: &[SymbolizerKind],
        mut body: Cursor<'_, 'src>,
        pseudo: &mut Vec<(SymbolizerKind, Property)>,
    ) {
        while !body.at_end() {
            if body.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            match self.property(&mut body) {
                Some(property) => {
                    for kind in kinds {
                        pseudo.retain(|(k, p)| !(k == kind && p.name == property.name));
                        pseudo.push((*kind, property.clone()));
                    }
                }
                None => body.skip_declaration(Some(TokenKind::Semicolon)),
            }
        }
    }

    fn selector(&mut self, cursor: &mut Cursor<'_, 'src>) -> Option<Vec<Compound>> {
        let mut compounds = vec![self.compound(cursor)?];
        while cursor.eat(TokenKind::Comma).is_some() {
            compounds.push(self.compound(cursor)?);
        }
        Some(compounds)
    }

    fn compound(&mut self, cursor: &mut Cursor<'_, 'src>) -> Option<Compound> {
        let mut compound = Compound {
            has_subject: false,
            ..Compound::root()
        };
        let mut items = 0;

        loop {
            let Some(token) = cursor.peek() else { break };
            match token.kind {
                TokenKind::LBrace | TokenKind::Comma => break,
                TokenKind::Star | TokenKind::Hash | TokenKind::Ident => {
                    // Universal, id and type selectors do not narrow the rule.
                    cursor.bump();
                    compound.has_subject = true;
                }
                TokenKind::LBracket => {
                    let mut inner = match cursor.group(TokenKind::LBracket, TokenKind::RBracket) {
                        Ok(inner) => inner,
                        Err(opener) => {
                            self.diagnostics.error(SyntaxErrorKind::UnclosedGroup, opener);
                            return None;
                        }
                    };
                    compound.has_subject = true;
                    if inner.at(TokenKind::At) {
                        compound.scale = compound.scale.intersect(self.scale_filter(&mut inner)?);
                    } else {
                        let filter = filter_expression(&mut inner, self.diagnostics)?;
                        compound.filter = compound.filter.and(filter);
                    }
                }
                TokenKind::Colon => {
                    cursor.bump();
                    compound.pseudo.push(self.pseudo_class(cursor)?);
                }
                _ => {
                    self.diagnostics
                        .unexpected("selector", Some(token), token.span);
                    return None;
                }
            }
            items += 1;
        }

        if items == 0 {
            self.diagnostics.unexpected("selector", cursor.peek(), cursor.span());
            return None;
        }
        Some(compound)
    }

    /// `mark`, `stroke`, `fill`, `symbol`, `shield`, optionally as `nth-<name>(n)`.
    fn pseudo_class(&mut self, cursor: &mut Cursor<'_, 'src>) -> Option<SymbolizerKind> {
        let name = match cursor.peek() {
            Some(token) if token.kind == TokenKind::Ident && cursor.next_is_adjacent() => {
                cursor.bump();
                token
            }
            other => {
                self.diagnostics
                    .unexpected("pseudo-class name", other, cursor.span());
                return None;
            }
        };

        let base = match name.text.strip_prefix("nth-") {
            Some(base) => {
                let mut args = match cursor.group(TokenKind::LParen, TokenKind::RParen) {
                    Ok(args) => args,
                    Err(span) => {
                        self.diagnostics
                            .unexpected("`(` index `)`", cursor.peek(), span);
                        return None;
                    }
                };
                if args.eat(TokenKind::Number).is_none() || !args.at_end() {
                    self.diagnostics
                        .unexpected("pseudo-class index", args.peek(), args.span());
                    return None;
                }
                base
            }
            None => name.text,
        };

        match base {
            "mark" | "symbol" => Some(SymbolizerKind::Point),
            "stroke" => Some(SymbolizerKind::Line),
            "fill" => Some(SymbolizerKind::Polygon),
            "shield" => Some(SymbolizerKind::Text),
            _ => {
                self.diagnostics.error(
                    SyntaxErrorKind::UnknownPseudoClass(name.text.to_string()),
                    name.span,
                );
                None
            }
        }
    }

    /// `@scale > 10k`, `@sd <= 1M` inside brackets.
    fn scale_filter(&mut self, inner: &mut Cursor<'_, 'src>) -> Option<ScaleRange> {
        inner.bump();
        match inner.peek() {
            Some(token)
                if inner.next_is_adjacent()
                    && (token.is_ident("scale") || token.is_ident("sd")) =>
            {
                inner.bump();
            }
            other => {
                self.diagnostics
                    .unexpected("`@scale` or `@sd`", other, inner.span());
                return None;
            }
        }

        let op = match inner.bump() {
            Some(token) if matches!(token.kind, TokenKind::Lt | TokenKind::Gt) => {
                if inner.at(TokenKind::Eq) && inner.next_is_adjacent() {
                    inner.bump();
                }
                token.kind
            }
            other => {
                self.diagnostics
                    .unexpected("`<`, `<=`, `>` or `>=`", other, inner.prev_span());
                return None;
            }
        };

        let Some(digits) = inner.eat(TokenKind::Number) else {
            self.diagnostics
                .unexpected("scale denominator", inner.peek(), inner.span());
            return None;
        };
        let mut value = number(digits.text, digits.span, self.diagnostics)?;
        if inner.next_is_adjacent()
            && let Some(unit) = inner.eat(TokenKind::Ident)
        {
            value *= match unit.text {
                "k" => 1e3,
                "M" => 1e6,
                "G" => 1e9,
                _ => {
                    self.diagnostics.unexpected(
                        "scale suffix `k`, `M` or `G`",
                        Some(unit),
                        unit.span,
                    );
                    return None;
                }
            };
        }
        if let Some(token) = inner.peek() {
            self.diagnostics.unexpected("`]`", Some(token), token.span);
            return None;
        }

        Some(if op == TokenKind::Gt {
            ScaleRange::new(value, f64::INFINITY)
        } else {
            ScaleRange::new(0.0, value)
        })
    }

    /// `name: value, value`
    fn property(&mut self, cursor: &mut Cursor<'_, 'src>) -> Option<Property> {
        let vendor = cursor.eat(TokenKind::Minus).is_some();
        let name = match cursor.peek() {
            Some(token) if token.kind == TokenKind::Ident && (!vendor || cursor.next_is_adjacent()) => {
                cursor.bump();
                if vendor {
                    format!("-{}", token.text)
                } else {
                    token.text.to_string()
                }
            }
            other => {
                self.diagnostics
                    .unexpected("property name", other, cursor.span());
                return None;
            }
        };
        if cursor.eat(TokenKind::Colon).is_none() {
            self.diagnostics
                .unexpected("`:` after property name", cursor.peek(), cursor.span());
            return None;
        }
        let values = self.value_list(cursor, TokenKind::Semicolon)?;
        Some(Property::new(name, values))
    }

    /// Comma separated values up to `stop` or the end of the range.
    fn value_list(
        &mut self,
        cursor: &mut Cursor<'_, 'src>,
        stop: TokenKind,
    ) -> Option<Vec<PropertyValue>> {
        let mut values = Vec::new();
        loop {
            let mut parts = Vec::new();
            while !cursor.at_end() && !cursor.at(TokenKind::Comma) && !cursor.at(stop) {
                parts.push(self.simple_value(cursor)?);
            }
            match parts.len() {
                0 => {
                    self.diagnostics
                        .unexpected("property value", cursor.peek(), cursor.span());
                    return None;
                }
                1 => values.extend(parts),
                _ => values.push(PropertyValue::Multi(parts)),
            }
            if cursor.eat(TokenKind::Comma).is_none() {
                return Some(values);
            }
        }
    }

    fn simple_value(&mut self, cursor: &mut Cursor<'_, 'src>) -> Option<PropertyValue> {
        if cursor.at(TokenKind::LBracket) {
            return match cursor.group(TokenKind::LBracket, TokenKind::RBracket) {
                Ok(expr) => {
                    let text = expr.remaining_text(self.diagnostics.source()).trim();
                    Some(PropertyValue::Expression(text.to_string()))
                }
                Err(opener) => {
                    self.diagnostics.error(SyntaxErrorKind::UnclosedGroup, opener);
                    None
                }
            };
        }
        let token = cursor.bump()?;
        match token.kind {
            TokenKind::Ident if cursor.at(TokenKind::LParen) && cursor.next_is_adjacent() => {
                let mut args = match cursor.group(TokenKind::LParen, TokenKind::RParen) {
                    Ok(args) => args,
                    Err(opener) => {
                        self.diagnostics.error(SyntaxErrorKind::UnclosedGroup, opener);
                        return None;
                    }
                };
                if token.text == "url" {
                    let raw = args.remaining_text(self.diagnostics.source()).trim();
                    let url = raw.trim_matches(|c| c == '\'' || c == '"');
                    return Some(PropertyValue::Url(url.to_string()));
                }
                if self.value_depth >= MAX_NESTING_DEPTH {
                    self.too_deep(token.span);
                    return None;
                }
                let args = if args.at_end() {
                    Vec::new()
                } else {
                    self.value_depth += 1;
                    let args = self.value_list(&mut args, TokenKind::Eof);
                    self.value_depth -= 1;
                    args?
                };
                Some(PropertyValue::function(token.text, args))
            }
            TokenKind::Ident if token.text == "none" => Some(PropertyValue::None),
            TokenKind::Ident => Some(PropertyValue::ident(token.text)),
            TokenKind::QuotedString => Some(PropertyValue::Text(token.unquoted())),
            TokenKind::Hash => {
                let digits = &token.text[1..];
                if matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit()) {
                    Some(PropertyValue::color(token.text))
                } else {
                    self.diagnostics
                        .error(SyntaxErrorKind::InvalidColor(token.text.to_string()), token.span);
                    None
                }
            }
            TokenKind::Number => self.measure(cursor, token.text, token.span, false),
            TokenKind::Minus | TokenKind::Plus
                if cursor.at(TokenKind::Number) && cursor.next_is_adjacent() =>
            {
                let digits = cursor.bump()?;
                self.measure(cursor, digits.text, digits.span, token.kind == TokenKind::Minus)
            }
            TokenKind::At => match cursor.peek() {
                Some(name) if name.kind == TokenKind::Ident && cursor.next_is_adjacent() => {
                    cursor.bump();
                    Some(PropertyValue::Variable(name.text.to_string()))
                }
                other => {
                    self.diagnostics
                        .unexpected("variable name", other, cursor.span());
                    None
                }
            },
            _ => {
                self.diagnostics
                    .unexpected("property value", Some(token), token.span);
                None
            }
        }
    }

    /// Number with an optional unit directly attached: `2`, `10px`, `50%`.
    fn measure(
        &mut self,
        cursor: &mut Cursor<'_, 'src>,
        digits: &str,
        span: Span,
        negative: bool,
    ) -> Option<PropertyValue> {
        let value = number(digits, span, self.diagnostics)?;
        let value = if negative { -value } else { value };
        let unit = if cursor.next_is_adjacent() {
            match cursor.peek() {
                Some(unit) if unit.kind == TokenKind::Ident => {
                    cursor.bump();
                    Some(unit.text.to_string())
                }
                Some(unit) if unit.kind == TokenKind::Percent => {
                    cursor.bump();
                    Some("%".to_string())
                }
                _ => None,
            }
        } else {
            None
        };
        Some(PropertyValue::Measure { value, unit })
    }
}

/// Set `property`, replacing an earlier one of the same name.
fn set_property(properties: &mut Vec<Property>, property: Property) {
    match properties.iter_mut().find(|p| p.name == property.name) {
        Some(existing) => *existing = property,
        None => properties.push(property),
    }
}

/// Rules for a scope with properties. Branches sharing a scale range become
/// one rule with a disjunctive filter; otherwise each branch is its own rule.
fn emit_rules(scope: &Scope, out: &mut Vec<Rule>) {
    let symbolizers = symbolizers(&scope.properties, &scope.pseudo);
    let Some(first) = scope.selectors.first() else {
        return;
    };
    if scope.selectors.iter().all(|s| s.scale == first.scale) {
        let filter = Filter::any(scope.selectors.iter().map(|s| s.filter.clone()).collect());
        out.push(Rule::new(symbolizers).with_filter(filter).with_scale(first.scale));
    } else {
        for selector in &scope.selectors {
            out.push(
                Rule::new(symbolizers.clone())
                    .with_filter(selector.filter.clone())
                    .with_scale(selector.scale),
            );
        }
    }
}

/// The symbolizer kind a property configures, `None` for shared properties.
fn property_kind(name: &str) -> Option<SymbolizerKind> {
    if name.starts_with("fill") {
        Some(SymbolizerKind::Polygon)
    } else if name.starts_with("stroke") {
        Some(SymbolizerKind::Line)
    } else if name.starts_with("mark") {
        Some(SymbolizerKind::Point)
    } else if name.starts_with("label")
        || name.starts_with("font-")
        || name.starts_with("halo-")
        || name.starts_with("shield")
    {
        Some(SymbolizerKind::Text)
    } else {
        None
    }
}

/// Derive symbolizers from a rule's properties.
///
/// `fill`, `stroke`, `mark` and `label` each turn on one symbolizer, ordered
/// polygon, line, point, text. Properties belonging to no kind are shared by
/// all. Without `fill`, `stroke` or `mark` the rule gets a default point
/// symbolizer.
fn symbolizers(
    properties: &[Property],
    pseudo: &[(SymbolizerKind, Property)],
) -> Vec<Symbolizer> {
    let has = |name: &str| properties.iter().any(|p| p.name == name);
    let build = |kind: SymbolizerKind, mut symbolizer: Symbolizer| {
        symbolizer.properties.extend(
            properties
                .iter()
                .filter(|p| property_kind(&p.name).is_none_or(|k| k == kind))
                .cloned(),
        );
        symbolizer.properties.extend(
            pseudo
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, p)| p.clone()),
        );
        symbolizer
    };

    let mut out = Vec::new();
    for (kind, trigger) in [
        (SymbolizerKind::Polygon, "fill"),
        (SymbolizerKind::Line, "stroke"),
        (SymbolizerKind::Point, "mark"),
    ] {
        if has(trigger) {
            out.push(build(kind, Symbolizer::new(kind)));
        }
    }
    if out.is_empty() {
        out.push(build(SymbolizerKind::Point, Symbolizer::default_point()));
    }
    if has("label") {
        out.push(build(SymbolizerKind::Text, Symbolizer::new(SymbolizerKind::Text)));
    }
    out
}
