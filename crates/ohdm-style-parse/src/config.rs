//! Recursive descent over feature and style group declarations.

use std::collections::HashMap;

use ohdm_style_model::{
    FeatureDecl, Filter, MapFeature, MapFeatureReference, MapFeatureSubclass, PlaceholderRule,
    StyleGroup, StyleRule, ZoomRegion,
};
use ohdm_style_tokenizer::{Span, Token, TokenKind};
use tracing::{debug, trace};

use crate::ParseResult;
use crate::cursor::{Cursor, TokenStream};
use crate::css::StyleSheetParser;
use crate::diagnostic::{Diagnostics, ParseError, SyntaxErrorKind};

/// Parser for a whole configuration text.
///
/// Every syntax error found in the single pass is collected; the parse fails
/// if there is at least one.
pub struct ConfigParser<'src> {
    source: &'src str,
}

impl<'src> ConfigParser<'src> {
    /// Create a parser for `source`.
    pub fn new(source: &'src str) -> Self {
        Self { source }
    }

    /// Parse the configuration.
    pub fn parse(self) -> Result<ParseResult, ParseError> {
        let mut diagnostics = Diagnostics::new(self.source);
        let stream = TokenStream::lex(self.source, &mut diagnostics);
        let mut cursor = stream.cursor();
        let result = DeclParser {
            diagnostics: &mut diagnostics,
        }
        .config(&mut cursor);
        debug!(
            "Parsed {} features and {} style groups",
            result.features.len(),
            result.style_groups.len()
        );
        diagnostics.finish(result)
    }
}

struct DeclParser<'d, 'src> {
    diagnostics: &'d mut Diagnostics<'src>,
}

impl<'d, 'src> DeclParser<'d, 'src> {
    /// `config := feature* styleGroup* EOF`
    fn config(&mut self, cursor: &mut Cursor<'_, 'src>) -> ParseResult {
        let mut result = ParseResult::default();
        let mut feature_names: HashMap<String, Span> = HashMap::new();
        let mut group_names: HashMap<String, Span> = HashMap::new();
        let mut first_group: Option<Span> = None;

        while let Some(token) = cursor.peek() {
            match token.kind {
                TokenKind::LBracket => {
                    if let Some(first_group) = first_group {
                        self.diagnostics
                            .error(SyntaxErrorKind::FeatureAfterStyleGroup { first_group }, token.span);
                    }
                    let Some((feature, span)) = self.feature(cursor) else {
                        continue;
                    };
                    if first_group.is_some() {
                        continue;
                    }
                    let key = feature.name().to_ascii_lowercase();
                    if let Some(original) = feature_names.get(&key) {
                        self.diagnostics.error(
                            SyntaxErrorKind::DuplicateFeature {
                                name: feature.name().to_string(),
                                original: *original,
                            },
                            span,
                        );
                        continue;
                    }
                    feature_names.insert(key, span);
                    result.features.push(feature);
                }
                TokenKind::Lt => {
                    first_group.get_or_insert(token.span);
                    let Some((group, span)) = self.style_group(cursor) else {
                        continue;
                    };
                    if let Some(original) = group_names.get(&group.name) {
                        self.diagnostics.error(
                            SyntaxErrorKind::DuplicateStyleGroup {
                                name: group.name.clone(),
                                original: *original,
                            },
                            span,
                        );
                        continue;
                    }
                    group_names.insert(group.name.clone(), span);
                    result.style_groups.push(group);
                }
                _ => {
                    self.diagnostics.unexpected(
                        "feature `[name] { ... }` or style group `<name> { ... }`",
                        Some(token),
                        token.span,
                    );
                    cursor.skip_declaration(None);
                }
            }
        }

        result
    }

    /// `feature := '[' ident ']' '{' (refDecl | subclassDecl+) '}'`
    fn feature(&mut self, cursor: &mut Cursor<'_, 'src>) -> Option<(FeatureDecl<StyleRule>, Span)> {
        let name = self.bracketed_name(cursor, "feature name")?;
        let mut body = self.open_block(cursor, "`{` after feature name")?;

        if body.at_ident("sameAs") && body.peek_nth(1).is_some_and(|t| t.kind == TokenKind::Eq) {
            body.bump();
            body.bump();
            let target = self.ident(&mut body, "referenced feature name")?;
            if let Some(extra) = body.peek() {
                self.diagnostics
                    .unexpected("end of feature block", Some(extra), extra.span);
                return None;
            }
            trace!("Feature {} references {}", name.text, target.text);
            let reference = MapFeatureReference::new(name.text, target.text);
            return Some((reference.into(), name.span));
        }

        if body.at_end() {
            self.diagnostics.unexpected(
                "`sameAs = <feature>` or subclass declaration",
                None,
                body.span(),
            );
            return None;
        }

        let mut feature = MapFeature::new(name.text);
        while !body.at_end() {
            if !body.at(TokenKind::LBracket) {
                self.diagnostics.unexpected(
                    "subclass declaration `[name] { ... }`",
                    body.peek(),
                    body.span(),
                );
                body.skip_declaration(None);
                continue;
            }
            if let Some(subclass) = self.subclass(&mut body) {
                feature.add_subclass(subclass);
            }
        }
        trace!(
            "Feature {} with {} subclasses",
            feature.name,
            feature.subclasses.len()
        );
        Some((feature.into(), name.span))
    }

    /// `subclassDecl := '[' ident ']' '{' ruleDecl+ '}'`
    fn subclass(
        &mut self,
        cursor: &mut Cursor<'_, 'src>,
    ) -> Option<MapFeatureSubclass<StyleRule>> {
        let name = self.bracketed_name(cursor, "subclass name")?;
        let mut body = self.open_block(cursor, "`{` after subclass name")?;

        if body.at_end() {
            self.diagnostics
                .unexpected("rule declaration `[zoom] { ... }`", None, body.span());
            return None;
        }

        let scope = Filter::subclass(name.text);
        let mut rules = Vec::new();
        while !body.at_end() {
            if !body.at(TokenKind::LBracket) {
                self.diagnostics.unexpected(
                    "rule declaration `[zoom] { ... }`",
                    body.peek(),
                    body.span(),
                );
                body.skip_declaration(None);
                continue;
            }
            if let Some(declared) = self.rule_decl(&mut body) {
                for mut rule in declared {
                    rule.and_filter(&scope);
                    rules.push(rule);
                }
            }
        }
        Some(MapFeatureSubclass::new(name.text, rules))
    }

    /// `ruleDecl := '[' zoomToken ']' '{' styleDecl '}'`
    fn rule_decl(&mut self, cursor: &mut Cursor<'_, 'src>) -> Option<Vec<StyleRule>> {
        let mut zoom = match cursor.group(TokenKind::LBracket, TokenKind::RBracket) {
            Ok(zoom) => zoom,
            Err(opener) => {
                self.diagnostics.error(SyntaxErrorKind::UnclosedGroup, opener);
                cursor.skip_declaration(None);
                return None;
            }
        };
        let span = zoom.span();
        let mut text = String::new();
        while let Some(token) = zoom.bump() {
            text.push_str(token.text);
        }
        let region = match text.parse::<ZoomRegion>() {
            Ok(region) => region,
            Err(e) => {
                self.diagnostics.error(SyntaxErrorKind::InvalidZoom(e), span);
                cursor.skip_declaration(None);
                return None;
            }
        };

        let mut body = self.open_block(cursor, "`{` after zoom")?;
        let mut rules = self.style_decl(&mut body)?;
        let scale = region.scale_range();
        for rule in &mut rules {
            rule.set_scale(scale);
        }
        Some(rules)
    }

    /// `styleGroup := '<' ident '>' '{' styleDecl '}'`
    fn style_group(
        &mut self,
        cursor: &mut Cursor<'_, 'src>,
    ) -> Option<(StyleGroup<StyleRule>, Span)> {
        cursor.bump();
        let Some(name) = self.ident(cursor, "style group name") else {
            cursor.skip_declaration(None);
            return None;
        };
        if cursor.eat(TokenKind::Gt).is_none() {
            self.diagnostics
                .unexpected("`>` after style group name", cursor.peek(), cursor.span());
            cursor.skip_declaration(None);
            return None;
        }
        let mut body = self.open_block(cursor, "`{` after style group name")?;
        let mut rules = self.style_decl(&mut body)?;
        for rule in &mut rules {
            if let StyleRule::Concrete(rule) = rule {
                rule.name = Some(name.text.to_string());
            }
        }
        trace!("Style group {} with {} rules", name.text, rules.len());
        Some((StyleGroup::new(name.text, rules), name.span))
    }

    /// `styleDecl := 'useStyle' '=' ident (',' ident)* | detailedStyleDecl`
    fn style_decl(&mut self, body: &mut Cursor<'_, 'src>) -> Option<Vec<StyleRule>> {
        if body.at_ident("useStyle") && body.peek_nth(1).is_some_and(|t| t.kind == TokenKind::Eq) {
            body.bump();
            body.bump();
            let mut rules = Vec::new();
            loop {
                let name = self.ident(body, "style group name")?;
                rules.push(PlaceholderRule::new(name.text).into());
                if body.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            if let Some(extra) = body.peek() {
                self.diagnostics
                    .unexpected("`,` or end of block", Some(extra), extra.span);
                return None;
            }
            return Some(rules);
        }

        let rules = StyleSheetParser::new(self.diagnostics).stylesheet(body)?;
        Some(rules.into_iter().map(StyleRule::from).collect())
    }

    /// `'[' ident ']'`. On error the whole declaration is skipped.
    fn bracketed_name(
        &mut self,
        cursor: &mut Cursor<'_, 'src>,
        expected: &'static str,
    ) -> Option<Token<'src>> {
        let mut inner = match cursor.group(TokenKind::LBracket, TokenKind::RBracket) {
            Ok(inner) => inner,
            Err(opener) => {
                self.diagnostics.error(SyntaxErrorKind::UnclosedGroup, opener);
                cursor.skip_declaration(None);
                return None;
            }
        };
        let Some(name) = self.ident(&mut inner, expected) else {
            cursor.skip_declaration(None);
            return None;
        };
        if let Some(extra) = inner.peek() {
            self.diagnostics.unexpected("`]`", Some(extra), extra.span);
            cursor.skip_declaration(None);
            return None;
        }
        Some(name)
    }

    /// A block is required next; on error the declaration is skipped.
    fn open_block<'t>(
        &mut self,
        cursor: &mut Cursor<'t, 'src>,
        expected: &'static str,
    ) -> Option<Cursor<'t, 'src>> {
        let block = cursor.block();
        if block.is_none() {
            self.diagnostics
                .unexpected(expected, cursor.peek(), cursor.span());
            cursor.skip_declaration(None);
        }
        block
    }

    /// An identifier matching `[A-Za-z][A-Za-z0-9_-]*`.
    fn ident(&mut self, cursor: &mut Cursor<'_, 'src>, expected: &'static str) -> Option<Token<'src>> {
        let Some(token) = cursor.eat(TokenKind::Ident) else {
            self.diagnostics
                .unexpected(expected, cursor.peek(), cursor.span());
            return None;
        };
        if !token.text.starts_with(|c: char| c.is_ascii_alphabetic()) {
            self.diagnostics.error(
                SyntaxErrorKind::InvalidIdentifier(token.text.to_string()),
                token.span,
            );
            return None;
        }
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;
    use ohdm_style_model::{CompareOp, Literal, ScaleRange, SymbolizerKind, ZoomLevel};

    fn errors(source: &str) -> Vec<String> {
        match ConfigParser::new(source).parse() {
            Ok(result) => panic!("expected errors, got {result}"),
            Err(e) => e.errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn scale(level: u32) -> f64 {
        ZoomLevel::new(level).unwrap().scale_denominator()
    }

    #[test]
    fn test_empty_input() {
        let result = ConfigParser::new("  /* nothing */ \n").parse().unwrap();
        assert!(result.features.is_empty());
        assert!(result.style_groups.is_empty());
    }

    #[test]
    fn test_reference() {
        let result = ConfigParser::new("[military] { sameAs = aeroway }").parse().unwrap();
        assert_eq!(
            result.features,
            vec![FeatureDecl::Reference(MapFeatureReference::new(
                "military", "aeroway"
            ))]
        );
    }

    #[test]
    fn test_subclass_rules_are_scoped() {
        let source = "[aeroway] {\n  [aerodrome] {\n    [0-10] { useStyle = A, B }\n    [>5] { [pop > 3] { fill: #000 } }\n  }\n}";
        let result = ConfigParser::new(source).parse().unwrap();
        let feature = result.features[0].as_feature().unwrap();
        let rules = &feature.subclass("aerodrome").unwrap().rules;
        assert_eq!(rules.len(), 3);

        let StyleRule::Placeholder(first) = &rules[0] else {
            panic!("expected placeholder, got {:?}", rules[0]);
        };
        assert_eq!(first.name_of_original, "A");
        assert_eq!(first.filter, Filter::subclass("aerodrome"));
        assert_eq!(first.scale, ScaleRange::new(scale(10), scale(0)));

        let concrete = rules[2].as_concrete().unwrap();
        assert_eq!(
            concrete.filter,
            Filter::compare("pop", CompareOp::Gt, Literal::Number(3.0))
                .and(Filter::subclass("aerodrome"))
        );
        assert_eq!(concrete.scale, ScaleRange::new(scale(5), f64::INFINITY));
        assert!(concrete.has_symbolizer(SymbolizerKind::Polygon));
    }

    #[test]
    fn test_zoom_overrides_css_scale() {
        let source = "[a] { [b] { [<5] { [@scale > 1000] { stroke: #000 } } } }";
        let result = ConfigParser::new(source).parse().unwrap();
        let feature = result.features[0].as_feature().unwrap();
        let rule = feature.subclasses[0].rules[0].as_concrete().unwrap();
        assert_eq!(rule.scale, ScaleRange::new(0.0, scale(5)));
    }

    #[test]
    fn test_style_group_rules_are_named() {
        let source = "<SimpleLine> { * { stroke: #000; } }\n<Both> { useStyle = SimpleLine }";
        let result = ConfigParser::new(source).parse().unwrap();
        assert_eq!(result.style_groups.len(), 2);
        let simple = &result.style_groups[0];
        assert_eq!(
            simple.concrete_rules().next().and_then(|r| r.name.as_deref()),
            Some("SimpleLine")
        );
        assert!(result.style_groups[1].has_placeholders());
    }

    #[test]
    fn test_duplicate_subclasses_merge() {
        let source = "[a] { [x] { [default] { useStyle = P } } [x] { [>3] { useStyle = Q } } }";
        let result = ConfigParser::new(source).parse().unwrap();
        let feature = result.features[0].as_feature().unwrap();
        assert_eq!(feature.subclasses.len(), 1);
        assert_eq!(feature.rule_count(), 2);
    }

    #[test]
    fn test_zoom_errors() {
        assert_eq!(
            errors("[a] { [b] { [0-25] { useStyle = P } } }"),
            vec!["zoom level 25 is outside 0-19 (line 1, column 14)"]
        );
        assert_eq!(
            errors("[a] { [b] { [100] { useStyle = P } } }"),
            vec!["invalid zoom region `100` (line 1, column 14)"]
        );
    }

    #[test]
    fn test_structure_errors() {
        assert_eq!(
            errors("[a] { }"),
            vec![
                "expected `sameAs = <feature>` or subclass declaration, found end of block (line 1, column 7)"
            ]
        );
        assert_eq!(
            errors("[_a] { sameAs = b }"),
            vec!["invalid identifier `_a` (line 1, column 2)"]
        );
        assert_eq!(
            errors("<G> { useStyle = A B }"),
            vec!["expected `,` or end of block, found `B` (line 1, column 20)"]
        );
        assert_eq!(
            errors("feature { }"),
            vec![
                "expected feature `[name] { ... }` or style group `<name> { ... }`, found `feature` (line 1, column 1)"
            ]
        );
    }

    #[test]
    fn test_declaration_order_and_duplicates() {
        assert_eq!(
            errors("<G> { useStyle = A }\n[a] { sameAs = b }"),
            vec!["feature declared after a style group (line 2, column 1)"]
        );
        assert_eq!(
            errors("[Aeroway] { sameAs = b }\n[aeroway] { sameAs = c }"),
            vec!["duplicate feature `aeroway` (line 2, column 2)"]
        );
        assert_eq!(
            errors("<G> { useStyle = A }\n<G> { useStyle = B }"),
            vec!["duplicate style group `G` (line 2, column 2)"]
        );
    }

    #[test]
    fn test_reports_every_error() {
        let source = "[a] { [b] { [99] { useStyle = P } } }\n\
                      [c] { [d] { [default] { * { fill #000 } } } }\n\
                      <G> { * { stroke: #00 } }";
        let Err(error) = ConfigParser::new(source).parse() else {
            panic!("expected errors");
        };
        assert_eq!(error.positions(), vec![(1, 14), (2, 34), (3, 19)]);
    }
}
