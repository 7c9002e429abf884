//! Replacing `useStyle` placeholders with style group rules.

use ohdm_style_model::{
    FeatureDecl, MapFeature, MapFeatureSubclass, PlaceholderRule, Rule, StyleGroup, StyleRule,
};
use tracing::{debug, trace};

use crate::{Issue, Issues};

/// Style groups with their own placeholders resolved.
///
/// Group placeholders are resolved in a single pass: a group may use groups
/// that declare concrete rules, but not groups that only use other groups.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderResolver {
    groups: Vec<StyleGroup<Rule>>,
}

impl PlaceholderResolver {
    /// Resolve placeholders between style groups. Placeholders that remain
    /// are reported and dropped.
    pub fn new(style_groups: Vec<StyleGroup<StyleRule>>, issues: &mut Issues) -> Self {
        let mut groups = style_groups;

        let implemented: Vec<usize> = (0..groups.len())
            .filter(|&i| groups[i].has_concrete_rules())
            .collect();
        let referencing: Vec<usize> = (0..groups.len())
            .filter(|&i| groups[i].has_placeholders())
            .collect();

        for &source in &implemented {
            let name = groups[source].name.clone();
            let rules: Vec<Rule> = groups[source].concrete_rules().cloned().collect();
            for &target in &referencing {
                let group = &mut groups[target];
                if group.rules.iter().any(|r| names_group(r, &name)) {
                    trace!("Substituting StyleGroup {} into {}", name, group.name);
                    group.rules = std::mem::take(&mut group.rules)
                        .into_iter()
                        .flat_map(|rule| {
                            if names_group(&rule, &name) {
                                rules.iter().cloned().map(StyleRule::Concrete).collect()
                            } else {
                                vec![rule]
                            }
                        })
                        .collect();
                }
            }
        }

        let groups = groups
            .into_iter()
            .map(|group| {
                let mut rules = Vec::with_capacity(group.rules.len());
                for rule in group.rules {
                    match rule {
                        StyleRule::Concrete(rule) => rules.push(rule),
                        StyleRule::Placeholder(placeholder) => {
                            issues.report(Issue::UnresolvedGroupPlaceholder {
                                group: group.name.clone(),
                                placeholder: placeholder.name_of_original,
                            })
                        }
                    }
                }
                StyleGroup::new(group.name, rules)
            })
            .collect();

        Self { groups }
    }

    /// The resolved style groups, in declaration order.
    pub fn groups(&self) -> &[StyleGroup<Rule>] {
        &self.groups
    }

    /// Look up a resolved group by exact name.
    pub fn group(&self, name: &str) -> Option<&StyleGroup<Rule>> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Resolve the placeholders of every concrete feature. References pass
    /// through unchanged.
    pub fn resolve_features(
        &self,
        features: Vec<FeatureDecl<StyleRule>>,
        issues: &mut Issues,
    ) -> Vec<FeatureDecl<Rule>> {
        features
            .into_iter()
            .map(|decl| match decl {
                FeatureDecl::Concrete(feature) => {
                    FeatureDecl::Concrete(self.resolve_feature(feature, issues))
                }
                FeatureDecl::Reference(reference) => FeatureDecl::Reference(reference),
            })
            .collect()
    }

    /// Resolve the placeholders of one feature.
    pub fn resolve_feature(
        &self,
        feature: MapFeature<StyleRule>,
        issues: &mut Issues,
    ) -> MapFeature<Rule> {
        let mut resolved = MapFeature::new(feature.name.as_str());
        for subclass in feature.subclasses {
            let rules = self.resolve_rules(&feature.name, &subclass.name, subclass.rules, issues);
            resolved.add_subclass(MapFeatureSubclass::new(subclass.name, rules));
        }
        debug!(
            "Resolved placeholders of MapFeature {} ({} rules)",
            resolved.name,
            resolved.rule_count()
        );
        resolved
    }

    /// Replace each placeholder by scoped copies of its group's rules, keeping
    /// its position. Unknown groups are reported and dropped.
    pub fn resolve_rules(
        &self,
        feature: &str,
        subclass: &str,
        rules: Vec<StyleRule>,
        issues: &mut Issues,
    ) -> Vec<Rule> {
        let mut resolved = Vec::with_capacity(rules.len());
        for rule in rules {
            match rule {
                StyleRule::Concrete(rule) => resolved.push(rule),
                StyleRule::Placeholder(placeholder) => {
                    match self.group(&placeholder.name_of_original) {
                        Some(group) => {
                            resolved.extend(group.rules.iter().map(|r| placeholder.instantiate(r)))
                        }
                        None => issues.report(Issue::UnresolvedSubclassPlaceholder {
                            feature: feature.to_string(),
                            subclass: subclass.to_string(),
                            group: placeholder.name_of_original,
                        }),
                    }
                }
            }
        }
        resolved
    }
}

fn names_group(rule: &StyleRule, group: &str) -> bool {
    matches!(rule, StyleRule::Placeholder(PlaceholderRule { name_of_original, .. }) if name_of_original == group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;
    use ohdm_style_model::{Filter, ScaleRange, Symbolizer, SymbolizerKind, ZoomRegion};

    fn concrete_group(name: &str, kind: SymbolizerKind) -> StyleGroup<StyleRule> {
        let rule = Rule::new(vec![Symbolizer::new(kind)]).named(name);
        StyleGroup::new(name, vec![rule.into()])
    }

    fn placeholder_group(name: &str, uses: &[&str]) -> StyleGroup<StyleRule> {
        StyleGroup::new(
            name,
            uses.iter()
                .map(|u| PlaceholderRule::new(*u).into())
                .collect(),
        )
    }

    fn kinds(rules: &[Rule]) -> Vec<SymbolizerKind> {
        rules
            .iter()
            .flat_map(|r| r.symbolizers.iter().map(|s| s.kind))
            .collect()
    }

    #[test]
    fn test_group_placeholders_keep_position() {
        let mut issues = Issues::new();
        let resolver = PlaceholderResolver::new(
            vec![
                concrete_group("Line", SymbolizerKind::Line),
                placeholder_group("Both", &["Polygon", "Line"]),
                concrete_group("Polygon", SymbolizerKind::Polygon),
            ],
            &mut issues,
        );
        assert!(issues.is_empty());
        let both = resolver.group("Both").unwrap();
        assert_eq!(
            kinds(&both.rules),
            vec![SymbolizerKind::Polygon, SymbolizerKind::Line]
        );
    }

    #[test]
    fn test_transitive_group_placeholders_are_dropped() {
        let mut issues = Issues::new();
        let resolver = PlaceholderResolver::new(
            vec![
                concrete_group("Line", SymbolizerKind::Line),
                placeholder_group("Outer", &["Inner", "Line"]),
                placeholder_group("Inner", &["Line"]),
            ],
            &mut issues,
        );
        assert_eq!(kinds(&resolver.group("Outer").unwrap().rules), vec![SymbolizerKind::Line]);
        assert_eq!(kinds(&resolver.group("Inner").unwrap().rules), vec![SymbolizerKind::Line]);
        assert_eq!(
            issues.errors,
            vec![Issue::UnresolvedGroupPlaceholder {
                group: "Outer".into(),
                placeholder: "Inner".into(),
            }]
        );
    }

    #[test]
    fn test_subclass_placeholder_takes_scope() {
        let mut issues = Issues::new();
        let resolver = PlaceholderResolver::new(
            vec![concrete_group("SimplePolygon", SymbolizerKind::Polygon)],
            &mut issues,
        );
        let zoom: ZoomRegion = ">5".parse().unwrap();
        let mut placeholder = PlaceholderRule::new("SimplePolygon");
        placeholder.filter = Filter::subclass("aerodrome");
        placeholder.scale = zoom.scale_range();

        let rules = resolver.resolve_rules(
            "aeroway",
            "aerodrome",
            vec![placeholder.into(), PlaceholderRule::new("Missing").into()],
            &mut issues,
        );
        assert_eq!(rules.len(), 1);
        let group_rule = &resolver.group("SimplePolygon").unwrap().rules[0];
        assert_eq!(rules[0].symbolizers, group_rule.symbolizers);
        assert_eq!(rules[0].name.as_deref(), Some("SimplePolygon"));
        assert_eq!(rules[0].filter, Filter::subclass("aerodrome"));
        assert_eq!(rules[0].scale, zoom.scale_range());
        assert_ne!(rules[0].scale, ScaleRange::UNBOUNDED);
        assert_eq!(
            issues.errors,
            vec![Issue::UnresolvedSubclassPlaceholder {
                feature: "aeroway".into(),
                subclass: "aerodrome".into(),
                group: "Missing".into(),
            }]
        );
    }

    #[test]
    fn test_resolving_concrete_rules_is_a_no_op() {
        let mut issues = Issues::new();
        let resolver = PlaceholderResolver::new(Vec::new(), &mut issues);
        let rules = vec![
            Rule::new(vec![Symbolizer::new(SymbolizerKind::Point)])
                .with_filter(Filter::subclass("a")),
        ];
        let once = resolver.resolve_rules(
            "f",
            "a",
            rules.iter().cloned().map(StyleRule::from).collect(),
            &mut issues,
        );
        let twice = resolver.resolve_rules(
            "f",
            "a",
            once.iter().cloned().map(StyleRule::from).collect(),
            &mut issues,
        );
        assert_eq!(once, rules);
        assert_eq!(twice, once);
        assert!(issues.is_empty());
    }
}
