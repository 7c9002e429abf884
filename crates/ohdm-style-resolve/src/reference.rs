//! Replacing `sameAs` references with copies of the referenced feature.

use ohdm_style_model::{
    Classification, FeatureDecl, MapFeature, MapFeatureReference, MapFeatureSubclass, Rule,
};
use tracing::debug;

use crate::{Issue, Issues};

/// Default limit on how many references one chain may pass through.
pub const DEFAULT_MAX_REFERENCE_DEPTH: usize = 10;

#[derive(Debug, Clone)]
enum State {
    Pending,
    Resolved(MapFeature<Rule>),
    Failed,
}

/// Resolves feature references against the concrete features of a
/// configuration.
///
/// A reference to another reference is resolved through the chain, one
/// classification filter per step. Each reference is resolved once.
pub struct ReferenceResolver<'c> {
    classification: &'c dyn Classification,
    max_depth: usize,
}

impl<'c> ReferenceResolver<'c> {
    /// Create a resolver using `classification` to pick subclasses.
    pub fn new(classification: &'c dyn Classification) -> Self {
        Self {
            classification,
            max_depth: DEFAULT_MAX_REFERENCE_DEPTH,
        }
    }

    /// Limit chains to `max_depth` references.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Replace every reference by a concrete feature.
    ///
    /// Concrete features keep their order; resolved references follow in
    /// declaration order. References that cannot be resolved are reported
    /// and dropped.
    pub fn resolve(
        &self,
        features: Vec<FeatureDecl<Rule>>,
        issues: &mut Issues,
    ) -> Vec<MapFeature<Rule>> {
        let mut concrete = Vec::new();
        let mut references = Vec::new();
        for decl in features {
            match decl {
                FeatureDecl::Concrete(feature) => concrete.push(feature),
                FeatureDecl::Reference(reference) => references.push(reference),
            }
        }

        let mut states = vec![State::Pending; references.len()];
        for start in 0..references.len() {
            self.resolve_chain(start, &concrete, &references, &mut states, issues);
        }

        concrete.extend(states.into_iter().filter_map(|state| match state {
            State::Resolved(feature) => Some(feature),
            State::Pending | State::Failed => None,
        }));
        concrete
    }

    fn resolve_chain(
        &self,
        start: usize,
        concrete: &[MapFeature<Rule>],
        references: &[MapFeatureReference],
        states: &mut [State],
        issues: &mut Issues,
    ) {
        if !matches!(states[start], State::Pending) {
            return;
        }

        let mut chain = vec![start];
        let base = loop {
            let current = &references[*chain.last().unwrap_or(&start)];
            let target = &current.referenced_feature_name;

            if let Some(feature) = concrete
                .iter()
                .find(|f| f.name.eq_ignore_ascii_case(target))
            {
                break feature.clone();
            }

            let Some(next) = references
                .iter()
                .position(|r| r.name.eq_ignore_ascii_case(target))
            else {
                self.fail(&chain, references, states, issues);
                return;
            };

            if let State::Resolved(feature) = &states[next] {
                break feature.clone();
            }
            if matches!(states[next], State::Failed) {
                self.fail(&chain, references, states, issues);
                return;
            }

            if let Some(position) = chain.iter().position(|&i| i == next) {
                let mut names: Vec<String> = chain[position..]
                    .iter()
                    .map(|&i| references[i].name.clone())
                    .collect();
                names.push(references[next].name.clone());
                issues.report(Issue::ReferenceCycle { chain: names });
                // Members of the cycle are reported by the cycle itself.
                for &member in &chain[position..] {
                    states[member] = State::Failed;
                }
                self.fail(&chain[..position], references, states, issues);
                return;
            }

            if chain.len() >= self.max_depth {
                issues.report(Issue::ReferenceChainTooDeep {
                    feature: references[start].name.clone(),
                    max_depth: self.max_depth,
                });
                states[start] = State::Failed;
                return;
            }
            chain.push(next);
        };

        let mut base = base;
        for &member in chain.iter().rev() {
            let feature = self.replacement_for(&references[member], &base, issues);
            debug!(
                "Resolved MapFeature {} from {} with {} subclasses",
                feature.name,
                references[member].referenced_feature_name,
                feature.subclasses.len()
            );
            states[member] = State::Resolved(feature.clone());
            base = feature;
        }
    }

    /// Mark every reference of `chain` as failed, reporting each one.
    fn fail(
        &self,
        chain: &[usize],
        references: &[MapFeatureReference],
        states: &mut [State],
        issues: &mut Issues,
    ) {
        for &member in chain.iter().rev() {
            let reference = &references[member];
            issues.report(Issue::UnresolvedReference {
                feature: reference.name.clone(),
                target: reference.referenced_feature_name.clone(),
            });
            states[member] = State::Failed;
        }
    }

    /// Copy of `base` named after `reference`, keeping only the subclasses
    /// the referencing class allows.
    fn replacement_for(
        &self,
        reference: &MapFeatureReference,
        base: &MapFeature<Rule>,
        issues: &mut Issues,
    ) -> MapFeature<Rule> {
        let mut feature = MapFeature::new(reference.name.as_str());
        let Some(class) = self.classification.class(&reference.name) else {
            issues.report(Issue::UnknownClass {
                feature: reference.name.clone(),
            });
            return feature;
        };
        for subclass in &base.subclasses {
            if class.has_subclass(&subclass.name) {
                feature.add_subclass(MapFeatureSubclass::new(
                    subclass.name.as_str(),
                    subclass.rules.clone(),
                ));
            }
        }
        feature
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;
    use ohdm_style_model::{Filter, InMemoryClassification, Symbolizer, SymbolizerKind};

    fn aeroway() -> MapFeature<Rule> {
        let rule = |sub: &str| {
            Rule::new(vec![Symbolizer::new(SymbolizerKind::Polygon)])
                .with_filter(Filter::subclass(sub))
        };
        MapFeature::new("aeroway")
            .with_subclass(MapFeatureSubclass::new("aerodrome", vec![rule("aerodrome")]))
            .with_subclass(MapFeatureSubclass::new("helipad", vec![rule("helipad")]))
    }

    fn reference(name: &str, target: &str) -> FeatureDecl<Rule> {
        FeatureDecl::Reference(MapFeatureReference::new(name, target))
    }

    fn names(features: &[MapFeature<Rule>]) -> Vec<&str> {
        features.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_chain_filters_per_step() {
        let classification = InMemoryClassification::new()
            .with_class("aeroway", ["aerodrome", "helipad"])
            .with_class("military", ["aerodrome", "helipad"])
            .with_class("emergency", ["helipad"]);
        let mut issues = Issues::new();
        let features = ReferenceResolver::new(&classification).resolve(
            vec![
                reference("emergency", "military"),
                aeroway().into(),
                reference("military", "aeroway"),
            ],
            &mut issues,
        );
        assert!(issues.is_empty());
        assert_eq!(names(&features), vec!["aeroway", "emergency", "military"]);

        let military = &features[2];
        assert_eq!(military.subclasses, aeroway().subclasses);
        let emergency = &features[1];
        assert_eq!(emergency.subclasses.len(), 1);
        assert_eq!(emergency.subclasses[0].name, "helipad");
    }

    #[test]
    fn test_lookup_ignores_case() {
        let classification = InMemoryClassification::new().with_class("military", ["aerodrome"]);
        let mut issues = Issues::new();
        let features = ReferenceResolver::new(&classification)
            .resolve(vec![aeroway().into(), reference("military", "AEROWAY")], &mut issues);
        assert_eq!(features[1].subclasses.len(), 1);
    }

    #[test]
    fn test_missing_target() {
        let classification = InMemoryClassification::new();
        let mut issues = Issues::new();
        let features = ReferenceResolver::new(&classification).resolve(
            vec![reference("a", "b"), reference("b", "nowhere")],
            &mut issues,
        );
        assert!(features.is_empty());
        assert_eq!(
            issues.errors,
            vec![
                Issue::UnresolvedReference {
                    feature: "b".into(),
                    target: "nowhere".into()
                },
                Issue::UnresolvedReference {
                    feature: "a".into(),
                    target: "b".into()
                },
            ]
        );
    }

    #[test]
    fn test_cycle_is_reported_once() {
        let classification = InMemoryClassification::new();
        let mut issues = Issues::new();
        let features = ReferenceResolver::new(&classification).resolve(
            vec![
                reference("entry", "a"),
                reference("a", "b"),
                reference("b", "a"),
            ],
            &mut issues,
        );
        assert!(features.is_empty());
        assert_eq!(
            issues.errors,
            vec![
                Issue::ReferenceCycle {
                    chain: vec!["a".into(), "b".into(), "a".into()]
                },
                Issue::UnresolvedReference {
                    feature: "entry".into(),
                    target: "a".into()
                },
            ]
        );
    }

    #[test]
    fn test_chain_too_deep() {
        let classification = InMemoryClassification::new()
            .with_class("r0", ["aerodrome"])
            .with_class("r1", ["aerodrome"])
            .with_class("r2", ["aerodrome"]);
        let mut issues = Issues::new();
        let features = ReferenceResolver::new(&classification)
            .with_max_depth(2)
            .resolve(
                vec![
                    aeroway().into(),
                    reference("r0", "r1"),
                    reference("r1", "r2"),
                    reference("r2", "aeroway"),
                ],
                &mut issues,
            );
        assert_eq!(
            issues.errors,
            vec![Issue::ReferenceChainTooDeep {
                feature: "r0".into(),
                max_depth: 2
            }]
        );
        assert_eq!(names(&features), vec!["aeroway", "r1", "r2"]);
    }

    #[test]
    fn test_unknown_class_keeps_no_subclasses() {
        let classification = InMemoryClassification::new();
        let mut issues = Issues::new();
        let features = ReferenceResolver::new(&classification)
            .resolve(vec![aeroway().into(), reference("military", "aeroway")], &mut issues);
        assert_eq!(features.len(), 2);
        assert!(features[1].subclasses.is_empty());
        assert_eq!(
            issues.warnings,
            vec![Issue::UnknownClass {
                feature: "military".into()
            }]
        );
    }
}
