//! Map features, their subclasses, and style groups.

use tracing::debug;

use crate::{Rule, StyleRule};

/// A named partition of a feature whose rules are scoped to it.
#[derive(Debug, Clone, PartialEq)]
pub struct MapFeatureSubclass<R = Rule> {
    /// Subclass name, unique within its feature.
    pub name: String,
    /// Rules of this subclass.
    pub rules: Vec<R>,
}

impl<R> MapFeatureSubclass<R> {
    /// Create a subclass.
    pub fn new(name: impl Into<String>, rules: Vec<R>) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }
}

/// A styled feature class such as `aeroway`.
#[derive(Debug, Clone, PartialEq)]
pub struct MapFeature<R = Rule> {
    /// Feature name.
    pub name: String,
    /// Subclasses in declaration order.
    pub subclasses: Vec<MapFeatureSubclass<R>>,
}

impl<R> MapFeature<R> {
    /// Create a feature without subclasses.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subclasses: Vec::new(),
        }
    }

    /// Add a subclass. A subclass whose name is already present is merged
    /// into the existing one, keeping subclass names unique.
    pub fn add_subclass(&mut self, subclass: MapFeatureSubclass<R>) {
        match self.subclasses.iter_mut().find(|s| s.name == subclass.name) {
            Some(existing) => {
                debug!(
                    "Merging duplicate subclass {} of MapFeature {}",
                    subclass.name, self.name
                );
                existing.rules.extend(subclass.rules);
            }
            None => self.subclasses.push(subclass),
        }
    }

    /// Add a subclass, builder style.
    pub fn with_subclass(mut self, subclass: MapFeatureSubclass<R>) -> Self {
        self.add_subclass(subclass);
        self
    }

    /// Look up a subclass by name.
    pub fn subclass(&self, name: &str) -> Option<&MapFeatureSubclass<R>> {
        self.subclasses.iter().find(|s| s.name == name)
    }

    /// Total number of rules over all subclasses.
    pub fn rule_count(&self) -> usize {
        self.subclasses.iter().map(|s| s.rules.len()).sum()
    }

    /// Same feature under another name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// `[name] { sameAs = referenced_feature_name }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapFeatureReference {
    /// Name of the referencing feature.
    pub name: String,
    /// Name of the feature whose subclasses are copied.
    pub referenced_feature_name: String,
}

impl MapFeatureReference {
    /// Create a reference.
    pub fn new(name: impl Into<String>, referenced_feature_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            referenced_feature_name: referenced_feature_name.into(),
        }
    }
}

/// A feature declaration: concrete, or a reference to another feature.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureDecl<R = StyleRule> {
    /// Feature with its own subclasses.
    Concrete(MapFeature<R>),
    /// `sameAs` reference.
    Reference(MapFeatureReference),
}

impl<R> FeatureDecl<R> {
    /// Declared name.
    pub fn name(&self) -> &str {
        match self {
            FeatureDecl::Concrete(feature) => &feature.name,
            FeatureDecl::Reference(reference) => &reference.name,
        }
    }

    /// Whether this is a reference.
    pub fn is_reference(&self) -> bool {
        matches!(self, FeatureDecl::Reference(_))
    }

    /// The concrete feature, if this is one.
    pub fn as_feature(&self) -> Option<&MapFeature<R>> {
        match self {
            FeatureDecl::Concrete(feature) => Some(feature),
            FeatureDecl::Reference(_) => None,
        }
    }
}

impl<R> From<MapFeature<R>> for FeatureDecl<R> {
    fn from(feature: MapFeature<R>) -> Self {
        FeatureDecl::Concrete(feature)
    }
}

impl<R> From<MapFeatureReference> for FeatureDecl<R> {
    fn from(reference: MapFeatureReference) -> Self {
        FeatureDecl::Reference(reference)
    }
}

/// A reusable named rule set: `<Name> { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleGroup<R = StyleRule> {
    /// Group name.
    pub name: String,
    /// Rules, possibly placeholders for other groups.
    pub rules: Vec<R>,
}

impl<R> StyleGroup<R> {
    /// Create a group.
    pub fn new(name: impl Into<String>, rules: Vec<R>) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }
}

impl StyleGroup<StyleRule> {
    /// Whether the group holds at least one concrete rule.
    pub fn has_concrete_rules(&self) -> bool {
        self.rules.iter().any(|r| !r.is_placeholder())
    }

    /// Whether the group holds at least one placeholder.
    pub fn has_placeholders(&self) -> bool {
        self.rules.iter().any(StyleRule::is_placeholder)
    }

    /// The concrete rules of this group.
    pub fn concrete_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter_map(StyleRule::as_concrete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Filter, PlaceholderRule};
    use facet_testhelpers::test;

    #[test]
    fn test_duplicate_subclasses_collapse() {
        let feature = MapFeature::new("aeroway")
            .with_subclass(MapFeatureSubclass::new("a", vec![Rule::default()]))
            .with_subclass(MapFeatureSubclass::new("b", vec![Rule::default()]))
            .with_subclass(MapFeatureSubclass::new(
                "a",
                vec![Rule::default().with_filter(Filter::subclass("a"))],
            ));
        assert_eq!(feature.subclasses.len(), 2);
        assert_eq!(feature.subclass("a").map(|s| s.rules.len()), Some(2));
        assert_eq!(feature.rule_count(), 3);
    }

    #[test]
    fn test_decl_names() {
        let concrete: FeatureDecl = MapFeature::new("aeroway").into();
        let reference: FeatureDecl = MapFeatureReference::new("military", "aeroway").into();
        assert_eq!(concrete.name(), "aeroway");
        assert_eq!(reference.name(), "military");
        assert!(reference.is_reference());
        assert!(concrete.as_feature().is_some());
    }

    #[test]
    fn test_group_kinds() {
        let group = StyleGroup::new(
            "Mixed",
            vec![
                StyleRule::from(Rule::default()),
                StyleRule::from(PlaceholderRule::new("Other")),
            ],
        );
        assert!(group.has_concrete_rules());
        assert!(group.has_placeholders());
        assert_eq!(group.concrete_rules().count(), 1);
    }
}
