//! Final per-feature style descriptors and where they go.

use std::convert::Infallible;

use ohdm_style_model::{MapFeature, Rule};

/// The finished style of one output feature.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDescriptor {
    /// Output feature name, e.g. `aeroway_points`.
    pub name: String,
    /// One layer per subclass, in subclass order.
    pub layers: Vec<StyleLayer>,
}

/// The rules of one subclass within a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleLayer {
    /// Subclass name.
    pub name: String,
    /// Rules in order.
    pub rules: Vec<Rule>,
}

impl StyleDescriptor {
    /// Total number of rules over all layers.
    pub fn rule_count(&self) -> usize {
        self.layers.iter().map(|l| l.rules.len()).sum()
    }
}

impl From<MapFeature<Rule>> for StyleDescriptor {
    /// Rules arrive from the geometry split, so each holds a symbolizer.
    fn from(feature: MapFeature<Rule>) -> Self {
        let layers = feature
            .subclasses
            .into_iter()
            .map(|subclass| StyleLayer {
                name: subclass.name,
                rules: subclass
                    .rules
                    .into_iter()
                    .inspect(|rule| debug_assert!(!rule.symbolizers.is_empty()))
                    .collect(),
            })
            .collect();
        Self {
            name: feature.name,
            layers,
        }
    }
}

/// Build one descriptor per feature.
pub fn translate(features: Vec<MapFeature<Rule>>) -> Vec<StyleDescriptor> {
    features.into_iter().map(StyleDescriptor::from).collect()
}

/// Receives finished descriptors, e.g. to persist them.
pub trait DescriptorSink {
    /// Error raised when a descriptor cannot be accepted.
    type Error;

    /// Take one descriptor.
    fn accept(&mut self, descriptor: StyleDescriptor) -> Result<(), Self::Error>;
}

impl DescriptorSink for Vec<StyleDescriptor> {
    type Error = Infallible;

    fn accept(&mut self, descriptor: StyleDescriptor) -> Result<(), Self::Error> {
        self.push(descriptor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;
    use ohdm_style_model::{Filter, MapFeatureSubclass, Symbolizer, SymbolizerKind};

    #[test]
    fn test_layers_follow_subclasses() {
        let feature = MapFeature::new("aeroway_lines")
            .with_subclass(MapFeatureSubclass::new(
                "aerodrome",
                vec![Rule::new(vec![Symbolizer::new(SymbolizerKind::Line)])],
            ))
            .with_subclass(MapFeatureSubclass::new("helipad", Vec::new()));
        let descriptors = translate(vec![feature]);
        assert_eq!(descriptors.len(), 1);
        let descriptor = &descriptors[0];
        assert_eq!(descriptor.name, "aeroway_lines");
        let layers: Vec<&str> = descriptor.layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(layers, vec!["aerodrome", "helipad"]);
        assert_eq!(descriptor.rule_count(), 1);
    }

    #[test]
    fn test_rules_pass_through_unchanged() {
        let rule =
            Rule::new(vec![Symbolizer::default_point()]).with_filter(Filter::subclass("y"));
        let feature = MapFeature::new("x_points")
            .with_subclass(MapFeatureSubclass::new("y", vec![rule.clone()]));
        let descriptor = StyleDescriptor::from(feature);
        assert_eq!(descriptor.layers[0].rules, vec![rule]);
    }

    #[test]
    fn test_vec_sink() {
        let mut sink: Vec<StyleDescriptor> = Vec::new();
        sink.accept(StyleDescriptor::from(MapFeature::new("a"))).unwrap();
        assert_eq!(sink.len(), 1);
    }
}
