//! Splitting features into one projection per geometry type.

use ohdm_style_model::{MapFeature, MapFeatureSubclass, Rule, SymbolizerKind};
use tracing::trace;

/// Split every feature into `<name>_points`, `<name>_lines` and
/// `<name>_polygons`, in that order.
pub fn split_by_geometry(features: Vec<MapFeature<Rule>>) -> Vec<MapFeature<Rule>> {
    let mut split = Vec::with_capacity(features.len() * SymbolizerKind::GEOMETRIES.len());
    for feature in &features {
        for kind in SymbolizerKind::GEOMETRIES {
            split.push(project(feature, kind));
        }
    }
    split
}

/// The part of `feature` drawn with symbolizers of `kind`.
///
/// A rule is kept if it has a symbolizer of `kind`; it keeps those and its
/// text symbolizers. Subclasses are kept even when no rule remains.
pub fn project(feature: &MapFeature<Rule>, kind: SymbolizerKind) -> MapFeature<Rule> {
    let name = match kind.geometry_suffix() {
        Some(suffix) => format!("{}_{suffix}", feature.name),
        None => feature.name.clone(),
    };
    let mut projected = MapFeature::new(name);
    for subclass in &feature.subclasses {
        let rules: Vec<Rule> = subclass
            .rules
            .iter()
            .filter(|rule| rule.has_symbolizer(kind))
            .map(|rule| Rule {
                symbolizers: rule
                    .symbolizers
                    .iter()
                    .filter(|s| s.kind == kind || s.kind == SymbolizerKind::Text)
                    .cloned()
                    .collect(),
                ..rule.clone()
            })
            .collect();
        projected.add_subclass(MapFeatureSubclass::new(subclass.name.as_str(), rules));
    }
    trace!(
        "Projected {} onto {} with {} rules",
        feature.name,
        projected.name,
        projected.rule_count()
    );
    projected
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;
    use ohdm_style_model::Symbolizer;

    fn rule(kinds: &[SymbolizerKind]) -> Rule {
        Rule::new(kinds.iter().map(|k| Symbolizer::new(*k)).collect())
    }

    fn kinds(feature: &MapFeature<Rule>) -> Vec<Vec<SymbolizerKind>> {
        feature.subclasses[0]
            .rules
            .iter()
            .map(|r| r.symbolizers.iter().map(|s| s.kind).collect())
            .collect()
    }

    #[test]
    fn test_split_produces_three_projections() {
        use SymbolizerKind::*;
        let feature = MapFeature::new("aeroway").with_subclass(MapFeatureSubclass::new(
            "aerodrome",
            vec![rule(&[Polygon, Text]), rule(&[Line]), rule(&[Point, Polygon])],
        ));
        let split = split_by_geometry(vec![feature, MapFeature::new("empty")]);
        let names: Vec<&str> = split.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "aeroway_points",
                "aeroway_lines",
                "aeroway_polygons",
                "empty_points",
                "empty_lines",
                "empty_polygons",
            ]
        );
        assert_eq!(kinds(&split[0]), vec![vec![Point]]);
        assert_eq!(kinds(&split[1]), vec![vec![Line]]);
        assert_eq!(kinds(&split[2]), vec![vec![Polygon, Text], vec![Polygon]]);
    }

    #[test]
    fn test_subclass_without_matching_rules_is_kept_empty() {
        use SymbolizerKind::*;
        let feature = MapFeature::new("waterway")
            .with_subclass(MapFeatureSubclass::new("river", vec![rule(&[Line, Text])]));
        let points = project(&feature, Point);
        assert_eq!(points.subclasses.len(), 1);
        assert!(points.subclasses[0].rules.is_empty());
    }
}
