//! Default styles for classes the configuration never declares.

use ohdm_style_model::{
    Classification, Filter, MapFeature, MapFeatureSubclass, PropertyValue, Rule, Symbolizer,
    SymbolizerKind,
};
use tracing::info;

/// Append a default feature for every class of `classification` that has no
/// feature yet. Names compare case-insensitively.
pub fn fill_defaults(
    mut features: Vec<MapFeature<Rule>>,
    classification: &dyn Classification,
) -> Vec<MapFeature<Rule>> {
    for name in classification.class_names() {
        if features.iter().any(|f| f.name.eq_ignore_ascii_case(name)) {
            continue;
        }
        let Some(class) = classification.class(name) else {
            continue;
        };
        let mut feature = MapFeature::new(name);
        for subclass in &class.subclass_names {
            feature.add_subclass(MapFeatureSubclass::new(
                subclass.as_str(),
                vec![default_rule(subclass)],
            ));
        }
        info!("Created default style for MapFeature {}.", name);
        features.push(feature);
    }
    features
}

/// Black polygon, line and circle mark for one subclass.
pub fn default_rule(subclass: &str) -> Rule {
    let black = || PropertyValue::color("#000000");
    Rule::new(vec![
        Symbolizer::new(SymbolizerKind::Polygon).with("fill", black()),
        Symbolizer::new(SymbolizerKind::Line)
            .with("stroke", black())
            .with("stroke-width", PropertyValue::number(1.0)),
        Symbolizer::default_point().with("mark-fill", black()),
    ])
    .with_filter(Filter::subclass(subclass))
}
