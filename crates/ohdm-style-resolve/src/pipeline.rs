//! The resolution stages in order.

use ohdm_style_model::{Classification, MapFeature, Rule};
use ohdm_style_parse::{ParseError, ParseResult};
use tracing::info;

use crate::{
    DEFAULT_MAX_REFERENCE_DEPTH, DescriptorSink, Issues, PlaceholderResolver, ReferenceResolver,
    StyleDescriptor, fill_defaults, split_by_geometry, translate,
};

/// Options of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Add default styles for classes the configuration does not declare.
    pub generate_defaults: bool,
    /// Longest allowed chain of `sameAs` references.
    pub max_reference_depth: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            generate_defaults: false,
            max_reference_depth: DEFAULT_MAX_REFERENCE_DEPTH,
        }
    }
}

impl PipelineOptions {
    /// Create the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether default styles are generated.
    pub fn generate_defaults(mut self, generate: bool) -> Self {
        self.generate_defaults = generate;
        self
    }

    /// Set the longest allowed reference chain.
    pub fn max_reference_depth(mut self, depth: usize) -> Self {
        self.max_reference_depth = depth;
        self
    }
}

/// Output of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// One descriptor per feature and geometry type.
    pub descriptors: Vec<StyleDescriptor>,
    /// Problems recovered from along the way.
    pub issues: Issues,
}

/// Turns parsed declarations into style descriptors.
///
/// Stages run in a fixed order: placeholders, references, defaults, geometry
/// split, translation. Only a syntax error stops it; everything else is
/// reported in the returned issues.
pub struct Pipeline<'c> {
    classification: &'c dyn Classification,
    options: PipelineOptions,
}

impl<'c> Pipeline<'c> {
    /// Create a pipeline over `classification`.
    pub fn new(classification: &'c dyn Classification, options: PipelineOptions) -> Self {
        Self {
            classification,
            options,
        }
    }

    /// Parse `source` and run the stages on it.
    pub fn compile(&self, source: &str) -> Result<Resolved, ParseError> {
        let parse_result = ohdm_style_parse::parse(source)?;
        Ok(self.run(parse_result))
    }

    /// Run every stage.
    pub fn run(&self, parse_result: ParseResult) -> Resolved {
        let mut issues = Issues::new();
        let features = self.resolve(parse_result, &mut issues);

        info!("Splitting MapFeatures into geometry types...");
        let features = split_by_geometry(features);

        info!("Transforming MapFeatures to style descriptors...");
        let descriptors = translate(features);

        Resolved {
            descriptors,
            issues,
        }
    }

    /// Run every stage, handing each descriptor to `sink` as it is built.
    pub fn run_into<S: DescriptorSink>(
        &self,
        parse_result: ParseResult,
        sink: &mut S,
    ) -> Result<Issues, S::Error> {
        let mut issues = Issues::new();
        let features = self.resolve(parse_result, &mut issues);

        info!("Splitting MapFeatures into geometry types...");
        for feature in split_by_geometry(features) {
            sink.accept(StyleDescriptor::from(feature))?;
        }
        Ok(issues)
    }

    /// Resolve placeholders and references and fill defaults, stopping
    /// before the geometry split.
    pub fn resolve(&self, parse_result: ParseResult, issues: &mut Issues) -> Vec<MapFeature<Rule>> {
        info!(
            "Starting processing of the following parse result: {}",
            parse_result
        );

        info!("Resolving references for PlaceholderRules...");
        let placeholders = PlaceholderResolver::new(parse_result.style_groups, issues);
        let features = placeholders.resolve_features(parse_result.features, issues);

        info!("Resolving references between MapFeatures...");
        let features = ReferenceResolver::new(self.classification)
            .with_max_depth(self.options.max_reference_depth)
            .resolve(features, issues);

        if self.options.generate_defaults {
            info!("Creating MapFeatures with default values for non-declared classes from classification...");
            fill_defaults(features, self.classification)
        } else {
            features
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;
    use ohdm_style_model::InMemoryClassification;

    const SOURCE: &str = "
        [aeroway] { [aerodrome] { [default] { useStyle = Area } } }
        [military] { sameAs = aeroway }
        <Area> { * { fill: #cccccc; stroke: #000000; } }
    ";

    fn classification() -> InMemoryClassification {
        InMemoryClassification::new()
            .with_class("aeroway", ["aerodrome"])
            .with_class("military", ["aerodrome", "barracks"])
            .with_class("waterway", ["river"])
    }

    #[test]
    fn test_compile() {
        let classification = classification();
        let resolved = Pipeline::new(&classification, PipelineOptions::new())
            .compile(SOURCE)
            .unwrap();
        assert!(resolved.issues.is_empty());
        let names: Vec<&str> = resolved.descriptors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "aeroway_points",
                "aeroway_lines",
                "aeroway_polygons",
                "military_points",
                "military_lines",
                "military_polygons",
            ]
        );
        assert_eq!(resolved.descriptors[0].rule_count(), 0);
        assert_eq!(resolved.descriptors[1].rule_count(), 1);
        assert_eq!(resolved.descriptors[5].rule_count(), 1);
    }

    #[test]
    fn test_defaults_and_sink() {
        let classification = classification();
        let pipeline = Pipeline::new(
            &classification,
            PipelineOptions::new().generate_defaults(true),
        );
        let parse_result = ohdm_style_parse::parse(SOURCE).unwrap();
        let mut sink: Vec<StyleDescriptor> = Vec::new();
        let issues = pipeline.run_into(parse_result.clone(), &mut sink).unwrap();
        assert!(issues.is_empty());
        assert_eq!(sink.len(), 9);
        assert_eq!(sink[6].name, "waterway_points");
        assert_eq!(sink, pipeline.run(parse_result).descriptors);
    }

    #[test]
    fn test_syntax_error_stops_compile() {
        let classification = classification();
        let pipeline = Pipeline::new(&classification, PipelineOptions::new());
        assert!(pipeline.compile("[aeroway] {").is_err());
    }
}
