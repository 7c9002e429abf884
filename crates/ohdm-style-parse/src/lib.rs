#![doc = include_str!("../README.md")]

use std::fmt;

use ohdm_style_model::{FeatureDecl, StyleGroup, StyleRule};

mod config;
mod cursor;
pub mod css;
mod diagnostic;
pub mod filter;

pub use config::ConfigParser;
pub use diagnostic::{ParseError, SyntaxError, SyntaxErrorKind};
pub use ohdm_style_tokenizer::Span;

/// Deepest nesting of rule blocks, filter groups or function values.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Declarations of one configuration text, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseResult {
    /// Feature declarations, concrete or `sameAs` references.
    pub features: Vec<FeatureDecl<StyleRule>>,
    /// Style group declarations.
    pub style_groups: Vec<StyleGroup<StyleRule>>,
}

impl fmt::Display for ParseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "features:")?;
        for feature in &self.features {
            match feature {
                FeatureDecl::Concrete(feature) => write!(f, " {}", feature.name)?,
                FeatureDecl::Reference(reference) => write!(
                    f,
                    " {} -> {}",
                    reference.name, reference.referenced_feature_name
                )?,
            }
        }
        write!(f, "; style groups:")?;
        for group in &self.style_groups {
            write!(f, " {}", group.name)?;
        }
        Ok(())
    }
}

/// Parse a configuration text.
pub fn parse(source: &str) -> Result<ParseResult, ParseError> {
    ConfigParser::new(source).parse()
}
