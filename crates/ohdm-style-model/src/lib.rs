#![doc = include_str!("../README.md")]

mod classification;
mod feature;
mod filter;
mod rule;
mod scale;
mod symbolizer;
mod zoom;

pub use classification::{
    Classification, ClassificationClass, DEFAULT_GEOMETRY_TYPES, InMemoryClassification,
};
pub use feature::{FeatureDecl, MapFeature, MapFeatureReference, MapFeatureSubclass, StyleGroup};
pub use filter::{CompareOp, Filter, Literal, SUBCLASS_PROPERTY};
pub use rule::{PlaceholderRule, Rule, StyleRule};
pub use scale::ScaleRange;
pub use symbolizer::{Property, PropertyValue, Symbolizer, SymbolizerKind};
pub use zoom::{MAX_ZOOM_LEVEL, ZoomError, ZoomLevel, ZoomRegion};
