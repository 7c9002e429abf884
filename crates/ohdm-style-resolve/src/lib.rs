#![doc = include_str!("../README.md")]

mod defaults;
mod issue;
mod pipeline;
mod placeholder;
mod reference;
mod split;
mod translate;

pub use defaults::{default_rule, fill_defaults};
pub use issue::{Issue, Issues, Severity};
pub use pipeline::{Pipeline, PipelineOptions, Resolved};
pub use placeholder::PlaceholderResolver;
pub use reference::{DEFAULT_MAX_REFERENCE_DEPTH, ReferenceResolver};
pub use split::{project, split_by_geometry};
pub use translate::{DescriptorSink, StyleDescriptor, StyleLayer, translate};
