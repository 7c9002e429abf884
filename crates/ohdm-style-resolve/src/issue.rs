//! Non-fatal problems found while resolving a configuration.

use std::fmt;

use tracing::{error, warn};

/// How serious an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something was dropped from the output.
    Error,
    /// The output is complete but may not be what the author meant.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// A problem the pipeline recovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// A style group uses a group that is missing or has no concrete rules.
    UnresolvedGroupPlaceholder {
        /// The group holding the placeholder.
        group: String,
        /// The group it names.
        placeholder: String,
    },
    /// A subclass uses a style group that does not exist.
    UnresolvedSubclassPlaceholder {
        /// Feature of the subclass.
        feature: String,
        /// The subclass holding the placeholder.
        subclass: String,
        /// The group it names.
        group: String,
    },
    /// `sameAs` names a feature that does not exist or could not be resolved.
    UnresolvedReference {
        /// The referencing feature.
        feature: String,
        /// The feature it names.
        target: String,
    },
    /// `sameAs` references that lead back to themselves.
    ReferenceCycle {
        /// Feature names along the cycle, first name repeated at the end.
        chain: Vec<String>,
    },
    /// A chain of `sameAs` references longer than allowed.
    ReferenceChainTooDeep {
        /// The feature whose chain was followed.
        feature: String,
        /// The depth limit.
        max_depth: usize,
    },
    /// A referencing feature is missing from the classification, so none of
    /// the referenced subclasses are valid for it.
    UnknownClass {
        /// The feature name.
        feature: String,
    },
}

impl Issue {
    /// Severity of this issue.
    pub fn severity(&self) -> Severity {
        match self {
            Issue::UnknownClass { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::UnresolvedGroupPlaceholder { group, placeholder } => write!(
                f,
                "StyleGroup {group} uses {placeholder}, which does not exist or contains references itself"
            ),
            Issue::UnresolvedSubclassPlaceholder {
                feature,
                subclass,
                group,
            } => write!(
                f,
                "Subclass {subclass} of MapFeature {feature} is referencing non-existent StyleGroup {group}"
            ),
            Issue::UnresolvedReference { feature, target } => write!(
                f,
                "MapFeature {feature} is referencing non-existent MapFeature {target}"
            ),
            Issue::ReferenceCycle { chain } => {
                write!(f, "MapFeature references form a cycle: {}", chain.join(" -> "))
            }
            Issue::ReferenceChainTooDeep { feature, max_depth } => write!(
                f,
                "MapFeature {feature} is referencing through more than {max_depth} other references"
            ),
            Issue::UnknownClass { feature } => write!(
                f,
                "MapFeature {feature} is not part of the classification and keeps no subclasses"
            ),
        }
    }
}

impl std::error::Error for Issue {}

/// Issues collected over one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Issues {
    /// Issues that dropped something from the output.
    pub errors: Vec<Issue>,
    /// Issues that did not.
    pub warnings: Vec<Issue>,
}

impl Issues {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log an issue and record it under its severity.
    pub fn report(&mut self, issue: Issue) {
        match issue.severity() {
            Severity::Error => {
                error!("{}", issue);
                self.errors.push(issue);
            }
            Severity::Warning => {
                warn!("{}", issue);
                self.warnings.push(issue);
            }
        }
    }

    /// Whether nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Number of issues of either severity.
    pub fn len(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }

    /// Errors first, then warnings.
    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.errors.iter().chain(&self.warnings)
    }

    /// Merge another collection into this one.
    pub fn merge(&mut self, other: Issues) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_report_sorts_by_severity() {
        let mut issues = Issues::new();
        issues.report(Issue::UnknownClass {
            feature: "harbour".into(),
        });
        issues.report(Issue::UnresolvedReference {
            feature: "military".into(),
            target: "airway".into(),
        });
        assert_eq!(issues.errors.len(), 1);
        assert_eq!(issues.warnings.len(), 1);
        assert_eq!(issues.len(), 2);
        let first = issues.iter().next().unwrap();
        assert_eq!(first.severity(), Severity::Error);
    }

    #[test]
    fn test_messages() {
        let cycle = Issue::ReferenceCycle {
            chain: vec!["a".into(), "b".into(), "a".into()],
        };
        insta::assert_snapshot!(cycle.to_string(), @"MapFeature references form a cycle: a -> b -> a");
        let missing = Issue::UnresolvedSubclassPlaceholder {
            feature: "aeroway".into(),
            subclass: "aerodrome".into(),
            group: "Nope".into(),
        };
        insta::assert_snapshot!(
            missing.to_string(),
            @"Subclass aerodrome of MapFeature aeroway is referencing non-existent StyleGroup Nope"
        );
    }
}
