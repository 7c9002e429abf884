use crate::{Filter, ScaleRange, Symbolizer, SymbolizerKind};

/// A concrete styling rule.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rule {
    /// Name used for cross-referencing only (the style group it came from).
    pub name: Option<String>,
    /// Which features the rule applies to.
    pub filter: Filter,
    /// Scale interval in which the rule applies.
    pub scale: ScaleRange,
    /// What to draw, in order.
    pub symbolizers: Vec<Symbolizer>,
}

impl Rule {
    /// Create a match-all, all-scales rule drawing `symbolizers`.
    pub fn new(symbolizers: Vec<Symbolizer>) -> Self {
        Self {
            symbolizers,
            ..Self::default()
        }
    }

    /// Set the filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the scale range.
    pub fn with_scale(mut self, scale: ScaleRange) -> Self {
        self.scale = scale;
        self
    }

    /// Set the name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Whether any symbolizer has the given kind.
    pub fn has_symbolizer(&self, kind: SymbolizerKind) -> bool {
        self.symbolizers.iter().any(|s| s.kind == kind)
    }
}

/// Stand-in for the rules of the style group named `name_of_original`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaceholderRule {
    /// Name of the style group this placeholder stands for.
    pub name_of_original: String,
    /// Filter conjoined onto every substituted rule.
    pub filter: Filter,
    /// Scale range given to every substituted rule.
    pub scale: ScaleRange,
}

impl PlaceholderRule {
    /// Create a placeholder with a match-all filter and unbounded scale.
    pub fn new(name_of_original: impl Into<String>) -> Self {
        Self {
            name_of_original: name_of_original.into(),
            ..Self::default()
        }
    }

    /// Concrete copy of `rule` scoped by this placeholder's filter and scale.
    pub fn instantiate(&self, rule: &Rule) -> Rule {
        Rule {
            name: rule.name.clone(),
            filter: rule.filter.clone().and(self.filter.clone()),
            scale: self.scale,
            symbolizers: rule.symbolizers.clone(),
        }
    }
}

/// A rule as declared: either concrete or a placeholder for a style group.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleRule {
    /// A rule with symbolizers.
    Concrete(Rule),
    /// `useStyle = <group>`
    Placeholder(PlaceholderRule),
}

impl StyleRule {
    /// Whether this is a placeholder.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, StyleRule::Placeholder(_))
    }

    /// Conjoin `filter` onto this rule's filter.
    pub fn and_filter(&mut self, filter: &Filter) {
        let current = match self {
            StyleRule::Concrete(rule) => &mut rule.filter,
            StyleRule::Placeholder(placeholder) => &mut placeholder.filter,
        };
        *current = std::mem::take(current).and(filter.clone());
    }

    /// Replace this rule's scale range.
    pub fn set_scale(&mut self, scale: ScaleRange) {
        match self {
            StyleRule::Concrete(rule) => rule.scale = scale,
            StyleRule::Placeholder(placeholder) => placeholder.scale = scale,
        }
    }

    /// The concrete rule, if this is one.
    pub fn as_concrete(&self) -> Option<&Rule> {
        match self {
            StyleRule::Concrete(rule) => Some(rule),
            StyleRule::Placeholder(_) => None,
        }
    }
}

impl From<Rule> for StyleRule {
    fn from(rule: Rule) -> Self {
        StyleRule::Concrete(rule)
    }
}

impl From<PlaceholderRule> for StyleRule {
    fn from(placeholder: PlaceholderRule) -> Self {
        StyleRule::Placeholder(placeholder)
    }
}
