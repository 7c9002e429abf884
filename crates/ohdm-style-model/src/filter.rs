//! Boolean predicates over feature attributes.

use std::fmt;

/// Attribute that carries a feature's subclass name.
pub const SUBCLASS_PROPERTY: &str = "subclassname";

/// A literal operand of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Text, written quoted: `'aerodrome'`
    Text(String),
    /// Number: `3`, `-0.5`
    Number(f64),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text(text) => write!(f, "'{}'", text.replace('\'', "''")),
            Literal::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `LIKE`
    Like,
}

impl CompareOp {
    /// Operator as written in filter text.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
            CompareOp::Like => "LIKE",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter expression. The default filter matches every feature.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// Matches everything.
    #[default]
    Include,
    /// `property op value`
    Compare {
        /// Attribute name.
        property: String,
        /// Operator.
        op: CompareOp,
        /// Right-hand operand.
        value: Literal,
    },
    /// All children match.
    And(Vec<Filter>),
    /// Any child matches.
    Or(Vec<Filter>),
    /// Child does not match.
    Not(Box<Filter>),
}

impl Filter {
    /// `property op value`.
    pub fn compare(property: impl Into<String>, op: CompareOp, value: Literal) -> Self {
        Filter::Compare {
            property: property.into(),
            op,
            value,
        }
    }

    /// `subclassname = '<name>'`.
    pub fn subclass(name: &str) -> Self {
        Filter::compare(
            SUBCLASS_PROPERTY,
            CompareOp::Eq,
            Literal::Text(name.to_string()),
        )
    }

    /// Whether this filter matches everything.
    pub fn is_include(&self) -> bool {
        matches!(self, Filter::Include)
    }

    /// Conjunction of `self` and `other`.
    ///
    /// Equal filters are not repeated and `Include` on either side is absorbed,
    /// so combining with a match-all filter replaces it. Nested conjunctions
    /// are flattened.
    pub fn and(self, other: Filter) -> Filter {
        if self == other {
            return self;
        }
        match (self, other) {
            (Filter::Include, other) => other,
            (this, Filter::Include) => this,
            (Filter::And(mut left), Filter::And(right)) => {
                for filter in right {
                    if !left.contains(&filter) {
                        left.push(filter);
                    }
                }
                Filter::And(left)
            }
            (Filter::And(mut left), other) => {
                if !left.contains(&other) {
                    left.push(other);
                }
                Filter::And(left)
            }
            (this, Filter::And(mut right)) => {
                if !right.contains(&this) {
                    right.insert(0, this);
                }
                Filter::And(right)
            }
            (this, other) => Filter::And(vec![this, other]),
        }
    }

    /// Disjunction of `filters`. Any `Include` makes the whole filter `Include`.
    pub fn any(filters: Vec<Filter>) -> Filter {
        if filters.iter().any(Filter::is_include) {
            return Filter::Include;
        }
        let mut flat: Vec<Filter> = Vec::with_capacity(filters.len());
        for filter in filters {
            let children = match filter {
                Filter::Or(children) => children,
                other => vec![other],
            };
            for child in children {
                if !flat.contains(&child) {
                    flat.push(child);
                }
            }
        }
        match flat.len() {
            0 => Filter::Include,
            1 => flat.remove(0),
            _ => Filter::Or(flat),
        }
    }

    /// Negation of `self`.
    pub fn negate(self) -> Filter {
        match self {
            Filter::Not(inner) => *inner,
            other => Filter::Not(Box::new(other)),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Filter::Or(_) => 0,
            Filter::And(_) => 1,
            _ => 2,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, parent: u8) -> fmt::Result {
        if self.precedence() <= parent && self.precedence() < 2 {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Include => f.write_str("INCLUDE"),
            Filter::Compare {
                property,
                op,
                value,
            } => write!(f, "{property} {op} {value}"),
            Filter::And(children) | Filter::Or(children) => {
                let (sep, level) = match self {
                    Filter::And(_) => (" AND ", 1),
                    _ => (" OR ", 0),
                };
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    child.fmt_child(f, level)?;
                }
                Ok(())
            }
            Filter::Not(inner) => {
                f.write_str("NOT ")?;
                inner.fmt_child(f, 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    fn gt(property: &str, n: f64) -> Filter {
        Filter::compare(property, CompareOp::Gt, Literal::Number(n))
    }

    #[test]
    fn test_and_replaces_include() {
        let sub = Filter::subclass("aerodrome");
        assert_eq!(Filter::Include.and(sub.clone()), sub);
        assert_eq!(sub.clone().and(Filter::Include), sub);
    }

    #[test]
    fn test_and_skips_equal_filter() {
        let sub = Filter::subclass("aerodrome");
        assert_eq!(sub.clone().and(sub.clone()), sub);
    }

    #[test]
    fn test_and_flattens() {
        let combined = gt("pop", 3.0)
            .and(gt("area", 10.0))
            .and(Filter::subclass("x"));
        assert_eq!(
            combined,
            Filter::And(vec![gt("pop", 3.0), gt("area", 10.0), Filter::subclass("x")])
        );
        // Adding a conjunct that is already present leaves the filter alone.
        assert_eq!(combined.clone().and(gt("pop", 3.0)), combined);
    }

    #[test]
    fn test_any() {
        assert_eq!(Filter::any(vec![]), Filter::Include);
        assert_eq!(Filter::any(vec![gt("a", 1.0)]), gt("a", 1.0));
        assert_eq!(
            Filter::any(vec![gt("a", 1.0), Filter::Include]),
            Filter::Include
        );
        assert_eq!(
            Filter::any(vec![gt("a", 1.0), gt("b", 2.0), gt("a", 1.0)]),
            Filter::Or(vec![gt("a", 1.0), gt("b", 2.0)])
        );
    }

    #[test]
    fn test_display() {
        let filter = Filter::any(vec![gt("pop", 3.0), gt("area", 1.5)])
            .and(Filter::subclass("it's"))
            .and(Filter::subclass("b").negate());
        insta::assert_snapshot!(
            filter.to_string(),
            @"(pop > 3 OR area > 1.5) AND subclassname = 'it''s' AND NOT subclassname = 'b'"
        );
        assert_eq!(Filter::Include.to_string(), "INCLUDE");
    }
}
