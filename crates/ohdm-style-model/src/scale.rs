use std::fmt;

/// Half-open scale-denominator interval `[min, max)` in which a rule applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRange {
    /// Smallest denominator (inclusive), `0` when unbounded.
    pub min: f64,
    /// Largest denominator (exclusive), `+∞` when unbounded.
    pub max: f64,
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

impl ScaleRange {
    /// The interval `[0, +∞)`.
    pub const UNBOUNDED: ScaleRange = ScaleRange {
        min: 0.0,
        max: f64::INFINITY,
    };

    /// Create a new range.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.min <= 0.0 && self.max == f64::INFINITY
    }

    /// Whether `denominator` lies in `[min, max)`.
    pub fn contains(&self, denominator: f64) -> bool {
        denominator >= self.min && denominator < self.max
    }

    /// Range narrowed to also satisfy `other`.
    pub fn intersect(&self, other: ScaleRange) -> ScaleRange {
        ScaleRange {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }
}

impl fmt::Display for ScaleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.max == f64::INFINITY {
            write!(f, "[{}, inf)", self.min)
        } else {
            write!(f, "[{}, {})", self.min, self.max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_contains_is_half_open() {
        let range = ScaleRange::new(1000.0, 5000.0);
        assert!(range.contains(1000.0));
        assert!(range.contains(4999.0));
        assert!(!range.contains(5000.0));
        assert!(!range.contains(999.0));
        assert!(ScaleRange::default().contains(1e12));
    }

    #[test]
    fn test_intersect() {
        let a = ScaleRange::new(1000.0, f64::INFINITY);
        let b = ScaleRange::new(0.0, 5000.0);
        assert_eq!(a.intersect(b), ScaleRange::new(1000.0, 5000.0));
        assert!(!a.is_unbounded());
        assert!(ScaleRange::UNBOUNDED.is_unbounded());
        assert_eq!(a.to_string(), "[1000, inf)");
    }
}
