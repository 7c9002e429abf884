//! Zoom levels and the scale ranges they stand for.

use std::fmt;
use std::str::FromStr;

use crate::ScaleRange;

/// Highest supported zoom level.
pub const MAX_ZOOM_LEVEL: u8 = 19;

/// Scale denominator of each zoom level, from level 0 to level 19.
const SCALE_DENOMINATORS: [f64; MAX_ZOOM_LEVEL as usize + 1] = [
    500_000_000.0,
    250_000_000.0,
    150_000_000.0,
    70_000_000.0,
    35_000_000.0,
    15_000_000.0,
    10_000_000.0,
    4_000_000.0,
    2_000_000.0,
    1_000_000.0,
    500_000.0,
    250_000.0,
    150_000.0,
    70_000.0,
    35_000.0,
    15_000.0,
    8_000.0,
    4_000.0,
    2_000.0,
    1_000.0,
];

/// Errors building zoom levels and regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoomError {
    /// Zoom level outside `0..=19`.
    LevelOutOfRange(u32),
    /// Text that is not `N-M`, `>N`, `<N` or `default`.
    InvalidRegion(String),
}

impl fmt::Display for ZoomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoomError::LevelOutOfRange(level) => {
                write!(f, "zoom level {level} is outside 0-{MAX_ZOOM_LEVEL}")
            }
            ZoomError::InvalidRegion(text) => write!(f, "invalid zoom region `{text}`"),
        }
    }
}

impl std::error::Error for ZoomError {}

/// A map zoom level in `0..=19`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZoomLevel(u8);

impl ZoomLevel {
    /// Create a zoom level, rejecting values above 19.
    pub fn new(level: u32) -> Result<Self, ZoomError> {
        if level > MAX_ZOOM_LEVEL as u32 {
            return Err(ZoomError::LevelOutOfRange(level));
        }
        Ok(Self(level as u8))
    }

    /// The numeric level.
    pub fn level(&self) -> u8 {
        self.0
    }

    /// Fixed scale denominator for this level.
    pub fn scale_denominator(&self) -> f64 {
        SCALE_DENOMINATORS[self.0 as usize]
    }
}

impl fmt::Display for ZoomLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Zoom interval of a rule declaration.
///
/// A higher zoom level has a smaller scale denominator, so `min_zoom` holds
/// the larger level number and bounds the minimum denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ZoomRegion {
    /// Level whose denominator is the lower scale bound.
    pub min_zoom: Option<ZoomLevel>,
    /// Level whose denominator is the upper scale bound.
    pub max_zoom: Option<ZoomLevel>,
}

impl ZoomRegion {
    /// Region without bounds (`default`).
    pub fn empty() -> Self {
        Self::default()
    }

    /// `N-M`, in either order.
    pub fn between(a: ZoomLevel, b: ZoomLevel) -> Self {
        Self {
            min_zoom: Some(a.max(b)),
            max_zoom: Some(a.min(b)),
        }
    }

    /// `>N`
    pub fn above(level: ZoomLevel) -> Self {
        Self {
            min_zoom: Some(level),
            max_zoom: None,
        }
    }

    /// `<N`
    pub fn below(level: ZoomLevel) -> Self {
        Self {
            min_zoom: None,
            max_zoom: Some(level),
        }
    }

    /// Scale interval covered by this region.
    pub fn scale_range(&self) -> ScaleRange {
        ScaleRange {
            min: self.min_zoom.map_or(0.0, |z| z.scale_denominator()),
            max: self
                .max_zoom
                .map_or(f64::INFINITY, |z| z.scale_denominator()),
        }
    }
}

impl FromStr for ZoomRegion {
    type Err = ZoomError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || ZoomError::InvalidRegion(text.to_string());
        let level = |digits: &str| -> Result<ZoomLevel, ZoomError> {
            let digits = digits.trim();
            if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(invalid());
            }
            let value: u32 = digits.parse().map_err(|_| invalid())?;
            ZoomLevel::new(value)
        };

        let text_trimmed = text.trim();
        if text_trimmed == "default" {
            return Ok(Self::empty());
        }
        if let Some(rest) = text_trimmed.strip_prefix('>') {
            return Ok(Self::above(level(rest)?));
        }
        if let Some(rest) = text_trimmed.strip_prefix('<') {
            return Ok(Self::below(level(rest)?));
        }
        match text_trimmed.split_once('-') {
            Some((a, b)) => Ok(Self::between(level(a)?, level(b)?)),
            None => Err(invalid()),
        }
    }
}

impl fmt::Display for ZoomRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min_zoom, self.max_zoom) {
            (Some(min), Some(max)) => write!(f, "{max}-{min}"),
            (Some(min), None) => write!(f, ">{min}"),
            (None, Some(max)) => write!(f, "<{max}"),
            (None, None) => f.write_str("default"),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn scale(level: u32) -> f64 {
        SCALE_DENOMINATORS[level as usize]
    }

    proptest! {
        /// `N-M` bounds are `scale(max(N, M))` and `scale(min(N, M))`
        #[test]
        fn range_bounds_follow_level_table(a in 0u32..=19, b in 0u32..=19) {
            let region: ZoomRegion = format!("{a}-{b}").parse().unwrap();
            let range = region.scale_range();
            prop_assert_eq!(range.min, scale(a.max(b)));
            prop_assert_eq!(range.max, scale(a.min(b)));
            prop_assert!(range.min <= range.max);
        }

        /// Anything above level 19 is rejected
        #[test]
        fn levels_above_nineteen_are_rejected(level in 20u32..100) {
            let above = format!(">{level}").parse::<ZoomRegion>();
            prop_assert_eq!(above, Err(ZoomError::LevelOutOfRange(level)));
        }
    }
}
