//! Symbolizers: what a rule draws and how.

use std::fmt;

/// Rendering intent of a symbolizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolizerKind {
    /// Area fill.
    Polygon,
    /// Stroked line.
    Line,
    /// Mark or graphic at a point.
    Point,
    /// Label.
    Text,
}

impl SymbolizerKind {
    /// Geometry kinds in output order: points, lines, polygons.
    pub const GEOMETRIES: [SymbolizerKind; 3] = [
        SymbolizerKind::Point,
        SymbolizerKind::Line,
        SymbolizerKind::Polygon,
    ];

    /// Suffix of the per-geometry output feature, `None` for labels.
    pub fn geometry_suffix(&self) -> Option<&'static str> {
        match self {
            SymbolizerKind::Point => Some("points"),
            SymbolizerKind::Line => Some("lines"),
            SymbolizerKind::Polygon => Some("polygons"),
            SymbolizerKind::Text => None,
        }
    }

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolizerKind::Polygon => "polygon",
            SymbolizerKind::Line => "line",
            SymbolizerKind::Point => "point",
            SymbolizerKind::Text => "text",
        }
    }
}

impl fmt::Display for SymbolizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single style property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// `none`
    None,
    /// Hex color, normalized to `#rrggbb` lowercase.
    Color(String),
    /// Number with an optional unit: `2`, `10px`, `50%`.
    Measure {
        /// Numeric value.
        value: f64,
        /// Unit suffix, if any.
        unit: Option<String>,
    },
    /// Bare word: `circle`, `bold`.
    Identifier(String),
    /// Quoted text.
    Text(String),
    /// Attribute expression in brackets: `[name]`.
    Expression(String),
    /// Variable: `@main`.
    Variable(String),
    /// `url(...)`
    Url(String),
    /// Function call: `symbol(circle)`.
    Function {
        /// Function name.
        name: String,
        /// Arguments.
        args: Vec<PropertyValue>,
    },
    /// Whitespace separated values: `2 4`.
    Multi(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Color value from `#rgb` or `#rrggbb`; other text is kept lowercased.
    pub fn color(hex: &str) -> Self {
        let digits = hex.trim_start_matches('#').to_ascii_lowercase();
        if digits.len() == 3 {
            let expanded: String = digits.chars().flat_map(|c| [c, c]).collect();
            PropertyValue::Color(format!("#{expanded}"))
        } else {
            PropertyValue::Color(format!("#{digits}"))
        }
    }

    /// Unitless number.
    pub fn number(value: f64) -> Self {
        PropertyValue::Measure { value, unit: None }
    }

    /// Bare identifier.
    pub fn ident(name: &str) -> Self {
        PropertyValue::Identifier(name.to_string())
    }

    /// Function call.
    pub fn function(name: &str, args: Vec<PropertyValue>) -> Self {
        PropertyValue::Function {
            name: name.to_string(),
            args,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::None => f.write_str("none"),
            PropertyValue::Color(hex) => f.write_str(hex),
            PropertyValue::Measure { value, unit } => {
                write!(f, "{value}{}", unit.as_deref().unwrap_or(""))
            }
            PropertyValue::Identifier(name) => f.write_str(name),
            PropertyValue::Text(text) => write!(f, "\"{text}\""),
            PropertyValue::Expression(expr) => write!(f, "[{expr}]"),
            PropertyValue::Variable(name) => write!(f, "@{name}"),
            PropertyValue::Url(url) => write!(f, "url({url})"),
            PropertyValue::Function { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            PropertyValue::Multi(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{value}")?;
                }
                Ok(())
            }
        }
    }
}

/// A named property with one or more comma separated values.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name, e.g. `stroke-width`.
    pub name: String,
    /// Values in declaration order.
    pub values: Vec<PropertyValue>,
}

impl Property {
    /// Create a property.
    pub fn new(name: impl Into<String>, values: Vec<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.name)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

/// One rendering instruction of a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbolizer {
    /// Rendering intent.
    pub kind: SymbolizerKind,
    /// Properties that configure it.
    pub properties: Vec<Property>,
}

impl Symbolizer {
    /// Create a symbolizer without properties.
    pub fn new(kind: SymbolizerKind) -> Self {
        Self {
            kind,
            properties: Vec::new(),
        }
    }

    /// Add a property.
    pub fn with(mut self, name: &str, value: PropertyValue) -> Self {
        self.properties.push(Property::new(name, vec![value]));
        self
    }

    /// Circle mark point, drawn by rules that name no fill, stroke or mark.
    pub fn default_point() -> Self {
        Symbolizer::new(SymbolizerKind::Point).with(
            "mark",
            PropertyValue::function("symbol", vec![PropertyValue::ident("circle")]),
        )
    }

    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}
