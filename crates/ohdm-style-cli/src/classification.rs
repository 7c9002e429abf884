//! Loading a classification from a JSON file.

use std::fmt;

use ohdm_style_model::InMemoryClassification;
use serde_json::Value;

/// Why a classification file was rejected.
#[derive(Debug)]
pub enum ClassificationError {
    /// Not valid JSON.
    Json(serde_json::Error),
    /// The top-level value is not an object.
    NotAnObject,
    /// A class maps to something other than an array.
    NotAnArray { class: String },
    /// A subclass entry is not a string.
    NotAString { class: String, index: usize },
}

impl fmt::Display for ClassificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationError::Json(e) => write!(f, "invalid JSON: {e}"),
            ClassificationError::NotAnObject => {
                write!(f, "expected an object mapping class names to subclasses")
            }
            ClassificationError::NotAnArray { class } => {
                write!(f, "subclasses of class `{class}` must be an array")
            }
            ClassificationError::NotAString { class, index } => {
                write!(f, "subclass #{index} of class `{class}` must be a string")
            }
        }
    }
}

impl std::error::Error for ClassificationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClassificationError::Json(e) => Some(e),
            _ => None,
        }
    }
}

/// Parse `{"class": ["subclass", ...], ...}`, keeping file order.
pub fn parse_classification(text: &str) -> Result<InMemoryClassification, ClassificationError> {
    let value: Value = serde_json::from_str(text).map_err(ClassificationError::Json)?;
    let Value::Object(classes) = value else {
        return Err(ClassificationError::NotAnObject);
    };

    let mut classification = InMemoryClassification::new();
    for (class, subclasses) in classes {
        let Value::Array(items) = subclasses else {
            return Err(ClassificationError::NotAnArray { class });
        };
        let mut names = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match item {
                Value::String(name) => names.push(name),
                _ => return Err(ClassificationError::NotAString { class, index }),
            }
        }
        classification = classification.with_class(&class, names);
    }
    Ok(classification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;
    use ohdm_style_model::Classification;

    #[test]
    fn test_parse_keeps_order() {
        let classification = parse_classification(
            r#"{"waterway": ["river", "canal"], "aeroway": ["aerodrome"], "empty": []}"#,
        )
        .unwrap();
        assert_eq!(
            classification.class_names(),
            vec!["waterway", "aeroway", "empty"]
        );
        let waterway = classification.class("waterway").unwrap();
        assert!(waterway.has_subclass("canal"));
        assert!(!waterway.has_subclass("aerodrome"));
    }

    #[test]
    fn test_rejects_wrong_shapes() {
        assert!(matches!(
            parse_classification("[]"),
            Err(ClassificationError::NotAnObject)
        ));
        assert!(matches!(
            parse_classification(r#"{"a": "b"}"#),
            Err(ClassificationError::NotAnArray { class }) if class == "a"
        ));
        let error = parse_classification(r#"{"a": ["b", 3]}"#).unwrap_err();
        assert_eq!(error.to_string(), "subclass #1 of class `a` must be a string");
        assert!(matches!(
            parse_classification("{"),
            Err(ClassificationError::Json(_))
        ));
    }
}
