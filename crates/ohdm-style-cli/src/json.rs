//! JSON rendering of style descriptors.

use ohdm_style_model::{Property, PropertyValue, Rule, Symbolizer};
use ohdm_style_resolve::{StyleDescriptor, StyleLayer};
use serde_json::{Map, Value, json};

pub fn descriptor_to_json(descriptor: &StyleDescriptor) -> Value {
    json!({
        "name": descriptor.name,
        "layers": descriptor.layers.iter().map(layer_to_json).collect::<Vec<_>>(),
    })
}

fn layer_to_json(layer: &StyleLayer) -> Value {
    json!({
        "name": layer.name,
        "rules": layer.rules.iter().map(rule_to_json).collect::<Vec<_>>(),
    })
}

fn rule_to_json(rule: &Rule) -> Value {
    let filter = if rule.filter.is_include() {
        Value::Null
    } else {
        Value::String(rule.filter.to_string())
    };
    json!({
        "name": rule.name,
        "filter": filter,
        "min_scale": scale_bound(rule.scale.min),
        "max_scale": scale_bound(rule.scale.max),
        "symbolizers": rule.symbolizers.iter().map(symbolizer_to_json).collect::<Vec<_>>(),
    })
}

/// Unbounded ends become `null`.
fn scale_bound(denominator: f64) -> Value {
    if denominator.is_finite() && denominator > 0.0 {
        json!(denominator)
    } else {
        Value::Null
    }
}

fn symbolizer_to_json(symbolizer: &Symbolizer) -> Value {
    let mut properties = Map::new();
    for property in &symbolizer.properties {
        properties.insert(property.name.clone(), property_to_json(property));
    }
    json!({
        "kind": symbolizer.kind.as_str(),
        "properties": properties,
    })
}

/// A single value is written as a string, several as an array of strings.
fn property_to_json(property: &Property) -> Value {
    match property.values.as_slice() {
        [value] => value_to_json(value),
        values => Value::Array(values.iter().map(value_to_json).collect()),
    }
}

fn value_to_json(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::None => Value::Null,
        PropertyValue::Text(text) => Value::String(text.clone()),
        PropertyValue::Measure { value, unit: None } => json!(value),
        other => Value::String(other.to_string()),
    }
}
