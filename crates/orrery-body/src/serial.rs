//! Cache document: the persisted seed, blueprint selection, and property values.
//!
//! ```json
//! {"seed":42,"blueprintIndex":-1,"overrideFlag":false,
//!  "properties":{"brightness":1.0,"surface_color":[0.5,0.4,0.3,1.0],"surface_material":"rock"}}
//! ```
//!
//! Every field is optional on import. Decoding validates the whole document
//! against the target blueprint before anything is applied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::blueprint::BlueprintSelection;
use crate::error::DeserializationError;
use crate::registry::{PropertyDefinition, PropertyKind, PropertyRegistry};
use crate::value::PropertyValue;

/// Serialized body state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheDocument {
    /// Seed, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Pinned blueprint index, `-1` meaning "derive from the seed".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blueprint_index: Option<i64>,
    /// Whether the blueprint index is pinned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_flag: Option<bool>,
    /// Property values by key.
    pub properties: BTreeMap<String, Value>,
}

impl CacheDocument {
    /// Capture the selection and the stored (not animated) property values.
    pub fn export(selection: &BlueprintSelection, registry: &PropertyRegistry) -> Self {
        let mut properties = BTreeMap::new();
        for key in registry.keys() {
            if let (Ok(def), Ok(value)) = (registry.definition(key), registry.stored_value(key)) {
                properties.insert(key.to_string(), encode_value(def, value));
            }
        }
        Self {
            seed: Some(selection.seed),
            blueprint_index: Some(selection.pinned().map_or(-1, |i| i as i64)),
            override_flag: Some(selection.override_flag),
            properties,
        }
    }

    /// Compact JSON text.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse JSON text.
    pub fn parse(text: &str) -> Result<Self, DeserializationError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// JSON form of a value: numbers, 4-element color arrays, option names.
pub fn encode_value(def: &PropertyDefinition, value: PropertyValue) -> Value {
    match (&def.kind, value) {
        (PropertyKind::MaterialSelection { options, .. }, PropertyValue::Selection(i)) => {
            match options.get(i) {
                Some(name) => Value::from(name.as_str()),
                None => Value::from(i),
            }
        }
        (_, PropertyValue::Number(v)) => Value::from(v as f64),
        (_, PropertyValue::Color(c)) => Value::from(c.map(f64::from).to_vec()),
        (_, PropertyValue::Selection(i)) => Value::from(i),
    }
}

/// Decode the `blueprintIndex` field.
pub fn decode_blueprint_index(
    raw: i64,
    count: usize,
) -> Result<Option<usize>, DeserializationError> {
    match raw {
        -1 => Ok(None),
        i if i >= 0 && (i as u64) < count as u64 => Ok(Some(i as usize)),
        i => Err(DeserializationError::UnknownBlueprint(i)),
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> DeserializationError {
    DeserializationError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn decode_value(def: &PropertyDefinition, raw: &Value) -> Result<PropertyValue, DeserializationError> {
    let key = def.key.as_str();
    match &def.kind {
        PropertyKind::Numeric { .. } => raw
            .as_f64()
            .map(|v| PropertyValue::Number(v as f32))
            .ok_or_else(|| invalid(key, format!("expected a number, got {raw}"))),
        PropertyKind::Color { .. } => {
            let parts = raw
                .as_array()
                .ok_or_else(|| invalid(key, "expected a color array"))?;
            let mut color = [0.0, 0.0, 0.0, 1.0];
            if !(3..=4).contains(&parts.len()) {
                return Err(invalid(key, format!("expected 3 or 4 components, got {}", parts.len())));
            }
            for (slot, part) in color.iter_mut().zip(parts) {
                *slot = part
                    .as_f64()
                    .ok_or_else(|| invalid(key, "color components must be numbers"))?
                    as f32;
            }
            Ok(PropertyValue::Color(color))
        }
        PropertyKind::MaterialSelection { options, .. } => {
            if let Some(name) = raw.as_str() {
                return def
                    .option_index(name)
                    .map(PropertyValue::Selection)
                    .ok_or_else(|| invalid(key, format!("unknown option {name:?}")));
            }
            match raw.as_u64() {
                Some(i) if (i as usize) < options.len() => Ok(PropertyValue::Selection(i as usize)),
                Some(i) => Err(invalid(key, format!("option index {i} out of range"))),
                None => Err(invalid(key, "expected an option name or index")),
            }
        }
    }
}

/// Validate and decode every property entry against `defs`.
///
/// Keys the blueprint does not define are skipped. Any malformed entry fails
/// the whole decode.
pub fn decode_properties(
    defs: &[PropertyDefinition],
    properties: &BTreeMap<String, Value>,
) -> Result<Vec<(String, PropertyValue)>, DeserializationError> {
    let mut decoded = Vec::with_capacity(properties.len());
    for (key, raw) in properties {
        let Some(def) = defs.iter().find(|d| &d.key == key) else {
            warn!(key = %key, "ignoring unknown property in cache");
            continue;
        };
        let value = decode_value(def, raw)?;
        def.clamp(value)
            .map_err(|err| invalid(key, err.to_string()))?;
        decoded.push((key.clone(), value));
    }
    Ok(decoded)
}
