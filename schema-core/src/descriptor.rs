use serde::{Deserialize, Serialize};

use crate::transport::StateMap;

/// Value domain of a schema property. Vendor documents carry a wider set of
/// format strings (`uint8`..`int64` and friends); they all collapse onto
/// these four.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PropertyFormat {
    Bool,
    Int,
    Float,
    #[serde(rename = "string")]
    Str,
}

impl PropertyFormat {
    pub fn parse(s: &str) -> Self {
        match s {
            "bool" => Self::Bool,
            "float" => Self::Float,
            "string" => Self::Str,
            _ if s.starts_with("uint") || s.starts_with("int") => Self::Int,
            _ => Self::Str,
        }
    }
}

/// One enumerated value of a property, e.g. `{"value": 1, "description": "Cool"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValueEntry {
    pub value: serde_json::Value,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

/// Raw device address of a property.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PropertyAddress {
    pub siid: i32,
    pub piid: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
    Kelvin,
}

/// Immutable description of one property as declared by the device schema.
///
/// `name` is the short name derived from the property urn and is unique
/// within its service; `full_name` is `"{service}.{name}"` and keys the flat
/// state snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyDescriptor {
    pub siid: i32,
    pub iid: i32,
    pub name: String,
    pub full_name: String,
    pub format: PropertyFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value_list: Vec<ValueEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<ValueRange>,
}

impl PropertyDescriptor {
    pub fn address(&self) -> PropertyAddress {
        PropertyAddress { siid: self.siid, piid: self.iid }
    }

    pub fn is_bool(&self) -> bool {
        self.format == PropertyFormat::Bool
    }

    pub fn range_min(&self) -> Option<f64> {
        self.range.map(|r| r.min)
    }

    pub fn range_max(&self) -> Option<f64> {
        self.range.map(|r| r.max)
    }

    pub fn range_step(&self) -> Option<f64> {
        self.range.map(|r| r.step)
    }

    /// Description of an enumerated raw value, if the value is listed.
    pub fn list_description(&self, raw: &serde_json::Value) -> Option<&str> {
        self.value_list.iter().find(|e| raw_eq(&e.value, raw)).map(|e| e.description.as_str())
    }

    /// All declared descriptions, in schema order.
    pub fn descriptions(&self) -> Vec<&str> {
        self.value_list.iter().map(|e| e.description.as_str()).collect()
    }

    /// Raw value for a description. Comparison ignores case.
    pub fn list_value(&self, description: &str) -> Option<serde_json::Value> {
        self.value_list
            .iter()
            .find(|e| e.description.eq_ignore_ascii_case(description))
            .map(|e| e.value.clone())
    }

    /// Raw value of the first candidate present in the value list, in
    /// candidate order.
    pub fn list_first(&self, descriptions: &[&str]) -> Option<serde_json::Value> {
        descriptions.iter().find_map(|d| self.list_value(d))
    }

    /// Raw values of every candidate present in the value list.
    pub fn list_search(&self, descriptions: &[&str]) -> Vec<serde_json::Value> {
        self.value_list
            .iter()
            .filter(|e| descriptions.iter().any(|d| e.description.eq_ignore_ascii_case(d)))
            .map(|e| e.value.clone())
            .collect()
    }

    /// Current raw value of this property in a snapshot.
    pub fn read<'a>(&self, state: &'a StateMap) -> Option<&'a serde_json::Value> {
        state.get(&self.full_name)
    }

    pub fn read_or<'a>(
        &self,
        state: &'a StateMap,
        default: &'a serde_json::Value,
    ) -> &'a serde_json::Value {
        state.get(&self.full_name).unwrap_or(default)
    }

    pub fn temperature_unit(&self) -> Option<TemperatureUnit> {
        match self.unit.as_deref() {
            Some("celsius") => Some(TemperatureUnit::Celsius),
            Some("fahrenheit") => Some(TemperatureUnit::Fahrenheit),
            Some("kelvin") => Some(TemperatureUnit::Kelvin),
            _ => None,
        }
    }
}

/// Raw value equality tolerant of the int/float split in device reports.
pub fn raw_eq(a: &serde_json::Value, b: &serde_json::Value) -> bool {
    if a == b {
        return true;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Boolean reading of a raw value. Devices report booleans as true/false,
/// 0/1 or on/off strings depending on firmware.
pub fn truthy(v: &serde_json::Value) -> Option<bool> {
    match v {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        serde_json::Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "on" | "1" | "yes" => Some(true),
            "false" | "off" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
