//! The user's constraint set: variable name → chosen value.
//!
//! A missing key means "unconstrained". The configuration is mutated only
//! through the three update rules below, one per widget family, and is
//! serialized as a flat JSON object for every server request.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A value a widget can put in the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ConfigValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ConfigValue::Bool(b) => Value::Bool(*b),
            ConfigValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ConfigValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Number(n) => write!(f, "{}", n),
            ConfigValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<f64> for ConfigValue {
    fn from(n: f64) -> Self {
        ConfigValue::Number(n)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Text(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Text(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    values: BTreeMap<String, ConfigValue>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.values.iter()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Enum and boolean selections: "Any" (`None`) removes the constraint.
    pub fn apply_selection(&mut self, name: &str, new_value: Option<&ConfigValue>) {
        match new_value {
            None => {
                self.values.remove(name);
            }
            Some(v) => {
                self.values.insert(name.to_string(), v.clone());
            }
        }
    }

    /// Choice groups: the previous member is released, the new one (if
    /// any) is set to `true`.
    pub fn apply_group_selection(&mut self, new_member: Option<&str>, old_member: Option<&str>) {
        if let Some(old) = old_member {
            self.values.remove(old);
        }
        if let Some(new) = new_member {
            self.values.insert(new.to_string(), ConfigValue::Bool(true));
        }
    }

    /// Numeric slide while the widget is enabled.
    pub fn apply_number(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), ConfigValue::Number(value));
    }

    /// Numeric toggle: enabling publishes the current value, disabling
    /// removes the constraint.
    pub fn apply_number_toggle(&mut self, name: &str, enabled: bool, value: f64) {
        if enabled {
            self.apply_number(name, value);
        } else {
            self.values.remove(name);
        }
    }

    pub fn to_json_map(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.to_json_map())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_selection_any_is_inverse_of_set() {
        let mut cfg = Configuration::new();
        cfg.apply_selection("flag", Some(&ConfigValue::Bool(true)));
        assert_eq!(cfg.get("flag"), Some(&ConfigValue::Bool(true)));
        cfg.apply_selection("flag", None);
        assert!(!cfg.contains("flag"));
        assert!(cfg.is_empty());
    }

    #[test]
    fn test_group_exclusivity() {
        let mut cfg = Configuration::new();
        cfg.apply_group_selection(Some("a"), None);
        cfg.apply_group_selection(Some("b"), Some("a"));
        assert!(!cfg.contains("a"));
        assert_eq!(cfg.get("b"), Some(&ConfigValue::Bool(true)));
        assert_eq!(cfg.len(), 1);

        cfg.apply_group_selection(None, Some("b"));
        assert!(cfg.is_empty());
    }

    #[test]
    fn test_number_toggle() {
        let mut cfg = Configuration::new();
        cfg.apply_number_toggle("x", true, 5.0);
        assert_eq!(cfg.get("x"), Some(&ConfigValue::Number(5.0)));
        cfg.apply_number("x", 7.5);
        assert_eq!(cfg.get("x").and_then(ConfigValue::as_number), Some(7.5));
        cfg.apply_number_toggle("x", false, 7.5);
        assert!(!cfg.contains("x"));
    }

    #[test]
    fn test_serializes_flat() {
        let mut cfg = Configuration::new();
        cfg.apply_selection("flag", Some(&true.into()));
        cfg.apply_selection("font", Some(&"serif".into()));
        cfg.apply_number("x", 5.0);
        assert_eq!(cfg.to_json(), json!({"flag": true, "font": "serif", "x": 5.0}));
        assert_eq!(serde_json::to_value(&cfg).unwrap(), cfg.to_json());

        let back: Configuration = serde_json::from_value(cfg.to_json()).unwrap();
        assert_eq!(back, cfg);
    }
}
