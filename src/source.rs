//! Variable declarations served by `GET /config_src`.
//!
//! ```json
//! {
//!   "booleans": ["flag", ...],
//!   "enums":    {"font": ["serif", "sans"], ...},
//!   "choices":  [["a", "b"], ...],
//!   "numbers":  {"x": [min, max, decimal_places], ...}
//! }
//! ```
//! Every section is optional.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::widgets::MAX_DECIMALS;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumberDomain {
    pub min: f64,
    pub max: f64,
    pub decimals: u32,
}

impl NumberDomain {
    fn from_triple(raw: &[f64]) -> Result<Self> {
        match raw {
            [min, max, decimals]
                if (0.0..=MAX_DECIMALS as f64).contains(decimals) && decimals.fract() == 0.0 =>
            {
                Ok(Self {
                    min: *min,
                    max: *max,
                    decimals: *decimals as u32,
                })
            }
            _ => Err(anyhow!("number domain must be [min, max, decimal_places], got {:?}", raw)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawConfigSource {
    #[serde(default)]
    booleans: Vec<String>,
    #[serde(default)]
    enums: BTreeMap<String, Vec<serde_json::Value>>,
    #[serde(default)]
    choices: Vec<Vec<String>>,
    #[serde(default)]
    numbers: BTreeMap<String, Vec<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSource {
    pub booleans: Vec<String>,
    pub enums: BTreeMap<String, Vec<String>>,
    pub choices: Vec<Vec<String>>,
    pub numbers: BTreeMap<String, NumberDomain>,
}

impl ConfigSource {
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let raw: RawConfigSource = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawConfigSource = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfigSource) -> Result<Self> {
        // enum values may be declared as numbers; the widget shows them as text
        let enums = raw
            .enums
            .into_iter()
            .map(|(name, values)| {
                let values = values
                    .into_iter()
                    .map(|v| match v {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect();
                (name, values)
            })
            .collect();
        let mut numbers = BTreeMap::new();
        for (name, triple) in raw.numbers {
            let domain = NumberDomain::from_triple(&triple)
                .map_err(|e| anyhow!("number '{}': {}", name, e))?;
            numbers.insert(name, domain);
        }
        Ok(Self {
            booleans: raw.booleans,
            enums,
            choices: raw.choices,
            numbers,
        })
    }

    /// Number of independently constrainable variables (a choice group
    /// counts once).
    pub fn variable_count(&self) -> usize {
        self.booleans.len() + self.enums.len() + self.choices.len() + self.numbers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_source() {
        let src = ConfigSource::from_json(json!({
            "booleans": ["flag"],
            "enums": {"font": ["serif", "sans"], "size": [10, 11]},
            "choices": [["a", "b"], ["c"]],
            "numbers": {"x": [0, 10, 1]}
        }))
        .unwrap();
        assert_eq!(src.booleans, vec!["flag"]);
        assert_eq!(src.enums["font"], vec!["serif", "sans"]);
        assert_eq!(src.enums["size"], vec!["10", "11"]);
        assert_eq!(src.choices.len(), 2);
        assert_eq!(src.numbers["x"], NumberDomain { min: 0.0, max: 10.0, decimals: 1 });
        assert_eq!(src.variable_count(), 6);
    }

    #[test]
    fn test_missing_sections_default_empty() {
        let src = ConfigSource::parse(r#"{"booleans": ["flag"]}"#).unwrap();
        assert!(src.enums.is_empty());
        assert!(src.choices.is_empty());
        assert!(src.numbers.is_empty());
        assert_eq!(src.variable_count(), 1);
    }

    #[test]
    fn test_bad_number_domain_rejected() {
        let err = ConfigSource::from_json(json!({"numbers": {"x": [0, 10]}})).unwrap_err();
        assert!(err.to_string().contains("'x'"));
        assert!(ConfigSource::from_json(json!({"numbers": {"x": [0, 10, 1.5]}})).is_err());
        assert!(ConfigSource::from_json(json!({"numbers": {"x": [0, 10, 400]}})).is_err());
        assert!(ConfigSource::from_json(json!({"numbers": {"x": [0, 10, 1e12]}})).is_err());
        assert!(ConfigSource::from_json(json!({"numbers": {"x": [0, 10, -1]}})).is_err());
        let src = ConfigSource::from_json(json!({"numbers": {"x": [0, 10, 15]}})).unwrap();
        assert_eq!(src.numbers["x"].decimals, MAX_DECIMALS);
    }
}
