//! Predicted probabilities returned by `POST /predict`.
//!
//! For every option the server reports the probability that the current
//! configuration, with that one option changed, still produces a valid
//! document. "default" is the probability with the variable left free.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ConfigValue;
use crate::widgets::ChoiceKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BooleanProbas {
    #[serde(default)]
    pub default: f64,
    #[serde(rename = "true", default)]
    pub when_true: f64,
    #[serde(rename = "false", default)]
    pub when_false: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumProbas {
    #[serde(default)]
    pub default: f64,
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
}

/// One interval of a numeric variable between two decision-tree
/// thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limit {
    pub lower: f64,
    pub upper: f64,
    #[serde(default)]
    pub prob: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberProbas {
    #[serde(default)]
    pub default: Option<f64>,
    #[serde(default)]
    pub limits: Vec<Limit>,
}

impl NumberProbas {
    /// Index of the interval containing `value`. A value on a shared
    /// bound belongs to the lower interval, as the tree only takes the
    /// right branch above a threshold. Values past either end map to the
    /// edge.
    pub fn limit_index(&self, value: f64) -> Option<usize> {
        if self.limits.is_empty() {
            return None;
        }
        let last = self.limits.len() - 1;
        let idx = self
            .limits
            .iter()
            .position(|l| value <= l.upper)
            .unwrap_or(last);
        Some(idx)
    }

    pub fn limit_for(&self, value: f64) -> Option<&Limit> {
        self.limit_index(value).map(|i| &self.limits[i])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    #[serde(default)]
    pub booleans: BTreeMap<String, BooleanProbas>,
    #[serde(default)]
    pub enums: BTreeMap<String, EnumProbas>,
    #[serde(default)]
    pub choices: BTreeMap<String, f64>,
    #[serde(default)]
    pub numbers: BTreeMap<String, NumberProbas>,
}

impl Probabilities {
    /// Probability for one option of a choice widget.
    ///
    /// `variable` is the widget name (ignored for groups, whose options
    /// are themselves variables), `label` the option label and `value`
    /// its value (`None` for "Any"). Group "Any" has no probability.
    pub fn option_probability(
        &self,
        kind: ChoiceKind,
        variable: &str,
        label: &str,
        value: Option<&ConfigValue>,
    ) -> Option<f64> {
        match kind {
            ChoiceKind::Boolean => {
                let p = self.booleans.get(variable)?;
                match value {
                    None => Some(p.default),
                    Some(v) => Some(if v.as_bool()? { p.when_true } else { p.when_false }),
                }
            }
            ChoiceKind::Enum => {
                let p = self.enums.get(variable)?;
                match value {
                    None => Some(p.default),
                    Some(ConfigValue::Text(v)) => p.values.get(v).copied(),
                    Some(other) => p.values.get(&other.to_string()).copied(),
                }
            }
            ChoiceKind::Group => {
                value?;
                self.choices.get(label).copied()
            }
        }
    }

    /// Probability shown on a number widget: the interval holding the
    /// current value while enabled, the free-variable default otherwise.
    pub fn number_probability(&self, variable: &str, value: Option<f64>) -> Option<f64> {
        let p = self.numbers.get(variable)?;
        match value {
            Some(v) => p.limit_for(v).and_then(|l| l.prob).or(p.default),
            None => p.default,
        }
    }

    /// Whether moving `variable` from `old` to `new` lands in another
    /// interval. Unknown variables always count as crossing, so the first
    /// slide after enabling still refreshes.
    pub fn crosses_limit(&self, variable: &str, old: f64, new: f64) -> bool {
        match self.numbers.get(variable) {
            Some(p) if !p.limits.is_empty() => p.limit_index(old) != p.limit_index(new),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Probabilities {
        serde_json::from_value(json!({
            "booleans": {"flag": {"default": 0.5, "true": 0.9, "false": 0.1}},
            "enums": {"font": {"default": 0.4, "values": {"serif": 0.8, "sans": 0.0}}},
            "choices": {"a": 0.25, "b": 0.75},
            "numbers": {"x": {"default": 0.6, "limits": [
                {"lower": 0, "upper": 3.5, "prob": 0.2},
                {"lower": 3.5, "upper": 7.25, "prob": 0.7},
                {"lower": 7.25, "upper": 10, "prob": 1.0}
            ]}}
        }))
        .unwrap()
    }

    #[test]
    fn test_missing_sections_are_empty() {
        let p: Probabilities = serde_json::from_value(json!({"choices": {"a": 1.0}})).unwrap();
        assert!(p.booleans.is_empty());
        assert_eq!(p.choices["a"], 1.0);
    }

    #[test]
    fn test_option_lookup() {
        let p = sample();
        let t = ConfigValue::Bool(true);
        let f = ConfigValue::Bool(false);
        assert_eq!(p.option_probability(ChoiceKind::Boolean, "flag", "True", Some(&t)), Some(0.9));
        assert_eq!(p.option_probability(ChoiceKind::Boolean, "flag", "False", Some(&f)), Some(0.1));
        assert_eq!(p.option_probability(ChoiceKind::Boolean, "flag", "Any", None), Some(0.5));
        assert_eq!(p.option_probability(ChoiceKind::Boolean, "other", "Any", None), None);

        let serif = ConfigValue::from("serif");
        assert_eq!(p.option_probability(ChoiceKind::Enum, "font", "serif", Some(&serif)), Some(0.8));
        assert_eq!(p.option_probability(ChoiceKind::Enum, "font", "Any", None), Some(0.4));

        let b = ConfigValue::from("b");
        assert_eq!(p.option_probability(ChoiceKind::Group, "", "b", Some(&b)), Some(0.75));
        assert_eq!(p.option_probability(ChoiceKind::Group, "", "Any", None), None);
    }

    #[test]
    fn test_limit_index() {
        let p = sample();
        let x = &p.numbers["x"];
        assert_eq!(x.limit_index(0.0), Some(0));
        assert_eq!(x.limit_index(3.5), Some(0));
        assert_eq!(x.limit_index(3.6), Some(1));
        assert_eq!(x.limit_index(7.0), Some(1));
        assert_eq!(x.limit_index(7.25), Some(1));
        assert_eq!(x.limit_index(10.0), Some(2));
        assert_eq!(x.limit_index(99.0), Some(2));
        assert_eq!(NumberProbas::default().limit_index(1.0), None);
    }

    #[test]
    fn test_crosses_limit() {
        let p = sample();
        assert!(!p.crosses_limit("x", 1.0, 2.0));
        assert!(p.crosses_limit("x", 3.0, 4.0));
        assert!(!p.crosses_limit("x", 5.0, 7.0));
        assert!(p.crosses_limit("x", 9.0, 1.0));
        assert!(p.crosses_limit("x", 3.5, 3.6));
        assert!(!p.crosses_limit("x", 3.0, 3.5));
        assert!(p.crosses_limit("unknown", 1.0, 2.0));
    }

    #[test]
    fn test_number_probability() {
        let p = sample();
        assert_eq!(p.number_probability("x", Some(5.0)), Some(0.7));
        assert_eq!(p.number_probability("x", None), Some(0.6));
        assert_eq!(p.number_probability("x", Some(3.5)), Some(0.2));
        assert_eq!(p.number_probability("x", Some(7.25)), Some(0.7));
        assert_eq!(p.number_probability("y", Some(5.0)), None);
    }
}
