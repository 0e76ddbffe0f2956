//! Control parameters as handed over by the host action editor

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use super::ActionError;

/// String-keyed control parameters of one configured control
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionParams(HashMap<String, String>);

impl ActionParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    /// Raw value, if present
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Value or `default` when absent
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// Non-empty value or `MissingParameter`
    pub fn require(&self, name: &str) -> Result<&str, ActionError> {
        match self.get(name) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ActionError::MissingParameter(name.to_string())),
        }
    }

    /// Required decimal parameter
    pub fn decimal(&self, name: &str) -> Result<Decimal, ActionError> {
        let raw = self.require(name)?;
        parse_decimal(name, raw)
    }

    /// Optional decimal parameter; blank counts as absent
    pub fn decimal_or(&self, name: &str, default: Decimal) -> Result<Decimal, ActionError> {
        match self.get(name) {
            Some(raw) if !raw.trim().is_empty() => parse_decimal(name, raw),
            _ => Ok(default),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ActionParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn parse_decimal(name: &str, raw: &str) -> Result<Decimal, ActionError> {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| ActionError::InvalidNumber {
            name: name.to_string(),
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_rejects_blank() {
        let params = ActionParams::new().with("address", "  ");
        assert_eq!(
            params.require("address").unwrap_err(),
            ActionError::MissingParameter("address".to_string())
        );
        assert!(params.require("type").is_err());
    }

    #[test]
    fn test_decimal_parsing() {
        let params = ActionParams::new()
            .with("step", "0.1")
            .with("max", " 1.0 ")
            .with("min", "-2")
            .with("big", "1e3");

        assert_eq!(params.decimal("step").unwrap(), Decimal::new(1, 1));
        assert_eq!(params.decimal("max").unwrap(), Decimal::ONE);
        assert_eq!(params.decimal("min").unwrap(), Decimal::new(-2, 0));
        assert_eq!(params.decimal("big").unwrap(), Decimal::new(1000, 0));
    }

    #[test]
    fn test_malformed_number_is_an_error() {
        let params = ActionParams::new().with("step", "a lot");
        assert_eq!(
            params.decimal("step").unwrap_err(),
            ActionError::InvalidNumber {
                name: "step".to_string(),
                value: "a lot".to_string(),
            }
        );
    }

    #[test]
    fn test_decimal_or_defaults() {
        let params = ActionParams::new().with("value", "");
        assert_eq!(params.decimal_or("value", Decimal::ONE).unwrap(), Decimal::ONE);
        assert_eq!(params.decimal_or("other", Decimal::TEN).unwrap(), Decimal::TEN);
    }

    #[test]
    fn test_from_iter_and_json() {
        let params: ActionParams = [("address", "/x"), ("type", "toggle")].into_iter().collect();
        assert_eq!(params.get("type"), Some("toggle"));

        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["address"], "/x");
    }
}
