//! Argument extraction from raw interaction input.
//!
//! Interactions arrive as JSON objects. Integers are JSON numbers and may be
//! written in float form (`5.0`); anything with a fractional part, or any
//! non-number, is rejected. Integral values beyond `u64::MAX` saturate, which
//! makes them fail the later balance or id checks instead of wrapping.

use serde_json::{Map, Value};

use permadao_core::ContractError;

/// Constraint applied to an integer argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntegerRule {
    /// Zero or more, for indices.
    NonNegative,
    /// One or more, for token quantities.
    Positive,
}

/// Read and validate the integer argument `key`.
///
/// # Errors
///
/// - [`ContractError::MissingRequiredArgument`] if `key` is absent or null
/// - [`ContractError::NotAnInteger`] if the value is not a whole number
/// - [`ContractError::NegativeNotAllowed`] for a negative [`IntegerRule::NonNegative`] value
/// - [`ContractError::InvalidAmount`] for a zero or negative [`IntegerRule::Positive`] value
pub fn integer(
    input: &Map<String, Value>,
    key: &'static str,
    rule: IntegerRule,
) -> Result<u64, ContractError> {
    let number = match input.get(key) {
        None | Some(Value::Null) => return Err(ContractError::MissingRequiredArgument(key)),
        Some(Value::Number(n)) => n,
        Some(_) => return Err(ContractError::NotAnInteger(key)),
    };

    let value = if let Some(v) = number.as_u64() {
        Some(v)
    } else if number.as_i64().is_some() {
        None
    } else {
        let f = number.as_f64().ok_or(ContractError::NotAnInteger(key))?;
        if !f.is_finite() || f.fract() != 0.0 {
            return Err(ContractError::NotAnInteger(key));
        }
        // `-0.0` is zero, not negative.
        (f >= 0.0).then(|| if f >= u64::MAX as f64 { u64::MAX } else { f as u64 })
    };

    match (value, rule) {
        (Some(0), IntegerRule::Positive) | (None, IntegerRule::Positive) => {
            Err(ContractError::InvalidAmount)
        }
        (None, IntegerRule::NonNegative) => Err(ContractError::NegativeNotAllowed(key)),
        (Some(v), _) => Ok(v),
    }
}

/// The string argument `key`, or `None` if absent or not a string.
pub fn string<'a>(input: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    input.get(key).and_then(Value::as_str)
}

/// The first of `keys` present as a string.
pub fn string_any<'a>(input: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| string(input, k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("test input must be an object"),
        }
    }

    #[test]
    fn accepts_whole_numbers() {
        let m = input(json!({"a": 0, "b": 7, "c": 5.0}));
        assert_eq!(integer(&m, "a", IntegerRule::NonNegative), Ok(0));
        assert_eq!(integer(&m, "b", IntegerRule::Positive), Ok(7));
        assert_eq!(integer(&m, "c", IntegerRule::Positive), Ok(5));
    }

    #[test]
    fn missing_and_null() {
        let m = input(json!({"n": null}));
        assert_eq!(
            integer(&m, "id", IntegerRule::NonNegative),
            Err(ContractError::MissingRequiredArgument("id"))
        );
        assert_eq!(
            integer(&m, "n", IntegerRule::Positive),
            Err(ContractError::MissingRequiredArgument("n"))
        );
    }

    #[test]
    fn rejects_non_integers() {
        let m = input(json!({"f": 1.5, "s": "5", "b": true, "a": [1]}));
        for key in ["f", "s", "b", "a"] {
            assert_eq!(
                integer(&m, key, IntegerRule::NonNegative),
                Err(ContractError::NotAnInteger(key)),
                "key {key}"
            );
        }
    }

    #[test]
    fn non_negative_rule() {
        let m = input(json!({"neg": -1, "negf": -3.0}));
        assert_eq!(
            integer(&m, "neg", IntegerRule::NonNegative),
            Err(ContractError::NegativeNotAllowed("neg"))
        );
        assert_eq!(
            integer(&m, "negf", IntegerRule::NonNegative),
            Err(ContractError::NegativeNotAllowed("negf"))
        );
    }

    #[test]
    fn positive_rule() {
        let m = input(json!({"zero": 0, "neg": -4, "negzero": -0.0}));
        for key in ["zero", "neg", "negzero"] {
            assert_eq!(
                integer(&m, key, IntegerRule::Positive),
                Err(ContractError::InvalidAmount),
                "key {key}"
            );
        }
    }

    #[test]
    fn negative_zero_is_zero() {
        let m = input(json!({"z": -0.0}));
        assert_eq!(integer(&m, "z", IntegerRule::NonNegative), Ok(0));
    }

    #[test]
    fn huge_values_saturate() {
        let m = input(json!({"big": 1e30}));
        assert_eq!(integer(&m, "big", IntegerRule::Positive), Ok(u64::MAX));
    }

    #[test]
    fn string_lookup() {
        let m = input(json!({"name": "ui", "n": 3, "txid": "abc"}));
        assert_eq!(string(&m, "name"), Some("ui"));
        assert_eq!(string(&m, "n"), None);
        assert_eq!(string(&m, "missing"), None);
        assert_eq!(string_any(&m, &["contentReference", "txid"]), Some("abc"));
    }
}
