//! Value coercion.
//!
//! [`coerce`] turns a raw value (a scalar or a sequence of scalars, as the
//! config language produces them) into the typed value its
//! [`ValidatorKind`] asks for. Coercion never panics and never raises; a
//! failure is a [`CoercionError`] the validator folds into its report.
//!
//! # Examples
//!
//! ```
//! use plugin_config_core::{Kind, Value, ValidatorKind, coerce};
//!
//! let port = coerce(&Value::from("42"), &ValidatorKind::Typed(Kind::Number));
//! assert_eq!(port, Ok(Value::Integer(42)));
//!
//! let bad = coerce(&Value::from("4.2"), &ValidatorKind::Typed(Kind::Number));
//! assert!(bad.is_err());
//! ```

use std::collections::btree_map::Entry;

use crate::error::CoercionError;
use crate::types::{Kind, ValidatorKind};
use crate::value::{Hash, Value};

/// Coerces `raw` according to `validator`.
pub fn coerce(raw: &Value, validator: &ValidatorKind) -> Result<Value, CoercionError> {
    match validator {
        ValidatorKind::None => Ok(raw.clone()),
        ValidatorKind::Custom(check) => check(raw).map_err(CoercionError::Custom),
        ValidatorKind::OneOf(allowed) => {
            let value = single(as_sequence(raw))?;
            let listed = value
                .scalar_text()
                .is_some_and(|text| allowed.iter().any(|a| *a == text));
            if listed {
                Ok(value)
            } else {
                Err(CoercionError::NotAllowed {
                    value: value.to_string(),
                    allowed: allowed.clone(),
                })
            }
        }
        ValidatorKind::Typed(kind) => coerce_typed(raw, *kind),
        ValidatorKind::Unrecognized(name) => Err(CoercionError::UnknownValidator(name.clone())),
    }
}

fn coerce_typed(raw: &Value, kind: Kind) -> Result<Value, CoercionError> {
    if kind == Kind::Hash {
        if let Value::Hash(_) = raw {
            return Ok(raw.clone());
        }
    }

    let items = as_sequence(raw);
    match kind {
        Kind::Hash => fold_pairs(items).map(Value::Hash),
        Kind::Array => Ok(Value::Array(items)),
        Kind::String => {
            let value = single(items)?;
            match value.scalar_text() {
                Some(text) => Ok(Value::String(text.into_owned())),
                None => Err(CoercionError::NotAString(value.to_string())),
            }
        }
        Kind::Number => {
            let value = single(items)?;
            let text = value.to_string();
            match text.parse::<i64>() {
                Ok(n) if n.to_string() == text => Ok(Value::Integer(n)),
                _ => Err(CoercionError::InvalidNumber(text)),
            }
        }
        Kind::Boolean => match single(items)? {
            Value::Boolean(b) => Ok(Value::Boolean(b)),
            other => match other.scalar_text().as_deref() {
                Some("true") => Ok(Value::Boolean(true)),
                Some("false") => Ok(Value::Boolean(false)),
                _ => Err(CoercionError::InvalidBoolean(other.to_string())),
            },
        },
        Kind::IpAddress => {
            let value = single(items)?;
            let text = value.to_string();
            if is_ipv4(&text) {
                Ok(Value::String(text))
            } else {
                Err(CoercionError::InvalidIpAddress(text))
            }
        }
        Kind::Secret => match single(items)? {
            Value::Secret(secret) => Ok(Value::Secret(secret)),
            other => Ok(Value::secret(other.to_string())),
        },
    }
}

/// Normalizes a raw value into a sequence.
fn as_sequence(raw: &Value) -> Vec<Value> {
    match raw {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

fn single(mut items: Vec<Value>) -> Result<Value, CoercionError> {
    if items.len() != 1 {
        return Err(CoercionError::ExpectedSingleValue(items.len()));
    }
    Ok(items.remove(0))
}

/// Folds `[k1, v1, k2, v2, ...]` into a mapping. A repeated key collects its
/// values into a sequence.
fn fold_pairs(items: Vec<Value>) -> Result<Hash, CoercionError> {
    if items.len() % 2 != 0 {
        return Err(CoercionError::OddHashLength(items.len()));
    }

    let mut hash = Hash::new();
    let mut iter = items.into_iter();
    while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
        let key = match key.scalar_text() {
            Some(text) => text.into_owned(),
            None => return Err(CoercionError::NonScalarHashKey(key.to_string())),
        };
        match hash.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                Value::Array(existing) => existing.push(value),
                existing => {
                    let first = std::mem::replace(existing, Value::Array(Vec::new()));
                    *existing = Value::Array(vec![first, value]);
                }
            },
        }
    }
    Ok(hash)
}

fn is_ipv4(text: &str) -> bool {
    let octets: Vec<&str> = text.split('.').collect();
    octets.len() == 4
        && octets
            .iter()
            .all(|octet| matches!(octet.parse::<i64>(), Ok(n) if (0..=255).contains(&n)))
}
