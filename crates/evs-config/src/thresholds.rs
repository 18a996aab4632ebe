//! Retention thresholds given as an absolute count or a proportion of a total.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Number, Value};

use evs_model::{ConfigError, Result, describe_value};

/// A count (`> 1`) or a proportion in `(0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CountOrProportion {
    Count(u64),
    Proportion(f64),
}

impl CountOrProportion {
    /// Parse an optional threshold, naming `field` and the offending value on failure.
    pub fn from_plain(field: &str, value: &Value) -> Result<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) if !n.is_f64() => match n.as_u64() {
                Some(count) if count > 1 => Ok(Some(CountOrProportion::Count(count))),
                _ => Err(ConfigError::type_mismatch(
                    field,
                    format!("must be > 1 if integral; got {n}"),
                )),
            },
            Value::Number(n) => parse_proportion(field, n.as_f64().unwrap_or(f64::NAN))
                .map(|p| Some(CountOrProportion::Proportion(p))),
            other => Err(ConfigError::type_mismatch(
                field,
                format!(
                    "must either be a fraction (float between 0 and 1) or count (int > 1); got {} of {other}",
                    describe_value(other)
                ),
            )),
        }
    }

    /// Check the range rule: counts above 1, proportions strictly inside (0, 1).
    pub fn validate(&self, field: &str) -> Result<()> {
        match self {
            CountOrProportion::Count(count) if *count > 1 => Ok(()),
            CountOrProportion::Count(count) => Err(ConfigError::type_mismatch(
                field,
                format!("must be > 1 if integral; got {count}"),
            )),
            CountOrProportion::Proportion(p) => parse_proportion(field, *p).map(|_| ()),
        }
    }

    /// Absolute count for a population of `total`.
    pub fn resolve(&self, total: Option<u64>) -> Result<u64> {
        match (self, total) {
            (CountOrProportion::Count(count), _) => Ok(*count),
            (CountOrProportion::Proportion(p), Some(total)) => {
                Ok((p * total as f64).round() as u64)
            }
            (CountOrProportion::Proportion(p), None) => Err(ConfigError::Incompatible(format!(
                "proportion threshold {p} needs a total to resolve against"
            ))),
        }
    }

    pub fn to_plain(&self) -> Value {
        match self {
            CountOrProportion::Count(count) => Value::from(*count),
            CountOrProportion::Proportion(p) => {
                Number::from_f64(*p).map_or(Value::Null, Value::Number)
            }
        }
    }
}

impl fmt::Display for CountOrProportion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountOrProportion::Count(count) => write!(f, "{count}"),
            CountOrProportion::Proportion(p) => write!(f, "{:.1}%", p * 100.0),
        }
    }
}

impl Serialize for CountOrProportion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_plain().serialize(serializer)
    }
}

/// Parse an optional proportion in `(0, 1)`.
pub fn proportion_from_plain(field: &str, value: &Value) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) if n.is_f64() => parse_proportion(field, n.as_f64().unwrap_or(f64::NAN)).map(Some),
        other => Err(ConfigError::type_mismatch(
            field,
            format!(
                "must be a fraction (float between 0 and 1); got {} of {other}",
                describe_value(other)
            ),
        )),
    }
}

pub(crate) fn parse_proportion(field: &str, p: f64) -> Result<f64> {
    if p > 0.0 && p < 1.0 {
        Ok(p)
    } else {
        Err(ConfigError::type_mismatch(
            field,
            format!("must be in (0, 1) if float; got {p}"),
        ))
    }
}

/// Whether `observed` falls below `threshold`; no threshold never filters.
pub fn lt_count_or_proportion(
    observed: u64,
    threshold: Option<CountOrProportion>,
    total: Option<u64>,
) -> Result<bool> {
    match threshold {
        None => Ok(false),
        Some(threshold) => Ok(observed < threshold.resolve(total)?),
    }
}
