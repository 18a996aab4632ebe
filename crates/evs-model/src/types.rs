//! Type-safe enumerations for input sources and measurements.
//!
//! These are the closed sets of values configuration files refer to by their
//! lowercase string names (`"event"`, `"multi_label_classification"`, ...).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, Result};

/// Structural role of an input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// One row of static attributes per subject.
    Static,
    /// One row per timestamped event.
    Event,
    /// One row per time range; expanded into start, end and equal-time events.
    Range,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Static => "static",
            SourceType::Event => "event",
            SourceType::Range => "range",
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, SourceType::Static)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "static" => Ok(SourceType::Static),
            "event" => Ok(SourceType::Event),
            "range" => Ok(SourceType::Range),
            _ => Err(format!("Unknown source type: {s}")),
        }
    }
}

/// Type a source column is loaded as.
///
/// Timestamps optionally carry the format string used to parse them when the
/// source stores them as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnType {
    Categorical,
    Float,
    Boolean,
    Timestamp(Option<String>),
}

impl ColumnType {
    pub fn timestamp_with_format(format: impl Into<String>) -> Self {
        ColumnType::Timestamp(Some(format.into()))
    }

    pub fn base_name(&self) -> &'static str {
        match self {
            ColumnType::Categorical => "categorical",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp(_) => "timestamp",
        }
    }

    pub fn is_timestamp(&self) -> bool {
        matches!(self, ColumnType::Timestamp(_))
    }

    /// Parse the plain form: a type name, or `["timestamp", "<format>"]`.
    pub fn from_plain(value: &Value) -> Result<Self> {
        match value {
            Value::String(name) => name
                .parse()
                .map_err(|message: String| ConfigError::type_mismatch("column type", message)),
            Value::Array(items) => match items.as_slice() {
                [Value::String(name), Value::String(format)]
                    if name.trim().eq_ignore_ascii_case("timestamp") =>
                {
                    Ok(ColumnType::Timestamp(Some(format.clone())))
                }
                _ => Err(ConfigError::type_mismatch(
                    "column type",
                    format!("expected a type name or [\"timestamp\", format]; got {value}"),
                )),
            },
            other => Err(ConfigError::type_mismatch(
                "column type",
                format!("expected a type name or [\"timestamp\", format]; got {other}"),
            )),
        }
    }

    pub fn to_plain(&self) -> Value {
        match self {
            ColumnType::Timestamp(Some(format)) => Value::Array(vec![
                Value::String("timestamp".to_string()),
                Value::String(format.clone()),
            ]),
            other => Value::String(other.base_name().to_string()),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Timestamp(Some(format)) => write!(f, "timestamp[{format}]"),
            other => write!(f, "{}", other.base_name()),
        }
    }
}

impl FromStr for ColumnType {
    type Err = String;

    /// Parses a bare type name; timestamps parsed this way carry no format.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "categorical" => Ok(ColumnType::Categorical),
            "float" => Ok(ColumnType::Float),
            "boolean" => Ok(ColumnType::Boolean),
            "timestamp" => Ok(ColumnType::Timestamp(None)),
            _ => Err(format!("Unknown column type: {s}")),
        }
    }
}

impl Serialize for ColumnType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_plain().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ColumnType::from_plain(&value).map_err(serde::de::Error::custom)
    }
}

/// Representational kind of a measurement's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataModality {
    /// Dropped for being observed too rarely.
    Dropped,
    /// Exactly one label per valid instance; never carries a value.
    SingleLabelClassification,
    /// Zero or more labels per valid instance; never carries a value.
    MultiLabelClassification,
    /// Zero or more keys per event, each with an associated numeric value.
    MultivariateRegression,
    /// A single fully observed numeric value.
    UnivariateRegression,
}

impl DataModality {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataModality::Dropped => "dropped",
            DataModality::SingleLabelClassification => "single_label_classification",
            DataModality::MultiLabelClassification => "multi_label_classification",
            DataModality::MultivariateRegression => "multivariate_regression",
            DataModality::UnivariateRegression => "univariate_regression",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataModality::MultivariateRegression | DataModality::UnivariateRegression
        )
    }

    pub fn is_classification(&self) -> bool {
        matches!(
            self,
            DataModality::SingleLabelClassification | DataModality::MultiLabelClassification
        )
    }
}

impl fmt::Display for DataModality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataModality {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dropped" => Ok(DataModality::Dropped),
            "single_label_classification" => Ok(DataModality::SingleLabelClassification),
            "multi_label_classification" => Ok(DataModality::MultiLabelClassification),
            "multivariate_regression" => Ok(DataModality::MultivariateRegression),
            "univariate_regression" => Ok(DataModality::UnivariateRegression),
            _ => Err(format!("Unknown data modality: {s}")),
        }
    }
}

/// How a measurement relates to time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalityType {
    /// Fixed per subject.
    Static,
    /// Recorded on events, possibly many times per event.
    Dynamic,
    /// Computed from a known function of time and static attributes.
    FunctionalTimeDependent,
}

impl TemporalityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemporalityType::Static => "static",
            TemporalityType::Dynamic => "dynamic",
            TemporalityType::FunctionalTimeDependent => "functional_time_dependent",
        }
    }
}

impl fmt::Display for TemporalityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TemporalityType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "static" => Ok(TemporalityType::Static),
            "dynamic" => Ok(TemporalityType::Dynamic),
            "functional_time_dependent" => Ok(TemporalityType::FunctionalTimeDependent),
            _ => Err(format!("Unknown temporality: {s}")),
        }
    }
}
