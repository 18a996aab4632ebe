//! Dataset-wide configuration: the measurement set plus retention thresholds.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use evs_model::{ConfigError, DataModality, PlainConfig, Result, TemporalityType, describe_value};

use crate::functor::TimeDependentFunctor;
use crate::measurement::{MeasurementConfig, RawMeasurementConfig};
use crate::thresholds::{CountOrProportion, parse_proportion, proportion_from_plain};

pub const DEFAULT_AGG_BY_TIME_SCALE: &str = "1h";

/// Class name plus constructor parameters of an outlier detector or normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub cls: String,
    pub params: Map<String, Value>,
}

impl StrategyConfig {
    pub fn new(cls: impl Into<String>) -> Self {
        Self {
            cls: cls.into(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn from_plain(field: &str, value: &Value) -> Result<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Object(map) => {
                let cls = match map.get("cls") {
                    Some(Value::String(cls)) => cls.clone(),
                    Some(other) => {
                        return Err(ConfigError::type_mismatch(
                            field,
                            format!("`cls` must be a string; got {} of {other}", describe_value(other)),
                        ));
                    }
                    None => return Err(ConfigError::missing("cls", field)),
                };
                let params = map
                    .iter()
                    .filter(|(key, _)| key.as_str() != "cls")
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                Ok(Some(Self { cls, params }))
            }
            other => Err(ConfigError::type_mismatch(
                field,
                format!("must be a map with a `cls` key; got {} of {other}", describe_value(other)),
            )),
        }
    }

    pub fn to_plain(&self) -> Value {
        let mut map = Map::new();
        map.insert("cls".to_string(), Value::String(self.cls.clone()));
        map.extend(self.params.clone());
        Value::Object(map)
    }

    fn validate(&self, field: &str) -> Result<()> {
        if self.cls.is_empty() {
            return Err(ConfigError::missing("cls", field));
        }
        Ok(())
    }
}

/// Dataset-wide options other than the measurement set.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetOptions {
    pub min_events_per_subject: Option<u64>,
    pub agg_by_time_scale: Option<String>,
    pub min_valid_column_observations: Option<CountOrProportion>,
    pub min_valid_vocab_element_observations: Option<CountOrProportion>,
    pub min_true_float_frequency: Option<f64>,
    pub min_unique_numerical_observations: Option<CountOrProportion>,
    pub outlier_detector_config: Option<StrategyConfig>,
    pub normalizer_config: Option<StrategyConfig>,
    pub save_dir: Option<PathBuf>,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            min_events_per_subject: None,
            agg_by_time_scale: Some(DEFAULT_AGG_BY_TIME_SCALE.to_string()),
            min_valid_column_observations: None,
            min_valid_vocab_element_observations: None,
            min_true_float_frequency: None,
            min_unique_numerical_observations: None,
            outlier_detector_config: None,
            normalizer_config: None,
            save_dir: None,
        }
    }
}

impl DatasetOptions {
    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("min_valid_column_observations", &self.min_valid_column_observations),
            (
                "min_valid_vocab_element_observations",
                &self.min_valid_vocab_element_observations,
            ),
            (
                "min_unique_numerical_observations",
                &self.min_unique_numerical_observations,
            ),
        ];
        for (field, threshold) in thresholds {
            if let Some(threshold) = threshold {
                threshold.validate(field)?;
            }
        }
        if let Some(frequency) = self.min_true_float_frequency {
            parse_proportion("min_true_float_frequency", frequency)?;
        }
        if let Some(strategy) = &self.outlier_detector_config {
            strategy.validate("outlier_detector_config")?;
        }
        if let Some(strategy) = &self.normalizer_config {
            strategy.validate("normalizer_config")?;
        }
        Ok(())
    }
}

/// One dynamic column of the simplified column-list form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DynamicColumn {
    /// Bare name: a dynamic multi-label classification measurement.
    MultiLabel(String),
    /// `[key, values]`: a multivariate regression keyed on `key` with values in `values`.
    KeyValue { key: String, values: String },
    /// `[null, name]`: a dynamic univariate regression.
    Univariate(String),
}

impl DynamicColumn {
    pub fn name(&self) -> &str {
        match self {
            DynamicColumn::MultiLabel(name)
            | DynamicColumn::Univariate(name)
            | DynamicColumn::KeyValue { key: name, .. } => name,
        }
    }

    pub fn from_plain(value: &Value) -> Result<Self> {
        match value {
            Value::String(name) => Ok(DynamicColumn::MultiLabel(name.clone())),
            Value::Array(pair) => match pair.as_slice() {
                [Value::String(key), Value::String(values)] => Ok(DynamicColumn::KeyValue {
                    key: key.clone(),
                    values: values.clone(),
                }),
                [Value::Null, Value::String(name)] => Ok(DynamicColumn::Univariate(name.clone())),
                _ => Err(malformed_column(value)),
            },
            _ => Err(malformed_column(value)),
        }
    }

    fn to_measurement(&self) -> Result<MeasurementConfig> {
        let builder = MeasurementConfig::builder(TemporalityType::Dynamic).with_name(self.name());
        match self {
            DynamicColumn::MultiLabel(_) => builder
                .with_modality(DataModality::MultiLabelClassification)
                .build(),
            DynamicColumn::KeyValue { values, .. } => builder
                .with_modality(DataModality::MultivariateRegression)
                .with_values_column(values.clone())
                .build(),
            DynamicColumn::Univariate(_) => builder
                .with_modality(DataModality::UnivariateRegression)
                .build(),
        }
    }
}

fn malformed_column(value: &Value) -> ConfigError {
    ConfigError::type_mismatch(
        "dynamic column",
        format!(
            "expected a name, [key, values] or [null, name]; got {} of {value}",
            describe_value(value)
        ),
    )
}

/// Simplified column lists from which a full measurement set is derived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleColumns {
    pub dynamic: Vec<DynamicColumn>,
    /// Static single-label classification columns.
    pub static_columns: Vec<String>,
    pub time_dependent: Vec<(String, TimeDependentFunctor)>,
}

/// Unvalidated dataset configuration in its plain shape.
///
/// Thresholds and strategy configs are kept as plain values so validation can
/// report the offending value and its type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDatasetConfig {
    pub measurement_configs: Map<String, Value>,
    pub min_events_per_subject: Option<u64>,
    pub agg_by_time_scale: Option<String>,
    pub min_valid_column_observations: Value,
    pub min_valid_vocab_element_observations: Value,
    pub min_true_float_frequency: Value,
    pub min_unique_numerical_observations: Value,
    pub outlier_detector_config: Value,
    pub normalizer_config: Value,
    pub save_dir: Option<PathBuf>,
}

impl Default for RawDatasetConfig {
    fn default() -> Self {
        Self {
            measurement_configs: Map::new(),
            min_events_per_subject: None,
            agg_by_time_scale: Some(DEFAULT_AGG_BY_TIME_SCALE.to_string()),
            min_valid_column_observations: Value::Null,
            min_valid_vocab_element_observations: Value::Null,
            min_true_float_frequency: Value::Null,
            min_unique_numerical_observations: Value::Null,
            outlier_detector_config: Value::Null,
            normalizer_config: Value::Null,
            save_dir: None,
        }
    }
}

/// Measurement configs keyed by name plus dataset-wide options.
///
/// Every config's own name equals its key; names left unset are filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetConfig {
    measurement_configs: BTreeMap<String, MeasurementConfig>,
    options: DatasetOptions,
}

impl DatasetConfig {
    pub fn new(
        measurement_configs: impl IntoIterator<Item = (String, MeasurementConfig)>,
        options: DatasetOptions,
    ) -> Result<Self> {
        let mut config = Self {
            measurement_configs: measurement_configs.into_iter().collect(),
            options,
        };
        config.assign_names()?;
        config.validate()?;
        Ok(config)
    }

    /// Build measurement configs from simplified column lists.
    ///
    /// A name given more than once keeps its last definition.
    pub fn from_simple_columns(columns: SimpleColumns, options: DatasetOptions) -> Result<Self> {
        let mut measurement_configs = BTreeMap::new();
        let mut insert = |name: String, config: MeasurementConfig| {
            if measurement_configs.insert(name.clone(), config).is_some() {
                warn!(measurement = %name, "column listed more than once; keeping the last definition");
            }
        };

        for column in &columns.dynamic {
            insert(column.name().to_string(), column.to_measurement()?);
        }
        for name in columns.static_columns {
            let config = MeasurementConfig::builder(TemporalityType::Static)
                .with_name(name.clone())
                .with_modality(DataModality::SingleLabelClassification)
                .build()?;
            insert(name, config);
        }
        for (name, functor) in columns.time_dependent {
            let config = MeasurementConfig::builder(TemporalityType::FunctionalTimeDependent)
                .with_name(name.clone())
                .with_functor(functor)
                .build()?;
            insert(name, config);
        }

        Self::new(measurement_configs, options)
    }

    fn assign_names(&mut self) -> Result<()> {
        for (key, config) in &mut self.measurement_configs {
            match config.name() {
                None => {
                    debug!(measurement = %key, "filling measurement name from its key");
                    config.set_name(key.clone());
                }
                Some(name) if name != key => {
                    return Err(ConfigError::NameMismatch {
                        key: key.clone(),
                        name: name.to_string(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Re-check options and every measurement; measurement failures carry their key.
    pub fn validate(&self) -> Result<()> {
        for (key, config) in &self.measurement_configs {
            if config.name() != Some(key.as_str()) {
                return Err(ConfigError::NameMismatch {
                    key: key.clone(),
                    name: config.name().unwrap_or_default().to_string(),
                });
            }
            config.validate().map_err(|source| wrap_measurement(key, source))?;
        }
        self.options.validate()
    }

    pub fn measurement_configs(&self) -> &BTreeMap<String, MeasurementConfig> {
        &self.measurement_configs
    }

    pub fn measurement_config(&self, name: &str) -> Option<&MeasurementConfig> {
        self.measurement_configs.get(name)
    }

    /// Mutable access for the explicit post-construction updates
    /// (dropping, observation frequency, vocabulary, metadata cache).
    pub fn measurement_config_mut(&mut self, name: &str) -> Option<&mut MeasurementConfig> {
        self.measurement_configs.get_mut(name)
    }

    pub fn options(&self) -> &DatasetOptions {
        &self.options
    }

    /// Names of measurements not marked dropped.
    pub fn active_measurements(&self) -> impl Iterator<Item = &str> {
        self.measurement_configs
            .iter()
            .filter(|(_, config)| !config.is_dropped())
            .map(|(name, _)| name.as_str())
    }

    pub fn to_raw(&self) -> Result<RawDatasetConfig> {
        let mut measurement_configs = Map::new();
        for (key, config) in &self.measurement_configs {
            measurement_configs.insert(key.clone(), serde_json::to_value(config.to_raw()?)?);
        }
        let threshold = |t: &Option<CountOrProportion>| t.as_ref().map_or(Value::Null, CountOrProportion::to_plain);
        let strategy = |s: &Option<StrategyConfig>| s.as_ref().map_or(Value::Null, StrategyConfig::to_plain);
        let options = &self.options;
        Ok(RawDatasetConfig {
            measurement_configs,
            min_events_per_subject: options.min_events_per_subject,
            agg_by_time_scale: options.agg_by_time_scale.clone(),
            min_valid_column_observations: threshold(&options.min_valid_column_observations),
            min_valid_vocab_element_observations: threshold(
                &options.min_valid_vocab_element_observations,
            ),
            min_true_float_frequency: options
                .min_true_float_frequency
                .map_or(Value::Null, Value::from),
            min_unique_numerical_observations: threshold(
                &options.min_unique_numerical_observations,
            ),
            outlier_detector_config: strategy(&options.outlier_detector_config),
            normalizer_config: strategy(&options.normalizer_config),
            save_dir: options.save_dir.clone(),
        })
    }
}

fn wrap_measurement(key: &str, source: ConfigError) -> ConfigError {
    ConfigError::InvalidMeasurement {
        key: key.to_string(),
        source: Box::new(source),
    }
}

impl TryFrom<RawDatasetConfig> for DatasetConfig {
    type Error = ConfigError;

    fn try_from(raw: RawDatasetConfig) -> Result<Self> {
        let options = DatasetOptions {
            min_events_per_subject: raw.min_events_per_subject,
            agg_by_time_scale: raw.agg_by_time_scale,
            min_valid_column_observations: CountOrProportion::from_plain(
                "min_valid_column_observations",
                &raw.min_valid_column_observations,
            )?,
            min_valid_vocab_element_observations: CountOrProportion::from_plain(
                "min_valid_vocab_element_observations",
                &raw.min_valid_vocab_element_observations,
            )?,
            min_true_float_frequency: proportion_from_plain(
                "min_true_float_frequency",
                &raw.min_true_float_frequency,
            )?,
            min_unique_numerical_observations: CountOrProportion::from_plain(
                "min_unique_numerical_observations",
                &raw.min_unique_numerical_observations,
            )?,
            outlier_detector_config: StrategyConfig::from_plain(
                "outlier_detector_config",
                &raw.outlier_detector_config,
            )?,
            normalizer_config: StrategyConfig::from_plain(
                "normalizer_config",
                &raw.normalizer_config,
            )?,
            save_dir: raw.save_dir,
        };

        let mut measurement_configs = BTreeMap::new();
        for (key, value) in raw.measurement_configs {
            let parsed = serde_json::from_value::<RawMeasurementConfig>(value)
                .map_err(ConfigError::from)
                .and_then(MeasurementConfig::try_from)
                .map_err(|source| wrap_measurement(&key, source))?;
            measurement_configs.insert(key, parsed);
        }

        Self::new(measurement_configs, options)
    }
}

impl Serialize for DatasetConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_raw()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DatasetConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawDatasetConfig::deserialize(deserializer)?;
        DatasetConfig::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl PlainConfig for DatasetConfig {
    fn to_plain(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.to_raw()?)?)
    }

    fn from_plain(value: Value) -> Result<Self> {
        let raw: RawDatasetConfig = serde_json::from_value(value)?;
        Self::try_from(raw)
    }
}
