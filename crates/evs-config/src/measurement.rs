//! Configuration of a single measurement.
//!
//! A [`MeasurementConfig`] pairs a [`TemporalityType`] with a [`DataModality`]
//! and the fields each modality needs. Construction validates the pair and the
//! fields together:
//!
//! | temporality | constraint |
//! |---|---|
//! | static | no functor; regression modalities not supported |
//! | dynamic | no functor; single-label classification rejected |
//! | functional time dependent | functor required; modality unset, dropped, or the functor's output modality |

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use evs_model::{ConfigError, DataModality, PlainConfig, Result, TemporalityType};

use crate::functor::TimeDependentFunctor;
use crate::metadata::{MetadataValue, read_cache, write_cache};
use crate::vocabulary::Vocabulary;

/// Where a measurement's per-key metadata currently lives.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MeasurementMetadata {
    #[default]
    Absent,
    InMemory(MetadataValue),
    /// Stored on disk; loaded on access.
    CachedAt(PathBuf),
}

impl MeasurementMetadata {
    pub fn is_absent(&self) -> bool {
        matches!(self, MeasurementMetadata::Absent)
    }
}

/// Unvalidated measurement configuration in its plain shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMeasurementConfig {
    pub name: Option<String>,
    pub temporality: Option<TemporalityType>,
    pub modality: Option<DataModality>,
    pub observation_frequency: Option<f64>,
    pub functor: Option<Value>,
    pub vocabulary: Option<Vocabulary>,
    pub values_column: Option<String>,
    pub measurement_metadata: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementConfig {
    name: Option<String>,
    temporality: TemporalityType,
    modality: DataModality,
    observation_frequency: Option<f64>,
    functor: Option<TimeDependentFunctor>,
    vocabulary: Option<Vocabulary>,
    values_column: Option<String>,
    measurement_metadata: MeasurementMetadata,
}

/// Builder for [`MeasurementConfig`]; `build` validates.
#[derive(Debug, Clone)]
pub struct MeasurementConfigBuilder {
    name: Option<String>,
    temporality: TemporalityType,
    modality: Option<DataModality>,
    observation_frequency: Option<f64>,
    functor: Option<TimeDependentFunctor>,
    vocabulary: Option<Vocabulary>,
    values_column: Option<String>,
    measurement_metadata: MeasurementMetadata,
}

impl MeasurementConfigBuilder {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_modality(mut self, modality: DataModality) -> Self {
        self.modality = Some(modality);
        self
    }

    pub fn with_functor(mut self, functor: TimeDependentFunctor) -> Self {
        self.functor = Some(functor);
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    pub fn with_values_column(mut self, column: impl Into<String>) -> Self {
        self.values_column = Some(column.into());
        self
    }

    pub fn with_observation_frequency(mut self, frequency: f64) -> Self {
        self.observation_frequency = Some(frequency);
        self
    }

    pub fn with_metadata(mut self, metadata: MetadataValue) -> Self {
        self.measurement_metadata = MeasurementMetadata::InMemory(metadata);
        self
    }

    pub fn with_cached_metadata(mut self, path: impl Into<PathBuf>) -> Self {
        self.measurement_metadata = MeasurementMetadata::CachedAt(path.into());
        self
    }

    pub fn build(self) -> Result<MeasurementConfig> {
        let modality = resolve_modality(self.temporality, self.modality, self.functor.as_ref())?;
        let config = MeasurementConfig {
            name: self.name,
            temporality: self.temporality,
            modality,
            observation_frequency: self.observation_frequency,
            functor: self.functor,
            vocabulary: self.vocabulary,
            values_column: self.values_column,
            measurement_metadata: self.measurement_metadata,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Default the modality of functional measurements from their functor.
fn resolve_modality(
    temporality: TemporalityType,
    modality: Option<DataModality>,
    functor: Option<&TimeDependentFunctor>,
) -> Result<DataModality> {
    match (modality, temporality, functor) {
        (Some(modality), _, _) => Ok(modality),
        (None, TemporalityType::FunctionalTimeDependent, Some(functor)) => {
            Ok(functor.output_modality())
        }
        (None, TemporalityType::FunctionalTimeDependent, None) => Err(ConfigError::missing(
            "functor",
            "functional_time_dependent measurement",
        )),
        (None, _, _) => Err(ConfigError::missing(
            "modality",
            format!("{temporality} measurement"),
        )),
    }
}

impl MeasurementConfig {
    pub fn builder(temporality: TemporalityType) -> MeasurementConfigBuilder {
        MeasurementConfigBuilder {
            name: None,
            temporality,
            modality: None,
            observation_frequency: None,
            functor: None,
            vocabulary: None,
            values_column: None,
            measurement_metadata: MeasurementMetadata::Absent,
        }
    }

    /// Check the temporality rules, then every modality field rule.
    ///
    /// Temporality violations are reported alone; field violations are
    /// collected and reported together.
    pub fn validate(&self) -> Result<()> {
        self.check_temporality()?;
        match ConfigError::from_violations(self.field_violations()) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn check_temporality(&self) -> Result<()> {
        let context = format!("{} measurement", self.temporality);
        match self.temporality {
            TemporalityType::Static | TemporalityType::Dynamic => {
                if let Some(functor) = &self.functor {
                    return Err(ConfigError::forbidden("functor", context, functor));
                }
                if self.temporality == TemporalityType::Static && self.is_numeric() {
                    return Err(ConfigError::Incompatible(format!(
                        "numeric data modalities like {} are not yet supported on static measurements",
                        self.modality
                    )));
                }
                if self.temporality == TemporalityType::Dynamic
                    && self.modality == DataModality::SingleLabelClassification
                {
                    return Err(ConfigError::Incompatible(format!(
                        "{} on dynamic measurements is not supported, as event aggregation can turn \
                         single-label tasks into multi-label tasks",
                        self.modality
                    )));
                }
                Ok(())
            }
            TemporalityType::FunctionalTimeDependent => {
                let functor = self
                    .functor
                    .as_ref()
                    .ok_or_else(|| ConfigError::missing("functor", context))?;
                let output = functor.output_modality();
                if self.modality != DataModality::Dropped && self.modality != output {
                    return Err(ConfigError::Incompatible(format!(
                        "modality must be dropped or {output} for functional_time_dependent \
                         measurements with a {}; got {}",
                        functor.kind().class_name(),
                        self.modality
                    )));
                }
                Ok(())
            }
        }
    }

    fn field_violations(&self) -> Vec<ConfigError> {
        let context = format!("{} measurement", self.modality);
        let mut errors = Vec::new();

        if let Some(frequency) = self.observation_frequency
            && !(0.0..=1.0).contains(&frequency)
        {
            errors.push(ConfigError::type_mismatch(
                "observation_frequency",
                format!("must be in [0, 1]; got {frequency}"),
            ));
        }

        match self.modality {
            DataModality::MultivariateRegression => {
                if self.values_column.is_none() {
                    errors.push(ConfigError::missing("values_column", context.as_str()));
                }
            }
            DataModality::UnivariateRegression
            | DataModality::SingleLabelClassification
            | DataModality::MultiLabelClassification => {
                if let Some(column) = &self.values_column {
                    errors.push(ConfigError::forbidden("values_column", context.as_str(), column));
                }
            }
            DataModality::Dropped => {
                if let Some(vocabulary) = &self.vocabulary {
                    errors.push(ConfigError::forbidden(
                        "vocabulary",
                        context.as_str(),
                        vocabulary.elements(),
                    ));
                }
            }
        }
        errors.extend(self.metadata_violations(&self.measurement_metadata));
        errors
    }

    /// Shape rules for `metadata` under this measurement's modality.
    fn metadata_violations(&self, metadata: &MeasurementMetadata) -> Vec<ConfigError> {
        let context = format!("{} measurement", self.modality);
        let mut errors = Vec::new();
        match (self.modality, metadata) {
            (_, MeasurementMetadata::Absent) => {}
            (DataModality::MultivariateRegression, MeasurementMetadata::InMemory(value)) => {
                match value {
                    MetadataValue::Series(_) => errors.push(ConfigError::type_mismatch(
                        "measurement_metadata",
                        format!("must be a table on a {context}; got a series"),
                    )),
                    MetadataValue::Table(df) => {
                        for problem in MetadataValue::table_violations(df) {
                            errors.push(ConfigError::type_mismatch("measurement_metadata", problem));
                        }
                    }
                }
            }
            (
                DataModality::UnivariateRegression,
                MeasurementMetadata::InMemory(MetadataValue::Table(_)),
            ) => errors.push(ConfigError::type_mismatch(
                "measurement_metadata",
                format!("must be a series on a {context}; got a table"),
            )),
            (modality, metadata) if !modality.is_numeric() => {
                errors.push(ConfigError::forbidden(
                    "measurement_metadata",
                    context.as_str(),
                    metadata,
                ));
            }
            _ => {}
        }
        errors
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    pub fn temporality(&self) -> TemporalityType {
        self.temporality
    }

    pub fn modality(&self) -> DataModality {
        self.modality
    }

    pub fn observation_frequency(&self) -> Option<f64> {
        self.observation_frequency
    }

    /// Record the fraction of valid instances in which this measurement was observed.
    pub fn set_observation_frequency(&mut self, frequency: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&frequency) {
            return Err(ConfigError::type_mismatch(
                "observation_frequency",
                format!("must be in [0, 1]; got {frequency}"),
            ));
        }
        self.observation_frequency = Some(frequency);
        Ok(())
    }

    pub fn functor(&self) -> Option<&TimeDependentFunctor> {
        self.functor.as_ref()
    }

    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        self.vocabulary.as_ref()
    }

    /// Attach the vocabulary learned during preprocessing.
    pub fn set_vocabulary(&mut self, vocabulary: Option<Vocabulary>) -> Result<()> {
        if self.is_dropped()
            && let Some(vocabulary) = &vocabulary
        {
            return Err(ConfigError::forbidden(
                "vocabulary",
                "dropped measurement",
                vocabulary.elements(),
            ));
        }
        self.vocabulary = vocabulary;
        Ok(())
    }

    pub fn values_column(&self) -> Option<&str> {
        self.values_column.as_deref()
    }

    pub fn metadata_state(&self) -> &MeasurementMetadata {
        &self.measurement_metadata
    }

    pub fn is_dropped(&self) -> bool {
        self.modality == DataModality::Dropped
    }

    pub fn is_numeric(&self) -> bool {
        self.modality.is_numeric()
    }

    /// Mark the measurement dropped, discarding its vocabulary and metadata.
    pub fn mark_dropped(&mut self) {
        self.modality = DataModality::Dropped;
        self.vocabulary = None;
        self.measurement_metadata = MeasurementMetadata::Absent;
    }

    /// Current metadata, loading it from the cache file when cached.
    pub fn measurement_metadata(&self) -> Result<Option<MetadataValue>> {
        match &self.measurement_metadata {
            MeasurementMetadata::Absent => Ok(None),
            MeasurementMetadata::InMemory(value) => Ok(Some(value.clone())),
            MeasurementMetadata::CachedAt(path) => {
                let as_series = match self.modality {
                    DataModality::UnivariateRegression => true,
                    DataModality::MultivariateRegression => false,
                    other => {
                        return Err(ConfigError::Cache(format!(
                            "only regression measurements may have cached metadata; got {} at {} on a {other} measurement",
                            self.name.as_deref().unwrap_or("<unnamed>"),
                            path.display()
                        )));
                    }
                };
                read_cache(path, as_series).map(Some)
            }
        }
    }

    /// Replace the metadata. When caching is enabled the new value is written
    /// to the cache file instead of being held in memory.
    pub fn set_measurement_metadata(&mut self, metadata: Option<MetadataValue>) -> Result<()> {
        let Some(value) = metadata else {
            self.measurement_metadata = MeasurementMetadata::Absent;
            return Ok(());
        };

        let violations =
            self.metadata_violations(&MeasurementMetadata::InMemory(value.clone()));
        if let Some(error) = ConfigError::from_violations(violations) {
            return Err(error);
        }

        match &self.measurement_metadata {
            MeasurementMetadata::CachedAt(path) => write_cache(path, &value),
            _ => {
                self.measurement_metadata = MeasurementMetadata::InMemory(value);
                Ok(())
            }
        }
    }

    /// Move in-memory metadata to `path`.
    ///
    /// Caching again at the same path and caching absent metadata are no-ops;
    /// caching at a different path is an error.
    pub fn cache_measurement_metadata(&mut self, path: &Path) -> Result<()> {
        match &self.measurement_metadata {
            MeasurementMetadata::CachedAt(existing) if existing == path => Ok(()),
            MeasurementMetadata::CachedAt(existing) => Err(ConfigError::Cache(format!(
                "caching is already enabled at {} != {}",
                existing.display(),
                path.display()
            ))),
            MeasurementMetadata::Absent => Ok(()),
            MeasurementMetadata::InMemory(value) => {
                write_cache(path, value)?;
                debug!(measurement = ?self.name, path = %path.display(), "cached measurement metadata");
                self.measurement_metadata = MeasurementMetadata::CachedAt(path.to_path_buf());
                Ok(())
            }
        }
    }

    /// Load cached metadata back into memory.
    pub fn uncache_measurement_metadata(&mut self) -> Result<()> {
        match &self.measurement_metadata {
            MeasurementMetadata::Absent => Ok(()),
            MeasurementMetadata::InMemory(_) => Err(ConfigError::Cache(
                "caching is not enabled, can't uncache".to_string(),
            )),
            MeasurementMetadata::CachedAt(_) => {
                if let Some(value) = self.measurement_metadata()? {
                    self.measurement_metadata = MeasurementMetadata::InMemory(value);
                }
                Ok(())
            }
        }
    }

    /// Attach empty metadata of the shape this modality uses.
    pub fn add_empty_metadata(&mut self) -> Result<()> {
        if !self.measurement_metadata.is_absent() {
            return Err(ConfigError::Incompatible(format!(
                "can't add empty metadata to {}; metadata is already set",
                self.name.as_deref().unwrap_or("<unnamed>")
            )));
        }
        let value = match self.modality {
            DataModality::UnivariateRegression => MetadataValue::empty_series(),
            DataModality::MultivariateRegression => {
                MetadataValue::empty_table(self.name.as_deref().unwrap_or("key"))?
            }
            other => {
                return Err(ConfigError::Incompatible(format!(
                    "can't add metadata to a {other} measurement"
                )));
            }
        };
        self.measurement_metadata = MeasurementMetadata::InMemory(value);
        Ok(())
    }

    /// Ensure the mandatory metadata columns (or keys) exist, adding empty
    /// metadata first when there is none.
    pub fn add_missing_mandatory_metadata_cols(&mut self) -> Result<()> {
        if !self.is_numeric() {
            return Err(ConfigError::Incompatible(format!(
                "only numeric measurements can have measurement metadata; got {}",
                self.modality
            )));
        }
        match self.measurement_metadata()? {
            None => self.add_empty_metadata(),
            Some(mut value) => {
                value.add_missing_mandatory()?;
                self.set_measurement_metadata(Some(value))
            }
        }
    }

    /// Human-readable summary of this measurement.
    pub fn describe(&self) -> Result<String> {
        let observed = self
            .observation_frequency
            .map_or_else(|| "n/a".to_string(), |f| format!("{:.1}%", f * 100.0));
        let mut lines = vec![format!(
            "{}: {}, {} observed {observed}",
            self.name.as_deref().unwrap_or("<unnamed>"),
            self.temporality,
            self.modality
        )];

        match (self.modality, self.measurement_metadata()?) {
            (DataModality::UnivariateRegression, Some(MetadataValue::Series(series))) => {
                let value_type = series.get("value_type").cloned().unwrap_or(Value::Null);
                let value_type = value_type.as_str().map_or_else(|| value_type.to_string(), str::to_string);
                lines.push(format!("Value is a {value_type}"));
            }
            (DataModality::MultivariateRegression, Some(MetadataValue::Table(df))) => {
                lines.push("Value Types:".to_string());
                let mut counts: BTreeMap<String, usize> = BTreeMap::new();
                if let Ok(column) = df.column("value_type")
                    && let Ok(values) = column.as_materialized_series().str()
                {
                    for value in values.into_iter().flatten() {
                        *counts.entry(value.to_string()).or_default() += 1;
                    }
                }
                for (value_type, count) in counts {
                    lines.push(format!("  {count} {value_type}"));
                }
            }
            _ => {}
        }

        if let Some(vocabulary) = &self.vocabulary {
            lines.push("Vocabulary:".to_string());
            lines.extend(vocabulary.describe(5).lines().map(|line| format!("  {line}")));
        }
        Ok(lines.join("\n"))
    }

    pub fn to_raw(&self) -> Result<RawMeasurementConfig> {
        let measurement_metadata = match &self.measurement_metadata {
            MeasurementMetadata::Absent => None,
            MeasurementMetadata::InMemory(value) => Some(value.to_plain()?),
            MeasurementMetadata::CachedAt(path) => {
                Some(Value::String(path.to_string_lossy().into_owned()))
            }
        };
        Ok(RawMeasurementConfig {
            name: self.name.clone(),
            temporality: Some(self.temporality),
            modality: Some(self.modality),
            observation_frequency: self.observation_frequency,
            functor: self.functor.as_ref().map(TimeDependentFunctor::to_plain),
            vocabulary: self.vocabulary.clone(),
            values_column: self.values_column.clone(),
            measurement_metadata,
        })
    }
}

impl TryFrom<RawMeasurementConfig> for MeasurementConfig {
    type Error = ConfigError;

    fn try_from(raw: RawMeasurementConfig) -> Result<Self> {
        let temporality = raw
            .temporality
            .ok_or_else(|| ConfigError::missing("temporality", "measurement config"))?;
        let functor = raw
            .functor
            .as_ref()
            .map(TimeDependentFunctor::from_plain)
            .transpose()?;
        let modality = resolve_modality(temporality, raw.modality, functor.as_ref())?;

        let measurement_metadata = match raw.measurement_metadata {
            None | Some(Value::Null) => MeasurementMetadata::Absent,
            Some(Value::String(path)) => MeasurementMetadata::CachedAt(PathBuf::from(path)),
            Some(value) => match modality {
                DataModality::MultivariateRegression => {
                    MeasurementMetadata::InMemory(MetadataValue::table_from_plain(&value)?)
                }
                DataModality::UnivariateRegression => {
                    MeasurementMetadata::InMemory(MetadataValue::series_from_plain(&value)?)
                }
                other => {
                    return Err(ConfigError::forbidden(
                        "measurement_metadata",
                        format!("{other} measurement"),
                        value,
                    ));
                }
            },
        };

        let mut builder = MeasurementConfig::builder(temporality).with_modality(modality);
        builder.name = raw.name;
        builder.observation_frequency = raw.observation_frequency;
        builder.functor = functor;
        builder.vocabulary = raw.vocabulary;
        builder.values_column = raw.values_column;
        builder.measurement_metadata = measurement_metadata;
        builder.build()
    }
}

impl Serialize for MeasurementConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_raw()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MeasurementConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawMeasurementConfig::deserialize(deserializer)?;
        MeasurementConfig::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl PlainConfig for MeasurementConfig {
    fn to_plain(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.to_raw()?)?)
    }

    fn from_plain(value: Value) -> Result<Self> {
        let raw: RawMeasurementConfig = serde_json::from_value(value)?;
        Self::try_from(raw)
    }
}
