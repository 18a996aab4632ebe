//! Dataset-level schema: one static source plus any number of dynamic sources.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use evs_model::{ConfigError, PlainConfig, Result};

use crate::source::{InputSource, RawSourceSchema, SourceSchema};

/// Non-fatal inconsistency found while assembling a [`DatasetSchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaWarning {
    /// A dynamic source names a different subject-id column than the static source.
    SubjectIdMismatch {
        input_df: InputSource,
        subject_id_col: String,
        static_subject_id_col: String,
    },
}

impl fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaWarning::SubjectIdMismatch {
                input_df,
                subject_id_col,
                static_subject_id_col,
            } => write!(
                f,
                "{input_df} uses subject id column {subject_id_col}, but the static source uses {static_subject_id_col}"
            ),
        }
    }
}

/// A source given either already validated or in its plain shape.
#[derive(Debug, Clone)]
pub enum SourceInput {
    Typed(SourceSchema),
    Raw(RawSourceSchema),
}

impl From<SourceSchema> for SourceInput {
    fn from(schema: SourceSchema) -> Self {
        SourceInput::Typed(schema)
    }
}

impl From<RawSourceSchema> for SourceInput {
    fn from(raw: RawSourceSchema) -> Self {
        SourceInput::Raw(raw)
    }
}

/// Unvalidated dataset schema in its plain shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDatasetSchema {
    #[serde(rename = "static")]
    pub static_schema: Option<RawSourceSchema>,
    pub dynamic: Vec<RawSourceSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDatasetSchema", into = "RawDatasetSchema")]
pub struct DatasetSchema {
    static_schema: SourceSchema,
    dynamic: Vec<SourceSchema>,
    warnings: Vec<SchemaWarning>,
}

impl DatasetSchema {
    pub fn new<I>(static_schema: impl Into<SourceInput>, dynamic: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<SourceInput>,
    {
        let static_schema = match static_schema.into() {
            SourceInput::Typed(schema) => schema,
            SourceInput::Raw(raw) => SourceSchema::try_from(raw)?,
        };
        if !static_schema.is_static() {
            return Err(ConfigError::type_mismatch(
                "static",
                format!(
                    "the static source must have type static; got {}",
                    static_schema.source_type()
                ),
            ));
        }
        let static_subject_id_col = static_schema
            .subject_id_col()
            .ok_or_else(|| ConfigError::missing("subject_id_col", "static source"))?
            .to_string();

        let mut warnings = Vec::new();
        let mut sources = Vec::new();
        for input in dynamic {
            let (mut schema, explicit) = match input.into() {
                SourceInput::Typed(schema) => {
                    let explicit = schema.subject_id_col().map(str::to_string);
                    (schema, explicit)
                }
                SourceInput::Raw(mut raw) => {
                    let explicit = raw.subject_id_col.take();
                    (SourceSchema::try_from(raw)?, explicit)
                }
            };
            if schema.is_static() {
                return Err(ConfigError::type_mismatch(
                    "dynamic",
                    format!("dynamic sources must not be static; got {}", schema.input_df()),
                ));
            }

            let subject_id_col = match explicit {
                Some(column) if column != static_subject_id_col => {
                    let warning = SchemaWarning::SubjectIdMismatch {
                        input_df: schema.input_df().clone(),
                        subject_id_col: column.clone(),
                        static_subject_id_col: static_subject_id_col.clone(),
                    };
                    warn!(%warning, "subject id column mismatch");
                    warnings.push(warning);
                    column
                }
                _ => static_subject_id_col.clone(),
            };
            schema.assign_subject_id_col(subject_id_col);
            sources.push(schema);
        }

        Ok(Self {
            static_schema,
            dynamic: sources,
            warnings,
        })
    }

    pub fn static_schema(&self) -> &SourceSchema {
        &self.static_schema
    }

    pub fn dynamic(&self) -> &[SourceSchema] {
        &self.dynamic
    }

    /// Diagnostics raised during construction.
    pub fn warnings(&self) -> &[SchemaWarning] {
        &self.warnings
    }

    pub fn subject_id_col(&self) -> &str {
        self.static_schema.subject_id_col().unwrap_or_default()
    }

    /// Dynamic sources grouped by the physical source they read.
    pub fn dynamic_by_df(&self) -> BTreeMap<&InputSource, Vec<&SourceSchema>> {
        let mut groups: BTreeMap<&InputSource, Vec<&SourceSchema>> = BTreeMap::new();
        for schema in &self.dynamic {
            groups.entry(schema.input_df()).or_default().push(schema);
        }
        groups
    }
}

impl TryFrom<RawDatasetSchema> for DatasetSchema {
    type Error = ConfigError;

    fn try_from(raw: RawDatasetSchema) -> Result<Self> {
        let static_schema = raw
            .static_schema
            .ok_or_else(|| ConfigError::missing("static", "dataset schema"))?;
        Self::new(static_schema, raw.dynamic)
    }
}

impl From<DatasetSchema> for RawDatasetSchema {
    fn from(schema: DatasetSchema) -> Self {
        let static_subject_id_col = schema.subject_id_col().to_string();
        let dynamic = schema
            .dynamic
            .into_iter()
            .map(|source| {
                let subject_id_col = source
                    .subject_id_col()
                    .filter(|column| *column != static_subject_id_col)
                    .map(str::to_string);
                let mut raw = RawSourceSchema::from(source);
                raw.subject_id_col = subject_id_col;
                raw
            })
            .collect();
        Self {
            static_schema: Some(schema.static_schema.into()),
            dynamic,
        }
    }
}

impl PlainConfig for DatasetSchema {
    fn to_plain(&self) -> Result<Value> {
        Ok(serde_json::to_value(RawDatasetSchema::from(self.clone()))?)
    }

    fn from_plain(value: Value) -> Result<Self> {
        let raw: RawDatasetSchema = serde_json::from_value(value)?;
        Self::try_from(raw)
    }
}
