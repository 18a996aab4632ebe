//! Per-source schema descriptions.
//!
//! A [`SourceSchema`] describes one input table: its structural role
//! ([`SourceType`]), the columns identifying subjects, timestamps and event
//! types, and the data columns to load. It is built from a [`RawSourceSchema`]
//! and fully validated on construction.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use evs_model::{ColumnType, ConfigError, PlainConfig, Result, SourceType};

use crate::unify::{ColumnMapping, SchemaSpec, deserialize_schema_list, unify_schema};

/// Prefix marking an event type that is read from a source column.
pub const COLUMN_REFERENCE_PREFIX: &str = "COL:";

/// Opaque handle to the physical data behind a source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputSource {
    /// File on disk.
    Path(PathBuf),
    /// Database query.
    Query { query: String },
    /// In-memory table registered by the ingestion pipeline.
    Table { table: String },
}

impl InputSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        InputSource::Path(path.into())
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Path(path) => write!(f, "{}", path.display()),
            InputSource::Query { query } => write!(f, "query `{query}`"),
            InputSource::Table { table } => write!(f, "table `{table}`"),
        }
    }
}

/// One timestamp column or several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    One(String),
    Many(Vec<String>),
}

impl ColumnRef {
    pub fn columns(&self) -> Vec<&str> {
        match self {
            ColumnRef::One(column) => vec![column.as_str()],
            ColumnRef::Many(columns) => columns.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(column: &str) -> Self {
        ColumnRef::One(column.to_string())
    }
}

/// Event-type labels: one label, or the (equal, start, end) labels of a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTypeSpec {
    Single(String),
    Range {
        equal: String,
        start: String,
        end: String,
    },
}

impl EventTypeSpec {
    /// Range labels derived from one base label.
    pub fn expand(label: &str) -> Self {
        EventTypeSpec::Range {
            equal: label.to_string(),
            start: format!("{label}_START"),
            end: format!("{label}_END"),
        }
    }

    pub fn labels(&self) -> Vec<&str> {
        match self {
            EventTypeSpec::Single(label) => vec![label.as_str()],
            EventTypeSpec::Range { equal, start, end } => {
                vec![equal.as_str(), start.as_str(), end.as_str()]
            }
        }
    }
}

impl Serialize for EventTypeSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            EventTypeSpec::Single(label) => serializer.serialize_str(label),
            EventTypeSpec::Range { equal, start, end } => (equal, start, end).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for EventTypeSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(label) => Ok(EventTypeSpec::Single(label)),
            Value::Array(items) => match items.as_slice() {
                [Value::String(equal), Value::String(start), Value::String(end)] => {
                    Ok(EventTypeSpec::Range {
                        equal: equal.clone(),
                        start: start.clone(),
                        end: end.clone(),
                    })
                }
                _ => Err(serde::de::Error::custom(format!(
                    "event_type must be a string or a list of 3 strings; got {}",
                    Value::Array(items)
                ))),
            },
            other => Err(serde::de::Error::custom(format!(
                "event_type must be a string or a list of 3 strings; got {other}"
            ))),
        }
    }
}

/// Interpretation of one event-type label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLabel<'a> {
    Literal(&'a str),
    Column(&'a str),
}

impl<'a> EventLabel<'a> {
    pub fn parse(label: &'a str) -> Self {
        match label.strip_prefix(COLUMN_REFERENCE_PREFIX) {
            Some(column) => EventLabel::Column(column),
            None => EventLabel::Literal(label),
        }
    }
}

/// Mandatory-presence filter on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum MustHave {
    NonNull(String),
    OneOf(String, Vec<Value>),
}

impl MustHave {
    pub fn column(&self) -> &str {
        match self {
            MustHave::NonNull(column) | MustHave::OneOf(column, _) => column,
        }
    }

    pub fn from_plain(value: &Value) -> Result<Self> {
        match value {
            Value::String(column) => Ok(MustHave::NonNull(column.clone())),
            Value::Array(items) => match items.as_slice() {
                [Value::String(column), Value::Array(allowed)] => {
                    Ok(MustHave::OneOf(column.clone(), allowed.clone()))
                }
                _ => Err(malformed_filter(value)),
            },
            _ => Err(malformed_filter(value)),
        }
    }

    pub fn to_plain(&self) -> Value {
        match self {
            MustHave::NonNull(column) => Value::String(column.clone()),
            MustHave::OneOf(column, allowed) => {
                Value::Array(vec![Value::String(column.clone()), Value::Array(allowed.clone())])
            }
        }
    }
}

fn malformed_filter(value: &Value) -> ConfigError {
    ConfigError::type_mismatch("must_have", format!("malformed filter: {value}"))
}

impl Serialize for MustHave {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_plain().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MustHave {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        MustHave::from_plain(&value).map_err(serde::de::Error::custom)
    }
}

/// Predicate a loaded row must satisfy on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterPredicate {
    NonNull,
    OneOf(Vec<Value>),
}

/// Canonical schema(s) of a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnifiedSchema {
    Single(ColumnMapping),
    Range {
        equal: ColumnMapping,
        start: ColumnMapping,
        end: ColumnMapping,
    },
}

/// Unvalidated source schema in its plain shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSourceSchema {
    pub input_df: Option<InputSource>,
    #[serde(rename = "type")]
    pub source_type: Option<SourceType>,
    pub event_type: Option<EventTypeSpec>,
    pub subject_id_col: Option<String>,
    pub ts_col: Option<ColumnRef>,
    pub start_ts_col: Option<ColumnRef>,
    pub end_ts_col: Option<ColumnRef>,
    pub ts_format: Option<String>,
    pub start_ts_format: Option<String>,
    pub end_ts_format: Option<String>,
    #[serde(deserialize_with = "deserialize_schema_list")]
    pub data_schema: Option<Vec<SchemaSpec>>,
    #[serde(deserialize_with = "deserialize_schema_list")]
    pub start_data_schema: Option<Vec<SchemaSpec>>,
    #[serde(deserialize_with = "deserialize_schema_list")]
    pub end_data_schema: Option<Vec<SchemaSpec>>,
    pub must_have: Vec<MustHave>,
}

impl RawSourceSchema {
    pub fn new(input_df: InputSource, source_type: SourceType) -> Self {
        Self {
            input_df: Some(input_df),
            source_type: Some(source_type),
            ..Self::default()
        }
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(EventTypeSpec::Single(event_type.into()));
        self
    }

    pub fn with_subject_id_col(mut self, column: impl Into<String>) -> Self {
        self.subject_id_col = Some(column.into());
        self
    }

    pub fn with_ts_col(mut self, column: impl Into<String>) -> Self {
        self.ts_col = Some(ColumnRef::One(column.into()));
        self
    }

    pub fn with_range_ts_cols(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_ts_col = Some(ColumnRef::One(start.into()));
        self.end_ts_col = Some(ColumnRef::One(end.into()));
        self
    }

    pub fn with_ts_format(mut self, format: impl Into<String>) -> Self {
        self.ts_format = Some(format.into());
        self
    }

    pub fn with_data_schema(mut self, specs: Vec<SchemaSpec>) -> Self {
        self.data_schema = Some(specs);
        self
    }

    pub fn with_must_have(mut self, filter: MustHave) -> Self {
        self.must_have.push(filter);
        self
    }

    pub fn build(self) -> Result<SourceSchema> {
        SourceSchema::try_from(self)
    }
}

/// Validated description of one input source.
///
/// A dynamic source placed in a [`DatasetSchema`](crate::DatasetSchema) is assigned the
/// dataset's subject-id column. The assignment is not part of the source's own plain form
/// and does not take part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawSourceSchema", into = "RawSourceSchema")]
pub struct SourceSchema {
    input_df: InputSource,
    source_type: SourceType,
    event_type: Option<EventTypeSpec>,
    subject_id_col: Option<String>,
    assigned_subject_id_col: Option<String>,
    ts_col: Option<ColumnRef>,
    start_ts_col: Option<ColumnRef>,
    end_ts_col: Option<ColumnRef>,
    ts_format: Option<String>,
    start_ts_format: Option<String>,
    end_ts_format: Option<String>,
    data_schema: Option<Vec<SchemaSpec>>,
    start_data_schema: Option<Vec<SchemaSpec>>,
    end_data_schema: Option<Vec<SchemaSpec>>,
    must_have: Vec<MustHave>,
    unified: UnifiedSchema,
    columns_to_load: Vec<(String, ColumnType)>,
}

impl TryFrom<RawSourceSchema> for SourceSchema {
    type Error = ConfigError;

    fn try_from(mut raw: RawSourceSchema) -> Result<Self> {
        validate(&mut raw)?;
        let unified = unify_source(&raw)?;
        let columns_to_load = plan_columns(&raw, &unified)?;
        let (Some(input_df), Some(source_type)) = (raw.input_df, raw.source_type) else {
            return Err(ConfigError::missing("input_df", "source schema"));
        };
        debug!(
            source = %input_df,
            source_type = %source_type,
            columns = columns_to_load.len(),
            "validated source schema"
        );
        Ok(Self {
            input_df,
            source_type,
            event_type: raw.event_type,
            subject_id_col: raw.subject_id_col,
            assigned_subject_id_col: None,
            ts_col: raw.ts_col,
            start_ts_col: raw.start_ts_col,
            end_ts_col: raw.end_ts_col,
            ts_format: raw.ts_format,
            start_ts_format: raw.start_ts_format,
            end_ts_format: raw.end_ts_format,
            data_schema: raw.data_schema,
            start_data_schema: raw.start_data_schema,
            end_data_schema: raw.end_data_schema,
            must_have: raw.must_have,
            unified,
            columns_to_load,
        })
    }
}

impl PartialEq for SourceSchema {
    fn eq(&self, other: &Self) -> bool {
        self.input_df == other.input_df
            && self.source_type == other.source_type
            && self.event_type == other.event_type
            && self.subject_id_col == other.subject_id_col
            && self.ts_col == other.ts_col
            && self.start_ts_col == other.start_ts_col
            && self.end_ts_col == other.end_ts_col
            && self.ts_format == other.ts_format
            && self.start_ts_format == other.start_ts_format
            && self.end_ts_format == other.end_ts_format
            && self.data_schema == other.data_schema
            && self.start_data_schema == other.start_data_schema
            && self.end_data_schema == other.end_data_schema
            && self.must_have == other.must_have
            && self.unified == other.unified
            && self.columns_to_load == other.columns_to_load
    }
}

impl From<SourceSchema> for RawSourceSchema {
    fn from(schema: SourceSchema) -> Self {
        Self {
            input_df: Some(schema.input_df),
            source_type: Some(schema.source_type),
            event_type: schema.event_type,
            subject_id_col: schema.subject_id_col,
            ts_col: schema.ts_col,
            start_ts_col: schema.start_ts_col,
            end_ts_col: schema.end_ts_col,
            ts_format: schema.ts_format,
            start_ts_format: schema.start_ts_format,
            end_ts_format: schema.end_ts_format,
            data_schema: schema.data_schema,
            start_data_schema: schema.start_data_schema,
            end_data_schema: schema.end_data_schema,
            must_have: schema.must_have,
        }
    }
}

impl PlainConfig for SourceSchema {
    fn to_plain(&self) -> Result<Value> {
        Ok(serde_json::to_value(RawSourceSchema::from(self.clone()))?)
    }

    fn from_plain(value: Value) -> Result<Self> {
        let raw: RawSourceSchema = serde_json::from_value(value)?;
        Self::try_from(raw)
    }
}

impl SourceSchema {
    pub fn input_df(&self) -> &InputSource {
        &self.input_df
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn event_type(&self) -> Option<&EventTypeSpec> {
        self.event_type.as_ref()
    }

    /// The source's own subject-id column, or the one assigned by its dataset.
    pub fn subject_id_col(&self) -> Option<&str> {
        self.subject_id_col
            .as_deref()
            .or(self.assigned_subject_id_col.as_deref())
    }

    pub fn ts_col(&self) -> Option<&ColumnRef> {
        self.ts_col.as_ref()
    }

    pub fn start_ts_col(&self) -> Option<&ColumnRef> {
        self.start_ts_col.as_ref()
    }

    pub fn end_ts_col(&self) -> Option<&ColumnRef> {
        self.end_ts_col.as_ref()
    }

    pub fn ts_format(&self) -> Option<&str> {
        self.ts_format.as_deref()
    }

    pub fn start_ts_format(&self) -> Option<&str> {
        self.start_ts_format.as_deref()
    }

    pub fn end_ts_format(&self) -> Option<&str> {
        self.end_ts_format.as_deref()
    }

    pub fn data_schema(&self) -> Option<&[SchemaSpec]> {
        self.data_schema.as_deref()
    }

    /// Start-event schema; falls back to the shared schema on ranges.
    pub fn start_data_schema(&self) -> Option<&[SchemaSpec]> {
        self.start_data_schema
            .as_deref()
            .or_else(|| self.range_fallback())
    }

    /// End-event schema; falls back to the shared schema on ranges.
    pub fn end_data_schema(&self) -> Option<&[SchemaSpec]> {
        self.end_data_schema
            .as_deref()
            .or_else(|| self.range_fallback())
    }

    fn range_fallback(&self) -> Option<&[SchemaSpec]> {
        match self.source_type {
            SourceType::Range => self.data_schema.as_deref(),
            _ => None,
        }
    }

    pub fn must_have(&self) -> &[MustHave] {
        &self.must_have
    }

    pub fn is_static(&self) -> bool {
        self.source_type.is_static()
    }

    /// Source columns to read, each with the type to load it as.
    ///
    /// Data columns come first, followed by the start, end and single
    /// timestamp columns.
    pub fn columns_to_load(&self) -> &[(String, ColumnType)] {
        &self.columns_to_load
    }

    pub fn unified_schema(&self) -> &UnifiedSchema {
        &self.unified
    }

    /// Row filters keyed by column. Later filters on a column replace earlier ones.
    pub fn filter_on(&self) -> BTreeMap<String, FilterPredicate> {
        self.must_have
            .iter()
            .map(|filter| {
                let predicate = match filter {
                    MustHave::NonNull(_) => FilterPredicate::NonNull,
                    MustHave::OneOf(_, allowed) => FilterPredicate::OneOf(allowed.clone()),
                };
                (filter.column().to_string(), predicate)
            })
            .collect()
    }

    /// Columns whose values supply event types.
    pub fn event_type_columns(&self) -> Vec<&str> {
        self.event_type
            .iter()
            .flat_map(EventTypeSpec::labels)
            .filter_map(|label| match EventLabel::parse(label) {
                EventLabel::Column(column) => Some(column),
                EventLabel::Literal(_) => None,
            })
            .collect()
    }

    pub(crate) fn assign_subject_id_col(&mut self, column: String) {
        self.assigned_subject_id_col = Some(column);
    }
}

/// Check the structural rules of the source type, normalising range fields in place.
///
/// Running it a second time on its own output is a no-op.
fn validate(raw: &mut RawSourceSchema) -> Result<()> {
    if raw.input_df.is_none() {
        return Err(ConfigError::missing("input_df", "source schema"));
    }
    let source_type = raw
        .source_type
        .ok_or_else(|| ConfigError::missing("type", "source schema"))?;
    match source_type {
        SourceType::Static => validate_static(raw),
        SourceType::Event => validate_event(raw),
        SourceType::Range => validate_range(raw),
    }
}

fn forbid<T: fmt::Debug>(field: &str, context: &str, value: &Option<T>) -> Result<()> {
    match value {
        Some(value) => Err(ConfigError::forbidden(field, context, value)),
        None => Ok(()),
    }
}

fn require<T>(field: &str, context: &str, value: &Option<T>) -> Result<()> {
    match value {
        Some(_) => Ok(()),
        None => Err(ConfigError::missing(field, context)),
    }
}

fn validate_static(raw: &RawSourceSchema) -> Result<()> {
    const CONTEXT: &str = "static source";
    require("subject_id_col", CONTEXT, &raw.subject_id_col)?;
    forbid("event_type", CONTEXT, &raw.event_type)?;
    forbid("ts_col", CONTEXT, &raw.ts_col)?;
    forbid("start_ts_col", CONTEXT, &raw.start_ts_col)?;
    forbid("end_ts_col", CONTEXT, &raw.end_ts_col)
}

fn validate_event(raw: &RawSourceSchema) -> Result<()> {
    const CONTEXT: &str = "event source";
    match &raw.event_type {
        None => return Err(ConfigError::missing("event_type", CONTEXT)),
        Some(EventTypeSpec::Range { .. }) => {
            return Err(ConfigError::type_mismatch(
                "event_type",
                format!(
                    "must be a single string for an event source; got {:?}",
                    raw.event_type
                ),
            ));
        }
        Some(EventTypeSpec::Single(_)) => {}
    }
    require("ts_col", CONTEXT, &raw.ts_col)?;
    forbid("start_ts_col", CONTEXT, &raw.start_ts_col)?;
    forbid("end_ts_col", CONTEXT, &raw.end_ts_col)?;
    forbid("start_ts_format", CONTEXT, &raw.start_ts_format)?;
    forbid("end_ts_format", CONTEXT, &raw.end_ts_format)?;
    forbid("start_data_schema", CONTEXT, &raw.start_data_schema)?;
    forbid("end_data_schema", CONTEXT, &raw.end_data_schema)?;
    forbid("subject_id_col", CONTEXT, &raw.subject_id_col)
}

fn validate_range(raw: &mut RawSourceSchema) -> Result<()> {
    const CONTEXT: &str = "range source";
    match &raw.event_type {
        None => return Err(ConfigError::missing("event_type", CONTEXT)),
        Some(EventTypeSpec::Single(label)) => {
            let expanded = EventTypeSpec::expand(label);
            debug!(?expanded, "expanded range event type");
            raw.event_type = Some(expanded);
        }
        Some(EventTypeSpec::Range { .. }) => {}
    }

    if raw.data_schema.is_some() {
        forbid("start_data_schema", CONTEXT, &raw.start_data_schema)?;
        forbid("end_data_schema", CONTEXT, &raw.end_data_schema)?;
    }

    require("start_ts_col", CONTEXT, &raw.start_ts_col)?;
    require("end_ts_col", CONTEXT, &raw.end_ts_col)?;
    forbid("ts_col", CONTEXT, &raw.ts_col)?;
    forbid("subject_id_col", CONTEXT, &raw.subject_id_col)?;

    match (&raw.start_ts_format, &raw.end_ts_format) {
        (Some(_), None) => Err(ConfigError::missing("end_ts_format", CONTEXT)),
        (None, Some(_)) => Err(ConfigError::missing("start_ts_format", CONTEXT)),
        (Some(_), Some(_)) => forbid("ts_format", CONTEXT, &raw.ts_format),
        (None, None) => {
            if let Some(format) = raw.ts_format.take() {
                raw.start_ts_format = Some(format.clone());
                raw.end_ts_format = Some(format);
            }
            Ok(())
        }
    }
}

fn unify_optional(specs: Option<&[SchemaSpec]>) -> Result<ColumnMapping> {
    unify_schema(specs.unwrap_or_default())
}

fn unify_source(raw: &RawSourceSchema) -> Result<UnifiedSchema> {
    let shared = raw.data_schema.as_deref();
    if raw.source_type != Some(SourceType::Range) {
        return Ok(UnifiedSchema::Single(unify_optional(shared)?));
    }

    let start = raw.start_data_schema.as_deref().or(shared);
    let end = raw.end_data_schema.as_deref().or(shared);
    let equal = match shared {
        Some(specs) => unify_schema(specs)?,
        None => {
            let combined: Vec<SchemaSpec> = start
                .unwrap_or_default()
                .iter()
                .chain(end.unwrap_or_default())
                .cloned()
                .collect();
            unify_schema(&combined)?
        }
    };
    Ok(UnifiedSchema::Range {
        equal,
        start: unify_optional(start)?,
        end: unify_optional(end)?,
    })
}

fn plan_columns(raw: &RawSourceSchema, unified: &UnifiedSchema) -> Result<Vec<(String, ColumnType)>> {
    let mut columns: Vec<(String, ColumnType)> = Vec::new();
    let mut seen: BTreeMap<String, ColumnType> = BTreeMap::new();
    let mappings: Vec<&ColumnMapping> = match unified {
        UnifiedSchema::Single(mapping) => vec![mapping],
        UnifiedSchema::Range { equal, start, end } => vec![equal, start, end],
    };

    for mapping in mappings {
        for (in_col, out) in mapping {
            match seen.get(in_col) {
                Some(dtype) if *dtype != out.dtype => {
                    return Err(ConfigError::ConflictingColumn {
                        column: in_col.clone(),
                        existing: dtype.to_string(),
                        new: out.dtype.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    seen.insert(in_col.clone(), out.dtype.clone());
                    columns.push((in_col.clone(), out.dtype.clone()));
                }
            }
        }
    }

    let timestamp_groups = [
        (&raw.start_ts_col, &raw.start_ts_format),
        (&raw.end_ts_col, &raw.end_ts_format),
        (&raw.ts_col, &raw.ts_format),
    ];
    for (column_ref, format) in timestamp_groups {
        let Some(column_ref) = column_ref else {
            continue;
        };
        let dtype = ColumnType::Timestamp(format.clone());
        for column in column_ref.columns() {
            columns.push((column.to_string(), dtype.clone()));
        }
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn range() -> RawSourceSchema {
        RawSourceSchema::new(InputSource::path("stays.csv"), SourceType::Range)
            .with_event_type("STAY")
            .with_range_ts_cols("admit", "discharge")
            .with_ts_format("%Y-%m-%d")
    }

    #[test]
    fn validation_is_idempotent() {
        let mut raw = range();
        validate(&mut raw).unwrap();
        let once = serde_json::to_value(&raw).unwrap();
        validate(&mut raw).unwrap();
        assert_eq!(serde_json::to_value(&raw).unwrap(), once);
        assert_eq!(raw.start_ts_format.as_deref(), Some("%Y-%m-%d"));
        assert!(raw.ts_format.is_none());
    }

    #[test]
    fn event_label_sentinel() {
        assert_eq!(EventLabel::parse("COL:kind"), EventLabel::Column("kind"));
        assert_eq!(EventLabel::parse("LAB"), EventLabel::Literal("LAB"));
    }

    #[test]
    fn malformed_must_have_names_the_literal() {
        let err = MustHave::from_plain(&json!(["a", "b"])).unwrap_err();
        assert!(err.to_string().contains(r#"["a","b"]"#));
    }
}
