//! Schema shorthand normalisation.
//!
//! A source's data schema may be written in several shorthand shapes:
//!
//! | shape | plain form |
//! |---|---|
//! | single column | `["age", "float"]` |
//! | column list | `[["sbp", "dbp"], "float"]` |
//! | typed mapping | `{"age": "float", "adm": ["timestamp", "%Y-%m-%d"]}` |
//! | renaming mapping | `{"HR_RAW": ["heart_rate", "float"]}` |
//! | shared-type renaming | `[{"HR_RAW": "heart_rate", "RR_RAW": "resp_rate"}, "float"]` |
//!
//! Any mix of these may be given as a list and is merged in order into one
//! [`ColumnMapping`]. Re-adding an identical definition is a no-op; a differing
//! definition for the same source column is a conflict.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use evs_model::{ColumnType, ConfigError, Result};

/// Output name and type a source column is loaded as.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputColumn {
    pub name: String,
    pub dtype: ColumnType,
}

impl OutputColumn {
    pub fn new(name: impl Into<String>, dtype: ColumnType) -> Self {
        Self {
            name: name.into(),
            dtype,
        }
    }
}

impl fmt::Display for OutputColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.name, self.dtype)
    }
}

/// Canonical schema: source column name -> output column.
pub type ColumnMapping = BTreeMap<String, OutputColumn>;

/// Value side of a typed mapping entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnEntry {
    /// Keep the source name.
    Type(ColumnType),
    /// Rename the column on load.
    Renamed { output: String, dtype: ColumnType },
}

/// One schema shorthand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSpec {
    Column {
        column: String,
        dtype: ColumnType,
    },
    Columns {
        columns: Vec<String>,
        dtype: ColumnType,
    },
    Typed(Vec<(String, ColumnEntry)>),
    Renamed {
        columns: Vec<(String, String)>,
        dtype: ColumnType,
    },
}

impl SchemaSpec {
    pub fn column(column: impl Into<String>, dtype: ColumnType) -> Self {
        SchemaSpec::Column {
            column: column.into(),
            dtype,
        }
    }

    pub fn columns<I, S>(columns: I, dtype: ColumnType) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SchemaSpec::Columns {
            columns: columns.into_iter().map(Into::into).collect(),
            dtype,
        }
    }

    /// Parse one shorthand from its plain form.
    pub fn from_plain(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) if items.len() == 2 => {
                let dtype = ColumnType::from_plain(&items[1])
                    .map_err(|err| unprocessable_type(value, &err))?;
                match &items[0] {
                    Value::String(column) => Ok(SchemaSpec::Column {
                        column: column.clone(),
                        dtype,
                    }),
                    Value::Array(columns) => {
                        let columns = columns
                            .iter()
                            .map(column_name)
                            .collect::<Result<Vec<_>>>()?;
                        Ok(SchemaSpec::Columns { columns, dtype })
                    }
                    Value::Object(renames) => {
                        let columns = renames
                            .iter()
                            .map(|(in_col, out_col)| Ok((in_col.clone(), column_name(out_col)?)))
                            .collect::<Result<Vec<_>>>()?;
                        Ok(SchemaSpec::Renamed { columns, dtype })
                    }
                    _ => Err(unprocessable(value)),
                }
            }
            Value::Object(entries) => {
                let entries = entries
                    .iter()
                    .map(|(in_col, info)| Ok((in_col.clone(), column_entry(info)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(SchemaSpec::Typed(entries))
            }
            _ => Err(unprocessable(value)),
        }
    }

    pub fn to_plain(&self) -> Value {
        match self {
            SchemaSpec::Column { column, dtype } => {
                Value::Array(vec![Value::String(column.clone()), dtype.to_plain()])
            }
            SchemaSpec::Columns { columns, dtype } => Value::Array(vec![
                Value::Array(columns.iter().cloned().map(Value::String).collect()),
                dtype.to_plain(),
            ]),
            SchemaSpec::Typed(entries) => {
                let mut map = Map::new();
                for (in_col, entry) in entries {
                    let info = match entry {
                        ColumnEntry::Type(dtype) => dtype.to_plain(),
                        ColumnEntry::Renamed { output, dtype } => {
                            Value::Array(vec![Value::String(output.clone()), dtype.to_plain()])
                        }
                    };
                    map.insert(in_col.clone(), info);
                }
                Value::Object(map)
            }
            SchemaSpec::Renamed { columns, dtype } => {
                let renames: Map<String, Value> = columns
                    .iter()
                    .map(|(in_col, out_col)| (in_col.clone(), Value::String(out_col.clone())))
                    .collect();
                Value::Array(vec![Value::Object(renames), dtype.to_plain()])
            }
        }
    }

    /// Merge this shorthand's definitions into `mapping`.
    pub fn apply(&self, mapping: &mut ColumnMapping) -> Result<()> {
        match self {
            SchemaSpec::Column { column, dtype } => add_to_schema(mapping, column, None, dtype),
            SchemaSpec::Columns { columns, dtype } => columns
                .iter()
                .try_for_each(|column| add_to_schema(mapping, column, None, dtype)),
            SchemaSpec::Typed(entries) => {
                entries.iter().try_for_each(|(in_col, entry)| match entry {
                    ColumnEntry::Type(dtype) => add_to_schema(mapping, in_col, None, dtype),
                    ColumnEntry::Renamed { output, dtype } => {
                        add_to_schema(mapping, in_col, Some(output), dtype)
                    }
                })
            }
            SchemaSpec::Renamed { columns, dtype } => columns
                .iter()
                .try_for_each(|(in_col, out_col)| add_to_schema(mapping, in_col, Some(out_col), dtype)),
        }
    }
}

impl Serialize for SchemaSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_plain().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SchemaSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        SchemaSpec::from_plain(&value).map_err(serde::de::Error::custom)
    }
}

/// Parse a schema argument: either one shorthand or a list of shorthands.
pub fn parse_schema_list(value: &Value) -> Result<Vec<SchemaSpec>> {
    match value {
        Value::Array(items) if !is_single_shorthand(items) => {
            items.iter().map(SchemaSpec::from_plain).collect()
        }
        other => Ok(vec![SchemaSpec::from_plain(other)?]),
    }
}

/// A two-element array is one shorthand unless both elements are shorthands themselves,
/// as in `[["a", "float"], ["timestamp", "float"]]`. A bare string second element is
/// always read as a type name.
fn is_single_shorthand(items: &[Value]) -> bool {
    items.len() == 2
        && matches!(items[0], Value::String(_) | Value::Array(_) | Value::Object(_))
        && (items[1].is_string() || ColumnType::from_plain(&items[1]).is_ok())
        && !items.iter().all(|item| SchemaSpec::from_plain(item).is_ok())
}

/// Serde adapter for optional schema arguments on raw source schemas.
pub(crate) fn deserialize_schema_list<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<SchemaSpec>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_schema_list(&value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Merge a list of shorthands, in order, into one canonical mapping.
pub fn unify_schema(specs: &[SchemaSpec]) -> Result<ColumnMapping> {
    let mut mapping = ColumnMapping::new();
    for spec in specs {
        spec.apply(&mut mapping)?;
    }
    Ok(mapping)
}

/// Add one `in_col -> (out_col, dtype)` definition. `out_col` defaults to `in_col`.
pub fn add_to_schema(
    mapping: &mut ColumnMapping,
    in_col: &str,
    out_col: Option<&str>,
    dtype: &ColumnType,
) -> Result<()> {
    let new = OutputColumn::new(out_col.unwrap_or(in_col), dtype.clone());
    match mapping.get(in_col) {
        Some(existing) if *existing != new => Err(ConfigError::ConflictingColumn {
            column: in_col.to_string(),
            existing: existing.to_string(),
            new: new.to_string(),
        }),
        Some(_) => Ok(()),
        None => {
            mapping.insert(in_col.to_string(), new);
            Ok(())
        }
    }
}

fn column_name(value: &Value) -> Result<String> {
    match value {
        Value::String(name) => Ok(name.clone()),
        other => Err(ConfigError::type_mismatch(
            "schema column",
            format!("column names must be strings; got {other}"),
        )),
    }
}

fn column_entry(info: &Value) -> Result<ColumnEntry> {
    if let Value::Array(items) = info
        && let [Value::String(output), dtype] = items.as_slice()
        && let Ok(dtype) = ColumnType::from_plain(dtype)
    {
        return Ok(ColumnEntry::Renamed {
            output: output.clone(),
            dtype,
        });
    }
    ColumnType::from_plain(info)
        .map(ColumnEntry::Type)
        .map_err(|err| unprocessable_type(info, &err))
}

fn unprocessable(value: &Value) -> ConfigError {
    ConfigError::type_mismatch("schema", format!("schema unprocessable: {value}"))
}

fn unprocessable_type(value: &Value, cause: &ConfigError) -> ConfigError {
    ConfigError::type_mismatch("schema", format!("schema unprocessable: {value} ({cause})"))
}
