//! Per-key preprocessing metadata of numeric measurements.
//!
//! Multivariate measurements carry a table with one row per key (the first
//! column), univariate measurements a single ordered series. Either may live in
//! memory or be cached to a CSV file and loaded back on access.
//!
//! The `outlier_model` and `normalizer` columns of a table hold fitted models as
//! JSON text, so a cell may carry a whole parameter map.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde_json::{Map, Number, Value};
use tracing::debug;

use evs_model::{ConfigError, Result, describe_value};

/// Columns (or series keys) every numeric measurement's metadata must provide.
pub const PREPROCESSING_METADATA_COLUMNS: [&str; 3] = ["value_type", "outlier_model", "normalizer"];

/// Table columns whose cells are JSON documents.
const MODEL_COLUMNS: [&str; 2] = ["outlier_model", "normalizer"];

const SERIES_KEY_COLUMN: &str = "key";
const SERIES_VALUE_COLUMN: &str = "value";

/// In-memory metadata value.
#[derive(Debug, Clone)]
pub enum MetadataValue {
    Table(DataFrame),
    Series(Map<String, Value>),
}

impl PartialEq for MetadataValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MetadataValue::Table(a), MetadataValue::Table(b)) => {
                a.get_column_names() == b.get_column_names()
                    && a.dtypes() == b.dtypes()
                    && a.equals_missing(b)
            }
            (MetadataValue::Series(a), MetadataValue::Series(b)) => a == b,
            _ => false,
        }
    }
}

impl MetadataValue {
    pub fn shape_name(&self) -> &'static str {
        match self {
            MetadataValue::Table(_) => "table",
            MetadataValue::Series(_) => "series",
        }
    }

    /// Empty table keyed by `key_column`, with the mandatory columns as text.
    pub fn empty_table(key_column: &str) -> Result<Self> {
        let columns = std::iter::once(key_column)
            .chain(PREPROCESSING_METADATA_COLUMNS)
            .map(|name| Column::new(name.into(), Vec::<Option<String>>::new()))
            .collect();
        DataFrame::new(columns)
            .map(MetadataValue::Table)
            .map_err(|e| ConfigError::type_mismatch("measurement_metadata", e.to_string()))
    }

    /// Series with every mandatory key set to null.
    pub fn empty_series() -> Self {
        MetadataValue::Series(
            PREPROCESSING_METADATA_COLUMNS
                .iter()
                .map(|key| (key.to_string(), Value::Null))
                .collect(),
        )
    }

    /// Add any mandatory column or key that is missing, filled with nulls.
    pub fn add_missing_mandatory(&mut self) -> Result<()> {
        match self {
            MetadataValue::Table(df) => {
                for name in PREPROCESSING_METADATA_COLUMNS {
                    if df.column(name).is_err() {
                        let nulls = Column::full_null(name.into(), df.height(), &DataType::String);
                        df.with_column(nulls).map_err(|e| {
                            ConfigError::type_mismatch("measurement_metadata", e.to_string())
                        })?;
                    }
                }
            }
            MetadataValue::Series(series) => {
                for name in PREPROCESSING_METADATA_COLUMNS {
                    series.entry(name.to_string()).or_insert(Value::Null);
                }
            }
        }
        Ok(())
    }

    /// Problems with this table as per-key metadata: missing mandatory columns
    /// and repeated keys.
    pub fn table_violations(df: &DataFrame) -> Vec<String> {
        let mut problems = Vec::new();
        let missing: Vec<&str> = PREPROCESSING_METADATA_COLUMNS
            .into_iter()
            .filter(|name| df.column(name).is_err())
            .collect();
        if !missing.is_empty() {
            problems.push(format!("missing mandatory columns {}", missing.join(", ")));
        }
        match df.get_columns().first() {
            None => problems.push("has no key column".to_string()),
            Some(key) => match key.as_materialized_series().n_unique() {
                Ok(unique) if unique == df.height() => {}
                Ok(_) => problems.push(format!("key column {} has repeated keys", key.name())),
                Err(e) => problems.push(e.to_string()),
            },
        }
        problems
    }

    pub fn to_plain(&self) -> Result<Value> {
        match self {
            MetadataValue::Series(series) => Ok(Value::Object(series.clone())),
            MetadataValue::Table(df) => table_to_plain(df),
        }
    }

    /// Parse a table plain form `{"columns", "dtypes", "data"}`.
    pub fn table_from_plain(value: &Value) -> Result<Self> {
        table_from_plain(value).map(MetadataValue::Table)
    }

    pub fn series_from_plain(value: &Value) -> Result<Self> {
        match value {
            Value::Object(series) => Ok(MetadataValue::Series(series.clone())),
            other => Err(ConfigError::type_mismatch(
                "measurement_metadata",
                format!("a series must be a map; got {}", describe_value(other)),
            )),
        }
    }
}

/// Column dtypes a metadata table may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetadataDtype {
    Str,
    F64,
    F32,
    I64,
    I32,
    U32,
    U64,
    Bool,
    Json,
}

impl MetadataDtype {
    fn as_str(&self) -> &'static str {
        match self {
            MetadataDtype::Str => "str",
            MetadataDtype::F64 => "f64",
            MetadataDtype::F32 => "f32",
            MetadataDtype::I64 => "i64",
            MetadataDtype::I32 => "i32",
            MetadataDtype::U32 => "u32",
            MetadataDtype::U64 => "u64",
            MetadataDtype::Bool => "bool",
            MetadataDtype::Json => "json",
        }
    }

    fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "str" => Ok(MetadataDtype::Str),
            "f64" => Ok(MetadataDtype::F64),
            "f32" => Ok(MetadataDtype::F32),
            "i64" => Ok(MetadataDtype::I64),
            "i32" => Ok(MetadataDtype::I32),
            "u32" => Ok(MetadataDtype::U32),
            "u64" => Ok(MetadataDtype::U64),
            "bool" => Ok(MetadataDtype::Bool),
            "json" => Ok(MetadataDtype::Json),
            other => Err(ConfigError::type_mismatch(
                "measurement_metadata",
                format!("unsupported column dtype tag {other}"),
            )),
        }
    }

    /// Dtype a column of `name` takes when declared as `declared`.
    fn for_column(name: &str, declared: Self) -> Result<Self> {
        match (MODEL_COLUMNS.contains(&name), declared) {
            (true, MetadataDtype::Str | MetadataDtype::Json) => Ok(MetadataDtype::Json),
            (false, MetadataDtype::Json) => Err(ConfigError::type_mismatch(
                "measurement_metadata",
                format!("column {name} cannot hold json; only {} can", MODEL_COLUMNS.join(" and ")),
            )),
            (true, other) => Err(ConfigError::type_mismatch(
                "measurement_metadata",
                format!("column {name} must hold json; got {}", other.as_str()),
            )),
            (false, other) => Ok(other),
        }
    }

    fn of_column(column: &Column) -> Result<Self> {
        let dtype = Self::from_polars(column.dtype()).ok_or_else(|| {
            ConfigError::type_mismatch(
                "measurement_metadata",
                format!("column {} has unsupported dtype {}", column.name(), column.dtype()),
            )
        })?;
        Self::for_column(column.name(), dtype)
    }

    fn from_polars(dtype: &DataType) -> Option<Self> {
        match dtype {
            DataType::String | DataType::Null => Some(MetadataDtype::Str),
            DataType::Float64 => Some(MetadataDtype::F64),
            DataType::Float32 => Some(MetadataDtype::F32),
            DataType::Int64 => Some(MetadataDtype::I64),
            DataType::Int32 => Some(MetadataDtype::I32),
            DataType::UInt32 => Some(MetadataDtype::U32),
            DataType::UInt64 => Some(MetadataDtype::U64),
            DataType::Boolean => Some(MetadataDtype::Bool),
            _ => None,
        }
    }
}

fn table_to_plain(df: &DataFrame) -> Result<Value> {
    let mut columns = Vec::with_capacity(df.width());
    let mut dtypes = Vec::with_capacity(df.width());
    let mut kinds = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let dtype = MetadataDtype::of_column(column)?;
        columns.push(Value::String(column.name().to_string()));
        dtypes.push(Value::String(dtype.as_str().to_string()));
        kinds.push(dtype);
    }

    let mut data = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let cells = df
            .get_columns()
            .iter()
            .zip(&kinds)
            .map(|(column, dtype)| {
                let cell = column
                    .get(row)
                    .map_err(|e| ConfigError::type_mismatch("measurement_metadata", e.to_string()))?;
                match (dtype, cell) {
                    (MetadataDtype::Json, AnyValue::String(text)) => {
                        parse_json_cell(column.name(), text)
                    }
                    (MetadataDtype::Json, AnyValue::StringOwned(text)) => {
                        parse_json_cell(column.name(), &text)
                    }
                    (_, cell) => Ok(any_to_json(cell)),
                }
            })
            .collect::<Result<Vec<_>>>()?;
        data.push(Value::Array(cells));
    }

    let mut plain = Map::new();
    plain.insert("columns".to_string(), Value::Array(columns));
    plain.insert("dtypes".to_string(), Value::Array(dtypes));
    plain.insert("data".to_string(), Value::Array(data));
    Ok(Value::Object(plain))
}

fn array_field<'a>(value: &'a Value, name: &str) -> Result<&'a Vec<Value>> {
    value
        .get(name)
        .and_then(Value::as_array)
        .ok_or_else(|| ConfigError::missing(name, "metadata table"))
}

fn table_from_plain(value: &Value) -> Result<DataFrame> {
    let names = array_field(value, "columns")?;
    let tags = array_field(value, "dtypes")?;
    let rows = array_field(value, "data")?;
    if names.len() != tags.len() {
        return Err(ConfigError::type_mismatch(
            "measurement_metadata",
            format!("{} columns but {} dtypes", names.len(), tags.len()),
        ));
    }

    let mut columns = Vec::with_capacity(names.len());
    for (index, (name, tag)) in names.iter().zip(tags).enumerate() {
        let name = name.as_str().ok_or_else(|| {
            ConfigError::type_mismatch("measurement_metadata", format!("column name {name} is not a string"))
        })?;
        let dtype = MetadataDtype::for_column(
            name,
            MetadataDtype::from_tag(tag.as_str().unwrap_or_default())?,
        )?;
        let cells = rows
            .iter()
            .map(|row| {
                row.as_array()
                    .and_then(|cells| cells.get(index))
                    .ok_or_else(|| {
                        ConfigError::type_mismatch(
                            "measurement_metadata",
                            format!("row {row} has no cell for column {name}"),
                        )
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        columns.push(build_column(name, dtype, &cells)?);
    }
    DataFrame::new(columns)
        .map_err(|e| ConfigError::type_mismatch("measurement_metadata", e.to_string()))
}

fn build_column(name: &str, dtype: MetadataDtype, cells: &[&Value]) -> Result<Column> {
    fn convert<T>(
        name: &str,
        cells: &[&Value],
        read: impl Fn(&Value) -> Option<T>,
    ) -> Result<Vec<Option<T>>> {
        cells
            .iter()
            .map(|cell| match cell {
                Value::Null => Ok(None),
                other => read(other).map(Some).ok_or_else(|| {
                    ConfigError::type_mismatch(
                        "measurement_metadata",
                        format!("cell {other} does not fit column {name}"),
                    )
                }),
            })
            .collect()
    }

    let name: PlSmallStr = name.into();
    let column = match dtype {
        MetadataDtype::Str => {
            Column::new(name.clone(), convert(&name, cells, |v| v.as_str().map(str::to_string))?)
        }
        MetadataDtype::F64 => Column::new(name.clone(), convert(&name, cells, Value::as_f64)?),
        MetadataDtype::F32 => Column::new(
            name.clone(),
            convert(&name, cells, |v| v.as_f64().map(|f| f as f32))?,
        ),
        MetadataDtype::I64 => Column::new(name.clone(), convert(&name, cells, Value::as_i64)?),
        MetadataDtype::I32 => Column::new(
            name.clone(),
            convert(&name, cells, |v| v.as_i64().and_then(|i| i32::try_from(i).ok()))?,
        ),
        MetadataDtype::U32 => Column::new(
            name.clone(),
            convert(&name, cells, |v| v.as_u64().and_then(|i| u32::try_from(i).ok()))?,
        ),
        MetadataDtype::U64 => Column::new(name.clone(), convert(&name, cells, Value::as_u64)?),
        MetadataDtype::Bool => Column::new(name.clone(), convert(&name, cells, Value::as_bool)?),
        MetadataDtype::Json => Column::new(
            name.clone(),
            cells
                .iter()
                .map(|cell| match cell {
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect::<Vec<_>>(),
        ),
    };
    Ok(column)
}

fn parse_json_cell(column: &str, text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| {
        ConfigError::type_mismatch(
            "measurement_metadata",
            format!("cell {text:?} of column {column} is not valid json: {e}"),
        )
    })
}

/// Text form of a cell in the cache. Floats use the shortest form that reads back exactly.
fn any_to_text(value: AnyValue<'_>) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::String(s) => Some(s.to_string()),
        AnyValue::StringOwned(s) => Some(s.to_string()),
        AnyValue::Boolean(b) => Some(b.to_string()),
        AnyValue::Int32(v) => Some(v.to_string()),
        AnyValue::Int64(v) => Some(v.to_string()),
        AnyValue::UInt32(v) => Some(v.to_string()),
        AnyValue::UInt64(v) => Some(v.to_string()),
        AnyValue::Float32(v) => Some(v.to_string()),
        AnyValue::Float64(v) => Some(v.to_string()),
        other => Some(other.to_string()),
    }
}

/// Converts a Polars `AnyValue` to its plain JSON form. Non-finite floats become null.
fn any_to_json(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int8(v) => Value::from(v),
        AnyValue::Int16(v) => Value::from(v),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt8(v) => Value::from(v),
        AnyValue::UInt16(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => Number::from_f64(f64::from(v)).map_or(Value::Null, Value::Number),
        AnyValue::Float64(v) => Number::from_f64(v).map_or(Value::Null, Value::Number),
        other => Value::String(other.to_string()),
    }
}

/// Write metadata to `path` as CSV, creating parent directories.
///
/// Tables are written with their dtype tags as the first row under the header;
/// series become `key,value` rows with the value stored as JSON text.
pub fn write_cache(path: &Path, value: &MetadataValue) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
    }
    let mut df = match value {
        MetadataValue::Table(df) => tagged_text_frame(df)?,
        MetadataValue::Series(series) => series_to_frame(series)
            .map_err(|e| ConfigError::storage(path, e))?,
    };
    let mut file = File::create(path).map_err(|e| ConfigError::io(path, e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .map_err(|e| ConfigError::storage(path, e))?;
    debug!(path = %path.display(), shape = value.shape_name(), "wrote metadata cache");
    Ok(())
}

/// Load cached metadata of the given shape from `path`.
pub fn read_cache(path: &Path, as_series: bool) -> Result<MetadataValue> {
    let df = read_text_frame(path)?;
    debug!(path = %path.display(), rows = df.height(), "read metadata cache");
    if as_series {
        frame_to_series(&df).map_err(|message| ConfigError::storage(path, message))
    } else {
        restore_table_dtypes(&df)
            .map(MetadataValue::Table)
            .map_err(|message| ConfigError::storage(path, message))
    }
}

fn read_text_frame(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))
        .map_err(|e| ConfigError::storage(path, e))?
        .finish()
        .map_err(|e| ConfigError::storage(path, e))
}

fn series_to_frame(series: &Map<String, Value>) -> PolarsResult<DataFrame> {
    let keys: Vec<Option<String>> = series.keys().cloned().map(Some).collect();
    let values: Vec<Option<String>> = series.values().map(|v| Some(v.to_string())).collect();
    DataFrame::new(vec![
        Column::new(SERIES_KEY_COLUMN.into(), keys),
        Column::new(SERIES_VALUE_COLUMN.into(), values),
    ])
}

fn frame_to_series(df: &DataFrame) -> std::result::Result<MetadataValue, String> {
    if df.width() != 2 {
        return Err(format!(
            "expected a key,value series but found {} columns",
            df.width()
        ));
    }
    let text = |index: usize| -> std::result::Result<Vec<Option<String>>, String> {
        let column = df.get_columns()[index].as_materialized_series();
        let strings = column.str().map_err(|e| e.to_string())?;
        Ok(strings.into_iter().map(|s| s.map(str::to_string)).collect())
    };
    let mut series = Map::new();
    for (key, value) in text(0)?.into_iter().zip(text(1)?) {
        let key = key.ok_or_else(|| "series key is empty".to_string())?;
        let value = match value {
            Some(text) => serde_json::from_str(&text).map_err(|e| e.to_string())?,
            None => Value::Null,
        };
        series.insert(key, value);
    }
    Ok(MetadataValue::Series(series))
}

/// Every column as text, headed by a row of dtype tags.
fn tagged_text_frame(df: &DataFrame) -> Result<DataFrame> {
    let columns = df
        .get_columns()
        .iter()
        .map(|column| {
            let dtype = MetadataDtype::of_column(column)?;
            let cells = std::iter::once(Ok(Some(dtype.as_str().to_string())))
                .chain((0..column.len()).map(|row| column.get(row).map(any_to_text)))
                .collect::<PolarsResult<Vec<Option<String>>>>()
                .map_err(|e| ConfigError::type_mismatch("measurement_metadata", e.to_string()))?;
            Ok(Column::new(column.name().clone(), cells))
        })
        .collect::<Result<Vec<_>>>()?;
    DataFrame::new(columns)
        .map_err(|e| ConfigError::type_mismatch("measurement_metadata", e.to_string()))
}

/// Cast every text column back to the dtype named in its tag row.
fn restore_table_dtypes(df: &DataFrame) -> std::result::Result<DataFrame, String> {
    if df.height() == 0 {
        return Err("table cache has no dtype row".to_string());
    }
    let columns = df
        .get_columns()
        .iter()
        .map(|column| {
            let name = column.name().as_str();
            let strings = column.as_materialized_series().str().map_err(|e| e.to_string())?;
            let mut cells = strings.into_iter();
            let tag = cells
                .next()
                .flatten()
                .ok_or_else(|| format!("column {name} has no dtype tag"))?;
            let dtype = MetadataDtype::from_tag(tag)
                .and_then(|dtype| MetadataDtype::for_column(name, dtype))
                .map_err(|e| e.to_string())?;
            let cells: Vec<Option<&str>> = cells.collect();
            column_from_text(name, dtype, &cells)
        })
        .collect::<std::result::Result<Vec<_>, String>>()?;
    DataFrame::new(columns).map_err(|e| e.to_string())
}

fn column_from_text(
    name: &str,
    dtype: MetadataDtype,
    cells: &[Option<&str>],
) -> std::result::Result<Column, String> {
    fn parse_all<T: std::str::FromStr>(
        name: &str,
        cells: &[Option<&str>],
    ) -> std::result::Result<Vec<Option<T>>, String> {
        cells
            .iter()
            .map(|cell| match cell {
                None => Ok(None),
                Some(text) => text
                    .parse()
                    .map(Some)
                    .map_err(|_| format!("cell {text:?} does not fit column {name}")),
            })
            .collect()
    }

    let name: PlSmallStr = name.into();
    let column = match dtype {
        MetadataDtype::Str | MetadataDtype::Json => Column::new(
            name.clone(),
            cells.iter().map(|cell| cell.map(str::to_string)).collect::<Vec<_>>(),
        ),
        MetadataDtype::F64 => Column::new(name.clone(), parse_all::<f64>(&name, cells)?),
        MetadataDtype::F32 => Column::new(name.clone(), parse_all::<f32>(&name, cells)?),
        MetadataDtype::I64 => Column::new(name.clone(), parse_all::<i64>(&name, cells)?),
        MetadataDtype::I32 => Column::new(name.clone(), parse_all::<i32>(&name, cells)?),
        MetadataDtype::U32 => Column::new(name.clone(), parse_all::<u32>(&name, cells)?),
        MetadataDtype::U64 => Column::new(name.clone(), parse_all::<u64>(&name, cells)?),
        MetadataDtype::Bool => Column::new(name.clone(), parse_all::<bool>(&name, cells)?),
    };
    Ok(column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_table() -> MetadataValue {
        MetadataValue::table_from_plain(&json!({
            "columns": ["lab", "value_type", "outlier_model", "normalizer", "n"],
            "dtypes": ["str", "str", "str", "str", "i64"],
            "data": [
                ["K", "float", null, null, 3],
                ["Na", "integer", null, null, null],
            ],
        }))
        .unwrap()
    }

    #[test]
    fn test_table_plain_round_trip() {
        let table = sample_table();
        let plain = table.to_plain().unwrap();
        assert_eq!(plain["dtypes"][4], json!("i64"));
        assert_eq!(plain["data"][0], json!(["K", "float", null, null, 3]));
        assert_eq!(MetadataValue::table_from_plain(&plain).unwrap(), table);
    }

    #[test]
    fn test_cell_type_errors_name_the_cell() {
        let err = MetadataValue::table_from_plain(&json!({
            "columns": ["lab"],
            "dtypes": ["f64"],
            "data": [["K"]],
        }))
        .unwrap_err();
        assert!(err.to_string().contains("\"K\""));
    }

    #[test]
    fn test_table_violations() {
        let MetadataValue::Table(df) = sample_table() else {
            unreachable!()
        };
        assert!(MetadataValue::table_violations(&df).is_empty());

        let MetadataValue::Table(df) = MetadataValue::table_from_plain(&json!({
            "columns": ["lab", "value_type"],
            "dtypes": ["str", "str"],
            "data": [["K", "float"], ["K", "float"]],
        }))
        .unwrap() else {
            unreachable!()
        };
        let problems = MetadataValue::table_violations(&df);
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("outlier_model, normalizer"));
    }

    #[test]
    fn test_model_columns_hold_json() {
        let table = MetadataValue::table_from_plain(&json!({
            "columns": ["lab", "value_type", "outlier_model", "normalizer"],
            "dtypes": ["str", "str", "json", "str"],
            "data": [
                ["K", "float", {"thresh_large": 4.5, "thresh_small": -1.0}, "standard"],
                ["Na", "float", null, {"mean": 140.0, "std": 3.5}],
            ],
        }))
        .unwrap();
        let plain = table.to_plain().unwrap();
        assert_eq!(plain["dtypes"], json!(["str", "str", "json", "json"]));
        assert_eq!(plain["data"][0][2], json!({"thresh_large": 4.5, "thresh_small": -1.0}));
        assert_eq!(plain["data"][0][3], json!("standard"));
        assert_eq!(plain["data"][1][3], json!({"mean": 140.0, "std": 3.5}));
        assert_eq!(MetadataValue::table_from_plain(&plain).unwrap(), table);

        let err = MetadataValue::table_from_plain(&json!({
            "columns": ["lab", "unit"],
            "dtypes": ["str", "json"],
            "data": [["K", {"si": "mmol/L"}]],
        }))
        .unwrap_err();
        assert!(err.to_string().contains("column unit cannot hold json"));

        let err = MetadataValue::table_from_plain(&json!({
            "columns": ["lab", "normalizer"],
            "dtypes": ["str", "f64"],
            "data": [["K", 1.0]],
        }))
        .unwrap_err();
        assert!(err.to_string().contains("column normalizer must hold json"));
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let table_path = dir.path().join("nested").join("labs.csv");
        let table = sample_table();
        write_cache(&table_path, &table).unwrap();
        assert_eq!(read_cache(&table_path, false).unwrap(), table);

        let series_path = dir.path().join("age.csv");
        let series = MetadataValue::series_from_plain(&json!({
            "value_type": "float",
            "outlier_model": {"thresh": 4.5},
            "normalizer": null,
        }))
        .unwrap();
        write_cache(&series_path, &series).unwrap();
        assert_eq!(read_cache(&series_path, true).unwrap(), series);
    }

    #[test]
    fn test_cache_keeps_every_dtype() {
        let table = MetadataValue::table_from_plain(&json!({
            "columns": [
                "code", "value_type", "outlier_model", "normalizer",
                "mean", "scale", "count", "offset", "bins", "total", "seen",
                "missing_count", "missing_unit",
            ],
            "dtypes": [
                "str", "str", "json", "json",
                "f64", "f32", "i64", "i32", "u32", "u64", "bool",
                "i64", "str",
            ],
            "data": [
                [
                    "007", "float", {"thresh_large": 4.5, "thresh_small": -1.0}, {"mean": 0.1, "std": 2.0},
                    0.1, 1.5, -3, -7, 7, u64::MAX, true,
                    null, null,
                ],
                [
                    "42", "integer", null, "standard",
                    null, null, 9_007_199_254_740_993_i64, null, null, null, false,
                    null, null,
                ],
            ],
        }))
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.csv");
        write_cache(&path, &table).unwrap();
        let restored = read_cache(&path, false).unwrap();
        assert_eq!(restored, table);

        let MetadataValue::Table(df) = &restored else {
            unreachable!()
        };
        let dtypes: Vec<DataType> = df.dtypes();
        assert_eq!(
            dtypes,
            [
                DataType::String,
                DataType::String,
                DataType::String,
                DataType::String,
                DataType::Float64,
                DataType::Float32,
                DataType::Int64,
                DataType::Int32,
                DataType::UInt32,
                DataType::UInt64,
                DataType::Boolean,
                DataType::Int64,
                DataType::String,
            ]
        );
        let plain = restored.to_plain().unwrap();
        assert_eq!(plain["data"][0][0], json!("007"));
        assert_eq!(plain["data"][0][2], json!({"thresh_large": 4.5, "thresh_small": -1.0}));
        assert_eq!(plain["data"][1][6], json!(9_007_199_254_740_993_i64));
    }

    #[test]
    fn test_table_cache_without_dtype_row_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.csv");
        fs::write(&path, "lab,value_type,outlier_model,normalizer\n").unwrap();
        let err = read_cache(&path, false).unwrap_err();
        assert_eq!(err.kind(), evs_model::ErrorKind::Storage);
    }

    #[test]
    fn test_add_missing_mandatory() {
        let mut series = MetadataValue::series_from_plain(&json!({"unit": "mg"})).unwrap();
        series.add_missing_mandatory().unwrap();
        let plain = series.to_plain().unwrap();
        assert_eq!(plain.as_object().unwrap().len(), 4);
        assert_eq!(plain["normalizer"], Value::Null);
    }
}
