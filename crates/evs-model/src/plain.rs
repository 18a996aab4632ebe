//! Plain-structure round trips and file persistence.
//!
//! Configuration objects convert to and from plain nested values (maps, lists,
//! scalars) so they can be stored as JSON or TOML. Conversion from a plain
//! value always runs full validation.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;

use crate::error::{ConfigError, Result};

pub trait PlainConfig: Sized {
    /// Represent this object as a plain nested value.
    fn to_plain(&self) -> Result<Value>;

    /// Build and validate an object from its plain representation.
    fn from_plain(value: Value) -> Result<Self>;

    /// Write the plain representation as pretty JSON.
    ///
    /// Refuses to replace an existing file unless `overwrite` is set.
    fn to_json_file(&self, path: &Path, overwrite: bool) -> Result<()> {
        if !overwrite && path.exists() {
            return Err(ConfigError::io(
                path,
                io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} exists and overwrite is disabled", path.display()),
                ),
            ));
        }
        let text = serde_json::to_string_pretty(&self.to_plain()?)?;
        fs::write(path, text).map_err(|e| ConfigError::io(path, e))
    }

    fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let value: Value = serde_json::from_str(&text)?;
        Self::from_plain(value)
    }

    fn from_toml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let value: Value = toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_plain(value)
    }

    /// Load from `.toml` or `.json` (the default for any other extension).
    fn from_file(path: &Path) -> Result<Self> {
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml_file(path)
        } else {
            Self::from_json_file(path)
        }
    }
}

/// Short description of a plain value's shape, for error messages.
pub fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}
