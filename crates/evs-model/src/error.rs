//! Error taxonomy shared by schema and measurement configuration.
//!
//! Every failure raised while constructing or validating a configuration object
//! falls into one of the categories of [`ErrorKind`]. Validation is eager, so
//! these errors surface from constructors and `from_plain` calls rather than
//! from later reads.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Broad category of a [`ConfigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A mandatory field for the given source type or modality is unset.
    MissingField,
    /// A field that must be unset for the given source type or modality is set.
    ForbiddenField,
    /// A value has the wrong shape or type.
    TypeMismatch,
    /// The same column or measurement is defined twice, inconsistently.
    Conflict,
    /// Individually valid settings that are not allowed together.
    Incompatible,
    /// An unrecognised functor class tag.
    UnknownTag,
    /// Metadata cache misuse or a failed durable read/write.
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingField => "missing field",
            ErrorKind::ForbiddenField => "forbidden field",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::Conflict => "conflicting definition",
            ErrorKind::Incompatible => "incompatible combination",
            ErrorKind::UnknownTag => "unknown tag",
            ErrorKind::Storage => "storage",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing mandatory field `{field}` for {context}")]
    MissingField { field: String, context: String },

    #[error("field `{field}` must not be set for {context}; got {value}")]
    ForbiddenField {
        field: String,
        context: String,
        value: String,
    },

    #[error("invalid {field}: {message}")]
    TypeMismatch { field: String, message: String },

    #[error("column {column} is repeated in schema with a different value (existing: {existing}, new: {new})")]
    ConflictingColumn {
        column: String,
        existing: String,
        new: String,
    },

    #[error("measurement config {key} has name {name} which differs from its key")]
    NameMismatch { key: String, name: String },

    #[error("{0}")]
    Incompatible(String),

    #[error("unknown functor class `{0}`")]
    UnknownFunctor(String),

    #[error("{}", join_errors(.0))]
    Multiple(Vec<ConfigError>),

    #[error("measurement config {key} invalid: {source}")]
    InvalidMeasurement {
        key: String,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("{0}")]
    Cache(String),

    #[error("failed to access metadata at {path}: {message}")]
    Storage { path: PathBuf, message: String },

    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed plain structure: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse TOML {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl ConfigError {
    pub fn missing(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
            context: context.into(),
        }
    }

    pub fn forbidden(
        field: impl Into<String>,
        context: impl Into<String>,
        value: impl fmt::Debug,
    ) -> Self {
        Self::ForbiddenField {
            field: field.into(),
            context: context.into(),
            value: format!("{value:?}"),
        }
    }

    pub fn type_mismatch(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn storage(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Collapses accumulated violations: `None` when empty, the single error
    /// when there is one, otherwise [`ConfigError::Multiple`].
    pub fn from_violations(mut errors: Vec<ConfigError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }

    /// Category of this error. Wrapped and accumulated errors report the
    /// category of their first inner error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::MissingField { .. } => ErrorKind::MissingField,
            ConfigError::ForbiddenField { .. } => ErrorKind::ForbiddenField,
            ConfigError::TypeMismatch { .. } | ConfigError::Json(_) | ConfigError::Toml { .. } => {
                ErrorKind::TypeMismatch
            }
            ConfigError::ConflictingColumn { .. } | ConfigError::NameMismatch { .. } => {
                ErrorKind::Conflict
            }
            ConfigError::Incompatible(_) => ErrorKind::Incompatible,
            ConfigError::UnknownFunctor(_) => ErrorKind::UnknownTag,
            ConfigError::Multiple(errors) => errors
                .first()
                .map_or(ErrorKind::Incompatible, ConfigError::kind),
            ConfigError::InvalidMeasurement { source, .. } => source.kind(),
            ConfigError::Cache(_) | ConfigError::Storage { .. } | ConfigError::Io { .. } => {
                ErrorKind::Storage
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_violation_is_not_wrapped() {
        let error = ConfigError::from_violations(vec![ConfigError::missing("ts_col", "event source")])
            .expect("one violation");
        assert_eq!(error.kind(), ErrorKind::MissingField);
        assert!(matches!(error, ConfigError::MissingField { .. }));
    }

    #[test]
    fn multiple_violations_list_every_message() {
        let error = ConfigError::from_violations(vec![
            ConfigError::Incompatible("first".to_string()),
            ConfigError::missing("values_column", "multivariate_regression measurement"),
        ])
        .expect("two violations");
        let message = error.to_string();
        assert!(message.contains("first"));
        assert!(message.contains("values_column"));
        assert_eq!(error.kind(), ErrorKind::Incompatible);
    }

    #[test]
    fn wrapped_measurement_error_keeps_inner_kind() {
        let error = ConfigError::InvalidMeasurement {
            key: "age".to_string(),
            source: Box::new(ConfigError::UnknownFunctor("Foo".to_string())),
        };
        assert_eq!(error.kind(), ErrorKind::UnknownTag);
        assert!(error.to_string().starts_with("measurement config age invalid"));
    }

    #[test]
    fn no_violations_yields_none() {
        assert!(ConfigError::from_violations(Vec::new()).is_none());
    }
}
