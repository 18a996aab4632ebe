//! Input-source schemas for event-stream datasets.
//!
//! - [`unify`]: normalises schema shorthands into one canonical column mapping
//! - [`source`]: per-source structural validation and load plans
//! - [`catalog`]: the static source plus dynamic sources of one dataset

#![deny(unsafe_code)]

pub mod catalog;
pub mod source;
pub mod unify;

pub use catalog::{DatasetSchema, RawDatasetSchema, SchemaWarning, SourceInput};
pub use source::{
    COLUMN_REFERENCE_PREFIX, ColumnRef, EventLabel, EventTypeSpec, FilterPredicate, InputSource,
    MustHave, RawSourceSchema, SourceSchema, UnifiedSchema,
};
pub use unify::{
    ColumnEntry, ColumnMapping, OutputColumn, SchemaSpec, add_to_schema, parse_schema_list,
    unify_schema,
};
