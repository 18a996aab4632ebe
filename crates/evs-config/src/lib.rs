//! Measurement and dataset configuration for event-stream datasets.
//!
//! - [`measurement`]: one measurement's temporality, modality and fields
//! - [`metadata`]: per-key preprocessing metadata and its storage cache
//! - [`functor`]: functions of time behind functional measurements
//! - [`dataset`]: the measurement set plus dataset-wide thresholds
//! - [`vocabulary`]: categorical vocabularies and the unified vocabulary layout

#![deny(unsafe_code)]

pub mod dataset;
pub mod functor;
pub mod measurement;
pub mod metadata;
pub mod thresholds;
pub mod vocabulary;

pub use dataset::{
    DEFAULT_AGG_BY_TIME_SCALE, DatasetConfig, DatasetOptions, DynamicColumn, RawDatasetConfig,
    SimpleColumns, StrategyConfig,
};
pub use functor::{FunctorKind, TimeDependentFunctor};
pub use measurement::{
    MeasurementConfig, MeasurementConfigBuilder, MeasurementMetadata, RawMeasurementConfig,
};
pub use metadata::{MetadataValue, PREPROCESSING_METADATA_COLUMNS, read_cache, write_cache};
pub use thresholds::{CountOrProportion, lt_count_or_proportion, proportion_from_plain};
pub use vocabulary::{RawVocabulary, Vocabulary, VocabularyConfig};
