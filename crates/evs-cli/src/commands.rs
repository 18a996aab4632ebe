use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use evs_config::{DatasetConfig, VocabularyConfig};
use evs_model::PlainConfig;
use evs_schema::DatasetSchema;

pub fn run_schema(path: &Path) -> Result<DatasetSchema> {
    let span = info_span!("schema", file = %path.display());
    let _guard = span.enter();
    let schema = DatasetSchema::from_file(path)
        .with_context(|| format!("load dataset schema {}", path.display()))?;
    info!(
        dynamic_sources = schema.dynamic().len(),
        subject_id_col = schema.subject_id_col(),
        warnings = schema.warnings().len(),
        "dataset schema is valid"
    );
    Ok(schema)
}

pub fn run_config(path: &Path) -> Result<DatasetConfig> {
    let span = info_span!("config", file = %path.display());
    let _guard = span.enter();
    let config = DatasetConfig::from_file(path)
        .with_context(|| format!("load dataset config {}", path.display()))?;
    info!(
        measurements = config.measurement_configs().len(),
        active = config.active_measurements().count(),
        "dataset config is valid"
    );
    Ok(config)
}

pub fn run_vocab(path: &Path) -> Result<VocabularyConfig> {
    let span = info_span!("vocab", file = %path.display());
    let _guard = span.enter();
    let config = VocabularyConfig::from_file(path)
        .with_context(|| format!("load vocabulary config {}", path.display()))?;
    info!(
        total_vocab_size = config.total_vocab_size(),
        "vocabulary config loaded"
    );
    Ok(config)
}
