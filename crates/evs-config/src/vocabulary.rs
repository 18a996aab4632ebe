//! Per-measurement vocabularies and the dataset-wide vocabulary layout.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use evs_model::{ConfigError, DataModality, PlainConfig, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawVocabulary {
    pub vocabulary: Vec<String>,
    pub obs_frequencies: Vec<f64>,
}

/// Ordered categorical elements of one measurement with their observed frequencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawVocabulary", into = "RawVocabulary")]
pub struct Vocabulary {
    elements: Vec<String>,
    obs_frequencies: Vec<f64>,
}

impl Vocabulary {
    pub fn new(elements: Vec<String>, obs_frequencies: Vec<f64>) -> Result<Self> {
        if elements.len() != obs_frequencies.len() {
            return Err(ConfigError::type_mismatch(
                "vocabulary",
                format!(
                    "{} elements but {} observation frequencies",
                    elements.len(),
                    obs_frequencies.len()
                ),
            ));
        }
        Ok(Self {
            elements,
            obs_frequencies,
        })
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn obs_frequencies(&self) -> &[f64] {
        &self.obs_frequencies
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Summary: size and the most frequent elements.
    pub fn describe(&self, top_n: usize) -> String {
        let mut ranked: Vec<(&String, f64)> = self
            .elements
            .iter()
            .zip(self.obs_frequencies.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut out = format!("{} elements", self.len());
        for (element, frequency) in ranked.into_iter().take(top_n) {
            let _ = write!(out, "\n  {:.1}% {element}", frequency * 100.0);
        }
        out
    }
}

impl TryFrom<RawVocabulary> for Vocabulary {
    type Error = ConfigError;

    fn try_from(raw: RawVocabulary) -> Result<Self> {
        Self::new(raw.vocabulary, raw.obs_frequencies)
    }
}

impl From<Vocabulary> for RawVocabulary {
    fn from(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary: vocabulary.elements,
            obs_frequencies: vocabulary.obs_frequencies,
        }
    }
}

/// Layout of the unified vocabulary learned during preprocessing.
///
/// Measurements with a size-1 vocabulary (e.g. univariate regression) have an
/// offset but no size entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    pub vocab_sizes_by_measurement: BTreeMap<String, usize>,
    pub vocab_offsets_by_measurement: BTreeMap<String, usize>,
    pub measurements_idxmap: BTreeMap<String, BTreeMap<String, usize>>,
    pub measurements_per_generative_mode: BTreeMap<DataModality, Vec<String>>,
    pub event_types_idxmap: BTreeMap<String, usize>,
}

impl VocabularyConfig {
    /// Total size of the unified vocabulary.
    ///
    /// Sum of the listed sizes, plus the smallest offset (the reserved leading
    /// region), plus one for every measurement that has an offset but no size.
    pub fn total_vocab_size(&self) -> usize {
        let listed: usize = self.vocab_sizes_by_measurement.values().sum();
        let leading = self
            .vocab_offsets_by_measurement
            .values()
            .min()
            .copied()
            .unwrap_or(0);
        let implicit = self
            .vocab_offsets_by_measurement
            .keys()
            .filter(|name| !self.vocab_sizes_by_measurement.contains_key(*name))
            .count();
        listed + leading + implicit
    }
}

impl PlainConfig for VocabularyConfig {
    fn to_plain(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn from_plain(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_lengths_must_agree() {
        let err = Vocabulary::new(vec!["UNK".to_string()], vec![]).unwrap_err();
        assert_eq!(err.kind(), evs_model::ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_describe_ranks_by_frequency() {
        let vocab = Vocabulary::new(
            vec!["UNK".to_string(), "A".to_string(), "B".to_string()],
            vec![0.0, 0.25, 0.75],
        )
        .unwrap();
        assert_eq!(vocab.describe(2), "3 elements\n  75.0% B\n  25.0% A");
    }

    #[test]
    fn test_empty_config_has_zero_size() {
        assert_eq!(VocabularyConfig::default().total_vocab_size(), 0);
    }
}
