#![allow(missing_docs)]

use evs_config::{
    MeasurementConfig, MeasurementMetadata, MetadataValue, TimeDependentFunctor, Vocabulary,
};
use evs_model::{ConfigError, DataModality, ErrorKind, PlainConfig, TemporalityType};
use serde_json::{Value, json};

fn lab_table() -> MetadataValue {
    MetadataValue::table_from_plain(&json!({
        "columns": ["lab", "value_type", "outlier_model", "normalizer"],
        "dtypes": ["str", "str", "json", "json"],
        "data": [
            ["hr", "float", "none", "standard"],
            ["sbp", "integer", "none", "standard"],
            ["dbp", "integer", "none", "standard"]
        ]
    }))
    .unwrap()
}

fn lab_measurement() -> MeasurementConfig {
    MeasurementConfig::builder(TemporalityType::Dynamic)
        .with_name("lab")
        .with_modality(DataModality::MultivariateRegression)
        .with_values_column("lab_value")
        .with_metadata(lab_table())
        .build()
        .unwrap()
}

#[test]
fn test_temporality_rules() {
    let err = MeasurementConfig::builder(TemporalityType::Static)
        .with_modality(DataModality::UnivariateRegression)
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Incompatible);

    let err = MeasurementConfig::builder(TemporalityType::Dynamic)
        .with_modality(DataModality::SingleLabelClassification)
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Incompatible);

    let err = MeasurementConfig::builder(TemporalityType::Dynamic)
        .with_modality(DataModality::MultiLabelClassification)
        .with_functor(TimeDependentFunctor::TimeOfDay)
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ForbiddenField);

    let err = MeasurementConfig::builder(TemporalityType::FunctionalTimeDependent)
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingField);

    let err = MeasurementConfig::builder(TemporalityType::FunctionalTimeDependent)
        .with_functor(TimeDependentFunctor::age("dob"))
        .with_modality(DataModality::MultiLabelClassification)
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Incompatible);

    let err = MeasurementConfig::builder(TemporalityType::Dynamic)
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingField);
}

#[test]
fn test_functional_modality_defaults_to_functor_output() {
    let age = MeasurementConfig::builder(TemporalityType::FunctionalTimeDependent)
        .with_functor(TimeDependentFunctor::age("dob"))
        .build()
        .unwrap();
    assert_eq!(age.modality(), DataModality::UnivariateRegression);

    let time_of_day = MeasurementConfig::builder(TemporalityType::FunctionalTimeDependent)
        .with_functor(TimeDependentFunctor::TimeOfDay)
        .build()
        .unwrap();
    assert_eq!(time_of_day.modality(), DataModality::SingleLabelClassification);

    let dropped = MeasurementConfig::builder(TemporalityType::FunctionalTimeDependent)
        .with_functor(TimeDependentFunctor::age("dob"))
        .with_modality(DataModality::Dropped)
        .build()
        .unwrap();
    assert!(dropped.is_dropped());
}

#[test]
fn test_field_violations_accumulate() {
    let err = MeasurementConfig::builder(TemporalityType::Dynamic)
        .with_modality(DataModality::MultiLabelClassification)
        .with_values_column("value")
        .with_metadata(MetadataValue::empty_series())
        .with_observation_frequency(1.5)
        .build()
        .unwrap_err();
    let ConfigError::Multiple(errors) = &err else {
        panic!("expected accumulated errors, got {err}");
    };
    assert_eq!(errors.len(), 3);
    let message = err.to_string();
    assert!(message.contains("observation_frequency"));
    assert!(message.contains("values_column"));
    assert!(message.contains("measurement_metadata"));
}

#[test]
fn test_multivariate_requires_values_column_and_table() {
    let err = MeasurementConfig::builder(TemporalityType::Dynamic)
        .with_modality(DataModality::MultivariateRegression)
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingField);

    let err = MeasurementConfig::builder(TemporalityType::Dynamic)
        .with_modality(DataModality::MultivariateRegression)
        .with_values_column("lab_value")
        .with_metadata(MetadataValue::empty_series())
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);

    let err = MeasurementConfig::builder(TemporalityType::Dynamic)
        .with_modality(DataModality::UnivariateRegression)
        .with_metadata(lab_table())
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn test_duplicate_metadata_keys_are_rejected() {
    let table = MetadataValue::table_from_plain(&json!({
        "columns": ["lab", "value_type", "outlier_model", "normalizer"],
        "dtypes": ["str", "str", "str", "str"],
        "data": [["hr", "float", null, null], ["hr", "float", null, null]]
    }))
    .unwrap();
    let err = MeasurementConfig::builder(TemporalityType::Dynamic)
        .with_modality(DataModality::MultivariateRegression)
        .with_values_column("lab_value")
        .with_metadata(table)
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("repeated keys"));
}

#[test]
fn test_mark_dropped_is_idempotent() {
    let mut config = MeasurementConfig::builder(TemporalityType::Dynamic)
        .with_name("dx")
        .with_modality(DataModality::MultiLabelClassification)
        .with_vocabulary(Vocabulary::new(vec!["UNK".into(), "flu".into()], vec![0.0, 1.0]).unwrap())
        .build()
        .unwrap();

    config.mark_dropped();
    let once = config.clone();
    config.mark_dropped();

    assert_eq!(config, once);
    assert!(config.is_dropped());
    assert!(config.vocabulary().is_none());
    assert!(config.validate().is_ok());
    assert!(
        config
            .set_vocabulary(Some(Vocabulary::new(vec!["UNK".into()], vec![1.0]).unwrap()))
            .is_err()
    );
}

#[test]
fn test_cache_and_uncache_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metadata").join("lab.csv");
    let mut config = lab_measurement();

    config.cache_measurement_metadata(&path).unwrap();
    assert!(path.exists());
    assert_eq!(config.metadata_state(), &MeasurementMetadata::CachedAt(path.clone()));
    assert_eq!(config.measurement_metadata().unwrap(), Some(lab_table()));

    // Same path again is a no-op.
    config.cache_measurement_metadata(&path).unwrap();

    let err = config
        .cache_measurement_metadata(&dir.path().join("other.csv"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);

    config.uncache_measurement_metadata().unwrap();
    assert_eq!(config.metadata_state(), &MeasurementMetadata::InMemory(lab_table()));

    let err = config.uncache_measurement_metadata().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
}

#[test]
fn test_cached_table_keeps_fitted_models() {
    let table = MetadataValue::table_from_plain(&json!({
        "columns": ["lab", "value_type", "outlier_model", "normalizer", "n_obs"],
        "dtypes": ["str", "str", "json", "json", "u32"],
        "data": [
            ["hr", "float", {"thresh_large": 4.5, "thresh_small": 1.0}, {"mean": 80.0, "std": 12.5}, 120],
            ["sbp", "integer", null, {"mean": 121.0, "std": 15.0}, 96]
        ]
    }))
    .unwrap();
    let mut config = MeasurementConfig::builder(TemporalityType::Dynamic)
        .with_name("lab")
        .with_modality(DataModality::MultivariateRegression)
        .with_values_column("lab_value")
        .with_metadata(table.clone())
        .build()
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    config.cache_measurement_metadata(&dir.path().join("lab.csv")).unwrap();
    let restored = config.measurement_metadata().unwrap().unwrap();
    assert_eq!(restored, table);
    let plain = restored.to_plain().unwrap();
    assert_eq!(plain["data"][0][3], json!({"mean": 80.0, "std": 12.5}));
    assert_eq!(plain["dtypes"][4], json!("u32"));
}

#[test]
fn test_writes_go_through_to_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("age.csv");
    let mut config = MeasurementConfig::builder(TemporalityType::FunctionalTimeDependent)
        .with_name("age")
        .with_functor(TimeDependentFunctor::age("dob"))
        .with_metadata(MetadataValue::empty_series())
        .build()
        .unwrap();
    config.cache_measurement_metadata(&path).unwrap();

    let mut series = serde_json::Map::new();
    series.insert("value_type".into(), json!("float"));
    series.insert("outlier_model".into(), json!({"thresh_large": 4.5}));
    series.insert("normalizer".into(), Value::Null);
    config
        .set_measurement_metadata(Some(MetadataValue::Series(series.clone())))
        .unwrap();

    assert!(matches!(config.metadata_state(), MeasurementMetadata::CachedAt(_)));
    assert_eq!(
        config.measurement_metadata().unwrap(),
        Some(MetadataValue::Series(series))
    );
}

#[test]
fn test_caching_absent_metadata_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = MeasurementConfig::builder(TemporalityType::Dynamic)
        .with_modality(DataModality::UnivariateRegression)
        .build()
        .unwrap();
    config
        .cache_measurement_metadata(&dir.path().join("hr.csv"))
        .unwrap();
    assert!(config.metadata_state().is_absent());
    config.uncache_measurement_metadata().unwrap();
}

#[test]
fn test_add_empty_and_missing_metadata() {
    let mut univariate = MeasurementConfig::builder(TemporalityType::Dynamic)
        .with_modality(DataModality::UnivariateRegression)
        .build()
        .unwrap();
    univariate.add_missing_mandatory_metadata_cols().unwrap();
    assert_eq!(
        univariate.measurement_metadata().unwrap(),
        Some(MetadataValue::empty_series())
    );
    assert_eq!(univariate.add_empty_metadata().unwrap_err().kind(), ErrorKind::Incompatible);

    let mut multivariate = MeasurementConfig::builder(TemporalityType::Dynamic)
        .with_name("lab")
        .with_modality(DataModality::MultivariateRegression)
        .with_values_column("lab_value")
        .build()
        .unwrap();
    multivariate.add_empty_metadata().unwrap();
    let Some(MetadataValue::Table(df)) = multivariate.measurement_metadata().unwrap() else {
        panic!("expected a table");
    };
    let names: Vec<&str> = df.get_column_names().into_iter().map(|name| name.as_str()).collect();
    assert_eq!(names, ["lab", "value_type", "outlier_model", "normalizer"]);

    let mut classification = MeasurementConfig::builder(TemporalityType::Static)
        .with_modality(DataModality::SingleLabelClassification)
        .build()
        .unwrap();
    assert!(classification.add_missing_mandatory_metadata_cols().is_err());
}

#[test]
fn test_functor_plain_round_trip() {
    let config = MeasurementConfig::builder(TemporalityType::FunctionalTimeDependent)
        .with_name("age")
        .with_functor(TimeDependentFunctor::age("dob"))
        .with_observation_frequency(1.0)
        .build()
        .unwrap();
    let plain = config.to_plain().unwrap();
    assert_eq!(plain["functor"], json!({"class": "AgeFunctor", "dob_col": "dob"}));
    assert_eq!(MeasurementConfig::from_plain(plain).unwrap(), config);
}

#[test]
fn test_table_metadata_plain_round_trip() {
    let config = lab_measurement();
    let plain = config.to_plain().unwrap();
    insta::assert_json_snapshot!(plain["measurement_metadata"], @r#"
    {
      "columns": [
        "lab",
        "value_type",
        "outlier_model",
        "normalizer"
      ],
      "dtypes": [
        "str",
        "str",
        "json",
        "json"
      ],
      "data": [
        [
          "hr",
          "float",
          "none",
          "standard"
        ],
        [
          "sbp",
          "integer",
          "none",
          "standard"
        ],
        [
          "dbp",
          "integer",
          "none",
          "standard"
        ]
      ]
    }
    "#);
    assert_eq!(MeasurementConfig::from_plain(plain).unwrap(), config);
}

#[test]
fn test_unknown_functor_tag_is_rejected() {
    let err = MeasurementConfig::from_plain(json!({
        "temporality": "functional_time_dependent",
        "functor": {"class": "BmiFunctor"}
    }))
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownTag);
}

#[test]
fn test_metadata_forbidden_on_classification() {
    let err = MeasurementConfig::from_plain(json!({
        "temporality": "dynamic",
        "modality": "multi_label_classification",
        "measurement_metadata": {"value_type": "float"}
    }))
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ForbiddenField);
}

#[test]
fn test_describe() {
    let mut config = MeasurementConfig::builder(TemporalityType::Dynamic)
        .with_name("dx")
        .with_modality(DataModality::MultiLabelClassification)
        .with_vocabulary(
            Vocabulary::new(
                vec!["UNK".into(), "flu".into(), "cold".into()],
                vec![0.0, 0.25, 0.75],
            )
            .unwrap(),
        )
        .build()
        .unwrap();
    config.set_observation_frequency(0.5).unwrap();
    insta::assert_snapshot!(config.describe().unwrap(), @r"
    dx: dynamic, multi_label_classification observed 50.0%
    Vocabulary:
      3 elements
        75.0% cold
        25.0% flu
        0.0% UNK
    ");

    insta::assert_snapshot!(lab_measurement().describe().unwrap(), @r"
    lab: dynamic, multivariate_regression observed n/a
    Value Types:
      1 float
      2 integer
    ");
}
