#![allow(missing_docs)]

use evs_config::{
    CountOrProportion, DatasetConfig, DatasetOptions, DynamicColumn, MeasurementConfig,
    SimpleColumns, StrategyConfig, TimeDependentFunctor,
};
use evs_model::{ConfigError, DataModality, ErrorKind, PlainConfig, TemporalityType};
use serde_json::json;

fn diagnosis() -> MeasurementConfig {
    MeasurementConfig::builder(TemporalityType::Dynamic)
        .with_modality(DataModality::MultiLabelClassification)
        .build()
        .unwrap()
}

#[test]
fn test_names_are_filled_from_keys() {
    let config = DatasetConfig::new(
        [("dx".to_string(), diagnosis())],
        DatasetOptions::default(),
    )
    .unwrap();
    assert_eq!(config.measurement_config("dx").unwrap().name(), Some("dx"));
}

#[test]
fn test_name_mismatch_is_rejected() {
    let named = MeasurementConfig::builder(TemporalityType::Dynamic)
        .with_name("procedure")
        .with_modality(DataModality::MultiLabelClassification)
        .build()
        .unwrap();
    let err = DatasetConfig::new([("dx".to_string(), named)], DatasetOptions::default())
        .unwrap_err();
    assert!(matches!(err, ConfigError::NameMismatch { ref key, ref name } if key == "dx" && name == "procedure"));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn test_threshold_errors_name_value_and_type() {
    let err = DatasetConfig::from_plain(json!({"min_valid_column_observations": "ten"}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    insta::assert_snapshot!(err.to_string(), @r#"invalid min_valid_column_observations: must either be a fraction (float between 0 and 1) or count (int > 1); got string of "ten""#);

    for bad in [json!(1), json!(1.5), json!(0.0)] {
        let err = DatasetConfig::from_plain(json!({"min_valid_vocab_element_observations": bad}))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch, "{bad}");
    }

    let err = DatasetConfig::from_plain(json!({"min_true_float_frequency": 5})).unwrap_err();
    assert!(err.to_string().contains("min_true_float_frequency"));
}

#[test]
fn test_typed_options_are_checked() {
    let options = DatasetOptions {
        min_unique_numerical_observations: Some(CountOrProportion::Count(1)),
        ..DatasetOptions::default()
    };
    let err = DatasetConfig::new(Vec::new(), options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);

    let options = DatasetOptions {
        min_true_float_frequency: Some(1.0),
        ..DatasetOptions::default()
    };
    assert!(DatasetConfig::new(Vec::new(), options).is_err());
}

#[test]
fn test_strategy_configs_must_name_a_class() {
    let err = DatasetConfig::from_plain(json!({"outlier_detector_config": {"stddev_cutoff": 1.5}}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingField);

    let err = DatasetConfig::from_plain(json!({"normalizer_config": ["standard_scaler"]}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);

    let config = DatasetConfig::from_plain(json!({
        "outlier_detector_config": {"cls": "stddev_cutoff", "stddev_cutoff": 1.5}
    }))
    .unwrap();
    assert_eq!(
        config.options().outlier_detector_config,
        Some(StrategyConfig::new("stddev_cutoff").with_param("stddev_cutoff", 1.5))
    );
}

#[test]
fn test_measurement_errors_carry_their_key() {
    let err = DatasetConfig::from_plain(json!({
        "measurement_configs": {
            "dx": {"temporality": "dynamic", "modality": "single_label_classification"}
        }
    }))
    .unwrap_err();
    let ConfigError::InvalidMeasurement { key, source } = &err else {
        panic!("expected a wrapped measurement error, got {err}");
    };
    assert_eq!(key, "dx");
    assert_eq!(source.kind(), ErrorKind::Incompatible);
    assert_eq!(err.kind(), ErrorKind::Incompatible);

    let err = DatasetConfig::from_plain(json!({
        "measurement_configs": {"age": {"temporality": "sometimes"}}
    }))
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidMeasurement { ref key, .. } if key == "age"));
}

#[test]
fn test_defaults() {
    let config = DatasetConfig::from_plain(json!({})).unwrap();
    assert_eq!(config.options(), &DatasetOptions::default());
    assert_eq!(config.options().agg_by_time_scale.as_deref(), Some("1h"));

    let config = DatasetConfig::from_plain(json!({"agg_by_time_scale": null})).unwrap();
    assert_eq!(config.options().agg_by_time_scale, None);
}

#[test]
fn test_from_simple_columns() {
    let columns = SimpleColumns {
        dynamic: vec![
            DynamicColumn::MultiLabel("dx".to_string()),
            DynamicColumn::KeyValue {
                key: "lab".to_string(),
                values: "lab_value".to_string(),
            },
            DynamicColumn::Univariate("hr".to_string()),
        ],
        static_columns: vec!["sex".to_string()],
        time_dependent: vec![
            ("age".to_string(), TimeDependentFunctor::age("dob")),
            ("time_of_day".to_string(), TimeDependentFunctor::TimeOfDay),
        ],
    };
    let options = DatasetOptions {
        min_valid_column_observations: Some(CountOrProportion::Count(25)),
        ..DatasetOptions::default()
    };
    let config = DatasetConfig::from_simple_columns(columns, options).unwrap();

    let modalities: Vec<(&str, TemporalityType, DataModality)> = config
        .measurement_configs()
        .iter()
        .map(|(name, cfg)| (name.as_str(), cfg.temporality(), cfg.modality()))
        .collect();
    assert_eq!(
        modalities,
        [
            ("age", TemporalityType::FunctionalTimeDependent, DataModality::UnivariateRegression),
            ("dx", TemporalityType::Dynamic, DataModality::MultiLabelClassification),
            ("hr", TemporalityType::Dynamic, DataModality::UnivariateRegression),
            ("lab", TemporalityType::Dynamic, DataModality::MultivariateRegression),
            ("sex", TemporalityType::Static, DataModality::SingleLabelClassification),
            (
                "time_of_day",
                TemporalityType::FunctionalTimeDependent,
                DataModality::SingleLabelClassification
            ),
        ]
    );
    assert_eq!(
        config.measurement_config("lab").unwrap().values_column(),
        Some("lab_value")
    );
    assert_eq!(
        config.options().min_valid_column_observations,
        Some(CountOrProportion::Count(25))
    );
}

#[test]
fn test_simple_columns_keep_last_duplicate() {
    let columns = SimpleColumns {
        dynamic: vec![DynamicColumn::MultiLabel("sex".to_string())],
        static_columns: vec!["sex".to_string()],
        ..SimpleColumns::default()
    };
    let config = DatasetConfig::from_simple_columns(columns, DatasetOptions::default()).unwrap();
    assert_eq!(config.measurement_configs().len(), 1);
    assert_eq!(
        config.measurement_config("sex").unwrap().temporality(),
        TemporalityType::Static
    );
}

#[test]
fn test_plain_round_trip() {
    let plain = json!({
        "measurement_configs": {
            "age": {
                "temporality": "functional_time_dependent",
                "functor": {"class": "AgeFunctor", "dob_col": "dob"}
            },
            "lab": {
                "temporality": "dynamic",
                "modality": "multivariate_regression",
                "values_column": "lab_value",
                "observation_frequency": 0.8
            }
        },
        "min_events_per_subject": 5,
        "min_valid_column_observations": 0.1,
        "min_valid_vocab_element_observations": 25,
        "min_true_float_frequency": 0.95,
        "normalizer_config": {"cls": "standard_scaler"},
        "save_dir": "/tmp/dataset"
    });
    let config = DatasetConfig::from_plain(plain).unwrap();
    assert_eq!(
        config.options().min_valid_column_observations,
        Some(CountOrProportion::Proportion(0.1))
    );
    assert_eq!(config.active_measurements().collect::<Vec<_>>(), ["age", "lab"]);

    let reloaded = DatasetConfig::from_plain(config.to_plain().unwrap()).unwrap();
    assert_eq!(reloaded, config);
}

#[test]
fn test_dropping_through_the_dataset() {
    let mut config = DatasetConfig::new(
        [("dx".to_string(), diagnosis())],
        DatasetOptions::default(),
    )
    .unwrap();
    config.measurement_config_mut("dx").unwrap().mark_dropped();
    assert_eq!(config.active_measurements().count(), 0);
    assert!(config.validate().is_ok());
}

#[test]
fn test_json_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataset_config.json");
    let config = DatasetConfig::new(
        [("dx".to_string(), diagnosis())],
        DatasetOptions::default(),
    )
    .unwrap();

    config.to_json_file(&path, false).unwrap();
    assert!(config.to_json_file(&path, false).is_err());
    config.to_json_file(&path, true).unwrap();
    assert_eq!(DatasetConfig::from_file(&path).unwrap(), config);
}

#[test]
fn test_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataset_config.toml");
    std::fs::write(
        &path,
        r#"
min_valid_column_observations = 10

[measurement_configs.dx]
temporality = "dynamic"
modality = "multi_label_classification"
"#,
    )
    .unwrap();
    let config = DatasetConfig::from_file(&path).unwrap();
    assert_eq!(
        config.options().min_valid_column_observations,
        Some(CountOrProportion::Count(10))
    );
    assert_eq!(config.measurement_config("dx").unwrap().name(), Some("dx"));
}
