//! Registry of functors for functionally time-dependent measurements.
//!
//! A functor is stored in plain form as a map carrying its class tag under
//! `"class"` plus its own parameters, e.g.
//! `{"class": "AgeFunctor", "dob_col": "dob"}`.

use serde_json::{Map, Value};

use evs_model::{ConfigError, DataModality, Result, describe_value};

/// Closed set of functor kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctorKind {
    Age,
    TimeOfDay,
}

/// Every registered kind; lookups by class tag search this table.
const REGISTRY: [FunctorKind; 2] = [FunctorKind::Age, FunctorKind::TimeOfDay];

impl FunctorKind {
    pub fn all() -> impl Iterator<Item = FunctorKind> {
        REGISTRY.into_iter()
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            FunctorKind::Age => "AgeFunctor",
            FunctorKind::TimeOfDay => "TimeOfDayFunctor",
        }
    }

    pub fn output_modality(&self) -> DataModality {
        match self {
            FunctorKind::Age => DataModality::UnivariateRegression,
            FunctorKind::TimeOfDay => DataModality::SingleLabelClassification,
        }
    }

    pub fn from_class_name(class: &str) -> Result<Self> {
        FunctorKind::all()
            .find(|kind| kind.class_name() == class)
            .ok_or_else(|| ConfigError::UnknownFunctor(class.to_string()))
    }
}

/// Function of time used to compute a measurement's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeDependentFunctor {
    /// Age at the event time, from the date of birth in `dob_col`.
    Age { dob_col: String },
    /// Bucketed time of day of the event.
    TimeOfDay,
}

impl TimeDependentFunctor {
    pub fn age(dob_col: impl Into<String>) -> Self {
        TimeDependentFunctor::Age {
            dob_col: dob_col.into(),
        }
    }

    pub fn kind(&self) -> FunctorKind {
        match self {
            TimeDependentFunctor::Age { .. } => FunctorKind::Age,
            TimeDependentFunctor::TimeOfDay => FunctorKind::TimeOfDay,
        }
    }

    pub fn output_modality(&self) -> DataModality {
        self.kind().output_modality()
    }

    pub fn to_plain(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            "class".to_string(),
            Value::String(self.kind().class_name().to_string()),
        );
        if let TimeDependentFunctor::Age { dob_col } = self {
            map.insert("dob_col".to_string(), Value::String(dob_col.clone()));
        }
        Value::Object(map)
    }

    pub fn from_plain(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(ConfigError::type_mismatch(
                "functor",
                format!("expected a map with a `class` key; got {}", describe_value(value)),
            ));
        };
        let class = map
            .get("class")
            .and_then(Value::as_str)
            .ok_or_else(|| ConfigError::missing("class", "functor"))?;
        match FunctorKind::from_class_name(class)? {
            FunctorKind::Age => {
                let dob_col = map
                    .get("dob_col")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ConfigError::missing("dob_col", "AgeFunctor"))?;
                Ok(TimeDependentFunctor::age(dob_col))
            }
            FunctorKind::TimeOfDay => Ok(TimeDependentFunctor::TimeOfDay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evs_model::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_registry_is_consistent() {
        for kind in FunctorKind::all() {
            assert_eq!(FunctorKind::from_class_name(kind.class_name()).unwrap(), kind);
        }
    }

    #[test]
    fn test_plain_round_trip() {
        let functor = TimeDependentFunctor::age("dob");
        let plain = functor.to_plain();
        assert_eq!(plain, json!({"class": "AgeFunctor", "dob_col": "dob"}));
        assert_eq!(TimeDependentFunctor::from_plain(&plain).unwrap(), functor);
        assert_eq!(
            TimeDependentFunctor::from_plain(&json!({"class": "TimeOfDayFunctor"})).unwrap(),
            TimeDependentFunctor::TimeOfDay
        );
    }

    #[test]
    fn test_unknown_class_is_rejected() {
        let err = TimeDependentFunctor::from_plain(&json!({"class": "BmiFunctor"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownTag);
        assert!(err.to_string().contains("BmiFunctor"));
    }
}
