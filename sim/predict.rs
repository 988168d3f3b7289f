//! The request/response seam between encoded records and the model.

use crate::model::Regressor;
use crate::schema::FeatureSchema;
use ndarray::ArrayView1;
use thiserror::Error;

/// An encoded vector whose width does not match the model schema. The
/// request is rejected; the process keeps serving. Surfaced verbatim to
/// the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Encoded record has {actual} features, but the model schema expects {expected}.")]
pub struct ArityError {
    pub expected: usize,
    pub actual: usize,
}

/// Validates encoded input against the schema and produces a prediction.
///
/// Holds only read-only state (the schema and the fitted model), so one
/// service instance can serve any number of requests, concurrently or
/// not. The arity gate runs before the model is touched.
#[derive(Debug)]
pub struct PredictionService<M> {
    schema: FeatureSchema,
    model: M,
}

impl<M: Regressor> PredictionService<M> {
    pub fn new(schema: FeatureSchema, model: M) -> Self {
        PredictionService { schema, model }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Predicts the income for one encoded record, or rejects it without
    /// invoking the model when the arity does not match the schema.
    pub fn predict(&self, vector: ArrayView1<f64>) -> Result<f64, ArityError> {
        if vector.len() != self.schema.len() {
            return Err(ArityError {
                expected: self.schema.len(),
                actual: vector.len(),
            });
        }
        Ok(self.model.predict(vector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts invocations so the arity gate's "no model call on mismatch"
    /// contract is observable.
    struct ProbeModel {
        calls: AtomicUsize,
        output: f64,
    }

    impl ProbeModel {
        fn returning(output: f64) -> Self {
            ProbeModel {
                calls: AtomicUsize::new(0),
                output,
            }
        }
    }

    impl Regressor for ProbeModel {
        fn predict(&self, _features: ArrayView1<f64>) -> f64 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.output
        }
    }

    #[test]
    fn matching_arity_delegates_to_the_model() {
        let schema = FeatureSchema::declared();
        let width = schema.len();
        let service = PredictionService::new(schema, ProbeModel::returning(2500.0));

        let vector = Array1::from_elem(width, 0.0);
        assert_eq!(service.predict(vector.view()).unwrap(), 2500.0);
        assert_eq!(service.model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn short_vector_is_rejected_before_the_model_runs() {
        let schema = FeatureSchema::declared();
        let width = schema.len();
        let service = PredictionService::new(schema, ProbeModel::returning(0.0));

        let vector = Array1::from_elem(width - 1, 0.0);
        let err = service.predict(vector.view()).unwrap_err();
        assert_eq!(
            err,
            ArityError {
                expected: width,
                actual: width - 1,
            }
        );
        assert_eq!(service.model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn arity_error_message_names_both_widths() {
        let message = ArityError {
            expected: 29,
            actual: 28,
        }
        .to_string();
        assert!(message.contains("28"));
        assert!(message.contains("29"));
    }

    #[test]
    fn service_is_reusable_across_requests() {
        let schema = FeatureSchema::declared();
        let width = schema.len();
        let service = PredictionService::new(schema, ProbeModel::returning(1000.0));

        let good = Array1::from_elem(width, 1.0);
        let bad = Array1::from_elem(width + 3, 1.0);
        assert!(service.predict(good.view()).is_ok());
        assert!(service.predict(bad.view()).is_err());
        assert!(service.predict(good.view()).is_ok());
        assert_eq!(service.model.calls.load(Ordering::SeqCst), 2);
    }
}
