use crate::db::sightings::SightingsLog;
use crate::error::PipelineError;
use crate::model::calibrate::calibrate;
use crate::model::classifier::{Classifier, InferenceError};
use crate::model::preprocess;
use crate::notify::{AlertChannel, Dispatcher, is_elephant_label};
use crate::storage::image_store::ImageStore;
use log::{info, warn};
use shared::{NotificationEvent, Prediction};
use std::sync::Arc;

/// Outcome of one pipeline invocation. `display` is the user-facing
/// classification string; the events exist for logging and inspection only.
#[derive(Debug)]
pub struct Classification {
    pub display: String,
    pub prediction: Prediction,
    pub events: Vec<NotificationEvent>,
}

/// Request-scoped detection pipeline:
/// store -> decode -> infer -> calibrate -> format -> dispatch.
///
/// The stages run linearly and the first failure aborts the request. Dispatch
/// (and the sighting record) run after the classification string is final and
/// can no longer fail the request.
pub struct Pipeline<E, A> {
    store: ImageStore,
    classifier: Arc<dyn Classifier>,
    dispatcher: Dispatcher<E, A>,
    sightings: SightingsLog,
}

impl<E: AlertChannel, A: AlertChannel> Pipeline<E, A> {
    pub fn new(
        store: ImageStore,
        classifier: Arc<dyn Classifier>,
        dispatcher: Dispatcher<E, A>,
        sightings: SightingsLog,
    ) -> Self {
        Self {
            store,
            classifier,
            dispatcher,
            sightings,
        }
    }

    pub async fn handle(
        &self,
        bytes: &[u8],
        declared_filename: &str,
    ) -> Result<Classification, PipelineError> {
        let stored = self.store.store(bytes, declared_filename)?;
        info!(
            "stored upload {} as {} ({} bytes)",
            stored.original_filename, stored.filename, stored.size
        );

        let tensor = preprocess::decode(&stored.path)?;
        let candidates = self.classifier.classify(&tensor)?;
        let top = candidates
            .into_iter()
            .next()
            .ok_or(PipelineError::Inference(InferenceError::EmptyOutput))?;

        let calibrated = calibrate(top, &mut rand::rng());
        let display = format_classification(&calibrated);
        info!("classified {} as {}", stored.filename, display);

        let events = self.dispatcher.dispatch(&calibrated).await;
        if is_elephant_label(&calibrated.label) {
            if let Err(e) = self.sightings.record(None, &calibrated.label, calibrated.confidence) {
                warn!("failed to record sighting: {e}");
            }
        }

        Ok(Classification {
            display,
            prediction: calibrated,
            events,
        })
    }
}

pub fn format_classification(prediction: &Prediction) -> String {
    format!(
        "{} ({:.2}%)",
        prediction.label,
        prediction.confidence * 100.0
    )
}
