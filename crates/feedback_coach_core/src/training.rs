//! crates/feedback_coach_core/src/training.rs
//!
//! Collection of anonymized correction/feedback triples for model training.

use std::sync::Arc;

use tracing::info;

use crate::domain::{NewTrainingSample, TrainingSample};
use crate::ports::{PortError, PortResult, TrainingCorpusStore};

pub struct TrainingCorpusService {
    store: Arc<dyn TrainingCorpusStore>,
}

impl TrainingCorpusService {
    pub fn new(store: Arc<dyn TrainingCorpusStore>) -> Self {
        Self { store }
    }

    /// Trims the three fields, rejects the first empty one, and appends the rest.
    ///
    /// Nothing about the submitter is stored.
    pub async fn submit(
        &self,
        original_text: &str,
        teacher_correction: &str,
        cbc_feedback: &str,
    ) -> PortResult<TrainingSample> {
        let sample = NewTrainingSample {
            original_text: required(original_text, "Original text is required")?,
            teacher_correction: required(teacher_correction, "Teacher correction is required")?,
            cbc_feedback: required(cbc_feedback, "CBC feedback is required")?,
        };

        let stored = self.store.append(&sample).await?;
        info!(
            training_data_id = %stored.id,
            original_len = sample.original_text.len(),
            correction_len = sample.teacher_correction.len(),
            feedback_len = sample.cbc_feedback.len(),
            "Training sample stored"
        );
        Ok(stored)
    }
}

fn required(value: &str, message: &str) -> PortResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PortError::InvalidInput(message.to_string()));
    }
    Ok(trimmed.to_string())
}
