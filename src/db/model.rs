use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the `feedbacks` table. The wire shape is the raw table schema;
/// no projection happens between the store and the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub prediction: String,
    pub decision: String,
    pub comment: String,
    pub image_filename: String,
    pub created_at: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn new(prediction: String, decision: String, comment: String) -> Self {
        let id = Uuid::new_v4();
        Self {
            prediction,
            decision,
            comment,
            image_filename: format!("{id}.jpg"),
            created_at: Utc::now(),
            id,
        }
    }
}
