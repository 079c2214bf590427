use reqwest::Client as HttpClient;
use reqwest::StatusCode;

use crate::db::model::FeedbackRecord;

const TABLE: &str = "feedbacks";

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("table store returned {status}: {body}")]
    Upstream { status: StatusCode, body: String },
    #[error("failed to decode records: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Repository over the hosted table store's REST layer. Inserts are
/// fire-and-forget (`return=minimal`); listing asks the server to order by
/// creation time so the client never has to.
#[derive(Clone)]
pub struct FeedbackRepository {
    http_client: HttpClient,
    base_url: String,
    service_key: String,
}

impl FeedbackRepository {
    pub fn new(http_client: HttpClient, base_url: String, service_key: String) -> Self {
        Self {
            http_client,
            base_url,
            service_key,
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, TABLE)
    }

    pub async fn insert(&self, record: &FeedbackRecord) -> Result<(), RepositoryError> {
        let response = self
            .http_client
            .post(self.table_url())
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RepositoryError::Upstream { status, body });
        }
        Ok(())
    }

    /// Full table scan, newest first.
    pub async fn list_all(&self) -> Result<Vec<FeedbackRecord>, RepositoryError> {
        let response = self
            .http_client
            .get(self.table_url())
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RepositoryError::Upstream { status, body });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;

    #[test]
    fn records_round_trip_the_table_schema() {
        let raw = r#"[{
            "id": "6fa459ea-ee8a-3ca4-894e-db77e160355e",
            "prediction": "Moderate",
            "decision": "disagree",
            "comment": "left eye, looks mild to me",
            "image_filename": "6fa459ea-ee8a-3ca4-894e-db77e160355e.jpg",
            "created_at": "2025-11-03T09:30:00+00:00"
        }]"#;
        let records: Vec<FeedbackRecord> = serde_json::from_str(raw).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].prediction, "Moderate");
        assert_eq!(
            records[0].created_at,
            Utc.with_ymd_and_hms(2025, 11, 3, 9, 30, 0).unwrap()
        );
    }
}
