use reqwest::Client as HttpClient;
use reqwest::StatusCode;

const BUCKET: &str = "feedback-images";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("storage service returned {status}: {body}")]
    Upstream { status: StatusCode, body: String },
}

/// Thin client for the hosted object store. Uploads go through the storage
/// REST API with the service-role key; reads go through the public object
/// URL, which the service constructs but never verifies.
#[derive(Clone)]
pub struct StorageService {
    http_client: HttpClient,
    base_url: String,
    service_key: String,
}

impl StorageService {
    pub fn new(http_client: HttpClient, base_url: String, service_key: String) -> Self {
        Self {
            http_client,
            base_url,
            service_key,
        }
    }

    pub async fn upload_image(&self, filename: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            BUCKET,
            urlencoding::encode(filename)
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("content-type", "image/jpeg")
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Upstream { status, body });
        }
        Ok(())
    }

    /// Public retrieval URL for an object; existence is not checked.
    pub fn public_url(&self, filename: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            BUCKET,
            urlencoding::encode(filename)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> StorageService {
        StorageService::new(
            HttpClient::new(),
            "https://abc.supabase.co".to_string(),
            "secret".to_string(),
        )
    }

    #[test]
    fn public_url_contains_name_verbatim() {
        let url = service().public_url("deadbeef.jpg");
        assert_eq!(
            url,
            "https://abc.supabase.co/storage/v1/object/public/feedback-images/deadbeef.jpg"
        );
        assert!(url.contains("deadbeef.jpg"));
    }

    #[test]
    fn public_url_escapes_unsafe_names() {
        let url = service().public_url("a b/c.jpg");
        assert!(!url.contains(' '));
        assert!(url.ends_with("feedback-images/a%20b%2Fc.jpg"));
    }
}
