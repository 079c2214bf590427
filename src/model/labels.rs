use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::InferenceError;

/// Maps classifier output indices to the human-readable severity labels the
/// encoder was fitted with.
#[derive(Debug, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let raw = fs::read_to_string(path)?;
        let encoder: LabelEncoder = serde_json::from_str(&raw)
            .map_err(|e| InferenceError::Malformed(e.to_string()))?;
        if encoder.classes.is_empty() {
            return Err(InferenceError::Malformed(
                "label encoder has no classes".to_string(),
            ));
        }
        Ok(encoder)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn decode(&self, index: usize) -> Result<&str, InferenceError> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(InferenceError::UnknownClass(index))
    }
}
