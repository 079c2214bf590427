mod extractor;
mod forest;
mod labels;

use std::path::Path;
use std::sync::Arc;

pub use extractor::FeatureExtractor;
pub use forest::RandomForest;
pub use labels::LabelEncoder;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("model error: {0}")]
    Model(#[from] tch::TchError),
    #[error("embedding has {actual} features, classifier expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("classifier produced unknown class index {0}")]
    UnknownClass(usize),
    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed model file: {0}")]
    Malformed(String),
}

/// What the HTTP layer needs from the inference stage: bytes in, label out.
/// Handlers depend on this seam, so tests can stand in for the real pipeline
/// without TorchScript weights on disk.
pub trait Classifier: Send + Sync {
    fn predict(&self, image_bytes: &[u8]) -> Result<String, InferenceError>;
}

/// The full inference pipeline: deep embedding from the backbone, class index
/// from the forest, human-readable label from the encoder. Loaded once at
/// startup and shared across requests; cloning is cheap (Arc handles).
#[derive(Clone)]
pub struct Predictor {
    extractor: FeatureExtractor,
    forest: Arc<RandomForest>,
    labels: Arc<LabelEncoder>,
}

impl Predictor {
    pub fn load(model_dir: &Path) -> Result<Self, InferenceError> {
        let extractor = FeatureExtractor::load(&model_dir.join("feature_extractor.pt"))?;
        let forest = RandomForest::load(&model_dir.join("random_forest.json"))?;
        let labels = LabelEncoder::load(&model_dir.join("label_encoder.json"))?;
        if forest.n_classes() != labels.len() {
            return Err(InferenceError::Malformed(format!(
                "classifier has {} classes but label encoder has {}",
                forest.n_classes(),
                labels.len()
            )));
        }
        Ok(Self {
            extractor,
            forest: Arc::new(forest),
            labels: Arc::new(labels),
        })
    }

    /// Runs on an in-memory copy of the upload; nothing touches the
    /// filesystem, so concurrent requests cannot observe each other.
    pub fn predict(&self, image_bytes: &[u8]) -> Result<String, InferenceError> {
        let embedding = self.extractor.extract(image_bytes)?;
        let class = self.forest.predict(&embedding)?;
        Ok(self.labels.decode(class)?.to_string())
    }
}

impl Classifier for Predictor {
    fn predict(&self, image_bytes: &[u8]) -> Result<String, InferenceError> {
        Predictor::predict(self, image_bytes)
    }
}
