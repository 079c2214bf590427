use std::path::Path;
use std::sync::{Arc, Mutex};

use image::RgbImage;
use image::imageops::FilterType;
use tch::{CModule, Device, Kind, Tensor};

use super::InferenceError;

const INPUT_SIZE: u32 = 224;
// Standard ImageNet normalization used by the backbone.
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Pretrained image backbone exported as TorchScript, classification head
/// removed, global-average pooled. Produces a fixed-length embedding.
#[derive(Clone)]
pub struct FeatureExtractor {
    module: Arc<Mutex<CModule>>,
}

impl FeatureExtractor {
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let device = Device::cuda_if_available();
        let module = CModule::load_on_device(path, device)?;
        Ok(Self {
            module: Arc::new(Mutex::new(module)),
        })
    }

    pub fn extract(&self, image_bytes: &[u8]) -> Result<Vec<f32>, InferenceError> {
        let image = decode_rgb(image_bytes)?;
        let input = to_input_tensor(&image);
        let output = self.module.lock().unwrap().forward_ts(&[input])?;

        let flat = output.to_kind(Kind::Float).view([-1]);
        let len = flat.size()[0] as usize;
        let mut embedding = vec![0f32; len];
        flat.copy_data(&mut embedding, len);
        Ok(embedding)
    }
}

/// Decodes the uploaded bytes and resizes to the fixed backbone input raster.
pub(crate) fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, InferenceError> {
    let image = image::load_from_memory(bytes)?;
    Ok(image
        .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle)
        .to_rgb8())
}

fn to_input_tensor(image: &RgbImage) -> Tensor {
    let (width, height) = image.dimensions();
    let plane = (width * height) as usize;
    let mut data = vec![0f32; 3 * plane];
    for (x, y, pixel) in image.enumerate_pixels() {
        let idx = (y * width + x) as usize;
        for c in 0..3 {
            data[c * plane + idx] = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
        }
    }
    Tensor::from_slice(&data).view([1, 3, height as i64, width as i64])
}
