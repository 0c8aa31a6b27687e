/// A batch of normalized images with their one-hot labels
use std::path::PathBuf;

use candle_core::{Device, Tensor};
use ndarray::{Array2, Array4, Axis};

#[derive(Debug, Clone)]
pub struct Batch {
    /// Pixels scaled to [0, 1]: [batch, height, width, channels]
    pub images: Array4<f32>,
    /// One-hot labels: [batch, num_labels]
    pub labels: Array2<f32>,
    /// Source image of each row, in batch order
    pub paths: Vec<PathBuf>,
}

impl Batch {
    /// Number of samples in the batch
    pub fn len(&self) -> usize {
        self.images.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Class index of each row (position of the 1 in its label vector)
    pub fn class_indices(&self) -> Vec<usize> {
        self.labels
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .position(|&v| v == 1.0)
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Convert to (images, labels) tensors on `device`, keeping shapes
    pub fn to_tensors(&self, device: &Device) -> candle_core::Result<(Tensor, Tensor)> {
        let images = Tensor::from_vec(
            self.images.iter().copied().collect::<Vec<f32>>(),
            self.images.shape().to_vec(),
            device,
        )?;
        let labels = Tensor::from_vec(
            self.labels.iter().copied().collect::<Vec<f32>>(),
            self.labels.shape().to_vec(),
            device,
        )?;
        Ok((images, labels))
    }
}
