/// Data loading modules for image classification training
pub mod batch;
pub mod csv_input;
pub mod decode;
pub mod labels;
pub mod manifest;

pub use batch::Batch;
pub use csv_input::CsvInput;
pub use decode::{decode_image, ColorMode};
pub use labels::{labels_to_dense, one_hot};
pub use manifest::{Manifest, Sample};

/// Source of training batches
///
/// Implementations hand out exactly `batch_size` samples per call and never
/// run dry: reaching the end of the data wraps around and starts a new epoch.
pub trait NetworkInput {
    /// Get the next batch of `batch_size` (images, labels)
    fn next_batch(&mut self, batch_size: usize) -> crate::Result<Batch>;

    /// Number of complete passes over the data so far
    fn epochs_completed(&self) -> usize;

    /// Total number of samples in one epoch
    fn sample_size(&self) -> usize;

    /// Rewind to the first sample of epoch zero
    fn reset(&mut self);

    /// Number of `batch_size` batches needed to cover one epoch
    fn batches_per_epoch(&self, batch_size: usize) -> usize {
        if batch_size == 0 {
            return 0;
        }
        self.sample_size().div_ceil(batch_size)
    }
}
