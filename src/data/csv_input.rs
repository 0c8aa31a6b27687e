/// Epoch-tracking batch iterator over a CSV image manifest
use ndarray::{Array2, Array4, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, SeedableRng};

use super::batch::Batch;
use super::decode::decode_image;
use super::labels::one_hot;
use super::manifest::Manifest;
use super::NetworkInput;
use crate::{InputConfig, InputError};

/// Sample positions chosen for one batch, plus the cursor state to commit
/// once every sample has decoded.
struct Selection {
    indices: Vec<usize>,
    batch_start: usize,
    epochs_completed: usize,
    /// Set when the shuffled view changed (wrapped or first built)
    view: Option<Option<Vec<usize>>>,
}

/// Batch iterator over a [`Manifest`]
///
/// Serves exactly `batch_size` samples per call. A batch that reaches the
/// end of the data takes the remaining tail, starts a new epoch and fills
/// up from the head, as many times as needed.
pub struct CsvInput {
    manifest: Manifest,
    config: InputConfig,
    batch_start: usize,
    epochs_completed: usize,
    /// Permutation for the current epoch; `None` until first needed
    shuffled: Option<Vec<usize>>,
}

impl CsvInput {
    /// Load the manifest named in `config` and create an iterator over it
    pub fn new(config: InputConfig) -> crate::Result<Self> {
        config.validate()?;

        let mut manifest = Manifest::from_path(&config.manifest_path, config.delimiter_byte())?;
        if let Some(root) = &config.image_root {
            manifest = manifest.with_image_root(root);
        }

        Self::with_manifest(manifest, config)
    }

    /// Create an iterator over an already loaded manifest.
    /// `config.manifest_path` and `config.image_root` are not consulted.
    pub fn with_manifest(manifest: Manifest, config: InputConfig) -> crate::Result<Self> {
        config.validate()?;

        if manifest.is_empty() {
            return Err(InputError::EmptyManifest(manifest.source().to_string()));
        }

        if let Some(max_label) = manifest.max_label() {
            if max_label >= config.num_labels {
                log::warn!(
                    "Manifest {} has label {} but num_labels={}; batches containing it will fail",
                    manifest.source(),
                    max_label,
                    config.num_labels
                );
            }
        }

        log::info!(
            "CSV input ready: {} samples, input_shape={:?}, num_labels={}, mode={}, shuffle={}",
            manifest.len(),
            config.input_shape,
            config.num_labels,
            config.mode,
            config.shuffle
        );

        Ok(Self {
            manifest,
            config,
            batch_start: 0,
            epochs_completed: 0,
            shuffled: None,
        })
    }

    /// Position of the next sample within the current epoch's order
    pub fn batch_start(&self) -> usize {
        self.batch_start
    }

    pub fn num_labels(&self) -> usize {
        self.config.num_labels
    }

    pub fn input_shape(&self) -> &[usize] {
        &self.config.input_shape
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    /// A fresh permutation of all samples for `epoch`
    fn permutation(&self, epoch: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.manifest.len()).collect();
        match self.config.seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(epoch as u64));
                indices.shuffle(&mut rng);
            }
            None => {
                let mut rng = thread_rng();
                indices.shuffle(&mut rng);
            }
        }
        log::debug!("Shuffled sample order for epoch {}", epoch);
        indices
    }

    /// Choose the manifest indices of the next `batch_size` samples without
    /// touching `self`.
    fn select(&self, batch_size: usize) -> Selection {
        let n = self.manifest.len();
        let mut indices = Vec::with_capacity(batch_size);
        let mut start = self.batch_start;
        let mut epochs = self.epochs_completed;

        // `stale` marks the stored view as belonging to a finished epoch
        let mut stale = false;
        let mut fresh: Option<Vec<usize>> = None;

        let mut remaining = batch_size;
        while remaining > 0 {
            let end = (start + remaining).min(n);

            if self.config.shuffle {
                if fresh.is_none() && (stale || self.shuffled.is_none()) {
                    fresh = Some(self.permutation(epochs));
                }
                let order = match (&fresh, &self.shuffled) {
                    (Some(view), _) | (None, Some(view)) => view,
                    (None, None) => unreachable!("shuffled view is built before use"),
                };
                indices.extend_from_slice(&order[start..end]);
            } else {
                indices.extend(start..end);
            }

            remaining -= end - start;
            if end == n {
                epochs += 1;
                start = 0;
                stale = true;
                fresh = None;
                log::debug!("Epoch {} complete", epochs);
            } else {
                start = end;
            }
        }

        let view = if stale || fresh.is_some() {
            Some(fresh)
        } else {
            None
        };

        Selection {
            indices,
            batch_start: start,
            epochs_completed: epochs,
            view,
        }
    }

    /// Decode and stack the selected samples
    fn read(&self, indices: &[usize]) -> crate::Result<Batch> {
        let shape = &self.config.input_shape;
        let (height, width, channels) = (shape[0], shape[1], shape[2]);
        let num_labels = self.config.num_labels;

        let mut pixels = Array4::<u8>::zeros((indices.len(), height, width, channels));
        let mut labels = Array2::<f32>::zeros((indices.len(), num_labels));
        let mut paths = Vec::with_capacity(indices.len());

        for (row, &idx) in indices.iter().enumerate() {
            let sample = &self.manifest.samples()[idx];

            let image = decode_image(&sample.path, self.config.mode)?;
            if image.shape() != shape.as_slice() {
                return Err(InputError::Shape {
                    path: sample.path.clone(),
                    expected: shape.clone(),
                    actual: image.shape().to_vec(),
                });
            }

            pixels.index_axis_mut(Axis(0), row).assign(&image);
            labels
                .index_axis_mut(Axis(0), row)
                .assign(&one_hot(sample.label, num_labels)?);
            paths.push(sample.path.clone());
        }

        assert_eq!(
            labels.len(),
            indices.len() * num_labels,
            "label batch has wrong element count"
        );

        let images = pixels.mapv(|v| f32::from(v) / 255.0);

        Ok(Batch {
            images,
            labels,
            paths,
        })
    }

    /// Get the next `batch_size` (images, labels).
    ///
    /// Cursor and epoch state only advance when the whole batch decodes; on
    /// error the iterator is left exactly as it was before the call.
    pub fn next_batch(&mut self, batch_size: usize) -> crate::Result<Batch> {
        if batch_size == 0 {
            return Err(InputError::Config("batch_size must be > 0".to_string()));
        }

        // Largest per-sample buffer: pixels, label row, or the selected index
        let per_sample = self
            .config
            .image_len()
            .max(self.config.num_labels)
            .max(2)
            * std::mem::size_of::<f32>();
        let fits = batch_size
            .checked_mul(per_sample)
            .is_some_and(|bytes| bytes <= isize::MAX as usize);
        if !fits {
            return Err(InputError::Config(format!(
                "batch_size {} is too large for input_shape {:?}",
                batch_size, self.config.input_shape
            )));
        }

        let selection = self.select(batch_size);
        let batch = self.read(&selection.indices)?;

        self.batch_start = selection.batch_start;
        self.epochs_completed = selection.epochs_completed;
        if let Some(view) = selection.view {
            self.shuffled = view;
        }

        Ok(batch)
    }

    /// Number of complete passes over the manifest
    pub fn epochs_completed(&self) -> usize {
        self.epochs_completed
    }

    pub fn sample_size(&self) -> usize {
        self.manifest.len()
    }

    /// Rewind to the first sample of epoch zero and drop the shuffled view
    pub fn reset(&mut self) {
        self.batch_start = 0;
        self.epochs_completed = 0;
        self.shuffled = None;
    }
}

impl NetworkInput for CsvInput {
    fn next_batch(&mut self, batch_size: usize) -> crate::Result<Batch> {
        CsvInput::next_batch(self, batch_size)
    }

    fn epochs_completed(&self) -> usize {
        CsvInput::epochs_completed(self)
    }

    fn sample_size(&self) -> usize {
        CsvInput::sample_size(self)
    }

    fn reset(&mut self) {
        CsvInput::reset(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColorMode;
    use std::io::Cursor;

    fn manifest(n: usize) -> Manifest {
        let text: String = (0..n).map(|i| format!("img_{i}.png,{}\n", i % 3)).collect();
        Manifest::from_reader(Cursor::new(text), b',').unwrap()
    }

    fn input(n: usize, shuffle: bool) -> CsvInput {
        let config = InputConfig::new("unused.csv", vec![2, 2, 1], 3)
            .mode(ColorMode::Grayscale)
            .shuffle(shuffle)
            .seed(11);
        CsvInput::with_manifest(manifest(n), config).unwrap()
    }

    #[test]
    fn test_select_without_wrap() {
        let input = input(5, false);
        let selection = input.select(3);
        assert_eq!(selection.indices, vec![0, 1, 2]);
        assert_eq!(selection.batch_start, 3);
        assert_eq!(selection.epochs_completed, 0);
        assert!(selection.view.is_none());
    }

    #[test]
    fn test_select_wraps_once() {
        let mut input = input(5, false);
        input.batch_start = 3;
        let selection = input.select(3);
        assert_eq!(selection.indices, vec![3, 4, 0]);
        assert_eq!(selection.batch_start, 1);
        assert_eq!(selection.epochs_completed, 1);
    }

    #[test]
    fn test_select_exact_boundary_counts_as_wrap() {
        let mut input = input(4, false);
        input.batch_start = 2;
        let selection = input.select(2);
        assert_eq!(selection.indices, vec![2, 3]);
        assert_eq!(selection.batch_start, 0);
        assert_eq!(selection.epochs_completed, 1);
    }

    #[test]
    fn test_select_larger_than_dataset() {
        let input = input(3, false);
        let selection = input.select(7);
        assert_eq!(selection.indices, vec![0, 1, 2, 0, 1, 2, 0]);
        assert_eq!(selection.batch_start, 1);
        assert_eq!(selection.epochs_completed, 2);
    }

    #[test]
    fn test_shuffled_selection_is_permutation() {
        let input = input(6, true);
        let selection = input.select(6);
        let mut seen = selection.indices.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..6).collect::<Vec<_>>());

        // The epoch finished exactly at the boundary: view is dropped
        assert!(matches!(selection.view, Some(None)));
    }

    #[test]
    fn test_shuffled_view_built_lazily() {
        let input = input(6, true);
        assert!(input.shuffled.is_none());

        let selection = input.select(2);
        match selection.view {
            Some(Some(view)) => assert_eq!(&view[..2], selection.indices.as_slice()),
            _ => panic!("expected a freshly built view"),
        }
    }

    #[test]
    fn test_seeded_permutation_varies_by_epoch() {
        let input = input(32, true);
        assert_eq!(input.permutation(0), input.permutation(0));
        assert_ne!(input.permutation(0), input.permutation(1));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut input = input(3, false);
        assert!(matches!(input.next_batch(0), Err(InputError::Config(_))));
    }

    #[test]
    fn test_oversized_batch_rejected() {
        let mut input = input(3, false);
        assert!(matches!(
            input.next_batch(usize::MAX),
            Err(InputError::Config(_))
        ));
        assert!(matches!(
            input.next_batch(usize::MAX / 8),
            Err(InputError::Config(_))
        ));
        assert_eq!(input.batch_start(), 0);
    }

    #[test]
    fn test_failed_read_keeps_shuffled_view_unset() {
        // The manifest images do not exist, so every read fails
        let mut input = input(6, true);
        assert!(input.next_batch(4).is_err());
        assert!(input.shuffled.is_none());
        assert_eq!(input.batch_start(), 0);

        // A failed wrap must not replace a view that was already committed
        input.shuffled = Some(vec![5, 4, 3, 2, 1, 0]);
        input.batch_start = 4;
        assert!(input.next_batch(4).is_err());
        assert_eq!(input.shuffled, Some(vec![5, 4, 3, 2, 1, 0]));
        assert_eq!(input.batch_start(), 4);
        assert_eq!(input.epochs_completed(), 0);
    }

    #[test]
    fn test_empty_manifest_rejected() {
        let config = InputConfig::new("unused.csv", vec![2, 2, 1], 3).mode(ColorMode::Grayscale);
        let result = CsvInput::with_manifest(manifest(0), config);
        assert!(matches!(result, Err(InputError::EmptyManifest(_))));
    }

    #[test]
    fn test_batches_per_epoch() {
        let input = input(10, false);
        assert_eq!(input.batches_per_epoch(3), 4);
        assert_eq!(input.batches_per_epoch(10), 1);
        assert_eq!(input.batches_per_epoch(0), 0);
    }
}
