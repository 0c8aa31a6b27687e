//! CSV image input - batch pipeline for image classification training
//!
//! Reads a delimited manifest of `<image_path>,<label>` records, decodes the
//! referenced images lazily, and serves fixed-size batches of normalized
//! pixels and one-hot labels while tracking epochs.
//!
//! # Architecture
//!
//! - **Manifest**: eager, metadata-only table of (path, label) samples
//! - **CsvInput**: stateful cursor that wraps around the manifest, counting
//!   epochs and optionally reshuffling once per epoch
//! - **NetworkInput**: the capability trait the training loop consumes
//!
//! # Example
//!
//! ```ignore
//! use csv_image_input::{CsvInput, InputConfig, NetworkInput};
//!
//! let config = InputConfig::new("train.csv", vec![64, 64, 3], 10).shuffle(true);
//! let mut input = CsvInput::new(config)?;
//! let batch = input.next_batch(32)?;
//! println!("epochs: {}", input.epochs_completed());
//! ```

use std::path::PathBuf;

pub mod config;
pub mod data;

// Re-export commonly used items
pub use config::InputConfig;
pub use data::{Batch, ColorMode, CsvInput, Manifest, NetworkInput, Sample};

/// Library error types
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Manifest format error on line {line}: {reason}")]
    ManifestFormat { line: u64, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to decode image {path:?}: {reason}")]
    ImageDecode { path: PathBuf, reason: String },

    #[error("Shape mismatch for {path:?}: expected {expected:?}, got {actual:?}")]
    Shape {
        path: PathBuf,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Label {label} out of range for {num_labels} labels")]
    LabelRange { label: usize, num_labels: usize },

    #[error("Manifest contains no samples: {0}")]
    EmptyManifest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, InputError>;
