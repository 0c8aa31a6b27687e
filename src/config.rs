/// Configuration for the CSV image input pipeline
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::data::ColorMode;

fn default_delimiter() -> char {
    ','
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct InputConfig {
    /// Path to the `<image_path><delimiter><label>` manifest
    pub manifest_path: PathBuf,

    /// Expected decoded image shape, channels-last: [height, width, channels]
    pub input_shape: Vec<usize>,

    /// Number of classes (length of each one-hot label vector)
    pub num_labels: usize,

    /// Field delimiter of the manifest
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Color mode images are decoded in
    #[serde(default)]
    pub mode: ColorMode,

    /// Reshuffle sample order once per epoch
    #[serde(default)]
    pub shuffle: bool,

    /// Seed for reproducible shuffling; `None` draws from the thread RNG
    #[serde(default)]
    pub seed: Option<u64>,

    /// Directory relative image paths are resolved against
    #[serde(default)]
    pub image_root: Option<PathBuf>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from("train.csv"),
            input_shape: vec![32, 32, 3],
            num_labels: 10,
            delimiter: default_delimiter(),
            mode: ColorMode::default(),
            shuffle: false,
            seed: None,
            image_root: None,
        }
    }
}

impl InputConfig {
    pub fn new(manifest_path: impl Into<PathBuf>, input_shape: Vec<usize>, num_labels: usize) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            input_shape,
            num_labels,
            ..Self::default()
        }
    }

    pub fn delimiter(mut self, d: char) -> Self {
        self.delimiter = d;
        self
    }

    pub fn mode(mut self, m: ColorMode) -> Self {
        self.mode = m;
        self
    }

    pub fn shuffle(mut self, s: bool) -> Self {
        self.shuffle = s;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = Some(s);
        self
    }

    pub fn image_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.image_root = Some(root.into());
        self
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let file = File::open(path.as_ref())?;
        let config: InputConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.num_labels == 0 {
            return Err(crate::InputError::Config(
                "num_labels must be > 0".to_string(),
            ));
        }

        if self.input_shape.len() != 3 {
            return Err(crate::InputError::Config(format!(
                "input_shape must be [height, width, channels], got {:?}",
                self.input_shape
            )));
        }

        if self.input_shape.iter().any(|&d| d == 0) {
            return Err(crate::InputError::Config(format!(
                "input_shape dimensions must be > 0, got {:?}",
                self.input_shape
            )));
        }

        if self.input_shape[2] != self.mode.channels() {
            return Err(crate::InputError::Config(format!(
                "input_shape has {} channels but mode {} decodes {}",
                self.input_shape[2],
                self.mode,
                self.mode.channels()
            )));
        }

        if !self.delimiter.is_ascii() || matches!(self.delimiter, '\n' | '\r' | '"') {
            return Err(crate::InputError::Config(format!(
                "Invalid delimiter: {:?}. Must be a single ASCII character other than a quote or newline",
                self.delimiter
            )));
        }

        Ok(())
    }

    /// Delimiter as the byte the CSV reader expects
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    /// Number of scalar values in one decoded image
    pub fn image_len(&self) -> usize {
        self.input_shape.iter().product()
    }
}
