/// Manifest of (image path, label) samples read from a delimited text file
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::InputError;

/// A single manifest record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub path: PathBuf,
    pub label: usize,
}

/// Ordered, immutable table of samples
///
/// Only metadata lives here; pixels are decoded on demand by the batch
/// iterator, so memory scales with the manifest and not with the images.
#[derive(Debug, Clone)]
pub struct Manifest {
    samples: Vec<Sample>,
    source: String,
    blank_lines: u64,
    duplicate_paths: usize,
}

impl Manifest {
    /// Load a manifest file. No header row; every record must be exactly
    /// `<image_path><delimiter><label>`.
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: u8) -> crate::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut manifest = Self::from_reader(file, delimiter)?;
        manifest.source = path.display().to_string();

        log::info!(
            "Loaded manifest {}: {} samples",
            manifest.source,
            manifest.len()
        );

        Ok(manifest)
    }

    /// Parse a manifest from any reader
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> crate::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut samples = Vec::new();
        let mut seen = HashSet::new();
        let mut blank_lines = 0u64;
        let mut duplicate_paths = 0usize;
        let mut next_line = 1u64;

        for record in reader.byte_records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(next_line);

            // The csv reader drops empty lines; they show up as gaps
            blank_lines += line.saturating_sub(next_line);
            next_line = line + 1;

            if record.len() != 2 {
                return Err(InputError::ManifestFormat {
                    line,
                    reason: format!("expected 2 fields (path, label), found {}", record.len()),
                });
            }

            let path = std::str::from_utf8(&record[0]).map_err(|e| InputError::ManifestFormat {
                line,
                reason: format!("image path is not valid UTF-8: {}", e),
            })?;
            if path.is_empty() {
                return Err(InputError::ManifestFormat {
                    line,
                    reason: "empty image path".to_string(),
                });
            }

            let label_field = String::from_utf8_lossy(&record[1]);
            let label: usize = label_field.parse().map_err(|e| InputError::ManifestFormat {
                line,
                reason: format!("invalid label {:?}: {}", label_field, e),
            })?;

            if !seen.insert(path.to_string()) {
                log::warn!("Duplicate image path on line {}: {}", line, path);
                duplicate_paths += 1;
            }

            samples.push(Sample {
                path: PathBuf::from(path),
                label,
            });
        }

        if blank_lines > 0 {
            log::warn!("Skipped {} blank manifest lines", blank_lines);
        }

        Ok(Self {
            samples,
            source: "<reader>".to_string(),
            blank_lines,
            duplicate_paths,
        })
    }

    /// Resolve relative image paths against `root`
    pub fn with_image_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        let root = root.as_ref();
        for sample in &mut self.samples {
            if sample.path.is_relative() {
                sample.path = root.join(&sample.path);
            }
        }
        self
    }

    /// Get number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Where the manifest was read from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Blank lines skipped while parsing
    pub fn blank_lines(&self) -> u64 {
        self.blank_lines
    }

    /// Records whose image path already appeared earlier in the manifest.
    /// They are kept as samples.
    pub fn duplicate_paths(&self) -> usize {
        self.duplicate_paths
    }

    /// Largest label in the manifest, if any
    pub fn max_label(&self) -> Option<usize> {
        self.samples.iter().map(|s| s.label).max()
    }
}
