/// Image decoding into channels-last `u8` arrays
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use image::ImageReader;
use ndarray::Array3;

use crate::InputError;

/// Color mode images are decoded in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum ColorMode {
    /// Single luminance channel
    #[serde(rename = "L")]
    Grayscale,
    #[default]
    #[serde(rename = "RGB")]
    Rgb,
    #[serde(rename = "RGBA")]
    Rgba,
}

impl ColorMode {
    /// Channels in a decoded image
    pub fn channels(&self) -> usize {
        match self {
            ColorMode::Grayscale => 1,
            ColorMode::Rgb => 3,
            ColorMode::Rgba => 4,
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorMode::Grayscale => "L",
            ColorMode::Rgb => "RGB",
            ColorMode::Rgba => "RGBA",
        };
        f.write_str(name)
    }
}

impl FromStr for ColorMode {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "L" | "GRAY" | "GRAYSCALE" => Ok(ColorMode::Grayscale),
            "RGB" => Ok(ColorMode::Rgb),
            "RGBA" => Ok(ColorMode::Rgba),
            _ => Err(InputError::Config(format!(
                "Invalid color mode: {}. Must be 'L', 'RGB', or 'RGBA'",
                s
            ))),
        }
    }
}

/// Decode the image at `path` into a `[height, width, channels]` array.
///
/// Grayscale images keep an explicit trailing channel of size 1, so every
/// decoded image has rank 3 regardless of mode. The pixel format on disk
/// does not matter; the image is converted to `mode`.
pub fn decode_image(path: &Path, mode: ColorMode) -> crate::Result<Array3<u8>> {
    let img = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| InputError::ImageDecode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let (width, height) = (img.width() as usize, img.height() as usize);
    let raw = match mode {
        ColorMode::Grayscale => img.into_luma8().into_raw(),
        ColorMode::Rgb => img.into_rgb8().into_raw(),
        ColorMode::Rgba => img.into_rgba8().into_raw(),
    };

    Array3::from_shape_vec((height, width, mode.channels()), raw).map_err(|e| {
        InputError::ImageDecode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn test_mode_parsing() {
        assert_eq!("L".parse::<ColorMode>().unwrap(), ColorMode::Grayscale);
        assert_eq!("rgb".parse::<ColorMode>().unwrap(), ColorMode::Rgb);
        assert_eq!("RGBA".parse::<ColorMode>().unwrap(), ColorMode::Rgba);
        assert!("CMYK".parse::<ColorMode>().is_err());
        assert_eq!(ColorMode::Grayscale.to_string(), "L");
    }

    #[test]
    fn test_grayscale_gets_channel_axis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        GrayImage::from_pixel(4, 2, Luma([200])).save(&path).unwrap();

        let decoded = decode_image(&path, ColorMode::Grayscale).unwrap();
        assert_eq!(decoded.shape(), &[2, 4, 1]);
        assert!(decoded.iter().all(|&v| v == 200));
    }

    #[test]
    fn test_rgb_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let gray_path = dir.path().join("gray.png");
        let rgb_path = dir.path().join("rgb.png");
        GrayImage::from_pixel(3, 3, Luma([10])).save(&gray_path).unwrap();
        RgbImage::from_pixel(3, 5, Rgb([1, 2, 3])).save(&rgb_path).unwrap();

        // Grayscale on disk still decodes to three channels in RGB mode
        let widened = decode_image(&gray_path, ColorMode::Rgb).unwrap();
        assert_eq!(widened.shape(), &[3, 3, 3]);

        let rgb = decode_image(&rgb_path, ColorMode::Rgb).unwrap();
        assert_eq!(rgb.shape(), &[5, 3, 3]);
        assert_eq!(rgb[[0, 0, 0]], 1);
        assert_eq!(rgb[[4, 2, 2]], 3);

        let rgba = decode_image(&rgb_path, ColorMode::Rgba).unwrap();
        assert_eq!(rgba.shape(), &[5, 3, 4]);
        assert_eq!(rgba[[0, 0, 3]], 255);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = decode_image(Path::new("/definitely/not/here.png"), ColorMode::Rgb);
        assert!(matches!(result, Err(InputError::Io(_))));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"this is not an image").unwrap();

        let result = decode_image(&path, ColorMode::Rgb);
        assert!(matches!(result, Err(InputError::ImageDecode { .. })));
    }
}
