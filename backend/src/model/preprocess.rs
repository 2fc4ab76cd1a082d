use image::ImageReader;
use image::imageops::FilterType;
use ndarray::Array4;
use std::path::Path;

pub const INPUT_HEIGHT: u32 = 224;
pub const INPUT_WIDTH: u32 = 224;

/// Per-channel means in BGR order, matching the Caffe-style ResNet50
/// preprocessing convention the model was trained with.
const CHANNEL_MEANS_BGR: [f32; 3] = [103.939, 116.779, 123.68];

/// Classifier input: f32 NCHW `(1, 3, 224, 224)`, BGR, mean-subtracted.
pub type ImageTensor = Array4<f32>;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: String,
        source: image::ImageError,
    },
}

/// Decodes a stored image into the classifier's input tensor.
///
/// The image is stretched to 224x224 with bilinear filtering (no
/// aspect-ratio preservation), converted to f32, reordered RGB -> BGR, and
/// mean-subtracted per channel. The output shape and normalization are
/// constant regardless of the source dimensions. The format is sniffed from
/// the file content rather than trusted from the extension.
pub fn decode(path: &Path) -> Result<ImageTensor, DecodeError> {
    let read_err = |source| DecodeError::Read {
        path: path.display().to_string(),
        source,
    };
    let img = ImageReader::open(path)
        .map_err(read_err)?
        .with_guessed_format()
        .map_err(read_err)?
        .decode()
        .map_err(|source| DecodeError::Decode {
            path: path.display().to_string(),
            source,
        })?;

    let resized = img
        .resize_exact(INPUT_WIDTH, INPUT_HEIGHT, FilterType::Triangle)
        .to_rgb8();

    let mut tensor = Array4::<f32>::zeros((1, 3, INPUT_HEIGHT as usize, INPUT_WIDTH as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            // channel 0 of the tensor is blue, 2 is red
            tensor[[0, c, y as usize, x as usize]] =
                f32::from(pixel[2 - c]) - CHANNEL_MEANS_BGR[c];
        }
    }
    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Write;

    fn write_png(dir: &std::path::Path, name: &str, color: Rgb<u8>, w: u32, h: u32) -> std::path::PathBuf {
        let mut img = RgbImage::new(w, h);
        for pixel in img.pixels_mut() {
            *pixel = color;
        }
        let path = dir.join(name);
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn output_shape_is_constant() {
        let dir = tempfile::tempdir().unwrap();
        for (name, w, h) in [("small.png", 2, 2), ("wide.png", 64, 16)] {
            let path = write_png(dir.path(), name, Rgb([10, 20, 30]), w, h);
            let tensor = decode(&path).unwrap();
            assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
        }
    }

    #[test]
    fn channels_are_bgr_and_mean_subtracted() {
        let dir = tempfile::tempdir().unwrap();
        // R=200, G=150, B=100
        let path = write_png(dir.path(), "solid.png", Rgb([200, 150, 100]), 8, 8);
        let tensor = decode(&path).unwrap();
        let b = tensor[[0, 0, 100, 100]];
        let g = tensor[[0, 1, 100, 100]];
        let r = tensor[[0, 2, 100, 100]];
        assert!((b - (100.0 - 103.939)).abs() < 1e-3);
        assert!((g - (150.0 - 116.779)).abs() < 1e-3);
        assert!((r - (200.0 - 123.68)).abs() < 1e-3);
    }

    #[test]
    fn corrupt_data_fails_with_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"definitely not an image").unwrap();
        assert!(matches!(decode(&path), Err(DecodeError::Decode { .. })));
    }

    #[test]
    fn missing_file_fails_with_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.png");
        assert!(matches!(decode(&path), Err(DecodeError::Read { .. })));
    }
}
