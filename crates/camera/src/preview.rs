use std::path::{Path, PathBuf};

use anyhow::Context;
use image::{imageops::FilterType, RgbaImage};

/// Preview size for one-shot stills.
pub const STILL_PREVIEW_SIZE: (u32, u32) = (360, 216);

/// Preview size for interval frames.
pub const INTERVAL_PREVIEW_SIZE: (u32, u32) = (350, 210);

/// Scaled copy of the most recent capture.
#[derive(Clone, Debug)]
pub struct Preview {
    pub source: PathBuf,
    pub image: RgbaImage,
}

impl Preview {
    pub fn load(path: &Path, (width, height): (u32, u32)) -> anyhow::Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("failed to decode {path:?}"))?
            .resize_exact(width, height, FilterType::Triangle)
            .to_rgba8();

        Ok(Self {
            source: path.to_owned(),
            image,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;

    #[test]
    fn frame_is_scaled_to_preview_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.jpg");
        RgbImage::from_pixel(64, 48, Rgb([200, 40, 40]))
            .save_with_format(&path, ImageFormat::Jpeg)
            .unwrap();

        let preview = Preview::load(&path, STILL_PREVIEW_SIZE).unwrap();

        assert_eq!(preview.dimensions(), STILL_PREVIEW_SIZE);
        assert_eq!(preview.source, path);
    }

    #[test]
    fn garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.jpg");
        std::fs::write(&path, b"not a jpeg").unwrap();

        assert!(Preview::load(&path, INTERVAL_PREVIEW_SIZE).is_err());
    }
}
