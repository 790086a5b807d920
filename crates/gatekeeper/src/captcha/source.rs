//! Where puzzle images come from.

use image::{DynamicImage, GenericImageView};
use std::path::{Path, PathBuf};

use super::CaptchaError;

/// A decodable raster the puzzle is cut from.
///
/// `load` is called on every generate and reset, so a file source picks up
/// changes on disk and reports a missing file at reset time too.
pub trait ImageSource: Send + Sync {
    /// Human-readable name used in logs and errors
    fn name(&self) -> String;

    fn load(&self) -> Result<DynamicImage, CaptchaError>;
}

/// Image file on disk
#[derive(Debug, Clone)]
pub struct FileImage {
    path: PathBuf,
}

impl FileImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSource for FileImage {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<DynamicImage, CaptchaError> {
        let image = image::open(&self.path).map_err(|e| CaptchaError::ImageUnavailable {
            name: self.name(),
            reason: e.to_string(),
        })?;
        ensure_divisible(&self.name(), image)
    }
}

/// Already-decoded image held in memory
#[derive(Debug, Clone)]
pub struct MemoryImage {
    label: String,
    image: DynamicImage,
}

impl MemoryImage {
    pub fn new(label: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            label: label.into(),
            image,
        }
    }
}

impl ImageSource for MemoryImage {
    fn name(&self) -> String {
        self.label.clone()
    }

    fn load(&self) -> Result<DynamicImage, CaptchaError> {
        ensure_divisible(&self.label, self.image.clone())
    }
}

/// Every quadrant needs at least one pixel
fn ensure_divisible(name: &str, image: DynamicImage) -> Result<DynamicImage, CaptchaError> {
    let (width, height) = image.dimensions();
    if width < 2 || height < 2 {
        return Err(CaptchaError::ImageUnavailable {
            name: name.to_string(),
            reason: format!("{}x{} is too small to cut into a 2x2 grid", width, height),
        });
    }
    Ok(image)
}
