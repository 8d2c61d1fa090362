// src/image_source.rs

use ndarray::Array2;
use std::error::Error;
use std::fmt;

/// An 8-bit grayscale image. `pixels` has shape `(height, width)`.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayscaleImage {
    name: String,
    pixels: Array2<u8>,
}

impl GrayscaleImage {
    /// # Errors
    /// Returns [`ImageSourceError::Empty`] if either dimension is zero.
    pub fn new(name: impl Into<String>, pixels: Array2<u8>) -> Result<Self, ImageSourceError> {
        let name = name.into();
        if pixels.is_empty() {
            return Err(ImageSourceError::Empty { name });
        }
        Ok(Self { name, pixels })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pixels(&self) -> &Array2<u8> {
        &self.pixels
    }

    pub fn into_pixels(self) -> Array2<u8> {
        self.pixels
    }
}

#[derive(Debug)]
pub enum ImageSourceError {
    /// The image has no pixels.
    Empty { name: String },
    /// The image could not be read or decoded.
    Decode { name: String, message: String },
}

impl fmt::Display for ImageSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSourceError::Empty { name } => write!(f, "image '{name}' has no pixels"),
            ImageSourceError::Decode { name, message } => {
                write!(f, "failed to load image '{name}': {message}")
            }
        }
    }
}

impl Error for ImageSourceError {}

/// Supplies grayscale intensity matrices. The core never looks at file formats.
pub trait ImageSource {
    fn load_grayscale(&self) -> Result<GrayscaleImage, ImageSourceError>;
}

/// Serves an image that is already in memory.
#[derive(Debug, Clone)]
pub struct InMemoryImageSource {
    image: GrayscaleImage,
}

impl InMemoryImageSource {
    pub fn new(image: GrayscaleImage) -> Self {
        Self { image }
    }
}

impl ImageSource for InMemoryImageSource {
    fn load_grayscale(&self) -> Result<GrayscaleImage, ImageSourceError> {
        Ok(self.image.clone())
    }
}

#[cfg(feature = "image-io")]
pub use file_source::FileImageSource;

#[cfg(feature = "image-io")]
mod file_source {
    use super::{GrayscaleImage, ImageSource, ImageSourceError};
    use log::info;
    use ndarray::Array2;
    use std::path::{Path, PathBuf};

    /// Decodes an image file (PNG or JPEG) and converts it to 8-bit luma.
    #[derive(Debug, Clone)]
    pub struct FileImageSource {
        path: PathBuf,
    }

    impl FileImageSource {
        pub fn new(path: impl AsRef<Path>) -> Self {
            Self { path: path.as_ref().to_path_buf() }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        /// File name without directories, used as the display name.
        fn display_name(&self) -> String {
            self.path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string())
        }
    }

    impl ImageSource for FileImageSource {
        fn load_grayscale(&self) -> Result<GrayscaleImage, ImageSourceError> {
            let name = self.display_name();
            info!("Loading {}", self.path.display());

            let decoded = image::open(&self.path).map_err(|e| ImageSourceError::Decode {
                name: name.clone(),
                message: e.to_string(),
            })?;
            let luma = decoded.into_luma8();
            let (width, height) = luma.dimensions();
            let pixels = Array2::from_shape_vec((height as usize, width as usize), luma.into_raw())
                .map_err(|e| ImageSourceError::Decode { name: name.clone(), message: e.to_string() })?;

            GrayscaleImage::new(name, pixels)
        }
    }
}
