//! Image references and their resolution into pixel data.

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use image::RgbImage;

use crate::TRACING_TARGET_SOURCE;
use crate::error::{Error, Result};

/// A reference to the image a pipeline invocation works on.
///
/// Either a file on disk or a buffer that was already received in memory
/// (an upload, for instance). Nothing is read until [`ImageSource::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// An image file on the local filesystem.
    Path(PathBuf),
    /// Encoded image bytes with a display name.
    Memory {
        /// Name reported as the source identifier.
        name: String,
        /// Encoded image data (JPEG, PNG, ...).
        data: Bytes,
    },
}

impl ImageSource {
    /// Creates a source pointing at a file.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Creates a source from an in-memory buffer.
    pub fn memory(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::Memory {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Returns the identifier echoed back in the pipeline result.
    pub fn identifier(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Memory { name, .. } => name.clone(),
        }
    }

    /// Resolves the reference into encoded bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::SourceNotFound`] if the path does not exist, is not
    /// a regular file or cannot be read, or if an in-memory buffer is empty.
    ///
    /// [`ErrorKind::SourceNotFound`]: crate::ErrorKind::SourceNotFound
    pub async fn resolve(&self) -> Result<LoadedImage> {
        let data = match self {
            Self::Path(path) => read_file(path).await?,
            Self::Memory { name, data } => {
                if data.is_empty() {
                    return Err(Error::source_not_found()
                        .with_message(format!("image buffer '{name}' is empty")));
                }
                data.clone()
            }
        };

        tracing::debug!(
            target: TRACING_TARGET_SOURCE,
            source = %self,
            bytes = data.len(),
            "image source resolved"
        );

        Ok(LoadedImage {
            identifier: self.identifier(),
            data,
        })
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Memory { name, .. } => write!(f, "memory:{name}"),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

async fn read_file(path: &Path) -> Result<Bytes> {
    let not_found = || Error::source_not_found().with_message(path.display().to_string());

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| not_found().with_source(e))?;
    if !metadata.is_file() {
        return Err(not_found());
    }

    let data = tokio::fs::read(path)
        .await
        .map_err(|e| not_found().with_source(e))?;

    Ok(Bytes::from(data))
}

/// Encoded bytes of a resolved [`ImageSource`].
#[derive(Debug, Clone)]
pub struct LoadedImage {
    identifier: String,
    data: Bytes,
}

impl LoadedImage {
    /// Returns the source identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the encoded bytes.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Decodes the bytes into an RGB pixel buffer.
    ///
    /// # Errors
    ///
    /// An undecodable image is a [`ErrorKind::DetectionFailure`]: without
    /// pixels there is no region data for the image.
    ///
    /// [`ErrorKind::DetectionFailure`]: crate::ErrorKind::DetectionFailure
    pub fn decode(&self) -> Result<RgbImage> {
        let decoded = image::load_from_memory(&self.data).map_err(|e| {
            Error::detection_failure()
                .with_message(format!("unreadable image '{}'", self.identifier))
                .with_source(e)
        })?;

        Ok(decoded.to_rgb8())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb};

    use super::*;
    use crate::ErrorKind;

    fn png_bytes() -> Vec<u8> {
        let image = RgbImage::from_pixel(8, 4, Rgb([200, 10, 10]));
        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, ImageFormat::Png)
            .expect("encode png");
        buffer.into_inner()
    }

    #[tokio::test]
    async fn missing_path_is_source_not_found() {
        let source = ImageSource::path("/definitely/not/here.jpg");
        let error = source.resolve().await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SourceNotFound);
    }

    #[tokio::test]
    async fn directory_is_source_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let error = ImageSource::path(dir.path()).resolve().await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SourceNotFound);
    }

    #[tokio::test]
    async fn file_resolves_and_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let loaded = ImageSource::path(&path).resolve().await.unwrap();
        assert_eq!(loaded.identifier(), path.display().to_string());

        let pixels = loaded.decode().unwrap();
        assert_eq!(pixels.dimensions(), (8, 4));
    }

    #[tokio::test]
    async fn garbage_bytes_fail_detection() {
        let loaded = ImageSource::memory("upload.jpg", &b"not an image"[..])
            .resolve()
            .await
            .unwrap();

        let error = loaded.decode().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DetectionFailure);
    }

    #[tokio::test]
    async fn empty_buffer_is_source_not_found() {
        let error = ImageSource::memory("empty.png", Bytes::new())
            .resolve()
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SourceNotFound);
    }
}
