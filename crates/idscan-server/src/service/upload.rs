//! Upload limits and temporary storage of uploaded images.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[cfg(feature = "config")]
use clap::Args;
use idscan_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::TRACING_TARGET_UPLOAD;

/// Default maximum upload size: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Headroom on top of the file size for multipart boundaries and headers.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff"];

/// Limits applied to uploaded images.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct UploadConfig {
    /// Maximum size of an uploaded image in bytes.
    #[cfg_attr(
        feature = "config",
        arg(long = "max-file-size", env = "MAX_FILE_SIZE", default_value_t = DEFAULT_MAX_FILE_SIZE)
    )]
    pub max_file_size: usize,

    /// Accepted file extensions, case-insensitive, without the leading dot.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "allowed-extensions",
            env = "ALLOWED_EXTENSIONS",
            value_delimiter = ',',
            default_values = ["jpg", "jpeg", "png", "bmp", "tiff"]
        )
    )]
    pub allowed_extensions: Vec<String>,

    /// Directory for temporary upload files. Defaults to the system one.
    #[cfg_attr(feature = "config", arg(long = "upload-dir", env = "UPLOAD_DIR"))]
    pub temp_dir: Option<PathBuf>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| (*ext).to_owned())
                .collect(),
            temp_dir: None,
        }
    }
}

impl UploadConfig {
    /// Sets the maximum upload size in bytes.
    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Replaces the accepted extensions.
    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the directory for temporary upload files.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(temp_dir.into());
        self
    }

    /// Returns the request body limit for the upload route.
    pub fn body_limit(&self) -> usize {
        self.max_file_size.saturating_add(MULTIPART_OVERHEAD)
    }

    /// Returns the lowercased extension of `file_name`, without the dot.
    pub fn extension_of(file_name: &str) -> Option<String> {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(str::to_ascii_lowercase)
    }

    /// Returns true if `extension` is on the whitelist.
    pub fn is_allowed(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(extension))
    }

    /// Validates the limits.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the size limit is zero, the
    /// whitelist is empty or the temp directory does not exist.
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size == 0 {
            return Err(Error::configuration().with_message("max file size must be positive"));
        }

        if self.allowed_extensions.is_empty() {
            return Err(
                Error::configuration().with_message("at least one file extension must be allowed")
            );
        }

        if let Some(dir) = &self.temp_dir
            && !dir.is_dir()
        {
            return Err(Error::configuration().with_message(format!(
                "upload directory '{}' does not exist",
                dir.display()
            )));
        }

        Ok(())
    }
}

/// An uploaded image written to a temporary file.
///
/// The file is removed when this value is dropped, whether the request
/// succeeded, failed or was cancelled.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
}

impl StagedUpload {
    /// Writes `data` to a new temporary file with the given extension.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    pub async fn write(config: &UploadConfig, extension: &str, data: Vec<u8>) -> io::Result<Self> {
        let temp_dir = config.temp_dir.clone();
        let suffix = format!(".{extension}");
        let size = data.len();

        let file = tokio::task::spawn_blocking(move || {
            let mut builder = tempfile::Builder::new();
            builder.prefix("idscan-").suffix(&suffix);

            let mut file = match &temp_dir {
                Some(dir) => builder.tempfile_in(dir)?,
                None => builder.tempfile()?,
            };
            file.write_all(&data)?;
            file.flush()?;
            Ok::<_, io::Error>(file)
        })
        .await
        .map_err(io::Error::other)??;

        tracing::debug!(
            target: TRACING_TARGET_UPLOAD,
            path = %file.path().display(),
            bytes = size,
            "upload staged"
        );

        Ok(Self { file })
    }

    /// Returns the path of the temporary file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_whitelist() {
        let config = UploadConfig::default();
        for ext in ["jpg", "jpeg", "png", "bmp", "tiff"] {
            assert!(config.is_allowed(ext));
        }
        assert!(!config.is_allowed("gif"));
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(UploadConfig::extension_of("CARD.JPG").as_deref(), Some("jpg"));
        assert_eq!(UploadConfig::extension_of("scan.front.png").as_deref(), Some("png"));
        assert_eq!(UploadConfig::extension_of("card"), None);
        assert_eq!(UploadConfig::extension_of("card."), None);
    }

    #[test]
    fn dotted_whitelist_entries_match() {
        let config = UploadConfig::default().with_allowed_extensions([".PNG"]);
        assert!(config.is_allowed("png"));
        assert!(!config.is_allowed("jpg"));
    }

    #[test]
    fn validate_rejects_bad_limits() {
        assert!(UploadConfig::default().validate().is_ok());
        assert!(UploadConfig::default().with_max_file_size(0).validate().is_err());
        assert!(
            UploadConfig::default()
                .with_allowed_extensions(Vec::<String>::new())
                .validate()
                .is_err()
        );
        assert!(
            UploadConfig::default()
                .with_temp_dir("/definitely/not/here")
                .validate()
                .is_err()
        );
    }

    #[tokio::test]
    async fn staged_upload_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let config = UploadConfig::default().with_temp_dir(dir.path());

        let staged = StagedUpload::write(&config, "png", vec![1, 2, 3]).await.unwrap();
        let path = staged.path().to_path_buf();

        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);

        drop(staged);
        assert!(!path.exists());
    }
}
