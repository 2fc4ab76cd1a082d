use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no filename was supplied with the upload")]
    MissingFilename,
    #[error("the uploaded file is empty")]
    EmptyUpload,
    #[error("unsupported file type: {filename}")]
    UnsupportedFileType { filename: String },
    #[error("failed to persist {filename}: {source}")]
    Io {
        filename: String,
        source: std::io::Error,
    },
}

/// A validated upload persisted to local disk.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub original_filename: String,
    pub filename: String,
    pub path: PathBuf,
    pub size: u64,
    pub extension: String,
}

/// Persists uploads under a sanitized name inside the configured directory.
#[derive(Clone)]
pub struct ImageStore {
    upload_dir: PathBuf,
    allowed_extensions: HashSet<String>,
}

impl ImageStore {
    pub fn new(upload_dir: PathBuf, allowed_extensions: HashSet<String>) -> Self {
        Self {
            upload_dir,
            allowed_extensions,
        }
    }

    /// Validates and writes one upload, returning its stored handle.
    ///
    /// A later upload with the same sanitized name overwrites the earlier
    /// file; stored names are deterministic and carry no uniquifying suffix.
    pub fn store(&self, bytes: &[u8], declared_filename: &str) -> Result<StoredImage, StoreError> {
        let declared = declared_filename.trim();
        if declared.is_empty() {
            return Err(StoreError::MissingFilename);
        }
        if bytes.is_empty() {
            return Err(StoreError::EmptyUpload);
        }
        let extension = self.allowed_extension(declared)?;
        let filename = sanitize_filename(declared);

        fs::create_dir_all(&self.upload_dir).map_err(|e| StoreError::Io {
            filename: filename.clone(),
            source: e,
        })?;

        let path = self.upload_dir.join(&filename);
        fs::write(&path, bytes).map_err(|e| StoreError::Io {
            filename: filename.clone(),
            source: e,
        })?;

        Ok(StoredImage {
            original_filename: declared.to_string(),
            filename,
            path,
            size: bytes.len() as u64,
            extension,
        })
    }

    fn allowed_extension(&self, filename: &str) -> Result<String, StoreError> {
        filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .filter(|ext| self.allowed_extensions.contains(ext))
            .ok_or_else(|| StoreError::UnsupportedFileType {
                filename: filename.to_string(),
            })
    }
}

/// Reduces an untrusted filename to a flat, filesystem-safe name.
///
/// Path components are dropped, anything outside ASCII alphanumerics and
/// `.`/`-`/`_` becomes an underscore, and leading/trailing separators are
/// trimmed. Deterministic for a given input.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| matches!(c, '.' | '-' | '_'));
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
