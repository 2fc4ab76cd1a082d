use chrono::Utc;
use shared::SightingRecord;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SightingsError {
    #[error("failed to serialize sighting: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to append sighting to {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Append-only detection log, one JSON record per line.
#[derive(Clone)]
pub struct SightingsLog {
    path: PathBuf,
}

impl SightingsLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Appends one sighting. The user id is optional until a session
    /// collaborator supplies an authenticated principal.
    pub fn record(
        &self,
        user_id: Option<Uuid>,
        label: &str,
        accuracy: f32,
    ) -> Result<SightingRecord, SightingsError> {
        let record = SightingRecord {
            id: Uuid::new_v4(),
            user_id,
            timestamp: Utc::now(),
            label: label.to_string(),
            accuracy,
        };
        let io_err = |source| SightingsError::Io {
            path: self.path.display().to_string(),
            source,
        };
        let line = serde_json::to_string(&record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        writeln!(file, "{line}").map_err(io_err)?;
        Ok(record)
    }
}
