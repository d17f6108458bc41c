use crate::model::{Assignment, Schedule, ShiftRequirement, WorkerAvailability};
use crate::validation::ValidationWarning;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Instantané persistant d'une session d'édition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub schedule: Schedule,
    pub shifts: Vec<ShiftRequirement>,
    pub workers: Vec<WorkerAvailability>,
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub warnings: Vec<ValidationWarning>,
}

pub trait Storage {
    /// Charge une session depuis un support.
    fn load(&self) -> anyhow::Result<StoredSession>;
    /// Sauvegarde de manière atomique.
    fn save(&self, session: &StoredSession) -> anyhow::Result<()>;
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<StoredSession> {
        let data =
            fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let session: StoredSession = serde_json::from_slice(&data)
            .with_context(|| format!("parsing session {}", self.path.display()))?;
        debug!(
            path = %self.path.display(),
            assignments = session.assignments.len(),
            "session loaded"
        );
        Ok(session)
    }

    fn save(&self, session: &StoredSession) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(session)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        debug!(path = %self.path.display(), bytes = json.len(), "session saved");
        Ok(())
    }
}
