//! JSON file state store using `tokio::fs`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use tokio::fs;

use super::{PersistedState, StateError, StateResult, StateStore};

/// Keeps the component state in a single JSON file.
///
/// A missing file reads as [`PersistedState::Empty`]. Saves write a sibling
/// temp file and rename it over the target, creating parent directories first.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, operation: &'static str) -> impl FnOnce(std::io::Error) -> StateError {
        let path = self.path.clone();
        move |source| StateError::Io {
            operation,
            path,
            source,
        }
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> StateResult<PersistedState> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state file at {}, starting empty", self.path.display());
                return Ok(PersistedState::Empty);
            }
            Err(e) => return Err(self.io_error("read")(e)),
        };

        if content.trim().is_empty() {
            return Ok(PersistedState::Empty);
        }
        Ok(serde_json::from_str(&content)?)
    }

    async fn save(&self, state: &PersistedState) -> StateResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(self.io_error("create directory for"))?;
        }

        let json = serde_json::to_string_pretty(state)?;
        let temp = self.temp_path();
        fs::write(&temp, json).await.map_err(self.io_error("write"))?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(self.io_error("replace"))?;

        debug!("Saved state {:?} to {}", state, self.path.display());
        Ok(())
    }
}
