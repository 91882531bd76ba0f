use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use storybook_logging::{story_debug, story_warn};
use tempfile::TempDir;
use url::Url;

use crate::persist::{AtomicFileWriter, PersistError};
use crate::ArtifactId;

/// A rendered HTML document living in the store's scratch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub id: ArtifactId,
    pub path: PathBuf,
    pub url: Url,
}

/// Owns the temporary HTML documents handed out to the view.
///
/// Every artifact stays readable until [`ArtifactStore::revoke`] is called for
/// it. Dropping the store removes the scratch directory and anything still in it.
pub struct ArtifactStore {
    root: TempDir,
    next_id: AtomicU64,
    live: Mutex<HashMap<ArtifactId, PathBuf>>,
}

impl ArtifactStore {
    pub fn new() -> Result<Self, PersistError> {
        Ok(Self {
            root: tempfile::Builder::new().prefix("storybook-").tempdir()?,
            next_id: AtomicU64::new(1),
            live: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Write `html` to a new `text/html` artifact.
    pub fn create(&self, html: &str) -> Result<Artifact, PersistError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let writer = AtomicFileWriter::in_existing_dir(self.root.path().to_path_buf());
        let path = writer.write(&format!("story-{id}.html"), html.as_bytes())?;
        let url = match Url::from_file_path(&path) {
            Ok(url) => url,
            Err(()) => {
                if let Err(err) = fs::remove_file(&path) {
                    story_warn!("Failed to remove unaddressable artifact {:?}: {}", path, err);
                }
                return Err(PersistError::Unaddressable(path));
            }
        };

        self.live_map().insert(id, path.clone());
        story_debug!("Created artifact {} ({} bytes) at {:?}", id, html.len(), path);
        Ok(Artifact { id, path, url })
    }

    /// Release an artifact. Returns false when it was not live.
    pub fn revoke(&self, id: ArtifactId) -> bool {
        let Some(path) = self.live_map().remove(&id) else {
            return false;
        };
        if let Err(err) = fs::remove_file(&path) {
            story_warn!("Failed to remove artifact {} at {:?}: {}", id, path, err);
        }
        story_debug!("Revoked artifact {}", id);
        true
    }

    /// Copy a live artifact to `{dir}/{file_name}`, byte for byte.
    pub fn save_as(
        &self,
        id: ArtifactId,
        dir: &Path,
        file_name: &str,
    ) -> Result<PathBuf, PersistError> {
        let source = self
            .live_map()
            .get(&id)
            .cloned()
            .ok_or(PersistError::UnknownArtifact(id))?;
        let content = fs::read(&source)?;
        AtomicFileWriter::new(dir.to_path_buf()).write(file_name, &content)
    }

    pub fn is_live(&self, id: ArtifactId) -> bool {
        self.live_map().contains_key(&id)
    }

    pub fn live_count(&self) -> usize {
        self.live_map().len()
    }

    fn live_map(&self) -> std::sync::MutexGuard<'_, HashMap<ArtifactId, PathBuf>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
