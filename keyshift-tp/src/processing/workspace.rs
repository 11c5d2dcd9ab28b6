//! Request-scoped temporary directories
//!
//! Each upload gets `<uploads_dir>/<uuid>/`, holding both the staged input and
//! the tool's output. The directory is removed when the workspace is dropped,
//! so every exit path of a request (rejection, tool failure, finished or
//! aborted download) cleans up both artifacts.
//!
//! Removal is a synchronous `remove_dir_all` run from `Drop`, which may be on a
//! runtime worker thread. A workspace only ever holds the staged input and one
//! output file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug)]
pub struct RequestWorkspace {
    id: Uuid,
    dir: PathBuf,
}

impl RequestWorkspace {
    /// Create a fresh, uniquely named directory under `root`
    pub async fn create(root: &Path) -> std::io::Result<Self> {
        let id = Uuid::new_v4();
        let dir = root.join(id.to_string());
        tokio::fs::create_dir_all(&dir).await?;

        debug!(workspace = %id, dir = %dir.display(), "Created request workspace");
        Ok(Self { id, dir })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Path of a file inside the workspace
    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl Drop for RequestWorkspace {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => debug!(workspace = %self.id, "Removed request workspace"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(workspace = %self.id, "Request workspace already gone")
            }
            Err(e) => warn!(
                workspace = %self.id,
                dir = %self.dir.display(),
                error = %e,
                "Failed to remove request workspace"
            ),
        }
    }
}
