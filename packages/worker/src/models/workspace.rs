use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

const ARTIFACT_DIR_PREFIX: &str = "run-";

/// Working directory shared by all invocations of one worker.
///
/// Created once at startup with [`WorkDir::init`] and removed with
/// [`WorkDir::teardown`]. Each invocation gets its own uniquely named subdirectory.
#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
    /// Whether `init` created `root`; teardown only removes what it owns.
    owned: bool,
}

impl WorkDir {
    pub async fn init(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        let owned = !fs::try_exists(&root).await?;
        fs::create_dir_all(&root).await?;
        // Children run with their artifact directory as cwd, so every path handed to
        // them must be absolute.
        let root = fs::canonicalize(&root).await?;
        debug!(root = %root.display(), owned, "Working directory ready");
        Ok(Self { root, owned })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create a fresh artifact directory for one invocation.
    pub async fn acquire(&self) -> io::Result<ArtifactDir> {
        let path = self
            .root
            .join(format!("{ARTIFACT_DIR_PREFIX}{}", Uuid::new_v4()));
        fs::create_dir(&path).await?;
        Ok(ArtifactDir {
            path,
            released: false,
        })
    }

    /// Remove the working directory, or only leftover artifact directories if it
    /// existed before `init`.
    pub async fn teardown(self) -> io::Result<()> {
        if self.owned {
            return match fs::remove_dir_all(&self.root).await {
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                other => other,
            };
        }

        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry
                .file_name()
                .to_string_lossy()
                .starts_with(ARTIFACT_DIR_PREFIX)
            {
                fs::remove_dir_all(entry.path()).await?;
            }
        }
        Ok(())
    }
}

/// Per-invocation directory holding the source file and any compiled binary.
///
/// Released explicitly before a result is returned; dropping it unreleased removes it
/// synchronously so early returns and panics leave nothing behind.
#[derive(Debug)]
pub struct ArtifactDir {
    path: PathBuf,
    released: bool,
}

impl ArtifactDir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    pub async fn release(mut self) -> io::Result<()> {
        fs::remove_dir_all(&self.path).await?;
        self.released = true;
        Ok(())
    }
}

impl Drop for ArtifactDir {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove artifact directory"
                );
            }
            _ => {}
        }
    }
}
