//! Image object store on a local directory.
//!
//! Objects are addressed by relative storage paths of the form
//! `<couple_id>/<unix_millis>_<suffix>.<ext>`, which are what event records
//! keep in `image_path`. Uploads never overwrite an existing object.

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::CoupleId;

const DEFAULT_EXTENSION: &str = "jpg";

/// Build the storage path for a new upload.
pub fn object_path(couple_id: CoupleId, local_file: &Path, millis: i64, suffix: &str) -> String {
    let ext = local_file
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    format!("{couple_id}/{millis}_{suffix}.{ext}")
}

/// Fresh storage path using the current time and a random suffix.
pub fn new_object_path(couple_id: CoupleId, local_file: &Path) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    object_path(couple_id, local_file, Utc::now().timestamp_millis(), &suffix[..8])
}

/// Directory-backed image store.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    public_base: String,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy a local file into the store. Returns the storage path.
    pub async fn upload(&self, couple_id: CoupleId, local_file: &Path) -> Result<String> {
        let bytes = tokio::fs::read(local_file).await.map_err(|e| {
            Error::Validation(format!("cannot read image {}: {e}", local_file.display()))
        })?;

        let storage_path = new_object_path(couple_id, local_file);
        let target = self.resolve(&storage_path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        debug!(path = %storage_path, bytes = bytes.len(), "image stored");
        Ok(storage_path)
    }

    pub async fn remove(&self, storage_path: &str) -> Result<()> {
        let target = self.resolve(storage_path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => {
                debug!(path = %storage_path, "image removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("image {storage_path}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, storage_path: &str) -> Result<bool> {
        let target = self.resolve(storage_path)?;
        Ok(tokio::fs::try_exists(&target).await?)
    }

    pub fn public_url(&self, storage_path: &str) -> String {
        format!(
            "{}/{}",
            self.public_base.trim_end_matches('/'),
            storage_path.trim_start_matches('/')
        )
    }

    /// Map a storage path to a file under the root, refusing escapes.
    fn resolve(&self, storage_path: &str) -> Result<PathBuf> {
        let relative = Path::new(storage_path);
        let safe = !storage_path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(Error::Validation(format!(
                "invalid storage path '{storage_path}'"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn object_path_lowercases_extension_and_defaults_to_jpg() {
        let couple = CoupleId(Uuid::nil());
        assert_eq!(
            object_path(couple, Path::new("/tmp/IMG_1.PNG"), 1700, "ab12cd34"),
            format!("{couple}/1700_ab12cd34.png")
        );
        assert_eq!(
            object_path(couple, Path::new("/tmp/photo"), 1700, "ab12cd34"),
            format!("{couple}/1700_ab12cd34.jpg")
        );
    }

    #[test]
    fn resolve_rejects_escaping_paths() {
        let store = ImageStore::new("/srv/images", "https://cdn.example.com/");
        assert!(store.resolve("../etc/passwd").is_err());
        assert!(store.resolve("/abs/path.jpg").is_err());
        assert!(store.resolve("").is_err());
        assert!(store.resolve("c/1_a.jpg").is_ok());
    }

    #[test]
    fn public_url_joins_with_single_slash() {
        let store = ImageStore::new("/srv/images", "https://cdn.example.com/memories/");
        assert_eq!(
            store.public_url("c/1_a.jpg"),
            "https://cdn.example.com/memories/c/1_a.jpg"
        );
    }
}
