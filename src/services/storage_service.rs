use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

/// Blob store keyed by relative paths under a root directory.
#[derive(Clone, Debug)]
pub struct StorageService {
    root: PathBuf,
}

impl StorageService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn put(&self, key: &str, data: &Bytes) -> Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;
        tracing::debug!(key, size = data.len(), "blob stored");
        Ok(())
    }

    pub async fn open(&self, key: &str) -> Result<fs::File> {
        let path = self.resolve(key)?;
        match fs::File::open(&path).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound("File not found in storage".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deleting a missing blob is not an error.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(key, "blob already missing on delete");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(Error::BadRequest(format!("Invalid storage key: {}", key)));
        }
        Ok(self.root.join(relative))
    }
}

/// Keeps letters, digits, dots, dashes and underscores; everything else becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("aula-storage-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn put_open_delete() {
        let storage = StorageService::new(temp_root());
        let key = "courses/c1/week-1/notes.pdf";
        storage.put(key, &Bytes::from_static(b"%PDF")).await.unwrap();
        assert!(storage.open(key).await.is_ok());
        storage.delete(key).await.unwrap();
        assert!(matches!(storage.open(key).await, Err(Error::NotFound(_))));
        storage.delete(key).await.unwrap();
        let _ = std::fs::remove_dir_all(storage.root());
    }

    #[tokio::test]
    async fn rejects_escaping_keys() {
        let storage = StorageService::new(temp_root());
        for key in ["../etc/passwd", "/abs/path", "a/../../b", ""] {
            assert!(storage.put(key, &Bytes::new()).await.is_err(), "{key}");
        }
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_file_name("../../Tarea 1 (final).pdf"), "Tarea_1__final_.pdf");
        assert_eq!(sanitize_file_name("..."), "file");
        assert_eq!(sanitize_file_name("sílabo.docx"), "sílabo.docx");
    }
}
