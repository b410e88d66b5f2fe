use std::{io::ErrorKind, marker::PhantomData, path::PathBuf};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::{fs as async_fs, sync::Mutex};
use uuid::Uuid;
use crate::models::errors::AppError;

/// One JSON document on disk, read and rewritten wholesale.
///
/// Every read-modify-write cycle goes through [`JsonDocument::mutate`],
/// which holds the document's mutex for the whole cycle.
#[derive(Debug)]
pub struct JsonDocument<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    /// Read the document for display. Anything that cannot be read as `T`
    /// is shown as an empty document.
    pub async fn load(&self) -> T {
        self.read().await.unwrap_or_else(|e| {
            tracing::warn!("Serving empty document in place of {}: {}", self.path.display(), e);
            T::default()
        })
    }

    /// Read the document for a rewrite.
    ///
    /// A missing file or bytes that are not JSON at all count as an empty
    /// document. A file that cannot be read, or JSON that does not fit `T`,
    /// is a `StorageError` so the rewrite never clobbers it.
    async fn read(&self) -> Result<T, AppError> {
        let raw = match async_fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => {
                return Err(AppError::storage_failed(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let value: Value = match serde_json::from_slice(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Ignoring unparsable document {}: {}", self.path.display(), e);
                return Ok(T::default());
            }
        };

        serde_json::from_value(value).map_err(|e| {
            AppError::storage_failed(format!(
                "{} does not have the expected layout: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Rewrite the whole document, pretty-printed.
    ///
    /// The bytes go to a sibling temp file first and are renamed over the
    /// target, so a concurrent reader sees either the old or the new file.
    pub async fn save(&self, value: &T) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(value)
            .map_err(|e| AppError::storage_failed(format!("Failed to serialize document: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::storage_failed(format!("Failed to create data directory: {}", e)))?;
        }

        let temp_path = self.temp_path();
        async_fs::write(&temp_path, &json)
            .await
            .map_err(|e| AppError::storage_failed(format!("Failed to write {}: {}", temp_path.display(), e)))?;

        if let Err(e) = async_fs::rename(&temp_path, &self.path).await {
            let _ = async_fs::remove_file(&temp_path).await;
            return Err(AppError::storage_failed(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            )));
        }

        tracing::debug!("Persisted document: {}", self.path.display());
        Ok(())
    }

    /// Read, apply `f`, and persist if `f` succeeded. Nothing is written
    /// when the read or `f` fails.
    pub async fn mutate<R, F>(&self, f: F) -> Result<R, AppError>
    where
        F: FnOnce(&mut T) -> Result<R, AppError>,
    {
        let _guard = self.write_lock.lock().await;

        let mut document = self.read().await?;
        let result = f(&mut document)?;
        self.save(&document).await?;

        Ok(result)
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.json".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()))
    }
}
