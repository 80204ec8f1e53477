use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::schema::{safe_validate_file, timestamp_now, CategoryFile};
use super::Category;
use crate::error::{MemoryError, Result};

/// Maps categories to JSON files under one base directory.
pub struct CategoryStore {
    root_dir: PathBuf,
    atomic_writes: bool,
}

impl CategoryStore {
    pub fn new_in(root_dir: PathBuf) -> Self {
        Self {
            root_dir,
            atomic_writes: true,
        }
    }

    pub fn with_atomic_writes(mut self, enabled: bool) -> Self {
        self.atomic_writes = enabled;
        self
    }

    pub fn path_for(&self, category: Category) -> PathBuf {
        self.root_dir.join(category.file_name())
    }

    /// Load a category file.
    ///
    /// A missing, empty, unparsable or invalid file yields the empty default.
    /// Corrupt content is logged and left on disk untouched. Only I/O failures
    /// other than "not found" are returned, since a write built on top of an
    /// unreadable file would silently drop its contents.
    pub async fn load(&self, category: Category) -> Result<CategoryFile> {
        let path = self.path_for(category);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CategoryFile::default());
            }
            Err(e) => return Err(MemoryError::io(path, e)),
        };

        if content.trim().is_empty() {
            return Ok(CategoryFile::default());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(data) => Ok(safe_validate_file(category, &data)),
            Err(e) => {
                warn!("Corrupt category file {:?}, treating as empty: {}", path, e);
                Ok(CategoryFile::default())
            }
        }
    }

    /// Stamp `updated` and replace the whole category file.
    pub async fn persist(&self, category: Category, file: &mut CategoryFile) -> Result<()> {
        fs::create_dir_all(&self.root_dir)
            .await
            .map_err(|e| MemoryError::io(&self.root_dir, e))?;

        file.updated = Some(timestamp_now());
        let content = serde_json::to_string_pretty(file)?;
        let path = self.path_for(category);

        if self.atomic_writes {
            atomic_write(&path, content.as_bytes()).await?;
        } else {
            fs::write(&path, content.as_bytes())
                .await
                .map_err(|e| MemoryError::io(&path, e))?;
        }

        debug!(
            "Persisted {} ({} entries) to {:?}",
            category,
            file.entries.len(),
            path
        );
        Ok(())
    }

    /// Raw `protocol-state` record, or `null` when absent or unreadable.
    pub async fn load_protocol_state(&self) -> Value {
        let path = self.path_for(Category::ProtocolState);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Could not read {:?}: {}", path, e);
                }
                return Value::Null;
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Corrupt protocol state {:?}, ignoring: {}", path, e);
            Value::Null
        })
    }
}

async fn atomic_write(dest: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = dest.with_extension(format!("json.tmp.{}", uuid::Uuid::new_v4()));

    if let Err(write_err) = fs::write(&tmp, bytes).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(MemoryError::io(&tmp, write_err));
    }

    if let Err(rename_err) = fs::rename(&tmp, dest).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(MemoryError::io(dest, rename_err));
    }

    Ok(())
}
