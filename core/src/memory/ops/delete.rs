use serde::{Deserialize, Serialize};
use tracing::info;

use super::MemoryStore;
use crate::error::{MemoryError, Result};
use crate::memory::schema::Entry;
use crate::memory::Category;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteParams {
    pub category: Category,
    pub key: String,
    /// Without it the call only reports what would be removed
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Nothing changed; resubmit with `confirm: true` to remove `entry`.
    PendingConfirmation { category: Category, entry: Entry },
    Deleted {
        category: Category,
        entry: Entry,
        remaining: usize,
    },
}

impl MemoryStore {
    /// Two-phase removal of one entry.
    ///
    /// The pending phase looks the key up without locking and mutates
    /// nothing. The committed phase re-locates the key under the lock, since
    /// it may have changed or vanished in between.
    pub async fn delete(&self, params: DeleteParams) -> Result<DeleteOutcome> {
        let category = params.category.ensure_writable()?;
        let not_found = || MemoryError::NotFound {
            category,
            key: params.key.clone(),
        };

        if !params.confirm {
            let file = self.files.load(category).await?;
            let entry = file.find(&params.key).cloned().ok_or_else(not_found)?;
            return Ok(DeleteOutcome::PendingConfirmation { category, entry });
        }

        let _guard = self.locks.acquire(category).await;
        let mut file = self.files.load(category).await?;
        let idx = file.position(&params.key).ok_or_else(not_found)?;
        let entry = file.entries.remove(idx);
        self.files.persist(category, &mut file).await?;

        info!("Deleted '{}' from {}", entry.key, category);

        Ok(DeleteOutcome::Deleted {
            category,
            entry,
            remaining: file.entries.len(),
        })
    }
}
