//! Operation handlers
//!
//! [`MemoryStore`] owns the category files, the per-category locks and the
//! configuration. Each operation lives in its own module as an `impl` block
//! on it. Mutating operations hold the category lock from their first load to
//! their persist; reads work on whatever snapshot is on disk.

pub mod delete;
pub mod list;
pub mod prune;
pub mod read;
pub mod search;
pub mod write;

pub use delete::{DeleteOutcome, DeleteParams};
pub use list::{CategoryListing, ListItem, ListOutcome, ListParams};
pub use prune::{CategoryPlan, PruneOutcome, PruneParams, PrunedCategory};
pub use read::{ReadOutcome, ReadParams};
pub use search::{SearchOutcome, SearchParams};
pub use write::{WriteOutcome, WriteParams};

use super::{CategoryLocks, CategoryStore};
use crate::config::MemoryConfig;

pub struct MemoryStore {
    files: CategoryStore,
    locks: CategoryLocks,
    config: MemoryConfig,
}

impl MemoryStore {
    pub fn new(config: MemoryConfig) -> Self {
        let files =
            CategoryStore::new_in(config.base_dir.clone()).with_atomic_writes(config.atomic_writes);
        Self {
            files,
            locks: CategoryLocks::new(),
            config,
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn files(&self) -> &CategoryStore {
        &self.files
    }

    pub fn locks(&self) -> &CategoryLocks {
        &self.locks
    }
}
