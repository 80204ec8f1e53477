use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::MemoryStore;
use crate::error::Result;
use crate::memory::schema::{timestamp_now, validate_entry, Entry};
use crate::memory::Category;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteParams {
    pub category: Category,
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub wrong: Option<String>,
    #[serde(default)]
    pub correct: Option<String>,
    #[serde(default)]
    pub frequency: Option<u64>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub alternatives_considered: Option<Vec<String>>,
}

impl WriteParams {
    pub fn new(category: Category, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            category,
            key: key.into(),
            value: value.into(),
            reason: None,
            context: None,
            metadata: None,
            wrong: None,
            correct: None,
            frequency: None,
            files: None,
            alternatives_considered: None,
        }
    }

    fn into_entry(self) -> Entry {
        Entry {
            key: self.key,
            value: self.value,
            timestamp: Some(timestamp_now()),
            reason: self.reason,
            context: self.context,
            metadata: self.metadata,
            wrong: self.wrong,
            correct: self.correct,
            frequency: self.frequency,
            files: self.files,
            alternatives_considered: self.alternatives_considered,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteOutcome {
    pub category: Category,
    /// `true` for a new key, `false` when an existing entry was replaced
    pub created: bool,
    pub entry: Entry,
}

/// Extension fields the caller left out are kept from the stored entry, so
/// an update does not have to restate e.g. a pattern's frequency.
fn carry_extensions(entry: &mut Entry, previous: &Entry) {
    if entry.wrong.is_none() {
        entry.wrong = previous.wrong.clone();
    }
    if entry.correct.is_none() {
        entry.correct = previous.correct.clone();
    }
    if entry.frequency.is_none() {
        entry.frequency = previous.frequency;
    }
    if entry.files.is_none() {
        entry.files = previous.files.clone();
    }
    if entry.alternatives_considered.is_none() {
        entry.alternatives_considered = previous.alternatives_considered.clone();
    }
}

impl MemoryStore {
    /// Create or replace one entry.
    pub async fn write(&self, params: WriteParams) -> Result<WriteOutcome> {
        let category = params.category.ensure_writable()?;

        let _guard = self.locks.acquire(category).await;
        let mut file = self.files.load(category).await?;

        let existing = file.position(&params.key);
        let mut entry = params.into_entry();
        if let Some(idx) = existing {
            carry_extensions(&mut entry, &file.entries[idx]);
        }
        let entry = validate_entry(category, &serde_json::to_value(&entry)?)?;

        match existing {
            Some(idx) => file.entries[idx] = entry.clone(),
            None => file.entries.push(entry.clone()),
        }
        self.files.persist(category, &mut file).await?;

        info!(
            "{} '{}' in {}",
            if existing.is_some() { "Updated" } else { "Created" },
            entry.key,
            category
        );

        Ok(WriteOutcome {
            category,
            created: existing.is_none(),
            entry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::temp_store;
    use super::*;
    use crate::error::MemoryError;

    #[tokio::test]
    async fn new_key_appends_existing_key_replaces() {
        let (_dir, store) = temp_store();

        let first = store
            .write(WriteParams::new(Category::ProjectLearnings, "build", "use cargo nextest"))
            .await
            .unwrap();
        assert!(first.created);

        let second = store
            .write(WriteParams::new(Category::ProjectLearnings, "build", "use cargo test"))
            .await
            .unwrap();
        assert!(!second.created);

        let file = store.files().load(Category::ProjectLearnings).await.unwrap();
        assert_eq!(file.entries.len(), 1);
        assert_eq!(file.entries[0].value, "use cargo test");
        assert!(file.updated.is_some());
    }

    #[tokio::test]
    async fn pattern_update_keeps_frequency() {
        let (_dir, store) = temp_store();

        let mut params = WriteParams::new(Category::Patterns, "p1", "uses early return");
        params.frequency = Some(3);
        store.write(params).await.unwrap();

        let outcome = store
            .write(WriteParams::new(Category::Patterns, "p1", "uses guard clauses"))
            .await
            .unwrap();
        assert_eq!(outcome.entry.value, "uses guard clauses");
        assert_eq!(outcome.entry.frequency, Some(3));
    }

    #[tokio::test]
    async fn invalid_entry_never_reaches_disk() {
        let (_dir, store) = temp_store();

        let err = store
            .write(WriteParams::new(Category::Patterns, "p1", "no frequency"))
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::Validation { .. }));
        assert!(!store.files().path_for(Category::Patterns).exists());

        let err = store
            .write(WriteParams::new(Category::Decisions, "  ", "blank key"))
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::Validation { .. }));
    }

    #[tokio::test]
    async fn protocol_state_is_rejected_without_touching_disk() {
        let (_dir, store) = temp_store();

        let err = store
            .write(WriteParams::new(Category::ProtocolState, "x", "y"))
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::ReadOnlyViolation { .. }));
        assert!(!store.locks().is_held(Category::ProtocolState));
        assert!(!store.files().path_for(Category::ProtocolState).exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_replaced_by_next_write() {
        let (dir, store) = temp_store();
        let path = dir.path().join("corrections.json");
        std::fs::write(&path, "[[[").unwrap();

        let mut params = WriteParams::new(Category::Corrections, "c1", "spelling");
        params.wrong = Some("recieve".to_string());
        params.correct = Some("receive".to_string());
        store.write(params).await.unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["entries"][0]["key"], "c1");
        assert_eq!(raw["entries"][0]["correct"], "receive");
    }

    #[tokio::test]
    async fn concurrent_writes_to_one_category_are_serialized() {
        let (_dir, store) = temp_store();
        let store = std::sync::Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .write(WriteParams::new(
                        Category::UserPreferences,
                        format!("k{}", i % 4),
                        format!("v{}", i),
                    ))
                    .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let file = store.files().load(Category::UserPreferences).await.unwrap();
        assert_eq!(file.entries.len(), 4);
    }
}
