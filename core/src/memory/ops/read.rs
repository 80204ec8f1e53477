use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::MemoryStore;
use crate::error::Result;
use crate::memory::schema::{CategoryFile, Entry};
use crate::memory::Category;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadParams {
    /// Omit to read every category
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ReadOutcome {
    Category {
        category: Category,
        entries: Vec<Entry>,
    },
    ProtocolState {
        state: Value,
    },
    All {
        categories: BTreeMap<Category, Vec<Entry>>,
        protocol_state: Value,
    },
}

fn select(file: CategoryFile, key: Option<&str>, limit: usize) -> Vec<Entry> {
    file.entries
        .into_iter()
        .filter(|e| key.map_or(true, |k| e.key == k))
        .take(limit)
        .collect()
}

fn select_state(state: Value, key: Option<&str>) -> Value {
    match key {
        Some(k) => state.get(k).cloned().unwrap_or(Value::Null),
        None => state,
    }
}

impl MemoryStore {
    /// Snapshot read; takes no lock.
    pub async fn read(&self, params: ReadParams) -> Result<ReadOutcome> {
        let limit = params.limit.unwrap_or(self.config.read_limit);
        let key = params.key.as_deref();

        match params.category {
            Some(Category::ProtocolState) => Ok(ReadOutcome::ProtocolState {
                state: select_state(self.files.load_protocol_state().await, key),
            }),
            Some(category) => {
                let file = self.files.load(category).await?;
                Ok(ReadOutcome::Category {
                    category,
                    entries: select(file, key, limit),
                })
            }
            None => {
                let mut categories = BTreeMap::new();
                for category in Category::MUTABLE {
                    let file = self.files.load(category).await?;
                    categories.insert(category, select(file, key, limit));
                }
                Ok(ReadOutcome::All {
                    categories,
                    protocol_state: select_state(self.files.load_protocol_state().await, key),
                })
            }
        }
    }
}
