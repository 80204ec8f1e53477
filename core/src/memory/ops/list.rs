use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::MemoryStore;
use crate::error::{MemoryError, Result};
use crate::memory::schema::CategoryFile;
use crate::memory::Category;
use crate::util::truncate_preview;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub include_timestamps: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub key: String,
    pub preview: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryListing {
    pub items: Vec<ListItem>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ListOutcome {
    Category {
        category: Category,
        #[serde(flatten)]
        listing: CategoryListing,
    },
    All {
        categories: BTreeMap<Category, CategoryListing>,
        total: usize,
    },
}

impl MemoryStore {
    pub async fn list(&self, params: ListParams) -> Result<ListOutcome> {
        match params.category {
            Some(category) if category.is_read_only() => Err(MemoryError::InvalidRequest {
                message: format!("{} is a single record, use read instead", category),
            }),
            Some(category) => {
                let file = self.files.load(category).await?;
                Ok(ListOutcome::Category {
                    category,
                    listing: self.listing(file, params.include_timestamps),
                })
            }
            None => {
                let mut categories = BTreeMap::new();
                let mut total = 0;
                for category in Category::MUTABLE {
                    let file = self.files.load(category).await?;
                    let listing = self.listing(file, params.include_timestamps);
                    total += listing.count;
                    categories.insert(category, listing);
                }
                Ok(ListOutcome::All { categories, total })
            }
        }
    }

    fn listing(&self, file: CategoryFile, include_timestamps: bool) -> CategoryListing {
        let items: Vec<ListItem> = file
            .entries
            .into_iter()
            .map(|e| ListItem {
                preview: truncate_preview(&e.value, self.config.preview_chars),
                key: e.key,
                timestamp: if include_timestamps { e.timestamp } else { None },
            })
            .collect();
        CategoryListing {
            count: items.len(),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::temp_store;
    use super::super::WriteParams;
    use super::*;

    #[tokio::test]
    async fn grouped_listing_counts_every_category() {
        let (_dir, store) = temp_store();
        store
            .write(WriteParams::new(Category::UserPreferences, "a", "short"))
            .await
            .unwrap();
        store
            .write(WriteParams::new(Category::UserPreferences, "b", "x".repeat(80)))
            .await
            .unwrap();
        store
            .write(WriteParams::new(Category::Decisions, "c", "chosen"))
            .await
            .unwrap();

        match store.list(ListParams::default()).await.unwrap() {
            ListOutcome::All { categories, total } => {
                assert_eq!(total, 3);
                let prefs = &categories[&Category::UserPreferences];
                assert_eq!(prefs.count, 2);
                assert_eq!(prefs.items[1].preview, format!("{}...", "x".repeat(50)));
                assert!(prefs.items[0].timestamp.is_none());
                assert_eq!(categories[&Category::Patterns].count, 0);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn flat_listing_with_timestamps() {
        let (_dir, store) = temp_store();
        store
            .write(WriteParams::new(Category::Decisions, "c", "chosen"))
            .await
            .unwrap();

        match store
            .list(ListParams {
                category: Some(Category::Decisions),
                include_timestamps: true,
            })
            .await
            .unwrap()
        {
            ListOutcome::Category { category, listing } => {
                assert_eq!(category, Category::Decisions);
                assert_eq!(listing.count, 1);
                assert_eq!(listing.items[0].preview, "chosen");
                assert!(listing.items[0].timestamp.is_some());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn protocol_state_cannot_be_listed() {
        let (_dir, store) = temp_store();
        let err = store
            .list(ListParams {
                category: Some(Category::ProtocolState),
                include_timestamps: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::InvalidRequest { .. }));
    }
}
