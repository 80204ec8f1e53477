use serde::{Deserialize, Serialize};

use super::MemoryStore;
use crate::error::{MemoryError, Result};
use crate::memory::search::{rank, Matcher, SearchHit};
use crate::memory::Category;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    pub query: String,
    /// Omit to search every entry-holding category
    #[serde(default)]
    pub categories: Option<Vec<Category>>,
    #[serde(default)]
    pub fuzzy: Option<bool>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub query: String,
    pub fuzzy: bool,
    pub hits: Vec<SearchHit>,
}

impl MemoryStore {
    pub async fn search(&self, params: SearchParams) -> Result<SearchOutcome> {
        let defaults = &self.config.search;
        let fuzzy = params.fuzzy.unwrap_or(defaults.fuzzy);
        let threshold = params.threshold.unwrap_or(defaults.threshold);
        let limit = params.limit.unwrap_or(defaults.limit);

        if !(0.0..=1.0).contains(&threshold) {
            return Err(MemoryError::validation(format!(
                "threshold must be between 0 and 1, got {}",
                threshold
            )));
        }

        let mut scope: Vec<Category> = params
            .categories
            .unwrap_or_else(|| Category::MUTABLE.to_vec())
            .into_iter()
            .filter(|c| !c.is_read_only())
            .collect();
        scope.sort();
        scope.dedup();

        let query = params.query.trim().to_string();
        let matcher = if fuzzy {
            Matcher::Fuzzy {
                threshold,
                weights: defaults.weights.clone(),
            }
        } else {
            Matcher::Exact
        };

        let mut hits = Vec::new();
        if !query.is_empty() {
            for category in scope {
                let file = self.files.load(category).await?;
                hits.extend(file.entries.into_iter().filter_map(|entry| {
                    matcher.score(&query, &entry).map(|score| SearchHit {
                        category,
                        entry,
                        score,
                    })
                }));
            }
        }

        Ok(SearchOutcome {
            query,
            fuzzy,
            hits: rank(hits, limit),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::temp_store;
    use super::super::WriteParams;
    use super::*;

    async fn seed(store: &MemoryStore) {
        let rows = [
            (Category::ProjectLearnings, "auth", "JWT authentication lives in the gateway"),
            (Category::ProjectLearnings, "db", "Postgres migrations run on deploy"),
            (Category::UserPreferences, "style", "Prefers authentic commit messages"),
            (Category::Decisions, "queue", "Chose NATS over Kafka"),
        ];
        for (category, key, value) in rows {
            store
                .write(WriteParams::new(category, key, value))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn fuzzy_search_tolerates_typos() {
        let (_dir, store) = temp_store();
        seed(&store).await;

        let outcome = store
            .search(SearchParams {
                query: "athentication".to_string(),
                categories: Some(vec![Category::ProjectLearnings]),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(outcome.hits[0].entry.key, "auth");
        assert!(outcome.hits[0].score < 1.0);
        assert!(outcome.hits[0].score >= 0.4);
        assert!(outcome.hits.iter().all(|h| h.category == Category::ProjectLearnings));
    }

    #[tokio::test]
    async fn exact_search_scores_one() {
        let (_dir, store) = temp_store();
        seed(&store).await;

        let outcome = store
            .search(SearchParams {
                query: "KAFKA".to_string(),
                fuzzy: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].category, Category::Decisions);
        assert_eq!(outcome.hits[0].score, 1.0);
    }

    #[tokio::test]
    async fn raising_threshold_never_adds_results() {
        let (_dir, store) = temp_store();
        seed(&store).await;

        let mut previous = usize::MAX;
        for threshold in [0.0, 0.2, 0.4, 0.6, 0.8, 1.0] {
            let count = store
                .search(SearchParams {
                    query: "authentic".to_string(),
                    threshold: Some(threshold),
                    limit: Some(100),
                    ..Default::default()
                })
                .await
                .unwrap()
                .hits
                .len();
            assert!(count <= previous);
            previous = count;
        }
    }

    #[tokio::test]
    async fn smaller_limit_is_a_prefix() {
        let (_dir, store) = temp_store();
        seed(&store).await;

        let search = |limit| SearchParams {
            query: "the".to_string(),
            threshold: Some(0.0),
            limit: Some(limit),
            ..Default::default()
        };
        let all = store.search(search(100)).await.unwrap().hits;
        let top = store.search(search(2)).await.unwrap().hits;
        assert_eq!(&all[..top.len()], &top[..]);
    }

    #[tokio::test]
    async fn empty_query_and_protocol_state_yield_nothing() {
        let (_dir, store) = temp_store();
        seed(&store).await;

        let outcome = store
            .search(SearchParams {
                query: "  ".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(outcome.hits.is_empty());

        let outcome = store
            .search(SearchParams {
                query: "anything".to_string(),
                categories: Some(vec![Category::ProtocolState]),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(outcome.hits.is_empty());
    }

    #[tokio::test]
    async fn rejects_threshold_out_of_range() {
        let (_dir, store) = temp_store();
        let err = store
            .search(SearchParams {
                query: "x".to_string(),
                threshold: Some(1.5),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::Validation { .. }));
    }
}
