use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

use super::MemoryStore;
use crate::error::Result;
use crate::memory::schema::CategoryFile;
use crate::memory::Category;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PruneParams {
    /// Restrict the sweep to one category
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub max_age_days: Option<u32>,
    #[serde(default)]
    pub max_entries: Option<usize>,
    /// Defaults to `true`
    #[serde(default)]
    pub dry_run: Option<bool>,
    #[serde(default)]
    pub confirm: bool,
}

/// Keys scheduled for removal in one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPlan {
    pub category: Category,
    pub keys: Vec<String>,
    /// Number of scheduled keys, also when `keys` is a capped preview
    pub count: usize,
}

impl CategoryPlan {
    fn capped(&self, cap: usize) -> Self {
        Self {
            category: self.category,
            keys: self.keys.iter().take(cap).cloned().collect(),
            count: self.count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrunedCategory {
    pub category: Category,
    pub removed: usize,
    pub remaining: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PruneOutcome {
    NothingToPrune,
    Preview {
        plan: Vec<CategoryPlan>,
        total: usize,
    },
    /// Nothing changed; resubmit with `confirm: true` to apply `plan`.
    PendingConfirmation {
        plan: Vec<CategoryPlan>,
        total: usize,
    },
    Pruned {
        categories: Vec<PrunedCategory>,
        total: usize,
    },
}

/// Keys of entries older than `cutoff` or ranked past `max_entries`.
///
/// Entries are ranked newest first. Entries without a timestamp are never
/// scheduled and do not take up a rank.
pub fn plan_removals(file: &CategoryFile, cutoff: DateTime<Utc>, max_entries: usize) -> Vec<String> {
    let mut dated: Vec<(DateTime<Utc>, &str)> = file
        .entries
        .iter()
        .filter_map(|e| e.parsed_timestamp().map(|ts| (ts, e.key.as_str())))
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0));

    dated
        .into_iter()
        .enumerate()
        .filter(|(rank, (ts, _))| *ts < cutoff || *rank >= max_entries)
        .map(|(_, (_, key))| key.to_string())
        .collect()
}

/// Instant before which entries count as stale.
///
/// An age reaching past the representable range means nothing is too old.
pub fn age_cutoff(now: DateTime<Utc>, max_age_days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(max_age_days))
        .and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl MemoryStore {
    /// Age- and count-based cleanup, one category at a time.
    ///
    /// A committed sweep locks, reloads and re-plans each category on its
    /// own. A failure stops the sweep; categories already handled stay
    /// pruned.
    pub async fn prune(&self, params: PruneParams) -> Result<PruneOutcome> {
        let scope = match params.category {
            Some(category) => vec![category.ensure_writable()?],
            None => Category::MUTABLE.to_vec(),
        };
        let defaults = &self.config.prune;
        let max_age_days = params.max_age_days.unwrap_or(defaults.max_age_days);
        let max_entries = params.max_entries.unwrap_or(defaults.max_entries);
        let dry_run = params.dry_run.unwrap_or(true);
        let cutoff = age_cutoff(Utc::now(), max_age_days);

        let mut plan = Vec::new();
        for category in scope {
            let file = self.files.load(category).await?;
            let keys = plan_removals(&file, cutoff, max_entries);
            if !keys.is_empty() {
                plan.push(CategoryPlan {
                    category,
                    count: keys.len(),
                    keys,
                });
            }
        }
        let total: usize = plan.iter().map(|p| p.count).sum();

        if plan.is_empty() {
            return Ok(PruneOutcome::NothingToPrune);
        }
        if dry_run {
            let cap = defaults.preview_cap;
            return Ok(PruneOutcome::Preview {
                plan: plan.iter().map(|p| p.capped(cap)).collect(),
                total,
            });
        }
        if !params.confirm {
            return Ok(PruneOutcome::PendingConfirmation { plan, total });
        }

        let mut pruned = Vec::new();
        for category in plan.iter().map(|p| p.category) {
            let _guard = self.locks.acquire(category).await;
            let mut file = self.files.load(category).await?;
            let doomed: HashSet<String> = plan_removals(&file, cutoff, max_entries)
                .into_iter()
                .collect();
            if doomed.is_empty() {
                continue;
            }

            file.entries.retain(|e| !doomed.contains(&e.key));
            self.files.persist(category, &mut file).await?;

            info!("Pruned {} entries from {}", doomed.len(), category);
            pruned.push(PrunedCategory {
                category,
                removed: doomed.len(),
                remaining: file.entries.len(),
            });
        }

        Ok(PruneOutcome::Pruned {
            total: pruned.iter().map(|p| p.removed).sum(),
            categories: pruned,
        })
    }
}
