//! Entry and category-file schema
//!
//! One schema definition with two entry points: [`validate_file`] is strict
//! and used where caller-supplied data must be trusted before it reaches
//! disk; [`safe_validate_file`] is lenient and used on read paths, falling
//! back to an empty file so a corrupt category never aborts the caller.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::warn;

use super::Category;
use crate::error::{MemoryError, Result};

/// One remembered record within a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: String,
    /// ISO-8601 instant stamped by the store. Absent only on legacy entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    // corrections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrong: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct: Option<String>,

    // patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,

    // decisions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternatives_considered: Option<Vec<String>>,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            timestamp: None,
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

    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }

    /// Names of the category-specific fields this entry carries.
    fn extension_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.wrong.is_some() {
            fields.push("wrong");
        }
        if self.correct.is_some() {
            fields.push("correct");
        }
        if self.frequency.is_some() {
            fields.push("frequency");
        }
        if self.files.is_some() {
            fields.push("files");
        }
        if self.alternatives_considered.is_some() {
            fields.push("alternatives_considered");
        }
        fields
    }
}

/// Full persisted state of one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryFile {
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub updated: Option<String>,
}

impl CategoryFile {
    pub fn find(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }
}

/// Current instant in the persisted format (`2025-01-01T00:00:00.000Z`).
pub fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Fields each category allows beyond the base entry shape.
fn allowed_extensions(category: Category) -> &'static [&'static str] {
    match category {
        Category::Corrections => &["wrong", "correct"],
        Category::Patterns => &["frequency", "files"],
        Category::Decisions => &["alternatives_considered"],
        Category::UserPreferences | Category::ProjectLearnings | Category::ProtocolState => &[],
    }
}

/// Semantic checks on an already-deserialized entry.
pub fn check_entry(category: Category, entry: &Entry) -> Result<()> {
    if category.is_read_only() {
        return Err(MemoryError::validation(format!(
            "{} does not hold entries",
            category
        )));
    }

    if entry.key.trim().is_empty() {
        return Err(MemoryError::validation("key must be a non-empty string"));
    }

    if let Some(ts) = &entry.timestamp {
        if parse_timestamp(ts).is_none() {
            return Err(MemoryError::validation(format!(
                "entry '{}' has an invalid timestamp: {}",
                entry.key, ts
            )));
        }
    }

    let allowed = allowed_extensions(category);
    if let Some(field) = entry
        .extension_fields()
        .into_iter()
        .find(|f| !allowed.contains(f))
    {
        return Err(MemoryError::validation(format!(
            "field '{}' is not valid for category {}",
            field, category
        )));
    }

    match category {
        Category::Corrections => {
            if entry.wrong.is_none() || entry.correct.is_none() {
                return Err(MemoryError::validation(format!(
                    "correction '{}' requires both 'wrong' and 'correct'",
                    entry.key
                )));
            }
        }
        Category::Patterns => {
            if entry.frequency.is_none() {
                return Err(MemoryError::validation(format!(
                    "pattern '{}' requires a non-negative integer 'frequency'",
                    entry.key
                )));
            }
        }
        _ => {}
    }

    Ok(())
}

/// Structural and semantic check of a single entry.
pub fn validate_entry(category: Category, data: &Value) -> Result<Entry> {
    let entry: Entry = serde_json::from_value(data.clone())
        .map_err(|e| MemoryError::validation(format!("malformed {} entry: {}", category, e)))?;
    check_entry(category, &entry)?;
    Ok(entry)
}

/// Strict validation: any deviation is an error.
pub fn validate_file(category: Category, data: &Value) -> Result<CategoryFile> {
    let file: CategoryFile = serde_json::from_value(data.clone())
        .map_err(|e| MemoryError::validation(format!("malformed {} file: {}", category, e)))?;

    if let Some(updated) = &file.updated {
        if parse_timestamp(updated).is_none() {
            return Err(MemoryError::validation(format!(
                "{} file has an invalid 'updated' stamp: {}",
                category, updated
            )));
        }
    }

    let mut seen = HashSet::new();
    for entry in &file.entries {
        check_entry(category, entry)?;
        if !seen.insert(entry.key.as_str()) {
            return Err(MemoryError::validation(format!(
                "duplicate key '{}' in {}",
                entry.key, category
            )));
        }
    }

    Ok(file)
}

/// Lenient validation: the empty default on any failure.
pub fn safe_validate_file(category: Category, data: &Value) -> CategoryFile {
    match validate_file(category, data) {
        Ok(file) => file,
        Err(e) => {
            warn!("Discarding unreadable {} data: {}", category, e);
            CategoryFile::default()
        }
    }
}
