use serde::Serialize;
use serde_json::{json, Value};

use crate::memory::Category;

/// Operation listing handed to callers that discover the store at runtime.
#[derive(Debug, Clone, Serialize)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

impl OperationDescriptor {
    /// Format for inclusion in a prompt or help text
    pub fn format_for_prompt(&self) -> String {
        let required = self.input_schema["required"]
            .as_array()
            .map(|r| {
                r.iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        if required.is_empty() {
            format!("- `{}`: {}", self.name, self.description)
        } else {
            format!(
                "- `{}`: {}\n  Requires: {}",
                self.name, self.description, required
            )
        }
    }
}

fn category_names(categories: &[Category]) -> Vec<&'static str> {
    categories.iter().map(Category::as_str).collect()
}

pub fn operation_descriptors() -> Vec<OperationDescriptor> {
    let any_category = json!({ "type": "string", "enum": category_names(&Category::ALL) });
    let mutable_category = json!({ "type": "string", "enum": category_names(&Category::MUTABLE) });
    let string_list = json!({ "type": "array", "items": { "type": "string" } });

    vec![
        OperationDescriptor {
            name: "read",
            description: "Read stored memories. Omit category to read everything including protocol-state.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "category": any_category,
                    "key": { "type": "string" },
                    "limit": { "type": "integer", "minimum": 0 }
                },
                "required": []
            }),
        },
        OperationDescriptor {
            name: "write",
            description: "Create or replace a memory by key.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "category": mutable_category,
                    "key": { "type": "string", "minLength": 1 },
                    "value": { "type": "string" },
                    "reason": { "type": "string" },
                    "context": { "type": "string" },
                    "metadata": { "type": "object" },
                    "wrong": { "type": "string", "description": "corrections only" },
                    "correct": { "type": "string", "description": "corrections only" },
                    "frequency": { "type": "integer", "minimum": 0, "description": "patterns only" },
                    "files": string_list,
                    "alternatives_considered": string_list
                },
                "required": ["category", "key", "value"]
            }),
        },
        OperationDescriptor {
            name: "search",
            description: "Rank memories against a query, typo tolerant unless fuzzy is false.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                    "categories": { "type": "array", "items": mutable_category },
                    "fuzzy": { "type": "boolean" },
                    "threshold": { "type": "number", "minimum": 0, "maximum": 1 },
                    "limit": { "type": "integer", "minimum": 0 }
                },
                "required": ["query"]
            }),
        },
        OperationDescriptor {
            name: "list",
            description: "List keys with a short preview of each value.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "category": mutable_category,
                    "include_timestamps": { "type": "boolean" }
                },
                "required": []
            }),
        },
        OperationDescriptor {
            name: "delete",
            description: "Delete one memory. Without confirm: true only shows what would be removed.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "category": mutable_category,
                    "key": { "type": "string" },
                    "confirm": { "type": "boolean" }
                },
                "required": ["category", "key"]
            }),
        },
        OperationDescriptor {
            name: "prune",
            description: "Remove memories older than max_age_days or beyond the newest max_entries. Dry run unless dry_run is false and confirm is true.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "category": mutable_category,
                    "max_age_days": { "type": "integer", "minimum": 0 },
                    "max_entries": { "type": "integer", "minimum": 0 },
                    "dry_run": { "type": "boolean" },
                    "confirm": { "type": "boolean" }
                },
                "required": []
            }),
        },
    ]
}
