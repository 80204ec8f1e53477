use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MemoryError, Result};
use crate::memory::ops::{
    DeleteParams, ListParams, PruneParams, ReadParams, SearchParams, WriteParams,
};
use crate::memory::Category;

/// One call into the store, tagged by `"operation"`.
///
/// ```json
/// {"operation": "write", "category": "patterns", "key": "p1", "value": "...", "frequency": 3}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum MemoryRequest {
    Read(ReadParams),
    Write(WriteParams),
    Search(SearchParams),
    List(ListParams),
    Delete(DeleteParams),
    Prune(PruneParams),
}

impl MemoryRequest {
    pub const OPERATIONS: [&'static str; 6] = ["read", "write", "search", "list", "delete", "prune"];

    pub fn operation(&self) -> &'static str {
        match self {
            Self::Read(_) => "read",
            Self::Write(_) => "write",
            Self::Search(_) => "search",
            Self::List(_) => "list",
            Self::Delete(_) => "delete",
            Self::Prune(_) => "prune",
        }
    }

    /// Parse a raw request from the caller.
    ///
    /// Category names are checked first so an unknown one is reported as
    /// such rather than as a generic shape error.
    pub fn from_value(raw: Value) -> Result<Self> {
        let Some(object) = raw.as_object() else {
            return Err(invalid("request must be a JSON object"));
        };

        match object.get("operation") {
            Some(Value::String(op)) if Self::OPERATIONS.contains(&op.as_str()) => {}
            Some(Value::String(op)) => return Err(invalid(format!("unknown operation '{}'", op))),
            Some(_) => return Err(invalid("'operation' must be a string")),
            None => return Err(invalid("missing 'operation'")),
        }

        if let Some(Value::String(name)) = object.get("category") {
            name.parse::<Category>()?;
        }
        if let Some(Value::Array(names)) = object.get("categories") {
            for name in names.iter().filter_map(Value::as_str) {
                name.parse::<Category>()?;
            }
        }

        serde_json::from_value(raw).map_err(|e| invalid(e.to_string()))
    }
}

fn invalid(message: impl Into<String>) -> MemoryError {
    MemoryError::InvalidRequest {
        message: message.into(),
    }
}
