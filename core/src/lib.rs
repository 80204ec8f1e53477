pub mod config;
pub mod error;
pub mod memory;
pub mod output;
pub mod protocol;
pub mod util;

// Re-exports for convenience
pub use config::MemoryConfig;
pub use error::{MemoryError, Result};
pub use memory::{Category, MemoryStore};
pub use protocol::{MemoryRequest, OperationResult, RequestHandler};
