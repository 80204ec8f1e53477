pub mod category;
pub mod lock;
pub mod ops;
pub mod schema;
pub mod search;
pub mod store;

pub use category::Category;
pub use lock::{CategoryGuard, CategoryLocks};
pub use ops::MemoryStore;
pub use schema::{CategoryFile, Entry};
pub use search::{FieldWeights, SearchHit};
pub use store::CategoryStore;
