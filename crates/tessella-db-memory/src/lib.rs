//! In-memory storage backend for the Tessella CRM engine.
//!
//! Provides lock-free concurrent access via `papaya::HashMap`, full CRUD, and
//! query execution with filtering, sorting, and pagination.

pub mod query;
pub mod storage;

pub use query::run_query;
pub use storage::InMemoryStore;
