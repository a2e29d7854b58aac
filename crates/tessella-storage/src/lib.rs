//! Storage abstraction for the Tessella CRM engine: the record store
//! collaborator trait plus query translation types.

pub mod error;
pub mod query;
pub mod traits;

pub use error::StorageError;
pub use query::{
    DEFAULT_PER_PAGE, ListParams, MAX_PER_PAGE, Pagination, RecordFilter, RecordPage, RecordQuery,
    SortKey, SortOrder,
};
pub use traits::RecordStore;
