//! PostgreSQL backend for the tracker's table store
//!
//! Tables and rows are stored generically (`tracker_tables`,
//! `tracker_rows`) so new bucket tables appear without migrations, just as
//! they do with the in-memory and file backends.

pub mod connection;
pub mod error;
pub mod schema;
pub mod store;

pub use connection::DatabasePool;
pub use error::{DatabaseError, DatabaseResult};
pub use store::PgTableStore;
