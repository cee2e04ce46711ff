//! Common error handling utilities for the CarePortals latest-state tracker
//!
//! This crate provides the error enum shared by the binary boundary, the
//! stable error codes written into error-sink tables, and the context record
//! that travels with an error into the sink.
//!
//! # Error Categories
//!
//! - **StorageError**: the table store could not be opened
//! - **ConfigError** / **ServerError** / **NetworkError**: startup and runtime
//!
//! Per-webhook failures never reach this enum; they are recorded in the
//! category's error table under the codes in [`codes`].
//!
//! # Example
//!
//! ```rust
//! use error_common::{WebhookError, ErrorContext, codes};
//!
//! let err = WebhookError::ConfigError("server.port must be non-zero".to_string());
//! assert_eq!(err.code(), codes::system::CONFIGURATION);
//!
//! let context = ErrorContext::new()
//!     .with_category("page_tracker")
//!     .add_context("trigger", "active");
//! assert_eq!(context.category.as_deref(), Some("page_tracker"));
//! ```

pub mod types;
pub mod context;
pub mod codes;

pub use types::*;
pub use context::*;
