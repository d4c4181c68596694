//! REST API client module for the screening service.
//!
//! This module provides the `ApiClient` for screening entities, monitoring
//! transactions and fetching dashboard analytics and audit logs.
//!
//! Every request carries the session's bearer token when one is held; the
//! server decides which endpoints require it.

pub mod client;
pub mod error;
pub mod query;

pub use client::{ApiClient, RequestBody};
pub use error::ApiError;
pub use query::{AuditLogFilter, EntityFilter, QueryParams};
