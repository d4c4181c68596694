//! Core library for the amalie compliance-screening console.
//!
//! - `auth`: bearer-token session, token persistence and identity claims
//! - `api`: HTTP client for the screening, monitoring and analytics service
//! - `models`: typed data contracts returned by the service
//! - `config`: base URL, token store selection and directories

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{DecodeError, Identity, Session, SharedSession};
pub use config::Config;
