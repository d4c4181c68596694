//! Utility functions for formatting and lenient deserialization.

pub mod de;
pub mod format;

pub use format::{capitalize, format_amount, truncate};
