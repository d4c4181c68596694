//! Data contracts for the screening service.
//!
//! This module contains the typed shapes exchanged with the service:
//!
//! - `Percentage`, `RiskStatus`, `RiskLevel`: shared scoring vocabulary
//! - `NewEntity`, `Entity`, `ScreeningResult`: entity screening
//! - `Transaction`, `TransactionAnalysis`: transaction monitoring
//! - `DashboardAnalytics`, `Timeframe`: aggregate analytics
//! - `AuditLogPage`: audit records, passed through uninterpreted
//! - `LoginResponse`: credentials exchange

pub mod analytics;
pub mod audit;
pub mod entity;
pub mod login;
pub mod risk;
pub mod transaction;

pub use analytics::{DailyTrend, DashboardAnalytics, RiskBucket, Summary, Timeframe};
pub use audit::AuditLogPage;
pub use entity::{AiAnalysis, Entity, EntityList, EntityType, NewEntity, ScreeningResult};
pub use login::{LoginRequest, LoginResponse};
pub use risk::{Percentage, RiskLevel, RiskStatus};
pub use transaction::{RiskAnalysis, Transaction, TransactionAnalysis};
