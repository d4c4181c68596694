//! Transaction monitoring contracts.

use serde::{Deserialize, Serialize};

use super::risk::{Percentage, RiskLevel, RiskStatus};
use crate::utils::{de, format_amount};

/// Currency used when the submitter does not choose one
pub const DEFAULT_CURRENCY: &str = "USD";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// A transfer between two parties, as submitted for monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub from_entity: String,
    pub to_entity: String,
    #[serde(deserialize_with = "de::number_or_numeric_string")]
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub description: String,
}

impl Transaction {
    pub fn new(from_entity: impl Into<String>, to_entity: impl Into<String>, amount: f64) -> Self {
        Self {
            from_entity: from_entity.into(),
            to_entity: to_entity.into(),
            amount,
            currency: default_currency(),
            description: String::new(),
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// "12,500.00 USD"
    pub fn amount_display(&self) -> String {
        format_amount(self.amount, &self.currency)
    }
}

/// The service's verdict on a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysis {
    #[cfg_attr(feature = "ts", ts(type = "number"))]
    pub risk_score: Percentage,
    pub status: RiskStatus,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl RiskAnalysis {
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score)
    }
}

/// Response of a monitoring request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TransactionAnalysis {
    pub transaction: Transaction,
    pub analysis: RiskAnalysis,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_transaction_defaults() {
        let tx = Transaction::new("Acme Corp", "Globex", 12500.0);
        assert_eq!(tx.currency, "USD");
        assert_eq!(
            serde_json::to_value(&tx).unwrap(),
            json!({
                "fromEntity": "Acme Corp",
                "toEntity": "Globex",
                "amount": 12500.0,
                "currency": "USD",
                "description": ""
            })
        );
        assert_eq!(tx.amount_display(), "12,500.00 USD");
    }

    #[test]
    fn test_parse_transaction_analysis() {
        let body = json!({
            "transaction": {
                "fromEntity": "Acme Corp",
                "toEntity": "Globex",
                "amount": "9800.25",
                "currency": "EUR",
                "description": "Invoice 4471"
            },
            "analysis": {"riskScore": 45, "status": "warning", "flags": ["structuring"]}
        });
        let result: TransactionAnalysis = serde_json::from_value(body).unwrap();

        assert_eq!(result.transaction.amount, 9800.25);
        assert_eq!(result.transaction.currency, "EUR");
        assert_eq!(result.analysis.risk_score.value(), 45);
        assert_eq!(result.analysis.risk_level(), RiskLevel::Medium);
        assert_eq!(result.analysis.status, RiskStatus::Warning);
        assert_eq!(result.analysis.details.get("flags"), Some(&json!(["structuring"])));
    }

    #[test]
    fn test_analysis_requires_status() {
        let body = json!({
            "transaction": {"fromEntity": "a", "toEntity": "b", "amount": 1},
            "analysis": {"riskScore": 10}
        });
        assert!(serde_json::from_value::<TransactionAnalysis>(body).is_err());
    }
}
