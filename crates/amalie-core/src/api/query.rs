//! Query-string filters for listing endpoints.
//!
//! Keys are kept sorted so the same filter always produces the same URL.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use url::form_urlencoded;

use crate::models::{EntityType, RiskStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.insert(key.into(), value.to_string());
    }

    pub fn insert_opt<V: ToString>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// URL-encoded form (`a=1&b=x+y`), without a leading `?`
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }

    /// Inverse of [`to_query_string`](Self::to_query_string). A repeated
    /// key keeps its last value.
    pub fn parse(query: &str) -> Self {
        form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .into_owned()
            .collect()
    }

    /// Append to an endpoint path, omitting the `?` when there is nothing to add
    pub fn append_to(&self, endpoint: &str) -> String {
        if self.is_empty() {
            endpoint.to_string()
        } else {
            format!("{}?{}", endpoint, self.to_query_string())
        }
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl<K: Into<String>, V: ToString, const N: usize> From<[(K, V); N]> for QueryParams {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Filters accepted by the entity listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityFilter {
    pub country: Option<String>,
    pub entity_type: Option<EntityType>,
    pub status: Option<RiskStatus>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<EntityFilter> for QueryParams {
    fn from(filter: EntityFilter) -> Self {
        let mut params = QueryParams::new();
        params.insert_opt("country", filter.country);
        params.insert_opt("type", filter.entity_type);
        params.insert_opt("status", filter.status);
        params.insert_opt("search", filter.search);
        params.insert_opt("page", filter.page);
        params.insert_opt("limit", filter.limit);
        params
    }
}

/// Filters accepted by the audit log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLogFilter {
    pub user: Option<String>,
    pub action: Option<String>,
    pub entity_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<AuditLogFilter> for QueryParams {
    fn from(filter: AuditLogFilter) -> Self {
        let mut params = QueryParams::new();
        params.insert_opt("user", filter.user);
        params.insert_opt("action", filter.action);
        params.insert_opt("entityId", filter.entity_id);
        params.insert_opt("startDate", filter.start_date);
        params.insert_opt("endDate", filter.end_date);
        params.insert_opt("page", filter.page);
        params.insert_opt("limit", filter.limit);
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_does_not_matter() {
        let a = QueryParams::from([("country", "US"), ("type", "company")]);
        let b = QueryParams::from([("type", "company"), ("country", "US")]);
        assert_eq!(a.to_query_string(), "country=US&type=company");
        assert_eq!(a.to_query_string(), b.to_query_string());
    }

    #[test]
    fn test_query_string_round_trips() {
        let params = QueryParams::new()
            .with("search", "Acme & Sons / Ltd")
            .with("country", "US")
            .with("note", "100% match=yes");
        let encoded = params.to_query_string();
        assert!(!encoded.contains(' '));
        assert_eq!(QueryParams::parse(&encoded), params);
        assert_eq!(QueryParams::parse(&format!("?{}", encoded)), params);
    }

    #[test]
    fn test_append_to_endpoint() {
        assert_eq!(QueryParams::new().append_to("/v1/audit"), "/v1/audit");
        assert_eq!(
            QueryParams::from([("page", 2)]).append_to("/v1/audit"),
            "/v1/audit?page=2"
        );
    }

    #[test]
    fn test_entity_filter_keys() {
        let filter = EntityFilter {
            country: Some("US".to_string()),
            entity_type: Some(EntityType::Company),
            status: Some(RiskStatus::Flagged),
            limit: Some(25),
            ..Default::default()
        };
        assert_eq!(
            QueryParams::from(filter).to_query_string(),
            "country=US&limit=25&status=flagged&type=company"
        );
    }

    #[test]
    fn test_audit_filter_dates() {
        let filter = AuditLogFilter {
            action: Some("screen".to_string()),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            ..Default::default()
        };
        let params = QueryParams::from(filter);
        assert_eq!(params.get("startDate"), Some("2024-03-01"));
        assert_eq!(params.get("action"), Some("screen"));
        assert_eq!(params.len(), 2);
    }
}
