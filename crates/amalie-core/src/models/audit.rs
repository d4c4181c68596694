//! Audit log records.
//!
//! The audit endpoint's paging and record layout belong to the service, so
//! the page is carried as raw JSON. Only its outer shape is checked.

use serde::{de::Error, Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AuditLogPage(Value);

impl AuditLogPage {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl<'de> Deserialize<'de> for AuditLogPage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.is_object() || value.is_array() {
            Ok(Self(value))
        } else {
            Err(D::Error::custom("audit log page must be a JSON object or array"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_passes_through() {
        let body = json!({"logs": [{"action": "screen", "user": "a@b.com"}], "page": 2, "total": 41});
        let page: AuditLogPage = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(page.as_value(), &body);
        assert_eq!(serde_json::to_value(&page).unwrap(), body);
    }

    #[test]
    fn test_scalar_page_is_rejected() {
        assert!(serde_json::from_value::<AuditLogPage>(json!("nope")).is_err());
        assert!(serde_json::from_value::<AuditLogPage>(json!(null)).is_err());
    }
}
