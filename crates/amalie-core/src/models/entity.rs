//! Entity screening contracts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::risk::{Percentage, RiskLevel, RiskStatus};
use crate::utils::de;

/// Kind of party being screened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Individual,
    Company,
    Vessel,
    Aircraft,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Individual => "individual",
            EntityType::Company => "company",
            EntityType::Vessel => "vessel",
            EntityType::Aircraft => "aircraft",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "individual" => Ok(EntityType::Individual),
            "company" => Ok(EntityType::Company),
            "vessel" => Ok(EntityType::Vessel),
            "aircraft" => Ok(EntityType::Aircraft),
            other => Err(format!(
                "unknown entity type: {} (expected individual, company, vessel or aircraft)",
                other
            )),
        }
    }
}

/// Fields submitted for a screening request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct NewEntity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewEntity {
    pub fn new(name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            name: name.into(),
            entity_type,
            country: None,
            identifier: None,
            notes: None,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Model output attached to a screened entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AiAnalysis {
    #[cfg_attr(feature = "ts", ts(type = "number"))]
    pub confidence: Percentage,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// A screened party. Each screening yields a new record; records are
/// never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[cfg_attr(feature = "ts", ts(type = "number"))]
    pub overall_risk: Percentage,
    pub status: RiskStatus,
    pub ai_analysis: AiAnalysis,
    pub screened_date: DateTime<Utc>,
}

impl Entity {
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.overall_risk)
    }
}

/// Response of a screening request: the new entity plus whatever else the
/// service reports alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ScreeningResult {
    pub entity: Entity,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Entity listing; the service may send a bare array or wrap it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EntityList {
    Bare(Vec<Entity>),
    Wrapped { entities: Vec<Entity> },
}

impl From<EntityList> for Vec<Entity> {
    fn from(list: EntityList) -> Self {
        match list {
            EntityList::Bare(entities) | EntityList::Wrapped { entities } => entities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_entity() -> serde_json::Value {
        json!({
            "id": 17,
            "name": "Oceanic Freight Ltd",
            "type": "company",
            "country": "PA",
            "identifier": "IMO-9321483",
            "overallRisk": 82,
            "status": "blocked",
            "aiAnalysis": {"confidence": 91, "summary": "Sanctions list match"},
            "screenedDate": "2024-03-05T14:30:00Z"
        })
    }

    #[test]
    fn test_parse_screening_result() {
        let body = json!({"entity": sample_entity(), "matches": 2});
        let result: ScreeningResult = serde_json::from_value(body).unwrap();

        let entity = &result.entity;
        assert_eq!(entity.id, "17");
        assert_eq!(entity.entity_type, EntityType::Company);
        assert_eq!(entity.notes, None);
        assert_eq!(entity.overall_risk.value(), 82);
        assert_eq!(entity.risk_level(), RiskLevel::High);
        assert_eq!(entity.status, RiskStatus::Blocked);
        assert_eq!(entity.ai_analysis.confidence.value(), 91);
        assert_eq!(
            entity.ai_analysis.details.get("summary"),
            Some(&json!("Sanctions list match"))
        );
        assert_eq!(entity.screened_date.to_rfc3339(), "2024-03-05T14:30:00+00:00");
        assert_eq!(result.extra.get("matches"), Some(&json!(2)));
    }

    #[test]
    fn test_entity_rejects_out_of_range_risk() {
        let mut body = sample_entity();
        body["overallRisk"] = json!(140);
        assert!(serde_json::from_value::<Entity>(body).is_err());
    }

    #[test]
    fn test_entity_list_shapes() {
        let bare: EntityList = serde_json::from_value(json!([sample_entity()])).unwrap();
        assert_eq!(Vec::<Entity>::from(bare).len(), 1);

        let wrapped: EntityList =
            serde_json::from_value(json!({"entities": [sample_entity(), sample_entity()]})).unwrap();
        assert_eq!(Vec::<Entity>::from(wrapped).len(), 2);
    }

    #[test]
    fn test_new_entity_serializes_form_fields() {
        let entity = NewEntity::new("Jane Roe", EntityType::Individual).with_country("GB");
        assert_eq!(
            serde_json::to_value(&entity).unwrap(),
            json!({"name": "Jane Roe", "type": "individual", "country": "GB"})
        );
        assert_eq!("Vessel".parse::<EntityType>().unwrap(), EntityType::Vessel);
        assert!("boat".parse::<EntityType>().is_err());
    }
}
