//! Database rows and enums.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
    strum::Display,
    strum::EnumString,
)]
#[sqlx(type_name = "document_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum DocumentStatus {
    Active,
    Repealed,
    Draft,
    Archived,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
    strum::Display,
    strum::EnumString,
)]
#[sqlx(type_name = "change_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ChangeType {
    NewLaw,
    Amendment,
    Repeal,
    Renumber,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LegalDocument {
    pub id: Uuid,
    /// Canonical "SFS YYYY:NNNN".
    pub document_number: String,
    pub title: String,
    pub slug: String,
    pub status: DocumentStatus,
    pub full_text: String,
    pub html_content: Option<String>,
    pub last_change_type: Option<ChangeType>,
    pub last_change_ref: Option<String>,
    pub last_change_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable snapshot of a document's text.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentVersion {
    pub id: Uuid,
    pub document_id: Uuid,
    pub version_number: i32,
    pub full_text: String,
    pub html_content: Option<String>,
    pub amendment_sfs: Option<String>,
    pub source_timestamp: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChangeEvent {
    pub id: Uuid,
    pub document_id: Uuid,
    pub change_type: ChangeType,
    pub amendment_sfs: Option<String>,
    pub previous_version_id: Option<Uuid>,
    pub new_version_id: Option<Uuid>,
    pub changed_sections: Vec<String>,
    /// Unified diff, truncated.
    pub diff_summary: Option<String>,
    pub detected_at: DateTime<Utc>,
}

/// One amending law applied to a base document.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AmendmentRecord {
    pub id: Uuid,
    pub base_document_id: Uuid,
    pub amending_sfs_number: String,
    pub amending_law_title: String,
    pub affected_sections: Vec<String>,
    pub effective_date: Option<NaiveDate>,
    pub detected_from_version_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_change_type_display() {
        assert_eq!(ChangeType::NewLaw.to_string(), "NEW_LAW");
        assert_eq!(ChangeType::Amendment.to_string(), "AMENDMENT");
        assert_eq!(ChangeType::from_str("repeal").unwrap(), ChangeType::Repeal);
    }

    #[test]
    fn test_document_status_roundtrip() {
        assert_eq!(DocumentStatus::Repealed.to_string(), "REPEALED");
        assert_eq!(DocumentStatus::from_str("ACTIVE").unwrap(), DocumentStatus::Active);
        assert!(DocumentStatus::from_str("gone").is_err());
    }

    #[test]
    fn test_change_type_serde() {
        let json = serde_json::to_string(&ChangeType::NewLaw).unwrap();
        assert_eq!(json, "\"new_law\"");
    }
}
