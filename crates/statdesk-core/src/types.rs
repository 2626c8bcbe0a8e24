//! # Domain Types
//!
//! Core domain types used throughout Statdesk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Collector     │   │   Placement     │   │     Period      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │──►│  collector_id   │   │  collector_id   │       │
//! │  │  external_id    │   │  type_id        │   │  name           │       │
//! │  │  name           │   │  supplier_ids   │   │  start_date     │       │
//! │  │  periodicity    │   │  statistic_ids  │   │  end_date       │       │
//! │  │  weekday        │   │  copies         │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                             │
//! │                                                                         │
//! │  Dictionaries (unique name, case-insensitive, active flag):            │
//! │  Client • Statistic • PlacementType • Supplier (+ email)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Collectors own placements and periods; placements own copies. Deleting a
//! collector cascades. Dictionaries are protected while referenced.

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreError;

// =============================================================================
// Periodicity
// =============================================================================

/// How often a collector reports.
///
/// Deserializes through [`FromStr`](std::str::FromStr), so an unknown value
/// surfaces as [`CoreError::UnsupportedPeriodicity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Periodicity {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl Periodicity {
    /// Lowercase wire name, as stored and as sent to the remote service.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Periodicity::Daily => "daily",
            Periodicity::Weekly => "weekly",
            Periodicity::Biweekly => "biweekly",
            Periodicity::Monthly => "monthly",
        }
    }

    /// Weekly and biweekly periods are anchored on a weekday.
    pub const fn needs_weekday(&self) -> bool {
        matches!(self, Periodicity::Weekly | Periodicity::Biweekly)
    }
}

impl std::fmt::Display for Periodicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Periodicity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Periodicity::Daily),
            "weekly" => Ok(Periodicity::Weekly),
            "biweekly" => Ok(Periodicity::Biweekly),
            "monthly" => Ok(Periodicity::Monthly),
            other => Err(CoreError::UnsupportedPeriodicity(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Periodicity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

// =============================================================================
// Weekday
// =============================================================================

/// Anchor weekday for weekly/biweekly collectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Monday = 0 .. Sunday = 6.
    pub const fn index(&self) -> u32 {
        match self {
            Weekday::Monday => 0,
            Weekday::Tuesday => 1,
            Weekday::Wednesday => 2,
            Weekday::Thursday => 3,
            Weekday::Friday => 4,
            Weekday::Saturday => 5,
            Weekday::Sunday => 6,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Weekday {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monday" => Ok(Weekday::Monday),
            "tuesday" => Ok(Weekday::Tuesday),
            "wednesday" => Ok(Weekday::Wednesday),
            "thursday" => Ok(Weekday::Thursday),
            "friday" => Ok(Weekday::Friday),
            "saturday" => Ok(Weekday::Saturday),
            "sunday" => Ok(Weekday::Sunday),
            other => Err(CoreError::UnsupportedWeekday(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

// =============================================================================
// Dictionaries
// =============================================================================

/// The plain dictionary tables: same shape, different referents.
///
/// Suppliers are dictionaries too but carry an email, see [`Supplier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DictionaryKind {
    Client,
    Statistic,
    PlacementType,
}

impl DictionaryKind {
    /// Human-readable entity name used in error messages.
    pub const fn label(&self) -> &'static str {
        match self {
            DictionaryKind::Client => "Client",
            DictionaryKind::Statistic => "Statistic",
            DictionaryKind::PlacementType => "PlacementType",
        }
    }
}

/// A named, activatable reference entity (Client, Statistic, PlacementType).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    /// Unique identifier (UUID v4).
    pub id: Uuid,

    /// Display name, unique case-insensitively within its kind.
    pub name: String,

    /// Inactive entries stay valid for existing links but cannot be chosen
    /// for new placements or collectors.
    pub is_active: bool,
}

/// Input for creating or updating a dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryDraft {
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// A supplier receiving reminder mails from the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_active: bool,
}

/// Input for creating or updating a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SupplierDraft {
    pub name: String,
    pub email: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

// =============================================================================
// Collector
// =============================================================================

/// A named statistics-gathering campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Collector {
    /// Unique identifier (UUID v4).
    pub id: Uuid,

    /// Identifier of the remote mirror, set only by the sync orchestrator.
    pub external_id: Option<Uuid>,

    /// Unique case-insensitively.
    pub name: String,

    /// First day of the collection range (inclusive).
    pub start_date: NaiveDate,

    /// Last day of the collection range (inclusive).
    pub end_date: NaiveDate,

    pub periodicity: Periodicity,

    /// Present iff periodicity is weekly or biweekly.
    pub weekday: Option<Weekday>,

    pub client_id: Uuid,
}

/// Input for creating or updating a collector.
///
/// `id == None` creates; `Some(id)` updates. The external id is never part
/// of a draft: only the orchestrator writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CollectorDraft {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub periodicity: Periodicity,
    /// Blank or missing means none.
    #[serde(default, with = "crate::snapshot::weekday_or_empty")]
    #[ts(as = "Option<Weekday>")]
    pub weekday: Option<Weekday>,
    pub client_id: Uuid,
}

// =============================================================================
// Placement
// =============================================================================

/// One copy variant of a placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AdCopy {
    pub id: Uuid,
    pub text: String,
    pub placement_id: Uuid,
}

/// A slot within a collector: a type, its suppliers, tracked statistics and
/// copy variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub id: Uuid,
    pub collector_id: Uuid,
    pub type_id: Uuid,
    pub supplier_ids: Vec<Uuid>,
    pub statistic_ids: Vec<Uuid>,
    /// Ordered by text.
    pub copies: Vec<AdCopy>,
}

/// Input for creating or updating a placement together with its copies.
///
/// Copies are replaced wholesale on every save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PlacementDraft {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub collector_id: Uuid,
    pub type_id: Uuid,
    #[serde(default)]
    pub supplier_ids: Vec<Uuid>,
    #[serde(default)]
    pub statistic_ids: Vec<Uuid>,
    #[serde(default)]
    pub copies: Vec<String>,
}

// =============================================================================
// Period
// =============================================================================

/// One stored reporting interval of a collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub collector_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodicity_parsing() {
        assert_eq!("daily".parse::<Periodicity>().unwrap(), Periodicity::Daily);
        assert_eq!("Weekly".parse::<Periodicity>().unwrap(), Periodicity::Weekly);
        assert_eq!(
            "biweekly".parse::<Periodicity>().unwrap(),
            Periodicity::Biweekly
        );
        assert!(matches!(
            "quarterly".parse::<Periodicity>(),
            Err(CoreError::UnsupportedPeriodicity(p)) if p == "quarterly"
        ));
    }

    #[test]
    fn test_needs_weekday() {
        assert!(Periodicity::Weekly.needs_weekday());
        assert!(Periodicity::Biweekly.needs_weekday());
        assert!(!Periodicity::Daily.needs_weekday());
        assert!(!Periodicity::Monthly.needs_weekday());
    }

    #[test]
    fn test_weekday_index_matches_chrono() {
        for (day, chrono_day) in [
            (Weekday::Monday, chrono::Weekday::Mon),
            (Weekday::Wednesday, chrono::Weekday::Wed),
            (Weekday::Sunday, chrono::Weekday::Sun),
        ] {
            assert_eq!(day.index(), chrono_day.num_days_from_monday());
        }
    }

    #[test]
    fn test_drafts_default_to_active() {
        let draft: DictionaryDraft = serde_json::from_str(r#"{"name": "Acme"}"#).unwrap();
        assert!(draft.is_active);

        let supplier: SupplierDraft =
            serde_json::from_str(r#"{"name": "Media", "email": "a@b.co", "isActive": false}"#)
                .unwrap();
        assert!(!supplier.is_active);
    }

    #[test]
    fn test_enum_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&Periodicity::Biweekly).unwrap(),
            "\"biweekly\""
        );
        assert_eq!(
            serde_json::from_str::<Weekday>("\"friday\"").unwrap(),
            Weekday::Friday
        );
    }

    #[test]
    fn test_unknown_periodicity_rejected_on_deserialize() {
        let err = serde_json::from_str::<Periodicity>("\"quarterly\"").unwrap_err();
        assert!(err.to_string().contains("Unsupported periodicity: 'quarterly'"));

        let err = serde_json::from_str::<Weekday>("\"someday\"").unwrap_err();
        assert!(err.to_string().contains("Unsupported weekday"));
    }

    #[test]
    fn test_collector_draft_blank_weekday_is_none() {
        let draft: CollectorDraft = serde_json::from_str(
            r#"{
                "name": "Spring",
                "startDate": "2024-03-01",
                "endDate": "2024-03-31",
                "periodicity": "daily",
                "weekday": "",
                "clientId": "00000000-0000-0000-0000-000000000000"
            }"#,
        )
        .unwrap();
        assert_eq!(draft.weekday, None);

        let draft: CollectorDraft = serde_json::from_str(
            r#"{
                "name": "Spring",
                "startDate": "2024-03-01",
                "endDate": "2024-03-31",
                "periodicity": "weekly",
                "weekday": "Tuesday",
                "clientId": "00000000-0000-0000-0000-000000000000"
            }"#,
        )
        .unwrap();
        assert_eq!(draft.weekday, Some(Weekday::Tuesday));
    }
}
