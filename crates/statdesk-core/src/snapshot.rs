//! # Remote Payload Shapes
//!
//! JSON documents exchanged with the external statistics service.
//!
//! ```text
//! ┌──────────────┐   POST /statistics_collector    ┌──────────────────────┐
//! │   Statdesk   │ ──── CollectorSnapshot ───────► │  statistics service  │
//! │              │ ◄─── StatisticsPayload ──────── │                      │
//! └──────────────┘   GET /statistics_collector/{id}/config                 │
//!                                                  └──────────────────────┘
//! ```
//!
//! Field names are camelCase on the wire and dates use `YYYY.MM.DD`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Periodicity, Weekday};

// =============================================================================
// Outbound: Collector Snapshot
// =============================================================================

/// Full serialized collector, as submitted on create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorSnapshot {
    pub name: String,

    /// Client name, not id.
    pub client: String,

    pub periodicity: Periodicity,

    /// Empty string when the periodicity carries no weekday.
    #[serde(with = "weekday_or_empty")]
    pub weekday: Option<Weekday>,

    pub placement_types: Vec<PlacementSnapshot>,

    pub periods: Vec<PeriodSnapshot>,
}

/// One placement inside a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementSnapshot {
    /// Placement type name.
    pub name: String,
    pub suppliers: Vec<SupplierSnapshot>,
    /// Statistic names.
    pub statistics: Vec<String>,
    /// Copy texts, ordered.
    pub copies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierSnapshot {
    pub name: String,
    pub mail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSnapshot {
    pub name: String,
    #[serde(with = "dot_date")]
    pub start_date: NaiveDate,
    #[serde(with = "dot_date")]
    pub end_date: NaiveDate,
}

impl From<&crate::types::Period> for PeriodSnapshot {
    fn from(period: &crate::types::Period) -> Self {
        Self {
            name: period.name.clone(),
            start_date: period.start_date,
            end_date: period.end_date,
        }
    }
}

// =============================================================================
// Inbound: Statistics Payload
// =============================================================================

/// Collected statistics, as returned by `GET /{id}/config`.
///
/// Dates are kept as the service sends them; the export table rewrites them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub periods: Vec<PayloadPeriod>,
    #[serde(default)]
    pub placement_types: Vec<PlacementStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadPeriod {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementStats {
    pub name: String,
    #[serde(default)]
    pub suppliers: Vec<SupplierStats>,
    #[serde(default)]
    pub statistics: Vec<String>,
    #[serde(default)]
    pub copies: Vec<String>,
}

/// Per-supplier values indexed `stats[statistic][copy][period]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierStats {
    pub name: String,
    #[serde(default)]
    pub stats: Vec<Vec<Vec<serde_json::Value>>>,
}

// =============================================================================
// Serde helpers
// =============================================================================

/// `YYYY.MM.DD` dates.
pub mod dot_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y.%m.%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Optional weekday written as `""` when absent.
pub(crate) mod weekday_or_empty {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::types::Weekday;

    pub fn serialize<S: Serializer>(
        weekday: &Option<Weekday>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(weekday.map(|day| day.as_str()).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Weekday>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => {
                raw.parse().map(Some).map_err(serde::de::Error::custom)
            }
            _ => Ok(None),
        }
    }
}
