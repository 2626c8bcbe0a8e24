//! # Export Table
//!
//! Flattens a [`StatisticsPayload`] into one row per
//! (placement, supplier, period, statistic, copy) and renders it as CSV.
//!
//! ```text
//! placementTypes[p].suppliers[s].stats[statistic][copy][period]
//!                          │
//!                          ▼
//! client | supplier | placementType | copy | statName | startDate | endDate | statVal
//! ```

use serde::Serialize;
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::snapshot::StatisticsPayload;

/// Column headers, in order.
pub const EXPORT_HEADERS: [&str; 8] = [
    "client",
    "supplier",
    "placementType",
    "copy",
    "statName",
    "startDate",
    "endDate",
    "statVal",
];

/// Title used when the payload carries no collector name.
pub const DEFAULT_TITLE: &str = "Statistics";

/// Sheet name of the exported table.
pub const SHEET_NAME: &str = "stats";

/// A flattened statistics table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsTable {
    /// Collector name; becomes the download file name.
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl StatsTable {
    /// Flattens a payload.
    ///
    /// ## Errors
    /// `MalformedPayload` when a supplier's stats cube does not cover every
    /// (statistic, copy, period) combination.
    pub fn from_payload(payload: &StatisticsPayload) -> CoreResult<Self> {
        let client = payload.client.clone().unwrap_or_default();
        let mut rows = Vec::new();

        for placement in &payload.placement_types {
            for supplier in &placement.suppliers {
                for (period_idx, period) in payload.periods.iter().enumerate() {
                    let start_date = period.start_date.replace('.', "-");
                    let end_date = period.end_date.replace('.', "-");

                    for (stat_idx, statistic) in placement.statistics.iter().enumerate() {
                        for (copy_idx, copy) in placement.copies.iter().enumerate() {
                            let value = supplier
                                .stats
                                .get(stat_idx)
                                .and_then(|by_copy| by_copy.get(copy_idx))
                                .and_then(|by_period| by_period.get(period_idx))
                                .ok_or_else(|| {
                                    CoreError::MalformedPayload(format!(
                                        "supplier '{}' in placement '{}' has no value at [{}][{}][{}]",
                                        supplier.name, placement.name, stat_idx, copy_idx, period_idx
                                    ))
                                })?;

                            rows.push(vec![
                                client.clone(),
                                supplier.name.clone(),
                                placement.name.clone(),
                                copy.clone(),
                                statistic.clone(),
                                start_date.clone(),
                                end_date.clone(),
                                cell_text(value),
                            ]);
                        }
                    }
                }
            }
        }

        Ok(Self {
            title: payload
                .name
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            headers: EXPORT_HEADERS.iter().map(|h| h.to_string()).collect(),
            rows,
        })
    }

    /// Auto-sized column widths: `(longest cell + 2) * 1.2`, header included.
    pub fn column_widths(&self) -> Vec<f64> {
        (0..self.headers.len())
            .map(|col| {
                let longest = std::iter::once(&self.headers[col])
                    .chain(self.rows.iter().filter_map(|row| row.get(col)))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0);
                (longest as f64 + 2.0) * 1.2
            })
            .collect()
    }

    /// Renders headers and rows as CSV bytes.
    pub fn to_csv(&self) -> CoreResult<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.headers)
            .map_err(|e| CoreError::Render(e.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| CoreError::Render(e.to_string()))?;
        }
        writer
            .into_inner()
            .map_err(|e| CoreError::Render(e.to_string()))
    }

    /// Download file name.
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.title)
    }
}

/// Strings are written bare; everything else as its JSON text.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> StatisticsPayload {
        serde_json::from_value(json!({
            "name": "Spring",
            "client": "Acme",
            "periods": [
                {"name": "p1", "startDate": "2024.01.01", "endDate": "2024.01.31"},
                {"name": "p2", "startDate": "2024.02.01", "endDate": "2024.02.29"}
            ],
            "placementTypes": [{
                "name": "Banner",
                "statistics": ["Clicks", "Views"],
                "copies": ["A", "B"],
                "suppliers": [{
                    "name": "Media House",
                    "stats": [
                        [[1, 2], [3, 4]],
                        [[10, 20], [30, null]]
                    ]
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_row_per_combination_in_order() {
        let table = StatsTable::from_payload(&payload()).unwrap();

        assert_eq!(table.title, "Spring");
        assert_eq!(table.headers, EXPORT_HEADERS);
        // 1 placement x 1 supplier x 2 periods x 2 statistics x 2 copies
        assert_eq!(table.rows.len(), 8);

        assert_eq!(
            table.rows[0],
            [
                "Acme", "Media House", "Banner", "A", "Clicks", "2024-01-01", "2024-01-31", "1"
            ]
        );
        // copy varies fastest, then statistic, then period
        assert_eq!(table.rows[1][3], "B");
        assert_eq!(table.rows[1][7], "3");
        assert_eq!(table.rows[2][4], "Views");
        assert_eq!(table.rows[2][7], "10");
        assert_eq!(table.rows[4][5], "2024-02-01");
        assert_eq!(table.rows[4][7], "2");
        assert_eq!(table.rows[7][7], "");
    }

    #[test]
    fn test_short_stats_cube_is_malformed() {
        let mut payload = payload();
        payload.placement_types[0].suppliers[0].stats.pop();

        let err = StatsTable::from_payload(&payload).unwrap_err();
        assert!(matches!(err, CoreError::MalformedPayload(_)));
    }

    #[test]
    fn test_missing_name_defaults_title() {
        let mut payload = payload();
        payload.name = None;

        let table = StatsTable::from_payload(&payload).unwrap();
        assert_eq!(table.title, DEFAULT_TITLE);
        assert_eq!(table.file_name(), "Statistics.csv");
    }

    #[test]
    fn test_column_widths() {
        let table = StatsTable::from_payload(&payload()).unwrap();
        let widths = table.column_widths();

        // "client" (6) is longer than "Acme" (4)
        assert!((widths[0] - 9.6).abs() < 1e-9);
        // "Media House" (11)
        assert!((widths[1] - 15.6).abs() < 1e-9);
        // "placementType" (13)
        assert!((widths[2] - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_csv_rendering() {
        let table = StatsTable::from_payload(&payload()).unwrap();
        let csv = String::from_utf8(table.to_csv().unwrap()).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next(),
            Some("client,supplier,placementType,copy,statName,startDate,endDate,statVal")
        );
        assert_eq!(
            lines.next(),
            Some("Acme,Media House,Banner,A,Clicks,2024-01-01,2024-01-31,1")
        );
        assert_eq!(csv.lines().count(), 9);
    }
}
