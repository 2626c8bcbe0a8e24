//! # Period Generator
//!
//! Derives the reporting periods of a collector from its date range,
//! periodicity and weekday anchor. Pure and deterministic: the store calls
//! this on every collector save and replaces all stored periods with the
//! result.
//!
//! ## Boundary Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  range:            [start_date ............................ end_date]  │
//! │                                                                         │
//! │  daily:            |d|d|d|d|d|d|d|d|d|d|d|d|d|d|d|d|d|d|d|d|d|d|     │
//! │                                                                         │
//! │  weekly (Wed):  |──wk──|──wk──|──wk──|──wk──|──wk──|──wk──|──wk──|     │
//! │                 ▲ anchor: last Wednesday on/before start_date    ▲     │
//! │                                                last end may overshoot  │
//! │                                                                         │
//! │  monthly:   |────Jan────|────Feb────|────Mar────|                      │
//! │             ▲ 1st of start month          ▲ last month's end may       │
//! │                                             overshoot end_date         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Periods are generated while their start is on or before `end_date`. The
//! last period is never clipped. Consecutive periods are contiguous: each
//! starts the day after the previous one ends.
//!
//! ## Labels
//! - daily: `2024.01.05`
//! - weekly, biweekly, monthly: `2024.01.01 - 01.31`

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, ValidationError};
use crate::types::{Periodicity, Weekday};
use crate::validation::validate_schedule;

/// A generated, not yet persisted, reporting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSpec {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Date format of daily labels and of the first half of range labels.
const LABEL_DATE_FORMAT: &str = "%Y.%m.%d";

/// Date format of the second half of range labels.
const LABEL_END_FORMAT: &str = "%m.%d";

/// Generates the reporting periods covering `[start_date, end_date]`.
///
/// ## Errors
/// - `Required { field: "weekday" }` when periodicity is weekly/biweekly and
///   no weekday is given
/// - `InvalidRange` when `start_date > end_date`
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use statdesk_core::periods::generate_periods;
/// use statdesk_core::Periodicity;
///
/// let periods = generate_periods(
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
///     Periodicity::Daily,
///     None,
/// )
/// .unwrap();
///
/// let labels: Vec<_> = periods.iter().map(|p| p.name.as_str()).collect();
/// assert_eq!(labels, ["2024.01.01", "2024.01.02", "2024.01.03"]);
/// ```
pub fn generate_periods(
    start_date: NaiveDate,
    end_date: NaiveDate,
    periodicity: Periodicity,
    weekday: Option<Weekday>,
) -> CoreResult<Vec<PeriodSpec>> {
    let weekday = validate_schedule(start_date, end_date, periodicity, weekday)?;

    let periods = match (periodicity, weekday) {
        (Periodicity::Daily, _) => daily(start_date, end_date),
        (Periodicity::Weekly, Some(day)) => stepped(anchor(start_date, day), end_date, 7),
        (Periodicity::Biweekly, Some(day)) => stepped(anchor(start_date, day), end_date, 14),
        (Periodicity::Monthly, _) => monthly(start_date, end_date),
        (Periodicity::Weekly | Periodicity::Biweekly, None) => {
            return Err(ValidationError::Required {
                field: "weekday".to_string(),
            }
            .into())
        }
    };

    Ok(periods)
}

/// Most recent occurrence of `weekday` on or before `date`.
pub fn anchor(date: NaiveDate, weekday: Weekday) -> NaiveDate {
    let offset = (7 - weekday.index() + date.weekday().num_days_from_monday()) % 7;
    date - Days::new(u64::from(offset))
}

fn range_label(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "{} - {}",
        start.format(LABEL_DATE_FORMAT),
        end.format(LABEL_END_FORMAT)
    )
}

fn daily(start_date: NaiveDate, end_date: NaiveDate) -> Vec<PeriodSpec> {
    start_date
        .iter_days()
        .take_while(|day| *day <= end_date)
        .map(|day| PeriodSpec {
            name: day.format(LABEL_DATE_FORMAT).to_string(),
            start_date: day,
            end_date: day,
        })
        .collect()
}

fn stepped(first_start: NaiveDate, end_date: NaiveDate, step_days: u64) -> Vec<PeriodSpec> {
    let mut periods = Vec::new();
    let mut current = Some(first_start);

    while let Some(start) = current.filter(|start| *start <= end_date) {
        let Some(end) = start.checked_add_days(Days::new(step_days - 1)) else {
            break;
        };
        periods.push(PeriodSpec {
            name: range_label(start, end),
            start_date: start,
            end_date: end,
        });
        current = start.checked_add_days(Days::new(step_days));
    }

    periods
}

fn monthly(start_date: NaiveDate, end_date: NaiveDate) -> Vec<PeriodSpec> {
    let mut periods = Vec::new();
    let mut current = start_date.with_day(1);

    while let Some(start) = current.filter(|start| *start <= end_date) {
        let next = start.checked_add_months(Months::new(1));
        let Some(end) = next.and_then(|next| next.pred_opt()) else {
            break;
        };
        periods.push(PeriodSpec {
            name: range_label(start, end),
            start_date: start,
            end_date: end,
        });
        current = next;
    }

    periods
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_labels() {
        let periods =
            generate_periods(date(2024, 1, 1), date(2024, 1, 3), Periodicity::Daily, None)
                .unwrap();

        let labels: Vec<_> = periods.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(labels, ["2024.01.01", "2024.01.02", "2024.01.03"]);
        assert!(periods.iter().all(|p| p.start_date == p.end_date));
    }

    #[test]
    fn test_weekly_anchors_to_previous_weekday() {
        // 2024-01-01 is a Monday; the preceding Wednesday is 2023-12-27.
        let periods = generate_periods(
            date(2024, 1, 1),
            date(2024, 1, 20),
            Periodicity::Weekly,
            Some(Weekday::Wednesday),
        )
        .unwrap();

        let starts: Vec<_> = periods.iter().map(|p| p.start_date).collect();
        assert_eq!(
            starts,
            [
                date(2023, 12, 27),
                date(2024, 1, 3),
                date(2024, 1, 10),
                date(2024, 1, 17),
            ]
        );
        assert_eq!(periods[0].end_date, date(2024, 1, 2));
        assert_eq!(periods[0].name, "2023.12.27 - 01.02");
        // Last period overshoots the requested end date.
        assert_eq!(periods[3].end_date, date(2024, 1, 23));
    }

    #[test]
    fn test_weekly_anchor_on_same_weekday() {
        // 2024-01-03 is itself a Wednesday.
        assert_eq!(anchor(date(2024, 1, 3), Weekday::Wednesday), date(2024, 1, 3));
        assert_eq!(anchor(date(2024, 1, 3), Weekday::Thursday), date(2023, 12, 28));
        assert_eq!(anchor(date(2024, 1, 7), Weekday::Monday), date(2024, 1, 1));
    }

    #[test]
    fn test_biweekly_steps_fourteen_days() {
        let periods = generate_periods(
            date(2024, 1, 1),
            date(2024, 2, 1),
            Periodicity::Biweekly,
            Some(Weekday::Monday),
        )
        .unwrap();

        let spans: Vec<_> = periods
            .iter()
            .map(|p| (p.start_date, p.end_date))
            .collect();
        assert_eq!(
            spans,
            [
                (date(2024, 1, 1), date(2024, 1, 14)),
                (date(2024, 1, 15), date(2024, 1, 28)),
                (date(2024, 1, 29), date(2024, 2, 11)),
            ]
        );
    }

    #[test]
    fn test_monthly_leap_year() {
        let periods = generate_periods(
            date(2024, 1, 15),
            date(2024, 3, 10),
            Periodicity::Monthly,
            None,
        )
        .unwrap();

        let spans: Vec<_> = periods
            .iter()
            .map(|p| (p.start_date, p.end_date))
            .collect();
        assert_eq!(
            spans,
            [
                (date(2024, 1, 1), date(2024, 1, 31)),
                (date(2024, 2, 1), date(2024, 2, 29)),
                (date(2024, 3, 1), date(2024, 3, 31)),
            ]
        );
        assert_eq!(periods[1].name, "2024.02.01 - 02.29");
    }

    #[test]
    fn test_monthly_rolls_over_december() {
        let periods = generate_periods(
            date(2023, 11, 20),
            date(2024, 1, 5),
            Periodicity::Monthly,
            None,
        )
        .unwrap();

        let starts: Vec<_> = periods.iter().map(|p| p.start_date).collect();
        assert_eq!(
            starts,
            [date(2023, 11, 1), date(2023, 12, 1), date(2024, 1, 1)]
        );
        assert_eq!(periods[1].end_date, date(2023, 12, 31));
        assert_eq!(periods[1].name, "2023.12.01 - 12.31");
    }

    #[test]
    fn test_missing_weekday_is_validation_error() {
        let err = generate_periods(
            date(2024, 1, 1),
            date(2024, 1, 31),
            Periodicity::Weekly,
            None,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Required { ref field }) if field == "weekday"
        ));
    }

    #[test]
    fn test_inverted_range_is_validation_error() {
        let err = generate_periods(date(2024, 2, 1), date(2024, 1, 1), Periodicity::Daily, None)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_single_day_range() {
        for (periodicity, weekday) in [
            (Periodicity::Daily, None),
            (Periodicity::Weekly, Some(Weekday::Sunday)),
            (Periodicity::Biweekly, Some(Weekday::Tuesday)),
            (Periodicity::Monthly, None),
        ] {
            let periods =
                generate_periods(date(2024, 6, 12), date(2024, 6, 12), periodicity, weekday)
                    .unwrap();
            assert_eq!(periods.len(), 1, "{periodicity}");
            assert!(periods[0].start_date <= date(2024, 6, 12));
            assert!(periods[0].end_date >= date(2024, 6, 12));
        }
    }

    #[test]
    fn test_output_is_contiguous_and_covers_range() {
        let weekdays = [
            Weekday::Monday,
            Weekday::Tuesday,
            Weekday::Wednesday,
            Weekday::Thursday,
            Weekday::Friday,
            Weekday::Saturday,
            Weekday::Sunday,
        ];
        let cases = [
            (date(2023, 12, 30), date(2024, 3, 2)),
            (date(2024, 2, 29), date(2024, 2, 29)),
            (date(2024, 5, 7), date(2025, 1, 13)),
        ];

        for (start, end) in cases {
            for periodicity in [
                Periodicity::Daily,
                Periodicity::Weekly,
                Periodicity::Biweekly,
                Periodicity::Monthly,
            ] {
                for weekday in weekdays {
                    let periods =
                        generate_periods(start, end, periodicity, Some(weekday)).unwrap();

                    assert!(!periods.is_empty());
                    assert!(periods[0].start_date <= start);
                    assert!(periods.last().unwrap().end_date >= end);
                    assert!(periods.last().unwrap().start_date <= end);
                    for pair in periods.windows(2) {
                        assert_eq!(pair[0].end_date.succ_opt(), Some(pair[1].start_date));
                    }
                    for period in &periods {
                        assert!(period.start_date <= period.end_date);
                    }
                }
            }
        }
    }
}
