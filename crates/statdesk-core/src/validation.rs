//! # Validation Module
//!
//! Input validation for dictionaries, collectors and placements.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (axum)                                          │
//! │  └── Type validation (JSON deserialization, UUID path params)          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Names: trimmed, required, max 255 chars                           │
//! │  ├── Emails: local@domain shape                                        │
//! │  └── Schedules: weekday iff weekly/biweekly, start <= end             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE name_key (case-insensitive names)                          │
//! │  └── Foreign keys (RESTRICT on dictionaries, CASCADE on children)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validators return the normalised value so callers store exactly what was
//! checked.

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::{
    CollectorDraft, DictionaryDraft, Periodicity, PlacementDraft, SupplierDraft, Weekday,
};
use crate::MAX_NAME_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name and returns it trimmed.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_NAME_LEN`] characters
///
/// ## Example
/// ```rust
/// use statdesk_core::validation::validate_name;
///
/// assert_eq!(validate_name("name", "  Acme ").unwrap(), "Acme");
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates a supplier email address and returns it trimmed.
///
/// Only the shape is checked: one `@`, a non-empty local part, and a domain
/// containing a dot that neither starts nor ends the domain.
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid("must contain '@'"))?;

    if local.is_empty() || domain.contains('@') {
        return Err(invalid("must look like local@domain"));
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid("domain must contain a dot"));
    }

    Ok(email.to_string())
}

// =============================================================================
// Draft Validators
// =============================================================================

/// Validates a dictionary draft and returns the normalised copy.
pub fn validate_dictionary_draft(draft: &DictionaryDraft) -> ValidationResult<DictionaryDraft> {
    Ok(DictionaryDraft {
        name: validate_name("name", &draft.name)?,
        is_active: draft.is_active,
    })
}

/// Validates a supplier draft and returns the normalised copy.
pub fn validate_supplier_draft(draft: &SupplierDraft) -> ValidationResult<SupplierDraft> {
    Ok(SupplierDraft {
        name: validate_name("name", &draft.name)?,
        email: validate_email(&draft.email)?,
        is_active: draft.is_active,
    })
}

// =============================================================================
// Schedule Validators
// =============================================================================

/// Validates a collector schedule and returns the normalised weekday.
///
/// ## Rules
/// ```text
/// periodicity        weekday given     result
/// ───────────────    ─────────────     ──────────────────────────
/// weekly/biweekly    Some(day)         Ok(Some(day))
/// weekly/biweekly    None              Err(Required "weekday")
/// daily/monthly      anything          Ok(None)   (weekday cleared)
/// ```
/// Independently, `start_date > end_date` is rejected.
pub fn validate_schedule(
    start_date: NaiveDate,
    end_date: NaiveDate,
    periodicity: Periodicity,
    weekday: Option<Weekday>,
) -> ValidationResult<Option<Weekday>> {
    if start_date > end_date {
        return Err(ValidationError::InvalidRange {
            field: "dates".to_string(),
            start: start_date.to_string(),
            end: end_date.to_string(),
        });
    }

    if !periodicity.needs_weekday() {
        return Ok(None);
    }

    match weekday {
        Some(day) => Ok(Some(day)),
        None => Err(ValidationError::Required {
            field: "weekday".to_string(),
        }),
    }
}

/// Validates a collector draft and returns the normalised copy.
pub fn validate_collector_draft(draft: &CollectorDraft) -> ValidationResult<CollectorDraft> {
    let name = validate_name("name", &draft.name)?;
    let weekday = validate_schedule(
        draft.start_date,
        draft.end_date,
        draft.periodicity,
        draft.weekday,
    )?;

    Ok(CollectorDraft {
        name,
        weekday,
        ..draft.clone()
    })
}

/// Validates a placement draft: every copy text is a valid name and the
/// link lists carry no duplicates.
pub fn validate_placement_draft(draft: &PlacementDraft) -> ValidationResult<PlacementDraft> {
    let copies = draft
        .copies
        .iter()
        .map(|text| validate_name("copy", text))
        .collect::<ValidationResult<Vec<_>>>()?;

    let mut supplier_ids = draft.supplier_ids.clone();
    supplier_ids.sort();
    supplier_ids.dedup();

    let mut statistic_ids = draft.statistic_ids.clone();
    statistic_ids.sort();
    statistic_ids.dedup();

    Ok(PlacementDraft {
        copies,
        supplier_ids,
        statistic_ids,
        ..draft.clone()
    })
}

/// Case-insensitive uniqueness key for a (validated) name.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("name", "Acme").unwrap(), "Acme");
        assert_eq!(validate_name("name", "  Acme  ").unwrap(), "Acme");

        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"A".repeat(255)).is_ok());
        assert!(matches!(
            validate_name("name", &"A".repeat(256)),
            Err(ValidationError::TooLong { max: 255, .. })
        ));
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(
            validate_email(" ads@acme.com ").unwrap(),
            "ads@acme.com"
        );

        assert!(validate_email("").is_err());
        assert!(validate_email("acme.com").is_err());
        assert!(validate_email("@acme.com").is_err());
        assert!(validate_email("ads@acme").is_err());
        assert!(validate_email("ads@.com").is_err());
        assert!(validate_email("a b@acme.com").is_err());
        assert!(validate_email("a@b@acme.com").is_err());
    }

    #[test]
    fn test_supplier_draft() {
        let draft = SupplierDraft {
            name: " Media House ".to_string(),
            email: "ads@media.house".to_string(),
            is_active: true,
        };
        assert_eq!(validate_supplier_draft(&draft).unwrap().name, "Media House");

        let bad = SupplierDraft {
            email: "nope".to_string(),
            ..draft
        };
        assert!(matches!(
            validate_supplier_draft(&bad),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_weekly_requires_weekday() {
        let err = validate_schedule(
            date(2024, 1, 1),
            date(2024, 1, 31),
            Periodicity::Weekly,
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::Required {
                field: "weekday".to_string()
            }
        );

        assert!(validate_schedule(
            date(2024, 1, 1),
            date(2024, 1, 31),
            Periodicity::Biweekly,
            None
        )
        .is_err());
    }

    #[test]
    fn test_weekday_cleared_for_daily_and_monthly() {
        for periodicity in [Periodicity::Daily, Periodicity::Monthly] {
            let weekday = validate_schedule(
                date(2024, 1, 1),
                date(2024, 1, 31),
                periodicity,
                Some(Weekday::Friday),
            )
            .unwrap();
            assert_eq!(weekday, None);
        }
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = validate_schedule(
            date(2024, 2, 1),
            date(2024, 1, 1),
            Periodicity::Daily,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRange { .. }));
    }

    #[test]
    fn test_collector_draft_normalised() {
        let draft = CollectorDraft {
            id: None,
            name: "  Spring campaign ".to_string(),
            start_date: date(2024, 3, 1),
            end_date: date(2024, 5, 31),
            periodicity: Periodicity::Monthly,
            weekday: Some(Weekday::Monday),
            client_id: Uuid::new_v4(),
        };

        let normalised = validate_collector_draft(&draft).unwrap();
        assert_eq!(normalised.name, "Spring campaign");
        assert_eq!(normalised.weekday, None);
        assert_eq!(normalised.client_id, draft.client_id);
    }

    #[test]
    fn test_placement_draft_dedups_links() {
        let supplier = Uuid::new_v4();
        let draft = PlacementDraft {
            id: None,
            collector_id: Uuid::new_v4(),
            type_id: Uuid::new_v4(),
            supplier_ids: vec![supplier, supplier],
            statistic_ids: vec![],
            copies: vec![" Buy now ".to_string()],
        };

        let normalised = validate_placement_draft(&draft).unwrap();
        assert_eq!(normalised.supplier_ids, vec![supplier]);
        assert_eq!(normalised.copies, vec!["Buy now".to_string()]);

        let empty_copy = PlacementDraft {
            copies: vec!["  ".to_string()],
            ..draft
        };
        assert!(validate_placement_draft(&empty_copy).is_err());
    }

    #[test]
    fn test_name_key_is_case_insensitive() {
        assert_eq!(name_key(" Acme "), name_key("ACME"));
    }
}
