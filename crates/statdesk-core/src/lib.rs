//! # statdesk-core: Pure Domain Logic for Statdesk
//!
//! This crate holds the domain of Statdesk: statistics collectors, their
//! placements and reporting periods. Everything here is pure, with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Statdesk Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/statdesk-api (axum)                        │   │
//! │  │   dictionaries • collectors • placements • export • reminders   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        statdesk-sync (orchestrator + remote client)             │   │
//! │  └───────────────┬─────────────────────────────┬───────────────────┘   │
//! │                  │                             │                        │
//! │  ┌───────────────▼─────────────────┐   ┌───────▼───────────────────┐   │
//! │  │  statdesk-db (SQLite store)     │   │  remote statistics service│   │
//! │  └───────────────┬─────────────────┘   └───────────────────────────┘   │
//! │                  │                                                      │
//! │  ┌───────────────▼─────────────────────────────────────────────────┐   │
//! │  │               ★ statdesk-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌────────────┐ ┌──────────┐        │   │
//! │  │   │  types   │ │ periods  │ │ validation │ │ snapshot │ export │   │
//! │  │   └──────────┘ └──────────┘ └────────────┘ └──────────┘        │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Collector, Placement, Period, dictionaries)
//! - [`periods`] - Period generator
//! - [`validation`] - Input validation and normalisation
//! - [`snapshot`] - JSON shapes exchanged with the remote service
//! - [`export`] - Flattened statistics table
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use statdesk_core::periods::generate_periods;
//! use statdesk_core::{Periodicity, Weekday};
//!
//! let periods = generate_periods(
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
//!     Periodicity::Weekly,
//!     Some(Weekday::Wednesday),
//! )
//! .unwrap();
//!
//! // Anchored to the Wednesday before Jan 1st.
//! assert_eq!(periods[0].name, "2023.12.27 - 01.02");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod export;
pub mod periods;
pub mod snapshot;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use export::StatsTable;
pub use periods::PeriodSpec;
pub use snapshot::{CollectorSnapshot, StatisticsPayload};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of any name or copy text, in characters.
pub const MAX_NAME_LEN: usize = 255;
