//! # HTTP Routes
//!
//! ```text
//! GET    /healthz
//!
//! GET|POST        /api/{clients|statistics|placement-types|suppliers}
//! GET|PUT|DELETE  /api/{kind}/{id}
//!
//! GET|POST        /api/collectors
//! GET|PUT|DELETE  /api/collectors/{id}
//! POST            /api/collectors/{id}/sync
//! GET             /api/collectors/{id}/json
//! GET             /api/collectors/{id}/periods
//! GET             /api/collectors/{id}/export
//!
//! GET|POST        /api/collectors/{id}/placements
//! GET|PUT|DELETE  /api/collectors/{id}/placements/{placement_id}
//!
//! POST            /api/reminders
//! ```

pub mod collectors;
pub mod dictionaries;
pub mod health;
pub mod placements;
pub mod reminders;
pub mod suppliers;

use axum::Router;
use statdesk_core::DictionaryKind;

use crate::AppState;

/// Builds the full router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(dictionaries::routes(DictionaryKind::Client))
        .merge(dictionaries::routes(DictionaryKind::Statistic))
        .merge(dictionaries::routes(DictionaryKind::PlacementType))
        .merge(suppliers::routes())
        .merge(collectors::routes())
        .merge(placements::routes())
        .merge(reminders::routes())
        .with_state(state)
}
