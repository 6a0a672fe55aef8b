pub mod docs;
pub mod health;
pub mod metrics;
pub mod root;

use crate::database::DatabaseProbe;

/// Shared application state accessible from all handlers.
pub struct AppState<D: DatabaseProbe> {
    pub database: D,
}
