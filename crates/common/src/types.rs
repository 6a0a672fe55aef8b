use serde::Serialize;

/// Product name shown in the page title and headings.
pub const PRODUCT_NAME: &str = "Tickets P2P";

/// Title advertised by the backend API documentation.
pub const API_TITLE: &str = "Tickets P2P API";

/// Version advertised by the backend API documentation.
pub const API_VERSION: &str = "1.0.0";

pub const API_DESCRIPTION: &str =
    "A peer-to-peer marketplace platform for event ticket reselling";

/// Port the backend listens on by default.
pub const DEFAULT_BACKEND_PORT: u16 = 8000;

/// Port the frontend listens on by default.
pub const DEFAULT_FRONTEND_PORT: u16 = 3000;

/// Value of `status` reported by a live backend.
pub const STATUS_HEALTHY: &str = "healthy";

/// Value of `database` reported when the database probe succeeds.
pub const DATABASE_CONNECTED: &str = "connected";

const DATABASE_ERROR_PREFIX: &str = "error: ";

/// Outcome of the backend's database probe.
///
/// Serialized as a plain string: `"connected"` or `"error: <reason>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum DatabaseStatus {
    Connected,
    Error(String),
}

impl From<DatabaseStatus> for String {
    fn from(status: DatabaseStatus) -> Self {
        status.to_string()
    }
}

impl std::fmt::Display for DatabaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseStatus::Connected => f.write_str(DATABASE_CONNECTED),
            DatabaseStatus::Error(reason) => write!(f, "{DATABASE_ERROR_PREFIX}{reason}"),
        }
    }
}

/// Body of `GET /health`.
///
/// Carries exactly two keys: `status` and `database`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub database: DatabaseStatus,
}

impl HealthReport {
    /// A report from a live backend with the given database probe outcome.
    pub fn healthy(database: DatabaseStatus) -> Self {
        Self {
            status: STATUS_HEALTHY.to_string(),
            database,
        }
    }
}
