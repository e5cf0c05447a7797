//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Default page size when `?limit=` is absent.
pub const DEFAULT_LIMIT: i64 = 50;

/// Largest page size a client may request.
pub const MAX_LIMIT: i64 = 500;

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// `?format=pdf|txt` for certificate downloads.
#[derive(Debug, Default, Deserialize)]
pub struct CertificateParams {
    pub format: Option<String>,
    /// Include the per-event list on aggregate certificates.
    #[serde(default)]
    pub itemized: bool,
}
