//! # Tax Submission Errors
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Tax Error Categories                               │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │    Transport    │  │      Lookup             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Config         │  │  Http           │  │  Database               │ │
//! │  │  InvalidUrl     │  │  Rejected       │  │  Serialization          │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these ever reach a cashier. The ledger logs them and moves on.

use thiserror::Error;

/// Result type alias for tax operations.
pub type TaxResult<T> = Result<T, TaxError>;

#[derive(Debug, Error)]
pub enum TaxError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid tax configuration.
    #[error("Invalid tax configuration: {0}")]
    Config(String),

    /// Submission URL does not parse.
    #[error("Invalid submission URL: {0}")]
    InvalidUrl(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Request could not be sent or timed out.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("Tax endpoint rejected invoice {invoice_number} with status {status}: {body}")]
    Rejected {
        invoice_number: String,
        status: u16,
        body: String,
    },

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    /// Buyer lookup failed.
    #[error("Database error: {0}")]
    Database(#[from] duka_db::DbError),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<url::ParseError> for TaxError {
    fn from(err: url::ParseError) -> Self {
        TaxError::InvalidUrl(err.to_string())
    }
}

impl From<toml::de::Error> for TaxError {
    fn from(err: toml::de::Error) -> Self {
        TaxError::Config(err.to_string())
    }
}

impl From<std::io::Error> for TaxError {
    fn from(err: std::io::Error) -> Self {
        TaxError::Config(err.to_string())
    }
}

impl TaxError {
    /// Whether resubmitting the same invoice later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            TaxError::Http(e) => e.is_timeout() || e.is_connect(),
            TaxError::Rejected { status, .. } => *status >= 500 || *status == 429,
            TaxError::Database(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_retryability() {
        let server_side = TaxError::Rejected {
            invoice_number: "POS-01-00001".into(),
            status: 503,
            body: String::new(),
        };
        assert!(server_side.is_retryable());

        let bad_payload = TaxError::Rejected {
            invoice_number: "POS-01-00001".into(),
            status: 422,
            body: "missing seller_pin".into(),
        };
        assert!(!bad_payload.is_retryable());
        assert!(bad_payload.to_string().contains("422"));
    }

    #[test]
    fn test_url_error_conversion() {
        let err: TaxError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, TaxError::InvalidUrl(_)));
        assert!(!err.is_retryable());
    }
}
