use thiserror::Error;

/// Unified error type for the entire silver-tracker-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid price payload: {0}")]
    InvalidPayload(String),

    // ── Persistence ─────────────────────────────────────────────────
    #[error("Persistence error ({collection}): {message}")]
    Persistence {
        collection: String,
        message: String,
    },

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Configuration ───────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Holding validation failed: {0}")]
    ValidationError(String),

    #[error("Holding not found: {0}")]
    HoldingNotFound(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL; the query string holds the API key.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            let tail = msg[idx..]
                .find(|c: char| c == ')' || c.is_whitespace())
                .map(|end| &msg[idx + end..])
                .unwrap_or("");
            format!("{}?<query redacted>{}", &msg[..idx], tail)
        } else {
            msg
        };
        if e.is_timeout() {
            CoreError::Network(format!("request timed out: {sanitized}"))
        } else {
            CoreError::Network(sanitized)
        }
    }
}
