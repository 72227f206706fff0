// ═══════════════════════════════════════════════════════════════════
// Error Tests — CoreError variants, Display formatting, From impls
// ═══════════════════════════════════════════════════════════════════

use silver_tracker_core::errors::CoreError;

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn api_error() {
        let err = CoreError::Api {
            provider: "metals.dev".into(),
            message: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "API error (metals.dev): rate limited");
    }

    #[test]
    fn network_error() {
        let err = CoreError::Network("connection refused".into());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn invalid_payload() {
        let err = CoreError::InvalidPayload("missing price".into());
        assert_eq!(err.to_string(), "Invalid price payload: missing price");
    }

    #[test]
    fn persistence_error() {
        let err = CoreError::Persistence {
            collection: "silver_assets".into(),
            message: "HTTP 500".into(),
        };
        assert_eq!(err.to_string(), "Persistence error (silver_assets): HTTP 500");
    }

    #[test]
    fn deserialization_error() {
        assert_eq!(
            CoreError::Deserialization("y".into()).to_string(),
            "Deserialization error: y"
        );
    }

    #[test]
    fn configuration_error() {
        let err = CoreError::Configuration("no API key".into());
        assert_eq!(err.to_string(), "Configuration error: no API key");
    }

    #[test]
    fn validation_error() {
        let err = CoreError::ValidationError("name must not be empty".into());
        assert_eq!(err.to_string(), "Holding validation failed: name must not be empty");
    }

    #[test]
    fn holding_not_found() {
        let err = CoreError::HoldingNotFound("abc-123".into());
        assert_eq!(err.to_string(), "Holding not found: abc-123");
    }
}

// ── Debug ───────────────────────────────────────────────────────────

mod debug {
    use super::*;

    #[test]
    fn debug_names_variant() {
        let err = CoreError::Network("x".into());
        assert!(format!("{err:?}").contains("Network"));
    }
}

// ── From impls ──────────────────────────────────────────────────────

mod conversions {
    use super::*;

    #[test]
    fn from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CoreError = json_err.into();
        assert!(matches!(err, CoreError::Deserialization(_)));
    }

    #[test]
    fn question_mark_converts_serde_json() {
        fn parse() -> Result<serde_json::Value, CoreError> {
            Ok(serde_json::from_str("[1,")?)
        }
        assert!(parse().is_err());
    }

    #[tokio::test]
    async fn from_reqwest_redacts_query() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{addr}/latest?api_key=super-secret&unit=toz");
        let reqwest_err = reqwest::get(&url).await.unwrap_err();
        let err: CoreError = reqwest_err.into();
        let msg = err.to_string();
        assert!(matches!(err, CoreError::Network(_)));
        assert!(!msg.contains("super-secret"), "{msg}");
        assert!(msg.contains("<query redacted>"), "{msg}");
    }
}

// ── Trait bounds ────────────────────────────────────────────────────

mod traits {
    use super::*;

    #[test]
    fn is_std_error_send_sync() {
        fn assert_bounds<T: std::error::Error + Send + Sync + 'static>() {}
        assert_bounds::<CoreError>();
    }
}
