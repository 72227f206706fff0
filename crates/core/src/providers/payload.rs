use serde_json::Value;

use crate::errors::CoreError;
use crate::models::quote::SpotReading;

/// Parse a price response into a [`SpotReading`].
///
/// Two shapes are accepted:
/// - flat: `{ "price": 31.2, "prev_close_price": 30.9, "open_price": .., "low_price": .., "high_price": .. }`
/// - nested: `{ "metals": { "silver": 31.2, .. }, .. }`
///
/// The price must be a finite positive number. Optional reference fields
/// are taken only when numeric.
pub fn parse_spot_payload(payload: &Value) -> Result<SpotReading, CoreError> {
    if let Some(raw) = payload.get("price") {
        let price = positive_number(raw, "price")?;
        return Ok(SpotReading {
            price,
            previous_close: optional_number(payload, "prev_close_price"),
            open: optional_number(payload, "open_price"),
            high: optional_number(payload, "high_price"),
            low: optional_number(payload, "low_price"),
        });
    }

    if let Some(raw) = payload.get("metals").and_then(|m| m.get("silver")) {
        let price = positive_number(raw, "metals.silver")?;
        return Ok(SpotReading::price_only(price));
    }

    Err(CoreError::InvalidPayload(
        "response has neither `price` nor `metals.silver`".into(),
    ))
}

/// Parse raw response text. Non-JSON bodies are a payload error.
pub fn parse_spot_text(body: &str) -> Result<SpotReading, CoreError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| CoreError::InvalidPayload(format!("response is not JSON: {e}")))?;
    parse_spot_payload(&value)
}

fn positive_number(raw: &Value, field: &str) -> Result<f64, CoreError> {
    let price = raw
        .as_f64()
        .ok_or_else(|| CoreError::InvalidPayload(format!("`{field}` is not a number: {raw}")))?;
    if !price.is_finite() || price <= 0.0 {
        return Err(CoreError::InvalidPayload(format!(
            "`{field}` must be positive, got {price}"
        )));
    }
    Ok(price)
}

fn optional_number(payload: &Value, field: &str) -> Option<f64> {
    payload
        .get(field)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
}
