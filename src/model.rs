use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

/// A validated price sighting, exactly as it is sent to the sheet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PriceObservation {
    pub product: String,
    pub city: String,
    pub shop: String,
    pub price: f64,
    pub timestamp: String,
}

/// Inbound POST body after allow-listing and coercion, not yet validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPrice {
    pub product: String,
    pub city: String,
    pub shop: String,
    pub price: f64,
}

impl NewPrice {
    /// Anything that isn't a JSON object is treated as an empty payload.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Self::from_json(&value),
            Err(_) => Self::default(),
        }
    }

    pub fn from_json(value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };

        Self {
            product: text("product"),
            city: text("city"),
            shop: text("shop"),
            price: clamp(value.get("price").map_or(f64::NAN, coerce_number)),
        }
    }

    pub fn into_observation(self, timestamp: String) -> Result<PriceObservation, Error> {
        if self.product.is_empty() || self.city.is_empty() || self.shop.is_empty() || self.price <= 0.0 {
            return Err(Error::InvalidPayload);
        }

        Ok(PriceObservation {
            product: self.product,
            city: self.city,
            shop: self.shop,
            price: self.price,
            timestamp,
        })
    }
}

/// GET filters. Missing params become empty strings once normalized.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PriceQuery {
    pub product: String,
    pub city: String,
    pub shop: String,
}

impl PriceQuery {
    /// Builds the filters from raw query pairs. A repeated key is joined
    /// with commas (`?product=a&product=b` reads as `"a,b"`), unknown keys
    /// are ignored.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let joined = |key: &str| {
            pairs
                .iter()
                .filter(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .collect::<Vec<_>>()
                .join(",")
        };

        Self {
            product: joined("product"),
            city: joined("city"),
            shop: joined("shop"),
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            product: self.product.trim().to_string(),
            city: self.city.trim().to_string(),
            shop: self.shop.trim().to_string(),
        }
    }

    pub fn as_params(&self) -> [(&'static str, &str); 3] {
        [
            ("product", self.product.as_str()),
            ("city", self.city.as_str()),
            ("shop", self.shop.as_str()),
        ]
    }
}

/// One row of the sheet's row-array response. Cells are kept as raw JSON:
/// the sheet happily emits numbers for shop or city (store numbers,
/// postcodes).
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    #[serde(default)]
    pub city: Value,
    #[serde(default)]
    pub shop: Value,
    #[serde(default)]
    pub price: Value,
}

impl SheetRow {
    /// Shop name as text, `None` for empty, zero, false or missing cells.
    pub fn shop(&self) -> Option<String> {
        match &self.shop {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            Value::Bool(true) => Some("true".to_string()),
            _ => None,
        }
    }

    /// `None` when the sheet cell is empty or doesn't hold a usable number.
    pub fn price(&self) -> Option<f64> {
        match &self.price {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            value => {
                let n = coerce_number(value);
                n.is_finite().then_some(n)
            }
        }
    }
}

/// Summary returned for a GET against the row schema.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub avg_price: String,
    pub cheapest_price: String,
    pub cheapest_store: String,
    pub price_range: PriceRange,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PriceRange {
    pub min: String,
    pub max: String,
}

/// Loose numeric coercion: numbers pass through, numeric strings are
/// parsed, booleans map to 0/1, blanks and null to 0, everything else to NaN.
pub fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

/// NaN and infinities count as 0; negatives are raised to 0.
pub fn clamp(n: f64) -> f64 {
    if n.is_finite() {
        n.max(0.0)
    } else {
        0.0
    }
}

/// UTC, millisecond precision, `Z` suffix.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
