//! Client-held cart lines.
//!
//! The cart lives in the browser and arrives with the checkout request as a
//! JSON array of `{id, quantity}` objects. Nothing about it is trusted: ids
//! are revalidated against the catalog by the pricing step, and this module
//! only turns the loose client shape into typed [`CartLine`]s.
//!
//! Parsing is lenient per line and strict per document:
//! - a body that is not a JSON array rejects the whole cart
//! - a line without a usable product id is dropped
//! - a line with a non-positive quantity is dropped
//! - a missing or malformed quantity defaults to 1

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::ProductId;

/// Errors for a cart document that cannot be read at all.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The cart is not valid JSON.
    #[error("cart is not valid JSON: {0}")]
    Malformed(String),
    /// The cart is JSON but not an array of lines.
    #[error("cart must be a list of items")]
    NotAList,
}

/// One client-declared intent to buy `quantity` units of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CartLine {
    pub id: ProductId,
    pub quantity: u32,
}

impl CartLine {
    /// Create a cart line.
    #[must_use]
    pub const fn new(id: ProductId, quantity: u32) -> Self {
        Self { id, quantity }
    }
}

/// Parse the serialized cart sent by the browser.
///
/// # Errors
///
/// Returns [`CartError`] when the document is not a JSON array. Individual
/// bad lines never fail the parse; they are dropped.
pub fn parse_client_cart(raw: &str) -> Result<Vec<CartLine>, CartError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value =
        serde_json::from_str(raw).map_err(|e| CartError::Malformed(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(CartError::NotAList);
    };

    Ok(items.iter().filter_map(parse_line).collect())
}

fn parse_line(item: &Value) -> Option<CartLine> {
    let id = item.get("id").and_then(as_integer)?;
    let id = i32::try_from(id).ok()?;

    let quantity = match item.get("quantity").map(as_integer) {
        None | Some(None) => 1,
        Some(Some(q)) if q < 1 => return None,
        Some(Some(q)) => u32::try_from(q).unwrap_or(u32::MAX),
    };

    Some(CartLine::new(ProductId::new(id), quantity))
}

/// Accept integers, integral floats, and numeric strings (browsers store
/// localStorage values as strings).
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 1e15)
                .map(|f| {
                    #[allow(clippy::cast_possible_truncation)] // bounded above
                    let i = f as i64;
                    i
                })
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i32, quantity: u32) -> CartLine {
        CartLine::new(ProductId::new(id), quantity)
    }

    #[test]
    fn test_parses_well_formed_cart() {
        let lines = parse_client_cart(r#"[{"id":1,"quantity":2},{"id":3,"quantity":1}]"#).unwrap();
        assert_eq!(lines, vec![line(1, 2), line(3, 1)]);
    }

    #[test]
    fn test_accepts_string_ids_and_quantities() {
        let lines = parse_client_cart(r#"[{"id":"7","quantity":"4"}]"#).unwrap();
        assert_eq!(lines, vec![line(7, 4)]);
    }

    #[test]
    fn test_malformed_quantity_defaults_to_one() {
        let lines = parse_client_cart(
            r#"[{"id":1},{"id":2,"quantity":"lots"},{"id":3,"quantity":null},{"id":4,"quantity":2.5}]"#,
        )
        .unwrap();
        assert_eq!(lines, vec![line(1, 1), line(2, 1), line(3, 1), line(4, 1)]);
    }

    #[test]
    fn test_non_positive_quantity_drops_line() {
        let lines =
            parse_client_cart(r#"[{"id":1,"quantity":0},{"id":2,"quantity":-3},{"id":3}]"#).unwrap();
        assert_eq!(lines, vec![line(3, 1)]);
    }

    #[test]
    fn test_line_without_usable_id_is_dropped() {
        let lines =
            parse_client_cart(r#"[{"quantity":1},{"id":"abc"},{"id":null},"junk",{"id":5}]"#).unwrap();
        assert_eq!(lines, vec![line(5, 1)]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(parse_client_cart("").unwrap().is_empty());
        assert!(parse_client_cart("[]").unwrap().is_empty());
    }

    #[test]
    fn test_document_errors() {
        assert!(matches!(parse_client_cart("[{"), Err(CartError::Malformed(_))));
        assert_eq!(parse_client_cart(r#"{"id":1}"#), Err(CartError::NotAList));
    }
}
