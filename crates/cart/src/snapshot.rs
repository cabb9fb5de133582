//! Serialized cart snapshots.
//!
//! The persisted layout is a JSON array of line records:
//!
//! ```json
//! [{"productId":1,"name":"Runner","price":"139.90","imageUrl":"https://...","amount":2}]
//! ```
//!
//! There is no version field. Anything that fails to decode, including data
//! that breaks the cart invariants, is reported as an error and the caller
//! discards it.

use thiserror::Error;

use crate::cart::Cart;

/// Errors encoding or decoding a cart snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// JSON (de)serialization failed, including invariant violations.
    #[error("malformed cart snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize a cart for storage.
///
/// # Errors
///
/// Returns `SnapshotError` if serialization fails.
pub fn encode(cart: &Cart) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(cart)?)
}

/// Deserialize a stored snapshot.
///
/// # Errors
///
/// Returns `SnapshotError` if the data is not a valid cart.
pub fn decode(raw: &str) -> Result<Cart, SnapshotError> {
    Ok(serde_json::from_str(raw)?)
}
