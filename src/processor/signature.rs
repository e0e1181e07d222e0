//! HMAC-SHA256 verification of payment callbacks.
//!
//! The processor signs `order_id|payment_id` with the key secret it shares
//! with this gateway and hands the hex digest to the client, which forwards
//! it to `/verify`. A forged or tampered callback cannot produce a matching
//! digest without the secret.

use crate::error::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Separator between order id and payment id in the signed payload.
pub const PAYLOAD_SEPARATOR: &str = "|";

fn keyed_mac(secret: &[u8], order_id: &str, payment_id: &str) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| Error::Config(format!("Invalid signing secret: {e}")))?;
    mac.update(order_id.as_bytes());
    mac.update(PAYLOAD_SEPARATOR.as_bytes());
    mac.update(payment_id.as_bytes());
    Ok(mac)
}

/// Compute the hex signature for an `(order_id, payment_id)` pair.
///
/// # Errors
///
/// Returns an error if the secret cannot key the MAC.
pub fn compute_signature(secret: &[u8], order_id: &str, payment_id: &str) -> Result<String> {
    let mac = keyed_mac(secret, order_id, payment_id)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a hex signature for an `(order_id, payment_id)` pair.
///
/// The digest comparison is constant time.
///
/// # Errors
///
/// Returns `Error::Forbidden` if the signature is malformed or does not match.
pub fn verify_signature(
    secret: &[u8],
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<()> {
    let Ok(provided) = hex::decode(signature) else {
        debug!("Signature for order {order_id} is not valid hex");
        return Err(Error::Forbidden("invalid signature".to_string()));
    };

    keyed_mac(secret, order_id, payment_id)?
        .verify_slice(&provided)
        .map_err(|_| Error::Forbidden("invalid signature".to_string()))
}
