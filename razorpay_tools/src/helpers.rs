use chrono::Utc;
use rand::Rng;

/// Generates a receipt reference for a new gateway order. Receipts are at most 40 characters.
pub fn new_receipt() -> String {
    let nonce: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("receipt_{}_{nonce:06}", Utc::now().timestamp_millis())
}
