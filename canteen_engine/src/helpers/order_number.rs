use rand::Rng;

use crate::db_types::ORDER_NUMBER_PREFIX;

pub const ORDER_SUFFIX_LENGTH: usize = 8;
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Eight random uppercase alphanumeric characters.
pub fn random_order_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..ORDER_SUFFIX_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

pub fn is_valid_order_number(s: &str) -> bool {
    match s.strip_prefix(ORDER_NUMBER_PREFIX) {
        Some(suffix) => {
            suffix.len() == ORDER_SUFFIX_LENGTH
                && suffix.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        },
        None => false,
    }
}
