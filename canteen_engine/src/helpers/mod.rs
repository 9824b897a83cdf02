mod order_number;

pub use order_number::{is_valid_order_number, random_order_suffix, ORDER_SUFFIX_LENGTH};
