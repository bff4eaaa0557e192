//! Rule-based normalization and derivation helpers shared by the grammars.

pub mod amounts;
pub mod classify;
pub mod patterns;
pub mod period;
pub mod tax;

pub use amounts::{format_money, format_signed, group_thousands, parse_amount, parse_count, parse_weight, round_money};
pub use classify::{classify_charge, order_size};
pub use period::{week_from_date, week_from_text};
pub use tax::{calculate_gross, calculate_tax, TaxCode};
