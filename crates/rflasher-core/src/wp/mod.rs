//! Write protection support
//!
//! This module provides types and functions for working with flash chip
//! write protection: decoding/solving BP+TB+SEC+CMP protected ranges
//! ([`ranges`]) and driving the status-register read/modify/write sequence
//! against a live chip ([`ops`]).

mod ops;
mod ranges;
mod types;

pub use ops::*;
pub use ranges::{decode_range, decode_spi25_wp, find_bits_for_range};
#[cfg(feature = "alloc")]
pub use ranges::get_all_ranges;
pub use types::*;
