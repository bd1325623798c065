//! Shared building blocks for the drip workspace: address types,
//! logging bootstrap and configuration loading.

pub mod types;
pub mod utils;

pub use types::{Address, AddressParseError, Amount, Timestamp};
