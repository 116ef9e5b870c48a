//! Utility functions for common type conversions and transformations.
//!
//! This module provides hex helpers and the low-level EIP-712 word encoder
//! used by the typed-data hasher.

pub mod eip712;
pub mod formatting;
pub mod serde_hex;

pub use eip712::{compute_final_digest, Eip712AbiEncoder};
pub use formatting::{with_0x_prefix, without_0x_prefix};
