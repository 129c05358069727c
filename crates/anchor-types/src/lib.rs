//! Shared types for the credential anchoring workspace.
//!
//! Everything that crosses a crate boundary lives here: the chain catalogue,
//! the unsigned/signed transaction shapes, broadcast bookkeeping and the
//! configuration schema helpers used to validate raw TOML tables.

pub mod chains;
pub mod delivery;
pub mod transaction;
pub mod validation;

pub use chains::*;
pub use delivery::*;
pub use transaction::*;
pub use validation::*;

/// Re-exported so downstream crates agree on one address/amount type.
pub use alloy::primitives::{Address, U256};

/// Number of wei in one Gwei.
pub const WEI_PER_GWEI: u128 = 1_000_000_000;
