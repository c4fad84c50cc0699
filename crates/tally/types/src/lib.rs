//! Tally Types - shared vocabulary of the resource-ledger verifier
//!
//! Addresses and amounts, resources and offers, and the diagnostic
//! vocabulary (`kind:reason`) that verification runs and fixture oracles
//! agree on.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod address;
mod diagnostic;
mod error;
mod resource;

pub use address::*;
pub use diagnostic::*;
pub use error::*;
pub use resource::*;

/// Name of the implicit resource every contract carries.
pub const WEI: &str = "wei";

/// Name reported for constructor diagnostics.
pub const INIT: &str = "__init__";
