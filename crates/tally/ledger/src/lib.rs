//! # tally-ledger
//!
//! The resource ledger every verified contract carries:
//!
//! - **allocations**: how much of each resource each address holds
//! - **offers**: outstanding permissions to exchange one resource for another
//! - **creator rights**: `creator(r)` allocations gate minting of `r`
//! - **trust**: which addresses may act on another address's allocations
//!
//! ## Conservation
//!
//! The total allocation of a resource changes only through `create` and
//! `destroy` (plus wei entering or leaving through `allocate`/`deallocate`).
//! `reallocate` and `exchange` move quantities between holders and never
//! change totals.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod effect;
pub mod error;
pub mod ledger;

pub use effect::EffectKind;
pub use error::{LedgerError, Result};
pub use ledger::{Ledger, LedgerEntry, LedgerSnapshot, OfferEntry};
