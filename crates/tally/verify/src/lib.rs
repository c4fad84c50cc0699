//! Tally Verify - contract models and bounded verification
//!
//! Contracts are modelled in Rust ([`Contract`]): typed state, a
//! constructor, public entry points whose bodies act on the resource
//! ledger through an [`Execution`], and invariants, postconditions and
//! checks over the pre- and post-state of a transaction.
//!
//! The [`Verifier`] explores every reachable state inside configurable
//! [`Bounds`] and reports failures as labelled diagnostics in the
//! `kind:reason` vocabulary of `tally-types`.
//!
//! ```ignore
//! let report = Verifier::new(Bounds::default()).verify(&contract)?;
//! println!("{}", report.result);
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod config;
mod error;
mod exec;
mod model;
mod value;
mod verifier;

pub use config::{Bounds, TallyConfig, ToolPaths};
pub use error::{Abort, ConfigError, Failure, VerifyError};
pub use exec::{Execution, ExecutionOutcome};
pub use model::{
    Constructor, Contract, DerivedResource, EntryPoint, Msg, Performs, Snapshot, Spec, Transition,
};
pub use value::{Args, Param, ParamKind, Value};
pub use verifier::{VerificationReport, VerificationResult, Verifier, DEPLOYER};

/// Result type for verification runs.
pub type Result<T> = std::result::Result<T, VerifyError>;
