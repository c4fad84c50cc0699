//! Tally Fixtures - test-oracle side of the contract corpus
//!
//! Reads `.vy` contract fixtures for what the verifier is expected to
//! report:
//!
//! - `#:: ExpectedOutput(kind:reason[, LABEL])` directives and their anchors
//! - `#:: Label(NAME)` definitions
//! - `UnexpectedOutput`, `MissingOutput` and `IgnoreFile` bookkeeping
//! - `#@ resource:` and `#@ derived resource:` declarations
//!
//! [`Oracle::compare`] then decides whether a verification run matches.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod directive;
pub mod error;
pub mod fixture;
pub mod oracle;
pub mod scan;

pub use directive::{parse_directives, Directive};
pub use error::{DirectiveError, Result};
pub use fixture::{Anchor, Expectation, Fixture, KnownIssue, LabelDef};
pub use oracle::{FixtureOutcome, Oracle};
pub use scan::discover;
