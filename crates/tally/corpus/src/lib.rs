//! Tally Corpus - annotated contract fixtures and their Rust models
//!
//! Every fixture under `fixtures/` is an annotated contract whose `#::`
//! directives state what verification must report. The matching module
//! models the same contract for [`tally_verify::Verifier`]; running the
//! model and comparing its diagnostics against the fixture with
//! [`tally_fixtures::Oracle`] is the end-to-end test of the toolchain.
//!
//! ```ignore
//! let model = tally_corpus::find("history").unwrap();
//! let report = model.verify(&Verifier::new(Bounds::default()))?;
//! let outcome = Oracle::compare(&model.fixture()?, report.result.diagnostics());
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod balances;

pub mod bank;
pub mod counter;
pub mod foreach;
pub mod history;
pub mod operator;
pub mod performs;
pub mod swap;
pub mod token;
pub mod wrapper;

pub use balances::Balances;

use tally_fixtures::Fixture;
use tally_types::ResourceDecl;
use tally_verify::{VerificationReport, Verifier};
use tracing::info;

/// A fixture paired with the model that verifies it.
#[derive(Clone, Copy)]
pub struct Model {
    pub name: &'static str,
    pub summary: &'static str,
    /// Annotated source of the fixture.
    pub source: &'static str,
    run: fn(&Verifier) -> tally_verify::Result<VerificationReport>,
    resources: fn() -> Vec<ResourceDecl>,
}

impl Model {
    /// Verify the model with `verifier`.
    pub fn verify(&self, verifier: &Verifier) -> tally_verify::Result<VerificationReport> {
        info!(model = self.name, "Verifying model");
        (self.run)(verifier)
    }

    /// Resources the model declares, derived ones included.
    pub fn resources(&self) -> Vec<ResourceDecl> {
        (self.resources)()
    }

    /// Parse the fixture the model belongs to.
    pub fn fixture(&self) -> tally_fixtures::Result<Fixture> {
        Fixture::parse(self.name, self.source)
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("summary", &self.summary)
            .finish()
    }
}

macro_rules! model {
    ($module:ident, $name:literal, $summary:literal) => {
        Model {
            name: $name,
            summary: $summary,
            source: include_str!(concat!("../fixtures/", $name, ".vy")),
            run: |verifier| verifier.verify(&$module::contract()),
            resources: || $module::contract().resources().to_vec(),
        }
    };
}

/// Every model in the corpus, ordered by name.
pub fn models() -> Vec<Model> {
    vec![
        model!(bank, "bank", "deposits as wei allocations; leaking selfdestruct"),
        model!(counter, "counter", "bounded counter with postconditions and a check"),
        model!(history, "history", "invariant over old and new state"),
        model!(
            foreach,
            "non_injective_foreach",
            "quantified offers must be injective"
        ),
        model!(operator, "operator", "trusted operators act for owners"),
        model!(performs, "performs", "performs clauses restrict resource effects"),
        model!(swap, "swap", "offers and exchanges of goods for wei"),
        model!(token, "token", "minting needs the creator right"),
        model!(wrapper, "wrapper", "derived resource backed by an underlying holding"),
    ]
}

/// Look a model up by fixture name.
pub fn find(name: &str) -> Option<Model> {
    models().into_iter().find(|m| m.name == name)
}
