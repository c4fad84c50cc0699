//! `tally verify`: run fixtures through their models and the oracle

use std::path::PathBuf;

use clap::Args;
use colored::*;
use serde::Serialize;
use tabled::Tabled;
use tally_fixtures::{discover, Fixture, FixtureOutcome, Oracle};
use tally_verify::{TallyConfig, VerificationReport, Verifier};
use tracing::{debug, warn};

use crate::error::CliResult;
use crate::output::{print_error, print_output, print_success, print_warning, OutputFormat};

/// Arguments of `tally verify`
#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Fixture files or directories to scan for `.vy` fixtures
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Maximum number of transactions after deployment
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Largest `uint256` argument, payment and quantified value
    #[arg(long)]
    pub max_value: Option<u128>,

    /// Number of distinct senders and address arguments
    #[arg(long)]
    pub addresses: Option<u64>,
}

/// One line of the verification summary
#[derive(Debug, Serialize, Tabled)]
pub struct FixtureRow {
    #[tabled(rename = "Fixture")]
    pub fixture: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Matched")]
    pub matched: usize,
    #[tabled(rename = "Missing")]
    pub missing: usize,
    #[tabled(rename = "Unexpected")]
    pub unexpected: usize,
    #[tabled(rename = "States")]
    pub states: usize,
    #[tabled(rename = "Time (ms)")]
    pub elapsed_ms: u64,
    #[tabled(skip)]
    pub passed: bool,
}

impl FixtureRow {
    fn checked(outcome: &FixtureOutcome, report: &VerificationReport) -> Self {
        let status = if outcome.ignored {
            "ignored"
        } else if outcome.passed {
            "passed"
        } else {
            "failed"
        };
        Self {
            fixture: outcome.fixture.clone(),
            status: status.to_string(),
            matched: outcome.matched.len(),
            missing: outcome.missing.len(),
            unexpected: outcome.unexpected.len(),
            states: report.states_explored,
            elapsed_ms: report.elapsed_ms,
            passed: outcome.passed,
        }
    }

    fn ignored(fixture: &Fixture) -> Self {
        Self::without_run(fixture, "ignored", true)
    }

    fn unmodelled(fixture: &Fixture) -> Self {
        Self::without_run(fixture, "no model", false)
    }

    fn without_run(fixture: &Fixture, status: &str, passed: bool) -> Self {
        Self {
            fixture: fixture.name.clone(),
            status: status.to_string(),
            matched: 0,
            missing: 0,
            unexpected: 0,
            states: 0,
            elapsed_ms: 0,
            passed,
        }
    }
}

/// Execute `tally verify`. Returns whether every fixture passed.
pub fn execute(
    args: VerifyArgs,
    config: &TallyConfig,
    format: OutputFormat,
    verbose: bool,
) -> CliResult<bool> {
    let mut bounds = config.bounds.clone();
    if let Some(depth) = args.max_depth {
        bounds.max_depth = depth;
    }
    if let Some(value) = args.max_value {
        bounds.max_value = value;
    }
    if let Some(addresses) = args.addresses {
        bounds.addresses = addresses;
    }
    bounds.validate()?;

    let files = discover(&args.paths)?;
    if files.is_empty() {
        print_warning("No fixtures found");
        return Ok(true);
    }

    let verifier = Verifier::new(bounds);
    let table = format == OutputFormat::Table;
    let mut rows = Vec::with_capacity(files.len());

    for path in &files {
        let fixture = Fixture::load(path)?;
        debug!(fixture = %fixture.name, path = %path.display(), "Loaded fixture");

        // An ignored fixture passes without needing a model.
        if fixture.is_ignored() {
            rows.push(FixtureRow::ignored(&fixture));
            continue;
        }
        let Some(model) = tally_corpus::find(&fixture.name) else {
            warn!(fixture = %fixture.name, "No model registered for fixture");
            rows.push(FixtureRow::unmodelled(&fixture));
            continue;
        };

        let report = model.verify(&verifier)?;
        if report.truncated {
            warn!(fixture = %fixture.name, states = report.states_explored, "Exploration truncated");
        }
        let outcome = Oracle::compare(&fixture, report.result.diagnostics());
        if table && verbose && !outcome.passed {
            explain(&outcome);
        }
        rows.push(FixtureRow::checked(&outcome, &report));
    }

    let failed = rows.iter().filter(|r| !r.passed).count();
    let total = rows.len();
    print_output(rows, format)?;

    if failed == 0 {
        if table {
            print_success(&format!("{} fixture(s) passed", total));
        }
        Ok(true)
    } else {
        print_error(&format!("{} of {} fixture(s) failed", failed, total));
        Ok(false)
    }
}

fn explain(outcome: &FixtureOutcome) {
    println!("{} {}", "Fixture".bold(), outcome.fixture.bold());
    for expectation in &outcome.missing {
        let label = expectation
            .label
            .as_deref()
            .map(|l| format!(" at {}", l))
            .unwrap_or_default();
        println!(
            "  {} {}{} ({})",
            "missing".red(),
            expectation.id,
            label,
            expectation.anchor
        );
    }
    for diagnostic in &outcome.unexpected {
        println!("  {} {}", "unexpected".red(), diagnostic);
    }
}
