//! Comparison of verifier diagnostics against a fixture's directives.

use serde::{Deserialize, Serialize};
use tally_types::{Diagnostic, OutputId};
use tracing::{debug, warn};

use crate::fixture::{Anchor, Expectation, Fixture, KnownIssue};

/// Result of checking one verification run against its fixture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureOutcome {
    pub fixture: String,
    /// Expected outputs the run produced.
    pub matched: Vec<Expectation>,
    /// Expected outputs the run did not produce.
    pub missing: Vec<Expectation>,
    /// Expected outputs waived by a `MissingOutput` at the same anchor.
    pub waived: Vec<Expectation>,
    /// Diagnostics no directive accounts for.
    pub unexpected: Vec<Diagnostic>,
    /// Diagnostics accepted through `UnexpectedOutput`.
    pub tolerated: Vec<Diagnostic>,
    pub ignored: bool,
    pub passed: bool,
}

impl FixtureOutcome {
    pub fn summary(&self) -> String {
        if self.ignored {
            return "ignored".to_string();
        }
        format!(
            "{} matched, {} missing, {} unexpected",
            self.matched.len(),
            self.missing.len(),
            self.unexpected.len()
        )
    }
}

/// Test oracle.
pub struct Oracle;

impl Oracle {
    /// Check `diagnostics` against `fixture`.
    ///
    /// The fixture passes when every expected output not waived by a
    /// `MissingOutput` is paired with a diagnostic of its own, and every
    /// diagnostic was either expected or tolerated. One diagnostic never
    /// satisfies two expectations.
    pub fn compare(fixture: &Fixture, diagnostics: &[Diagnostic]) -> FixtureOutcome {
        let mut outcome = FixtureOutcome {
            fixture: fixture.name.clone(),
            ..FixtureOutcome::default()
        };
        if fixture.is_ignored() {
            debug!(fixture = %fixture.name, "Fixture ignored");
            outcome.ignored = true;
            outcome.passed = true;
            return outcome;
        }

        let (required, waived): (Vec<&Expectation>, Vec<&Expectation>) = fixture
            .expected
            .iter()
            .partition(|e| !is_waived(e, &fixture.missing));
        outcome.waived = waived.into_iter().cloned().collect();

        let assigned = assign(&required, diagnostics);
        for (expectation, diagnostic) in required.iter().zip(&assigned) {
            if diagnostic.is_some() {
                outcome.matched.push((*expectation).clone());
            } else {
                warn!(
                    fixture = %fixture.name,
                    id = %expectation.id,
                    anchor = %expectation.anchor,
                    "Expected output not reported"
                );
                outcome.missing.push((*expectation).clone());
            }
        }

        for diagnostic in diagnostics {
            if fixture
                .expected
                .iter()
                .any(|e| expectation_matches(e, diagnostic))
            {
                continue;
            }
            if fixture
                .unexpected
                .iter()
                .any(|u| site_matches(u.id, None, &u.anchor, diagnostic))
            {
                outcome.tolerated.push(diagnostic.clone());
                continue;
            }
            warn!(
                fixture = %fixture.name,
                id = %diagnostic.id(),
                function = %diagnostic.function,
                "Unexpected diagnostic"
            );
            outcome.unexpected.push(diagnostic.clone());
        }

        outcome.passed = outcome.missing.is_empty() && outcome.unexpected.is_empty();
        outcome
    }
}

/// Pair each expectation with a distinct diagnostic it matches, maximising
/// the number of pairs. Entry `i` holds the diagnostic index assigned to
/// `expectations[i]`.
fn assign(expectations: &[&Expectation], diagnostics: &[Diagnostic]) -> Vec<Option<usize>> {
    let candidates: Vec<Vec<usize>> = expectations
        .iter()
        .map(|e| {
            diagnostics
                .iter()
                .enumerate()
                .filter(|(_, d)| expectation_matches(e, d))
                .map(|(i, _)| i)
                .collect()
        })
        .collect();

    let mut owner: Vec<Option<usize>> = vec![None; diagnostics.len()];
    for expectation in 0..expectations.len() {
        let mut visited = vec![false; diagnostics.len()];
        augment(expectation, &candidates, &mut owner, &mut visited);
    }

    let mut assigned = vec![None; expectations.len()];
    for (diagnostic, expectation) in owner.iter().enumerate() {
        if let Some(expectation) = expectation {
            assigned[*expectation] = Some(diagnostic);
        }
    }
    assigned
}

fn augment(
    expectation: usize,
    candidates: &[Vec<usize>],
    owner: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for &diagnostic in &candidates[expectation] {
        if visited[diagnostic] {
            continue;
        }
        visited[diagnostic] = true;
        let free = match owner[diagnostic] {
            None => true,
            Some(other) => augment(other, candidates, owner, visited),
        };
        if free {
            owner[diagnostic] = Some(expectation);
            return true;
        }
    }
    false
}

fn is_waived(expectation: &Expectation, missing: &[KnownIssue]) -> bool {
    missing
        .iter()
        .any(|m| m.id == expectation.id && m.anchor.line == expectation.anchor.line)
}

fn expectation_matches(expectation: &Expectation, diagnostic: &Diagnostic) -> bool {
    site_matches(
        expectation.id,
        expectation.label.as_deref(),
        &expectation.anchor,
        diagnostic,
    )
}

fn site_matches(id: OutputId, label: Option<&str>, anchor: &Anchor, diagnostic: &Diagnostic) -> bool {
    if diagnostic.id() != id {
        return false;
    }
    if let Some(function) = &anchor.function {
        if diagnostic.function != *function {
            return false;
        }
    }
    match label {
        Some(label) => diagnostic.label.as_deref() == Some(label),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_types::{ErrorKind, Reason};

    const FIXTURE: &str = "\
#:: Label(INC)
#@ invariant: old(self.counter) <= self.counter

@public
def increment():
    self.counter += 1

#:: ExpectedOutput(invariant.violated:assertion.false, INC)
@public
def decrease():
    self.counter -= 1
";

    fn fixture() -> Fixture {
        Fixture::parse("history", FIXTURE).unwrap()
    }

    fn violation(function: &str, label: Option<&str>) -> Diagnostic {
        Diagnostic::new(ErrorKind::InvariantViolated, Reason::AssertionFalse, function)
            .with_label(label.map(str::to_string))
    }

    #[test]
    fn exact_diagnostics_pass() {
        let outcome = Oracle::compare(&fixture(), &[violation("decrease", Some("INC"))]);
        assert!(outcome.passed, "{}", outcome.summary());
        assert_eq!(outcome.matched.len(), 1);
    }

    #[test]
    fn silence_fails() {
        let outcome = Oracle::compare(&fixture(), &[]);
        assert!(!outcome.passed);
        assert_eq!(outcome.missing.len(), 1);
        assert_eq!(outcome.summary(), "0 matched, 1 missing, 0 unexpected");
    }

    #[test]
    fn wrong_function_or_label_fails() {
        let outcome = Oracle::compare(&fixture(), &[violation("increment", Some("INC"))]);
        assert!(!outcome.passed);
        assert_eq!(outcome.unexpected.len(), 1);
        assert_eq!(outcome.missing.len(), 1);

        let outcome = Oracle::compare(&fixture(), &[violation("decrease", None)]);
        assert!(!outcome.passed);
    }

    #[test]
    fn extra_diagnostic_fails() {
        let extra = Diagnostic::new(ErrorKind::ReallocateFailed, Reason::InsufficientFunds, "decrease");
        let outcome = Oracle::compare(&fixture(), &[violation("decrease", Some("INC")), extra]);
        assert!(!outcome.passed);
        assert_eq!(outcome.unexpected[0].kind, ErrorKind::ReallocateFailed);
    }

    #[test]
    fn unexpected_output_tolerates() {
        let source = "\
@public
def f():
    #:: UnexpectedOutput(call.failed:insufficient.funds, /tally/issue/4/)
    send(msg.sender, 1)
";
        let fixture = Fixture::parse("t", source).unwrap();
        let diag = Diagnostic::new(ErrorKind::CallFailed, Reason::InsufficientFunds, "f");
        let outcome = Oracle::compare(&fixture, &[diag.clone()]);
        assert!(outcome.passed);
        assert_eq!(outcome.tolerated, vec![diag]);
        // tolerance is optional
        assert!(Oracle::compare(&fixture, &[]).passed);
    }

    #[test]
    fn missing_output_waives_expectation() {
        let source = "\
@public
def f():
    #:: ExpectedOutput(assert.failed:assertion.false) | MissingOutput(assert.failed:assertion.false, /tally/issue/5/)
    assert False
";
        let fixture = Fixture::parse("m", source).unwrap();
        let outcome = Oracle::compare(&fixture, &[]);
        assert!(outcome.passed);
        assert_eq!(outcome.waived.len(), 1);
    }

    #[test]
    fn module_level_expectation_matches_any_function() {
        let source = "\
#:: ExpectedOutput(invariant.violated:assertion.false)
#@ invariant: self.x == 0
";
        let fixture = Fixture::parse("g", source).unwrap();
        let outcome = Oracle::compare(&fixture, &[violation("f", None), violation("g", None)]);
        assert!(outcome.passed);
    }

    #[test]
    fn one_diagnostic_satisfies_one_expectation() {
        let source = "\
@public
def f(x: uint256, y: uint256):
    #:: ExpectedOutput(assert.failed:assertion.false)
    assert x > 0
    #:: ExpectedOutput(assert.failed:assertion.false)
    assert y > 0
";
        let fixture = Fixture::parse("twice", source).unwrap();
        let failed = Diagnostic::new(ErrorKind::AssertFailed, Reason::AssertionFalse, "f");
        let outcome = Oracle::compare(&fixture, &[failed.clone()]);
        assert!(!outcome.passed);
        assert_eq!(outcome.matched.len(), 1);
        assert_eq!(outcome.missing.len(), 1);

        let other = failed.clone().with_label(Some("Y".to_string()));
        let outcome = Oracle::compare(&fixture, &[failed, other]);
        assert!(outcome.passed, "{}", outcome.summary());
        assert_eq!(outcome.matched.len(), 2);
    }

    #[test]
    fn specific_expectations_keep_their_diagnostic() {
        let source = "\
#:: Label(INC)
#:: ExpectedOutput(invariant.violated:assertion.false)
#@ invariant: self.x >= old(self.x)

@public
def f():
    #:: ExpectedOutput(invariant.violated:assertion.false, INC)
    self.x -= 1

@public
def g():
    self.x -= 1
";
        let fixture = Fixture::parse("order", source).unwrap();
        // The module-level expectation comes first but must not claim the
        // only diagnostic the labelled one can use.
        let outcome = Oracle::compare(&fixture, &[violation("f", Some("INC")), violation("g", None)]);
        assert!(outcome.passed, "{}", outcome.summary());
        assert_eq!(outcome.matched.len(), 2);
    }

    #[test]
    fn ignored_fixture_passes() {
        let fixture = Fixture::parse("i", "#:: IgnoreFile(/tally/issue/9/)\n").unwrap();
        let outcome = Oracle::compare(&fixture, &[violation("f", None)]);
        assert!(outcome.passed);
        assert!(outcome.ignored);
        assert_eq!(outcome.summary(), "ignored");
    }
}
