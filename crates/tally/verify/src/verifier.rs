//! Bounded explicit-state verification.
//!
//! Deploys the contract for every constructor call inside the bounds, then
//! explores breadth-first: every public function, called by every account
//! with every argument vector (and every payment, if payable), from every
//! distinct reachable snapshot up to `max_depth` transactions. After each
//! successful transaction the following are checked, in order: leak check
//! (after `selfdestruct`), function postconditions, general
//! postconditions, checks, invariants, derived resources.
//!
//! Reverting transactions are discarded. Failing transactions and
//! transactions that violate a specification are reported and not
//! explored further.

use std::collections::{HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_ledger::Ledger;
use tally_types::{
    Address, Amount, Diagnostic, ErrorKind, OutputId, Reason, Resource, ResourceKind, Witness,
    INIT,
};
use tracing::{debug, info, warn};

use crate::config::Bounds;
use crate::error::{Abort, VerifyError};
use crate::exec::{Execution, ExecutionOutcome};
use crate::model::{Contract, EntryPoint, Msg, Snapshot, Spec, Transition};
use crate::value::Args;

/// Account that deploys the contract and receives its creator rights.
pub const DEPLOYER: Address = Address(1);

/// Outcome of verifying one contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "errors", rename_all = "snake_case")]
pub enum VerificationResult {
    Success,
    Failure(Vec<Diagnostic>),
}

impl VerificationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, VerificationResult::Success)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            VerificationResult::Success => &[],
            VerificationResult::Failure(errors) => errors,
        }
    }
}

impl std::fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationResult::Success => write!(f, "Verification successful"),
            VerificationResult::Failure(errors) => {
                write!(f, "Verification failed\nErrors:")?;
                for error in errors {
                    write!(f, "\n{}", error)?;
                }
                Ok(())
            }
        }
    }
}

/// A verification result with exploration statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub contract: String,
    pub result: VerificationResult,
    /// Distinct snapshots reached.
    pub states_explored: usize,
    /// Transactions executed, including reverted ones.
    pub transactions: usize,
    /// Whether `max_states` cut the exploration short.
    pub truncated: bool,
    pub bounds: Bounds,
    pub verified_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl VerificationReport {
    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }
}

/// Diagnostics in discovery order, one per (id, function, label).
#[derive(Default)]
struct Findings {
    seen: HashSet<(OutputId, String, Option<String>)>,
    diagnostics: Vec<Diagnostic>,
}

impl Findings {
    fn record(&mut self, diagnostic: Diagnostic) {
        let (id, function, label) = diagnostic.site();
        if self.seen.insert((id, function.to_string(), label.map(str::to_string))) {
            debug!(
                id = %diagnostic.id(),
                function = %diagnostic.function,
                label = ?diagnostic.label,
                "New diagnostic"
            );
            self.diagnostics.push(diagnostic);
        }
    }

    fn into_result(self) -> VerificationResult {
        if self.diagnostics.is_empty() {
            VerificationResult::Success
        } else {
            VerificationResult::Failure(self.diagnostics)
        }
    }
}

/// Where a transaction happened in the exploration.
struct Call<'a> {
    function: &'a str,
    msg: Msg,
    args: &'a Args,
    history: &'a [String],
}

impl Call<'_> {
    fn rendered(&self) -> String {
        format!("{}({})", self.function, self.args)
    }

    fn witness(&self) -> Witness {
        Witness {
            depth: self.history.len(),
            sender: self.msg.sender,
            value: self.msg.value,
            call: self.rendered(),
            history: self.history.to_vec(),
        }
    }

    fn diagnostic(&self, kind: ErrorKind, reason: Reason, label: Option<String>, node: &str) -> Diagnostic {
        Diagnostic::new(kind, reason, self.function)
            .with_label(label)
            .with_node(node)
            .with_witness(self.witness())
    }
}

/// A reachable snapshot queued for expansion.
struct Frontier<S> {
    snapshot: Snapshot<S>,
    history: Vec<String>,
}

/// Bounded verifier.
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    bounds: Bounds,
}

impl Verifier {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Verify `contract` inside the bounds.
    pub fn verify<S>(&self, contract: &Contract<S>) -> Result<VerificationReport, VerifyError>
    where
        S: Clone + Eq + Hash + Debug,
    {
        self.bounds
            .validate()
            .map_err(|e| VerifyError::InvalidBounds(e.to_string()))?;
        validate_model(contract)?;

        let started = Instant::now();
        info!(
            contract = contract.name(),
            addresses = self.bounds.addresses,
            max_value = %self.bounds.max_value,
            max_depth = self.bounds.max_depth,
            "Verifying contract"
        );

        let domain = self.bounds.quantifier_domain();
        let derived = contract.derived_names();
        let senders = self.bounds.address_universe();
        let mut findings = Findings::default();
        let mut visited: HashSet<Snapshot<S>> = HashSet::new();
        let mut queue: VecDeque<Frontier<S>> = VecDeque::new();
        let mut transactions = 0usize;
        let mut truncated = false;

        // Deployment
        let constructor = contract.constructor();
        for args in Args::enumerate(constructor.params(), &self.bounds) {
            for value in self.payments(constructor.is_payable()) {
                transactions += 1;
                let msg = Msg {
                    sender: DEPLOYER,
                    value,
                };
                let call = Call {
                    function: INIT,
                    msg,
                    args: &args,
                    history: &[],
                };
                let deployed = match self.deploy(contract, msg, &args, &derived, &domain) {
                    Ok(snapshot) => snapshot,
                    Err(Abort::Revert(reason)) => {
                        debug!(call = %call.rendered(), reason = %reason, "Deployment reverted");
                        continue;
                    }
                    Err(Abort::Failure(failure)) => {
                        findings.record(call.diagnostic(failure.kind, failure.reason, failure.label, &failure.node));
                        continue;
                    }
                    Err(Abort::Malformed(message)) => return Err(malformed(contract, INIT, message)),
                };

                let transition = Transition {
                    old: &deployed,
                    new: &deployed,
                    msg,
                    args: &args,
                    function: INIT,
                };
                let mut clean = true;
                for spec in contract.invariants() {
                    clean &= check_spec(spec, &transition, ErrorKind::InvariantViolated, &call, &mut findings);
                }
                clean &= check_derived(contract, &deployed, &call, &mut findings);

                if clean && visited.insert(deployed.clone()) {
                    queue.push_back(Frontier {
                        snapshot: deployed,
                        history: vec![call.rendered()],
                    });
                }
            }
        }

        // Exploration
        while let Some(Frontier { snapshot, history }) = queue.pop_front() {
            // history holds the deployment plus every later transaction
            if history.len() > self.bounds.max_depth || snapshot.destroyed {
                continue;
            }
            for function in contract.functions() {
                for sender in &senders {
                    for args in Args::enumerate(function.params(), &self.bounds) {
                        for value in self.payments(function.is_payable()) {
                            transactions += 1;
                            let msg = Msg {
                                sender: *sender,
                                value,
                            };
                            let call = Call {
                                function: function.name(),
                                msg,
                                args: &args,
                                history: &history,
                            };

                            let (next, outcome) =
                                match self.transact(function, &snapshot, msg, &args, &derived, &domain) {
                                    Ok(done) => done,
                                    Err(Abort::Revert(_)) => continue,
                                    Err(Abort::Failure(failure)) => {
                                        findings.record(call.diagnostic(
                                            failure.kind,
                                            failure.reason,
                                            failure.label,
                                            &failure.node,
                                        ));
                                        continue;
                                    }
                                    Err(Abort::Malformed(message)) => {
                                        return Err(malformed(contract, function.name(), message))
                                    }
                                };

                            let clean = check_transition(
                                contract,
                                function,
                                &snapshot,
                                &next,
                                &outcome,
                                &call,
                                &mut findings,
                            );
                            if !clean || visited.contains(&next) {
                                continue;
                            }
                            if visited.len() >= self.bounds.max_states {
                                if !truncated {
                                    warn!(
                                        contract = contract.name(),
                                        max_states = self.bounds.max_states,
                                        "State limit reached, exploration truncated"
                                    );
                                }
                                truncated = true;
                                continue;
                            }
                            visited.insert(next.clone());
                            let mut next_history = history.clone();
                            next_history.push(format!("{} from {}", call.rendered(), sender));
                            queue.push_back(Frontier {
                                snapshot: next,
                                history: next_history,
                            });
                        }
                    }
                }
            }
        }

        let result = findings.into_result();
        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            contract = contract.name(),
            states = visited.len(),
            transactions,
            errors = result.diagnostics().len(),
            elapsed_ms,
            "Verification finished"
        );

        Ok(VerificationReport {
            contract: contract.name().to_string(),
            result,
            states_explored: visited.len(),
            transactions,
            truncated,
            bounds: self.bounds.clone(),
            verified_at: Utc::now(),
            elapsed_ms,
        })
    }

    fn payments(&self, payable: bool) -> Vec<Amount> {
        if payable {
            (0..=self.bounds.max_value).map(Amount).collect()
        } else {
            vec![Amount::ZERO]
        }
    }

    /// Ledger right after deployment: the deployer holds one unit of
    /// `creator(r)` for every declared resource instance.
    fn genesis<S>(&self, contract: &Contract<S>) -> Result<Ledger, Abort> {
        let mut ledger = Ledger::new();
        for decl in contract.resources() {
            if decl.kind != ResourceKind::Declared || decl.name == tally_types::WEI {
                continue;
            }
            for instance in self.instances(&decl.name, decl.params.len()) {
                ledger
                    .allocate(&instance.creator(), Amount::ONE, DEPLOYER)
                    .map_err(|e| Abort::revert(e.to_string()))?;
            }
        }
        Ok(ledger)
    }

    fn instances(&self, name: &str, arity: usize) -> Vec<Resource> {
        let mut combinations: Vec<Vec<u128>> = vec![Vec::new()];
        for _ in 0..arity {
            combinations = combinations
                .into_iter()
                .flat_map(|prefix| {
                    (0..=self.bounds.max_value).map(move |v| {
                        let mut next = prefix.clone();
                        next.push(v);
                        next
                    })
                })
                .collect();
        }
        combinations
            .into_iter()
            .map(|args| Resource::with_args(name, args))
            .collect()
    }

    fn deploy<S>(
        &self,
        contract: &Contract<S>,
        msg: Msg,
        args: &Args,
        derived: &[String],
        domain: &[u128],
    ) -> Result<Snapshot<S>, Abort> {
        let mut ledger = self.genesis(contract)?;
        let mut balance = Amount::ZERO;
        receive(&mut ledger, &mut balance, msg)?;

        let (state, outcome) = {
            let mut exec = Execution::new(&mut ledger, &mut balance, msg, INIT, None, derived, domain);
            let state = contract.constructor().call(&mut exec, args)?;
            (state, exec.finish())
        };
        Ok(Snapshot {
            state,
            ledger,
            balance,
            destroyed: outcome.destroyed_to.is_some(),
        })
    }

    fn transact<S: Clone>(
        &self,
        function: &EntryPoint<S>,
        pre: &Snapshot<S>,
        msg: Msg,
        args: &Args,
        derived: &[String],
        domain: &[u128],
    ) -> Result<(Snapshot<S>, ExecutionOutcome), Abort> {
        let mut next = pre.clone();
        receive(&mut next.ledger, &mut next.balance, msg)?;

        let outcome = {
            let mut exec = Execution::new(
                &mut next.ledger,
                &mut next.balance,
                msg,
                function.name(),
                function.performs_clause(),
                derived,
                domain,
            );
            function.call(&mut next.state, &mut exec, args)?;
            exec.finish()
        };
        next.destroyed = outcome.destroyed_to.is_some();
        Ok((next, outcome))
    }
}

/// Payable calls allocate `msg.value` wei to the sender.
fn receive(ledger: &mut Ledger, balance: &mut Amount, msg: Msg) -> Result<(), Abort> {
    if msg.value.is_zero() {
        return Ok(());
    }
    ledger
        .allocate(&Resource::Wei, msg.value, msg.sender)
        .map_err(|e| Abort::revert(e.to_string()))?;
    *balance = balance
        .checked_add(msg.value)
        .ok_or_else(|| Abort::revert("balance overflow"))?;
    Ok(())
}

fn check_transition<S>(
    contract: &Contract<S>,
    function: &EntryPoint<S>,
    old: &Snapshot<S>,
    new: &Snapshot<S>,
    outcome: &ExecutionOutcome,
    call: &Call<'_>,
    findings: &mut Findings,
) -> bool {
    let mut clean = true;
    if let Some(to) = outcome.destroyed_to {
        clean &= check_leaks(new, to, call, findings);
    }

    let transition = Transition {
        old,
        new,
        msg: call.msg,
        args: call.args,
        function: call.function,
    };
    for spec in function.postconditions().iter().chain(contract.postconditions()) {
        clean &= check_spec(spec, &transition, ErrorKind::PostconditionViolated, call, findings);
    }
    for spec in contract.checks() {
        clean &= check_spec(spec, &transition, ErrorKind::CheckViolated, call, findings);
    }
    for spec in contract.invariants() {
        clean &= check_spec(spec, &transition, ErrorKind::InvariantViolated, call, findings);
    }
    clean &= check_derived(contract, new, call, findings);
    clean
}

fn check_spec<S>(
    spec: &Spec<S>,
    transition: &Transition<'_, S>,
    kind: ErrorKind,
    call: &Call<'_>,
    findings: &mut Findings,
) -> bool {
    if spec.holds(transition) {
        return true;
    }
    findings.record(call.diagnostic(
        kind,
        Reason::AssertionFalse,
        spec.label_name().map(str::to_string),
        spec.text(),
    ));
    false
}

/// After `selfdestruct(to)` nothing but creator rights may remain
/// allocated to anyone other than `to`.
fn check_leaks<S>(snapshot: &Snapshot<S>, to: Address, call: &Call<'_>, findings: &mut Findings) -> bool {
    let mut clean = true;
    for resource in snapshot.ledger.resources().filter(|r| !r.is_creator()) {
        let leaked = snapshot
            .ledger
            .holders(resource)
            .iter()
            .any(|(holder, _)| *holder != to);
        if leaked {
            findings.record(call.diagnostic(
                ErrorKind::LeakcheckFailed,
                Reason::AllocationLeaked,
                None,
                &resource.to_string(),
            ));
            clean = false;
        }
    }
    clean
}

fn check_derived<S>(contract: &Contract<S>, snapshot: &Snapshot<S>, call: &Call<'_>, findings: &mut Findings) -> bool {
    let mut clean = true;
    for derived in contract.derived() {
        let total = snapshot.ledger.total_named(&derived.resource);
        let holding = derived.holding(snapshot);
        if total != holding {
            debug!(
                resource = %derived.resource,
                total = %total,
                holding = %holding,
                "Derived resource out of sync with underlying holding"
            );
            findings.record(call.diagnostic(
                ErrorKind::DerivedResourceInvariantFailed,
                Reason::AssertionFalse,
                derived.label.clone(),
                &derived.resource,
            ));
            clean = false;
        }
    }
    clean
}

fn validate_model<S>(contract: &Contract<S>) -> Result<(), VerifyError> {
    let mut names = HashSet::new();
    for function in contract.functions() {
        if function.name() == INIT || !names.insert(function.name()) {
            return Err(malformed(contract, function.name(), "duplicate function name"));
        }
        for performs in function.performs_clause().unwrap_or_default() {
            if let Some(resource) = &performs.resource {
                if !contract.is_declared(resource) {
                    return Err(malformed(
                        contract,
                        function.name(),
                        format!("performs clause names undeclared resource {}", resource),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn malformed<S>(contract: &Contract<S>, function: &str, message: impl Into<String>) -> VerifyError {
    VerifyError::MalformedModel {
        contract: contract.name().to_string(),
        function: function.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constructor, Performs};
    use crate::value::ParamKind;
    use tally_ledger::EffectKind;
    use tally_types::{OfferKey, ResourceDecl};

    fn small() -> Verifier {
        Verifier::new(Bounds {
            addresses: 2,
            max_value: 2,
            max_depth: 2,
            ..Bounds::default()
        })
    }

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    struct Counter {
        counter: u128,
    }

    fn history(with_decrease: bool) -> Contract<Counter> {
        let mut contract = Contract::new("history", Constructor::with_state(Counter { counter: 0 }))
            .invariant(
                Spec::new("old(self.counter) <= self.counter", |t: &Transition<'_, Counter>| {
                    t.old.state.counter <= t.new.state.counter
                })
                .label("INC"),
            )
            .function(EntryPoint::new("increment", |s: &mut Counter, exec, _| {
                s.counter = exec.add(s.counter, 1)?;
                Ok(())
            }));
        if with_decrease {
            contract = contract.function(EntryPoint::new("decrease", |s: &mut Counter, exec, _| {
                s.counter = exec.sub(s.counter, 1)?;
                Ok(())
            }));
        }
        contract
    }

    #[test]
    fn monotone_counter_verifies() {
        let report = small().verify(&history(false)).unwrap();
        assert!(report.is_success());
        assert!(report.states_explored >= 3);
        assert_eq!(report.result.to_string(), "Verification successful");
    }

    #[test]
    fn decrease_violates_labelled_invariant() {
        let report = small().verify(&history(true)).unwrap();
        let errors = report.result.diagnostics();
        assert_eq!(errors.len(), 1);
        let error = &errors[0];
        assert_eq!(error.id().to_string(), "invariant.violated:assertion.false");
        assert_eq!(error.function, "decrease");
        assert_eq!(error.label.as_deref(), Some("INC"));
        // decrease from 0 underflows and reverts; the first violation
        // needs a prior increment
        let witness = error.witness.as_ref().unwrap();
        assert_eq!(witness.depth, 2);
        assert!(report.result.to_string().starts_with("Verification failed\nErrors:\n"));
    }

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    struct Supply {
        total_supply: u128,
    }

    fn token(mint_guarded: bool) -> Contract<Supply> {
        let token = Resource::named("token");
        let minted = token.clone();
        Contract::new("token", Constructor::with_state(Supply { total_supply: 0 }))
            .resource(ResourceDecl::declared("token"))
            .invariant(Spec::conserves(token.clone(), "total_supply", |s: &Supply| {
                Amount(s.total_supply)
            }))
            .function(
                EntryPoint::new("mint", move |s: &mut Supply, exec, args| {
                    if mint_guarded {
                        exec.require(exec.msg_sender() == DEPLOYER, "only minter")?;
                    }
                    let amount = args.uint(0)?;
                    s.total_supply = exec.add(s.total_supply, amount)?;
                    let to = exec.msg_sender();
                    exec.at("MINT").create(&minted, Amount(amount), to)
                })
                .param("amount", ParamKind::Uint),
            )
            .function(
                EntryPoint::new("transfer", move |_: &mut Supply, exec, args| {
                    let to = args.address(0)?;
                    let amount = args.amount(1)?;
                    let held = exec.ledger().allocated(&token, exec.msg_sender());
                    exec.require(held >= amount, "balance too low")?;
                    exec.reallocate(&token, amount, to)
                })
                .param("to", ParamKind::Address)
                .param("amount", ParamKind::Uint)
                .performs(Performs::new(EffectKind::Reallocate, "token")),
            )
    }

    #[test]
    fn guarded_token_verifies() {
        let report = small().verify(&token(true)).unwrap();
        assert!(report.is_success(), "{}", report.result);
    }

    #[test]
    fn unguarded_mint_lacks_creator_rights() {
        let report = small().verify(&token(false)).unwrap();
        let ids: Vec<String> = report
            .result
            .diagnostics()
            .iter()
            .map(|d| format!("{}@{}", d.id(), d.label.as_deref().unwrap_or("-")))
            .collect();
        assert_eq!(ids, vec!["create.failed:not.a.creator@MINT".to_string()]);
        let witness = report.result.diagnostics()[0].witness.as_ref().unwrap();
        assert_eq!(witness.sender, Address(2));
    }

    #[test]
    fn undeclared_performs_resource_is_malformed() {
        let contract = Contract::new("bad", Constructor::with_state(Counter { counter: 0 })).function(
            EntryPoint::new("f", |_: &mut Counter, _, _| Ok(()))
                .performs(Performs::new(EffectKind::Create, "gold")),
        );
        let err = small().verify(&contract).unwrap_err();
        assert!(matches!(err, VerifyError::MalformedModel { .. }));
    }

    fn unchanged(text: &str) -> Spec<Counter> {
        Spec::new(text, |t: &Transition<'_, Counter>| {
            t.old.state.counter == t.new.state.counter
        })
    }

    #[test]
    fn transition_checks_report_in_order() {
        let contract = Contract::new("ordered", Constructor::with_state(Counter { counter: 0 }))
            .postcondition(unchanged("self.counter == old(self.counter)").label("GEN"))
            .check(unchanged("self.counter == old(self.counter)").label("CHK"))
            .invariant(unchanged("self.counter == old(self.counter)").label("INV"))
            .function(
                EntryPoint::new("bump", |s: &mut Counter, exec, _| {
                    s.counter = exec.add(s.counter, 2)?;
                    Ok(())
                })
                .ensures(
                    Spec::new("self.counter == old(self.counter) + 1", |t: &Transition<'_, Counter>| {
                        t.old.state.counter + 1 == t.new.state.counter
                    })
                    .label("POST"),
                ),
            );
        let report = small().verify(&contract).unwrap();
        let found: Vec<String> = report
            .result
            .diagnostics()
            .iter()
            .map(|d| format!("{}@{}:{}", d.id(), d.function, d.label.as_deref().unwrap_or("-")))
            .collect();
        assert_eq!(
            found,
            vec![
                "postcondition.violated:assertion.false@bump:POST".to_string(),
                "postcondition.violated:assertion.false@bump:GEN".to_string(),
                "check.violated:assertion.false@bump:CHK".to_string(),
                "invariant.violated:assertion.false@bump:INV".to_string(),
            ]
        );
        // violating transitions are not explored further
        assert_eq!(report.states_explored, 1);
    }

    #[test]
    fn constructor_must_establish_invariants() {
        let contract = Contract::new("broken", Constructor::with_state(Counter { counter: 1 }))
            .invariant(
                Spec::new("self.counter == 0", |t: &Transition<'_, Counter>| t.new.state.counter == 0)
                    .label("ZERO"),
            )
            .function(EntryPoint::new("noop", |_: &mut Counter, _, _| Ok(())));
        let report = small().verify(&contract).unwrap();
        let errors = report.result.diagnostics();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].id().to_string(), "invariant.violated:assertion.false");
        assert_eq!(errors[0].function, INIT);
        assert_eq!(errors[0].label.as_deref(), Some("ZERO"));
        assert_eq!(errors[0].witness.as_ref().unwrap().depth, 0);
        assert_eq!(report.states_explored, 0);
    }

    #[test]
    fn non_injective_revoke_is_reported() {
        let token = Resource::named("token");
        let key = move |from: Address, x: u128| OfferKey {
            give: token.clone(),
            take: Resource::Wei,
            give_amount: Amount(1),
            take_amount: Amount(x),
            from,
            to: Address::ZERO,
        };
        let each = key.clone();
        let contract = Contract::new("revokes", Constructor::with_state(Counter { counter: 0 }))
            .resource(ResourceDecl::declared("token"))
            .function(EntryPoint::new("rev", move |_: &mut Counter, exec, _| {
                let from = exec.msg_sender();
                exec.foreach_revoke("foreach revoke", |_| Ok(key(from, 0)))
            }))
            .function(EntryPoint::new("rev_each", move |_: &mut Counter, exec, _| {
                let from = exec.msg_sender();
                exec.foreach_revoke("foreach revoke", |x| Ok(each(from, x)))
            }));
        let report = small().verify(&contract).unwrap();
        let errors = report.result.diagnostics();
        assert_eq!(errors.len(), 1, "{}", report.result);
        assert_eq!(errors[0].id().to_string(), "revoke.failed:offer.not.injective");
        assert_eq!(errors[0].function, "rev");
    }

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    struct Held {
        held: u128,
    }

    #[test]
    fn derived_total_counts_every_instance() {
        let wrapped = Resource::with_args("wtoken", vec![1]);
        let contract = Contract::new("wrapper", Constructor::with_state(Held { held: 0 }))
            .derived_resource("wtoken", "Token.token", Some("BACKED"), |s: &Snapshot<Held>| {
                Amount(s.state.held)
            })
            .function(EntryPoint::new("wrap", move |s: &mut Held, exec, _| {
                exec.require(s.held < 2, "cap")?;
                s.held += 1;
                let to = exec.msg_sender();
                exec.create(&wrapped, Amount::ONE, to)
            }));
        let report = small().verify(&contract).unwrap();
        assert!(report.is_success(), "{}", report.result);
    }

    #[test]
    fn state_limit_truncates() {
        let verifier = Verifier::new(Bounds {
            addresses: 1,
            max_value: 1,
            max_depth: 10,
            max_states: 3,
        });
        let report = verifier.verify(&history(false)).unwrap();
        assert!(report.truncated);
        assert_eq!(report.states_explored, 3);
        assert!(report.is_success());
    }

    #[test]
    fn result_serializes_with_status_tag() {
        let json = serde_json::to_value(&VerificationResult::Success).unwrap();
        assert_eq!(json["status"], "success");
    }
}
