//! Execution context of a single transaction.
//!
//! Contract bodies perform every resource operation through an
//! [`Execution`], which enforces the ledger discipline: creator rights,
//! sufficient allocations, offers, trust, performs clauses and quantified
//! injectivity. Rule violations become [`Abort::Failure`]s carrying the
//! label set with [`Execution::at`]; arithmetic overflow reverts.

use tally_ledger::{EffectKind, Ledger, LedgerError};
use tally_types::{Address, Amount, ErrorKind, OfferKey, Reason, Resource};
use tracing::debug;

use crate::error::{Abort, Failure};
use crate::model::{Msg, Performs};

/// What a finished body left behind besides its state changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Beneficiary of `selfdestruct`, if the body destroyed the contract.
    pub destroyed_to: Option<Address>,
    /// Resource effects performed, in order.
    pub effects: Vec<EffectKind>,
}

pub struct Execution<'a> {
    ledger: &'a mut Ledger,
    balance: &'a mut Amount,
    msg: Msg,
    function: &'a str,
    performs: Option<&'a [Performs]>,
    derived: &'a [String],
    domain: &'a [u128],
    label: Option<String>,
    destroyed_to: Option<Address>,
    effects: Vec<EffectKind>,
}

impl<'a> Execution<'a> {
    pub fn new(
        ledger: &'a mut Ledger,
        balance: &'a mut Amount,
        msg: Msg,
        function: &'a str,
        performs: Option<&'a [Performs]>,
        derived: &'a [String],
        domain: &'a [u128],
    ) -> Self {
        Self {
            ledger,
            balance,
            msg,
            function,
            performs,
            derived,
            domain,
            label: None,
            destroyed_to: None,
            effects: Vec::new(),
        }
    }

    pub fn msg_sender(&self) -> Address {
        self.msg.sender
    }

    pub fn msg_value(&self) -> Amount {
        self.msg.value
    }

    /// Wei held by the contract.
    pub fn balance(&self) -> Amount {
        *self.balance
    }

    pub fn ledger(&self) -> &Ledger {
        self.ledger
    }

    pub fn function(&self) -> &str {
        self.function
    }

    /// Domain of quantified `uint256` variables.
    pub fn domain(&self) -> &[u128] {
        self.domain
    }

    /// Label the next operation or check.
    pub fn at(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = Some(label.into());
        self
    }

    /// `assert cond, UNREACHABLE`-style guard: reverts when false.
    pub fn require(&mut self, cond: bool, what: &str) -> Result<(), Abort> {
        self.label = None;
        if cond {
            Ok(())
        } else {
            Err(Abort::revert(what))
        }
    }

    /// Checked arithmetic; overflow reverts.
    pub fn add(&self, a: u128, b: u128) -> Result<u128, Abort> {
        a.checked_add(b)
            .ok_or_else(|| Abort::revert(format!("overflow in {} + {}", a, b)))
    }

    /// Checked arithmetic; underflow reverts.
    pub fn sub(&self, a: u128, b: u128) -> Result<u128, Abort> {
        a.checked_sub(b)
            .ok_or_else(|| Abort::revert(format!("underflow in {} - {}", a, b)))
    }

    /// A verified assertion: `assert.failed:assertion.false` when false.
    pub fn check(&mut self, cond: bool, node: &str) -> Result<(), Abort> {
        let label = self.label.take();
        if cond {
            Ok(())
        } else {
            Err(Abort::Failure(Failure {
                kind: ErrorKind::AssertFailed,
                reason: Reason::AssertionFalse,
                label,
                node: node.to_string(),
            }))
        }
    }

    // --- Resource verbs ---

    /// `create[r](amount, to=to)` with the sender as actor.
    pub fn create(&mut self, resource: &Resource, amount: Amount, to: Address) -> Result<(), Abort> {
        self.create_as(resource, amount, to, self.msg.sender)
    }

    /// `create[r](amount, to=to, actor=actor)`
    pub fn create_as(
        &mut self,
        resource: &Resource,
        amount: Amount,
        to: Address,
        actor: Address,
    ) -> Result<(), Abort> {
        let node = format!("create[{}]({}, to={})", resource, amount, to);
        let sender = self.msg.sender;
        let derived = self.is_derived(resource);
        self.perform(EffectKind::Create, resource, node, |ledger| {
            ledger.authorize(actor, sender)?;
            if derived {
                // backed by the underlying holding, not by creator rights
                ledger.allocate(resource, amount, to)
            } else {
                ledger.create(resource, amount, to, actor)
            }
        })
    }

    /// `destroy[r](amount)` with the sender as actor.
    pub fn destroy(&mut self, resource: &Resource, amount: Amount) -> Result<(), Abort> {
        self.destroy_as(resource, amount, self.msg.sender)
    }

    pub fn destroy_as(
        &mut self,
        resource: &Resource,
        amount: Amount,
        actor: Address,
    ) -> Result<(), Abort> {
        let node = format!("destroy[{}]({}, actor={})", resource, amount, actor);
        let sender = self.msg.sender;
        self.perform(EffectKind::Destroy, resource, node, |ledger| {
            ledger.authorize(actor, sender)?;
            ledger.destroy(resource, amount, actor)
        })
    }

    /// `reallocate[r](amount, to=to)` from the sender.
    pub fn reallocate(&mut self, resource: &Resource, amount: Amount, to: Address) -> Result<(), Abort> {
        self.reallocate_as(resource, amount, self.msg.sender, to)
    }

    /// `reallocate[r](amount, to=to, actor=from)`
    pub fn reallocate_as(
        &mut self,
        resource: &Resource,
        amount: Amount,
        from: Address,
        to: Address,
    ) -> Result<(), Abort> {
        let node = format!("reallocate[{}]({}, to={}, actor={})", resource, amount, to, from);
        let sender = self.msg.sender;
        self.perform(EffectKind::Reallocate, resource, node, |ledger| {
            ledger.authorize(from, sender)?;
            ledger.reallocate(resource, amount, from, to)
        })
    }

    /// `offer[give <-> take](...)`; `offer.from` is the offering party.
    pub fn offer(&mut self, offer: OfferKey, times: u128) -> Result<(), Abort> {
        let node = format!("offer[{}](times={})", offer, times);
        let sender = self.msg.sender;
        let give = offer.give.clone();
        self.perform(EffectKind::Offer, &give, node, |ledger| {
            ledger.authorize(offer.from, sender)?;
            ledger.offer(offer, times)
        })
    }

    pub fn revoke(&mut self, offer: &OfferKey) -> Result<(), Abort> {
        let node = format!("revoke[{}]", offer);
        let sender = self.msg.sender;
        self.perform(EffectKind::Revoke, &offer.give, node, |ledger| {
            ledger.authorize(offer.from, sender)?;
            ledger.revoke(offer);
            Ok(())
        })
    }

    /// `exchange[give <-> take](...)` executed by the sender.
    pub fn exchange(&mut self, offer: &OfferKey, times: u128) -> Result<(), Abort> {
        let node = format!("exchange[{}](times={})", offer, times);
        let executor = self.msg.sender;
        self.perform(EffectKind::Exchange, &offer.give, node, |ledger| {
            ledger.exchange(offer, times, executor)
        })
    }

    /// `foreach({x: uint256}, offer[...](...))`
    ///
    /// `offer_for` maps each element of the quantified domain to an offer
    /// and its multiplicity. Distinct elements must yield distinct offers.
    pub fn foreach_offer<F>(&mut self, node: &str, offer_for: F) -> Result<(), Abort>
    where
        F: Fn(u128) -> Result<(OfferKey, u128), Abort>,
    {
        let offers = self
            .domain
            .iter()
            .map(|x| offer_for(*x))
            .collect::<Result<Vec<_>, _>>()?;
        let Some((first, _)) = offers.first() else {
            return Ok(());
        };
        let resource = first.give.clone();
        let sender = self.msg.sender;
        self.perform(EffectKind::Offer, &resource, node.to_string(), |ledger| {
            for (offer, _) in &offers {
                ledger.authorize(offer.from, sender)?;
            }
            ledger.foreach_offer(offers)
        })
    }

    /// `foreach({x: uint256}, revoke[...](...))`
    pub fn foreach_revoke<F>(&mut self, node: &str, offer_for: F) -> Result<(), Abort>
    where
        F: Fn(u128) -> Result<OfferKey, Abort>,
    {
        let offers = self
            .domain
            .iter()
            .map(|x| offer_for(*x))
            .collect::<Result<Vec<_>, _>>()?;
        let Some(first) = offers.first() else {
            return Ok(());
        };
        let resource = first.give.clone();
        let sender = self.msg.sender;
        self.perform(EffectKind::Revoke, &resource, node.to_string(), |ledger| {
            for offer in &offers {
                ledger.authorize(offer.from, sender)?;
            }
            ledger.foreach_revoke(offers)
        })
    }

    /// `trust(trustee, value)` on behalf of the sender.
    pub fn trust(&mut self, trustee: Address, value: bool) -> Result<(), Abort> {
        let node = format!("trust({}, {})", trustee, value);
        let owner = self.msg.sender;
        self.perform(EffectKind::Trust, &Resource::Wei, node, |ledger| {
            ledger.trust(owner, trustee, value);
            Ok(())
        })
    }

    /// `send(to, amount)`: pay out wei allocated to `to`.
    pub fn send(&mut self, to: Address, amount: Amount) -> Result<(), Abort> {
        let label = self.label.take();
        let node = format!("send({}, {})", to, amount);
        if let Err(err) = self.ledger.deallocate(&Resource::Wei, amount, to) {
            debug!(function = self.function, error = %err, "Send of unallocated wei");
            return Err(Abort::Failure(Failure {
                kind: ErrorKind::CallFailed,
                reason: Reason::InsufficientFunds,
                label,
                node,
            }));
        }
        *self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or_else(|| Abort::revert(format!("balance below {}", amount)))?;
        self.effects.push(EffectKind::Send);
        Ok(())
    }

    /// `selfdestruct(to)`: the remaining balance goes to `to`.
    pub fn selfdestruct(&mut self, to: Address) {
        self.label = None;
        *self.balance = Amount::ZERO;
        self.destroyed_to = Some(to);
    }

    pub fn finish(self) -> ExecutionOutcome {
        ExecutionOutcome {
            destroyed_to: self.destroyed_to,
            effects: self.effects,
        }
    }

    fn is_derived(&self, resource: &Resource) -> bool {
        !resource.is_creator() && self.derived.iter().any(|d| d == resource.name())
    }

    fn perform<F>(
        &mut self,
        kind: EffectKind,
        resource: &Resource,
        node: String,
        op: F,
    ) -> Result<(), Abort>
    where
        F: FnOnce(&mut Ledger) -> Result<(), LedgerError>,
    {
        let label = self.label.take();
        if let Some(performs) = self.performs {
            if !performs.iter().any(|p| p.covers(kind, resource.name())) {
                debug!(function = self.function, effect = %kind, resource = %resource, "Effect not declared");
                return Err(Abort::Failure(Failure {
                    kind: kind.error_kind(),
                    reason: Reason::NoPerforms,
                    label,
                    node,
                }));
            }
        }

        match op(self.ledger) {
            Ok(()) => {
                self.effects.push(kind);
                Ok(())
            }
            Err(err) => match err.reason() {
                Some(reason) => {
                    debug!(function = self.function, effect = %kind, error = %err, "Resource operation failed");
                    Err(Abort::Failure(Failure {
                        kind: kind.error_kind(),
                        reason,
                        label,
                        node,
                    }))
                }
                None => Err(Abort::revert(err.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &[u128] = &[0, 1, 2];

    fn token() -> Resource {
        Resource::named("token")
    }

    fn msg(sender: u64) -> Msg {
        Msg {
            sender: Address(sender),
            value: Amount::ZERO,
        }
    }

    fn failure(abort: Abort) -> Failure {
        match abort {
            Abort::Failure(f) => f,
            other => panic!("expected failure, got {}", other),
        }
    }

    fn ledger_with_tokens() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.allocate(&token(), Amount(3), Address(1)).unwrap();
        ledger
    }

    #[test]
    fn reallocate_without_funds_fails_at_label() {
        let mut ledger = ledger_with_tokens();
        let mut balance = Amount::ZERO;
        let mut exec = Execution::new(&mut ledger, &mut balance, msg(2), "transfer", None, &[], DOMAIN);
        let err = exec
            .at("XFER")
            .reallocate(&token(), Amount(1), Address(1))
            .unwrap_err();
        let f = failure(err);
        assert_eq!(f.kind, ErrorKind::ReallocateFailed);
        assert_eq!(f.reason, Reason::InsufficientFunds);
        assert_eq!(f.label.as_deref(), Some("XFER"));
    }

    #[test]
    fn acting_for_others_needs_trust() {
        let mut ledger = ledger_with_tokens();
        let mut balance = Amount::ZERO;
        let mut exec = Execution::new(&mut ledger, &mut balance, msg(2), "pull", None, &[], DOMAIN);
        let f = failure(
            exec.reallocate_as(&token(), Amount(1), Address(1), Address(2))
                .unwrap_err(),
        );
        assert_eq!(f.reason, Reason::NotTrusted);
        assert_eq!(f.label, None);

        ledger.trust(Address(1), Address(2), true);
        let mut exec = Execution::new(&mut ledger, &mut balance, msg(2), "pull", None, &[], DOMAIN);
        exec.reallocate_as(&token(), Amount(1), Address(1), Address(2))
            .unwrap();
        let outcome = exec.finish();
        assert_eq!(outcome.effects, vec![EffectKind::Reallocate]);
        assert_eq!(ledger.allocated(&token(), Address(2)), Amount(1));
    }

    #[test]
    fn undeclared_effect_fails() {
        let mut ledger = ledger_with_tokens();
        let mut balance = Amount::ZERO;
        let performs = vec![Performs::new(EffectKind::Reallocate, "wei")];
        let mut exec = Execution::new(&mut ledger, &mut balance, msg(1), "transfer", Some(&performs), &[], DOMAIN);
        let f = failure(exec.reallocate(&token(), Amount(1), Address(2)).unwrap_err());
        assert_eq!(f.kind, ErrorKind::ReallocateFailed);
        assert_eq!(f.reason, Reason::NoPerforms);
    }

    #[test]
    fn non_injective_foreach_offer() {
        let mut ledger = ledger_with_tokens();
        let mut balance = Amount::ZERO;
        let mut exec = Execution::new(&mut ledger, &mut balance, msg(1), "foo", None, &[], DOMAIN);
        let offer = |x: u128| {
            Ok((
                OfferKey {
                    give: token(),
                    take: Resource::Wei,
                    give_amount: Amount(1),
                    take_amount: Amount(x.min(1)),
                    from: Address(1),
                    to: Address(2),
                },
                1,
            ))
        };
        let f = failure(exec.at("FE").foreach_offer("foreach offer", offer).unwrap_err());
        assert_eq!(f.kind, ErrorKind::OfferFailed);
        assert_eq!(f.reason, Reason::OfferNotInjective);
        assert_eq!(f.label.as_deref(), Some("FE"));
    }

    #[test]
    fn non_injective_foreach_revoke() {
        let mut ledger = ledger_with_tokens();
        let mut balance = Amount::ZERO;
        let mut exec = Execution::new(&mut ledger, &mut balance, msg(1), "rev", None, &[], DOMAIN);
        let key = |x: u128| OfferKey {
            give: token(),
            take: Resource::Wei,
            give_amount: Amount(1),
            take_amount: Amount(x),
            from: Address(1),
            to: Address(2),
        };
        exec.foreach_revoke("foreach revoke", |x| Ok(key(x))).unwrap();

        let f = failure(exec.foreach_revoke("foreach revoke", |_| Ok(key(0))).unwrap_err());
        assert_eq!(f.kind, ErrorKind::RevokeFailed);
        assert_eq!(f.reason, Reason::OfferNotInjective);
    }

    #[test]
    fn derived_resources_need_no_creator() {
        let mut ledger = Ledger::new();
        let mut balance = Amount::ZERO;
        let derived = vec!["wtoken".to_string()];
        let mut exec = Execution::new(&mut ledger, &mut balance, msg(1), "deposit", None, &derived, DOMAIN);
        exec.create(&Resource::named("wtoken"), Amount(2), Address(1))
            .unwrap();
        let f = failure(exec.create(&token(), Amount(1), Address(1)).unwrap_err());
        assert_eq!(f.reason, Reason::NotACreator);
    }

    #[test]
    fn send_requires_allocation() {
        let mut ledger = Ledger::new();
        ledger.allocate(&Resource::Wei, Amount(2), Address(1)).unwrap();
        let mut balance = Amount(2);
        let mut exec = Execution::new(&mut ledger, &mut balance, msg(2), "withdraw", None, &[], DOMAIN);
        let f = failure(exec.send(Address(2), Amount(1)).unwrap_err());
        assert_eq!(f.kind, ErrorKind::CallFailed);
        assert_eq!(f.reason, Reason::InsufficientFunds);

        exec.send(Address(1), Amount(2)).unwrap();
        assert_eq!(exec.balance(), Amount::ZERO);
    }

    #[test]
    fn checks_and_requires() {
        let mut ledger = Ledger::new();
        let mut balance = Amount::ZERO;
        let mut exec = Execution::new(&mut ledger, &mut balance, msg(1), "f", None, &[], DOMAIN);
        assert!(exec.require(false, "guard").unwrap_err().is_revert());
        assert!(exec.sub(1, 2).unwrap_err().is_revert());
        let f = failure(exec.at("A").check(false, "x > 0").unwrap_err());
        assert_eq!(f.kind, ErrorKind::AssertFailed);
        assert_eq!(f.label.as_deref(), Some("A"));
    }

    #[test]
    fn selfdestruct_records_beneficiary() {
        let mut ledger = Ledger::new();
        let mut balance = Amount(5);
        let mut exec = Execution::new(&mut ledger, &mut balance, msg(1), "close", None, &[], DOMAIN);
        exec.selfdestruct(Address(1));
        let outcome = exec.finish();
        assert_eq!(outcome.destroyed_to, Some(Address(1)));
        assert_eq!(balance, Amount::ZERO);
    }
}
