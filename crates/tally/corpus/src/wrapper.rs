//! `wrapper.vy`: a derived resource backed by an underlying token.
//!
//! The underlying `Token` contract is external; its effect on this
//! contract is the `held` counter, which the `wtoken` total must match.

use tally_types::{Amount, Resource};
use tally_verify::{Constructor, Contract, EntryPoint, ParamKind, Snapshot, Spec};

use crate::Balances;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Wrapper {
    /// Underlying tokens held by the contract.
    pub held: u128,
    pub wrapped: Balances,
}

type Rule = Spec<Wrapper>;
type Entry = EntryPoint<Wrapper>;

fn wtoken() -> Resource {
    Resource::named("wtoken")
}

pub fn contract() -> Contract<Wrapper> {
    Contract::new("wrapper", Constructor::with_state(Wrapper::default()))
        .derived_resource("wtoken", "Token.token", Some("BACKED"), |s: &Snapshot<Wrapper>| {
            Amount(s.state.held)
        })
        .invariant(Rule::new(
            "forall({a: address}, allocated[wtoken](a) == self.wrapped[a])",
            |t| t.new.state.wrapped.mirrors(&t.new.ledger, &wtoken()),
        ))
        .function(
            Entry::new("deposit", |s, exec, args| {
                let amount = args.uint(0)?;
                let sender = exec.msg_sender();
                s.held = exec.add(s.held, amount)?;
                s.wrapped.credit(sender, amount)?;
                exec.create(&wtoken(), Amount(amount), sender)
            })
            .param("amount", ParamKind::Uint),
        )
        .function(
            Entry::new("withdraw", |s, exec, args| {
                let amount = args.uint(0)?;
                s.wrapped.debit(exec.msg_sender(), amount)?;
                s.held = exec.sub(s.held, amount)?;
                exec.destroy(&wtoken(), Amount(amount))
            })
            .param("amount", ParamKind::Uint),
        )
        .function(
            Entry::new("skim", |s, exec, args| {
                let amount = args.uint(0)?;
                s.held = exec.sub(s.held, amount)?;
                Ok(())
            })
            .param("amount", ParamKind::Uint),
        )
}
