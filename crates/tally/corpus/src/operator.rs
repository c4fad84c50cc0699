//! `operator.vy`: operators move tokens for owners who trust them.

use std::collections::BTreeSet;

use tally_types::{Address, Amount, Resource, ResourceDecl};
use tally_verify::{Constructor, Contract, EntryPoint, ParamKind, Spec};

use crate::Balances;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Operators {
    pub total_supply: u128,
    pub balances: Balances,
    /// (owner, operator) pairs currently approved.
    pub operators: BTreeSet<(Address, Address)>,
}

type Rule = Spec<Operators>;
type Entry = EntryPoint<Operators>;

fn token() -> Resource {
    Resource::named("token")
}

fn transfer(name: &str, guarded: bool) -> Entry {
    Entry::new(name, move |s, exec, args| {
        let owner = args.address(0)?;
        let to = args.address(1)?;
        let amount = args.uint(2)?;
        if guarded {
            let sender = exec.msg_sender();
            exec.require(
                owner == sender || s.operators.contains(&(owner, sender)),
                "owner == msg.sender or self.operators[owner][msg.sender]",
            )?;
        }
        s.balances.debit(owner, amount)?;
        s.balances.credit(to, amount)?;
        exec.reallocate_as(&token(), Amount(amount), owner, to)
    })
    .param("owner", ParamKind::Address)
    .param("to", ParamKind::Address)
    .param("amount", ParamKind::Uint)
}

pub fn contract() -> Contract<Operators> {
    let init = Constructor::new(|exec, _| {
        let deployer = exec.msg_sender();
        let mut state = Operators {
            total_supply: 2,
            ..Operators::default()
        };
        state.balances.credit(deployer, 2)?;
        exec.create(&token(), Amount(2), deployer)?;
        Ok(state)
    });

    Contract::new("operator", init)
        .resource(ResourceDecl::declared("token"))
        .invariant(Rule::conserves(token(), "total_supply", |s: &Operators| {
            Amount(s.total_supply)
        }))
        .invariant(Rule::new(
            "forall({a: address}, allocated[token](a) == self.balances[a])",
            |t| t.new.state.balances.mirrors(&t.new.ledger, &token()),
        ))
        .invariant(Rule::new(
            "forall({o: address, a: address}, trusted(a, by=o) == self.operators[o][a])",
            |t| t.new.ledger.trust_pairs().eq(t.new.state.operators.iter().copied()),
        ))
        .function(
            Entry::new("set_operator", |s, exec, args| {
                let operator = args.address(0)?;
                let approved = args.boolean(1)?;
                let owner = exec.msg_sender();
                exec.require(operator != owner, "operator != msg.sender")?;
                if approved {
                    s.operators.insert((owner, operator));
                } else {
                    s.operators.remove(&(owner, operator));
                }
                exec.trust(operator, approved)
            })
            .param("operator", ParamKind::Address)
            .param("approved", ParamKind::Bool),
        )
        .function(transfer("operator_transfer", true))
        .function(transfer("force_transfer", false))
}
