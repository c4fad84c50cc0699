//! `performs.vy`: functions declare the resource effects they perform.

use tally_ledger::EffectKind;
use tally_types::{Address, Amount, Resource, ResourceDecl};
use tally_verify::{Constructor, Contract, EntryPoint, ParamKind, Performs, Spec};

use crate::Balances;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ledgered {
    pub owner: Address,
    pub total_supply: u128,
    pub balances: Balances,
}

type Rule = Spec<Ledgered>;
type Entry = EntryPoint<Ledgered>;

fn token() -> Resource {
    Resource::named("token")
}

pub fn contract() -> Contract<Ledgered> {
    let init = Constructor::new(|exec, _| {
        let owner = exec.msg_sender();
        let mut balances = Balances::new();
        balances.credit(owner, 2)?;
        exec.create(&token(), Amount(2), owner)?;
        Ok(Ledgered {
            owner,
            total_supply: 2,
            balances,
        })
    });

    Contract::new("performs", init)
        .resource(ResourceDecl::declared("token"))
        .invariant(Rule::conserves(token(), "total_supply", |s: &Ledgered| {
            Amount(s.total_supply)
        }))
        .invariant(Rule::new(
            "forall({a: address}, allocated[token](a) == self.balances[a])",
            |t| t.new.state.balances.mirrors(&t.new.ledger, &token()),
        ))
        .function(
            Entry::new("transfer", |s, exec, args| {
                let to = args.address(0)?;
                let amount = args.uint(1)?;
                s.balances.debit(exec.msg_sender(), amount)?;
                s.balances.credit(to, amount)?;
                exec.reallocate(&token(), Amount(amount), to)
            })
            .param("to", ParamKind::Address)
            .param("amount", ParamKind::Uint)
            .performs(Performs::new(EffectKind::Reallocate, "token")),
        )
        .function(
            Entry::new("burn", |s, exec, args| {
                let amount = args.uint(0)?;
                s.balances.debit(exec.msg_sender(), amount)?;
                s.total_supply = exec.sub(s.total_supply, amount)?;
                exec.destroy(&token(), Amount(amount))
            })
            .param("amount", ParamKind::Uint)
            .performs(Performs::new(EffectKind::Destroy, "token")),
        )
        .function(
            Entry::new("donate", |s, exec, args| {
                let amount = args.uint(0)?;
                s.balances.debit(exec.msg_sender(), amount)?;
                s.balances.credit(s.owner, amount)?;
                exec.reallocate(&token(), Amount(amount), s.owner)
            })
            .param("amount", ParamKind::Uint)
            .performs(Performs::new(EffectKind::Destroy, "token")),
        )
}
