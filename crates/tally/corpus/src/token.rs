//! `token.vy`: a minimal token backed by the `token` resource.

use tally_types::{Address, Amount, Resource, ResourceDecl};
use tally_verify::{Constructor, Contract, EntryPoint, ParamKind, Spec};

use crate::Balances;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token {
    pub minter: Address,
    pub total_supply: u128,
    pub balances: Balances,
}

type Rule = Spec<Token>;
type Entry = EntryPoint<Token>;

fn token() -> Resource {
    Resource::named("token")
}

fn mint(guarded: bool) -> Entry {
    let name = if guarded { "mint" } else { "mint_any" };
    Entry::new(name, move |s, exec, args| {
        let to = args.address(0)?;
        let amount = args.uint(1)?;
        if guarded {
            exec.require(exec.msg_sender() == s.minter, "msg.sender == self.minter")?;
        }
        s.total_supply = exec.add(s.total_supply, amount)?;
        s.balances.credit(to, amount)?;
        exec.create(&token(), Amount(amount), to)
    })
    .param("to", ParamKind::Address)
    .param("amount", ParamKind::Uint)
}

pub fn contract() -> Contract<Token> {
    let init = Constructor::new(|exec, _| {
        Ok(Token {
            minter: exec.msg_sender(),
            total_supply: 0,
            balances: Balances::new(),
        })
    });

    Contract::new("token", init)
        .resource(ResourceDecl::declared("token"))
        .invariant(Rule::conserves(token(), "total_supply", |s: &Token| {
            Amount(s.total_supply)
        }))
        .invariant(Rule::new(
            "forall({a: address}, allocated[token](a) == self.balances[a])",
            |t| t.new.state.balances.mirrors(&t.new.ledger, &token()),
        ))
        .invariant(Rule::new("self.minter == old(self.minter)", |t| {
            t.new.state.minter == t.old.state.minter
        }))
        .function(mint(true))
        .function(mint(false))
        .function(
            Entry::new("burn", |s, exec, args| {
                let amount = args.uint(0)?;
                s.balances.debit(exec.msg_sender(), amount)?;
                s.total_supply = exec.sub(s.total_supply, amount)?;
                exec.destroy(&token(), Amount(amount))
            })
            .param("amount", ParamKind::Uint),
        )
        .function(
            Entry::new("transfer", |s, exec, args| {
                let to = args.address(0)?;
                let amount = args.uint(1)?;
                s.balances.debit(exec.msg_sender(), amount)?;
                s.balances.credit(to, amount)?;
                exec.reallocate(&token(), Amount(amount), to)
            })
            .param("to", ParamKind::Address)
            .param("amount", ParamKind::Uint),
        )
}
