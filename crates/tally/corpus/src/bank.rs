//! `bank.vy`: deposits tracked as wei allocations.

use tally_types::{Address, Amount, Resource};
use tally_verify::{Constructor, Contract, EntryPoint, ParamKind, Spec};

use crate::Balances;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Bank {
    pub owner: Address,
    pub deposits: Balances,
}

type Rule = Spec<Bank>;
type Entry = EntryPoint<Bank>;

pub fn contract() -> Contract<Bank> {
    let init = Constructor::new(|exec, _| {
        Ok(Bank {
            owner: exec.msg_sender(),
            deposits: Balances::new(),
        })
    });

    Contract::new("bank", init)
        .invariant(Rule::new(
            "forall({a: address}, allocated[wei](a) == self.deposits[a])",
            |t| t.new.state.deposits.mirrors(&t.new.ledger, &Resource::Wei),
        ))
        .invariant(Rule::new(
            "implies(not selfdestruct(), sum(allocated[wei]()) == self.balance)",
            |t| t.new.destroyed || t.new.total(&Resource::Wei) == t.new.balance,
        ))
        .function(
            Entry::new("deposit", |s, exec, _| {
                s.deposits.credit(exec.msg_sender(), exec.msg_value().value())
            })
            .payable(),
        )
        .function(
            Entry::new("withdraw", |s, exec, args| {
                let amount = args.uint(0)?;
                let sender = exec.msg_sender();
                s.deposits.debit(sender, amount)?;
                exec.send(sender, Amount(amount))
            })
            .param("amount", ParamKind::Uint),
        )
        .function(Entry::new("close", |s, exec, _| {
            exec.require(exec.msg_sender() == s.owner, "msg.sender == self.owner")?;
            exec.selfdestruct(s.owner);
            Ok(())
        }))
}
