//! `counter.vy`: a bounded counter with function and general
//! postconditions and a check. Verifies cleanly.

use tally_types::Address;
use tally_verify::{Constructor, Contract, EntryPoint, ParamKind, Spec};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Counter {
    pub owner: Address,
    pub limit: u128,
    pub count: u128,
}

type Rule = Spec<Counter>;
type Entry = EntryPoint<Counter>;

pub fn contract() -> Contract<Counter> {
    let init = Constructor::new(|exec, args| {
        Ok(Counter {
            owner: exec.msg_sender(),
            limit: args.uint(0)?,
            count: 0,
        })
    })
    .param("limit", ParamKind::Uint);

    Contract::new("counter", init)
        .invariant(Rule::new("self.owner == old(self.owner)", |t| {
            t.new.state.owner == t.old.state.owner
        }))
        .invariant(Rule::new("self.count <= self.limit", |t| {
            t.new.state.count <= t.new.state.limit
        }))
        .postcondition(Rule::new(
            "msg.sender != self.owner ==> self.count >= old(self.count)",
            |t| t.msg.sender == t.new.state.owner || t.new.state.count >= t.old.state.count,
        ))
        .check(Rule::new("self.limit == old(self.limit)", |t| {
            t.new.state.limit == t.old.state.limit
        }))
        .function(
            Entry::new("inc", |s, exec, _| {
                exec.require(s.count < s.limit, "self.count < self.limit")?;
                s.count = exec.add(s.count, 1)?;
                Ok(())
            })
            .ensures(Rule::new(
                "success() ==> self.count == old(self.count) + 1",
                |t| t.old.state.count.checked_add(1) == Some(t.new.state.count),
            )),
        )
        .function(Entry::new("reset", |s, exec, _| {
            exec.require(exec.msg_sender() == s.owner, "msg.sender == self.owner")?;
            s.count = 0;
            Ok(())
        }))
}
