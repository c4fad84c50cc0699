//! `history.vy`: a counter whose invariant compares against the pre-state.

use tally_verify::{Constructor, Contract, EntryPoint, Spec};

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct History {
    pub counter: u128,
}

type Rule = Spec<History>;
type Entry = EntryPoint<History>;

pub fn contract() -> Contract<History> {
    Contract::new("history", Constructor::with_state(History::default()))
        .invariant(
            Rule::new("old(self.counter) <= self.counter", |t| {
                t.old.state.counter <= t.new.state.counter
            })
            .label("INC"),
        )
        .function(Entry::new("increment", |s, exec, _| {
            s.counter = exec.add(s.counter, 1)?;
            Ok(())
        }))
        .function(Entry::new("decrease", |s, exec, _| {
            s.counter = exec.sub(s.counter, 1)?;
            Ok(())
        }))
}
