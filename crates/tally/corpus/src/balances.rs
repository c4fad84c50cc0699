use std::collections::BTreeMap;

use tally_ledger::Ledger;
use tally_types::{Address, Amount, Resource};
use tally_verify::Abort;

/// `map(address, uint256)` with Vyper's checked arithmetic.
///
/// Zero entries are not stored, so two maps with the same non-zero
/// balances compare (and hash) equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Balances(BTreeMap<Address, u128>);

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, holder: Address) -> u128 {
        self.0.get(&holder).copied().unwrap_or(0)
    }

    pub fn set(&mut self, holder: Address, value: u128) {
        if value == 0 {
            self.0.remove(&holder);
        } else {
            self.0.insert(holder, value);
        }
    }

    /// `self.map[holder] += amount`; reverts on overflow.
    pub fn credit(&mut self, holder: Address, amount: u128) -> Result<(), Abort> {
        let value = self
            .get(holder)
            .checked_add(amount)
            .ok_or_else(|| Abort::revert(format!("overflow crediting {}", holder)))?;
        self.set(holder, value);
        Ok(())
    }

    /// `self.map[holder] -= amount`; reverts on underflow.
    pub fn debit(&mut self, holder: Address, amount: u128) -> Result<(), Abort> {
        let value = self
            .get(holder)
            .checked_sub(amount)
            .ok_or_else(|| Abort::revert(format!("underflow debiting {}", holder)))?;
        self.set(holder, value);
        Ok(())
    }

    pub fn total(&self) -> u128 {
        self.0.values().fold(0u128, |acc, v| acc.saturating_add(*v))
    }

    /// `forall({a: address}, allocated[resource](a) == self.map[a])`
    pub fn mirrors(&self, ledger: &Ledger, resource: &Resource) -> bool {
        let entries: Vec<(Address, Amount)> =
            self.0.iter().map(|(a, v)| (*a, Amount(*v))).collect();
        ledger.holders(resource) == entries
    }
}
