use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tally_types::{Address, Amount, OfferKey, Resource};
use tracing::{debug, warn};

use crate::error::LedgerError;

/// Allocation, offer and trust state of one contract.
///
/// Zero allocations and zero offers are never stored, so two ledgers are
/// equal exactly when they describe the same accounting state. Ordered maps
/// keep iteration (and therefore exploration) deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Ledger {
    allocated: BTreeMap<Resource, BTreeMap<Address, Amount>>,
    offered: BTreeMap<OfferKey, u128>,
    /// (owner, trustee) pairs.
    trusted: BTreeSet<(Address, Address)>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Queries ---

    pub fn allocated(&self, resource: &Resource, holder: Address) -> Amount {
        self.allocated
            .get(resource)
            .and_then(|holders| holders.get(&holder))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Sum of all allocations of `resource`.
    pub fn total(&self, resource: &Resource) -> Amount {
        self.allocated
            .get(resource)
            .map(|holders| holders.values().copied().sum())
            .unwrap_or(Amount::ZERO)
    }

    /// Total allocation over every instance of the named resource,
    /// whatever its arguments. Creator rights are not counted.
    pub fn total_named(&self, name: &str) -> Amount {
        self.allocated
            .iter()
            .filter(|(resource, _)| matches!(resource, Resource::Named { name: n, .. } if n == name))
            .flat_map(|(_, holders)| holders.values().copied())
            .sum()
    }

    /// Non-zero allocations of `resource`, ordered by address.
    pub fn holders(&self, resource: &Resource) -> Vec<(Address, Amount)> {
        self.allocated
            .get(resource)
            .map(|holders| holders.iter().map(|(a, n)| (*a, *n)).collect())
            .unwrap_or_default()
    }

    /// Resources with at least one non-zero allocation.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.allocated.keys()
    }

    pub fn offered(&self, offer: &OfferKey) -> u128 {
        self.offered.get(offer).copied().unwrap_or(0)
    }

    /// Every address trusts itself.
    pub fn trusts(&self, owner: Address, actor: Address) -> bool {
        owner == actor || self.trusted.contains(&(owner, actor))
    }

    /// Recorded (owner, trustee) pairs, self-trust excluded.
    pub fn trust_pairs(&self) -> impl Iterator<Item = (Address, Address)> + '_ {
        self.trusted.iter().copied()
    }

    /// Fails unless `actor` may operate on `owner`'s allocations.
    pub fn authorize(&self, owner: Address, actor: Address) -> Result<(), LedgerError> {
        if self.trusts(owner, actor) {
            Ok(())
        } else {
            warn!(owner = %owner, actor = %actor, "Actor is not trusted by owner");
            Err(LedgerError::NotTrusted { owner, actor })
        }
    }

    // --- Unchecked allocation (wei entering and leaving, deployment grants) ---

    /// Add `amount` of `resource` to `to` without any rights check.
    pub fn allocate(
        &mut self,
        resource: &Resource,
        amount: Amount,
        to: Address,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        let updated = self
            .allocated(resource, to)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow {
                resource: resource.clone(),
            })?;
        self.set(resource, to, updated);
        Ok(())
    }

    /// Remove `amount` of `resource` from `from`.
    pub fn deallocate(
        &mut self,
        resource: &Resource,
        amount: Amount,
        from: Address,
    ) -> Result<(), LedgerError> {
        let remaining = self.withdrawable(resource, amount, from)?;
        self.set(resource, from, remaining);
        Ok(())
    }

    // --- Lifecycle verbs ---

    /// Mint `amount` of `resource` to `to`.
    ///
    /// The actor needs a unit of `creator(resource)`; for a creator right
    /// itself, holding that same right is enough.
    pub fn create(
        &mut self,
        resource: &Resource,
        amount: Amount,
        to: Address,
        actor: Address,
    ) -> Result<(), LedgerError> {
        let right = match resource {
            Resource::Creator(_) => resource.clone(),
            other => other.creator(),
        };
        if self.allocated(&right, actor).is_zero() {
            warn!(resource = %resource, actor = %actor, "Create without creator rights");
            return Err(LedgerError::NotACreator {
                resource: resource.clone(),
                actor,
            });
        }
        self.allocate(resource, amount, to)?;
        debug!(resource = %resource, amount = %amount, to = %to, "Created");
        Ok(())
    }

    /// Burn `amount` of `resource` held by `actor`.
    pub fn destroy(
        &mut self,
        resource: &Resource,
        amount: Amount,
        actor: Address,
    ) -> Result<(), LedgerError> {
        self.deallocate(resource, amount, actor)?;
        debug!(resource = %resource, amount = %amount, actor = %actor, "Destroyed");
        Ok(())
    }

    /// Move `amount` of `resource` from `from` to `to`.
    pub fn reallocate(
        &mut self,
        resource: &Resource,
        amount: Amount,
        from: Address,
        to: Address,
    ) -> Result<(), LedgerError> {
        let remaining = self.withdrawable(resource, amount, from)?;
        if from == to || amount.is_zero() {
            return Ok(());
        }
        let received = self
            .allocated(resource, to)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow {
                resource: resource.clone(),
            })?;
        self.set(resource, from, remaining);
        self.set(resource, to, received);
        debug!(resource = %resource, amount = %amount, from = %from, to = %to, "Reallocated");
        Ok(())
    }

    /// Add `times` outstanding copies of `offer`.
    pub fn offer(&mut self, offer: OfferKey, times: u128) -> Result<(), LedgerError> {
        if times == 0 {
            return Ok(());
        }
        let updated =
            self.offered(&offer)
                .checked_add(times)
                .ok_or_else(|| LedgerError::Overflow {
                    resource: offer.give.clone(),
                })?;
        debug!(offer = %offer, times = updated, "Offered");
        self.offered.insert(offer, updated);
        Ok(())
    }

    /// Withdraw every outstanding copy of `offer`.
    pub fn revoke(&mut self, offer: &OfferKey) {
        if self.offered.remove(offer).is_some() {
            debug!(offer = %offer, "Revoked");
        }
    }

    /// Quantified offer: one offer per element of the quantified domain.
    ///
    /// Distinct elements must produce distinct offers; otherwise the count
    /// of the aliased offer would be ambiguous. Applied atomically.
    pub fn foreach_offer(&mut self, offers: Vec<(OfferKey, u128)>) -> Result<(), LedgerError> {
        check_injective(offers.iter().map(|(offer, _)| offer))?;
        let mut next = self.clone();
        for (offer, times) in offers {
            next.offer(offer, times)?;
        }
        *self = next;
        Ok(())
    }

    /// Quantified revoke, with the same injectivity requirement.
    pub fn foreach_revoke(&mut self, offers: Vec<OfferKey>) -> Result<(), LedgerError> {
        check_injective(offers.iter())?;
        for offer in &offers {
            self.revoke(offer);
        }
        Ok(())
    }

    /// Swap `times` rounds of `offer` between `offer.from` and `offer.to`.
    ///
    /// Every party other than `executor` must have an outstanding offer for
    /// each round; the executing party consents by executing. Both parties
    /// must hold their side before the swap. Applied atomically.
    pub fn exchange(
        &mut self,
        offer: &OfferKey,
        times: u128,
        executor: Address,
    ) -> Result<(), LedgerError> {
        let reverse = offer.reversed();
        let give_total = offer
            .give_amount
            .checked_mul(Amount(times))
            .ok_or_else(|| LedgerError::Overflow {
                resource: offer.give.clone(),
            })?;
        let take_total = offer
            .take_amount
            .checked_mul(Amount(times))
            .ok_or_else(|| LedgerError::Overflow {
                resource: offer.take.clone(),
            })?;

        let mut next = self.clone();
        if executor != offer.from {
            next.consume_offer(offer, times)?;
        }
        if executor != offer.to {
            next.consume_offer(&reverse, times)?;
        }

        self.withdrawable(&offer.give, give_total, offer.from)?;
        self.withdrawable(&offer.take, take_total, offer.to)?;
        next.reallocate(&offer.give, give_total, offer.from, offer.to)?;
        next.reallocate(&offer.take, take_total, offer.to, offer.from)?;

        debug!(offer = %offer, times, executor = %executor, "Exchanged");
        *self = next;
        Ok(())
    }

    /// Record (or withdraw) `owner`'s trust in `trustee`.
    pub fn trust(&mut self, owner: Address, trustee: Address, value: bool) {
        if owner == trustee {
            return;
        }
        if value {
            self.trusted.insert((owner, trustee));
        } else {
            self.trusted.remove(&(owner, trustee));
        }
        debug!(owner = %owner, trustee = %trustee, value, "Trust updated");
    }

    /// Serializable view of the whole ledger.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            allocations: self
                .allocated
                .iter()
                .flat_map(|(resource, holders)| {
                    holders.iter().map(move |(holder, amount)| LedgerEntry {
                        resource: resource.clone(),
                        holder: *holder,
                        amount: *amount,
                    })
                })
                .collect(),
            offers: self
                .offered
                .iter()
                .map(|(offer, times)| OfferEntry {
                    offer: offer.clone(),
                    times: *times,
                })
                .collect(),
            trusted: self.trusted.iter().copied().collect(),
        }
    }

    fn withdrawable(
        &self,
        resource: &Resource,
        amount: Amount,
        holder: Address,
    ) -> Result<Amount, LedgerError> {
        let available = self.allocated(resource, holder);
        available
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientFunds {
                resource: resource.clone(),
                holder,
                required: amount,
                available,
            })
    }

    fn consume_offer(&mut self, offer: &OfferKey, times: u128) -> Result<(), LedgerError> {
        let available = self.offered(offer);
        let remaining = available
            .checked_sub(times)
            .ok_or_else(|| LedgerError::NoOffer {
                offer: offer.clone(),
                required: times,
                available,
            })?;
        if remaining == 0 {
            self.offered.remove(offer);
        } else {
            self.offered.insert(offer.clone(), remaining);
        }
        Ok(())
    }

    fn set(&mut self, resource: &Resource, holder: Address, amount: Amount) {
        if amount.is_zero() {
            if let Some(holders) = self.allocated.get_mut(resource) {
                holders.remove(&holder);
                if holders.is_empty() {
                    self.allocated.remove(resource);
                }
            }
        } else {
            self.allocated
                .entry(resource.clone())
                .or_default()
                .insert(holder, amount);
        }
    }
}

fn check_injective<'a>(offers: impl Iterator<Item = &'a OfferKey>) -> Result<(), LedgerError> {
    let mut seen = BTreeSet::new();
    for offer in offers {
        if !seen.insert(offer) {
            warn!(offer = %offer, "Quantified offer is not injective");
            return Err(LedgerError::OfferNotInjective {
                offer: offer.clone(),
            });
        }
    }
    Ok(())
}

/// One non-zero allocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub resource: Resource,
    pub holder: Address,
    pub amount: Amount,
}

/// One outstanding offer and its multiplicity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferEntry {
    pub offer: OfferKey,
    pub times: u128,
}

/// Flat, serializable form of a [`Ledger`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub allocations: Vec<LedgerEntry>,
    pub offers: Vec<OfferEntry>,
    pub trusted: Vec<(Address, Address)>,
}
