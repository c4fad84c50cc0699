use serde::{Deserialize, Serialize};

/// Account address.
///
/// Models only need a small, ordered universe of accounts, so an address is
/// an index rather than a 20-byte word. `Address::ZERO` is never used as a
/// sender by the verifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub u64);

impl Address {
    pub const ZERO: Address = Address(0);

    pub fn new(index: u64) -> Self {
        Self(index)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// Non-negative resource quantity (`uint256` in contract terms).
///
/// All arithmetic is checked; callers decide what overflow means for them.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    pub const ONE: Amount = Amount(1);

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn value(&self) -> u128 {
        self.0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn checked_mul(self, other: Amount) -> Option<Amount> {
        self.0.checked_mul(other.0).map(Amount)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Amount::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_display_is_hex() {
        assert_eq!(Address::new(10).to_string(), "0x000a");
        assert!(Address::ZERO.is_zero());
    }

    #[test]
    fn amount_checked_arithmetic() {
        assert_eq!(Amount(2).checked_add(Amount(3)), Some(Amount(5)));
        assert_eq!(Amount(2).checked_sub(Amount(3)), None);
        assert_eq!(Amount(u128::MAX).checked_add(Amount::ONE), None);
        assert_eq!(Amount(4).checked_mul(Amount(3)), Some(Amount(12)));
    }

    #[test]
    fn amount_sum_saturates() {
        let total: Amount = vec![Amount(u128::MAX), Amount(5)].into_iter().sum();
        assert_eq!(total, Amount(u128::MAX));
        let total: Amount = vec![Amount(1), Amount(2)].into_iter().sum();
        assert_eq!(total, Amount(3));
    }

    #[test]
    fn amount_serialization() {
        let json = serde_json::to_string(&Amount(42)).unwrap();
        let restored: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, Amount(42));
    }
}
