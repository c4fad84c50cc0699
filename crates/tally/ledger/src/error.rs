use tally_types::{Address, Amount, OfferKey, Reason, Resource};
use thiserror::Error;

/// Ledger operation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient allocation: {holder} holds {available} of {resource}, needs {required}")]
    InsufficientFunds {
        resource: Resource,
        holder: Address,
        required: Amount,
        available: Amount,
    },

    #[error("{actor} holds no creator rights for {resource}")]
    NotACreator { resource: Resource, actor: Address },

    #[error("{owner} does not trust {actor}")]
    NotTrusted { owner: Address, actor: Address },

    #[error("no offer: {offer} is offered {available} times, needs {required}")]
    NoOffer {
        offer: OfferKey,
        required: u128,
        available: u128,
    },

    #[error("quantified offers are not injective: {offer} is produced more than once")]
    OfferNotInjective { offer: OfferKey },

    #[error("arithmetic overflow on {resource}")]
    Overflow { resource: Resource },
}

impl LedgerError {
    /// Diagnostic reason for this failure, `None` for arithmetic overflow,
    /// which reverts the transaction instead of failing verification.
    pub fn reason(&self) -> Option<Reason> {
        match self {
            LedgerError::InsufficientFunds { .. } => Some(Reason::InsufficientFunds),
            LedgerError::NotACreator { .. } => Some(Reason::NotACreator),
            LedgerError::NotTrusted { .. } => Some(Reason::NotTrusted),
            LedgerError::NoOffer { .. } => Some(Reason::NoOffer),
            LedgerError::OfferNotInjective { .. } => Some(Reason::OfferNotInjective),
            LedgerError::Overflow { .. } => None,
        }
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
