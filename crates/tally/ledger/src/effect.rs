use serde::{Deserialize, Serialize};
use tally_types::ErrorKind;

/// Resource operations a contract function can perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Create,
    Destroy,
    Reallocate,
    Offer,
    Revoke,
    Exchange,
    Trust,
    /// Wei sent out of the contract.
    Send,
}

impl EffectKind {
    /// Error kind reported when this operation fails.
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            EffectKind::Create => ErrorKind::CreateFailed,
            EffectKind::Destroy => ErrorKind::DestroyFailed,
            EffectKind::Reallocate => ErrorKind::ReallocateFailed,
            EffectKind::Offer => ErrorKind::OfferFailed,
            EffectKind::Revoke => ErrorKind::RevokeFailed,
            EffectKind::Exchange => ErrorKind::ExchangeFailed,
            EffectKind::Trust => ErrorKind::TrustFailed,
            EffectKind::Send => ErrorKind::CallFailed,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            EffectKind::Create => "create",
            EffectKind::Destroy => "destroy",
            EffectKind::Reallocate => "reallocate",
            EffectKind::Offer => "offer",
            EffectKind::Revoke => "revoke",
            EffectKind::Exchange => "exchange",
            EffectKind::Trust => "trust",
            EffectKind::Send => "send",
        }
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.verb())
    }
}
