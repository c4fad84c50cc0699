use serde::{Deserialize, Serialize};

use crate::{Address, Amount, WEI};

/// A concrete resource instance tracked by the ledger.
///
/// `Named` resources may carry arguments (`token(3)` is a different
/// resource from `token(4)`). `Creator(r)` is the right to mint `r`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Resource {
    Wei,
    Named { name: String, args: Vec<u128> },
    Creator(Box<Resource>),
}

impl Resource {
    pub fn named(name: impl Into<String>) -> Self {
        Resource::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(name: impl Into<String>, args: Vec<u128>) -> Self {
        Resource::Named {
            name: name.into(),
            args,
        }
    }

    /// The creator right for this resource.
    pub fn creator(&self) -> Self {
        Resource::Creator(Box::new(self.clone()))
    }

    /// Declared name of the resource, looking through creator rights.
    pub fn name(&self) -> &str {
        match self {
            Resource::Wei => WEI,
            Resource::Named { name, .. } => name,
            Resource::Creator(inner) => inner.name(),
        }
    }

    pub fn is_creator(&self) -> bool {
        matches!(self, Resource::Creator(_))
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Wei => write!(f, "{}", WEI),
            Resource::Named { name, args } if args.is_empty() => write!(f, "{}", name),
            Resource::Named { name, args } => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", name, args.join(", "))
            }
            Resource::Creator(inner) => write!(f, "creator({})", inner),
        }
    }
}

/// How a resource came to exist in a contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    /// `#@ resource: name(...)`
    Declared,
    /// `#@ derived resource: name(...) -> Interface.resource`
    Derived { underlying: String },
}

/// A resource declaration: name, parameter names and provenance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDecl {
    pub name: String,
    pub params: Vec<String>,
    pub kind: ResourceKind,
}

impl ResourceDecl {
    pub fn declared(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            kind: ResourceKind::Declared,
        }
    }

    pub fn derived(name: impl Into<String>, underlying: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            kind: ResourceKind::Derived {
                underlying: underlying.into(),
            },
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn is_derived(&self) -> bool {
        matches!(self.kind, ResourceKind::Derived { .. })
    }
}

/// Identity of an outstanding offer: `from` is willing to give
/// `give_amount` of `give` to `to` in return for `take_amount` of `take`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OfferKey {
    pub give: Resource,
    pub take: Resource,
    pub give_amount: Amount,
    pub take_amount: Amount,
    pub from: Address,
    pub to: Address,
}

impl OfferKey {
    /// The offer the counterparty has to make for the same exchange.
    pub fn reversed(&self) -> OfferKey {
        OfferKey {
            give: self.take.clone(),
            take: self.give.clone(),
            give_amount: self.take_amount,
            take_amount: self.give_amount,
            from: self.to,
            to: self.from,
        }
    }
}

impl std::fmt::Display for OfferKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "offer[{} <-> {}]({}, {}, from={}, to={})",
            self.give, self.take, self.give_amount, self.take_amount, self.from, self.to
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_display() {
        assert_eq!(Resource::Wei.to_string(), "wei");
        assert_eq!(Resource::named("token").to_string(), "token");
        assert_eq!(Resource::with_args("nft", vec![1, 2]).to_string(), "nft(1, 2)");
        assert_eq!(
            Resource::named("token").creator().to_string(),
            "creator(token)"
        );
    }

    #[test]
    fn creator_name_looks_through() {
        let creator = Resource::named("token").creator().creator();
        assert_eq!(creator.name(), "token");
        assert!(creator.is_creator());
        assert!(!Resource::named("token").is_creator());
    }

    #[test]
    fn parameterised_resources_are_distinct() {
        assert_ne!(
            Resource::with_args("nft", vec![1]),
            Resource::with_args("nft", vec![2])
        );
    }

    #[test]
    fn offer_reversal_swaps_sides() {
        let key = OfferKey {
            give: Resource::named("gold"),
            take: Resource::named("silver"),
            give_amount: Amount(1),
            take_amount: Amount(3),
            from: Address(1),
            to: Address(2),
        };
        let rev = key.reversed();
        assert_eq!(rev.give, Resource::named("silver"));
        assert_eq!(rev.give_amount, Amount(3));
        assert_eq!(rev.from, Address(2));
        assert_eq!(rev.reversed(), key);
    }

    #[test]
    fn derived_declaration() {
        let decl = ResourceDecl::derived("token", "Token.token").with_param("id");
        assert!(decl.is_derived());
        assert_eq!(decl.params, vec!["id".to_string()]);
        assert!(!ResourceDecl::declared("token").is_derived());
    }
}
