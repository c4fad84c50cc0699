//! `non_injective_foreach.vy`: quantified offers indexed by `i ** e`.

use tally_types::{Address, Amount, OfferKey, Resource, ResourceDecl};
use tally_verify::{Abort, Constructor, Contract, EntryPoint, ParamKind};

/// The contract keeps no storage; everything lives in the ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Offers;

type Entry = EntryPoint<Offers>;

const FOO_OFFERS: &str =
    "foreach({i: uint256}, offer[token <-> token](i ** e, 0, to=ZERO_ADDRESS, times=1))";
const BAR_OFFERS: &str =
    "foreach({i: uint256}, offer[token <-> token](i ** 1, 0, to=ZERO_ADDRESS, times=1))";

fn token() -> Resource {
    Resource::named("token")
}

fn offer(amount: u128, from: Address) -> OfferKey {
    OfferKey {
        give: token(),
        take: token(),
        give_amount: Amount(amount),
        take_amount: Amount::ZERO,
        from,
        to: Address::ZERO,
    }
}

fn power(base: u128, exp: u128) -> Result<u128, Abort> {
    u32::try_from(exp)
        .ok()
        .and_then(|exp| base.checked_pow(exp))
        .ok_or_else(|| Abort::revert(format!("overflow in {} ** {}", base, exp)))
}

pub fn contract() -> Contract<Offers> {
    Contract::new("non_injective_foreach", Constructor::with_state(Offers))
        .resource(ResourceDecl::declared("token"))
        .function(
            Entry::new("foo", |_, exec, args| {
                let e = args.uint(0)?;
                let from = exec.msg_sender();
                exec.foreach_offer(FOO_OFFERS, |i| Ok((offer(power(i, e)?, from), 1)))
            })
            .param("e", ParamKind::Uint),
        )
        .function(Entry::new("bar", |_, exec, _| {
            let from = exec.msg_sender();
            exec.foreach_offer(BAR_OFFERS, |i| Ok((offer(power(i, 1)?, from), 1)))
        }))
}
