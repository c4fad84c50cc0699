//! `swap.vy`: goods traded for deposited wei through offers.
//!
//! A seller offers one good to a specific buyer at an asking price; the
//! buyer completes the trade with an exchange. `steal` tries the same
//! exchange at price zero, which no seller ever offered.

use std::collections::BTreeMap;

use tally_types::{Address, Amount, OfferKey, Resource, ResourceDecl};
use tally_verify::{Constructor, Contract, EntryPoint, ParamKind, Spec};

use crate::Balances;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Swap {
    pub owner: Address,
    pub total_goods: u128,
    pub goods: Balances,
    pub deposits: Balances,
    /// (seller, buyer) -> asking price
    pub asks: BTreeMap<(Address, Address), u128>,
}

type Rule = Spec<Swap>;
type Entry = EntryPoint<Swap>;

fn good() -> Resource {
    Resource::named("good")
}

/// `offer[good <-> wei](1, price, to=buyer)` made by `seller`.
fn ask(seller: Address, buyer: Address, price: u128) -> OfferKey {
    OfferKey {
        give: good(),
        take: Resource::Wei,
        give_amount: Amount::ONE,
        take_amount: Amount(price),
        from: seller,
        to: buyer,
    }
}

pub fn contract() -> Contract<Swap> {
    let init = Constructor::new(|exec, _| {
        Ok(Swap {
            owner: exec.msg_sender(),
            total_goods: 0,
            goods: Balances::new(),
            deposits: Balances::new(),
            asks: BTreeMap::new(),
        })
    });

    Contract::new("swap", init)
        .resource(ResourceDecl::declared("good"))
        .invariant(Rule::conserves(good(), "total_goods", |s: &Swap| {
            Amount(s.total_goods)
        }))
        .invariant(Rule::new(
            "forall({a: address}, allocated[good](a) == self.goods[a])",
            |t| t.new.state.goods.mirrors(&t.new.ledger, &good()),
        ))
        .invariant(Rule::new(
            "forall({a: address}, allocated[wei](a) == self.deposits[a])",
            |t| t.new.state.deposits.mirrors(&t.new.ledger, &Resource::Wei),
        ))
        .invariant(Rule::new("sum(allocated[wei]()) == self.balance", |t| {
            t.new.total(&Resource::Wei) == t.new.balance
        }))
        .function(
            Entry::new("produce", |s, exec, args| {
                let amount = args.uint(0)?;
                let sender = exec.msg_sender();
                exec.require(sender == s.owner, "msg.sender == self.owner")?;
                s.total_goods = exec.add(s.total_goods, amount)?;
                s.goods.credit(sender, amount)?;
                exec.create(&good(), Amount(amount), sender)
            })
            .param("amount", ParamKind::Uint),
        )
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
        .function(
            Entry::new("sell", |s, exec, args| {
                let buyer = args.address(0)?;
                let price = args.uint(1)?;
                let seller = exec.msg_sender();
                exec.require(price > 0, "price > 0")?;
                exec.require(buyer != seller, "buyer != msg.sender")?;
                s.asks.insert((seller, buyer), price);
                exec.offer(ask(seller, buyer, price), 1)
            })
            .param("buyer", ParamKind::Address)
            .param("price", ParamKind::Uint),
        )
        .function(
            Entry::new("cancel", |s, exec, args| {
                let buyer = args.address(0)?;
                let seller = exec.msg_sender();
                let price = s.asks.remove(&(seller, buyer)).unwrap_or(0);
                exec.require(price > 0, "price > 0")?;
                exec.revoke(&ask(seller, buyer, price))
            })
            .param("buyer", ParamKind::Address),
        )
        .function(
            Entry::new("accept", |s, exec, args| {
                let seller = args.address(0)?;
                let price = args.uint(1)?;
                let buyer = exec.msg_sender();
                exec.require(price > 0, "price > 0")?;
                let asked = s.asks.remove(&(seller, buyer)).unwrap_or(0);
                exec.require(asked == price, "self.asks[seller][msg.sender] == price")?;
                s.goods.debit(seller, 1)?;
                s.goods.credit(buyer, 1)?;
                s.deposits.debit(buyer, price)?;
                s.deposits.credit(seller, price)?;
                exec.exchange(&ask(seller, buyer, price), 1)
            })
            .param("seller", ParamKind::Address)
            .param("price", ParamKind::Uint),
        )
        .function(
            Entry::new("steal", |s, exec, args| {
                let seller = args.address(0)?;
                let thief = exec.msg_sender();
                exec.require(seller != thief, "seller != msg.sender")?;
                exec.exchange(&ask(seller, thief, 0), 1)?;
                s.goods.debit(seller, 1)?;
                s.goods.credit(thief, 1)
            })
            .param("seller", ParamKind::Address),
        )
}
