//! End-to-end reconciliation of resting orders against target levels.

mod support;

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tidemark::bot::TickOutcome;
use tidemark::domain::{Asset, Balance, LiveOrder, Mutation, PairBalances, SideOrders};
use tidemark::port::LedgerClient;
use tidemark::risk::ReserveLimits;
use tidemark::testkit::domain::{account, ask, bid_offer, funded_ledger, usd};
use tidemark::testkit::feed::ScriptedFeed;

use support::{BotBuilder, BUY_SELL};

fn sorted_asks(orders: Vec<LiveOrder>) -> Vec<(Decimal, Decimal)> {
    let mut asks: Vec<_> = orders
        .into_iter()
        .filter(|o| o.selling.is_native())
        .map(|o| (o.price, o.amount))
        .collect();
    asks.sort();
    asks
}

#[tokio::test]
async fn first_tick_places_levels_around_center() {
    let ledger = funded_ledger(dec!(100), dec!(50));
    let mut bot = BotBuilder::new(ledger.clone(), Arc::new(ScriptedFeed::fixed(dec!(2.0)))).build();

    let report = bot.tick().await;

    assert_eq!(report.outcome, TickOutcome::Synced { pruned: 0, submitted: 2 });
    // Outermost level is created first.
    assert_eq!(
        ledger.orders(),
        vec![ask(1, dec!(2.04), dec!(30)), ask(2, dec!(2.02), dec!(50))]
    );
}

#[tokio::test]
async fn unchanged_signal_emits_nothing() {
    let ledger = funded_ledger(dec!(100), dec!(50));
    let mut bot = BotBuilder::new(ledger.clone(), Arc::new(ScriptedFeed::fixed(dec!(2.0)))).build();
    bot.tick().await;
    let before = ledger.orders();

    let report = bot.tick().await;

    assert_eq!(report.outcome, TickOutcome::Synced { pruned: 0, submitted: 0 });
    assert_eq!(ledger.orders(), before);
    assert_eq!(bot.tracked_orders().selling.len(), 2);
}

#[tokio::test]
async fn surplus_orders_are_pruned_outermost_first() {
    let ledger = funded_ledger(dec!(100), dec!(50));
    for (price, amount) in [
        (dec!(2.02), dec!(50)),
        (dec!(2.04), dec!(30)),
        (dec!(2.06), dec!(5)),
        (dec!(2.08), dec!(5)),
        (dec!(2.10), dec!(5)),
    ] {
        ledger.insert_order(Asset::Native, usd(), price, amount);
    }
    let mut bot = BotBuilder::new(ledger.clone(), Arc::new(ScriptedFeed::fixed(dec!(2.0)))).build();

    let report = bot.tick().await;

    assert_eq!(report.outcome, TickOutcome::Synced { pruned: 3, submitted: 0 });
    assert_eq!(
        sorted_asks(ledger.orders()),
        vec![(dec!(2.02), dec!(50)), (dec!(2.04), dec!(30))]
    );
}

#[tokio::test]
async fn small_moves_stay_within_tolerance() {
    let ledger = funded_ledger(dec!(100), dec!(50));
    let feed = Arc::new(ScriptedFeed::fixed(dec!(2.0)));
    let mut bot = BotBuilder::new(ledger.clone(), feed.clone()).build();
    bot.tick().await;

    // 0.25% move with a 0.5% price tolerance.
    feed.set_price(dec!(2.005));
    assert_eq!(
        bot.tick().await.outcome,
        TickOutcome::Synced { pruned: 0, submitted: 0 }
    );

    // 1% move.
    feed.set_price(dec!(2.02));
    assert_eq!(
        bot.tick().await.outcome,
        TickOutcome::Synced { pruned: 0, submitted: 2 }
    );
    assert_eq!(
        ledger.orders(),
        vec![ask(1, dec!(2.0604), dec!(30)), ask(2, dec!(2.0402), dec!(50))]
    );
}

#[tokio::test]
async fn exposure_cap_suppresses_inner_level() {
    // Spendable native is 60 - 3 * 0.5 - 20 = 38.5. The sell side is capped to
    // 50 + 10 by the balance; the outer 10 fits, the inner 50 does not.
    let ledger = funded_ledger(dec!(60), dec!(50));
    let mut bot = BotBuilder::new(ledger.clone(), Arc::new(ScriptedFeed::fixed(dec!(2.0))))
        .limits(ReserveLimits::default())
        .build();

    let report = bot.tick().await;

    assert_eq!(report.outcome, TickOutcome::Synced { pruned: 0, submitted: 1 });
    assert_eq!(ledger.orders(), vec![ask(1, dec!(2.04), dec!(10))]);
}

#[tokio::test]
async fn both_sides_are_placed_with_buys_in_offer_terms() {
    let ledger = funded_ledger(dec!(100), dec!(50));
    let mut bot = BotBuilder::new(ledger.clone(), Arc::new(ScriptedFeed::fixed(dec!(2.0))))
        .strategy(BUY_SELL)
        .build();

    let report = bot.tick().await;

    assert_eq!(report.outcome, TickOutcome::Synced { pruned: 0, submitted: 4 });
    let orders = ledger.orders();
    // Sells go first when there is no previous bid.
    assert!(orders[0].selling.is_native());
    assert!(orders[1].selling.is_native());
    assert_eq!(orders[2], bid_offer(3, dec!(0.5102041), dec!(9.8)));
    assert_eq!(orders[3], bid_offer(4, dec!(0.5050505), dec!(19.8)));
}

async fn ordered_mutations(center: Decimal) -> Vec<Mutation> {
    let ledger = funded_ledger(dec!(100), dec!(50));
    let guard = support::guard(ledger.clone(), support::loose_limits());
    guard.observe_account(ledger.load_account(&account()).await.unwrap());
    let mut strategy = support::strategy(BUY_SELL, guard, Arc::new(ScriptedFeed::fixed(center)));

    // Previous best bid 1.98, previous best ask 2.02.
    let orders = SideOrders {
        buying: vec![bid_offer(1, dec!(0.5050505), dec!(19.8))],
        selling: vec![ask(2, dec!(2.02), dec!(50))],
    };
    strategy
        .pre_update(&PairBalances::new(
            Balance::native(dec!(100)),
            Balance::credit(dec!(50), dec!(1000000)),
        ))
        .await
        .unwrap();
    strategy.update_with_ops(&orders).await.unwrap()
}

#[tokio::test]
async fn sells_move_first_while_ask_stays_above_bid() {
    let mutations = ordered_mutations(dec!(2.0)).await;

    assert!(!mutations.is_empty());
    assert_eq!(mutations[0].selling(), &Asset::Native);
}

#[tokio::test]
async fn buys_move_first_when_ask_would_cross_previous_bid() {
    // New best ask is 1.9 * 1.01 = 1.919, below the previous bid of 1.98.
    let mutations = ordered_mutations(dec!(1.9)).await;

    assert_eq!(mutations[0].selling(), &usd());
    let first_sell = mutations
        .iter()
        .position(|m| m.selling().is_native())
        .unwrap();
    assert!(mutations[..first_sell].iter().all(|m| m.selling() == &usd()));
}
