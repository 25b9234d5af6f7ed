//! In-memory ledger for paper trading and tests.
//!
//! Keeps balances, trustlines and resting orders for a single account and
//! checks sequence numbers the way the network does. Orders never fill.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::domain::{AccountId, Asset, Balance, LiveOrder, Mutation, OrderId, TxHash};
use crate::error::LedgerError;
use crate::port::{AccountSnapshot, LedgerClient, Transaction};

#[derive(Debug, Clone)]
struct PaperState {
    sequence: u64,
    balances: HashMap<Asset, Balance>,
    orders: BTreeMap<OrderId, LiveOrder>,
    next_order_id: u64,
    submitted: Vec<u64>,
}

impl PaperState {
    fn subentry_count(&self) -> u32 {
        let trustlines = self.balances.keys().filter(|a| !a.is_native()).count();
        u32::try_from(trustlines + self.orders.len()).unwrap_or(u32::MAX)
    }

    fn selling_liabilities(&self, asset: &Asset) -> Decimal {
        self.orders
            .values()
            .filter(|o| &o.selling == asset)
            .map(|o| o.amount)
            .sum()
    }

    fn buying_liabilities(&self, asset: &Asset) -> Decimal {
        self.orders
            .values()
            .filter(|o| &o.buying == asset)
            .map(LiveOrder::buying_amount)
            .sum()
    }

    fn apply(&mut self, mutation: &Mutation) -> Result<(), LedgerError> {
        match mutation {
            Mutation::Create {
                selling,
                buying,
                price,
                amount,
            } => {
                check_placement(*price, *amount)?;
                let id = OrderId::new(self.next_order_id);
                self.next_order_id += 1;
                self.orders.insert(
                    id,
                    LiveOrder::new(id, selling.clone(), buying.clone(), *price, *amount),
                );
                self.check_funded(selling, buying)
            }
            Mutation::Modify {
                order_id,
                price,
                amount,
                ..
            } => {
                check_placement(*price, *amount)?;
                let order = self
                    .orders
                    .get_mut(order_id)
                    .ok_or_else(|| LedgerError::Rejected(format!("order {order_id} not found")))?;
                order.price = *price;
                order.amount = *amount;
                let (selling, buying) = (order.selling.clone(), order.buying.clone());
                self.check_funded(&selling, &buying)
            }
            Mutation::Delete { order_id, .. } => self
                .orders
                .remove(order_id)
                .map(|_| ())
                .ok_or_else(|| LedgerError::Rejected(format!("order {order_id} not found"))),
        }
    }

    fn check_funded(&self, selling: &Asset, buying: &Asset) -> Result<(), LedgerError> {
        let held = self.balances.get(selling).map(|b| b.available).unwrap_or_default();
        if self.selling_liabilities(selling) > held {
            return Err(LedgerError::Rejected(format!("underfunded {selling}")));
        }

        if buying.is_native() {
            return Ok(());
        }
        let balance = self
            .balances
            .get(buying)
            .ok_or_else(|| LedgerError::Rejected(format!("no trustline for {buying}")))?;
        if let Some(limit) = balance.trust_limit {
            if balance.available + self.buying_liabilities(buying) > limit {
                return Err(LedgerError::Rejected(format!("line full for {buying}")));
            }
        }
        Ok(())
    }
}

fn check_placement(price: Decimal, amount: Decimal) -> Result<(), LedgerError> {
    if price <= Decimal::ZERO || amount <= Decimal::ZERO {
        return Err(LedgerError::Rejected(format!(
            "malformed order: price {price}, amount {amount}"
        )));
    }
    Ok(())
}

/// Paper ledger holding one account.
pub struct PaperLedger {
    account: AccountId,
    state: Mutex<PaperState>,
}

impl PaperLedger {
    /// Create a ledger whose account's current sequence number is `sequence`.
    pub fn new(account: AccountId, sequence: u64) -> Self {
        Self {
            account,
            state: Mutex::new(PaperState {
                sequence,
                balances: HashMap::new(),
                orders: BTreeMap::new(),
                next_order_id: 1,
                submitted: Vec::new(),
            }),
        }
    }

    /// Set the balance of an asset. Credit balances count as a trustline entry.
    pub fn set_balance(&self, asset: Asset, balance: Balance) {
        self.state.lock().balances.insert(asset, balance);
    }

    /// Place an order directly, as another process sharing the account would.
    pub fn insert_order(
        &self,
        selling: Asset,
        buying: Asset,
        price: Decimal,
        amount: Decimal,
    ) -> OrderId {
        let mut state = self.state.lock();
        let id = OrderId::new(state.next_order_id);
        state.next_order_id += 1;
        state
            .orders
            .insert(id, LiveOrder::new(id, selling, buying, price, amount));
        id
    }

    /// Consume a sequence number outside of this process.
    pub fn bump_sequence(&self) {
        self.state.lock().sequence += 1;
    }

    /// Resting orders, by id.
    pub fn orders(&self) -> Vec<LiveOrder> {
        self.state.lock().orders.values().cloned().collect()
    }

    /// Sequence numbers of every transaction the ledger accepted for processing.
    pub fn submitted_sequences(&self) -> Vec<u64> {
        self.state.lock().submitted.clone()
    }

    fn check_account(&self, account: &AccountId) -> Result<(), LedgerError> {
        if account != &self.account {
            return Err(LedgerError::AccountNotFound {
                account: account.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerClient for PaperLedger {
    async fn load_account(&self, account: &AccountId) -> Result<AccountSnapshot, LedgerError> {
        self.check_account(account)?;
        let state = self.state.lock();
        Ok(AccountSnapshot::new(
            state.balances.clone(),
            state.subentry_count(),
        ))
    }

    async fn load_sequence(&self, account: &AccountId) -> Result<u64, LedgerError> {
        self.check_account(account)?;
        Ok(self.state.lock().sequence)
    }

    async fn load_orders(&self, account: &AccountId) -> Result<Vec<LiveOrder>, LedgerError> {
        self.check_account(account)?;
        Ok(self.orders())
    }

    async fn submit_transaction(&self, transaction: &Transaction) -> Result<TxHash, LedgerError> {
        self.check_account(&transaction.source)?;
        let mut state = self.state.lock();

        if transaction.sequence != state.sequence + 1 {
            warn!(
                expected = state.sequence + 1,
                got = transaction.sequence,
                "Paper ledger rejected stale sequence"
            );
            return Err(LedgerError::StaleSequence {
                sequence: transaction.sequence,
            });
        }
        state.sequence = transaction.sequence;
        state.submitted.push(transaction.sequence);

        // Operations apply atomically: either all of them or none.
        let mut staged = state.clone();
        for operation in &transaction.operations {
            staged.apply(operation)?;
        }
        *state = staged;

        debug!(
            sequence = transaction.sequence,
            operations = transaction.operations.len(),
            orders = state.orders.len(),
            "Paper transaction applied"
        );
        Ok(TxHash::new(format!(
            "paper-{}-{}",
            self.account, transaction.sequence
        )))
    }

    fn ledger_name(&self) -> &'static str {
        "paper"
    }
}
