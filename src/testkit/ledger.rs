//! Ledger wrapper injecting failures.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{AccountId, LiveOrder, TxHash};
use crate::error::LedgerError;
use crate::port::{AccountSnapshot, LedgerClient, Transaction};

/// Scripted response to one submission.
#[derive(Debug)]
enum Scripted {
    /// Forward to the inner ledger.
    Pass,
    /// Fail without reaching the inner ledger.
    Fail(LedgerError),
    /// Consume the sequence number on the inner ledger but apply nothing.
    Reject(String),
}

#[derive(Debug, Default)]
struct Script {
    submissions: VecDeque<Scripted>,
    load_failures: VecDeque<LedgerError>,
    attempted: Vec<u64>,
    sequence_loads: u64,
}

/// Forwards to an inner ledger unless a failure is queued.
///
/// Scripted submissions are consumed one per transaction, in order; an empty
/// script forwards. Queued load failures apply to the next `load_account` or
/// `load_orders`.
pub struct FlakyLedger {
    inner: Arc<dyn LedgerClient>,
    script: Mutex<Script>,
}

impl FlakyLedger {
    pub fn new(inner: Arc<dyn LedgerClient>) -> Self {
        Self {
            inner,
            script: Mutex::new(Script::default()),
        }
    }

    /// Fail the next scripted submission with `error`.
    pub fn fail_next(&self, error: LedgerError) {
        self.script.lock().submissions.push_back(Scripted::Fail(error));
    }

    /// Let the next scripted submission through.
    pub fn pass_next(&self) {
        self.script.lock().submissions.push_back(Scripted::Pass);
    }

    /// Reject the next scripted submission after it consumes its sequence
    /// number, as a transaction failing on the ledger does.
    pub fn reject_next(&self, reason: impl Into<String>) {
        self.script
            .lock()
            .submissions
            .push_back(Scripted::Reject(reason.into()));
    }

    /// Fail the next account or order load with `error`.
    pub fn fail_next_load(&self, error: LedgerError) {
        self.script.lock().load_failures.push_back(error);
    }

    /// Sequence numbers of every attempted submission, failed ones included.
    pub fn attempted_sequences(&self) -> Vec<u64> {
        self.script.lock().attempted.clone()
    }

    /// Number of sequence fetches that reached this ledger.
    pub fn sequence_loads(&self) -> u64 {
        self.script.lock().sequence_loads
    }

    fn next_load_failure(&self) -> Result<(), LedgerError> {
        match self.script.lock().load_failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LedgerClient for FlakyLedger {
    async fn load_account(&self, account: &AccountId) -> Result<AccountSnapshot, LedgerError> {
        self.next_load_failure()?;
        self.inner.load_account(account).await
    }

    async fn load_sequence(&self, account: &AccountId) -> Result<u64, LedgerError> {
        self.script.lock().sequence_loads += 1;
        self.inner.load_sequence(account).await
    }

    async fn load_orders(&self, account: &AccountId) -> Result<Vec<LiveOrder>, LedgerError> {
        self.next_load_failure()?;
        self.inner.load_orders(account).await
    }

    async fn submit_transaction(&self, transaction: &Transaction) -> Result<TxHash, LedgerError> {
        let scripted = {
            let mut script = self.script.lock();
            script.attempted.push(transaction.sequence);
            script.submissions.pop_front().unwrap_or(Scripted::Pass)
        };
        match scripted {
            Scripted::Pass => self.inner.submit_transaction(transaction).await,
            Scripted::Fail(error) => Err(error),
            Scripted::Reject(reason) => {
                let empty = Transaction {
                    operations: Vec::new(),
                    ..transaction.clone()
                };
                self.inner.submit_transaction(&empty).await?;
                Err(LedgerError::Rejected(reason))
            }
        }
    }

    fn ledger_name(&self) -> &'static str {
        "flaky"
    }
}
