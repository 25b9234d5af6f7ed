//! Ownership of the account's transaction sequence number.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{AccountId, Mutation, TxHash};
use crate::error::LedgerError;
use crate::port::{LedgerClient, Transaction};

/// Sequence counter state.
///
/// Starts out needing a reload; the first submission fetches the value from
/// the ledger. A stale-sequence rejection puts it back into the reload state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceState {
    /// Last sequence number consumed by the account.
    pub value: u64,
    pub needs_reload: bool,
}

impl Default for SequenceState {
    fn default() -> Self {
        Self {
            value: 0,
            needs_reload: true,
        }
    }
}

/// Signs off transactions with a fresh sequence number, one at a time.
///
/// The state lock is held across the submission so that incrementing and
/// submitting are a single critical section.
pub struct SequenceManager {
    ledger: Arc<dyn LedgerClient>,
    account: AccountId,
    state: Mutex<SequenceState>,
    fetches: AtomicU64,
}

impl SequenceManager {
    pub fn new(ledger: Arc<dyn LedgerClient>, account: AccountId) -> Self {
        Self {
            ledger,
            account,
            state: Mutex::new(SequenceState::default()),
            fetches: AtomicU64::new(0),
        }
    }

    /// Submit operations as one transaction under the next sequence number.
    ///
    /// A sequence number is consumed even when the submission fails, so a
    /// rejected value is never handed out again. On a stale-sequence
    /// rejection the transaction is dropped and the next submission reloads
    /// the counter from the ledger.
    pub async fn submit(&self, operations: Vec<Mutation>) -> Result<TxHash, LedgerError> {
        let mut state = self.state.lock().await;

        if state.needs_reload {
            let value = self.ledger.load_sequence(&self.account).await?;
            self.fetches.fetch_add(1, Ordering::Relaxed);
            info!(account = %self.account, sequence = value, "Sequence number loaded");
            *state = SequenceState {
                value,
                needs_reload: false,
            };
        }

        let sequence = state.value + 1;
        state.value = sequence;
        let transaction = Transaction {
            source: self.account.clone(),
            sequence,
            operations,
        };

        match self.ledger.submit_transaction(&transaction).await {
            Ok(hash) => {
                debug!(
                    sequence,
                    operations = transaction.operations.len(),
                    hash = %hash,
                    "Transaction submitted"
                );
                Ok(hash)
            }
            Err(e) => {
                if e.is_stale_sequence() {
                    warn!(sequence, "Stale sequence number, reloading before next submission");
                    state.needs_reload = true;
                }
                Err(e)
            }
        }
    }

    /// Snapshot of the counter.
    pub async fn state(&self) -> SequenceState {
        *self.state.lock().await
    }

    /// Number of times the sequence was fetched from the ledger.
    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}
