//! Batches mutations into transactions and submits them in order.

use std::sync::Arc;

use tracing::{debug, info};

use super::SequenceManager;
use crate::domain::{Mutation, TxHash};
use crate::error::LedgerError;

/// Default maximum number of operations per transaction.
pub const DEFAULT_MAX_OPS_PER_TX: usize = 100;

/// Submits mutation lists through the [`SequenceManager`].
pub struct Submitter {
    sequence: Arc<SequenceManager>,
    max_ops_per_tx: usize,
    dry_run: bool,
}

impl Submitter {
    pub fn new(sequence: Arc<SequenceManager>) -> Self {
        Self {
            sequence,
            max_ops_per_tx: DEFAULT_MAX_OPS_PER_TX,
            dry_run: false,
        }
    }

    /// Cap operations per transaction. Zero is treated as one.
    pub fn with_max_ops_per_tx(mut self, max_ops_per_tx: usize) -> Self {
        self.max_ops_per_tx = max_ops_per_tx.max(1);
        self
    }

    /// Log mutations instead of submitting them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Submit mutations in their given order, one transaction per batch.
    ///
    /// The first failing batch aborts the remaining ones.
    pub async fn submit(&self, mutations: &[Mutation]) -> Result<Vec<TxHash>, LedgerError> {
        if mutations.is_empty() {
            return Ok(Vec::new());
        }

        if self.dry_run {
            for mutation in mutations {
                info!(%mutation, "Dry run, not submitting");
            }
            return Ok(Vec::new());
        }

        let mut hashes = Vec::new();
        for (batch, chunk) in mutations.chunks(self.max_ops_per_tx).enumerate() {
            debug!(batch, operations = chunk.len(), "Submitting batch");
            hashes.push(self.sequence.submit(chunk.to_vec()).await?);
        }
        Ok(hashes)
    }
}
