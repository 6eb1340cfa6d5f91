use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use tally_ledger::{Clock, Ledger};
use tally_protocol::{BatchCodec, ProtocolError, Reply};
use tally_types::{address, Batch, Operation, ReplicaAddress};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::traits::{Completion, Engine, EngineContext};

/// In-process loopback cluster.
///
/// Every session opened on one `MemoryEngine` shares the same [`Ledger`], so a
/// session opened after another one closed sees the state it left behind.
/// Submissions are applied in the order they were queued.
pub struct MemoryEngine {
    config: EngineConfig,
    ledger: Arc<Ledger>,
    faults: Arc<AtomicUsize>,
}

impl MemoryEngine {
    pub fn new(config: EngineConfig) -> Self {
        let ledger = Arc::new(Ledger::new(config.ledger_config()));
        Self::with_ledger(config, ledger)
    }

    /// Use a ledger with its own clock, so tests can move time by hand.
    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let ledger = Arc::new(Ledger::with_clock(config.ledger_config(), clock));
        Self::with_ledger(config, ledger)
    }

    pub fn with_ledger(config: EngineConfig, ledger: Arc<Ledger>) -> Self {
        Self {
            config,
            ledger,
            faults: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Fail the next `n` submissions with a systemic error instead of
    /// applying them.
    pub fn fail_next_submissions(&self, n: usize) {
        self.faults.store(n, Ordering::SeqCst);
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine for MemoryEngine {
    fn open(
        &self,
        client_id: u128,
        cluster_id: u128,
        addresses: &[ReplicaAddress],
    ) -> EngineResult<Arc<dyn EngineContext>> {
        if addresses.is_empty() {
            return Err(EngineError::InvalidAddress("no replica addresses".into()));
        }
        for addr in addresses {
            addr.resolve()?;
        }
        if cluster_id != self.config.cluster_id {
            return Err(EngineError::ClusterMismatch {
                expected: self.config.cluster_id,
                actual: cluster_id,
            });
        }
        info!(
            client = %format_args!("{client_id:#x}"),
            cluster = %format_args!("{cluster_id:#x}"),
            replicas = %address::join(addresses),
            "loopback session opened"
        );
        Ok(Arc::new(MemoryContext {
            client_id,
            ledger: Arc::clone(&self.ledger),
            faults: Arc::clone(&self.faults),
            queue: Mutex::new(VecDeque::new()),
            closed: AtomicBool::new(false),
        }))
    }
}

struct Submission {
    operation: Operation,
    payload: Bytes,
    completion: Completion,
}

struct MemoryContext {
    client_id: u128,
    ledger: Arc<Ledger>,
    faults: Arc<AtomicUsize>,
    queue: Mutex<VecDeque<Submission>>,
    closed: AtomicBool,
}

impl MemoryContext {
    fn take_fault(&self) -> bool {
        self.faults
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn apply(&self, operation: Operation, payload: &[u8]) -> EngineResult<Bytes> {
        let batch = BatchCodec::decode_batch(payload)?;
        if batch.operation() != operation {
            return Err(ProtocolError::OperationMismatch {
                expected: operation,
                actual: batch.operation(),
            }
            .into());
        }
        let reply = match &batch {
            Batch::CreateAccounts(accounts) => {
                Reply::create_accounts(accounts.len(), &self.ledger.create_accounts(accounts)?)
            }
            Batch::CreateTransfers(transfers) => Reply::create_transfers(
                transfers.len(),
                &self.ledger.create_transfers(transfers)?,
            ),
            Batch::CommitTransfers(commits) => {
                Reply::commit_transfers(commits.len(), &self.ledger.commit_transfers(commits)?)
            }
            Batch::LookupAccounts(ids) => Reply::LookupAccounts(self.ledger.lookup_accounts(ids)?),
        };
        Ok(BatchCodec::encode_reply(&reply)?)
    }
}

impl EngineContext for MemoryContext {
    fn submit(
        &self,
        operation: Operation,
        payload: Bytes,
        completion: Completion,
    ) -> EngineResult<()> {
        if self.is_closed() {
            return Err(EngineError::Closed);
        }
        let mut queue = self.queue.lock().map_err(|_| EngineError::LockPoisoned)?;
        queue.push_back(Submission {
            operation,
            payload,
            completion,
        });
        debug!(%operation, queued = queue.len(), "batch queued");
        Ok(())
    }

    fn drive(&self) -> EngineResult<()> {
        if self.is_closed() {
            return Err(EngineError::Closed);
        }
        let expired = self.ledger.expire_pending()?;
        if expired > 0 {
            debug!(expired, "pending transfers expired");
        }
        let pending = std::mem::take(
            &mut *self.queue.lock().map_err(|_| EngineError::LockPoisoned)?,
        );

        for Submission {
            operation,
            payload,
            completion,
        } in pending
        {
            if self.is_closed() {
                warn!(%operation, "context closed mid-drive, dropping completion");
                continue;
            }
            let outcome = if self.take_fault() {
                warn!(%operation, "injected engine fault");
                Err(EngineError::Injected(format!("{operation} submission failed")))
            } else {
                self.apply(operation, &payload)
            };
            if let Err(err) = &outcome {
                warn!(%operation, error = %err, "batch failed");
            }
            completion(outcome);
        }
        Ok(())
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let dropped = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .count();
        info!(
            client = %format_args!("{:#x}", self.client_id),
            dropped,
            "loopback session closed"
        );
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
