use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use tally_engine::{EngineContext, EngineError, EngineResult};
use tally_protocol::BatchCodec;
use tally_types::{
    AccountLookupResult, Batch, CommitTransfer, CommitTransferResult, CreateAccount,
    CreateAccountResult, CreateTransfer, CreateTransferResult, Operation, Results,
};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::registry::SessionRegistry;

/// An open session with a cluster.
///
/// Obtained from [`SessionRegistry::open`]. Many batches may be in flight at
/// once; each gets exactly one outcome. Dropping the client closes it.
pub struct Client {
    config: ClientConfig,
    context: Arc<dyn EngineContext>,
    registry: SessionRegistry,
    session: u64,
    closed: AtomicBool,
    cadence: Mutex<Option<Cadence>>,
}

/// The background task driving the engine forward.
struct Cadence {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Client {
    pub(crate) fn start(
        registry: SessionRegistry,
        session: u64,
        config: ClientConfig,
        context: Arc<dyn EngineContext>,
        runtime: &Handle,
    ) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let period = config.tick_interval();
        let driven = Arc::clone(&context);

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => match driven.drive() {
                        Ok(()) => {}
                        Err(EngineError::Closed) => break,
                        Err(err) => debug!(error = %err, "tick failed"),
                    },
                }
            }
            debug!(session, "cadence stopped");
        });

        Self {
            config,
            context,
            registry,
            session,
            closed: AtomicBool::new(false),
            cadence: Mutex::new(Some(Cadence { stop_tx, task })),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn client_id(&self) -> u128 {
        self.config.client_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Whether the background cadence is still running.
    pub fn is_driving(&self) -> bool {
        self.cadence
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|c| !c.task.is_finished())
    }

    /// Submit `batch` as `operation` and hand its outcome to `handler`.
    ///
    /// Problems found before submission (closed session, empty batch, a
    /// batch of another kind than `operation`, an oversized batch) are
    /// returned here and `handler` is never called. Otherwise `handler` is
    /// called exactly once, with results aligned to the batch or with a
    /// systemic error. If the session closes first, `handler` is dropped
    /// without being called.
    pub fn dispatch<F>(&self, operation: Operation, batch: Batch, handler: F) -> ClientResult<()>
    where
        F: FnOnce(ClientResult<Results>) + Send + 'static,
    {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        if batch.is_empty() {
            return Err(ClientError::EmptyBatch);
        }
        if batch.operation() != operation {
            return Err(ClientError::OperationMismatch {
                expected: operation,
                actual: batch.operation(),
            });
        }

        let len = batch.len();
        let payload = BatchCodec::encode_batch(&batch)?;
        let completion = Box::new(move |outcome: EngineResult<Bytes>| {
            let results = outcome.map_err(ClientError::from).and_then(|reply| {
                BatchCodec::decode_reply(operation, len, &reply).map_err(ClientError::from)
            });
            match &results {
                Ok(r) => debug!(%operation, len, errors = r.error_count(), "batch completed"),
                Err(err) => debug!(%operation, len, error = %err, "batch failed"),
            }
            handler(results);
        });

        self.context
            .submit(operation, payload, completion)
            .map_err(|err| match err {
                EngineError::Closed => ClientError::Closed,
                other => other.into(),
            })?;
        debug!(%operation, len, "batch submitted");
        Ok(())
    }

    /// Dispatch and wait for the outcome.
    pub async fn submit(&self, batch: Batch) -> ClientResult<Results> {
        let operation = batch.operation();
        let (tx, rx) = oneshot::channel();
        self.dispatch(operation, batch, move |results| {
            let _ = tx.send(results);
        })?;
        rx.await.unwrap_or_else(|_| {
            warn!(%operation, "session closed before the batch completed");
            Err(ClientError::Closed)
        })
    }

    pub async fn create_accounts(
        &self,
        accounts: &[CreateAccount],
    ) -> ClientResult<Vec<CreateAccountResult>> {
        match self.submit(Batch::CreateAccounts(accounts.to_vec())).await? {
            Results::CreateAccounts(results) => Ok(results),
            other => Err(mismatch(Operation::CreateAccounts, &other)),
        }
    }

    pub async fn create_transfers(
        &self,
        transfers: &[CreateTransfer],
    ) -> ClientResult<Vec<CreateTransferResult>> {
        match self.submit(Batch::CreateTransfers(transfers.to_vec())).await? {
            Results::CreateTransfers(results) => Ok(results),
            other => Err(mismatch(Operation::CreateTransfers, &other)),
        }
    }

    pub async fn commit_transfers(
        &self,
        commits: &[CommitTransfer],
    ) -> ClientResult<Vec<CommitTransferResult>> {
        match self.submit(Batch::CommitTransfers(commits.to_vec())).await? {
            Results::CommitTransfers(results) => Ok(results),
            other => Err(mismatch(Operation::CommitTransfers, &other)),
        }
    }

    pub async fn lookup_accounts(&self, ids: &[u128]) -> ClientResult<Vec<AccountLookupResult>> {
        match self.submit(Batch::LookupAccounts(ids.to_vec())).await? {
            Results::LookupAccounts(results) => Ok(results),
            other => Err(mismatch(Operation::LookupAccounts, &other)),
        }
    }

    /// Stop the cadence, release the engine context and free the registry
    /// slot. Batches still in flight are abandoned. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(cadence) = self
            .cadence
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            let _ = cadence.stop_tx.send(());
        }
        self.context.close();
        self.registry.release(self.session);
        info!(
            session = self.session,
            client = %format_args!("{:#x}", self.config.client_id),
            "session closed"
        );
    }
}

fn mismatch(expected: Operation, results: &Results) -> ClientError {
    ClientError::OperationMismatch {
        expected,
        actual: results.operation(),
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("session", &self.session)
            .field("client_id", &format_args!("{:#x}", self.config.client_id))
            .field("cluster_id", &format_args!("{:#x}", self.config.cluster_id))
            .field("closed", &self.is_closed())
            .finish()
    }
}
