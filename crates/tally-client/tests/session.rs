mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use common::{config, create_a_and_b, open, A, B};
use tally_client::{ClientConfig, ClientError, SessionRegistry};
use tally_engine::{
    Completion, Engine, EngineContext, EngineError, EngineResult, MemoryEngine,
};
use tally_protocol::{BatchCodec, ProtocolError, Reply};
use tally_types::{CreateAccount, CreateTransfer, Operation, ReplicaAddress};

/// Evaluates one command fewer than it was sent.
struct TruncatingEngine;

struct TruncatingContext;

impl Engine for TruncatingEngine {
    fn open(&self, _: u128, _: u128, _: &[ReplicaAddress]) -> EngineResult<Arc<dyn EngineContext>> {
        Ok(Arc::new(TruncatingContext))
    }
}

impl EngineContext for TruncatingContext {
    fn submit(&self, _: Operation, payload: Bytes, completion: Completion) -> EngineResult<()> {
        let len = BatchCodec::decode_batch(&payload)?.len();
        let reply = Reply::create_accounts(len - 1, &[]);
        completion(Ok(BatchCodec::encode_reply(&reply)?));
        Ok(())
    }

    fn drive(&self) -> EngineResult<()> {
        Ok(())
    }

    fn close(&self) {}

    fn is_closed(&self) -> bool {
        false
    }
}

/// Accepts submissions and never completes them.
#[derive(Default)]
struct StallingEngine {
    parked: Arc<Mutex<Vec<Completion>>>,
}

struct StallingContext {
    parked: Arc<Mutex<Vec<Completion>>>,
}

impl Engine for StallingEngine {
    fn open(&self, _: u128, _: u128, _: &[ReplicaAddress]) -> EngineResult<Arc<dyn EngineContext>> {
        Ok(Arc::new(StallingContext {
            parked: Arc::clone(&self.parked),
        }))
    }
}

impl EngineContext for StallingContext {
    fn submit(&self, _: Operation, _: Bytes, completion: Completion) -> EngineResult<()> {
        self.parked.lock().unwrap().push(completion);
        Ok(())
    }

    fn drive(&self) -> EngineResult<()> {
        Ok(())
    }

    fn close(&self) {
        self.parked.lock().unwrap().clear();
    }

    fn is_closed(&self) -> bool {
        false
    }
}

#[tokio::test]
async fn singleton_guard() {
    let engine = MemoryEngine::default();
    let registry = SessionRegistry::new();
    let first = registry.open(&engine, config()).unwrap();
    let same = first.config().clone();

    assert_eq!(
        registry.open(&engine, same.clone()).unwrap_err(),
        ClientError::AlreadyInitializedSameArgs
    );
    assert_eq!(
        registry.open(&engine, config()).unwrap_err(),
        ClientError::AlreadyInitializedDifferentArgs
    );
    assert_eq!(
        registry
            .open(
                &engine,
                ClientConfig {
                    tick_interval_ms: 9,
                    ..same.clone()
                },
            )
            .unwrap_err(),
        ClientError::AlreadyInitializedSameArgs
    );

    first.close();
    let second = registry.open(&engine, config()).unwrap();
    assert!(!second.is_closed());
}

#[tokio::test]
async fn registries_are_independent() {
    let engine = MemoryEngine::default();
    let (_one, a) = open(&engine);
    let (_two, b) = open(&engine);

    create_a_and_b(&a).await;
    let seen = b.lookup_accounts(&[A, B]).await.unwrap();
    assert!(seen.iter().all(|r| r.account().is_some()));
}

#[tokio::test]
async fn injected_fault_is_an_error_not_a_short_result() {
    let engine = MemoryEngine::default();
    let (_registry, client) = open(&engine);
    engine.fail_next_submissions(1);

    let err = client
        .create_accounts(&[CreateAccount::with_limits(A, 1, 100)])
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Engine(EngineError::Injected(_))));
    assert_eq!(engine.ledger().account_count().unwrap(), 0);

    create_a_and_b(&client).await;
}

#[tokio::test]
async fn truncated_reply_is_systemic() {
    let registry = SessionRegistry::new();
    let client = registry.open(&TruncatingEngine, config()).unwrap();

    let err = client
        .create_accounts(&[
            CreateAccount::with_limits(1, 1, 10),
            CreateAccount::with_limits(2, 1, 10),
        ])
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ClientError::Protocol(ProtocolError::Truncated {
            evaluated: 1,
            expected: 2
        })
    );
}

#[tokio::test]
async fn close_abandons_in_flight_batches() {
    let engine = StallingEngine::default();
    let registry = SessionRegistry::new();
    let client = Arc::new(registry.open(&engine, config()).unwrap());

    let pending = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.lookup_accounts(&[1]).await }
    });
    while engine.parked.lock().unwrap().is_empty() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    client.close();
    assert_eq!(pending.await.unwrap(), Err(ClientError::Closed));
    assert!(!registry.is_active());
}

#[tokio::test]
async fn dispatch_handler_sees_business_errors_as_success() {
    let engine = MemoryEngine::default();
    let (_registry, client) = open(&engine);
    create_a_and_b(&client).await;

    let (tx, rx) = tokio::sync::oneshot::channel();
    client
        .dispatch(
            Operation::CreateTransfers,
            tally_types::Batch::CreateTransfers(vec![
                CreateTransfer::new(1, A, A, 5),
                CreateTransfer::new(2, A, B, 0),
            ]),
            move |results| {
                let _ = tx.send(results);
            },
        )
        .unwrap();
    let results = rx.await.unwrap().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results.error_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_batches_each_complete_once() {
    let engine = MemoryEngine::default();
    let (_registry, client) = open(&engine);
    let client = Arc::new(client);

    let tasks: Vec<_> = (0..16u128)
        .map(|task| {
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                let batch: Vec<_> = (0..10u128)
                    .map(|i| CreateAccount::with_limits(task * 100 + i + 1, 1, 1_000))
                    .collect();
                client.create_accounts(&batch).await
            })
        })
        .collect();

    for task in tasks {
        let results = task.await.unwrap().unwrap();
        assert_eq!(results.len(), 10);
        assert!(results.iter().all(|r| r.is_ok()));
    }
    assert_eq!(engine.ledger().account_count().unwrap(), 160);
}
