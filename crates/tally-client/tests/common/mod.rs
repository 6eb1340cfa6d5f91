#![allow(dead_code)]

use tally_client::{Client, ClientConfig, SessionRegistry};
use tally_engine::MemoryEngine;
use tally_types::{Account, AccountLookupResult, CreateAccount, ReplicaAddress};

pub const A: u128 = 0xA;
pub const B: u128 = 0xB;

pub fn config() -> ClientConfig {
    ClientConfig {
        tick_interval_ms: 1,
        ..ClientConfig::new(0, vec![ReplicaAddress::Port(3001)])
    }
}

/// A fresh registry and a session on `engine`.
pub fn open(engine: &MemoryEngine) -> (SessionRegistry, Client) {
    let registry = SessionRegistry::new();
    let client = registry.open(engine, config()).unwrap();
    (registry, client)
}

/// Accounts A and B with unit 1 and every limit at 100.
pub async fn create_a_and_b(client: &Client) {
    let results = client
        .create_accounts(&[
            CreateAccount::with_limits(A, 1, 100),
            CreateAccount::with_limits(B, 1, 100),
        ])
        .await
        .unwrap();
    assert!(results.iter().all(|r| r.is_ok()), "{results:?}");
}

pub async fn account(client: &Client, id: u128) -> Account {
    match client.lookup_accounts(&[id]).await.unwrap().pop() {
        Some(AccountLookupResult::Found(account)) => account,
        other => panic!("account {id:#x} not found: {other:?}"),
    }
}
