mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{account, create_a_and_b, open, A, B};
use tally_engine::{EngineConfig, MemoryEngine};
use tally_ledger::ManualClock;
use tally_types::{
    condition_for, AccountFlags, AccountLookupError, AccountLookupResult, CommitTransfer,
    CommitTransferError, CreateAccount, CreateAccountError, CreateTransfer, CreateTransferError,
};

#[tokio::test]
async fn two_account_scenario() {
    let engine = MemoryEngine::default();
    let (_registry, client) = open(&engine);
    create_a_and_b(&client).await;

    let results = client
        .create_transfers(&[CreateTransfer::new(1, A, B, 50)])
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_ok());
    assert_eq!(account(&client, A).await.debit_reserved, 50);
    assert_eq!(account(&client, B).await.credit_reserved, 50);

    let results = client.commit_transfers(&[CommitTransfer::accept(1)]).await.unwrap();
    assert!(results[0].is_ok());
    let a = account(&client, A).await;
    let b = account(&client, B).await;
    assert_eq!((a.debit_reserved, a.debit_accepted), (0, 50));
    assert_eq!((b.credit_reserved, b.credit_accepted), (0, 50));
}

#[tokio::test]
async fn reject_releases_without_accepting() {
    let engine = MemoryEngine::default();
    let (_registry, client) = open(&engine);
    create_a_and_b(&client).await;

    client.create_transfers(&[CreateTransfer::new(1, A, B, 30)]).await.unwrap();
    let results = client.commit_transfers(&[CommitTransfer::reject(1)]).await.unwrap();
    assert!(results[0].is_ok());

    let a = account(&client, A).await;
    let b = account(&client, B).await;
    assert_eq!((a.debit_reserved, a.debit_accepted), (0, 0));
    assert_eq!((b.credit_reserved, b.credit_accepted), (0, 0));

    let again = client.commit_transfers(&[CommitTransfer::accept(1)]).await.unwrap();
    assert_eq!(again[0].error, Some(CommitTransferError::AlreadyCommittedButRejected));
}

#[tokio::test]
async fn identical_account_reports_exists() {
    let engine = MemoryEngine::default();
    let (_registry, client) = open(&engine);
    create_a_and_b(&client).await;

    let results = client
        .create_accounts(&[CreateAccount::with_limits(A, 1, 100)])
        .await
        .unwrap();
    assert_eq!(results[0].error, Some(CreateAccountError::Exists));
    assert_eq!(engine.ledger().account_count().unwrap(), 2);
}

#[tokio::test]
async fn changed_account_field_reports_specific_difference() {
    let engine = MemoryEngine::default();
    let (_registry, client) = open(&engine);
    create_a_and_b(&client).await;

    let base = CreateAccount::with_limits(A, 1, 100);
    let variants = [
        CreateAccount { unit: 2, ..base },
        CreateAccount {
            debit_reserved_limit: 90,
            ..base
        },
        CreateAccount { custom: 7, ..base },
        CreateAccount {
            flags: AccountFlags::from_bits(1),
            ..base
        },
    ];
    let results = client.create_accounts(&variants).await.unwrap();
    let errors: Vec<_> = results.iter().map(|r| r.error).collect();
    assert_eq!(
        errors,
        vec![
            Some(CreateAccountError::ExistsWithDifferentUnit),
            Some(CreateAccountError::ExistsWithDifferentLimits),
            Some(CreateAccountError::ExistsWithDifferentCustomField),
            Some(CreateAccountError::ExistsWithDifferentFlags),
        ]
    );
    for (index, result) in results.iter().enumerate() {
        assert_eq!(result.index as usize, index);
    }
}

#[tokio::test]
async fn changed_transfer_field_reports_specific_difference() {
    let engine = MemoryEngine::default();
    let (_registry, client) = open(&engine);
    create_a_and_b(&client).await;

    let base = CreateTransfer::new(1, A, B, 10);
    client.create_transfers(&[base]).await.unwrap();

    let results = client
        .create_transfers(&[
            base,
            CreateTransfer {
                credit_account_id: A,
                debit_account_id: B,
                ..base
            },
            CreateTransfer { amount: 11, ..base },
            CreateTransfer {
                custom_1: 1,
                ..base
            },
            CreateTransfer { timeout: 5, ..base },
        ])
        .await
        .unwrap();
    let errors: Vec<_> = results.iter().map(|r| r.error).collect();
    assert_eq!(
        errors,
        vec![
            Some(CreateTransferError::Exists),
            Some(CreateTransferError::ExistsWithDifferentDebitAccountId),
            Some(CreateTransferError::ExistsWithDifferentAmount),
            Some(CreateTransferError::ExistsWithDifferentCustomFields),
            Some(CreateTransferError::ExistsWithDifferentTimeout),
        ]
    );
    assert_eq!(account(&client, A).await.debit_reserved, 10);
}

#[tokio::test]
async fn limit_breach_changes_nothing() {
    let engine = MemoryEngine::default();
    let (_registry, client) = open(&engine);
    create_a_and_b(&client).await;

    let results = client
        .create_transfers(&[CreateTransfer::new(1, A, B, 101)])
        .await
        .unwrap();
    assert_eq!(results[0].error, Some(CreateTransferError::ExceedsDebitReservedLimit));

    let a = account(&client, A).await;
    let b = account(&client, B).await;
    assert_eq!(a.debit_reserved, 0);
    assert_eq!(b.credit_reserved, 0);
    assert!(engine.ledger().transfer(1).unwrap().is_none());
}

#[tokio::test]
async fn mixed_batch_keeps_per_index_outcomes() {
    let engine = MemoryEngine::default();
    let (_registry, client) = open(&engine);
    create_a_and_b(&client).await;

    let results = client
        .create_transfers(&[
            CreateTransfer::new(1, A, B, 60),
            CreateTransfer::new(2, A, B, 60),
            CreateTransfer::new(3, A, B, 40),
        ])
        .await
        .unwrap();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert_eq!(results[1].error, Some(CreateTransferError::ExceedsDebitReservedLimit));
    assert!(results[2].is_ok());
    assert_eq!(account(&client, A).await.debit_reserved, 100);
}

#[tokio::test]
async fn same_account_transfer_is_refused() {
    let engine = MemoryEngine::default();
    let (_registry, client) = open(&engine);
    create_a_and_b(&client).await;

    let results = client
        .create_transfers(&[CreateTransfer::new(1, A, A, 10)])
        .await
        .unwrap();
    assert_eq!(results[0].error, Some(CreateTransferError::AccountsAreTheSame));
    let a = account(&client, A).await;
    assert_eq!((a.debit_reserved, a.credit_reserved), (0, 0));
}

#[tokio::test]
async fn lookup_reports_missing_by_index() {
    let engine = MemoryEngine::default();
    let (_registry, client) = open(&engine);
    create_a_and_b(&client).await;
    client
        .create_transfers(&[CreateTransfer::new(1, A, B, 20).auto_committed()])
        .await
        .unwrap();

    let results = client.lookup_accounts(&[0xDEAD, A]).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(
        results[0],
        AccountLookupResult::Missing {
            index: 0,
            error: AccountLookupError::NotFound
        }
    );
    let a = results[1].account().unwrap();
    assert_eq!(a.id, A);
    assert_eq!(a.unit, 1);
    assert_eq!(a.debit_accepted, 20);
    assert_ne!(a.timestamp, 0);
}

#[tokio::test]
async fn hash_locked_transfer_needs_the_preimage() {
    let engine = MemoryEngine::default();
    let (_registry, client) = open(&engine);
    create_a_and_b(&client).await;

    let preimage = [7u8; 32];
    let transfer = CreateTransfer::new(1, A, B, 25).with_condition(&condition_for(&preimage));
    assert!(client.create_transfers(&[transfer]).await.unwrap()[0].is_ok());

    let results = client
        .commit_transfers(&[
            CommitTransfer::accept(1),
            CommitTransfer::accept(1).with_preimage(&[8u8; 32]),
        ])
        .await
        .unwrap();
    assert_eq!(results[0].error, Some(CommitTransferError::ConditionRequiresPreimage));
    assert_eq!(results[1].error, Some(CommitTransferError::PreimageInvalid));

    let results = client
        .commit_transfers(&[CommitTransfer::accept(1).with_preimage(&preimage)])
        .await
        .unwrap();
    assert!(results[0].is_ok());
    assert_eq!(account(&client, B).await.credit_accepted, 25);
}

#[tokio::test]
async fn expired_transfer_releases_its_reservation() {
    let clock = Arc::new(ManualClock::new(1_000_000));
    let engine = MemoryEngine::with_clock(EngineConfig::default(), clock.clone());
    let (_registry, client) = open(&engine);
    create_a_and_b(&client).await;

    let transfer = CreateTransfer {
        timeout: 1_000,
        ..CreateTransfer::new(1, A, B, 40)
    };
    client.create_transfers(&[transfer]).await.unwrap();
    assert_eq!(account(&client, A).await.debit_reserved, 40);

    clock.advance(10_000);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(engine.ledger().account(A).unwrap().unwrap().debit_reserved, 0);

    let results = client.commit_transfers(&[CommitTransfer::accept(1)]).await.unwrap();
    assert_eq!(results[0].error, Some(CommitTransferError::TransferExpired));
    let b = account(&client, B).await;
    assert_eq!((b.credit_reserved, b.credit_accepted), (0, 0));
}

#[tokio::test]
async fn commit_of_unknown_transfer() {
    let engine = MemoryEngine::default();
    let (_registry, client) = open(&engine);
    let results = client.commit_transfers(&[CommitTransfer::accept(42)]).await.unwrap();
    assert_eq!(results[0].error, Some(CommitTransferError::TransferNotFound));
}
