use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tally_types::{
    condition_for, Account, AccountLookupResult, CommitTransfer, CommitTransferError,
    CommitTransferResult, CreateAccount, CreateAccountError, CreateAccountResult, CreateTransfer,
    CreateTransferError, CreateTransferResult,
};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::{LedgerConfig, ZeroTimeout};
use crate::error::{LedgerError, LedgerResult};
use crate::transfer::{TransferRecord, TransferState};

/// In-memory double-entry ledger.
///
/// Commands in a batch are applied in order, each all-or-nothing: a command
/// that reports an error leaves every balance untouched. Mutating calls
/// return only the failing commands, indexed by their position in the batch;
/// an index that does not appear succeeded.
pub struct Ledger {
    config: LedgerConfig,
    clock: Arc<dyn Clock>,
    inner: RwLock<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<u128, Account>,
    transfers: HashMap<u128, TransferRecord>,
    /// Pending transfers ordered by `(expires_at, id)`.
    expiry_queue: BTreeSet<(u64, u128)>,
    last_timestamp: u64,
}

impl LedgerState {
    /// Strictly increasing engine timestamp.
    fn tick(&mut self, now: u64) -> u64 {
        self.last_timestamp = now.max(self.last_timestamp.saturating_add(1));
        self.last_timestamp
    }

    fn expire_due(&mut self, now: u64) -> usize {
        let due: Vec<(u64, u128)> = self
            .expiry_queue
            .range(..=(now, u128::MAX))
            .copied()
            .collect();
        for key in &due {
            self.expiry_queue.remove(key);
            self.expire(key.1);
        }
        due.len()
    }

    fn expire(&mut self, id: u128) {
        let Some(record) = self.transfers.get_mut(&id) else {
            return;
        };
        if record.state != TransferState::Pending {
            return;
        }
        record.state = TransferState::Expired;
        let t = record.transfer;
        if let Some(dr) = self.accounts.get_mut(&t.debit_account_id) {
            dr.debit_reserved -= t.amount;
        }
        if let Some(cr) = self.accounts.get_mut(&t.credit_account_id) {
            cr.credit_reserved -= t.amount;
        }
        debug!(transfer = %id, amount = t.amount, "pending transfer expired");
    }

    fn create_account(&mut self, a: &CreateAccount, now: u64) -> Result<(), CreateAccountError> {
        a.check_reserved()?;
        a.check_limits()?;
        if let Some(existing) = self.accounts.get(&a.id) {
            return Err(a.compare_existing(existing));
        }
        let timestamp = self.tick(now);
        self.accounts.insert(a.id, a.into_account(timestamp));
        Ok(())
    }

    fn create_transfer(
        &mut self,
        t: &CreateTransfer,
        now: u64,
        zero_timeout: ZeroTimeout,
    ) -> Result<(), CreateTransferError> {
        t.check_reserved()?;
        t.check_shape()?;

        if let Some(existing) = self.transfers.get(&t.id) {
            if let Some(difference) = t.first_difference(&existing.transfer) {
                return Err(difference);
            }
            return Err(match existing.state {
                TransferState::Accepted => {
                    CreateTransferError::ExistsAndAlreadyCommittedAndAccepted
                }
                TransferState::Rejected => {
                    CreateTransferError::ExistsAndAlreadyCommittedAndRejected
                }
                TransferState::Pending | TransferState::Expired => CreateTransferError::Exists,
            });
        }

        let dr = self
            .accounts
            .get(&t.debit_account_id)
            .ok_or(CreateTransferError::DebitAccountNotFound)?;
        let cr = self
            .accounts
            .get(&t.credit_account_id)
            .ok_or(CreateTransferError::CreditAccountNotFound)?;
        if dr.unit != cr.unit {
            return Err(CreateTransferError::AccountsHaveDifferentUnits);
        }

        let auto_commit = t.flags.auto_commit();
        if auto_commit {
            if exceeds(dr.debit_accepted, t.amount, dr.debit_accepted_limit) {
                return Err(CreateTransferError::ExceedsDebitAcceptedLimit);
            }
            if exceeds(cr.credit_accepted, t.amount, cr.credit_accepted_limit) {
                return Err(CreateTransferError::ExceedsCreditAcceptedLimit);
            }
        } else {
            if exceeds(dr.debit_reserved, t.amount, dr.debit_reserved_limit) {
                return Err(CreateTransferError::ExceedsDebitReservedLimit);
            }
            if exceeds(cr.credit_reserved, t.amount, cr.credit_reserved_limit) {
                return Err(CreateTransferError::ExceedsCreditReservedLimit);
            }
        }

        let timestamp = self.tick(now);
        let (state, expires_at) = if auto_commit {
            (TransferState::Accepted, None)
        } else {
            let expires_at = match (t.timeout, zero_timeout) {
                (0, ZeroTimeout::NeverExpires) => None,
                (timeout, _) => Some(timestamp.saturating_add(timeout)),
            };
            (TransferState::Pending, expires_at)
        };

        if let Some(dr) = self.accounts.get_mut(&t.debit_account_id) {
            if auto_commit {
                dr.debit_accepted += t.amount;
            } else {
                dr.debit_reserved += t.amount;
            }
        }
        if let Some(cr) = self.accounts.get_mut(&t.credit_account_id) {
            if auto_commit {
                cr.credit_accepted += t.amount;
            } else {
                cr.credit_reserved += t.amount;
            }
        }
        if let Some(at) = expires_at {
            self.expiry_queue.insert((at, t.id));
        }

        self.transfers.insert(
            t.id,
            TransferRecord {
                transfer: CreateTransfer { timestamp, ..*t },
                state,
                expires_at,
            },
        );
        Ok(())
    }

    fn commit_transfer(&mut self, c: &CommitTransfer, now: u64) -> Result<(), CommitTransferError> {
        c.check_reserved()?;
        c.check_shape()?;

        let record = self
            .transfers
            .get(&c.id)
            .ok_or(CommitTransferError::TransferNotFound)?;

        if record.is_due(now) {
            if let Some(at) = record.expires_at {
                self.expiry_queue.remove(&(at, c.id));
            }
            self.expire(c.id);
            return Err(CommitTransferError::TransferExpired);
        }

        let accept = c.flags.accept();
        match record.state {
            TransferState::Pending => {}
            TransferState::Expired => return Err(CommitTransferError::TransferExpired),
            TransferState::Accepted if record.auto_committed() => {
                return Err(CommitTransferError::AlreadyAutoCommitted)
            }
            TransferState::Accepted if accept => return Err(CommitTransferError::AlreadyCommitted),
            TransferState::Accepted => return Err(CommitTransferError::AlreadyCommittedButAccepted),
            TransferState::Rejected if !accept => return Err(CommitTransferError::AlreadyCommitted),
            TransferState::Rejected => return Err(CommitTransferError::AlreadyCommittedButRejected),
        }

        match (record.transfer.condition(), c.preimage()) {
            (Some(_), None) => return Err(CommitTransferError::ConditionRequiresPreimage),
            (None, Some(_)) => return Err(CommitTransferError::PreimageRequiresCondition),
            (Some(condition), Some(preimage)) if condition_for(&preimage) != condition => {
                return Err(CommitTransferError::PreimageInvalid)
            }
            _ => {}
        }

        let t = record.transfer;
        let expires_at = record.expires_at;
        let dr = self
            .accounts
            .get(&t.debit_account_id)
            .ok_or(CommitTransferError::DebitAccountNotFound)?;
        let cr = self
            .accounts
            .get(&t.credit_account_id)
            .ok_or(CommitTransferError::CreditAccountNotFound)?;
        if dr.debit_reserved < t.amount {
            return Err(CommitTransferError::DebitAmountWasNotReserved);
        }
        if cr.credit_reserved < t.amount {
            return Err(CommitTransferError::CreditAmountWasNotReserved);
        }
        if accept {
            if exceeds(dr.debit_accepted, t.amount, dr.debit_accepted_limit) {
                return Err(CommitTransferError::ExceedsDebitAcceptedLimit);
            }
            if exceeds(cr.credit_accepted, t.amount, cr.credit_accepted_limit) {
                return Err(CommitTransferError::ExceedsCreditAcceptedLimit);
            }
        }

        self.tick(now);
        if let Some(dr) = self.accounts.get_mut(&t.debit_account_id) {
            dr.debit_reserved -= t.amount;
            if accept {
                dr.debit_accepted += t.amount;
            }
        }
        if let Some(cr) = self.accounts.get_mut(&t.credit_account_id) {
            cr.credit_reserved -= t.amount;
            if accept {
                cr.credit_accepted += t.amount;
            }
        }
        if let Some(at) = expires_at {
            self.expiry_queue.remove(&(at, c.id));
        }
        if let Some(record) = self.transfers.get_mut(&c.id) {
            record.state = if accept {
                TransferState::Accepted
            } else {
                TransferState::Rejected
            };
        }
        Ok(())
    }
}

/// `balance + amount > limit`, with overflow counting as exceeding.
fn exceeds(balance: u64, amount: u64, limit: u64) -> bool {
    balance.checked_add(amount).map_or(true, |total| total > limit)
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            inner: RwLock::new(LedgerState::default()),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.inner.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.inner.write().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Expire every pending transfer whose timeout has elapsed, releasing its
    /// reservation. Returns how many transfers expired.
    pub fn expire_pending(&self) -> LedgerResult<usize> {
        let now = self.clock.now_nanos();
        let mut state = self.write()?;
        Ok(state.expire_due(now))
    }

    pub fn create_accounts(
        &self,
        batch: &[CreateAccount],
    ) -> LedgerResult<Vec<CreateAccountResult>> {
        if batch.is_empty() {
            return Err(LedgerError::EmptyBatch);
        }
        let now = self.clock.now_nanos();
        let mut state = self.write()?;
        let errors: Vec<_> = batch
            .iter()
            .enumerate()
            .filter_map(|(index, a)| {
                state
                    .create_account(a, now)
                    .err()
                    .map(|e| CreateAccountResult::err(index as u32, e))
            })
            .collect();
        debug!(count = batch.len(), errors = errors.len(), "applied create_accounts");
        Ok(errors)
    }

    pub fn create_transfers(
        &self,
        batch: &[CreateTransfer],
    ) -> LedgerResult<Vec<CreateTransferResult>> {
        if batch.is_empty() {
            return Err(LedgerError::EmptyBatch);
        }
        let now = self.clock.now_nanos();
        let zero_timeout = self.config.zero_timeout;
        let mut state = self.write()?;
        state.expire_due(now);
        let errors: Vec<_> = batch
            .iter()
            .enumerate()
            .filter_map(|(index, t)| {
                state
                    .create_transfer(t, now, zero_timeout)
                    .err()
                    .map(|e| CreateTransferResult::err(index as u32, e))
            })
            .collect();
        debug!(count = batch.len(), errors = errors.len(), "applied create_transfers");
        Ok(errors)
    }

    pub fn commit_transfers(
        &self,
        batch: &[CommitTransfer],
    ) -> LedgerResult<Vec<CommitTransferResult>> {
        if batch.is_empty() {
            return Err(LedgerError::EmptyBatch);
        }
        let now = self.clock.now_nanos();
        let mut state = self.write()?;
        state.expire_due(now);
        let errors: Vec<_> = batch
            .iter()
            .enumerate()
            .filter_map(|(index, c)| {
                state
                    .commit_transfer(c, now)
                    .err()
                    .map(|e| CommitTransferResult::err(index as u32, e))
            })
            .collect();
        debug!(count = batch.len(), errors = errors.len(), "applied commit_transfers");
        Ok(errors)
    }

    /// One entry per id, in order.
    pub fn lookup_accounts(&self, ids: &[u128]) -> LedgerResult<Vec<AccountLookupResult>> {
        if ids.is_empty() {
            return Err(LedgerError::EmptyBatch);
        }
        let state = self.read()?;
        Ok(ids
            .iter()
            .enumerate()
            .map(|(index, id)| match state.accounts.get(id) {
                Some(account) => AccountLookupResult::Found(*account),
                None => AccountLookupResult::not_found(index as u32),
            })
            .collect())
    }

    pub fn account(&self, id: u128) -> LedgerResult<Option<Account>> {
        Ok(self.read()?.accounts.get(&id).copied())
    }

    pub fn transfer(&self, id: u128) -> LedgerResult<Option<TransferRecord>> {
        Ok(self.read()?.transfers.get(&id).cloned())
    }

    pub fn account_count(&self) -> LedgerResult<usize> {
        Ok(self.read()?.accounts.len())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}
