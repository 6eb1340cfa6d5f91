use tally_types::CreateTransfer;

/// Where a transfer is in its two-phase lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransferState {
    /// Amount is held in the reserved sub-balances.
    Pending,
    /// Settled, by a commit or by auto-commit.
    Accepted,
    /// Released by a rejecting commit.
    Rejected,
    /// Released because its timeout elapsed while pending.
    Expired,
}

impl TransferState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A stored transfer and its lifecycle state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRecord {
    /// The command as applied, with the engine timestamp filled in.
    pub transfer: CreateTransfer,
    pub state: TransferState,
    /// Absolute expiry time; `None` when the transfer cannot expire.
    pub expires_at: Option<u64>,
}

impl TransferRecord {
    pub fn auto_committed(&self) -> bool {
        self.transfer.flags.auto_commit()
    }

    pub fn is_due(&self, now: u64) -> bool {
        self.state == TransferState::Pending && self.expires_at.is_some_and(|at| at <= now)
    }
}
