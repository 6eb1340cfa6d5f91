//! Bit-set flags carried by accounts, transfers and commits.
//!
//! Each flag word is 64 bits wide. Bits without a defined meaning are padding
//! and must be zero; a non-zero padding bit is reported as a
//! `reserved_flag_padding` error before any business rule is evaluated.

use serde::{Deserialize, Serialize};

macro_rules! flag_word {
    ($(#[$meta:meta])* $name:ident, defined = $defined:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Mask of every bit with a defined meaning.
            pub const DEFINED: u64 = $defined;

            pub const fn empty() -> Self {
                Self(0)
            }

            pub const fn from_bits(bits: u64) -> Self {
                Self(bits)
            }

            pub const fn bits(self) -> u64 {
                self.0
            }

            pub const fn contains(self, flag: u64) -> bool {
                self.0 & flag == flag
            }

            pub const fn with(self, flag: u64) -> Self {
                Self(self.0 | flag)
            }

            /// Bits set outside [`Self::DEFINED`].
            pub const fn padding(self) -> u64 {
                self.0 & !Self::DEFINED
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({:#x})", stringify!($name), self.0)
            }
        }
    };
}

flag_word!(
    /// Account flags. The low 16 bits belong to the application: they are
    /// stored verbatim and compared when an account is re-created.
    AccountFlags,
    defined = AccountFlags::USER_MASK
);

impl AccountFlags {
    pub const USER_MASK: u64 = 0xFFFF;

    /// The application-defined bits.
    pub const fn user(self) -> u16 {
        (self.0 & Self::USER_MASK) as u16
    }
}

flag_word!(
    /// Transfer flags.
    TransferFlags,
    defined = TransferFlags::ACCEPT
        | TransferFlags::REJECT
        | TransferFlags::AUTO_COMMIT
        | TransferFlags::CONDITION
);

impl TransferFlags {
    /// Only meaningful together with [`Self::AUTO_COMMIT`].
    pub const ACCEPT: u64 = 1 << 0;
    /// Never valid on a transfer; kept for symmetry with [`CommitFlags`].
    pub const REJECT: u64 = 1 << 1;
    /// Settle at creation, skipping the separate commit.
    pub const AUTO_COMMIT: u64 = 1 << 2;
    /// `custom_2 ‖ custom_3` carry a hash condition.
    pub const CONDITION: u64 = 1 << 3;

    pub const fn auto_commit(self) -> bool {
        self.contains(Self::AUTO_COMMIT)
    }

    pub const fn condition(self) -> bool {
        self.contains(Self::CONDITION)
    }
}

flag_word!(
    /// Commit flags.
    CommitFlags,
    defined = CommitFlags::ACCEPT | CommitFlags::REJECT | CommitFlags::PREIMAGE
);

impl CommitFlags {
    pub const ACCEPT: u64 = 1 << 0;
    pub const REJECT: u64 = 1 << 1;
    /// `custom_2 ‖ custom_3` carry the pre-image of the transfer's condition.
    pub const PREIMAGE: u64 = 1 << 2;

    pub const fn accept(self) -> bool {
        self.contains(Self::ACCEPT)
    }

    pub const fn reject(self) -> bool {
        self.contains(Self::REJECT)
    }

    pub const fn preimage(self) -> bool {
        self.contains(Self::PREIMAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_isolates_undefined_bits() {
        let flags = TransferFlags::from_bits(TransferFlags::AUTO_COMMIT | (1 << 40));
        assert!(flags.auto_commit());
        assert_eq!(flags.padding(), 1 << 40);
        assert_eq!(TransferFlags::from_bits(0b1111).padding(), 0);
    }

    #[test]
    fn account_user_bits_are_not_padding() {
        let flags = AccountFlags::from_bits(0xBEEF);
        assert_eq!(flags.padding(), 0);
        assert_eq!(flags.user(), 0xBEEF);
        assert_eq!(AccountFlags::from_bits(1 << 16).padding(), 1 << 16);
    }

    #[test]
    fn commit_flags_builder() {
        let flags = CommitFlags::empty()
            .with(CommitFlags::ACCEPT)
            .with(CommitFlags::PREIMAGE);
        assert!(flags.accept());
        assert!(flags.preimage());
        assert!(!flags.reject());
        assert_eq!(flags.bits(), 0b101);
    }

    #[test]
    fn flags_serialize_as_plain_integers() {
        let json = serde_json::to_string(&CommitFlags::from_bits(3)).unwrap();
        assert_eq!(json, "3");
        let parsed: TransferFlags = serde_json::from_str("4").unwrap();
        assert!(parsed.auto_commit());
    }
}
