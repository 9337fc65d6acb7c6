//! Transaction and consensus data the evaluator reads.
//!
//! Only the fields reachable from `txn`, `gtxn` and `global` are modeled.

use std::fmt;
use std::str::FromStr;

use crate::ParseTxnTypeError;

/// 32-byte account address.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const ZERO: Self = Self([0; 32]);

    /// Address whose leading bytes are `prefix`, zero-padded.
    pub fn from_prefix(prefix: &[u8]) -> Self {
        let mut bytes = [0u8; 32];
        let n = prefix.len().min(32);
        bytes[..n].copy_from_slice(&prefix[..n]);
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Transaction type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TxnType {
    #[default]
    Payment,
    KeyRegistration,
    AssetConfig,
    AssetTransfer,
    AssetFreeze,
    ApplicationCall,
}

impl TxnType {
    pub const ALL: [Self; 6] = [
        Self::Payment,
        Self::KeyRegistration,
        Self::AssetConfig,
        Self::AssetTransfer,
        Self::AssetFreeze,
        Self::ApplicationCall,
    ];

    /// Short type string exposed through `txn Type`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Payment => "pay",
            Self::KeyRegistration => "keyreg",
            Self::AssetConfig => "acfg",
            Self::AssetTransfer => "axfer",
            Self::AssetFreeze => "afrz",
            Self::ApplicationCall => "appl",
        }
    }

    /// Numeric type exposed through `txn TypeEnum`.
    pub const fn type_enum(self) -> u64 {
        match self {
            Self::Payment => 1,
            Self::KeyRegistration => 2,
            Self::AssetConfig => 3,
            Self::AssetTransfer => 4,
            Self::AssetFreeze => 5,
            Self::ApplicationCall => 6,
        }
    }
}

impl FromStr for TxnType {
    type Err = ParseTxnTypeError;

    /// Accepts the short type string, e.g. `pay` or `appl`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseTxnTypeError(s.to_string()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transaction {
    pub kind: TxnType,
    pub sender: Address,
    pub receiver: Address,
    pub fee: u64,
    pub amount: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub note: Vec<u8>,
    pub application_id: u64,
}

/// Program and arguments authorizing a transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogicSig {
    pub logic: Vec<u8>,
    pub args: Vec<Vec<u8>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignedTxn {
    pub txn: Transaction,
    pub lsig: LogicSig,
}

/// Consensus parameters relevant to logic evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusParams {
    /// Highest program version accepted.
    pub logic_sig_version: u64,
    /// Cost ceiling for a single program.
    pub logic_sig_max_cost: u64,
    pub min_txn_fee: u64,
    pub min_balance: u64,
    pub max_txn_life: u64,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            logic_sig_version: 5,
            logic_sig_max_cost: 100_000,
            min_txn_fee: 1_000,
            min_balance: 100_000,
            max_txn_life: 1_000,
        }
    }
}

/// Ledger state stub for fields that depend on the current block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    pub round: u64,
    pub latest_timestamp: u64,
}

/// Everything an evaluation can observe.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalParams {
    pub txn_group: Vec<SignedTxn>,
    /// Index of the transaction whose logic is evaluated.
    pub group_index: usize,
    pub proto: ConsensusParams,
    pub ledger: Option<Ledger>,
}

impl EvalParams {
    /// Build a single-transaction group that carries `program` and `args`.
    pub fn for_logic_sig(profile: &ContextProfile, program: &[u8], args: &[Vec<u8>]) -> Self {
        let txn = SignedTxn {
            txn: Transaction {
                kind: profile.kind,
                sender: profile.sender,
                ..Transaction::default()
            },
            lsig: LogicSig {
                logic: program.to_vec(),
                args: args.to_vec(),
            },
        };
        Self {
            txn_group: vec![txn],
            group_index: 0,
            proto: ConsensusParams {
                logic_sig_version: profile.logic_sig_version,
                logic_sig_max_cost: profile.logic_sig_max_cost,
                ..ConsensusParams::default()
            },
            ledger: profile.ledger,
        }
    }

    /// The transaction being evaluated.
    pub fn txn(&self) -> Option<&SignedTxn> {
        self.txn_group.get(self.group_index)
    }
}

/// Fixed shape of the synthetic context built around a fuzzed program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextProfile {
    pub sender: Address,
    pub kind: TxnType,
    pub logic_sig_version: u64,
    pub logic_sig_max_cost: u64,
    pub ledger: Option<Ledger>,
}

impl Default for ContextProfile {
    fn default() -> Self {
        Self {
            sender: Address::from_prefix(&[4, 3, 2, 1]),
            kind: TxnType::Payment,
            logic_sig_version: 5,
            logic_sig_max_cost: 100_000,
            ledger: None,
        }
    }
}
