//! Driver configuration.

use lsig_eval::{ContextProfile, EngineKind, ParseEngineError, ParseTxnTypeError, TxnType};
use lsig_isa::MAX_LOGIC_VERSION;
use thiserror::Error;

/// Reference engine name.
pub const ENV_REFERENCE: &str = "LSIG_REFERENCE";
/// Candidate engine name.
pub const ENV_CANDIDATE: &str = "LSIG_CANDIDATE";
/// Transaction type of the reference context.
pub const ENV_REFERENCE_TXN_TYPE: &str = "LSIG_REFERENCE_TXN_TYPE";
/// Transaction type of the candidate context.
pub const ENV_CANDIDATE_TXN_TYPE: &str = "LSIG_CANDIDATE_TXN_TYPE";
/// Logic version limit applied to both contexts.
pub const ENV_LOGIC_VERSION: &str = "LSIG_LOGIC_VERSION";
/// Cost ceiling applied to both contexts.
pub const ENV_MAX_COST: &str = "LSIG_MAX_COST";

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {source}")]
    Engine {
        var: &'static str,
        source: ParseEngineError,
    },
    #[error("{var}: {source}")]
    TxnType {
        var: &'static str,
        source: ParseTxnTypeError,
    },
    #[error("{var}: `{value}` is not an unsigned integer")]
    Number { var: &'static str, value: String },
    #[error("logic version {0} is outside 1..={MAX_LOGIC_VERSION}")]
    LogicVersion(u64),
}

/// Which engines to compare and the context each one sees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffConfig {
    pub reference: EngineKind,
    pub candidate: EngineKind,
    pub reference_profile: ContextProfile,
    pub candidate_profile: ContextProfile,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            reference: EngineKind::Stepper,
            candidate: EngineKind::Lowered,
            reference_profile: ContextProfile::default(),
            candidate_profile: ContextProfile::default(),
        }
    }
}

impl DiffConfig {
    /// Defaults overridden by `LSIG_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_REFERENCE) {
            config.reference = parse_engine(ENV_REFERENCE, &value)?;
        }
        if let Some(value) = lookup(ENV_CANDIDATE) {
            config.candidate = parse_engine(ENV_CANDIDATE, &value)?;
        }
        if let Some(value) = lookup(ENV_REFERENCE_TXN_TYPE) {
            config.reference_profile.kind = parse_txn_type(ENV_REFERENCE_TXN_TYPE, &value)?;
        }
        if let Some(value) = lookup(ENV_CANDIDATE_TXN_TYPE) {
            config.candidate_profile.kind = parse_txn_type(ENV_CANDIDATE_TXN_TYPE, &value)?;
        }
        if let Some(value) = lookup(ENV_LOGIC_VERSION) {
            config = config.with_logic_version(parse_u64(ENV_LOGIC_VERSION, &value)?)?;
        }
        if let Some(value) = lookup(ENV_MAX_COST) {
            config = config.with_max_cost(parse_u64(ENV_MAX_COST, &value)?);
        }
        Ok(config)
    }

    /// Set the engines to compare.
    #[must_use]
    pub const fn with_engines(mut self, reference: EngineKind, candidate: EngineKind) -> Self {
        self.reference = reference;
        self.candidate = candidate;
        self
    }

    /// Set the transaction type of each context.
    #[must_use]
    pub const fn with_txn_types(mut self, reference: TxnType, candidate: TxnType) -> Self {
        self.reference_profile.kind = reference;
        self.candidate_profile.kind = candidate;
        self
    }

    /// Set the logic version limit on both contexts.
    pub fn with_logic_version(mut self, version: u64) -> Result<Self, ConfigError> {
        if !(1..=MAX_LOGIC_VERSION).contains(&version) {
            return Err(ConfigError::LogicVersion(version));
        }
        self.reference_profile.logic_sig_version = version;
        self.candidate_profile.logic_sig_version = version;
        Ok(self)
    }

    /// Set the cost ceiling on both contexts.
    #[must_use]
    pub const fn with_max_cost(mut self, max_cost: u64) -> Self {
        self.reference_profile.logic_sig_max_cost = max_cost;
        self.candidate_profile.logic_sig_max_cost = max_cost;
        self
    }
}

fn parse_engine(var: &'static str, value: &str) -> Result<EngineKind, ConfigError> {
    value
        .parse()
        .map_err(|source| ConfigError::Engine { var, source })
}

fn parse_txn_type(var: &'static str, value: &str) -> Result<TxnType, ConfigError> {
    value
        .parse()
        .map_err(|source| ConfigError::TxnType { var, source })
}

fn parse_u64(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Number {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = DiffConfig::default();
        assert_eq!(config.reference, EngineKind::Stepper);
        assert_eq!(config.candidate, EngineKind::Lowered);
        assert_eq!(config.reference_profile, config.candidate_profile);
        assert_eq!(config.reference_profile.logic_sig_version, 5);
        assert_eq!(config.reference_profile.logic_sig_max_cost, 100_000);
        assert_eq!(
            config.reference_profile.sender.as_bytes()[..4],
            [4, 3, 2, 1]
        );
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = DiffConfig::from_lookup(lookup(&[
            (ENV_REFERENCE, "lowered"),
            (ENV_CANDIDATE, "lowered"),
            (ENV_LOGIC_VERSION, "3"),
            (ENV_MAX_COST, " 700 "),
        ]))
        .unwrap();
        assert_eq!(config.reference, EngineKind::Lowered);
        assert_eq!(config.candidate, EngineKind::Lowered);
        assert_eq!(config.candidate_profile.logic_sig_version, 3);
        assert_eq!(config.reference_profile.logic_sig_max_cost, 700);
    }

    #[test]
    fn test_from_lookup_txn_types() {
        let config = DiffConfig::from_lookup(lookup(&[
            (ENV_REFERENCE_TXN_TYPE, "pay"),
            (ENV_CANDIDATE_TXN_TYPE, "appl"),
        ]))
        .unwrap();
        assert_eq!(config.reference_profile.kind, TxnType::Payment);
        assert_eq!(config.candidate_profile.kind, TxnType::ApplicationCall);
        assert_ne!(config.reference_profile, config.candidate_profile);
        assert_eq!(
            config,
            DiffConfig::default().with_txn_types(TxnType::Payment, TxnType::ApplicationCall)
        );
    }

    #[test]
    fn test_from_lookup_empty_is_default() {
        assert_eq!(
            DiffConfig::from_lookup(lookup(&[])).unwrap(),
            DiffConfig::default()
        );
    }

    #[test]
    fn test_from_lookup_errors() {
        assert!(matches!(
            DiffConfig::from_lookup(lookup(&[(ENV_REFERENCE, "jit")])),
            Err(ConfigError::Engine {
                var: ENV_REFERENCE,
                ..
            })
        ));
        assert_eq!(
            DiffConfig::from_lookup(lookup(&[(ENV_MAX_COST, "lots")])),
            Err(ConfigError::Number {
                var: ENV_MAX_COST,
                value: "lots".to_string()
            })
        );
        assert!(matches!(
            DiffConfig::from_lookup(lookup(&[(ENV_CANDIDATE_TXN_TYPE, "payment")])),
            Err(ConfigError::TxnType {
                var: ENV_CANDIDATE_TXN_TYPE,
                ..
            })
        ));
        assert_eq!(
            DiffConfig::from_lookup(lookup(&[(ENV_LOGIC_VERSION, "9")])),
            Err(ConfigError::LogicVersion(9))
        );
    }
}
