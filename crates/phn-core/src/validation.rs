use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Outcome recorded for a txid that has passed through POUV at least once
/// (spec.md §3 "Validation record (replay ledger)").
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    Invalid,
}

/// A persisted validation outcome for a single txid, used to short-circuit
/// re-validation and detect replayed inclusion attempts.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationRecord {
    pub txid: String,
    pub status: ValidationStatus,
    pub reason: Option<String>,
    pub timestamp: Timestamp,
}

impl ValidationRecord {
    pub fn valid(txid: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            txid: txid.into(),
            status: ValidationStatus::Valid,
            reason: None,
            timestamp,
        }
    }

    pub fn invalid(txid: impl Into<String>, reason: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            txid: txid.into(),
            status: ValidationStatus::Invalid,
            reason: Some(reason.into()),
            timestamp,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }
}
