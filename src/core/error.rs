use alloy::primitives::U256;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BetSyncError>;

/// Failure kinds surfaced by bet materialization and classification.
#[derive(Debug, Error)]
pub enum BetSyncError {
    #[error("ledger unavailable: {context}")]
    LedgerUnavailable {
        context: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("fixture lookup failed for fixture {fixture_id}")]
    FixtureLookupFailed {
        fixture_id: u64,
        #[source]
        source: anyhow::Error,
    },
    #[error("invalid bet record shape: {0}")]
    InvalidRecordShape(String),
}

impl BetSyncError {
    pub fn ledger(context: impl Into<String>, source: anyhow::Error) -> Self {
        Self::LedgerUnavailable {
            context: context.into(),
            source,
        }
    }

    pub fn bad_record(bet_id: Option<U256>, reason: impl std::fmt::Display) -> Self {
        match bet_id {
            Some(id) => Self::InvalidRecordShape(format!("bet {id}: {reason}")),
            None => Self::InvalidRecordShape(reason.to_string()),
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LedgerUnavailable { .. } => "ledger_unavailable",
            Self::FixtureLookupFailed { .. } => "fixture_lookup_failed",
            Self::InvalidRecordShape(_) => "invalid_record_shape",
        }
    }
}
