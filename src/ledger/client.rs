use crate::ledger::record::RawBetRecord;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use anyhow::Result;
use async_trait::async_trait;

/// Read side of the betting contract.
#[async_trait]
pub trait LedgerClient: Send + Sync + 'static {
    /// Every bet id the ledger knows, in ledger order.
    async fn list_bet_ids(&self) -> Result<Vec<U256>>;
    async fn get_bet_record(&self, id: U256) -> Result<RawBetRecord>;
}

/// A proposal as submitted to the contract. Stakes are in base units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub proof: Bytes,
    pub proposer_stake: U256,
    pub accepter_stake: U256,
    pub home_score: u32,
    pub away_score: u32,
}

/// Write side of the betting contract. Every call names its sender.
#[async_trait]
pub trait BettingContract: Send + Sync + 'static {
    async fn propose_bet(&self, from: Address, proposal: &Proposal) -> Result<TxHash>;
    async fn accept_bet(&self, from: Address, id: U256, value: U256) -> Result<TxHash>;
    async fn cancel_bet(&self, from: Address, id: U256) -> Result<TxHash>;
    async fn resolve_bet(&self, from: Address, id: U256, proof: Bytes) -> Result<TxHash>;
}
