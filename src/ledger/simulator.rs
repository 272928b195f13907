use crate::ledger::client::{BettingContract, LedgerClient, Proposal};
use crate::ledger::record::{BetRecord, RawBetRecord};
use alloy::primitives::{Address, Bytes, TxHash, U256, keccak256};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Default)]
pub struct SimState {
    pub bets: Vec<BetRecord>,
    pub claims: Vec<(U256, Address)>,
    pub unavailable: bool,
    pub broken_records: HashSet<U256>,
    tx_nonce: u64,
}

impl SimState {
    fn bet_mut(&mut self, id: U256) -> Result<&mut BetRecord> {
        self.bets
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| anyhow::anyhow!("unknown bet {id}"))
    }

    fn next_tx(&mut self, op: &str, id: U256) -> TxHash {
        self.tx_nonce += 1;
        keccak256(format!("{op}:{id}:{}", self.tx_nonce))
    }
}

/// In-memory stand-in for the betting contract. Only the state a reader
/// of the ledger can observe is modelled; no funds move.
#[derive(Debug, Default)]
pub struct SimLedger {
    pub state: Mutex<SimState>,
}

impl SimLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bets(bets: Vec<BetRecord>) -> Self {
        Self {
            state: Mutex::new(SimState {
                bets,
                ..SimState::default()
            }),
        }
    }

    /// Makes every read fail, as if the node were unreachable.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().await.unavailable = unavailable;
    }

    /// Makes reads of one record fail.
    pub async fn break_record(&self, id: U256) {
        self.state.lock().await.broken_records.insert(id);
    }
}

/// The contract reads the fixture id out of the proven response. The
/// simulator looks for the `/fixtures/{id}` path of the proven request.
pub fn fixture_id_from_proof(proof: &[u8]) -> Option<u64> {
    let text = String::from_utf8_lossy(proof);
    let (_, rest) = text.split_once("/fixtures/")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[async_trait]
impl LedgerClient for SimLedger {
    async fn list_bet_ids(&self) -> Result<Vec<U256>> {
        let state = self.state.lock().await;
        anyhow::ensure!(!state.unavailable, "simulated ledger unavailable");
        Ok(state.bets.iter().map(|b| b.id).collect())
    }

    async fn get_bet_record(&self, id: U256) -> Result<RawBetRecord> {
        let state = self.state.lock().await;
        anyhow::ensure!(!state.unavailable, "simulated ledger unavailable");
        anyhow::ensure!(!state.broken_records.contains(&id), "simulated read failure for bet {id}");
        state
            .bets
            .iter()
            .find(|b| b.id == id)
            .map(BetRecord::encode)
            .ok_or_else(|| anyhow::anyhow!("unknown bet {id}"))
    }
}

#[async_trait]
impl BettingContract for SimLedger {
    async fn propose_bet(&self, from: Address, proposal: &Proposal) -> Result<TxHash> {
        anyhow::ensure!(!proposal.proposer_stake.is_zero(), "proposer stake must be positive");
        anyhow::ensure!(!proposal.accepter_stake.is_zero(), "accepter stake must be positive");

        let mut state = self.state.lock().await;
        let id = state
            .bets
            .iter()
            .map(|b| b.id)
            .max()
            .map_or(U256::from(1u8), |max| max + U256::from(1u8));

        let fixture_id = fixture_id_from_proof(&proposal.proof)
            .ok_or_else(|| anyhow::anyhow!("proof does not reference a fixture"))?;

        state.bets.push(BetRecord {
            id,
            proposer: from,
            acceptor: Address::ZERO,
            accepted: false,
            acceptor_stake: proposal.accepter_stake,
            proposer_stake: proposal.proposer_stake,
            home_score: proposal.home_score,
            away_score: proposal.away_score,
            fixture_id,
            deleted: false,
        });
        debug!(%id, %from, "simulated proposeBet");
        Ok(state.next_tx("propose", id))
    }

    async fn accept_bet(&self, from: Address, id: U256, value: U256) -> Result<TxHash> {
        let mut state = self.state.lock().await;
        let bet = state.bet_mut(id)?;
        anyhow::ensure!(!bet.deleted, "bet {id} was withdrawn");
        anyhow::ensure!(!bet.accepted, "bet {id} already accepted");
        anyhow::ensure!(bet.proposer != from, "cannot accept own bet {id}");
        anyhow::ensure!(
            bet.acceptor_stake == value,
            "bet {id} requires {} wei, got {value}",
            bet.acceptor_stake
        );
        bet.accepted = true;
        bet.acceptor = from;
        Ok(state.next_tx("accept", id))
    }

    async fn cancel_bet(&self, from: Address, id: U256) -> Result<TxHash> {
        let mut state = self.state.lock().await;
        let bet = state.bet_mut(id)?;
        anyhow::ensure!(bet.proposer == from, "only the proposer can withdraw bet {id}");
        anyhow::ensure!(!bet.accepted, "bet {id} already accepted");
        anyhow::ensure!(!bet.deleted, "bet {id} already withdrawn");
        bet.deleted = true;
        Ok(state.next_tx("cancel", id))
    }

    async fn resolve_bet(&self, from: Address, id: U256, proof: Bytes) -> Result<TxHash> {
        anyhow::ensure!(!proof.is_empty(), "empty fixture proof");
        let mut state = self.state.lock().await;
        let bet = state.bet_mut(id)?;
        anyhow::ensure!(bet.accepted, "bet {id} has not been accepted");
        anyhow::ensure!(
            bet.proposer == from || bet.acceptor == from,
            "{from} is not a party to bet {id}"
        );
        state.claims.push((id, from));
        Ok(state.next_tx("resolve", id))
    }
}
