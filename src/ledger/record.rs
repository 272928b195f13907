use crate::core::error::{BetSyncError, Result};
use alloy::primitives::{Address, B256, U256};

/// Number of head words in the `bets(uint256)` getter output.
pub const BET_RECORD_WORDS: usize = 12;

const ID: usize = 0;
const PROPOSER: usize = 1;
const ACCEPTOR: usize = 2;
const ACCEPTED: usize = 3;
const ACCEPTOR_STAKE: usize = 4;
const PROPOSER_STAKE: usize = 5;
const HOME_SCORE: usize = 6;
const AWAY_SCORE: usize = 7;
const FIXTURE_ID: usize = 9;
const DELETED: usize = 11;
// Positions 8 and 10 are reserved by the contract and never read.

/// One bet exactly as the ledger returns it: ordered 32-byte ABI words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBetRecord {
    pub words: Vec<B256>,
}

impl RawBetRecord {
    pub fn new(words: Vec<B256>) -> Self {
        Self { words }
    }

    /// Splits ABI return data into head words.
    pub fn from_abi(data: &[u8]) -> Result<Self> {
        if data.len() % 32 != 0 {
            return Err(BetSyncError::bad_record(
                None,
                format!("return data length {} is not word aligned", data.len()),
            ));
        }
        Ok(Self {
            words: data.chunks_exact(32).map(B256::from_slice).collect(),
        })
    }
}

/// Named view over a validated `RawBetRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetRecord {
    pub id: U256,
    pub proposer: Address,
    pub acceptor: Address,
    pub accepted: bool,
    pub acceptor_stake: U256,
    pub proposer_stake: U256,
    pub home_score: u32,
    pub away_score: u32,
    pub fixture_id: u64,
    pub deleted: bool,
}

impl BetRecord {
    pub fn decode(raw: &RawBetRecord) -> Result<Self> {
        let w = &raw.words;
        if w.len() < BET_RECORD_WORDS {
            return Err(BetSyncError::bad_record(
                None,
                format!("expected {BET_RECORD_WORDS} fields, got {}", w.len()),
            ));
        }

        let id = U256::from_be_bytes(w[ID].0);
        let field = |pos: usize, what: &str| BetSyncError::bad_record(Some(id), format!("field {pos} ({what}) malformed"));

        Ok(Self {
            id,
            proposer: word_to_address(&w[PROPOSER]).ok_or_else(|| field(PROPOSER, "proposer"))?,
            acceptor: word_to_address(&w[ACCEPTOR]).ok_or_else(|| field(ACCEPTOR, "acceptor"))?,
            accepted: word_to_bool(&w[ACCEPTED]).ok_or_else(|| field(ACCEPTED, "accepted"))?,
            acceptor_stake: U256::from_be_bytes(w[ACCEPTOR_STAKE].0),
            proposer_stake: U256::from_be_bytes(w[PROPOSER_STAKE].0),
            home_score: u32::try_from(U256::from_be_bytes(w[HOME_SCORE].0))
                .map_err(|_| field(HOME_SCORE, "home score"))?,
            away_score: u32::try_from(U256::from_be_bytes(w[AWAY_SCORE].0))
                .map_err(|_| field(AWAY_SCORE, "away score"))?,
            fixture_id: u64::try_from(U256::from_be_bytes(w[FIXTURE_ID].0))
                .map_err(|_| field(FIXTURE_ID, "fixture id"))?,
            deleted: word_to_bool(&w[DELETED]).ok_or_else(|| field(DELETED, "deleted"))?,
        })
    }

    pub fn encode(&self) -> RawBetRecord {
        let mut words = vec![B256::ZERO; BET_RECORD_WORDS];
        words[ID] = B256::from(self.id.to_be_bytes::<32>());
        words[PROPOSER] = self.proposer.into_word();
        words[ACCEPTOR] = self.acceptor.into_word();
        words[ACCEPTED] = bool_to_word(self.accepted);
        words[ACCEPTOR_STAKE] = B256::from(self.acceptor_stake.to_be_bytes::<32>());
        words[PROPOSER_STAKE] = B256::from(self.proposer_stake.to_be_bytes::<32>());
        words[HOME_SCORE] = B256::from(U256::from(self.home_score).to_be_bytes::<32>());
        words[AWAY_SCORE] = B256::from(U256::from(self.away_score).to_be_bytes::<32>());
        words[FIXTURE_ID] = B256::from(U256::from(self.fixture_id).to_be_bytes::<32>());
        words[DELETED] = bool_to_word(self.deleted);
        RawBetRecord::new(words)
    }
}

fn word_to_address(word: &B256) -> Option<Address> {
    if word[..12].iter().any(|b| *b != 0) {
        return None;
    }
    Some(Address::from_slice(&word[12..]))
}

fn word_to_bool(word: &B256) -> Option<bool> {
    if word[..31].iter().any(|b| *b != 0) {
        return None;
    }
    match word[31] {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

fn bool_to_word(value: bool) -> B256 {
    B256::with_last_byte(value as u8)
}
