use alloy::primitives::{Address, U256};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[async_trait::async_trait]
pub trait Actor: Send + Sync + 'static {
    async fn run(self) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SyncStatus {
    Healthy,
    Degraded(String), // Reason
}

// ----------- Fixture data -----------------
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureResult {
    #[serde(default)]
    pub goals_home_team: Option<i32>,
    #[serde(default)]
    pub goals_away_team: Option<i32>,
}

/// Match metadata as served by the fixture API. Only the fields the bet
/// views need are modelled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureDetails {
    pub id: u64,
    #[serde(default)]
    pub competition_id: Option<u64>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: String, // "TIMED", "IN_PLAY", "FINISHED", ...
    #[serde(default)]
    pub matchday: Option<u32>,
    #[serde(default)]
    pub home_team_name: String,
    #[serde(default)]
    pub away_team_name: String,
    #[serde(default)]
    pub result: Option<FixtureResult>,
}

// ----------- Bets -----------------
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: U256,
    pub proposer_stake: Decimal,
    pub accepter_stake: Decimal,
    pub belongs_to: Address,
    pub accepted_by: Address,
    pub home_score: u32,
    pub away_score: u32,
    pub fixture_details: FixtureDetails,
    pub accepted: bool,
    pub deleted: bool,
}

impl Bet {
    /// True when `account` proposed or accepted the bet.
    pub fn involves(&self, account: Address) -> bool {
        self.belongs_to == account || (self.accepted && self.accepted_by == account)
    }

    pub fn odds(&self) -> String {
        crate::bets::odds::format_odds(self.proposer_stake, self.accepter_stake)
    }
}

/// What the caller can do with a bet in a given bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetAction {
    Remove,
    Accept,
    Claim,
}

impl BetAction {
    pub fn label(&self) -> &'static str {
        match self {
            BetAction::Remove => "Remove Bet",
            BetAction::Accept => "Accept Bet",
            BetAction::Claim => "Claim Bet",
        }
    }
}

/// Three-way partition of the ledger's bets relative to one account.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BetBook {
    pub user_bets: Vec<Bet>,
    pub non_user_bets: Vec<Bet>,
    pub user_accepted_bets: Vec<Bet>,
    /// Ids dropped by a best-effort pass. Always empty under fail-fast.
    #[serde(default)]
    pub skipped: Vec<U256>,
}

impl BetBook {
    pub fn len(&self) -> usize {
        self.user_bets.len() + self.non_user_bets.len() + self.user_accepted_bets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every classified bet with the action its bucket offers.
    pub fn actionable(&self) -> impl Iterator<Item = (&Bet, BetAction)> {
        self.user_bets
            .iter()
            .map(|b| (b, BetAction::Remove))
            .chain(self.non_user_bets.iter().map(|b| (b, BetAction::Accept)))
            .chain(self.user_accepted_bets.iter().map(|b| (b, BetAction::Claim)))
    }

    pub fn find(&self, id: U256) -> Option<(&Bet, BetAction)> {
        self.actionable().find(|(b, _)| b.id == id)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BetBookSnapshot {
    pub account: Address,
    pub book: BetBook,
    pub ts_ms: i64,
}
