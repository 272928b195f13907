use crate::bets::classifier::{ClassifyOptions, classify_bets_with};
use crate::core::types::{Bet, BetAction, BetBook, FixtureDetails};
use crate::core::units::TokenUnit;
use crate::fixtures::client::FixtureClient;
use crate::ledger::client::{BettingContract, LedgerClient, Proposal};
use alloy::primitives::{Address, TxHash, U256};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

/// A bet as entered by the proposer, stakes in display units.
#[derive(Debug, Clone, PartialEq)]
pub struct BetDraft {
    pub home_score: u32,
    pub away_score: u32,
    pub proposer_stake: Decimal,
    pub accepter_stake: Decimal,
}

impl BetDraft {
    pub fn odds(&self) -> String {
        crate::bets::odds::format_odds(self.proposer_stake, self.accepter_stake)
    }
}

/// Everything one account can do with bets: list, propose, accept,
/// withdraw and claim.
#[derive(Clone)]
pub struct WagerDesk {
    ledger: Arc<dyn LedgerClient>,
    contract: Arc<dyn BettingContract>,
    fixtures: Arc<dyn FixtureClient>,
    unit: TokenUnit,
    account: Address,
    opts: ClassifyOptions,
}

impl WagerDesk {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        contract: Arc<dyn BettingContract>,
        fixtures: Arc<dyn FixtureClient>,
        unit: TokenUnit,
        account: Address,
    ) -> Self {
        Self {
            ledger,
            contract,
            fixtures,
            unit,
            account,
            opts: ClassifyOptions::default(),
        }
    }

    pub fn with_options(mut self, opts: ClassifyOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub async fn refresh(&self) -> Result<BetBook> {
        let unit = self.unit;
        let book = classify_bets_with(
            self.ledger.as_ref(),
            self.fixtures.as_ref(),
            &move |wei: U256| unit.to_display(wei),
            self.account,
            self.opts,
        )
        .await?;
        Ok(book)
    }

    pub async fn upcoming_fixtures(&self) -> Result<Vec<FixtureDetails>> {
        self.fixtures
            .upcoming_fixtures()
            .await
            .context("listing upcoming fixtures")
    }

    pub async fn propose(&self, fixture_id: u64, draft: &BetDraft) -> Result<TxHash> {
        anyhow::ensure!(
            draft.proposer_stake > Decimal::ZERO && draft.accepter_stake > Decimal::ZERO,
            "both stakes must be positive"
        );

        let proposal = Proposal {
            proof: self
                .fixtures
                .fixture_proof(fixture_id)
                .await
                .with_context(|| format!("fetching proof for fixture {fixture_id}"))?,
            proposer_stake: self.unit.to_base(draft.proposer_stake)?,
            accepter_stake: self.unit.to_base(draft.accepter_stake)?,
            home_score: draft.home_score,
            away_score: draft.away_score,
        };

        info!(fixture_id, odds = %draft.odds(), "proposing bet");
        self.contract.propose_bet(self.account, &proposal).await
    }

    pub async fn accept(&self, bet: &Bet) -> Result<TxHash> {
        anyhow::ensure!(!bet.deleted && !bet.accepted, "bet {} is not open", bet.id);
        anyhow::ensure!(bet.belongs_to != self.account, "cannot accept own bet {}", bet.id);

        let value = self.unit.to_base(bet.accepter_stake)?;
        info!(bet_id = %bet.id, stake = %bet.accepter_stake, "accepting bet");
        self.contract.accept_bet(self.account, bet.id, value).await
    }

    pub async fn cancel(&self, bet: &Bet) -> Result<TxHash> {
        anyhow::ensure!(bet.belongs_to == self.account, "bet {} is not ours", bet.id);
        anyhow::ensure!(!bet.accepted, "bet {} was already accepted", bet.id);

        info!(bet_id = %bet.id, "withdrawing bet");
        self.contract.cancel_bet(self.account, bet.id).await
    }

    /// Settles an accepted bet with a fresh proof of the fixture result.
    pub async fn claim(&self, bet: &Bet) -> Result<TxHash> {
        anyhow::ensure!(bet.accepted, "bet {} has not been accepted", bet.id);
        anyhow::ensure!(bet.involves(self.account), "not a party to bet {}", bet.id);

        let fixture_id = bet.fixture_details.id;
        let proof = self
            .fixtures
            .fixture_proof(fixture_id)
            .await
            .with_context(|| format!("fetching proof for fixture {fixture_id}"))?;

        info!(bet_id = %bet.id, fixture_id, "claiming bet");
        self.contract.resolve_bet(self.account, bet.id, proof).await
    }

    pub async fn perform(&self, bet: &Bet, action: BetAction) -> Result<TxHash> {
        match action {
            BetAction::Remove => self.cancel(bet).await,
            BetAction::Accept => self.accept(bet).await,
            BetAction::Claim => self.claim(bet).await,
        }
    }
}
