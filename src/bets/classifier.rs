use crate::bets::materializer::materialize;
use crate::config::config::{FailurePolicy, SyncCfg};
use crate::core::error::{BetSyncError, Result};
use crate::core::types::{Bet, BetBook};
use crate::fixtures::client::FixtureClient;
use crate::ledger::client::LedgerClient;
use alloy::primitives::{Address, U256};
use futures::{StreamExt, stream};
use rust_decimal::Decimal;
use std::pin::pin;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct ClassifyOptions {
    pub policy: FailurePolicy,
    /// Bets materialized concurrently. Results are still placed in ledger order.
    pub concurrency: usize,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            policy: FailurePolicy::FailFast,
            concurrency: 1,
        }
    }
}

impl From<&SyncCfg> for ClassifyOptions {
    fn from(cfg: &SyncCfg) -> Self {
        Self {
            policy: cfg.failure_policy,
            concurrency: cfg.concurrency,
        }
    }
}

/// Fetches every bet from the ledger and partitions it relative to
/// `current_account`. Any failure aborts the pass.
pub async fn classify_bets<F>(
    ledger: &dyn LedgerClient,
    fixtures: &dyn FixtureClient,
    to_display_unit: &F,
    current_account: Address,
) -> Result<BetBook>
where
    F: Fn(U256) -> Result<Decimal> + Sync + ?Sized,
{
    classify_bets_with(
        ledger,
        fixtures,
        to_display_unit,
        current_account,
        ClassifyOptions::default(),
    )
    .await
}

pub async fn classify_bets_with<F>(
    ledger: &dyn LedgerClient,
    fixtures: &dyn FixtureClient,
    to_display_unit: &F,
    current_account: Address,
    opts: ClassifyOptions,
) -> Result<BetBook>
where
    F: Fn(U256) -> Result<Decimal> + Sync + ?Sized,
{
    let ids = ledger
        .list_bet_ids()
        .await
        .map_err(|e| BetSyncError::ledger("listing bet ids", e))?;

    // `buffered` yields in input order, so ledger order survives concurrency
    let mut bets = pin!(
        stream::iter(ids)
            .map(|id| async move { (id, fetch_bet(ledger, fixtures, to_display_unit, id).await) })
            .buffered(opts.concurrency.max(1))
    );

    let mut book = BetBook::default();
    while let Some((id, res)) = bets.next().await {
        match res {
            Ok(bet) => place(&mut book, bet, current_account),
            Err(e) if opts.policy == FailurePolicy::BestEffort => {
                warn!(bet_id = %id, kind = e.kind(), error = %e, "skipping bet");
                book.skipped.push(id);
            }
            Err(e) => {
                error!(bet_id = %id, kind = e.kind(), error = %e, "bet classification aborted");
                return Err(e);
            }
        }
    }

    info!(
        account = %current_account,
        user = book.user_bets.len(),
        non_user = book.non_user_bets.len(),
        user_accepted = book.user_accepted_bets.len(),
        skipped = book.skipped.len(),
        "bets classified"
    );
    Ok(book)
}

async fn fetch_bet<F>(
    ledger: &dyn LedgerClient,
    fixtures: &dyn FixtureClient,
    to_display_unit: &F,
    id: U256,
) -> Result<Bet>
where
    F: Fn(U256) -> Result<Decimal> + Sync + ?Sized,
{
    let raw = ledger
        .get_bet_record(id)
        .await
        .map_err(|e| match e.downcast::<BetSyncError>() {
            Ok(inner) => inner,
            Err(e) => BetSyncError::ledger(format!("fetching bet {id}"), e),
        })?;
    materialize(&raw, fixtures, to_display_unit).await
}

/// Partition rule. Deleted bets, and accepted bets the account is no party
/// to, are dropped.
fn place(book: &mut BetBook, bet: Bet, account: Address) {
    if bet.deleted {
        return;
    }

    if !bet.accepted {
        if bet.belongs_to == account {
            book.user_bets.push(bet);
        } else {
            book.non_user_bets.push(bet);
        }
    } else if account == bet.belongs_to || account == bet.accepted_by {
        book.user_accepted_bets.push(bet);
    }
}
