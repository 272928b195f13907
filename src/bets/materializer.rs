use crate::core::error::{BetSyncError, Result};
use crate::core::types::Bet;
use crate::fixtures::client::FixtureClient;
use crate::ledger::record::{BetRecord, RawBetRecord};
use alloy::primitives::U256;
use rust_decimal::Decimal;
use tracing::debug;

/// Turns one raw ledger record into a `Bet`, resolving its fixture.
///
/// Every call performs its own fixture lookup. A failed lookup fails the
/// materialization; nothing is defaulted.
pub async fn materialize<F>(
    raw: &RawBetRecord,
    fixtures: &dyn FixtureClient,
    to_display_unit: &F,
) -> Result<Bet>
where
    F: Fn(U256) -> Result<Decimal> + Sync + ?Sized,
{
    let record = BetRecord::decode(raw)?;
    let id = record.id;

    let proposer_stake = to_display_unit(record.proposer_stake).map_err(|e| with_bet_id(id, e))?;
    let accepter_stake = to_display_unit(record.acceptor_stake).map_err(|e| with_bet_id(id, e))?;

    let fixture_details = fixtures
        .fixture(record.fixture_id)
        .await
        .map_err(|source| BetSyncError::FixtureLookupFailed {
            fixture_id: record.fixture_id,
            source,
        })?;
    debug!(bet_id = %id, fixture_id = record.fixture_id, "bet materialized");

    Ok(Bet {
        id,
        proposer_stake,
        accepter_stake,
        belongs_to: record.proposer,
        accepted_by: record.acceptor,
        home_score: record.home_score,
        away_score: record.away_score,
        fixture_details,
        accepted: record.accepted,
        deleted: record.deleted,
    })
}

fn with_bet_id(id: U256, err: BetSyncError) -> BetSyncError {
    match err {
        BetSyncError::InvalidRecordShape(reason) => BetSyncError::bad_record(Some(id), reason),
        other => other,
    }
}
