use crate::bus::types::Bus;
use crate::core::types::{Actor, BetBookSnapshot};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Logs every bet book published on the bus.
pub struct BookReporter {
    pub bus: Bus,
    pub shutdown: CancellationToken,
}

impl BookReporter {
    pub fn new(bus: Bus, shutdown: CancellationToken) -> BookReporter {
        Self { bus, shutdown }
    }

    fn report(snapshot: &BetBookSnapshot) {
        let book = &snapshot.book;
        info!(
            account = %snapshot.account,
            open_own = book.user_bets.len(),
            open_other = book.non_user_bets.len(),
            accepted = book.user_accepted_bets.len(),
            skipped = book.skipped.len(),
            "bet book updated"
        );

        for (bet, action) in book.actionable() {
            let f = &bet.fixture_details;
            debug!(
                bet_id = %bet.id,
                "{} {} - {} {} | {} - {} | {} | {}",
                f.home_team_name,
                bet.home_score,
                bet.away_score,
                f.away_team_name,
                bet.proposer_stake,
                bet.accepter_stake,
                bet.odds(),
                action.label()
            );
        }
    }
}

#[async_trait]
impl Actor for BookReporter {
    async fn run(mut self) -> Result<()> {
        info!("BookReporter started");
        let mut rx = self.bus.bet_book.subscribe();
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("BookReporter: shutdown requested");
                    break;
                }

                res = rx.recv() => {
                    match res {
                        Ok(snapshot) => Self::report(&snapshot),
                        Err(RecvError::Lagged(n)) => {
                            // only the latest book matters
                            debug!("BookReporter skipped {n} stale books");
                            continue;
                        }
                        Err(RecvError::Closed) => {
                            error!("BookReporter bet book channel closed");
                            break;
                        }
                    }
                }
            }
        }

        info!("BookReporter stopped cleanly");
        Ok(())
    }
}
