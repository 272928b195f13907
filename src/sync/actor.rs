use crate::bus::types::Bus;
use crate::core::types::{Actor, BetBook, BetBookSnapshot, SyncStatus};
use crate::wager::desk::WagerDesk;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const FAILURE_BACKOFF: Duration = Duration::from_secs(5);

/// Re-classifies the ledger on a fixed cadence and publishes the result.
pub struct BetSyncActor {
    pub bus: Bus,
    pub desk: WagerDesk,
    pub refresh: Duration,
    pub shutdown: CancellationToken,
    last_status: Option<SyncStatus>,
}

impl BetSyncActor {
    pub fn new(bus: Bus, desk: WagerDesk, refresh: Duration, shutdown: CancellationToken) -> BetSyncActor {
        Self {
            bus,
            desk,
            refresh,
            shutdown,
            last_status: None,
        }
    }

    /// One classification pass. Returns false when the pass failed.
    async fn sync_once(&mut self) -> bool {
        metrics::counter!("bet_sync_passes_total").increment(1);

        match self.desk.refresh().await {
            Ok(book) => {
                record_book_size(&book);
                let status = match book.skipped.len() {
                    0 => SyncStatus::Healthy,
                    n => SyncStatus::Degraded(format!("{n} bets skipped")),
                };
                let snapshot = BetBookSnapshot {
                    account: self.desk.account(),
                    book,
                    ts_ms: chrono::Utc::now().timestamp_millis(),
                };
                if let Err(e) = self.bus.bet_book.publish(snapshot).await {
                    error!("Failed to publish bet book: {}", e);
                }
                self.set_status(status).await;
                true
            }
            Err(e) => {
                metrics::counter!("bet_sync_failures_total").increment(1);
                error!(error = ?e, "BetSyncActor: classification failed");
                self.set_status(SyncStatus::Degraded(format!("{e:#}"))).await;
                false
            }
        }
    }

    async fn set_status(&mut self, status: SyncStatus) {
        if self.last_status.as_ref() == Some(&status) {
            return;
        }
        info!(?status, "sync status changed");
        self.last_status = Some(status.clone());
        if let Err(e) = self.bus.sync_status.publish(status).await {
            error!("Failed to publish sync status: {}", e);
        }
    }
}

fn record_book_size(book: &BetBook) {
    metrics::gauge!("bet_book_size", "bucket" => "user").set(book.user_bets.len() as f64);
    metrics::gauge!("bet_book_size", "bucket" => "non_user").set(book.non_user_bets.len() as f64);
    metrics::gauge!("bet_book_size", "bucket" => "user_accepted").set(book.user_accepted_bets.len() as f64);
}

#[async_trait]
impl Actor for BetSyncActor {
    async fn run(mut self) -> Result<()> {
        info!(refresh = ?self.refresh, account = %self.desk.account(), "BetSyncActor started");

        let mut tick = tokio::time::interval(self.refresh);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Graceful shutdown signal
                _ = self.shutdown.cancelled() => {
                    info!("BetSyncActor: shutdown requested");
                    break;
                }

                _ = tick.tick() => {
                    if !self.sync_once().await {
                        // back off, but stay responsive to shutdown
                        tokio::select! {
                            _ = self.shutdown.cancelled() => {}
                            _ = tokio::time::sleep(FAILURE_BACKOFF) => {}
                        }
                    }
                }
            }
        }

        info!("BetSyncActor stopped cleanly");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bets::classifier::ClassifyOptions;
    use crate::config::config::FailurePolicy;
    use crate::core::units::TokenUnit;
    use crate::fixtures::simulator::SimFixtureClient;
    use crate::ledger::record::BetRecord;
    use crate::ledger::simulator::SimLedger;
    use alloy::primitives::{Address, U256, address};
    use std::sync::Arc;

    const ME: Address = address!("00000000000000000000000000000000000000a1");

    fn desk(ledger: Arc<SimLedger>) -> WagerDesk {
        let fixtures = Arc::new(SimFixtureClient::with_fixtures(vec![
            SimFixtureClient::fixture(10, "Home", "Away"),
        ]));
        WagerDesk::new(ledger.clone(), ledger, fixtures, TokenUnit::ETHER, ME)
    }

    fn open_bet() -> BetRecord {
        BetRecord {
            id: U256::from(1u8),
            proposer: ME,
            acceptor: Address::ZERO,
            accepted: false,
            acceptor_stake: U256::from(1u8),
            proposer_stake: U256::from(1u8),
            home_score: 0,
            away_score: 0,
            fixture_id: 10,
            deleted: false,
        }
    }

    #[tokio::test]
    async fn publishes_snapshots_until_shutdown() {
        let bus = Bus::new();
        let mut books = bus.bet_book.subscribe();
        let mut status = bus.sync_status.subscribe();
        let shutdown = CancellationToken::new();

        let ledger = Arc::new(SimLedger::with_bets(vec![open_bet()]));
        let actor = BetSyncActor::new(bus.clone(), desk(ledger), Duration::from_millis(20), shutdown.clone());
        let handle = tokio::spawn(actor.run());

        let snap = books.recv().await.unwrap();
        assert_eq!(snap.account, ME);
        assert_eq!(snap.book.user_bets.len(), 1);
        assert_eq!(*status.recv().await.unwrap(), SyncStatus::Healthy);

        // a second pass still publishes a book
        let again = books.recv().await.unwrap();
        assert_eq!(again.book, snap.book);

        shutdown.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn failed_pass_reports_degraded() {
        let bus = Bus::new();
        let mut status = bus.sync_status.subscribe();
        let ledger = Arc::new(SimLedger::new());
        ledger.set_unavailable(true).await;

        let mut actor = BetSyncActor::new(bus, desk(ledger.clone()), Duration::from_secs(60), CancellationToken::new());
        assert!(!actor.sync_once().await);
        match status.recv().await.unwrap().as_ref() {
            SyncStatus::Degraded(reason) => assert!(reason.contains("ledger unavailable")),
            other => panic!("unexpected status {other:?}"),
        }

        ledger.set_unavailable(false).await;
        assert!(actor.sync_once().await);
        assert_eq!(*status.recv().await.unwrap(), SyncStatus::Healthy);
    }

    #[tokio::test]
    async fn skipped_bets_make_the_pass_degraded() {
        let bus = Bus::new();
        let mut books = bus.bet_book.subscribe();
        let mut status = bus.sync_status.subscribe();

        let orphan = BetRecord {
            id: U256::from(2u8),
            fixture_id: 99,
            ..open_bet()
        };
        let ledger = Arc::new(SimLedger::with_bets(vec![open_bet(), orphan]));
        let desk = desk(ledger).with_options(ClassifyOptions {
            policy: FailurePolicy::BestEffort,
            concurrency: 1,
        });

        let mut actor = BetSyncActor::new(bus, desk, Duration::from_secs(60), CancellationToken::new());
        assert!(actor.sync_once().await);

        let snap = books.recv().await.unwrap();
        assert_eq!(snap.book.user_bets.len(), 1);
        assert_eq!(snap.book.skipped, vec![U256::from(2u8)]);
        assert_eq!(
            *status.recv().await.unwrap(),
            SyncStatus::Degraded("1 bets skipped".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_pass_backs_off_before_retrying() {
        let bus = Bus::new();
        let mut books = bus.bet_book.subscribe();
        let mut status = bus.sync_status.subscribe();
        let shutdown = CancellationToken::new();

        let ledger = Arc::new(SimLedger::with_bets(vec![open_bet()]));
        ledger.set_unavailable(true).await;

        let refresh = Duration::from_secs(1);
        let actor = BetSyncActor::new(bus, desk(ledger.clone()), refresh, shutdown.clone());
        let started = tokio::time::Instant::now();
        let handle = tokio::spawn(actor.run());

        assert!(matches!(
            status.recv().await.unwrap().as_ref(),
            SyncStatus::Degraded(_)
        ));
        ledger.set_unavailable(false).await;

        // the 1s tick is skipped while the actor waits out the back-off
        books.recv().await.unwrap();
        let waited = started.elapsed();
        assert!(waited >= FAILURE_BACKOFF, "retried after {waited:?}");
        assert!(waited < FAILURE_BACKOFF + refresh, "retried after {waited:?}");

        shutdown.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_back_off() {
        let bus = Bus::new();
        let mut status = bus.sync_status.subscribe();
        let shutdown = CancellationToken::new();

        let ledger = Arc::new(SimLedger::new());
        ledger.set_unavailable(true).await;

        let actor = BetSyncActor::new(bus, desk(ledger), Duration::from_secs(1), shutdown.clone());
        let started = tokio::time::Instant::now();
        let handle = tokio::spawn(actor.run());

        status.recv().await.unwrap();
        shutdown.cancel();
        handle.await.unwrap().unwrap();
        assert!(started.elapsed() < FAILURE_BACKOFF);
    }
}
