use anyhow::{Context, Result};
use matchwager::bets::classifier::ClassifyOptions;
use matchwager::bus::types::Bus;
use matchwager::config::config::AppCfg;
use matchwager::core::types::Actor;
use matchwager::core::units::TokenUnit;
use matchwager::fixtures::cache::CachedFixtureClient;
use matchwager::fixtures::client::FixtureClient;
use matchwager::fixtures::football_data::FootballDataClient;
use matchwager::fixtures::simulator::SimFixtureClient;
use matchwager::ledger::client::{BettingContract, LedgerClient};
use matchwager::ledger::contract::RpcBettingContract;
use matchwager::ledger::simulator::SimLedger;
use matchwager::sync::actor::BetSyncActor;
use matchwager::sync::reporter::BookReporter;
use matchwager::wager::desk::WagerDesk;
use reqwest::Client;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let cfg_path = std::env::var("MATCHWAGER_CONFIG").unwrap_or_else(|_| "config.yml".into());
    let cfg = AppCfg::load(&cfg_path)?;

    // Root span for the supervisor/main thread
    let span = info_span!(
        "Supervisor",
        pid = %std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
    );
    let _enter = span.enter();

    info!(config = %cfg_path, "Starting up");

    let bus = Bus::new();
    let shutdown = CancellationToken::new();

    info!("Initializing Client");
    let client = Client::builder()
        .user_agent(cfg.http.user_agent.clone())
        .pool_idle_timeout(cfg.http.pool_idle_timeout)
        .pool_max_idle_per_host(cfg.http.pool_max_idle_per_host)
        .tcp_keepalive(cfg.http.tcp_keep_alive)
        .timeout(cfg.http.timeout)
        .build()
        .context("building http client")?;

    let (ledger, contract): (Arc<dyn LedgerClient>, Arc<dyn BettingContract>) = if cfg.ledger.simulate {
        info!("Using simulated ledger");
        let sim = Arc::new(SimLedger::new());
        (sim.clone() as Arc<dyn LedgerClient>, sim as Arc<dyn BettingContract>)
    } else {
        let rpc = Arc::new(RpcBettingContract::new(&cfg.ledger, client.clone())?);
        (rpc.clone() as Arc<dyn LedgerClient>, rpc as Arc<dyn BettingContract>)
    };

    let mut fixtures: Arc<dyn FixtureClient> = if cfg.football.simulate {
        info!("Using simulated fixtures");
        Arc::new(SimFixtureClient::new())
    } else {
        Arc::new(FootballDataClient::new(cfg.football.clone(), client.clone()))
    };
    if cfg.football.cache.enabled {
        info!(capacity = cfg.football.cache.capacity, ttl = ?cfg.football.cache.ttl, "Fixture cache enabled");
        fixtures = Arc::new(CachedFixtureClient::new(fixtures, &cfg.football.cache));
    }

    let desk = WagerDesk::new(
        ledger,
        contract,
        fixtures,
        TokenUnit::new(cfg.ledger.stake_decimals)?,
        cfg.ledger.account()?,
    )
    .with_options(ClassifyOptions::from(&cfg.sync));

    info!("Building actors");
    let sync = BetSyncActor::new(bus.clone(), desk, cfg.sync.refresh, shutdown.clone());
    let reporter = BookReporter::new(bus.clone(), shutdown.clone());

    info!("Spawning actors");
    let mut actors = tokio::task::JoinSet::new();
    actors.spawn(reporter.run().instrument(info_span!("Reporter")));
    actors.spawn(sync.run().instrument(info_span!("BetSync")));

    tokio::select! {
        _ = async {
            while let Some(res) = actors.join_next().await {
                match res {
                    Ok(Ok(())) => info!("Actor exited cleanly"),
                    Ok(Err(e)) => error!(?e, "Actor returned error"),
                    Err(panic) => error!(?panic, "Actor panicked/cancelled"),
                }
            }
        } => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down supervisor loop");
            shutdown.cancel();
        }
    }

    info!("Waiting for graceful shutdown of actors");
    while let Some(res) = actors.join_next().await {
        match res {
            Ok(Ok(())) => info!("Actor exited cleanly"),
            Ok(Err(e)) => error!(?e, "Actor returned error"),
            Err(panic) => error!(?panic, "Actor panicked/cancelled"),
        }
    }

    info!("Supervisor exit");
    Ok(())
}
