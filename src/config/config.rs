use crate::core::units::MAX_DECIMALS;
use alloy::primitives::Address;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppCfg {
    #[serde(default)]
    pub http: HttpCfg,
    pub ledger: LedgerCfg,
    #[serde(default)]
    pub football: FootballCfg,
    #[serde(default)]
    pub sync: SyncCfg,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpCfg {
    #[serde(default = "default_ua")]
    pub user_agent: String,
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
    #[serde(with = "humantime_serde", default = "default_idle")]
    pub pool_idle_timeout: Duration,
    #[serde(with = "humantime_serde", default = "default_keepalive")]
    pub tcp_keep_alive: Duration,
    #[serde(default = "default_pool")]
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpCfg {
    fn default() -> Self {
        Self {
            user_agent: default_ua(),
            timeout: default_timeout(),
            pool_idle_timeout: default_idle(),
            tcp_keep_alive: default_keepalive(),
            pool_max_idle_per_host: default_pool(),
        }
    }
}
fn default_ua() -> String {
    "matchwager/0.1".into()
}
fn default_timeout() -> Duration {
    Duration::from_secs(10)
}
fn default_idle() -> Duration {
    Duration::from_secs(90)
}
fn default_keepalive() -> Duration {
    Duration::from_secs(60)
}
fn default_pool() -> usize {
    16
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerCfg {
    pub rpc_url: String,
    #[serde(default)]
    pub contract_address: String,
    /// Identity used for classification and as transaction sender.
    pub account: String,
    #[serde(default = "default_stake_decimals")]
    pub stake_decimals: u32,
    /// Use the in-memory ledger instead of the RPC node.
    #[serde(default)]
    pub simulate: bool,
}

impl Default for LedgerCfg {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:9545".to_string(),
            contract_address: String::new(),
            account: format!("{}", Address::ZERO),
            stake_decimals: default_stake_decimals(),
            simulate: false,
        }
    }
}
fn default_stake_decimals() -> u32 {
    18
}

impl LedgerCfg {
    pub fn account(&self) -> Result<Address> {
        self.account
            .parse::<Address>()
            .context("invalid ledger.account")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FootballCfg {
    #[serde(default = "default_football_url")]
    pub base_url: String,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default = "default_proof_url")]
    pub proof_url: String,
    #[serde(default = "default_competition")]
    pub competition_id: u64,
    #[serde(default = "default_time_frame")]
    pub time_frame: String,
    #[serde(default = "default_upcoming_status")]
    pub upcoming_status: String,
    #[serde(default = "default_rpm")]
    pub requests_per_minute: u32,
    #[serde(default)]
    pub cache: FixtureCacheCfg,
    /// Serve fixtures from the built-in simulator.
    #[serde(default)]
    pub simulate: bool,
}

impl Default for FootballCfg {
    fn default() -> Self {
        Self {
            base_url: default_football_url(),
            auth_token: String::new(),
            proof_url: default_proof_url(),
            competition_id: default_competition(),
            time_frame: default_time_frame(),
            upcoming_status: default_upcoming_status(),
            requests_per_minute: default_rpm(),
            cache: FixtureCacheCfg::default(),
            simulate: false,
        }
    }
}
fn default_football_url() -> String {
    "https://api.football-data.org/v1".into()
}
fn default_proof_url() -> String {
    "https://api.tlsproof.bastien.tech".into()
}
fn default_competition() -> u64 {
    467
}
fn default_time_frame() -> String {
    "n40".into()
}
fn default_upcoming_status() -> String {
    "TIMED".into()
}
fn default_rpm() -> u32 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct FixtureCacheCfg {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    #[serde(with = "humantime_serde", default = "default_cache_ttl")]
    pub ttl: Duration,
}

impl Default for FixtureCacheCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: default_cache_capacity(),
            ttl: default_cache_ttl(),
        }
    }
}
fn default_cache_capacity() -> usize {
    256
}
fn default_cache_ttl() -> Duration {
    Duration::from_secs(300)
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any per-bet failure fails the whole pass.
    #[default]
    FailFast,
    /// Per-bet failures are logged and the bet is skipped.
    BestEffort,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncCfg {
    #[serde(with = "humantime_serde", default = "default_refresh")]
    pub refresh: Duration,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Bets materialized in flight at once. Output order is unaffected.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for SyncCfg {
    fn default() -> Self {
        Self {
            refresh: default_refresh(),
            failure_policy: FailurePolicy::default(),
            concurrency: default_concurrency(),
        }
    }
}
fn default_refresh() -> Duration {
    Duration::from_secs(30)
}
fn default_concurrency() -> usize {
    1
}

impl AppCfg {
    /// Reads `path` and overlays `MATCHWAGER__<SECTION>__<KEY>` variables.
    /// Env keys arrive lowercased, so config keys stay snake_case to match.
    pub fn load(path: &str) -> Result<Self> {
        let cfg = Config::builder()
            .add_source(File::with_name(path))
            .add_source(config::Environment::with_prefix("MATCHWAGER").separator("__"))
            .build()
            .context("building config")?;

        let app: AppCfg = cfg.try_deserialize().context("deserializing config")?;
        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.ledger.rpc_url.is_empty(), "ledger.rpc_url missing");
        self.ledger.account()?;
        if !self.ledger.simulate {
            self.ledger
                .contract_address
                .parse::<Address>()
                .context("ledger.contract_address must be a valid address")?;
        }
        anyhow::ensure!(
            self.ledger.stake_decimals <= MAX_DECIMALS,
            "ledger.stake_decimals must be <= {MAX_DECIMALS}"
        );
        anyhow::ensure!(!self.football.base_url.is_empty(), "football.base_url missing");
        anyhow::ensure!(!self.football.proof_url.is_empty(), "football.proof_url missing");
        anyhow::ensure!(
            self.football.requests_per_minute > 0,
            "football.requests_per_minute must be > 0"
        );
        anyhow::ensure!(
            self.football.cache.capacity > 0,
            "football.cache.capacity must be > 0"
        );
        anyhow::ensure!(self.sync.concurrency > 0, "sync.concurrency must be > 0");
        Ok(())
    }
}
