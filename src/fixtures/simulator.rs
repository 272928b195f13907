use crate::core::types::FixtureDetails;
use crate::fixtures::client::FixtureClient;
use alloy::primitives::Bytes;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct SimFixtureState {
    pub fixtures: HashMap<u64, FixtureDetails>,
    pub failing: HashSet<u64>,
}

/// Fixture source backed by a map. Lookups can be made to fail per id.
#[derive(Debug, Default)]
pub struct SimFixtureClient {
    pub state: Mutex<SimFixtureState>,
    lookups: AtomicUsize,
}

impl SimFixtureClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixtures(fixtures: Vec<FixtureDetails>) -> Self {
        Self {
            state: Mutex::new(SimFixtureState {
                fixtures: fixtures.into_iter().map(|f| (f.id, f)).collect(),
                failing: HashSet::new(),
            }),
            lookups: AtomicUsize::new(0),
        }
    }

    /// A scheduled fixture with the given teams.
    pub fn fixture(id: u64, home: &str, away: &str) -> FixtureDetails {
        FixtureDetails {
            id,
            competition_id: Some(467),
            date: None,
            status: "TIMED".to_string(),
            matchday: None,
            home_team_name: home.to_string(),
            away_team_name: away.to_string(),
            result: None,
        }
    }

    pub async fn fail(&self, id: u64) {
        self.state.lock().await.failing.insert(id);
    }

    /// Number of `fixture` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl FixtureClient for SimFixtureClient {
    async fn fixture(&self, id: u64) -> Result<FixtureDetails> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let state = self.state.lock().await;
        anyhow::ensure!(!state.failing.contains(&id), "simulated lookup failure for fixture {id}");
        state
            .fixtures
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("fixture {id} not found"))
    }

    async fn upcoming_fixtures(&self) -> Result<Vec<FixtureDetails>> {
        let state = self.state.lock().await;
        let mut upcoming: Vec<FixtureDetails> = state
            .fixtures
            .values()
            .filter(|f| f.status == "TIMED")
            .cloned()
            .collect();
        upcoming.sort_by_key(|f| f.id);
        Ok(upcoming)
    }

    async fn fixture_proof(&self, id: u64) -> Result<Bytes> {
        let state = self.state.lock().await;
        anyhow::ensure!(state.fixtures.contains_key(&id), "fixture {id} not found");
        Ok(Bytes::from(format!("GET /v1/fixtures/{id}?head2head=0").into_bytes()))
    }
}
