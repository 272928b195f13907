use crate::core::types::FixtureDetails;
use alloy::primitives::Bytes;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait FixtureClient: Send + Sync + 'static {
    async fn fixture(&self, id: u64) -> Result<FixtureDetails>;
    /// Fixtures of the configured competition that are still open for bets.
    async fn upcoming_fixtures(&self) -> Result<Vec<FixtureDetails>>;
    /// TLS proof of the fixture response, passed to the contract untouched.
    async fn fixture_proof(&self, id: u64) -> Result<Bytes>;
}

#[async_trait]
impl<T: FixtureClient + ?Sized> FixtureClient for Arc<T> {
    async fn fixture(&self, id: u64) -> Result<FixtureDetails> {
        (**self).fixture(id).await
    }

    async fn upcoming_fixtures(&self) -> Result<Vec<FixtureDetails>> {
        (**self).upcoming_fixtures().await
    }

    async fn fixture_proof(&self, id: u64) -> Result<Bytes> {
        (**self).fixture_proof(id).await
    }
}
