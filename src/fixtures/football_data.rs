use crate::config::config::FootballCfg;
use crate::core::types::FixtureDetails;
use crate::fixtures::client::FixtureClient;
use alloy::hex;
use alloy::primitives::Bytes;
use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct FixtureEnvelope {
    fixture: FixtureDetails,
}

#[derive(Debug, Deserialize)]
struct FixturesEnvelope {
    fixtures: Vec<FixtureDetails>,
}

#[derive(Debug, Deserialize)]
struct ProofEnvelope {
    proof: String,
}

/// football-data.org v1 client plus the TLS-proof mirror in front of it.
#[derive(Clone)]
pub struct FootballDataClient {
    client: Client,
    cfg: FootballCfg,
    // free tier allows a handful of requests per minute
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl FootballDataClient {
    pub fn new(cfg: FootballCfg, client: Client) -> Self {
        let rpm = NonZeroU32::new(cfg.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_minute(rpm)));
        Self {
            client,
            cfg,
            limiter,
        }
    }

    fn fixture_url(&self, id: u64) -> String {
        format!("{}/fixtures/{}?head2head=0", self.cfg.base_url, id)
    }

    fn fixtures_url(&self) -> String {
        format!(
            "{}/competitions/{}/fixtures?timeFrame={}",
            self.cfg.base_url, self.cfg.competition_id, self.cfg.time_frame
        )
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Response> {
        self.limiter.until_ready().await;
        debug!(url, "GET");

        self.client
            .get(url)
            .query(query)
            .header("X-Auth-Token", &self.cfg.auth_token)
            .header("X-Response-Control", "minified")
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?
            .error_for_status()
            .with_context(|| format!("received non-success status for {url}"))
    }
}

#[async_trait]
impl FixtureClient for FootballDataClient {
    async fn fixture(&self, id: u64) -> Result<FixtureDetails> {
        let envelope: FixtureEnvelope = self
            .get(&self.fixture_url(id), &[])
            .await?
            .json()
            .await
            .context("parsing fixture response")?;
        Ok(envelope.fixture)
    }

    async fn upcoming_fixtures(&self) -> Result<Vec<FixtureDetails>> {
        let envelope: FixturesEnvelope = self
            .get(&self.fixtures_url(), &[])
            .await?
            .json()
            .await
            .context("parsing fixtures response")?;

        let total = envelope.fixtures.len();
        let upcoming: Vec<FixtureDetails> = envelope
            .fixtures
            .into_iter()
            .filter(|f| f.status == self.cfg.upcoming_status)
            .collect();
        debug!(total, upcoming = upcoming.len(), "fixtures fetched");
        Ok(upcoming)
    }

    async fn fixture_proof(&self, id: u64) -> Result<Bytes> {
        let target = self.fixture_url(id);
        let envelope: ProofEnvelope = self
            .get(&self.cfg.proof_url, &[("proof", "true"), ("url", target.as_str())])
            .await?
            .json()
            .await
            .context("parsing proof response")?;

        let proof = hex::decode(envelope.proof.trim().trim_start_matches("0x"))
            .context("proof is not hex encoded")?;
        anyhow::ensure!(!proof.is_empty(), "empty proof for fixture {id}");
        Ok(proof.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cfg(server: &MockServer) -> FootballCfg {
        FootballCfg {
            base_url: format!("{}/v1", server.uri()),
            proof_url: format!("{}/proof", server.uri()),
            auth_token: "secret".into(),
            requests_per_minute: 600,
            ..FootballCfg::default()
        }
    }

    fn fixture_json(id: u64, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "competitionId": 467,
            "date": "2018-06-14T15:00:00Z",
            "status": status,
            "matchday": 1,
            "homeTeamName": "Russia",
            "awayTeamName": "Saudi Arabia",
            "result": { "goalsHomeTeam": null, "goalsAwayTeam": null }
        })
    }

    #[tokio::test]
    async fn fetches_fixture_with_auth_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/fixtures/165069"))
            .and(query_param("head2head", "0"))
            .and(header("X-Auth-Token", "secret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "fixture": fixture_json(165069, "TIMED") })),
            )
            .mount(&server)
            .await;

        let client = FootballDataClient::new(cfg(&server), Client::new());
        let fixture = client.fixture(165069).await.unwrap();
        assert_eq!(fixture.id, 165069);
        assert_eq!(fixture.home_team_name, "Russia");
        assert_eq!(fixture.status, "TIMED");
        assert!(fixture.date.is_some());
    }

    #[tokio::test]
    async fn missing_fixture_and_malformed_payload_fail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/fixtures/1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/fixtures/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "nope" })))
            .mount(&server)
            .await;

        let client = FootballDataClient::new(cfg(&server), Client::new());
        assert!(client.fixture(1).await.is_err());
        let err = client.fixture(2).await.unwrap_err();
        assert!(err.to_string().contains("parsing fixture response"));
    }

    #[tokio::test]
    async fn upcoming_keeps_only_timed_fixtures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/competitions/467/fixtures"))
            .and(query_param("timeFrame", "n40"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "fixtures": [
                    fixture_json(1, "TIMED"),
                    fixture_json(2, "SCHEDULED"),
                    fixture_json(3, "TIMED"),
                ]
            })))
            .mount(&server)
            .await;

        let client = FootballDataClient::new(cfg(&server), Client::new());
        let ids: Vec<u64> = client
            .upcoming_fixtures()
            .await
            .unwrap()
            .iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn proof_is_requested_for_fixture_url() {
        let server = MockServer::start().await;
        let target = format!("{}/v1/fixtures/7?head2head=0", server.uri());
        Mock::given(method("GET"))
            .and(path("/proof"))
            .and(query_param("proof", "true"))
            .and(query_param("url", target.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "proof": "0xdeadbeef" })))
            .mount(&server)
            .await;

        let client = FootballDataClient::new(cfg(&server), Client::new());
        let proof = client.fixture_proof(7).await.unwrap();
        assert_eq!(proof.as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[tokio::test]
    async fn requests_wait_for_the_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/fixtures/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "fixture": fixture_json(1, "TIMED") })))
            .mount(&server)
            .await;

        let client = FootballDataClient::new(
            FootballCfg {
                requests_per_minute: 1,
                ..cfg(&server)
            },
            Client::new(),
        );

        client.fixture(1).await.unwrap();
        // the second request has to wait for the next minute's permit
        let second = tokio::time::timeout(Duration::from_millis(300), client.fixture(1)).await;
        assert!(second.is_err());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
