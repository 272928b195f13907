use crate::config::config::LedgerCfg;
use crate::ledger::client::{BettingContract, LedgerClient, Proposal};
use crate::ledger::record::RawBetRecord;
use alloy::hex;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::sol;
use alloy::sol_types::{SolCall, SolValue};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};

sol! {
    interface FootballBetting {
        function getBets() external view returns (uint256[] memory);
        function bets(uint256 id) external view;
        function proposeBet(bytes proof, uint256 accepterStake, uint256 homeScore, uint256 awayScore) external payable;
        function acceptBet(uint256 id) external payable;
        function cancelBet(uint256 id) external;
        function resolveBet(uint256 id, bytes proof) external;
    }
}

/// Talks to the deployed betting contract over plain JSON-RPC.
/// Transactions go through `eth_sendTransaction`, so the sending account
/// must be managed by the node.
#[derive(Clone)]
pub struct RpcBettingContract {
    client: Client,
    rpc_url: String,
    contract: Address,
}

impl RpcBettingContract {
    pub fn new(cfg: &LedgerCfg, client: Client) -> Result<Self> {
        let contract = cfg
            .contract_address
            .parse::<Address>()
            .context("invalid ledger.contract_address")?;
        Ok(Self {
            client,
            rpc_url: cfg.rpc_url.clone(),
            contract,
        })
    }

    async fn rpc<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let resp = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("requesting {method}"))?;

        if !resp.status().is_success() {
            anyhow::bail!("RPC Error: {}", resp.status());
        }

        let mut body: Value = resp.json().await.context("parsing RPC response")?;

        if let Some(err) = body.get("error") {
            anyhow::bail!("RPC Error Body: {:?}", err);
        }

        let result = body
            .get_mut("result")
            .map(Value::take)
            .ok_or_else(|| anyhow::anyhow!("No result in RPC response"))?;

        serde_json::from_value(result).with_context(|| format!("decoding {method} result"))
    }

    async fn call(&self, calldata: Vec<u8>) -> Result<Vec<u8>> {
        let params = json!([
            {
                "to": self.contract,
                "data": hex::encode_prefixed(calldata)
            },
            "latest"
        ]);
        let result: String = self.rpc("eth_call", params).await?;
        hex::decode(result.trim_start_matches("0x")).context("eth_call returned non-hex data")
    }

    async fn send(&self, from: Address, calldata: Vec<u8>, value: U256) -> Result<TxHash> {
        let params = json!([
            {
                "from": from,
                "to": self.contract,
                "data": hex::encode_prefixed(calldata),
                "value": format!("0x{:x}", value)
            }
        ]);
        let hash: TxHash = self.rpc("eth_sendTransaction", params).await?;
        info!(%from, %hash, "transaction submitted");
        Ok(hash)
    }
}

#[async_trait]
impl LedgerClient for RpcBettingContract {
    async fn list_bet_ids(&self) -> Result<Vec<U256>> {
        let data = self
            .call(FootballBetting::getBetsCall {}.abi_encode())
            .await
            .context("calling getBets")?;
        let ids = Vec::<U256>::abi_decode(&data).context("decoding getBets output")?;
        debug!(count = ids.len(), "fetched bet ids");
        Ok(ids)
    }

    async fn get_bet_record(&self, id: U256) -> Result<RawBetRecord> {
        let data = self
            .call(FootballBetting::betsCall { id }.abi_encode())
            .await
            .with_context(|| format!("calling bets({id})"))?;
        Ok(RawBetRecord::from_abi(&data)?)
    }
}

#[async_trait]
impl BettingContract for RpcBettingContract {
    async fn propose_bet(&self, from: Address, proposal: &Proposal) -> Result<TxHash> {
        let call = FootballBetting::proposeBetCall {
            proof: proposal.proof.clone(),
            accepterStake: proposal.accepter_stake,
            homeScore: U256::from(proposal.home_score),
            awayScore: U256::from(proposal.away_score),
        };
        self.send(from, call.abi_encode(), proposal.proposer_stake)
            .await
            .context("proposeBet")
    }

    async fn accept_bet(&self, from: Address, id: U256, value: U256) -> Result<TxHash> {
        let call = FootballBetting::acceptBetCall { id };
        self.send(from, call.abi_encode(), value)
            .await
            .context("acceptBet")
    }

    async fn cancel_bet(&self, from: Address, id: U256) -> Result<TxHash> {
        let call = FootballBetting::cancelBetCall { id };
        self.send(from, call.abi_encode(), U256::ZERO)
            .await
            .context("cancelBet")
    }

    async fn resolve_bet(&self, from: Address, id: U256, proof: Bytes) -> Result<TxHash> {
        let call = FootballBetting::resolveBetCall { id, proof };
        self.send(from, call.abi_encode(), U256::ZERO)
            .await
            .context("resolveBet")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::record::BetRecord;
    use alloy::primitives::address;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cfg(url: &str) -> LedgerCfg {
        LedgerCfg {
            rpc_url: url.to_string(),
            contract_address: "0x00000000000000000000000000000000000000c0".to_string(),
            ..LedgerCfg::default()
        }
    }

    fn rpc_ok(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": result }))
    }

    #[tokio::test]
    async fn reads_ids_and_records_over_eth_call() {
        let server = MockServer::start().await;

        let ids = vec![U256::from(1u8), U256::from(2u8)];
        Mock::given(method("POST"))
            .and(body_string_contains(hex::encode(FootballBetting::getBetsCall::SELECTOR)))
            .respond_with(rpc_ok(json!(hex::encode_prefixed(ids.abi_encode()))))
            .mount(&server)
            .await;

        let record = BetRecord {
            id: U256::from(2u8),
            proposer: address!("00000000000000000000000000000000000000aa"),
            acceptor: Address::ZERO,
            accepted: false,
            acceptor_stake: U256::from(10u8),
            proposer_stake: U256::from(20u8),
            home_score: 3,
            away_score: 0,
            fixture_id: 42,
            deleted: false,
        };
        let encoded: Vec<u8> = record
            .encode()
            .words
            .iter()
            .flat_map(|w| w.0)
            .collect();
        Mock::given(method("POST"))
            .and(body_string_contains(hex::encode(FootballBetting::betsCall::SELECTOR)))
            .respond_with(rpc_ok(json!(hex::encode_prefixed(encoded))))
            .mount(&server)
            .await;

        let ledger = RpcBettingContract::new(&cfg(&server.uri()), Client::new()).unwrap();
        assert_eq!(ledger.list_bet_ids().await.unwrap(), ids);

        let raw = ledger.get_bet_record(U256::from(2u8)).await.unwrap();
        assert_eq!(BetRecord::decode(&raw).unwrap(), record);
    }

    #[tokio::test]
    async fn rpc_error_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32000, "message": "execution reverted" }
            })))
            .mount(&server)
            .await;

        let ledger = RpcBettingContract::new(&cfg(&server.uri()), Client::new()).unwrap();
        let err = ledger.list_bet_ids().await.unwrap_err();
        assert!(format!("{err:#}").contains("execution reverted"));
    }

    #[tokio::test]
    async fn accept_sends_value_and_returns_hash() {
        let server = MockServer::start().await;
        let hash = TxHash::repeat_byte(0xab);
        Mock::given(method("POST"))
            .and(body_string_contains("eth_sendTransaction"))
            .and(body_string_contains("\"value\":\"0x2a\""))
            .respond_with(rpc_ok(json!(hash)))
            .mount(&server)
            .await;

        let contract = RpcBettingContract::new(&cfg(&server.uri()), Client::new()).unwrap();
        let from = address!("00000000000000000000000000000000000000bb");
        let got = contract
            .accept_bet(from, U256::from(1u8), U256::from(42u8))
            .await
            .unwrap();
        assert_eq!(got, hash);
    }

    #[test]
    fn rejects_bad_contract_address() {
        let mut c = cfg("http://localhost");
        c.contract_address = "not-an-address".into();
        assert!(RpcBettingContract::new(&c, Client::new()).is_err());
    }
}
