use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;

use crate::asset::ErgoBox;
use crate::assembly::{SignedTransaction, UnsignedTransaction};
use crate::error::{Error, Result};

/// Signing capability for a wallet.
///
/// Implementations hold or reach the secrets; the engine only ever sees the
/// signed bytes.
pub trait Prover: Send + Sync {
    /// Sign `tx`. `inputs` are the boxes `tx` spends, in input order.
    fn sign(&self, tx: &UnsignedTransaction, inputs: &[ErgoBox]) -> Result<SignedTransaction>;
}

/// A spending identity: the address funds come from and the capability that
/// signs for it.
pub struct Account {
    pub address: String,
    pub prover: Box<dyn Prover>,
}

impl Account {
    pub fn new(address: impl Into<String>, prover: Box<dyn Prover>) -> Self {
        Self {
            address: address.into(),
            prover,
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest<'a> {
    tx: &'a UnsignedTransaction,
    inputs_raw: Vec<String>,
}

/// Signs through the wallet of an Ergo node (`POST /wallet/transaction/sign`).
///
/// The node wallet must be unlocked and own the input boxes.
pub struct NodeWalletProver {
    base_url: String,
    api_key: String,
    client: Client,
}

impl NodeWalletProver {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }
}

impl Prover for NodeWalletProver {
    fn sign(&self, tx: &UnsignedTransaction, _inputs: &[ErgoBox]) -> Result<SignedTransaction> {
        let url = format!("{}/wallet/transaction/sign", self.base_url);
        // The wallet resolves inputs it owns; raw input bytes are not needed.
        let body = SignRequest {
            tx,
            inputs_raw: Vec::new(),
        };
        let resp = self
            .client
            .post(&url)
            .header("api_key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| Error::Signer(format!("POST /wallet/transaction/sign: {e}")))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .map_err(|e| Error::Signer(format!("POST /wallet/transaction/sign: {e}")))?;
        if !status.is_success() {
            return Err(Error::Signer(format!(
                "node wallet refused to sign: HTTP {status}: {}",
                String::from_utf8_lossy(&bytes)
            )));
        }
        SignedTransaction::from_json_bytes(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProver;

    #[test]
    fn account_debug_hides_prover() {
        let account = Account::new("9addr", Box::new(MockProver::default()));
        let dbg = format!("{account:?}");
        assert!(dbg.contains("9addr"));
        assert!(!dbg.contains("MockProver"));
    }

    #[test]
    fn sign_request_shape() {
        let tx = UnsignedTransaction {
            inputs: vec![],
            data_inputs: vec![],
            outputs: vec![],
        };
        let json = serde_json::to_value(SignRequest { tx: &tx, inputs_raw: vec![] }).unwrap();
        assert!(json["tx"]["dataInputs"].is_array());
        assert!(json["inputsRaw"].as_array().unwrap().is_empty());
    }
}
