//! Outbound RPC to bank servers.
//!
//! The coordinator talks to banks through the `BankService` trait so tests
//! can swap in a scripted mock. The HTTP implementation opens a fresh
//! connection per transaction (no pool) and puts a hard deadline on every
//! call.

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

use crate::messages::{
    AbortRequest, AbortResponse, BankBalanceResponse, CommitRequest, CommitResponse,
    PrepareRequest, PrepareResponse,
};

#[derive(Error, Debug)]
pub enum BankCallError {
    /// The bank could not be reached at all (connect failure).
    #[error("cannot reach bank: {0}")]
    Unreachable(String),

    /// The bank answered 404 for an account lookup.
    #[error("account not found")]
    NotFound,

    /// Any other transport, timeout or protocol failure.
    #[error("bank call failed: {0}")]
    Failed(String),
}

/// RPC surface of a bank participant, addressed by `host:port`.
#[async_trait]
pub trait BankService: Send + Sync {
    async fn prepare(
        &self,
        bank_addr: &str,
        req: &PrepareRequest,
    ) -> Result<PrepareResponse, BankCallError>;

    async fn commit(
        &self,
        bank_addr: &str,
        req: &CommitRequest,
    ) -> Result<CommitResponse, BankCallError>;

    async fn abort(
        &self,
        bank_addr: &str,
        req: &AbortRequest,
    ) -> Result<AbortResponse, BankCallError>;

    async fn get_balance(&self, bank_addr: &str, username: &str)
        -> Result<Decimal, BankCallError>;
}

/// Plaintext HTTP client for bank RPCs (gateway and banks share a private
/// network).
pub struct HttpBankClient {
    http: reqwest::Client,
}

impl HttpBankClient {
    /// `timeout` bounds every single call, connect included.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0) // per-transaction connections, no pool
            .build()?;
        Ok(Self { http })
    }

    fn url(bank_addr: &str, path: &str) -> String {
        if bank_addr.starts_with("http://") || bank_addr.starts_with("https://") {
            format!("{bank_addr}{path}")
        } else {
            format!("http://{bank_addr}{path}")
        }
    }

    async fn post_json<Req, Resp>(
        &self,
        bank_addr: &str,
        path: &str,
        req: &Req,
    ) -> Result<Resp, BankCallError>
    where
        Req: serde::Serialize + Sync,
        Resp: serde::de::DeserializeOwned,
    {
        let resp = self
            .http
            .post(Self::url(bank_addr, path))
            .json(req)
            .send()
            .await
            .map_err(classify)?;

        if !resp.status().is_success() {
            return Err(BankCallError::Failed(format!(
                "bank returned status {}",
                resp.status()
            )));
        }

        resp.json::<Resp>().await.map_err(classify)
    }
}

fn classify(e: reqwest::Error) -> BankCallError {
    if e.is_connect() {
        BankCallError::Unreachable(e.to_string())
    } else {
        BankCallError::Failed(e.to_string())
    }
}

#[async_trait]
impl BankService for HttpBankClient {
    async fn prepare(
        &self,
        bank_addr: &str,
        req: &PrepareRequest,
    ) -> Result<PrepareResponse, BankCallError> {
        self.post_json(bank_addr, "/prepare", req).await
    }

    async fn commit(
        &self,
        bank_addr: &str,
        req: &CommitRequest,
    ) -> Result<CommitResponse, BankCallError> {
        self.post_json(bank_addr, "/commit", req).await
    }

    async fn abort(
        &self,
        bank_addr: &str,
        req: &AbortRequest,
    ) -> Result<AbortResponse, BankCallError> {
        self.post_json(bank_addr, "/abort", req).await
    }

    async fn get_balance(
        &self,
        bank_addr: &str,
        username: &str,
    ) -> Result<Decimal, BankCallError> {
        let resp = self
            .http
            .get(Self::url(bank_addr, "/balance"))
            .query(&[("username", username)])
            .send()
            .await
            .map_err(classify)?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(BankCallError::NotFound),
            status if status.is_success() => {
                let body: BankBalanceResponse = resp.json().await.map_err(classify)?;
                Ok(body.balance)
            }
            status => Err(BankCallError::Failed(format!(
                "bank returned status {status}"
            ))),
        }
    }
}


#[cfg(test)]
pub use mock::MockBank;
