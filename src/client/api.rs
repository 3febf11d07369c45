//! HTTP client for the gateway RPC surface.
//!
//! Carries the mutual-TLS identity plus the credential headers the gateway's
//! auth chain expects. All calls decode the standard response envelope.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::messages::{
    error_codes, ApiResponse, BalanceData, HistoryData, PaymentRequest, RegisterRequest,
    TransactionRecord, TransactionStatus, UnregisterRequest,
};
use crate::tls::ClientTlsMaterial;

const USERNAME_HEADER: &str = "x-username";
const PASSWORD_HEADER: &str = "x-password";
const CALL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum ClientError {
    /// The gateway could not be reached or the call did not complete.
    #[error("transport error: {0}")]
    Transport(String),

    /// The gateway answered with an error envelope.
    #[error("gateway rejected the request (code {code}): {message}")]
    Rejected { code: i32, message: String },

    /// The gateway answered 2xx but the envelope made no sense.
    #[error("protocol error: {0}")]
    Protocol(String),
}

#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl GatewayClient {
    /// Mutual-TLS client: presents the client certificate and pins the
    /// shared CA.
    pub fn new(
        gateway_addr: &str,
        username: &str,
        password: &str,
        tls: &ClientTlsMaterial,
    ) -> anyhow::Result<Self> {
        let identity = reqwest::Identity::from_pem(&tls.identity_pem)?;
        let ca = reqwest::Certificate::from_pem(&tls.ca_pem)?;
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .identity(identity)
            .add_root_certificate(ca)
            .timeout(CALL_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url(gateway_addr, true),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Plaintext client, for loopback tests and private-network tooling.
    pub fn insecure(gateway_addr: &str, username: &str, password: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(CALL_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url(gateway_addr, false),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub async fn register(
        &self,
        req: &RegisterRequest,
    ) -> Result<TransactionStatus, ClientError> {
        let resp = self
            .http
            .post(format!("{}/register", self.base_url))
            .json(req)
            .send()
            .await
            .map_err(transport)?;
        decode(resp).await
    }

    pub async fn unregister(&self, username: &str) -> Result<TransactionStatus, ClientError> {
        let resp = self
            .authed(self.http.post(format!("{}/unregister", self.base_url)))
            .json(&UnregisterRequest {
                username: username.to_string(),
            })
            .send()
            .await
            .map_err(transport)?;
        decode(resp).await
    }

    pub async fn get_balance(&self, username: &str) -> Result<Decimal, ClientError> {
        let resp = self
            .authed(self.http.get(format!("{}/balance", self.base_url)))
            .query(&[("username", username)])
            .send()
            .await
            .map_err(transport)?;
        let data: BalanceData = decode(resp).await?;
        Ok(data.balance)
    }

    pub async fn get_history(
        &self,
        username: &str,
    ) -> Result<Vec<TransactionRecord>, ClientError> {
        let resp = self
            .authed(self.http.get(format!("{}/history", self.base_url)))
            .query(&[("username", username)])
            .send()
            .await
            .map_err(transport)?;
        let data: HistoryData = decode(resp).await?;
        Ok(data.records)
    }

    pub async fn process_payment(
        &self,
        req: &PaymentRequest,
    ) -> Result<TransactionStatus, ClientError> {
        let resp = self
            .authed(self.http.post(format!("{}/payments", self.base_url)))
            .json(req)
            .send()
            .await
            .map_err(transport)?;
        decode(resp).await
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header(USERNAME_HEADER, &self.username)
            .header(PASSWORD_HEADER, &self.password)
    }
}

fn base_url(addr: &str, tls: bool) -> String {
    if addr.starts_with("http://") || addr.starts_with("https://") {
        addr.trim_end_matches('/').to_string()
    } else if tls {
        format!("https://{addr}")
    } else {
        format!("http://{addr}")
    }
}

fn transport(e: reqwest::Error) -> ClientError {
    ClientError::Transport(e.to_string())
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    let body: ApiResponse<T> = resp
        .json()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;

    if status.is_success() && body.code == error_codes::SUCCESS {
        body.data
            .ok_or_else(|| ClientError::Protocol("missing data in success envelope".to_string()))
    } else {
        Err(ClientError::Rejected {
            code: body.code,
            message: body
                .msg
                .unwrap_or_else(|| format!("HTTP status {status}")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_normalization() {
        assert_eq!(base_url("localhost:50051", true), "https://localhost:50051");
        assert_eq!(base_url("localhost:50051", false), "http://localhost:50051");
        assert_eq!(
            base_url("https://gw.example.com/", true),
            "https://gw.example.com"
        );
    }
}
