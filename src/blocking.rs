//! Synchronous variant of [`crate::client`], for callers without a runtime.
//!
//! Built on `reqwest::blocking`, which must not be driven from inside an async
//! runtime. Use the async [`crate::RpcClient`] there instead.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::redirect::Policy;
use serde_json::Value;
use tracing::debug;

use crate::client::{decode_response, loggable, prepare, Credentials, Prepared};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct RpcClient {
    credentials: Credentials,
    timeout: Option<Duration>,
}

impl RpcClient {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn call<I, S>(&self, command: &str, params: I) -> Result<Value>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let Prepared { url, request, body } = prepare(&self.credentials.url, command, params)?;
        debug!(
            method = %request.method,
            params = request.params.len(),
            url = %loggable(&url),
            "sending RPC request"
        );

        // reqwest::blocking applies a 30s default; unset means no limit here.
        let client = Client::builder()
            .pool_max_idle_per_host(0)
            .redirect(Policy::none())
            .timeout(self.timeout)
            .build()?;

        let response = client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, body.len())
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .body(body)
            .send()?;

        let status = response.status();
        let bytes = response.bytes()?;
        decode_response(status, &bytes)
    }
}

/// Blocking one-shot call with explicit credentials.
pub fn call<I, S>(url: &str, username: &str, password: &str, command: &str, params: I) -> Result<Value>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    RpcClient::new(Credentials::new(url, username, password)).call(command, params)
}
