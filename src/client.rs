//! Async daemon RPC client.
//!
//! One call is one authenticated HTTP POST. Nothing is pooled or cached: a
//! fresh HTTP client is built for every call and dropped when the call
//! returns, whatever the outcome.
//!
//! # Example
//!
//! ```no_run
//! use daemon_rpc::{Credentials, RpcClient};
//!
//! # async fn run() -> daemon_rpc::Result<()> {
//! let client = RpcClient::new(Credentials::new("http://127.0.0.1:8332", "user", "pass"));
//! let count = client.call("getblockcount", Vec::<String>::new()).await?;
//! let hash = client.call("getblockhash", [count.to_string()]).await?;
//! println!("{}", hash);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::time::Duration;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::rpc::{RpcRequest, RpcResponse};

/// Endpoint and HTTP Basic credentials (realm "jsonrpc") for a daemon.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything a call needs before touching the network.
pub(crate) struct Prepared {
    pub url: Url,
    pub request: RpcRequest,
    pub body: Vec<u8>,
}

/// Validates the endpoint and encodes the envelope. Any failure here happens
/// before a connection is attempted.
pub(crate) fn prepare<I, S>(url: &str, command: &str, params: I) -> Result<Prepared>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let url = parse_url(url)?;
    let request = RpcRequest::new(command, params.into_iter().map(Into::into).collect());
    let body = request.to_vec()?;
    Ok(Prepared { url, request, body })
}

fn parse_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| Error::invalid_url(url, e))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(Error::invalid_url(url, format!("unsupported scheme `{}`", other))),
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(Error::invalid_url(url, "missing host"));
    }
    Ok(parsed)
}

/// The endpoint as it is safe to log: userinfo password removed.
pub(crate) fn loggable(url: &Url) -> Url {
    let mut url = url.clone();
    // only fails for URLs without a host, which parse_url rejects
    let _ = url.set_password(None);
    url
}

/// Builds the per-call HTTP client. Redirects are not followed, so a call is
/// always exactly one POST; a 3xx answer fails in decoding.
fn http_client(timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder()
        .pool_max_idle_per_host(0)
        .redirect(Policy::none());
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Decodes a raw body into the call outcome. Shared by the async and
/// blocking transports.
pub(crate) fn decode_response(status: StatusCode, body: &[u8]) -> Result<Value> {
    debug!(%status, len = body.len(), "received RPC response");
    let response = RpcResponse::from_slice(body).map_err(|err| {
        warn!(%status, error = %err, "undecodable RPC response");
        err
    })?;
    response.into_result()
}

/// A daemon endpoint with its credentials captured, so many calls can share
/// them. Holds no connection state.
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

    /// Caps the whole request, connect through body read. Expiry is reported
    /// as [`Error::Transport`].
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

    /// Invokes `command` with string `params` and returns its `result`.
    ///
    /// Fails with [`Error::Rpc`] when the daemon reports an error, and with one
    /// of the fatal variants when the URL, transport or response shape is bad.
    pub async fn call<I, S>(&self, command: &str, params: I) -> Result<Value>
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

        let client = http_client(self.timeout)?;

        let response = client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, body.len())
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        decode_response(status, &bytes)
    }
}

/// One-shot call with explicit credentials.
pub async fn call<I, S>(
    url: &str,
    username: &str,
    password: &str,
    command: &str,
    params: I,
) -> Result<Value>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    RpcClient::new(Credentials::new(url, username, password))
        .call(command, params)
        .await
}
