//! The HTTP side of a collection cycle.

use crate::request::BatchRequest;
use eyre::{
    eyre,
    Context as _,
    Result,
};
use reqwest::header::CONTENT_TYPE;
use std::{
    future::Future,
    pin::Pin,
    time::Duration,
};

/// Status line and body of an agent's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            reason: "OK".to_string(),
            body: body.into(),
        }
    }
}

/// Sends a batch to its agent. An `Err` is a transport failure (connect, timeout, I/O);
/// any HTTP answer, whatever its status, is `Ok`.
pub trait JolokiaClient: Send + Sync {
    fn send<'a>(&'a self, request: &'a BatchRequest) -> Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + 'a>>;
}

/// reqwest-backed client shared by every cycle.
///
/// `response_header_timeout` bounds the wait for the status line and headers after the
/// request went out, `client_timeout` bounds the whole exchange including the body. A zero
/// duration disables a limit.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    response_header_timeout: Option<Duration>,
}

impl HttpClient {
    pub fn new(response_header_timeout: Duration, client_timeout: Duration) -> Result<Self> {
        let mut builder =
            reqwest::Client::builder().user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if !client_timeout.is_zero() {
            builder = builder.timeout(client_timeout);
        }
        let client = builder.build().wrap_err("failed to build HTTP client")?;

        Ok(Self {
            client,
            response_header_timeout: (!response_header_timeout.is_zero()).then_some(response_header_timeout),
        })
    }
}

impl JolokiaClient for HttpClient {
    fn send<'a>(&'a self, request: &'a BatchRequest) -> Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + 'a>> {
        Box::pin(async move {
            let body = request.body().wrap_err("failed to encode request body")?;
            // reqwest turns the url userinfo into a basic auth header.
            let pending = self
                .client
                .post(request.url().clone())
                .header(CONTENT_TYPE, "application/json")
                .body(body)
                .send();

            let response = match self.response_header_timeout {
                Some(limit) => tokio::time::timeout(limit, pending)
                    .await
                    .map_err(|_| eyre!("no response headers within {}", humantime::format_duration(limit)))??,
                None => pending.await?,
            };

            let status = response.status();
            let body = response.text().await.wrap_err("failed to read response body")?;
            Ok(RawResponse {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                body,
            })
        })
    }
}
