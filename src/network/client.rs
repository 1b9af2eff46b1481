//! HTTP client wrapper - executes prepared requests and collects responses

use std::future::pending;
use std::time::{Duration, Instant};

use base64::Engine;
use futures_util::StreamExt;
use tokio::sync::oneshot;

use crate::error::TransportError;
use crate::models::Auth;
use crate::network::request::PreparedRequest;

/// Completed HTTP exchange
#[derive(Clone, Debug)]
pub struct ExecutionResult {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub bytes: usize,
    pub time_ms: u64,
}

/// Issues requests through a shared reqwest client
#[derive(Clone, Debug)]
pub struct HttpExecutor {
    client: reqwest::Client,
}

impl HttpExecutor {
    pub fn new(timeout: Duration) -> Self {
        HttpExecutor {
            client: create_client(timeout),
        }
    }

    /// Execute a request, bounded only by the client timeout
    pub async fn execute(
        &self,
        request: &PreparedRequest,
    ) -> Result<ExecutionResult, TransportError> {
        self.run(request, None).await
    }

    /// Execute a request that is abandoned as soon as `cancel_rx` fires.
    /// Dropping the sender without sending does not cancel.
    pub async fn execute_cancellable(
        &self,
        request: &PreparedRequest,
        cancel_rx: oneshot::Receiver<()>,
    ) -> Result<ExecutionResult, TransportError> {
        self.run(request, Some(cancel_rx)).await
    }

    async fn run(
        &self,
        request: &PreparedRequest,
        cancel_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<ExecutionResult, TransportError> {
        let cancelled = async move {
            match cancel_rx {
                Some(rx) => {
                    if rx.await.is_err() {
                        pending::<()>().await;
                    }
                }
                None => pending::<()>().await,
            }
        };
        tokio::pin!(cancelled);

        let start = Instant::now();
        let req_builder = build_request(&self.client, request)?;
        tracing::info!(url = %request.url, method = %request.method, "Executing request");

        let response = tokio::select! {
            biased;
            _ = &mut cancelled => return Err(TransportError::Cancelled),
            result = req_builder.send() => result?,
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();

        let mut stream = response.bytes_stream();
        let mut body = Vec::new();
        loop {
            tokio::select! {
                biased;
                _ = &mut cancelled => {
                    tracing::info!(url = %request.url, "Request cancelled");
                    return Err(TransportError::Cancelled);
                }
                chunk = stream.next() => match chunk {
                    Some(Ok(bytes)) => body.extend_from_slice(&bytes),
                    Some(Err(e)) => return Err(TransportError::from(e)),
                    None => break,
                }
            }
        }

        let time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(status, bytes = body.len(), time_ms, "Request completed");

        Ok(ExecutionResult {
            status,
            headers,
            bytes: body.len(),
            body: String::from_utf8_lossy(&body).into_owned(),
            time_ms,
        })
    }
}

/// Build a reqwest request from a prepared request
fn build_request(
    client: &reqwest::Client,
    request: &PreparedRequest,
) -> Result<reqwest::RequestBuilder, TransportError> {
    let method = reqwest::Method::from_bytes(request.method.as_bytes())
        .map_err(|_| TransportError::InvalidMethod(request.method.clone()))?;
    let mut req_builder = client.request(method, request.url.as_str());

    for (key, value) in &request.headers {
        req_builder = req_builder.header(key, value);
    }

    match &request.auth {
        Some(Auth::BasicAuth { username, password })
            if !username.is_empty() && !password.is_empty() =>
        {
            let credentials = format!("{}:{}", username, password);
            let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
            req_builder = req_builder.header("Authorization", format!("Basic {}", encoded));
        }
        Some(Auth::BearerToken { token }) => {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", token));
        }
        Some(Auth::ApiKey {
            header_name,
            header_value,
        }) if !header_name.is_empty() => {
            req_builder = req_builder.header(header_name, header_value);
        }
        _ => {}
    }

    if !request.body.is_empty() {
        req_builder = req_builder.body(request.body.clone());
    }

    Ok(req_builder)
}

/// Pretty-print JSON bodies, pass anything else through
pub fn format_body(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => serde_json::to_string_pretty(&json).unwrap_or_else(|_| body.to_string()),
        Err(_) => body.to_string(),
    }
}

/// Create an HTTP client with the given timeout
pub fn create_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
