//! Reservation client trait, HTTP implementation and in-memory fake.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use domain::ReservationRequest;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;

/// Header carrying the order ID so the endpoint can drop duplicate deliveries.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Longest response body kept in a [`ReservationError::Rejected`].
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Successful reservation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationAck {
    /// HTTP status returned by the endpoint.
    pub status: u16,
}

/// Errors from a reservation call.
#[derive(Debug, Error)]
pub enum ReservationError {
    /// The endpoint could not be reached.
    #[error("Reservation transport error: {0}")]
    Transport(String),

    /// No response within the allowed time.
    #[error("Reservation timed out after {0:?}")]
    Timeout(Duration),

    /// The endpoint answered with a non-success status.
    #[error("Reservation rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The request could not be encoded.
    #[error("Failed to encode reservation request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ReservationError {
    /// Returns true for failures a later attempt may not hit.
    ///
    /// Only throttling (429) and server-side (5xx) rejections qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReservationError::Transport(_) | ReservationError::Timeout(_) => true,
            ReservationError::Rejected { status, .. } => {
                *status == 429 || (500..600).contains(status)
            }
            ReservationError::Encode(_) => false,
        }
    }
}

/// Synchronous "reserve these items" call to the delivery subsystem.
///
/// Implementations make exactly one attempt; retries are layered on top.
#[async_trait]
pub trait ReservationClient: Send + Sync {
    /// Sends the reservation request, giving up after `timeout`.
    async fn reserve(
        &self,
        request: &ReservationRequest,
        timeout: Duration,
    ) -> Result<ReservationAck, ReservationError>;
}

#[async_trait]
impl<T: ReservationClient + ?Sized> ReservationClient for Arc<T> {
    async fn reserve(
        &self,
        request: &ReservationRequest,
        timeout: Duration,
    ) -> Result<ReservationAck, ReservationError> {
        (**self).reserve(request, timeout).await
    }
}

/// Where the reservation endpoint lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationClientConfig {
    pub base_url: String,
    pub path: String,
}

impl ReservationClientConfig {
    pub const DEFAULT_PATH: &'static str = "api/CreateDeliveryItem";

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path: Self::DEFAULT_PATH.to_string(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Full endpoint URL.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }
}

/// Reservation client posting JSON to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpReservationClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReservationClient {
    pub fn new(config: &ReservationClientConfig) -> Result<Self, ReservationError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ReservationError::Transport(format!("Failed to build client: {e}")))?;
        Ok(Self::with_client(client, config))
    }

    /// Uses an existing client, sharing its connection pool.
    pub fn with_client(client: reqwest::Client, config: &ReservationClientConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReservationClient for HttpReservationClient {
    #[tracing::instrument(skip_all, fields(order_id = %request.order_id, endpoint = %self.endpoint))]
    async fn reserve(
        &self,
        request: &ReservationRequest,
        timeout: Duration,
    ) -> Result<ReservationAck, ReservationError> {
        let body = serde_json::to_vec(request)?;

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(timeout)
            .header(CONTENT_TYPE, "application/json")
            .header(IDEMPOTENCY_KEY_HEADER, request.order_id.to_string())
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReservationError::Timeout(timeout)
                } else {
                    ReservationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(status = status.as_u16(), "reservation accepted");
            return Ok(ReservationAck {
                status: status.as_u16(),
            });
        }

        Err(ReservationError::Rejected {
            status: status.as_u16(),
            body: rejection_body(response.text().await),
        })
    }
}

/// Truncated error body for logs, or a marker saying why it could not be read.
fn rejection_body(text: reqwest::Result<String>) -> String {
    match text {
        Ok(body) => body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        Err(e) => format!("<unreadable body: {e}>"),
    }
}

#[derive(Debug, Default)]
struct InMemoryReservationState {
    requests: Vec<ReservationRequest>,
    reject_with: Option<u16>,
    latency: Duration,
}

/// In-memory reservation client for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReservationClient {
    state: Arc<Mutex<InMemoryReservationState>>,
    fail_transport: Arc<AtomicBool>,
}

impl InMemoryReservationClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every call with this non-success status, or accepts again with `None`.
    pub fn set_reject_with(&self, status: Option<u16>) {
        self.lock().reject_with = status;
    }

    /// Fails every call as if the endpoint were unreachable.
    pub fn set_fail_transport(&self, fail: bool) {
        self.fail_transport.store(fail, Ordering::SeqCst);
    }

    /// Delays every answer. Calls slower than their timeout fail with `Timeout`.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    /// Returns the number of requests the endpoint received.
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Returns every request the endpoint received, oldest first.
    pub fn requests(&self) -> Vec<ReservationRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryReservationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ReservationClient for InMemoryReservationClient {
    async fn reserve(
        &self,
        request: &ReservationRequest,
        timeout: Duration,
    ) -> Result<ReservationAck, ReservationError> {
        if self.fail_transport.load(Ordering::SeqCst) {
            return Err(ReservationError::Transport(
                "connection refused".to_string(),
            ));
        }

        let latency = self.lock().latency;
        if latency > timeout {
            tokio::time::sleep(timeout).await;
            return Err(ReservationError::Timeout(timeout));
        }
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.lock();
        state.requests.push(request.clone());
        match state.reject_with {
            Some(status) => Err(ReservationError::Rejected {
                status,
                body: "reservation refused".to_string(),
            }),
            None => Ok(ReservationAck { status: 200 }),
        }
    }
}
