//! The REST client and the contract it implements.
//!
//! # Design
//! `RestClient` owns one shared `Transport` and a `LeaseGuard`. Dispatching a
//! request validates the address, applies the destination's connection lease
//! the first time that address is seen, builds an `HttpRequest`, executes it,
//! and turns any non-2xx response into `ApiError::Http`. Building is split
//! out as `build_request` so it can be checked without a network.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::config::{defaults, TransportConfig};
use crate::decode::Decoding;
use crate::error::{ApiError, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::lease::LeaseGuard;
use crate::options::RequestOptions;
use crate::transport::{ReqwestTransport, Transport};

/// Issue a request to an address and get back text or typed data.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Returns the raw response body.
    ///
    /// # Errors
    /// `ApiError::Http` for non-2xx statuses, `ApiError::Transport` when the
    /// request could not be sent.
    async fn request_text(&self, address: &str, options: &RequestOptions) -> Result<String>;

    /// Returns the response body deserialized as JSON into `T`.
    ///
    /// # Errors
    /// As `request_text`, plus `ApiError::Deserialization` or
    /// `ApiError::MissingTypeTag` when the body does not fit `T`.
    async fn request_typed<T>(
        &self,
        address: &str,
        options: &RequestOptions,
        decoding: &Decoding,
    ) -> Result<T>
    where
        T: DeserializeOwned + Send;
}

/// Generic REST client over a shared transport.
///
/// Construct one per process and share it (for example behind an `Arc`);
/// connection pools, DNS cache and lease bookkeeping all live on the
/// instance, so creating a client per request throws them away.
#[derive(Debug)]
pub struct RestClient<T = ReqwestTransport> {
    transport: Arc<T>,
    leases: LeaseGuard,
    lease_timeout: Duration,
}

impl RestClient<ReqwestTransport> {
    /// Build a client over a `ReqwestTransport` configured by `config`.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the transport cannot be built.
    pub fn from_config(config: TransportConfig) -> Result<Self> {
        let lease_timeout = config.lease_timeout();
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(transport).with_lease_timeout(lease_timeout))
    }
}

impl<T: Transport> RestClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_shared_transport(Arc::new(transport))
    }

    pub fn with_shared_transport(transport: Arc<T>) -> Self {
        Self {
            transport,
            leases: LeaseGuard::new(),
            lease_timeout: Duration::from_secs(defaults::LEASE_TIMEOUT_SECS),
        }
    }

    /// Lease applied to each newly seen address.
    pub fn with_lease_timeout(mut self, lease_timeout: Duration) -> Self {
        self.lease_timeout = lease_timeout;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn lease_timeout(&self) -> Duration {
        self.lease_timeout
    }

    /// Whether `address` has already had its lease applied.
    pub fn has_seen(&self, address: &str) -> bool {
        self.leases.contains(address)
    }

    /// Build the request `make_request` would send, without sending it.
    ///
    /// # Errors
    /// Returns `ApiError::InvalidAddress` if `address` is not an absolute
    /// http(s) URI.
    pub fn build_request(&self, address: &str, options: &RequestOptions) -> Result<HttpRequest> {
        let url = parse_address(address)?;
        Ok(build_request(&url, options))
    }

    /// Send a request and return the response if its status is 2xx.
    ///
    /// # Errors
    /// `ApiError::InvalidAddress`, `ApiError::Transport`, or `ApiError::Http`
    /// carrying the status and body of a non-2xx response.
    pub async fn make_request(&self, address: &str, options: &RequestOptions) -> Result<HttpResponse> {
        let url = parse_address(address)?;
        if self.leases.ensure(address, || {
            self.transport.configure_lease(&url, self.lease_timeout);
        }) {
            tracing::debug!(address, lease = ?self.lease_timeout, "applied connection lease");
        }

        let request = build_request(&url, options);
        tracing::debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.execute(request).await?;
        check_status(response)
    }
}

#[async_trait]
impl<T: Transport> ApiClient for RestClient<T> {
    async fn request_text(&self, address: &str, options: &RequestOptions) -> Result<String> {
        let response = self.make_request(address, options).await?;
        Ok(response.body)
    }

    async fn request_typed<U>(
        &self,
        address: &str,
        options: &RequestOptions,
        decoding: &Decoding,
    ) -> Result<U>
    where
        U: DeserializeOwned + Send,
    {
        let response = self.make_request(address, options).await?;
        decoding.decode(&response.body)
    }
}

fn parse_address(address: &str) -> Result<Url> {
    let invalid = |reason: String| ApiError::InvalidAddress {
        address: address.to_string(),
        reason,
    };
    let url = Url::parse(address).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

fn build_request(url: &Url, options: &RequestOptions) -> HttpRequest {
    let mut headers = Vec::new();
    if let Some(token) = &options.bearer {
        headers.push(("authorization".to_string(), format!("Bearer {token}")));
    }
    let body = options.content.clone();
    if body.is_some() {
        headers.push((
            "content-type".to_string(),
            options.effective_content_type().to_string(),
        ));
    }
    HttpRequest {
        method: options.method.clone(),
        url: url.to_string(),
        headers,
        body,
    }
}

/// Pass 2xx responses through; every other status becomes `ApiError::Http`.
fn check_status(response: HttpResponse) -> Result<HttpResponse> {
    if response.is_success() {
        return Ok(response);
    }
    tracing::warn!(status = response.status, "request failed");
    Err(ApiError::Http {
        status: response.status,
        body: response.body,
    })
}
