//! The shared transport that executes `HttpRequest`s.
//!
//! # Design
//! `Transport` is the seam between request building and network I/O. The
//! production implementation, `ReqwestTransport`, keeps one table of
//! destinations keyed by origin (`scheme://host:port`). Each destination has
//! a semaphore bounding in-flight requests and, once a lease has been
//! configured for it, a dedicated connection pool that is dropped and rebuilt
//! when it outlives the lease. Origins without a lease share one pool.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Url;
use tokio::sync::Semaphore;

use crate::config::TransportConfig;
use crate::dns::CachingResolver;
use crate::error::{ApiError, Result};
use crate::http::{HttpRequest, HttpResponse};

/// Executes requests and owns per-destination connection settings.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and read the full response body.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Limit the lifetime of pooled connections to `url`'s origin.
    ///
    /// Called at most once per address by `RestClient`; must not block.
    fn configure_lease(&self, url: &Url, lease: Duration);
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).execute(request).await
    }

    fn configure_lease(&self, url: &Url, lease: Duration) {
        (**self).configure_lease(url, lease)
    }
}

#[derive(Debug)]
struct LeasedPool {
    client: reqwest::Client,
    created_at: Instant,
}

#[derive(Debug)]
struct Lease {
    timeout: Duration,
    pool: Option<LeasedPool>,
    generation: u64,
}

#[derive(Debug)]
struct Destination {
    permits: Arc<Semaphore>,
    lease: Option<Lease>,
}

/// reqwest-backed transport. Build once and share.
#[derive(Debug)]
pub struct ReqwestTransport {
    config: TransportConfig,
    resolver: Arc<CachingResolver>,
    shared: reqwest::Client,
    destinations: Mutex<HashMap<String, Destination>>,
}

impl ReqwestTransport {
    /// # Errors
    /// Returns `ApiError::Config` if `config` is invalid or reqwest cannot
    /// build a client from it.
    pub fn new(config: TransportConfig) -> Result<Self> {
        config.validate()?;
        let resolver = Arc::new(CachingResolver::new(config.dns_refresh()));
        let shared = build_client(&config, &resolver, None)?;
        Ok(Self {
            config,
            resolver,
            shared,
            destinations: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// The lease configured for `url`'s origin, if any.
    pub fn lease_for(&self, url: &Url) -> Option<Duration> {
        let destinations = self.lock_destinations();
        destinations
            .get(&origin_key(url))
            .and_then(|dest| dest.lease.as_ref())
            .map(|lease| lease.timeout)
    }

    /// How many pools have been built for `url`'s leased origin.
    ///
    /// Zero until the first request after `configure_lease`; grows by one
    /// every time an expired pool is recycled.
    pub fn pool_generation(&self, url: &Url) -> u64 {
        let destinations = self.lock_destinations();
        destinations
            .get(&origin_key(url))
            .and_then(|dest| dest.lease.as_ref())
            .map_or(0, |lease| lease.generation)
    }

    fn lock_destinations(&self) -> std::sync::MutexGuard<'_, HashMap<String, Destination>> {
        self.destinations.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn destination<'a>(
        &self,
        destinations: &'a mut HashMap<String, Destination>,
        origin: &str,
    ) -> &'a mut Destination {
        destinations
            .entry(origin.to_string())
            .or_insert_with(|| Destination {
                permits: Arc::new(Semaphore::new(self.config.max_connections_per_host)),
                lease: None,
            })
    }

    /// Pick the client and permit pool for `origin`, recycling an expired
    /// leased pool on the way.
    ///
    /// A replacement pool is built without holding the destinations lock and
    /// only installed if no other caller replaced the pool meanwhile.
    fn checkout(&self, origin: &str) -> Result<(reqwest::Client, Arc<Semaphore>)> {
        let (timeout, seen_generation) = {
            let mut destinations = self.lock_destinations();
            let destination = self.destination(&mut destinations, origin);
            let permits = Arc::clone(&destination.permits);
            match destination.lease.as_ref() {
                None => return Ok((self.shared.clone(), permits)),
                Some(lease) => match lease.pool.as_ref() {
                    Some(pool) if pool.created_at.elapsed() < lease.timeout => {
                        return Ok((pool.client.clone(), permits));
                    }
                    _ => (lease.timeout, lease.generation),
                },
            }
        };

        let fresh = build_client(&self.config, &self.resolver, Some(timeout))?;

        let mut destinations = self.lock_destinations();
        let destination = self.destination(&mut destinations, origin);
        let permits = Arc::clone(&destination.permits);
        let Some(lease) = destination.lease.as_mut() else {
            return Ok((self.shared.clone(), permits));
        };
        if lease.generation == seen_generation {
            if lease.pool.is_some() {
                tracing::debug!(%origin, "connection lease expired, recycling pool");
            }
            lease.pool = Some(LeasedPool {
                client: fresh,
                created_at: Instant::now(),
            });
            lease.generation += 1;
        }
        let client = match lease.pool.as_ref() {
            Some(pool) => pool.client.clone(),
            None => self.shared.clone(),
        };
        Ok((client, permits))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = Url::parse(&request.url).map_err(|e| ApiError::InvalidAddress {
            address: request.url.clone(),
            reason: e.to_string(),
        })?;
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|_| ApiError::InvalidMethod(request.method.to_string()))?;

        let (client, permits) = self.checkout(&origin_key(&url))?;
        let _permit = permits
            .acquire_owned()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let mut builder = client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn configure_lease(&self, url: &Url, lease: Duration) {
        let origin = origin_key(url);
        let mut destinations = self.lock_destinations();
        let destination = self.destination(&mut destinations, &origin);
        match destination.lease.as_mut() {
            Some(existing) => existing.timeout = lease,
            None => {
                destination.lease = Some(Lease {
                    timeout: lease,
                    pool: None,
                    generation: 0,
                });
            }
        }
        drop(destinations);
        tracing::debug!(%origin, ?lease, "configured connection lease");
    }
}

/// `scheme://host:port`, the unit connections are pooled by.
fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}

fn build_client(
    config: &TransportConfig,
    resolver: &Arc<CachingResolver>,
    idle_timeout: Option<Duration>,
) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .dns_resolver(Arc::clone(resolver))
        .pool_max_idle_per_host(config.max_connections_per_host);
    if let Some(idle) = idle_timeout {
        builder = builder.pool_idle_timeout(idle);
    }
    if let Some(timeout) = config.connect_timeout() {
        builder = builder.connect_timeout(timeout);
    }
    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| ApiError::Config(format!("failed to create HTTP client: {e}")))
}
