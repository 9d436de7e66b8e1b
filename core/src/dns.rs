//! Name-resolution cache for the reqwest transport.
//!
//! reqwest resolves every new connection through the system resolver with no
//! caching. `CachingResolver` keeps each host's addresses for a fixed refresh
//! interval and looks the name up again once that interval has passed.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use reqwest::dns::{Addrs, Name, Resolve, Resolving};

#[derive(Debug, Clone)]
struct CachedAddrs {
    addrs: Vec<SocketAddr>,
    resolved_at: Instant,
}

/// Caches DNS lookups for `refresh` before resolving again.
#[derive(Debug, Clone)]
pub struct CachingResolver {
    refresh: Duration,
    entries: Arc<Mutex<HashMap<String, CachedAddrs>>>,
}

impl CachingResolver {
    pub fn new(refresh: Duration) -> Self {
        Self {
            refresh,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh
    }

    /// Addresses for `host` if they were resolved less than `refresh` ago.
    fn cached(&self, host: &str) -> Option<Vec<SocketAddr>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(host)
            .filter(|entry| entry.resolved_at.elapsed() < self.refresh)
            .map(|entry| entry.addrs.clone())
    }

    fn store(&self, host: String, addrs: Vec<SocketAddr>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            host,
            CachedAddrs {
                addrs,
                resolved_at: Instant::now(),
            },
        );
    }

    /// Resolve `host`, consulting the cache first.
    pub async fn lookup(&self, host: &str) -> io::Result<Vec<SocketAddr>> {
        if let Some(addrs) = self.cached(host) {
            tracing::trace!(host, "dns cache hit");
            return Ok(addrs);
        }
        tracing::trace!(host, "dns cache miss");
        // Port 0 lets the connector substitute the scheme's port.
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, 0)).await?.collect();
        if addrs.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses found for {host}"),
            ));
        }
        self.store(host.to_string(), addrs.clone());
        Ok(addrs)
    }
}

impl Resolve for CachingResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.clone();
        Box::pin(async move {
            let resolved: Result<Addrs, Box<dyn std::error::Error + Send + Sync>> = resolver
                .lookup(name.as_str())
                .await
                .map(|addrs| Box::new(addrs.into_iter()) as Addrs)
                .map_err(Into::into);
            resolved
        })
    }
}
