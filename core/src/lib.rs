//! Generic async REST client.
//!
//! # Overview
//! `RestClient` sends a request to any absolute http(s) address, optionally
//! with a bearer token and a body, and returns the response body as text or
//! deserialized from JSON. One client is meant to be built at startup and
//! shared for the life of the process.
//!
//! # Design
//! - Requests are described as plain data (`HttpRequest` / `HttpResponse`);
//!   `RestClient::build_request` produces one without touching the network.
//! - A `Transport` executes requests. `ReqwestTransport` is the production
//!   implementation; tests substitute their own.
//! - Connection tuning (DNS cache refresh, per-destination connection limit,
//!   connection lease) comes from an explicit `TransportConfig`, never from
//!   process-wide state.
//! - The first request to each address applies that destination's connection
//!   lease exactly once, even under concurrent first requests.
//! - Every non-2xx status is an `ApiError::Http` carrying status and body.
//!
//! ```no_run
//! use rest_core::{ApiClient, Decoding, RequestOptions, RestClient, TransportConfig};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Status {
//!     healthy: bool,
//! }
//!
//! # async fn run() -> rest_core::Result<()> {
//! let client = RestClient::from_config(TransportConfig::default())?;
//! let options = RequestOptions::new().bearer("secret");
//! let status: Status = client
//!     .request_typed("https://api.example.com/status", &options, &Decoding::Structural)
//!     .await?;
//! assert!(status.healthy);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod decode;
pub mod dns;
pub mod error;
pub mod http;
pub mod lease;
pub mod options;
pub mod transport;

pub use client::{ApiClient, RestClient};
pub use config::TransportConfig;
pub use decode::Decoding;
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use options::RequestOptions;
pub use reqwest::Url;
pub use transport::{ReqwestTransport, Transport};
