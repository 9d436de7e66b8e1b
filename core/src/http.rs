//! HTTP request and response types as plain data.
//!
//! # Design
//! `RestClient::build_request` produces an `HttpRequest` without touching the
//! network, and a `Transport` turns it into an `HttpResponse`. Keeping both
//! sides as owned data lets request construction be tested on its own and
//! lets tests swap the transport for an in-memory fake.

use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

/// HTTP method for a request.
///
/// Parsing is case-insensitive, so `"post"` and `"POST"` both yield
/// `HttpMethod::Post`. Any other valid token is kept as `Extension`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Extension(String),
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Extension(name) => name.as_str(),
        }
    }
}

impl FromStr for HttpMethod {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let method = match upper.as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            "" => return Err(ApiError::InvalidMethod(s.to_string())),
            other if other.bytes().all(is_token_byte) => HttpMethod::Extension(other.to_string()),
            _ => return Err(ApiError::InvalidMethod(s.to_string())),
        };
        Ok(method)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RFC 9110 `tchar`.
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// An HTTP request described as plain data.
///
/// `url` is always an absolute URI; `RestClient` validates it before building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup. Returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup. Returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parsing_is_case_insensitive() {
        assert_eq!("post".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert_eq!("Delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert_eq!(" get ".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
    }

    #[test]
    fn unknown_token_becomes_extension() {
        let method: HttpMethod = "purge".parse().unwrap();
        assert_eq!(method, HttpMethod::Extension("PURGE".to_string()));
        assert_eq!(method.as_str(), "PURGE");
    }

    #[test]
    fn invalid_method_is_rejected() {
        assert!(matches!(
            "not a method".parse::<HttpMethod>(),
            Err(ApiError::InvalidMethod(_))
        ));
        assert!(matches!("".parse::<HttpMethod>(), Err(ApiError::InvalidMethod(_))));
    }

    #[test]
    fn default_method_is_get() {
        assert_eq!(HttpMethod::default(), HttpMethod::Get);
    }

    #[test]
    fn success_range() {
        let mut response = HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: String::new(),
        };
        assert!(response.is_success());
        response.status = 301;
        assert!(!response.is_success());
        response.status = 199;
        assert!(!response.is_success());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: "http://localhost/".to_string(),
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
            body: None,
        };
        assert_eq!(request.header("content-type"), Some("text/plain"));
        assert_eq!(request.header("authorization"), None);

        let response = HttpResponse {
            status: 200,
            headers: vec![("content-length".to_string(), "5".to_string())],
            body: "hello".to_string(),
        };
        assert_eq!(response.header("Content-Length"), Some("5"));
    }
}
