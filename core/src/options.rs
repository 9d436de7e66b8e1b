//! Per-request options.
//!
//! `RequestOptions` replaces a string-keyed parameter bag with typed fields.
//! `from_map` still accepts the bag form (`method`, `bearer`, `content`,
//! `content-type`) for callers that build options dynamically.

use std::collections::HashMap;

use crate::error::ApiError;
use crate::http::HttpMethod;

/// Content type used for request bodies when none is given.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Optional settings for a single request. `Default` is a plain GET.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub bearer: Option<String>,
    pub content: Option<String>,
    pub content_type: Option<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn content(mut self, body: impl Into<String>) -> Self {
        self.content = Some(body.into());
        self
    }

    pub fn content_type(mut self, mime: impl Into<String>) -> Self {
        self.content_type = Some(mime.into());
        self
    }

    /// The content type sent with `content`, falling back to JSON.
    pub fn effective_content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// Build options from a string-keyed map. Unrecognized keys are ignored.
    ///
    /// # Errors
    /// Returns `ApiError::InvalidMethod` if `method` is not a valid token.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, ApiError> {
        let method = match map.get("method") {
            Some(text) => text.parse()?,
            None => HttpMethod::Get,
        };
        Ok(Self {
            method,
            bearer: map.get("bearer").cloned(),
            content: map.get("content").cloned(),
            content_type: map.get("content-type").cloned(),
        })
    }
}

impl TryFrom<&HashMap<String, String>> for RequestOptions {
    type Error = ApiError;

    fn try_from(map: &HashMap<String, String>) -> Result<Self, Self::Error> {
        Self::from_map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_map_is_default_get() {
        let options = RequestOptions::from_map(&HashMap::new()).unwrap();
        assert_eq!(options, RequestOptions::default());
        assert_eq!(options.method, HttpMethod::Get);
    }

    #[test]
    fn recognized_keys_are_read() {
        let options = RequestOptions::from_map(&map(&[
            ("method", "post"),
            ("bearer", "tok123"),
            ("content", r#"{"a":1}"#),
            ("content-type", "text/plain"),
        ]))
        .unwrap();
        assert_eq!(options.method, HttpMethod::Post);
        assert_eq!(options.bearer.as_deref(), Some("tok123"));
        assert_eq!(options.content.as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(options.effective_content_type(), "text/plain");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let options = RequestOptions::from_map(&map(&[("timeout", "5"), ("Method", "PUT")])).unwrap();
        assert_eq!(options, RequestOptions::default());
    }

    #[test]
    fn bad_method_is_an_error() {
        let err = RequestOptions::try_from(&map(&[("method", "GET /")])).unwrap_err();
        assert!(matches!(err, ApiError::InvalidMethod(_)));
    }

    #[test]
    fn content_type_defaults_to_json() {
        let options = RequestOptions::new().content("{}");
        assert_eq!(options.effective_content_type(), DEFAULT_CONTENT_TYPE);
    }
}
