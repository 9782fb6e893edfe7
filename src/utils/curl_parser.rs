//! Parses a cURL command copied from the portal's browser dev tools into a
//! reusable [`Session`](crate::api::Session): the API origin plus the
//! request headers that carry the user's authentication.

use crate::api::Session;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CurlParseError {
    #[error("could not find a URL in the curl command")]
    MissingUrl,
}

// Hop-by-hop and body-shape headers must not be replayed; multipart uploads
// set their own content-type and length.
const SKIPPED_HEADERS: [&str; 4] = ["content-type", "content-length", "host", "connection"];

#[derive(Clone, Default)]
pub struct CurlParser;

impl CurlParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, curl_text: &str) -> Result<Session, CurlParseError> {
        let url = curl_text
            .split_whitespace()
            .map(|token| token.trim_matches(|c| c == '\'' || c == '"'))
            .find(|token| token.starts_with("http://") || token.starts_with("https://"))
            .ok_or(CurlParseError::MissingUrl)?;

        let base_url = Self::origin_of(url);
        let headers = Self::extract_headers(curl_text);
        Ok(Session { base_url, headers })
    }

    /// `scheme://host[:port]`, dropping the path of whichever request the
    /// user happened to copy.
    fn origin_of(url: &str) -> String {
        let Some(scheme_end) = url.find("://") else {
            return url.to_string();
        };
        let rest = &url[scheme_end + 3..];
        match rest.find('/') {
            Some(path_start) => url[..scheme_end + 3 + path_start].to_string(),
            None => url.to_string(),
        }
    }

    fn extract_headers(curl_text: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for line in curl_text.lines() {
            let line = line.trim_start();
            let Some(raw) = line
                .strip_prefix("-H '")
                .or_else(|| line.strip_prefix("-H \""))
            else {
                continue;
            };
            let content = raw.trim_end_matches('\\').trim_end();
            let content = content
                .trim_end_matches('\'')
                .trim_end_matches('"');

            let Some((key, value)) = content.split_once(": ") else {
                continue;
            };
            let key = key.to_lowercase();
            if SKIPPED_HEADERS.contains(&key.as_str()) {
                continue;
            }
            if let Ok(header_name) = HeaderName::from_str(&key) {
                if let Ok(header_value) = HeaderValue::from_str(value) {
                    headers.insert(header_name, header_value);
                }
            }
        }
        headers
    }
}
