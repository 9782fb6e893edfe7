//! Thin REST wrappers around the portal endpoints the client depends on.

use crate::download::OutputFileEntry;
use crate::upload::StorageQuota;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Base URL and request headers captured from the user's browser session.
#[derive(Debug, Clone)]
pub struct Session {
    pub base_url: String,
    pub headers: HeaderMap,
}

impl Session {
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

pub struct PortalClient {
    http: reqwest::Client,
    session: Session,
}

impl PortalClient {
    pub fn new(session: Session) -> Self {
        Self {
            http: reqwest::Client::new(),
            session,
        }
    }

    /// `GET /auth-api/user/upload/info` - the storage quota snapshot.
    pub async fn fetch_quota(&self) -> Result<StorageQuota, ApiError> {
        let url = self.session.endpoint("auth-api/user/upload/info");
        debug!(%url, "fetching storage quota");
        let response = self
            .http
            .get(&url)
            .headers(self.session.headers.clone())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    /// `GET /auth-api/user/project/files` - the flat output listing for one
    /// project.
    pub async fn fetch_outputs(&self, project_code: &str) -> Result<Vec<OutputFileEntry>, ApiError> {
        let url = self.session.endpoint("auth-api/user/project/files");
        debug!(%url, project_code, "fetching output listing");
        let response = self
            .http
            .get(&url)
            .headers(self.session.headers.clone())
            .query(&[("code", project_code)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    /// `POST /auth-api/user/upload/add` - one multipart form per file, with
    /// the field shape the portal expects: `file`, `name`, `type`, `size`.
    pub async fn upload_file(
        &self,
        name: &str,
        extension: &str,
        size_bytes: u64,
        bytes: Vec<u8>,
    ) -> Result<(), ApiError> {
        let url = self.session.endpoint("auth-api/user/upload/add");
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(name.to_string()))
            .text("name", name.to_string())
            .text("type", extension.to_string())
            .text("size", size_bytes.to_string());
        let response = self
            .http
            .post(&url)
            .headers(self.session.headers.clone())
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        Ok(())
    }

    /// Raw bytes of one output file, fetched through its listing URL.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let target = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            self.session.endpoint(url.trim_start_matches('/'))
        };
        let response = self
            .http
            .get(&target)
            .headers(self.session.headers.clone())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_doubling_slashes() {
        let session = Session {
            base_url: "https://edge.example.org/".to_string(),
            headers: HeaderMap::new(),
        };
        assert_eq!(
            session.endpoint("auth-api/user/upload/info"),
            "https://edge.example.org/auth-api/user/upload/info"
        );
    }
}
