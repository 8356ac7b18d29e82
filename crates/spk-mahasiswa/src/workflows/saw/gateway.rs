//! Boundary to the external service that owns criteria definitions and stores results.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::debug;

use super::criteria::{CriteriaError, CriteriaRegistry};
use crate::config::CriteriaServiceConfig;
use crate::error::ErrorKind;
use crate::table::ScoreTable;

const CSRF_HEADER: &str = "X-CSRF-TOKEN";

/// Supplies a fresh criteria snapshot for each request.
#[async_trait]
pub trait CriteriaSource: Send + Sync {
    async fn fetch(&self) -> Result<CriteriaRegistry, GatewayError>;
}

/// Accepts computed result tables for downstream storage.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn store(&self, kind: ResultKind, rows: &ScoreTable) -> Result<(), GatewayError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Normalized,
    SawResults,
}

impl ResultKind {
    pub fn endpoint(self) -> &'static str {
        match self {
            ResultKind::Normalized => "store-normalized-data",
            ResultKind::SawResults => "store-saw-results",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("criteria unavailable from {endpoint}: {reason}")]
    CriteriaUnavailable { endpoint: String, reason: String },
    #[error("criteria file {path} unreadable: {source}")]
    CriteriaFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("criteria rejected: {0}")]
    InvalidCriteria(#[from] CriteriaError),
    #[error("csrf token unavailable from {endpoint}: {reason}")]
    CredentialUnavailable { endpoint: String, reason: String },
    #[error("{endpoint} rejected results: status={status}, body={body}")]
    Persist {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("{endpoint} unreachable: {source}")]
    PersistUnreachable {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::CriteriaUnavailable { .. }
            | GatewayError::CriteriaFile { .. }
            | GatewayError::InvalidCriteria(_) => ErrorKind::CriteriaUnavailable,
            GatewayError::CredentialUnavailable { .. } => ErrorKind::CredentialUnavailable,
            GatewayError::Persist { .. } | GatewayError::PersistUnreachable { .. } => {
                ErrorKind::DownstreamPersist
            }
            GatewayError::Client(_) => ErrorKind::Internal,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CsrfTokenResponse {
    csrf_token: String,
}

/// HTTP client for the criteria service. Every call shares one timeout and cookie jar.
#[derive(Debug, Clone)]
pub struct HttpCriteriaGateway {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpCriteriaGateway {
    pub fn new(config: &CriteriaServiceConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn csrf_token(&self) -> Result<String, GatewayError> {
        let endpoint = self.url("csrf-token");
        let unavailable = |reason: String| GatewayError::CredentialUnavailable {
            endpoint: endpoint.clone(),
            reason,
        };

        let res = self
            .authorized(self.client.get(&endpoint))
            .send()
            .await
            .map_err(|err| unavailable(err.to_string()))?;
        if !res.status().is_success() {
            return Err(unavailable(format!("status {}", res.status().as_u16())));
        }

        let parsed: CsrfTokenResponse = res
            .json()
            .await
            .map_err(|err| unavailable(err.to_string()))?;
        Ok(parsed.csrf_token)
    }
}

#[async_trait]
impl CriteriaSource for HttpCriteriaGateway {
    async fn fetch(&self) -> Result<CriteriaRegistry, GatewayError> {
        let endpoint = self.url("criteria");
        let unavailable = |reason: String| GatewayError::CriteriaUnavailable {
            endpoint: endpoint.clone(),
            reason,
        };

        let res = self
            .authorized(self.client.get(&endpoint))
            .send()
            .await
            .map_err(|err| unavailable(err.to_string()))?;
        if !res.status().is_success() {
            return Err(unavailable(format!("status {}", res.status().as_u16())));
        }

        let body = res
            .bytes()
            .await
            .map_err(|err| unavailable(err.to_string()))?;
        let registry = CriteriaRegistry::from_json(&body)?;
        debug!(criteria = registry.len(), "criteria fetched");
        Ok(registry)
    }
}

#[async_trait]
impl ResultSink for HttpCriteriaGateway {
    async fn store(&self, kind: ResultKind, rows: &ScoreTable) -> Result<(), GatewayError> {
        let token = self.csrf_token().await?;
        let endpoint = self.url(kind.endpoint());

        let res = self
            .authorized(self.client.post(&endpoint))
            .header(CSRF_HEADER, token)
            .json(rows)
            .send()
            .await
            .map_err(|source| GatewayError::PersistUnreachable {
                endpoint: endpoint.clone(),
                source,
            })?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(GatewayError::Persist {
                endpoint,
                status,
                body,
            });
        }

        debug!(endpoint = %endpoint, rows = rows.len(), "results stored downstream");
        Ok(())
    }
}

/// Criteria read from a local JSON file in the same shape the service returns.
#[derive(Debug, Clone)]
pub struct FileCriteriaSource {
    path: PathBuf,
}

impl FileCriteriaSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl CriteriaSource for FileCriteriaSource {
    async fn fetch(&self) -> Result<CriteriaRegistry, GatewayError> {
        let bytes = std::fs::read(&self.path).map_err(|source| GatewayError::CriteriaFile {
            path: self.path.clone(),
            source,
        })?;
        Ok(CriteriaRegistry::from_json(&bytes)?)
    }
}

/// Sink for offline runs: results stay in the local snapshot only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalOnlySink;

#[async_trait]
impl ResultSink for LocalOnlySink {
    async fn store(&self, kind: ResultKind, rows: &ScoreTable) -> Result<(), GatewayError> {
        debug!(endpoint = kind.endpoint(), rows = rows.len(), "downstream store skipped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn gateway_urls_join_without_double_slashes() {
        let gateway = HttpCriteriaGateway::new(&CriteriaServiceConfig {
            base_url: "http://criteria.test/api/".to_string(),
            api_token: None,
            timeout: Duration::from_secs(2),
        })
        .expect("client builds");
        assert_eq!(gateway.base_url(), "http://criteria.test/api");
        assert_eq!(
            gateway.url(ResultKind::SawResults.endpoint()),
            "http://criteria.test/api/store-saw-results"
        );
    }

    #[test]
    fn error_kinds_follow_failure_source() {
        let persist = GatewayError::Persist {
            endpoint: "store-saw-results".to_string(),
            status: 422,
            body: "invalid".to_string(),
        };
        assert_eq!(persist.kind(), ErrorKind::DownstreamPersist);

        let credential = GatewayError::CredentialUnavailable {
            endpoint: "csrf-token".to_string(),
            reason: "status 500".to_string(),
        };
        assert_eq!(credential.kind(), ErrorKind::CredentialUnavailable);

        let invalid = GatewayError::InvalidCriteria(
            CriteriaRegistry::from_json(b"{}").expect_err("object without data"),
        );
        assert_eq!(invalid.kind(), ErrorKind::CriteriaUnavailable);
    }

    #[tokio::test]
    async fn file_source_reads_local_payload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("criteria.json");
        std::fs::write(
            &path,
            r#"{"data": [{"criteria_group": "Akademik", "sub_criteria": "IPK", "type": "benefit", "weight": "0.7"}]}"#,
        )
        .expect("write criteria");

        let registry = FileCriteriaSource::new(&path).fetch().await.expect("fetches");
        assert_eq!(registry.get("Akademik", "IPK").map(|spec| spec.weight), Some(0.7));

        let missing = FileCriteriaSource::new(dir.path().join("absent.json"))
            .fetch()
            .await
            .expect_err("missing file");
        assert_eq!(missing.kind(), ErrorKind::CriteriaUnavailable);
    }
}
