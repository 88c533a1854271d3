use crate::types::{GenerateRequest, StatusResponse, SubmitResponse, VideoRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend responded with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("backend response did not include a job id")]
    MissingJobId,

    #[error("completed job did not report a video URL")]
    MissingVideoUrl,

    #[error("job id '{0}' cannot be used as a URL path segment")]
    UnroutableJobId(String),

    #[error("base URL {0} cannot carry a path")]
    NotHierarchical(Url),
}

/// Backend that accepts generation jobs and reports their status.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn submit(&self, request: &GenerateRequest) -> Result<SubmitResponse, ServiceError>;

    async fn query_status(&self, job_id: &str) -> Result<StatusResponse, ServiceError>;

    /// Origin that relative artifact paths are served from.
    fn base_url(&self) -> &Url;
}

/// Turn the `video_url` reported by the backend into a playable location.
pub fn resolve_artifact_url(base_url: &Url, video_url: &str) -> Result<Url, ServiceError> {
    if let Ok(absolute) = Url::parse(video_url) {
        if matches!(absolute.scheme(), "http" | "https") && absolute.has_host() {
            return Ok(absolute);
        }
    }
    let origin = base_url.as_str().trim_end_matches('/');
    let path = video_url.trim();
    let joined = if path.starts_with('/') {
        format!("{origin}{path}")
    } else {
        format!("{origin}/{path}")
    };
    Ok(Url::parse(&joined)?)
}

#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
}

impl Client {
    pub fn new(base_url: Option<&str>) -> Result<Self> {
        let url = base_url
            .map(Url::parse)
            .unwrap_or_else(|| Url::parse(DEFAULT_BASE_URL))
            .context("invalid backend base URL")?;
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, base_url: url })
    }

    pub async fn health_check(&self) -> Result<String> {
        let url = self.endpoint("health").context("failed to build health URL")?;
        let response = self.http.get(url).send().await.context("backend health request failed")?;
        if !response.status().is_success() {
            anyhow::bail!("backend responded with status {}", response.status());
        }
        let body: serde_json::Value =
            response.json().await.context("failed to decode health response")?;
        Ok(body.get("status").and_then(|v| v.as_str()).unwrap_or("unknown").to_string())
    }

    pub async fn list_videos(&self) -> Result<Vec<VideoRecord>, ServiceError> {
        let url = self.endpoint("api/videos")?;
        let response = self.http.get(url).send().await?;
        Self::parse_response(response).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let origin = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{origin}/{path}"))
    }

    /// `api/status/{id}` with the id percent-encoded as a single path segment.
    fn status_url(&self, job_id: &str) -> Result<Url, ServiceError> {
        // the url crate silently drops dot segments
        if matches!(job_id, "" | "." | "..") {
            return Err(ServiceError::UnroutableJobId(job_id.to_string()));
        }
        let mut url = self.endpoint("api/status")?;
        url.path_segments_mut()
            .map_err(|()| ServiceError::NotHierarchical(self.base_url.clone()))?
            .push(job_id);
        Ok(url)
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ServiceError::Api { status: status.as_u16(), body });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl GenerationService for Client {
    async fn submit(&self, request: &GenerateRequest) -> Result<SubmitResponse, ServiceError> {
        let url = self.endpoint("api/generate")?;
        let response = self.http.post(url).json(request).send().await?;
        Self::parse_response(response).await
    }

    async fn query_status(&self, job_id: &str) -> Result<StatusResponse, ServiceError> {
        let url = self.status_url(job_id)?;
        let response = self.http.get(url).send().await?;
        Self::parse_response(response).await
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }
}
