//! REST client for the automation backend.
//!
//! Every backend router has a module of free functions taking `&ApiClient`.
//! Errors are classified into transport failures, non-2xx answers and
//! logical rejections carried inside a 2xx body (`success: false`).

pub mod accounts;
pub mod batch;
pub mod content;
pub mod drafts;
pub mod jobs;
pub mod media;
pub mod preview;
pub mod scheduler;
pub mod types;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::config::Config;

/// Failure of a single backend call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("{0}")]
    Rejected(String),
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Common `{success, data, detail}` wrapper.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    pub data: Option<T>,
    pub detail: Option<String>,
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwrap `data`, turning `success: false` into `ApiError::Rejected`.
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.detail
                    .or(self.message)
                    .unwrap_or_else(|| "request was not accepted".into()),
            ));
        }
        self.data
            .ok_or_else(|| ApiError::Rejected("response carried no data".into()))
    }
}

/// Envelope without a payload; only the outcome matters.
#[derive(Debug, Deserialize)]
pub struct Ack {
    #[serde(default = "default_success")]
    pub success: bool,
    pub detail: Option<String>,
    pub message: Option<String>,
}

impl Ack {
    pub fn into_result(self) -> Result<Option<String>, ApiError> {
        if self.success {
            Ok(self.message)
        } else {
            Err(ApiError::Rejected(
                self.detail
                    .or(self.message)
                    .unwrap_or_else(|| "request was not accepted".into()),
            ))
        }
    }
}

fn default_success() -> bool {
    true
}

/// Shared HTTP client bound to one backend base URL.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    long_timeout: Duration,
    /// Overrides the client-wide timeout for every request when set.
    timeout: Option<Duration>,
}

impl ApiClient {
    pub fn new(cfg: &Config) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(cfg.request_timeout()).build()?;
        let mut api = Self::with_client(http, &cfg.api.base_url);
        api.long_timeout = cfg.long_request_timeout();
        Ok(api)
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            long_timeout: Duration::from_secs(600),
            timeout: None,
        }
    }

    /// The same client for endpoints that answer only after their work is
    /// done; requests made through it wait up to the long timeout.
    pub fn long_running(&self) -> Self {
        Self {
            timeout: Some(self.long_timeout),
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL of a file served by the backend from a local path
    /// (`downloads\audio\x.mp3` -> `{base}/downloads/audio/x.mp3`).
    pub fn asset_url(&self, local_path: &str) -> Option<String> {
        let path = local_path.trim();
        if path.is_empty() {
            return None;
        }
        let normalized = path.replace('\\', "/");
        Some(format!(
            "{}/{}",
            self.base_url,
            normalized.trim_start_matches('/')
        ))
    }

    /// Remote stock URLs pass through; local paths are served by the backend.
    pub fn media_url(&self, url_or_path: &str) -> Option<String> {
        if url_or_path.starts_with("http") {
            Some(url_or_path.to_string())
        } else {
            self.asset_url(url_or_path)
        }
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response, ApiError> {
        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, "api {what}");
        let req = match self.timeout {
            Some(t) => req.timeout(t),
            None => req,
        };
        let resp = req
            .header("x-request-id", request_id.to_string())
            .send()
            .await
            .inspect_err(|e| tracing::warn!(%request_id, "api {what} transport error: {e}"))?;
        ensure_success(resp, &request_id).await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self
            .send(self.http.get(self.url(path)), &format!("GET {path}"))
            .await?;
        decode(resp).await
    }

    pub(crate) async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let resp = self
            .send(
                self.http.get(self.url(path)).query(query),
                &format!("GET {path}"),
            )
            .await?;
        decode(resp).await
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .send(
                self.http.post(self.url(path)).json(body),
                &format!("POST {path}"),
            )
            .await?;
        decode(resp).await
    }

    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self
            .send(self.http.post(self.url(path)), &format!("POST {path}"))
            .await?;
        decode(resp).await
    }

    pub(crate) async fn post_for_bytes<B>(&self, path: &str, body: &B) -> Result<Vec<u8>, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let resp = self
            .send(
                self.http.post(self.url(path)).json(body),
                &format!("POST {path}"),
            )
            .await?;
        Ok(resp.bytes().await?.to_vec())
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        let resp = self
            .send(
                self.http.post(self.url(path)).multipart(form),
                &format!("POST {path}"),
            )
            .await?;
        decode(resp).await
    }

    pub(crate) async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .send(
                self.http.put(self.url(path)).json(body),
                &format!("PUT {path}"),
            )
            .await?;
        decode(resp).await
    }

    pub(crate) async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self
            .send(self.http.delete(self.url(path)), &format!("DELETE {path}"))
            .await?;
        decode(resp).await
    }

    /// DELETE whose body (if any) is ignored.
    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(self.http.delete(self.url(path)), &format!("DELETE {path}"))
            .await?;
        Ok(())
    }
}

/// `GET /api/health`; any 2xx answer counts as reachable.
pub async fn health(api: &ApiClient) -> Result<(), ApiError> {
    let _: serde_json::Value = api.get("/api/health").await?;
    Ok(())
}

/// Percent-encode a user or backend supplied id for use in a path.
pub(crate) fn seg(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Convert non-2xx responses into `ApiError::Status`, preferring the
/// backend's `detail` message over the raw body.
async fn ensure_success(resp: Response, request_id: &Uuid) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = detail_message(&body).unwrap_or(body);
    tracing::warn!(%request_id, "api HTTP {status}: {message}");
    Err(ApiError::Status { status, message })
}

fn detail_message(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    match v.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let text = resp.text().await?;
    serde_json::from_str(&text).map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::with_client(Client::new(), "http://localhost:8000/")
    }

    #[test]
    fn asset_url_normalizes_windows_paths() {
        let api = client();
        assert_eq!(
            api.asset_url(r"downloads\audio\tts_1.mp3").as_deref(),
            Some("http://localhost:8000/downloads/audio/tts_1.mp3")
        );
        assert_eq!(api.asset_url("  "), None);
    }

    #[test]
    fn media_url_passes_remote_urls_through() {
        let api = client();
        assert_eq!(
            api.media_url("https://videos.pexels.com/v/1.mp4").as_deref(),
            Some("https://videos.pexels.com/v/1.mp4")
        );
        assert_eq!(
            api.media_url("/output/clip.mp4").as_deref(),
            Some("http://localhost:8000/output/clip.mp4")
        );
    }

    #[test]
    fn envelope_failure_becomes_rejected() {
        let env: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"success": false, "detail": "topic is required"}"#).unwrap();
        match env.into_data() {
            Err(ApiError::Rejected(m)) => assert_eq!(m, "topic is required"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn envelope_without_success_flag_is_accepted() {
        let env: Envelope<u32> = serde_json::from_str(r#"{"data": 7}"#).unwrap();
        assert_eq!(env.into_data().unwrap(), 7);
    }

    #[test]
    fn detail_message_handles_validation_arrays() {
        assert_eq!(
            detail_message(r#"{"detail":"not found"}"#).as_deref(),
            Some("not found")
        );
        assert!(detail_message(r#"{"detail":[{"loc":["body"]}]}"#)
            .unwrap()
            .contains("loc"));
        assert_eq!(detail_message("<html>"), None);
    }

    #[test]
    fn long_running_client_only_changes_the_timeout() {
        let api = client();
        assert_eq!(api.timeout, None);
        let slow = api.long_running();
        assert_eq!(slow.timeout, Some(Duration::from_secs(600)));
        assert_eq!(slow.base_url(), api.base_url());
    }

    #[test]
    fn seg_encodes_path_ids() {
        assert_eq!(seg("a b/c"), "a%20b%2Fc");
    }
}
