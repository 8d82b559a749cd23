//! kDrive API client with request/response handling.

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::api::types::{ApiErrorBody, parse_envelope};
use crate::error::{KdriveError, Result};
use crate::http::HttpClient;
use crate::store::{ByteStream, ListingPage, RemoteEntry, RemoteStore};

/// Base URL of the Infomaniak API.
pub const DEFAULT_API_BASE: &str = "https://api.infomaniak.com";

/// Children requested per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// Retries after the first attempt for 429/5xx answers.
pub const DEFAULT_MAX_RETRIES: u32 = 1;

const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

/// kDrive API client.
#[derive(Debug, Clone)]
pub struct KdriveClient {
    http: HttpClient,
    api_base: Url,
    page_size: usize,
    max_retries: u32,
}

/// Statuses worth another attempt.
fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Build the error for a non-success response body.
///
/// kDrive usually answers with an error envelope; anything else is reported
/// by status code.
pub(crate) fn error_from_body(status: u16, body: &str) -> KdriveError {
    #[derive(Deserialize)]
    struct ErrorOnly {
        error: Option<ApiErrorBody>,
    }

    match serde_json::from_str::<ErrorOnly>(body) {
        Ok(ErrorOnly { error: Some(error) }) => error.into(),
        _ => KdriveError::HttpError(status),
    }
}

impl KdriveClient {
    /// Create a client for the public Infomaniak API.
    pub fn new(token: &str) -> Result<Self> {
        Self::with_http(HttpClient::new(token)?)
    }

    /// Create a client on top of an already configured transport.
    pub fn with_http(http: HttpClient) -> Result<Self> {
        Ok(Self {
            http,
            api_base: Url::parse(DEFAULT_API_BASE)?,
            page_size: DEFAULT_PAGE_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Point the client at another API host.
    pub fn with_api_base(mut self, api_base: &str) -> Result<Self> {
        let url = Url::parse(api_base)?;
        if url.cannot_be_a_base() {
            return Err(KdriveError::InvalidConfig(format!(
                "API base cannot be a base URL: {}",
                api_base
            )));
        }
        self.api_base = url;
        Ok(self)
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// `{base}/{segments...}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| KdriveError::InvalidConfig(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn file_endpoint(&self, version: &str, drive_id: &str, node_id: &str, tail: &[&str]) -> Result<Url> {
        let mut segments = vec![version, "drive", drive_id, "files", node_id];
        segments.extend_from_slice(tail);
        self.endpoint(&segments)
    }

    pub(crate) fn list_url(&self, drive_id: &str, node_id: &str, cursor: Option<&str>) -> Result<Url> {
        let mut url = self.file_endpoint("3", drive_id, node_id, &["files"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &self.page_size.to_string());
            if let Some(cursor) = cursor {
                query.append_pair("cursor", cursor);
            }
        }
        Ok(url)
    }

    pub(crate) fn upload_url(&self, drive_id: &str, parent_id: &str, name: &str, len: usize) -> Result<Url> {
        let mut url = self.endpoint(&["3", "drive", drive_id, "upload"])?;
        url.query_pairs_mut()
            .append_pair("total_size", &len.to_string())
            .append_pair("file_name", name)
            .append_pair("directory_id", parent_id)
            .append_pair("conflict", "version");
        Ok(url)
    }

    /// Send a request, retrying 429/5xx with exponential backoff.
    ///
    /// `build` is called once per attempt since a sent request is consumed.
    async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut delay = INITIAL_BACKOFF;
        let mut attempts = 0u32;

        loop {
            let response = self.http.execute(build()).await?;
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            if is_retryable(status) {
                if attempts >= self.max_retries {
                    warn!(status = status.as_u16(), attempts, "giving up after retries");
                    return Err(KdriveError::ServerBusy);
                }
                attempts += 1;
                warn!(
                    status = status.as_u16(),
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    "retrying request"
                );
                sleep(delay).await;
                delay *= 2;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(error_from_body(status.as_u16(), &body));
        }
    }

    /// Send and read the body as text.
    async fn send_text<F>(&self, build: F) -> Result<String>
    where
        F: Fn() -> RequestBuilder,
    {
        Ok(self.send(build).await?.text().await?)
    }
}

#[async_trait]
impl RemoteStore for KdriveClient {
    async fn list_children_page(
        &self,
        drive_id: &str,
        node_id: &str,
        cursor: Option<&str>,
    ) -> Result<ListingPage> {
        let url = self.list_url(drive_id, node_id, cursor)?;
        debug!(drive = drive_id, node = node_id, cursor = ?cursor, "GET children");

        let body = self
            .send_text(|| self.http.request(Method::GET, url.clone()))
            .await?;
        let envelope = parse_envelope::<Vec<RemoteEntry>>(&body)?;

        Ok(ListingPage {
            entries: envelope.data.unwrap_or_default(),
            cursor: envelope.cursor,
            has_more: envelope.has_more,
        })
    }

    async fn create_folder(
        &self,
        drive_id: &str,
        parent_id: &str,
        name: &str,
    ) -> Result<RemoteEntry> {
        let url = self.file_endpoint("3", drive_id, parent_id, &["directory"])?;
        let payload = json!({ "name": name });
        debug!(drive = drive_id, parent = parent_id, folder = name, "POST directory");

        let body = self
            .send_text(|| self.http.request(Method::POST, url.clone()).json(&payload))
            .await?;
        parse_envelope::<RemoteEntry>(&body)?.into_data()
    }

    async fn upload_content(
        &self,
        drive_id: &str,
        parent_id: &str,
        name: &str,
        data: Vec<u8>,
    ) -> Result<RemoteEntry> {
        let url = self.upload_url(drive_id, parent_id, name, data.len())?;
        debug!(drive = drive_id, parent = parent_id, file_name = name, bytes = data.len(), "POST upload");

        let body = self
            .send_text(|| {
                self.http
                    .request(Method::POST, url.clone())
                    .header(CONTENT_TYPE, "application/octet-stream")
                    .body(data.clone())
            })
            .await?;
        parse_envelope::<RemoteEntry>(&body)?.into_data()
    }

    async fn download_content(&self, drive_id: &str, node_id: &str) -> Result<ByteStream> {
        let url = self.file_endpoint("2", drive_id, node_id, &["download"])?;
        debug!(drive = drive_id, node = node_id, "GET download");

        let response = self
            .send(|| self.http.request(Method::GET, url.clone()))
            .await?;
        Ok(response.bytes_stream().map_err(KdriveError::from).boxed())
    }

    async fn rename_node(&self, drive_id: &str, node_id: &str, new_name: &str) -> Result<()> {
        let url = self.file_endpoint("2", drive_id, node_id, &["rename"])?;
        let payload = json!({ "name": new_name });
        debug!(drive = drive_id, node = node_id, new_name, "POST rename");

        let body = self
            .send_text(|| self.http.request(Method::POST, url.clone()).json(&payload))
            .await?;
        parse_envelope::<Value>(&body)?;
        Ok(())
    }

    async fn move_node(&self, drive_id: &str, node_id: &str, new_parent_id: &str) -> Result<()> {
        let url = self.file_endpoint("3", drive_id, node_id, &["move", new_parent_id])?;
        debug!(drive = drive_id, node = node_id, parent = new_parent_id, "POST move");

        let body = self
            .send_text(|| self.http.request(Method::POST, url.clone()))
            .await?;
        parse_envelope::<Value>(&body)?;
        Ok(())
    }

    async fn delete_node(&self, drive_id: &str, node_id: &str) -> Result<()> {
        let url = self.file_endpoint("2", drive_id, node_id, &[])?;
        debug!(drive = drive_id, node = node_id, "DELETE file");

        let body = self
            .send_text(|| self.http.request(Method::DELETE, url.clone()))
            .await?;
        parse_envelope::<Value>(&body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiErrorCode;

    fn client() -> KdriveClient {
        KdriveClient::new("secret").unwrap()
    }

    #[test]
    fn test_client_defaults() {
        let client = client();
        assert_eq!(client.api_base().as_str(), "https://api.infomaniak.com/");
        assert_eq!(client.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(client.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_list_url() {
        let client = client().with_page_size(50);
        assert_eq!(
            client.list_url("497955", "5", None).unwrap().as_str(),
            "https://api.infomaniak.com/3/drive/497955/files/5/files?limit=50"
        );
        assert_eq!(
            client.list_url("497955", "5", Some("a b&c")).unwrap().as_str(),
            "https://api.infomaniak.com/3/drive/497955/files/5/files?limit=50&cursor=a+b%26c"
        );
    }

    #[test]
    fn test_file_endpoints() {
        let client = client();
        assert_eq!(
            client.file_endpoint("2", "1", "42", &["download"]).unwrap().as_str(),
            "https://api.infomaniak.com/2/drive/1/files/42/download"
        );
        assert_eq!(
            client.file_endpoint("3", "1", "42", &["move", "10"]).unwrap().as_str(),
            "https://api.infomaniak.com/3/drive/1/files/42/move/10"
        );
        assert_eq!(
            client.file_endpoint("2", "1", "42", &[]).unwrap().as_str(),
            "https://api.infomaniak.com/2/drive/1/files/42"
        );
    }

    #[test]
    fn test_upload_url_encodes_name() {
        let client = client();
        let url = client.upload_url("1", "10", "my file.txt", 2048).unwrap();
        assert_eq!(url.path(), "/3/drive/1/upload");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("total_size".to_string(), "2048".to_string()),
                ("file_name".to_string(), "my file.txt".to_string()),
                ("directory_id".to_string(), "10".to_string()),
                ("conflict".to_string(), "version".to_string()),
            ]
        );
    }

    #[test]
    fn test_api_base_with_prefix() {
        let client = client().with_api_base("http://localhost:8080/proxy/").unwrap();
        assert_eq!(
            client.file_endpoint("2", "1", "7", &[]).unwrap().as_str(),
            "http://localhost:8080/proxy/2/drive/1/files/7"
        );
        assert!(self::client().with_api_base("mailto:x@y").is_err());
        assert!(self::client().with_api_base("not a url").is_err());
    }

    #[test]
    fn test_error_from_body() {
        let err = error_from_body(
            404,
            r#"{"result":"error","error":{"code":"object_not_found","description":"Object not found"}}"#,
        );
        assert_eq!(err.api_code(), Some(ApiErrorCode::ObjectNotFound));
        assert!(err.is_not_found());

        assert!(matches!(error_from_body(401, "<html>"), KdriveError::HttpError(401)));
        assert!(matches!(error_from_body(400, "{}"), KdriveError::HttpError(400)));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
    }
}
