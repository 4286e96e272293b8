//! reqwest-backed memo server client.

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use quickmemo_core::{
    defaults, linkable_names, qualify_memo_name, AuthUser, Credentials, Error, FilePayload, Memo,
    MemoService, ResourceRef, Result, Visibility,
};

use crate::wire;

/// Configuration for [`MemosClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Try a multipart upload before the base64 JSON body.
    pub multipart_uploads: bool,
    /// Downloads larger than this are refused.
    pub max_download_bytes: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: defaults::HTTP_TIMEOUT_SECS,
            multipart_uploads: defaults::UPLOAD_MULTIPART,
            max_download_bytes: defaults::MAX_DOWNLOAD_BYTES,
        }
    }
}

impl ClientConfig {
    /// Read overrides from `QUICKMEMO_TIMEOUT` and `QUICKMEMO_MULTIPART`.
    pub fn from_env() -> Self {
        Self {
            timeout_seconds: std::env::var(defaults::ENV_HTTP_TIMEOUT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::HTTP_TIMEOUT_SECS),
            multipart_uploads: std::env::var(defaults::ENV_UPLOAD_MULTIPART)
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults::UPLOAD_MULTIPART),
            ..Self::default()
        }
    }
}

/// Memo server client.
pub struct MemosClient {
    client: Client,
    config: ClientConfig,
}

impl MemosClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            timeout_secs = config.timeout_seconds,
            multipart = config.multipart_uploads,
            "Initializing memo server client"
        );

        Ok(Self { client, config })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn ensure_configured(creds: &Credentials) -> Result<()> {
        if creds.api_url.trim().is_empty() {
            return Err(Error::ConfigurationMissing);
        }
        Ok(())
    }

    /// Attach the bearer token when one is set.
    fn authorize(req: RequestBuilder, creds: &Credentials) -> RequestBuilder {
        if creds.token.is_empty() {
            req
        } else {
            req.header("Authorization", format!("Bearer {}", creds.token))
        }
    }

    async fn send(req: RequestBuilder, op: &str) -> Result<Response> {
        let response = req
            .send()
            .await
            .map_err(|e| Error::Network(format!("{} request failed: {}", op, e)))?;
        check_status(response, op).await
    }

    async fn send_json(req: RequestBuilder, op: &str) -> Result<Value> {
        Self::send(req, op)
            .await?
            .json::<Value>()
            .await
            .map_err(|e| Error::MalformedResponse(format!("{} returned invalid JSON: {}", op, e)))
    }

    async fn upload_multipart(
        &self,
        creds: &Credentials,
        url: &str,
        file: &FilePayload,
    ) -> Result<Option<Value>> {
        let part = multipart::Part::bytes(file.data.clone()).file_name(file.filename.clone());
        let part = match part.mime_str(&file.mime_type) {
            Ok(part) => part,
            Err(_) => multipart::Part::bytes(file.data.clone()).file_name(file.filename.clone()),
        };
        let form = multipart::Form::new().part("file", part);

        let response = Self::authorize(self.client.post(url), creds)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Network(format!("upload request failed: {}", e)))?;

        if !response.status().is_success() {
            warn!(
                status = %response.status(),
                filename = %file.filename,
                "Multipart upload rejected, falling back to base64 body"
            );
            return Ok(None);
        }

        response
            .json::<Value>()
            .await
            .map(Some)
            .map_err(|e| Error::MalformedResponse(format!("upload returned invalid JSON: {}", e)))
    }

    async fn upload_base64(
        &self,
        creds: &Credentials,
        url: &str,
        file: &FilePayload,
    ) -> Result<Value> {
        let body = json!({
            "content": file.to_base64(),
            "filename": file.filename,
            "type": file.mime_type,
        });
        Self::send_json(Self::authorize(self.client.post(url), creds).json(&body), "upload").await
    }
}

async fn check_status(response: Response, op: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = if body.is_empty() {
        format!("{} returned {}", op, status)
    } else {
        format!("{} returned {}: {}", op, status, body.trim())
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Auth(detail)),
        _ => Err(Error::Network(detail)),
    }
}

/// Last non-empty path segment of a URL, if it looks like a file name.
fn filename_from_url(url: &reqwest::Url) -> Option<String> {
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .filter(|s| s.contains('.'))
        .map(str::to_string)
}

#[async_trait]
impl MemoService for MemosClient {
    async fn auth_status(&self, creds: &Credentials) -> Result<AuthUser> {
        Self::ensure_configured(creds)?;
        let url = creds.endpoint("auth/status");
        debug!(url = %url, "Checking token");

        let body = Self::send_json(
            Self::authorize(self.client.post(&url), creds).json(&json!({})),
            "auth status",
        )
        .await?;
        let user = wire::parse_auth_user(body)?;

        info!(user_id = %user.user_id, "Token resolved");
        Ok(user)
    }

    async fn create_memo(
        &self,
        creds: &Credentials,
        content: &str,
        visibility: Visibility,
    ) -> Result<Memo> {
        Self::ensure_configured(creds)?;
        let url = creds.endpoint("memos");
        debug!(len = content.len(), visibility = %visibility, "Creating memo");

        let body = Self::send_json(
            Self::authorize(self.client.post(&url), creds).json(&json!({
                "content": content,
                "visibility": visibility.as_str(),
            })),
            "create memo",
        )
        .await?;
        let memo = wire::normalize_memo(body)?;

        info!(memo = %memo.name, "Memo created");
        Ok(memo)
    }

    async fn upload_resource(
        &self,
        creds: &Credentials,
        file: &FilePayload,
    ) -> Result<ResourceRef> {
        Self::ensure_configured(creds)?;
        let url = creds.endpoint("resources");
        debug!(file = ?file, "Uploading resource");

        let multipart = if self.config.multipart_uploads {
            self.upload_multipart(creds, &url, file).await?
        } else {
            None
        };
        let body = match multipart {
            Some(body) => body,
            None => self.upload_base64(creds, &url, file).await?,
        };

        let resource = wire::normalize_resource(body)?;
        if !resource.is_valid() {
            warn!(filename = %file.filename, "Upload response carried no resource identifier");
        }
        info!(resource = %resource.name, uid = %resource.uid, "Resource uploaded");
        Ok(resource)
    }

    async fn link_resources(
        &self,
        creds: &Credentials,
        memo_name: &str,
        resources: &[ResourceRef],
    ) -> Result<Memo> {
        Self::ensure_configured(creds)?;

        let names = linkable_names(resources);
        if names.is_empty() {
            return Err(Error::NoValidResource);
        }
        if memo_name.trim().is_empty() {
            return Err(Error::InvalidInput("memo name is empty".to_string()));
        }

        let memo = qualify_memo_name(memo_name);
        let url = creds.endpoint(&format!("{}/resources", memo));
        let dropped = resources.len() - names.len();
        debug!(memo = %memo, count = names.len(), dropped, "Linking resources");

        let payload: Vec<Value> = names.iter().map(|n| json!({ "name": n })).collect();
        let body = Self::send_json(
            Self::authorize(self.client.patch(&url), creds).json(&json!({ "resources": payload })),
            "link resources",
        )
        .await?;

        wire::normalize_memo_or(body, &memo)
    }

    async fn get_tags(
        &self,
        creds: &Credentials,
        user_id: &str,
    ) -> Result<BTreeMap<String, u64>> {
        Self::ensure_configured(creds)?;

        let user = if user_id.starts_with(defaults::USER_PREFIX) {
            user_id.to_string()
        } else {
            format!("{}{}", defaults::USER_PREFIX, user_id)
        };
        let url = creds.endpoint(&format!("{}/stats", user));

        let body = Self::send_json(Self::authorize(self.client.get(&url), creds), "user stats")
            .await?;
        let tags = wire::parse_tag_counts(&body);

        debug!(user = %user, tags = tags.len(), "Fetched tag counts");
        Ok(tags)
    }

    async fn fetch_file(&self, url: &str) -> Result<FilePayload> {
        debug!(url = %url, "Downloading file");
        let mut response = Self::send(self.client.get(url), "download").await?;
        let limit = self.config.max_download_bytes;
        if let Some(len) = response.content_length() {
            if len > limit {
                return Err(download_too_large(url, limit));
            }
        }

        let filename = filename_from_url(response.url())
            .unwrap_or_else(|| defaults::FALLBACK_FILENAME.to_string());
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| defaults::FALLBACK_MIME_TYPE.to_string());

        // Content-Length may be absent or wrong, so count as we go.
        let mut data = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::Network(format!("download body failed: {}", e)))?
        {
            if (data.len() + chunk.len()) as u64 > limit {
                return Err(download_too_large(url, limit));
            }
            data.extend_from_slice(&chunk);
        }

        Ok(FilePayload::new(filename, mime_type, data))
    }
}

fn download_too_large(url: &str, limit: u64) -> Error {
    warn!(url = %url, limit, "Download exceeds size limit");
    Error::InvalidInput(format!("{} is larger than {} bytes", url, limit))
}
