//! Data models for quickmemo.
//!
//! [`Config`] is the single persisted record; its JSON field names are the
//! on-disk names and must stay backward compatible: every field has a default
//! so older records missing newer fields still load.

use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::defaults;
use crate::error::{Error, Result};

// =============================================================================
// ENUMS
// =============================================================================

/// Access scope of a memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    /// Visible to everyone.
    #[default]
    Public,
    /// Only visible to the owner.
    Private,
    /// Visible to signed-in users of the instance.
    Protected,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Private => "PRIVATE",
            Self::Protected => "PROTECTED",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "PUBLIC" => Ok(Self::Public),
            "PRIVATE" => Ok(Self::Private),
            "PROTECTED" => Ok(Self::Protected),
            other => Err(Error::InvalidInput(format!("unknown visibility: {other:?}"))),
        }
    }
}

/// Whether `pending_content` holds a live draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ContentAction {
    #[default]
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "SAVE_TEXT")]
    SaveText,
}

// Older records stored "" or lowercase "save_text"; anything unrecognized
// means no live draft.
impl<'de> Deserialize<'de> for ContentAction {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref().map(str::to_uppercase).as_deref() {
            Some("SAVE_TEXT") => Self::SaveText,
            _ => Self::None,
        })
    }
}

/// Reads `""`, `null` and unknown values as "not initialized".
fn lenient_visibility<'de, D>(deserializer: D) -> std::result::Result<Option<Visibility>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

// =============================================================================
// RESOURCES
// =============================================================================

/// Reference to a server-side uploaded resource awaiting a memo.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Canonical identifier, usually `resources/{id}`.
    #[serde(default)]
    pub name: String,
    /// Fallback identifier used when `name` is empty.
    #[serde(default)]
    pub uid: String,
    /// MIME type of the uploaded file.
    #[serde(default, rename = "type")]
    pub mime_type: String,
}

impl ResourceRef {
    pub fn new(
        name: impl Into<String>,
        uid: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            uid: uid.into(),
            mime_type: mime_type.into(),
        }
    }

    /// A reference is linkable only if it carries a name or a uid.
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() || !self.uid.is_empty()
    }

    /// Name sent to the link endpoint, or `None` for an invalid reference.
    pub fn link_name(&self) -> Option<String> {
        if !self.name.is_empty() {
            if self.name.starts_with(defaults::RESOURCE_PREFIX) {
                Some(self.name.clone())
            } else {
                Some(format!("{}{}", defaults::RESOURCE_PREFIX, self.name))
            }
        } else if !self.uid.is_empty() {
            Some(format!("{}{}", defaults::RESOURCE_PREFIX, self.uid))
        } else {
            None
        }
    }
}

/// Link names of the valid references, in insertion order.
pub fn linkable_names(resources: &[ResourceRef]) -> Vec<String> {
    resources.iter().filter_map(ResourceRef::link_name).collect()
}

// =============================================================================
// CONFIG RECORD
// =============================================================================

/// The single persisted record: credentials plus pending-action state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Server base URL; empty means unconfigured.
    pub api_url: String,
    /// Bearer credential.
    pub api_tokens: String,
    /// User id resolved when credentials were saved.
    pub userid: String,
    /// Default memo visibility; `None` until first initialized.
    #[serde(
        deserialize_with = "lenient_visibility",
        skip_serializing_if = "Option::is_none"
    )]
    pub visibility_default: Option<Visibility>,
    pub pending_content_action: ContentAction,
    pub pending_content: String,
    /// Locator of the file being uploaded; empty outside the upload window.
    pub temp_file_url: String,
    /// Uploaded resources not yet linked, in upload order.
    pub resource_id_list: Vec<ResourceRef>,
}

impl Config {
    pub fn is_configured(&self) -> bool {
        !self.api_url.trim().is_empty()
    }

    /// Effective visibility, `PUBLIC` when never initialized.
    pub fn visibility(&self) -> Visibility {
        self.visibility_default.unwrap_or_default()
    }

    /// Live draft text, if any.
    pub fn draft(&self) -> Option<&str> {
        match self.pending_content_action {
            ContentAction::SaveText if !self.pending_content.is_empty() => {
                Some(&self.pending_content)
            }
            _ => None,
        }
    }

    /// Locator of the outstanding upload, if any.
    pub fn upload_pending(&self) -> Option<&str> {
        if self.temp_file_url.is_empty() {
            None
        } else {
            Some(&self.temp_file_url)
        }
    }
}

/// Shallow-merge update: only the present fields are written.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_tokens: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility_default: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_content_action: Option<ContentAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id_list: Option<Vec<ResourceRef>>,
}

impl PartialConfig {
    /// Clears all four pending-action fields.
    pub fn idle() -> Self {
        Self {
            pending_content_action: Some(ContentAction::None),
            pending_content: Some(String::new()),
            temp_file_url: Some(String::new()),
            resource_id_list: Some(Vec::new()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The present fields as a JSON object keyed by on-disk names.
    pub fn to_json_map(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(Error::Serialization(format!(
                "partial config serialized to non-object: {other}"
            ))),
        }
    }

    /// Applies the present fields to an in-memory record.
    pub fn apply_to(self, config: &mut Config) {
        if let Some(v) = self.api_url {
            config.api_url = v;
        }
        if let Some(v) = self.api_tokens {
            config.api_tokens = v;
        }
        if let Some(v) = self.userid {
            config.userid = v;
        }
        if let Some(v) = self.visibility_default {
            config.visibility_default = Some(v);
        }
        if let Some(v) = self.pending_content_action {
            config.pending_content_action = v;
        }
        if let Some(v) = self.pending_content {
            config.pending_content = v;
        }
        if let Some(v) = self.temp_file_url {
            config.temp_file_url = v;
        }
        if let Some(v) = self.resource_id_list {
            config.resource_id_list = v;
        }
    }
}

// =============================================================================
// REMOTE ENTITIES
// =============================================================================

/// Server endpoint and bearer token used for one remote call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_url: String,
    pub token: String,
}

impl Credentials {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            token: token.into(),
        }
    }

    /// Fails with [`Error::ConfigurationMissing`] when no server is set.
    pub fn from_config(config: &Config) -> Result<Self> {
        if !config.is_configured() {
            return Err(Error::ConfigurationMissing);
        }
        Ok(Self::new(config.api_url.trim(), config.api_tokens.clone()))
    }

    /// Absolute URL of `{base}/api/v1/{path}`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.api_url.trim_end_matches('/'),
            defaults::API_PREFIX,
            path.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_url", &self.api_url)
            .field("token", &if self.token.is_empty() { "" } else { "***" })
            .finish()
    }
}

/// Normalized memo; `name` is always set (`memos/{id}` for legacy servers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    /// Names of attached resources.
    #[serde(default)]
    pub resources: Vec<String>,
}

impl Memo {
    /// Memo name guaranteed to carry the `memos/` prefix.
    pub fn qualified_name(&self) -> String {
        qualify_memo_name(&self.name)
    }
}

/// Prefixes a bare memo id with `memos/`.
pub fn qualify_memo_name(name: &str) -> String {
    if name.starts_with(defaults::MEMO_PREFIX) {
        name.to_string()
    } else {
        format!("{}{}", defaults::MEMO_PREFIX, name)
    }
}

/// Identity resolved from the auth status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Bare id (`1` for `users/1`).
    pub user_id: String,
    /// Full resource name when the server reported one.
    pub name: Option<String>,
}

/// File bytes ready to upload.
#[derive(Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl FilePayload {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

impl fmt::Debug for FilePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePayload")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}
