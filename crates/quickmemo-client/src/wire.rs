//! Wire shapes of the memo server and their normalization.
//!
//! Everything the server sends passes through one function per entity
//! ([`normalize_memo`], [`normalize_resource`], [`parse_auth_user`],
//! [`parse_tag_counts`]); nothing outside this module touches raw bodies.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use quickmemo_core::{defaults, AuthUser, Error, Memo, ResourceRef, Result, Visibility};

/// Legacy numeric or string identifier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LegacyId {
    Number(i64),
    Text(String),
}

impl LegacyId {
    fn into_string(self) -> Option<String> {
        match self {
            Self::Number(n) => Some(n.to_string()),
            Self::Text(s) if !s.is_empty() => Some(s),
            Self::Text(_) => None,
        }
    }
}

/// Memo as sent by current (`name`) or legacy (`id`, `resourceList`) servers.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawMemo {
    pub name: Option<String>,
    pub id: Option<LegacyId>,
    pub uid: Option<String>,
    pub content: Option<String>,
    pub visibility: Option<String>,
    pub creator: Option<String>,
    pub create_time: Option<String>,
    pub resources: Vec<RawResource>,
    pub resource_list: Vec<RawResource>,
}

/// Resource as sent by current or legacy servers.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawResource {
    pub name: Option<String>,
    pub uid: Option<String>,
    pub id: Option<LegacyId>,
    #[serde(rename = "type")]
    pub mime_type: Option<String>,
    pub filename: Option<String>,
}

impl RawResource {
    fn identifier(&self) -> Option<String> {
        self.name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| self.uid.clone().filter(|u| !u.is_empty()))
            .or_else(|| self.id.clone().and_then(LegacyId::into_string))
    }
}

impl RawMemo {
    /// Resolve the canonical name, falling back to `memos/{id}`.
    pub fn into_memo(self) -> Result<Memo> {
        let name = match (self.name.filter(|n| !n.is_empty()), self.id) {
            (Some(name), _) => name,
            (None, Some(id)) => match id.into_string() {
                Some(id) => format!("{}{}", defaults::MEMO_PREFIX, id),
                None => return Err(missing_memo_identity()),
            },
            (None, None) => return Err(missing_memo_identity()),
        };

        let resources = self
            .resources
            .iter()
            .chain(self.resource_list.iter())
            .filter_map(RawResource::identifier)
            .collect();

        Ok(Memo {
            name,
            uid: self.uid,
            content: self.content.unwrap_or_default(),
            visibility: self.visibility.and_then(|v| v.parse::<Visibility>().ok()),
            creator: self.creator,
            create_time: self.create_time,
            resources,
        })
    }
}

fn missing_memo_identity() -> Error {
    Error::MalformedResponse("memo response has neither name nor id".to_string())
}

/// Strip the first matching envelope key (`data`, `resource`, ...).
pub fn unwrap_envelope(body: Value, keys: &[&str]) -> Value {
    if let Value::Object(ref map) = body {
        for key in keys {
            if let Some(inner @ Value::Object(_)) = map.get(*key) {
                return inner.clone();
            }
        }
    }
    body
}

fn decode<T: for<'de> Deserialize<'de>>(body: Value, what: &str) -> Result<T> {
    if !body.is_object() {
        return Err(Error::MalformedResponse(format!(
            "{} response is not an object",
            what
        )));
    }
    serde_json::from_value(body)
        .map_err(|e| Error::MalformedResponse(format!("{} response: {}", what, e)))
}

/// Normalize a create/link memo response.
pub fn normalize_memo(body: Value) -> Result<Memo> {
    let raw: RawMemo = decode(unwrap_envelope(body, &["data", "memo"]), "memo")?;
    raw.into_memo()
}

/// Like [`normalize_memo`], but names the memo `fallback_name` when the
/// server echoed no identity (some link endpoints answer with a partial body).
pub fn normalize_memo_or(body: Value, fallback_name: &str) -> Result<Memo> {
    let mut raw: RawMemo = decode(unwrap_envelope(body, &["data", "memo"]), "memo")?;
    if raw.name.as_deref().map_or(true, str::is_empty) && raw.id.is_none() {
        raw.name = Some(fallback_name.to_string());
    }
    raw.into_memo()
}

/// Normalize an upload response into a staged reference.
///
/// A response with no identifier at all still yields a reference; it is
/// filtered out when linking.
pub fn normalize_resource(body: Value) -> Result<ResourceRef> {
    let raw: RawResource = decode(unwrap_envelope(body, &["data", "resource"]), "resource")?;
    let uid = raw
        .uid
        .clone()
        .filter(|u| !u.is_empty())
        .or_else(|| raw.id.clone().and_then(LegacyId::into_string))
        .unwrap_or_default();

    Ok(ResourceRef {
        name: raw.name.unwrap_or_default(),
        uid,
        mime_type: raw.mime_type.unwrap_or_default(),
    })
}

/// Extract the user id from an auth status response
/// (`{"name": "users/1"}` or legacy `{"id": 1}`).
pub fn parse_auth_user(body: Value) -> Result<AuthUser> {
    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct RawUser {
        name: Option<String>,
        id: Option<LegacyId>,
    }

    let raw: RawUser = decode(unwrap_envelope(body, &["data", "user"]), "auth status")?;

    if let Some(name) = raw.name.as_deref() {
        if let Some(id) = name.strip_prefix(defaults::USER_PREFIX) {
            if !id.is_empty() {
                return Ok(AuthUser {
                    user_id: id.to_string(),
                    name: Some(name.to_string()),
                });
            }
        }
    }

    match raw.id.and_then(LegacyId::into_string) {
        Some(user_id) => Ok(AuthUser {
            user_id,
            name: raw.name,
        }),
        None => Err(Error::Auth("token did not resolve to a user".to_string())),
    }
}

/// Read `tagCount` (bare or `data`-wrapped) from a user stats response.
pub fn parse_tag_counts(body: &Value) -> BTreeMap<String, u64> {
    let counts = body
        .get("tagCount")
        .or_else(|| body.get("data").and_then(|d| d.get("tagCount")));

    counts
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(tag, count)| count.as_u64().map(|c| (tag.clone(), c)))
                .collect()
        })
        .unwrap_or_default()
}
