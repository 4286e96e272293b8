//! Scriptable in-memory memo server for testing.
//!
//! ```rust
//! use quickmemo_actions::mock::{Failure, MockMemoService};
//!
//! let service = MockMemoService::new()
//!     .with_user("1")
//!     .failing_create(Failure::Network);
//! assert!(service.calls().is_empty());
//! ```

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quickmemo_core::{
    defaults, linkable_names, AuthUser, Credentials, Error, FilePayload, Memo, MemoService,
    ResourceRef, Result, Visibility,
};

/// Kind of error a scripted call fails with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Network,
    Auth,
    Malformed,
}

impl Failure {
    fn to_error(self, op: &str) -> Error {
        match self {
            Failure::Network => Error::Network(format!("{} failed (mock)", op)),
            Failure::Auth => Error::Auth(format!("{} rejected (mock)", op)),
            Failure::Malformed => Error::MalformedResponse(format!("{} garbled (mock)", op)),
        }
    }
}

/// A recorded service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    AuthStatus { api_url: String },
    CreateMemo { content: String, visibility: Visibility },
    Upload { filename: String, mime_type: String, len: usize },
    Link { memo: String, names: Vec<String> },
    GetTags { user_id: String },
    FetchFile { url: String },
}

#[derive(Debug, Default)]
struct MockState {
    user_id: Option<String>,
    memo_name: Option<String>,
    uploads: Vec<ResourceRef>,
    upload_count: usize,
    tags: BTreeMap<String, u64>,
    remote_files: HashMap<String, FilePayload>,
    failures: HashMap<&'static str, Failure>,
}

/// Mock [`MemoService`] recording every call.
#[derive(Clone, Default)]
pub struct MockMemoService {
    state: Arc<Mutex<MockState>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockMemoService {
    pub fn new() -> Self {
        Self::default()
    }

    /// User id returned by `auth_status`.
    pub fn with_user(self, user_id: impl Into<String>) -> Self {
        lock(&self.state).user_id = Some(user_id.into());
        self
    }

    /// Name of the memo returned by `create_memo` (default `memos/1`).
    pub fn with_memo_name(self, name: impl Into<String>) -> Self {
        lock(&self.state).memo_name = Some(name.into());
        self
    }

    /// Queue a resource returned by the next `upload_resource`; once the
    /// queue is empty uploads return `resources/{n}`.
    pub fn with_upload(self, resource: ResourceRef) -> Self {
        lock(&self.state).uploads.push(resource);
        self
    }

    pub fn with_tags<I, K>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
        K: Into<String>,
    {
        lock(&self.state).tags = tags.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self
    }

    /// Serve `file` for `fetch_file(url)`.
    pub fn with_remote_file(self, url: impl Into<String>, file: FilePayload) -> Self {
        lock(&self.state).remote_files.insert(url.into(), file);
        self
    }

    pub fn failing_auth(self, failure: Failure) -> Self {
        self.failing("auth_status", failure)
    }

    pub fn failing_create(self, failure: Failure) -> Self {
        self.failing("create_memo", failure)
    }

    pub fn failing_upload(self, failure: Failure) -> Self {
        self.failing("upload_resource", failure)
    }

    pub fn failing_link(self, failure: Failure) -> Self {
        self.failing("link_resources", failure)
    }

    pub fn failing_tags(self, failure: Failure) -> Self {
        self.failing("get_tags", failure)
    }

    fn failing(self, op: &'static str, failure: Failure) -> Self {
        lock(&self.state).failures.insert(op, failure);
        self
    }

    /// All recorded calls, oldest first.
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.call_log).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.call_log).clear()
    }

    /// Number of calls that reached the (mock) network.
    pub fn remote_call_count(&self) -> usize {
        lock(&self.call_log).len()
    }

    pub fn create_calls(&self) -> Vec<(String, Visibility)> {
        lock(&self.call_log)
            .iter()
            .filter_map(|c| match c {
                MockCall::CreateMemo {
                    content,
                    visibility,
                } => Some((content.clone(), *visibility)),
                _ => None,
            })
            .collect()
    }

    pub fn link_calls(&self) -> Vec<(String, Vec<String>)> {
        lock(&self.call_log)
            .iter()
            .filter_map(|c| match c {
                MockCall::Link { memo, names } => Some((memo.clone(), names.clone())),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: MockCall) {
        lock(&self.call_log).push(call);
    }

    fn check(&self, op: &'static str) -> Result<()> {
        match lock(&self.state).failures.get(op) {
            Some(failure) => Err(failure.to_error(op)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MemoService for MockMemoService {
    async fn auth_status(&self, creds: &Credentials) -> Result<AuthUser> {
        if creds.api_url.trim().is_empty() {
            return Err(Error::ConfigurationMissing);
        }
        self.record(MockCall::AuthStatus {
            api_url: creds.api_url.clone(),
        });
        self.check("auth_status")?;

        let user_id = lock(&self.state)
            .user_id
            .clone()
            .ok_or_else(|| Error::Auth("token did not resolve to a user".to_string()))?;
        Ok(AuthUser {
            name: Some(format!("{}{}", defaults::USER_PREFIX, user_id)),
            user_id,
        })
    }

    async fn create_memo(
        &self,
        creds: &Credentials,
        content: &str,
        visibility: Visibility,
    ) -> Result<Memo> {
        if creds.api_url.trim().is_empty() {
            return Err(Error::ConfigurationMissing);
        }
        self.record(MockCall::CreateMemo {
            content: content.to_string(),
            visibility,
        });
        self.check("create_memo")?;

        let name = lock(&self.state)
            .memo_name
            .clone()
            .unwrap_or_else(|| "memos/1".to_string());
        Ok(Memo {
            name,
            uid: None,
            content: content.to_string(),
            visibility: Some(visibility),
            creator: None,
            create_time: None,
            resources: Vec::new(),
        })
    }

    async fn upload_resource(
        &self,
        creds: &Credentials,
        file: &FilePayload,
    ) -> Result<ResourceRef> {
        if creds.api_url.trim().is_empty() {
            return Err(Error::ConfigurationMissing);
        }
        self.record(MockCall::Upload {
            filename: file.filename.clone(),
            mime_type: file.mime_type.clone(),
            len: file.data.len(),
        });
        self.check("upload_resource")?;

        let mut state = lock(&self.state);
        state.upload_count += 1;
        if state.uploads.is_empty() {
            Ok(ResourceRef::new(
                format!("{}{}", defaults::RESOURCE_PREFIX, state.upload_count),
                "",
                file.mime_type.clone(),
            ))
        } else {
            Ok(state.uploads.remove(0))
        }
    }

    async fn link_resources(
        &self,
        creds: &Credentials,
        memo_name: &str,
        resources: &[ResourceRef],
    ) -> Result<Memo> {
        if creds.api_url.trim().is_empty() {
            return Err(Error::ConfigurationMissing);
        }
        let names = linkable_names(resources);
        if names.is_empty() {
            return Err(Error::NoValidResource);
        }
        self.record(MockCall::Link {
            memo: memo_name.to_string(),
            names: names.clone(),
        });
        self.check("link_resources")?;

        Ok(Memo {
            name: memo_name.to_string(),
            uid: None,
            content: String::new(),
            visibility: None,
            creator: None,
            create_time: None,
            resources: names,
        })
    }

    async fn get_tags(
        &self,
        creds: &Credentials,
        user_id: &str,
    ) -> Result<BTreeMap<String, u64>> {
        if creds.api_url.trim().is_empty() {
            return Err(Error::ConfigurationMissing);
        }
        self.record(MockCall::GetTags {
            user_id: user_id.to_string(),
        });
        self.check("get_tags")?;
        Ok(lock(&self.state).tags.clone())
    }

    async fn fetch_file(&self, url: &str) -> Result<FilePayload> {
        self.record(MockCall::FetchFile {
            url: url.to_string(),
        });
        lock(&self.state)
            .remote_files
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Network(format!("download returned 404 Not Found: {}", url)))
    }
}
