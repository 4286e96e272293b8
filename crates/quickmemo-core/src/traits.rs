//! Core traits for quickmemo abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, so the state machine can run against a real file and
//! server or against in-memory fakes.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// CONFIG STORE
// =============================================================================

/// Key-value persistence for the [`Config`] record.
///
/// `read` merges the stored record with defaults and has no side effects.
/// `write` shallow-merges the present fields and is atomic per call. A single
/// logical writer is assumed; read-modify-write compositions below are not
/// guarded against concurrent writers.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Current record merged with defaults.
    async fn read(&self) -> Result<Config>;

    /// Shallow-merge the present fields of `partial`.
    async fn write(&self, partial: PartialConfig) -> Result<()>;

    /// Overwrite the draft and mark it live.
    async fn set_draft(&self, text: &str) -> Result<()> {
        self.write(PartialConfig {
            pending_content_action: Some(ContentAction::SaveText),
            pending_content: Some(text.to_string()),
            ..Default::default()
        })
        .await
    }

    /// Append to the draft and mark it live. Returns the new draft.
    async fn append_draft(&self, text: &str) -> Result<String> {
        let mut content = self.read().await?.pending_content;
        content.push_str(text);
        self.set_draft(&content).await?;
        Ok(content)
    }

    /// Record the locator of an upload about to start.
    async fn mark_upload(&self, locator: &str) -> Result<()> {
        self.write(PartialConfig {
            temp_file_url: Some(locator.to_string()),
            ..Default::default()
        })
        .await
    }

    /// Clear the upload locator, leaving draft and staged resources alone.
    async fn clear_upload_mark(&self) -> Result<()> {
        self.write(PartialConfig {
            temp_file_url: Some(String::new()),
            ..Default::default()
        })
        .await
    }

    /// Append a resource to the staged list.
    async fn append_resource(&self, resource: ResourceRef) -> Result<()> {
        let mut list = self.read().await?.resource_id_list;
        list.push(resource);
        self.write(PartialConfig {
            resource_id_list: Some(list),
            ..Default::default()
        })
        .await
    }

    /// Append a resource and clear the upload locator in one write.
    async fn stage_resource(&self, resource: ResourceRef) -> Result<()> {
        let mut list = self.read().await?.resource_id_list;
        list.push(resource);
        self.write(PartialConfig {
            temp_file_url: Some(String::new()),
            resource_id_list: Some(list),
            ..Default::default()
        })
        .await
    }

    /// Drop the draft only.
    async fn reset_text(&self) -> Result<()> {
        self.write(PartialConfig {
            pending_content_action: Some(ContentAction::None),
            pending_content: Some(String::new()),
            ..Default::default()
        })
        .await
    }

    /// Clear all pending-action fields.
    async fn reset_all(&self) -> Result<()> {
        self.write(PartialConfig::idle()).await
    }
}

// =============================================================================
// MEMO SERVICE
// =============================================================================

/// Remote memo server operations.
///
/// Implementations are stateless with respect to credentials: every call
/// receives them, so the store stays the single source of truth. An empty
/// `api_url` must fail with `Error::ConfigurationMissing` before any request.
#[async_trait]
pub trait MemoService: Send + Sync {
    /// Resolve the user behind the token.
    async fn auth_status(&self, creds: &Credentials) -> Result<AuthUser>;

    /// Create a memo; the returned memo always carries a name.
    async fn create_memo(
        &self,
        creds: &Credentials,
        content: &str,
        visibility: Visibility,
    ) -> Result<Memo>;

    /// Upload a file as a resource.
    async fn upload_resource(&self, creds: &Credentials, file: &FilePayload)
        -> Result<ResourceRef>;

    /// Attach staged resources to a memo. Invalid references are dropped;
    /// fails with `Error::NoValidResource` when none remain.
    async fn link_resources(
        &self,
        creds: &Credentials,
        memo_name: &str,
        resources: &[ResourceRef],
    ) -> Result<Memo>;

    /// Tag usage counts for a user; empty when the server reports none.
    async fn get_tags(&self, creds: &Credentials, user_id: &str)
        -> Result<BTreeMap<String, u64>>;

    /// Download a remote file (image captures).
    async fn fetch_file(&self, url: &str) -> Result<FilePayload>;
}
