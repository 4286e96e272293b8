//! The pending-action state machine.
//!
//! State lives entirely in the [`ConfigStore`]; [`PendingActions`] holds no
//! fields of its own beyond its collaborators, so a process can be torn down
//! between any two calls and the next one picks up where the store says.
//!
//! Ordering rules:
//! - an upload's locator is persisted before the file is read or the
//!   network is touched;
//! - editor text passed to [`PendingActions::submit`] is persisted before
//!   the memo is created;
//! - remote failures leave the draft and staged resources untouched.

use chrono::Local;
use std::path::Path;
use tracing::{debug, info, warn};

use quickmemo_core::{
    defaults, linkable_names, Config, ConfigStore, Credentials, Error, FilePayload, Memo,
    MemoService, PartialConfig, ResourceRef, Result, Visibility,
};

use crate::capture::{detect_mime, timestamped_filename, Capture, UploadSource};
use crate::notice::Notice;
use crate::outcome::{
    CredentialsOutcome, LinkReport, PopupView, SubmitOutcome, TagsOutcome, UploadOutcome,
    UploadTicket,
};

/// Independent pending-action flags derived from a [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingState {
    pub draft_pending: bool,
    pub upload_in_flight: bool,
    pub resources_staged: bool,
}

impl PendingState {
    pub fn of(config: &Config) -> Self {
        Self {
            draft_pending: config.draft().is_some(),
            upload_in_flight: config.upload_pending().is_some(),
            resources_staged: !config.resource_id_list.is_empty(),
        }
    }

    pub fn is_idle(&self) -> bool {
        !self.draft_pending && !self.upload_in_flight && !self.resources_staged
    }
}

/// Drives captures, uploads and submits against a store and a memo server.
pub struct PendingActions<S, C> {
    store: S,
    service: C,
}

impl<S: ConfigStore, C: MemoService> PendingActions<S, C> {
    pub fn new(store: S, service: C) -> Self {
        Self { store, service }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn service(&self) -> &C {
        &self.service
    }

    /// Read the record for display, initializing the default visibility the
    /// first time it is missing.
    pub async fn open(&self) -> Result<PopupView> {
        let mut config = self.store.read().await?;

        if config.visibility_default.is_none() {
            self.store
                .write(PartialConfig {
                    visibility_default: Some(Visibility::default()),
                    ..Default::default()
                })
                .await?;
            config.visibility_default = Some(Visibility::default());
            info!(visibility = %Visibility::default(), "Initialized default visibility");
        }

        let state = PendingState::of(&config);
        let notice = if state.upload_in_flight {
            Some(Notice::PicPending)
        } else if !config.is_configured() {
            Some(Notice::PlaceApiUrl)
        } else {
            None
        };

        Ok(PopupView {
            config,
            state,
            notice,
        })
    }

    /// Append captured text to the draft. Returns the new draft.
    pub async fn capture(&self, capture: &Capture) -> Result<String> {
        let draft = self.store.append_draft(&capture.to_draft_line()).await?;
        debug!(len = draft.len(), "Captured into draft");
        Ok(draft)
    }

    /// Persist the editor contents as the draft.
    pub async fn editor_blur(&self, text: &str) -> Result<()> {
        self.store.set_draft(text).await
    }

    pub async fn set_visibility(&self, visibility: Visibility) -> Result<()> {
        self.store
            .write(PartialConfig {
                visibility_default: Some(visibility),
                ..Default::default()
            })
            .await?;
        info!(visibility = %visibility, "Default visibility changed");
        Ok(())
    }

    /// Return to idle. Credentials and visibility are kept.
    pub async fn reset(&self) -> Result<()> {
        self.store.reset_all().await
    }

    // =========================================================================
    // UPLOADS
    // =========================================================================

    /// Persist the upload mark. Must complete before any upload work starts.
    pub async fn begin_upload(&self, locator: &str) -> Result<UploadTicket> {
        if locator.is_empty() {
            return Err(Error::InvalidInput("upload locator is empty".to_string()));
        }
        self.store.mark_upload(locator).await?;
        debug!(locator = %locator, "Upload marked");
        Ok(UploadTicket {
            token: locator.to_string(),
        })
    }

    /// Apply an upload result, unless the mark now belongs to another upload.
    pub async fn finish_upload(
        &self,
        ticket: &UploadTicket,
        result: Result<ResourceRef>,
    ) -> Result<UploadOutcome> {
        let config = self.store.read().await?;
        if config.temp_file_url != ticket.token {
            debug!(
                token = %ticket.token,
                current = %config.temp_file_url,
                "Discarding stale upload completion"
            );
            return Ok(UploadOutcome::Discarded);
        }

        match result {
            Ok(resource) => {
                self.store.stage_resource(resource.clone()).await?;
                info!(resource = %resource.name, uid = %resource.uid, "Resource staged");
                Ok(UploadOutcome::Staged(resource))
            }
            Err(error) => {
                self.store.clear_upload_mark().await?;
                warn!(token = %ticket.token, error = %error, "Upload failed");
                Ok(UploadOutcome::Failed {
                    notice: Notice::for_error(&error, Notice::PicFailed),
                    error,
                })
            }
        }
    }

    /// Full upload round trip for a local file or a remote URL.
    pub async fn upload(&self, source: &UploadSource) -> Result<UploadOutcome> {
        let config = self.store.read().await?;
        let creds = match Credentials::from_config(&config) {
            Ok(creds) => creds,
            Err(_) => return Ok(UploadOutcome::Rejected(Notice::PlaceApiUrl)),
        };

        let ticket = self.begin_upload(&source.locator()).await?;
        let result = self.load_and_upload(&creds, source).await;
        self.finish_upload(&ticket, result).await
    }

    /// Restart the upload left marked by an interrupted process.
    ///
    /// Returns `None` when no upload is pending. The existing mark is reused
    /// as the ticket, so a newer upload started meanwhile still wins.
    pub async fn resume_upload(&self) -> Result<Option<UploadOutcome>> {
        let config = self.store.read().await?;
        let Some(locator) = config.upload_pending() else {
            return Ok(None);
        };
        let creds = match Credentials::from_config(&config) {
            Ok(creds) => creds,
            Err(_) => return Ok(Some(UploadOutcome::Rejected(Notice::PlaceApiUrl))),
        };

        info!(locator = %locator, "Resuming interrupted upload");
        let ticket = UploadTicket {
            token: locator.to_string(),
        };
        let source = UploadSource::parse(locator);
        let result = self.load_and_upload(&creds, &source).await;
        self.finish_upload(&ticket, result).await.map(Some)
    }

    async fn load_and_upload(
        &self,
        creds: &Credentials,
        source: &UploadSource,
    ) -> Result<ResourceRef> {
        let file = match source {
            UploadSource::File(path) => read_local_file(path).await?,
            UploadSource::Url(url) => self.service.fetch_file(url).await?,
        };

        let file = FilePayload {
            filename: timestamped_filename(&file.filename, Local::now()),
            ..file
        };
        self.service.upload_resource(creds, &file).await
    }

    // =========================================================================
    // SUBMIT
    // =========================================================================

    /// Create a memo from the draft and link the staged resources.
    ///
    /// `editor_text`, when given, replaces the draft first.
    pub async fn submit(&self, editor_text: Option<&str>) -> Result<SubmitOutcome> {
        if let Some(text) = editor_text {
            self.store.set_draft(text).await?;
        }

        let config = self.store.read().await?;
        let content = match config.draft() {
            Some(draft) if !draft.trim().is_empty() => draft.to_string(),
            _ => return Ok(SubmitOutcome::Rejected(Notice::PlaceContent)),
        };
        let creds = match Credentials::from_config(&config) {
            Ok(creds) => creds,
            Err(_) => return Ok(SubmitOutcome::Rejected(Notice::PlaceApiUrl)),
        };

        let memo = match self
            .service
            .create_memo(&creds, &content, config.visibility())
            .await
        {
            Ok(memo) => memo,
            Err(error) => {
                warn!(error = %error, "Memo creation failed; draft kept");
                return Ok(SubmitOutcome::Failed {
                    notice: Notice::for_error(&error, Notice::MemoFailed),
                    error,
                });
            }
        };

        let link = self
            .link_staged(&creds, &memo, &config.resource_id_list)
            .await;

        self.store.reset_all().await?;
        info!(memo = %memo.name, "Memo submitted");
        Ok(SubmitOutcome::Created { memo, link })
    }

    async fn link_staged(
        &self,
        creds: &Credentials,
        memo: &Memo,
        resources: &[ResourceRef],
    ) -> LinkReport {
        if resources.is_empty() {
            return LinkReport::NothingStaged;
        }

        let names = linkable_names(resources);
        let dropped = resources.len() - names.len();
        if names.is_empty() {
            debug!(dropped, "No linkable resources; skipping link step");
            return LinkReport::Skipped { dropped };
        }

        let memo_name = memo.qualified_name();
        match self
            .service
            .link_resources(creds, &memo_name, resources)
            .await
        {
            Ok(_) => {
                debug!(memo = %memo_name, count = names.len(), dropped, "Resources linked");
                LinkReport::Linked { names, dropped }
            }
            Err(Error::NoValidResource) => LinkReport::Skipped { dropped },
            Err(error) => {
                warn!(memo = %memo_name, error = %error, "Linking resources failed; memo kept");
                LinkReport::Failed(error)
            }
        }
    }

    // =========================================================================
    // SETTINGS
    // =========================================================================

    /// Validate credentials against the server and persist them.
    pub async fn save_credentials(&self, api_url: &str, token: &str) -> Result<CredentialsOutcome> {
        let api_url = api_url.trim();
        let token = token.trim();
        if api_url.is_empty() {
            return Ok(CredentialsOutcome::Rejected(Notice::PlaceApiUrl));
        }
        if token.is_empty() {
            return Ok(CredentialsOutcome::Rejected(Notice::InvalidToken));
        }

        let api_url = with_trailing_slash(api_url);
        let creds = Credentials::new(api_url.clone(), token);

        let user = match self.service.auth_status(&creds).await {
            Ok(user) => user,
            Err(error) => {
                warn!(url = %api_url, error = %error, "Credential check failed");
                return Ok(CredentialsOutcome::Failed {
                    notice: Notice::for_error(&error, Notice::InvalidToken),
                    error,
                });
            }
        };

        self.store
            .write(PartialConfig {
                api_url: Some(api_url.clone()),
                api_tokens: Some(token.to_string()),
                userid: Some(user.user_id.clone()),
                ..Default::default()
            })
            .await?;

        info!(url = %api_url, user_id = %user.user_id, "Credentials saved");
        Ok(CredentialsOutcome::Saved(user))
    }

    /// Tag counts of the configured user.
    pub async fn tags(&self) -> Result<TagsOutcome> {
        let config = self.store.read().await?;
        let creds = match Credentials::from_config(&config) {
            Ok(creds) => creds,
            Err(_) => return Ok(TagsOutcome::Rejected(Notice::PlaceApiUrl)),
        };

        let user_id = if config.userid.is_empty() {
            match self.resolve_user(&creds).await? {
                Ok(user_id) => user_id,
                Err(error) => {
                    return Ok(TagsOutcome::Failed {
                        notice: Notice::for_error(&error, Notice::MemoFailed),
                        error,
                    })
                }
            }
        } else {
            config.userid
        };

        match self.service.get_tags(&creds, &user_id).await {
            Ok(tags) if tags.is_empty() => Ok(TagsOutcome::Empty),
            Ok(tags) => Ok(TagsOutcome::Tags(tags)),
            Err(error) => {
                warn!(user_id = %user_id, error = %error, "Fetching tags failed");
                Ok(TagsOutcome::Failed {
                    notice: Notice::for_error(&error, Notice::MemoFailed),
                    error,
                })
            }
        }
    }

    /// Look up and persist the user id for records saved without one.
    /// The outer `Result` is the store, the inner one the server.
    async fn resolve_user(&self, creds: &Credentials) -> Result<Result<String>> {
        let user = match self.service.auth_status(creds).await {
            Ok(user) => user,
            Err(error) => return Ok(Err(error)),
        };
        self.store
            .write(PartialConfig {
                userid: Some(user.user_id.clone()),
                ..Default::default()
            })
            .await?;
        Ok(Ok(user.user_id))
    }
}

async fn read_local_file(path: &Path) -> Result<FilePayload> {
    let data = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| defaults::FALLBACK_FILENAME.to_string());
    let mime_type = detect_mime(&filename, &data);
    Ok(FilePayload::new(filename, mime_type, data))
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickmemo_core::ContentAction;

    #[test]
    fn test_pending_state_flags() {
        let mut config = Config::default();
        assert!(PendingState::of(&config).is_idle());

        config.pending_content_action = ContentAction::SaveText;
        config.pending_content = "x".to_string();
        config.resource_id_list.push(ResourceRef::new("r1", "", ""));
        let state = PendingState::of(&config);
        assert!(state.draft_pending);
        assert!(state.resources_staged);
        assert!(!state.upload_in_flight);
        assert!(!state.is_idle());
    }

    #[test]
    fn test_empty_live_draft_is_not_pending() {
        let config = Config {
            pending_content_action: ContentAction::SaveText,
            ..Default::default()
        };
        assert!(!PendingState::of(&config).draft_pending);
    }

    #[test]
    fn test_with_trailing_slash() {
        assert_eq!(with_trailing_slash("https://m.example"), "https://m.example/");
        assert_eq!(with_trailing_slash("https://m.example/"), "https://m.example/");
    }
}
