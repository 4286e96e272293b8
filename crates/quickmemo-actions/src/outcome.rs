//! Results of state-machine operations.
//!
//! Remote failures are values here, never `Err`: each outcome carries the
//! [`Notice`] to show and, on failure, the underlying error.

use std::collections::BTreeMap;

use quickmemo_core::{AuthUser, Config, Error, Memo, ResourceRef};

use crate::machine::PendingState;
use crate::notice::Notice;

/// What a freshly opened popup shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupView {
    pub config: Config,
    pub state: PendingState,
    /// Notice to show on open (an upload left pending, or no server yet).
    pub notice: Option<Notice>,
}

/// Proof that an upload was started; its token is the persisted locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub token: String,
}

#[derive(Debug)]
pub enum UploadOutcome {
    Staged(ResourceRef),
    Rejected(Notice),
    Failed { notice: Notice, error: Error },
    /// Another upload replaced this one's mark; its result was dropped.
    Discarded,
}

impl UploadOutcome {
    pub fn notice(&self) -> Option<Notice> {
        match self {
            UploadOutcome::Staged(_) => Some(Notice::PicSuccess),
            UploadOutcome::Rejected(notice) | UploadOutcome::Failed { notice, .. } => Some(*notice),
            UploadOutcome::Discarded => None,
        }
    }
}

/// Fate of the link step after a memo was created.
#[derive(Debug)]
pub enum LinkReport {
    NothingStaged,
    /// Resources were staged but none carried an identifier.
    Skipped { dropped: usize },
    Linked { names: Vec<String>, dropped: usize },
    Failed(Error),
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Created { memo: Memo, link: LinkReport },
    Rejected(Notice),
    Failed { notice: Notice, error: Error },
}

impl SubmitOutcome {
    pub fn notice(&self) -> Notice {
        match self {
            SubmitOutcome::Created { .. } => Notice::MemoSuccess,
            SubmitOutcome::Rejected(notice) | SubmitOutcome::Failed { notice, .. } => *notice,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, SubmitOutcome::Created { .. })
    }
}

#[derive(Debug)]
pub enum CredentialsOutcome {
    Saved(AuthUser),
    Rejected(Notice),
    Failed { notice: Notice, error: Error },
}

impl CredentialsOutcome {
    pub fn notice(&self) -> Notice {
        match self {
            CredentialsOutcome::Saved(_) => Notice::SaveSuccess,
            CredentialsOutcome::Rejected(notice) | CredentialsOutcome::Failed { notice, .. } => {
                *notice
            }
        }
    }
}

#[derive(Debug)]
pub enum TagsOutcome {
    Tags(BTreeMap<String, u64>),
    Empty,
    Rejected(Notice),
    Failed { notice: Notice, error: Error },
}

impl TagsOutcome {
    pub fn notice(&self) -> Option<Notice> {
        match self {
            TagsOutcome::Tags(_) => None,
            TagsOutcome::Empty => Some(Notice::SearchNone),
            TagsOutcome::Rejected(notice) | TagsOutcome::Failed { notice, .. } => Some(*notice),
        }
    }
}
