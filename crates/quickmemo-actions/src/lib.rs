//! # quickmemo-actions
//!
//! Pending-action state machine for quick memo capture.
//!
//! A user builds a memo in several short steps that may each run in a
//! different process: text captured from pages, an edited draft, files
//! uploaded ahead of the memo. [`PendingActions`] reconciles those steps
//! with the memo server, keeping every intermediate state in a
//! [`ConfigStore`](quickmemo_core::ConfigStore) so nothing is lost when the
//! process exits.
//!
//! Pending state is a set of independent flags ([`PendingState`]):
//!
//! | Flag | Set by | Cleared by |
//! |------|--------|------------|
//! | draft pending | capture, editor blur | successful submit, reset |
//! | upload in flight | upload start | upload success or failure |
//! | resources staged | upload success | successful submit, reset |
//!
//! Failed remote calls never clear the draft or staged resources.

pub mod capture;
pub mod machine;
pub mod mock;
pub mod notice;
pub mod outcome;

pub use capture::{Capture, UploadSource};
pub use machine::{PendingActions, PendingState};
pub use notice::Notice;
pub use outcome::{
    CredentialsOutcome, LinkReport, PopupView, SubmitOutcome, TagsOutcome, UploadOutcome,
    UploadTicket,
};
