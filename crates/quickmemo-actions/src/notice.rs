//! User-visible notices produced by every action outcome.

use std::fmt;

use quickmemo_core::Error;

/// Message shown to the user after an action.
///
/// [`Notice::message_key`] is the localization key; `Display` gives the
/// English default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notice {
    MemoSuccess,
    MemoFailed,
    PicSuccess,
    PicFailed,
    PicPending,
    PlaceApiUrl,
    PlaceContent,
    InvalidToken,
    SaveSuccess,
    SearchNone,
}

impl Notice {
    pub fn message_key(&self) -> &'static str {
        match self {
            Notice::MemoSuccess => "memoSuccess",
            Notice::MemoFailed => "memoFailed",
            Notice::PicSuccess => "picSuccess",
            Notice::PicFailed => "picFailed",
            Notice::PicPending => "picPending",
            Notice::PlaceApiUrl => "placeApiUrl",
            Notice::PlaceContent => "placeContent",
            Notice::InvalidToken => "invalidToken",
            Notice::SaveSuccess => "saveSuccess",
            Notice::SearchNone => "searchNone",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notice::MemoFailed
                | Notice::PicFailed
                | Notice::PlaceApiUrl
                | Notice::PlaceContent
                | Notice::InvalidToken
        )
    }

    /// Notice for a failed action; `fallback` covers errors with no
    /// dedicated message.
    pub fn for_error(error: &Error, fallback: Notice) -> Notice {
        match error {
            Error::Auth(_) => Notice::InvalidToken,
            Error::ConfigurationMissing => Notice::PlaceApiUrl,
            Error::EmptyContent => Notice::PlaceContent,
            _ => fallback,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Notice::MemoSuccess => "Memo saved",
            Notice::MemoFailed => "Failed to save memo",
            Notice::PicSuccess => "Image uploaded",
            Notice::PicFailed => "Image upload failed",
            Notice::PicPending => "An image upload is still pending",
            Notice::PlaceApiUrl => "Please set the server URL first",
            Notice::PlaceContent => "Please enter some content",
            Notice::InvalidToken => "Invalid token, please re-enter it",
            Notice::SaveSuccess => "Settings saved",
            Notice::SearchNone => "No tags found",
        };
        f.write_str(text)
    }
}
