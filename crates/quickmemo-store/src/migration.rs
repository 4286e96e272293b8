//! Legacy record migration.
//!
//! Earlier layouts of the record used different keys for the same state:
//!
//! | Legacy key | Current key |
//! |------------|-------------|
//! | `memo_lock` | `visibilityDefault` |
//! | `contentActionType` | `pendingContentAction` |
//! | `open_action` + `open_content` | `pendingContentAction` + `pendingContent`, or `tempFileUrl` for `upload_image` |
//!
//! Legacy keys are never live fields: they are folded into the current keys
//! (which win when both exist) and removed.

use serde_json::{Map, Value};

const MEMO_LOCK: &str = "memo_lock";
const CONTENT_ACTION_TYPE: &str = "contentActionType";
const OPEN_ACTION: &str = "open_action";
const OPEN_CONTENT: &str = "open_content";

const VISIBILITY_DEFAULT: &str = "visibilityDefault";
const PENDING_CONTENT_ACTION: &str = "pendingContentAction";
const PENDING_CONTENT: &str = "pendingContent";
const TEMP_FILE_URL: &str = "tempFileUrl";

/// Whether the record still carries any legacy key.
pub fn has_legacy_keys(map: &Map<String, Value>) -> bool {
    [MEMO_LOCK, CONTENT_ACTION_TYPE, OPEN_ACTION, OPEN_CONTENT]
        .iter()
        .any(|k| map.contains_key(*k))
}

/// Fold legacy keys into the current layout. Returns true if anything changed.
pub fn migrate_legacy(map: &mut Map<String, Value>) -> bool {
    if !has_legacy_keys(map) {
        return false;
    }

    if let Some(lock) = map.remove(MEMO_LOCK) {
        map.entry(VISIBILITY_DEFAULT).or_insert(lock);
    }

    if let Some(action) = map.remove(CONTENT_ACTION_TYPE) {
        map.entry(PENDING_CONTENT_ACTION).or_insert(action);
    }

    let open_action = map.remove(OPEN_ACTION);
    let open_content = map.remove(OPEN_CONTENT);
    if open_action.is_some() || open_content.is_some() {
        let action = open_action
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let content = open_content
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if action == "upload_image" {
            map.entry(TEMP_FILE_URL).or_insert(Value::String(content));
        } else {
            let live = action == "save_text" && !content.is_empty();
            map.entry(PENDING_CONTENT)
                .or_insert(Value::String(content));
            map.entry(PENDING_CONTENT_ACTION).or_insert(Value::String(
                if live { "SAVE_TEXT" } else { "NONE" }.to_string(),
            ));
        }
    }

    tracing::debug!(component = "migration", "Migrated legacy config keys");
    true
}
