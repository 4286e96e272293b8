//! Centralized default constants for quickmemo.
//!
//! Every crate references these instead of repeating literals. Organized by
//! area; add new constants to the matching section.

// =============================================================================
// REMOTE API
// =============================================================================

/// Path prefix shared by every memo server endpoint.
pub const API_PREFIX: &str = "api/v1";

/// Resource name prefix expected by the link endpoint.
pub const RESOURCE_PREFIX: &str = "resources/";

/// Memo name prefix; legacy numeric ids are converted into `memos/{id}`.
pub const MEMO_PREFIX: &str = "memos/";

/// User name prefix returned by the auth status endpoint.
pub const USER_PREFIX: &str = "users/";

/// Default HTTP request timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Whether uploads try multipart before the base64 JSON body.
pub const UPLOAD_MULTIPART: bool = true;

// =============================================================================
// UPLOADS
// =============================================================================

/// Filename used when a downloaded URL has no usable last path segment.
pub const FALLBACK_FILENAME: &str = "image.jpg";

/// MIME type used when a download carries no `Content-Type`.
pub const FALLBACK_MIME_TYPE: &str = "image/jpeg";

/// Largest remote file `fetch_file` will download (20 MiB).
pub const MAX_DOWNLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Timestamp suffix format appended to uploaded filenames (YYYYMMDDHHmmss).
pub const FILENAME_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

// =============================================================================
// LOCAL CONFIGURATION
// =============================================================================

/// Directory under the platform config dir holding the store.
pub const CONFIG_DIR_NAME: &str = "quickmemo";

/// File name of the persisted config record.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Environment variable overriding the config file path.
pub const ENV_CONFIG_PATH: &str = "QUICKMEMO_CONFIG";

/// Environment variable overriding [`HTTP_TIMEOUT_SECS`].
pub const ENV_HTTP_TIMEOUT: &str = "QUICKMEMO_TIMEOUT";

/// Environment variable overriding [`UPLOAD_MULTIPART`].
pub const ENV_UPLOAD_MULTIPART: &str = "QUICKMEMO_MULTIPART";
