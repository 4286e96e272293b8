//! Inputs arriving from outside the editor: context-menu captures and
//! upload sources.

use chrono::{DateTime, Local};
use std::path::PathBuf;

use quickmemo_core::defaults;

/// Text captured from a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    /// Selected text.
    Selection(String),
    /// A link, or the page itself when no link was under the cursor.
    Link {
        link_url: Option<String>,
        page_url: String,
    },
    /// An image, inserted as markdown.
    Image { src_url: String },
}

impl Capture {
    /// Line appended to the draft.
    pub fn to_draft_line(&self) -> String {
        match self {
            Capture::Selection(text) => format!("{}\n", text),
            Capture::Link { link_url, page_url } => {
                let url = link_url
                    .as_deref()
                    .filter(|u| !u.is_empty())
                    .unwrap_or(page_url);
                format!("{}\n", url)
            }
            Capture::Image { src_url } => format!("![]({})\n", src_url),
        }
    }
}

/// Where an upload reads its bytes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    File(PathBuf),
    Url(String),
}

impl UploadSource {
    /// Parse a CLI-style argument: `http(s)://` is a URL, anything else a path.
    pub fn parse(arg: &str) -> Self {
        let lower = arg.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            UploadSource::Url(arg.to_string())
        } else {
            UploadSource::File(PathBuf::from(arg))
        }
    }

    /// Locator persisted while the upload is in flight.
    pub fn locator(&self) -> String {
        match self {
            UploadSource::File(path) => path.display().to_string(),
            UploadSource::Url(url) => url.clone(),
        }
    }
}

/// MIME type of a local file: magic bytes first, then a few text extensions.
pub fn detect_mime(filename: &str, data: &[u8]) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "html" | "htm" => "text/html",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// Rename `cat.png` to `cat_20260101093000.png`.
pub fn timestamped_filename(original: &str, now: DateTime<Local>) -> String {
    let stamp = now.format(defaults::FILENAME_TIMESTAMP_FORMAT);
    match original.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!("{}_{}.{}", stem, stamp, ext)
        }
        _ => format!("{}_{}", original, stamp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap()
    }

    #[test]
    fn test_capture_lines() {
        assert_eq!(Capture::Selection("hi".into()).to_draft_line(), "hi\n");
        assert_eq!(
            Capture::Link {
                link_url: None,
                page_url: "https://page".into()
            }
            .to_draft_line(),
            "https://page\n"
        );
        assert_eq!(
            Capture::Link {
                link_url: Some("https://link".into()),
                page_url: "https://page".into()
            }
            .to_draft_line(),
            "https://link\n"
        );
        assert_eq!(
            Capture::Image {
                src_url: "https://img/x.png".into()
            }
            .to_draft_line(),
            "![](https://img/x.png)\n"
        );
    }

    #[test]
    fn test_timestamped_filename() {
        assert_eq!(timestamped_filename("cat.png", at()), "cat_20260304050607.png");
        assert_eq!(
            timestamped_filename("a.tar.gz", at()),
            "a.tar_20260304050607.gz"
        );
        assert_eq!(timestamped_filename("README", at()), "README_20260304050607");
        assert_eq!(timestamped_filename(".env", at()), ".env_20260304050607");
    }

    #[test]
    fn test_detect_mime() {
        let png = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0];
        assert_eq!(detect_mime("whatever.bin", &png), "image/png");
        assert_eq!(detect_mime("notes.md", b"# hi"), "text/markdown");
        assert_eq!(detect_mime("blob", b"\x00\x01"), "application/octet-stream");
    }

    #[test]
    fn test_upload_source_parse() {
        assert_eq!(
            UploadSource::parse("https://img.example/a.png"),
            UploadSource::Url("https://img.example/a.png".into())
        );
        assert_eq!(
            UploadSource::parse("./a.png"),
            UploadSource::File(PathBuf::from("./a.png"))
        );
    }
}
