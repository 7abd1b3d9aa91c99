// Google Sheets import: URL recognition and CSV export fetch.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use url::Url;

#[derive(Debug)]
pub enum FetchError {
    /// Not a recognizable spreadsheet URL
    NotASheetUrl(String),
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::NotASheetUrl(url) => write!(f, "Not a Google Sheets URL: {}", url),
            FetchError::Network(msg) => write!(f, "Network error: {}", msg),
            FetchError::Http(code) => write!(f, "HTTP {} fetching sheet export", code),
        }
    }
}

impl std::error::Error for FetchError {}

fn id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)").unwrap())
}

fn gid_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[#&?]gid=(\d+)").unwrap())
}

/// Pull the spreadsheet id out of a share link, if present.
pub fn extract_sheet_id(url: &str) -> Option<&str> {
    id_pattern().captures(url).map(|caps| caps.get(1).unwrap().as_str())
}

/// Pull the worksheet gid out of a share link, if present.
pub fn extract_gid(url: &str) -> Option<&str> {
    gid_pattern().captures(url).map(|caps| caps.get(1).unwrap().as_str())
}

/// True for URLs that point at a Google Sheets document.
pub fn is_sheets_url(raw: &str) -> bool {
    let Ok(parsed) = Url::parse(raw) else {
        return false;
    };
    parsed.host_str() == Some("docs.google.com") && parsed.path().contains("/spreadsheets/")
}

/// Rewrite a share link to the document's CSV export endpoint, preserving the
/// worksheet gid when the link carries one.
pub fn to_csv_export_url(share_url: &str) -> Result<String, FetchError> {
    let id = extract_sheet_id(share_url)
        .ok_or_else(|| FetchError::NotASheetUrl(share_url.to_string()))?;
    let mut export = format!("https://docs.google.com/spreadsheets/d/{}/export?format=csv", id);
    if let Some(gid) = extract_gid(share_url) {
        export.push_str("&gid=");
        export.push_str(gid);
    }
    Ok(export)
}

/// Fetch the sheet behind a share link as CSV text.
///
/// Works for documents shared as "anyone with the link can view"; private
/// sheets come back as an HTTP error.
pub fn fetch_csv(share_url: &str) -> Result<String, FetchError> {
    let export_url = to_csv_export_url(share_url)?;
    let resp = reqwest::blocking::get(&export_url)
        .map_err(|e| FetchError::Network(e.to_string()))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Http(status.as_u16()));
    }
    resp.text().map_err(|e| FetchError::Network(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHARE: &str =
        "https://docs.google.com/spreadsheets/d/1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms/edit#gid=1234";

    #[test]
    fn test_extract_sheet_id() {
        assert_eq!(
            extract_sheet_id(SHARE),
            Some("1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms")
        );
        assert_eq!(extract_sheet_id("https://example.com/whatever"), None);
    }

    #[test]
    fn test_extract_gid() {
        assert_eq!(extract_gid(SHARE), Some("1234"));
        assert_eq!(
            extract_gid("https://docs.google.com/spreadsheets/d/abc/edit?gid=7#x"),
            Some("7")
        );
        assert_eq!(extract_gid("https://docs.google.com/spreadsheets/d/abc/edit"), None);
    }

    #[test]
    fn test_is_sheets_url() {
        assert!(is_sheets_url(SHARE));
        assert!(!is_sheets_url("https://docs.google.com/document/d/abc/edit"));
        assert!(!is_sheets_url("https://example.com/spreadsheets/d/abc"));
        assert!(!is_sheets_url("not a url"));
    }

    #[test]
    fn test_to_csv_export_url_preserves_gid() {
        assert_eq!(
            to_csv_export_url(SHARE).unwrap(),
            "https://docs.google.com/spreadsheets/d/1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms/export?format=csv&gid=1234"
        );
    }

    #[test]
    fn test_to_csv_export_url_without_gid() {
        let url = "https://docs.google.com/spreadsheets/d/abc_DEF-123/edit";
        assert_eq!(
            to_csv_export_url(url).unwrap(),
            "https://docs.google.com/spreadsheets/d/abc_DEF-123/export?format=csv"
        );
    }

    #[test]
    fn test_to_csv_export_url_rejects_non_sheet() {
        assert!(matches!(
            to_csv_export_url("https://example.com/x"),
            Err(FetchError::NotASheetUrl(_))
        ));
    }
}
