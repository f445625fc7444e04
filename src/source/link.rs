//! Share-link recognition and direct-download rewriting.

use url::Url;

/// Host of the file-sharing service whose links are migrated.
pub const DEFAULT_SOURCE_HOST: &str = "dropbox.com";

/// Query parameter that makes Dropbox render an HTML preview page.
const PREVIEW_MARKER: &str = "dl=0";

/// Query parameter that makes Dropbox serve the raw file.
const RAW_MARKER: &str = "dl=1";

/// Returns true when `value` is a URL hosted on `source_host` or one of its
/// subdomains (`www.dropbox.com` matches `dropbox.com`).
///
/// Empty cells and values that do not parse as URLs are rejected, so this
/// doubles as the cell filter for candidate collection.
///
/// # Examples
///
/// ```
/// use migrator_core::source::is_source_url;
///
/// assert!(is_source_url("https://www.dropbox.com/s/abc/photo.jpg?dl=0", "dropbox.com"));
/// assert!(!is_source_url("https://cdn.shopify.com/photo.jpg", "dropbox.com"));
/// assert!(!is_source_url("", "dropbox.com"));
/// ```
#[must_use]
pub fn is_source_url(value: &str, source_host: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }
    Url::parse(trimmed)
        .ok()
        .and_then(|url| url.host_str().map(|host| host_matches(host, source_host)))
        .unwrap_or(false)
}

fn host_matches(host: &str, source_host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let source_host = source_host.to_ascii_lowercase();
    host == source_host
        || host
            .strip_suffix(source_host.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Rewrites a Dropbox preview link into a direct-download link.
///
/// Only the `dl=0` query parameter is touched; every other byte of the URL,
/// including parameter order and fragment, is preserved. Non-Dropbox URLs and
/// links without the preview marker are returned unchanged.
///
/// # Examples
///
/// ```
/// use migrator_core::source::to_direct_download_url;
///
/// assert_eq!(
///     to_direct_download_url("https://www.dropbox.com/s/abc/photo.jpg?dl=0"),
///     "https://www.dropbox.com/s/abc/photo.jpg?dl=1"
/// );
/// ```
#[must_use]
pub fn to_direct_download_url(url: &str) -> String {
    rewrite_share_link(url, DEFAULT_SOURCE_HOST)
}

/// Same as [`to_direct_download_url`] for a configurable source host.
#[must_use]
pub fn rewrite_share_link(url: &str, source_host: &str) -> String {
    if !is_source_url(url, source_host) {
        return url.to_string();
    }
    let Some(query_start) = url.find('?') else {
        return url.to_string();
    };
    let query_end = url[query_start..]
        .find('#')
        .map_or(url.len(), |offset| query_start + offset);
    let query = &url[query_start + 1..query_end];

    if !query.split('&').any(|param| param == PREVIEW_MARKER) {
        return url.to_string();
    }

    let rewritten = query
        .split('&')
        .map(|param| if param == PREVIEW_MARKER { RAW_MARKER } else { param })
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}?{}{}",
        &url[..query_start],
        rewritten,
        &url[query_end..]
    )
}
