//! Asset name derivation.
//!
//! Names must be deterministic (re-running a migration updates the same
//! remote object), collision resistant across URLs that share a basename,
//! and safe to use as a single path segment.

use std::collections::{HashMap, HashSet};

use md5::{Digest, Md5};
use tracing::{debug, trace};
use url::Url;

/// Longest basename kept verbatim; longer names are replaced by a digest.
pub const MAX_ASSET_NAME_LEN: usize = 100;

/// Extension used for hashed names whose source had none.
pub const DEFAULT_EXTENSION: &str = ".jpg";

/// Longest extension carried over onto a hashed name (excluding the dot).
const MAX_EXTENSION_LEN: usize = 10;

/// Derives the published file name for a source URL.
///
/// The last path segment is used as-is when it is short and plain. Otherwise
/// the name becomes the lowercase hex MD5 of the full URL followed by the
/// segment's extension (or [`DEFAULT_EXTENSION`]). Hashing kicks in when the
/// segment is empty, longer than [`MAX_ASSET_NAME_LEN`] characters, contains
/// query or path delimiters, or when the URL's query string carries more
/// than one parameter, which is how otherwise identical basenames are told
/// apart.
///
/// # Examples
///
/// ```
/// use migrator_core::source::derive_asset_name;
///
/// assert_eq!(
///     derive_asset_name("https://www.dropbox.com/s/abc/photo.jpg?dl=0"),
///     "photo.jpg"
/// );
/// let hashed = derive_asset_name("https://www.dropbox.com/a/photo.jpg?x=1&y=2");
/// assert!(hashed.ends_with(".jpg"));
/// assert_eq!(hashed.len(), 32 + ".jpg".len());
/// ```
#[must_use]
pub fn derive_asset_name(url: &str) -> String {
    let parsed = Url::parse(url.trim()).ok();
    let candidate = parsed
        .as_ref()
        .and_then(last_path_segment)
        .unwrap_or_default();
    let multi_param_query = parsed
        .as_ref()
        .and_then(Url::query)
        .is_some_and(|query| query.contains('&'));

    if !needs_digest(&candidate) && !multi_param_query {
        return candidate;
    }

    let name = digest_name(url, &candidate);
    trace!(url = %url, candidate = %candidate, name = %name, "derived hashed asset name");
    name
}

/// Derives names for a whole set of URLs so that no two distinct URLs share
/// one.
///
/// Each URL first gets [`derive_asset_name`]. When two or more distinct URLs
/// land on the same name, every one of them falls back to the digest form,
/// keeping the extension. Names claimed by a single URL stay readable.
/// The result is in input order.
///
/// # Examples
///
/// ```
/// use migrator_core::source::assign_asset_names;
///
/// let names = assign_asset_names([
///     "https://www.dropbox.com/s/aaa/photo.jpg?dl=0",
///     "https://www.dropbox.com/s/bbb/photo.jpg?dl=0",
///     "https://www.dropbox.com/s/ccc/hat.png?dl=0",
/// ]);
/// assert_ne!(names[0], names[1]);
/// assert!(names[0].ends_with(".jpg"));
/// assert_eq!(names[2], "hat.png");
/// ```
#[must_use]
pub fn assign_asset_names<'a, I>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let derived: Vec<(&str, String)> = urls
        .into_iter()
        .map(|url| (url, derive_asset_name(url)))
        .collect();

    let mut claimants: HashMap<&str, HashSet<&str>> = HashMap::new();
    for (url, name) in &derived {
        claimants.entry(name.as_str()).or_default().insert(*url);
    }

    derived
        .iter()
        .map(|(url, name)| {
            let shared = claimants.get(name.as_str()).is_some_and(|urls| urls.len() > 1);
            if shared {
                let unique = digest_name(url, name);
                debug!(url = %url, shared = %name, name = %unique, "asset name shared; using digest");
                unique
            } else {
                name.clone()
            }
        })
        .collect()
}

/// `hex(md5(url))` plus the extension of `candidate` (or the default).
fn digest_name(url: &str, candidate: &str) -> String {
    let extension = extension_of(candidate).unwrap_or(DEFAULT_EXTENSION);
    format!("{}{extension}", hex::encode(Md5::digest(url.as_bytes())))
}

/// Returns the percent-decoded last path segment, if the URL has one.
fn last_path_segment(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(last)
        .map_or_else(|_| last.to_string(), std::borrow::Cow::into_owned);
    Some(decoded)
}

fn needs_digest(candidate: &str) -> bool {
    candidate.is_empty()
        || candidate.chars().count() > MAX_ASSET_NAME_LEN
        || candidate.contains(['?', '&', '/', '\\'])
        || candidate.chars().any(char::is_control)
}

/// Extracts a plain `.ext` suffix, ignoring dotfiles and unusual extensions.
fn extension_of(candidate: &str) -> Option<&str> {
    let dot = candidate.rfind('.')?;
    if dot == 0 {
        return None;
    }
    let ext = &candidate[dot + 1..];
    let plain = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    plain.then_some(&candidate[dot..])
}
