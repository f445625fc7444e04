//! Shared User-Agent string for source fetches and content API calls.
//!
//! GitHub rejects API requests without a User-Agent, and Dropbox serves
//! identified clients more predictably than anonymous ones.

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/dropbox-migrator";

/// Default User-Agent for every outbound request.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("dropbox-migrator/{version} (image-migration-tool; +{PROJECT_UA_URL})")
}
