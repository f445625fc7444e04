//! Constants for the download module (timeouts).

/// Default HTTP connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default total timeout for one source fetch (30 seconds).
pub const FETCH_TIMEOUT_SECS: u64 = 30;
