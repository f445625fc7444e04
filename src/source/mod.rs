//! Source link handling for Dropbox-hosted images.
//!
//! Two pure concerns live here:
//! - [`to_direct_download_url`] turns a share link that renders an HTML
//!   preview into one that serves raw bytes.
//! - [`derive_asset_name`] turns any URL into a stable, URL-safe file name
//!   for the published asset; [`assign_asset_names`] does the same for a
//!   whole run so distinct URLs never share a name.
//!
//! Neither function performs I/O and neither can fail.

mod link;
mod name;

pub use link::{DEFAULT_SOURCE_HOST, is_source_url, rewrite_share_link, to_direct_download_url};
pub use name::{DEFAULT_EXTENSION, MAX_ASSET_NAME_LEN, assign_asset_names, derive_asset_name};
