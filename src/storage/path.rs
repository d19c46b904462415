//! Storage key construction
//!
//! Keys are built in three steps:
//!
//! 1. `auto_generate_path`: the key becomes `YYYY/MM/DD/<uuid>.<ext>`,
//!    ignoring any caller-supplied key
//! 2. otherwise `append_extension`: `.<ext>` is appended to the caller's key
//! 3. a non-empty `path_prefix` is prepended verbatim
//!
//! The prefix is concatenated literally, so `"img"` + `"foo.png"` gives
//! `"imgfoo.png"`. Set `insert_prefix_separator` to get `"img/foo.png"`.

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

/// Immutable key/URL construction options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageOptions {
    pub path_prefix: String,
    pub auto_generate_path: bool,
    pub append_extension: bool,
    pub insert_prefix_separator: bool,
    pub base_url: String,
}

impl From<&crate::config::StorageConfig> for StorageOptions {
    fn from(config: &crate::config::StorageConfig) -> Self {
        Self {
            path_prefix: config.path_prefix.clone(),
            auto_generate_path: config.auto_generate_path,
            append_extension: config.append_extension,
            insert_prefix_separator: config.insert_prefix_separator,
            base_url: config.base_url.clone(),
        }
    }
}

impl StorageOptions {
    /// Compute the final storage key for one upload
    pub fn compute_key(&self, path_key: &str, extension: &str, now: DateTime<Utc>) -> String {
        let key = if self.auto_generate_path {
            format!("{}.{}", build_base_path(now), extension)
        } else if self.append_extension {
            format!("{}.{}", path_key, extension)
        } else {
            path_key.to_string()
        };

        self.apply_prefix(key)
    }

    /// Public URL for a computed key
    pub fn url_for(&self, key: &str) -> String {
        format!("{}{}", self.base_url, key)
    }

    fn apply_prefix(&self, key: String) -> String {
        if self.path_prefix.is_empty() {
            return key;
        }

        let needs_separator = self.insert_prefix_separator
            && !self.path_prefix.ends_with('/')
            && !key.starts_with('/');

        if needs_separator {
            format!("{}/{}", self.path_prefix, key)
        } else {
            format!("{}{}", self.path_prefix, key)
        }
    }
}

/// Build the generated part of an auto-path: `YYYY/MM/DD/<uuid v4>`.
///
/// `now` is truncated to whole seconds before formatting.
pub fn build_base_path(now: DateTime<Utc>) -> String {
    let date = now.trunc_subsecs(0).format("%Y/%m/%d/");
    format!("{}{}", date, Uuid::new_v4())
}
