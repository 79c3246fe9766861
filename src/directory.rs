//! Extension to chat-user directory.

use std::collections::BTreeMap;

use tracing::info;

/// Maps internal extensions to chat-platform user names.
///
/// Loaded once from the `[extensions]` config table and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    entries: BTreeMap<String, String>,
}

impl Directory {
    /// Build a directory from extension/user pairs.
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    /// User mapped to `extension`, if any.
    pub fn lookup(&self, extension: &str) -> Option<&str> {
        self.entries.get(extension).map(String::as_str)
    }

    /// Like [`Directory::lookup`], but logs a notice for unmapped extensions.
    ///
    /// An empty extension is treated as absent and is not logged.
    pub fn resolve(&self, extension: &str) -> Option<&str> {
        if extension.is_empty() {
            return None;
        }
        let user = self.lookup(extension);
        if user.is_none() {
            info!(extension, "no chat user for extension");
        }
        user
    }

    /// Number of mapped extensions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no extensions are mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Directory
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
