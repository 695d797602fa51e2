// EnvironmentStore: the per-run set of environment variables handed to steps,
// with a marked subset of "secure" names whose values are masked everywhere
// they could be displayed.

use crate::constants::MASK;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Environment variables shared by every step of one workflow run.
///
/// Cloning is cheap and yields a handle to the same store, so the stream
/// readers of a running process can mask lines while the step owns the store.
///
/// Invariant: every secure name also has an entry in the value map. Names
/// are only ever removed from both collections together.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentStore {
    inner: Arc<RwLock<StoreInner>>,
}

#[derive(Debug, Default)]
struct StoreInner {
    values: BTreeMap<String, String>,
    secure_names: BTreeSet<String>,
}

impl StoreInner {
    /// Non-empty secure values, longest first so a secret that contains
    /// another secret is replaced whole.
    fn secure_values(&self) -> Vec<&str> {
        let mut values: Vec<&str> = self
            .secure_names
            .iter()
            .filter_map(|name| self.values.get(name))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .collect();
        values.sort_by(|a, b| b.len().cmp(&a.len()));
        values.dedup();
        values
    }
}

impl EnvironmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge entries, overwriting earlier values. Secure marking of names
    /// already present is left untouched.
    pub fn set_many<I, K, V>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut inner = self.inner.write();
        for (name, value) in entries {
            inner.values.insert(name.into(), value.into());
        }
    }

    /// Merge entries and mark each name secure.
    pub fn set_secure_many<I, K, V>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut inner = self.inner.write();
        for (name, value) in entries {
            let name = name.into();
            inner.values.insert(name.clone(), value.into());
            inner.secure_names.insert(name);
        }
    }

    /// Remove names from both collections. Absent names are ignored.
    pub fn unset<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut inner = self.inner.write();
        for name in names {
            inner.values.remove(name.as_ref());
            inner.secure_names.remove(name.as_ref());
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.inner.read().values.get(name).cloned()
    }

    pub fn is_secure(&self, name: &str) -> bool {
        self.inner.read().secure_names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.inner.read().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().values.is_empty()
    }

    /// True values for building a subprocess environment. Never display these.
    pub fn environment(&self) -> HashMap<String, String> {
        self.inner
            .read()
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// All entries with secure values replaced by the mask token, sorted by name.
    /// For display only.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        let inner = self.inner.read();
        inner
            .values
            .iter()
            .map(|(name, value)| {
                let shown = if inner.secure_names.contains(name) {
                    MASK.to_string()
                } else {
                    value.clone()
                };
                (name.clone(), shown)
            })
            .collect()
    }

    /// The first secure name (in name order) whose non-empty value appears
    /// literally in `text`.
    pub fn contains_secure_reference(&self, text: &str) -> Option<String> {
        let inner = self.inner.read();
        inner
            .secure_names
            .iter()
            .find(|name| {
                inner
                    .values
                    .get(*name)
                    .is_some_and(|v| !v.is_empty() && text.contains(v.as_str()))
            })
            .cloned()
    }

    /// Replace every occurrence of every secure value in `line` with the mask.
    ///
    /// Only literal occurrences are found; encoded or split forms of a secret
    /// pass through unchanged.
    pub fn mask_line(&self, line: &str) -> String {
        let inner = self.inner.read();
        let mut result = line.to_string();
        for secret in inner.secure_values() {
            if result.contains(secret) {
                result = result.replace(secret, MASK);
            }
        }
        result
    }

    /// Byte-level [`mask_line`](Self::mask_line) for output that need not be UTF-8.
    pub fn mask_bytes(&self, data: &[u8]) -> Vec<u8> {
        let inner = self.inner.read();
        let mut result = data.to_vec();
        for secret in inner.secure_values() {
            result = replace_bytes(&result, secret.as_bytes(), MASK.as_bytes());
        }
        result
    }

    /// Number of secure names currently held.
    pub fn secure_count(&self) -> usize {
        self.inner.read().secure_names.len()
    }
}

fn replace_bytes(haystack: &[u8], needle: &[u8], with: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(needle) {
            out.extend_from_slice(with);
            i += needle.len();
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_bytes_keeps_other_bytes_intact() {
        let store = EnvironmentStore::new();
        store.set_secure_many([("PW", "hunter2")]);
        let data = b"\xff\xfepw=hunter2\x00hunter2";
        assert_eq!(store.mask_bytes(data), b"\xff\xfepw=***\x00***".to_vec());
        assert_eq!(store.mask_bytes(b"plain"), b"plain".to_vec());
    }

    fn store_with_secret() -> EnvironmentStore {
        let store = EnvironmentStore::new();
        store.set_many([("FOO", "bar")]);
        store.set_secure_many([("SECRET", "shh")]);
        store
    }

    #[test]
    fn set_many_overwrites_and_is_idempotent() {
        let store = EnvironmentStore::new();
        store.set_many([("A", "1"), ("B", "2")]);
        let once = store.snapshot();
        store.set_many([("A", "1"), ("B", "2")]);
        assert_eq!(store.snapshot(), once);

        store.set_many([("A", "3")]);
        assert_eq!(store.get("A").as_deref(), Some("3"));
    }

    #[test]
    fn set_many_keeps_secure_marking() {
        let store = store_with_secret();
        store.set_many([("SECRET", "changed")]);
        assert!(store.is_secure("SECRET"));
        assert_eq!(store.mask_line("x changed y"), "x *** y");
    }

    #[test]
    fn unset_removes_from_both_and_ignores_absent() {
        let store = store_with_secret();
        store.unset(["SECRET", "NEVER_SET"]);
        assert_eq!(store.get("SECRET"), None);
        assert!(!store.is_secure("SECRET"));
        assert_eq!(store.secure_count(), 0);

        store.unset(["SECRET"]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn snapshot_masks_secure_values() {
        let store = store_with_secret();
        let snap = store.snapshot();
        assert_eq!(snap.get("FOO").map(String::as_str), Some("bar"));
        assert_eq!(snap.get("SECRET").map(String::as_str), Some(MASK));
    }

    #[test]
    fn environment_has_true_values() {
        let store = store_with_secret();
        let env = store.environment();
        assert_eq!(env.get("SECRET").map(String::as_str), Some("shh"));
    }

    #[test]
    fn secure_reference_matches_value_not_name() {
        let store = store_with_secret();
        assert_eq!(
            store.contains_secure_reference("curl -H 'token: shh'").as_deref(),
            Some("SECRET")
        );
        assert_eq!(store.contains_secure_reference("echo $SECRET"), None);
        assert_eq!(store.contains_secure_reference("echo bar"), None);
    }

    #[test]
    fn empty_secure_value_never_matches() {
        let store = EnvironmentStore::new();
        store.set_secure_many([("EMPTY", "")]);
        assert_eq!(store.contains_secure_reference("anything"), None);
        assert_eq!(store.mask_line("anything"), "anything");
    }

    #[test]
    fn mask_line_replaces_every_occurrence() {
        let store = store_with_secret();
        assert_eq!(store.mask_line("shh and shh again"), "*** and *** again");
        assert_eq!(store.mask_line("bar stays"), "bar stays");
    }

    #[test]
    fn mask_line_prefers_longer_secret() {
        let store = EnvironmentStore::new();
        store.set_secure_many([("SHORT", "pass"), ("LONG", "password")]);
        assert_eq!(store.mask_line("my password is here"), "my *** is here");
    }

    #[test]
    fn clones_share_state() {
        let store = EnvironmentStore::new();
        let handle = store.clone();
        handle.set_secure_many([("K", "v4lue")]);
        assert_eq!(store.mask_line("v4lue"), MASK);
    }
}
