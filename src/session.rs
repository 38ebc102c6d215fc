//! The per-request session object.

use std::collections::HashMap;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Key/value contents of a session.
pub type SessionMap = HashMap<String, Value>;

/// One request's view of a session.
///
/// Behaves like a mutable string-keyed map. Every write path (insert, remove,
/// clear, mutable access) flags the session as modified; reads never do. The
/// [`SessionInterface`](crate::SessionInterface) inspects that flag together
/// with emptiness at the end of the request to decide what to persist.
///
/// A `Session` lives for a single request. The stored record is the only
/// state that survives between requests.
///
/// # Examples
///
/// ```
/// use seaorm_server_sessions::Session;
///
/// let mut session = Session::new("sid".to_string(), false);
/// assert!(!session.is_modified());
///
/// session.insert("user", "bob").unwrap();
/// assert!(session.is_modified());
/// assert_eq!(session.get_as::<String>("user").unwrap().as_deref(), Some("bob"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    sid: String,
    contents: SessionMap,
    modified: bool,
    permanent: bool,
}

impl Session {
    /// Creates an empty, unmodified session bound to `sid`.
    pub fn new(sid: String, permanent: bool) -> Self {
        Self {
            sid,
            contents: SessionMap::new(),
            modified: false,
            permanent,
        }
    }

    /// Creates an unmodified session pre-populated with stored contents.
    pub fn with_contents(sid: String, contents: SessionMap, permanent: bool) -> Self {
        Self {
            sid,
            contents,
            modified: false,
            permanent,
        }
    }

    /// The public session identifier, i.e. the cookie value.
    pub fn sid(&self) -> &str {
        &self.sid
    }

    /// Whether the contents were written to since the session was opened.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Whether the cookie should outlive the browser session.
    pub fn is_permanent(&self) -> bool {
        self.permanent
    }

    /// Marks the session permanent or not. This does not touch the contents.
    pub fn set_permanent(&mut self, permanent: bool) {
        self.permanent = permanent;
    }

    /// Forces the modified flag, e.g. after mutating a nested value obtained
    /// through a clone.
    pub fn mark_modified(&mut self) {
        self.on_update();
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.contents.get(key)
    }

    /// Reads `key` and deserializes it into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the stored value does not fit `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.contents
            .get(key)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|e| Error::Decode(e.to_string()))
            })
            .transpose()
    }

    /// Mutable access to a value. Flags the session as modified when the key
    /// exists, since the caller may change it in place.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        if self.contents.contains_key(key) {
            self.on_update();
        }
        self.contents.get_mut(key)
    }

    /// Serializes `value` and stores it under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if `value` cannot be represented as JSON. The
    /// session is left untouched in that case.
    pub fn insert<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<Option<Value>> {
        let value = serde_json::to_value(value).map_err(|e| Error::Encode(e.to_string()))?;
        Ok(self.insert_value(key, value))
    }

    pub fn insert_value(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.on_update();
        self.contents.insert(key.into(), value)
    }

    /// Removes `key`. Counts as a write even if the key was absent.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.on_update();
        self.contents.remove(key)
    }

    /// Removes every key. Counts as a write even if already empty.
    pub fn clear(&mut self) {
        self.on_update();
        self.contents.clear();
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.contents.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Emptiness is judged on the contents alone, regardless of the modified
    /// flag.
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.contents.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.contents.iter()
    }

    pub fn contents(&self) -> &SessionMap {
        &self.contents
    }

    fn on_update(&mut self) {
        self.modified = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loaded() -> Session {
        let mut contents = SessionMap::new();
        contents.insert("count".to_string(), json!(1));
        Session::with_contents("sid".to_string(), contents, false)
    }

    #[test]
    fn test_new_session_is_clean_and_empty() {
        let session = Session::new("abc".to_string(), true);
        assert_eq!(session.sid(), "abc");
        assert!(session.is_empty());
        assert!(!session.is_modified());
        assert!(session.is_permanent());
    }

    #[test]
    fn test_reads_do_not_mark_modified() {
        let session = loaded();
        assert_eq!(session.get("count"), Some(&json!(1)));
        assert_eq!(session.get_as::<i64>("count").unwrap(), Some(1));
        assert!(session.contains_key("count"));
        assert_eq!(session.len(), 1);
        assert_eq!(session.keys().count(), 1);
        assert_eq!(session.iter().count(), 1);
        assert!(!session.is_modified());
    }

    #[test]
    fn test_insert_marks_modified() {
        let mut session = loaded();
        let previous = session.insert("count", 2).unwrap();
        assert_eq!(previous, Some(json!(1)));
        assert!(session.is_modified());
    }

    #[test]
    fn test_remove_marks_modified_even_when_absent() {
        let mut session = loaded();
        assert_eq!(session.remove("missing"), None);
        assert!(session.is_modified());
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_clear_empties_and_marks_modified() {
        let mut session = loaded();
        session.clear();
        assert!(session.is_empty());
        assert!(session.is_modified());
    }

    #[test]
    fn test_get_mut_marks_modified_only_when_present() {
        let mut session = loaded();
        assert!(session.get_mut("missing").is_none());
        assert!(!session.is_modified());

        *session.get_mut("count").unwrap() = json!(5);
        assert!(session.is_modified());
        assert_eq!(session.get_as::<i64>("count").unwrap(), Some(5));
    }

    #[test]
    fn test_get_as_type_mismatch_is_decode_error() {
        let session = loaded();
        let err = session.get_as::<String>("count").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_permanent_is_independent_of_contents() {
        let mut session = Session::new("abc".to_string(), false);
        session.set_permanent(true);
        assert!(session.is_permanent());
        assert!(session.is_empty());
        assert!(!session.is_modified());
    }
}
