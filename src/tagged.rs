//! Typed values that plain JSON cannot carry on its own.
//!
//! Each wrapper is stored as a single-key object whose key is a tag, for
//! example `{" b": "aGk="}` for bytes. Reading it back with
//! [`Session::get_as`](crate::Session::get_as) restores the original type.
//! [`TaggedJsonSerializer`](crate::TaggedJsonSerializer) checks every tag
//! payload on the way in and out, so a tampered value fails to load.
//!
//! ```
//! use seaorm_server_sessions::{tagged, Session};
//!
//! let mut session = Session::new("sid".into(), false);
//! session.insert("avatar", tagged::Bytes(vec![0xde, 0xad])).unwrap();
//!
//! let avatar: tagged::Bytes = session.get_as("avatar").unwrap().unwrap();
//! assert_eq!(avatar.0, vec![0xde, 0xad]);
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::Error as _;
use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const BYTES_TAG: &str = " b";
pub const DATETIME_TAG: &str = " d";
pub const UUID_TAG: &str = " u";

const TAGS: [&str; 3] = [BYTES_TAG, DATETIME_TAG, UUID_TAG];

/// Raw bytes, stored as standard base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bytes(pub Vec<u8>);

/// A timestamp, stored as RFC 3339 text. The offset is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime(pub OffsetDateTime);

/// A UUID, stored in its hyphenated form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uuid(pub uuid::Uuid);

fn serialize_tagged<S: Serializer>(
    serializer: S,
    tag: &str,
    payload: &str,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(tag, payload)?;
    map.end()
}

impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_tagged(serializer, BYTES_TAG, &STANDARD.encode(&self.0))
    }
}

impl Serialize for DateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self.0.format(&Rfc3339).map_err(S::Error::custom)?;
        serialize_tagged(serializer, DATETIME_TAG, &text)
    }
}

impl Serialize for Uuid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_tagged(serializer, UUID_TAG, &self.0.hyphenated().to_string())
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BytesRepr {
    #[serde(rename = " b")]
    payload: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DateTimeRepr {
    #[serde(rename = " d")]
    payload: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UuidRepr {
    #[serde(rename = " u")]
    payload: String,
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = BytesRepr::deserialize(deserializer)?;
        decode_bytes(&repr.payload).map(Self).map_err(D::Error::custom)
    }
}

impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = DateTimeRepr::deserialize(deserializer)?;
        decode_datetime(&repr.payload).map(Self).map_err(D::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Uuid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = UuidRepr::deserialize(deserializer)?;
        decode_uuid(&repr.payload).map(Self).map_err(D::Error::custom)
    }
}

fn decode_bytes(payload: &str) -> Result<Vec<u8>, String> {
    STANDARD
        .decode(payload)
        .map_err(|e| format!("bytes tag: {e}"))
}

fn decode_datetime(payload: &str) -> Result<OffsetDateTime, String> {
    OffsetDateTime::parse(payload, &Rfc3339).map_err(|e| format!("datetime tag: {e}"))
}

fn decode_uuid(payload: &str) -> Result<uuid::Uuid, String> {
    uuid::Uuid::parse_str(payload).map_err(|e| format!("uuid tag: {e}"))
}

/// Returns the tag and payload if `map` is a tagged value.
fn tagged_entry(map: &Map<String, Value>) -> Option<(&str, &Value)> {
    if map.len() != 1 {
        return None;
    }
    let (key, payload) = map.iter().next()?;
    TAGS.contains(&key.as_str()).then_some((key.as_str(), payload))
}

/// Walks `value` and checks that every tagged object carries a payload its
/// wrapper type can decode.
pub(crate) fn validate(value: &Value) -> Result<(), String> {
    match value {
        Value::Array(items) => items.iter().try_for_each(validate),
        Value::Object(map) => match tagged_entry(map) {
            Some((tag, payload)) => {
                let text = payload
                    .as_str()
                    .ok_or_else(|| format!("tag `{tag}` expects a string payload"))?;
                match tag {
                    BYTES_TAG => decode_bytes(text).map(drop),
                    DATETIME_TAG => decode_datetime(text).map(drop),
                    _ => decode_uuid(text).map(drop),
                }
            }
            None => map.values().try_for_each(validate),
        },
        _ => Ok(()),
    }
}
