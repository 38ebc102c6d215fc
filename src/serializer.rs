//! Conversion between session contents and the stored `data` column.

use std::fmt::Debug;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{Error, Result};
use crate::session::SessionMap;
use crate::tagged;

/// Turns session contents into the text stored in a record, and back.
///
/// `loads` must fail on malformed input rather than return partial or
/// defaulted contents: the open phase relies on that failure to discard a
/// corrupt session.
pub trait Serializer: Debug + Send + Sync {
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if the contents cannot be represented.
    fn dumps(&self, contents: &SessionMap) -> Result<String>;

    /// # Errors
    ///
    /// Returns [`Error::Decode`] if `data` is not a valid payload.
    fn loads(&self, data: &str) -> Result<SessionMap>;
}

/// Stores contents as a plain JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn dumps(&self, contents: &SessionMap) -> Result<String> {
        serde_json::to_string(contents).map_err(|e| Error::Encode(e.to_string()))
    }

    fn loads(&self, data: &str) -> Result<SessionMap> {
        serde_json::from_str(data).map_err(|e| Error::Decode(e.to_string()))
    }
}

/// Stores contents as JSON that may carry [`tagged`] values (bytes,
/// timestamps, UUIDs). The default serializer.
///
/// Both directions check every tag payload: contents holding a tag object
/// that does not decode fail with [`Error::Encode`], stored data holding one
/// fails with [`Error::Decode`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TaggedJsonSerializer;

impl Serializer for TaggedJsonSerializer {
    fn dumps(&self, contents: &SessionMap) -> Result<String> {
        contents
            .values()
            .try_for_each(tagged::validate)
            .map_err(Error::Encode)?;
        serde_json::to_string(contents).map_err(|e| Error::Encode(e.to_string()))
    }

    fn loads(&self, data: &str) -> Result<SessionMap> {
        let contents: SessionMap =
            serde_json::from_str(data).map_err(|e| Error::Decode(e.to_string()))?;
        contents
            .values()
            .try_for_each(tagged::validate)
            .map_err(Error::Decode)?;
        Ok(contents)
    }
}

/// Stores contents as MessagePack, carried as unpadded base64url text so
/// the column stays textual.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessagePackSerializer;

impl Serializer for MessagePackSerializer {
    fn dumps(&self, contents: &SessionMap) -> Result<String> {
        let bytes = rmp_serde::to_vec_named(contents).map_err(|e| Error::Encode(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    fn loads(&self, data: &str) -> Result<SessionMap> {
        let bytes = URL_SAFE_NO_PAD
            .decode(data)
            .map_err(|e| Error::Decode(e.to_string()))?;
        rmp_serde::from_slice(&bytes).map_err(|e| Error::Decode(e.to_string()))
    }
}
