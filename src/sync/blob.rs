use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;
use tracing::warn;

/// An opaque JSON document carried between clients and the store.
///
/// Incoming documents are parsed and re-serialized to canonical text:
/// compact, object keys sorted, the last of any duplicate keys kept. Stored
/// text is handed back verbatim.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct SyncBlob(Box<RawValue>);

impl<'de> Deserialize<'de> for SyncBlob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let raw = RawValue::from_string(value.to_string()).map_err(serde::de::Error::custom)?;
        Ok(SyncBlob(raw))
    }
}

impl SyncBlob {
    fn from_literal(json: &'static str) -> Self {
        // Only called with the JSON literals below.
        SyncBlob(RawValue::from_string(json.to_owned()).expect("static JSON literal"))
    }

    /// What a pull returns for a collection that was never stored.
    pub fn empty_array() -> Self {
        Self::from_literal("[]")
    }

    pub fn null() -> Self {
        Self::from_literal("null")
    }

    pub fn as_str(&self) -> &str {
        self.0.get()
    }

    /// Bytes to persist for an optional pushed blob. Absence is stored as
    /// the JSON literal `null`.
    pub fn to_stored(blob: Option<&SyncBlob>) -> Vec<u8> {
        blob.map(SyncBlob::as_str)
            .unwrap_or("null")
            .as_bytes()
            .to_vec()
    }

    /// Turns a stored column back into a blob: nothing stored reads as `[]`,
    /// bytes that are not JSON read as `null`.
    pub fn from_stored(stored: Option<&[u8]>) -> Self {
        match stored {
            None => Self::empty_array(),
            Some(bytes) if bytes.is_empty() => Self::empty_array(),
            Some(bytes) => match serde_json::from_slice::<Box<RawValue>>(bytes) {
                Ok(raw) => SyncBlob(raw),
                Err(err) => {
                    warn!("Stored sync blob is not valid JSON, returning null: {}", err);
                    Self::null()
                }
            },
        }
    }
}

impl PartialEq for SyncBlob {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}
