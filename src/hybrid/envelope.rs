//! Envelope (KEM token) wire format
//!
//! The envelope is exchanged as a JSON object:
//!
//! ```json
//! {
//!   "pskIdentity": "mypsk-id",
//!   "cipherText": "<base64>",
//!   "encapsulationKey": "<base64>",
//!   "context": "<base64>",
//!   "aad": "<base64>"
//! }
//! ```
//!
//! Binary fields use standard base64 with padding. Field names and encoding
//! are fixed so that stored envelopes from other implementations still load.

use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};

/// Transport unit produced by a sender and consumed once by a receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "pskIdentity")]
    pub psk_identity: String,

    #[serde(rename = "cipherText", with = "base64_bytes")]
    pub cipher_text: Vec<u8>,

    #[serde(rename = "encapsulationKey", with = "base64_bytes")]
    pub encapsulation_key: Vec<u8>,

    #[serde(with = "base64_bytes")]
    pub context: Vec<u8>,

    #[serde(with = "base64_bytes")]
    pub aad: Vec<u8>,
}

impl Envelope {
    /// Pretty JSON with two-space indentation
    pub fn to_json(&self) -> CryptoResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_json_compact(&self) -> CryptoResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> CryptoResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_slice(json: &[u8]) -> CryptoResult<Self> {
        Ok(serde_json::from_slice(json)?)
    }

    /// Structural checks done before any key operation
    pub fn validate(&self) -> CryptoResult<()> {
        if self.psk_identity.is_empty() {
            return Err(CryptoError::invalid_parameter(
                "pskIdentity",
                "a non-empty PSK identity",
                "empty string",
            ));
        }
        if self.encapsulation_key.is_empty() {
            return Err(CryptoError::invalid_parameter(
                "encapsulationKey",
                "a non-empty encapsulated key",
                "empty",
            ));
        }
        if self.cipher_text.is_empty() {
            return Err(CryptoError::invalid_parameter(
                "cipherText",
                "a non-empty ciphertext",
                "empty",
            ));
        }
        Ok(())
    }
}

/// Serde adapter for binary fields carried as base64 text.
///
/// A JSON `null` decodes as an empty byte string.
mod base64_bytes {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        match encoded {
            None => Ok(Vec::new()),
            Some(text) => base64::decode(text.as_bytes()).map_err(D::Error::custom),
        }
    }
}
