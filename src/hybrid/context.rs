//! Public context strings
//!
//! The context is bound both into the PSK derivation and into the HPKE
//! `info` parameter. A sender normally appends a random nonce so that no two
//! sessions share a context.

use std::fmt;
use std::ops::Deref;

use uuid::Uuid;

/// Base info string used by the command-line tools
pub const DEFAULT_INFO_PREFIX: &str = "public info string, known to both Alice and Bob with nonce ";

/// Public byte string shared by sender and receiver
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Context(Vec<u8>);

impl Context {
    /// `base_info` followed by a random v4 UUID in hyphenated text form
    pub fn with_nonce(base_info: &[u8]) -> Self {
        let nonce = Uuid::new_v4().hyphenated().to_string();

        let mut bytes = Vec::with_capacity(base_info.len() + nonce.len());
        bytes.extend_from_slice(base_info);
        bytes.extend_from_slice(nonce.as_bytes());
        Context(bytes)
    }

    /// Use `bytes` verbatim
    pub fn fixed(bytes: impl Into<Vec<u8>>) -> Self {
        Context(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for Context {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Context {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Context({:?})", String::from_utf8_lossy(&self.0))
    }
}

impl From<&[u8]> for Context {
    fn from(bytes: &[u8]) -> Self {
        Context(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Context {
    fn from(bytes: Vec<u8>) -> Self {
        Context(bytes)
    }
}
