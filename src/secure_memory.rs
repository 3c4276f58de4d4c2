//! Secure Memory Handling Utilities
//!
//! Containers for the secret byte strings this crate touches: private KEM
//! keys, derived pre-shared keys, software HMAC secrets and token PINs.
//! Contents are zeroed when dropped, never printed by `Debug`, and compared
//! in constant time.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A byte container for sensitive data that is zeroed when dropped.
///
/// # Example
///
/// ```
/// use hpke_psk::secure_memory::SecureBytes;
///
/// let key = SecureBytes::new(&[0x01, 0x02, 0x03, 0x04]);
/// assert_eq!(key.len(), 4);
/// assert_eq!(format!("{:?}", key), "SecureBytes([REDACTED; 4 bytes])");
/// ```
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecureBytes {
    bytes: Vec<u8>,
}

impl SecureBytes {
    /// Create a new SecureBytes holding a copy of `data`
    pub fn new(data: &[u8]) -> Self {
        Self {
            bytes: data.to_vec(),
        }
    }

    /// Get a reference to the underlying bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the container and return the contained bytes
    ///
    /// The caller becomes responsible for wiping the returned vector.
    pub fn into_vec(mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }

    /// Number of bytes held
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer holds no data
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SecureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureBytes([REDACTED; {} bytes])", self.bytes.len())
    }
}

impl PartialEq for SecureBytes {
    fn eq(&self, other: &Self) -> bool {
        // ct_eq on slices of different length returns false without
        // looking at the contents
        self.bytes.as_slice().ct_eq(other.bytes.as_slice()).into()
    }
}

impl Eq for SecureBytes {}

impl From<Vec<u8>> for SecureBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for SecureBytes {
    fn from(data: &[u8]) -> Self {
        Self::new(data)
    }
}

impl From<String> for SecureBytes {
    fn from(value: String) -> Self {
        Self {
            bytes: value.into_bytes(),
        }
    }
}

impl AsRef<[u8]> for SecureBytes {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecureBytes::new(b"super-secret-pin");
        let printed = format!("{:?}", secret);
        assert!(!printed.contains("super"));
        assert!(printed.contains("REDACTED"));
    }

    #[test]
    fn test_equality() {
        let a = SecureBytes::new(&[1, 2, 3]);
        let b = SecureBytes::from(vec![1, 2, 3]);
        let c = SecureBytes::new(&[1, 2, 4]);
        let d = SecureBytes::new(&[1, 2]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_into_vec() {
        let secret = SecureBytes::from(String::from("pin"));
        assert_eq!(secret.into_vec(), b"pin".to_vec());
    }

    #[test]
    fn test_empty() {
        let empty = SecureBytes::default();
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);
    }
}
