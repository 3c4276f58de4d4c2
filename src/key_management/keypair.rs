//! KEM key pair generation and (de)serialization

use std::fmt;

use sha2::{Digest, Sha256};

use crate::error::{error_codes, CryptoError, CryptoResult};
use crate::hybrid::HybridEncryptionSuite;
use crate::secure_memory::SecureBytes;

/// A public/private KEM key pair in the suite's binary encodings.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// Uncompressed SEC1 public point
    pub public_key: Vec<u8>,
    /// Private scalar
    pub private_key: SecureBytes,
}

impl KeyPair {
    /// First 8 bytes of SHA-256 over the public key, hex encoded
    pub fn fingerprint(&self) -> String {
        public_key_fingerprint(&self.public_key)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex::encode(&self.public_key))
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Fingerprint of an encoded public key, suitable for log lines
pub fn public_key_fingerprint(public_key: &[u8]) -> String {
    let digest = Sha256::digest(public_key);
    hex::encode(&digest[..8])
}

/// Produces and decodes key pairs for the configured KEM
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyPairService;

impl KeyPairService {
    /// Generate a fresh key pair
    pub fn generate(&self) -> CryptoResult<KeyPair> {
        log::info!(
            "Generating key of type {}",
            HybridEncryptionSuite::suite_name()
        );

        let (private_key, public_key) = HybridEncryptionSuite::generate_key_pair();

        let key_pair = KeyPair {
            public_key: HybridEncryptionSuite::public_key_to_bytes(&public_key),
            private_key: SecureBytes::from(HybridEncryptionSuite::private_key_to_bytes(&private_key)),
        };

        if key_pair.public_key.is_empty() || key_pair.private_key.is_empty() {
            return Err(CryptoError::key_generation_error(
                "generate",
                "KEM produced an empty key encoding",
                error_codes::KEY_GENERATION_FAILED,
            ));
        }

        log::info!("Generated key pair {}", key_pair.fingerprint());
        Ok(key_pair)
    }

    /// `(public_bytes, private_bytes)`
    pub fn serialize(&self, key_pair: &KeyPair) -> (Vec<u8>, Vec<u8>) {
        (
            key_pair.public_key.clone(),
            key_pair.private_key.as_bytes().to_vec(),
        )
    }

    /// Decode and check a key pair.
    ///
    /// Both encodings must be valid for the suite and the public key must be
    /// the one belonging to the private key.
    pub fn deserialize(&self, public_bytes: &[u8], private_bytes: &[u8]) -> CryptoResult<KeyPair> {
        let public_key = HybridEncryptionSuite::public_key_from_bytes(public_bytes).map_err(|e| {
            CryptoError::invalid_parameter("public_key", "a P-256 public key", &e.to_string())
        })?;
        let private_key = HybridEncryptionSuite::private_key_from_bytes(private_bytes).map_err(|_| {
            CryptoError::invalid_parameter("private_key", "a P-256 private key", "undecodable bytes")
        })?;

        let expected = HybridEncryptionSuite::public_key_of(&private_key);
        if HybridEncryptionSuite::public_key_to_bytes(&expected)
            != HybridEncryptionSuite::public_key_to_bytes(&public_key)
        {
            return Err(CryptoError::invalid_parameter(
                "key_pair",
                "a public key matching the private key",
                "mismatched keys",
            ));
        }

        Ok(KeyPair {
            public_key: public_bytes.to_vec(),
            private_key: SecureBytes::new(private_bytes),
        })
    }
}
