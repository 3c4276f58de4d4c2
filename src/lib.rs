/*!
 * HPKE-PSK Hybrid Encryption
 *
 * This crate implements hybrid public-key encryption in pre-shared-key mode,
 * where the pre-shared key of every session is derived on demand from a
 * secret that never leaves a hardware MAC device.
 *
 * The building blocks are:
 *
 * - HPKE (RFC 9180) with DHKEM(P-256, HKDF-SHA256), HKDF-SHA384 and AES-256-GCM
 * - HMAC-SHA256 computed by a PKCS#11 token (or an explicit software fallback)
 *   over the PSK identity followed by the session context
 * - A JSON envelope carrying the ciphertext and everything the recipient
 *   needs to reverse it
 *
 * Tampering with any envelope field makes decryption fail as a whole.
 */

/// Common error types
pub mod error;

/// Secure memory handling utilities
pub mod secure_memory;

/// PSK-mode hybrid encryption: sender, receiver and envelope
pub mod hybrid;

/// Key pairs, key files and PSK derivation
pub mod key_management;

/// Shared pieces of the command-line programs
pub mod cli;

pub use error::{CryptoError, CryptoResult};
pub use hybrid::{decrypt_with_psk, encrypt_with_psk, Context, Envelope, Receiver, Sender};
pub use key_management::{KeyPair, KeyPairService, PskBinder};

/// The types needed for a full generate, encrypt and decrypt round.
///
/// ```no_run
/// use std::sync::Arc;
/// use hpke_psk::prelude::*;
///
/// fn main() -> Result<(), CryptoError> {
///     let config = HsmConfig::default();
///     let (device, key) = config.locators();
///     let binder = PskBinder::hardware(Arc::new(Pkcs11Mac::from_config(&config)), device, key);
///
///     let bob = KeyPairService.generate()?;
///     let context = Context::with_nonce(DEFAULT_INFO_PREFIX.as_bytes());
///     let envelope = Sender::new(&binder).encrypt(
///         &bob.public_key,
///         b"hello",
///         "mypsk-id",
///         b"additional public data",
///         &context,
///     )?;
///
///     let plaintext = Receiver::new(&binder).decrypt(bob.private_key.as_bytes(), &envelope)?;
///     assert_eq!(plaintext, b"hello");
///     Ok(())
/// }
/// ```
pub mod prelude {
    pub use crate::error::{CryptoError, CryptoResult};
    pub use crate::hybrid::{
        decrypt_with_psk,
        encrypt_with_psk,
        Context,
        Envelope,
        HybridEncryptionSuite,
        Receiver,
        Sender,
        DEFAULT_INFO_PREFIX,
    };
    pub use crate::key_management::{
        load_envelope,
        load_key_pair,
        load_private_key,
        load_public_key,
        store_envelope,
        store_key_pair,
        DerivationMode,
        HardwareMac,
        HsmConfig,
        KeyPair,
        KeyPairService,
        Pkcs11Mac,
        PskBinder,
        SoftwareHmac,
    };
    pub use crate::secure_memory::SecureBytes;
}
