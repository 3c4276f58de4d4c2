//! PSK-authenticated hybrid public-key encryption
//!
//! A sender encrypts to a recipient's KEM public key while binding the
//! ciphertext to a pre-shared key derived from a hardware-held MAC key. The
//! receiver re-derives the same PSK from the envelope's PSK identity and
//! context, then reverses the encapsulation.

mod context;
mod envelope;
mod receiver;
mod sender;
mod suite;

pub use context::{Context, DEFAULT_INFO_PREFIX};

pub use envelope::Envelope;

pub use receiver::Receiver;

pub use sender::Sender;

pub use suite::{
    EncappedKey,
    HybridEncryptionSuite,
    OpeningContext,
    PrivateKey,
    PublicKey,
    SealingContext,
    ENCAPPED_KEY_SIZE,
    PRIVATE_KEY_SIZE,
    PUBLIC_KEY_SIZE,
};

use crate::error::CryptoResult;
use crate::key_management::psk::PskBinder;

/// Encrypt `plaintext` to `recipient_public_key` under a PSK derived by `binder`
pub fn encrypt_with_psk(
    binder: &PskBinder,
    recipient_public_key: &[u8],
    plaintext: &[u8],
    psk_identity: &str,
    aad: &[u8],
    context: &[u8],
) -> CryptoResult<Envelope> {
    Sender::new(binder).encrypt(recipient_public_key, plaintext, psk_identity, aad, context)
}

/// Decrypt `envelope` with `recipient_private_key`, re-deriving the PSK with `binder`
pub fn decrypt_with_psk(
    binder: &PskBinder,
    recipient_private_key: &[u8],
    envelope: &Envelope,
) -> CryptoResult<Vec<u8>> {
    Receiver::new(binder).decrypt(recipient_private_key, envelope)
}
