//! HPKE suite binding
//!
//! The suite is a fixed domain parameter shared by sender and receiver:
//! DHKEM(P-256, HKDF-SHA256) for key encapsulation, HKDF-SHA384 for the key
//! schedule and AES-256-GCM for the AEAD, run in RFC 9180 `mode_psk`.
//!
//! Everything the protocol needs from the primitives goes through
//! [`HybridEncryptionSuite`]; key encodings stay opaque byte strings
//! everywhere else in the crate.

use hpke::aead::{AeadCtxR, AeadCtxS, AesGcm256};
use hpke::kdf::HkdfSha384;
use hpke::kem::DhP256HkdfSha256;
use hpke::{Deserializable, HpkeError, Kem as KemTrait, OpModeR, OpModeS, PskBundle, Serializable};
use rand::rngs::OsRng;

/// KEM used for key encapsulation
pub type SuiteKem = DhP256HkdfSha256;
/// KDF used by the HPKE key schedule
pub type SuiteKdf = HkdfSha384;
/// AEAD used to seal the payload
pub type SuiteAead = AesGcm256;

/// Recipient public key of the configured KEM
pub type PublicKey = <SuiteKem as KemTrait>::PublicKey;
/// Recipient private key of the configured KEM
pub type PrivateKey = <SuiteKem as KemTrait>::PrivateKey;
/// Encapsulated key produced by the sender
pub type EncappedKey = <SuiteKem as KemTrait>::EncappedKey;

/// Length of a serialized public key (uncompressed SEC1 point)
pub const PUBLIC_KEY_SIZE: usize = 65;
/// Length of a serialized private key (big-endian scalar)
pub const PRIVATE_KEY_SIZE: usize = 32;
/// Length of a serialized encapsulated key
pub const ENCAPPED_KEY_SIZE: usize = 65;

/// The black-box hybrid encryption capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridEncryptionSuite;

impl HybridEncryptionSuite {
    /// Human-readable name of the suite for log lines
    pub fn suite_name() -> &'static str {
        "DHKEM(P-256, HKDF-SHA256) / HKDF-SHA384 / AES-256-GCM"
    }

    /// Generate a fresh KEM key pair from the OS RNG
    pub fn generate_key_pair() -> (PrivateKey, PublicKey) {
        SuiteKem::gen_keypair(&mut OsRng)
    }

    /// Public key matching a private key
    pub fn public_key_of(private_key: &PrivateKey) -> PublicKey {
        SuiteKem::sk_to_pk(private_key)
    }

    pub fn public_key_from_bytes(bytes: &[u8]) -> Result<PublicKey, HpkeError> {
        <PublicKey as Deserializable>::from_bytes(bytes)
    }

    pub fn private_key_from_bytes(bytes: &[u8]) -> Result<PrivateKey, HpkeError> {
        <PrivateKey as Deserializable>::from_bytes(bytes)
    }

    pub fn encapped_key_from_bytes(bytes: &[u8]) -> Result<EncappedKey, HpkeError> {
        <EncappedKey as Deserializable>::from_bytes(bytes)
    }

    pub fn public_key_to_bytes(public_key: &PublicKey) -> Vec<u8> {
        public_key.to_bytes().to_vec()
    }

    pub fn private_key_to_bytes(private_key: &PrivateKey) -> Vec<u8> {
        private_key.to_bytes().to_vec()
    }

    pub fn encapped_key_to_bytes(encapped_key: &EncappedKey) -> Vec<u8> {
        encapped_key.to_bytes().to_vec()
    }

    /// Set up a PSK-mode sender context against `recipient`.
    ///
    /// `info` is bound into the key schedule. An empty `psk` or `psk_id` is
    /// rejected with [`HpkeError::ValidationError`].
    pub fn setup_sender(
        recipient: &PublicKey,
        info: &[u8],
        psk: &[u8],
        psk_id: &[u8],
    ) -> Result<(EncappedKey, SealingContext), HpkeError> {
        let bundle = psk_bundle(psk, psk_id)?;
        let (encapped_key, ctx) = hpke::setup_sender::<SuiteAead, SuiteKdf, SuiteKem, _>(
            &OpModeS::Psk(bundle),
            recipient,
            info,
            &mut OsRng,
        )?;

        Ok((encapped_key, SealingContext { inner: ctx }))
    }

    /// Set up the matching PSK-mode receiver context.
    ///
    /// Applies the same `psk`/`psk_id` checks as [`Self::setup_sender`].
    pub fn setup_receiver(
        recipient: &PrivateKey,
        encapped_key: &EncappedKey,
        info: &[u8],
        psk: &[u8],
        psk_id: &[u8],
    ) -> Result<OpeningContext, HpkeError> {
        let bundle = psk_bundle(psk, psk_id)?;
        let ctx = hpke::setup_receiver::<SuiteAead, SuiteKdf, SuiteKem>(
            &OpModeR::Psk(bundle),
            recipient,
            encapped_key,
            info,
        )?;

        Ok(OpeningContext { inner: ctx })
    }
}

// RFC 9180 VerifyPSKInputs: mode_psk needs both values present
fn psk_bundle<'a>(psk: &'a [u8], psk_id: &'a [u8]) -> Result<PskBundle<'a>, HpkeError> {
    if psk.is_empty() || psk_id.is_empty() {
        return Err(HpkeError::ValidationError);
    }
    Ok(PskBundle { psk, psk_id })
}

/// Sender half of an established HPKE context
pub struct SealingContext {
    inner: AeadCtxS<SuiteAead, SuiteKdf, SuiteKem>,
}

impl SealingContext {
    /// Encrypt `plaintext`, authenticating `aad` alongside it
    pub fn seal(&mut self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, HpkeError> {
        self.inner.seal(plaintext, aad)
    }
}

/// Receiver half of an established HPKE context
pub struct OpeningContext {
    inner: AeadCtxR<SuiteAead, SuiteKdf, SuiteKem>,
}

impl OpeningContext {
    /// Decrypt and authenticate `ciphertext` under `aad`
    pub fn open(&mut self, ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>, HpkeError> {
        self.inner.open(ciphertext, aad)
    }
}
