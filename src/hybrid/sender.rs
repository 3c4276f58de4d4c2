//! Sender side of the PSK-authenticated exchange

use crate::error::{error_codes, CryptoError, CryptoResult};
use crate::hybrid::envelope::Envelope;
use crate::hybrid::suite::HybridEncryptionSuite;
use crate::key_management::keypair::public_key_fingerprint;
use crate::key_management::psk::PskBinder;

/// Encrypts plaintexts to a recipient public key under a derived PSK.
#[derive(Debug)]
pub struct Sender<'a> {
    binder: &'a PskBinder,
}

impl<'a> Sender<'a> {
    pub fn new(binder: &'a PskBinder) -> Self {
        Self { binder }
    }

    /// Encrypt `plaintext` for the holder of `recipient_public_key`.
    ///
    /// This function:
    /// 1. Derives the PSK from `psk_identity` and `context`
    /// 2. Sets up a PSK-mode HPKE context with `context` as `info`
    /// 3. Seals `plaintext`, authenticating `aad`
    /// 4. Returns the envelope carrying everything the receiver needs
    ///
    /// `context` should be unique per session; see
    /// [`Context::with_nonce`](crate::hybrid::Context::with_nonce).
    pub fn encrypt(
        &self,
        recipient_public_key: &[u8],
        plaintext: &[u8],
        psk_identity: &str,
        aad: &[u8],
        context: &[u8],
    ) -> CryptoResult<Envelope> {
        if psk_identity.is_empty() {
            return Err(CryptoError::invalid_parameter(
                "psk_identity",
                "a non-empty PSK identity",
                "empty string",
            ));
        }

        log::info!("Info: {}", String::from_utf8_lossy(context));

        let psk = self.binder.derive(psk_identity.as_bytes(), context)?;

        let recipient = HybridEncryptionSuite::public_key_from_bytes(recipient_public_key)
            .map_err(|e| {
                CryptoError::sender_setup_error(
                    &format!("Invalid recipient public key: {}", e),
                    error_codes::SENDER_INVALID_PUBLIC_KEY,
                )
            })?;

        let (encapped_key, mut sealer) = HybridEncryptionSuite::setup_sender(
            &recipient,
            context,
            psk.as_bytes(),
            psk_identity.as_bytes(),
        )
        .map_err(|e| {
            CryptoError::sender_setup_error(
                &format!("PSK sender setup failed: {}", e),
                error_codes::SENDER_SETUP_FAILED,
            )
        })?;

        let cipher_text = sealer
            .seal(plaintext, aad)
            .map_err(|e| CryptoError::seal_error(&e.to_string()))?;

        log::debug!(
            "Sealed {} bytes for recipient {}",
            plaintext.len(),
            public_key_fingerprint(recipient_public_key)
        );

        Ok(Envelope {
            psk_identity: psk_identity.to_string(),
            cipher_text,
            encapsulation_key: HybridEncryptionSuite::encapped_key_to_bytes(&encapped_key),
            context: context.to_vec(),
            aad: aad.to_vec(),
        })
    }
}
