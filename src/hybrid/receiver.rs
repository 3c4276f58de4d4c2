//! Receiver side of the PSK-authenticated exchange

use crate::error::{error_codes, CryptoError, CryptoResult};
use crate::hybrid::envelope::Envelope;
use crate::hybrid::suite::HybridEncryptionSuite;
use crate::key_management::psk::PskBinder;

/// Recovers plaintexts from envelopes addressed to a private key.
#[derive(Debug)]
pub struct Receiver<'a> {
    binder: &'a PskBinder,
}

impl<'a> Receiver<'a> {
    pub fn new(binder: &'a PskBinder) -> Self {
        Self { binder }
    }

    /// Decrypt `envelope` with `recipient_private_key`.
    ///
    /// This function:
    /// 1. Re-derives the PSK from the envelope's own identity and context
    /// 2. Sets up the PSK-mode receiver context from the encapsulated key
    /// 3. Opens the ciphertext under the envelope's AAD
    ///
    /// Any mismatch in PSK, context, AAD or ciphertext ends in
    /// [`CryptoError::AuthenticationFailure`]; there is no partial output.
    pub fn decrypt(&self, recipient_private_key: &[u8], envelope: &Envelope) -> CryptoResult<Vec<u8>> {
        envelope.validate()?;

        log::info!("Info: {}", String::from_utf8_lossy(&envelope.context));

        let psk_identity = envelope.psk_identity.as_bytes();
        let psk = self.binder.derive(psk_identity, &envelope.context)?;

        let recipient = HybridEncryptionSuite::private_key_from_bytes(recipient_private_key)
            .map_err(|_| {
                CryptoError::decapsulation_error(
                    "recipient private key does not decode",
                    error_codes::RECEIVER_INVALID_PRIVATE_KEY,
                )
            })?;

        let encapped_key = HybridEncryptionSuite::encapped_key_from_bytes(&envelope.encapsulation_key)
            .map_err(|_| {
                CryptoError::decapsulation_error(
                    "encapsulated key does not decode",
                    error_codes::DECAPSULATION_FAILED,
                )
            })?;

        let mut opener = HybridEncryptionSuite::setup_receiver(
            &recipient,
            &encapped_key,
            &envelope.context,
            psk.as_bytes(),
            psk_identity,
        )
        .map_err(|_| {
            CryptoError::decapsulation_error(
                "receiver setup failed",
                error_codes::DECAPSULATION_FAILED,
            )
        })?;

        let plaintext = opener
            .open(&envelope.cipher_text, &envelope.aad)
            .map_err(|_| CryptoError::authentication_failure())?;

        log::debug!("Opened {} bytes", plaintext.len());
        Ok(plaintext)
    }
}
