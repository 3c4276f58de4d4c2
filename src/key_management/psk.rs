/*!
 * Pre-shared key derivation
 *
 * The PSK for a session is a MAC over `psk_identity || context`, computed
 * by a hardware-backed MAC service so the underlying secret never leaves
 * the device. A software HMAC-SHA256 over the same bytes is available as
 * an explicitly selected fallback.
 */

use std::fmt;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{error_codes, CryptoError, CryptoResult};
use crate::secure_memory::SecureBytes;

type HmacSha256 = Hmac<Sha256>;

/// A MAC service holding key material the caller cannot read.
///
/// Implementations must be deterministic for a given key and message and
/// must release any device session before returning.
pub trait HardwareMac: Send + Sync {
    /// Compute a MAC over `message` with the key found at
    /// `key_material_locator` on the device at `device_locator`.
    fn compute_mac(
        &self,
        device_locator: &str,
        key_material_locator: &str,
        message: &[u8],
    ) -> CryptoResult<Vec<u8>>;
}

/// Software HMAC-SHA256 keyed by a locally held secret
#[derive(Clone)]
pub struct SoftwareHmac {
    secret: SecureBytes,
}

impl SoftwareHmac {
    pub fn new(secret: SecureBytes) -> CryptoResult<Self> {
        if secret.is_empty() {
            return Err(CryptoError::invalid_parameter(
                "psk secret",
                "a non-empty HMAC secret",
                "empty",
            ));
        }
        Ok(Self { secret })
    }

    pub fn compute(&self, message: &[u8]) -> CryptoResult<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).map_err(|e| {
            CryptoError::key_derivation_error(
                "software_hmac",
                &e.to_string(),
                error_codes::MAC_COMPUTATION_FAILED,
            )
        })?;
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl fmt::Debug for SoftwareHmac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwareHmac")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// The derived pre-shared key. Never persisted, logged or serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedPsk(SecureBytes);

impl DerivedPsk {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for DerivedPsk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedPsk([REDACTED])")
    }
}

/// Which MAC backs a [`PskBinder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationMode {
    Hardware,
    Software,
}

enum MacSource {
    Hardware {
        mac: Arc<dyn HardwareMac>,
        device_locator: String,
        key_material_locator: String,
    },
    Software(SoftwareHmac),
}

/// Derives the session PSK from a PSK identity and a context.
pub struct PskBinder {
    source: MacSource,
}

impl PskBinder {
    /// Derive through a hardware MAC service
    pub fn hardware(
        mac: Arc<dyn HardwareMac>,
        device_locator: impl Into<String>,
        key_material_locator: impl Into<String>,
    ) -> Self {
        Self {
            source: MacSource::Hardware {
                mac,
                device_locator: device_locator.into(),
                key_material_locator: key_material_locator.into(),
            },
        }
    }

    /// Derive with a software HMAC. Both parties must use the same secret.
    pub fn software(hmac: SoftwareHmac) -> Self {
        Self {
            source: MacSource::Software(hmac),
        }
    }

    pub fn mode(&self) -> DerivationMode {
        match self.source {
            MacSource::Hardware { .. } => DerivationMode::Hardware,
            MacSource::Software(_) => DerivationMode::Software,
        }
    }

    /// The MAC input: identity bytes immediately followed by context bytes.
    ///
    /// No separator or length prefix; counterpart implementations depend on
    /// this exact layout.
    pub fn combined_key(psk_identity: &[u8], context: &[u8]) -> Vec<u8> {
        [psk_identity, context].concat()
    }

    /// Derive the PSK for `(psk_identity, context)`.
    ///
    /// Failures are returned as-is; there is no retry and no fallback to the
    /// software path.
    pub fn derive(&self, psk_identity: &[u8], context: &[u8]) -> CryptoResult<DerivedPsk> {
        let combined_key = Self::combined_key(psk_identity, context);

        let mac = match &self.source {
            MacSource::Hardware {
                mac,
                device_locator,
                key_material_locator,
            } => {
                log::debug!(
                    "Deriving PSK with hardware MAC (device: {}, key: {})",
                    device_locator,
                    key_material_locator
                );
                mac.compute_mac(device_locator, key_material_locator, &combined_key)?
            }
            MacSource::Software(hmac) => {
                log::warn!("Deriving PSK with software HMAC-SHA256 fallback");
                hmac.compute(&combined_key)?
            }
        };

        if mac.is_empty() {
            return Err(CryptoError::key_derivation_error(
                "derive",
                "MAC service returned an empty MAC",
                error_codes::MAC_EMPTY_OUTPUT,
            ));
        }

        Ok(DerivedPsk(SecureBytes::from(mac)))
    }
}

impl fmt::Debug for PskBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            MacSource::Hardware {
                device_locator,
                key_material_locator,
                ..
            } => f
                .debug_struct("PskBinder")
                .field("mode", &DerivationMode::Hardware)
                .field("device_locator", device_locator)
                .field("key_material_locator", key_material_locator)
                .finish(),
            MacSource::Software(_) => f
                .debug_struct("PskBinder")
                .field("mode", &DerivationMode::Software)
                .finish(),
        }
    }
}
