/*!
 * Error Handling for the PSK-authenticated hybrid encryption protocol
 *
 * Provides typed errors with numeric codes, user-facing messages and
 * suggested remediation. Failures on the decrypt path share one
 * user-facing message so the calling layer cannot be turned into a
 * decryption oracle.
 */

use std::collections::HashMap;
use thiserror::Error;

/// Error type for all protocol operations
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Key generation failed: {operation} - {cause}")]
    KeyGenerationError {
        operation: String,
        cause: String,
        error_code: u32,
    },

    #[error("PSK derivation failed: {operation} - {cause}")]
    KeyDerivationError {
        operation: String,
        cause: String,
        error_code: u32,
        context: HashMap<String, String>,
    },

    #[error("Sender setup failed: {cause}")]
    SenderSetupError { cause: String, error_code: u32 },

    #[error("Seal failed: {cause}")]
    SealError { cause: String, error_code: u32 },

    // Same text as AuthenticationFailure; the cause stays in the field only
    #[error("Decryption failed")]
    DecapsulationError { cause: String, error_code: u32 },

    #[error("Decryption failed")]
    AuthenticationFailure { error_code: u32 },

    #[error("Invalid parameter: {parameter} - {expected} - got {actual}")]
    InvalidParameter {
        parameter: String,
        expected: String,
        actual: String,
        error_code: u32,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Error code constants for different error categories
pub mod error_codes {
    // Key generation errors: 1000-1999
    pub const KEY_GENERATION_FAILED: u32 = 1001;
    pub const KEY_ENCODING_FAILED: u32 = 1002;

    // PSK derivation errors: 2000-2999
    pub const MAC_DEVICE_UNAVAILABLE: u32 = 2001;
    pub const MAC_KEY_MATERIAL_UNAVAILABLE: u32 = 2002;
    pub const MAC_COMPUTATION_FAILED: u32 = 2003;
    pub const MAC_EMPTY_OUTPUT: u32 = 2004;

    // Sender errors: 3000-3999
    pub const SENDER_INVALID_PUBLIC_KEY: u32 = 3001;
    pub const SENDER_SETUP_FAILED: u32 = 3002;
    pub const SEAL_FAILED: u32 = 3003;

    // Receiver errors: 4000-4999
    /// Reported outwards for every decrypt-path failure
    pub const DECRYPTION_FAILED: u32 = 4000;
    pub const RECEIVER_INVALID_PRIVATE_KEY: u32 = 4001;
    pub const DECAPSULATION_FAILED: u32 = 4002;
    pub const AUTHENTICATION_FAILED: u32 = 4003;

    // Plumbing errors: 9000-9999
    pub const SERIALIZATION_FAILED: u32 = 9001;
    pub const IO_FAILED: u32 = 9002;
    pub const INVALID_PARAMETER: u32 = 9999;
}

impl CryptoError {
    /// Get the numeric error code for this error
    ///
    /// Decrypt-path failures all report [`error_codes::DECRYPTION_FAILED`];
    /// the specific code is kept in the variant for in-process matching.
    pub fn error_code(&self) -> u32 {
        match self {
            CryptoError::KeyGenerationError { error_code, .. } => *error_code,
            CryptoError::KeyDerivationError { error_code, .. } => *error_code,
            CryptoError::SenderSetupError { error_code, .. } => *error_code,
            CryptoError::SealError { error_code, .. } => *error_code,
            CryptoError::DecapsulationError { .. } | CryptoError::AuthenticationFailure { .. } => {
                error_codes::DECRYPTION_FAILED
            }
            CryptoError::InvalidParameter { error_code, .. } => *error_code,
            CryptoError::SerializationError(_) => error_codes::SERIALIZATION_FAILED,
            CryptoError::IoError(_) => error_codes::IO_FAILED,
        }
    }

    /// Whether this error came from an attempt to open a ciphertext.
    ///
    /// Decapsulation and authentication failures both answer `true` and are
    /// meant to be reported identically.
    pub fn is_decryption_failure(&self) -> bool {
        matches!(
            self,
            CryptoError::DecapsulationError { .. } | CryptoError::AuthenticationFailure { .. }
        )
    }

    /// Get a user-friendly error message
    pub fn user_friendly_message(&self) -> String {
        match self {
            CryptoError::KeyGenerationError { operation, .. } => {
                format!("Key pair operation '{}' failed. No keys were written.", operation)
            }
            CryptoError::KeyDerivationError { operation, .. } => {
                format!(
                    "Pre-shared key derivation '{}' failed. Check the MAC device and key material.",
                    operation
                )
            }
            CryptoError::SenderSetupError { .. } => {
                "Encryption could not be set up for the recipient public key.".to_string()
            }
            CryptoError::SealError { .. } => {
                "Encryption failed. No envelope was produced.".to_string()
            }
            CryptoError::DecapsulationError { .. } | CryptoError::AuthenticationFailure { .. } => {
                "Decryption failed.".to_string()
            }
            CryptoError::InvalidParameter {
                parameter,
                expected,
                ..
            } => {
                format!("Invalid parameter '{}'. Expected {}.", parameter, expected)
            }
            CryptoError::SerializationError(_) => {
                "Data serialization failed. Data format may be corrupted.".to_string()
            }
            CryptoError::IoError(_) => {
                "Input/output operation failed. Check file paths and permissions.".to_string()
            }
        }
    }

    /// Get technical details for debugging
    ///
    /// Decrypt-path errors only report the collapsed category.
    pub fn technical_details(&self) -> HashMap<String, String> {
        let mut details = HashMap::new();

        details.insert("error_code".to_string(), self.error_code().to_string());
        details.insert("error_type".to_string(), self.error_type().to_string());
        details.insert("timestamp".to_string(), chrono::Utc::now().to_rfc3339());

        match self {
            CryptoError::KeyGenerationError {
                operation, cause, ..
            } => {
                details.insert("operation".to_string(), operation.clone());
                details.insert("cause".to_string(), cause.clone());
            }
            CryptoError::KeyDerivationError {
                operation,
                cause,
                context,
                ..
            } => {
                details.insert("operation".to_string(), operation.clone());
                details.insert("cause".to_string(), cause.clone());
                details.extend(context.clone());
            }
            CryptoError::SenderSetupError { cause, .. } | CryptoError::SealError { cause, .. } => {
                details.insert("cause".to_string(), cause.clone());
            }
            CryptoError::InvalidParameter {
                parameter,
                expected,
                actual,
                ..
            } => {
                details.insert("parameter".to_string(), parameter.clone());
                details.insert("expected".to_string(), expected.clone());
                details.insert("actual".to_string(), actual.clone());
            }
            CryptoError::SerializationError(cause) | CryptoError::IoError(cause) => {
                details.insert("cause".to_string(), cause.clone());
            }
            CryptoError::DecapsulationError { .. } | CryptoError::AuthenticationFailure { .. } => {}
        }

        details
    }

    /// Get suggested remediation steps
    pub fn suggested_remediation(&self) -> Option<String> {
        match self {
            CryptoError::KeyDerivationError { error_code, .. } => match *error_code {
                error_codes::MAC_DEVICE_UNAVAILABLE => Some(
                    "Check the PKCS#11 module path, slot or token label, and user PIN.".to_string(),
                ),
                error_codes::MAC_KEY_MATERIAL_UNAVAILABLE => Some(
                    "Ensure exactly one HMAC secret key with the configured label exists on the token."
                        .to_string(),
                ),
                _ => Some("Verify the token supports CKM_SHA256_HMAC.".to_string()),
            },
            CryptoError::SenderSetupError { .. } => Some(
                "Use a public key generated for DHKEM(P-256, HKDF-SHA256).".to_string(),
            ),
            CryptoError::InvalidParameter { .. } => {
                Some("Check the inputs against the expected format.".to_string())
            }
            CryptoError::IoError(_) => {
                Some("Check that the file exists and is readable or writable.".to_string())
            }
            _ => None,
        }
    }

    /// Get the error category/type as a string
    pub fn error_type(&self) -> &'static str {
        match self {
            CryptoError::KeyGenerationError { .. } => "KeyGenerationError",
            CryptoError::KeyDerivationError { .. } => "KeyDerivationError",
            CryptoError::SenderSetupError { .. } => "SenderSetupError",
            CryptoError::SealError { .. } => "SealError",
            CryptoError::DecapsulationError { .. } | CryptoError::AuthenticationFailure { .. } => {
                "DecryptionFailure"
            }
            CryptoError::InvalidParameter { .. } => "InvalidParameter",
            CryptoError::SerializationError(_) => "SerializationError",
            CryptoError::IoError(_) => "IoError",
        }
    }
}

/// Convenience constructors for common error types
impl CryptoError {
    pub fn key_generation_error(operation: &str, cause: &str, error_code: u32) -> Self {
        CryptoError::KeyGenerationError {
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn key_derivation_error(operation: &str, cause: &str, error_code: u32) -> Self {
        CryptoError::KeyDerivationError {
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code,
            context: HashMap::new(),
        }
    }

    /// Derivation error tagged with the locators involved
    pub fn mac_error(
        operation: &str,
        cause: &str,
        error_code: u32,
        device_locator: &str,
        key_material_locator: &str,
    ) -> Self {
        let mut context = HashMap::new();
        context.insert("device".to_string(), device_locator.to_string());
        context.insert("key_material".to_string(), key_material_locator.to_string());

        CryptoError::KeyDerivationError {
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code,
            context,
        }
    }

    pub fn sender_setup_error(cause: &str, error_code: u32) -> Self {
        CryptoError::SenderSetupError {
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn seal_error(cause: &str) -> Self {
        CryptoError::SealError {
            cause: cause.to_string(),
            error_code: error_codes::SEAL_FAILED,
        }
    }

    pub fn decapsulation_error(cause: &str, error_code: u32) -> Self {
        CryptoError::DecapsulationError {
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn authentication_failure() -> Self {
        CryptoError::AuthenticationFailure {
            error_code: error_codes::AUTHENTICATION_FAILED,
        }
    }

    pub fn invalid_parameter(parameter: &str, expected: &str, actual: &str) -> Self {
        CryptoError::InvalidParameter {
            parameter: parameter.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            error_code: error_codes::INVALID_PARAMETER,
        }
    }
}

// From implementations for automatic error conversion
impl From<std::io::Error> for CryptoError {
    fn from(err: std::io::Error) -> Self {
        CryptoError::IoError(format!("IO operation failed: {}", err))
    }
}

impl From<serde_json::Error> for CryptoError {
    fn from(err: serde_json::Error) -> Self {
        CryptoError::SerializationError(err.to_string())
    }
}

/// Result type alias for protocol operations
pub type CryptoResult<T> = Result<T, CryptoError>;
