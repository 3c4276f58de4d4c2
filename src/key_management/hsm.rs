/*!
 * Hardware Security Module (HSM) MAC service
 *
 * Computes HMAC-SHA256 with a secret key held on a PKCS#11 token. The device
 * locator is the path of the PKCS#11 module and the key-material locator is
 * the label of the secret key object. Every call loads the module, opens a
 * session, signs and releases everything again, so no session outlives a
 * single derivation.
 */

use std::fmt;
use std::path::Path;
use std::sync::Mutex;

use cryptoki::context::{CInitializeArgs, Pkcs11};
use cryptoki::mechanism::Mechanism;
use cryptoki::object::{Attribute, ObjectClass, ObjectHandle};
use cryptoki::session::{Session, UserType};
use cryptoki::slot::Slot;
use cryptoki::types::AuthPin;

use crate::error::{error_codes, CryptoError, CryptoResult};
use crate::key_management::psk::HardwareMac;
use crate::secure_memory::SecureBytes;

/// Default PKCS#11 module (SoftHSM v2)
pub const DEFAULT_PKCS11_MODULE: &str = "/usr/lib/softhsm/libsofthsm2.so";

/// Default label of the HMAC secret key on the token
pub const DEFAULT_KEY_LABEL: &str = "hmac-key";

/// HSM configuration parameters
#[derive(Clone)]
pub struct HsmConfig {
    /// Path to the PKCS#11 library
    pub library_path: String,

    /// Label of the HMAC secret key object
    pub key_label: String,

    /// Slot ID to use
    pub slot_id: Option<u64>,

    /// Token label to use when no slot ID is given
    pub token_label: Option<String>,

    /// User PIN for authentication
    pub user_pin: Option<SecureBytes>,
}

impl Default for HsmConfig {
    fn default() -> Self {
        Self {
            library_path: DEFAULT_PKCS11_MODULE.to_string(),
            key_label: DEFAULT_KEY_LABEL.to_string(),
            slot_id: None,
            token_label: None,
            user_pin: None,
        }
    }
}

impl fmt::Debug for HsmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HsmConfig")
            .field("library_path", &self.library_path)
            .field("key_label", &self.key_label)
            .field("slot_id", &self.slot_id)
            .field("token_label", &self.token_label)
            .field("user_pin", &"[REDACTED]")
            .finish()
    }
}

/// PKCS#11-backed [`HardwareMac`]
pub struct Pkcs11Mac {
    slot_id: Option<u64>,
    token_label: Option<String>,
    user_pin: Option<SecureBytes>,
    // Tokens are not assumed to support concurrent sessions
    device_lock: Mutex<()>,
}

impl Pkcs11Mac {
    pub fn new(slot_id: Option<u64>, token_label: Option<String>, user_pin: Option<SecureBytes>) -> Self {
        Self {
            slot_id,
            token_label,
            user_pin,
            device_lock: Mutex::new(()),
        }
    }

    /// Build from a config; the locators are taken from the same config by
    /// [`HsmConfig::locators`].
    pub fn from_config(config: &HsmConfig) -> Self {
        Self::new(
            config.slot_id,
            config.token_label.clone(),
            config.user_pin.clone(),
        )
    }

    fn device_error(operation: &str, cause: String, device: &str, key: &str) -> CryptoError {
        CryptoError::mac_error(
            operation,
            &cause,
            error_codes::MAC_DEVICE_UNAVAILABLE,
            device,
            key,
        )
    }

    fn select_slot(&self, context: &Pkcs11, device: &str, key: &str) -> CryptoResult<Slot> {
        let slots = context
            .get_slots_with_token()
            .map_err(|e| Self::device_error("get_slots", format!("Failed to get slots: {}", e), device, key))?;

        if slots.is_empty() {
            return Err(Self::device_error(
                "get_slots",
                "No slots with tokens found".to_string(),
                device,
                key,
            ));
        }

        if let Some(slot_id) = self.slot_id {
            return slots.into_iter().find(|s| s.id() == slot_id).ok_or_else(|| {
                Self::device_error("get_slots", format!("Slot {} not found", slot_id), device, key)
            });
        }

        if let Some(ref token_label) = self.token_label {
            for slot in slots {
                if let Ok(token_info) = context.get_token_info(slot) {
                    if token_info.label().trim() == token_label.trim() {
                        return Ok(slot);
                    }
                }
            }
            return Err(Self::device_error(
                "get_slots",
                format!("Token with label '{}' not found", token_label),
                device,
                key,
            ));
        }

        Ok(slots[0])
    }

    fn find_key(session: &Session, device: &str, key: &str) -> CryptoResult<ObjectHandle> {
        let template = vec![
            Attribute::Class(ObjectClass::SECRET_KEY),
            Attribute::Label(key.as_bytes().to_vec()),
        ];

        let mut handles = session.find_objects(&template).map_err(|e| {
            CryptoError::mac_error(
                "find_key",
                &format!("Failed to search for key: {}", e),
                error_codes::MAC_KEY_MATERIAL_UNAVAILABLE,
                device,
                key,
            )
        })?;

        match handles.len() {
            1 => Ok(handles.remove(0)),
            0 => Err(CryptoError::mac_error(
                "find_key",
                "No secret key with this label",
                error_codes::MAC_KEY_MATERIAL_UNAVAILABLE,
                device,
                key,
            )),
            n => Err(CryptoError::mac_error(
                "find_key",
                &format!("{} secret keys share this label", n),
                error_codes::MAC_KEY_MATERIAL_UNAVAILABLE,
                device,
                key,
            )),
        }
    }
}

impl fmt::Debug for Pkcs11Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pkcs11Mac")
            .field("slot_id", &self.slot_id)
            .field("token_label", &self.token_label)
            .field("user_pin", &"[REDACTED]")
            .finish()
    }
}

impl HardwareMac for Pkcs11Mac {
    fn compute_mac(
        &self,
        device_locator: &str,
        key_material_locator: &str,
        message: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let (device, key) = (device_locator, key_material_locator);

        if !Path::new(device).exists() {
            return Err(Self::device_error(
                "load_module",
                format!("PKCS#11 library not found: {}", device),
                device,
                key,
            ));
        }

        let _guard = self.device_lock.lock().map_err(|_| {
            Self::device_error("lock", "HSM lock poisoned".to_string(), device, key)
        })?;

        log::info!("Initializing PKCS#11 library: {}", device);

        let context = Pkcs11::new(device).map_err(|e| {
            Self::device_error("load_module", format!("Failed to load PKCS#11 library: {}", e), device, key)
        })?;

        context.initialize(CInitializeArgs::OsThreads).map_err(|e| {
            Self::device_error("initialize", format!("Failed to initialize PKCS#11 library: {}", e), device, key)
        })?;

        let slot = self.select_slot(&context, device, key)?;
        log::debug!("Using slot: {:?}", slot.id());

        let session = context.open_ro_session(slot).map_err(|e| {
            Self::device_error("open_session", format!("Failed to open session: {}", e), device, key)
        })?;

        if let Some(pin) = &self.user_pin {
            let auth_pin = AuthPin::new(String::from_utf8_lossy(pin.as_bytes()).to_string());
            session.login(UserType::User, Some(&auth_pin)).map_err(|e| {
                Self::device_error("login", format!("Failed to login to HSM: {}", e), device, key)
            })?;
        }

        let result = Self::find_key(&session, device, key).and_then(|handle| {
            session
                .sign(&Mechanism::Sha256Hmac, handle, message)
                .map_err(|e| {
                    CryptoError::mac_error(
                        "sign",
                        &format!("HSM HMAC failed: {}", e),
                        error_codes::MAC_COMPUTATION_FAILED,
                        device,
                        key,
                    )
                })
        });

        if self.user_pin.is_some() {
            if let Err(e) = session.logout() {
                log::warn!("Failed to logout from HSM: {}", e);
            }
        }

        // Session and module are released here, before the lock
        drop(session);
        drop(context);
        log::debug!("Released PKCS#11 session for {}", device);

        result
    }
}

impl HsmConfig {
    /// `(device_locator, key_material_locator)` for this configuration
    pub fn locators(&self) -> (&str, &str) {
        (&self.library_path, &self.key_label)
    }
}
