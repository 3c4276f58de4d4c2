//! Argument groups and setup shared by the `hpke-psk-*` programs

use std::sync::Arc;

use clap::Args;
use tracing_subscriber::EnvFilter;

use crate::error::CryptoResult;
use crate::key_management::hsm::{HsmConfig, Pkcs11Mac, DEFAULT_KEY_LABEL, DEFAULT_PKCS11_MODULE};
use crate::key_management::psk::{PskBinder, SoftwareHmac};
use crate::secure_memory::SecureBytes;

/// Where the PSK derivation MAC is computed
#[derive(Args, Debug, Clone)]
pub struct MacArgs {
    /// PKCS#11 module holding the HMAC key
    #[arg(long, default_value = DEFAULT_PKCS11_MODULE)]
    pub pkcs11_module: String,

    /// Label of the HMAC secret key on the token
    #[arg(long, default_value = DEFAULT_KEY_LABEL)]
    pub key_label: String,

    /// Token slot ID
    #[arg(long)]
    pub slot: Option<u64>,

    /// Token label, used when no slot is given
    #[arg(long)]
    pub token_label: Option<String>,

    /// User PIN for the token
    #[arg(long, env = "HPKE_PSK_PIN", hide_env_values = true)]
    pub pin: Option<String>,

    /// Derive with software HMAC-SHA256 keyed by this secret instead of a token
    #[arg(long, conflicts_with_all = ["slot", "token_label"])]
    pub software_psk: Option<String>,
}

impl MacArgs {
    pub fn hsm_config(&self) -> HsmConfig {
        HsmConfig {
            library_path: self.pkcs11_module.clone(),
            key_label: self.key_label.clone(),
            slot_id: self.slot,
            token_label: self.token_label.clone(),
            user_pin: self.pin.as_deref().map(|pin| SecureBytes::new(pin.as_bytes())),
        }
    }

    pub fn into_binder(self) -> CryptoResult<PskBinder> {
        if let Some(secret) = &self.software_psk {
            let hmac = SoftwareHmac::new(SecureBytes::new(secret.as_bytes()))?;
            return Ok(PskBinder::software(hmac));
        }

        let config = self.hsm_config();
        let (device, key) = config.locators();
        Ok(PskBinder::hardware(
            Arc::new(Pkcs11Mac::from_config(&config)),
            device,
            key,
        ))
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`)
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
