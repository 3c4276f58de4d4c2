/*!
 * Key Management
 *
 * KEM key pairs and their files, and the pre-shared key derivation that binds
 * each session to a hardware-held MAC key.
 */

pub mod hsm;
pub mod keypair;
pub mod psk;
pub mod storage;

pub use hsm::HsmConfig;
pub use hsm::Pkcs11Mac;
pub use keypair::public_key_fingerprint;
pub use keypair::KeyPair;
pub use keypair::KeyPairService;
pub use psk::DerivationMode;
pub use psk::DerivedPsk;
pub use psk::HardwareMac;
pub use psk::PskBinder;
pub use psk::SoftwareHmac;
pub use storage::load_envelope;
pub use storage::load_key_pair;
pub use storage::load_private_key;
pub use storage::load_public_key;
pub use storage::store_envelope;
pub use storage::store_key_pair;
