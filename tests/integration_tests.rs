use std::fs;
use std::sync::Arc;

use hpke_psk::error::{CryptoError, CryptoResult};
use hpke_psk::hybrid::{decrypt_with_psk, Context, Envelope, Receiver, Sender, DEFAULT_INFO_PREFIX};
use hpke_psk::key_management::{
    load_envelope, load_key_pair, load_private_key, load_public_key, store_envelope,
    store_key_pair, HardwareMac, KeyPairService, PskBinder, SoftwareHmac,
};
use hpke_psk::secure_memory::SecureBytes;
use tempfile::tempdir;

/// Stand-in token: HMAC-SHA256 keyed by the key-material locator
struct TokenStandIn;

impl HardwareMac for TokenStandIn {
    fn compute_mac(&self, _device: &str, key: &str, message: &[u8]) -> CryptoResult<Vec<u8>> {
        SoftwareHmac::new(SecureBytes::new(key.as_bytes()))?.compute(message)
    }
}

fn binder(key_label: &str) -> PskBinder {
    PskBinder::hardware(Arc::new(TokenStandIn), "/dev/tpmrm0", key_label)
}

#[test]
fn test_alice_bob_workflow_through_files() {
    let dir = tempdir().unwrap();
    let public_path = dir.path().join("public.bin");
    let private_path = dir.path().join("private.bin");
    let envelope_path = dir.path().join("out.json");

    // Bob generates and publishes his key
    let bob = KeyPairService.generate().unwrap();
    store_key_pair(&bob, &public_path, &private_path).unwrap();
    assert_eq!(fs::metadata(&public_path).unwrap().len(), 65);
    assert_eq!(fs::metadata(&private_path).unwrap().len(), 32);

    // Alice encrypts with her token
    let alice = binder("hmac-key");
    let public_key = load_public_key(&public_path).unwrap();
    let context = Context::with_nonce(DEFAULT_INFO_PREFIX.as_bytes());
    let envelope = Sender::new(&alice)
        .encrypt(
            &public_key,
            b"text encrypted to Bob's public key",
            "mypsk-id",
            b"additional public data",
            &context,
        )
        .unwrap();
    store_envelope(&envelope, &envelope_path).unwrap();

    // Bob decrypts with his own token holding the same key
    let bob_binder = binder("hmac-key");
    let private_key = load_private_key(&private_path).unwrap();
    let received = load_envelope(&envelope_path).unwrap();
    assert_eq!(received, envelope);

    let plaintext = Receiver::new(&bob_binder)
        .decrypt(private_key.as_bytes(), &received)
        .unwrap();
    assert_eq!(plaintext, b"text encrypted to Bob's public key");

    let reloaded = load_key_pair(&public_path, &private_path).unwrap();
    assert_eq!(reloaded, bob);
}

#[cfg(unix)]
#[test]
fn test_private_key_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let public_path = dir.path().join("public.bin");
    let private_path = dir.path().join("private.bin");

    store_key_pair(&KeyPairService.generate().unwrap(), &public_path, &private_path).unwrap();

    let mode = fs::metadata(&private_path).unwrap().permissions().mode();
    assert_eq!(mode & 0o077, 0);
}

#[test]
fn test_envelope_file_format() {
    let dir = tempdir().unwrap();
    let envelope_path = dir.path().join("out.json");

    let bob = KeyPairService.generate().unwrap();
    let envelope = Sender::new(&binder("hmac-key"))
        .encrypt(&bob.public_key, b"hi", "mypsk-id", b"aad", b"ctx")
        .unwrap();
    store_envelope(&envelope, &envelope_path).unwrap();

    let text = fs::read_to_string(&envelope_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let object = value.as_object().unwrap();

    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["aad", "cipherText", "context", "encapsulationKey", "pskIdentity"]);
    assert_eq!(object["pskIdentity"], "mypsk-id");
    assert_eq!(object["context"], "Y3R4");
    assert_eq!(object["aad"], "YWFk");
    // Pretty-printed with two-space indentation
    assert!(text.contains("\n  \"pskIdentity\""));
}

#[test]
fn test_envelope_from_other_producer_with_nulls() {
    let json = r#"{"pskIdentity":"mypsk-id","cipherText":"AAECAw==","encapsulationKey":"BAQE","context":null,"aad":null}"#;
    let envelope = Envelope::from_json(json).unwrap();
    assert!(envelope.context.is_empty());
    assert!(envelope.aad.is_empty());
    assert_eq!(envelope.cipher_text, [0, 1, 2, 3]);
}

#[test]
fn test_hardware_key_mismatch_is_opaque() {
    let bob = KeyPairService.generate().unwrap();
    let envelope = Sender::new(&binder("alice-key"))
        .encrypt(&bob.public_key, b"secret", "mypsk-id", b"", b"ctx")
        .unwrap();

    let err = decrypt_with_psk(&binder("mallory-key"), bob.private_key.as_bytes(), &envelope)
        .unwrap_err();
    assert!(matches!(err, CryptoError::AuthenticationFailure { .. }));

    let mut bad_encap = envelope.clone();
    bad_encap.encapsulation_key = vec![0x04; 3];
    let other = decrypt_with_psk(&binder("alice-key"), bob.private_key.as_bytes(), &bad_encap)
        .unwrap_err();
    assert!(matches!(other, CryptoError::DecapsulationError { .. }));

    // Both failures look the same from the outside
    assert_eq!(err.user_friendly_message(), other.user_friendly_message());
    assert_eq!(err.error_type(), other.error_type());
}

#[test]
fn test_context_nonce_change_breaks_decryption() {
    let bob = KeyPairService.generate().unwrap();
    let tokens = binder("hmac-key");
    let context = Context::with_nonce(DEFAULT_INFO_PREFIX.as_bytes());

    let mut envelope = Sender::new(&tokens)
        .encrypt(&bob.public_key, b"msg", "mypsk-id", b"", &context)
        .unwrap();
    let last = envelope.context.len() - 1;
    envelope.context[last] = if envelope.context[last] == b'0' { b'1' } else { b'0' };

    let result = Receiver::new(&tokens).decrypt(bob.private_key.as_bytes(), &envelope);
    assert!(result.unwrap_err().is_decryption_failure());
}

#[test]
fn test_software_fallback_interoperates_with_equal_secret() {
    let bob = KeyPairService.generate().unwrap();
    let alice = PskBinder::software(SoftwareHmac::new(SecureBytes::new(b"mypsk")).unwrap());
    let bob_binder = PskBinder::software(SoftwareHmac::new(SecureBytes::new(b"mypsk")).unwrap());

    let envelope = Sender::new(&alice)
        .encrypt(&bob.public_key, b"fallback", "mypsk-id", b"aad", b"ctx")
        .unwrap();
    let plaintext = Receiver::new(&bob_binder)
        .decrypt(bob.private_key.as_bytes(), &envelope)
        .unwrap();
    assert_eq!(plaintext, b"fallback");

    // Same secret through the stand-in token yields the same PSK
    let via_token = binder("mypsk");
    let plaintext = Receiver::new(&via_token)
        .decrypt(bob.private_key.as_bytes(), &envelope)
        .unwrap();
    assert_eq!(plaintext, b"fallback");
}

#[test]
fn test_missing_files_are_io_errors() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.bin");

    assert!(matches!(load_public_key(&missing), Err(CryptoError::IoError(_))));
    assert!(matches!(load_envelope(&missing), Err(CryptoError::IoError(_))));
}
