use std::process::Command;

use hpke_psk::hybrid::Sender;
use hpke_psk::key_management::{store_envelope, store_key_pair, KeyPairService, PskBinder, SoftwareHmac};
use hpke_psk::secure_memory::SecureBytes;
use tempfile::tempdir;

const SECRET: &str = "mypsk";

fn decrypt_command() -> Command {
    Command::new(env!("CARGO_BIN_EXE_hpke-psk-decrypt"))
}

#[test]
fn test_decrypt_writes_exact_plaintext_bytes() {
    let dir = tempdir().unwrap();
    let public_path = dir.path().join("public.bin");
    let private_path = dir.path().join("private.bin");
    let envelope_path = dir.path().join("out.json");

    let bob = KeyPairService.generate().unwrap();
    store_key_pair(&bob, &public_path, &private_path).unwrap();

    // Binary payload without a trailing newline of its own
    let plaintext: Vec<u8> = vec![0x00, 0xff, 0x0a, 0x80, 0x7f, 0x00];
    let binder = PskBinder::software(SoftwareHmac::new(SecureBytes::new(SECRET.as_bytes())).unwrap());
    let envelope = Sender::new(&binder)
        .encrypt(&bob.public_key, &plaintext, "mypsk-id", b"aad", b"ctx")
        .unwrap();
    store_envelope(&envelope, &envelope_path).unwrap();

    let output = decrypt_command()
        .arg("--private-key")
        .arg(&private_path)
        .arg("--in")
        .arg(&envelope_path)
        .arg("--software-psk")
        .arg(SECRET)
        .env_remove("HPKE_PSK_PIN")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(output.stdout, plaintext);
}

#[test]
fn test_decrypt_failure_hides_failing_step() {
    let dir = tempdir().unwrap();
    let public_path = dir.path().join("public.bin");
    let private_path = dir.path().join("private.bin");

    let bob = KeyPairService.generate().unwrap();
    store_key_pair(&bob, &public_path, &private_path).unwrap();

    let binder = PskBinder::software(SoftwareHmac::new(SecureBytes::new(SECRET.as_bytes())).unwrap());
    let envelope = Sender::new(&binder)
        .encrypt(&bob.public_key, b"secret", "mypsk-id", b"", b"ctx")
        .unwrap();

    let mut bad_encap = envelope.clone();
    bad_encap.encapsulation_key = vec![0x04; 3];
    let mut bad_tag = envelope;
    let last = bad_tag.cipher_text.len() - 1;
    bad_tag.cipher_text[last] ^= 0x01;

    let mut stderrs = Vec::new();
    for (name, tampered) in [("encap.json", bad_encap), ("tag.json", bad_tag)] {
        let path = dir.path().join(name);
        store_envelope(&tampered, &path).unwrap();

        let output = decrypt_command()
            .arg("--private-key")
            .arg(&private_path)
            .arg("--in")
            .arg(&path)
            .arg("--software-psk")
            .arg(SECRET)
            .env("RUST_LOG", "debug")
            .env("NO_COLOR", "1")
            .env_remove("HPKE_PSK_PIN")
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        assert!(output.stdout.is_empty());

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        for detail in ["error_code", "does not decode", "Decapsulation", "Authentication"] {
            assert!(!stderr.contains(detail), "stderr leaks {}: {}", detail, stderr);
        }

        let last_line = stderr.lines().last().unwrap_or_default().to_string();
        stderrs.push(last_line);
    }

    assert_eq!(stderrs[0], "Error: Decryption failed.");
    assert_eq!(stderrs[0], stderrs[1]);
}
