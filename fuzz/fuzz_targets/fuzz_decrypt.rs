#![no_main]

use arbitrary::Arbitrary;
use hpke_psk::hybrid::{Envelope, Receiver, Sender};
use hpke_psk::key_management::{KeyPairService, PskBinder, SoftwareHmac};
use hpke_psk::secure_memory::SecureBytes;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct DecryptFuzzInput {
    psk_identity: String,
    cipher_text: Vec<u8>,
    encapsulation_key: Vec<u8>,
    context: Vec<u8>,
    aad: Vec<u8>,
    private_key: Vec<u8>,
    flip: Option<(u16, u8)>,
}

fuzz_target!(|input: DecryptFuzzInput| {
    let binder = match SoftwareHmac::new(SecureBytes::new(b"fuzz-secret")) {
        Ok(hmac) => PskBinder::software(hmac),
        Err(_) => return,
    };
    let receiver = Receiver::new(&binder);

    // Arbitrary envelope and key: must fail cleanly, never panic
    let envelope = Envelope {
        psk_identity: input.psk_identity,
        cipher_text: input.cipher_text,
        encapsulation_key: input.encapsulation_key,
        context: input.context,
        aad: input.aad,
    };
    let _ = receiver.decrypt(&input.private_key, &envelope);

    // A genuine envelope with one flipped bit must not decrypt
    if let Some((position, bit)) = input.flip {
        let Ok(bob) = KeyPairService.generate() else { return };
        let Ok(mut sealed) = Sender::new(&binder).encrypt(&bob.public_key, b"fuzz", "id", b"", b"ctx")
        else {
            return;
        };
        let index = position as usize % sealed.cipher_text.len();
        sealed.cipher_text[index] ^= 1 << (bit % 8);
        assert!(receiver.decrypt(bob.private_key.as_bytes(), &sealed).is_err());
    }
});
