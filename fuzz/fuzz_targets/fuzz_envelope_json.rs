#![no_main]

use hpke_psk::hybrid::Envelope;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parsing must never panic, and whatever parses must survive re-encoding
    if let Ok(envelope) = Envelope::from_json_slice(data) {
        let _ = envelope.validate();
        if let Ok(json) = envelope.to_json() {
            let reparsed = Envelope::from_json(&json).expect("re-encoded envelope must parse");
            assert_eq!(reparsed, envelope);
        }
    }
});
