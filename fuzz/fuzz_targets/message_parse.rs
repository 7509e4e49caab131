#![no_main]

use bnac_proto::Message;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parsing must never panic; whatever parses must re-encode to bytes
    // that parse back to the same message.
    if let Ok(msg) = Message::parse(data) {
        let encoded = msg.to_bytes();
        assert_eq!(encoded.len(), msg.encoded_len());
        let reparsed = Message::parse(&encoded).expect("encoded message must parse");
        assert_eq!(reparsed, msg);
    }
});
