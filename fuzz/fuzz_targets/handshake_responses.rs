#![no_main]

use bnac_core::handshake::{Credentials, Handshake, HandshakeConfig, HandshakeState};
use bnac_proto::{Message, MessageFramer};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut handshake = Handshake::new(
        HandshakeConfig::default(),
        Credentials { user: "fuzz".into(), encrypted_password: "00".into() },
        "{00000000-0000-4000-8000-000000000000}",
        "10.0.0.1:40000".parse().expect("valid address"),
    );
    if handshake.start().is_err() {
        return;
    }

    let mut framer = MessageFramer::new();
    framer.extend(data);
    framer.finish();

    for frame in framer.frames() {
        let Ok(frame) = frame else { return };
        let Ok(response) = Message::parse(&frame) else { return };
        if handshake.handle_response(&response).is_err() {
            assert_eq!(handshake.state(), HandshakeState::Failed);
            return;
        }
        if handshake.state() == HandshakeState::Complete {
            return;
        }
    }
});
