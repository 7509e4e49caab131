#![no_main]

use bnac_proto::{MAX_FRAME_LEN, MessageFramer, ProtocolError, TERMINATOR};
use libfuzzer_sys::fuzz_target;

fn first_terminator(frame: &[u8]) -> Option<usize> {
    frame.windows(TERMINATOR.len()).position(|w| w == TERMINATOR)
}

fuzz_target!(|data: &[u8]| {
    // First byte picks the chunk size; the rest is the stream.
    let Some((&chunk, stream)) = data.split_first() else { return };
    let chunk = usize::from(chunk).max(1);

    let mut framer = MessageFramer::new();
    let mut reassembled = Vec::with_capacity(stream.len());
    for piece in stream.chunks(chunk) {
        framer.extend(piece);
        loop {
            let frame = match framer.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(ProtocolError::FrameTooLong { len, max }) => {
                    assert!(len > max && max == MAX_FRAME_LEN);
                    assert_eq!(framer.buffered(), 0);
                    return;
                },
                Err(e) => panic!("unexpected framer error: {e}"),
            };
            assert!(frame.len() <= MAX_FRAME_LEN);
            // Cut exactly at the first terminator.
            assert_eq!(first_terminator(&frame), Some(frame.len() - TERMINATOR.len()));
            reassembled.extend_from_slice(&frame);
        }
    }

    framer.finish();
    for frame in framer.frames() {
        let Ok(frame) = frame else { return };
        reassembled.extend_from_slice(&frame);
    }

    assert_eq!(framer.buffered(), 0);
    assert_eq!(reassembled, stream);
});
