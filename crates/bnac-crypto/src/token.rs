//! PUSH step token derivation.
//!
//! The server expects `TIME` to be `md5("liuyan:{session_id}:{local_ip}")`,
//! lowercase hex, where `local_ip` is the client's side of the handshake
//! connection without the port. The template must stay byte-for-byte
//! identical or the server rejects the PUSH request.

use std::net::SocketAddr;

use md5::{Digest, Md5};

/// Fixed tag at the start of the token template.
pub const PUSH_TOKEN_TAG: &str = "liuyan";

/// Derive the PUSH `TIME` token.
pub fn push_token(session_id: &str, local_ip: &str) -> String {
    let digest = Md5::digest(format!("{PUSH_TOKEN_TAG}:{session_id}:{local_ip}").as_bytes());
    hex::encode(digest)
}

/// Address part of `addr` as rendered text, port stripped.
///
/// IPv6 addresses keep their brackets (`[::1]:80` becomes `[::1]`).
pub fn address_without_port(addr: &SocketAddr) -> String {
    let text = addr.to_string();
    match text.rfind(':') {
        Some(colon) => text[..colon].to_owned(),
        None => text,
    }
}
