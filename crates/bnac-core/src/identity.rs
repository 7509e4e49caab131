//! Per-run client identifier.

use uuid::Builder;

use crate::env::Environment;

/// Generate a fresh `CLIENTID`: an uppercase, brace-wrapped UUIDv4.
///
/// Randomness comes from `env`, so a seeded environment yields a stable id.
pub fn generate_client_id<E: Environment>(env: &E) -> String {
    let mut bytes = [0u8; 16];
    env.random_bytes(&mut bytes);
    let uuid = Builder::from_random_bytes(bytes).into_uuid();
    format!("{{{}}}", uuid.hyphenated().to_string().to_uppercase())
}
