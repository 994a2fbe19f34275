//! Deterministic randomness derivation.
//!
//! Every random draw in the engine comes from a stream derived from the
//! user-visible seed. Streams are domain-separated with HMAC-SHA256 tags, and
//! the event stream is additionally derived per simulated day: re-stepping a
//! day after backward navigation replays the exact draws the day saw before,
//! so forward re-derivation is bit-for-bit reproducible.

use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sha2::Sha256;

const EVENT_DOMAIN: &[u8] = b"pandemia.events";

/// Derive a stream seed for a named domain from the user-visible seed.
#[must_use]
pub fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}

/// RNG for one simulated day's event evaluation.
///
/// The stream depends only on the user seed and the day index, never on how
/// many draws earlier days consumed.
#[must_use]
pub fn day_rng(user_seed: u64, day_index: u32) -> SmallRng {
    let mut tag = Vec::with_capacity(EVENT_DOMAIN.len() + 4);
    tag.extend_from_slice(EVENT_DOMAIN);
    tag.extend_from_slice(&day_index.to_le_bytes());
    SmallRng::seed_from_u64(derive_stream_seed(user_seed, &tag))
}
