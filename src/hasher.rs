/// Stable disambiguation hashes derived from precise symbol identifiers.
use sha2::{Digest as _, Sha256};

/// Alphabet for hash characters: lowercase base-32, a subset of the
/// `[0-9a-z]` link grammar.
const ALPHABET: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

/// Length of a stable hash in characters.
const HASH_LEN: usize = 5;

/// Compute the stable 5-character hash for a precise identifier.
///
/// The hash is the first five bytes of the SHA-256 digest of the identifier,
/// each reduced to five bits and mapped through the base-32 alphabet. It is
/// deterministic across processes and platforms; two distinct precise
/// identifiers collide only if their digests agree in the sampled bits,
/// which the resolver treats like any other collision.
pub fn stable_hash(precise: &str) -> String {
    let digest = Sha256::digest(precise.as_bytes());
    let mut out = String::with_capacity(HASH_LEN);
    for byte in digest.iter().take(HASH_LEN) {
        let index = usize::from(byte & 0x1f);
        out.push(char::from(ALPHABET[index]));
    }
    return out;
}
