//! Public identifier generation.
//!
//! A public id is eight characters drawn uniformly from `[a-zA-Z0-9]`
//! (62^8 possible values) followed by the original file's extension, if any.
//! The same string is the mapping store key and, minus the extension, the
//! `hash` shown to clients.

use rand::Rng;
use rand::distr::Alphanumeric;

/// Number of random characters in a public id.
pub const ID_LENGTH: usize = 8;

/// Generate a public id for `filename` using the thread-local RNG.
#[must_use]
pub fn generate_public_id(filename: &str) -> String {
    generate_public_id_with(&mut rand::rng(), filename)
}

/// Generate a public id drawing randomness from `rng`.
#[must_use]
pub fn generate_public_id_with<R: Rng>(rng: &mut R, filename: &str) -> String {
    let mut id: String = (0..ID_LENGTH)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect();
    if let Some(ext) = extension_of(filename) {
        id.push_str(ext);
    }
    id
}

/// Extension of `filename`, including the leading dot.
///
/// Taken from the last dot, unless that dot is the final character.
#[must_use]
pub fn extension_of(filename: &str) -> Option<&str> {
    let dot = filename.rfind('.')?;
    if dot + 1 == filename.len() {
        None
    } else {
        Some(&filename[dot..])
    }
}

/// The client-facing `hash`: the public id without its extension.
#[must_use]
pub fn hash_of(public_id: &str) -> &str {
    public_id
        .split_once('.')
        .map_or(public_id, |(hash, _)| hash)
}
