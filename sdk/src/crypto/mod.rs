//! Password-based encryption compatible with the widely deployed
//! `"Salted__"` container format.
//!
//! Key and IV are derived from the password with an iterated MD5 expansion:
//! each round hashes the previous digest, the password and the salt, and the
//! concatenated output is cut into a 32-byte key and a 16-byte IV. The
//! payload is encrypted with AES-256-CBC over PKCS#7-padded plaintext; a
//! plaintext that is already block-aligned still receives a full padding
//! block. The result is framed as `"Salted__" || salt || ciphertext` and
//! base64-encoded for transport.
//!
//! Every call to [`encrypt`] draws a fresh 8-byte salt, so envelopes never
//! repeat even under one password. The format is fixed by compatibility with
//! the interoperating ecosystem: the digest, cipher and framing must not be
//! changed, and there is no authentication tag. Decryption with a wrong
//! password yields garbage rather than an error unless the padding guard
//! happens to trip.

mod envelope;
mod kdf;

pub use crate::crypto::{
    envelope::{decrypt, decrypt_text, encrypt, encrypt_with_salt, EnvelopeFormatError},
    kdf::{derive, KeyMaterial, SALT_LEN},
};
