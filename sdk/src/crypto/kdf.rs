use {
    md5::{Digest, Md5},
    std::fmt::{self, Debug},
};

pub const SALT_LEN: usize = 8;
pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;

/// Key and IV for one envelope. Deterministic function of (password, salt);
/// never reused across different salts.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    pub key: [u8; KEY_LEN],
    pub iv: [u8; IV_LEN],
}

impl Debug for KeyMaterial {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial").finish()
    }
}

/// Stretches a password and salt into key material.
///
/// Round `n` computes `D_n = MD5(D_{n-1} || password || salt)` (no previous
/// digest in the first round); digests are concatenated until 48 bytes are
/// available. Byte-compatible with the legacy scheme of the interoperating
/// ecosystem; the digest choice is fixed by that format, not selectable.
#[must_use]
#[inline]
pub fn derive(password: &[u8], salt: &[u8; SALT_LEN]) -> KeyMaterial {
    let mut material = Vec::with_capacity(KEY_LEN + IV_LEN);
    let mut block = [0u8; 16];
    let mut first = true;
    while material.len() < KEY_LEN + IV_LEN {
        let mut hasher = Md5::new();
        if !first {
            hasher.update(block);
        }
        hasher.update(password);
        hasher.update(salt);
        block = hasher.finalize().into();
        material.extend_from_slice(&block);
        first = false;
    }
    let mut key = [0u8; KEY_LEN];
    let mut iv = [0u8; IV_LEN];
    key.copy_from_slice(&material[..KEY_LEN]);
    iv.copy_from_slice(&material[KEY_LEN..KEY_LEN + IV_LEN]);
    KeyMaterial { key, iv }
}
