use {
    crate::crypto::kdf::{self, KeyMaterial, SALT_LEN},
    aes::{
        cipher::{
            block_padding::{NoPadding, Pkcs7},
            BlockDecryptMut as _, BlockEncryptMut as _, KeyIvInit as _,
        },
        Aes256,
    },
    anyhow::{Context as _, Result},
    base64::{prelude::BASE64_STANDARD, Engine as _},
    derive_more::Display,
    forsla_protocol::{credentials::FilePassword, Envelope},
    rand::{rngs::OsRng, TryRngCore as _},
    std::error::Error,
};

/// Literal marker that opens every decoded envelope, followed by the salt.
const MAGIC: &[u8; 8] = b"Salted__";
const BLOCK_SIZE: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Envelope that cannot be decoded: damaged transport text or a container
/// that was never produced by a conforming encryptor.
///
/// The format has no authentication, so the padding check here is the only
/// defense against malformed input. A wrong password usually decrypts into
/// garbage without tripping it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EnvelopeFormatError {
    #[display("envelope is not valid base64")]
    Base64,
    #[display("envelope is too short")]
    Truncated,
    #[display("envelope marker mismatch")]
    BadMarker,
    #[display("ciphertext length is not a multiple of the cipher block size")]
    Misaligned,
    #[display("padding length {_0} is out of range")]
    BadPadding(u8),
}

impl Error for EnvelopeFormatError {}

/// Encrypts one payload under a fresh salt.
#[inline]
pub fn encrypt(plaintext: &[u8], password: &FilePassword) -> Result<Envelope> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .context("failed to draw envelope salt")?;
    Ok(encrypt_with_salt(plaintext, password, &salt))
}

/// Deterministic half of [`encrypt`]: any two conforming implementations
/// must produce identical output for identical (plaintext, password, salt).
#[must_use]
#[inline]
pub fn encrypt_with_salt(
    plaintext: &[u8],
    password: &FilePassword,
    salt: &[u8; SALT_LEN],
) -> Envelope {
    let KeyMaterial { key, iv } = kdf::derive(password.as_unmasked_str().as_bytes(), salt);
    let ciphertext =
        Aes256CbcEnc::new(&key.into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    let mut raw = Vec::with_capacity(MAGIC.len() + SALT_LEN + ciphertext.len());
    raw.extend_from_slice(MAGIC);
    raw.extend_from_slice(salt);
    raw.extend_from_slice(&ciphertext);
    Envelope(BASE64_STANDARD.encode(raw))
}

/// Decodes and decrypts an envelope.
///
/// The marker and framing are validated before any decryption is attempted.
/// The final padding byte must be in `1..=16` and must not exceed the
/// decrypted length; everything else about the plaintext is taken on faith.
#[inline]
pub fn decrypt(
    envelope: &Envelope,
    password: &FilePassword,
) -> Result<Vec<u8>, EnvelopeFormatError> {
    let raw = BASE64_STANDARD
        .decode(envelope.as_str())
        .map_err(|_| EnvelopeFormatError::Base64)?;
    if raw.len() < MAGIC.len() + SALT_LEN {
        return Err(EnvelopeFormatError::Truncated);
    }
    let (head, ciphertext) = raw.split_at(MAGIC.len() + SALT_LEN);
    let (magic, salt_bytes) = head.split_at(MAGIC.len());
    if magic != MAGIC {
        return Err(EnvelopeFormatError::BadMarker);
    }
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(EnvelopeFormatError::Misaligned);
    }
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(salt_bytes);

    let KeyMaterial { key, iv } = kdf::derive(password.as_unmasked_str().as_bytes(), &salt);
    let mut plaintext = Aes256CbcDec::new(&key.into(), &iv.into())
        .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
        .map_err(|_| EnvelopeFormatError::Misaligned)?;

    let Some(&pad) = plaintext.last() else {
        return Err(EnvelopeFormatError::Misaligned);
    };
    let pad_len = usize::from(pad);
    if pad_len == 0 || pad_len > BLOCK_SIZE || pad_len > plaintext.len() {
        return Err(EnvelopeFormatError::BadPadding(pad));
    }
    plaintext.truncate(plaintext.len() - pad_len);
    Ok(plaintext)
}

/// [`decrypt`] for text payloads (the metadata record).
#[inline]
pub fn decrypt_text(envelope: &Envelope, password: &FilePassword) -> Result<String> {
    let plaintext = decrypt(envelope, password)?;
    String::from_utf8(plaintext).context("decrypted payload is not valid UTF-8")
}
