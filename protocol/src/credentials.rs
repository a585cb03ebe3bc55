use {
    anyhow::{anyhow, bail, ensure, Error},
    derive_more::From,
    rand::{rand_core, rngs::OsRng, Rng},
    serde::{Deserialize, Serialize},
    std::{
        any::Any,
        fmt::{self, Debug},
        panic::catch_unwind,
        str::FromStr,
    },
};

/// The four disjoint character classes a transfer password is drawn from.
/// Consecutive characters never come from the same class, which keeps the
/// password readable and hard to mistranscribe.
const CLASSES: [&[u8]; 4] = [
    b"abcdefghijklmnopqrstuvwxyz",
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    b"0123456789",
    b"-_",
];

fn format_panic_message(err: &(dyn Any + Send + 'static)) -> String {
    err.downcast_ref::<&'static str>()
        .map(|&s| s.to_owned())
        .or_else(|| err.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| format!("{err:?}"))
}

/// Secret that encrypts one transfer.
///
/// It travels only inside the share link's URL fragment, which HTTP clients
/// never send to the server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePassword(String);

impl FilePassword {
    #[must_use]
    #[inline]
    pub fn as_unmasked_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for FilePassword {
    type Err = Error;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ensure!(!s.is_empty(), "password cannot be empty");
        if let Some(c) = s.chars().find(|c| !c.is_ascii_graphic()) {
            bail!("password contains unsupported character `{c}`");
        }
        Ok(Self(s.to_owned()))
    }
}

impl Debug for FilePassword {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePassword").finish()
    }
}

/// Credential assigned by the server after the first chunk of an upload.
/// Required for every subsequent chunk of the same file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, From)]
pub struct UploadPassword(String);

impl UploadPassword {
    #[must_use]
    #[inline]
    pub fn as_unmasked_str(&self) -> &str {
        &self.0
    }
}

impl Debug for UploadPassword {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadPassword").finish()
    }
}

/// Generates transfer passwords of a length chosen uniformly from an
/// inclusive range, rotating between character classes on every position.
///
/// The rotation is a transcription aid, not a hardening measure: the entropy
/// of each character is bounded by the size of its class.
#[derive(Debug, Clone, Copy)]
pub struct PasswordGenerator {
    min_len: usize,
    max_len: usize,
}

impl PasswordGenerator {
    #[inline]
    pub fn new(min_len: usize, max_len: usize) -> anyhow::Result<Self> {
        ensure!(
            min_len > 0 && min_len <= max_len,
            "invalid password length bounds: {min_len}..={max_len}",
        );
        Ok(Self { min_len, max_len })
    }

    #[inline]
    pub fn generate(&self) -> anyhow::Result<FilePassword> {
        let (min_len, max_len) = (self.min_len, self.max_len);
        catch_unwind(move || {
            let mut rng = rand_core::UnwrapErr(OsRng);
            let len = rng.random_range(min_len..=max_len);
            let mut class = rng.random_range(0..CLASSES.len());
            let mut password = String::with_capacity(len);
            for _ in 0..len {
                let chars = CLASSES[class];
                password.push(char::from(chars[rng.random_range(0..chars.len())]));
                // Uniform choice among the three classes other than the
                // current one.
                class = (class + 1 + rng.random_range(0..CLASSES.len() - 1)) % CLASSES.len();
            }
            FilePassword(password)
        })
        .map_err(|err| anyhow!(format_panic_message(&*err)))
    }
}
