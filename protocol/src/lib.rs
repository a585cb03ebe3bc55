pub mod credentials;
pub mod endpoints;
mod link;

pub use crate::link::ShareLink;
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Size of a single file chunk.
///
/// Fixed by the transfer protocol; every chunk except the last one is
/// exactly this long.
pub const CHUNK_SIZE: u64 = 1024 * 1024;

/// Number of chunks a file of `size` bytes is split into.
///
/// An empty file still occupies one (empty) chunk.
#[must_use]
#[inline]
pub fn chunk_count(size: u64) -> u64 {
    size.div_ceil(CHUNK_SIZE).max(1)
}

/// Server-assigned identifier of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
pub struct FileId(pub String);

/// Base64 text of a `"Salted__" || salt || ciphertext` container, the unit
/// exchanged with the server for the metadata record and every file chunk.
///
/// The salt is not secret; the password needed to decrypt the ciphertext
/// never reaches the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display, From, Into)]
pub struct Envelope(pub String);

impl Envelope {
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Descriptive record stored alongside the chunks of an upload.
///
/// Serialized to compact JSON and encrypted through the same envelope as the
/// file chunks, so the server sees none of its fields. The delete password
/// is present only when the uploader enabled deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub mime: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_password: Option<String>,
}

impl Metadata {
    #[inline]
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    #[inline]
    pub fn from_text(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_count_law() {
        assert_eq!(chunk_count(0), 1);
        assert_eq!(chunk_count(1), 1);
        assert_eq!(chunk_count(CHUNK_SIZE - 1), 1);
        assert_eq!(chunk_count(CHUNK_SIZE), 1);
        assert_eq!(chunk_count(CHUNK_SIZE + 1), 2);
        assert_eq!(chunk_count(CHUNK_SIZE * 2), 2);
        assert_eq!(chunk_count(CHUNK_SIZE * 2 + 1), 3);
    }

    #[test]
    fn metadata_text_roundtrip() {
        let metadata = Metadata {
            name: "report.pdf".into(),
            mime: "application/pdf".into(),
            size: 123_456,
            delete_password: None,
        };
        let text = metadata.to_text().unwrap();
        assert!(!text.contains("delete_password"));
        assert_eq!(Metadata::from_text(&text).unwrap(), metadata);

        let deletable = Metadata {
            delete_password: Some("XqT-2ab".into()),
            ..metadata
        };
        let text = deletable.to_text().unwrap();
        assert_eq!(Metadata::from_text(&text).unwrap(), deletable);
    }
}
