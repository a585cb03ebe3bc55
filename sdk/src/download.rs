use {
    crate::{crypto, transport::Transport},
    anyhow::{Context as _, Result},
    derive_more::Display,
    forsla_protocol::{
        credentials::FilePassword,
        endpoints::{FetchChunk, FetchMetadata, GetFileStatus},
        FileId, Metadata,
    },
    std::{error::Error, io::Write},
    tracing::{debug, info},
};

/// Raised when the requested file is unknown to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("file not found on server")]
pub struct NotFoundError;

impl Error for NotFoundError {}

/// Raised when the file exists but its upload was never finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("the file's upload was never completed")]
pub struct IncompleteUploadError;

impl Error for IncompleteUploadError {}

/// An opened download: existence and completeness verified, metadata
/// decrypted, chunks not yet fetched.
#[derive(Debug)]
pub struct DownloadSession {
    file_id: FileId,
    password: FilePassword,
    metadata: Metadata,
    total_chunks: u64,
}

impl DownloadSession {
    /// Verifies that the file exists and is complete, then fetches and
    /// decrypts the metadata record. No chunk is fetched before both checks
    /// pass; the server's reported chunk count is authoritative.
    #[inline]
    pub async fn open<T: Transport>(
        transport: &T,
        file_id: FileId,
        password: FilePassword,
    ) -> Result<Self> {
        let status = transport
            .request(&GetFileStatus {
                file_id: file_id.clone(),
            })
            .await?;
        if !status.exists {
            return Err(NotFoundError.into());
        }
        if !status.finished {
            return Err(IncompleteUploadError.into());
        }

        let envelope = transport
            .request(&FetchMetadata {
                file_id: file_id.clone(),
            })
            .await?;
        let metadata_text = crypto::decrypt_text(&envelope, &password)
            .context("failed to decrypt metadata; is the password correct?")?;
        let metadata =
            Metadata::from_text(&metadata_text).context("malformed metadata record")?;
        debug!(?metadata.name, ?metadata.mime, metadata.size, "metadata decrypted");

        Ok(Self {
            file_id,
            password,
            metadata,
            total_chunks: status.chunks,
        })
    }

    #[must_use]
    #[inline]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    #[must_use]
    #[inline]
    pub fn total_chunks(&self) -> u64 {
        self.total_chunks
    }

    /// Fetches, decrypts and writes every chunk strictly in index order.
    ///
    /// The cipher makes each chunk an independent unit; the file's layout is
    /// implied only by the order the chunks are written in. A failed fetch
    /// aborts the session and may leave partial output behind.
    #[inline]
    pub async fn save_to<T: Transport>(
        &self,
        transport: &T,
        output: &mut impl Write,
    ) -> Result<u64> {
        let mut written = 0u64;
        for index in 0..self.total_chunks {
            let envelope = transport
                .request(&FetchChunk {
                    file_id: self.file_id.clone(),
                    index,
                })
                .await?;
            let plaintext = crypto::decrypt(&envelope, &self.password)
                .with_context(|| format!("failed to decrypt chunk {index}"))?;
            output.write_all(&plaintext)?;
            written += plaintext.len() as u64;
        }
        output.flush()?;
        info!(
            "downloaded {:?}: {} chunk(s), {} bytes",
            self.metadata.name, self.total_chunks, written,
        );
        Ok(written)
    }
}
