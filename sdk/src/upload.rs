use {
    crate::{crypto, transport::Transport},
    anyhow::{ensure, Context as _, Result},
    derive_more::Display,
    forsla_protocol::{
        chunk_count,
        credentials::FilePassword,
        endpoints::{FirstChunkReply, GetServerInfo, UploadChunk, UploadFirstChunk},
        FileId, Metadata, ShareLink, CHUNK_SIZE,
    },
    fs_err::File,
    std::{error::Error, io, io::Read, path::Path},
    tracing::{debug, info},
    url::Url,
};

/// Raised before any upload call when the file exceeds the server's
/// declared maximum size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("file size {size} exceeds the server limit of {max} bytes")]
pub struct SizeLimitError {
    pub size: u64,
    pub max: u64,
}

impl Error for SizeLimitError {}

/// Drives one upload: encrypts the metadata record and every chunk under the
/// session password and submits them strictly in order.
///
/// Chunk 0 carries the metadata envelope and receives the server-assigned
/// file id plus, when more chunks remain, the upload password; both are
/// threaded unchanged through the remaining chunks. Uploads are
/// all-or-nothing: any error leaves the session unusable and the remaining
/// chunks are never sent.
pub struct UploadSession {
    password: FilePassword,
    metadata: Metadata,
    total_chunks: u64,
    next_index: u64,
    credentials: Option<FirstChunkReply>,
}

impl UploadSession {
    #[must_use]
    #[inline]
    pub fn new(metadata: Metadata, password: FilePassword) -> Self {
        let total_chunks = chunk_count(metadata.size);
        Self {
            password,
            metadata,
            total_chunks,
            next_index: 0,
            credentials: None,
        }
    }

    #[must_use]
    #[inline]
    pub fn total_chunks(&self) -> u64 {
        self.total_chunks
    }

    /// True once the last chunk has been acknowledged.
    #[must_use]
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.next_index == self.total_chunks
    }

    #[must_use]
    #[inline]
    pub fn file_id(&self) -> Option<&FileId> {
        self.credentials.as_ref().map(|reply| &reply.file_id)
    }

    /// Encrypts and submits the next chunk in sequence.
    #[inline]
    pub async fn send_chunk<T: Transport>(
        &mut self,
        transport: &T,
        plaintext: &[u8],
    ) -> Result<()> {
        ensure!(!self.is_finished(), "all chunks were already submitted");
        let index = self.next_index;
        let finish = index + 1 == self.total_chunks;
        let chunk = crypto::encrypt(plaintext, &self.password)?;
        if index == 0 {
            let metadata_text = self
                .metadata
                .to_text()
                .context("failed to serialize metadata")?;
            let metadata = crypto::encrypt(metadata_text.as_bytes(), &self.password)?;
            let reply = transport
                .request(&UploadFirstChunk {
                    metadata,
                    chunk,
                    delete_password: self.metadata.delete_password.clone(),
                    finish,
                })
                .await?;
            self.credentials = Some(reply);
        } else {
            let credentials = self
                .credentials
                .as_ref()
                .context("first chunk was not acknowledged")?;
            let upload_password = credentials
                .upload_password
                .clone()
                .context("server did not assign an upload password")?;
            transport
                .request(&UploadChunk {
                    file_id: credentials.file_id.clone(),
                    upload_password,
                    index,
                    chunk,
                    finish,
                })
                .await?;
        }
        self.next_index += 1;
        debug!(index, finish, "chunk acknowledged");
        Ok(())
    }

    /// Share link for the completed upload. The password ends up in the URL
    /// fragment, which is never transmitted to the server.
    #[inline]
    pub fn share_link(&self, server: &Url) -> Result<ShareLink> {
        ensure!(self.is_finished(), "upload is not finished");
        let credentials = self
            .credentials
            .as_ref()
            .context("upload has no assigned file id")?;
        Ok(ShareLink {
            server: server.clone(),
            file_id: credentials.file_id.clone(),
            password: Some(self.password.clone()),
        })
    }
}

/// Uploads a file and returns its share link.
///
/// The server's size limit is checked before anything is transmitted.
#[inline]
pub async fn upload_file<T: Transport>(
    transport: &T,
    server: &Url,
    path: &Path,
    mime: &str,
    password: FilePassword,
    delete_password: Option<&FilePassword>,
) -> Result<ShareLink> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("unsupported file name: {path:?}"))?
        .to_owned();
    let size = fs_err::metadata(path)?.len();

    let server_info = transport.request(&GetServerInfo).await?;
    if size > server_info.max_filesize {
        return Err(SizeLimitError {
            size,
            max: server_info.max_filesize,
        }
        .into());
    }

    let metadata = Metadata {
        name,
        mime: mime.to_owned(),
        size,
        delete_password: delete_password
            .map(|password| password.as_unmasked_str().to_owned()),
    };
    let mut session = UploadSession::new(metadata, password);
    info!(
        "uploading {:?} ({} bytes) in {} chunk(s)",
        path,
        size,
        session.total_chunks(),
    );

    let mut source = File::open(path)?;
    let mut buf = vec![0u8; usize::try_from(CHUNK_SIZE)?];
    while !session.is_finished() {
        let len = read_chunk(&mut source, &mut buf)?;
        session.send_chunk(transport, &buf[..len]).await?;
    }
    session.share_link(server)
}

/// Reads until `buf` is full or the source is exhausted; a plain `read` may
/// return short.
fn read_chunk(source: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let len = source.read(&mut buf[filled..])?;
        if len == 0 {
            break;
        }
        filled += len;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::mock::MockServer,
        std::io::Write as _,
        tempfile::NamedTempFile,
    };

    fn password(text: &str) -> FilePassword {
        text.parse().unwrap()
    }

    fn server_url() -> Url {
        "https://files.example.net".parse().unwrap()
    }

    fn temp_file(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn single_chunk_when_size_equals_chunk_size() {
        let server = MockServer::new(10 * CHUNK_SIZE);
        let file = temp_file(&vec![0xABu8; usize::try_from(CHUNK_SIZE).unwrap()]);

        let link = upload_file(
            &server,
            &server_url(),
            file.path(),
            "application/octet-stream",
            password("Xq2-ab_7R"),
            None,
        )
        .await
        .unwrap();

        assert_eq!(
            server.requests(),
            ["/api/serverinfo", "/api/upload"],
            "a chunk-sized file must go up in exactly one upload call",
        );
        let stored = server.file(&link.file_id).unwrap();
        assert_eq!(stored.chunks.len(), 1);
        assert_eq!(stored.finish_flags, [true]);
        assert!(stored.finished);
        assert!(stored.delete_password.is_none());
    }

    #[tokio::test]
    async fn three_chunks_thread_credentials() {
        let server = MockServer::new(10 * CHUNK_SIZE);
        let content = vec![0x5Au8; usize::try_from(CHUNK_SIZE * 2 + 1).unwrap()];
        let file = temp_file(&content);

        let link = upload_file(
            &server,
            &server_url(),
            file.path(),
            "application/octet-stream",
            password("Xq2-ab_7R"),
            None,
        )
        .await
        .unwrap();

        assert_eq!(
            server.requests(),
            [
                "/api/serverinfo",
                "/api/upload",
                "/api/upload-chunk",
                "/api/upload-chunk",
            ],
        );
        // The mock rejects chunk submissions whose file id or upload
        // password differ from what it assigned, so reaching three stored
        // chunks proves the credentials were threaded unchanged.
        let stored = server.file(&link.file_id).unwrap();
        assert_eq!(stored.chunks.len(), 3);
        assert_eq!(stored.finish_flags, [false, false, true]);
        assert!(stored.finished);
    }

    #[tokio::test]
    async fn empty_file_is_one_chunk() {
        let server = MockServer::new(CHUNK_SIZE);
        let file = temp_file(b"");

        let link = upload_file(
            &server,
            &server_url(),
            file.path(),
            "text/plain",
            password("Xq2-ab_7R"),
            None,
        )
        .await
        .unwrap();

        let stored = server.file(&link.file_id).unwrap();
        assert_eq!(stored.chunks.len(), 1);
        assert!(stored.finished);
    }

    #[tokio::test]
    async fn size_limit_is_checked_before_uploading() {
        let server = MockServer::new(4);
        let file = temp_file(b"hello");

        let err = upload_file(
            &server,
            &server_url(),
            file.path(),
            "text/plain",
            password("Xq2-ab_7R"),
            None,
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.downcast_ref::<SizeLimitError>(),
            Some(&SizeLimitError { size: 5, max: 4 }),
        );
        assert_eq!(
            server.requests(),
            ["/api/serverinfo"],
            "nothing may be uploaded after the size check fails",
        );
    }

    #[tokio::test]
    async fn delete_password_reaches_server_and_metadata() {
        let server = MockServer::new(CHUNK_SIZE);
        let file = temp_file(b"hello");
        let pw = password("Xq2-ab_7R");
        let delete_pw = password("zZ9-qQ1_t");

        let link = upload_file(
            &server,
            &server_url(),
            file.path(),
            "text/plain",
            pw.clone(),
            Some(&delete_pw),
        )
        .await
        .unwrap();

        let stored = server.file(&link.file_id).unwrap();
        assert_eq!(stored.delete_password.as_deref(), Some("zZ9-qQ1_t"));
        let metadata_text = crypto::decrypt_text(&stored.metadata, &pw).unwrap();
        let metadata = Metadata::from_text(&metadata_text).unwrap();
        assert_eq!(metadata.delete_password.as_deref(), Some("zZ9-qQ1_t"));
        assert_eq!(metadata.size, 5);
        assert_eq!(metadata.mime, "text/plain");
    }

    #[tokio::test]
    async fn share_link_carries_the_password() {
        let server = MockServer::new(CHUNK_SIZE);
        let file = temp_file(b"hello");

        let link = upload_file(
            &server,
            &server_url(),
            file.path(),
            "text/plain",
            password("Xq2-ab_7R"),
            None,
        )
        .await
        .unwrap();

        assert_eq!(link.server, server_url());
        assert_eq!(
            link.password.as_ref().map(FilePassword::as_unmasked_str),
            Some("Xq2-ab_7R"),
        );
        assert!(link.to_string().ends_with("#Xq2-ab_7R"));
    }

    #[test]
    fn read_chunk_fills_across_short_reads() {
        // A reader that returns one byte at a time.
        struct OneByte(Vec<u8>);
        impl Read for OneByte {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.0.is_empty() || buf.is_empty() {
                    return Ok(0);
                }
                buf[0] = self.0.remove(0);
                Ok(1)
            }
        }

        let mut source = OneByte(vec![1, 2, 3, 4, 5]);
        let mut buf = [0u8; 4];
        assert_eq!(read_chunk(&mut source, &mut buf).unwrap(), 4);
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(read_chunk(&mut source, &mut buf).unwrap(), 1);
        assert_eq!(buf[0], 5);
    }
}
