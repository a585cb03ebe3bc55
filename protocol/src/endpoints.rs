use {
    crate::{credentials::UploadPassword, Envelope, FileId},
    serde::{Deserialize, Serialize},
};

pub trait RequestToResponse {
    type Response;
    const PATH: &'static str;
}
macro_rules! response_type {
    ($request:ty, $response:ty, $path:literal) => {
        impl RequestToResponse for $request {
            type Response = $response;
            const PATH: &'static str = concat!("/api/", $path);
        }
    };
}

pub type Response<Request> = <Request as RequestToResponse>::Response;

/// Returns the server's upload limits.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetServerInfo;
response_type!(GetServerInfo, ServerInfo, "serverinfo");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub max_filesize: u64,
}

/// Checks whether the specified file is known to the server and whether its
/// upload was finalized. The reported chunk count is authoritative for
/// downloads.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetFileStatus {
    pub file_id: FileId,
}
response_type!(GetFileStatus, FileStatus, "exists");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStatus {
    pub exists: bool,
    pub finished: bool,
    pub chunks: u64,
}

/// Returns the address the specified file was uploaded from.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetUploadIp {
    pub file_id: FileId,
}
response_type!(GetUploadIp, UploadIp, "ip");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadIp {
    pub upload_ip: String,
}

/// Submits the encrypted metadata record and chunk 0 of a new file in a
/// single request. The reply assigns the file id and, unless `finish` was
/// set, the credential required for the remaining chunks.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadFirstChunk {
    pub metadata: Envelope,
    pub chunk: Envelope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_password: Option<String>,
    pub finish: bool,
}
response_type!(UploadFirstChunk, FirstChunkReply, "upload");

#[derive(Debug, Serialize, Deserialize)]
pub struct FirstChunkReply {
    pub file_id: FileId,
    #[serde(default)]
    pub upload_password: Option<UploadPassword>,
}

/// Submits one encrypted chunk of an upload in progress.
/// `finish` must be set exactly on the last chunk.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadChunk {
    pub file_id: FileId,
    pub upload_password: UploadPassword,
    pub index: u64,
    pub chunk: Envelope,
    pub finish: bool,
}
response_type!(UploadChunk, (), "upload-chunk");

/// Returns the encrypted metadata record of a finished upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct FetchMetadata {
    pub file_id: FileId,
}
response_type!(FetchMetadata, Envelope, "metadata");

/// Returns one encrypted chunk of a finished upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct FetchChunk {
    pub file_id: FileId,
    pub index: u64,
}
response_type!(FetchChunk, Envelope, "file-chunk");
