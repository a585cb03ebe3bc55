pub mod crypto;
mod download;
mod transport;
mod upload;

#[cfg(test)]
mod mock;

pub use crate::{
    download::{DownloadSession, IncompleteUploadError, NotFoundError},
    transport::{Client, Transport},
    upload::{upload_file, SizeLimitError, UploadSession},
};
