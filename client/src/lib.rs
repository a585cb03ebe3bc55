pub mod cli;
pub mod config;

use std::{
    ffi::OsStr,
    fmt::Display,
    path::{Path, PathBuf},
};

use anyhow::{Context as _, Result};
use byte_unit::{Byte, UnitType};
use cli::{Cli, Command};
use config::Config;
use forsla_protocol::credentials::PasswordGenerator;
use forsla_protocol::endpoints::{GetFileStatus, GetServerInfo, GetUploadIp};
use forsla_sdk::{upload_file, Client, DownloadSession, Transport as _};
use tracing::info;

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Command::Upload {
            path,
            deletable,
            mime,
        } => {
            let generator = PasswordGenerator::new(
                config.password_min_length,
                config.password_max_length,
            )?;
            let password = generator.generate()?;
            let delete_password = deletable
                .unwrap_or(config.deletable)
                .then(|| generator.generate())
                .transpose()?;
            let mime = match &mime {
                Some(mime) => mime.as_str(),
                None => guess_mime(&path),
            };

            let client = Client::new(config.server_url.clone())?;
            let link = upload_file(
                &client,
                &config.server_url,
                &path,
                mime,
                password,
                delete_password.as_ref(),
            )
            .await?;

            if let Some(delete_password) = delete_password {
                info!("delete password: {}", delete_password.as_unmasked_str());
            }
            println!("{link}");
        }
        Command::Download { link, output } => {
            let client = Client::new(link.server.clone())?;
            let password = match link.password.clone() {
                Some(password) => password,
                None => rpassword::prompt_password("File password: ")?
                    .parse()
                    .context("invalid password")?,
            };
            let session = DownloadSession::open(&client, link.file_id.clone(), password).await?;
            let output = match output {
                Some(path) => path,
                // Only the file name component of the decrypted metadata is
                // trusted; it must not steer writes into other directories.
                None => Path::new(&session.metadata().name)
                    .file_name()
                    .map(PathBuf::from)
                    .context("metadata has no usable file name")?,
            };
            let mut file = fs_err::File::create(&output)?;
            session.save_to(&client, &mut file).await?;
            info!("saved to {:?}", output);
        }
        Command::Info { link } => {
            let client = Client::new(link.server.clone())?;
            let status = client
                .request(&GetFileStatus {
                    file_id: link.file_id.clone(),
                })
                .await?;
            if !status.exists {
                info!("{}: not found", link.file_id);
                return Ok(());
            }
            info!("file id: {}", link.file_id);
            info!("finished: {}", status.finished);
            info!("chunks: {}", status.chunks);
            let ip = client
                .request(&GetUploadIp {
                    file_id: link.file_id,
                })
                .await?;
            info!("uploaded from: {}", ip.upload_ip);
        }
        Command::Status => {
            let client = Client::new(config.server_url.clone())?;
            let server_info = client.request(&GetServerInfo).await?;
            info!("server: {}", config.server_url);
            info!(
                "max file size: {} ({} bytes)",
                pretty_size(server_info.max_filesize),
                server_info.max_filesize,
            );
        }
        Command::GeneratePassword => {
            let generator = PasswordGenerator::new(
                config.password_min_length,
                config.password_max_length,
            )?;
            println!("{}", generator.generate()?.as_unmasked_str());
        }
    }
    Ok(())
}

pub fn pretty_size(size: u64) -> impl Display {
    Byte::from_u64(size).get_appropriate_unit(UnitType::Decimal)
}

/// Minimal extension lookup. The metadata only needs a hint, and the server
/// never sees it either way.
fn guess_mime(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("txt" | "md" | "log") => "text/plain",
        Some("html" | "htm") => "text/html",
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("zip") => "application/zip",
        Some("gz") => "application/gzip",
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}
