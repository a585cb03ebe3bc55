use std::path::PathBuf;

use clap::{Parser, Subcommand};
use forsla_protocol::ShareLink;

#[derive(Debug, Parser)]
#[clap(version, about)]
pub struct Cli {
    /// Path to the configuration file.
    #[clap(long)]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Encrypts a file locally and uploads it, printing the share link.
    Upload {
        path: PathBuf,
        /// Whether whoever holds the delete password may remove the file.
        /// Overrides the configured default.
        #[arg(long)]
        deletable: Option<bool>,
        /// MIME type to record instead of guessing it from the extension.
        #[arg(long)]
        mime: Option<String>,
    },
    /// Downloads and decrypts a shared file.
    ///
    /// When the link carries no password fragment, the password is asked
    /// for interactively.
    Download {
        link: ShareLink,
        /// Output path; defaults to the file name stored in the encrypted
        /// metadata.
        output: Option<PathBuf>,
    },
    /// Shows whether a shared file exists and is complete, without
    /// downloading anything.
    Info { link: ShareLink },
    /// Shows the server's upload limits.
    Status,
    /// Generates a transfer password without uploading anything.
    GeneratePassword,
}
