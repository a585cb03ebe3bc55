use {
    crate::{credentials::FilePassword, FileId},
    anyhow::{bail, Context as _, Error, Result},
    std::{fmt, str::FromStr},
    url::Url,
};

/// Reference to an uploaded file: server, file id and, when present, the
/// password carried in the URL fragment.
///
/// The fragment is the only place the password appears; when it is absent,
/// the recipient must obtain the password out of band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub server: Url,
    pub file_id: FileId,
    pub password: Option<FilePassword>,
}

impl fmt::Display for ShareLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut url = self.server.clone();
        url.set_path(&self.file_id.0);
        url.set_fragment(self.password.as_ref().map(FilePassword::as_unmasked_str));
        write!(f, "{url}")
    }
}

impl FromStr for ShareLink {
    type Err = Error;

    #[inline]
    fn from_str(s: &str) -> Result<Self> {
        let url = Url::parse(s).context("invalid share link")?;
        let Some(file_id) = url
            .path_segments()
            .and_then(|segments| segments.rev().find(|segment| !segment.is_empty()))
        else {
            bail!("share link is missing a file id: {url}");
        };
        let file_id = FileId(file_id.to_owned());
        let password = url
            .fragment()
            .filter(|fragment| !fragment.is_empty())
            .map(FilePassword::from_str)
            .transpose()
            .context("invalid password in share link fragment")?;
        let mut server = url.clone();
        server.set_path("");
        server.set_query(None);
        server.set_fragment(None);
        Ok(Self {
            server,
            file_id,
            password,
        })
    }
}
