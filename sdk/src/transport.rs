use {
    anyhow::{Context as _, Result},
    forsla_protocol::endpoints::RequestToResponse,
    reqwest::Method,
    serde::{de::DeserializeOwned, Serialize},
    std::time::Duration,
    url::Url,
};

/// Large enough for a full chunk body on a slow uplink.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Seam between the transfer sessions and the server API.
///
/// Sessions are generic over this trait, so tests can drive them against an
/// in-memory server. A failed request is terminal for the calling session;
/// implementations must not retry on their own.
pub trait Transport {
    async fn request<R>(&self, request: &R) -> Result<R::Response>
    where
        R: RequestToResponse + Serialize + Sync,
        R::Response: DeserializeOwned;
}

/// HTTP transport speaking the server's JSON API.
///
/// Reuse a created client or clone it in order to reuse a connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    reqwest: reqwest::Client,
    server_url: Url,
}

impl Client {
    #[inline]
    pub fn new(server_url: Url) -> Result<Self> {
        Ok(Self {
            server_url,
            reqwest: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()?,
        })
    }

    #[must_use]
    #[inline]
    pub fn server_url(&self) -> &Url {
        &self.server_url
    }
}

impl Transport for Client {
    #[inline]
    async fn request<R>(&self, request: &R) -> Result<R::Response>
    where
        R: RequestToResponse + Serialize + Sync,
        R::Response: DeserializeOwned,
    {
        let url = self.server_url.join(R::PATH)?;
        self.reqwest
            .request(Method::POST, url.clone())
            .json(request)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()
            .context("server reported an error")?
            .json()
            .await
            .context("malformed server response")
    }
}
