use reqwest::header::ACCEPT;
use url::Url;

use crate::{EngineSettings, HydrateError, Resource};

/// Source of the initial snapshot for each cached family.
#[async_trait::async_trait]
pub trait Hydrator: Send + Sync {
    /// Returns the raw JSON body; decoding belongs to the sync core.
    async fn fetch(&self, resource: Resource) -> Result<String, HydrateError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestHydrator {
    base: Url,
    client: reqwest::Client,
}

impl ReqwestHydrator {
    pub fn new(settings: &EngineSettings) -> Result<Self, HydrateError> {
        // `Url::join` drops the last segment unless the base ends in a slash.
        let mut base = settings.rest_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|err| HydrateError::InvalidUrl(err.to_string()))?;

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout())
            .timeout(settings.request_timeout())
            .build()
            .map_err(|err| HydrateError::Network(err.to_string()))?;

        Ok(Self { base, client })
    }

    pub fn url_for(&self, resource: Resource) -> Result<Url, HydrateError> {
        self.base
            .join(resource.path())
            .map_err(|err| HydrateError::InvalidUrl(err.to_string()))
    }
}

#[async_trait::async_trait]
impl Hydrator for ReqwestHydrator {
    async fn fetch(&self, resource: Resource) -> Result<String, HydrateError> {
        let url = self.url_for(resource)?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(HydrateError::HttpStatus(status.as_u16()));
        }
        response.text().await.map_err(map_reqwest_error)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> HydrateError {
    if err.is_timeout() {
        return HydrateError::Timeout(err.to_string());
    }
    HydrateError::Network(err.to_string())
}
