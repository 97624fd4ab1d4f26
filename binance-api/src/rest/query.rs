use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::Error;

use super::{client::Client, endpoint::Endpoint};

#[async_trait]
pub trait Query<T, C>
where
    C: Client,
{
    async fn query(&self, client: &C) -> Result<T, Error>;
}

#[async_trait]
impl<E, T, C> Query<T, C> for E
where
    E: Endpoint + Sync,
    T: DeserializeOwned + Send + 'static,
    C: Client + Sync,
{
    async fn query(&self, client: &C) -> Result<T, Error> {
        let endpoint = self.endpoint();
        let mut url = client.url(&endpoint)?;
        self.params().add_to_url(&mut url);

        let request = http::Request::builder()
            .method(self.method())
            .uri(url.as_str());
        let response = client.exec(request).await?;
        if !response.status().is_success() {
            return Err(Error::from_response(response.status(), response.body()));
        }
        let res: T = serde_json::from_slice(response.body())
            .context(format!("Parsing response of {endpoint}"))?;
        return Ok(res);
    }
}
