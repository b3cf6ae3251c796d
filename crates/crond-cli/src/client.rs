use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::{de::DeserializeOwned, Serialize};

use crond_core::api::ErrorBody;

/// Thin JSON client for the daemon's control API.
pub struct Client {
    http: reqwest::Client,
    base: String,
}

impl Client {
    pub fn new(addr: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base: format!("http://{addr}"),
        })
    }

    pub async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> anyhow::Result<R> {
        let resp = self
            .http
            .post(format!("{}{path}", self.base))
            .json(body)
            .send()
            .await
            .with_context(|| format!("crond unreachable at {}", self.base))?;
        decode(resp).await
    }

    pub async fn get<R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> anyhow::Result<R> {
        let resp = self
            .http
            .get(format!("{}{path}", self.base))
            .query(query)
            .send()
            .await
            .with_context(|| format!("crond unreachable at {}", self.base))?;
        decode(resp).await
    }
}

async fn decode<R: DeserializeOwned>(resp: reqwest::Response) -> anyhow::Result<R> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }
    let text = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => Err(anyhow!("{} ({})", body.error, body.code)),
        Err(_) => Err(anyhow!("crond returned {status}: {text}")),
    }
}
