#[cfg(test)]
use mockall::automock;
use {
    super::entities::{
        Arguments,
        Namespace,
        Value,
    },
    crate::config::NamespaceConfig,
    anyhow::anyhow,
    axum::async_trait,
    serde::Serialize,
    std::{
        collections::HashMap,
        time::Duration,
    },
    url::Url,
};

/// Backing source of cached entities.
///
/// Implementations are treated as opaque, retryable and potentially failing; they own their
/// own timeout policy.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    async fn fetch(
        &self,
        namespace: &str,
        key: &str,
        arguments: &Arguments,
    ) -> anyhow::Result<Value>;
}

#[derive(Serialize)]
struct UpstreamRequest<'a> {
    key:       &'a str,
    arguments: &'a Arguments,
}

/// Fetches entities over HTTP from the upstream configured for each namespace.
pub struct UpstreamFetcher {
    client: reqwest::Client,
    urls:   HashMap<Namespace, Url>,
}

impl UpstreamFetcher {
    pub fn new(namespaces: &[NamespaceConfig], timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            urls:   namespaces
                .iter()
                .filter_map(|namespace| {
                    namespace
                        .upstream_url
                        .clone()
                        .map(|url| (namespace.name.clone(), url))
                })
                .collect(),
        })
    }
}

#[async_trait]
impl Fetcher for UpstreamFetcher {
    async fn fetch(
        &self,
        namespace: &str,
        key: &str,
        arguments: &Arguments,
    ) -> anyhow::Result<Value> {
        let url = self
            .urls
            .get(namespace)
            .ok_or_else(|| anyhow!("No upstream configured for namespace {}", namespace))?;
        let response = self
            .client
            .post(url.clone())
            .json(&UpstreamRequest { key, arguments })
            .send()
            .await
            .map_err(|err| {
                tracing::error!(namespace, key, error = ?err, "Upstream request failed");
                err
            })?
            .error_for_status()?;
        Ok(response.json::<Value>().await?)
    }
}
