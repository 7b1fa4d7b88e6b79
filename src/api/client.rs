use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::{normalize_error, Error};
use super::types::{Survey, VotePayload, VoteResult};
use crate::config::Config;

const CLIENT_AGENT: &str = concat!("survey-vote/", env!("CARGO_PKG_VERSION"));

/// Remote survey API. Implemented over HTTP by [`ApiClient`]; tests swap in
/// scripted fakes.
#[async_trait]
pub trait SurveyApi {
    async fn survey_structure(&self, survey_id: u64) -> Result<Survey, Error>;
    async fn submit_vote(&self, payload: &VotePayload) -> Result<VoteResult, Error>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        let response = request
            .header(USER_AGENT, CLIENT_AGENT)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = normalize_error(status.as_u16(), &body);
            warn!("API request failed: {err}");
            return Err(err.into());
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl SurveyApi for ApiClient {
    async fn survey_structure(&self, survey_id: u64) -> Result<Survey, Error> {
        let url = self.url(&format!("api/surveys/{survey_id}/structure"));
        debug!("GET {url}");
        let request = self
            .client
            .get(url)
            .query(&[("includeInactiveOptions", "false")]);
        self.send_json(request).await
    }

    async fn submit_vote(&self, payload: &VotePayload) -> Result<VoteResult, Error> {
        let url = self.url("api/votes");
        debug!(
            "POST {url} survey={} question={}",
            payload.survey_id, payload.question_id
        );
        self.send_json(self.client.post(url).json(payload)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(base: &str) -> ApiClient {
        let config = Config {
            api_base_url: Config::normalize_base_url(base).expect("url"),
            timeout_secs: 5,
            data_dir: std::env::temp_dir(),
        };
        ApiClient::new(&config).expect("client")
    }

    #[test]
    fn urls_are_joined_without_double_slashes() {
        let client = client_for("https://api.example.org/");
        assert_eq!(
            client.url("/api/surveys/3/structure"),
            "https://api.example.org/api/surveys/3/structure"
        );
        assert_eq!(client.url("api/votes"), "https://api.example.org/api/votes");
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let client = client_for("https://example.org/v2//");
        assert_eq!(client.url("api/votes"), "https://example.org/v2/api/votes");
    }
}
