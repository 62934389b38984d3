use reqwest::Client;

use crate::config::AzureSpeechConfig;
use crate::error::{Error, Result};

#[derive(Clone)]
pub struct SpeechService {
    client: Client,
    config: Option<AzureSpeechConfig>,
}

impl SpeechService {
    pub fn new(config: Option<AzureSpeechConfig>, client: Client) -> Self {
        Self { client, config }
    }

    /// Short-lived Azure Speech token plus the region it is valid for.
    pub async fn issue_token(&self) -> Result<(String, String)> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| Error::Config("Azure Speech Service not configured".to_string()))?;

        let res = self
            .client
            .post(format!(
                "https://{}.api.cognitive.microsoft.com/sts/v1.0/issueToken",
                config.region
            ))
            .header("Ocp-Apim-Subscription-Key", &config.key)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(status = %res.status(), "speech token request failed");
            return Err(Error::Upstream("Failed to get speech token".to_string()));
        }
        Ok((res.text().await?, config.region.clone()))
    }
}
