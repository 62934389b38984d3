use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::config::CloudinaryConfig;
use crate::error::{Error, Result};
use crate::utils::crypto::sign_params;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
    pub format: String,
}

/// Where voice recordings are stored.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload_audio(
        &self,
        folder: &str,
        public_id: &str,
        data: Bytes,
        content_type: &str,
        format: &str,
    ) -> Result<UploadedMedia>;

    async fn destroy(&self, public_id: &str) -> Result<()>;
}

/// Audio lives under Cloudinary's `video` resource type.
#[derive(Clone)]
pub struct CloudinaryClient {
    client: Client,
    config: Option<CloudinaryConfig>,
}

impl CloudinaryClient {
    pub fn new(config: Option<CloudinaryConfig>, client: Client) -> Self {
        Self { client, config }
    }

    fn config(&self) -> Result<&CloudinaryConfig> {
        self.config
            .as_ref()
            .ok_or_else(|| Error::Config("Cloudinary not configured".to_string()))
    }

    fn endpoint(config: &CloudinaryConfig, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/video/{}",
            config.cloud_name, action
        )
    }

    async fn read_reply(res: reqwest::Response, action: &str) -> Result<JsonValue> {
        let status = res.status();
        let body: JsonValue = res.json().await?;
        if !status.is_success() {
            let message = body
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            return Err(Error::Upstream(format!(
                "Cloudinary {} failed ({}): {}",
                action, status, message
            )));
        }
        Ok(body)
    }
}

#[async_trait]
impl MediaHost for CloudinaryClient {
    async fn upload_audio(
        &self,
        folder: &str,
        public_id: &str,
        data: Bytes,
        content_type: &str,
        format: &str,
    ) -> Result<UploadedMedia> {
        let config = self.config()?;
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signed = [
            ("folder", folder.to_string()),
            ("format", format.to_string()),
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp.clone()),
        ];
        let signature = sign_params(&signed, &config.api_secret);

        let file = multipart::Part::bytes(data.to_vec())
            .file_name(format!("{}.{}", public_id, format))
            .mime_str(content_type)?;
        let mut form = multipart::Form::new()
            .part("file", file)
            .text("api_key", config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in signed {
            form = form.text(key, value);
        }

        let res = self
            .client
            .post(Self::endpoint(config, "upload"))
            .multipart(form)
            .send()
            .await?;
        let body = Self::read_reply(res, "upload").await?;

        let field = |name: &str| body.get(name).and_then(|v| v.as_str()).map(str::to_string);
        let uploaded = UploadedMedia {
            url: field("secure_url")
                .ok_or_else(|| Error::Upstream("Cloudinary upload returned no URL".to_string()))?,
            public_id: field("public_id").unwrap_or_else(|| format!("{}/{}", folder, public_id)),
            format: field("format").unwrap_or_else(|| format.to_string()),
        };
        tracing::info!(public_id = %uploaded.public_id, "recording uploaded");
        Ok(uploaded)
    }

    async fn destroy(&self, public_id: &str) -> Result<()> {
        let config = self.config()?;
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signed = [
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp),
        ];
        let signature = sign_params(&signed, &config.api_secret);

        let mut params: Vec<(&str, String)> = signed.to_vec();
        params.push(("api_key", config.api_key.clone()));
        params.push(("signature", signature));
        params.push(("signature_algorithm", "sha256".to_string()));

        let res = self
            .client
            .post(Self::endpoint(config, "destroy"))
            .form(&params)
            .send()
            .await?;
        let body = Self::read_reply(res, "destroy").await?;
        match body.get("result").and_then(|r| r.as_str()) {
            Some("ok") | Some("not found") => Ok(()),
            other => Err(Error::Upstream(format!(
                "Cloudinary destroy returned {:?}",
                other
            ))),
        }
    }
}
