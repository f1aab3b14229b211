use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::{
    config::Config,
    models::{
        gateway::{RegisteredResponse, SendMessageRequest, SessionStatus},
        phone::Address,
    },
};

/// Opaque messaging-network capability: check that an address can receive
/// messages, and send text to it. The bridge owns the session lifecycle.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn is_reachable(&self, address: &Address) -> Result<bool, Error>;

    async fn send(&self, address: &Address, text: &str) -> Result<(), Error>;
}

pub struct HttpGateway {
    http_client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpGateway {
    pub fn new(config: &Config) -> Result<Self, Error> {
        info!(base_url = %config.gateway_base_url, "Gateway client initialized");

        let mut gateway = Self::with_base_url(config.gateway_base_url.clone())?;
        gateway.auth_token = Some(config.gateway_auth_token.clone());

        Ok(gateway)
    }

    pub fn with_base_url(base_url: String) -> Result<Self, Error> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|_| anyhow!("Failed to create HTTP client"))?;

        Ok(Self {
            http_client,
            base_url,
            auth_token: None,
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.http_client.get(url);

        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.http_client.post(url);

        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn session_status(&self) -> Result<SessionStatus, Error> {
        let url = format!("{}/session/status", self.base_url);

        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Session status request failed: {}", e))?;

        let status = response.status();

        if !status.is_success() {
            return Err(anyhow!("Gateway returned status {}", status));
        }

        let session: SessionStatus = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse session status: {}", e))?;

        Ok(session)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn is_reachable(&self, address: &Address) -> Result<bool, Error> {
        let url = format!("{}/contacts/{}/registered", self.base_url, address);

        debug!(address = %address, "Checking recipient registration");

        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Registration check failed: {}", e))?;

        let status = response.status();

        if !status.is_success() {
            return Err(anyhow!("Gateway returned status {}", status));
        }

        let registered: RegisteredResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse registration response: {}", e))?;

        Ok(registered.registered)
    }

    async fn send(&self, address: &Address, text: &str) -> Result<(), Error> {
        let url = format!("{}/messages", self.base_url);

        let request = SendMessageRequest {
            to: address.as_str().to_string(),
            body: text.to_string(),
        };

        let response = self
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow!("Send request failed: {}", e))?;

        if response.status().is_success() {
            debug!(address = %address, "Gateway accepted message");
            Ok(())
        } else {
            let error_text = response.text().await?;
            Err(anyhow!("Gateway send failed: {}", error_text))
        }
    }
}
