//! Bot filter backed by an external human-verification endpoint.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, instrument};

use super::service::BotVerifier;
use crate::proctor::APP_USER_AGENT;

/// A slow verification endpoint must not hang a login indefinitely.
const VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct Verdict {
    success: bool,
}

/// Posts client tokens to the verification service and relays its verdict.
///
/// Fails closed: a transport failure or non-2xx response blocks the attempt.
/// A verification-service outage is never an implicit pass.
pub struct RecaptchaVerifier {
    client: Client,
    url: String,
    secret: SecretString,
}

impl RecaptchaVerifier {
    pub fn new(url: String, secret: SecretString) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(VERIFY_TIMEOUT)
            .build()
            .context("failed to build verification client")?;

        Ok(Self { client, url, secret })
    }
}

#[async_trait]
impl BotVerifier for RecaptchaVerifier {
    #[instrument(skip(self, client_token))]
    async fn verify(&self, client_token: &str) -> bool {
        if client_token.is_empty() {
            return false;
        }

        let params = [
            ("secret", self.secret.expose_secret()),
            ("response", client_token),
        ];

        let response = match self.client.post(&self.url).form(&params).send().await {
            Ok(response) => response,
            Err(err) => {
                error!("Verification request failed: {err}");
                return false;
            }
        };

        if !response.status().is_success() {
            error!("Verification endpoint returned {}", response.status());
            return false;
        }

        match response.json::<Verdict>().await {
            Ok(verdict) => verdict.success,
            Err(err) => {
                error!("Failed to parse verification verdict: {err}");
                false
            }
        }
    }
}
