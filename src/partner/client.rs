//! HTTP client for the partner catalog API.

use crate::config::Config;
use crate::partner::models::Product;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use wreq::Client;

/// Errors from partner API calls.
///
/// Any of these coming out of `login` is fatal to the run; from
/// `get_product` they are per-row and logged by the reconciler.
#[derive(Debug, Error)]
pub enum PartnerError {
    #[error("request failed: {0}")]
    Transport(#[from] wreq::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("cannot decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Trait for partner catalog access - enables mocking for tests.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Authenticates against the partner API and stores the bearer token
    /// used by subsequent calls.
    async fn login(&mut self) -> Result<(), PartnerError>;

    /// Fetches a product by slug. Requires a prior successful `login`.
    async fn get_product(&self, slug: &str) -> Result<Product, PartnerError>;
}

#[derive(Deserialize)]
struct LoginResponse {
    data: LoginData,
}

#[derive(Deserialize)]
struct LoginData {
    token: String,
}

/// Production HTTP-backed partner catalog client.
pub struct PartnerClient {
    client: Client,
    username: String,
    password: String,
    login_url: String,
    product_base_url: String,
    auth_token: String,
}

impl PartnerClient {
    /// Creates a new client from the configured endpoints.
    pub fn new(config: &Config) -> Result<Self, PartnerError> {
        Self::with_urls(config, config.login_url.clone(), config.product_base_url.clone())
    }

    /// Creates a new client with explicit endpoints (for testing).
    pub fn with_urls(
        config: &Config,
        login_url: String,
        product_base_url: String,
    ) -> Result<Self, PartnerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            username: config.username.clone(),
            password: config.password.clone(),
            login_url,
            product_base_url,
            auth_token: String::new(),
        })
    }
}

#[async_trait]
impl Catalog for PartnerClient {
    async fn login(&mut self) -> Result<(), PartnerError> {
        let body = serde_json::json!({
            "username": self.username,
            "password": self.password,
        });

        debug!("POST {}", self.login_url);

        let response = self
            .client
            .post(&self.login_url)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PartnerError::Status {
                status: status.as_u16(),
                url: self.login_url.clone(),
            });
        }

        let text = response.text().await?;
        let decoded: LoginResponse = serde_json::from_str(&text)?;
        self.auth_token = decoded.data.token;

        info!("logged in to partner API");
        Ok(())
    }

    async fn get_product(&self, slug: &str) -> Result<Product, PartnerError> {
        let url = format!("{}{}", self.product_base_url, slug);

        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PartnerError::Status { status: status.as_u16(), url });
        }

        let text = response.text().await?;
        let product: Product = serde_json::from_str(&text)?;
        Ok(product)
    }
}
