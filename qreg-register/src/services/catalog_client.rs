//! Backend catalog and analysis API client
//!
//! The workflow reaches the analysis and catalog collaborators through the
//! [`CatalogService`] trait so tests can substitute a double;
//! [`HttpCatalogClient`] is the production implementation over the HTTP
//! boundary:
//!
//! - `POST /api/analyze-image` — multipart upload, returns the AI analysis
//!   plus similarity-ranked candidates
//! - `POST /api/products` — URL-encoded registration form, returns the
//!   newly assigned Q-CODE
//! - `POST /api/inventory/record` — records receipt of a matched product

use crate::models::product::{AnalysisResult, NewProductRequest, RegisteredProduct, StockRecord};
use async_trait::async_trait;
use reqwest::multipart;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("qreg/", env!("CARGO_PKG_VERSION"));

/// Catalog client errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Capability interface over the analysis and catalog collaborators
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Upload an image for AI analysis and similarity search
    async fn analyze_image(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<AnalysisResult, CatalogError>;

    /// Register a new catalog product
    async fn register_product(
        &self,
        request: &NewProductRequest,
    ) -> Result<RegisteredProduct, CatalogError>;

    /// Record stock received for an existing product
    async fn record_stock(&self, record: &StockRecord) -> Result<(), CatalogError>;
}

/// HTTP implementation of [`CatalogService`]
pub struct HttpCatalogClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Build a client from the resolved configuration (env → TOML → default)
    pub fn from_config() -> Result<Self, CatalogError> {
        Self::new(
            qreg_common::config::resolve_api_base_url(None),
            qreg_common::config::resolve_http_timeout(),
        )
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CatalogError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api(status.as_u16(), error_text));
        }
        Ok(response)
    }
}

#[async_trait]
impl CatalogService for HttpCatalogClient {
    async fn analyze_image(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<AnalysisResult, CatalogError> {
        tracing::debug!(
            file_name,
            content_type,
            size_bytes = bytes.len(),
            "Uploading image for analysis"
        );

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| CatalogError::Network(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http_client
            .post(format!("{}/api/analyze-image", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;

        let result: AnalysisResult = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;

        // Log top candidate
        if let Some(top) = result.similar_products.first() {
            tracing::info!(
                qcode = %top.qcode,
                similarity = top.similarity,
                candidates = result.similar_products.len(),
                "Image analysis complete"
            );
        } else {
            tracing::info!("Image analysis complete: no similar products");
        }

        Ok(result)
    }

    async fn register_product(
        &self,
        request: &NewProductRequest,
    ) -> Result<RegisteredProduct, CatalogError> {
        let response = self
            .http_client
            .post(format!("{}/api/products", self.base_url))
            .form(request)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;

        let product: RegisteredProduct = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;

        tracing::info!(qcode = %product.qcode, "Product registered");

        Ok(product)
    }

    async fn record_stock(&self, record: &StockRecord) -> Result<(), CatalogError> {
        // The backend takes these as query parameters
        let mut query: Vec<(&str, String)> = vec![
            ("qcode", record.qcode.clone()),
            ("quantity", record.quantity.to_string()),
        ];
        if let Some(notes) = &record.notes {
            query.push(("notes", notes.clone()));
        }

        let response = self
            .http_client
            .post(format!("{}/api/inventory/record", self.base_url))
            .query(&query)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Self::check_status(response).await?;

        tracing::info!(qcode = %record.qcode, quantity = record.quantity, "Stock recorded");

        Ok(())
    }
}
