//! HTTP client for the carrier's REST API.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use super::{CarrierApi, CarrierError, CreateShipmentRequest, LabelDocument, ShipmentNumber};
use crate::config::CarrierConfig;

/// Carrier REST API client.
///
/// Requests are authenticated with an API key header and bounded by the
/// configured timeout; a timeout surfaces as [`CarrierError::Transport`],
/// distinct from the carrier rejecting a request.
#[derive(Clone)]
pub struct CarrierClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
}

#[derive(Debug, Deserialize)]
struct CreateShipmentResponse {
    shipment_number: String,
}

#[derive(Debug, Deserialize)]
struct LabelResponse {
    /// Base64-encoded document bytes.
    data: String,
    /// Document format, e.g. "pdf".
    format: String,
}

#[derive(Debug, Deserialize)]
struct CarrierErrorBody {
    message: Option<String>,
}

impl CarrierClient {
    /// Create a client from the carrier configuration.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created. This should never happen
    /// under normal circumstances as we use standard TLS configuration.
    #[must_use]
    pub fn new(config: &CarrierConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, CarrierError> {
        self.base_url
            .join(path)
            .map_err(|e| CarrierError::Parse(format!("invalid endpoint {path}: {e}")))
    }

    /// Turn a non-success response into [`CarrierError::Rejected`], passing
    /// the carrier's message through opaquely.
    async fn rejection(response: reqwest::Response) -> CarrierError {
        let status = response.status().as_u16();
        let message = match response.json::<CarrierErrorBody>().await {
            Ok(body) => body.message.unwrap_or_else(|| "no message".to_owned()),
            Err(_) => "no message".to_owned(),
        };
        CarrierError::Rejected { status, message }
    }
}

impl CarrierApi for CarrierClient {
    #[instrument(skip(self, request), fields(order = %request.order_number))]
    async fn create_shipment(
        &self,
        request: &CreateShipmentRequest<'_>,
    ) -> Result<ShipmentNumber, CarrierError> {
        let response = self
            .http
            .post(self.endpoint("v1/shipments")?)
            .header("X-Api-Key", self.api_key.expose_secret())
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body: CreateShipmentResponse = response
            .json()
            .await
            .map_err(|e| CarrierError::Parse(e.to_string()))?;
        Ok(ShipmentNumber::from(body.shipment_number))
    }

    #[instrument(skip(self))]
    async fn fetch_label(&self, shipment: &ShipmentNumber) -> Result<LabelDocument, CarrierError> {
        let response = self
            .http
            .get(self.endpoint(&format!("v1/shipments/{shipment}/label"))?)
            .header("X-Api-Key", self.api_key.expose_secret())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body: LabelResponse = response
            .json()
            .await
            .map_err(|e| CarrierError::Parse(e.to_string()))?;
        let bytes = BASE64
            .decode(body.data.as_bytes())
            .map_err(|e| CarrierError::Parse(format!("label payload: {e}")))?;

        let content_type = match body.format.as_str() {
            "pdf" => "application/pdf".to_owned(),
            "zpl" => "text/plain".to_owned(),
            _ => "application/octet-stream".to_owned(),
        };
        Ok(LabelDocument {
            bytes,
            content_type,
            extension: body.format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_relative_paths() {
        let config = CarrierConfig {
            api_url: Url::parse("https://api.carrier.example/").expect("url"),
            api_key: SecretString::from("key"),
            timeout: std::time::Duration::from_secs(30),
        };
        let client = CarrierClient::new(&config);
        let url = client.endpoint("v1/shipments").expect("endpoint");
        assert_eq!(url.as_str(), "https://api.carrier.example/v1/shipments");
    }
}
