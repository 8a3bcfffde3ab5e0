//! Onionoo details fetch
//!
//! One GET of the details document. There is no retry; any failure aborts
//! the run before anything is written.

use tracing::{debug, warn};

use crate::{create_client, FetchConfig, FetchError};
use relay_core::Dataset;

/// Fetch and decode the relay details document
pub async fn fetch_dataset(config: &FetchConfig) -> Result<Dataset, FetchError> {
    let client = create_client(config)?;

    debug!("Fetching {}", config.api_url);

    let response = client.get(&config.api_url).send().await?;

    if !response.status().is_success() {
        warn!("Onionoo returned status: {}", response.status());
        return Err(FetchError::Status(response.status().as_u16()));
    }

    let body = response.bytes().await?;
    debug!("Received {} bytes", body.len());

    decode_dataset(&body)
}

/// Decode a details document, rejecting an empty one
pub fn decode_dataset(body: &[u8]) -> Result<Dataset, FetchError> {
    let dataset: Dataset = serde_json::from_slice(body)?;

    if dataset.is_empty() {
        return Err(FetchError::EmptyPayload);
    }

    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(template: ResponseTemplate) -> (MockServer, FetchConfig) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/details"))
            .respond_with(template)
            .mount(&server)
            .await;
        let config = FetchConfig::default().with_url(&format!("{}/details", server.uri()));
        (server, config)
    }

    #[tokio::test]
    async fn test_fetch_decodes_details() {
        let body = json!({
            "version": "8.0",
            "relays_published": "2026-10-16 12:00:00",
            "relays": [
                {"fingerprint": "AAA", "or_addresses": ["185.220.101.33:10033"], "flags": ["Guard"]}
            ],
            "bridges": []
        });
        let (_server, config) = serve(ResponseTemplate::new(200).set_body_json(body)).await;

        let dataset = fetch_dataset(&config).await.unwrap();
        assert_eq!(dataset.version(), Some("8.0"));
        assert_eq!(dataset.relays().len(), 1);
        assert_eq!(dataset.relays()[0].fingerprint(), Some("AAA"));
    }

    #[tokio::test]
    async fn test_non_success_status_fails() {
        let (_server, config) = serve(ResponseTemplate::new(503)).await;
        let err = fetch_dataset(&config).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(503)));
    }

    #[tokio::test]
    async fn test_garbage_body_fails() {
        let (_server, config) =
            serve(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>")).await;
        let err = fetch_dataset(&config).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_fails() {
        let config = FetchConfig::default().with_url("http://127.0.0.1:1/details");
        let err = fetch_dataset(&config).await.unwrap_err();
        assert!(matches!(err, FetchError::Request(_)));
    }

    #[test]
    fn test_empty_document_rejected() {
        assert!(matches!(decode_dataset(b"{}"), Err(FetchError::EmptyPayload)));
        assert!(matches!(decode_dataset(b"[]"), Err(FetchError::Decode(_))));
    }
}
