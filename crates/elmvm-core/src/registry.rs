use async_trait::async_trait;
use log::{debug, warn};

use elmvm_backend::{ElmvmError, RegistryClient};

use crate::config::CatalogConfig;

/// npm registry client that lists every published version of one package.
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
    package: String,
}

impl NpmRegistry {
    /// Build a client honoring the configured URL, package and timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &CatalogConfig) -> Result<Self, ElmvmError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("elmvm/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| ElmvmError::unexpected("http client", e))?;

        Ok(Self {
            client,
            base_url: config.registry_url.trim_end_matches('/').to_string(),
            package: config.package.clone(),
        })
    }

    fn url(&self) -> String {
        format!("{}/{}", self.base_url, self.package)
    }
}

/// Keys of the response's `versions` object in document order.
fn listing_from_document(
    document: &serde_json::Value,
    package: &str,
) -> Result<Vec<String>, ElmvmError> {
    document
        .get("versions")
        .and_then(serde_json::Value::as_object)
        .map(|versions| versions.keys().cloned().collect())
        .ok_or_else(|| ElmvmError::NoElmVersions {
            package: package.to_string(),
        })
}

#[async_trait]
impl RegistryClient for NpmRegistry {
    fn package(&self) -> &str {
        &self.package
    }

    async fn fetch_listing(&self) -> Result<Vec<String>, ElmvmError> {
        let url = self.url();
        debug!("Fetching version listing from {url}");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(ElmvmError::npm_communication)?;

        let status = response.status();
        if !status.is_success() {
            warn!("npm registry returned status {status}: {url}");
            return Err(ElmvmError::npm_communication(format!(
                "unexpected status {status} from {url}"
            )));
        }

        let document: serde_json::Value = response.json().await.map_err(|e| {
            warn!("Failed to parse npm registry response: {e}");
            ElmvmError::npm_communication(e)
        })?;

        let listing = listing_from_document(&document, &self.package)?;
        debug!("Registry listed {} versions of {}", listing.len(), self.package);
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockito::Server;

    use super::*;

    fn config(url: &str) -> CatalogConfig {
        CatalogConfig {
            registry_url: url.to_string(),
            timeout: Duration::from_secs(2),
            ..CatalogConfig::default()
        }
    }

    #[tokio::test]
    async fn fetch_listing_preserves_registry_order() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/elm")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "name": "elm",
                    "versions": {
                        "0.0.0": {},
                        "0.17.1": {},
                        "0.18.0": {},
                        "0.19.1-5": {}
                    }
                }"#,
            )
            .create_async()
            .await;

        let registry = NpmRegistry::new(&config(&server.url())).unwrap();
        let listing = registry.fetch_listing().await.unwrap();

        mock.assert_async().await;
        assert_eq!(listing, vec!["0.0.0", "0.17.1", "0.18.0", "0.19.1-5"]);
    }

    #[tokio::test]
    async fn fetch_listing_keeps_unsorted_keys_in_document_order() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/elm")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"versions": {"0.9.0": {}, "0.19.1": {}, "0.10.0": {}}}"#)
            .create_async()
            .await;

        let registry = NpmRegistry::new(&config(&server.url())).unwrap();
        let listing = registry.fetch_listing().await.unwrap();

        mock.assert_async().await;
        assert_eq!(listing, vec!["0.9.0", "0.19.1", "0.10.0"]);
    }

    #[tokio::test]
    async fn missing_versions_field_is_no_elm_versions() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/elm")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "elm"}"#)
            .create_async()
            .await;

        let registry = NpmRegistry::new(&config(&server.url())).unwrap();
        let result = registry.fetch_listing().await;

        mock.assert_async().await;
        assert!(matches!(result, Err(ElmvmError::NoElmVersions { ref package }) if package == "elm"));
    }

    #[tokio::test]
    async fn error_status_is_communication_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/elm")
            .with_status(503)
            .create_async()
            .await;

        let registry = NpmRegistry::new(&config(&server.url())).unwrap();
        let result = registry.fetch_listing().await;

        mock.assert_async().await;
        assert!(matches!(result, Err(ElmvmError::NpmCommunication { .. })));
    }

    #[tokio::test]
    async fn invalid_json_is_communication_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/elm")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let registry = NpmRegistry::new(&config(&server.url())).unwrap();

        assert!(matches!(
            registry.fetch_listing().await,
            Err(ElmvmError::NpmCommunication { .. })
        ));
    }

    #[test]
    fn trailing_slash_in_base_url_is_ignored() {
        let registry = NpmRegistry::new(&config("https://registry.example.org/")).unwrap();
        assert_eq!(registry.url(), "https://registry.example.org/elm");
    }

    #[test]
    fn versions_must_be_an_object() {
        let document = serde_json::json!({ "versions": ["0.19.1"] });
        assert!(listing_from_document(&document, "elm").is_err());
    }
}
