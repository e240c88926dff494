//! Client for the Visual Studio Marketplace gallery.
//!
//! Two endpoints are used: the `vspackage` gallery URL for downloading a
//! package at a known version, and the public item page, whose metadata
//! table carries the latest published version. The item page is plain HTML;
//! the version cell is read with a CSS selector.

use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use scraper::{Html, Selector};
use tokio::fs;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Result, StoreError};
use crate::models::ExtensionRecord;

pub const DEFAULT_BASE_URL: &str = "https://marketplace.visualstudio.com";

/// Attempts made against the item page before reporting a lookup failure.
const LOOKUP_ATTEMPTS: u32 = 3;
const LOOKUP_PAUSE: Duration = Duration::from_secs(1);

static VERSION_CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".ux-table-metadata > tbody > tr > td").unwrap());

/// HTTP client for the marketplace with a static header set.
#[derive(Debug, Clone)]
pub struct MarketplaceClient {
    client: reqwest::Client,
    base_url: String,
}

impl MarketplaceClient {
    pub fn new(headers: HeaderMap) -> Result<Self> {
        Self::with_base_url(headers, DEFAULT_BASE_URL)
    }

    /// Point the client at a different gallery host. Tests use this to talk
    /// to a local mock server.
    pub fn with_base_url(headers: HeaderMap, base_url: impl AsRef<str>) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref()).map_err(|err| {
            StoreError::ConfigError(format!(
                "invalid marketplace URL '{}': {err}",
                base_url.as_ref()
            ))
        })?;

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| StoreError::ConfigError(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Load the static request header set from a JSON string map.
    /// A missing or invalid file is an unrecoverable setup error.
    pub async fn load_headers(path: &Path) -> Result<HeaderMap> {
        let content = fs::read_to_string(path).await.map_err(|err| {
            StoreError::ConfigError(format!(
                "header config '{}' could not be read: {err}",
                path.display()
            ))
        })?;

        let raw: std::collections::HashMap<String, String> = serde_json::from_str(&content)
            .map_err(|err| {
                StoreError::ConfigError(format!(
                    "header config '{}' is not a JSON string map: {err}",
                    path.display()
                ))
            })?;

        let mut headers = HeaderMap::with_capacity(raw.len());
        for (key, value) in raw {
            let name = HeaderName::try_from(key.as_str())
                .map_err(|_| StoreError::ConfigError(format!("invalid header name '{key}'")))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|_| StoreError::ConfigError(format!("invalid value for header '{key}'")))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Gallery download URL for a package at a specific version.
    pub fn package_url(&self, record: &ExtensionRecord, version: &str) -> String {
        format!(
            "{}/_apis/public/gallery/publishers/{}/vsextensions/{}/{}/vspackage",
            self.base_url, record.publisher, record.name, version
        )
    }

    /// Public item page for an extension.
    pub fn item_url(&self, id: &str) -> String {
        format!("{}/items?itemName={}", self.base_url, id)
    }

    /// Read the latest published version off the extension's item page.
    /// Retries a few times on any failure before giving up.
    pub async fn latest_version(&self, id: &str) -> Result<String> {
        let url = self.item_url(id);

        for attempt in 1..=LOOKUP_ATTEMPTS {
            if attempt > 1 {
                debug!("version lookup attempt {} for {}", attempt, id);
            }

            match self.fetch_item_page(&url).await {
                Ok(html) => {
                    if let Some(version) = parse_version_from_page(&html) {
                        return Ok(version);
                    }
                    warn!("no version cell on item page for {}", id);
                }
                Err(err) => warn!("version lookup for {} failed: {}", id, err),
            }

            if attempt < LOOKUP_ATTEMPTS {
                tokio::time::sleep(LOOKUP_PAUSE).await;
            }
        }

        Err(StoreError::VersionLookupFailed(id.to_string()))
    }

    async fn fetch_item_page(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

/// The second cell of the item page's metadata table holds the version.
fn parse_version_from_page(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let cell = document.select(&VERSION_CELL).nth(1)?;
    let version = cell.text().collect::<String>().trim().to_string();
    if version.is_empty() {
        None
    } else {
        Some(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const ITEM_PAGE: &str = r#"
        <html><body>
        <table class="ux-table-metadata"><tbody>
        <tr><td>Version</td><td> 1.4.2 </td></tr>
        <tr><td>Released</td><td>2024-01-01</td></tr>
        </tbody></table>
        </body></html>
    "#;

    fn client_for(server: &MockServer) -> MarketplaceClient {
        MarketplaceClient::with_base_url(HeaderMap::new(), server.base_url()).unwrap()
    }

    #[test]
    fn test_package_url_template() {
        let client = MarketplaceClient::new(HeaderMap::new()).unwrap();
        let record = ExtensionRecord::new("foo", "bar", "1.2.3");

        assert_eq!(
            client.package_url(&record, "1.3.0"),
            "https://marketplace.visualstudio.com/_apis/public/gallery/publishers/foo/vsextensions/bar/1.3.0/vspackage"
        );
        assert_eq!(
            client.item_url(&record.id),
            "https://marketplace.visualstudio.com/items?itemName=foo.bar"
        );
    }

    #[test]
    fn test_parse_version_from_page() {
        assert_eq!(parse_version_from_page(ITEM_PAGE), Some("1.4.2".to_string()));
        assert_eq!(parse_version_from_page("<html><body>nothing</body></html>"), None);
    }

    #[tokio::test]
    async fn test_latest_version_from_item_page() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/items")
                .query_param("itemName", "foo.bar");
            then.status(200).body(ITEM_PAGE);
        });

        let client = client_for(&server);
        let version = client.latest_version("foo.bar").await.unwrap();

        assert_eq!(version, "1.4.2");
        mock.assert();
    }

    #[tokio::test]
    async fn test_latest_version_retries_then_reports_failure() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/items");
            then.status(503);
        });

        let client = client_for(&server);
        let err = client.latest_version("foo.bar").await.unwrap_err();

        assert!(matches!(err, StoreError::VersionLookupFailed(_)));
        assert!(err.is_recoverable());
        assert_eq!(mock.hits(), 3);
    }

    #[tokio::test]
    async fn test_load_headers() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("headers.json");
        tokio::fs::write(&path, r#"{"user-agent": "vsixup", "accept": "*/*"}"#)
            .await
            .unwrap();

        let headers = MarketplaceClient::load_headers(&path).await.unwrap();
        assert_eq!(headers.get("user-agent").unwrap(), "vsixup");
        assert_eq!(headers.len(), 2);
    }

    #[tokio::test]
    async fn test_load_headers_missing_file_is_config_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let err = MarketplaceClient::load_headers(&temp_dir.path().join("headers.json"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::ConfigError(_)));
        assert!(err.is_user_error());
    }
}
