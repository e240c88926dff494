//! Package download with rate-limit aware retries.
//!
//! Only HTTP 429 is retried: the advisory `Retry-After` delay is honored
//! (with a small random jitter on top) until the attempt budget runs out.
//! Every other failure, status or transport, ends the download immediately.
//! On success the response body is written to disk in one piece; a failed
//! download never leaves a file behind, but no cleanup of earlier partial
//! state is attempted either.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, RETRY_AFTER};
use reqwest::StatusCode;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};

/// Retry behavior for rate-limited downloads.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total request attempts before a rate-limited download is abandoned.
    pub max_retries: u32,
    /// Delay used when a 429 response carries no usable `Retry-After`.
    pub retry_after_fallback: Duration,
    /// Upper bound of the random jitter added to every backoff sleep.
    pub max_jitter: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_after_fallback: Duration::from_secs(1),
            max_jitter: Duration::from_millis(500),
        }
    }
}

/// A successfully written package file.
#[derive(Debug, Clone)]
pub struct DownloadedPackage {
    pub path: PathBuf,
    pub filename: String,
    pub size: u64,
}

/// Fetch a package and write it into `dir`.
///
/// The filename comes from the `Content-Disposition` response header when
/// present, otherwise `fallback_filename` is used. When the resolved name is
/// platform-qualified (contains `@`) but not for win32-x64, the request is
/// re-issued once with `?targetPlatform=win32-x64`; that re-request does not
/// count against the rate-limit budget.
pub async fn download_package(
    client: &reqwest::Client,
    url: &str,
    dir: &Path,
    fallback_filename: &str,
    config: &RetryConfig,
) -> Result<DownloadedPackage> {
    let mut url = url.to_string();
    let mut rate_limited_attempts = 0;
    let mut platform_retried = false;

    loop {
        let response = client.get(&url).send().await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                rate_limited_attempts += 1;
                if rate_limited_attempts >= config.max_retries {
                    return Err(StoreError::RateLimitExhausted {
                        url,
                        attempts: rate_limited_attempts,
                    });
                }

                let retry_after = parse_retry_after(response.headers())
                    .unwrap_or(config.retry_after_fallback);
                let jitter = config.max_jitter.mul_f64(fastrand::f64());
                let delay = retry_after + jitter;

                warn!(
                    "rate limited on {}, retrying in {:.2}s (attempt {}/{})",
                    url,
                    delay.as_secs_f64(),
                    rate_limited_attempts,
                    config.max_retries
                );
                tokio::time::sleep(delay).await;
            }

            StatusCode::OK => {
                let filename = content_disposition_filename(response.headers())
                    .unwrap_or_else(|| fallback_filename.to_string());

                // Platform-qualified package served for the wrong target:
                // ask the gallery for the win32-x64 build instead.
                if !platform_retried
                    && filename.contains('@')
                    && !filename.to_lowercase().contains("win32-x64")
                {
                    platform_retried = true;
                    url = format!("{url}?targetPlatform=win32-x64");
                    debug!("re-requesting platform-qualified package: {}", url);
                    continue;
                }

                let bytes = response.bytes().await?;
                let path = dir.join(&filename);
                fs::write(&path, &bytes)
                    .await
                    .map_err(|err| StoreError::IoOperation {
                        operation: "write package".to_string(),
                        path: path.clone(),
                        source: err,
                    })?;

                info!("downloaded {} ({} bytes)", filename, bytes.len());
                return Ok(DownloadedPackage {
                    path,
                    filename,
                    size: bytes.len() as u64,
                });
            }

            status => {
                return Err(StoreError::UnexpectedStatus {
                    url,
                    status: status.as_u16(),
                });
            }
        }
    }
}

/// `Retry-After` as whole seconds. HTTP-date values are not supported and
/// fall through to the configured fallback.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Filename advertised in a `Content-Disposition` header, if any.
fn content_disposition_filename(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
    value
        .split(';')
        .find_map(|part| part.trim().strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::time::Instant;
    use tempfile::TempDir;

    fn fast_config() -> RetryConfig {
        RetryConfig {
            max_retries: 5,
            retry_after_fallback: Duration::from_millis(10),
            max_jitter: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_success_writes_one_file() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/pkg");
            then.status(200).body(b"package bytes");
        });
        let temp_dir = TempDir::new().unwrap();

        let client = reqwest::Client::new();
        let downloaded = download_package(
            &client,
            &server.url("/pkg"),
            temp_dir.path(),
            "foo.bar-1.2.3.vsix",
            &RetryConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(downloaded.filename, "foo.bar-1.2.3.vsix");
        assert_eq!(downloaded.size, 13);
        assert_eq!(std::fs::read(&downloaded.path).unwrap(), b"package bytes");
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
        mock.assert();
    }

    #[tokio::test]
    async fn test_content_disposition_overrides_fallback() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/pkg");
            then.status(200)
                .header("content-disposition", "attachment; filename=\"served-name.vsix\"")
                .body(b"data");
        });
        let temp_dir = TempDir::new().unwrap();

        let client = reqwest::Client::new();
        let downloaded = download_package(
            &client,
            &server.url("/pkg"),
            temp_dir.path(),
            "fallback.vsix",
            &RetryConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(downloaded.filename, "served-name.vsix");
        assert!(temp_dir.path().join("served-name.vsix").exists());
    }

    #[tokio::test]
    async fn test_rate_limit_honors_retry_after() {
        let server = MockServer::start();
        let limited = server.mock(|when, then| {
            when.method(GET).path("/pkg");
            then.status(429).header("Retry-After", "2");
        });
        let temp_dir = TempDir::new().unwrap();

        let config = RetryConfig {
            max_retries: 2,
            ..RetryConfig::default()
        };
        let client = reqwest::Client::new();
        let started = Instant::now();
        let result = download_package(
            &client,
            &server.url("/pkg"),
            temp_dir.path(),
            "foo.bar-1.2.3.vsix",
            &config,
        )
        .await;

        // One backoff sleep between the two attempts: at least the advertised
        // two seconds, plus jitter below half a second.
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(matches!(result, Err(StoreError::RateLimitExhausted { .. })));
        assert_eq!(limited.hits(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_budget_exhaustion() {
        let server = MockServer::start();
        let limited = server.mock(|when, then| {
            when.method(GET).path("/pkg");
            then.status(429);
        });
        let temp_dir = TempDir::new().unwrap();

        let client = reqwest::Client::new();
        let err = download_package(
            &client,
            &server.url("/pkg"),
            temp_dir.path(),
            "foo.bar-1.2.3.vsix",
            &fast_config(),
        )
        .await
        .unwrap_err();

        match err {
            StoreError::RateLimitExhausted { attempts, .. } => assert_eq!(attempts, 5),
            other => panic!("expected rate limit exhaustion, got {other:?}"),
        }
        assert_eq!(limited.hits(), 5);
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unexpected_status_fails_immediately() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/pkg");
            then.status(404);
        });
        let temp_dir = TempDir::new().unwrap();

        let client = reqwest::Client::new();
        let err = download_package(
            &client,
            &server.url("/pkg"),
            temp_dir.path(),
            "foo.bar-1.2.3.vsix",
            &fast_config(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StoreError::UnexpectedStatus { status: 404, .. }));
        assert_eq!(mock.hits(), 1);
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_platform_qualified_re_request_happens_once() {
        let server = MockServer::start();
        // The gallery keeps serving a platform-qualified name for the wrong
        // target; the policy re-requests exactly once and then accepts what
        // it is given instead of looping.
        let mock = server.mock(|when, then| {
            when.method(GET).path("/pkg");
            then.status(200)
                .header(
                    "content-disposition",
                    "attachment; filename=\"foo.bar-1.2.3@linux-x64.vsix\"",
                )
                .body(b"platform build");
        });
        let temp_dir = TempDir::new().unwrap();

        let client = reqwest::Client::new();
        let downloaded = download_package(
            &client,
            &server.url("/pkg"),
            temp_dir.path(),
            "foo.bar-1.2.3.vsix",
            &RetryConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(mock.hits(), 2);
        assert_eq!(downloaded.filename, "foo.bar-1.2.3@linux-x64.vsix");
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, "2".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(2)));

        // HTTP-date form is unsupported; caller falls back to its default.
        headers.insert(RETRY_AFTER, "Wed, 21 Oct 2015 07:28:00 GMT".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_content_disposition_filename() {
        let mut headers = HeaderMap::new();
        assert_eq!(content_disposition_filename(&headers), None);

        headers.insert(
            CONTENT_DISPOSITION,
            "attachment; filename=\"pkg.vsix\"".parse().unwrap(),
        );
        assert_eq!(content_disposition_filename(&headers), Some("pkg.vsix".to_string()));

        headers.insert(CONTENT_DISPOSITION, "attachment".parse().unwrap());
        assert_eq!(content_disposition_filename(&headers), None);
    }
}
