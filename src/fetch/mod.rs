//! Download of the upstream CSV into the local cache file.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Fetches `url` and returns the whole body.
pub fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let fetch_start = Instant::now();
    let bytes = client.get_bytes(url)?;
    let elapsed = fetch_start.elapsed();
    if elapsed.as_secs() > 15 {
        warn!(elapsed_secs = elapsed.as_secs(), "Fetch was slow");
    }
    debug!(bytes = bytes.len(), "Body received");
    Ok(bytes)
}

/// Downloads `url` and writes the body verbatim to `path`, replacing any
/// previous contents. Returns the number of bytes written.
///
/// The file is only touched once the full body has arrived, so a failed
/// fetch leaves an earlier download in place. It is never read as a fallback.
#[tracing::instrument(skip(client, url, path), fields(path = %path.display()))]
pub fn download_to<C: HttpClient>(client: &C, url: &str, path: &Path) -> Result<u64> {
    let bytes = fetch_bytes(client, url)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
    info!(bytes = bytes.len(), "Cached download");
    Ok(bytes.len() as u64)
}

/// Resolves the file to parse: `http://` and `https://` URLs are downloaded
/// into `cache`, anything else is treated as a local path and used as is.
pub fn load_source<C: HttpClient>(client: &C, source: &str, cache: &Path) -> Result<PathBuf> {
    if is_url(source) {
        download_to(client, source, cache)?;
        Ok(cache.to_path_buf())
    } else {
        debug!(source, "Using local file, skipping download");
        Ok(PathBuf::from(source))
    }
}

fn is_url(source: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|scheme| source.get(..scheme.len()).is_some_and(|p| p.eq_ignore_ascii_case(scheme)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::cell::Cell;
    use std::fs;

    struct StaticClient {
        body: &'static [u8],
        calls: Cell<usize>,
    }

    impl StaticClient {
        fn new(body: &'static [u8]) -> Self {
            Self {
                body,
                calls: Cell::new(0),
            }
        }
    }

    impl HttpClient for StaticClient {
        fn get_bytes(&self, _url: &str) -> Result<Vec<u8>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.body.to_vec())
        }
    }

    struct OfflineClient;

    impl HttpClient for OfflineClient {
        fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
            bail!("connection refused: {url}")
        }
    }

    #[test]
    fn test_download_writes_body_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("covid_cases.csv");
        let client = StaticClient::new(b"a,b\n#a,#b\n");

        let written = download_to(&client, "http://example.invalid/x.csv", &path).unwrap();

        assert_eq!(written, 10);
        assert_eq!(fs::read(&path).unwrap(), b"a,b\n#a,#b\n");
    }

    #[test]
    fn test_download_overwrites_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("covid_deaths.csv");
        fs::write(&path, "stale contents that are longer than the new body").unwrap();

        download_to(&StaticClient::new(b"fresh"), "http://example.invalid", &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh");
    }

    #[test]
    fn test_failed_fetch_leaves_cache_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("covid_cases.csv");
        fs::write(&path, "old").unwrap();

        let result = download_to(&OfflineClient, "http://example.invalid", &path);

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
    }

    #[test]
    fn test_download_creates_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("covid_cases.csv");

        download_to(&StaticClient::new(b"x"), "http://example.invalid", &path).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_load_source_local_path_skips_fetch() {
        let client = StaticClient::new(b"unused");
        let cache = Path::new("never_written.csv");

        let resolved = load_source(&client, "tests/fixtures/sample_cases.csv", cache).unwrap();

        assert_eq!(resolved, PathBuf::from("tests/fixtures/sample_cases.csv"));
        assert_eq!(client.calls.get(), 0);
    }

    #[test]
    fn test_load_source_http_prefixed_file_is_local() {
        let client = StaticClient::new(b"unused");
        let cache = Path::new("never_written.csv");

        for source in ["http_dump.csv", "https-mirror/covid_cases.csv", "httpdata"] {
            let resolved = load_source(&client, source, cache).unwrap();
            assert_eq!(resolved, PathBuf::from(source));
        }
        assert_eq!(client.calls.get(), 0);
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("http://example.invalid/x.csv"));
        assert!(is_url("HTTPS://example.invalid/x.csv"));
        assert!(!is_url("http_dump.csv"));
        assert!(!is_url("http:/typo"));
        assert!(!is_url("ftp://example.invalid/x.csv"));
    }

    #[test]
    fn test_load_source_url_downloads_into_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("covid_cases.csv");
        let client = StaticClient::new(b"body");

        let resolved = load_source(&client, "https://example.invalid/feed.csv", &cache).unwrap();

        assert_eq!(resolved, cache);
        assert_eq!(client.calls.get(), 1);
        assert_eq!(fs::read_to_string(&cache).unwrap(), "body");
    }
}
