use anyhow::Result;

/// Blocking transport used by the downloader.
pub trait HttpClient {
    /// Performs a GET on `url` and returns the complete response body.
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>>;
}
