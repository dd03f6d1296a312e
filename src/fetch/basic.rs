use super::client::HttpClient;
use anyhow::{Context, Result};

/// Plain GET with no headers, auth or timeout.
pub struct BasicClient(reqwest::blocking::Client);

impl BasicClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self(client))
    }
}

impl HttpClient for BasicClient {
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .0
            .get(url)
            .send()
            .with_context(|| format!("GET {url} failed"))?
            .error_for_status()
            .with_context(|| format!("GET {url} returned an error status"))?;
        Ok(resp.bytes()?.to_vec())
    }
}
