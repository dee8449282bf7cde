//! Minimal client for the hosted backend (Supabase-compatible REST API)
//!
//! Only the handful of endpoints slowMeme needs: password sign-in, token
//! refresh, sign-out, the `memes` table and the `memes` storage bucket.

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::BackendError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    anon_key: String,
    http: Client,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient").field("base_url", &self.base_url).finish()
    }
}

impl BackendClient {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            http,
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Request carrying the project key, and the user's token when given.
    pub fn request(&self, method: reqwest::Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let bearer = token.unwrap_or(&self.anon_key);
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {bearer}"))
    }
}

/// Fail on non-2xx, keeping the body for the error message.
pub fn check(resp: Response) -> Result<Response, BackendError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(BackendError::Status { status: status.as_u16(), body })
}

pub fn json<T: DeserializeOwned>(resp: Response) -> Result<T, BackendError> {
    let body = check(resp)?.text()?;
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_cleanly() {
        let client = BackendClient::new("https://abc.supabase.co/", "key").unwrap();
        assert_eq!(client.endpoint("/auth/v1/user"), "https://abc.supabase.co/auth/v1/user");
        assert_eq!(client.endpoint("rest/v1/memes"), "https://abc.supabase.co/rest/v1/memes");
    }

    #[test]
    fn test_debug_hides_key() {
        let client = BackendClient::new("https://abc.supabase.co", "secret-key").unwrap();
        assert!(!format!("{:?}", client).contains("secret-key"));
    }
}
