use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use std::str::FromStr;
use tracing::debug;

use super::default::DEFAULT_UA;
use super::error::PublishError;
use crate::types::{Clip, Platform, PlatformCredential, Profile, UploadMetadata, UploadResult};

/// Base publisher plumbing shared by the platform implementations.
///
/// Each publisher instance owns its platform headers; the HTTP client is
/// shared across publishers.
#[derive(Debug, Clone)]
pub struct Publisher {
    pub platform: Platform,
    pub client: Client,
    platform_headers: HeaderMap,
}

impl Publisher {
    pub fn new(platform: Platform, client: Client) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(DEFAULT_UA),
        );
        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );

        Self {
            platform,
            client,
            platform_headers: default_headers,
        }
    }

    /// Insert an arbitrary platform header, skipping invalid values.
    pub fn add_header<K: AsRef<str>, V: AsRef<str>>(&mut self, key: K, value: V) {
        match HeaderName::from_str(key.as_ref()) {
            Ok(name) => match HeaderValue::from_str(value.as_ref()) {
                Ok(value) => {
                    self.platform_headers.insert(name, value);
                }
                Err(e) => {
                    debug!(error = %e, "Invalid header value; skipping");
                }
            },
            Err(e) => {
                debug!(error = %e, "Invalid header name; skipping");
            }
        }
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .headers(self.platform_headers.clone())
    }

    /// Download the clip bytes from the hosted clip URL, for the platforms
    /// whose wire contract wants the binary itself rather than a pull URL.
    pub async fn fetch_clip_bytes(&self, clip_url: &str) -> Result<Bytes, PublishError> {
        debug!(url = %clip_url, "Fetching clip bytes");
        let response = self.client.get(clip_url).send().await?;
        if !response.status().is_success() {
            return Err(PublishError::platform_api(
                format!("clip url returned {}", response.status()),
                Some(response.status().as_u16()),
            ));
        }
        Ok(response.bytes().await?)
    }

    pub fn platform_headers(&self) -> &HeaderMap {
        &self.platform_headers
    }
}

/// Convert a non-success platform response into a [`PublishError`].
///
/// A 401 is always an auth failure. Otherwise the structured error body's
/// message is surfaced verbatim when one can be parsed (the common
/// `{"error": {"message": ...}}` envelope), falling back to the raw body.
pub(crate) async fn error_from_response(response: Response) -> PublishError {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return PublishError::Auth("credential rejected by platform (401)".to_string());
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.pointer("/error"))
                .and_then(|m| m.as_str().map(str::to_owned))
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                format!("platform returned {status}")
            } else {
                body.clone()
            }
        });

    PublishError::PlatformApi {
        message,
        status: Some(status.as_u16()),
    }
}

/// Result of a completed sign-in: the credential to store plus the profile
/// for UI confirmation.
#[derive(Debug, Clone)]
pub struct SignIn {
    pub credential: PlatformCredential,
    pub profile: Profile,
}

/// The capability contract every platform implements.
///
/// New platforms are added by implementing this trait and registering a
/// constructor with the factory, never by branching on the platform name
/// inside orchestration code.
#[async_trait]
pub trait PlatformPublisher: Send + Sync {
    fn publisher(&self) -> &Publisher;

    fn platform(&self) -> Platform {
        self.publisher().platform
    }

    /// Drive the out-of-band authorization surface to completion.
    async fn sign_in(&self) -> Result<SignIn, PublishError>;

    /// Display name + avatar of the authenticated identity. Doubles as the
    /// lightweight "who am I" probe used to validate stored sessions.
    async fn fetch_profile(&self, credential: &PlatformCredential)
    -> Result<Profile, PublishError>;

    /// Platform-specific upload. Must not mutate shared session state; an
    /// authorization failure is reported as [`PublishError::Auth`] so the
    /// caller clears the session.
    async fn upload(
        &self,
        clip: &Clip,
        metadata: &UploadMetadata,
        credential: &PlatformCredential,
    ) -> Result<UploadResult, PublishError>;
}
