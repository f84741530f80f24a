//! Signed request construction
//!
//! Every call to the API carries the same protocol parameters (format,
//! version, credentials, signature scheme, timestamp and a fresh nonce)
//! next to its action-specific ones.
//!
//! Two requests signed by the same [`RequestBuilder`] never share a nonce or
//! a timestamp.

use chrono::{DateTime, Utc};
use ddns_core::Settings;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::sign::{self, HttpMethod, SIGNATURE_KEY};

/// Request parameters, ordered by key bytes
pub type RequestParams = BTreeMap<String, String>;

/// API version of Alibaba Cloud DNS
pub const API_VERSION: &str = "2015-01-09";
/// Response format requested from the API
pub const RESPONSE_FORMAT: &str = "json";
/// Signature method
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
/// Signature version
pub const SIGNATURE_VERSION: &str = "1.0";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Protocol parameters attached to every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonParams {
    access_key_id: String,
    timestamp: String,
    nonce: String,
}

impl CommonParams {
    /// Parameters stamped with `time` and a random UUID nonce
    pub fn at(access_key_id: &str, time: DateTime<Utc>) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            timestamp: time.format(TIMESTAMP_FORMAT).to_string(),
            nonce: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Parameters with a fixed timestamp and nonce (reproducible signatures)
    pub fn fixed(
        access_key_id: impl Into<String>,
        timestamp: impl Into<String>,
        nonce: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            timestamp: timestamp.into(),
            nonce: nonce.into(),
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Insert every common parameter, overwriting existing keys
    pub fn merge_into(&self, params: &mut RequestParams) {
        let pairs = [
            ("Format", RESPONSE_FORMAT),
            ("Version", API_VERSION),
            ("AccessKeyId", self.access_key_id.as_str()),
            ("SignatureMethod", SIGNATURE_METHOD),
            ("SignatureVersion", SIGNATURE_VERSION),
            ("Timestamp", self.timestamp.as_str()),
            ("SignatureNonce", self.nonce.as_str()),
        ];
        for (key, value) in pairs {
            params.insert(key.to_string(), value.to_string());
        }
    }
}

/// A fully parameterized request, ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub method: HttpMethod,
    pub params: RequestParams,
}

impl SignedRequest {
    /// The `Action` parameter
    pub fn action(&self) -> &str {
        self.params.get("Action").map(String::as_str).unwrap_or_default()
    }

    /// The computed signature
    pub fn signature(&self) -> Option<&str> {
        self.params.get(SIGNATURE_KEY).map(String::as_str)
    }
}

/// Builds signed requests for one set of credentials
///
/// # Security
///
/// The Debug implementation does NOT expose the access secret.
#[derive(Clone)]
pub struct RequestBuilder {
    access_key_id: String,
    access_secret: String,
    /// Unix second of the last issued timestamp
    last_second: Arc<Mutex<Option<i64>>>,
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("access_key_id", &self.access_key_id)
            .field("access_secret", &"<REDACTED>")
            .finish()
    }
}

impl RequestBuilder {
    pub fn new(settings: &Settings) -> Self {
        Self {
            access_key_id: settings.access_key.clone(),
            access_secret: settings.access_secret.clone(),
            last_second: Arc::new(Mutex::new(None)),
        }
    }

    /// Sign `action_params` with freshly generated common parameters
    ///
    /// Waits for the next second when the previous request was stamped
    /// within the current one.
    pub async fn build_signed_request(
        &self,
        method: HttpMethod,
        action_params: RequestParams,
    ) -> SignedRequest {
        let now = self.next_timestamp().await;
        let common = CommonParams::at(&self.access_key_id, now);
        self.build_signed_request_with(method, action_params, &common)
    }

    /// Current time, strictly after the last issued second
    async fn next_timestamp(&self) -> DateTime<Utc> {
        let mut last_second = self.last_second.lock().await;
        loop {
            let now = Utc::now();
            if *last_second == Some(now.timestamp()) {
                let elapsed = u64::from(now.timestamp_subsec_millis());
                let wait = 1000u64.saturating_sub(elapsed).max(1);
                tracing::trace!("Timestamp already used, waiting {} ms", wait);
                tokio::time::sleep(Duration::from_millis(wait)).await;
                continue;
            }
            *last_second = Some(now.timestamp());
            return now;
        }
    }

    /// Sign `action_params` with the given common parameters
    pub fn build_signed_request_with(
        &self,
        method: HttpMethod,
        action_params: RequestParams,
        common: &CommonParams,
    ) -> SignedRequest {
        SignedRequest {
            method,
            params: sign::sign(method, action_params, common, &self.access_secret),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> RequestBuilder {
        RequestBuilder::new(&Settings::new("testid", "testsecret", "sub.example.com"))
    }

    fn describe_params() -> RequestParams {
        RequestParams::from([
            ("Action".to_string(), "DescribeDomainRecords".to_string()),
            ("DomainName".to_string(), "example.com".to_string()),
        ])
    }

    #[test]
    fn fresh_common_params_differ_between_requests() {
        let now = Utc::now();
        let a = CommonParams::at("testid", now);
        let b = CommonParams::at("testid", now);
        assert_ne!(a.nonce(), b.nonce(), "nonce must be single-use");

        // e.g. 2024-01-15T08:00:00Z
        assert_eq!(a.timestamp().len(), 20);
        assert!(a.timestamp().ends_with('Z'));
        assert_eq!(&a.timestamp()[10..11], "T");
    }

    #[tokio::test]
    async fn signed_request_carries_all_fields() {
        let request = builder()
            .build_signed_request(HttpMethod::Get, describe_params())
            .await;

        for key in [
            "Action",
            "DomainName",
            "Format",
            "Version",
            "AccessKeyId",
            "SignatureMethod",
            "SignatureVersion",
            "Timestamp",
            "SignatureNonce",
            "Signature",
        ] {
            assert!(request.params.contains_key(key), "missing {}", key);
        }
        assert_eq!(request.action(), "DescribeDomainRecords");
        assert_eq!(request.method, HttpMethod::Get);
    }

    #[tokio::test]
    async fn two_requests_get_different_signatures() {
        let builder = builder();
        let a = builder
            .build_signed_request(HttpMethod::Get, describe_params())
            .await;
        let b = builder
            .build_signed_request(HttpMethod::Get, describe_params())
            .await;

        assert_ne!(a.params["SignatureNonce"], b.params["SignatureNonce"]);
        assert_ne!(a.signature(), b.signature());
    }

    #[tokio::test]
    async fn back_to_back_requests_get_different_timestamps() {
        let builder = builder();
        let list = builder
            .build_signed_request(HttpMethod::Get, describe_params())
            .await;
        let update = builder
            .build_signed_request(HttpMethod::Post, describe_params())
            .await;

        assert_ne!(
            list.params["Timestamp"], update.params["Timestamp"],
            "list and update calls of one run must not share a timestamp"
        );
        assert!(update.params["Timestamp"] > list.params["Timestamp"]);
    }

    #[tokio::test]
    async fn clones_share_the_timestamp_sequence() {
        let builder = builder();
        let clone = builder.clone();
        let a = builder
            .build_signed_request(HttpMethod::Get, describe_params())
            .await;
        let b = clone
            .build_signed_request(HttpMethod::Get, describe_params())
            .await;

        assert_ne!(a.params["Timestamp"], b.params["Timestamp"]);
    }

    #[test]
    fn fixed_common_params_are_reproducible() {
        let common = CommonParams::fixed("testid", "2016-03-24T16:41:54Z", "nonce-1");
        let a = builder().build_signed_request_with(HttpMethod::Get, describe_params(), &common);
        let b = builder().build_signed_request_with(HttpMethod::Get, describe_params(), &common);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn signature_verifies_against_params() {
        let request = builder()
            .build_signed_request(HttpMethod::Post, describe_params())
            .await;
        let expected = sign::compute_signature(HttpMethod::Post, &request.params, "testsecret");
        assert_eq!(request.signature(), Some(expected.as_str()));
    }

    #[test]
    fn secret_not_exposed_in_debug() {
        let debug_str = format!("{:?}", builder());
        assert!(!debug_str.contains("testsecret"));
        assert!(debug_str.contains("testid"));
    }
}
