//! Alibaba Cloud RPC signature (SignatureVersion 1.0, HMAC-SHA1)
//!
//! ```text
//! StringToSign = METHOD + "&" + encode("/") + "&" + encode(CanonicalQuery)
//! Signature    = base64(HMAC-SHA1(AccessKeySecret + "&", StringToSign))
//! ```
//!
//! `CanonicalQuery` is every parameter except `Signature`, sorted by key
//! bytes, each key and value percent-encoded, joined as `k=v` with `&`.
//! Reference: <https://help.aliyun.com/document_detail/29747.html>

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::fmt::Write;

use crate::request::{CommonParams, RequestParams};

type HmacSha1 = Hmac<Sha1>;

/// Name of the parameter carrying the signature
pub const SIGNATURE_KEY: &str = "Signature";

/// HTTP verbs used by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RFC 3986 percent-encoding
///
/// Only `A-Z a-z 0-9 - _ . ~` pass through. Everything else, including
/// space (`%20`, never `+`) and `*` (`%2A`), is encoded byte by byte as
/// uppercase `%XX`.
pub fn percent_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                let _ = write!(result, "%{byte:02X}");
            }
        }
    }
    result
}

/// Sorted, percent-encoded query string (without `Signature`)
pub fn canonical_query(params: &RequestParams) -> String {
    params
        .iter()
        .filter(|(k, _)| k.as_str() != SIGNATURE_KEY)
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the string the signature is computed over
pub fn string_to_sign(method: HttpMethod, params: &RequestParams) -> String {
    format!(
        "{}&{}&{}",
        method.as_str(),
        percent_encode("/"),
        percent_encode(&canonical_query(params))
    )
}

/// Compute the base64 signature of a parameter set
pub fn compute_signature(method: HttpMethod, params: &RequestParams, access_secret: &str) -> String {
    let string_to_sign = string_to_sign(method, params);
    tracing::trace!("StringToSign: {}", string_to_sign);

    let key = format!("{access_secret}&");
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(string_to_sign.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Merge the common parameters into `params`, sign, and attach `Signature`
///
/// Common parameters overwrite action parameters with the same key. A
/// `Signature` supplied by the caller is discarded before signing.
pub fn sign(
    method: HttpMethod,
    mut params: RequestParams,
    common: &CommonParams,
    access_secret: &str,
) -> RequestParams {
    params.remove(SIGNATURE_KEY);
    common.merge_into(&mut params);

    let signature = compute_signature(method, &params, access_secret);
    params.insert(SIGNATURE_KEY.to_string(), signature);
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONCE: &str = "f59ed6a9-83fc-473b-9cc6-99c95df3856e";
    const TIMESTAMP: &str = "2016-03-24T16:41:54Z";

    fn params(pairs: &[(&str, &str)]) -> RequestParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn documented_example() -> RequestParams {
        params(&[
            ("Action", "DescribeDomainRecords"),
            ("DomainName", "example.com"),
            ("Format", "XML"),
            ("Version", "2015-01-09"),
            ("AccessKeyId", "testid"),
            ("SignatureMethod", "HMAC-SHA1"),
            ("Timestamp", TIMESTAMP),
            ("SignatureVersion", "1.0"),
            ("SignatureNonce", NONCE),
        ])
    }

    #[test]
    fn percent_encode_profile() {
        assert_eq!(percent_encode("AZaz09-_.~"), "AZaz09-_.~");
        assert_eq!(percent_encode("a b"), "a%20b");
        assert_eq!(percent_encode("*"), "%2A");
        assert_eq!(percent_encode("/"), "%2F");
        assert_eq!(percent_encode("="), "%3D");
        assert_eq!(percent_encode("&"), "%26");
        assert_eq!(percent_encode("2016-03-24T16:41:54Z"), "2016-03-24T16%3A41%3A54Z");
        assert_eq!(percent_encode("é"), "%C3%A9");
    }

    #[test]
    fn canonical_query_is_sorted_by_key() {
        let query = canonical_query(&params(&[("B", "2"), ("A", "1")]));
        assert_eq!(query, "A=1&B=2");

        // Byte order: "RR" sorts before "RecordId"
        let query = canonical_query(&params(&[("RecordId", "1"), ("RR", "sub")]));
        assert_eq!(query, "RR=sub&RecordId=1");
    }

    #[test]
    fn canonical_query_skips_signature() {
        let query = canonical_query(&params(&[("A", "1"), ("Signature", "abc")]));
        assert_eq!(query, "A=1");
    }

    #[test]
    fn string_to_sign_matches_documented_example() {
        let expected = "GET&%2F&AccessKeyId%3Dtestid%26Action%3DDescribeDomainRecords\
            %26DomainName%3Dexample.com%26Format%3DXML%26SignatureMethod%3DHMAC-SHA1\
            %26SignatureNonce%3Df59ed6a9-83fc-473b-9cc6-99c95df3856e%26SignatureVersion%3D1.0\
            %26Timestamp%3D2016-03-24T16%253A41%253A54Z%26Version%3D2015-01-09";
        assert_eq!(string_to_sign(HttpMethod::Get, &documented_example()), expected);
    }

    #[test]
    fn signature_snapshot() {
        let signature = compute_signature(HttpMethod::Get, &documented_example(), "testsecret");
        assert_eq!(signature, "uRpHwaSEt3J+6KQD//svCh/x+pI=");
    }

    #[test]
    fn signature_deterministic() {
        let a = compute_signature(HttpMethod::Get, &documented_example(), "testsecret");
        let b = compute_signature(HttpMethod::Get, &documented_example(), "testsecret");
        assert_eq!(a, b, "same inputs should produce identical output");
    }

    #[test]
    fn signature_changes_with_any_input() {
        let base = compute_signature(HttpMethod::Get, &documented_example(), "testsecret");

        let post = compute_signature(HttpMethod::Post, &documented_example(), "testsecret");
        assert_ne!(base, post, "HTTP method is part of the signature");

        let other_secret = compute_signature(HttpMethod::Get, &documented_example(), "other");
        assert_ne!(base, other_secret, "secret is part of the signature");

        for key in documented_example().keys() {
            let mut changed = documented_example();
            let value = format!("{}x", changed[key]);
            changed.insert(key.clone(), value);
            let sig = compute_signature(HttpMethod::Get, &changed, "testsecret");
            assert_ne!(base, sig, "changing {} should change the signature", key);
        }
    }

    #[test]
    fn signature_resists_naive_concatenation_collisions() {
        // "A=1&B=2" must not collide with a single value containing "&B=2"
        let split = params(&[("A", "1"), ("B", "2")]);
        let joined = params(&[("A", "1&B=2")]);
        assert_ne!(
            compute_signature(HttpMethod::Get, &split, "s"),
            compute_signature(HttpMethod::Get, &joined, "s")
        );
    }

    #[test]
    fn sign_merges_common_params_and_attaches_signature() {
        let common = CommonParams::fixed("testid", TIMESTAMP, NONCE);
        let signed = sign(
            HttpMethod::Post,
            params(&[
                ("Action", "UpdateDomainRecord"),
                ("RecordId", "9999985"),
                ("RR", "sub"),
                ("Type", "A"),
                ("Value", "203.0.113.7"),
                // Overwritten by the common parameters
                ("Format", "XML"),
            ]),
            &common,
            "testsecret",
        );

        assert_eq!(signed["Format"], "json");
        assert_eq!(signed["Version"], "2015-01-09");
        assert_eq!(signed["AccessKeyId"], "testid");
        assert_eq!(signed["SignatureMethod"], "HMAC-SHA1");
        assert_eq!(signed["SignatureVersion"], "1.0");
        assert_eq!(signed["SignatureNonce"], NONCE);
        assert_eq!(signed["Timestamp"], TIMESTAMP);
        assert_eq!(signed["Signature"], "wEVHrX2r2jvq4RPU6MuWLanhd1M=");
    }

    #[test]
    fn sign_ignores_caller_supplied_signature() {
        let common = CommonParams::fixed("testid", TIMESTAMP, NONCE);
        let clean = sign(HttpMethod::Get, params(&[("A", "1")]), &common, "s");
        let tampered = sign(
            HttpMethod::Get,
            params(&[("A", "1"), ("Signature", "forged")]),
            &common,
            "s",
        );
        assert_eq!(clean, tampered);
    }
}
