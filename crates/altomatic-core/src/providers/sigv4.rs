//! Minimal AWS Signature Version 4 signer for JSON-RPC POST requests.
//!
//! Covers exactly what Rekognition's `x-amz-json-1.1` protocol needs: a POST
//! to `/` with no query string and four signed headers.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Signed header names, lowercase and sorted.
pub const SIGNED_HEADERS: &str = "content-type;host;x-amz-date;x-amz-target";

/// Credentials and scope for one signature.
#[derive(Debug, Clone)]
pub struct SigningParams<'a> {
    pub access_key: &'a str,
    pub secret_key: &'a str,
    pub region: &'a str,
    pub service: &'a str,
}

/// Header values to attach to the outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// `X-Amz-Date`, formatted `YYYYMMDD'T'HHMMSS'Z'`
    pub amz_date: String,
    pub authorization: String,
}

/// Sign a JSON-RPC POST to `https://{host}/` with the given `X-Amz-Target`.
pub fn sign_json_rpc(
    params: &SigningParams<'_>,
    host: &str,
    target: &str,
    payload: &[u8],
    now: DateTime<Utc>,
) -> SignedHeaders {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();

    let request = canonical_request(host, &amz_date, target, payload);
    let scope = credential_scope(&date_stamp, params.region, params.service);
    let to_sign = string_to_sign(&amz_date, &scope, &request);

    let key = signing_key(params.secret_key, &date_stamp, params.region, params.service);
    let signature = hex::encode(hmac_sha256(&key, to_sign.as_bytes()));

    let authorization = format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
        params.access_key
    );

    SignedHeaders {
        amz_date,
        authorization,
    }
}

/// Method, URI, empty query, canonical headers, signed headers, payload hash.
pub fn canonical_request(host: &str, amz_date: &str, target: &str, payload: &[u8]) -> String {
    let canonical_headers = format!(
        "content-type:{JSON_CONTENT_TYPE}\nhost:{host}\nx-amz-date:{amz_date}\nx-amz-target:{target}\n"
    );
    format!(
        "POST\n/\n\n{canonical_headers}\n{SIGNED_HEADERS}\n{}",
        sha256_hex(payload)
    )
}

pub fn credential_scope(date_stamp: &str, region: &str, service: &str) -> String {
    format!("{date_stamp}/{region}/{service}/aws4_request")
}

pub fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> String {
    format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    )
}

/// Derive the signing key: date → region → service → "aws4_request".
pub fn signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(
        format!("AWS4{secret_key}").as_bytes(),
        date_stamp.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC key of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
