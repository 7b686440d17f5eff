//! SigV4 query-string presigning.
//!
//! The signature, credential scope and expiry all travel in the URL query, so a
//! WebSocket handshake can be authorized without any extra headers. The only
//! signed header is `host`.

use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use super::SignerError;
use super::credentials::Credentials;

type HmacSha256 = Hmac<Sha256>;

/// Signing algorithm identifier.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Terminator of the credential scope.
pub const SCOPE_TERMINATOR: &str = "aws4_request";

/// Hex SHA-256 of an empty body.
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Shortest allowed presigned URL lifetime in seconds.
pub const MIN_EXPIRES_SECONDS: u32 = 1;

/// Longest allowed presigned URL lifetime in seconds (7 days).
pub const MAX_EXPIRES_SECONDS: u32 = 604_800;

const AMZ_DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year][month][day]");

const AMZ_TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]T[hour][minute][second]Z");

/// Everything except `A-Za-z0-9-_.~` is percent-encoded, including `/`.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A request to presign.
///
/// Built fresh for every connection attempt: the signing timestamp is baked into
/// the resulting URL, so a URL stops working once `expires_seconds` have passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignableRequest {
    pub method: String,
    /// URL scheme of the returned URL (`wss` for the streaming endpoint).
    pub scheme: String,
    /// Host, with `:port` when the endpoint is not on the scheme's default port.
    pub host: String,
    pub path: String,
    pub service: String,
    pub region: String,
    /// Hex digest placed on the last line of the canonical request.
    pub payload_hash: String,
    /// Caller parameters, kept in insertion order until canonicalization.
    pub extra_query_params: Vec<(String, String)>,
    pub expires_seconds: u32,
}

impl SignableRequest {
    /// A `GET` request with an empty-body payload hash and a 5 minute expiry.
    pub fn get(
        scheme: impl Into<String>,
        host: impl Into<String>,
        path: impl Into<String>,
        service: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            method: "GET".to_string(),
            scheme: scheme.into(),
            host: host.into(),
            path: path.into(),
            service: service.into(),
            region: region.into(),
            payload_hash: EMPTY_PAYLOAD_SHA256.to_string(),
            extra_query_params: Vec::new(),
            expires_seconds: 300,
        }
    }

    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_query_params.push((name.into(), value.into()));
        self
    }

    pub fn with_expires(mut self, expires_seconds: u32) -> Self {
        self.expires_seconds = expires_seconds;
        self
    }

    pub fn with_payload_hash(mut self, payload_hash: impl Into<String>) -> Self {
        self.payload_hash = payload_hash.into();
        self
    }
}

/// Percent-encode a query name or value.
pub fn uri_encode(value: &str) -> String {
    utf8_percent_encode(value, URI_ENCODE_SET).to_string()
}

/// Encode a path segment by segment, keeping the separators.
pub fn canonical_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let encoded = path
        .split('/')
        .map(uri_encode)
        .collect::<Vec<_>>()
        .join("/");

    if encoded.starts_with('/') {
        encoded
    } else {
        format!("/{encoded}")
    }
}

/// `(YYYYMMDD, YYYYMMDDTHHMMSSZ)` for the given instant, in UTC.
pub fn amz_date(now: OffsetDateTime) -> Result<(String, String), SignerError> {
    let now = now.to_offset(UtcOffset::UTC);
    let date = now
        .format(AMZ_DATE_FORMAT)
        .map_err(|e| SignerError::InvalidTimestamp(e.to_string()))?;
    let timestamp = now
        .format(AMZ_TIMESTAMP_FORMAT)
        .map_err(|e| SignerError::InvalidTimestamp(e.to_string()))?;
    Ok((date, timestamp))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SignerError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| SignerError::InvalidKey(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Derive the SigV4 signing key: `AWS4<secret>` → date → region → service → `aws4_request`.
pub fn derive_signing_key(
    secret_access_key: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, SignerError> {
    let seed = format!("AWS4{secret_access_key}");
    let k_date = hmac_sha256(seed.as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, SCOPE_TERMINATOR.as_bytes())
}

/// Sorted, encoded query string including every `X-Amz-*` parameter except the
/// signature itself.
fn canonical_query(
    request: &SignableRequest,
    credentials: &Credentials,
    timestamp: &str,
    scope: &str,
) -> String {
    let mut params: Vec<(String, String)> = request
        .extra_query_params
        .iter()
        .map(|(name, value)| (uri_encode(name), uri_encode(value)))
        .collect();

    let credential = format!("{}/{}", credentials.access_key_id(), scope);
    let expires = request.expires_seconds.to_string();
    let mut signing_params = vec![
        ("X-Amz-Algorithm", ALGORITHM),
        ("X-Amz-Credential", credential.as_str()),
        ("X-Amz-Date", timestamp),
        ("X-Amz-Expires", expires.as_str()),
        ("X-Amz-SignedHeaders", "host"),
    ];
    if let Some(token) = credentials.session_token() {
        signing_params.push(("X-Amz-Security-Token", token));
    }
    params.extend(
        signing_params
            .into_iter()
            .map(|(name, value)| (uri_encode(name), uri_encode(value))),
    );

    params.sort();
    params
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Canonical request for a host-only signed request.
pub fn canonical_request(request: &SignableRequest, canonical_query: &str) -> String {
    format!(
        "{}\n{}\n{}\nhost:{}\n\nhost\n{}",
        request.method,
        canonical_path(&request.path),
        canonical_query,
        request.host,
        request.payload_hash
    )
}

/// Compute a presigned URL for `request`, signed at `now`.
///
/// The clock is an explicit input: identical inputs always produce the same URL.
pub fn presign_url(
    request: &SignableRequest,
    credentials: &Credentials,
    now: OffsetDateTime,
) -> Result<String, SignerError> {
    if !credentials.is_complete() {
        return Err(SignerError::MissingCredentials);
    }

    if !(MIN_EXPIRES_SECONDS..=MAX_EXPIRES_SECONDS).contains(&request.expires_seconds) {
        return Err(SignerError::InvalidExpiry(request.expires_seconds));
    }

    let (date, timestamp) = amz_date(now)?;
    let scope = format!(
        "{}/{}/{}/{}",
        date, request.region, request.service, SCOPE_TERMINATOR
    );

    let query = canonical_query(request, credentials, &timestamp, &scope);
    let canonical = canonical_request(request, &query);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        timestamp,
        scope,
        hex::encode(Sha256::digest(canonical.as_bytes()))
    );

    let signing_key = derive_signing_key(
        credentials.secret_access_key(),
        &date,
        &request.region,
        &request.service,
    )?;
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

    Ok(format!(
        "{}://{}{}?{}&X-Amz-Signature={}",
        request.scheme,
        request.host,
        canonical_path(&request.path),
        query,
        signature
    ))
}

/// Strip the query string so a signed URL can be logged.
pub fn redact_query(url: &str) -> &str {
    url.split_once('?').map(|(base, _)| base).unwrap_or(url)
}
