//! Request authentication.
//!
//! Every tool call passes through [`AuthGate::check`] before any workflow
//! runs. Two schemes are accepted, tried in order: a static bearer token, or
//! a request signed with HMAC-SHA256 over the key id and a millisecond
//! timestamp.

use std::fmt;
use std::sync::Arc;

use base64::prelude::{BASE64_STANDARD, Engine as _};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, HeaderMap};
use sha2::Sha256;
use tracing::debug;

use crate::clock::Clock;
use crate::config::AuthSettings;

type HmacSha256 = Hmac<Sha256>;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const TIMESTAMP_HEADER: &str = "x-api-timestamp";
pub const SIGNATURE_HEADER: &str = "x-api-signature";

const BEARER_PREFIX: &str = "Bearer ";
/// Maximum distance between the signed timestamp and now, in milliseconds.
pub const MAX_REQUEST_AGE_MS: i64 = 2 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    MissingHeaders,
    InvalidBearerToken,
    InvalidKey,
    StaleOrInvalidTimestamp,
    InvalidSignature,
}

impl AuthRejection {
    pub fn message(&self) -> &'static str {
        match self {
            AuthRejection::MissingHeaders => "Missing authentication headers",
            AuthRejection::InvalidBearerToken => "Invalid bearer token",
            AuthRejection::InvalidKey => "Invalid API key",
            AuthRejection::StaleOrInvalidTimestamp => "Timestamp too old or invalid",
            AuthRejection::InvalidSignature => "Invalid signature",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            AuthRejection::MissingHeaders => 401,
            _ => 403,
        }
    }
}

impl fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Which scheme let a request through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    BearerToken,
    SignedRequest,
}

pub struct AuthGate {
    settings: AuthSettings,
    clock: Arc<dyn Clock>,
}

impl AuthGate {
    pub fn new(settings: AuthSettings, clock: Arc<dyn Clock>) -> Self {
        Self { settings, clock }
    }

    pub fn check(&self, headers: &HeaderMap) -> Result<Credential, AuthRejection> {
        if let Some(token) = header_value(headers, AUTHORIZATION.as_str())
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        {
            return match self.settings.bearer_token.as_deref() {
                Some(expected) if token == expected => Ok(Credential::BearerToken),
                _ => Err(AuthRejection::InvalidBearerToken),
            };
        }

        let (Some(key), Some(timestamp), Some(signature)) = (
            header_value(headers, API_KEY_HEADER),
            header_value(headers, TIMESTAMP_HEADER),
            header_value(headers, SIGNATURE_HEADER),
        ) else {
            return Err(AuthRejection::MissingHeaders);
        };

        if self.settings.api_key.as_deref() != Some(key) {
            return Err(AuthRejection::InvalidKey);
        }

        let sent = timestamp
            .trim()
            .parse::<i64>()
            .map_err(|_| AuthRejection::StaleOrInvalidTimestamp)?;
        let age = self.clock.now_millis().abs_diff(sent);
        if age > MAX_REQUEST_AGE_MS.unsigned_abs() {
            debug!(age_ms = age, "signed request outside freshness window");
            return Err(AuthRejection::StaleOrInvalidTimestamp);
        }

        let secret = self
            .settings
            .api_secret
            .as_deref()
            .ok_or(AuthRejection::InvalidSignature)?;
        let expected =
            sign_request(key, secret, timestamp).map_err(|_| AuthRejection::InvalidSignature)?;
        if expected != signature {
            return Err(AuthRejection::InvalidSignature);
        }

        Ok(Credential::SignedRequest)
    }
}

/// Base64 HMAC-SHA256 of `key ‖ timestamp` under `secret`.
pub fn sign_request(key: &str, secret: &str, timestamp: &str) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(key.as_bytes());
    mac.update(timestamp.as_bytes());
    Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderName, HeaderValue};

    use super::*;
    use crate::clock::FixedClock;

    const NOW: i64 = 1_700_000_000_000;

    fn gate() -> AuthGate {
        AuthGate::new(
            AuthSettings {
                bearer_token: Some("static-token".to_string()),
                api_key: Some("client-1".to_string()),
                api_secret: Some("s3cret".to_string()),
            },
            Arc::new(FixedClock(NOW)),
        )
    }

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    fn signed(timestamp: i64) -> HeaderMap {
        let ts = timestamp.to_string();
        let signature = sign_request("client-1", "s3cret", &ts).unwrap();
        headers(&[
            ("x-api-key", "client-1"),
            ("x-api-timestamp", &ts),
            ("x-api-signature", &signature),
        ])
    }

    #[test]
    fn accepts_matching_bearer_token() {
        let result = gate().check(&headers(&[("Authorization", "Bearer static-token")]));
        assert_eq!(result, Ok(Credential::BearerToken));
    }

    #[test]
    fn wrong_bearer_token_never_falls_through_to_signature() {
        let mut map = signed(NOW);
        map.insert(AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
        assert_eq!(gate().check(&map), Err(AuthRejection::InvalidBearerToken));
    }

    #[test]
    fn bearer_is_rejected_when_no_token_is_configured() {
        let gate = AuthGate::new(AuthSettings::default(), Arc::new(FixedClock(NOW)));
        assert_eq!(
            gate.check(&headers(&[("authorization", "Bearer ")])),
            Err(AuthRejection::InvalidBearerToken)
        );
    }

    #[test]
    fn non_bearer_authorization_uses_signature_scheme() {
        let mut map = signed(NOW);
        map.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(gate().check(&map), Ok(Credential::SignedRequest));
    }

    #[test]
    fn accepts_fresh_signed_request_with_mixed_case_headers() {
        let ts = NOW.to_string();
        let signature = sign_request("client-1", "s3cret", &ts).unwrap();
        let map = headers(&[
            ("X-Api-Key", "client-1"),
            ("X-API-TIMESTAMP", &ts),
            ("x-Api-Signature", &signature),
        ]);
        assert_eq!(gate().check(&map), Ok(Credential::SignedRequest));
    }

    #[test]
    fn reports_missing_headers() {
        let map = headers(&[("x-api-key", "client-1"), ("x-api-timestamp", "1")]);
        let rejection = gate().check(&map).unwrap_err();
        assert_eq!(rejection, AuthRejection::MissingHeaders);
        assert_eq!(rejection.status_code(), 401);
        assert_eq!(gate().check(&HeaderMap::new()), Err(AuthRejection::MissingHeaders));
    }

    #[test]
    fn rejects_unknown_key_before_checking_timestamp() {
        let map = headers(&[
            ("x-api-key", "other"),
            ("x-api-timestamp", "garbage"),
            ("x-api-signature", "sig"),
        ]);
        assert_eq!(gate().check(&map), Err(AuthRejection::InvalidKey));
    }

    #[test]
    fn enforces_freshness_window() {
        assert_eq!(gate().check(&signed(NOW - 120_000)), Ok(Credential::SignedRequest));
        assert_eq!(gate().check(&signed(NOW + 120_000)), Ok(Credential::SignedRequest));
        assert_eq!(
            gate().check(&signed(NOW - 120_001)),
            Err(AuthRejection::StaleOrInvalidTimestamp)
        );
        assert_eq!(
            gate().check(&signed(NOW + 120_001)),
            Err(AuthRejection::StaleOrInvalidTimestamp)
        );
    }

    #[test]
    fn rejects_unparseable_timestamp() {
        let map = headers(&[
            ("x-api-key", "client-1"),
            ("x-api-timestamp", "yesterday"),
            ("x-api-signature", "sig"),
        ]);
        assert_eq!(gate().check(&map), Err(AuthRejection::StaleOrInvalidTimestamp));
    }

    #[test]
    fn rejects_bad_signature() {
        let ts = NOW.to_string();
        let signature = sign_request("client-1", "wrong-secret", &ts).unwrap();
        let map = headers(&[
            ("x-api-key", "client-1"),
            ("x-api-timestamp", &ts),
            ("x-api-signature", &signature),
        ]);
        assert_eq!(gate().check(&map), Err(AuthRejection::InvalidSignature));
    }

    #[test]
    fn signature_is_base64_hmac_of_key_and_timestamp() {
        // RFC 4231 test case 2 with data split across key id and timestamp.
        let signature = sign_request("what do ya want ", "Jefe", "for nothing?").unwrap();
        assert_eq!(signature, "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM=");
    }
}
