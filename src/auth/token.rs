// Bearer token
// Decodes the compact three-segment token handed out by the token endpoint

use std::fmt;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use super::types::{PayloadClaims, TokenHeader, TokenPayload, TokenState};
use crate::error::{Segment, TokenError};

/// Unpadded base64url that tolerates non-zero trailing bits in the last symbol,
/// which some servers emit for the signature segment
const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

/// Bearer token as returned by the server together with its decoded contents.
///
/// The signature is kept as raw bytes and never verified; the client trusts
/// the TLS channel to the server rather than the token signature.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BearerToken {
    token_type: String,
    raw: String,
    header: TokenHeader,
    payload: TokenPayload,
    signature: Vec<u8>,
}

impl BearerToken {
    /// Decode a raw `header.payload.signature` token
    pub fn decode(token_type: impl Into<String>, raw: impl Into<String>) -> Result<Self, TokenError> {
        let raw = raw.into();

        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() != 3 {
            return Err(TokenError::Malformed {
                found: segments.len(),
            });
        }

        let header: TokenHeader = decode_json(Segment::Header, segments[0])?;
        let claims: PayloadClaims = decode_json(Segment::Payload, segments[1])?;
        let signature = decode_segment(Segment::Signature, segments[2])?;

        Ok(Self {
            token_type: token_type.into(),
            header,
            payload: claims.into(),
            signature,
            raw,
        })
    }

    /// True when a token is present and its expiry lies after `now`.
    /// A token without an `exp` claim expires at the epoch and is never valid.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        if self.raw.is_empty() {
            return false;
        }
        self.payload.expires_at > now
    }

    pub fn state(&self, now: DateTime<Utc>) -> TokenState {
        if self.raw.is_empty() {
            TokenState::Absent
        } else if self.is_valid(now) {
            TokenState::Valid
        } else {
            TokenState::Expired
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Token type advertised by the server, usually "Bearer"
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn header(&self) -> &TokenHeader {
        &self.header
    }

    pub fn payload(&self) -> &TokenPayload {
        &self.payload
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Value for the Authorization header
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.raw)
    }
}

impl fmt::Display for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// Raw value and signature stay out of logs
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("token_type", &self.token_type)
            .field("header", &self.header)
            .field("payload", &self.payload)
            .field("signature_len", &self.signature.len())
            .finish()
    }
}

fn decode_segment(segment: Segment, encoded: &str) -> Result<Vec<u8>, TokenError> {
    SEGMENT_ENGINE
        .decode(encoded)
        .map_err(|source| TokenError::Encoding { segment, source })
}

fn decode_json<T: DeserializeOwned>(segment: Segment, encoded: &str) -> Result<T, TokenError> {
    let bytes = decode_segment(segment, encoded)?;
    serde_json::from_slice(&bytes).map_err(|source| TokenError::Structure { segment, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::prelude::*;
    use chrono::Duration;
    use proptest::prelude::*;

    // {"alg": "none"}
    const TEST_HEADER: &str = "ewogICJhbGciOiAibm9uZSIKfQ";
    // iss foobar.example.com, sub XMC, jti foo123bar, roles [foo, bar],
    // iat 1579535000, nbf 1579535100, exp 1579535200, longLived false
    const TEST_PAYLOAD: &str = "ewogICJpc3MiOiAiZm9vYmFyLmV4YW1wbGUuY29tIiwKICAic3ViIjogIlhNQyIsCiAgImp0aSI6ICJmb28xMjNiYXIiLAogICJyb2xlcyI6IFsKICAgICJmb28iLAogICAgImJhciIKICBdLAogICJpYXQiOiAxNTc5NTM1MDAwLAogICJuYmYiOiAxNTc5NTM1MTAwLAogICJleHAiOiAxNTc5NTM1MjAwLAogICJsb25nTGl2ZWQiOiBmYWxzZQp9";
    const TEST_SIGNATURE: &str = "nonefoobarnone";

    fn test_token() -> String {
        format!("{}.{}.{}", TEST_HEADER, TEST_PAYLOAD, TEST_SIGNATURE)
    }

    fn token_with_expiry(exp: i64) -> String {
        let header = BASE64_URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = BASE64_URL_SAFE_NO_PAD.encode(format!(r#"{{"jti":"t1","exp":{}}}"#, exp));
        format!("{}.{}.c2lnbmF0dXJl", header, payload)
    }

    #[test]
    fn test_decode_reference_token() {
        let token = BearerToken::decode("Bearer", test_token()).unwrap();

        assert_eq!(token.token_type(), "Bearer");
        assert_eq!(token.header().algorithm, "none");

        let payload = token.payload();
        assert_eq!(payload.issuer, "foobar.example.com");
        assert_eq!(payload.subject, "XMC");
        assert_eq!(payload.jwt_id, "foo123bar");
        assert_eq!(payload.roles, vec!["foo".to_string(), "bar".to_string()]);
        assert_eq!(payload.issued_at_unix, 1579535000);
        assert_eq!(payload.not_before_unix, 1579535100);
        assert_eq!(payload.expires_at_unix, 1579535200);
        assert_eq!(payload.expires_at.to_rfc3339(), "2020-01-20T15:46:40+00:00");
        assert!(!payload.long_lived);

        assert!(!token.signature().is_empty());
        assert_eq!(token.raw(), test_token());
    }

    #[test]
    fn test_decode_rejects_wrong_segment_count() {
        let err = BearerToken::decode("Bearer", "abc.def").unwrap_err();
        assert!(matches!(err, TokenError::Malformed { found: 2 }));

        let err = BearerToken::decode("Bearer", "").unwrap_err();
        assert!(matches!(err, TokenError::Malformed { found: 1 }));

        let err = BearerToken::decode("Bearer", format!("{}.extra", test_token())).unwrap_err();
        assert!(matches!(err, TokenError::Malformed { found: 4 }));
    }

    #[test]
    fn test_decode_rejects_bad_encoding() {
        let raw = format!("{}.{}.sig", "not*base64", TEST_PAYLOAD);
        let err = BearerToken::decode("Bearer", raw).unwrap_err();
        assert!(matches!(
            err,
            TokenError::Encoding {
                segment: Segment::Header,
                ..
            }
        ));

        // padded segments are not accepted
        let raw = format!("{}.{}.c2ln=", TEST_HEADER, TEST_PAYLOAD);
        let err = BearerToken::decode("Bearer", raw).unwrap_err();
        assert!(matches!(
            err,
            TokenError::Encoding {
                segment: Segment::Signature,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_rejects_bad_structure() {
        let payload = BASE64_URL_SAFE_NO_PAD.encode("not json");
        let raw = format!("{}.{}.c2ln", TEST_HEADER, payload);
        let err = BearerToken::decode("Bearer", raw).unwrap_err();
        assert!(matches!(
            err,
            TokenError::Structure {
                segment: Segment::Payload,
                ..
            }
        ));

        let payload = BASE64_URL_SAFE_NO_PAD.encode(r#"{"exp":"soon"}"#);
        let raw = format!("{}.{}.c2ln", TEST_HEADER, payload);
        assert!(BearerToken::decode("Bearer", raw).is_err());
    }

    #[test]
    fn test_empty_token_is_never_valid() {
        let token = BearerToken::default();
        assert!(token.is_empty());
        assert!(!token.is_valid(DateTime::<Utc>::default()));
        assert_eq!(token.state(Utc::now()), TokenState::Absent);
    }

    #[test]
    fn test_validity_against_expiry() {
        let exp = 1_900_000_000;
        let token = BearerToken::decode("Bearer", token_with_expiry(exp)).unwrap();
        let expiry = DateTime::from_timestamp(exp, 0).unwrap();

        assert!(token.is_valid(expiry - Duration::seconds(1)));
        assert!(!token.is_valid(expiry));
        assert!(!token.is_valid(expiry + Duration::seconds(1)));

        assert_eq!(token.state(expiry - Duration::seconds(1)), TokenState::Valid);
        assert_eq!(token.state(expiry), TokenState::Expired);
    }

    #[test]
    fn test_missing_expiry_is_expired() {
        let header = BASE64_URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#);
        let payload = BASE64_URL_SAFE_NO_PAD.encode(r#"{"sub":"XMC"}"#);
        let token = BearerToken::decode("Bearer", format!("{}.{}.", header, payload)).unwrap();

        assert!(token.signature().is_empty());
        assert!(!token.is_valid(Utc::now()));
        assert_eq!(token.state(Utc::now()), TokenState::Expired);
    }

    #[test]
    fn test_null_claims_decode_as_zero() {
        let header = BASE64_URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#);
        let payload = BASE64_URL_SAFE_NO_PAD.encode(
            r#"{"jti":"x","iat":null,"nbf":null,"exp":null,"roles":null,"iss":null}"#,
        );
        let token = BearerToken::decode("Bearer", format!("{}.{}.c2ln", header, payload)).unwrap();

        assert_eq!(token.payload().jwt_id, "x");
        assert_eq!(token.payload().issuer, "");
        assert!(token.payload().roles.is_empty());
        assert_eq!(token.payload().expires_at_unix, 0);
        assert_eq!(token.state(Utc::now()), TokenState::Expired);
    }

    #[test]
    fn test_far_future_expiry_stays_valid() {
        let token = BearerToken::decode("Bearer", token_with_expiry(9_000_000_000_000)).unwrap();
        assert_eq!(token.payload().expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(token.is_valid(Utc::now()));
    }

    #[test]
    fn test_display_and_debug() {
        let token = BearerToken::decode("Bearer", test_token()).unwrap();
        assert_eq!(token.to_string(), test_token());
        assert_eq!(token.authorization(), format!("Bearer {}", test_token()));

        let debug = format!("{:?}", token);
        assert!(debug.contains("foo123bar"));
        assert!(!debug.contains(TEST_PAYLOAD));
    }

    proptest! {
        #[test]
        fn prop_decode_is_idempotent(
            alg in "[A-Za-z0-9]{0,8}",
            jti in "[a-z0-9-]{0,24}",
            roles in proptest::collection::vec("[a-z]{1,8}", 0..4),
            exp in 0i64..4_102_444_800,
            signature in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let header = serde_json::json!({ "alg": alg });
            let payload = serde_json::json!({ "jti": jti, "roles": roles, "exp": exp });
            let raw = format!(
                "{}.{}.{}",
                BASE64_URL_SAFE_NO_PAD.encode(header.to_string()),
                BASE64_URL_SAFE_NO_PAD.encode(payload.to_string()),
                BASE64_URL_SAFE_NO_PAD.encode(&signature),
            );

            let first = BearerToken::decode("Bearer", raw.clone()).unwrap();
            let second = BearerToken::decode("Bearer", raw).unwrap();

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(&first.header().algorithm, &alg);
            prop_assert_eq!(&first.payload().jwt_id, &jti);
            prop_assert_eq!(first.payload().expires_at.timestamp(), exp);
            prop_assert_eq!(first.signature(), signature.as_slice());
        }
    }
}
