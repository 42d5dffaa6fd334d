use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::{AccessClaims, RefreshClaims};
use crate::errors::AuthError;
use crate::utils::config::AuthConfig;

/// Signs claims into compact JWTs and reverses the operation with full
/// validation. The codec owns the key material; everything above it works
/// with claims structs and never sees the secret.
///
/// Only HS256 is accepted on decode. Tokens signed with any other algorithm,
/// including `none`, fail before claim checks, and the signature comparison
/// inside `jsonwebtoken` is constant-time.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    leeway: u64,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret()),
            decoding_key: DecodingKey::from_secret(config.secret()),
            issuer: config.issuer().to_owned(),
            audience: config.audience().to_owned(),
            leeway: config.leeway_seconds(),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn encode_access(&self, claims: &AccessClaims) -> Result<String, AuthError> {
        self.encode(claims)
    }

    pub fn encode_refresh(&self, claims: &RefreshClaims) -> Result<String, AuthError> {
        self.encode(claims)
    }

    fn encode<C: Serialize>(&self, claims: &C) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|_| AuthError::Invalid)
    }

    /// Full validation: signature, algorithm, issuer, audience, `exp`
    /// presence, and the `[nbf - leeway, exp + leeway]` temporal window.
    pub fn decode_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let mut validation = self.base_validation();
        validation.set_audience(&[self.audience.clone()]);
        self.decode(token, &validation)
    }

    /// Same as access decode minus the audience check: refresh tokens are
    /// exchanged at the authority, not presented to the API.
    pub fn decode_refresh(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        let mut validation = self.base_validation();
        validation.validate_aud = false;
        self.decode(token, &validation)
    }

    /// Relaxed temporal validation for the revoke path: the expiry check is
    /// skipped so an expired token still yields its claims, but signature
    /// and issuer are enforced and `exp` must still be present. A fully
    /// malformed token fails here instead of proceeding with junk claims.
    pub fn decode_access_ignoring_expiry(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let mut validation = self.base_validation();
        validation.set_audience(&[self.audience.clone()]);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        self.decode(token, &validation)
    }

    fn base_validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        // Set before set_issuer/set_audience, which extend the required set.
        validation.set_required_spec_claims(&["exp"]);
        validation.set_issuer(&[self.issuer.clone()]);
        validation.validate_nbf = true;
        validation.leeway = self.leeway;
        validation
    }

    fn decode<C: DeserializeOwned>(
        &self,
        token: &str,
        validation: &Validation,
    ) -> Result<C, AuthError> {
        decode::<C>(token, &self.decoding_key, validation)
            .map(|data| data.claims)
            .map_err(|e| map_decode_error(e.kind()))
    }
}

fn map_decode_error(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidSignature => AuthError::BadSignature,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::ImmatureSignature => AuthError::NotYetValid,
        ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience | ErrorKind::InvalidAlgorithm => {
            AuthError::ClaimMismatch
        }
        // Structural problems: wrong segment count, bad base64/json, or a
        // missing required claim such as `exp`.
        ErrorKind::InvalidToken
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => AuthError::Malformed,
        _ => AuthError::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::domain::Role;

    fn codec() -> TokenCodec {
        let config =
            AuthConfig::new("board-api", "api.example.com", vec![9u8; 32], 900, 604800).unwrap();
        TokenCodec::new(&config)
    }

    fn claims_expiring_in(seconds: i64) -> AccessClaims {
        let now = Utc::now().timestamp();
        AccessClaims {
            user_id: 42,
            email: "alice@example.com".into(),
            username: "alice".into(),
            role: Role::User,
            iss: "board-api".into(),
            sub: "42".into(),
            aud: "api.example.com".into(),
            exp: (now + seconds) as usize,
            iat: now as usize,
            nbf: now as usize,
            jti: Uuid::new_v4().simple().to_string(),
        }
    }

    #[test]
    fn round_trip_preserves_all_fields() {
        let codec = codec();
        let claims = claims_expiring_in(900);
        let token = codec.encode_access(&claims).unwrap();
        let decoded = codec.decode_access(&token).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn tampered_signature_is_rejected_as_bad_signature() {
        let codec = codec();
        let token = codec.encode_access(&claims_expiring_in(900)).unwrap();

        // Flip a byte inside the signature segment.
        let sig_start = token.rfind('.').unwrap() + 1;
        let mut bytes = token.into_bytes();
        bytes[sig_start] = if bytes[sig_start] == b'a' { b'b' } else { b'a' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert_eq!(codec.decode_access(&tampered), Err(AuthError::BadSignature));
    }

    #[test]
    fn expired_token_fails_with_expired() {
        let codec = codec();
        let token = codec.encode_access(&claims_expiring_in(-10)).unwrap();
        assert_eq!(codec.decode_access(&token), Err(AuthError::Expired));
    }

    #[test]
    fn expiry_within_leeway_is_accepted() {
        let codec = codec();
        // Expired 1s ago but the 5s leeway still covers it.
        let token = codec.encode_access(&claims_expiring_in(-1)).unwrap();
        assert!(codec.decode_access(&token).is_ok());
    }

    #[test]
    fn not_yet_valid_token_is_rejected() {
        let codec = codec();
        let mut claims = claims_expiring_in(900);
        let future = (Utc::now().timestamp() + 120) as usize;
        claims.nbf = future;
        let token = codec.encode_access(&claims).unwrap();
        assert_eq!(codec.decode_access(&token), Err(AuthError::NotYetValid));
    }

    #[test]
    fn wrong_issuer_is_a_claim_mismatch() {
        let codec = codec();
        let mut claims = claims_expiring_in(900);
        claims.iss = "someone-else".into();
        let token = codec.encode_access(&claims).unwrap();
        assert_eq!(codec.decode_access(&token), Err(AuthError::ClaimMismatch));
    }

    #[test]
    fn wrong_audience_is_a_claim_mismatch() {
        let codec = codec();
        let mut claims = claims_expiring_in(900);
        claims.aud = "other.example.com".into();
        let token = codec.encode_access(&claims).unwrap();
        assert_eq!(codec.decode_access(&token), Err(AuthError::ClaimMismatch));
    }

    #[test]
    fn garbage_input_is_malformed() {
        let codec = codec();
        assert_eq!(
            codec.decode_access("not-a-token"),
            Err(AuthError::Malformed)
        );
        assert_eq!(codec.decode_access(""), Err(AuthError::Malformed));
    }

    #[test]
    fn different_key_fails_signature_check() {
        let codec_a = codec();
        let config_b =
            AuthConfig::new("board-api", "api.example.com", vec![1u8; 32], 900, 604800).unwrap();
        let codec_b = TokenCodec::new(&config_b);

        let token = codec_a.encode_access(&claims_expiring_in(900)).unwrap();
        assert_eq!(codec_b.decode_access(&token), Err(AuthError::BadSignature));
    }

    #[test]
    fn relaxed_decode_accepts_expired_but_not_garbage() {
        let codec = codec();
        let token = codec.encode_access(&claims_expiring_in(-100)).unwrap();
        let claims = codec.decode_access_ignoring_expiry(&token).unwrap();
        assert_eq!(claims.user_id, 42);

        assert_eq!(
            codec.decode_access_ignoring_expiry("junk.junk.junk"),
            Err(AuthError::Malformed)
        );
    }

    #[test]
    fn refresh_decode_skips_audience() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            iss: "board-api".into(),
            sub: "42".into(),
            exp: (now + 604800) as usize,
            iat: now as usize,
            nbf: now as usize,
            jti: Uuid::new_v4().simple().to_string(),
        };
        let token = codec.encode_refresh(&claims).unwrap();
        let decoded = codec.decode_refresh(&token).unwrap();
        assert_eq!(decoded, claims);
    }
}
