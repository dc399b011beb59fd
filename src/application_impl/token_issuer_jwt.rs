use crate::application_port::{AuthError, SessionClaims, TokenIssuer};
use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::fmt;

#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub signing_key: Vec<u8>,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

/// Stateless HS256 issuer. Tokens stay valid until `exp` for as long as the
/// signing key is unchanged.
pub struct JwtHs256Issuer {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtHs256Issuer {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHs256Issuer {
            encoding_key: EncodingKey::from_secret(&cfg.signing_key),
            decoding_key: DecodingKey::from_secret(&cfg.signing_key),
            issuer: cfg.issuer,
        }
    }

    /// Check signature, issuer and expiry, then return the embedded claims.
    pub fn decode_claims(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let mut v = Validation::new(Algorithm::HS256);
        v.validate_exp = true;
        v.set_issuer(&[self.issuer.as_str()]);
        v.set_required_spec_claims(&["exp", "iss"]);
        let data = decode::<SessionClaims>(token, &self.decoding_key, &v)?;
        Ok(data.claims)
    }
}

#[async_trait::async_trait]
impl TokenIssuer for JwtHs256Issuer {
    async fn issue_token(
        &self,
        user_id: UserId,
        username: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let iat_dt = Utc::now();
        if expires_at <= iat_dt {
            return Err(AuthError::TokenGeneration(
                "token expiry must be in the future".to_string(),
            ));
        }

        let claims = SessionClaims {
            user_id,
            username: username.to_string(),
            iss: self.issuer.clone(),
            iat: iat_dt.timestamp(),
            exp: expires_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn issuer_with(key: &str) -> JwtHs256Issuer {
        JwtHs256Issuer::new(JwtConfig {
            issuer: "authgate.test".to_string(),
            signing_key: key.as_bytes().to_vec(),
        })
    }

    #[tokio::test]
    async fn issued_token_decodes_to_same_claims() {
        let issuer = issuer_with("unit-test-key");
        let expires_at = Utc::now() + Duration::minutes(15);

        let token = issuer
            .issue_token(UserId(11), "alice", expires_at)
            .await
            .unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = issuer.decode_claims(&token).unwrap();
        assert_eq!(claims.user_id, UserId(11));
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.iss, "authgate.test");
        assert_eq!(claims.exp, expires_at.timestamp());
        assert!(claims.iat <= claims.exp);
    }

    #[tokio::test]
    async fn claims_use_camel_case_wire_names() {
        let claims = SessionClaims {
            user_id: UserId(5),
            username: "bob".to_string(),
            iss: "authgate.test".to_string(),
            iat: 1,
            exp: 2,
        };
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["userID"], 5);
        assert_eq!(json["userName"], "bob");
    }

    #[tokio::test]
    async fn past_expiry_is_rejected() {
        let issuer = issuer_with("unit-test-key");
        let err = issuer
            .issue_token(UserId(1), "alice", Utc::now() - Duration::seconds(1))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::TokenGeneration(_)));
    }

    #[tokio::test]
    async fn other_key_fails_verification() {
        let issuer = issuer_with("unit-test-key");
        let token = issuer
            .issue_token(UserId(1), "alice", Utc::now() + Duration::minutes(5))
            .await
            .unwrap();

        assert!(issuer_with("another-key").decode_claims(&token).is_err());
    }

    #[test]
    fn debug_hides_signing_key() {
        let cfg = JwtConfig {
            issuer: "authgate.test".to_string(),
            signing_key: b"super-secret".to_vec(),
        };
        assert!(!format!("{:?}", cfg).contains("super-secret"));
    }
}
