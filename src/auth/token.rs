use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{AppError, AuthError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub iat: i64,    // Issued at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>, // Expiration time
}

impl Claims {
    pub fn new(user_id: i64, ttl: Option<Duration>) -> Result<Self, AppError> {
        let now = Utc::now();
        let exp = match ttl {
            Some(ttl) => Some(
                now.checked_add_signed(ttl)
                    .ok_or_else(|| AppError::InternalError("token expiry out of range".into()))?
                    .timestamp(),
            ),
            None => None,
        };

        Ok(Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp,
        })
    }
}

/// Issues and verifies session tokens under one HMAC secret.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Option<Duration>,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl: Option<Duration>) -> Result<Self, AppError> {
        if secret.is_empty() {
            return Err(AppError::ConfigError("token signing secret is empty".into()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // `exp` is optional, but checked whenever it is present
        validation.set_required_spec_claims(&["sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        let ttl = match config.token_ttl_hours {
            0 => None,
            hours => Some(Duration::try_hours(hours).ok_or_else(|| {
                AppError::ConfigError(format!("token ttl of {} hours is out of range", hours))
            })?),
        };
        Self::new(&config.jwt_secret, ttl)
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn issue(&self, user_id: i64) -> Result<String, AppError> {
        self.encode(&Claims::new(user_id, self.ttl)?)
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("token signing failed: {}", e)))
    }

    /// Returns the user id carried by a valid token.
    pub fn verify(&self, token: &str) -> Result<i64, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;

        // jsonwebtoken still accepts `exp == now`; the token is dead from that second on
        if let Some(exp) = data.claims.exp {
            if exp <= Utc::now().timestamp() {
                return Err(AuthError::TokenExpired);
            }
        }

        data.claims.sub.parse::<i64>().map_err(|_| AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::new(secret, Some(Duration::hours(1))).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = codec("test_secret");
        let token = codec.issue(42).unwrap();
        assert_eq!(codec.verify(&token), Ok(42));
    }

    #[test]
    fn test_claims_carry_issue_and_expiry() {
        let claims = Claims::new(7, Some(Duration::hours(2))).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.exp, Some(claims.iat + 2 * 3600));

        let claims = Claims::new(7, None).unwrap();
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn test_overflowing_ttl_is_an_error() {
        let ttl = Duration::try_days(365 * 1_000_000).unwrap();
        assert!(matches!(Claims::new(1, Some(ttl)), Err(AppError::InternalError(_))));

        let codec = TokenCodec::new("test_secret", Some(ttl)).unwrap();
        assert!(matches!(codec.issue(1), Err(AppError::InternalError(_))));
    }

    #[test]
    fn test_token_expiring_this_second_is_rejected() {
        let codec = codec("test_secret");
        let now = Utc::now().timestamp();
        let token = codec
            .encode(&Claims {
                sub: "1".into(),
                iat: now - 10,
                exp: Some(now),
            })
            .unwrap();

        assert_eq!(codec.verify(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn test_from_config_ttl() {
        let mut config = crate::config::Settings::for_test("test_secret").unwrap().auth;
        config.token_ttl_hours = 0;
        assert_eq!(TokenCodec::from_config(&config).unwrap().ttl(), None);

        config.token_ttl_hours = 48;
        assert_eq!(TokenCodec::from_config(&config).unwrap().ttl(), Some(Duration::hours(48)));

        config.token_ttl_hours = i64::MAX;
        assert!(matches!(TokenCodec::from_config(&config), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_rotated_secret_rejects_old_tokens() {
        let token = codec("old_secret").issue(1).unwrap();
        assert_eq!(codec("new_secret").verify(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let codec = codec("test_secret");
        let now = Utc::now().timestamp();
        let token = codec
            .encode(&Claims {
                sub: "1".into(),
                iat: now - 7200,
                exp: Some(now - 3600),
            })
            .unwrap();

        assert_eq!(codec.verify(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn test_token_without_expiry_is_accepted() {
        let codec = TokenCodec::new("test_secret", None).unwrap();
        let token = codec.issue(5).unwrap();
        assert_ok!(codec.verify(&token));
    }

    #[test]
    fn test_non_numeric_subject_is_rejected() {
        let codec = codec("test_secret");
        let token = codec
            .encode(&Claims {
                sub: "not-a-number".into(),
                iat: Utc::now().timestamp(),
                exp: None,
            })
            .unwrap();

        assert_eq!(codec.verify(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let codec = codec("test_secret");
        assert_err!(codec.verify(""));
        assert_err!(codec.verify("not.a.token"));

        let mut token = codec.issue(1).unwrap();
        token.push('x');
        assert_err!(codec.verify(&token));
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        assert!(matches!(TokenCodec::new("", None), Err(AppError::ConfigError(_))));
    }
}
