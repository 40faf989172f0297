use std::time::Duration;

use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::{
    claims::{Claims, TokenKind, UserType},
    codec::{DecodeError, TokenCodec},
};
use crate::config::JwtConfig;

/// Why a presented token was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("token expired")]
    Expired,
    #[error("expected {expected:?} token, got {found:?}")]
    WrongKind { expected: TokenKind, found: TokenKind },
}

/// Access and refresh tokens issued together at login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Holds the token codec together with issuer/audience and both lifetimes.
///
/// Built once from configuration at startup and shared read-only.
#[derive(Clone)]
pub struct JwtKeys {
    codec: TokenCodec,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            codec: TokenCodec::new(cfg.secret.as_bytes(), &cfg.issuer, &cfg.audience),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::from_secs((cfg.ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((cfg.refresh_ttl_minutes as u64) * 60),
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    fn sign_with_kind(
        &self,
        user_id: i64,
        user_type: UserType,
        kind: TokenKind,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        anyhow::ensure!(user_id > 0, "subject user id must be positive, got {user_id}");
        let exp = now + TimeDuration::seconds(self.ttl(kind).as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            user_type,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = self.codec.encode(&claims)?;
        debug!(user_id, %user_type, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn issue_access_at(
        &self,
        user_id: i64,
        user_type: UserType,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, user_type, TokenKind::Access, now)
    }

    pub fn issue_refresh_at(
        &self,
        user_id: i64,
        user_type: UserType,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, user_type, TokenKind::Refresh, now)
    }

    pub fn issue_access(&self, user_id: i64, user_type: UserType) -> anyhow::Result<String> {
        self.issue_access_at(user_id, user_type, OffsetDateTime::now_utc())
    }

    pub fn issue_refresh(&self, user_id: i64, user_type: UserType) -> anyhow::Result<String> {
        self.issue_refresh_at(user_id, user_type, OffsetDateTime::now_utc())
    }

    /// Issues both tokens stamped with the same instant.
    pub fn issue_pair(&self, user_id: i64, user_type: UserType) -> anyhow::Result<TokenPair> {
        let now = OffsetDateTime::now_utc();
        Ok(TokenPair {
            access_token: self.issue_access_at(user_id, user_type, now)?,
            refresh_token: self.issue_refresh_at(user_id, user_type, now)?,
        })
    }

    pub fn verify_at(
        &self,
        token: &str,
        expected: TokenKind,
        now: OffsetDateTime,
    ) -> Result<Claims, VerifyError> {
        let claims = self.codec.decode(token)?;
        if now.unix_timestamp() >= claims.exp {
            debug!(user_id = claims.sub, exp = claims.exp, "jwt expired");
            return Err(VerifyError::Expired);
        }
        if claims.kind != expected {
            return Err(VerifyError::WrongKind {
                expected,
                found: claims.kind,
            });
        }
        debug!(user_id = claims.sub, kind = ?claims.kind, "jwt verified");
        Ok(claims)
    }

    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, VerifyError> {
        self.verify_at(token, expected, OffsetDateTime::now_utc())
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, VerifyError> {
        self.verify(token, TokenKind::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, VerifyError> {
        self.verify(token, TokenKind::Refresh)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_keys() -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: "jwt-unit-test-secret-0123456789-abcdef".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 30,
            refresh_ttl_minutes: 60 * 24 * 14,
        })
    }

    fn t0() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_750_000_000).unwrap()
    }

    #[test]
    fn sign_and_verify_access_token() {
        let keys = make_keys();
        let token = keys.issue_access(42, UserType::Personal).expect("sign access");
        let claims = keys.verify(&token, TokenKind::Access).expect("verify token");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.user_type, UserType::Personal);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn sign_and_verify_refresh_token() {
        let keys = make_keys();
        let token = keys.issue_refresh(9, UserType::Enterprise).expect("sign refresh");
        let claims = keys.verify_refresh(&token).expect("verify refresh");
        assert_eq!(claims.sub, 9);
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let keys = make_keys();
        let access = keys.issue_access(1, UserType::Personal).unwrap();
        let refresh = keys.issue_refresh(1, UserType::Personal).unwrap();

        assert_eq!(
            keys.verify_refresh(&access).unwrap_err(),
            VerifyError::WrongKind {
                expected: TokenKind::Refresh,
                found: TokenKind::Access
            }
        );
        assert!(matches!(
            keys.verify_access(&refresh),
            Err(VerifyError::WrongKind { .. })
        ));
    }

    #[test]
    fn expiry_boundary_counts_as_expired() {
        let keys = make_keys();
        let token = keys.issue_access_at(5, UserType::Personal, t0()).unwrap();
        let exp = t0() + TimeDuration::minutes(30);

        assert!(keys.verify_at(&token, TokenKind::Access, t0()).is_ok());
        assert!(keys
            .verify_at(&token, TokenKind::Access, exp - TimeDuration::seconds(1))
            .is_ok());
        assert_eq!(
            keys.verify_at(&token, TokenKind::Access, exp).unwrap_err(),
            VerifyError::Expired
        );
        assert_eq!(
            keys.verify_at(&token, TokenKind::Access, exp + TimeDuration::hours(1))
                .unwrap_err(),
            VerifyError::Expired
        );
    }

    #[test]
    fn pair_differs_in_kind_and_lifetime() {
        let keys = make_keys();
        let pair = keys.issue_pair(3, UserType::Personal).unwrap();
        let access = keys.codec().decode(&pair.access_token).unwrap();
        let refresh = keys.codec().decode(&pair.refresh_token).unwrap();

        assert_eq!(access.kind, TokenKind::Access);
        assert_eq!(refresh.kind, TokenKind::Refresh);
        assert_eq!(access.iat, refresh.iat);
        assert!(refresh.exp - refresh.iat > access.exp - access.iat);
    }

    #[test]
    fn decode_errors_pass_through() {
        let keys = make_keys();
        assert_eq!(
            keys.verify_access("garbage").unwrap_err(),
            VerifyError::Decode(DecodeError::Malformed)
        );

        let token = keys.issue_access(1, UserType::Personal).unwrap();
        let other = JwtKeys::from_config(&JwtConfig {
            secret: "another-secret-entirely-0123456789-xyz".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 30,
            refresh_ttl_minutes: 60,
        });
        assert_eq!(
            other.verify_access(&token).unwrap_err(),
            VerifyError::Decode(DecodeError::SignatureInvalid)
        );
    }

    #[test]
    fn non_positive_subject_is_refused() {
        let keys = make_keys();
        assert!(keys.issue_access(0, UserType::Personal).is_err());
        assert!(keys.issue_refresh(-3, UserType::Enterprise).is_err());
    }

    #[test]
    fn enterprise_access_token_end_to_end() {
        let keys = make_keys();
        let token = keys.issue_access(42, UserType::Enterprise).unwrap();

        let claims = keys.verify(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.user_type, UserType::Enterprise);

        assert!(matches!(
            keys.verify(&token, TokenKind::Refresh),
            Err(VerifyError::WrongKind { .. })
        ));
    }

    #[test]
    fn refresh_outlives_access_after_clock_advance() {
        let keys = make_keys();
        let access = keys.issue_access_at(42, UserType::Enterprise, t0()).unwrap();
        let refresh = keys.issue_refresh_at(42, UserType::Enterprise, t0()).unwrap();

        let later = t0() + TimeDuration::minutes(31);
        assert_eq!(
            keys.verify_at(&access, TokenKind::Access, later).unwrap_err(),
            VerifyError::Expired
        );
        let claims = keys.verify_at(&refresh, TokenKind::Refresh, later).unwrap();
        assert_eq!(claims.sub, 42);
    }
}
