use tracing::{info, warn};

use super::{
    business::{normalize_code, BusinessRegistry},
    claims::UserType,
    jwt::{JwtKeys, TokenPair, VerifyError},
    password::{
        hash_password, is_valid_email, verify_against_dummy, verify_password, MIN_PASSWORD_LEN,
    },
    repo::{CreateUserError, UserStore},
    repo_types::{NewUser, User},
};
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Invalid business registration code")]
    InvalidBusinessCode,
    #[error("Business already registered")]
    BusinessAlreadyRegistered,
    #[error("{0}")]
    Validation(&'static str),
    #[error("Invalid or expired token")]
    Unauthenticated(#[source] VerifyError),
    /// A well-signed token whose account no longer exists.
    #[error("Invalid or expired token")]
    UnknownSubject(i64),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<CreateUserError> for AuthError {
    fn from(e: CreateUserError) -> Self {
        match e {
            CreateUserError::DuplicateEmail => AuthError::DuplicateEmail,
            CreateUserError::DuplicateBusinessCode => AuthError::BusinessAlreadyRegistered,
            CreateUserError::Other(e) => AuthError::Internal(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Signup {
    pub email: String,
    pub password: String,
    pub nickname: String,
    pub user_type: UserType,
    pub business_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user_id: i64,
    pub user_type: UserType,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone)]
pub struct Refreshed {
    pub user_id: i64,
    pub user_type: UserType,
    pub access_token: String,
}

/// Issuance path: account pre-checks, credential checks, token minting.
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
    business: &'a dyn BusinessRegistry,
    keys: &'a JwtKeys,
}

impl<'a> AuthService<'a> {
    pub fn new(
        users: &'a dyn UserStore,
        business: &'a dyn BusinessRegistry,
        keys: &'a JwtKeys,
    ) -> Self {
        Self {
            users,
            business,
            keys,
        }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(
            state.users.as_ref(),
            state.business.as_ref(),
            state.keys.as_ref(),
        )
    }

    pub async fn check_email(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(AuthError::Validation("Invalid email"));
        }
        if self.users.email_exists(&email).await? {
            return Err(AuthError::DuplicateEmail);
        }
        Ok(())
    }

    /// Returns the normalized code when it is valid and unused.
    pub async fn check_business_code(&self, code: &str) -> Result<String, AuthError> {
        let Some(code) = normalize_code(code) else {
            return Err(AuthError::InvalidBusinessCode);
        };
        if !self.business.is_valid(&code).await? {
            return Err(AuthError::InvalidBusinessCode);
        }
        if self.users.business_code_exists(&code).await? {
            return Err(AuthError::BusinessAlreadyRegistered);
        }
        Ok(code)
    }

    pub async fn signup(&self, req: Signup) -> Result<User, AuthError> {
        let email = normalize_email(&req.email);
        self.check_email(&email).await.inspect_err(|e| {
            warn!(email = %email, reason = %e, "signup rejected");
        })?;

        if req.password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation("Password too short"));
        }
        let nickname = req.nickname.trim().to_string();
        if nickname.is_empty() {
            return Err(AuthError::Validation("Nickname is required"));
        }

        let business_code = match req.user_type {
            UserType::Personal => None,
            UserType::Enterprise => {
                let code = req.business_code.as_deref().unwrap_or_default();
                Some(self.check_business_code(code).await.inspect_err(|e| {
                    warn!(email = %email, reason = %e, "enterprise signup rejected");
                })?)
            }
        };

        let password_hash = hash_password(&req.password)?;
        let user = self
            .users
            .create(NewUser {
                email,
                password_hash,
                nickname,
                user_type: req.user_type,
                business_code,
            })
            .await?;

        info!(user_id = user.id, user_type = %user.user_type, "user registered");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            verify_against_dummy(password);
            warn!(email = %email, "login unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.keys.issue_pair(user.id, user.user_type)?;
        info!(user_id = user.id, user_type = %user.user_type, "user logged in");
        Ok(LoginResult {
            user_id: user.id,
            user_type: user.user_type,
            tokens,
        })
    }

    /// Exchanges a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Refreshed, AuthError> {
        let claims = self
            .keys
            .verify_refresh(refresh_token)
            .map_err(AuthError::Unauthenticated)?;

        // The account may have been removed since the refresh token was issued.
        let Some(user) = self.users.find_by_id(claims.sub).await? else {
            warn!(user_id = claims.sub, "refresh for unknown user");
            return Err(AuthError::UnknownSubject(claims.sub));
        };

        let access_token = self.keys.issue_access(user.id, user.user_type)?;
        info!(user_id = user.id, "access token refreshed");
        Ok(Refreshed {
            user_id: user.id,
            user_type: user.user_type,
            access_token,
        })
    }

    pub async fn find_user(&self, user_id: i64) -> Result<Option<User>, AuthError> {
        Ok(self.users.find_by_id(user_id).await?)
    }

    pub async fn personal_users(&self) -> Result<Vec<User>, AuthError> {
        Ok(self.users.list_personal().await?)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
