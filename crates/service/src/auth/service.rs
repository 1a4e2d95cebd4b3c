use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use models::{user::{validate_email, validate_username, User, UserSummary}, Users};
use rand::rngs::OsRng;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::domain::{AuthSession, Claims, LoginInput, RegisterInput};
use super::errors::AuthError;
use crate::storage::{transact, RecordStore};

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_hours: i64,
}

impl From<&configs::AuthConfig> for AuthConfig {
    fn from(cfg: &configs::AuthConfig) -> Self {
        Self { jwt_secret: cfg.jwt_secret.clone(), session_hours: cfg.session_hours }
    }
}

/// Auth business service independent of web framework
pub struct AuthService {
    users: Arc<dyn RecordStore<Users>>,
    cfg: AuthConfig,
}

impl AuthService {
    pub fn new(users: Arc<dyn RecordStore<Users>>, cfg: AuthConfig) -> Self { Self { users, cfg } }

    /// Register a new user with a hashed password. The first account ever
    /// registered becomes the administrator.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, AuthConfig, domain::RegisterInput};
    /// use service::storage::Stores;
    /// let stores = Stores::in_memory();
    /// let svc = AuthService::new(stores.users.clone(), AuthConfig { jwt_secret: "secret".into(), session_hours: 1 });
    /// let input = RegisterInput { username: "ada".into(), email: "ada@example.com".into(), password: "Secret123".into() };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert!(user.is_admin);
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username, email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<UserSummary, AuthError> {
        let username = input.username.trim().to_string();
        let email = input.email.trim().to_string();
        if username.is_empty() || email.is_empty() || input.password.is_empty() {
            return Err(AuthError::Validation("username, email and password are required".into()));
        }
        validate_username(&username)?;
        validate_email(&email)?;
        if input.password.len() < 8 {
            return Err(AuthError::Validation("password too short (>=8)".into()));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();
        let id = Uuid::new_v4().to_string();

        let user = transact(self.users.as_ref(), |users: &mut Users| {
            if let Some(existing) = users.values().find(|u| u.username.eq_ignore_ascii_case(&username)) {
                debug!("username taken: {}", existing.username);
                return Err(AuthError::Conflict("username already exists".into()));
            }
            if users.values().any(|u| u.email.eq_ignore_ascii_case(&email)) {
                return Err(AuthError::Conflict("email already registered".into()));
            }
            let user = User {
                id: id.clone(),
                username: username.clone(),
                email: email.clone(),
                password_hash: password_hash.clone(),
                join_date: Utc::now(),
                uploads_count: 0,
                downloads_count: 0,
                is_admin: users.is_empty(),
                is_active: true,
            };
            users.insert(user.id.clone(), user.clone());
            Ok(user)
        })
        .await?;

        info!(user_id = %user.id, username = %user.username, is_admin = user.is_admin, "user_registered");
        Ok(UserSummary::from(&user))
    }

    /// Authenticate by username or email and issue a session token.
    #[instrument(skip(self, input), fields(login = %input.login))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let login = input.login.trim();
        if login.is_empty() || input.password.is_empty() {
            return Err(AuthError::Validation("login and password are required".into()));
        }
        let users = self.users.load().await?;
        let user = users
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(login) || u.email.eq_ignore_ascii_case(login))
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&user.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }
        if !user.is_active {
            return Err(AuthError::Inactive);
        }

        let token = self.issue_token(user)?;
        info!(user_id = %user.id, username = %user.username, "user_logged_in");
        Ok(AuthSession { user: UserSummary::from(user), token })
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let exp = (Utc::now() + chrono::Duration::hours(self.cfg.session_hours)).timestamp() as usize;
        let claims = Claims { sub: user.username.clone(), uid: user.id.clone(), exp };
        encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }

    /// Decode a session token; expired or tampered tokens are rejected.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &DecodingKey::from_secret(self.cfg.jwt_secret.as_bytes()), &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }

    /// Current record of a user, if it still exists.
    pub async fn find_user(&self, id: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.load().await?.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Stores;

    fn svc() -> AuthService {
        AuthService::new(Stores::in_memory().users, AuthConfig { jwt_secret: "test-secret".into(), session_hours: 1 })
    }

    fn input(username: &str, email: &str) -> RegisterInput {
        RegisterInput { username: username.into(), email: email.into(), password: "Passw0rd!".into() }
    }

    #[tokio::test]
    async fn first_registrant_becomes_admin() -> anyhow::Result<()> {
        let svc = svc();
        let a = svc.register(input("alice", "alice@example.com")).await?;
        let b = svc.register(input("bob", "bob@example.com")).await?;
        assert!(a.is_admin);
        assert!(!b.is_admin);
        assert!(a.is_active && b.is_active);
        assert_ne!(a.id, b.id);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_username_or_email_rejected() -> anyhow::Result<()> {
        let svc = svc();
        svc.register(input("alice", "alice@example.com")).await?;
        let err = svc.register(input("ALICE", "other@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
        let err = svc.register(input("alice2", "Alice@Example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
        Ok(())
    }

    #[tokio::test]
    async fn register_validates_input() {
        let svc = svc();
        let short = RegisterInput { password: "short".into(), ..input("carol", "carol@example.com") };
        assert!(matches!(svc.register(short).await, Err(AuthError::Validation(_))));
        assert!(matches!(svc.register(input("carol", "not-an-email")).await, Err(AuthError::Validation(_))));
        assert!(matches!(svc.register(input("", "carol@example.com")).await, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn login_by_username_or_email() -> anyhow::Result<()> {
        let svc = svc();
        svc.register(input("alice", "alice@example.com")).await?;
        let by_name = svc.login(LoginInput { login: "alice".into(), password: "Passw0rd!".into() }).await?;
        let by_mail = svc.login(LoginInput { login: "alice@example.com".into(), password: "Passw0rd!".into() }).await?;
        assert_eq!(by_name.user.id, by_mail.user.id);

        let claims = svc.verify_token(&by_name.token)?;
        assert_eq!(claims.uid, by_name.user.id);
        assert_eq!(claims.sub, "alice");
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_unauthorized() -> anyhow::Result<()> {
        let svc = svc();
        svc.register(input("alice", "alice@example.com")).await?;
        let bad = svc.login(LoginInput { login: "alice".into(), password: "nope-nope".into() }).await;
        assert!(matches!(bad, Err(AuthError::Unauthorized)));
        let ghost = svc.login(LoginInput { login: "ghost".into(), password: "Passw0rd!".into() }).await;
        assert!(matches!(ghost, Err(AuthError::Unauthorized)));
        Ok(())
    }

    #[tokio::test]
    async fn inactive_account_cannot_log_in() -> anyhow::Result<()> {
        let stores = Stores::in_memory();
        let svc = AuthService::new(stores.users.clone(), AuthConfig { jwt_secret: "k".into(), session_hours: 1 });
        let user = svc.register(input("alice", "alice@example.com")).await?;
        let mut users = stores.users.load().await?;
        if let Some(u) = users.get_mut(&user.id) {
            u.is_active = false;
        }
        stores.users.save(&users).await?;
        let res = svc.login(LoginInput { login: "alice".into(), password: "Passw0rd!".into() }).await;
        assert!(matches!(res, Err(AuthError::Inactive)));
        Ok(())
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() -> anyhow::Result<()> {
        let svc = svc();
        let user = svc.register(input("alice", "alice@example.com")).await?;
        let other = AuthService::new(Stores::in_memory().users, AuthConfig { jwt_secret: "other".into(), session_hours: 1 });
        let full = svc.find_user(&user.id).await?.expect("user");
        let foreign = other.issue_token(&full)?;
        assert!(matches!(svc.verify_token(&foreign), Err(AuthError::TokenError(_))));
        assert!(svc.verify_token("garbage").is_err());
        Ok(())
    }
}
