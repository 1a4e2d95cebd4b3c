use models::user::UserSummary;
use serde::{Deserialize, Serialize};

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login input; `login` is either the username or the email. Browser forms
/// send it as `username`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    #[serde(alias = "username")]
    pub login: String,
    pub password: String,
}

/// Session token payload. Carries identity only; rights are read from the
/// user record on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub uid: String,
    pub exp: usize,
}

/// Login result (session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: UserSummary,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_accepts_username_key() -> anyhow::Result<()> {
        let input: LoginInput = serde_json::from_str(r#"{"username": "ada@example.com", "password": "pw"}"#)?;
        assert_eq!(input.login, "ada@example.com");
        let input: LoginInput = serde_json::from_str(r#"{"login": "ada", "password": "pw"}"#)?;
        assert_eq!(input.login, "ada");
        Ok(())
    }
}
