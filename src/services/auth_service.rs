use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::*;

/// Single-operator login backed by a configured bcrypt hash.
#[derive(Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    credentials: AuthConfig,
}

impl AuthService {
    pub fn new(jwt_service: JwtService, credentials: AuthConfig) -> Self {
        if credentials.password_hash.is_empty() {
            log::warn!("No operator password hash configured, logins are disabled");
        }
        Self {
            jwt_service,
            credentials,
        }
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let invalid = || AppError::AuthError("Invalid email or password".to_string());

        if self.credentials.password_hash.is_empty()
            || !request
                .email
                .trim()
                .eq_ignore_ascii_case(&self.credentials.email)
        {
            return Err(invalid());
        }

        if !verify_password(&request.password, &self.credentials.password_hash)? {
            return Err(invalid());
        }

        let access_token = self
            .jwt_service
            .generate_access_token(&self.credentials.username)?;
        log::info!("Operator {} logged in", self.credentials.username);

        Ok(AuthResponse {
            access_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
            username: self.credentials.username.clone(),
        })
    }

    /// Resolves a bearer token to the session it was issued for.
    pub fn session_from_token(&self, token: &str) -> AppResult<Session> {
        let claims = self.jwt_service.verify_access_token(token)?;
        Ok(Session {
            username: claims.sub,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(
            JwtService::new("test-secret", 600),
            AuthConfig {
                email: "admin@gamecorn.live".to_string(),
                username: "Streamer".to_string(),
                password_hash: hash_password("Password123").unwrap(),
            },
        )
    }

    #[tokio::test]
    async fn test_login_success() {
        let auth = service();
        let response = auth
            .login(LoginRequest {
                email: " Admin@GameCorn.live ".to_string(),
                password: "Password123".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.username, "Streamer");
        assert_eq!(response.expires_in, 600);
        let session = auth.session_from_token(&response.access_token).unwrap();
        assert_eq!(session.username, "Streamer");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let result = service()
            .login(LoginRequest {
                email: "admin@gamecorn.live".to_string(),
                password: "nope".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::AuthError(_))));
    }

    #[tokio::test]
    async fn test_login_disabled_without_hash() {
        let auth = AuthService::new(JwtService::new("s", 600), AuthConfig::default());
        let result = auth
            .login(LoginRequest {
                email: "admin@gamecorn.live".to_string(),
                password: "anything".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::AuthError(_))));
    }
}
