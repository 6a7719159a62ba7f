// Backend authentication
//
// Username/password login and account registration. Both endpoints are
// unauthenticated and answer HTTP 200 with `success: false` on rejection,
// so callers must inspect the returned `AuthResponse`.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::BackendClient;
use crate::error::Error;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest};

/// Fields submitted to `/register`.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    pub accept_tos: bool,
}

impl BackendClient {
    /// `POST /login`.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<AuthResponse, Error> {
        let url = self.url("login")?;
        debug!(username, "logging in at {}", url);

        let body = LoginRequest {
            username,
            password: password.expose_secret(),
        };
        self.post(url, &body, None).await
    }

    /// `POST /register`.
    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse, Error> {
        let url = self.url("register")?;
        debug!(username = %registration.username, "registering at {}", url);

        let body = RegisterRequest {
            username: &registration.username,
            email: &registration.email,
            password: registration.password.expose_secret(),
            confirm_password: registration.confirm_password.expose_secret(),
            accept_tos: registration.accept_tos,
        };
        self.post(url, &body, None).await
    }
}
